// Conduct join PINs

use uuid::Uuid;

pub const PIN_LENGTH: usize = 6;

/// Random 6-digit PIN. Leading zeros are kept.
pub fn generate_pin() -> String {
    let entropy: u128 = Uuid::new_v4().as_u128();
    format!("{:06}", entropy % 1_000_000)
}

pub fn is_valid_pin(pin: &str) -> bool {
    pin.len() == PIN_LENGTH && pin.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_pins_are_valid() {
        for _ in 0..200 {
            let pin: String = generate_pin();
            assert!(is_valid_pin(&pin), "bad pin {pin}");
        }
    }

    #[test]
    fn validation_rejects_wrong_shapes() {
        assert!(is_valid_pin("012345"));
        assert!(!is_valid_pin("12345"));
        assert!(!is_valid_pin("1234567"));
        assert!(!is_valid_pin("12a456"));
        assert!(!is_valid_pin(""));
    }
}
