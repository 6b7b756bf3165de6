// Start of file: src/utils/utils.rs

use serde_json::{
    ser::PrettyFormatter, Serializer
};
use serde::Serialize;

/*
    * Convert any `Serialize` type into a two-space-indented JSON string.
*/
pub fn to_two_space_indented_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    let mut writer: Vec<u8> = Vec::new();

    let formatter: PrettyFormatter<'_> = PrettyFormatter::with_indent(b"  ");

    let mut ser: Serializer<&mut Vec<u8>, PrettyFormatter<'_>> =
        Serializer::with_formatter(&mut writer, formatter);

    value.serialize(&mut ser)?;

    // serde_json only ever writes valid UTF-8
    Ok(String::from_utf8_lossy(&writer).into_owned())
}

/*
    * Trims a form value, treating blank input as missing.
*/
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v: &&str| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn indents_with_two_spaces() {
        let text: String = to_two_space_indented_json(&json!({ "a": 1 })).unwrap();
        assert_eq!(text, "{\n  \"a\": 1\n}");
    }

    #[test]
    fn blank_values_are_missing() {
        assert_eq!(non_blank(Some("  alpha ")), Some("alpha"));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }
}

// End of file: src/utils/utils.rs
