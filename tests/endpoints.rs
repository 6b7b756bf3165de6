//! tests/endpoints.rs
//! Aggregates the endpoint tests that need neither Postgres nor Redis.

#[cfg(test)]
mod endpoints {
    #[path = "../endpoints/system.rs"]
    mod system;

    #[path = "../endpoints/validation.rs"]
    mod validation;
}
