// Start of file: /src/utils/mod.rs

/*
    * Re-exports for all utility modules like error handling,
    * response formats, middleware wrappers, shared utilities, etc.
*/

pub mod error_handler;
pub mod response_handler;
pub mod utils;

pub use error_handler::{ApiError, ApiResult};
pub use response_handler::HandlerResponse;

// End of file: /src/utils/mod.rs
