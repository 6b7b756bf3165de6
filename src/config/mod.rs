// Start of file: /src/config/mod.rs

/*
    * Runtime configuration: environment keys with their defaults, and the
    * shared AppState handed to every handler and the cycle monitor.
*/

pub mod environment;
pub mod state;

pub use environment::EnvironmentVariables;
pub use state::AppState;

// End of file: /src/config/mod.rs
