// Start of file: /src/services/mod.rs

/*
    * Orchestration between the database, the cache, the in-memory
    * cut-off registry and the realtime hub. Handlers stay thin and call
    * into these functions.
*/

pub mod activity;
pub mod conducts;
pub mod cycles;
pub mod diagnostics;
pub mod monitor;
pub mod users;

// End of file: /src/services/mod.rs
