// Start of file: /src/api/mod.rs

/*
    * HTTP surface. Each feature exposes a `Router<AppState>` from its
    * routes module; handlers call into `crate::services`.
*/

pub mod conducts;
pub mod cycles;
pub mod diagnostics;
pub mod organisation;
pub mod system;

pub use conducts::conduct_routes;
pub use cycles::cycle_routes;
pub use diagnostics::diagnostics_routes;
pub use organisation::organisation_routes;
pub use system::system_routes;

// End of file: /src/api/mod.rs
