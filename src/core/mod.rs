// Start of file: /src/core/mod.rs

/*
    * Process plumbing: tracing setup, router assembly, listener and
    * shutdown signals.
*/

pub mod logging;
pub mod server;

// End of file: /src/core/mod.rs
