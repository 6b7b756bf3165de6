/*
* Operator tooling for inspecting and nudging cycle completion.
*/

pub mod handler;
pub mod routes;

pub use routes::diagnostics_routes;
