/*
* Service banner, health check, server clock and system status.
*/

pub mod handler;
pub mod routes;

pub use routes::system_routes;
