pub mod handler;
pub mod routes;

pub use routes::cycle_routes;
