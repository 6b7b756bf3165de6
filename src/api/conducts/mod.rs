/*
* Joining a conduct, participant setup and the per-role landing views.
*/

pub mod handler;
pub mod routes;

pub use routes::conduct_routes;
