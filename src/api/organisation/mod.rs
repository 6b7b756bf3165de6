/*
* Battalion and company endpoints: conduct creation, access, overviews,
* deletion and password changes.
*/

pub mod handler;
pub mod routes;

pub use routes::organisation_routes;
