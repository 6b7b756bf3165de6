// Start of file: /src/realtime/mod.rs

/*
    * Real-time fan-out: one broadcast room per conduct plus a global
    * channel, delivered to browsers over the `/ws` WebSocket.
*/

pub mod events;
pub mod hub;
pub mod socket;

pub use events::{ClientMessage, ServerEvent};
pub use hub::RealtimeHub;

// End of file: /src/realtime/mod.rs
