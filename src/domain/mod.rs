// Start of file: /src/domain/mod.rs

/*
    * Pure conduct logic: WBGT zones, the work/rest cycle state machine,
    * the conduct-local clock, join PINs and per-conduct cut-off status.
*/

pub mod clock;
pub mod cycle;
pub mod pin;
pub mod system_status;
pub mod zones;

pub use clock::Clock;
pub use cycle::{Actor, CycleState, Role, UserStatus, ZoneChangeDenied};
pub use system_status::{ConductStatusRegistry, CutOffTransition, SystemStatus};
pub use zones::Zone;

// End of file: /src/domain/mod.rs
