// Start of file: /src/models/mod.rs

/*
    * Persisted entities: battalions, companies, conducts, participants
    * and the activity log, plus their row mappings.
*/

pub mod activity;
pub mod conduct;
pub mod organisation;
pub mod user;

pub use activity::{ActivityAction, ActivityLog, HistoryEntry, SYSTEM_USER};
pub use conduct::{Conduct, ConductStatus};
pub use organisation::{Battalion, Company};
pub use user::{User, UserSnapshot};

// End of file: /src/models/mod.rs
