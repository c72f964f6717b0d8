//! Backup ledger and restore engine.
//!
//! Each target's pre-tool state is captured once, on the first apply, as
//! `<key>.orig` in the backup directory and later restored exactly.
mod ledger;
mod restore;

pub use ledger::{
    BackupLedger, BackupPayload, CodepageEntry, CodepageRecord, EMPTY_SENTINEL, EnsureOutcome,
};
pub use restore::{RestoreEngine, RestoreOutcome};
