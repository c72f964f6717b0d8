//! Marker-block drift detection and reconciliation for text configuration
//! files.
//!
//! - [`ManagedBlockSpec`]: markers plus canonical body for one target kind
//! - [`analyze`]: classify a file as missing, partial, duplicate, modified,
//!   ok or unreadable
//! - [`powershell_equivalent`] / [`posix_shell_equivalent`]: recognize
//!   hand-written setups without markers
//! - [`clean`] / [`apply_block`]: tolerant removal and idempotent re-apply
//! - [`DriftCache`]: bounded per-cycle report cache
mod analyze;
mod cache;
mod equivalence;
mod spec;
mod strip;

pub use analyze::{DriftReport, DriftState, analyze, extract_blocks};
pub use cache::{DEFAULT_CACHE_CAPACITY, DriftCache, FileStamp, fingerprint};
pub use equivalence::{
    Equivalence, EquivalenceCheck, posix_shell_equivalent, powershell_equivalent,
};
pub use spec::{DEFAULT_LOCALE, END_MARKER, ManagedBlockSpec, START_MARKER, normalize};
pub use strip::{apply_block, clean};
