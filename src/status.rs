//! Status vocabulary shown for each target and for a whole detection pass.
use std::fmt;

use crate::blocks::{DriftReport, DriftState};
use crate::target::TargetKey;

/// Status of one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetStatus {
    /// The tool the target belongs to is not installed.
    NotDetected,
    /// No configuration present.
    NotConfigured,
    /// A block is cut short or repeated.
    PartiallyConfigured,
    /// Configuration matches.
    Configured,
    /// Configuration present but different, or unreadable.
    Drifted(String),
}

impl TargetStatus {
    /// Map a drift report of a detected target.
    ///
    /// ```
    /// use encfix_cli::blocks::{DriftReport, DriftState};
    /// use encfix_cli::status::TargetStatus;
    ///
    /// let report = DriftReport::new(DriftState::Duplicate, "2 blocks");
    /// assert_eq!(TargetStatus::from_report(&report), TargetStatus::PartiallyConfigured);
    /// ```
    #[must_use]
    pub fn from_report(report: &DriftReport) -> Self {
        match report.state {
            DriftState::Ok => Self::Configured,
            DriftState::Missing => Self::NotConfigured,
            DriftState::Partial | DriftState::Duplicate => Self::PartiallyConfigured,
            DriftState::Modified | DriftState::Unreadable => Self::Drifted(report.summary.clone()),
        }
    }

    /// Whether the target counts towards the overall summary.
    #[must_use]
    pub const fn is_detected(&self) -> bool {
        !matches!(self, Self::NotDetected)
    }
}

impl fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotDetected => f.write_str("not detected"),
            Self::NotConfigured => f.write_str("not configured"),
            Self::PartiallyConfigured => f.write_str("partially configured"),
            Self::Configured => f.write_str("configured"),
            Self::Drifted(reason) => write!(f, "drifted ({reason})"),
        }
    }
}

/// Reduction of all detected targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverallStatus {
    /// No detected target is configured.
    NoneConfigured,
    /// Some, not all.
    SomeConfigured,
    /// Every detected target is configured.
    AllConfigured,
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoneConfigured => "none configured",
            Self::SomeConfigured => "some configured",
            Self::AllConfigured => "all configured",
        })
    }
}

/// One row of a [`DetectionReport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    /// Target the row describes.
    pub key: TargetKey,
    /// Its status.
    pub status: TargetStatus,
}

/// Statuses produced by one detection pass, in [`TargetKey::ALL`] order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectionReport {
    entries: Vec<StatusEntry>,
}

impl DetectionReport {
    /// Empty report.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add the status of `key`.
    pub fn push(&mut self, key: TargetKey, status: TargetStatus) {
        self.entries.push(StatusEntry { key, status });
    }

    /// All rows.
    #[must_use]
    pub fn entries(&self) -> &[StatusEntry] {
        &self.entries
    }

    /// Status of `key`, if it was examined.
    #[must_use]
    pub fn get(&self, key: TargetKey) -> Option<&TargetStatus> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| &e.status)
    }

    /// Detected targets whose status is not [`TargetStatus::Configured`].
    pub fn pending(&self) -> impl Iterator<Item = TargetKey> + '_ {
        self.entries
            .iter()
            .filter(|e| e.status.is_detected() && e.status != TargetStatus::Configured)
            .map(|e| e.key)
    }

    /// Reduce every detected target to one summary.
    #[must_use]
    pub fn overall(&self) -> OverallStatus {
        let detected = self.entries.iter().filter(|e| e.status.is_detected());
        let (total, configured) = detected.fold((0usize, 0usize), |(t, c), e| {
            (t + 1, c + usize::from(e.status == TargetStatus::Configured))
        });
        if configured == 0 {
            OverallStatus::NoneConfigured
        } else if configured == total {
            OverallStatus::AllConfigured
        } else {
            OverallStatus::SomeConfigured
        }
    }
}

impl fmt::Display for DetectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{:<22} {}", entry.key.label(), entry.status)?;
        }
        write!(f, "overall: {}", self.overall())
    }
}
