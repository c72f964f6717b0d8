//! Drift classification of a text file against a managed block.
use std::fmt;

use super::equivalence::EquivalenceCheck;
use super::spec::{ManagedBlockSpec, normalize};

/// Drift state of one managed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriftState {
    /// No block and no equivalent configuration.
    Missing,
    /// Exactly one marker present; a truncated or half-written block.
    Partial,
    /// More than one complete block.
    Duplicate,
    /// One block whose content differs from the template.
    Modified,
    /// Block matches the template, or an equivalent setup was recognized.
    Ok,
    /// The file exists but could not be read or parsed.
    Unreadable,
}

impl DriftState {
    /// Whether an apply run would change this target.
    #[must_use]
    pub const fn needs_apply(self) -> bool {
        !matches!(self, Self::Ok)
    }
}

impl fmt::Display for DriftState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Missing => "missing",
            Self::Partial => "partial",
            Self::Duplicate => "duplicate",
            Self::Modified => "modified",
            Self::Ok => "ok",
            Self::Unreadable => "unreadable",
        };
        f.write_str(s)
    }
}

/// Result of analyzing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriftReport {
    /// Classified state.
    pub state: DriftState,
    /// Human-readable diagnostic.
    pub summary: String,
}

impl DriftReport {
    /// Build a report from its parts.
    #[must_use]
    pub fn new(state: DriftState, summary: impl Into<String>) -> Self {
        Self {
            state,
            summary: summary.into(),
        }
    }

    /// Report for a file that could not be read.
    #[must_use]
    pub fn unreadable(err: impl fmt::Display) -> Self {
        Self::new(DriftState::Unreadable, format!("cannot read file: {err}"))
    }
}

/// Extract every complete start…end span from `text`.
///
/// Each span runs from a start marker to the first end marker after it;
/// spans never overlap or nest.
///
/// # Examples
///
/// ```
/// use encfix_cli::blocks::{ManagedBlockSpec, extract_blocks};
///
/// let spec = ManagedBlockSpec::new("<<", ">>", ["x"]);
/// assert_eq!(extract_blocks("a << b >> c << d >>", &spec), vec!["<< b >>", "<< d >>"]);
/// ```
#[must_use]
pub fn extract_blocks<'a>(text: &'a str, spec: &ManagedBlockSpec) -> Vec<&'a str> {
    block_ranges(text, spec)
        .into_iter()
        .filter_map(|(start, end)| text.get(start..end))
        .collect()
}

/// Byte ranges of the spans returned by [`extract_blocks`].
pub(super) fn block_ranges(text: &str, spec: &ManagedBlockSpec) -> Vec<(usize, usize)> {
    let start_marker = spec.start_marker();
    let end_marker = spec.end_marker();
    let mut ranges = Vec::new();
    let mut cursor = 0;
    while let Some(rest) = text.get(cursor..) {
        let Some(start_rel) = rest.find(start_marker) else {
            break;
        };
        let start = cursor + start_rel;
        let after_start = start + start_marker.len();
        let Some(end_rel) = text.get(after_start..).and_then(|t| t.find(end_marker)) else {
            break;
        };
        let end = after_start + end_rel + end_marker.len();
        ranges.push((start, end));
        cursor = end;
    }
    ranges
}

/// Classify `text` against `spec`.
///
/// `text` is `None` when the file does not exist. Read failures are reported
/// by the caller through [`DriftReport::unreadable`].
#[must_use]
pub fn analyze(
    text: Option<&str>,
    spec: &ManagedBlockSpec,
    equivalence: Option<EquivalenceCheck>,
) -> DriftReport {
    let Some(text) = text else {
        return DriftReport::new(DriftState::Missing, "configuration file does not exist");
    };

    let has_start = text.contains(spec.start_marker());
    let has_end = text.contains(spec.end_marker());

    match (has_start, has_end) {
        (false, false) => {
            if let Some(check) = equivalence {
                let eq = check(text);
                if eq.matched {
                    return DriftReport::new(
                        DriftState::Ok,
                        format!("equivalent configuration present without markers: {}", eq.reason),
                    );
                }
                return DriftReport::new(DriftState::Missing, "no UTF-8 configuration found");
            }
            DriftReport::new(DriftState::Missing, "no managed block markers found")
        }
        (true, false) | (false, true) => DriftReport::new(
            DriftState::Partial,
            "only one marker present (block may be truncated)",
        ),
        (true, true) => compare_block(text, spec),
    }
}

fn compare_block(text: &str, spec: &ManagedBlockSpec) -> DriftReport {
    let blocks = extract_blocks(text, spec);
    match blocks.as_slice() {
        [] => DriftReport::new(
            DriftState::Partial,
            "markers present but out of order (block may be truncated)",
        ),
        [block] => {
            let actual = normalize(block);
            let expected = normalize(&spec.render());
            if actual == expected {
                return DriftReport::new(DriftState::Ok, "matches the canonical template");
            }
            DriftReport::new(DriftState::Modified, first_difference(&expected, &actual))
        }
        many => DriftReport::new(
            DriftState::Duplicate,
            format!("found {} managed blocks", many.len()),
        ),
    }
}

/// Describe the first line where `expected` and `actual` diverge.
fn first_difference(expected: &[String], actual: &[String]) -> String {
    let len = expected.len().max(actual.len());
    for idx in 0..len {
        let e = expected.get(idx).map_or("<extra>", String::as_str);
        let a = actual.get(idx).map_or("<missing>", String::as_str);
        if e != a {
            return format!("line {} differs: expected `{e}`, found `{a}`", idx + 1);
        }
    }
    "block content differs".to_string()
}
