//! Tolerant removal and re-application of managed blocks.
use std::collections::HashSet;

use super::analyze::block_ranges;
use super::spec::ManagedBlockSpec;

/// Remove the managed block from `text`.
///
/// Every complete span is removed first. Then an unmatched start marker line
/// is dropped together with the template lines directly after it, and an
/// unmatched end marker line together with the template lines directly
/// before it. The fragment scan stops at the first blank or foreign line, so
/// only lines identical to the template are removed outside a complete span.
///
/// A line counts as a marker line when it contains the marker anywhere, the
/// same rule [`analyze`](super::analyze) uses, so text sharing a line with a
/// marker goes with it. A user line that happens to quote a marker is
/// indistinguishable from a real one.
///
/// Returns the cleaned text and whether a half-written fragment was removed.
/// Cleaning twice yields the same text as cleaning once.
///
/// # Examples
///
/// ```
/// use encfix_cli::blocks::{ManagedBlockSpec, clean};
///
/// let spec = ManagedBlockSpec::new("# start", "# end", ["export A=1"]);
/// let (text, partial) = clean("keep\n# start\nexport A=1\n", &spec);
/// assert_eq!(text, "keep\n");
/// assert!(partial);
/// ```
#[must_use]
pub fn clean(text: &str, spec: &ManagedBlockSpec) -> (String, bool) {
    let without_spans = remove_spans(text, spec);

    let start = spec.start_marker().trim();
    let end = spec.end_marker().trim();
    let body: HashSet<&str> = spec
        .body()
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();
    let is_body = |line: &str| {
        let t = line.trim();
        !t.is_empty() && body.contains(t)
    };

    let mut lines: Vec<&str> = without_spans.split_inclusive('\n').collect();
    let mut changed = false;

    let mut i = 0;
    while let Some(line) = lines.get(i) {
        let unmatched_start =
            line.contains(start) && !lines.iter().skip(i + 1).any(|l| l.contains(end));
        if unmatched_start {
            let run = lines.iter().skip(i + 1).take_while(|l| is_body(l)).count();
            lines.drain(i..=i + run);
            changed = true;
        } else {
            i += 1;
        }
    }

    let mut i = lines.len();
    while i > 0 {
        i -= 1;
        let Some(line) = lines.get(i) else {
            break;
        };
        let unmatched_end =
            line.contains(end) && !lines.iter().take(i).any(|l| l.contains(start));
        if unmatched_end {
            let run = lines.iter().take(i).rev().take_while(|l| is_body(l)).count();
            lines.drain(i - run..=i);
            i -= run;
            changed = true;
        }
    }

    (lines.concat(), changed)
}

/// Cut every complete start…end span out of `text`.
fn remove_spans(text: &str, spec: &ManagedBlockSpec) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for (start, end) in block_ranges(text, spec) {
        out.push_str(text.get(cursor..start).unwrap_or_default());
        cursor = end;
    }
    out.push_str(text.get(cursor..).unwrap_or_default());
    out
}

/// Converge `existing` to exactly one canonical block.
///
/// User content outside the block is kept; the block is appended after a
/// blank line and the result ends with a single newline.
///
/// # Examples
///
/// ```
/// use encfix_cli::blocks::{ManagedBlockSpec, apply_block};
///
/// let spec = ManagedBlockSpec::new("# start", "# end", ["export A=1"]);
/// let once = apply_block("alias l=ls\n", &spec);
/// assert_eq!(once, "alias l=ls\n\n# start\nexport A=1\n# end\n");
/// assert_eq!(apply_block(&once, &spec), once);
/// ```
#[must_use]
pub fn apply_block(existing: &str, spec: &ManagedBlockSpec) -> String {
    let (cleaned, _) = clean(existing, spec);
    let combined = format!("{}\n\n{}", cleaned.trim(), spec.render());
    format!("{}\n", combined.trim())
}
