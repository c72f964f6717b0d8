#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::wildcard_imports,
    clippy::indexing_slicing
)]
//! Integration tests for managed block analysis, application and cleaning.
//!
//! These run against the canonical shell templates rather than the small
//! specs used by the unit tests.

use encfix_cli::blocks::{
    DEFAULT_LOCALE, DriftState, END_MARKER, ManagedBlockSpec, START_MARKER, analyze, apply_block,
    clean, posix_shell_equivalent,
};

fn bash() -> ManagedBlockSpec {
    ManagedBlockSpec::posix_shell(DEFAULT_LOCALE)
}

fn pwsh() -> ManagedBlockSpec {
    ManagedBlockSpec::powershell(DEFAULT_LOCALE)
}

/// Inputs covering empty files, user content, stale and repeated blocks.
fn samples(spec: &ManagedBlockSpec) -> Vec<String> {
    let block = spec.render();
    vec![
        String::new(),
        "alias ll='ls -l'\n".to_string(),
        "no trailing newline".to_string(),
        format!("top\n{block}bottom\n"),
        format!("{block}{block}"),
        format!("keep\n{START_MARKER}\n"),
        format!("{END_MARKER}\nkeep\n"),
        format!("{START_MARKER} (old)\nalias l=ls\n"),
        block.replace("LC_ALL", "LC_ALLX"),
    ]
}

// ---------------------------------------------------------------------------
// Idempotence and round-trip
// ---------------------------------------------------------------------------

#[test]
fn applying_twice_never_duplicates_the_block() {
    for spec in [bash(), pwsh()] {
        for text in samples(&spec) {
            let once = apply_block(&text, &spec);
            let (cleaned, _) = clean(&once, &spec);
            let again = apply_block(&cleaned, &spec);
            let (base, _) = clean(&text, &spec);
            assert_eq!(again, apply_block(&base, &spec), "input: {text:?}");
            assert_eq!(apply_block(&once, &spec), once, "input: {text:?}");
            assert_eq!(once.matches(START_MARKER).count(), 1, "input: {text:?}");
        }
    }
}

#[test]
fn applied_text_analyzes_as_ok() {
    for spec in [bash(), pwsh()] {
        for text in samples(&spec) {
            let applied = apply_block(&text, &spec);
            let report = analyze(Some(&applied), &spec, None);
            assert_eq!(report.state, DriftState::Ok, "input: {text:?}");
        }
    }
}

#[test]
fn reapply_keeps_lines_after_an_annotated_marker() {
    let spec = bash();
    let once = apply_block(&format!("{START_MARKER} (old)\nalias l=ls\n"), &spec);
    assert!(once.starts_with("alias l=ls\n\n"));
    assert_eq!(apply_block(&once, &spec), once);
}

#[test]
fn user_content_survives_apply() {
    let applied = apply_block("alias ll='ls -l'\nexport EDITOR=vim\n", &bash());
    assert!(applied.starts_with("alias ll='ls -l'\nexport EDITOR=vim\n\n"));
    assert!(applied.ends_with(&format!("{END_MARKER}\n")));
}

// ---------------------------------------------------------------------------
// Drift classification
// ---------------------------------------------------------------------------

#[test]
fn one_altered_line_is_modified_at_its_index() {
    let spec = bash();
    let applied = apply_block("", &spec);
    let edited = applied.replace(
        &format!("export LC_CTYPE=\"{DEFAULT_LOCALE}\""),
        "export LC_CTYPE=C",
    );
    let report = analyze(Some(&edited), &spec, None);
    assert_eq!(report.state, DriftState::Modified);
    assert!(report.summary.starts_with("line 4 differs"), "{}", report.summary);
}

#[test]
fn complete_block_twice_is_duplicate() {
    let spec = pwsh();
    let text = format!("{}\n{}", spec.render(), spec.render());
    let report = analyze(Some(&text), &spec, None);
    assert_eq!(report.state, DriftState::Duplicate);
    assert_eq!(report.summary, "found 2 managed blocks");
}

#[test]
fn single_marker_is_partial() {
    let text = format!("{START_MARKER}\nexport LANG=C\n");
    assert_eq!(analyze(Some(&text), &bash(), None).state, DriftState::Partial);
}

#[test]
fn absent_file_is_missing() {
    let report = analyze(None, &bash(), Some(posix_shell_equivalent));
    assert_eq!(report.state, DriftState::Missing);
}

// ---------------------------------------------------------------------------
// Partial tolerance
// ---------------------------------------------------------------------------

#[test]
fn start_marker_with_exact_body_is_removed_entirely() {
    let spec = bash();
    let body: String = spec.body().iter().map(|l| format!("{l}\n")).collect();
    let text = format!("{START_MARKER}\n{body}");
    let (cleaned, partial) = clean(&text, &spec);
    assert!(partial);
    assert_eq!(cleaned, "");
}

#[test]
fn unrelated_content_after_unmatched_start_is_kept() {
    let spec = bash();
    let first = spec.body().first().cloned().unwrap();
    let text = format!("before\n{START_MARKER}\n{first}\nalias gs='git status'\nexport PATH=$PATH:~/bin\n");
    let (cleaned, partial) = clean(&text, &spec);
    assert!(partial);
    assert_eq!(cleaned, "before\nalias gs='git status'\nexport PATH=$PATH:~/bin\n");
}

#[test]
fn cleaning_is_stable() {
    let spec = pwsh();
    for text in samples(&spec) {
        let (once, _) = clean(&text, &spec);
        let (twice, changed) = clean(&once, &spec);
        assert_eq!(once, twice, "input: {text:?}");
        assert!(!changed, "input: {text:?}");
    }
}
