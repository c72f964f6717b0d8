//! Run log location, escape stripping and timestamps.
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

static ESCAPES: LazyLock<Regex> = LazyLock::new(escape_pattern);

#[allow(clippy::expect_used)]
fn escape_pattern() -> Regex {
    // CSI sequences (colors, cursor, erase) and two-byte escapes like `ESC M`.
    Regex::new(r"\x1b(?:\[[0-?]*[ -/]*[@-~]|[@-_])").expect("literal pattern compiles")
}

/// Remove terminal escape sequences so the log file stays plain text.
pub(super) fn strip_ansi(s: &str) -> String {
    ESCAPES.replace_all(s, "").into_owned()
}

/// Directory for run logs, created on demand.
///
/// `XDG_CACHE_HOME` takes precedence; Windows otherwise uses
/// `%LOCALAPPDATA%\encfix\logs`, anything else `~/.cache/encfix`.
fn log_dir() -> Option<PathBuf> {
    let var = |name: &str| std::env::var_os(name).filter(|v| !v.is_empty());
    let dir = if let Some(cache) = var("XDG_CACHE_HOME") {
        PathBuf::from(cache).join("encfix")
    } else if let Some(local) = var("LOCALAPPDATA") {
        PathBuf::from(local).join("encfix").join("logs")
    } else {
        var("HOME")
            .or_else(|| var("USERPROFILE"))
            .map_or_else(|| PathBuf::from("."), PathBuf::from)
            .join(".cache")
            .join("encfix")
    };
    std::fs::create_dir_all(&dir).ok()?;
    Some(dir)
}

/// `<log dir>/<command>.log`, or `None` when the directory is unusable.
pub(super) fn log_file_path(command: &str) -> Option<PathBuf> {
    let mut name = OsString::from(command);
    name.push(".log");
    Some(log_dir()?.join(name))
}

/// Local wall-clock time for each log line.
pub(super) fn clock() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

/// Local date, time and UTC offset for the run header.
pub(super) fn started_at() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S %:z").to_string()
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn color_codes_are_removed() {
        assert_eq!(strip_ansi("\x1b[31mERROR\x1b[0m denied"), "ERROR denied");
        assert_eq!(
            strip_ansi("\x1b[1;34m==>\x1b[0m \x1b[1mConfigure Git Bash\x1b[0m"),
            "==> Configure Git Bash"
        );
        assert_eq!(strip_ansi("chcp 65001"), "chcp 65001");
    }

    #[test]
    fn cursor_and_erase_sequences_are_removed() {
        assert_eq!(strip_ansi("\x1b[2Jcleared"), "cleared");
        assert_eq!(strip_ansi("\x1b[Kline"), "line");
        assert_eq!(strip_ansi("\x1bMup"), "up");
    }

    #[test]
    fn log_file_is_named_after_the_command() {
        let _lock = crate::logging::TEST_ENV_MUTEX
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let tmp = tempfile::tempdir().unwrap();
        // SAFETY: Protected by TEST_ENV_MUTEX; restored before the lock is released.
        #[allow(unsafe_code)]
        unsafe {
            std::env::set_var("XDG_CACHE_HOME", tmp.path());
        }
        let path = log_file_path("restore");
        #[allow(unsafe_code)]
        unsafe {
            std::env::remove_var("XDG_CACHE_HOME");
        }
        assert_eq!(path, Some(tmp.path().join("encfix").join("restore.log")));
        assert!(tmp.path().join("encfix").is_dir());
    }

    #[test]
    fn timestamps_have_expected_shape() {
        let time = clock();
        assert_eq!(time.len(), 8);
        assert_eq!(&time[2..3], ":");
        let header = started_at();
        assert_eq!(&header[4..5], "-");
        assert_eq!(&header[10..11], " ");
        assert!(header.len() >= 26, "{header}");
    }
}
