//! Host platform detection.

use std::fmt;

/// Detected operating system platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    /// Linux and other Unix-like systems.
    Linux,
    /// Windows.
    Windows,
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linux => write!(f, "linux"),
            Self::Windows => write!(f, "windows"),
        }
    }
}

/// Platform information for the current system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    /// Operating system family.
    pub os: Os,
}

impl Platform {
    /// Detect the current platform.
    #[must_use]
    pub const fn detect() -> Self {
        Self {
            os: if cfg!(target_os = "windows") {
                Os::Windows
            } else {
                Os::Linux
            },
        }
    }

    /// Create a platform with an explicit OS.
    #[must_use]
    pub const fn new(os: Os) -> Self {
        Self { os }
    }

    /// Whether the console registry and Windows-only hosts exist.
    #[must_use]
    pub fn is_windows(&self) -> bool {
        self.os == Os::Windows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_matches_compile_target() {
        let platform = Platform::detect();
        assert_eq!(platform.is_windows(), cfg!(target_os = "windows"));
    }

    #[test]
    fn display_is_lowercase() {
        assert_eq!(Os::Windows.to_string(), "windows");
        assert_eq!(Platform::new(Os::Linux).os.to_string(), "linux");
    }
}
