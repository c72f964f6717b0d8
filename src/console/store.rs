//! Where console codepages are read from and written to.
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use crate::error::TargetError;

/// Registry value holding a console's codepage.
pub const CODEPAGE_VALUE: &str = "CodePage";

/// Machine key whose `ACP` and `OEMCP` values hold the system codepages.
pub const NLS_CODEPAGE_KEY: &str = r"SYSTEM\CurrentControlSet\Control\Nls\CodePage";

/// Read/write access to the `CodePage` attribute of console sub-targets.
///
/// Only that single attribute is ever touched; other values stored next to
/// it are left alone.
#[cfg_attr(test, mockall::automock)]
pub trait CodepageStore: Send + Sync + std::fmt::Debug {
    /// Current codepage of `key`, or `None` when no value is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the value exists but cannot be read.
    fn read_codepage(&self, key: &str) -> Result<Option<u32>, TargetError>;

    /// Set the codepage of `key`, creating the key when needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the write is rejected.
    fn write_codepage(&self, key: &str, codepage: u32) -> Result<(), TargetError>;

    /// Delete only the codepage value of `key`. Returns `false` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the value exists but cannot be removed.
    fn remove_codepage(&self, key: &str) -> Result<bool, TargetError>;

    /// The machine's ANSI codepage, independent of any console's state.
    fn system_codepage(&self) -> Option<u32>;
}

/// Store backed by `HKCU\Console\<key>`.
#[cfg(windows)]
#[derive(Debug, Default, Clone, Copy)]
pub struct RegistryCodepageStore;

#[cfg(windows)]
impl RegistryCodepageStore {
    fn location(key: &str) -> String {
        format!(r"HKCU\Console\{key}\{CODEPAGE_VALUE}")
    }

    fn classify(key: &str, err: std::io::Error) -> TargetError {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => TargetError::PermissionDenied {
                path: Self::location(key),
            },
            _ => TargetError::Unexpected(format!("{}: {err}", Self::location(key))),
        }
    }

    fn console() -> winreg::RegKey {
        use winreg::RegKey;
        use winreg::enums::HKEY_CURRENT_USER;
        RegKey::predef(HKEY_CURRENT_USER)
    }
}

#[cfg(windows)]
impl CodepageStore for RegistryCodepageStore {
    fn read_codepage(&self, key: &str) -> Result<Option<u32>, TargetError> {
        use std::io::ErrorKind;
        match Self::console().open_subkey(format!(r"Console\{key}")) {
            Ok(sub) => match sub.get_value::<u32, _>(CODEPAGE_VALUE) {
                Ok(v) => Ok(Some(v)),
                Err(ref e) if e.kind() == ErrorKind::NotFound => Ok(None),
                Err(e) => Err(Self::classify(key, e)),
            },
            Err(ref e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::classify(key, e)),
        }
    }

    fn write_codepage(&self, key: &str, codepage: u32) -> Result<(), TargetError> {
        let (sub, _) = Self::console()
            .create_subkey(format!(r"Console\{key}"))
            .map_err(|e| Self::classify(key, e))?;
        sub.set_value(CODEPAGE_VALUE, &codepage)
            .map_err(|e| Self::classify(key, e))
    }

    fn remove_codepage(&self, key: &str) -> Result<bool, TargetError> {
        use std::io::ErrorKind;
        use winreg::enums::KEY_ALL_ACCESS;
        match Self::console().open_subkey_with_flags(format!(r"Console\{key}"), KEY_ALL_ACCESS) {
            Ok(sub) => match sub.delete_value(CODEPAGE_VALUE) {
                Ok(()) => Ok(true),
                Err(ref e) if e.kind() == ErrorKind::NotFound => Ok(false),
                Err(e) => Err(Self::classify(key, e)),
            },
            Err(ref e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Self::classify(key, e)),
        }
    }

    fn system_codepage(&self) -> Option<u32> {
        use winreg::RegKey;
        use winreg::enums::HKEY_LOCAL_MACHINE;
        let nls = RegKey::predef(HKEY_LOCAL_MACHINE)
            .open_subkey(NLS_CODEPAGE_KEY)
            .ok()?;
        ["ACP", "OEMCP"].into_iter().find_map(|name| {
            nls.get_value::<String, _>(name)
                .ok()
                .and_then(|v| parse_codepage(&v))
        })
    }
}

/// Parse a registry codepage string such as `"936"`; zero means unset.
#[must_use]
pub fn parse_codepage(value: &str) -> Option<u32> {
    value.trim().parse().ok().filter(|&cp| cp != 0)
}

/// In-process store for platforms without a console registry, and tests.
///
/// Keys registered with [`deny`](Self::deny) reject writes with
/// `PermissionDenied`.
#[derive(Debug, Default)]
pub struct MemoryCodepageStore {
    values: Mutex<BTreeMap<String, u32>>,
    denied: BTreeSet<String>,
    system: Option<u32>,
}

impl MemoryCodepageStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value.
    #[must_use]
    pub fn with_value(self, key: impl Into<String>, codepage: u32) -> Self {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.into(), codepage);
        }
        self
    }

    /// Report `codepage` as the machine's system codepage.
    #[must_use]
    pub const fn with_system(mut self, codepage: u32) -> Self {
        self.system = Some(codepage);
        self
    }

    /// Reject every write to `key`.
    #[must_use]
    pub fn deny(mut self, key: impl Into<String>) -> Self {
        self.denied.insert(key.into());
        self
    }

    /// Every stored value.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, u32> {
        self.values.lock().map(|v| v.clone()).unwrap_or_default()
    }

    fn check(&self, key: &str) -> Result<(), TargetError> {
        if self.denied.contains(key) {
            return Err(TargetError::PermissionDenied {
                path: format!(r"Console\{key}"),
            });
        }
        Ok(())
    }

    fn poisoned() -> TargetError {
        TargetError::Unexpected("codepage store lock poisoned".to_string())
    }
}

impl CodepageStore for MemoryCodepageStore {
    fn read_codepage(&self, key: &str) -> Result<Option<u32>, TargetError> {
        let values = self.values.lock().map_err(|_| Self::poisoned())?;
        Ok(values.get(key).copied())
    }

    fn write_codepage(&self, key: &str, codepage: u32) -> Result<(), TargetError> {
        self.check(key)?;
        let mut values = self.values.lock().map_err(|_| Self::poisoned())?;
        values.insert(key.to_string(), codepage);
        Ok(())
    }

    fn remove_codepage(&self, key: &str) -> Result<bool, TargetError> {
        self.check(key)?;
        let mut values = self.values.lock().map_err(|_| Self::poisoned())?;
        Ok(values.remove(key).is_some())
    }

    fn system_codepage(&self) -> Option<u32> {
        self.system
    }
}
