//! Write-once records of each target's pre-tool state.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};

use crate::operations::FileSystemOps;
use crate::target::TargetKey;

/// Payload stored for a target that did not exist or was empty.
pub const EMPTY_SENTINEL: &str = "__EMPTY_BACKUP__";

/// Decoded content of a backup record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupPayload {
    /// The target was absent or blank before the first apply.
    Absent,
    /// Verbatim original bytes.
    Content(Vec<u8>),
}

impl BackupPayload {
    fn from_bytes(bytes: Vec<u8>) -> Self {
        if bytes == EMPTY_SENTINEL.as_bytes() {
            Self::Absent
        } else {
            Self::Content(bytes)
        }
    }

    fn to_bytes(&self) -> &[u8] {
        match self {
            Self::Absent => EMPTY_SENTINEL.as_bytes(),
            Self::Content(bytes) => bytes,
        }
    }
}

/// What [`BackupLedger::ensure`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// A record already existed and was left alone.
    AlreadyRecorded,
    /// Recorded the absence sentinel.
    RecordedAbsent,
    /// Recorded the current bytes.
    RecordedContent,
    /// Current content is tool-authored; nothing recorded.
    SkippedToolAuthored,
}

/// Original codepage of one console sub-target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodepageEntry {
    /// The sub-target had no `CodePage` value.
    Absent,
    /// The value that was present.
    Value(u32),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum StoredEntry {
    Value(u32),
    Sentinel(String),
    Legacy {
        #[serde(rename = "CodePage")]
        code_page: Option<u32>,
    },
}

impl StoredEntry {
    fn decode(self) -> Option<CodepageEntry> {
        match self {
            Self::Value(v) | Self::Legacy { code_page: Some(v) } => Some(CodepageEntry::Value(v)),
            Self::Legacy { code_page: None } => Some(CodepageEntry::Absent),
            Self::Sentinel(s) if s == EMPTY_SENTINEL => Some(CodepageEntry::Absent),
            Self::Sentinel(_) => None,
        }
    }

    fn encode(entry: CodepageEntry) -> Self {
        match entry {
            CodepageEntry::Absent => Self::Sentinel(EMPTY_SENTINEL.to_string()),
            CodepageEntry::Value(v) => Self::Value(v),
        }
    }
}

/// Console record: normalized sub-target key to its original codepage.
pub type CodepageRecord = BTreeMap<String, CodepageEntry>;

/// One `<key>.orig` file per target inside a backup directory.
///
/// Records are write-once: [`ensure`](Self::ensure) never replaces an
/// existing record, so restore always returns to the state before the very
/// first apply.
#[derive(Debug, Clone)]
pub struct BackupLedger {
    dir: PathBuf,
    fs: Arc<dyn FileSystemOps>,
}

impl BackupLedger {
    /// Create a ledger rooted at `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, fs: Arc<dyn FileSystemOps>) -> Self {
        Self {
            dir: dir.into(),
            fs,
        }
    }

    /// Directory holding the records.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record for `key`.
    #[must_use]
    pub fn record_path(&self, key: TargetKey) -> PathBuf {
        self.dir.join(format!("{}.orig", key.as_str()))
    }

    /// Whether a record exists for `key`.
    #[must_use]
    pub fn has(&self, key: TargetKey) -> bool {
        self.fs.exists(&self.record_path(key))
    }

    /// Whether any record exists.
    #[must_use]
    pub fn has_any(&self) -> bool {
        TargetKey::ALL.into_iter().any(|k| self.has(k))
    }

    /// Record `current` for `key` unless a record already exists.
    ///
    /// `None` and whitespace-only content record the absence sentinel.
    /// Content for which `tool_authored` returns `true` is not recorded.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    pub fn ensure(
        &self,
        key: TargetKey,
        current: Option<&[u8]>,
        tool_authored: impl Fn(&str) -> bool,
    ) -> Result<EnsureOutcome> {
        if self.has(key) {
            return Ok(EnsureOutcome::AlreadyRecorded);
        }
        let payload = match current {
            None => BackupPayload::Absent,
            Some(bytes) => {
                let text = String::from_utf8_lossy(bytes);
                if text.trim().is_empty() {
                    BackupPayload::Absent
                } else if tool_authored(&text) {
                    return Ok(EnsureOutcome::SkippedToolAuthored);
                } else {
                    BackupPayload::Content(bytes.to_vec())
                }
            }
        };
        self.write_record(key, payload.to_bytes())?;
        Ok(match payload {
            BackupPayload::Absent => EnsureOutcome::RecordedAbsent,
            BackupPayload::Content(_) => EnsureOutcome::RecordedContent,
        })
    }

    /// Read the record for `key`, or `None` when there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if the record exists but cannot be read.
    pub fn read(&self, key: TargetKey) -> Result<Option<BackupPayload>> {
        let path = self.record_path(key);
        let bytes = self
            .fs
            .read(&path)
            .with_context(|| format!("reading backup {}", path.display()))?;
        Ok(bytes.map(BackupPayload::from_bytes))
    }

    /// Read the console record. Unknown entries are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be read or is not a JSON object.
    pub fn read_codepages(&self) -> Result<Option<CodepageRecord>> {
        let path = self.record_path(TargetKey::Console);
        let Some(bytes) = self
            .fs
            .read(&path)
            .with_context(|| format!("reading backup {}", path.display()))?
        else {
            return Ok(None);
        };
        let raw: BTreeMap<String, StoredEntry> = serde_json::from_slice(&bytes)
            .with_context(|| format!("parsing backup {}", path.display()))?;
        Ok(Some(
            raw.into_iter()
                .filter_map(|(k, v)| v.decode().map(|e| (k, e)))
                .collect(),
        ))
    }

    /// Merge `entries` into the console record without replacing any
    /// sub-target that is already recorded. Returns the keys that were added.
    ///
    /// # Errors
    ///
    /// Returns an error if the existing record is unreadable or the merged
    /// record cannot be written.
    pub fn merge_codepages(&self, entries: &CodepageRecord) -> Result<Vec<String>> {
        let mut record = self.read_codepages()?.unwrap_or_default();
        let mut added = Vec::new();
        for (key, entry) in entries {
            if !record.contains_key(key) {
                record.insert(key.clone(), *entry);
                added.push(key.clone());
            }
        }
        if added.is_empty() {
            return Ok(added);
        }
        let stored: BTreeMap<&String, StoredEntry> = record
            .iter()
            .map(|(k, v)| (k, StoredEntry::encode(*v)))
            .collect();
        let json = serde_json::to_vec_pretty(&stored).context("serializing console backup")?;
        self.write_record(TargetKey::Console, &json)?;
        Ok(added)
    }

    /// Delete the record for `key`. Returns `false` if there was none.
    ///
    /// # Errors
    ///
    /// Returns an error if the record exists but cannot be removed.
    pub fn clear(&self, key: TargetKey) -> Result<bool> {
        let path = self.record_path(key);
        self.fs
            .remove_file(&path)
            .with_context(|| format!("removing backup {}", path.display()))
    }

    /// Delete every record and the backup directory when it is left empty.
    ///
    /// Every record is attempted even after one fails to be removed.
    ///
    /// # Errors
    ///
    /// Returns an error naming each record that could not be removed.
    pub fn clear_all(&self) -> Result<()> {
        let failures: Vec<String> = TargetKey::ALL
            .into_iter()
            .filter_map(|key| self.clear(key).err().map(|e| format!("{e:#}")))
            .collect();
        if !failures.is_empty() {
            anyhow::bail!("{} backup(s) kept: {}", failures.len(), failures.join("; "));
        }
        self.fs
            .remove_dir_if_empty(&self.dir)
            .with_context(|| format!("removing backup directory {}", self.dir.display()))
    }

    fn write_record(&self, key: TargetKey, bytes: &[u8]) -> Result<()> {
        let path = self.record_path(key);
        self.fs
            .write(&path, bytes)
            .with_context(|| format!("writing backup {}", path.display()))
    }
}
