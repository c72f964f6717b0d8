//! Sanity checks on loaded settings, reported as warnings.
use super::Settings;

/// A validation warning detected during configuration loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// The settings key that triggered the warning.
    pub item: String,
    /// Human-readable warning message.
    pub message: String,
}

impl ValidationWarning {
    #[must_use]
    fn new(item: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            message: message.into(),
        }
    }
}

/// Whether `locale` names a UTF-8 encoding (`xx_YY.UTF-8` or `.utf8`).
#[must_use]
pub fn is_utf8_locale(locale: &str) -> bool {
    let lower = locale.to_ascii_lowercase();
    lower.ends_with(".utf-8") || lower.ends_with(".utf8")
}

/// Check `settings` for values that load but are probably mistakes.
#[must_use]
pub fn validate(settings: &Settings) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if settings.locale.trim().is_empty() {
        warnings.push(ValidationWarning::new(
            "locale",
            "empty locale, the default is used",
        ));
    } else if !is_utf8_locale(&settings.locale) {
        warnings.push(ValidationWarning::new(
            "locale",
            format!(
                "'{}' does not select a UTF-8 encoding; detection will report drift",
                settings.locale
            ),
        ));
    }

    if settings.cache_capacity == 0 {
        warnings.push(ValidationWarning::new(
            "cache_capacity",
            "capacity 0 is raised to 1",
        ));
    }

    match settings.system_codepage {
        Some(0) => warnings.push(ValidationWarning::new(
            "system_codepage",
            "0 is not a valid codepage; the detected default is used",
        )),
        Some(65001) => warnings.push(ValidationWarning::new(
            "system_codepage",
            "65001 is UTF-8; reset-default will not revert the console",
        )),
        _ => {}
    }

    for (name, path) in settings.paths.entries() {
        if let Some(path) = path
            && !path.is_absolute()
        {
            warnings.push(ValidationWarning::new(
                format!("paths.{name}"),
                format!("'{}' is relative and resolves against the working directory", path.display()),
            ));
        }
    }

    warnings
}
