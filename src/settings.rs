//! Settings file support
//!
//! `deplookup.toml` holds run-wide settings:
//!
//! ```toml
//! concurrency = 8
//!
//! [defaults]
//! rangeStrategy = "pin"
//! minimumReleaseAge = "3d"
//!
//! [[packageRules]]
//! matchPackagePatterns = ["^@types/"]
//! matchUpdateTypes = ["major"]
//! minimumReleaseAge = "2w"
//! ```

use crate::domain::{LookupConfig, PackageRule, RuleOverrides};
use crate::error::SettingsError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings file looked up in the working directory
pub const DEFAULT_SETTINGS_FILE: &str = "deplookup.toml";

/// Parse a duration like `12h`, `10d`, `2w` or `1m` (30 days)
pub fn parse_duration(s: &str) -> Result<Duration, SettingsError> {
    let invalid = || SettingsError::InvalidDuration {
        value: s.to_string(),
    };

    let s = s.trim();
    let (num_str, unit) = if let Some(n) = s.strip_suffix('h') {
        (n, 'h')
    } else if let Some(n) = s.strip_suffix('d') {
        (n, 'd')
    } else if let Some(n) = s.strip_suffix('w') {
        (n, 'w')
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 'm')
    } else {
        return Err(invalid());
    };

    let num: u64 = num_str.trim().parse().map_err(|_| invalid())?;

    let unit_seconds: u64 = match unit {
        'h' => 60 * 60,
        'd' => 24 * 60 * 60,
        'w' => 7 * 24 * 60 * 60,
        _ => 30 * 24 * 60 * 60, // months (30 days)
    };
    let seconds = num.checked_mul(unit_seconds).ok_or_else(invalid)?;

    Ok(Duration::from_secs(seconds))
}

/// Run-wide settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Maximum number of lookups in flight
    pub concurrency: Option<usize>,
    /// Overrides applied to every dependency before its own fields
    pub defaults: RuleOverrides,
    /// Rules evaluated before each dependency's own rules
    pub package_rules: Vec<PackageRule>,
}

impl Settings {
    /// Load settings from a TOML file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| SettingsError::read_error(path, e))?;
        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)
            .map_err(|e| SettingsError::toml_parse_error(path, e.to_string()))?;

        if let Some(age) = &settings.defaults.minimum_release_age {
            parse_duration(age)?;
        }
        for rule in &settings.package_rules {
            if let Some(age) = &rule.overrides.minimum_release_age {
                parse_duration(age)?;
            }
        }
        Ok(settings)
    }

    /// Load `explicit` if given, otherwise `deplookup.toml` if it exists
    pub fn discover(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let path = PathBuf::from(DEFAULT_SETTINGS_FILE);
                if path.is_file() {
                    Self::load(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Build the effective config for one dependency entry.
    ///
    /// `defaults` only fill fields the entry left at their defaults, so the
    /// entry's own values keep precedence.
    pub fn apply_to(&self, entry: &LookupConfig) -> LookupConfig {
        let mut config = LookupConfig::new(entry.dep_name.clone(), entry.datasource.clone());
        self.defaults.apply_to(&mut config);
        let baseline = LookupConfig::new(entry.dep_name.clone(), entry.datasource.clone());

        let mut merged = entry.clone();
        overlay_defaults(&mut merged, &config, &baseline);

        let mut rules = self.package_rules.clone();
        rules.append(&mut merged.package_rules);
        merged.package_rules = rules;
        merged
    }
}

/// Copy fields from `defaults` into `entry` where `entry` still holds the
/// `baseline` value
fn overlay_defaults(entry: &mut LookupConfig, defaults: &LookupConfig, baseline: &LookupConfig) {
    macro_rules! overlay {
        ($($field:ident),* $(,)?) => {
            $(
                if entry.$field == baseline.$field {
                    entry.$field = defaults.$field.clone();
                }
            )*
        };
    }

    overlay!(
        versioning,
        range_strategy,
        follow_tag,
        rollback_prs,
        pin_digests,
        digest_one_and_only,
        update_pinned_dependencies,
        ignore_unstable,
        ignore_deprecated,
        respect_latest,
        allowed_versions,
        ignore_versions,
        separate_major_minor,
        separate_multiple_major,
        separate_minor_patch,
        group_name,
        minimum_release_age,
        internal_checks_filter,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChecksFilter, RangeStrategy};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("12h").unwrap(), Duration::from_secs(12 * 3600));
        assert_eq!(parse_duration("1d").unwrap(), Duration::from_secs(86400));
        assert_eq!(
            parse_duration("2w").unwrap(),
            Duration::from_secs(14 * 86400)
        );
        assert_eq!(
            parse_duration("1m").unwrap(),
            Duration::from_secs(30 * 86400)
        );
    }

    #[test]
    fn test_parse_duration_invalid() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("abc").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("10x").is_err());
        assert!(matches!(
            parse_duration("xd").unwrap_err(),
            SettingsError::InvalidDuration { .. }
        ));
    }

    #[test]
    fn test_parse_duration_overflow() {
        assert!(matches!(
            parse_duration("99999999999999999m").unwrap_err(),
            SettingsError::InvalidDuration { .. }
        ));
        assert!(parse_duration("18446744073709551615h").is_err());
        assert_eq!(
            parse_duration("1000w").unwrap(),
            Duration::from_secs(1000 * 7 * 86400)
        );
    }

    #[test]
    fn test_load_settings() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
concurrency = 4

[defaults]
rangeStrategy = "pin"
minimumReleaseAge = "3d"
internalChecksFilter = "flexible"

[[packageRules]]
matchPackageNames = ["react"]
matchUpdateTypes = ["major"]
minimumReleaseAge = "2w"
"#
        )
        .unwrap();

        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.concurrency, Some(4));
        assert_eq!(settings.defaults.range_strategy, Some(RangeStrategy::Pin));
        assert_eq!(
            settings.defaults.internal_checks_filter,
            Some(ChecksFilter::Flexible)
        );
        assert_eq!(settings.package_rules.len(), 1);
        assert_eq!(
            settings.package_rules[0].overrides.minimum_release_age.as_deref(),
            Some("2w")
        );
    }

    #[test]
    fn test_load_rejects_invalid_duration() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[defaults]\nminimumReleaseAge = \"soon\"\n").unwrap();
        let err = Settings::load(file.path()).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidDuration { .. }));
    }

    #[test]
    fn test_load_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "concurrency = [").unwrap();
        let err = Settings::load(file.path()).unwrap_err();
        assert!(matches!(err, SettingsError::TomlParseError { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Settings::load(Path::new("/nonexistent/deplookup.toml")).unwrap_err();
        assert!(matches!(err, SettingsError::ReadError { .. }));
    }

    #[test]
    fn test_apply_to_entry_values_win() {
        let settings = Settings {
            defaults: RuleOverrides {
                range_strategy: Some(RangeStrategy::Pin),
                ignore_unstable: Some(false),
                ..RuleOverrides::default()
            },
            package_rules: vec![PackageRule {
                match_package_names: vec!["a".to_string()],
                ..PackageRule::default()
            }],
            ..Settings::default()
        };

        let entry = LookupConfig::new("a", "npm")
            .with_current_value("^1.0.0")
            .with_range_strategy(RangeStrategy::Replace);
        let config = settings.apply_to(&entry);

        assert_eq!(config.range_strategy, RangeStrategy::Replace);
        assert!(!config.ignore_unstable);
        assert_eq!(config.current_value.as_deref(), Some("^1.0.0"));
        assert_eq!(config.package_rules.len(), 1);
    }

    #[test]
    fn test_apply_to_settings_rules_come_first() {
        let settings = Settings {
            package_rules: vec![PackageRule {
                match_datasources: vec!["npm".to_string()],
                ..PackageRule::default()
            }],
            ..Settings::default()
        };
        let mut entry = LookupConfig::new("a", "npm");
        entry.package_rules.push(PackageRule {
            match_package_names: vec!["a".to_string()],
            ..PackageRule::default()
        });

        let config = settings.apply_to(&entry);
        assert_eq!(config.package_rules[0].match_datasources, vec!["npm"]);
        assert_eq!(config.package_rules[1].match_package_names, vec!["a"]);
    }
}
