//! Configuration management and validation.
//!
//! Loads the JSON application configuration (`appconfig.json`), validates
//! it, and exposes the key-field table used by the export parser together
//! with the output encoding of the race list file.

use crate::constants::{DEFAULT_EXPORT_PATTERN, key_fields};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default configuration file name, looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "appconfig.json";

/// Locates one logical field inside an export row
///
/// The parser finds the first cell equal to `key` (trimmed, case-insensitive)
/// and reads the cell `offset` columns to its right.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyFieldConfig {
    /// Label cell to search for
    #[serde(rename = "key", alias = "Key")]
    pub key: String,

    /// Column offset from the label cell to the value cell
    #[serde(rename = "offset", alias = "Offset")]
    pub offset: i64,

    /// Trailing words stripped from the value (longest match, at most one)
    #[serde(
        rename = "suffix_stop_words",
        alias = "SuffixStopWords",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub suffix_stop_words: Option<Vec<String>>,
}

impl KeyFieldConfig {
    /// Create a key field without stop words
    pub fn new(key: impl Into<String>, offset: i64) -> Self {
        Self {
            key: key.into(),
            offset,
            suffix_stop_words: None,
        }
    }

    /// Attach suffix stop words
    pub fn with_stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suffix_stop_words = Some(words.into_iter().map(Into::into).collect());
        self
    }
}

/// Text encoding of the persisted race list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputEncoding {
    /// 7-bit ASCII; other characters are written as `?`
    #[default]
    Ascii,
    /// UTF-8 without byte order mark
    Utf8,
    /// UTF-16 little endian with byte order mark
    Utf16,
}

impl OutputEncoding {
    /// Parse a configured encoding name, rejecting unknown values
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ascii" => Ok(Self::Ascii),
            "utf-8" | "utf8" => Ok(Self::Utf8),
            "utf-16" | "utf16" => Ok(Self::Utf16),
            other => Err(Error::configuration(format!(
                "Unsupported output encoding '{}'. Expected one of: ascii, utf-8, utf-16",
                other
            ))),
        }
    }

    /// Lenient lookup: unknown or blank names fall back to ASCII
    pub fn lookup(value: &str) -> Self {
        Self::parse(value).unwrap_or_default()
    }

    /// Canonical configuration name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ascii => "ascii",
            Self::Utf8 => "utf-8",
            Self::Utf16 => "utf-16",
        }
    }

    /// Encode text for writing to disk
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            Self::Ascii => text
                .chars()
                .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
                .collect(),
            Self::Utf8 => text.as_bytes().to_vec(),
            Self::Utf16 => {
                let mut bytes = Vec::with_capacity(2 + text.len() * 2);
                bytes.extend_from_slice(&[0xFF, 0xFE]);
                for unit in text.encode_utf16() {
                    bytes.extend_from_slice(&unit.to_le_bytes());
                }
                bytes
            }
        }
    }
}

/// On-disk shape of the configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawAppConfig {
    #[serde(
        rename = "GcpvExportFilePattern",
        alias = "gcpv_export_file_pattern",
        default
    )]
    gcpv_export_file_pattern: String,

    #[serde(rename = "KeyFields", alias = "key_fields", default)]
    key_fields: HashMap<String, KeyFieldConfig>,

    #[serde(
        rename = "OutputEncoding",
        alias = "output_encoding",
        default = "default_encoding_name"
    )]
    output_encoding: String,

    #[serde(
        rename = "EvtBackupDirectory",
        alias = "evt_backup_directory",
        default = "default_backup_directory"
    )]
    evt_backup_directory: String,

    #[serde(
        rename = "EnableNotificationSound",
        alias = "enable_notification_sound",
        default = "default_true"
    )]
    enable_notification_sound: bool,

    #[serde(
        rename = "NotificationSoundPath",
        alias = "notification_sound_path",
        default
    )]
    notification_sound_path: Option<String>,
}

fn default_encoding_name() -> String {
    OutputEncoding::Ascii.name().to_string()
}

fn default_backup_directory() -> String {
    "backups".to_string()
}

fn default_true() -> bool {
    true
}

/// Validated application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Glob matched against export file names
    pub export_file_pattern: String,

    /// Key-field table, by logical field name
    pub key_fields: HashMap<String, KeyFieldConfig>,

    /// Encoding of the persisted race list
    pub output_encoding: OutputEncoding,

    /// Backup directory, relative to the output directory unless absolute
    pub backup_directory: PathBuf,

    /// Whether the presentation layer should play a sound on updates
    pub enable_notification_sound: bool,

    /// Sound file played on updates
    pub notification_sound_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            export_file_pattern: DEFAULT_EXPORT_PATTERN.to_string(),
            key_fields: HashMap::new(),
            output_encoding: OutputEncoding::Ascii,
            backup_directory: PathBuf::from(default_backup_directory()),
            enable_notification_sound: true,
            notification_sound_path: None,
        }
    }
}

impl AppConfig {
    /// Load and validate configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading configuration from {}", path.display());

        if !path.exists() {
            return Err(Error::configuration(format!(
                "Configuration file '{}' not found",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::io(
                format!("Failed to read configuration file {}", path.display()),
                e,
            )
        })?;

        Self::from_json(&content)
    }

    /// Parse and validate configuration from JSON text
    pub fn from_json(content: &str) -> Result<Self> {
        let raw: RawAppConfig = serde_json::from_str(content)?;

        let output_encoding = OutputEncoding::parse(&raw.output_encoding)?;

        let export_file_pattern = if raw.gcpv_export_file_pattern.trim().is_empty() {
            DEFAULT_EXPORT_PATTERN.to_string()
        } else {
            raw.gcpv_export_file_pattern.trim().to_string()
        };

        let config = Self {
            export_file_pattern,
            key_fields: raw.key_fields,
            output_encoding,
            backup_directory: PathBuf::from(raw.evt_backup_directory),
            enable_notification_sound: raw.enable_notification_sound,
            notification_sound_path: raw
                .notification_sound_path
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
        };

        config.validate()?;
        debug!(
            "Configuration loaded: pattern={}, encoding={}, {} key fields",
            config.export_file_pattern,
            config.output_encoding.name(),
            config.key_fields.len()
        );
        Ok(config)
    }

    /// Check that the configuration is usable for watching
    pub fn validate(&self) -> Result<()> {
        glob::Pattern::new(&self.export_file_pattern).map_err(|e| {
            Error::configuration(format!(
                "Invalid export file pattern '{}': {}",
                self.export_file_pattern, e
            ))
        })?;

        let missing: Vec<&str> = key_fields::ALL
            .iter()
            .copied()
            .filter(|name| !self.key_fields.contains_key(*name))
            .collect();
        if !missing.is_empty() {
            return Err(Error::configuration(format!(
                "Missing key field configuration for: {}",
                missing.join(", ")
            )));
        }

        for (name, field) in &self.key_fields {
            if field.key.trim().is_empty() {
                return Err(Error::configuration(format!(
                    "Key field '{}' has an empty label",
                    name
                )));
            }
        }

        if self.backup_directory.as_os_str().is_empty() {
            return Err(Error::configuration(
                "Backup directory cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Compiled export file glob
    pub fn export_pattern(&self) -> Result<glob::Pattern> {
        glob::Pattern::new(&self.export_file_pattern).map_err(|e| {
            Error::configuration(format!(
                "Invalid export file pattern '{}': {}",
                self.export_file_pattern, e
            ))
        })
    }

    /// Backup directory resolved against the output directory
    pub fn backup_dir_for(&self, output_dir: &Path) -> PathBuf {
        if self.backup_directory.is_absolute() {
            self.backup_directory.clone()
        } else {
            output_dir.join(&self.backup_directory)
        }
    }

    /// Per-user configuration location
    pub fn default_config_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("gcpv-watcher").join(CONFIG_FILE_NAME))
            .ok_or_else(|| Error::configuration("Could not determine config directory"))
    }

    /// Resolve the configuration file to load
    ///
    /// An explicit path wins; otherwise `appconfig.json` in the working
    /// directory, then the per-user location.
    pub fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            return Ok(path.to_path_buf());
        }

        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return Ok(local);
        }

        let user = Self::default_config_path()?;
        if user.exists() {
            Ok(user)
        } else {
            Err(Error::configuration(format!(
                "No configuration found at ./{} or {}",
                CONFIG_FILE_NAME,
                user.display()
            )))
        }
    }

    /// Add or replace one key field
    pub fn with_key_field(mut self, name: &str, field: KeyFieldConfig) -> Self {
        self.key_fields.insert(name.to_string(), field);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json(encoding: &str) -> String {
        format!(
            r#"{{
  "GcpvExportFilePattern": "*.csv",
  "OutputEncoding": "{}",
  "EvtBackupDirectory": "evt_backups",
  "KeyFields": {{
    "track_params": {{ "key": "Event :", "offset": 1 }},
    "race_group": {{ "key": "Event :", "offset": 2, "suffix_stop_words": ["male", "female", "Genders Mixed"] }},
    "stage": {{ "key": "Stage :", "offset": 1 }},
    "race_number": {{ "key": "Race", "offset": 1 }},
    "lane": {{ "key": "Lane", "offset": 3 }},
    "racer": {{ "key": "Skaters", "offset": 3 }},
    "affiliation": {{ "key": "Club", "offset": 3 }}
  }}
}}"#,
            encoding
        )
    }

    #[test]
    fn test_load_full_configuration() {
        let config = AppConfig::from_json(&sample_json("utf-16")).unwrap();

        assert_eq!(config.export_file_pattern, "*.csv");
        assert_eq!(config.output_encoding, OutputEncoding::Utf16);
        assert_eq!(config.backup_directory, PathBuf::from("evt_backups"));
        assert!(config.enable_notification_sound);
        assert_eq!(config.key_fields.len(), 7);

        let race_group = &config.key_fields["race_group"];
        assert_eq!(race_group.key, "Event :");
        assert_eq!(race_group.offset, 2);
        assert_eq!(
            race_group.suffix_stop_words.as_deref(),
            Some(&["male".to_string(), "female".to_string(), "Genders Mixed".to_string()][..])
        );
        assert!(config.key_fields["lane"].suffix_stop_words.is_none());
    }

    #[test]
    fn test_unknown_encoding_is_fatal_at_load() {
        let err = AppConfig::from_json(&sample_json("latin-1")).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_missing_key_field_rejected() {
        let json = r#"{ "GcpvExportFilePattern": "*.csv", "KeyFields": {} }"#;
        let err = AppConfig::from_json(json).unwrap_err();
        assert!(err.to_string().contains("track_params"));
    }

    #[test]
    fn test_blank_pattern_defaults_to_csv() {
        let json = sample_json("ascii").replace("\"*.csv\"", "\"\"");
        let config = AppConfig::from_json(&json).unwrap();
        assert_eq!(config.export_file_pattern, DEFAULT_EXPORT_PATTERN);
    }

    #[test]
    fn test_invalid_glob_rejected() {
        let json = sample_json("ascii").replace("\"*.csv\"", "\"[*.csv\"");
        assert!(AppConfig::from_json(&json).is_err());
    }

    #[test]
    fn test_encoding_lookup_defaults_to_ascii() {
        assert_eq!(OutputEncoding::lookup("ASCII"), OutputEncoding::Ascii);
        assert_eq!(OutputEncoding::lookup("UTF-8"), OutputEncoding::Utf8);
        assert_eq!(OutputEncoding::lookup("utf-16"), OutputEncoding::Utf16);
        assert_eq!(OutputEncoding::lookup("invalid-encoding"), OutputEncoding::Ascii);
        assert_eq!(OutputEncoding::lookup(""), OutputEncoding::Ascii);
    }

    #[test]
    fn test_encode_variants() {
        assert_eq!(OutputEncoding::Ascii.encode("Zoë"), b"Zo?".to_vec());
        assert_eq!(OutputEncoding::Utf8.encode("Zoë"), "Zoë".as_bytes().to_vec());
        assert_eq!(
            OutputEncoding::Utf16.encode("A\n"),
            vec![0xFF, 0xFE, b'A', 0x00, b'\n', 0x00]
        );
    }

    #[test]
    fn test_backup_dir_resolution() {
        let config = AppConfig::default();
        assert_eq!(
            config.backup_dir_for(Path::new("/lynx")),
            PathBuf::from("/lynx/backups")
        );
    }
}
