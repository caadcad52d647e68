//! Runtime configuration
//!
//! Loaded once at startup from a JSON file; everything has a default so an
//! empty `{}` is a valid config.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, SolfaError};
use crate::session::DEFAULT_SESSION_TTL_SECS;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Delimited content table (items).
    pub items_path: PathBuf,
    /// Optional speech-name override table.
    pub speech_names_path: Option<PathBuf>,
    /// Optional phrase book replacing the built-in English one.
    pub phrases_path: Option<PathBuf>,
    /// Speech audio-cue template with a `{key}` placeholder; when unset,
    /// audio cues degrade to nothing.
    pub audio_tag_template: Option<String>,
    /// Append display-only debug blocks to level replies.
    pub debug: bool,
    /// Seconds of inactivity before a session is pruned.
    pub session_ttl_secs: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            items_path: PathBuf::from("data/items.csv"),
            speech_names_path: None,
            phrases_path: None,
            audio_tag_template: None,
            debug: false,
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| SolfaError::DataLoad {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_object_is_a_valid_config() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.session_ttl_secs, DEFAULT_SESSION_TTL_SECS);
        assert!(!config.debug);
        assert!(config.phrases_path.is_none());
    }

    #[test]
    fn fields_override_defaults() {
        let json = r#"{
            "items_path": "content/table.csv",
            "debug": true,
            "session_ttl_secs": 60,
            "audio_tag_template": "<audio:{key}>"
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.items_path, PathBuf::from("content/table.csv"));
        assert!(config.debug);
        assert_eq!(config.session_ttl_secs, 60);
    }

    #[test]
    fn load_reports_the_missing_path() {
        let err = Config::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, SolfaError::DataLoad { .. }));
    }

    #[test]
    fn load_reads_a_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "debug": true }}"#).unwrap();
        let config = Config::load(file.path()).unwrap();
        assert!(config.debug);
    }
}
