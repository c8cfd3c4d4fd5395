//! Config-file defaults.
//!
//! Optional YAML files supply default CLI arguments: `~/.newswire.yaml`
//! (user level) then `./newswire.yaml` (project level, overriding the user
//! file). CLI flags always win over both. Keys may use dashes or
//! underscores; unknown keys are ignored. A file that fails to parse logs a
//! warning and is skipped; config-file absence is never an error.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{debug, warn};

/// Defaults loadable from a config file. Every field is optional; `None`
/// means "not configured" and defers to the CLI or the built-in default.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileConfig {
    pub format: Option<String>,
    pub limit: Option<usize>,
    pub category: Option<String>,
    pub exclude_category: Option<String>,
    pub source: Option<String>,
    pub exclude_source: Option<String>,
    pub search: Option<String>,
    pub exclude: Option<String>,
    pub since: Option<String>,
    pub min_quality: Option<f64>,
    pub lang: Option<String>,
    pub exclude_lang: Option<String>,
    pub tone: Option<String>,
    pub no_doom: Option<bool>,
    pub timeout: Option<u64>,
    pub max_workers: Option<usize>,
    pub source_timeout: Option<u64>,
    pub retries: Option<u32>,
    pub dedupe_threshold: Option<f64>,
    pub no_dedupe: Option<bool>,
    pub disable: Option<String>,
    pub only: Option<String>,
    pub profile: Option<String>,
    pub interests: Option<String>,
    pub min_relevance: Option<f64>,
    pub stories: Option<bool>,
}

impl FileConfig {
    /// Overlay `other` on top of `self`: set fields in `other` win.
    pub fn merged_with(mut self, other: FileConfig) -> FileConfig {
        macro_rules! take {
            ($($field:ident),* $(,)?) => {
                $( if other.$field.is_some() { self.$field = other.$field; } )*
            };
        }
        take!(
            format, limit, category, exclude_category, source, exclude_source, search, exclude,
            since, min_quality, lang, exclude_lang, tone, no_doom, timeout, max_workers,
            source_timeout, retries, dedupe_threshold, no_dedupe, disable, only, profile,
            interests, min_relevance, stories,
        );
        self
    }
}

/// Candidate config paths, user level first.
fn config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".newswire.yaml"));
        paths.push(home.join(".newswire.yml"));
    }
    paths.push(PathBuf::from("newswire.yaml"));
    paths.push(PathBuf::from("newswire.yml"));
    paths
}

/// Load and merge all existing config files, later (project) files winning.
pub fn load_config() -> FileConfig {
    let mut config = FileConfig::default();
    for path in config_paths() {
        if let Some(file) = load_file(&path) {
            debug!(path = %path.display(), "loaded config file");
            config = config.merged_with(file);
        }
    }
    config
}

/// Parse one config file, normalizing dashed keys to underscores.
pub fn load_file(path: &PathBuf) -> Option<FileConfig> {
    let raw = std::fs::read_to_string(path).ok()?;
    let value: serde_yaml::Value = match serde_yaml::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to parse config file");
            return None;
        }
    };
    let normalized = normalize_keys(value);
    match serde_yaml::from_value(normalized) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "config file has invalid values");
            None
        }
    }
}

fn normalize_keys(value: serde_yaml::Value) -> serde_yaml::Value {
    match value {
        serde_yaml::Value::Mapping(map) => {
            let normalized = map
                .into_iter()
                .map(|(k, v)| {
                    let key = match k {
                        serde_yaml::Value::String(s) => {
                            serde_yaml::Value::String(s.replace('-', "_"))
                        }
                        other => other,
                    };
                    (key, v)
                })
                .collect();
            serde_yaml::Value::Mapping(normalized)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_file_with_dashed_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("newswire.yaml");
        std::fs::write(
            &path,
            "limit: 25\ncategory: tech,science\ndedupe-threshold: 0.8\nno-doom: true\n",
        )
        .unwrap();
        let config = load_file(&path).unwrap();
        assert_eq!(config.limit, Some(25));
        assert_eq!(config.category.as_deref(), Some("tech,science"));
        assert_eq!(config.dedupe_threshold, Some(0.8));
        assert_eq!(config.no_doom, Some(true));
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("newswire.yaml");
        std::fs::write(&path, "limit: 10\nfrobnicate: yes\n").unwrap();
        let config = load_file(&path).unwrap();
        assert_eq!(config.limit, Some(10));
    }

    #[test]
    fn test_missing_file_is_none() {
        assert!(load_file(&PathBuf::from("/nonexistent/newswire.yaml")).is_none());
    }

    #[test]
    fn test_invalid_yaml_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("newswire.yaml");
        std::fs::write(&path, "limit: [unterminated").unwrap();
        assert!(load_file(&path).is_none());
    }

    #[test]
    fn test_merge_project_overrides_user() {
        let user = FileConfig { limit: Some(50), since: Some("6h".to_string()), ..Default::default() };
        let project = FileConfig { limit: Some(10), ..Default::default() };
        let merged = user.merged_with(project);
        assert_eq!(merged.limit, Some(10));
        assert_eq!(merged.since.as_deref(), Some("6h"));
    }
}
