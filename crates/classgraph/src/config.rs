//! Declarative configuration for filtering and rendering.
//!
//! A configuration document is a single JSON object with two optional keys,
//! `record` for node label options and `filters` for the filter pipeline:
//!
//! ```json
//! {
//!   "record": { "display": "name", "separate_props": true },
//!   "filters": [
//!     { "kind": "PackageRemover", "names": ["tests"] },
//!     { "kind": "LoneParentsRemover", "active": false }
//!   ]
//! }
//! ```
//!
//! Unknown keys are ignored so documents stay forward compatible.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{GraphError, Result};
use crate::export::RecordOptions;
use crate::filter::FilterRecord;

/// Top-level configuration document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Node label and style options.
    #[serde(default)]
    pub record: RecordOptions,
    /// Filter pipeline, applied in order.
    #[serde(default)]
    pub filters: Vec<FilterRecord>,
}

impl Config {
    /// Read and parse a configuration document from `reader`.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        serde_json::from_reader(reader).map_err(|e| {
            GraphError::invalid_config("failed to parse configuration", Some(e))
        })
    }

    /// Read and parse the configuration file at `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            GraphError::invalid_config(format!("cannot open {}", path.display()), Some(e))
        })?;
        Self::from_reader(BufReader::new(file))
    }
}

impl FromStr for Config {
    type Err = GraphError;

    fn from_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| {
            GraphError::invalid_config("failed to parse configuration", Some(e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: Config = "{}".parse().unwrap();
        assert!(config.filters.is_empty());
        assert!(config.record.show_attrs);
        assert!(!config.record.show_cls_attrs);
        assert_eq!(config.record.styles.not_found.color, "red");
    }

    #[test]
    fn test_full_document() {
        let config: Config = r#"{
            "record": { "separate_props": true, "keep_private": false },
            "filters": [
                { "kind": "PackageRemover", "names": ["tests"] },
                { "kind": "ConnectedKeeper", "names": ["Shape"], "active": false }
            ]
        }"#
        .parse()
        .unwrap();
        assert!(config.record.separate_props);
        assert!(!config.record.keep_private);
        assert_eq!(config.filters.len(), 2);
        assert_eq!(config.filters[0].kind, "PackageRemover");
        assert!(!config.filters[1].active);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let config: Config = r#"{ "record": {}, "output": "classes.svg" }"#.parse().unwrap();
        assert!(config.filters.is_empty());
    }

    #[test]
    fn test_invalid_json_reports_config_error() {
        let err = "not json".parse::<Config>().unwrap_err();
        assert!(matches!(err, GraphError::InvalidConfig { .. }));
    }

    #[test]
    fn test_from_path_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut file = File::create(&path).unwrap();
        write!(
            file,
            r#"{{ "filters": [{{ "kind": "AbstractKeeper" }}] }}"#
        )
        .unwrap();

        let config = Config::from_path(&path).unwrap();
        assert_eq!(config.filters.len(), 1);
        assert_eq!(config.filters[0].kind, "AbstractKeeper");
    }

    #[test]
    fn test_from_path_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::from_path(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, GraphError::InvalidConfig { .. }));
    }
}
