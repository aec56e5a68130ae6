//! Configuration file parsing
//!
//! Reads cc-bindings-ir.toml configuration files and holds the knobs the
//! importer needs: which headers are public, which build target owns which
//! header, and which target is currently being generated for.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ir::{HeaderName, Label};

/// Owning target for declarations in unmapped system headers.
pub const VIRTUAL_RESOURCE_DIR_TARGET: &str = "//:virtual_clang_resource_dir_target";

/// Owning target for declarations with no non-builtin filename
/// (`<built-in>`, command line).
pub const BUILTIN_TARGET: &str = "//:builtin";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Importer configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ImportConfig {
    /// Headers re-exported by the generated bindings, appended to the IR's
    /// `used_headers` in order.
    #[serde(default)]
    pub public_headers: Vec<HeaderName>,

    /// Maps header names to the build target that owns them. Ownership of
    /// a declaration is resolved by walking the include chain outward from
    /// the declaration's location until a mapped header is found.
    #[serde(default)]
    pub header_targets: BTreeMap<String, Label>,

    /// The target bindings are being generated for. Declarations owned by
    /// any other target are ignored.
    pub current_target: Label,
}

impl ImportConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.current_target.0.is_empty() {
            return Err(ConfigError::Validation(
                "current_target must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Convenience constructor for the common single-header case: the
    /// header is public, mapped to `current_target`.
    pub fn for_header(header: impl Into<String>, current_target: impl Into<String>) -> Self {
        let header = header.into();
        let current_target = Label::new(current_target);
        let mut header_targets = BTreeMap::new();
        header_targets.insert(header.clone(), current_target.clone());
        Self {
            public_headers: vec![HeaderName::new(header)],
            header_targets,
            current_target,
        }
    }

    /// The target owning `header`, if the header is mapped.
    pub fn target_of_header(&self, header: &str) -> Option<&Label> {
        self.header_targets.get(header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            current_target = "//foo:bar"
            public_headers = ["foo/public.h"]

            [header_targets]
            "foo/public.h" = "//foo:bar"
            "foo/detail.h" = "//foo:detail"
        "#;
        let config: ImportConfig = toml::from_str(toml_str).unwrap();
        config.validate().unwrap();
        assert_eq!(config.current_target, Label::new("//foo:bar"));
        assert_eq!(config.public_headers, vec![HeaderName::new("foo/public.h")]);
        assert_eq!(
            config.target_of_header("foo/detail.h"),
            Some(&Label::new("//foo:detail"))
        );
        assert_eq!(config.target_of_header("unmapped.h"), None);
    }

    #[test]
    fn test_empty_current_target_fails_validation() {
        let config = ImportConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_for_header() {
        let config = ImportConfig::for_header("a.h", "//a:a");
        config.validate().unwrap();
        assert_eq!(config.target_of_header("a.h"), Some(&Label::new("//a:a")));
        assert_eq!(config.public_headers.len(), 1);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cc-bindings-ir.toml");
        std::fs::write(
            &path,
            "current_target = \"//x:y\"\npublic_headers = [\"x.h\"]\n",
        )
        .unwrap();
        let config = ImportConfig::from_file(&path).unwrap();
        assert_eq!(config.current_target, Label::new("//x:y"));
    }

    #[test]
    fn test_from_file_rejects_missing_current_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cc-bindings-ir.toml");
        std::fs::write(&path, "public_headers = [\"x.h\"]\n").unwrap();
        assert!(ImportConfig::from_file(&path).is_err());
    }
}
