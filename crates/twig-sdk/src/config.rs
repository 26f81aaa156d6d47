//! Repository configuration.
//!
//! Read from TOML. Every field is optional in the file:
//!
//! ```toml
//! default_branch = "master"
//! max_tree_depth = 256
//! identity = "Ident <Ident@Ident.com>"
//! merge_message = "Merge branch '{source}' into {target}"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use twig_refs::validate_branch_name;
use twig_tree::{TreeLimits, DEFAULT_MAX_DEPTH};
use twig_types::Identity;

use crate::error::{RepoError, RepoResult};

fn default_branch() -> String {
    "master".to_string()
}

fn default_max_tree_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_merge_message() -> String {
    "Merge branch '{source}' into {target}".to_string()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepoConfig {
    /// Branch created unborn by [`Repository::init`](crate::Repository::init).
    #[serde(default = "default_branch")]
    pub default_branch: String,

    /// Directory nesting limit for building, reading, diffing and merging.
    #[serde(default = "default_max_tree_depth")]
    pub max_tree_depth: usize,

    /// Committer for merges, as `Name <contact>`.
    #[serde(default)]
    pub identity: Option<String>,

    /// Merge commit message; `{source}` and `{target}` are substituted.
    #[serde(default = "default_merge_message")]
    pub merge_message: String,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            default_branch: default_branch(),
            max_tree_depth: default_max_tree_depth(),
            identity: None,
            merge_message: default_merge_message(),
        }
    }
}

impl RepoConfig {
    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> RepoResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| RepoError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// A missing file yields the defaults; an unreadable or invalid one is an
    /// error.
    pub fn load(path: &Path) -> RepoResult<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_toml_str(&contents).map_err(|e| match e {
                RepoError::Config(message) => {
                    RepoError::Config(format!("{}: {message}", path.display()))
                }
                other => other,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(RepoError::Config(format!(
                "could not read {}: {e}",
                path.display()
            ))),
        }
    }

    /// Check the values that cannot be expressed in the type.
    pub fn validate(&self) -> RepoResult<()> {
        validate_branch_name(&self.default_branch)
            .map_err(|e| RepoError::Config(format!("default_branch: {e}")))?;
        self.identity()?;
        Ok(())
    }

    pub fn limits(&self) -> TreeLimits {
        TreeLimits::with_max_depth(self.max_tree_depth)
    }

    /// The configured merge committer, parsed.
    pub fn identity(&self) -> RepoResult<Option<Identity>> {
        self.identity
            .as_deref()
            .map(|raw| {
                raw.parse::<Identity>()
                    .map_err(|e| RepoError::Config(format!("identity: {e}")))
            })
            .transpose()
    }

    pub fn merge_message(&self, source: &str, target: &str) -> String {
        self.merge_message
            .replace("{source}", source)
            .replace("{target}", target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config() {
        let c = RepoConfig::default();
        assert_eq!(c.default_branch, "master");
        assert_eq!(c.max_tree_depth, 256);
        assert!(c.identity().unwrap().is_none());
        assert_eq!(c.merge_message("develop", "master"), "Merge branch 'develop' into master");
        assert!(c.validate().is_ok());
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(RepoConfig::from_toml_str("").unwrap(), RepoConfig::default());
    }

    #[test]
    fn parse_all_fields() {
        let c = RepoConfig::from_toml_str(
            r#"
            default_branch = "main"
            max_tree_depth = 16
            identity = "Ident <Ident@Ident.com>"
            merge_message = "{target} <- {source}"
            "#,
        )
        .unwrap();
        assert_eq!(c.default_branch, "main");
        assert_eq!(c.limits(), TreeLimits::with_max_depth(16));
        assert_eq!(
            c.identity().unwrap(),
            Some(Identity::new("Ident", "Ident@Ident.com"))
        );
        assert_eq!(c.merge_message("feature", "main"), "main <- feature");
    }

    #[test]
    fn rejects_invalid_values() {
        for bad in [
            "default_branch = \"bad..name\"",
            "identity = \"no brackets\"",
            "max_tree_depth = \"deep\"",
            "unknown_field = 1",
        ] {
            let err = RepoConfig::from_toml_str(bad).unwrap_err();
            assert!(matches!(err, RepoError::Config(_)), "{bad}");
        }
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_branch = \"trunk\"").unwrap();
        let c = RepoConfig::load(file.path()).unwrap();
        assert_eq!(c.default_branch, "trunk");
        assert_eq!(c.max_tree_depth, 256);
    }

    #[test]
    fn load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let c = RepoConfig::load(&dir.path().join("twig.toml")).unwrap();
        assert_eq!(c, RepoConfig::default());
    }

    #[test]
    fn load_invalid_file_names_the_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_tree_depth = [").unwrap();
        let err = RepoConfig::load(file.path()).unwrap_err();
        let RepoError::Config(message) = err else {
            panic!("expected config error");
        };
        assert!(message.contains(&file.path().display().to_string()));
    }
}
