//! Why a `foc.toml` could not be turned into a usable [`SiteConfig`].
//!
//! [`SiteConfig`]: super::SiteConfig

use std::{io, path::PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("cannot read `{}`", .path.display())]
    Read { path: PathBuf, source: io::Error },

    /// Not TOML, or TOML with unknown keys or wrongly typed values.
    #[error("`{}` is not a valid site config", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Parsed fine but names paths a build cannot use. `key` is the
    /// dotted `[section.key]` that is wrong.
    #[error("[{key}] {problem}")]
    Invalid { key: &'static str, problem: String },
}

impl ConfigError {
    pub fn invalid(key: &'static str, problem: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            problem: problem.into(),
        }
    }
}
