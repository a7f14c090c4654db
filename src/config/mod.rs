//! Site configuration management for `foc.toml`.
//!
//! The file is optional: without it every field takes its default, which
//! matches the conventional project layout.
//!
//! # Sections
//!
//! | Section    | Purpose                                        |
//! |------------|------------------------------------------------|
//! | `[build]`  | Content, assets, layout and output locations   |
//! | `[serve]`  | Development server (port, LAN binding, watch)  |
//! | `[watch]`  | Debounce interval for the file watcher         |
//!
//! # Example
//!
//! ```toml
//! [build]
//! content = "content"
//! assets = "assets"
//! layout = "build/layout.html"
//! output = "public"
//!
//! [serve]
//! port = 3000
//!
//! [watch]
//! debounce = 50
//! ```

mod build;
pub mod defaults;
mod error;
mod serve;
mod watch;

pub use build::BuildConfig;
pub use error::ConfigError;
pub use serve::ServeConfig;
pub use watch::WatchConfig;

use crate::cli::Cli;
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing foc.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Build paths
    #[serde(default)]
    pub build: BuildConfig,

    /// Development server settings
    #[serde(default)]
    pub serve: ServeConfig,

    /// File watcher settings
    #[serde(default)]
    pub watch: WatchConfig,
}

impl SiteConfig {
    /// Parse `content`, read from `path`.
    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    /// Load the config named on the command line, falling back to defaults
    /// when the file does not exist, and resolve every path against the root.
    pub fn load(cli: &Cli) -> Result<Self> {
        let root = cli.root.as_deref().unwrap_or(Path::new("./"));
        let config_path = root.join(&cli.config);

        let mut config = if config_path.exists() {
            Self::from_path(&config_path)?
        } else {
            Self::default()
        };
        config.resolve(root);

        Ok(config)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        self.build.root.as_deref().unwrap_or(Path::new("./"))
    }

    /// Make every build path absolute, relative to `root`.
    pub fn resolve(&mut self, root: &Path) {
        let root = normalize_path(root);

        self.build.content = normalize_path(&root.join(&self.build.content));
        self.build.assets = normalize_path(&root.join(&self.build.assets));
        self.build.layout = normalize_path(&root.join(&self.build.layout));
        self.build.output = normalize_path(&root.join(&self.build.output));
        self.build.root = Some(root);
    }

    /// Directories whose changes trigger a rebuild.
    pub fn watched_paths(&self) -> Vec<PathBuf> {
        vec![self.build.assets.clone(), self.build.content.clone()]
    }

    /// Validate the configuration before building.
    pub fn validate(&self) -> Result<()> {
        let build = &self.build;

        if !build.content.is_dir() {
            bail!(ConfigError::invalid(
                "build.content",
                format!("`{}` is not a directory", build.content.display())
            ));
        }

        if !build.layout.is_file() {
            bail!(ConfigError::invalid(
                "build.layout",
                format!("`{}` not found", build.layout.display())
            ));
        }

        // The output directory is deleted on every build
        for (name, source) in [("content", &build.content), ("assets", &build.assets)] {
            if source.starts_with(&build.output) {
                bail!(ConfigError::invalid(
                    "build.output",
                    format!("must not contain [build.{name}]")
                ));
            }
        }

        Ok(())
    }
}

/// Normalize a path to absolute, using canonicalize if the path exists
fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        // For non-existent paths, manually make them absolute
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        }
    })
}
