//! `[build]` section configuration.
//!
//! Locations of the content tree, static assets, page layout and output.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[build]` section in foc.toml - build pipeline paths.
///
/// All paths are relative to the project root until
/// [`SiteConfig::resolve`](super::SiteConfig::resolve) makes them absolute.
///
/// # Example
/// ```toml
/// [build]
/// content = "content"            # Pages (.md / .html) and co-located files
/// assets = "assets"              # Copied verbatim into the output
/// layout = "build/layout.html"   # Template with {{content}} and {{title}}
/// output = "public"              # Deleted and recreated on every build
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    /// Project root directory, set from the command line.
    #[serde(skip)]
    #[educe(Default = defaults::build::root())]
    pub root: Option<PathBuf>,

    /// Content directory with pages and co-located files.
    #[serde(default = "defaults::build::content")]
    #[educe(Default = defaults::build::content())]
    pub content: PathBuf,

    /// Static assets directory.
    #[serde(default = "defaults::build::assets")]
    #[educe(Default = defaults::build::assets())]
    pub assets: PathBuf,

    /// Page layout template.
    #[serde(default = "defaults::build::layout")]
    #[educe(Default = defaults::build::layout())]
    pub layout: PathBuf,

    /// Output directory.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;
    use std::path::PathBuf;

    #[test]
    fn test_build_config_defaults() {
        let config: SiteConfig = toml::from_str("").unwrap();

        assert_eq!(config.build.content, PathBuf::from("content"));
        assert_eq!(config.build.assets, PathBuf::from("assets"));
        assert_eq!(config.build.layout, PathBuf::from("build/layout.html"));
        assert_eq!(config.build.output, PathBuf::from("public"));
        assert!(config.build.root.is_none());
    }

    #[test]
    fn test_build_config_partial_override() {
        let config = r#"
            [build]
            content = "pages"
            output = "dist"
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(config.build.content, PathBuf::from("pages"));
        assert_eq!(config.build.output, PathBuf::from("dist"));
        // untouched fields keep their defaults
        assert_eq!(config.build.assets, PathBuf::from("assets"));
    }

    #[test]
    fn test_unknown_field_rejection() {
        let config = r#"
            [build]
            minify = true
        "#;
        let result: Result<SiteConfig, _> = toml::from_str(config);

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("unknown field"));
    }
}
