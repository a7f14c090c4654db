//! `[serve]` section configuration.
//!
//! Contains development server settings.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[serve]` section in foc.toml - development server settings.
///
/// # Example
/// ```toml
/// [serve]
/// port = 3000      # Preferred port, the next free one is used if taken
/// network = true   # Also listen on the LAN address
/// watch = true     # Rebuild and reload on changes (`foc start`)
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ServeConfig {
    /// Preferred HTTP port (default: 3000).
    #[serde(default = "defaults::serve::port")]
    #[educe(Default = defaults::serve::port())]
    pub port: u16,

    /// Bind a second listener on the machine's primary IPv4 address.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub network: bool,

    /// Attach the file watcher when running `start`.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub watch: bool,
}
