//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#true() -> bool {
    true
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn root() -> Option<PathBuf> {
        None
    }

    pub fn content() -> PathBuf {
        "content".into()
    }

    pub fn assets() -> PathBuf {
        "assets".into()
    }

    pub fn layout() -> PathBuf {
        "build/layout.html".into()
    }

    pub fn output() -> PathBuf {
        "public".into()
    }
}

// ============================================================================
// [serve] Section Defaults
// ============================================================================

pub mod serve {
    pub fn port() -> u16 {
        3000
    }
}

// ============================================================================
// [watch] Section Defaults
// ============================================================================

pub mod watch {
    /// Quiet period in milliseconds before a burst of changes triggers a rebuild.
    pub fn debounce() -> u64 {
        50
    }
}
