//! Utility modules for the site builder.

pub mod fs;
pub mod path;
pub mod text;
