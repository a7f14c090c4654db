//! Site building orchestration.
//!
//! Every build is a full rebuild: the output directory is deleted and
//! regenerated from scratch.
//!
//! # Architecture
//!
//! ```text
//! build_site()
//!     │
//!     ├── remove + recreate output
//!     │
//!     ├── copy assets/           ──► public/        (hidden files skipped)
//!     ├── copy content/ non-pages ──► public/       (images next to posts)
//!     │
//!     └── for each content/**/*.{md,html}, sorted
//!             │
//!             ├── split frontmatter / body   (missing frontmatter → skip)
//!             ├── markdown → html, heading anchors
//!             ├── fill layout {{content}} / {{title}}
//!             └── write public/<path>/index.html (never overwrites)
//! ```

use crate::{
    config::SiteConfig,
    log,
    logger::duration,
    page::{Layout, Page, PageError, PageKind, output_path},
    utils::fs::{copy_dir, glob, mkdir, remove, write_new},
};
use anyhow::{Context, Result};
use std::{
    io,
    path::{Path, PathBuf},
    time::Instant,
};

/// Page patterns, relative to the content directory.
const PAGE_PATTERNS: &[&str] = &["**/*.md", "**/*.html"];

/// Counts from a finished build.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BuildReport {
    /// Pages rendered and written.
    pub pages: usize,
    /// Pages skipped for missing frontmatter.
    pub skipped: usize,
    /// Asset and co-located files copied verbatim.
    pub files: usize,
}

/// Build the entire site into `config.build.output`.
///
/// Pages without frontmatter are logged and skipped. Any other failure,
/// including two pages mapping to the same output file, aborts the build.
pub fn build_site(config: &SiteConfig) -> Result<BuildReport> {
    let start = Instant::now();
    let build = &config.build;

    let layout = Layout::load(&build.layout)?;

    remove(&build.output)?;
    mkdir(&build.output)?;

    let mut report = BuildReport {
        files: copy_dir(&build.assets, &build.output, |_| true)?,
        ..BuildReport::default()
    };
    report.files += copy_dir(&build.content, &build.output, |path| {
        PageKind::from_path(path).is_none()
    })?;

    for path in collect_pages(&build.content)? {
        match build_page(&path, &layout, config) {
            Ok(()) => report.pages += 1,
            Err(err) if is_missing_frontmatter(&err) => {
                log!("build"; "page `{}` is missing frontmatter", rel_path(&path, config.get_root()));
                report.skipped += 1;
            }
            Err(err) => return Err(err),
        }
    }

    log!(
        "build";
        "Build {} {} pages, {} files, {} skipped",
        duration(start),
        report.pages,
        report.files,
        report.skipped
    );
    Ok(report)
}

/// All page sources under `content`, sorted, hidden paths excluded.
pub fn collect_pages(content: &Path) -> Result<Vec<PathBuf>> {
    glob(content, PAGE_PATTERNS)
}

/// Render one page and write it to its output path.
fn build_page(path: &Path, layout: &Layout, config: &SiteConfig) -> Result<()> {
    let build = &config.build;
    let page = Page::read(path)?;
    let html = page
        .render(layout)
        .with_context(|| format!("Failed to render {}", page.source.display()))?;

    let dest = output_path(path, &build.content, &build.output)?;
    write_new(&dest, html.as_bytes()).map_err(|err| match err.kind() {
        io::ErrorKind::AlreadyExists => PageError::OutputExists {
            page: path.to_path_buf(),
            output: dest.clone(),
        }
        .into(),
        _ => anyhow::Error::new(err).context(format!("Failed to write {}", dest.display())),
    })
}

fn is_missing_frontmatter(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<PageError>(),
        Some(PageError::MissingFrontmatter(_))
    )
}

/// Path relative to the project root, for log display.
fn rel_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}
