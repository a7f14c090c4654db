//! Content pages and the layout they are rendered into.
//!
//! # Page Format
//!
//! ```text
//! ---
//! title: Hello
//! ---
//! Markdown (or HTML) body. Later `---` lines belong to the body.
//! ```
//!
//! # Path Mapping
//!
//! | Source                     | Output                        |
//! |----------------------------|-------------------------------|
//! | `content/index.md`         | `public/index.html`           |
//! | `content/about.md`         | `public/about/index.html`     |
//! | `content/posts/index.html` | `public/posts/index.html`     |
//! | `content/posts/hello.html` | `public/posts/hello/index.html` |

use crate::utils::{
    path::{extension, rebase},
    text::{anchorize, plainify, replace_html_tag},
};
use anyhow::{Context, Result, anyhow};
use pulldown_cmark::{Options, Parser, html};
use rustc_hash::FxHashMap;
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Frontmatter and body separator.
const DELIMITER: &str = "---";

/// Heading levels that get an `id` and a trailing anchor link.
const ANCHORED_HEADINGS: &[&str] = &["h2", "h3", "h4"];

/// Layout placeholder for the page body (replaced once).
const CONTENT_PLACEHOLDER: &str = "{{content}}";

/// Layout placeholder for the page title (replaced everywhere).
const TITLE_PLACEHOLDER: &str = "{{title}}";

/// Per-page build failures.
#[derive(Debug, Error)]
pub enum PageError {
    /// Fewer than three `---` separated parts. The page is skipped.
    #[error("page `{}` is missing frontmatter", .0.display())]
    MissingFrontmatter(PathBuf),

    /// Not a `.md` or `.html` file.
    #[error("page `{}` is neither markdown nor html", .0.display())]
    Unsupported(PathBuf),

    /// Another page already produced this output file.
    #[error("`{}` renders to `{}`, which another page already wrote", .page.display(), .output.display())]
    OutputExists { page: PathBuf, output: PathBuf },
}

/// Source format of a page body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Markdown,
    Html,
}

impl PageKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        match extension(path).as_str() {
            "md" => Some(Self::Markdown),
            "html" => Some(Self::Html),
            _ => None,
        }
    }
}

/// Frontmatter fields, `key: value` per line.
pub type Frontmatter = FxHashMap<String, String>;

/// A parsed content file.
#[derive(Debug, Clone)]
pub struct Page {
    pub source: PathBuf,
    pub kind: PageKind,
    pub frontmatter: Frontmatter,
    pub body: String,
}

impl Page {
    /// Read and parse a content file.
    pub fn read(source: &Path) -> Result<Self> {
        let raw = fs::read_to_string(source)
            .with_context(|| format!("Failed to read {}", source.display()))?;
        Ok(Self::parse(source.to_path_buf(), &raw)?)
    }

    /// Split raw text into frontmatter and body.
    ///
    /// The trimmed text is split on every `---`: the second part is the
    /// frontmatter, everything after it (rejoined) is the body.
    pub fn parse(source: PathBuf, raw: &str) -> Result<Self, PageError> {
        let Some(kind) = PageKind::from_path(&source) else {
            return Err(PageError::Unsupported(source));
        };

        let parts: Vec<&str> = raw.trim().split(DELIMITER).collect();
        if parts.len() < 3 {
            return Err(PageError::MissingFrontmatter(source));
        }

        Ok(Self {
            frontmatter: parse_frontmatter(parts[1]),
            body: parts[2..].join(DELIMITER),
            source,
            kind,
        })
    }

    /// Page title, empty when the frontmatter has none.
    pub fn title(&self) -> &str {
        self.frontmatter.get("title").map_or("", String::as_str)
    }

    /// Body as HTML with heading anchors injected.
    pub fn render_body(&self) -> Result<String> {
        let body = match self.kind {
            PageKind::Markdown => render_markdown(&self.body),
            PageKind::Html => self.body.clone(),
        };
        add_heading_anchors(&body)
    }

    /// Full output document.
    pub fn render(&self, layout: &Layout) -> Result<String> {
        Ok(layout.render(self.title(), &self.render_body()?))
    }
}

/// Parse `key: value` lines. The first colon splits; both sides are
/// trimmed. Lines without a colon or with an empty key are ignored.
pub fn parse_frontmatter(text: &str) -> Frontmatter {
    text.lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim(), value.trim()))
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_owned(), value.to_owned()))
        .collect()
}

/// Render markdown with raw HTML passthrough and smart punctuation.
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);

    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Give every `h2`-`h4` an `id` derived from its text, plus a trailing
/// same-page anchor link.
///
/// Headings with the same text get the same id; nothing disambiguates them.
pub fn add_heading_anchors(html: &str) -> Result<String> {
    ANCHORED_HEADINGS.iter().try_fold(html.to_owned(), |html, tag| {
        replace_html_tag(&html, tag, |content, attrs, _| {
            let id = anchorize(&plainify(content));
            format!(r##"<{tag}{attrs} id="{id}">{content}<a class="anchor" href="#{id}">⚓︎</a></{tag}>"##)
        })
    })
}

/// Map a content file to its output file.
///
/// `.md` becomes `.html`, and anything not already named `index.html`
/// moves into its own directory: `about.html` → `about/index.html`.
pub fn output_path(source: &Path, content: &Path, output: &Path) -> Result<PathBuf> {
    let mut dest = rebase(source, content, output).ok_or_else(|| {
        anyhow!("{} is not inside {}", source.display(), content.display())
    })?;

    if extension(&dest) == "md" {
        dest.set_extension("html");
    }

    if dest.file_name().is_some_and(|name| name != "index.html") {
        dest = dest.with_extension("").join("index.html");
    }

    Ok(dest)
}

// ============================================================================
// Layout
// ============================================================================

/// HTML template with `{{content}}` and `{{title}}` placeholders.
#[derive(Debug, Clone)]
pub struct Layout {
    template: String,
}

impl Layout {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let template = fs::read_to_string(path)
            .with_context(|| format!("Failed to read layout {}", path.display()))?;
        Ok(Self::new(template))
    }

    /// Insert the body first, then fill every title placeholder
    /// (including any the body itself contains).
    pub fn render(&self, title: &str, content: &str) -> String {
        self.template
            .replacen(CONTENT_PLACEHOLDER, content, 1)
            .replace(TITLE_PLACEHOLDER, title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn md(raw: &str) -> Page {
        Page::parse(PathBuf::from("content/page.md"), raw).unwrap()
    }

    #[test]
    fn test_parse_frontmatter_and_body() {
        let page = md("---\ntitle: Hello: World\nauthor:  Ann \n---\nBody\n");
        assert_eq!(page.title(), "Hello: World");
        assert_eq!(page.frontmatter["author"], "Ann");
        assert_eq!(page.body, "\nBody");
        assert_eq!(page.kind, PageKind::Markdown);
    }

    #[test]
    fn test_body_keeps_later_delimiters() {
        let page = md("---\ntitle: T\n---\nabove\n---\nbelow");
        assert_eq!(page.body, "\nabove\n---\nbelow");
    }

    #[test]
    fn test_missing_frontmatter() {
        let err = Page::parse(PathBuf::from("content/a.md"), "# Just text\n---\n").unwrap_err();
        assert!(matches!(err, PageError::MissingFrontmatter(_)));
        assert_eq!(err.to_string(), "page `content/a.md` is missing frontmatter");
    }

    #[test]
    fn test_unsupported_kind() {
        let err = Page::parse(PathBuf::from("content/a.txt"), "---\n---\n").unwrap_err();
        assert!(matches!(err, PageError::Unsupported(_)));
    }

    #[test]
    fn test_title_defaults_to_empty() {
        let page = md("---\nauthor: Ann\n---\nx");
        assert_eq!(page.title(), "");
    }

    #[test]
    fn test_parse_frontmatter_ignores_junk_lines() {
        let fm = parse_frontmatter("\nno colon here\n : empty key\nkey:value\n");
        assert_eq!(fm.len(), 1);
        assert_eq!(fm["key"], "value");
    }

    #[test]
    fn test_heading_anchor_markup() {
        let page = md("---\ntitle: T\n---\n## Heading One\n");
        assert_eq!(
            page.render_body().unwrap().trim(),
            r##"<h2 id="heading-one">Heading One<a class="anchor" href="#heading-one">⚓︎</a></h2>"##
        );
    }

    #[test]
    fn test_heading_anchor_levels() {
        let html = add_heading_anchors("<h1>One</h1><h3>Three</h3><h4 class=\"x\">Four</h4><h5>Five</h5>").unwrap();
        assert!(html.contains("<h1>One</h1>"));
        assert!(html.contains(r##"<h3 id="three">Three<a class="anchor" href="#three">"##));
        assert!(html.contains(r#"<h4 class="x" id="four">Four"#));
        assert!(html.contains("<h5>Five</h5>"));
    }

    #[test]
    fn test_heading_anchor_uses_plain_text() {
        let html = add_heading_anchors("<h2>The <em>Big</em> &amp; Small</h2>").unwrap();
        assert!(html.starts_with(r#"<h2 id="the-big-and-small">The <em>Big</em> &amp; Small"#));
    }

    #[test]
    fn test_duplicate_headings_share_an_id() {
        let html = add_heading_anchors("<h2>Notes</h2><h3>Notes</h3>").unwrap();
        assert_eq!(html.matches(r#"id="notes""#).count(), 2);
    }

    #[test]
    fn test_html_page_body_untouched() {
        let page = Page::parse(
            PathBuf::from("content/raw.html"),
            "---\ntitle: Raw\n---\n<p>'quotes' *stay*</p>",
        )
        .unwrap();
        assert_eq!(page.render_body().unwrap(), "\n<p>'quotes' *stay*</p>");
    }

    #[test]
    fn test_markdown_smart_punctuation_and_html() {
        let html = render_markdown("\"Hi\" it's <span class=\"x\">raw</span>");
        assert!(html.contains("“Hi”"));
        assert!(html.contains("it’s"));
        assert!(html.contains("<span class=\"x\">raw</span>"));
    }

    #[test]
    fn test_layout_render() {
        let layout = Layout::new("<title>{{title}}</title><h1>{{title}}</h1>{{content}}{{content}}");
        let out = layout.render("Home", "<p>body</p>");
        assert_eq!(out, "<title>Home</title><h1>Home</h1><p>body</p>{{content}}");
    }

    #[test]
    fn test_layout_title_inside_body_is_filled() {
        let layout = Layout::new("{{content}}");
        assert_eq!(layout.render("T", "see {{title}}"), "see T");
    }

    #[test]
    fn test_output_path() {
        let content = Path::new("/s/content");
        let output = Path::new("/s/public");
        let map = |p: &str| output_path(&content.join(p), content, output).unwrap();

        assert_eq!(map("index.md"), output.join("index.html"));
        assert_eq!(map("about.md"), output.join("about/index.html"));
        assert_eq!(map("posts/index.html"), output.join("posts/index.html"));
        assert_eq!(map("posts/hello.html"), output.join("posts/hello/index.html"));
        assert_eq!(map("posts/hello/index.md"), output.join("posts/hello/index.html"));
    }

    #[test]
    fn test_output_path_outside_content() {
        let result = output_path(Path::new("/x/a.md"), Path::new("/s/content"), Path::new("/s/public"));
        assert!(result.is_err());
    }
}
