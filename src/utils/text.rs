//! String transforms for slugs, heading anchors and HTML rewriting.
//!
//! All HTML handling here is regex-based. `replace_html_tag` does not
//! understand nesting: a tag nested inside a same-named tag, or a tag that
//! appears inside a code block, is matched like any other occurrence.

use anyhow::Result;
use regex::{Captures, Regex};
use std::sync::LazyLock;

static RE_APOSTROPHE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"['’]").unwrap());
static RE_NOT_ASCII_ALNUM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());
static RE_NOT_LETTER_OR_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}]+").unwrap());
static RE_SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" +").unwrap());
static RE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Turn arbitrary text into an ASCII url slug.
///
/// `This isn't *so* bad!` → `this-isnt-so-bad`
pub fn slugify(text: &str) -> String {
    let text = text.to_lowercase();
    let text = RE_APOSTROPHE.replace_all(&text, "");
    let text = RE_NOT_ASCII_ALNUM.replace_all(&text, " ");
    RE_SPACES.replace_all(text.trim(), "-").into_owned()
}

/// Like [`slugify`], but keeps unicode letters and numbers (accents, CJK).
///
/// `Café &amp; Crème` → `café-and-crème`
pub fn anchorize(text: &str) -> String {
    let text = text.to_lowercase().replace("&amp;", "and");
    let text = RE_APOSTROPHE.replace_all(&text, "");
    let text = RE_NOT_LETTER_OR_NUMBER.replace_all(&text, " ");
    RE_SPACES.replace_all(text.trim(), "-").into_owned()
}

/// Strip every HTML tag, keeping the text between them.
// TODO: leave tags inside <pre> blocks alone
pub fn plainify(html: &str) -> String {
    RE_TAG.replace_all(html, "").into_owned()
}

/// Replace every `<tag ...>contents</tag>` element in `html`.
///
/// The callback receives the trimmed contents, the raw attribute text
/// (with its leading space, if any) and the run of spaces that preceded
/// the opening tag. Its return value replaces the whole match, including
/// those spaces. Contents may span multiple lines.
pub fn replace_html_tag<F>(html: &str, tag: &str, mut replace: F) -> Result<String>
where
    F: FnMut(&str, &str, &str) -> String,
{
    let tag = regex::escape(tag);
    let re = Regex::new(&format!(r"(?s)( *)<{tag}([^>]*)>(.*?)</{tag}>"))?;

    let replaced = re.replace_all(html, |caps: &Captures| {
        replace(caps[3].trim(), &caps[2], &caps[1])
    });
    Ok(replaced.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("This isn't *so* bad!"), "this-isnt-so-bad");
        assert_eq!(slugify("  Hello   World  "), "hello-world");
        assert_eq!(slugify("Café"), "caf");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_anchorize_basic() {
        assert_eq!(anchorize("Heading One"), "heading-one");
        assert_eq!(anchorize("What’s new?"), "whats-new");
    }

    #[test]
    fn test_anchorize_keeps_unicode() {
        assert_eq!(anchorize("Café Crème"), "café-crème");
        assert_eq!(anchorize("你好 世界"), "你好-世界");
        assert_eq!(anchorize("Étape 2"), "étape-2");
    }

    #[test]
    fn test_anchorize_ampersand_entity() {
        assert_eq!(anchorize("Salt &amp; Pepper"), "salt-and-pepper");
    }

    #[test]
    fn test_anchorize_collapses_separators() {
        assert_eq!(anchorize("  a -- b__c  "), "a-b-c");
        assert_eq!(anchorize("...."), "");
    }

    #[test]
    fn test_plainify() {
        assert_eq!(plainify("<em>Hello</em> <a href=\"#x\">world</a>"), "Hello world");
        assert_eq!(plainify("no tags"), "no tags");
    }

    #[test]
    fn test_replace_html_tag_attrs_and_multiline() {
        let html = "<p>x</p>\n  <h2 class=\"big\">\n Title \n</h2>";
        let out = replace_html_tag(html, "h2", |contents, attrs, spaces| {
            format!("[{spaces}|{attrs}|{contents}]")
        })
        .unwrap();
        assert_eq!(out, "<p>x</p>\n[  | class=\"big\"|Title]");
    }

    #[test]
    fn test_replace_html_tag_every_occurrence() {
        let html = "<h3>a</h3><h3>b</h3><h2>c</h2>";
        let out = replace_html_tag(html, "h3", |c, _, _| c.to_uppercase()).unwrap();
        assert_eq!(out, "AB<h2>c</h2>");
    }

    #[test]
    fn test_replace_html_tag_is_not_greedy() {
        let html = "<h4>one</h4> middle <h4>two</h4>";
        let mut seen = Vec::new();
        replace_html_tag(html, "h4", |c, _, _| {
            seen.push(c.to_owned());
            String::new()
        })
        .unwrap();
        assert_eq!(seen, ["one", "two"]);
    }
}
