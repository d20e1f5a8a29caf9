//! Builds a Ghost-compatible table of contents for a rendered post and
//! substitutes it for the `<!-- wotw_toc -->` placeholder.
//!
//! Building happens in two stages: [`crate::heading::HeadingScanner`] yields
//! the headings, and [`build_toc`] folds them through a fresh
//! [`SlugRegistry`] into a [`Toc`]. [`insert_toc`] then replaces every line
//! containing the placeholder with the rendered list.

use crate::heading::HeadingScanner;
use crate::slug::SlugRegistry;
use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use std::borrow::Cow;

/// The name inside the placeholder comment.
pub const TOC_MARKER: &str = "wotw_toc";

/// Matches an entire line containing the placeholder comment. Anything else
/// on that line is replaced along with the comment.
static PLACEHOLDER_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\n]*<!--\s*?wotw_toc\s*?-->[^\n]*").unwrap());

/// One link in a [`Toc`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TocEntry {
    /// The heading depth past `##`. Each level indents the link by two spaces.
    pub depth: usize,

    /// The heading text, used verbatim as the link text.
    pub text: String,

    /// The anchor slug, unique within the document.
    pub slug: String,
}

impl TocEntry {
    /// Renders the entry as a Markdown list item, including the trailing
    /// newline.
    pub fn to_markdown(&self) -> String {
        format!("{}- [{}](#{})\n", "  ".repeat(self.depth), self.text, self.slug)
    }
}

/// The table of contents for a single document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Toc {
    /// The entries, in the order their headings appear in the document.
    pub entries: Vec<TocEntry>,
}

impl Toc {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders the whole table of contents as a nested Markdown list.
    pub fn to_markdown(&self) -> String {
        self.entries.iter().map(TocEntry::to_markdown).collect()
    }
}

/// Collects the table of contents for `document`. Headings inside fenced
/// code blocks are skipped.
pub fn build_toc(document: &str) -> Toc {
    let scanner = HeadingScanner::new(document);
    let mut registry = SlugRegistry::new();
    Toc {
        entries: scanner
            .headings()
            .map(|heading| TocEntry {
                depth: heading.depth,
                text: heading.text.to_owned(),
                slug: registry.slugify(heading.text),
            })
            .collect(),
    }
}

/// Returns true if `document` contains at least one placeholder line.
pub fn has_placeholder(document: &str) -> bool {
    PLACEHOLDER_LINE.is_match(document)
}

/// Replaces every line containing the placeholder with `rendered_toc`. The
/// replacement is inserted literally, so `$` in a heading is never treated as
/// a capture reference. Without a placeholder the document is returned as-is.
pub fn insert_toc<'a>(document: &'a str, rendered_toc: &str) -> Cow<'a, str> {
    PLACEHOLDER_LINE.replace_all(document, NoExpand(rendered_toc))
}

/// Builds the table of contents for `document` and substitutes it for the
/// placeholder.
pub fn build_post_toc(document: &str) -> String {
    let toc = build_toc(document);
    if !toc.is_empty() && !has_placeholder(document) {
        log::warn!(
            "document has {} headings but no `<!-- {} -->` placeholder",
            toc.entries.len(),
            TOC_MARKER
        );
    }
    log::debug!("generated {} table of contents entries", toc.entries.len());
    insert_toc(document, &toc.to_markdown()).into_owned()
}

#[cfg(test)]
mod test {
    use super::*;

    fn slugs(document: &str) -> Vec<String> {
        build_toc(document)
            .entries
            .into_iter()
            .map(|e| e.slug)
            .collect()
    }

    #[test]
    fn test_duplicate_headings() {
        assert_eq!(
            vec!["intro", "setup", "intro1"],
            slugs("## Intro\n### Setup\n## Intro\n")
        );
    }

    #[test]
    fn test_numbering_ignores_depth() {
        assert_eq!(
            vec!["usage", "usage1", "usage2"],
            slugs("## Usage\n### Usage\n#### Usage\n")
        );
    }

    #[test]
    fn test_entry_indentation() {
        let toc = build_toc("### Deep Dive\n");
        assert_eq!("  - [Deep Dive](#deepdive)\n", toc.to_markdown());
    }

    #[test]
    fn test_nested_list() {
        let toc = build_toc("## One\n### Two\n#### Three\n## Four\n");
        assert_eq!(
            "- [One](#one)\n  - [Two](#two)\n    - [Three](#three)\n- [Four](#four)\n",
            toc.to_markdown()
        );
    }

    #[test]
    fn test_fenced_headings_never_listed() {
        let toc = build_toc("## Real\n```\n## Fake\n### Fake\n```\n");
        assert_eq!(1, toc.entries.len());
        assert_eq!("Real", toc.entries[0].text);
    }

    #[test]
    fn test_no_placeholder_is_unchanged() {
        let document = "## Intro\n\nHello\n\n### Setup\n";
        assert_eq!(document, build_post_toc(document));
        assert!(matches!(insert_toc(document, "- x\n"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_placeholder_line_is_replaced_wholesale() {
        let document = "# Title\nContents: <!-- wotw_toc --> (auto)\n## Intro\n";
        assert_eq!(
            "# Title\n- [Intro](#intro)\n\n## Intro\n",
            build_post_toc(document)
        );
    }

    #[test]
    fn test_placeholder_without_spaces() {
        assert_eq!("- [A](#a)\n\n## A", build_post_toc("<!--wotw_toc-->\n## A"));
    }

    #[test]
    fn test_every_placeholder_line_is_replaced() {
        let document = "<!-- wotw_toc -->\n## A\n<!-- wotw_toc -->\n";
        assert_eq!(
            "- [A](#a)\n\n## A\n- [A](#a)\n\n",
            build_post_toc(document)
        );
    }

    #[test]
    fn test_placeholder_without_headings_is_removed() {
        assert_eq!("before\n\nafter", build_post_toc("before\n<!-- wotw_toc -->\nafter"));
    }

    #[test]
    fn test_replacement_is_literal() {
        let document = "<!-- wotw_toc -->\n## Costs in $1\n";
        assert_eq!(
            "- [Costs in $1](#costsin)\n\n## Costs in $1\n",
            build_post_toc(document)
        );
    }

    #[test]
    fn test_other_comments_are_kept() {
        let document = "<!-- more -->\n## A\n";
        assert_eq!(document, build_post_toc(document));
    }
}
