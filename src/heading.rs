//! Locates the headings that are eligible for a table of contents. Only lines
//! starting with at least two `#` markers count, and anything inside a fenced
//! code block is ignored.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::ops::Range;

/// Matches a fenced code block, non-greedily, from one triple backtick to the
/// next.
static CODE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```[\s\S]*?```").unwrap());

/// Matches a heading line. The first group holds the markers past the
/// mandatory `##`; the second holds the heading text.
static HEADING_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^##(#*)\s*(.*)$").unwrap());

/// A single heading found by a [`HeadingScanner`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Heading<'a> {
    /// The number of `#` markers beyond the minimum of two, so `##` has a
    /// depth of 0 and `####` a depth of 2.
    pub depth: usize,

    /// The heading text, exactly as written.
    pub text: &'a str,

    /// The byte range of the whole heading line within
    /// [`HeadingScanner::text`].
    pub span: Range<usize>,
}

/// Removes every fenced code block from `document`. Returns the input
/// unchanged (and unallocated) when there are no fences.
pub fn strip_code_fences(document: &str) -> Cow<'_, str> {
    CODE_FENCE.replace_all(document, "")
}

/// Scans a document for headings. The code fences are stripped once, up
/// front; [`HeadingScanner::headings`] then lazily walks what remains.
pub struct HeadingScanner<'a> {
    text: Cow<'a, str>,
}

impl<'a> HeadingScanner<'a> {
    pub fn new(document: &'a str) -> HeadingScanner<'a> {
        HeadingScanner {
            text: strip_code_fences(document),
        }
    }

    /// The document with its code fences removed. Heading spans index into
    /// this text rather than the input document.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the headings in document order.
    pub fn headings(&self) -> impl Iterator<Item = Heading<'_>> + '_ {
        HEADING_LINE.captures_iter(&self.text).map(|caps| {
            // Both groups always participate in a match.
            let markers = caps.get(1).map_or(0, |m| m.as_str().len());
            let text = caps.get(2).map_or("", |m| m.as_str());
            let line = caps.get(0).map_or(0..0, |m| m.range());
            Heading {
                depth: markers,
                text,
                span: line,
            }
        })
    }
}
