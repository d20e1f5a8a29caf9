//! Syntax highlighting for code blocks embedded in post templates. Output is an
//! HTML fragment with inline styles so it survives being pasted into an
//! editor that strips stylesheets.

use once_cell::sync::Lazy;
use std::fmt;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::SyntaxSet;

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);

static THEME_SET: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

/// The theme used when the project doesn't name one.
pub const DEFAULT_THEME: &str = "InspiredGitHub";

/// Highlights code with a single theme.
#[derive(Clone, Debug)]
pub struct Highlighter {
    theme: String,
}

impl Default for Highlighter {
    fn default() -> Self {
        Highlighter {
            theme: DEFAULT_THEME.to_owned(),
        }
    }
}

impl Highlighter {
    /// Constructs a [`Highlighter`] for the named theme. Fails if syntect
    /// doesn't ship a theme by that name.
    pub fn new(theme: &str) -> Result<Highlighter> {
        if THEME_SET.themes.contains_key(theme) {
            Ok(Highlighter {
                theme: theme.to_owned(),
            })
        } else {
            Err(Error::UnknownTheme(theme.to_owned()))
        }
    }

    fn theme(&self) -> Result<&'static Theme> {
        THEME_SET
            .themes
            .get(&self.theme)
            .ok_or_else(|| Error::UnknownTheme(self.theme.clone()))
    }

    /// Highlights `code` as `language`, which may be a syntax name
    /// (`Rust`), a file extension (`rs`), or absent. Anything syntect
    /// doesn't recognize is rendered as plain text.
    pub fn highlight(&self, code: &str, language: Option<&str>) -> Result<String> {
        let syntax = language
            .and_then(|lang| {
                SYNTAX_SET
                    .find_syntax_by_token(lang)
                    .or_else(|| SYNTAX_SET.find_syntax_by_name(lang))
            })
            .unwrap_or_else(|| SYNTAX_SET.find_syntax_plain_text());
        syntect::html::highlighted_html_for_string(code, &SYNTAX_SET, syntax, self.theme()?)
            .map_err(Error::Highlight)
    }
}

/// The result of a fallible highlighting operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error highlighting a code block.
#[derive(Debug)]
pub enum Error {
    /// Returned when the configured theme doesn't exist.
    UnknownTheme(String),

    /// Returned when syntect fails while highlighting.
    Highlight(syntect::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UnknownTheme(theme) => {
                write!(f, "unknown highlighting theme `{}`", theme)
            }
            Error::Highlight(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::UnknownTheme(_) => None,
            Error::Highlight(err) => Some(err),
        }
    }
}
