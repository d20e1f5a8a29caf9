//! Cleans up the blank lines left behind by templating and table of contents
//! substitution.

use once_cell::sync::Lazy;
use regex::Regex;

static BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\n+").unwrap());

/// A closing fence with a blank line on either side.
const PADDED_FENCE: &str = "\n\n```\n\n";

/// Collapses runs of blank lines into a single blank line, then drops the
/// blank line in front of a bare fence that also has one behind it.
pub fn strip_extra_whitespace(contents: &str) -> String {
    BLANK_LINES
        .replace_all(contents, "\n\n")
        .replace(PADDED_FENCE, "\n```\n\n")
}
