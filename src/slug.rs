//! Defines the [`SlugRegistry`] type, which derives anchor slugs from heading
//! text and keeps them unique within a single document.

use std::collections::HashMap;

/// Lowercases `text` and drops every character that isn't a lowercase ASCII
/// letter. Digits, punctuation, whitespace, and accented characters are all
/// stripped, so e.g., `Hello, World! 123` becomes `helloworld`. The result may
/// be empty.
pub fn base_slug(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(char::is_ascii_lowercase)
        .collect()
}

/// Tracks the base slugs handed out for one document. A registry should be
/// created for each table of contents and dropped once it's rendered; reusing
/// one across documents would leak suffixes from one post into the next.
#[derive(Debug, Default)]
pub struct SlugRegistry {
    /// The number of times each base slug has been repeated. The first
    /// occurrence registers a count of 0.
    counts: HashMap<String, usize>,
}

impl SlugRegistry {
    /// Creates an empty registry.
    pub fn new() -> SlugRegistry {
        SlugRegistry::default()
    }

    /// Returns the slug for `text`. The first occurrence of a base slug is
    /// returned as-is; each repeat gets the next count appended, so the
    /// second `Intro` becomes `intro1`, the third `intro2`, and so on.
    pub fn slugify(&mut self, text: &str) -> String {
        let base = base_slug(text);
        match self.counts.get_mut(&base) {
            Some(count) => {
                *count += 1;
                format!("{}{}", base, count)
            }
            None => {
                self.counts.insert(base.clone(), 0);
                base
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_base_slug_strips_non_letters() {
        assert_eq!("helloworld", base_slug("Hello, World! 123"));
    }

    #[test]
    fn test_base_slug_strips_accents() {
        assert_eq!("caf", base_slug("Café"));
    }

    #[test]
    fn test_base_slug_empty() {
        assert_eq!("", base_slug(""));
        assert_eq!("", base_slug("2021 -- 42!"));
    }

    #[test]
    fn test_slugify_repeats() {
        let mut registry = SlugRegistry::new();
        assert_eq!("intro", registry.slugify("Intro"));
        assert_eq!("setup", registry.slugify("Setup"));
        assert_eq!("intro1", registry.slugify("Intro"));
        assert_eq!("intro2", registry.slugify("intro!"));
        assert_eq!("setup1", registry.slugify("Set up"));
    }

    #[test]
    fn test_slugify_collapsed_headings_collide() {
        // Headings that differ only in digits share a base slug.
        let mut registry = SlugRegistry::new();
        assert_eq!("step", registry.slugify("Step 1"));
        assert_eq!("step1", registry.slugify("Step 2"));
    }

    #[test]
    fn test_slugify_empty_repeats() {
        let mut registry = SlugRegistry::new();
        assert_eq!("", registry.slugify("123"));
        assert_eq!("1", registry.slugify("456"));
    }

    #[test]
    fn test_registries_are_independent() {
        let mut first = SlugRegistry::new();
        let mut second = SlugRegistry::new();
        assert_eq!("intro", first.slugify("Intro"));
        assert_eq!("intro", second.slugify("Intro"));
    }
}
