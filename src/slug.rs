// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Fallback slugs for icon metadata entries that do not carry one.
//!
//! A slug is the icon title lowercased with everything except ASCII letters
//! and digits removed, so `"Node.js"` becomes `"nodejs"`. Slugs name the
//! downloaded SVG and its caption file, so they never contain separators.

/// Derives an icon slug from a display title.
#[derive(Debug, Clone, Copy,)]
pub struct SlugStrategy<'input,>
{
    title: &'input str,
}

impl<'input,> SlugStrategy<'input,>
{
    /// Creates a slug builder borrowing `title`.
    pub fn builder(title: &'input str,) -> Self
    {
        Self {
            title,
        }
    }

    /// Builds the slug, or `None` when the title holds no ASCII alphanumeric
    /// character.
    ///
    /// # Examples
    ///
    /// ```
    /// use minlogo::SlugStrategy;
    ///
    /// assert_eq!(SlugStrategy::builder("Visual Studio Code",).build().as_deref(), Some("visualstudiocode"));
    /// assert_eq!(SlugStrategy::builder("Node.js",).build().as_deref(), Some("nodejs"));
    /// ```
    pub fn build(self,) -> Option<String,>
    {
        let slug: String = self
            .title
            .chars()
            .filter(char::is_ascii_alphanumeric,)
            .map(|candidate| candidate.to_ascii_lowercase(),)
            .collect();

        if slug.is_empty() { None } else { Some(slug,) }
    }
}

/// Returns `slug` when it is usable, otherwise derives one from `title`.
pub fn slug_or_title(slug: Option<&str,>, title: &str,) -> Option<String,>
{
    match slug.map(str::trim,).filter(|value| !value.is_empty(),) {
        Some(value,) => Some(value.to_owned(),),
        None => SlugStrategy::builder(title,).build(),
    }
}

#[cfg(test)]
mod tests
{
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn slug_contains_only_lowercase_alphanumerics(input in "[A-Za-z0-9._/ +&-]{1,48}") {
            let slug = SlugStrategy::builder(&input).build();
            prop_assert!(slug.is_none_or(|value| value.chars().all(|ch| matches!(ch, 'a'..='z' | '0'..='9'))));
        }
    }

    #[test]
    fn removes_spaces_dashes_and_dots()
    {
        let slug = SlugStrategy::builder("Mid-Century .NET Tools",).build();
        assert_eq!(slug.as_deref(), Some("midcenturynettools"));
    }

    #[test]
    fn drops_non_ascii_characters()
    {
        let slug = SlugStrategy::builder("Citroën 2CV",).build();
        assert_eq!(slug.as_deref(), Some("citron2cv"));
    }

    #[test]
    fn returns_none_without_alphanumerics()
    {
        assert!(SlugStrategy::builder("   ").build().is_none());
        assert!(SlugStrategy::builder("-+.").build().is_none());
    }

    #[test]
    fn explicit_slug_wins_over_title()
    {
        assert_eq!(slug_or_title(Some("dotnet"), ".NET").as_deref(), Some("dotnet"));
        assert_eq!(slug_or_title(Some("  "), ".NET").as_deref(), Some("net"));
        assert_eq!(slug_or_title(None, "").as_deref(), None);
    }
}
