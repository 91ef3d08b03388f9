// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Repository identifiers in `owner/name` form.
//!
//! A [`Collection`] groups work items. It is produced both when the configured
//! repository list is read and when a pull request URL is mapped back to the
//! repository that owns it.

use std::{fmt, str::FromStr};

use crate::error::Error;

/// Repository identifier made of an owner and a repository name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord,)]
pub struct Collection
{
    /// Account or organization owning the repository.
    pub owner: String,
    /// Repository name.
    pub name:  String,
}

impl Collection
{
    /// Creates a collection from already validated parts.
    pub fn new<O, N,>(owner: O, name: N,) -> Self
    where
        O: Into<String,>,
        N: Into<String,>,
    {
        Self {
            owner: owner.into(), name: name.into(),
        }
    }
}

impl fmt::Display for Collection
{
    fn fmt(&self, f: &mut fmt::Formatter<'_,>,) -> fmt::Result
    {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for Collection
{
    type Err = Error;

    /// Parses a single `owner/name` token.
    ///
    /// Surrounding whitespace is trimmed. Both parts must be non-empty and the
    /// token must contain exactly one slash.
    ///
    /// # Examples
    ///
    /// ```
    /// use gh_pr_exporter::Collection;
    ///
    /// let collection: Collection = " acme/widgets ".parse()?;
    /// assert_eq!(collection.owner, "acme");
    /// assert_eq!(collection.to_string(), "acme/widgets");
    /// # Ok::<(), gh_pr_exporter::Error>(())
    /// ```
    fn from_str(token: &str,) -> Result<Self, Self::Err,>
    {
        let trimmed = token.trim();
        let mut parts = trimmed.split('/',);

        match (parts.next(), parts.next(), parts.next(),) {
            (Some(owner,), Some(name,), None,) if !owner.is_empty() && !name.is_empty() => {
                Ok(Self::new(owner, name,),)
            }
            _ => Err(Error::config(format!(
                "repository '{trimmed}' must be in owner/name form"
            ),),),
        }
    }
}

/// Splits a comma-separated repository list into collections.
///
/// Blank tokens are ignored and repeated repositories are kept only at their
/// first position, so iteration order follows the input.
///
/// # Errors
///
/// Returns [`Error::Config`] when a token is not in `owner/name` form or when
/// the list contains no repositories at all.
pub fn parse_collections(raw: &str,) -> Result<Vec<Collection,>, Error,>
{
    let mut collections: Vec<Collection,> = Vec::new();

    for token in raw.split(',',) {
        if token.trim().is_empty() {
            continue;
        }

        let collection: Collection = token.parse()?;
        if !collections.contains(&collection,) {
            collections.push(collection,);
        }
    }

    if collections.is_empty() {
        return Err(Error::config("repository list does not name any owner/name pair",),);
    }

    Ok(collections,)
}

#[cfg(test)]
mod tests
{
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn display_joins_owner_and_name()
    {
        let collection = Collection::new("acme", "widgets",);
        assert_eq!(collection.to_string(), "acme/widgets");
    }

    #[test]
    fn parses_list_in_input_order()
    {
        let collections =
            parse_collections("acme/widgets, acme/gadgets,octo/hello",).expect("valid list",);
        assert_eq!(collections, vec![
            Collection::new("acme", "widgets"),
            Collection::new("acme", "gadgets"),
            Collection::new("octo", "hello"),
        ]);
    }

    #[test]
    fn ignores_blank_tokens_and_duplicates()
    {
        let collections = parse_collections("acme/widgets,, acme/widgets ,",).expect("valid list",);
        assert_eq!(collections, vec![Collection::new("acme", "widgets")]);
    }

    #[test]
    fn rejects_token_without_slash()
    {
        let error = parse_collections("acme/widgets,gadgets",).expect_err("expected error",);
        match error {
            Error::Config {
                message,
            } => assert_eq!(message, "repository 'gadgets' must be in owner/name form"),
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[test]
    fn rejects_extra_segments_and_empty_parts()
    {
        assert!("acme/widgets/extra".parse::<Collection>().is_err());
        assert!("/widgets".parse::<Collection>().is_err());
        assert!("acme/".parse::<Collection>().is_err());
    }

    #[test]
    fn rejects_list_without_repositories()
    {
        let error = parse_collections(" , ",).expect_err("expected error",);
        assert!(matches!(error, Error::Config { .. }));
    }

    proptest! {
        #[test]
        fn display_round_trips_through_parse(
            owner in "[A-Za-z0-9][A-Za-z0-9-]{0,15}",
            name in "[A-Za-z0-9._-]{1,20}",
        ) {
            let collection = Collection::new(owner, name);
            let parsed: Collection = collection.to_string().parse().expect("valid token");
            prop_assert_eq!(parsed, collection);
        }
    }
}
