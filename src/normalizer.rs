// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Normalization of raw pull requests into publishable records.
//!
//! The owning repository of a pull request is recovered from its resource URL
//! through a [`ResourceLocator`]. The default [`ApiUrlLocator`] understands the
//! REST layout `.../repos/{owner}/{name}/...`, which holds for both
//! `api.github.com` and GitHub Enterprise `/api/v3` roots.

use url::Url;

use crate::{collection::Collection, error::Error, source::RawPullRequest};

/// Maps a resource URL to the collection owning the resource.
pub trait ResourceLocator: Send + Sync
{
    /// Recovers `(owner, name)` from the URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] when the URL does not have the expected shape.
    fn parse(&self, url: &str,) -> Result<Collection, Error,>;
}

/// Locator for GitHub REST resource URLs.
#[derive(Debug, Clone, Copy, Default,)]
pub struct ApiUrlLocator;

impl ResourceLocator for ApiUrlLocator
{
    /// # Examples
    ///
    /// ```
    /// use gh_pr_exporter::{ApiUrlLocator, ResourceLocator};
    ///
    /// let collection =
    ///     ApiUrlLocator.parse("https://api.github.com/repos/acme/widgets/pulls/42",)?;
    /// assert_eq!(collection.to_string(), "acme/widgets");
    /// # Ok::<(), gh_pr_exporter::Error>(())
    /// ```
    fn parse(&self, url: &str,) -> Result<Collection, Error,>
    {
        let parsed = Url::parse(url,).map_err(|e| Error::parse(url, e.to_string(),),)?;
        let segments: Vec<&str,> = parsed
            .path_segments()
            .ok_or_else(|| Error::parse(url, "URL has no path",),)?
            .collect();

        let repos = segments
            .iter()
            .rposition(|segment| *segment == "repos",)
            .ok_or_else(|| Error::parse(url, "missing 'repos' path segment",),)?;

        match (segments.get(repos + 1,), segments.get(repos + 2,),) {
            (Some(owner,), Some(name,),) if !owner.is_empty() && !name.is_empty() => {
                Ok(Collection::new(*owner, *name,),)
            }
            _ => Err(Error::parse(url, "expected owner and name after 'repos'",),),
        }
    }
}

/// Normalized view of one open pull request.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct WorkItemRecord
{
    pub number:     u64,
    /// Label names in the order returned by the API.
    pub labels:     Vec<String,>,
    pub author:     String,
    /// Requested reviewer logins in the order returned by the API.
    pub reviewers:  Vec<String,>,
    pub collection: Collection,
}

/// Normalizes raw pull requests, preserving their order.
///
/// # Errors
///
/// Returns [`Error::Parse`] for the first item whose URL cannot be mapped to
/// a collection.
pub fn normalize<L,>(locator: &L, items: Vec<RawPullRequest,>,) -> Result<Vec<WorkItemRecord,>, Error,>
where
    L: ResourceLocator + ?Sized,
{
    items.into_iter().map(|item| normalize_item(locator, item,),).collect()
}

fn normalize_item<L,>(locator: &L, item: RawPullRequest,) -> Result<WorkItemRecord, Error,>
where
    L: ResourceLocator + ?Sized,
{
    let collection = locator.parse(&item.url,)?;

    Ok(WorkItemRecord {
        number: item.number,
        labels: item.labels.unwrap_or_default().into_iter().map(|label| label.name,).collect(),
        author: item.user.map(|user| user.login,).unwrap_or_default(),
        reviewers: item
            .requested_reviewers
            .unwrap_or_default()
            .into_iter()
            .map(|reviewer| reviewer.login,)
            .collect(),
        collection,
    },)
}
