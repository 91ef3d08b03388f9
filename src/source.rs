// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Source client fetching open pull requests from the GitHub REST API.
//!
//! Pagination is driven here, page requests go through [`PullRequestApi`] so
//! the traversal can be exercised without a network.

use std::time::Duration;

use async_trait::async_trait;
use http::Uri;
use octocrab::{Octocrab, Page};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{collection::Collection, config::Credential, error::Error};

/// Maximum page size accepted by the pulls endpoint.
const PER_PAGE: u8 = 100;

/// Pull request as returned by `GET /repos/{owner}/{repo}/pulls`.
///
/// Only the fields consumed by the exporter are kept.
#[derive(Debug, Clone, Serialize, Deserialize,)]
pub struct RawPullRequest
{
    pub number:              u64,
    /// API resource URL, e.g. `https://api.github.com/repos/acme/widgets/pulls/42`.
    pub url:                 String,
    #[serde(default)]
    pub labels:              Option<Vec<RawLabel,>,>,
    #[serde(default)]
    pub user:                Option<RawAccount,>,
    #[serde(default)]
    pub requested_reviewers: Option<Vec<RawAccount,>,>,
}

/// Label attached to a pull request.
#[derive(Debug, Clone, Serialize, Deserialize,)]
pub struct RawLabel
{
    pub name: String,
}

/// User account reference.
#[derive(Debug, Clone, Serialize, Deserialize,)]
pub struct RawAccount
{
    pub login: String,
}

/// A single page request: either the first page of a collection or the
/// continuation cursor returned with a previous page.
#[derive(Debug,)]
pub enum PageRequest<'a, C,>
{
    First(&'a Collection,),
    Next(&'a C,),
}

/// One page of open pull requests plus the cursor of the following page.
#[derive(Debug,)]
pub struct PullRequestPage<C,>
{
    pub items: Vec<RawPullRequest,>,
    pub next:  Option<C,>,
}

impl<C,> PullRequestPage<C,>
{
    /// Page without items and without continuation.
    pub fn empty() -> Self
    {
        Self {
            items: Vec::new(), next: None,
        }
    }
}

/// Page-level access to the open pull requests of a repository.
#[async_trait]
pub trait PullRequestApi: Send + Sync
{
    /// Opaque continuation cursor.
    type Cursor: Send + Sync;

    /// Fetches a single page.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Source`] when the request fails.
    async fn fetch_page(
        &self,
        request: PageRequest<'_, Self::Cursor,>,
    ) -> Result<PullRequestPage<Self::Cursor,>, Error,>;
}

#[derive(Serialize,)]
struct ListOpenParams
{
    state:    &'static str,
    per_page: u8,
}

/// [`PullRequestApi`] backed by an authenticated [`Octocrab`] client.
///
/// Continuation cursors are the `next` links reported in the `Link` header.
#[derive(Debug, Clone,)]
pub struct GithubApi
{
    client: Octocrab,
}

impl GithubApi
{
    /// Builds a client authenticated with the personal access token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when `api_base` is not a valid URI and
    /// [`Error::Source`] when the client cannot be initialized.
    pub fn new(credential: &Credential, api_base: &str,) -> Result<Self, Error,>
    {
        let client = Octocrab::builder()
            .personal_token(credential.expose(),)
            .base_uri(api_base,)
            .map_err(|e| Error::config(format!("invalid API base '{api_base}': {e}"),),)?
            .build()
            .map_err(|e| {
                Error::source_failure(format!("failed to initialize GitHub client: {e}"),)
            },)?;

        Ok(Self {
            client,
        },)
    }
}

impl From<Page<RawPullRequest,>,> for PullRequestPage<Uri,>
{
    fn from(page: Page<RawPullRequest,>,) -> Self
    {
        Self {
            items: page.items, next: page.next,
        }
    }
}

#[async_trait]
impl PullRequestApi for GithubApi
{
    type Cursor = Uri;

    async fn fetch_page(
        &self,
        request: PageRequest<'_, Uri,>,
    ) -> Result<PullRequestPage<Uri,>, Error,>
    {
        match request {
            PageRequest::First(collection,) => {
                let route = format!("/repos/{}/{}/pulls", collection.owner, collection.name);
                let params = ListOpenParams {
                    state: "open", per_page: PER_PAGE,
                };
                let page: Page<RawPullRequest,> =
                    self.client.get(route, Some(&params,),).await.map_err(|e| {
                        Error::source_failure(format!(
                            "failed to list pull requests for {collection}: {e}"
                        ),)
                    },)?;

                Ok(page.into(),)
            }
            PageRequest::Next(cursor,) => {
                let page = self
                    .client
                    .get_page::<RawPullRequest>(&Some(cursor.clone(),),)
                    .await
                    .map_err(|e| {
                        Error::source_failure(format!("failed to follow page {cursor}: {e}"),)
                    },)?;

                Ok(page.map(PullRequestPage::from,).unwrap_or_else(PullRequestPage::empty,),)
            }
        }
    }
}

/// Fetches every open pull request of the configured collections.
#[derive(Debug,)]
pub struct SourceClient<A,>
{
    api:             A,
    request_timeout: Duration,
}

impl<A,> SourceClient<A,>
where
    A: PullRequestApi,
{
    /// Wraps a page API; every page request is bounded by `request_timeout`.
    pub fn new(api: A, request_timeout: Duration,) -> Self
    {
        Self {
            api,
            request_timeout,
        }
    }

    /// Fetches the open pull requests of all collections, in input order.
    ///
    /// Each collection is paginated until no continuation cursor remains.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Source`] as soon as any page request fails or times
    /// out. No partial result is returned.
    pub async fn fetch_open_items(
        &self,
        collections: &[Collection],
    ) -> Result<Vec<RawPullRequest,>, Error,>
    {
        let mut items = Vec::new();

        for collection in collections {
            let collected = self.fetch_collection(collection,).await?;
            debug!("Fetched {} open pull requests for {}", collected.len(), collection);
            items.extend(collected,);
        }

        Ok(items,)
    }

    async fn fetch_collection(
        &self,
        collection: &Collection,
    ) -> Result<Vec<RawPullRequest,>, Error,>
    {
        let mut collected = Vec::new();
        let mut page = self.request(PageRequest::First(collection,), collection,).await?;
        let mut pages = 1usize;

        loop {
            collected.extend(page.items,);
            let Some(cursor,) = page.next else {
                break;
            };

            page = self.request(PageRequest::Next(&cursor,), collection,).await?;
            pages += 1;
        }

        debug!("Followed {} pages for {}", pages, collection);
        Ok(collected,)
    }

    async fn request(
        &self,
        request: PageRequest<'_, A::Cursor,>,
        collection: &Collection,
    ) -> Result<PullRequestPage<A::Cursor,>, Error,>
    {
        tokio::time::timeout(self.request_timeout, self.api.fetch_page(request,),)
            .await
            .map_err(|_| {
                Error::source_failure(format!(
                    "request for {collection} timed out after {:?}",
                    self.request_timeout
                ),)
            },)?
    }
}
