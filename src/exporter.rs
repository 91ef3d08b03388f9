// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! One refresh cycle: fetch open pull requests, normalize them, publish them.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use tracing::debug;

use crate::{
    collection::Collection,
    error::Error,
    metrics::PullRequestMetrics,
    normalizer::{ApiUrlLocator, ResourceLocator, normalize},
    source::{PullRequestApi, SourceClient},
};

/// Outcome of a successful cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq,)]
pub struct CycleReport
{
    /// Number of repositories polled.
    pub collections:   usize,
    /// Number of open pull requests published.
    pub pull_requests: usize,
    /// Wall time spent in the cycle.
    pub elapsed:       Duration,
}

/// A unit of work repeated by the [`Scheduler`](crate::Scheduler).
#[async_trait]
pub trait Cycle: Send + Sync
{
    /// Runs one full pass.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any stage of the pass.
    async fn run(&self,) -> Result<CycleReport, Error,>;
}

/// The fetch → normalize → publish pipeline.
pub struct Exporter<A, L = ApiUrlLocator,>
{
    source:      SourceClient<A,>,
    locator:     L,
    collections: Vec<Collection,>,
    metrics:     Arc<PullRequestMetrics,>,
}

impl<A, L,> Exporter<A, L,>
where
    A: PullRequestApi,
    L: ResourceLocator,
{
    /// Creates a pipeline publishing into `metrics`.
    pub fn new(
        source: SourceClient<A,>,
        locator: L,
        collections: Vec<Collection,>,
        metrics: Arc<PullRequestMetrics,>,
    ) -> Self
    {
        Self {
            source,
            locator,
            collections,
            metrics,
        }
    }
}

#[async_trait]
impl<A, L,> Cycle for Exporter<A, L,>
where
    A: PullRequestApi,
    L: ResourceLocator,
{
    async fn run(&self,) -> Result<CycleReport, Error,>
    {
        let started = Instant::now();

        let items = self.source.fetch_open_items(&self.collections,).await?;
        debug!("Fetched {} open pull requests across {} repositories", items.len(), self.collections.len());

        let records = normalize(&self.locator, items,)?;
        self.metrics.publish(&records,);

        Ok(CycleReport {
            collections:   self.collections.len(),
            pull_requests: records.len(),
            elapsed:       started.elapsed(),
        },)
    }
}
