// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Gauge registry publishing one series per open pull request.
//!
//! The registry is an owned value handed to the scheduler and the exposition
//! server, never a process-wide singleton. A whole publish (reset followed by
//! every `set`) runs under a write guard and rendering takes the read side, so
//! a scrape sees either the previous or the new series set in full.

use std::{
    sync::{PoisonError, RwLock},
    time::{SystemTime, UNIX_EPOCH},
};

use prometheus::{Encoder, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder};

use crate::{error::Error, normalizer::WorkItemRecord};

const NAMESPACE: &str = "github_pr";
const SUBSYSTEM: &str = "prometheus_exporter";

/// Fully qualified name of the pull request gauge family.
pub const PULL_REQUEST_METRIC: &str = "github_pr_prometheus_exporter_pull_request_count";
/// Fully qualified name of the last refresh timestamp gauge.
pub const LAST_REFRESH_METRIC: &str =
    "github_pr_prometheus_exporter_last_refresh_timestamp_seconds";

/// Label names of the pull request gauge, in [`SeriesLabels::values`] order.
pub const LABEL_NAMES: [&str; 5] = ["number", "label", "author", "reviewer", "repo"];

/// Separator used when joining label names and reviewer logins.
const JOIN_SEPARATOR: &str = ",";

/// Label tuple identifying one gauge series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default,)]
pub struct SeriesLabels
{
    pub number:     String,
    /// Label names joined with a comma.
    pub labels:     String,
    pub author:     String,
    /// Reviewer logins joined with a comma.
    pub reviewers:  String,
    /// `owner/name` of the owning repository.
    pub repository: String,
}

impl SeriesLabels
{
    /// Label values in [`LABEL_NAMES`] order.
    pub fn values(&self,) -> [&str; 5]
    {
        [&self.number, &self.labels, &self.author, &self.reviewers, &self.repository,]
    }
}

impl From<&WorkItemRecord,> for SeriesLabels
{
    fn from(record: &WorkItemRecord,) -> Self
    {
        Self {
            number:     record.number.to_string(),
            labels:     record.labels.join(JOIN_SEPARATOR,),
            author:     record.author.clone(),
            reviewers:  record.reviewers.join(JOIN_SEPARATOR,),
            repository: record.collection.to_string(),
        }
    }
}

/// Owned registry holding the pull request gauge family.
pub struct PullRequestMetrics
{
    registry:      Registry,
    pull_requests: IntGaugeVec,
    last_refresh:  IntGauge,
    guard:         RwLock<(),>,
}

impl PullRequestMetrics
{
    /// Creates a registry with both gauges registered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Metrics`] when a metric descriptor is rejected.
    pub fn new() -> Result<Self, Error,>
    {
        let registry = Registry::new();

        let pull_requests = IntGaugeVec::new(
            Opts::new("pull_request_count", "Number of Pull Requests",)
                .namespace(NAMESPACE,)
                .subsystem(SUBSYSTEM,),
            &LABEL_NAMES,
        )?;
        let last_refresh = IntGauge::with_opts(
            Opts::new(
                "last_refresh_timestamp_seconds",
                "Unix time of the last successful refresh",
            )
            .namespace(NAMESPACE,)
            .subsystem(SUBSYSTEM,),
        )?;

        registry.register(Box::new(pull_requests.clone(),),)?;
        registry.register(Box::new(last_refresh.clone(),),)?;

        Ok(Self {
            registry,
            pull_requests,
            last_refresh,
            guard: RwLock::new((),),
        },)
    }

    /// Removes every pull request series.
    ///
    /// Does not take the publish guard; use [`publish`](Self::publish) for
    /// an atomic swap.
    pub fn reset(&self,)
    {
        self.pull_requests.reset();
    }

    /// Sets the gauge identified by `labels`.
    pub fn set(&self, labels: &SeriesLabels, value: i64,)
    {
        self.pull_requests.with_label_values(&labels.values(),).set(value,);
    }

    /// Replaces the published series with one gauge of value 1 per record.
    ///
    /// Records producing the same label tuple collapse into one series.
    pub fn publish(&self, records: &[WorkItemRecord],)
    {
        let _guard = self.guard.write().unwrap_or_else(PoisonError::into_inner,);

        self.reset();
        for record in records {
            self.set(&SeriesLabels::from(record,), 1,);
        }

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH,)
            .map(|elapsed| elapsed.as_secs() as i64,)
            .unwrap_or_default();
        self.last_refresh.set(now,);
    }

    /// Renders the registry in the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Metrics`] when encoding fails.
    pub fn render(&self,) -> Result<String, Error,>
    {
        let families = {
            let _guard = self.guard.read().unwrap_or_else(PoisonError::into_inner,);
            self.registry.gather()
        };

        let mut buffer = String::new();
        TextEncoder::new().encode_utf8(&families, &mut buffer,)?;
        Ok(buffer,)
    }

    /// Content type matching [`render`](Self::render).
    pub fn content_type(&self,) -> String
    {
        TextEncoder::new().format_type().to_owned()
    }

    /// Currently published pull request series and their values, sorted.
    pub fn snapshot(&self,) -> Vec<(SeriesLabels, i64,),>
    {
        let families = {
            let _guard = self.guard.read().unwrap_or_else(PoisonError::into_inner,);
            self.registry.gather()
        };

        let mut series: Vec<(SeriesLabels, i64,),> = families
            .iter()
            .filter(|family| family.get_name() == PULL_REQUEST_METRIC,)
            .flat_map(|family| family.get_metric(),)
            .map(|metric| {
                let mut labels = SeriesLabels::default();
                for pair in metric.get_label() {
                    let value = pair.get_value().to_owned();
                    match pair.get_name() {
                        "number" => labels.number = value,
                        "label" => labels.labels = value,
                        "author" => labels.author = value,
                        "reviewer" => labels.reviewers = value,
                        "repo" => labels.repository = value,
                        _ => {}
                    }
                }
                (labels, metric.get_gauge().get_value() as i64,)
            },)
            .collect();

        series.sort();
        series
    }

    /// Value of the last refresh timestamp gauge.
    pub fn last_refresh(&self,) -> i64
    {
        self.last_refresh.get()
    }
}

#[cfg(test)]
mod tests
{
    use std::{sync::Arc, thread};

    use super::*;
    use crate::collection::Collection;

    fn record(number: u64, collection: &str,) -> WorkItemRecord
    {
        WorkItemRecord {
            number,
            labels: Vec::new(),
            author: "octocat".to_owned(),
            reviewers: Vec::new(),
            collection: collection.parse::<Collection>().expect("valid collection",),
        }
    }

    fn numbers(metrics: &PullRequestMetrics,) -> Vec<String,>
    {
        metrics.snapshot().into_iter().map(|(labels, _,)| labels.number,).collect()
    }

    #[test]
    fn publishes_one_series_per_record()
    {
        let metrics = PullRequestMetrics::new().expect("registry",);
        metrics.publish(&[record(1, "acme/widgets",), record(2, "acme/widgets",), record(
            3,
            "octo/hello",
        )],);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.len(), 3);
        assert!(snapshot.iter().all(|(_, value,)| *value == 1));
    }

    #[test]
    fn closed_items_disappear_on_next_publish()
    {
        let metrics = PullRequestMetrics::new().expect("registry",);
        metrics.publish(&[record(1, "acme/widgets",), record(2, "acme/widgets",)],);
        assert_eq!(numbers(&metrics), vec!["1", "2"]);

        metrics.publish(&[record(2, "acme/widgets",)],);
        assert_eq!(numbers(&metrics), vec!["2"]);
    }

    #[test]
    fn republishing_same_state_is_idempotent()
    {
        let metrics = PullRequestMetrics::new().expect("registry",);
        let records = [record(1, "acme/widgets",), record(9, "octo/hello",)];

        metrics.publish(&records,);
        let first = metrics.snapshot();
        metrics.publish(&records,);

        assert_eq!(metrics.snapshot(), first);
    }

    #[test]
    fn labels_and_reviewers_are_comma_joined()
    {
        let metrics = PullRequestMetrics::new().expect("registry",);
        let mut item = record(42, "acme/widgets",);
        item.labels = vec!["bug".to_owned(), "urgent".to_owned()];
        item.reviewers = vec!["alice".to_owned(), "bob".to_owned()];

        metrics.publish(&[item],);

        let (labels, value,) = metrics.snapshot().remove(0,);
        assert_eq!(value, 1);
        assert_eq!(labels, SeriesLabels {
            number:     "42".to_owned(),
            labels:     "bug,urgent".to_owned(),
            author:     "octocat".to_owned(),
            reviewers:  "alice,bob".to_owned(),
            repository: "acme/widgets".to_owned(),
        });
    }

    #[test]
    fn identical_tuples_collapse_into_one_series()
    {
        let metrics = PullRequestMetrics::new().expect("registry",);
        metrics.publish(&[record(5, "acme/widgets",), record(5, "acme/widgets",)],);
        assert_eq!(metrics.snapshot().len(), 1);
    }

    #[test]
    fn empty_publish_clears_everything()
    {
        let metrics = PullRequestMetrics::new().expect("registry",);
        metrics.publish(&[record(1, "acme/widgets",)],);
        metrics.publish(&[],);
        assert!(metrics.snapshot().is_empty());
    }

    #[test]
    fn reset_and_set_primitives()
    {
        let metrics = PullRequestMetrics::new().expect("registry",);
        let labels = SeriesLabels {
            number: "7".to_owned(), ..SeriesLabels::default()
        };

        metrics.set(&labels, 1,);
        assert_eq!(metrics.snapshot(), vec![(labels, 1)]);

        metrics.reset();
        assert!(metrics.snapshot().is_empty());
    }

    #[test]
    fn render_uses_text_exposition_format()
    {
        let metrics = PullRequestMetrics::new().expect("registry",);
        metrics.publish(&[record(42, "acme/widgets",)],);

        let body = metrics.render().expect("render",);
        assert!(body.contains("# TYPE github_pr_prometheus_exporter_pull_request_count gauge"));
        let series = body
            .lines()
            .find(|line| line.starts_with(&format!("{PULL_REQUEST_METRIC}{{"),),)
            .expect("pull request series line",);
        assert!(series.contains("number=\"42\""));
        assert!(series.contains("repo=\"acme/widgets\""));
        assert!(series.ends_with(" 1"));
        assert!(body.contains(LAST_REFRESH_METRIC));
        assert!(metrics.last_refresh() > 0);
        assert!(metrics.content_type().starts_with("text/plain"));
    }

    #[test]
    fn concurrent_scrapes_never_see_a_partial_cycle()
    {
        let metrics = Arc::new(PullRequestMetrics::new().expect("registry",),);
        let first: Vec<WorkItemRecord,> = (0..50).map(|n| record(n, "acme/widgets",),).collect();
        let second: Vec<WorkItemRecord,> =
            (100..150).map(|n| record(n, "octo/hello",),).collect();
        metrics.publish(&first,);

        let writer = {
            let metrics = Arc::clone(&metrics,);
            thread::spawn(move || {
                for round in 0..200 {
                    metrics.publish(if round % 2 == 0 { &second } else { &first },);
                }
            },)
        };

        for _ in 0..200 {
            let snapshot = metrics.snapshot();
            assert_eq!(snapshot.len(), 50);
            let repositories: std::collections::HashSet<&str,> =
                snapshot.iter().map(|(labels, _,)| labels.repository.as_str(),).collect();
            assert_eq!(repositories.len(), 1);
        }

        writer.join().expect("writer thread",);
    }
}
