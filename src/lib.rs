//! Prometheus exporter for open GitHub pull requests.
//!
//! The library polls the configured repositories for open pull requests,
//! normalizes them into records, and republishes the whole set as gauges of
//! value 1 on every cycle. The binary wires the pieces together: it reads the
//! settings from the environment, serves `/metrics`, and drives the
//! [`Scheduler`].

mod collection;
mod config;
mod error;
mod exporter;
mod metrics;
mod normalizer;
mod scheduler;
mod server;
mod source;

pub use collection::{Collection, parse_collections};
pub use config::{
    Credential, DEFAULT_POLL_INTERVAL_SECS, POLL_INTERVAL_VAR, REPOSITORIES_VAR, Settings,
    TOKEN_VAR, read_collections, read_credential, read_poll_interval,
};
pub use error::{Error, server_error};
pub use exporter::{Cycle, CycleReport, Exporter};
pub use metrics::{
    LABEL_NAMES, LAST_REFRESH_METRIC, PULL_REQUEST_METRIC, PullRequestMetrics, SeriesLabels,
};
pub use normalizer::{ApiUrlLocator, ResourceLocator, WorkItemRecord, normalize};
pub use scheduler::{CyclePolicy, Scheduler};
pub use server::{bind, build_router, serve};
pub use source::{
    GithubApi, PageRequest, PullRequestApi, PullRequestPage, RawAccount, RawLabel, RawPullRequest,
    SourceClient,
};
