// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Environment-provided settings for the exporter.
//!
//! Three variables drive a refresh cycle: the access token, the repository
//! list and an optional poll interval. Each value has its own reader so the
//! failure message names the variable that is wrong. Readers take a lookup
//! function instead of touching the process environment directly, which keeps
//! them usable from tests.

use std::{fmt, time::Duration};

use crate::{
    collection::{Collection, parse_collections},
    error::Error,
};

/// Variable holding the GitHub access token.
pub const TOKEN_VAR: &str = "GITHUB_TOKEN";
/// Variable holding the comma-separated `owner/name` list.
pub const REPOSITORIES_VAR: &str = "GITHUB_REPOSITORIES";
/// Variable overriding the poll interval in seconds.
pub const POLL_INTERVAL_VAR: &str = "POLL_INTERVAL_SECONDS";
/// Poll interval used when [`POLL_INTERVAL_VAR`] is unset.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 300;

/// Secret bearer credential. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq,)]
pub struct Credential(String,);

impl Credential
{
    /// Returns the raw token for handing to the API client.
    pub fn expose(&self,) -> &str
    {
        &self.0
    }
}

impl fmt::Debug for Credential
{
    fn fmt(&self, f: &mut fmt::Formatter<'_,>,) -> fmt::Result
    {
        f.write_str("Credential(***)",)
    }
}

/// Settings resolved from the environment.
#[derive(Debug, Clone,)]
pub struct Settings
{
    /// Token used to authenticate against the API.
    pub credential:    Credential,
    /// Repositories to poll, in configured order.
    pub collections:   Vec<Collection,>,
    /// Delay between two refresh cycles.
    pub poll_interval: Duration,
}

impl Settings
{
    /// Reads all settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when a required variable is missing or any
    /// value is malformed.
    pub fn from_env() -> Result<Self, Error,>
    {
        Self::from_lookup(|key| std::env::var(key,).ok(),)
    }

    /// Reads all settings through the provided lookup function.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when a required variable is missing or any
    /// value is malformed.
    ///
    /// # Examples
    ///
    /// ```
    /// use gh_pr_exporter::Settings;
    ///
    /// let settings = Settings::from_lookup(|key| match key {
    ///     "GITHUB_TOKEN" => Some("ghp_example".to_owned(),),
    ///     "GITHUB_REPOSITORIES" => Some("acme/widgets".to_owned(),),
    ///     _ => None,
    /// },)?;
    /// assert_eq!(settings.poll_interval.as_secs(), 300);
    /// # Ok::<(), gh_pr_exporter::Error>(())
    /// ```
    pub fn from_lookup<F,>(lookup: F,) -> Result<Self, Error,>
    where
        F: Fn(&str,) -> Option<String,>,
    {
        let credential = read_credential(&lookup,)?;
        let collections = parse_collections(&read_collections(&lookup,)?,)?;
        let poll_interval = read_poll_interval(&lookup,)?;

        Ok(Self {
            credential,
            collections,
            poll_interval,
        },)
    }
}

/// Reads the access token.
///
/// # Errors
///
/// Returns [`Error::Config`] when the variable is unset or blank.
pub fn read_credential<F,>(lookup: &F,) -> Result<Credential, Error,>
where
    F: Fn(&str,) -> Option<String,>,
{
    required(lookup, TOKEN_VAR,).map(Credential,)
}

/// Reads the raw repository list. Splitting happens in
/// [`parse_collections`].
///
/// # Errors
///
/// Returns [`Error::Config`] when the variable is unset or blank.
pub fn read_collections<F,>(lookup: &F,) -> Result<String, Error,>
where
    F: Fn(&str,) -> Option<String,>,
{
    required(lookup, REPOSITORIES_VAR,)
}

/// Reads the poll interval, falling back to
/// [`DEFAULT_POLL_INTERVAL_SECS`] when the variable is unset or blank.
///
/// # Errors
///
/// Returns [`Error::Config`] when the value is not a positive integer.
pub fn read_poll_interval<F,>(lookup: &F,) -> Result<Duration, Error,>
where
    F: Fn(&str,) -> Option<String,>,
{
    let Some(raw,) = lookup(POLL_INTERVAL_VAR,).filter(|value| !value.trim().is_empty(),) else {
        return Ok(Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS,),);
    };

    let seconds = raw.trim().parse::<u64>().map_err(|e| {
        Error::config(format!("{POLL_INTERVAL_VAR} must be an integer number of seconds: {e}"),)
    },)?;

    if seconds == 0 {
        return Err(Error::config(format!("{POLL_INTERVAL_VAR} must be greater than zero"),),);
    }

    Ok(Duration::from_secs(seconds,),)
}

fn required<F,>(lookup: &F, key: &str,) -> Result<String, Error,>
where
    F: Fn(&str,) -> Option<String,>,
{
    match lookup(key,) {
        Some(value,) if !value.trim().is_empty() => Ok(value.trim().to_owned(),),
        _ => Err(Error::config(format!("missing environment variable: {key}"),),),
    }
}
