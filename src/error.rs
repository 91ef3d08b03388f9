#![allow(non_shorthand_field_patterns)]
#![doc = "Error handling primitives shared across the exporter crate."]
// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! The derive emitted by [`masterror::Error`] expands pattern matches that
//! trigger the `non_shorthand_field_patterns` lint. The lint is disabled for
//! the module to keep the generated implementations warning-free.

use std::net::SocketAddr;

/// Unified error type returned by every stage of a refresh cycle and by the
/// exposition server.
///
/// `Config`, `Source` and `Parse` are the three cycle failures; with the
/// default policy each of them terminates the process.
#[derive(Debug, masterror::Error,)]
pub enum Error
{
    /// Missing or malformed environment input.
    #[error("invalid configuration: {message}")]
    Config
    {
        /// Human readable message describing the configuration problem.
        message: String,
    },
    /// Remote fetch failure, including authentication and pagination.
    #[error("source request failed: {message}")]
    Source
    {
        /// Human readable message describing the failed request.
        message: String,
    },
    /// Unexpected shape of a resource locator.
    #[error("failed to parse resource locator {locator:?}: {message}")]
    Parse
    {
        /// The offending locator value.
        locator: String,
        /// What was wrong with it.
        message: String,
    },
    /// Wraps failures reported by the Prometheus registry.
    #[error("metrics registry error: {source}")]
    Metrics
    {
        /// Underlying registry error.
        source: prometheus::Error,
    },
    /// Wraps I/O failures of the exposition server.
    #[error("metrics server failed on {address}: {source}")]
    Server
    {
        /// Address the server was bound to.
        address: SocketAddr,
        /// Underlying I/O error.
        source:  std::io::Error,
    },
}

impl Error
{
    /// Constructs a configuration error from the provided message.
    pub fn config<M,>(message: M,) -> Self
    where
        M: Into<String,>,
    {
        Self::Config {
            message: message.into(),
        }
    }

    /// Constructs a source error from the provided message.
    pub fn source_failure<M,>(message: M,) -> Self
    where
        M: Into<String,>,
    {
        Self::Source {
            message: message.into(),
        }
    }

    /// Constructs a parse error for the given locator.
    pub fn parse<L, M,>(locator: L, message: M,) -> Self
    where
        L: Into<String,>,
        M: Into<String,>,
    {
        Self::Parse {
            locator: locator.into(),
            message: message.into(),
        }
    }

    /// Formats the error for diagnostics without the variant name.
    pub fn to_display_string(&self,) -> String
    {
        format!("{self}")
    }
}

impl From<prometheus::Error,> for Error
{
    fn from(source: prometheus::Error,) -> Self
    {
        Self::Metrics {
            source,
        }
    }
}

/// Creates an [`Error::Server`] variant capturing the address and source.
pub fn server_error(address: SocketAddr, source: std::io::Error,) -> Error
{
    Error::Server {
        address,
        source,
    }
}
