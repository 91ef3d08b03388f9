// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! HTTP exposition server.
//!
//! Serves `GET /metrics` from the shared [`PullRequestMetrics`] registry. Any
//! other path is answered with `404` by the router.

use std::{future::Future, net::SocketAddr, sync::Arc};

use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::{
    error::{Error, server_error},
    metrics::PullRequestMetrics,
};

/// Builds the router exposing the registry on `/metrics`.
pub fn build_router(metrics: Arc<PullRequestMetrics,>,) -> Router
{
    Router::new().route("/metrics", get(scrape,),).with_state(metrics,)
}

async fn scrape(State(metrics,): State<Arc<PullRequestMetrics,>,>,) -> Response
{
    match metrics.render() {
        Ok(body,) => ([(header::CONTENT_TYPE, metrics.content_type(),)], body,).into_response(),
        Err(error,) => {
            warn!("Failed to render metrics: {}", error);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("failed to render metrics: {error}"),)
                .into_response()
        }
    }
}

/// Binds the exposition listener.
///
/// # Errors
///
/// Returns [`Error::Server`] when the address cannot be bound.
pub async fn bind(address: SocketAddr,) -> Result<TcpListener, Error,>
{
    TcpListener::bind(address,).await.map_err(|e| server_error(address, e,),)
}

/// Serves scrapes until `shutdown` resolves, then drains open connections.
///
/// # Errors
///
/// Returns [`Error::Server`] when accepting connections fails.
pub async fn serve<F,>(
    listener: TcpListener,
    metrics: Arc<PullRequestMetrics,>,
    shutdown: F,
) -> Result<(), Error,>
where
    F: Future<Output = (),> + Send + 'static,
{
    let address = listener.local_addr().map_err(|e| {
        server_error(SocketAddr::from(([0, 0, 0, 0,], 0,),), e,)
    },)?;
    info!("Serving metrics on http://{}/metrics", address);

    axum::serve(listener, build_router(metrics,),)
        .with_graceful_shutdown(shutdown,)
        .await
        .map_err(|e| server_error(address, e,),)
}

#[cfg(test)]
mod tests
{
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpStream,
        sync::oneshot,
    };

    use super::*;
    use crate::{collection::Collection, normalizer::WorkItemRecord};

    async fn get(address: SocketAddr, path: &str,) -> String
    {
        let mut stream = TcpStream::connect(address,).await.expect("connect",);
        let request =
            format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes(),).await.expect("write request",);

        let mut response = String::new();
        stream.read_to_string(&mut response,).await.expect("read response",);
        response
    }

    #[tokio::test]
    async fn serves_published_series_and_shuts_down()
    {
        let metrics = Arc::new(PullRequestMetrics::new().expect("registry",),);
        metrics.publish(&[WorkItemRecord {
            number:     42,
            labels:     vec!["bug".to_owned()],
            author:     "carol".to_owned(),
            reviewers:  vec!["alice".to_owned(), "bob".to_owned()],
            collection: Collection::new("acme", "widgets",),
        }],);

        let listener =
            bind(SocketAddr::from(([127, 0, 0, 1,], 0,),),).await.expect("bind listener",);
        let address = listener.local_addr().expect("local address",);
        let (stop, stopped,) = oneshot::channel::<(),>();
        let server = tokio::spawn(serve(listener, Arc::clone(&metrics,), async move {
            let _ = stopped.await;
        },),);

        let response = get(address, "/metrics",).await;
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.contains("text/plain"));
        assert!(response.contains("reviewer=\"alice,bob\""));
        assert!(response.contains("repo=\"acme/widgets\""));

        let missing = get(address, "/",).await;
        assert!(missing.starts_with("HTTP/1.1 404"));

        stop.send((),).expect("server still running",);
        server.await.expect("server task",).expect("clean shutdown",);
    }

    #[tokio::test]
    async fn bind_reports_address_in_use()
    {
        let first =
            bind(SocketAddr::from(([127, 0, 0, 1,], 0,),),).await.expect("bind listener",);
        let taken = first.local_addr().expect("local address",);

        let error = bind(taken,).await.expect_err("expected address in use",);
        assert!(matches!(error, Error::Server { address, .. } if address == taken));
    }
}
