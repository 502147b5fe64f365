// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use footprint_app::{CancelToken, CredentialDocument, FetchError, RequestId, demo_credentials};
use footprint_credentials::Client;
use footprint_tui::{InternalEvent, PageRuntime};
use std::sync::mpsc::Sender;
use std::thread;
use time::OffsetDateTime;
use tracing::debug;

/// Fetches from the credential service on a worker thread per request.
pub struct NetworkRuntime {
    client: Client,
}

impl NetworkRuntime {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl PageRuntime for NetworkRuntime {
    fn fetch_credentials(
        &mut self,
        asset_id: &str,
        cancel: &CancelToken,
    ) -> Result<Vec<CredentialDocument>, FetchError> {
        self.client.fetch_credentials(asset_id, cancel)
    }

    fn spawn_fetch(
        &mut self,
        request_id: RequestId,
        asset_id: &str,
        cancel: CancelToken,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let client = self.client.clone();
        let asset_id = asset_id.to_owned();
        thread::Builder::new()
            .name("credential-fetch".to_owned())
            .spawn(move || {
                let result = client.fetch_credentials(&asset_id, &cancel);
                let event = InternalEvent::FetchCompleted {
                    request_id,
                    result,
                    finished_at: OffsetDateTime::now_utc(),
                };
                if tx.send(event).is_err() {
                    debug!(request_id = request_id.get(), "page closed before fetch finished");
                }
            })
            .context("spawn credential fetch thread")?;
        Ok(())
    }
}

/// Serves the bundled sample documents without touching the network.
#[derive(Debug, Default)]
pub struct OfflineRuntime;

impl PageRuntime for OfflineRuntime {
    fn fetch_credentials(
        &mut self,
        _asset_id: &str,
        cancel: &CancelToken,
    ) -> Result<Vec<CredentialDocument>, FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        demo_credentials()
    }
}

#[cfg(test)]
mod tests {
    use super::{NetworkRuntime, OfflineRuntime};
    use anyhow::{Result, bail};
    use footprint_app::{CancelToken, FetchError, RequestId, demo_credentials_json};
    use footprint_credentials::{Client, RetryPolicy};
    use footprint_testkit::{MockResponse, MockServer};
    use footprint_tui::{InternalEvent, PageRuntime};
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn network_runtime_reports_result_on_channel() -> Result<()> {
        let server = MockServer::start(vec![MockResponse::json(200, demo_credentials_json())])?;
        let client = Client::new(server.base_url(), Duration::from_secs(1), RetryPolicy::none())?;
        let mut runtime = NetworkRuntime::new(client);
        let (tx, rx) = mpsc::channel();

        runtime.spawn_fetch(RequestId::new(7), "iata:Piece/KobePiece", CancelToken::new(), tx)?;

        match rx.recv_timeout(Duration::from_secs(5))? {
            InternalEvent::FetchCompleted {
                request_id, result, ..
            } => {
                assert_eq!(request_id, RequestId::new(7));
                assert_eq!(result?.len(), 3);
            }
            other => bail!("unexpected event {other:?}"),
        }

        let requests = server.finish()?;
        assert_eq!(requests[0].url, "/credential/?id=iata%3APiece%2FKobePiece");
        Ok(())
    }

    #[test]
    fn network_runtime_passes_failures_through() -> Result<()> {
        let server = MockServer::start(vec![MockResponse::json(404, r#"{"detail":"no such asset"}"#)])?;
        let client = Client::new(server.base_url(), Duration::from_secs(1), RetryPolicy::none())?;
        let mut runtime = NetworkRuntime::new(client);

        let error = runtime
            .fetch_credentials("nope", &CancelToken::new())
            .expect_err("404 should fail");
        assert_eq!(
            error,
            FetchError::Status {
                code: 404,
                message: "no such asset".to_owned()
            }
        );
        server.finish()?;
        Ok(())
    }

    #[test]
    fn offline_runtime_serves_bundled_documents() -> Result<()> {
        let mut runtime = OfflineRuntime;
        let documents = runtime.fetch_credentials("anything", &CancelToken::new())?;
        assert_eq!(documents.len(), 3);

        let token = CancelToken::new();
        token.cancel();
        assert_eq!(
            runtime.fetch_credentials("anything", &token),
            Err(FetchError::Cancelled)
        );
        Ok(())
    }
}
