// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use footprint_app::EmissionRow;
use std::io::Read;
use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tiny_http::{Header, Response, Server};

const GAS_NAMES: [&str; 8] = [
    "CO2", "CH4", "N2O", "SF6", "NF3", "HFC-134a", "CF4", "HFC-23",
];

const MOCK_IDLE_TIMEOUT: Duration = Duration::from_secs(5);

pub fn temp_config_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("config.toml");
    Ok((dir, path))
}

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Seeded row generator. Values come from a small grid so sort keys collide often.
#[derive(Debug, Clone)]
pub struct EmissionsFaker {
    rng: DeterministicRng,
    seed: u64,
}

impl EmissionsFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            seed: normalized,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    pub fn row(&mut self, id: usize) -> EmissionRow {
        let name = GAS_NAMES[self.rng.int_n(GAS_NAMES.len())];
        let ours = self.amount();
        let benchmark = self.amount() + 0.5;
        EmissionRow::new(id, name, ours, benchmark)
    }

    pub fn rows(&mut self, count: usize) -> Vec<EmissionRow> {
        (0..count).map(|id| self.row(id)).collect()
    }

    fn amount(&mut self) -> f64 {
        (self.rng.int_n(8) as f64) * 0.25
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    pub content_type: &'static str,
    pub delay: Option<Duration>,
}

impl MockResponse {
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_owned(),
            content_type: "application/json",
            delay: None,
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_owned(),
            content_type: "text/plain",
            delay: None,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub body: String,
}

/// Local HTTP server that answers with a fixed script of responses, one per request.
pub struct MockServer {
    base_url: String,
    handle: JoinHandle<Vec<RecordedRequest>>,
}

impl MockServer {
    pub fn start(responses: Vec<MockResponse>) -> Result<Self> {
        let server =
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
        let base_url = format!("http://{}", server.server_addr());

        let handle = thread::spawn(move || {
            let mut recorded = Vec::new();
            for scripted in responses {
                let mut request = match server.recv_timeout(MOCK_IDLE_TIMEOUT) {
                    Ok(Some(request)) => request,
                    Ok(None) | Err(_) => break,
                };

                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);
                recorded.push(RecordedRequest {
                    method: request.method().as_str().to_owned(),
                    url: request.url().to_owned(),
                    body,
                });

                if let Some(delay) = scripted.delay {
                    thread::sleep(delay);
                }

                let mut response =
                    Response::from_string(scripted.body).with_status_code(scripted.status);
                if let Ok(header) = Header::from_bytes("Content-Type", scripted.content_type) {
                    response = response.with_header(header);
                }
                let _ = request.respond(response);
            }
            recorded
        });

        Ok(Self { base_url, handle })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Waits for the script to finish and returns what the server saw.
    pub fn finish(self) -> Result<Vec<RecordedRequest>> {
        self.handle
            .join()
            .map_err(|_| anyhow!("mock server thread panicked"))
    }
}
