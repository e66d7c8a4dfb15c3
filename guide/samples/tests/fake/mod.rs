// Copyright 2026 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Helpers to run the snippets against `httptest` servers.

// Each test binary uses a subset of the helpers.
#![allow(dead_code)]

use cloud_snippets_samples::client::Client;
use httptest::Server;
use httptest::responders::{Responder, json_encoded, status_code};
use lro::PollingOptions;
use lro::polling_backoff_policy::FixedInterval;
use lro::polling_error_policy::{Aip194Strict, PollingErrorPolicyExt};
use std::time::Duration;

pub fn client(server: &Server) -> anyhow::Result<Client> {
    let client = Client::builder()
        .with_endpoint(format!("http://{}", server.addr()))
        .build()?;
    Ok(client)
}

/// Options with the same shape as the snippets' defaults, but fast.
pub fn options(attempts: u32) -> PollingOptions {
    PollingOptions::new()
        .with_polling_error_policy(Aip194Strict.with_attempt_limit(attempts))
        .with_polling_backoff_policy(FixedInterval::new(Duration::from_millis(1)))
}

pub fn ok(body: serde_json::Value) -> Box<dyn Responder> {
    Box::new(json_encoded(body))
}

pub fn unavailable() -> Box<dyn Responder> {
    let body = serde_json::json!({"error": {
        "code": 503,
        "status": "UNAVAILABLE",
        "message": "try-again",
    }});
    Box::new(status_code(503).body(body.to_string()))
}

pub fn not_found() -> impl Responder {
    let body = serde_json::json!({"error": {
        "code": 404,
        "status": "NOT_FOUND",
        "message": "not here",
    }});
    status_code(404).body(body.to_string())
}
