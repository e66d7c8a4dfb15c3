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

//! Polls a job until it reaches a terminal state.
//!
//! The program is configured using environment variables:
//!
//! * `SNIPPETS_ENDPOINT`: the service endpoint, e.g. `https://dlp.googleapis.com`.
//! * `SNIPPETS_JOB_NAME`: the job name, e.g. `projects/my-project/dlpJobs/i-123`.
//! * `SNIPPETS_POLLING_CONFIG`: the path to a JSON polling configuration.
//! * `SNIPPETS_API_VERSION`: optional, defaults to `v1`.
//! * `SNIPPETS_STATE_POINTER`: optional JSON pointer to the job state,
//!   defaults to `/state`.
//! * `SNIPPETS_ACCESS_TOKEN`: optional bearer token.
//!
//! Use `RUST_LOG` to control the log output, e.g. `RUST_LOG=cloud_snippets_lro=debug`.

use cloud_snippets_samples::client::Client;
use cloud_snippets_samples::resume::{JobRef, poll_json_job};
use lro::config::PollingConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let endpoint = required("SNIPPETS_ENDPOINT")?;
    let name = required("SNIPPETS_JOB_NAME")?;
    let config = PollingConfig::from_file(required("SNIPPETS_POLLING_CONFIG")?)?;
    let api_version = optional("SNIPPETS_API_VERSION").unwrap_or_else(|| "v1".to_string());
    let state_pointer = optional("SNIPPETS_STATE_POINTER").unwrap_or_else(|| "/state".to_string());

    let mut builder = Client::builder().with_endpoint(endpoint);
    if let Some(token) = optional("SNIPPETS_ACCESS_TOKEN") {
        builder = builder.with_access_token(token);
    }
    let client = builder.build()?;

    let job = JobRef {
        api_version: &api_version,
        name: &name,
        state_pointer: &state_pointer,
    };
    let response = poll_json_job(&client, job, &config).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn required(name: &str) -> anyhow::Result<String> {
    std::env::var(name).map_err(|e| anyhow::Error::msg(format!("{name} must be set: {e}")))
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
