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

//! Resume polling any job, using a configuration file.
//!
//! The job is treated as untyped JSON. Its state is found using a JSON
//! pointer, for example `/state` for DLP jobs or `/status/state` for Cloud
//! Batch jobs, and classified using the terminal states in the
//! configuration.

use crate::client::Client;
use lro::Poller;
use lro::config::PollingConfig;

/// The job to poll.
#[derive(Clone, Debug)]
pub struct JobRef<'a> {
    /// The API version prefix, such as `v1` or `v2`.
    pub api_version: &'a str,
    /// The job name, such as `projects/my-project/dlpJobs/i-123`.
    pub name: &'a str,
    /// A JSON pointer to the state field.
    pub state_pointer: &'a str,
}

// ANCHOR: resume-json-job
/// Polls `job` until it reaches one of the terminal states in `config`.
pub async fn poll_json_job(
    client: &Client,
    job: JobRef<'_>,
    config: &PollingConfig,
) -> crate::Result<serde_json::Value> {
    let states = config.terminal_states();
    if states.is_empty() {
        return Err(anyhow::Error::msg(
            "the polling configuration must list the succeeded or failed states",
        ));
    }
    let options = config.to_options()?;
    let pointer = job.state_pointer.to_string();
    let version = job.api_version;
    let classifier = states.by_state_with_details(
        move |job: &serde_json::Value| {
            job.pointer(&pointer)
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_string()
        },
        failure_details,
    );

    let response = lro::resume_poller(
        options,
        job.name,
        |name| async move {
            client
                .get::<serde_json::Value>(&format!("/{version}/{name}"))
                .await
        },
        classifier,
    )
    .until_done()
    .await?;
    Ok(response)
}
// ANCHOR_END: resume-json-job

/// The diagnostics attached to a failed job.
///
/// Services report errors in an `error` object or an `errors` list. Without
/// either, the whole job is attached.
fn failure_details(job: &serde_json::Value) -> Vec<serde_json::Value> {
    if let Some(error) = job.get("error") {
        return vec![error.clone()];
    }
    match job.get("errors") {
        Some(serde_json::Value::Array(errors)) => errors.clone(),
        Some(errors) => vec![errors.clone()],
        None => vec![job.clone()],
    }
}
