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

//! Create Cloud Batch jobs and wait for them.

use crate::client::Client;
use lro::error::rpc::{Code, Status};
use lro::{Disposition, Poller, PollingOptions};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// The Cloud Batch endpoint.
pub const ENDPOINT: &str = "https://batch.googleapis.com";

/// A Cloud Batch job.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct Job {
    pub name: String,
    pub uid: String,
    pub status: JobStatus,
}

impl lro::Operation for Job {
    fn name(&self) -> Option<&str> {
        Some(self.name.as_str()).filter(|n| !n.is_empty())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct JobStatus {
    pub state: String,
    pub status_events: Vec<StatusEvent>,
    pub run_duration: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct StatusEvent {
    pub r#type: String,
    pub description: String,
    pub event_time: Option<String>,
}

/// Polls every 2 seconds, up to 100 times.
pub fn default_options() -> PollingOptions {
    use lro::polling_backoff_policy::FixedInterval;
    use lro::polling_error_policy::{Aip194Strict, PollingErrorPolicyExt};
    use std::time::Duration;

    PollingOptions::new()
        .with_polling_error_policy(Aip194Strict.with_attempt_limit(100))
        .with_polling_backoff_policy(FixedInterval::new(Duration::from_secs(2)))
}

/// Classifies Cloud Batch jobs.
///
/// A failed job reports the last status event as its error. Jobs being
/// deleted never complete, so they are also treated as failures.
pub fn classifier() -> impl lro::Classifier<Job> {
    |job: &Job| match job.status.state.as_str() {
        "SUCCEEDED" => Disposition::Succeeded,
        "FAILED" => {
            let message = job
                .status
                .status_events
                .last()
                .map(|e| e.description.clone())
                .unwrap_or_else(|| format!("job {} failed", job.name));
            Disposition::Failed(
                Status::default()
                    .set_code(Code::Aborted)
                    .set_message(message),
            )
        }
        "DELETION_IN_PROGRESS" => Disposition::Failed(
            Status::default()
                .set_code(Code::Cancelled)
                .set_message(format!("job {} is being deleted", job.name)),
        ),
        _ => Disposition::InProgress,
    }
}

// ANCHOR: create-labels-runnable
/// Creates a job with labelled runnables, and waits until it completes.
pub async fn create_job_with_runnable_labels(
    client: &Client,
    project_id: &str,
    region: &str,
    job_id: &str,
    options: PollingOptions,
) -> crate::Result<Job> {
    let path = format!("/v1/projects/{project_id}/locations/{region}/jobs?jobId={job_id}");
    let script = "echo Hello world! This is task ${BATCH_TASK_INDEX}.";
    let request = json!({
        "taskGroups": [{
            "taskCount": 3,
            "taskSpec": {
                "runnables": [
                    {
                        "container": {
                            "imageUri": "gcr.io/google-containers/busybox",
                            "entrypoint": "/bin/sh",
                            "commands": ["-c", script],
                        },
                        "labels": {"RUNNABLE_LABEL_NAME1": "RUNNABLE_LABEL_VALUE1"},
                    },
                    {
                        "script": {"text": script},
                        "labels": {"RUNNABLE_LABEL_NAME2": "RUNNABLE_LABEL_VALUE2"},
                    },
                ],
                "computeResource": {"cpuMilli": 500, "memoryMib": 16},
                "maxRetryCount": 2,
                "maxRunDuration": "3600s",
            },
        }],
        "logsPolicy": {"destination": "CLOUD_LOGGING"},
    });

    let job = lro::new_poller(
        options,
        || client.create::<_, Job>(&path, &request),
        |name| async move { client.get::<Job>(&format!("/v1/{name}")).await },
        classifier(),
    )
    .until_done()
    .await?;
    println!("Job {} finished in state {}", job.name, job.status.state);
    if let Some(duration) = &job.status.run_duration {
        println!("  ran for {duration}");
    }
    Ok(job)
}
// ANCHOR_END: create-labels-runnable
