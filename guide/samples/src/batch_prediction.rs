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

//! Wait for Vertex AI batch prediction jobs.

use crate::client::Client;
use crate::model::RpcStatus;
use lro::error::rpc::{Code, Status};
use lro::{Disposition, Poller, PollingOptions};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Returns the Vertex AI endpoint for `location`.
pub fn endpoint(location: &str) -> String {
    format!("https://{location}-aiplatform.googleapis.com")
}

/// A batch prediction job, as returned by
/// `projects.locations.batchPredictionJobs.get`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct BatchPredictionJob {
    pub name: String,
    pub display_name: String,
    pub model: String,
    pub state: String,
    pub error: Option<RpcStatus>,
    pub create_time: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub update_time: Option<String>,
    pub labels: BTreeMap<String, String>,
    pub input_config: Option<serde_json::Value>,
    pub output_config: Option<serde_json::Value>,
    pub output_info: Option<serde_json::Value>,
}

impl lro::Operation for BatchPredictionJob {
    fn name(&self) -> Option<&str> {
        Some(self.name.as_str()).filter(|n| !n.is_empty())
    }
}

/// Polls every minute, for up to a day.
///
/// Batch prediction jobs often run for hours.
pub fn default_options() -> PollingOptions {
    use lro::polling_backoff_policy::FixedInterval;
    use lro::polling_error_policy::{Aip194Strict, PollingErrorPolicyExt};
    use std::time::Duration;

    PollingOptions::new()
        .with_polling_error_policy(Aip194Strict.with_time_limit(Duration::from_secs(24 * 60 * 60)))
        .with_polling_backoff_policy(FixedInterval::new(Duration::from_secs(60)))
}

/// Classifies batch prediction jobs.
///
/// Jobs that partially succeeded are considered successful, the caller can
/// examine the `output_info` and `error` fields for details. Failed, cancelled
/// and expired jobs carry the error reported by the service.
pub fn classifier() -> impl lro::Classifier<BatchPredictionJob> {
    |job: &BatchPredictionJob| match job.state.as_str() {
        "JOB_STATE_SUCCEEDED" | "JOB_STATE_PARTIALLY_SUCCEEDED" => Disposition::Succeeded,
        "JOB_STATE_FAILED" | "JOB_STATE_CANCELLED" | "JOB_STATE_EXPIRED" => {
            Disposition::Failed(failure(job))
        }
        _ => Disposition::InProgress,
    }
}

fn failure(job: &BatchPredictionJob) -> Status {
    match &job.error {
        Some(e) if e.code != 0 || !e.message.is_empty() => e.clone().into(),
        _ => Status::default()
            .set_code(Code::Aborted)
            .set_message(format!("batch prediction job {} is {}", job.name, job.state)),
    }
}

// ANCHOR: get-batch-prediction-job
/// Prints the current status of a batch prediction job.
pub async fn get_batch_prediction_job(
    client: &Client,
    project_id: &str,
    location: &str,
    job_id: &str,
) -> crate::Result<BatchPredictionJob> {
    let name = format!("projects/{project_id}/locations/{location}/batchPredictionJobs/{job_id}");
    let job: BatchPredictionJob = client.get(&format!("/v1/{name}")).await?;
    print_job(&job);
    Ok(job)
}
// ANCHOR_END: get-batch-prediction-job

// ANCHOR: wait-batch-prediction-job
/// Waits until a batch prediction job completes.
///
/// The job is usually created by a different process, the function resumes
/// polling using its name.
pub async fn wait_batch_prediction_job(
    client: &Client,
    project_id: &str,
    location: &str,
    job_id: &str,
    options: PollingOptions,
) -> crate::Result<BatchPredictionJob> {
    let name = format!("projects/{project_id}/locations/{location}/batchPredictionJobs/{job_id}");
    let job = lro::resume_poller(
        options,
        name,
        |name| async move { client.get::<BatchPredictionJob>(&format!("/v1/{name}")).await },
        classifier(),
    )
    .until_done()
    .await?;
    print_job(&job);
    Ok(job)
}
// ANCHOR_END: wait-batch-prediction-job

fn print_job(job: &BatchPredictionJob) {
    println!("Get batch prediction job response");
    println!("\tName : {}", job.name);
    println!("\tDisplayName : {}", job.display_name);
    println!("\tModel : {}", job.model);
    println!("\tState : {}", job.state);
    println!("\tCreate Time : {}", job.create_time.as_deref().unwrap_or_default());
    println!("\tStart Time : {}", job.start_time.as_deref().unwrap_or_default());
    println!("\tEnd Time : {}", job.end_time.as_deref().unwrap_or_default());
    println!("\tUpdate Time : {}", job.update_time.as_deref().unwrap_or_default());
    println!("\tLabels : {:?}", job.labels);
    if let Some(info) = &job.output_info {
        println!("\tOutput info : {info}");
    }
    if let Some(error) = &job.error {
        println!("\tError : {} {}", error.code, error.message);
    }
}
