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

//! Inspect and analyze data with Sensitive Data Protection (DLP) jobs.
//!
//! DLP jobs run in the background. Applications either poll the job until it
//! reaches the `DONE` state, or ask the service to publish a Pub/Sub message
//! when the job completes.

use crate::client::Client;
use lro::error::rpc::{Code, Status};
use lro::notification::{Subscription, wait_for_notification};
use lro::{Disposition, Poller, PollingOptions};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// The DLP endpoint.
pub const ENDPOINT: &str = "https://dlp.googleapis.com";

/// The message attribute carrying the job name in DLP notifications.
pub const JOB_NAME_ATTRIBUTE: &str = "DlpJobName";

/// A DLP job, as returned by `projects.dlpJobs.get`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct DlpJob {
    pub name: String,
    pub state: String,
    pub inspect_details: Option<InspectDetails>,
    pub risk_details: Option<RiskDetails>,
    pub errors: Vec<serde_json::Value>,
}

impl lro::Operation for DlpJob {
    fn name(&self) -> Option<&str> {
        Some(self.name.as_str()).filter(|n| !n.is_empty())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct InspectDetails {
    pub result: InspectResult,
}

#[serde_with::serde_as]
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct InspectResult {
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub processed_bytes: i64,
    pub info_type_stats: Vec<InfoTypeStats>,
}

#[serde_with::serde_as]
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct InfoTypeStats {
    pub info_type: InfoType,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub count: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
#[non_exhaustive]
pub struct InfoType {
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct RiskDetails {
    pub numerical_stats_result: Option<NumericalStatsResult>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct NumericalStatsResult {
    pub min_value: Value,
    pub max_value: Value,
    pub quantile_values: Vec<Value>,
}

/// A value in a BigQuery column.
///
/// At most one of the fields is set.
#[serde_with::serde_as]
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct Value {
    #[serde_as(as = "Option<serde_with::DisplayFromStr>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integer_value: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub float_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub string_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boolean_value: Option<bool>,
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self {
                integer_value: Some(v),
                ..
            } => write!(f, "{v}"),
            Self {
                float_value: Some(v),
                ..
            } => write!(f, "{v}"),
            Self {
                string_value: Some(v),
                ..
            } => write!(f, "{v}"),
            Self {
                boolean_value: Some(v),
                ..
            } => write!(f, "{v}"),
            _ => Ok(()),
        }
    }
}

/// The polling options used in the DLP snippets.
///
/// Check the job status up to 30 times, every 30 seconds.
pub fn default_options() -> PollingOptions {
    use lro::polling_backoff_policy::FixedInterval;
    use lro::polling_error_policy::{Aip194Strict, PollingErrorPolicyExt};
    use std::time::Duration;

    PollingOptions::new()
        .with_polling_error_policy(Aip194Strict.with_attempt_limit(30))
        .with_polling_backoff_policy(FixedInterval::new(Duration::from_secs(30)))
}

/// The options used when waiting for job notifications.
///
/// Give up after 15 minutes.
pub fn notification_options() -> PollingOptions {
    PollingOptions::new().with_deadline(std::time::Duration::from_secs(15 * 60))
}

/// Classifies DLP jobs.
///
/// `DONE` jobs succeeded, `FAILED` and `CANCELED` jobs failed. Anything else
/// (`PENDING`, `RUNNING`, `ACTIVE`) is still in progress.
pub fn classifier() -> impl lro::Classifier<DlpJob> {
    |job: &DlpJob| match job.state.as_str() {
        "DONE" => Disposition::Succeeded,
        "FAILED" | "CANCELED" => Disposition::Failed(
            Status::default()
                .set_code(Code::Aborted)
                .set_message(format!("DLP job {} is {}", job.name, job.state))
                .set_details(job.errors.clone()),
        ),
        _ => Disposition::InProgress,
    }
}

// ANCHOR: inspect-gcs-file
/// Inspects a Cloud Storage file, polling the job until it completes.
pub async fn inspect_gcs_file(
    client: &Client,
    project_id: &str,
    gcs_uri: &str,
    info_types: &[&str],
    options: PollingOptions,
) -> crate::Result<DlpJob> {
    let path = format!("/v2/projects/{project_id}/locations/global/dlpJobs");
    let request = json!({
        "inspectJob": {
            "inspectConfig": {
                "infoTypes": info_types.iter().map(|name| json!({"name": name})).collect::<Vec<_>>(),
                "minLikelihood": "POSSIBLE",
                "includeQuote": true,
            },
            "storageConfig": {
                "cloudStorageOptions": {"fileSet": {"url": gcs_uri}},
            },
        },
    });

    // ANCHOR: inspect-gcs-file-poller
    let job = lro::new_poller(
        options,
        || client.create::<_, DlpJob>(&path, &request),
        |name| async move { client.get::<DlpJob>(&format!("/v2/{name}")).await },
        classifier(),
    )
    .until_done()
    .await;
    // ANCHOR_END: inspect-gcs-file-poller
    let job = match job {
        Ok(job) => job,
        Err(e) if e.is_operation_failure() => {
            println!("Job Failed, Please check the configuration.");
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    println!("Job {} status: {}", job.name, job.state);
    print_findings(&job);
    Ok(job)
}
// ANCHOR_END: inspect-gcs-file

// ANCHOR: inspect-gcs-file-with-sampling
/// Inspects a sample of a Cloud Storage file, waiting for a Pub/Sub
/// notification instead of polling.
///
/// The job publishes a message to `topic_id` when it completes. The
/// subscription must be attached to that topic.
pub async fn inspect_gcs_file_with_sampling<S>(
    client: &Client,
    subscription: &mut S,
    project_id: &str,
    gcs_uri: &str,
    topic_id: &str,
    info_types: &[&str],
    options: PollingOptions,
) -> crate::Result<DlpJob>
where
    S: Subscription,
{
    let request = json!({
        "inspectJob": {
            "inspectConfig": {
                "infoTypes": info_types.iter().map(|name| json!({"name": name})).collect::<Vec<_>>(),
                "minLikelihood": "POSSIBLE",
                "includeQuote": true,
                "excludeInfoTypes": true,
            },
            "storageConfig": {
                "cloudStorageOptions": {
                    "fileSet": {"url": gcs_uri},
                    "bytesLimitPerFile": 200,
                    "filesLimitPercent": 90,
                    "fileTypes": ["TEXT_FILE"],
                    "sampleMethod": "RANDOM_START",
                },
            },
            "actions": [{"pubSub": {"topic": format!("projects/{project_id}/topics/{topic_id}")}}],
        },
    });
    let job = start_and_wait(client, subscription, project_id, &request, &options).await?;
    println!("Job {} status: {}", job.name, job.state);
    print_findings(&job);
    Ok(job)
}
// ANCHOR_END: inspect-gcs-file-with-sampling

/// The BigQuery table analyzed by [numerical_risk_analysis].
#[derive(Clone, Debug)]
pub struct SourceTable<'a> {
    pub project_id: &'a str,
    pub dataset_id: &'a str,
    pub table_id: &'a str,
}

// ANCHOR: numerical-risk-analysis
/// Computes numerical statistics for a column, waiting for a Pub/Sub
/// notification when the job completes.
pub async fn numerical_risk_analysis<S>(
    client: &Client,
    subscription: &mut S,
    project_id: &str,
    table: SourceTable<'_>,
    column_name: &str,
    topic_id: &str,
    options: PollingOptions,
) -> crate::Result<DlpJob>
where
    S: Subscription,
{
    let request = json!({
        "riskJob": {
            "privacyMetric": {
                "numericalStatsConfig": {"field": {"name": column_name}},
            },
            "sourceTable": {
                "projectId": table.project_id,
                "datasetId": table.dataset_id,
                "tableId": table.table_id,
            },
            "actions": [{"pubSub": {"topic": format!("projects/{project_id}/topics/{topic_id}")}}],
        },
    });
    let job = start_and_wait(client, subscription, project_id, &request, &options).await?;
    let Some(result) = job
        .risk_details
        .as_ref()
        .and_then(|d| d.numerical_stats_result.as_ref())
    else {
        return Err(anyhow::Error::msg(format!(
            "the job {} has no numerical statistics, job={job:?}",
            job.name
        )));
    };
    for line in numerical_stats_lines(result) {
        println!("{line}");
    }
    Ok(job)
}
// ANCHOR_END: numerical-risk-analysis

async fn start_and_wait<S>(
    client: &Client,
    subscription: &mut S,
    project_id: &str,
    request: &serde_json::Value,
    options: &PollingOptions,
) -> crate::Result<DlpJob>
where
    S: Subscription,
{
    let parent = format!("projects/{project_id}/locations/global");
    let job: DlpJob = client
        .create(&format!("/v2/{parent}/dlpJobs"), request)
        .await?;
    tracing::info!(job = %job.name, "created DLP job");
    wait_for_notification(subscription, JOB_NAME_ATTRIBUTE, &job.name, options).await?;
    let job = client.get(&format!("/v2/{}", job.name)).await?;
    Ok(job)
}

fn print_findings(job: &DlpJob) {
    let stats = job
        .inspect_details
        .as_ref()
        .map(|d| d.result.info_type_stats.as_slice())
        .unwrap_or_default();
    for line in findings_lines(stats) {
        println!("{line}");
    }
}

/// Formats the findings in an inspection job.
pub fn findings_lines(stats: &[InfoTypeStats]) -> Vec<String> {
    if stats.is_empty() {
        return vec!["No findings.".to_string()];
    }
    stats
        .iter()
        .map(|s| {
            format!(
                "  Found {} instance(s) of infoType {}.",
                s.count, s.info_type.name
            )
        })
        .collect()
}

/// Formats the result of a numerical risk analysis job.
///
/// Consecutive quantiles with the same value are printed once.
pub fn numerical_stats_lines(result: &NumericalStatsResult) -> Vec<String> {
    let mut lines = vec![format!(
        "Value Range: [{}, {}]",
        result.min_value, result.max_value
    )];
    let mut previous: Option<&Value> = None;
    for (percent, value) in result.quantile_values.iter().enumerate() {
        if previous == Some(value) {
            continue;
        }
        lines.push(format!("Value at {percent}% quantile: {value}"));
        previous = Some(value);
    }
    lines
}
