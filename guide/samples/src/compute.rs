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

//! Wait for Compute Engine zone operations.
//!
//! Compute Engine does not use `google.longrunning.Operation`. Its operations
//! have a `status` field, and report errors in an `error` field once the
//! status is `DONE`.

use crate::client::Client;
use lro::error::rpc::{Code, Status};
use lro::{Disposition, Poller, PollingOptions};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// The Compute Engine endpoint.
pub const ENDPOINT: &str = "https://compute.googleapis.com";

/// A Compute Engine operation.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct Operation {
    pub name: String,
    pub operation_type: String,
    pub target_link: String,
    pub status: String,
    pub progress: i32,
    pub error: Option<OperationError>,
    pub http_error_status_code: Option<u16>,
    pub http_error_message: Option<String>,
}

impl lro::Operation for Operation {
    fn name(&self) -> Option<&str> {
        Some(self.name.as_str()).filter(|n| !n.is_empty())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
#[non_exhaustive]
pub struct OperationError {
    pub errors: Vec<ErrorItem>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
#[non_exhaustive]
pub struct ErrorItem {
    pub code: String,
    pub location: String,
    pub message: String,
}

/// The `wait` method blocks for up to 2 minutes, so the loop does not sleep
/// long between calls. Give up after 10 minutes.
pub fn default_options() -> PollingOptions {
    use lro::polling_backoff_policy::FixedInterval;
    use std::time::Duration;

    PollingOptions::new()
        .with_polling_backoff_policy(FixedInterval::new(Duration::from_secs(1)))
        .with_deadline(Duration::from_secs(10 * 60))
}

/// Classifies Compute Engine operations.
pub fn classifier() -> impl lro::Classifier<Operation> {
    |op: &Operation| match (op.status.as_str(), &op.error) {
        ("DONE", None) => Disposition::Succeeded,
        ("DONE", Some(e)) if e.errors.is_empty() => Disposition::Succeeded,
        ("DONE", Some(e)) => Disposition::Failed(failure(op, e)),
        _ => Disposition::InProgress,
    }
}

fn failure(op: &Operation, error: &OperationError) -> Status {
    let code = op
        .http_error_status_code
        .map(Code::from_http_status)
        .unwrap_or(Code::Unknown);
    let message = op.http_error_message.clone().unwrap_or_else(|| {
        error
            .errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    });
    Status::default()
        .set_code(code)
        .set_message(message)
        .set_details(error.errors.iter().filter_map(|e| serde_json::to_value(e).ok()))
}

// ANCHOR: create-instance
/// Creates a VM and waits until the operation completes.
pub async fn create_instance(
    client: &Client,
    project_id: &str,
    zone: &str,
    name: &str,
    options: PollingOptions,
) -> crate::Result<Operation> {
    let prefix = format!("/compute/v1/projects/{project_id}/zones/{zone}");
    let insert = format!("{prefix}/instances");
    let instance = json!({
        "name": name,
        "machineType": format!("zones/{zone}/machineTypes/f1-micro"),
        "description": "A test VM created by the Rust snippets.",
        "labels": {"source": "compute_instances_create"},
        "disks": [{
            "boot": true,
            "autoDelete": true,
            "initializeParams": {
                "sourceImage": "projects/cos-cloud/global/images/family/cos-stable",
            },
        }],
        "networkInterfaces": [{"network": "global/networks/default"}],
    });

    // Operation names are only unique within a zone, the query must include
    // the project and zone.
    let operation = lro::new_poller(
        options,
        || client.create::<_, Operation>(&insert, &instance),
        |name| {
            let prefix = &prefix;
            async move {
                client
                    .create::<_, Operation>(
                        &format!("{prefix}/operations/{name}/wait"),
                        &json!({}),
                    )
                    .await
            }
        },
        classifier(),
    )
    .until_done()
    .await;

    match operation {
        Ok(op) => {
            println!("Instance creation finished: {}", op.target_link);
            Ok(op)
        }
        Err(e) => {
            println!("Instance creation failed: {e}");
            Err(e.into())
        }
    }
}
// ANCHOR_END: create-instance

#[cfg(test)]
mod tests {
    use super::*;
    use lro::Classifier;
    use test_case::test_case;

    #[test_case("PENDING", Disposition::InProgress)]
    #[test_case("RUNNING", Disposition::InProgress)]
    #[test_case("DONE", Disposition::Succeeded)]
    fn classify(status: &str, want: Disposition) {
        let op = Operation {
            name: "operation-123".into(),
            status: status.into(),
            ..Operation::default()
        };
        assert_eq!(classifier().classify(&op), want);
    }

    #[test]
    fn classify_error() -> anyhow::Result<()> {
        let op = serde_json::from_value::<Operation>(json!({
            "name": "operation-123",
            "status": "DONE",
            "progress": 100,
            "httpErrorStatusCode": 404,
            "httpErrorMessage": "NOT FOUND",
            "error": {"errors": [{
                "code": "RESOURCE_NOT_FOUND",
                "message": "The resource 'projects/p/global/images/missing' was not found",
            }]},
        }))?;
        let got = classifier().classify(&op);
        let Disposition::Failed(status) = got else {
            panic!("expected a failure, got={got:?}");
        };
        assert_eq!(status.code, Code::NotFound);
        assert_eq!(status.message, "NOT FOUND");
        assert_eq!(
            status.details,
            vec![json!({
                "code": "RESOURCE_NOT_FOUND",
                "location": "",
                "message": "The resource 'projects/p/global/images/missing' was not found",
            })]
        );
        Ok(())
    }

    #[test]
    fn classify_error_without_http_details() {
        let op = Operation {
            name: "operation-123".into(),
            status: "DONE".into(),
            error: Some(OperationError {
                errors: vec![
                    ErrorItem {
                        code: "QUOTA_EXCEEDED".into(),
                        message: "quota exceeded".into(),
                        ..ErrorItem::default()
                    },
                    ErrorItem {
                        code: "ZONE_RESOURCE_POOL_EXHAUSTED".into(),
                        message: "zone exhausted".into(),
                        ..ErrorItem::default()
                    },
                ],
            }),
            ..Operation::default()
        };
        let got = classifier().classify(&op);
        assert!(
            matches!(&got, Disposition::Failed(s) if s.code == Code::Unknown && s.message == "quota exceeded; zone exhausted"),
            "{got:?}"
        );
    }

    #[test]
    fn classify_empty_error() {
        let op = Operation {
            name: "operation-123".into(),
            status: "DONE".into(),
            error: Some(OperationError::default()),
            ..Operation::default()
        };
        assert_eq!(classifier().classify(&op), Disposition::Succeeded);
    }
}
