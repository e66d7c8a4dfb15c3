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

//! Create Cloud TPU queued resources.
//!
//! Creating a queued resource returns a `google.longrunning.Operation`. That
//! operation completes once the request is accepted, but the TPU nodes are
//! only usable once the queued resource itself becomes `ACTIVE`.

use crate::client::Client;
use crate::model::{Operation, operation_classifier};
use lro::{Poller, PollingOptions, TerminalStates};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// The Cloud TPU endpoint.
pub const ENDPOINT: &str = "https://tpu.googleapis.com";

/// A queued resource.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct QueuedResource {
    pub name: String,
    pub state: QueuedResourceState,
    pub tpu: Option<serde_json::Value>,
}

impl lro::Operation for QueuedResource {
    fn name(&self) -> Option<&str> {
        Some(self.name.as_str()).filter(|n| !n.is_empty())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct QueuedResourceState {
    pub state: String,
    pub state_initiator: String,
    /// Set when the state is `FAILED`, usually `{"error": {...}}`.
    pub failed_data: Option<serde_json::Value>,
}

/// Polls every 30 seconds, for up to an hour.
pub fn default_options() -> PollingOptions {
    use lro::polling_backoff_policy::FixedInterval;
    use lro::polling_error_policy::{Aip194Strict, PollingErrorPolicyExt};
    use std::time::Duration;

    PollingOptions::new()
        .with_polling_error_policy(Aip194Strict.with_time_limit(Duration::from_secs(60 * 60)))
        .with_polling_backoff_policy(FixedInterval::new(Duration::from_secs(30)))
}

/// The terminal states of a queued resource.
pub fn terminal_states() -> TerminalStates {
    TerminalStates::new()
        .set_succeeded(["ACTIVE"])
        .set_failed(["FAILED", "SUSPENDED"])
}

/// Classifies queued resources, keeping the failure data in the error.
pub fn classifier() -> impl lro::Classifier<QueuedResource> {
    terminal_states().by_state_with_details(
        |r: &QueuedResource| r.state.state.clone(),
        |r: &QueuedResource| r.state.failed_data.clone(),
    )
}

/// The TPU node created in [create_queued_resource].
#[derive(Clone, Debug)]
pub struct NodeConfig<'a> {
    pub node_id: &'a str,
    pub accelerator_type: &'a str,
    pub runtime_version: &'a str,
    pub network: &'a str,
}

// ANCHOR: create-queued-resource
/// Creates a queued resource with a single node, and waits until it is
/// active.
pub async fn create_queued_resource(
    client: &Client,
    project_id: &str,
    zone: &str,
    queued_resource_id: &str,
    node: NodeConfig<'_>,
    options: PollingOptions,
) -> crate::Result<QueuedResource> {
    let parent = format!("projects/{project_id}/locations/{zone}");
    let name = format!("{parent}/queuedResources/{queued_resource_id}");
    let path = format!("/v2/{parent}/queuedResources?queuedResourceId={queued_resource_id}");
    let region = zone.rsplit_once('-').map(|(r, _)| r).unwrap_or(zone);
    let request = json!({
        "tpu": {
            "nodeSpec": [{
                "parent": parent,
                "nodeId": node.node_id,
                "node": {
                    "acceleratorType": node.accelerator_type,
                    "runtimeVersion": node.runtime_version,
                    "networkConfig": {
                        "enableExternalIps": true,
                        "network": format!("projects/{project_id}/global/networks/{}", node.network),
                        "subnetwork": format!("projects/{project_id}/regions/{region}/subnetworks/{}", node.network),
                    },
                },
            }],
        },
    });

    // ANCHOR: create-queued-resource-operation
    let operation = lro::new_poller(
        options.clone(),
        || client.create::<_, Operation>(&path, &request),
        |name| async move { client.get::<Operation>(&format!("/v2/{name}")).await },
        operation_classifier(),
    )
    .until_done()
    .await?;
    tracing::info!(operation = %operation.name, "queued resource request accepted");
    // ANCHOR_END: create-queued-resource-operation

    // ANCHOR: create-queued-resource-wait
    let resource = lro::resume_poller(
        options,
        name,
        |name| async move { client.get::<QueuedResource>(&format!("/v2/{name}")).await },
        classifier(),
    )
    .until_done()
    .await?;
    // ANCHOR_END: create-queued-resource-wait

    println!("{}", serde_json::to_string(&resource)?);
    println!("Queued resource {queued_resource_id} created.");
    Ok(resource)
}
// ANCHOR_END: create-queued-resource
