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

//! Wait for Container Analysis to finish scanning an image.
//!
//! There is no operation to poll here. The application first searches for the
//! discovery occurrence attached to the image, which may not exist yet, and
//! then polls that occurrence until the analysis finishes.

use crate::client::Client;
use lro::{Disposition, Poller, PollingOptions};
use serde::{Deserialize, Serialize};

/// The Container Analysis endpoint.
pub const ENDPOINT: &str = "https://containeranalysis.googleapis.com";

/// A Grafeas occurrence.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct Occurrence {
    pub name: String,
    pub kind: String,
    pub resource_uri: String,
    pub discovery: Option<Discovery>,
}

impl lro::Operation for Occurrence {
    fn name(&self) -> Option<&str> {
        Some(self.name.as_str()).filter(|n| !n.is_empty())
    }
}

impl Occurrence {
    /// The analysis status, if this is a discovery occurrence.
    pub fn analysis_status(&self) -> &str {
        self.discovery
            .as_ref()
            .map(|d| d.analysis_status.as_str())
            .unwrap_or_default()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct Discovery {
    pub analysis_status: String,
    pub analysis_status_error: Option<crate::model::RpcStatus>,
}

/// The results of a discovery occurrence search.
///
/// The search is repeated until it finds an occurrence. The "name" used to
/// repeat the search is the parent project.
#[derive(Clone, Debug, Default)]
struct Search {
    parent: String,
    occurrences: Vec<Occurrence>,
}

impl lro::Operation for Search {
    fn name(&self) -> Option<&str> {
        Some(&self.parent)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ListOccurrencesResponse {
    occurrences: Vec<Occurrence>,
}

/// Tries up to `retries + 1` times, doubling the delay after each attempt,
/// starting at 1 second.
pub fn default_options(retries: u32) -> PollingOptions {
    use lro::exponential_backoff::ExponentialBackoffBuilder;
    use lro::polling_error_policy::{Aip194Strict, PollingErrorPolicyExt};
    use std::time::Duration;

    let backoff = ExponentialBackoffBuilder::new()
        .with_initial_delay(Duration::from_secs(1))
        .with_maximum_delay(Duration::from_secs(60))
        .with_scaling(2.0)
        .clamp();
    PollingOptions::new()
        .with_polling_error_policy(Aip194Strict.with_attempt_limit(retries.saturating_add(1)))
        .with_polling_backoff_policy(backoff)
}

/// Classifies discovery occurrences.
///
/// All the `FINISHED_*` states are terminal, and the occurrence is returned to
/// the caller even if the analysis failed or the image is not supported.
pub fn classifier() -> impl lro::Classifier<Occurrence> {
    |occurrence: &Occurrence| match occurrence.analysis_status() {
        "FINISHED_SUCCESS" | "FINISHED_FAILED" | "FINISHED_UNSUPPORTED" => Disposition::Succeeded,
        _ => Disposition::InProgress,
    }
}

/// Returns the filter used to find the discovery occurrence for an image.
pub fn discovery_filter(image_url: &str) -> String {
    format!("kind = \"DISCOVERY\" AND resourceUrl = \"{image_url}\"")
}

// ANCHOR: poll-discovery-occurrence-finished
/// Waits until the discovery occurrence for `image_url` reaches a terminal
/// state.
pub async fn poll_discovery_occurrence_finished(
    client: &Client,
    project_id: &str,
    image_url: &str,
    options: PollingOptions,
) -> crate::Result<Occurrence> {
    let filter = discovery_filter(image_url);

    // ANCHOR: find-occurrence
    let search = lro::resume_poller(
        options.clone(),
        format!("projects/{project_id}"),
        |parent| {
            let filter = &filter;
            async move {
                let response: ListOccurrencesResponse = client
                    .list(
                        &format!("/v1/{parent}/occurrences"),
                        &[("filter", filter.as_str())],
                    )
                    .await?;
                Ok::<_, lro::Error>(Search {
                    parent,
                    occurrences: response.occurrences,
                })
            }
        },
        |search: &Search| {
            if search.occurrences.is_empty() {
                Disposition::InProgress
            } else {
                Disposition::Succeeded
            }
        },
    )
    .until_done()
    .await?;
    let Some(discovery) = search.occurrences.into_iter().next() else {
        return Err(anyhow::Error::msg(format!(
            "no occurrences found for {image_url}"
        )));
    };
    // ANCHOR_END: find-occurrence

    // ANCHOR: wait-occurrence
    let finished = lro::resume_poller(
        options,
        discovery.name,
        |name| async move { client.get::<Occurrence>(&format!("/v1/{name}")).await },
        classifier(),
    )
    .until_done()
    .await?;
    // ANCHOR_END: wait-occurrence

    println!(
        "Found discovery occurrence {}.  Status: {}",
        finished.name,
        finished.analysis_status()
    );
    Ok(finished)
}
// ANCHOR_END: poll-discovery-occurrence-finished
