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

//! Receive job notifications from a Pub/Sub subscription.

use crate::client::Client;
use lro::Error;
use lro::notification::{Message, Subscription};
use serde::Deserialize;
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

/// The Pub/Sub endpoint.
pub const ENDPOINT: &str = "https://pubsub.googleapis.com";

/// A [Subscription] using the Pub/Sub REST API.
///
/// Each `receive()` call returns a buffered message, or pulls a new batch
/// from the service. Empty pulls are retried after a short interval.
///
/// # Example
/// ```no_run
/// # use cloud_snippets_samples::client::Client;
/// # use cloud_snippets_samples::pubsub::{ENDPOINT, PullSubscription};
/// # async fn sample() -> anyhow::Result<()> {
/// let client = Client::builder().with_endpoint(ENDPOINT).build()?;
/// let subscription = PullSubscription::new(client, "projects/my-project/subscriptions/dlp-jobs");
/// # Ok(()) }
/// ```
#[derive(Debug)]
pub struct PullSubscription {
    client: Client,
    name: String,
    max_messages: i32,
    pull_interval: Duration,
    buffer: VecDeque<Message>,
    // Maps message ids to the ack ids needed to (n)ack them.
    ack_ids: HashMap<String, String>,
}

impl PullSubscription {
    /// Creates a subscription for `name`, in
    /// `projects/{project}/subscriptions/{subscription}` format.
    pub fn new<V: Into<String>>(client: Client, name: V) -> Self {
        Self {
            client,
            name: name.into(),
            max_messages: 10,
            pull_interval: Duration::from_secs(1),
            buffer: VecDeque::new(),
            ack_ids: HashMap::new(),
        }
    }

    /// The maximum number of messages requested in each pull.
    pub fn with_max_messages(mut self, v: i32) -> Self {
        self.max_messages = v;
        self
    }

    /// The time to wait after a pull returns no messages.
    pub fn with_pull_interval<V: Into<Duration>>(mut self, v: V) -> Self {
        self.pull_interval = v.into();
        self
    }

    async fn pull(&mut self) -> lro::Result<()> {
        let response: PullResponse = self
            .client
            .create(
                &format!("/v1/{}:pull", self.name),
                &json!({"maxMessages": self.max_messages}),
            )
            .await?;
        tracing::debug!(
            subscription = %self.name,
            count = response.received_messages.len(),
            "pulled messages"
        );
        for received in response.received_messages {
            let message = received.message;
            self.ack_ids.insert(message.message_id.clone(), received.ack_id);
            self.buffer.push_back(
                Message::new()
                    .set_id(message.message_id)
                    .set_attributes(message.attributes)
                    .set_data(message.data),
            );
        }
        Ok(())
    }

    fn ack_id(&mut self, message: &Message) -> lro::Result<String> {
        self.ack_ids.remove(&message.id).ok_or_else(|| {
            Error::other(format!(
                "message {} was not received from {}",
                message.id, self.name
            ))
        })
    }
}

impl Subscription for PullSubscription {
    async fn receive(&mut self) -> lro::Result<Option<Message>> {
        loop {
            if let Some(message) = self.buffer.pop_front() {
                return Ok(Some(message));
            }
            self.pull().await?;
            if self.buffer.is_empty() {
                tokio::time::sleep(self.pull_interval).await;
            }
        }
    }

    async fn ack(&mut self, message: &Message) -> lro::Result<()> {
        let ack_id = self.ack_id(message)?;
        let _: serde_json::Value = self
            .client
            .create(
                &format!("/v1/{}:acknowledge", self.name),
                &json!({"ackIds": [ack_id]}),
            )
            .await?;
        Ok(())
    }

    async fn nack(&mut self, message: &Message) -> lro::Result<()> {
        let ack_id = self.ack_id(message)?;
        // A zero deadline makes the message available for redelivery.
        let _: serde_json::Value = self
            .client
            .create(
                &format!("/v1/{}:modifyAckDeadline", self.name),
                &json!({"ackIds": [ack_id], "ackDeadlineSeconds": 0}),
            )
            .await?;
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PullResponse {
    received_messages: Vec<ReceivedMessage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ReceivedMessage {
    ack_id: String,
    message: PubsubMessage,
}

#[serde_with::serde_as]
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PubsubMessage {
    #[serde_as(as = "serde_with::base64::Base64")]
    data: Vec<u8>,
    attributes: HashMap<String, String>,
    message_id: String,
}
