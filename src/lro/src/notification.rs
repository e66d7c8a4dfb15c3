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

//! Wait for completion notifications instead of polling.
//!
//! Some services publish a message when a job completes. For example, DLP
//! risk analysis jobs can publish to a Pub/Sub topic, setting the `DlpJobName`
//! attribute to the name of the job. Applications waiting for such jobs
//! receive messages from a subscription until one matches the job, and then
//! fetch the job status once.
//!
//! # Example
//! ```
//! # use cloud_snippets_lro::notification::*;
//! # use cloud_snippets_lro::PollingOptions;
//! # tokio_test::block_on(async {
//! let (publisher, mut subscription) = channel();
//! publisher.publish(Message::new().set_id("m1").set_attributes([("DlpJobName", "other-job")]))?;
//! publisher.publish(Message::new().set_id("m2").set_attributes([("DlpJobName", "my-job")]))?;
//! let message = wait_for_notification(
//!     &mut subscription, "DlpJobName", "my-job", &PollingOptions::new()).await?;
//! assert_eq!(message.id, "m2");
//! assert_eq!(subscription.acked(), ["m2"]);
//! assert_eq!(subscription.nacked(), ["m1"]);
//! # Ok::<(), cloud_snippets_lro::Error>(()) });
//! ```

use crate::options::PollingOptions;
use crate::{Error, Result};
use bytes::Bytes;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::Instrument;

/// A notification message.
#[derive(Clone, Debug, Default, PartialEq)]
#[non_exhaustive]
pub struct Message {
    /// The id assigned to the message by the messaging service.
    pub id: String,
    /// The message attributes.
    pub attributes: HashMap<String, String>,
    /// The message payload.
    pub data: Bytes,
}

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the value of [id][Message::id].
    pub fn set_id<T: Into<String>>(mut self, v: T) -> Self {
        self.id = v.into();
        self
    }

    /// Sets the value of [attributes][Message::attributes].
    pub fn set_attributes<T, K, V>(mut self, v: T) -> Self
    where
        T: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.attributes = v.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self
    }

    /// Sets the value of [data][Message::data].
    pub fn set_data<T: Into<Bytes>>(mut self, v: T) -> Self {
        self.data = v.into();
        self
    }

    /// Returns the value of the `name` attribute, if present.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// A source of notification messages.
///
/// Implementations receive messages one at a time. Each message must be
/// acknowledged, or negatively acknowledged so the messaging service can
/// deliver it to other subscribers.
pub trait Subscription: Send {
    /// Receives the next message.
    ///
    /// Returns `None` if the subscription is closed and no more messages will
    /// arrive.
    fn receive(&mut self) -> impl Future<Output = Result<Option<Message>>> + Send;

    /// Acknowledges a message.
    fn ack(&mut self, message: &Message) -> impl Future<Output = Result<()>> + Send;

    /// Negatively acknowledges a message.
    fn nack(&mut self, message: &Message) -> impl Future<Output = Result<()>> + Send;
}

/// Waits for a message whose `attribute` is equal to `value`.
///
/// The matching message is acknowledged and returned. Any other message is
/// negatively acknowledged. Errors receiving or acknowledging messages stop
/// the loop.
///
/// The deadline and cancellation token in `options` bound the wait. The
/// polling policies are not used.
pub async fn wait_for_notification<S>(
    subscription: &mut S,
    attribute: &str,
    value: &str,
    options: &PollingOptions,
) -> Result<Message>
where
    S: Subscription,
{
    let span = tracing::info_span!("lro::wait_for_notification", attribute, value);
    let wait = async move {
        while let Some(message) = subscription.receive().await? {
            if message.attribute(attribute) == Some(value) {
                subscription.ack(&message).await?;
                tracing::debug!(id = %message.id, "received matching notification");
                return Ok(message);
            }
            tracing::debug!(id = %message.id, "ignoring notification");
            subscription.nack(&message).await?;
        }
        Err(Error::other(format!(
            "the subscription closed before receiving a message with {attribute}={value}"
        )))
    };
    crate::poller::with_limits(
        wait,
        options.deadline(),
        options.cancellation_token().cloned(),
    )
    .instrument(span)
    .await
}

/// Creates an in-memory subscription and its publisher.
///
/// Use this in tests, or to connect components of the same application.
pub fn channel() -> (Publisher, ChannelSubscription) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        Publisher { tx },
        ChannelSubscription {
            rx,
            acked: Vec::new(),
            nacked: Vec::new(),
        },
    )
}

/// Publishes messages to a [ChannelSubscription].
#[derive(Clone, Debug)]
pub struct Publisher {
    tx: mpsc::UnboundedSender<Message>,
}

impl Publisher {
    /// Publishes a message.
    ///
    /// Fails if the subscription was dropped.
    pub fn publish(&self, message: Message) -> Result<()> {
        self.tx
            .send(message)
            .map_err(|e| Error::other(format!("cannot publish message {}", e.0.id)))
    }
}

/// An in-memory [Subscription].
///
/// The subscription closes once all publishers are dropped. Negatively
/// acknowledged messages are not redelivered.
#[derive(Debug)]
pub struct ChannelSubscription {
    rx: mpsc::UnboundedReceiver<Message>,
    acked: Vec<String>,
    nacked: Vec<String>,
}

impl ChannelSubscription {
    /// The ids of the acknowledged messages, in order.
    pub fn acked(&self) -> &[String] {
        &self.acked
    }

    /// The ids of the negatively acknowledged messages, in order.
    pub fn nacked(&self) -> &[String] {
        &self.nacked
    }
}

impl Subscription for ChannelSubscription {
    async fn receive(&mut self) -> Result<Option<Message>> {
        Ok(self.rx.recv().await)
    }

    async fn ack(&mut self, message: &Message) -> Result<()> {
        self.acked.push(message.id.clone());
        Ok(())
    }

    async fn nack(&mut self, message: &Message) -> Result<()> {
        self.nacked.push(message.id.clone());
        Ok(())
    }
}
