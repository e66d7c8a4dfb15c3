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

//! Configure the behavior of polling loops.
//!
//! # Example
//! ```
//! # use cloud_snippets_lro::options::PollingOptions;
//! # use cloud_snippets_lro::polling_backoff_policy::FixedInterval;
//! # use cloud_snippets_lro::polling_error_policy::{Aip194Strict, PollingErrorPolicyExt};
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! let token = CancellationToken::new();
//! let options = PollingOptions::new()
//!     .with_polling_error_policy(Aip194Strict.with_attempt_limit(30))
//!     .with_polling_backoff_policy(FixedInterval::new(Duration::from_secs(30)))
//!     .with_deadline(Duration::from_secs(20 * 60))
//!     .with_cancellation_token(token.clone());
//! ```

use crate::exponential_backoff::ExponentialBackoff;
use crate::polling_backoff_policy::{PollingBackoffPolicy, PollingBackoffPolicyArg};
use crate::polling_error_policy::{Aip194Strict, PollingErrorPolicy, PollingErrorPolicyArg};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// The configuration for a polling loop.
///
/// By default, the polling loop uses the [Aip194Strict] error policy, which
/// never gives up on operations that remain in progress, and the default
/// [ExponentialBackoff]. There is no deadline and no cancellation token.
#[derive(Clone, Debug)]
pub struct PollingOptions {
    pub(crate) error_policy: Arc<dyn PollingErrorPolicy>,
    pub(crate) backoff_policy: Arc<dyn PollingBackoffPolicy>,
    pub(crate) deadline: Option<Duration>,
    pub(crate) cancellation: Option<CancellationToken>,
}

impl PollingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the polling error policy.
    ///
    /// The policy determines which errors are recoverable, and limits the
    /// number of attempts and the time spent in the loop.
    pub fn with_polling_error_policy<V: Into<PollingErrorPolicyArg>>(mut self, v: V) -> Self {
        self.error_policy = v.into().0;
        self
    }

    /// Sets the polling backoff policy.
    pub fn with_polling_backoff_policy<V: Into<PollingBackoffPolicyArg>>(mut self, v: V) -> Self {
        self.backoff_policy = v.into().0;
        self
    }

    /// Bounds the total time waiting for the operation.
    ///
    /// The deadline starts when the application awaits
    /// [until_done][crate::Poller::until_done]. The polling loop stops with a
    /// [timeout][crate::Error::is_timeout] error when the deadline expires,
    /// even if a status query is in flight.
    pub fn with_deadline<V: Into<Duration>>(mut self, v: V) -> Self {
        self.deadline = Some(v.into());
        self
    }

    /// Stops the polling loop when `token` is cancelled.
    ///
    /// The polling loop completes with a
    /// [cancelled][crate::Error::is_cancelled] error. Cancelling the loop does
    /// not cancel the operation in the service.
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    pub fn cancellation_token(&self) -> Option<&CancellationToken> {
        self.cancellation.as_ref()
    }
}

impl Default for PollingOptions {
    fn default() -> Self {
        Self {
            error_policy: Arc::new(Aip194Strict),
            backoff_policy: Arc::new(ExponentialBackoff::default()),
            deadline: None,
            cancellation: None,
        }
    }
}
