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

//! Defines the trait for polling backoff policies and common implementations.
//!
//! Pollers wait between status queries to avoid overloading the service.
//! Polling backoff policies do not use jitter: there is only one poller per
//! operation.
//!
//! Two implementations are provided:
//! * [FixedInterval] waits the same period between every attempt. Most
//!   snippets sleep a fixed 30 seconds between status queries.
//! * [ExponentialBackoff][crate::exponential_backoff::ExponentialBackoff]
//!   grows the period until some limit is reached. This works well when the
//!   expected execution time is not known in advance.
//!
//! # Example
//! ```
//! # use cloud_snippets_lro::polling_backoff_policy::*;
//! # use cloud_snippets_lro::PollingState;
//! use std::time::Duration;
//! let policy = FixedInterval::new(Duration::from_secs(30));
//! assert_eq!(policy.wait_period(&PollingState::default()), Duration::from_secs(30));
//! ```

use crate::polling_state::PollingState;
use std::sync::Arc;
use std::time::Duration;

/// Defines the trait implemented by all polling backoff strategies.
pub trait PollingBackoffPolicy: Send + Sync + std::fmt::Debug {
    /// Returns the delay before the next status query.
    ///
    /// # Parameters
    /// * `state` - the state of the polling loop. This method is called after
    ///   the operation starts, and after each status query.
    fn wait_period(&self, state: &PollingState) -> Duration;
}

/// A helper type to use [PollingBackoffPolicy] in [PollingOptions].
///
/// [PollingOptions]: crate::options::PollingOptions
#[derive(Clone, Debug)]
pub struct PollingBackoffPolicyArg(pub(crate) Arc<dyn PollingBackoffPolicy>);

impl<T: PollingBackoffPolicy + 'static> std::convert::From<T> for PollingBackoffPolicyArg {
    fn from(value: T) -> Self {
        Self(Arc::new(value))
    }
}

impl std::convert::From<Arc<dyn PollingBackoffPolicy>> for PollingBackoffPolicyArg {
    fn from(value: Arc<dyn PollingBackoffPolicy>) -> Self {
        Self(value)
    }
}

/// Waits the same period between all status queries.
#[derive(Clone, Debug)]
pub struct FixedInterval {
    interval: Duration,
}

impl FixedInterval {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl PollingBackoffPolicy for FixedInterval {
    fn wait_period(&self, _state: &PollingState) -> Duration {
        self.interval
    }
}
