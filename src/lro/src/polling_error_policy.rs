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

//! Policies to handle errors and to bound the polling loop.
//!
//! After each status query the poller consults a [PollingErrorPolicy]. If the
//! query failed, the policy decides whether the error is worth retrying. If
//! the operation is still in progress, the policy may stop the loop because
//! some limit was reached.
//!
//! # Example
//! ```
//! # use cloud_snippets_lro::polling_error_policy::*;
//! use std::time::Duration;
//! // Stop after 15 minutes, or after 30 attempts, whichever comes first.
//! let policy = Aip194Strict
//!     .with_time_limit(Duration::from_secs(15 * 60))
//!     .with_attempt_limit(30);
//! ```

use crate::Error;
use crate::error::rpc::Code;
use crate::loop_state::LoopState;
use crate::polling_state::PollingState;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Decides how the polling loop reacts to errors and in-progress operations.
pub trait PollingErrorPolicy: Send + Sync + std::fmt::Debug {
    /// Classifies an error returned by the status query.
    ///
    /// `state.attempt_count` includes the attempt that failed.
    fn on_error(&self, state: &PollingState, error: Error) -> LoopState;

    /// Called after a successful query that found the operation in progress.
    ///
    /// Returning `Some(e)` stops the loop with `e`. The default never stops.
    fn on_in_progress(&self, _state: &PollingState, _operation_name: &str) -> Option<Error> {
        None
    }
}

/// Anything that can be used as a [PollingErrorPolicy] in [PollingOptions].
///
/// [PollingOptions]: crate::options::PollingOptions
#[derive(Clone, Debug)]
pub struct PollingErrorPolicyArg(pub(crate) Arc<dyn PollingErrorPolicy>);

impl<T: PollingErrorPolicy + 'static> From<T> for PollingErrorPolicyArg {
    fn from(value: T) -> Self {
        Self(Arc::new(value))
    }
}

impl From<Arc<dyn PollingErrorPolicy>> for PollingErrorPolicyArg {
    fn from(value: Arc<dyn PollingErrorPolicy>) -> Self {
        Self(value)
    }
}

/// Adds limits to any [PollingErrorPolicy].
pub trait PollingErrorPolicyExt: PollingErrorPolicy + Sized {
    /// Stops the loop once `maximum_duration` has elapsed since it started.
    ///
    /// The elapsed time starts with the first poll and includes the backoff
    /// periods. It is only checked after a query returns, so a slow query can
    /// overrun the limit. Past the limit,
    /// recoverable errors become [Exhausted][LoopState::Exhausted] and
    /// in-progress operations stop the loop.
    fn with_time_limit(self, maximum_duration: Duration) -> LimitedElapsedTime<Self> {
        LimitedElapsedTime::custom(self, maximum_duration)
    }

    /// Stops the loop after `maximum_attempts` status queries.
    ///
    /// # Example
    /// ```
    /// # use cloud_snippets_lro::polling_error_policy::*;
    /// # use cloud_snippets_lro::{Error, PollingState};
    /// let policy = Aip194Strict.with_attempt_limit(3);
    /// let state = PollingState::default().set_attempt_count(2_u32);
    /// assert!(policy.on_error(&state, Error::transport("reset")).is_continue());
    /// let state = PollingState::default().set_attempt_count(3_u32);
    /// assert!(policy.on_error(&state, Error::transport("reset")).is_exhausted());
    /// ```
    fn with_attempt_limit(self, maximum_attempts: u32) -> LimitedAttemptCount<Self> {
        LimitedAttemptCount::custom(self, maximum_attempts)
    }
}

impl<T: PollingErrorPolicy> PollingErrorPolicyExt for T {}

/// Retries the errors that [AIP-194] considers transient.
///
/// Only transport errors and service errors with code `UNAVAILABLE` are
/// retried. A failed operation is never retried, whatever its code. There
/// are no limits, combine it with [PollingErrorPolicyExt] to add them.
///
/// [AIP-194]: https://google.aip.dev/194
#[derive(Clone, Debug)]
pub struct Aip194Strict;

impl PollingErrorPolicy for Aip194Strict {
    fn on_error(&self, _state: &PollingState, error: Error) -> LoopState {
        let transient = error.is_transport()
            || (!error.is_operation_failure()
                && error.status().is_some_and(|s| s.code == Code::Unavailable));
        if transient {
            LoopState::Continue(error)
        } else {
            LoopState::Permanent(error)
        }
    }
}

/// Retries every error.
///
/// Use with an attempt or time limit, or a persistent error keeps the loop
/// running forever.
#[derive(Clone, Debug)]
pub struct AlwaysContinue;

impl PollingErrorPolicy for AlwaysContinue {
    fn on_error(&self, _state: &PollingState, error: Error) -> LoopState {
        LoopState::Continue(error)
    }
}

/// Bounds the time spent in the loop. See [PollingErrorPolicyExt::with_time_limit].
///
/// The limit is checked between queries, after each query returns. A single
/// slow query can overrun `maximum_duration`. Use
/// [with_deadline][crate::PollingOptions::with_deadline] for a hard bound.
#[derive(Debug)]
pub struct LimitedElapsedTime<P = Aip194Strict>
where
    P: PollingErrorPolicy,
{
    inner: P,
    maximum_duration: Duration,
}

impl LimitedElapsedTime {
    /// Wraps [Aip194Strict].
    pub fn new(maximum_duration: Duration) -> Self {
        Self::custom(Aip194Strict, maximum_duration)
    }
}

impl<P: PollingErrorPolicy> LimitedElapsedTime<P> {
    pub fn custom(inner: P, maximum_duration: Duration) -> Self {
        Self {
            inner,
            maximum_duration,
        }
    }

    fn elapsed(&self, state: &PollingState) -> Option<Duration> {
        let elapsed = Instant::now().saturating_duration_since(state.start);
        (elapsed >= self.maximum_duration).then_some(elapsed)
    }
}

impl<P: PollingErrorPolicy> PollingErrorPolicy for LimitedElapsedTime<P> {
    fn on_error(&self, state: &PollingState, error: Error) -> LoopState {
        match self.inner.on_error(state, error) {
            LoopState::Continue(e) if self.elapsed(state).is_some() => LoopState::Exhausted(e),
            other => other,
        }
    }

    fn on_in_progress(&self, state: &PollingState, operation_name: &str) -> Option<Error> {
        if let Some(e) = self.inner.on_in_progress(state, operation_name) {
            return Some(e);
        }
        self.elapsed(state).map(|elapsed| {
            Error::exhausted(Exhausted::new(
                operation_name,
                "elapsed time",
                format!("{elapsed:?}"),
                format!("{:?}", self.maximum_duration),
            ))
        })
    }
}

/// Bounds the number of status queries. See
/// [PollingErrorPolicyExt::with_attempt_limit].
#[derive(Debug)]
pub struct LimitedAttemptCount<P = Aip194Strict>
where
    P: PollingErrorPolicy,
{
    inner: P,
    maximum_attempts: u32,
}

impl LimitedAttemptCount {
    /// Wraps [Aip194Strict].
    pub fn new(maximum_attempts: u32) -> Self {
        Self::custom(Aip194Strict, maximum_attempts)
    }
}

impl<P: PollingErrorPolicy> LimitedAttemptCount<P> {
    pub fn custom(inner: P, maximum_attempts: u32) -> Self {
        Self {
            inner,
            maximum_attempts,
        }
    }

    fn reached(&self, state: &PollingState) -> bool {
        state.attempt_count >= self.maximum_attempts
    }
}

impl<P: PollingErrorPolicy> PollingErrorPolicy for LimitedAttemptCount<P> {
    fn on_error(&self, state: &PollingState, error: Error) -> LoopState {
        match self.inner.on_error(state, error) {
            LoopState::Continue(e) if self.reached(state) => LoopState::Exhausted(e),
            other => other,
        }
    }

    fn on_in_progress(&self, state: &PollingState, operation_name: &str) -> Option<Error> {
        if let Some(e) = self.inner.on_in_progress(state, operation_name) {
            return Some(e);
        }
        self.reached(state).then(|| {
            Error::exhausted(Exhausted::new(
                operation_name,
                "attempt count",
                state.attempt_count.to_string(),
                self.maximum_attempts.to_string(),
            ))
        })
    }
}

/// The polling loop reached one of its limits before the operation completed.
#[derive(thiserror::Error, Debug)]
#[error("polling loop for {operation_name} exhausted, {limit_name} value ({value}) exceeds limit ({limit})")]
pub struct Exhausted {
    operation_name: String,
    limit_name: &'static str,
    value: String,
    limit: String,
}

impl Exhausted {
    pub fn new(
        operation_name: &str,
        limit_name: &'static str,
        value: String,
        limit: String,
    ) -> Self {
        Self {
            operation_name: operation_name.to_string(),
            limit_name,
            value,
            limit,
        }
    }
}
