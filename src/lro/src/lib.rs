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

//! Types and functions to wait for long-running operations.
//!
//! Many Cloud services start asynchronous work, such as a DLP inspection job,
//! a Batch job, or a Compute Engine zone operation, and return a handle to
//! that work. The application must then query the status of the operation
//! until it reaches a terminal state. Each service uses its own names for
//! these states, so this crate lets the application provide a [Classifier]
//! mapping the latest status to a [Disposition].
//!
//! # Example
//! ```
//! # use cloud_snippets_lro::*;
//! # use cloud_snippets_lro::polling_backoff_policy::FixedInterval;
//! # use cloud_snippets_lro::polling_error_policy::{Aip194Strict, PollingErrorPolicyExt};
//! use std::time::Duration;
//!
//! #[derive(Debug)]
//! struct Job { name: String, state: String }
//! impl Operation for Job {
//!     fn name(&self) -> Option<&str> { Some(&self.name) }
//! }
//!
//! async fn sample() -> Result<Job> {
//!     let options = PollingOptions::new()
//!         .with_polling_error_policy(Aip194Strict.with_attempt_limit(30))
//!         .with_polling_backoff_policy(FixedInterval::new(Duration::from_secs(30)));
//!     let classifier = TerminalStates::new()
//!         .set_succeeded(["DONE"])
//!         .set_failed(["FAILED", "CANCELED"])
//!         .by_state(|job: &Job| job.state.clone());
//!     let job = new_poller(
//!         options,
//!         || async { create_job().await },
//!         |name| async move { get_job(name).await },
//!         classifier,
//!     )
//!     .until_done()
//!     .await?;
//!     println!("job {} completed", job.name);
//!     Ok(job)
//! }
//!
//! async fn create_job() -> Result<Job> {
//!     // ... details omitted ...
//!     # panic!()
//! }
//! async fn get_job(name: String) -> Result<Job> {
//!     // ... details omitted ...
//!     # panic!()
//! }
//! ```

pub mod classify;
pub mod config;
pub mod error;
pub mod exponential_backoff;
pub mod loop_state;
pub mod notification;
pub mod options;
pub mod polling_backoff_policy;
pub mod polling_error_policy;
pub mod polling_state;

mod poller;

pub use classify::{Classifier, Disposition, TerminalStates};
pub use error::Error;
pub use options::PollingOptions;
pub use poller::{new_poller, resume_poller};
pub use polling_state::PollingState;

/// The result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The trait implemented by the status of a long-running operation.
///
/// The poller only needs the name of the operation, which it passes to the
/// status query function. Everything else is service specific.
pub trait Operation {
    /// Returns the name of the operation.
    ///
    /// This is `None` if the service did not return a name. The poller cannot
    /// query the status of such operations, and stops with an error if they
    /// are still in progress.
    fn name(&self) -> Option<&str>;
}

/// Untyped operations use the top-level `name` field.
impl Operation for serde_json::Value {
    fn name(&self) -> Option<&str> {
        self.get("name").and_then(serde_json::Value::as_str)
    }
}

/// The result of polling a long-running operation.
///
/// # Parameters
/// * `O` - the operation type. The poller returns the latest status of the
///   operation on each step.
#[derive(Debug)]
pub enum PollingResult<O> {
    /// The operation is still in progress.
    InProgress(O),
    /// The operation completed. This includes the final status, or the error
    /// that stopped the polling loop.
    Completed(Result<O>),
    /// An error trying to poll the operation.
    ///
    /// The polling error policy decided this error may resolve in a future
    /// attempt. For example, it may not have been possible to connect to the
    /// service.
    PollingError(Error),
}

/// The trait implemented by pollers.
///
/// # Parameters
/// * `O` - the operation type.
pub trait Poller<O>: Send + sealed::Poller {
    /// Query the current status of the long-running operation.
    ///
    /// Returns `None` once the poller has completed. This function does not
    /// wait between calls and ignores the deadline and cancellation token in
    /// the polling options. Applications calling it directly control their
    /// own loop.
    fn poll(&mut self) -> impl Future<Output = Option<PollingResult<O>>> + Send;

    /// Poll the long-running operation until it completes.
    ///
    /// The loop waits between attempts as prescribed by the backoff policy,
    /// and stops when the operation reaches a terminal state, the error
    /// policy gives up, the deadline expires, or the cancellation token
    /// fires.
    fn until_done(self) -> impl Future<Output = Result<O>> + Send;

    /// Convert the poller to a [Stream][futures::Stream].
    #[cfg(feature = "unstable-stream")]
    fn into_stream(self) -> impl futures::Stream<Item = PollingResult<O>> + Unpin;
}

mod sealed {
    pub trait Poller {}
}
