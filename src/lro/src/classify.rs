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

//! Map operation states to polling decisions.
//!
//! Each service uses its own vocabulary for the state of a long-running
//! operation. DLP jobs are `DONE` or `FAILED`, Batch jobs are `SUCCEEDED` or
//! `FAILED`, Vertex AI batch prediction jobs are `JOB_STATE_SUCCEEDED`,
//! `JOB_STATE_CANCELLED`, and so on. The poller does not know any of these
//! names. Instead, the application provides a [Classifier] that maps the
//! latest status to a [Disposition].
//!
//! # Example
//! ```
//! # use cloud_snippets_lro::classify::{Classifier, Disposition};
//! # use cloud_snippets_lro::error::rpc::{Code, Status};
//! struct Job { state: String }
//!
//! let classifier = |job: &Job| match job.state.as_str() {
//!     "DONE" => Disposition::Succeeded,
//!     "FAILED" => Disposition::Failed(Status::default().set_code(Code::Aborted)),
//!     _ => Disposition::InProgress,
//! };
//! let job = Job { state: "RUNNING".to_string() };
//! assert_eq!(classifier.classify(&job), Disposition::InProgress);
//! ```

use crate::error::rpc::{Code, Status};
use serde::{Deserialize, Serialize};

/// The polling decision for an operation status.
#[derive(Clone, Debug, PartialEq)]
pub enum Disposition {
    /// The operation has not reached a terminal state, continue polling.
    InProgress,
    /// The operation reached a successful terminal state.
    Succeeded,
    /// The operation reached a failed terminal state.
    ///
    /// The status carries whatever diagnostic payload the service provided.
    Failed(Status),
}

impl Disposition {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

/// Maps an operation status to a [Disposition].
///
/// This trait is implemented for any `Fn(&O) -> Disposition`, so most
/// applications use a closure.
pub trait Classifier<O>: Send + Sync {
    fn classify(&self, operation: &O) -> Disposition;
}

impl<O, F> Classifier<O> for F
where
    F: Fn(&O) -> Disposition + Send + Sync,
{
    fn classify(&self, operation: &O) -> Disposition {
        self(operation)
    }
}

/// A classifier driven by lists of state names.
///
/// Use this type when the state vocabulary is only known at runtime, for
/// example, when it is read from a configuration file. Any state not listed
/// is considered in progress.
///
/// # Example
/// ```
/// # use cloud_snippets_lro::classify::{Disposition, TerminalStates};
/// let states = TerminalStates::new()
///     .set_succeeded(["DONE"])
///     .set_failed(["FAILED", "CANCELED"]);
/// assert_eq!(states.classify_state("RUNNING"), Disposition::InProgress);
/// assert_eq!(states.classify_state("DONE"), Disposition::Succeeded);
/// assert!(matches!(states.classify_state("CANCELED"), Disposition::Failed(_)));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalStates {
    succeeded: Vec<String>,
    failed: Vec<String>,
}

impl TerminalStates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the states that indicate success.
    pub fn set_succeeded<T, V>(mut self, v: T) -> Self
    where
        T: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.succeeded = v.into_iter().map(|v| v.into()).collect();
        self
    }

    /// Sets the states that indicate failure.
    pub fn set_failed<T, V>(mut self, v: T) -> Self
    where
        T: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.failed = v.into_iter().map(|v| v.into()).collect();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.succeeded.is_empty() && self.failed.is_empty()
    }

    /// Classifies a state name.
    ///
    /// Failure states take precedence if a name appears in both lists.
    pub fn classify_state(&self, state: &str) -> Disposition {
        if self.failed.iter().any(|s| s == state) {
            return Disposition::Failed(
                Status::default()
                    .set_code(Code::Aborted)
                    .set_message(format!("the operation reached the {state} state")),
            );
        }
        if self.succeeded.iter().any(|s| s == state) {
            return Disposition::Succeeded;
        }
        Disposition::InProgress
    }

    /// Returns a [Classifier] extracting the state name with `state`.
    ///
    /// # Example
    /// ```
    /// # use cloud_snippets_lro::classify::{Classifier, Disposition, TerminalStates};
    /// let classifier = TerminalStates::new()
    ///     .set_succeeded(["SUCCEEDED"])
    ///     .by_state(|job: &serde_json::Value| job["state"].as_str().unwrap_or_default().to_string());
    /// let job = serde_json::json!({"state": "SUCCEEDED"});
    /// assert_eq!(classifier.classify(&job), Disposition::Succeeded);
    /// ```
    pub fn by_state<O, F, S>(self, state: F) -> impl Classifier<O>
    where
        F: Fn(&O) -> S + Send + Sync,
        S: AsRef<str>,
    {
        move |operation: &O| self.classify_state(state(operation).as_ref())
    }

    /// Like [by_state][TerminalStates::by_state], but failures also carry the
    /// diagnostics extracted by `details`.
    ///
    /// # Example
    /// ```
    /// # use cloud_snippets_lro::classify::{Classifier, Disposition, TerminalStates};
    /// use serde_json::{Value, json};
    /// let classifier = TerminalStates::new()
    ///     .set_failed(["FAILED"])
    ///     .by_state_with_details(
    ///         |job: &Value| job["state"].as_str().unwrap_or_default().to_string(),
    ///         |job: &Value| job.get("error").cloned(),
    ///     );
    /// let job = json!({"state": "FAILED", "error": {"code": 8}});
    /// let Disposition::Failed(status) = classifier.classify(&job) else { unreachable!() };
    /// assert_eq!(status.details, vec![json!({"code": 8})]);
    /// ```
    pub fn by_state_with_details<O, F, S, D, I>(self, state: F, details: D) -> impl Classifier<O>
    where
        F: Fn(&O) -> S + Send + Sync,
        S: AsRef<str>,
        D: Fn(&O) -> I + Send + Sync,
        I: IntoIterator<Item = serde_json::Value>,
    {
        move |operation: &O| match self.classify_state(state(operation).as_ref()) {
            Disposition::Failed(status) => {
                Disposition::Failed(status.set_details(details(operation)))
            }
            other => other,
        }
    }
}
