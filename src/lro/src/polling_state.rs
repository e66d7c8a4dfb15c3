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

//! Defines the input to polling policy queries.

use tokio::time::Instant;

/// The state of a polling loop.
///
/// The poller provides an instance of this type to the polling policies. The
/// instant uses the tokio clock, so tests can pause and advance time.
///
/// This struct may gain new fields in future versions.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct PollingState {
    /// The start time for this polling loop.
    pub start: Instant,

    /// The number of status queries, including failed queries.
    ///
    /// The request starting the operation is not counted.
    pub attempt_count: u32,
}

impl PollingState {
    /// Update the start time, useful in mocks.
    pub fn set_start<T: Into<Instant>>(mut self, v: T) -> Self {
        self.start = v.into();
        self
    }

    /// Update the attempt count, useful in mocks.
    pub fn set_attempt_count<T: Into<u32>>(mut self, v: T) -> Self {
        self.attempt_count = v.into();
        self
    }
}

impl std::default::Default for PollingState {
    fn default() -> Self {
        Self {
            start: Instant::now(),
            attempt_count: 0,
        }
    }
}
