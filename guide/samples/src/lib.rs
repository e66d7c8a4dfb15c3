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

//! Snippets showing how to wait for long-running operations in Google Cloud
//! services.
//!
//! Each service names its job states differently. The snippets map those
//! states to a [Disposition][lro::Disposition] and let the poller in the
//! [lro] crate drive the loop.

pub type Result<T> = anyhow::Result<T>;

pub mod batch;
pub mod batch_prediction;
pub mod client;
pub mod compute;
pub mod container_analysis;
pub mod dlp;
pub mod model;
pub mod pubsub;
pub mod resume;
pub mod tpu;
