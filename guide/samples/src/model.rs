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

//! Messages shared by several services.

use lro::Disposition;
use lro::error::rpc::{Code, Status};
use serde::{Deserialize, Serialize};

/// The JSON representation of `google.rpc.Status`.
///
/// Unlike the error bodies in HTTP responses, the `code` is numeric.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct RpcStatus {
    pub code: i32,
    pub message: String,
    pub details: Vec<serde_json::Value>,
}

impl From<RpcStatus> for Status {
    fn from(value: RpcStatus) -> Self {
        Status::default()
            .set_code(Code::from(value.code))
            .set_message(value.message)
            .set_details(value.details)
    }
}

/// The JSON representation of `google.longrunning.Operation`.
///
/// Services returning these operations set `done` once the work completes,
/// and then set either `error` or `response`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct Operation {
    pub name: String,
    pub metadata: Option<serde_json::Value>,
    pub done: bool,
    pub error: Option<RpcStatus>,
    pub response: Option<serde_json::Value>,
}

impl lro::Operation for Operation {
    fn name(&self) -> Option<&str> {
        Some(self.name.as_str()).filter(|n| !n.is_empty())
    }
}

/// Classifies a `google.longrunning.Operation`.
pub fn operation_classifier() -> impl lro::Classifier<Operation> {
    |op: &Operation| match (op.done, &op.error) {
        (false, _) => Disposition::InProgress,
        (true, None) => Disposition::Succeeded,
        (true, Some(e)) => Disposition::Failed(e.clone().into()),
    }
}
