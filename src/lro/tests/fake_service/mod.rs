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

//! An in-memory job service, returning canned responses.

use lro::Error;
use lro::error::rpc::{Code, Status};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub type Response = lro::Result<FakeJob>;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FakeJob {
    pub name: String,
    pub state: String,
    pub progress: i32,
}

impl lro::Operation for FakeJob {
    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

pub struct ServerState {
    pub create: VecDeque<Response>,
    pub poll: VecDeque<Response>,
}

#[derive(Clone)]
pub struct FakeService {
    state: Arc<Mutex<ServerState>>,
    queried: Arc<Mutex<Vec<String>>>,
}

impl FakeService {
    pub fn new(state: ServerState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            queried: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn create_job(&self) -> Response {
        let mut state = self.state.lock().expect("shared state is poisoned");
        state
            .create
            .pop_front()
            .unwrap_or_else(|| Err(exhausted("exhausted create responses")))
    }

    pub async fn get_job(&self, name: String) -> Response {
        self.queried
            .lock()
            .expect("shared state is poisoned")
            .push(name);
        let mut state = self.state.lock().expect("shared state is poisoned");
        state
            .poll
            .pop_front()
            .unwrap_or_else(|| Err(exhausted("exhausted poll data")))
    }

    /// The names used in each status query.
    pub fn queried(&self) -> Vec<String> {
        self.queried
            .lock()
            .expect("shared state is poisoned")
            .clone()
    }
}

pub fn job(name: &str, state: &str, progress: i32) -> Response {
    Ok(FakeJob {
        name: name.to_string(),
        state: state.to_string(),
        progress,
    })
}

pub fn unavailable() -> Response {
    Err(Error::service(
        Status::default()
            .set_code(Code::Unavailable)
            .set_message("try-again"),
    ))
}

pub fn not_found() -> Response {
    Err(Error::service(
        Status::default()
            .set_code(Code::NotFound)
            .set_message("job not found"),
    ))
}

fn exhausted(msg: &str) -> Error {
    Error::service(
        Status::default()
            .set_code(Code::FailedPrecondition)
            .set_message(msg),
    )
}
