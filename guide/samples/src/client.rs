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

//! A minimal REST client for the snippets.
//!
//! The snippets only need to start jobs and query their status. This client
//! sends JSON requests with [reqwest] and maps every failure to
//! [lro::Error], so the results can feed a poller directly.

use lro::Error;
use lro::error::rpc::{Code, Status};
use std::time::Duration;

/// Sends JSON requests to a Google Cloud REST endpoint.
///
/// # Example
/// ```no_run
/// # use cloud_snippets_samples::client::Client;
/// # async fn sample() -> lro::Result<()> {
/// let client = Client::builder()
///     .with_endpoint("https://dlp.googleapis.com")
///     .build()?;
/// let job: serde_json::Value = client.get("/v2/projects/my-project/dlpJobs/i-123").await?;
/// println!("job={job:?}");
/// # Ok(()) }
/// ```
#[derive(Clone, Debug)]
pub struct Client {
    inner: reqwest::Client,
    endpoint: String,
    access_token: Option<String>,
}

impl Client {
    /// Returns a builder for [Client].
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// The endpoint receiving the requests.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sends a `POST` request to `path`, with `body` as its JSON payload.
    pub async fn create<I, O>(&self, path: &str, body: &I) -> lro::Result<O>
    where
        I: serde::Serialize + ?Sized,
        O: serde::de::DeserializeOwned,
    {
        let builder = self.request(reqwest::Method::POST, path).json(body);
        self.execute(builder).await
    }

    /// Sends a `GET` request to `path`.
    pub async fn get<O>(&self, path: &str) -> lro::Result<O>
    where
        O: serde::de::DeserializeOwned,
    {
        self.execute(self.request(reqwest::Method::GET, path)).await
    }

    /// Sends a `GET` request to `path` with the given query parameters.
    pub async fn list<O, Q>(&self, path: &str, query: &Q) -> lro::Result<O>
    where
        O: serde::de::DeserializeOwned,
        Q: serde::Serialize + ?Sized,
    {
        let builder = self.request(reqwest::Method::GET, path).query(query);
        self.execute(builder).await
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self
            .inner
            .request(method, format!("{}{path}", &self.endpoint));
        match &self.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn execute<O>(&self, builder: reqwest::RequestBuilder) -> lro::Result<O>
    where
        O: serde::de::DeserializeOwned,
    {
        let response = builder.send().await.map_err(Self::map_send_error)?;
        if !response.status().is_success() {
            return to_http_error(response).await;
        }
        let body = response.bytes().await.map_err(Self::map_send_error)?;
        // Some methods, such as acknowledgements, return an empty body.
        let body = if body.is_empty() {
            bytes::Bytes::from_static(b"{}")
        } else {
            body
        };
        serde_json::from_slice::<O>(&body).map_err(Error::deser)
    }

    fn map_send_error(err: reqwest::Error) -> Error {
        match err {
            e if e.is_timeout() => Error::timeout(e),
            e => Error::transport(e),
        }
    }
}

/// A builder for [Client].
#[derive(Clone, Debug, Default)]
pub struct ClientBuilder {
    endpoint: Option<String>,
    access_token: Option<String>,
    timeout: Option<Duration>,
}

impl ClientBuilder {
    /// Sets the endpoint, for example `https://dlp.googleapis.com`.
    ///
    /// This is required, as each service uses a different endpoint.
    pub fn with_endpoint<V: Into<String>>(mut self, v: V) -> Self {
        self.endpoint = Some(v.into());
        self
    }

    /// Sends `v` as a bearer token in each request.
    ///
    /// Obtaining the token is outside the scope of these snippets. For
    /// example, use the output of `gcloud auth print-access-token`.
    pub fn with_access_token<V: Into<String>>(mut self, v: V) -> Self {
        self.access_token = Some(v.into());
        self
    }

    /// Sets the timeout for each request.
    ///
    /// This bounds a single request, use
    /// [with_deadline][lro::PollingOptions::with_deadline] to bound a polling
    /// loop.
    pub fn with_timeout<V: Into<Duration>>(mut self, v: V) -> Self {
        self.timeout = Some(v.into());
        self
    }

    /// Creates the client.
    pub fn build(self) -> lro::Result<Client> {
        let endpoint = self
            .endpoint
            .ok_or_else(|| Error::other("the endpoint is required"))?;
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let inner = builder.build().map_err(Error::transport)?;
        Ok(Client {
            inner,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            access_token: self.access_token,
        })
    }
}

async fn to_http_error<O>(response: reqwest::Response) -> lro::Result<O> {
    let status_code = response.status().as_u16();
    let body = response.bytes().await.map_err(Error::transport)?;
    let status = Status::try_from(&body).unwrap_or_else(|_| {
        let message = match String::from_utf8_lossy(&body) {
            m if m.trim().is_empty() => format!("HTTP status code {status_code}"),
            m => m.into_owned(),
        };
        Status::default()
            .set_code(Code::from_http_status(status_code))
            .set_message(message)
    });
    Err(Error::service(status))
}
