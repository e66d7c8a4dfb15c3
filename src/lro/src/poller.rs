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

use crate::classify::{Classifier, Disposition};
use crate::loop_state::LoopState;
use crate::options::PollingOptions;
use crate::polling_backoff_policy::PollingBackoffPolicy;
use crate::polling_error_policy::PollingErrorPolicy;
use crate::{Error, Operation, Poller, PollingResult, PollingState, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Creates a poller that starts a long-running operation and waits for it.
///
/// # Parameters
/// * `options` - the polling policies, deadline, and cancellation token.
/// * `start` - starts the operation. Errors from this function stop the
///   poller, they are never retried. The function should capture all the
///   parameters needed to start the operation.
/// * `query` - queries the status of the operation. It receives the name of
///   the operation as its only input parameter.
/// * `classifier` - maps the status returned by `start` and `query` to a
///   [Disposition].
pub fn new_poller<O, S, SF, Q, QF, C>(
    options: PollingOptions,
    start: S,
    query: Q,
    classifier: C,
) -> impl Poller<O>
where
    O: Operation + Send,
    S: FnOnce() -> SF + Send,
    SF: Future<Output = Result<O>> + Send,
    Q: FnMut(String) -> QF + Send,
    QF: Future<Output = Result<O>> + Send,
    C: Classifier<O>,
{
    PollerImpl::new(options, Some(start), None, query, classifier)
}

/// Creates a poller for an operation started elsewhere.
///
/// Use this function to resume polling an operation after the application
/// restarts, or to wait for an operation started by a different process.
///
/// # Example
/// ```
/// # use cloud_snippets_lro::*;
/// async fn sample(name: &str) -> Result<serde_json::Value> {
///     let classifier = TerminalStates::new()
///         .set_succeeded(["SUCCEEDED"])
///         .set_failed(["FAILED"])
///         .by_state(|job: &serde_json::Value| {
///             job["state"].as_str().unwrap_or_default().to_string()
///         });
///     resume_poller(PollingOptions::new(), name, get_job, classifier)
///         .until_done()
///         .await
/// }
///
/// async fn get_job(name: String) -> Result<serde_json::Value> {
///     // ... details omitted ...
///     # panic!()
/// }
/// ```
pub fn resume_poller<O, Q, QF, C>(
    options: PollingOptions,
    name: impl Into<String>,
    query: Q,
    classifier: C,
) -> impl Poller<O>
where
    O: Operation + Send,
    Q: FnMut(String) -> QF + Send,
    QF: Future<Output = Result<O>> + Send,
    C: Classifier<O>,
{
    PollerImpl::<NoStart<O>, Q, C>::new(options, None, Some(name.into()), query, classifier)
}

type NoStart<O> = fn() -> std::future::Ready<Result<O>>;

struct PollerImpl<S, Q, C> {
    error_policy: Arc<dyn PollingErrorPolicy>,
    backoff_policy: Arc<dyn PollingBackoffPolicy>,
    deadline: Option<Duration>,
    cancellation: Option<CancellationToken>,
    start: Option<S>,
    query: Q,
    classifier: C,
    operation: Option<String>,
    state: PollingState,
    // The elapsed time counts from the first call to `poll()`.
    started: bool,
}

impl<S, Q, C> PollerImpl<S, Q, C> {
    fn new(
        options: PollingOptions,
        start: Option<S>,
        operation: Option<String>,
        query: Q,
        classifier: C,
    ) -> Self {
        Self {
            error_policy: options.error_policy,
            backoff_policy: options.backoff_policy,
            deadline: options.deadline,
            cancellation: options.cancellation,
            start,
            query,
            classifier,
            operation,
            state: PollingState::default(),
            started: false,
        }
    }
}

impl<S, Q, C> crate::sealed::Poller for PollerImpl<S, Q, C> {}

impl<O, S, SF, Q, QF, C> Poller<O> for PollerImpl<S, Q, C>
where
    O: Operation + Send,
    S: FnOnce() -> SF + Send,
    SF: Future<Output = Result<O>> + Send,
    Q: FnMut(String) -> QF + Send,
    QF: Future<Output = Result<O>> + Send,
    C: Classifier<O>,
{
    async fn poll(&mut self) -> Option<PollingResult<O>> {
        if !self.started {
            self.started = true;
            self.state.start = tokio::time::Instant::now();
        }
        if let Some(start) = self.start.take() {
            tracing::debug!("starting operation");
            let result = start().await;
            let (op, poll) = self::handle_start(&self.classifier, result);
            if let Some(name) = &op {
                tracing::Span::current().record("operation", name.as_str());
            }
            self.operation = op;
            return Some(poll);
        }
        if let Some(name) = self.operation.take() {
            self.state.attempt_count += 1;
            tracing::debug!(
                operation = %name,
                attempt_count = self.state.attempt_count,
                "polling operation"
            );
            let result = (self.query)(name.clone()).await;
            let (op, poll) = self::handle_poll(
                self.error_policy.as_ref(),
                &self.classifier,
                &self.state,
                name,
                result,
            );
            self.operation = op;
            return Some(poll);
        }
        None
    }

    async fn until_done(mut self) -> Result<O> {
        let span = tracing::info_span!(
            "lro::until_done",
            operation = self.operation.as_deref()
        );
        let deadline = self.deadline;
        let cancellation = self.cancellation.take();
        let polling_loop = async move {
            while let Some(p) = self.poll().await {
                match p {
                    // Return, the operation completed or the polling policy is
                    // exhausted.
                    PollingResult::Completed(r) => return r,
                    PollingResult::InProgress(_) => (),
                    PollingResult::PollingError(e) => {
                        tracing::warn!(
                            attempt_count = self.state.attempt_count,
                            "recoverable error polling operation: {e}"
                        );
                    }
                }
                tokio::time::sleep(self.backoff_policy.wait_period(&self.state)).await;
            }
            Err(Error::other("the poller has already completed"))
        };
        with_limits(polling_loop, deadline, cancellation)
            .instrument(span)
            .await
    }

    #[cfg(feature = "unstable-stream")]
    fn into_stream(self) -> impl futures::Stream<Item = PollingResult<O>> + Unpin {
        use futures::stream::unfold;
        Box::pin(unfold(Some(self), move |state| async move {
            if let Some(mut poller) = state {
                if let Some(pr) = poller.poll().await {
                    return Some((pr, Some(poller)));
                }
            };
            None
        }))
    }
}

/// Bounds `future` by an optional deadline and an optional cancellation token.
pub(crate) async fn with_limits<F, T>(
    future: F,
    deadline: Option<Duration>,
    cancellation: Option<CancellationToken>,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let bounded = async move {
        match deadline {
            None => future.await,
            Some(d) => match tokio::time::timeout(d, future).await {
                Ok(r) => r,
                Err(e) => {
                    tracing::debug!(deadline = ?d, "deadline expired");
                    Err(Error::timeout(e))
                }
            },
        }
    };
    match cancellation {
        None => bounded.await,
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => {
                tracing::debug!("cancelled by the application");
                Err(Error::cancelled())
            }
            r = bounded => r,
        },
    }
}

fn handle_start<O, C>(classifier: &C, result: Result<O>) -> (Option<String>, PollingResult<O>)
where
    O: Operation,
    C: Classifier<O> + ?Sized,
{
    match result {
        Err(e) => (None, PollingResult::Completed(Err(e))),
        Ok(o) => match classifier.classify(&o) {
            Disposition::InProgress => self::handle_in_progress(o),
            d => (None, self::handle_terminal(o, d)),
        },
    }
}

fn handle_poll<O, C>(
    error_policy: &dyn PollingErrorPolicy,
    classifier: &C,
    state: &PollingState,
    operation_name: String,
    result: Result<O>,
) -> (Option<String>, PollingResult<O>)
where
    O: Operation,
    C: Classifier<O> + ?Sized,
{
    match result {
        Err(e) => {
            let loop_state = error_policy.on_error(state, e);
            self::handle_polling_error(loop_state, operation_name)
        }
        Ok(o) => match classifier.classify(&o) {
            Disposition::InProgress => match error_policy.on_in_progress(state, &operation_name) {
                Some(e) => {
                    tracing::debug!(operation = %operation_name, "polling limit reached: {e}");
                    (None, PollingResult::Completed(Err(e)))
                }
                None => self::handle_in_progress(o),
            },
            d => (None, self::handle_terminal(o, d)),
        },
    }
}

fn handle_polling_error<O>(
    loop_state: LoopState,
    operation_name: String,
) -> (Option<String>, PollingResult<O>) {
    match loop_state {
        LoopState::Continue(e) => (Some(operation_name), PollingResult::PollingError(e)),
        LoopState::Exhausted(e) | LoopState::Permanent(e) => {
            (None, PollingResult::Completed(Err(e)))
        }
    }
}

fn handle_terminal<O>(o: O, disposition: Disposition) -> PollingResult<O> {
    match disposition {
        Disposition::Failed(status) => PollingResult::Completed(Err(Error::operation(status))),
        _ => PollingResult::Completed(Ok(o)),
    }
}

fn handle_in_progress<O>(o: O) -> (Option<String>, PollingResult<O>)
where
    O: Operation,
{
    match o.name() {
        Some(name) => (Some(name.to_string()), PollingResult::InProgress(o)),
        None => (
            None,
            PollingResult::Completed(Err(Error::other(
                "the operation is in progress, but has no name to query its status",
            ))),
        ),
    }
}
