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

//! The error type returned by the polling helpers.

/// Status codes and the diagnostic payload returned by services.
pub mod rpc;

use rpc::Status;
use std::error::Error as StdError;

type BoxError = Box<dyn StdError + Send + Sync>;

/// The error returned by pollers and the functions that feed them.
///
/// A polling loop fails for several reasons: the service may reject the status
/// query, the operation may complete with an error, the loop may reach its
/// deadline or one of its limits, or the application may cancel it. This type
/// offers a predicate for each case, and [status][Error::status] to examine the
/// payload returned by the service, if any.
///
/// # Example
/// ```
/// use cloud_snippets_lro::Error;
/// match example_function() {
///     Err(e) if e.is_operation_failure() => {
///         println!("the job failed: {:?}", e.status());
///     },
///     Err(e) if e.is_timeout() || e.is_exhausted() => {
///         println!("gave up waiting: {e}");
///     },
///     Err(e) => println!("some other error {e}"),
///     Ok(_) => println!("job completed"),
/// }
///
/// fn example_function() -> Result<String, Error> {
///     // ... details omitted ...
///     # Err(Error::timeout("simulated"))
/// }
/// ```
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    source: Option<BoxError>,
}

#[derive(Debug)]
enum ErrorKind {
    Service(Box<Status>),
    Operation(Box<Status>),
    Transport,
    Timeout,
    Exhausted,
    Cancelled,
    Deserialization,
    Other,
}

impl Error {
    /// Creates an error with the status returned by a service RPC.
    ///
    /// Use this when the status query (or the request starting the operation)
    /// fails. The polling error policies examine the status code to determine
    /// if the polling loop may continue.
    ///
    /// # Example
    /// ```
    /// use cloud_snippets_lro::Error;
    /// use cloud_snippets_lro::error::rpc::{Code, Status};
    /// let status = Status::default().set_code(Code::NotFound).set_message("NOT FOUND");
    /// let error = Error::service(status.clone());
    /// assert_eq!(error.status(), Some(&status));
    /// ```
    pub fn service(status: Status) -> Self {
        Self {
            kind: ErrorKind::Service(Box::new(status)),
            source: None,
        }
    }

    /// Creates an error representing a long-running operation that completed
    /// in a failed terminal state.
    ///
    /// # Example
    /// ```
    /// use cloud_snippets_lro::Error;
    /// use cloud_snippets_lro::error::rpc::{Code, Status};
    /// let status = Status::default().set_code(Code::Aborted).set_message("job FAILED");
    /// let error = Error::operation(status.clone());
    /// assert!(error.is_operation_failure());
    /// assert_eq!(error.status(), Some(&status));
    /// ```
    pub fn operation(status: Status) -> Self {
        Self {
            kind: ErrorKind::Operation(Box::new(status)),
            source: None,
        }
    }

    /// The long-running operation completed, but it failed.
    ///
    /// The [status][Error::status] contains the diagnostic payload reported by
    /// the service. Polling again will not change the outcome.
    pub fn is_operation_failure(&self) -> bool {
        matches!(self.kind, ErrorKind::Operation(_))
    }

    /// Creates an error representing a problem reaching the service.
    ///
    /// # Example
    /// ```
    /// use cloud_snippets_lro::Error;
    /// let error = Error::transport("connection reset");
    /// assert!(error.is_transport());
    /// ```
    pub fn transport<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Transport,
            source: Some(source.into()),
        }
    }

    /// The request could not reach the service, or the connection dropped
    /// before a response arrived.
    ///
    /// These errors are often transient, and the default polling policies
    /// continue polling after them.
    pub fn is_transport(&self) -> bool {
        matches!(self.kind, ErrorKind::Transport)
    }

    /// Creates an error representing a timeout.
    ///
    /// # Example
    /// ```
    /// use std::error::Error as _;
    /// use cloud_snippets_lro::Error;
    /// let error = Error::timeout("simulated timeout");
    /// assert!(error.is_timeout());
    /// assert!(error.source().is_some());
    /// ```
    pub fn timeout<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Timeout,
            source: Some(source.into()),
        }
    }

    /// The polling loop did not observe a terminal state before its deadline.
    ///
    /// This is always a client-side generated error. The operation may still
    /// complete in the service.
    pub fn is_timeout(&self) -> bool {
        matches!(self.kind, ErrorKind::Timeout)
    }

    /// Creates an error representing an exhausted polling policy.
    ///
    /// # Example
    /// ```
    /// use std::error::Error as _;
    /// use cloud_snippets_lro::Error;
    /// let error = Error::exhausted("too many polling attempts");
    /// assert!(error.is_exhausted());
    /// assert!(error.source().is_some());
    /// ```
    pub fn exhausted<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Exhausted,
            source: Some(source.into()),
        }
    }

    /// The polling policy reached its attempt or elapsed time limit while the
    /// operation was still in progress, or while the service kept returning
    /// transient errors.
    ///
    /// # Troubleshooting
    ///
    /// Some operations, such as batch jobs, take many minutes to complete.
    /// Consider extending the limits of the polling policy, or resuming the
    /// polling loop later using the operation name.
    pub fn is_exhausted(&self) -> bool {
        matches!(self.kind, ErrorKind::Exhausted)
    }

    /// Creates an error representing a cancelled polling loop.
    pub fn cancelled() -> Self {
        Self {
            kind: ErrorKind::Cancelled,
            source: None,
        }
    }

    /// The application cancelled the polling loop.
    ///
    /// Cancelling the loop does not cancel the operation in the service.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.kind, ErrorKind::Cancelled)
    }

    /// Creates an error representing a deserialization problem.
    ///
    /// # Example
    /// ```
    /// use cloud_snippets_lro::Error;
    /// let error = Error::deser("unexpected end of input");
    /// assert!(error.is_deserialization());
    /// ```
    pub fn deser<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Deserialization,
            source: Some(source.into()),
        }
    }

    /// The response could not be deserialized.
    pub fn is_deserialization(&self) -> bool {
        matches!(self.kind, ErrorKind::Deserialization)
    }

    /// Creates an error that does not fit any other category.
    pub fn other<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Other,
            source: Some(source.into()),
        }
    }

    /// The status returned by the service, if any.
    ///
    /// This is available for errors created by [Error::service] and
    /// [Error::operation].
    pub fn status(&self) -> Option<&Status> {
        match &self.kind {
            ErrorKind::Service(s) | ErrorKind::Operation(s) => Some(s.as_ref()),
            _ => None,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.kind, &self.source) {
            (ErrorKind::Service(s), _) => write!(f, "the service reports an error: {s}"),
            (ErrorKind::Operation(s), _) => {
                write!(f, "the long-running operation failed: {s}")
            }
            (ErrorKind::Cancelled, _) => write!(f, "the polling loop was cancelled"),
            (ErrorKind::Transport, Some(e)) => {
                write!(f, "cannot communicate with the service: {e}")
            }
            (ErrorKind::Timeout, Some(e)) => write!(f, "the polling loop timed out: {e}"),
            (ErrorKind::Exhausted, Some(e)) => write!(f, "{e}"),
            (ErrorKind::Deserialization, Some(e)) => {
                write!(f, "cannot deserialize the response: {e}")
            }
            (ErrorKind::Other, Some(e)) => write!(f, "{e}"),
            (kind, None) => write!(f, "{kind:?}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}
