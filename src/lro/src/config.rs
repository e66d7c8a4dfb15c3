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

//! Load polling options from configuration files.
//!
//! Applications that poll many kinds of jobs may prefer to keep the polling
//! limits, and the names of the terminal states, in a configuration file. The
//! format is JSON, with durations expressed as human-readable strings:
//!
//! ```
//! # use cloud_snippets_lro::config::PollingConfig;
//! # use cloud_snippets_lro::classify::Disposition;
//! let config = PollingConfig::from_json(r#"{
//!     "attempt_limit": 30,
//!     "time_limit": "15m",
//!     "backoff": { "kind": "fixed", "interval": "30s" },
//!     "succeeded_states": ["DONE"],
//!     "failed_states": ["FAILED", "CANCELED"]
//! }"#)?;
//! let options = config.to_options()?;
//! let states = config.terminal_states();
//! assert_eq!(states.classify_state("DONE"), Disposition::Succeeded);
//! # Ok::<(), cloud_snippets_lro::config::ConfigError>(())
//! ```

use crate::classify::TerminalStates;
use crate::exponential_backoff::ExponentialBackoffBuilder;
use crate::loop_state::LoopState;
use crate::options::PollingOptions;
use crate::polling_backoff_policy::FixedInterval;
use crate::polling_error_policy::{
    Aip194Strict, AlwaysContinue, PollingErrorPolicy, PollingErrorPolicyExt,
};
use crate::polling_state::PollingState;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// The errors reported when loading a [PollingConfig].
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("cannot read the polling configuration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse the polling configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("the attempt limit should be greater than zero")]
    InvalidAttemptLimit,
    #[error("the {0} should be greater than zero")]
    ZeroDuration(&'static str),
    #[error("invalid exponential backoff: {0}")]
    Backoff(#[from] crate::exponential_backoff::Error),
}

/// The polling configuration, as loaded from a file.
///
/// All fields are optional. An empty configuration produces the same
/// [PollingOptions] as [PollingOptions::default].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PollingConfig {
    /// Stop after this many status queries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempt_limit: Option<u32>,

    /// Stop when the polling loop runs for longer than this.
    ///
    /// The limit is checked after each status query.
    #[serde(with = "optional_duration", skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<Duration>,

    /// A hard deadline for the polling loop.
    ///
    /// Unlike the time limit, the deadline interrupts status queries in flight.
    #[serde(with = "optional_duration", skip_serializing_if = "Option::is_none")]
    pub deadline: Option<Duration>,

    /// Treat all status query errors as recoverable.
    pub continue_on_any_error: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub backoff: Option<BackoffConfig>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub succeeded_states: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_states: Vec<String>,
}

/// The backoff policy configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackoffConfig {
    /// Wait the same interval between status queries.
    Fixed {
        #[serde(with = "duration")]
        interval: Duration,
    },
    /// Truncated exponential backoff. Missing fields use the defaults from
    /// [ExponentialBackoffBuilder].
    Exponential {
        #[serde(
            default,
            with = "optional_duration",
            skip_serializing_if = "Option::is_none"
        )]
        initial_delay: Option<Duration>,
        #[serde(
            default,
            with = "optional_duration",
            skip_serializing_if = "Option::is_none"
        )]
        maximum_delay: Option<Duration>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scaling: Option<f64>,
    },
}

impl PollingConfig {
    /// Parses a configuration from a JSON string.
    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Loads a configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Validates the configuration and creates the corresponding options.
    pub fn to_options(&self) -> Result<PollingOptions, ConfigError> {
        let mut policy: Arc<dyn PollingErrorPolicy> = if self.continue_on_any_error {
            Arc::new(AlwaysContinue)
        } else {
            Arc::new(Aip194Strict)
        };
        if let Some(limit) = self.time_limit {
            if limit.is_zero() {
                return Err(ConfigError::ZeroDuration("time limit"));
            }
            policy = Arc::new(SharedPolicy(policy).with_time_limit(limit));
        }
        if let Some(limit) = self.attempt_limit {
            if limit == 0 {
                return Err(ConfigError::InvalidAttemptLimit);
            }
            policy = Arc::new(SharedPolicy(policy).with_attempt_limit(limit));
        }
        let mut options = PollingOptions::new().with_polling_error_policy(policy);

        match &self.backoff {
            None => {}
            Some(BackoffConfig::Fixed { interval }) => {
                if interval.is_zero() {
                    return Err(ConfigError::ZeroDuration("backoff interval"));
                }
                options = options.with_polling_backoff_policy(FixedInterval::new(*interval));
            }
            Some(BackoffConfig::Exponential {
                initial_delay,
                maximum_delay,
                scaling,
            }) => {
                let mut builder = ExponentialBackoffBuilder::new();
                if let Some(v) = initial_delay {
                    builder = builder.with_initial_delay(*v);
                }
                if let Some(v) = maximum_delay {
                    builder = builder.with_maximum_delay(*v);
                }
                if let Some(v) = scaling {
                    builder = builder.with_scaling(*v);
                }
                options = options.with_polling_backoff_policy(builder.build()?);
            }
        }

        if let Some(deadline) = self.deadline {
            if deadline.is_zero() {
                return Err(ConfigError::ZeroDuration("deadline"));
            }
            options = options.with_deadline(deadline);
        }
        Ok(options)
    }

    /// The terminal states listed in the configuration.
    pub fn terminal_states(&self) -> TerminalStates {
        TerminalStates::new()
            .set_succeeded(self.succeeded_states.iter().cloned())
            .set_failed(self.failed_states.iter().cloned())
    }
}

// Lets the policy decorators wrap a policy selected at runtime.
#[derive(Debug)]
struct SharedPolicy(Arc<dyn PollingErrorPolicy>);

impl PollingErrorPolicy for SharedPolicy {
    fn on_error(&self, state: &PollingState, error: crate::Error) -> LoopState {
        self.0.on_error(state, error)
    }

    fn on_in_progress(&self, state: &PollingState, operation_name: &str) -> Option<crate::Error> {
        self.0.on_in_progress(state, operation_name)
    }
}

mod duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&humantime::format_duration(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let value = String::deserialize(deserializer)?;
        humantime::parse_duration(&value).map_err(serde::de::Error::custom)
    }
}

mod optional_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => super::duration::serialize(d, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        let value = Option::<String>::deserialize(deserializer)?;
        value
            .map(|v| humantime::parse_duration(&v).map_err(serde::de::Error::custom))
            .transpose()
    }
}
