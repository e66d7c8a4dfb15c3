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

//! Exponential backoff for polling loops.
//!
//! The wait period starts at an initial delay, and grows by a scaling factor
//! after each attempt until it reaches a maximum delay. There is no jitter,
//! polling loops already spread their requests over time.

use crate::polling_state::PollingState;
use std::time::Duration;

const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);
const DEFAULT_MAXIMUM_DELAY: Duration = Duration::from_secs(60);
const DEFAULT_SCALING: f64 = 2.0;

/// Invalid parameters in [ExponentialBackoffBuilder::build].
#[derive(thiserror::Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum Error {
    #[error("the scaling factor must be at least 1.0, got {0}")]
    InvalidScalingFactor(f64),
    #[error("the initial delay must be positive, got {0:?}")]
    InvalidInitialDelay(Duration),
    #[error("the maximum delay ({maximum:?}) is smaller than the initial delay ({initial:?})")]
    EmptyRange { maximum: Duration, initial: Duration },
}

/// Configures an [ExponentialBackoff].
///
/// # Example
/// ```
/// # use cloud_snippets_lro::exponential_backoff::{Error, ExponentialBackoffBuilder};
/// # use cloud_snippets_lro::polling_backoff_policy::PollingBackoffPolicy;
/// # use cloud_snippets_lro::PollingState;
/// use std::time::Duration;
/// let backoff = ExponentialBackoffBuilder::new()
///     .with_initial_delay(Duration::from_secs(5))
///     .with_maximum_delay(Duration::from_secs(50))
///     .with_scaling(3.0)
///     .build()?;
/// let state = PollingState::default().set_attempt_count(3_u32);
/// assert_eq!(backoff.wait_period(&state), Duration::from_secs(45));
/// # Ok::<(), Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct ExponentialBackoffBuilder {
    inner: ExponentialBackoff,
}

impl ExponentialBackoffBuilder {
    /// Starts from the defaults: 1 second, doubling up to 60 seconds.
    pub fn new() -> Self {
        Self {
            inner: ExponentialBackoff::default(),
        }
    }

    pub fn with_initial_delay<V: Into<Duration>>(mut self, v: V) -> Self {
        self.inner.initial_delay = v.into();
        self
    }

    pub fn with_maximum_delay<V: Into<Duration>>(mut self, v: V) -> Self {
        self.inner.maximum_delay = v.into();
        self
    }

    pub fn with_scaling<V: Into<f64>>(mut self, v: V) -> Self {
        self.inner.scaling = v.into();
        self
    }

    /// Validates the parameters.
    ///
    /// The initial delay must be positive and no larger than the maximum
    /// delay. The scaling factor must be at least `1.0`.
    pub fn build(self) -> Result<ExponentialBackoff, Error> {
        let ExponentialBackoff {
            initial_delay,
            maximum_delay,
            scaling,
        } = self.inner;
        if scaling.is_nan() || scaling < 1.0 {
            return Err(Error::InvalidScalingFactor(scaling));
        }
        if initial_delay.is_zero() {
            return Err(Error::InvalidInitialDelay(initial_delay));
        }
        if maximum_delay < initial_delay {
            return Err(Error::EmptyRange {
                maximum: maximum_delay,
                initial: initial_delay,
            });
        }
        Ok(self.inner)
    }

    /// Forces the parameters into a usable range, instead of failing.
    ///
    /// The maximum delay is clamped to `[1s, 24h]`, then the initial delay to
    /// `[1ms, maximum delay]`, and the scaling factor to `[1.0, 32.0]`.
    pub fn clamp(self) -> ExponentialBackoff {
        let ExponentialBackoff {
            initial_delay,
            maximum_delay,
            scaling,
        } = self.inner;
        let maximum_delay =
            maximum_delay.clamp(Duration::from_secs(1), Duration::from_secs(24 * 60 * 60));
        let scaling = if scaling.is_nan() {
            DEFAULT_SCALING
        } else {
            scaling.clamp(1.0, 32.0)
        };
        ExponentialBackoff {
            initial_delay: initial_delay.clamp(Duration::from_millis(1), maximum_delay),
            maximum_delay,
            scaling,
        }
    }
}

impl Default for ExponentialBackoffBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A [PollingBackoffPolicy][crate::polling_backoff_policy::PollingBackoffPolicy]
/// with exponentially growing wait periods.
///
/// Attempt `n` (starting at 1) waits `initial_delay * scaling^(n - 1)`,
/// truncated at `maximum_delay`. Create instances with
/// [ExponentialBackoffBuilder].
#[derive(Clone, Debug, PartialEq)]
pub struct ExponentialBackoff {
    initial_delay: Duration,
    maximum_delay: Duration,
    scaling: f64,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            initial_delay: DEFAULT_INITIAL_DELAY,
            maximum_delay: DEFAULT_MAXIMUM_DELAY,
            scaling: DEFAULT_SCALING,
        }
    }
}

impl crate::polling_backoff_policy::PollingBackoffPolicy for ExponentialBackoff {
    fn wait_period(&self, state: &PollingState) -> Duration {
        let ceiling = self.maximum_delay.as_secs_f64();
        let exponent = i32::try_from(state.attempt_count.saturating_sub(1)).unwrap_or(i32::MAX);
        let secs = self.initial_delay.as_secs_f64() * self.scaling.powi(exponent);
        // `secs` may be infinite for large attempt counts.
        if secs >= ceiling {
            return self.maximum_delay;
        }
        Duration::try_from_secs_f64(secs).unwrap_or(self.maximum_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polling_backoff_policy::PollingBackoffPolicy;
    use test_case::test_case;

    fn wait(backoff: &ExponentialBackoff, attempt_count: u32) -> Duration {
        backoff.wait_period(&PollingState::default().set_attempt_count(attempt_count))
    }

    #[test]
    fn build_errors() {
        let got = ExponentialBackoffBuilder::new()
            .with_initial_delay(Duration::ZERO)
            .build();
        assert_eq!(got, Err(Error::InvalidInitialDelay(Duration::ZERO)));

        let got = ExponentialBackoffBuilder::new()
            .with_initial_delay(Duration::from_secs(10))
            .with_maximum_delay(Duration::from_secs(5))
            .build();
        assert!(matches!(got, Err(Error::EmptyRange { .. })), "{got:?}");

        let got = ExponentialBackoffBuilder::new().with_scaling(0.5).build();
        assert_eq!(got, Err(Error::InvalidScalingFactor(0.5)));

        let got = ExponentialBackoffBuilder::new().with_scaling(f64::NAN).build();
        assert!(
            matches!(got, Err(Error::InvalidScalingFactor(_))),
            "{got:?}"
        );
    }

    #[test]
    fn build_constant() -> anyhow::Result<()> {
        let backoff = ExponentialBackoffBuilder::new()
            .with_initial_delay(Duration::from_secs(3))
            .with_maximum_delay(Duration::from_secs(3))
            .with_scaling(1.0)
            .build()?;
        assert_eq!(wait(&backoff, 1), Duration::from_secs(3));
        assert_eq!(wait(&backoff, 100), Duration::from_secs(3));
        Ok(())
    }

    #[test]
    fn clamp() {
        let got = ExponentialBackoffBuilder::new()
            .with_initial_delay(Duration::ZERO)
            .with_maximum_delay(Duration::from_secs(7 * 24 * 60 * 60))
            .with_scaling(1024.0)
            .clamp();
        assert_eq!(got.initial_delay, Duration::from_millis(1));
        assert_eq!(got.maximum_delay, Duration::from_secs(24 * 60 * 60));
        assert_eq!(got.scaling, 32.0);

        let got = ExponentialBackoffBuilder::new()
            .with_initial_delay(Duration::from_secs(30))
            .with_maximum_delay(Duration::ZERO)
            .with_scaling(f64::NAN)
            .clamp();
        assert_eq!(got.initial_delay, Duration::from_secs(1));
        assert_eq!(got.maximum_delay, Duration::from_secs(1));
        assert_eq!(got.scaling, DEFAULT_SCALING);
    }

    #[test_case(0, Duration::from_secs(1))]
    #[test_case(1, Duration::from_secs(1))]
    #[test_case(2, Duration::from_secs(2))]
    #[test_case(3, Duration::from_secs(4))]
    #[test_case(4, Duration::from_secs(5))]
    #[test_case(u32::MAX, Duration::from_secs(5))]
    fn truncated(attempt_count: u32, want: Duration) -> anyhow::Result<()> {
        let backoff = ExponentialBackoffBuilder::new()
            .with_maximum_delay(Duration::from_secs(5))
            .build()?;
        assert_eq!(wait(&backoff, attempt_count), want);
        Ok(())
    }

    #[test]
    fn default() {
        let backoff = ExponentialBackoff::default();
        assert_eq!(wait(&backoff, 1), Duration::from_secs(1));
        assert_eq!(wait(&backoff, 6), Duration::from_secs(32));
        assert_eq!(wait(&backoff, 7), Duration::from_secs(60));
    }
}
