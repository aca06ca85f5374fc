// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rate-limit detection for protocol errors.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use autofilter_core::traits::protocol::ProtocolError;

/// Marker carried by every rate-limit error.
pub const FLOOD_WAIT_MARKER: &str = "FLOOD_WAIT";

static WAIT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"wait of (\d+) seconds").expect("wait pattern is valid"));

/// How a failed history fetch should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchFailure {
    /// Sleep and retry the same batch. `wait` is `None` when the error did not
    /// say how long.
    FloodWait { wait: Option<Duration> },
    /// Stop the run.
    Fatal,
}

/// Sorts a protocol error into a rate-limit signal or a fatal failure.
pub fn classify_fetch_error(err: &ProtocolError) -> FetchFailure {
    let text = err.message.as_str();
    let wait = parse_wait(text);
    if text.contains(FLOOD_WAIT_MARKER) || wait.is_some() {
        FetchFailure::FloodWait { wait }
    } else {
        FetchFailure::Fatal
    }
}

/// Extracts the mandated wait from text like `"A wait of 17 seconds is required"`.
pub fn parse_wait(text: &str) -> Option<Duration> {
    let caps = WAIT_PATTERN.captures(text)?;
    caps.get(1)?.as_str().parse::<u64>().ok().map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flood_wait_seconds() {
        let err = ProtocolError::new("rpc error code 420: FLOOD_WAIT_X (caused by channels.getMessages): A wait of 17 seconds is required");
        assert_eq!(
            classify_fetch_error(&err),
            FetchFailure::FloodWait {
                wait: Some(Duration::from_secs(17))
            }
        );
    }

    #[test]
    fn flood_wait_without_duration_is_still_a_rate_limit() {
        let err = ProtocolError::new("FLOOD_WAIT_X");
        assert_eq!(
            classify_fetch_error(&err),
            FetchFailure::FloodWait { wait: None }
        );
    }

    #[test]
    fn other_errors_are_fatal() {
        let err = ProtocolError::new("CHANNEL_PRIVATE: the channel is private");
        assert_eq!(classify_fetch_error(&err), FetchFailure::Fatal);
    }

    #[test]
    fn parse_wait_ignores_overflow() {
        assert_eq!(parse_wait("a wait of 99999999999999999999999 seconds"), None);
        assert_eq!(parse_wait("a wait of 0 seconds"), Some(Duration::ZERO));
    }
}
