//! Sink response classification.
//!
//! The classifier is the entire retry policy: a fixed mapping from sink
//! status codes to scheduling actions, with no exponential backoff and no
//! retry ceiling. Adapters report raw responses only; this is the single
//! place where retry decisions are made.

use crate::target::SinkResponse;

/// Per-attempt outcome driving the driver's next action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Write acknowledged: delete-or-advance, then re-loop immediately.
    Success,

    /// Version/uniqueness conflict: the target already reflects the intent,
    /// so this is treated exactly like [`Outcome::Success`].
    Conflict,

    /// Rate limit exceeded: retry the full cycle after a fixed cooldown,
    /// with no cursor movement.
    Throttled,

    /// Request body over the sink's size limit: permanent for this row.
    /// The cursor advances past it without writing or deleting.
    PayloadTooLarge,

    /// Source returned an empty result set: retry after the long cooldown.
    NoRowsAvailable,

    /// Anything else: log and terminate with a non-zero status.
    Fatal,
}

/// Map an upsert response to an outcome.
///
/// 200 (replaced) and 201 (created) are both confirmed writes. 409 is the
/// conflict case the target raises for unique-key violations even under
/// upsert semantics. [`Outcome::NoRowsAvailable`] is never produced here;
/// the driver derives it from an empty fetch before any upsert happens.
pub fn classify(response: &SinkResponse) -> Outcome {
    match response.status {
        200 | 201 => Outcome::Success,
        409 => Outcome::Conflict,
        413 => Outcome::PayloadTooLarge,
        429 => Outcome::Throttled,
        _ => Outcome::Fatal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16) -> SinkResponse {
        SinkResponse {
            status,
            body: String::new(),
            request_charge: None,
        }
    }

    #[test]
    fn test_acknowledged_writes_are_success() {
        assert_eq!(classify(&response(200)), Outcome::Success);
        assert_eq!(classify(&response(201)), Outcome::Success);
    }

    #[test]
    fn test_conflict_is_its_own_outcome() {
        assert_eq!(classify(&response(409)), Outcome::Conflict);
    }

    #[test]
    fn test_rate_limit_throttles() {
        assert_eq!(classify(&response(429)), Outcome::Throttled);
    }

    #[test]
    fn test_oversized_payload_is_permanent_skip() {
        assert_eq!(classify(&response(413)), Outcome::PayloadTooLarge);
    }

    #[test]
    fn test_unhandled_statuses_are_fatal() {
        for status in [400, 401, 403, 404, 408, 500, 503] {
            assert_eq!(classify(&response(status)), Outcome::Fatal, "status {}", status);
        }
    }
}
