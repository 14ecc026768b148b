//! Daily schedule arithmetic and the per-instance jitter that staggers it.
//!
//! All instants are computed in UTC. Rotation is wall-clock-driven only:
//! the daily `(hour, minute)` instant is the sole trigger, there is no
//! size- or filename-based policy.

use std::convert::TryFrom;
use std::time::Duration as StdDuration;

use time::{Duration, OffsetDateTime, Time};

/// Offsets handed out to co-located appenders fall in `[0, 10 min)`.
const JITTER_RANGE_MS: u64 = 10 * 60 * 1000;
/// Spacing between consecutive instances' offsets.
const JITTER_STEP_MS: u64 = 31_000;

/// The daily instant, in UTC, at which rotation fires.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) struct Schedule {
    hour: u8,
    minute: u8,
}

impl Schedule {
    /// Hour and minute are range-checked at configuration time.
    pub(crate) fn new(hour: u8, minute: u8) -> Self {
        Schedule { hour, minute }
    }

    fn at(&self, day: OffsetDateTime) -> OffsetDateTime {
        let time = Time::from_hms(self.hour, self.minute, 0)
            .expect("invalid roll time; this is a bug in tracing-rolling");
        day.replace_time(time)
    }

    /// The most recent daily instant at or before `now`.
    ///
    /// An active file last modified before this instant missed a rotation
    /// while the process was down.
    pub(crate) fn previous_instant(&self, now: OffsetDateTime) -> OffsetDateTime {
        let at = self.at(now);
        if at > now {
            at - Duration::days(1)
        } else {
            at
        }
    }

    /// The next daily instant strictly after `now`.
    ///
    /// Clock skew, DST, or startup racing the boundary can make today's
    /// instant land exactly on `now`; a day is added in that case so
    /// rotation never fires immediately on startup due to rounding.
    pub(crate) fn next_instant(&self, now: OffsetDateTime) -> OffsetDateTime {
        let at = self.at(now);
        if at <= now {
            at + Duration::days(1)
        } else {
            at
        }
    }
}

/// Derives the jitter offset for the `seq`-th appender built in a process.
///
/// Pure: the same sequence number always maps to the same offset, and
/// consecutive sequence numbers map to distinct offsets until the range
/// wraps. This is a statistical mitigation against co-located appenders
/// rotating at the exact same moment, not a guarantee.
pub(crate) fn jitter_for(seq: u64) -> StdDuration {
    StdDuration::from_millis(seq.wrapping_mul(JITTER_STEP_MS) % JITTER_RANGE_MS)
}

/// Non-negative duration from `now` until `target`; zero if `target`
/// already passed.
pub(crate) fn delay_until(target: OffsetDateTime, now: OffsetDateTime) -> StdDuration {
    StdDuration::try_from(target - now).unwrap_or(StdDuration::ZERO)
}
