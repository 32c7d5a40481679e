//! Deadlines used to order queued events.

use std::time::{Duration, Instant};

/// Smallest step used to keep synthetic deadlines strictly increasing.
pub const TICK: Duration = Duration::from_nanos(1);

/// When an event becomes eligible for delivery.
///
/// Urgent events carry a sequence number instead of a clock reading. Variant
/// order matters: every `Immediate` sorts before every `Scheduled`, and
/// `Immediate` values order by sequence, so urgent events are delivered first
/// and in submission order. `Never` sorts last and is never due; it stands in
/// for deadlines past the range of [`Instant`].
///
/// ```
/// use prometheus_timer_queue::Deadline;
/// use std::time::Instant;
///
/// let now = Instant::now();
/// assert!(Deadline::Immediate(u64::MAX) < Deadline::Scheduled(now));
/// assert!(Deadline::Immediate(0) < Deadline::Immediate(1));
/// assert!(Deadline::Scheduled(now) < Deadline::Never);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Deadline {
    /// Deliver ahead of any clock deadline; the value is the urgent sequence number.
    Immediate(u64),
    /// Deliver once the clock reaches this instant.
    Scheduled(Instant),
    /// Too far in the future to represent; never delivered by deadline.
    Never,
}

impl Deadline {
    /// `base + delay`, or [`Deadline::Never`] if that overflows [`Instant`].
    #[must_use]
    pub fn after(base: Instant, delay: Duration) -> Self {
        base.checked_add(delay).map_or(Self::Never, Self::Scheduled)
    }

    /// Whether an event with this deadline may be delivered at `now`.
    #[must_use]
    pub fn is_due(&self, now: Instant) -> bool {
        match self {
            Self::Immediate(_) => true,
            Self::Scheduled(at) => now >= *at,
            Self::Never => false,
        }
    }

    /// The clock instant for scheduled deadlines, `None` otherwise.
    #[must_use]
    pub const fn instant(&self) -> Option<Instant> {
        match self {
            Self::Scheduled(at) => Some(*at),
            Self::Immediate(_) | Self::Never => None,
        }
    }
}

impl From<Instant> for Deadline {
    fn from(at: Instant) -> Self {
        Self::Scheduled(at)
    }
}
