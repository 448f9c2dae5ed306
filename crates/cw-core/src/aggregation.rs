//! Duration aggregation over irregular state-change events.
//!
//! Sensors report their state whenever they publish, not on a fixed clock, so
//! time-in-state is derived from the gaps between consecutive events.
//!
//! # Algorithm Summary
//!
//! 1. Order events by their own timestamp (stable, so ties keep input order)
//! 2. For each consecutive pair `(e[i], e[i + 1])`, credit `e[i + 1] - e[i]`
//!    when the predicate holds for `e[i]`
//! 3. The interval after the last event is never credited
//!
//! Bucketed summaries group events by local hour-of-day first and run the same
//! pairwise sum inside each group. A state that spans a bucket boundary is not
//! credited to either side of the boundary; summaries rely on that behavior.

use chrono::{DateTime, Duration, TimeZone, Timelike, Utc};
use serde::Serialize;

/// Number of buckets in a daily graph.
pub const GRAPH_BUCKETS: usize = 8;

/// Width of one graph bucket in hours.
pub const HOURS_PER_BUCKET: u32 = 3;

/// An hour counts as occupied when its active time exceeds this many seconds.
pub const OCCUPIED_HOUR_SECS: i64 = 1800;

const HOURS_PER_DAY: usize = 24;
const HOURS_PER_HALF_DAY: usize = 12;

/// An event that can be placed on a timeline.
///
/// This trait allows aggregation to work with different event representations
/// (e.g., rows read from the store, or test fixtures).
pub trait TimedEvent {
    /// Returns when the event was recorded.
    fn timestamp(&self) -> DateTime<Utc>;
}

/// Total time a predicate held, truncated to whole seconds and minutes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DurationTotal {
    pub seconds: i64,
    pub minutes: i64,
}

impl DurationTotal {
    pub const ZERO: Self = Self {
        seconds: 0,
        minutes: 0,
    };

    fn from_duration(duration: Duration) -> Self {
        Self {
            seconds: duration.num_seconds(),
            minutes: duration.num_minutes(),
        }
    }
}

/// Per-hour occupancy for one day, split at noon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HourlyGrid {
    /// Hours 0 through 11.
    pub am: [bool; HOURS_PER_HALF_DAY],
    /// Hours 12 through 23.
    pub pm: [bool; HOURS_PER_HALF_DAY],
}

/// Computes how long `predicate` held across `events`.
///
/// Each event's state lasts until the next event. Sequences with fewer than
/// two events yield zero.
pub fn total_duration<E, P>(events: &[E], predicate: P) -> DurationTotal
where
    E: TimedEvent,
    P: Fn(&E) -> bool,
{
    let ordered = chronological(events);
    sum_active(&ordered, &predicate)
}

/// Computes active time per 3-hour bucket of the local day.
///
/// Buckets without events are `None`. A bucket with a single event is
/// `Some(DurationTotal::ZERO)`.
pub fn bucket_graph<E, P, Tz>(
    events: &[E],
    predicate: P,
    tz: &Tz,
) -> [Option<DurationTotal>; GRAPH_BUCKETS]
where
    E: TimedEvent,
    P: Fn(&E) -> bool,
    Tz: TimeZone,
{
    let ordered = chronological(events);
    let groups: [Vec<&E>; GRAPH_BUCKETS] = group_by_local_hour(&ordered, tz, HOURS_PER_BUCKET);
    groups.map(|group| (!group.is_empty()).then(|| sum_active(&group, &predicate)))
}

/// Marks each local hour whose active time exceeds [`OCCUPIED_HOUR_SECS`].
pub fn hourly_grid<E, P, Tz>(events: &[E], predicate: P, tz: &Tz) -> HourlyGrid
where
    E: TimedEvent,
    P: Fn(&E) -> bool,
    Tz: TimeZone,
{
    let ordered = chronological(events);
    let groups: [Vec<&E>; HOURS_PER_DAY] = group_by_local_hour(&ordered, tz, 1);
    let occupied = groups.map(|group| sum_active(&group, &predicate).seconds > OCCUPIED_HOUR_SECS);

    HourlyGrid {
        am: std::array::from_fn(|hour| occupied[hour]),
        pm: std::array::from_fn(|hour| occupied[hour + HOURS_PER_HALF_DAY]),
    }
}

fn chronological<E: TimedEvent>(events: &[E]) -> Vec<&E> {
    let mut ordered: Vec<&E> = events.iter().collect();
    ordered.sort_by_key(|event| event.timestamp());
    ordered
}

fn sum_active<E, P>(ordered: &[&E], predicate: &P) -> DurationTotal
where
    E: TimedEvent,
    P: Fn(&E) -> bool,
{
    if ordered.len() <= 1 {
        return DurationTotal::ZERO;
    }

    let active = ordered
        .windows(2)
        .filter(|pair| predicate(pair[0]))
        .map(|pair| pair[1].timestamp() - pair[0].timestamp())
        .fold(Duration::zero(), |total, gap| total + gap);

    DurationTotal::from_duration(active)
}

/// Splits ordered events into `N` groups of `hours_per_group` local hours each.
fn group_by_local_hour<'a, E, Tz, const N: usize>(
    ordered: &[&'a E],
    tz: &Tz,
    hours_per_group: u32,
) -> [Vec<&'a E>; N]
where
    E: TimedEvent,
    Tz: TimeZone,
{
    let mut groups: [Vec<&E>; N] = std::array::from_fn(|_| Vec::new());
    for &event in ordered {
        let hour = event.timestamp().with_timezone(tz).hour();
        let index = usize::try_from(hour / hours_per_group).unwrap_or(N);
        if let Some(group) = groups.get_mut(index) {
            group.push(event);
        }
    }
    groups
}
