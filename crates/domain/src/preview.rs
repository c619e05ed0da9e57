//! Upcoming-schedule preview — absolute trigger times for a live schedule.
//!
//! Computes, for "now", when the next node fires and the absolute
//! activation time of every node in today's bucket (times already past
//! today roll to tomorrow).

use chrono::{Datelike, Duration};
use serde::{Deserialize, Serialize};

use crate::node::Node;
use crate::schedule::{self, Bucket, NodeTime, ScheduleMode, ScheduleSet};
use crate::time::Timestamp;

/// One node with its absolute activation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewEntry {
    pub at: Timestamp,
    pub node: Node,
}

/// When the schedule fires next, and the full upcoming slate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulePreview {
    /// Absolute time of the next transition, `None` for empty schedules.
    pub next_trigger: Option<Timestamp>,
    /// Index of the next node within the (time-sorted) bucket list.
    pub next_slot: Option<usize>,
    /// All of today's nodes with absolute times, soonest first.
    pub entries: Vec<PreviewEntry>,
}

impl SchedulePreview {
    fn empty() -> Self {
        Self {
            next_trigger: None,
            next_slot: None,
            entries: Vec::new(),
        }
    }
}

/// Build the preview for a live schedule at `now`.
#[must_use]
pub fn preview(set: &ScheduleSet, mode: ScheduleMode, now: Timestamp) -> SchedulePreview {
    let day = now.weekday().into();
    let nodes = set.nodes_for(Bucket::for_day(mode, day));
    if nodes.is_empty() {
        return SchedulePreview::empty();
    }

    let mut sorted: Vec<&Node> = nodes.iter().collect();
    sorted.sort_by_key(|n| n.time);

    let at = NodeTime::from_naive(now.time());
    let next_slot = sorted.iter().position(|n| n.time > at).unwrap_or(0);
    let next = schedule::next_node(nodes, at);
    let next_trigger = next.map(|n| absolute(now, n.time));

    let entries = sorted
        .into_iter()
        .map(|n| PreviewEntry {
            at: absolute(now, n.time),
            node: n.clone(),
        })
        .collect();

    SchedulePreview {
        next_trigger,
        next_slot: Some(next_slot),
        entries,
    }
}

/// Today's date at `time`, rolled to tomorrow when already past.
fn absolute(now: Timestamp, time: NodeTime) -> Timestamp {
    let candidate = now.date().and_time(time.to_naive());
    if candidate <= now {
        candidate + Duration::days(1)
    } else {
        candidate
    }
}
