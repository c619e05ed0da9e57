//! Schedules — day buckets, node lists, and the pure resolver.
//!
//! A schedule maps a *bucket* (a day-grouping key) to a list of
//! [`Node`]s. Which bucket governs a given calendar day depends on the
//! [`ScheduleMode`]:
//!
//! - `all_days` — one list for every day
//! - `5/2` — one list for Mon–Fri, one for Sat–Sun
//! - `individual` — one list per weekday
//!
//! The resolver is a set of pure functions: given a node list and a
//! wall-clock time it finds the active node (the last node at or before
//! that time, wrapping to yesterday's final node when the time precedes
//! every entry) and the next node (the first node after that time,
//! wrapping to tomorrow's first).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::node::Node;

/// A wall-clock time of day with minute precision, rendered as `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeTime(u16);

impl NodeTime {
    /// Midnight.
    pub const MIDNIGHT: Self = Self(0);

    /// Build from hours and minutes.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::BadTime`] when out of the
    /// `00:00..=23:59` range.
    pub fn new(hour: u16, minute: u16) -> Result<Self, ValidationError> {
        if hour > 23 || minute > 59 {
            return Err(ValidationError::BadTime(format!("{hour:02}:{minute:02}")));
        }
        Ok(Self(hour * 60 + minute))
    }

    /// Minutes since midnight.
    #[must_use]
    pub fn as_minutes(self) -> u16 {
        self.0
    }

    /// Hour component.
    #[must_use]
    pub fn hour(self) -> u16 {
        self.0 / 60
    }

    /// Minute component.
    #[must_use]
    pub fn minute(self) -> u16 {
        self.0 % 60
    }

    /// Convert to a [`chrono::NaiveTime`] (seconds zeroed).
    #[must_use]
    pub fn to_naive(self) -> chrono::NaiveTime {
        chrono::NaiveTime::from_hms_opt(u32::from(self.hour()), u32::from(self.minute()), 0)
            .unwrap_or_default()
    }

    /// Truncate a [`chrono::NaiveTime`] to minute precision.
    #[must_use]
    pub fn from_naive(t: chrono::NaiveTime) -> Self {
        use chrono::Timelike;
        Self((t.hour() * 60 + t.minute()) as u16)
    }
}

impl fmt::Display for NodeTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for NodeTime {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ValidationError::BadTime(s.to_string());
        let (h, m) = s.split_once(':').ok_or_else(bad)?;
        let hour: u16 = h.parse().map_err(|_| bad())?;
        let minute: u16 = m.parse().map_err(|_| bad())?;
        Self::new(hour, minute).map_err(|_| bad())
    }
}

impl TryFrom<String> for NodeTime {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<NodeTime> for String {
    fn from(t: NodeTime) -> Self {
        t.to_string()
    }
}

/// Day of the week, rendered as `mon`..`sun`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl DayOfWeek {
    /// All seven days, Monday first.
    pub const ALL: [Self; 7] = [
        Self::Mon,
        Self::Tue,
        Self::Wed,
        Self::Thu,
        Self::Fri,
        Self::Sat,
        Self::Sun,
    ];

    /// The previous calendar day.
    #[must_use]
    pub fn prev(self) -> Self {
        match self {
            Self::Mon => Self::Sun,
            Self::Tue => Self::Mon,
            Self::Wed => Self::Tue,
            Self::Thu => Self::Wed,
            Self::Fri => Self::Thu,
            Self::Sat => Self::Fri,
            Self::Sun => Self::Sat,
        }
    }

    /// Whether this day falls in the Mon–Fri block.
    #[must_use]
    pub fn is_weekday(self) -> bool {
        !matches!(self, Self::Sat | Self::Sun)
    }

    /// Short lowercase label (`mon`..`sun`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mon => "mon",
            Self::Tue => "tue",
            Self::Wed => "wed",
            Self::Thu => "thu",
            Self::Fri => "fri",
            Self::Sat => "sat",
            Self::Sun => "sun",
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<chrono::Weekday> for DayOfWeek {
    fn from(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Self::Mon,
            chrono::Weekday::Tue => Self::Tue,
            chrono::Weekday::Wed => Self::Wed,
            chrono::Weekday::Thu => Self::Thu,
            chrono::Weekday::Fri => Self::Fri,
            chrono::Weekday::Sat => Self::Sat,
            chrono::Weekday::Sun => Self::Sun,
        }
    }
}

impl FromStr for DayOfWeek {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| ValidationError::BadDayKey(s.to_string()))
    }
}

/// How a group's schedule varies across the week.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleMode {
    /// One node list applies every day.
    #[default]
    #[serde(rename = "all_days")]
    AllDays,
    /// Separate weekday and weekend lists.
    #[serde(rename = "5/2")]
    FiveTwo,
    /// One node list per weekday.
    #[serde(rename = "individual")]
    Individual,
}

/// The day-grouping key selecting which node list governs a calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Bucket {
    AllDays,
    Weekday,
    Weekend,
    Day(DayOfWeek),
}

impl Bucket {
    /// Resolve the bucket a `mode`/`day` pair consults.
    #[must_use]
    pub fn for_day(mode: ScheduleMode, day: DayOfWeek) -> Self {
        match mode {
            ScheduleMode::AllDays => Self::AllDays,
            ScheduleMode::FiveTwo => {
                if day.is_weekday() {
                    Self::Weekday
                } else {
                    Self::Weekend
                }
            }
            ScheduleMode::Individual => Self::Day(day),
        }
    }

    /// The buckets a mode consults; anything else in a
    /// [`ScheduleSet`] is leftover from a mode switch and ignored.
    #[must_use]
    pub fn is_used_by(self, mode: ScheduleMode) -> bool {
        match mode {
            ScheduleMode::AllDays => self == Self::AllDays,
            ScheduleMode::FiveTwo => matches!(self, Self::Weekday | Self::Weekend),
            ScheduleMode::Individual => matches!(self, Self::Day(_)),
        }
    }

    /// String key used in the persisted document.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AllDays => "all_days",
            Self::Weekday => "weekday",
            Self::Weekend => "weekend",
            Self::Day(d) => d.as_str(),
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Bucket {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all_days" => Ok(Self::AllDays),
            "weekday" => Ok(Self::Weekday),
            "weekend" => Ok(Self::Weekend),
            other => other.parse::<DayOfWeek>().map(Self::Day),
        }
    }
}

impl TryFrom<String> for Bucket {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Bucket> for String {
    fn from(b: Bucket) -> Self {
        b.as_str().to_string()
    }
}

/// Node lists keyed by bucket.
///
/// Buckets not used by the live mode may linger after a mode switch; they
/// are kept (switching back restores them) but never consulted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScheduleSet {
    buckets: BTreeMap<Bucket, Vec<Node>>,
}

impl ScheduleSet {
    /// An empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set with a single populated bucket.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DuplicateTime`] when two nodes share a time.
    pub fn with_bucket(bucket: Bucket, nodes: Vec<Node>) -> Result<Self, ValidationError> {
        let mut set = Self::new();
        set.set_nodes(bucket, nodes)?;
        Ok(set)
    }

    /// Replace the node list for one bucket, sorting it by time.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DuplicateTime`] when two nodes share a time.
    pub fn set_nodes(&mut self, bucket: Bucket, mut nodes: Vec<Node>) -> Result<(), ValidationError> {
        nodes.sort_by_key(|n| n.time);
        for pair in nodes.windows(2) {
            if pair[0].time == pair[1].time {
                return Err(ValidationError::DuplicateTime(pair[0].time));
            }
        }
        self.buckets.insert(bucket, nodes);
        Ok(())
    }

    /// The (time-sorted) node list for a bucket, empty when absent.
    #[must_use]
    pub fn nodes_for(&self, bucket: Bucket) -> &[Node] {
        self.buckets.get(&bucket).map_or(&[], Vec::as_slice)
    }

    /// Remove one bucket's node list.
    pub fn clear_bucket(&mut self, bucket: Bucket) {
        self.buckets.remove(&bucket);
    }

    /// Iterate all stored buckets, including ones the live mode ignores.
    pub fn iter(&self) -> impl Iterator<Item = (Bucket, &[Node])> {
        self.buckets.iter().map(|(b, n)| (*b, n.as_slice()))
    }

    /// Whether no bucket holds any node.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.values().all(Vec::is_empty)
    }
}

/// The node governing `at`: the last node whose time is `<= at`.
///
/// When `at` precedes every node, the schedule is treated as continuing to
/// hold the previous day's final value, so the *last* node wins. Empty
/// list yields `None`.
#[must_use]
pub fn active_node(nodes: &[Node], at: NodeTime) -> Option<&Node> {
    let mut sorted: Vec<&Node> = nodes.iter().collect();
    sorted.sort_by_key(|n| n.time);
    sorted
        .iter()
        .rev()
        .find(|n| n.time <= at)
        .or_else(|| sorted.last())
        .copied()
}

/// The first node strictly after `at`, wrapping to the first node of the
/// (next-day) list when none remains today. Empty list yields `None`.
#[must_use]
pub fn next_node(nodes: &[Node], at: NodeTime) -> Option<&Node> {
    let mut sorted: Vec<&Node> = nodes.iter().collect();
    sorted.sort_by_key(|n| n.time);
    sorted
        .iter()
        .find(|n| n.time > at)
        .or_else(|| sorted.first())
        .copied()
}

/// Resolve the active node for a full `mode`/`day`/`time` query, applying
/// cross-day carryover.
///
/// `all_days` schedules are implicitly continuous at midnight, so the
/// plain wrap-around in [`active_node`] suffices. In `5/2` and
/// `individual` modes, yesterday may be governed by a *different* bucket:
/// when `at` precedes today's first node (or today's bucket is empty),
/// yesterday's bucket donates its final node as a synthetic `00:00` entry
/// before the normal search runs.
#[must_use]
pub fn resolve_active(
    set: &ScheduleSet,
    mode: ScheduleMode,
    day: DayOfWeek,
    at: NodeTime,
) -> Option<Node> {
    let today = set.nodes_for(Bucket::for_day(mode, day));

    if mode != ScheduleMode::AllDays {
        let precedes_all = today
            .iter()
            .map(|n| n.time)
            .min()
            .is_none_or(|first| at < first);
        if precedes_all {
            if let Some(carry) = carryover_node(set, mode, day) {
                let mut nodes: Vec<Node> = Vec::with_capacity(today.len() + 1);
                nodes.push(carry);
                nodes.extend(today.iter().cloned());
                return active_node(&nodes, at).cloned();
            }
        }
    }

    active_node(today, at).cloned()
}

/// Resolve the next node for a `mode`/`day`/`time` query.
#[must_use]
pub fn resolve_next(
    set: &ScheduleSet,
    mode: ScheduleMode,
    day: DayOfWeek,
    at: NodeTime,
) -> Option<Node> {
    next_node(set.nodes_for(Bucket::for_day(mode, day)), at).cloned()
}

/// Yesterday's final node with its time forced to `00:00`, or `None` when
/// yesterday's bucket is empty too.
fn carryover_node(set: &ScheduleSet, mode: ScheduleMode, day: DayOfWeek) -> Option<Node> {
    let prev_bucket = Bucket::for_day(mode, day.prev());
    let nodes = set.nodes_for(prev_bucket);
    let last = nodes.iter().max_by_key(|n| n.time)?;
    let mut carry = last.clone();
    carry.time = NodeTime::MIDNIGHT;
    Some(carry)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> NodeTime {
        s.parse().unwrap()
    }

    fn node(time: &str, temp: f64) -> Node {
        Node::at(t(time), temp)
    }

    // ── NodeTime ───────────────────────────────────────────────────

    #[test]
    fn should_parse_and_render_node_time() {
        let time = t("07:30");
        assert_eq!(time.hour(), 7);
        assert_eq!(time.minute(), 30);
        assert_eq!(time.to_string(), "07:30");
    }

    #[test]
    fn should_reject_out_of_range_times() {
        assert!("24:00".parse::<NodeTime>().is_err());
        assert!("12:60".parse::<NodeTime>().is_err());
        assert!("noon".parse::<NodeTime>().is_err());
        assert!("12".parse::<NodeTime>().is_err());
    }

    #[test]
    fn should_serialize_node_time_as_hh_mm_string() {
        let json = serde_json::to_string(&t("06:05")).unwrap();
        assert_eq!(json, "\"06:05\"");
        let back: NodeTime = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t("06:05"));
    }

    // ── Buckets ────────────────────────────────────────────────────

    #[test]
    fn should_map_mode_and_day_to_bucket() {
        assert_eq!(
            Bucket::for_day(ScheduleMode::AllDays, DayOfWeek::Wed),
            Bucket::AllDays
        );
        assert_eq!(
            Bucket::for_day(ScheduleMode::FiveTwo, DayOfWeek::Fri),
            Bucket::Weekday
        );
        assert_eq!(
            Bucket::for_day(ScheduleMode::FiveTwo, DayOfWeek::Sat),
            Bucket::Weekend
        );
        assert_eq!(
            Bucket::for_day(ScheduleMode::Individual, DayOfWeek::Tue),
            Bucket::Day(DayOfWeek::Tue)
        );
    }

    #[test]
    fn should_parse_bucket_keys() {
        assert_eq!("all_days".parse::<Bucket>().unwrap(), Bucket::AllDays);
        assert_eq!("weekend".parse::<Bucket>().unwrap(), Bucket::Weekend);
        assert_eq!(
            "thu".parse::<Bucket>().unwrap(),
            Bucket::Day(DayOfWeek::Thu)
        );
        assert!("someday".parse::<Bucket>().is_err());
    }

    #[test]
    fn should_serialize_schedule_mode_labels() {
        assert_eq!(
            serde_json::to_string(&ScheduleMode::FiveTwo).unwrap(),
            "\"5/2\""
        );
        assert_eq!(
            serde_json::from_str::<ScheduleMode>("\"individual\"").unwrap(),
            ScheduleMode::Individual
        );
    }

    #[test]
    fn should_reject_duplicate_node_times() {
        let mut set = ScheduleSet::new();
        let result = set.set_nodes(
            Bucket::AllDays,
            vec![node("07:00", 21.0), node("07:00", 18.0)],
        );
        assert!(matches!(result, Err(ValidationError::DuplicateTime(_))));
    }

    // ── active_node / next_node ────────────────────────────────────

    #[test]
    fn should_pick_last_node_at_or_before_clock_time() {
        let nodes = vec![node("07:00", 21.0), node("23:00", 18.0)];
        let active = active_node(&nodes, t("12:00")).unwrap();
        assert_eq!(active.time, t("07:00"));
    }

    #[test]
    fn should_treat_exact_match_as_active() {
        let nodes = vec![node("07:00", 21.0), node("23:00", 18.0)];
        let active = active_node(&nodes, t("23:00")).unwrap();
        assert_eq!(active.time, t("23:00"));
    }

    #[test]
    fn should_wrap_to_last_node_before_first_entry() {
        let nodes = vec![node("07:00", 21.0), node("23:00", 18.0)];
        let active = active_node(&nodes, t("03:00")).unwrap();
        assert_eq!(active.time, t("23:00"));
    }

    #[test]
    fn should_resolve_single_node_list_at_any_time() {
        let nodes = vec![node("08:00", 20.0)];
        assert_eq!(active_node(&nodes, t("00:00")).unwrap().time, t("08:00"));
        assert_eq!(active_node(&nodes, t("08:00")).unwrap().time, t("08:00"));
        assert_eq!(active_node(&nodes, t("23:59")).unwrap().time, t("08:00"));
    }

    #[test]
    fn should_return_none_for_empty_node_list() {
        assert!(active_node(&[], t("12:00")).is_none());
        assert!(next_node(&[], t("12:00")).is_none());
    }

    #[test]
    fn should_find_next_node_after_clock_time() {
        let nodes = vec![node("07:00", 21.0), node("23:00", 18.0)];
        assert_eq!(next_node(&nodes, t("07:00")).unwrap().time, t("23:00"));
        assert_eq!(next_node(&nodes, t("06:59")).unwrap().time, t("07:00"));
    }

    #[test]
    fn should_wrap_next_node_to_tomorrow() {
        let nodes = vec![node("07:00", 21.0), node("23:00", 18.0)];
        assert_eq!(next_node(&nodes, t("23:30")).unwrap().time, t("07:00"));
    }

    #[test]
    fn should_partition_day_between_active_and_next() {
        // For a multi-node list, active and next are never the same node.
        let nodes = vec![node("06:30", 20.0), node("22:00", 17.0)];
        for probe in ["00:00", "06:30", "12:00", "22:00", "23:59"] {
            let active = active_node(&nodes, t(probe)).unwrap();
            let next = next_node(&nodes, t(probe)).unwrap();
            assert_ne!(active.time, next.time, "probe {probe}");
        }
    }

    #[test]
    fn should_return_same_node_for_active_and_next_on_singleton() {
        let nodes = vec![node("08:00", 20.0)];
        let active = active_node(&nodes, t("12:00")).unwrap();
        let next = next_node(&nodes, t("12:00")).unwrap();
        assert_eq!(active.time, next.time);
    }

    // ── resolve_active with carryover ──────────────────────────────

    #[test]
    fn should_carry_previous_day_value_across_midnight_in_individual_mode() {
        // Monday ends at 22:00/17°C; Tuesday's first node is 08:00/19°C.
        // At Tuesday 03:00 the Monday value must still hold.
        let mut set = ScheduleSet::new();
        set.set_nodes(Bucket::Day(DayOfWeek::Mon), vec![node("22:00", 17.0)])
            .unwrap();
        set.set_nodes(Bucket::Day(DayOfWeek::Tue), vec![node("08:00", 19.0)])
            .unwrap();

        let active =
            resolve_active(&set, ScheduleMode::Individual, DayOfWeek::Tue, t("03:00")).unwrap();
        assert_eq!(active.temp, Some(17.0));
        assert_eq!(active.time, NodeTime::MIDNIGHT);
    }

    #[test]
    fn should_not_carry_over_once_todays_first_node_passed() {
        let mut set = ScheduleSet::new();
        set.set_nodes(Bucket::Day(DayOfWeek::Mon), vec![node("22:00", 17.0)])
            .unwrap();
        set.set_nodes(Bucket::Day(DayOfWeek::Tue), vec![node("08:00", 19.0)])
            .unwrap();

        let active =
            resolve_active(&set, ScheduleMode::Individual, DayOfWeek::Tue, t("09:00")).unwrap();
        assert_eq!(active.temp, Some(19.0));
    }

    #[test]
    fn should_map_weekend_bucket_when_carrying_into_monday() {
        // Sunday is governed by the weekend bucket; Monday 05:00 precedes
        // the weekday list's first node, so the weekend value carries.
        let mut set = ScheduleSet::new();
        set.set_nodes(
            Bucket::Weekday,
            vec![node("06:30", 20.0), node("22:00", 17.0)],
        )
        .unwrap();
        set.set_nodes(
            Bucket::Weekend,
            vec![node("08:00", 20.0), node("23:00", 18.0)],
        )
        .unwrap();

        let active =
            resolve_active(&set, ScheduleMode::FiveTwo, DayOfWeek::Mon, t("05:00")).unwrap();
        assert_eq!(active.temp, Some(18.0));
        assert_eq!(active.time, NodeTime::MIDNIGHT);
    }

    #[test]
    fn should_carry_over_into_day_with_empty_bucket() {
        let mut set = ScheduleSet::new();
        set.set_nodes(Bucket::Day(DayOfWeek::Mon), vec![node("22:00", 17.0)])
            .unwrap();

        let active =
            resolve_active(&set, ScheduleMode::Individual, DayOfWeek::Tue, t("03:00")).unwrap();
        assert_eq!(active.temp, Some(17.0));
    }

    #[test]
    fn should_not_synthesize_carryover_in_all_days_mode() {
        let set =
            ScheduleSet::with_bucket(Bucket::AllDays, vec![node("07:00", 21.0), node("23:00", 18.0)])
                .unwrap();

        // Plain wrap-around applies instead: the list's own last node.
        let active =
            resolve_active(&set, ScheduleMode::AllDays, DayOfWeek::Tue, t("03:00")).unwrap();
        assert_eq!(active.time, t("23:00"));
    }

    #[test]
    fn should_return_none_when_both_today_and_yesterday_are_empty() {
        let set = ScheduleSet::new();
        assert!(resolve_active(&set, ScheduleMode::Individual, DayOfWeek::Tue, t("03:00")).is_none());
    }

    #[test]
    fn should_ignore_leftover_buckets_from_previous_mode() {
        // An all_days bucket lingering after a switch to individual mode
        // must not influence resolution.
        let mut set = ScheduleSet::new();
        set.set_nodes(Bucket::AllDays, vec![node("00:00", 25.0)])
            .unwrap();
        set.set_nodes(Bucket::Day(DayOfWeek::Wed), vec![node("07:00", 19.0)])
            .unwrap();

        let active =
            resolve_active(&set, ScheduleMode::Individual, DayOfWeek::Wed, t("12:00")).unwrap();
        assert_eq!(active.temp, Some(19.0));
    }
}
