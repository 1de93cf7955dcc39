//! Slot filtering and merging for one location's availability document.
//!
//! Per day: date window, weekday set and exact target date filters, then a
//! time-of-day filter per slot, then adjacency merging. Surviving days are
//! ranked newest first and capped at [`MAX_DAYS_PER_LOCATION`].

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Timelike, Utc};

use crate::availability::{AvailabilityDay, AvailabilityResponse, API_DATETIME_FORMAT};
use crate::parse::weekday_from_name;

/// Most recent qualifying days kept per location.
pub const MAX_DAYS_PER_LOCATION: usize = 5;

/// Slot length when `Duration` is absent or unusable.
pub const DEFAULT_SLOT_MINUTES: u32 = 15;

/// User constraints applied to every location. `None` disables a filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotFilters {
    /// Inclusive start of the daily window, minutes since midnight.
    pub time_from: Option<u32>,
    /// Exclusive end of the daily window, minutes since midnight.
    pub time_to: Option<u32>,
    /// Days from today (inclusive) a date may be.
    pub window_days: Option<i64>,
    /// Allowed weekdays, Monday = 1.
    pub weekdays: Option<BTreeSet<u32>>,
    pub target_weekday: Option<u32>,
    pub week_offset: Option<i64>,
}

impl SlotFilters {
    /// The single date selected by target weekday + week offset, if both are set.
    ///
    /// The next occurrence of the weekday counts today, then `week_offset`
    /// further weeks are added. `None` also when the offset lands outside
    /// the calendar range.
    pub fn target_date(&self, today: NaiveDate) -> Option<NaiveDate> {
        let target = i64::from(self.target_weekday?);
        let offset = self.week_offset?;
        let today_num = i64::from(today.weekday().number_from_monday());
        let days = offset
            .checked_mul(7)?
            .checked_add((target - today_num).rem_euclid(7))?;
        today.checked_add_signed(Duration::try_days(days)?)
    }

    /// Both target parts are set but no calendar date satisfies them.
    fn target_unreachable(&self, today: NaiveDate) -> bool {
        self.target_weekday.is_some()
            && self.week_offset.is_some()
            && self.target_date(today).is_none()
    }

    fn admits_minute(&self, start: u32) -> bool {
        self.time_from.map_or(true, |from| start >= from)
            && self.time_to.map_or(true, |to| start < to)
    }
}

/// A merged `[start, end)` span in minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MergedRange {
    pub start: u32,
    pub end: u32,
}

impl MergedRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// `"HH:MM-HH:MM"`. Ends past midnight render as hours >= 24.
    pub fn render(&self) -> String {
        format!("{}-{}", format_minutes(self.start), format_minutes(self.end))
    }
}

/// Merge ranges whose start equals the previous end.
///
/// Input order does not matter; output is sorted by start. Ranges separated
/// by any gap stay separate.
pub fn merge_ranges(mut ranges: Vec<MergedRange>) -> Vec<MergedRange> {
    ranges.sort_by_key(|r| r.start);
    let mut merged: Vec<MergedRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.start == last.end => last.end = range.end,
            _ => merged.push(range),
        }
    }
    merged
}

/// One qualifying day after filtering and merging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySummary {
    pub date: NaiveDateTime,
    pub ranges: Vec<MergedRange>,
}

impl DaySummary {
    /// `- 2025-09-17 (Wednesday): 13:30-14:15, 15:00-15:15`
    pub fn render(&self) -> String {
        let times: Vec<String> = self.ranges.iter().map(MergedRange::render).collect();
        format!(
            "- {} ({}): {}",
            self.date.format("%Y-%m-%d"),
            self.date.format("%A"),
            times.join(", ")
        )
    }
}

/// Result of summarizing one location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationSummary {
    /// Newest first, at most [`MAX_DAYS_PER_LOCATION`].
    pub days: Vec<DaySummary>,
}

impl LocationSummary {
    pub fn lines(&self) -> Vec<String> {
        self.days.iter().map(DaySummary::render).collect()
    }

    /// Date of the most recent qualifying day.
    pub fn latest(&self) -> Option<NaiveDateTime> {
        self.days.first().map(|d| d.date)
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

/// Filter, merge and rank a location's availability.
pub fn summarize(
    response: &AvailabilityResponse,
    filters: &SlotFilters,
    now: DateTime<Utc>,
) -> LocationSummary {
    let today = now.date_naive();
    let target_date = filters.target_date(today);
    if filters.target_unreachable(today) {
        log::warn!("Target weekday and week offset give no valid date; nothing qualifies");
        return LocationSummary::default();
    }

    let mut days: Vec<DaySummary> = response
        .location_availability_dates
        .iter()
        .filter_map(|day| summarize_day(day, filters, today, target_date))
        .collect();

    // Stable: same-date entries keep upstream order.
    days.sort_by(|a, b| b.date.cmp(&a.date));
    days.truncate(MAX_DAYS_PER_LOCATION);

    LocationSummary { days }
}

fn summarize_day(
    day: &AvailabilityDay,
    filters: &SlotFilters,
    today: NaiveDate,
    target_date: Option<NaiveDate>,
) -> Option<DaySummary> {
    if day.available_time_slots.is_empty() {
        return None;
    }

    let date = parse_api_datetime(day.availability_date.as_deref()?)?;

    if let Some(window) = filters.window_days {
        let offset = (date.date() - today).num_days();
        if offset < 0 || offset > window {
            return None;
        }
    }

    // Days with an unrecognized DayOfWeek are not weekday-filtered.
    if let (Some(allowed), Some(weekday)) = (
        filters.weekdays.as_ref(),
        day.day_of_week.as_deref().and_then(weekday_from_name),
    ) {
        if !allowed.contains(&weekday) {
            return None;
        }
    }

    if let Some(target) = target_date {
        if date.date() != target {
            return None;
        }
    }

    let kept: Vec<MergedRange> = day
        .available_time_slots
        .iter()
        .filter_map(|slot| {
            let start_dt = parse_api_datetime(slot.start_date_time.as_deref()?)?;
            let start = start_dt.hour() * 60 + start_dt.minute();
            let duration = slot
                .duration
                .filter(|d| *d > 0)
                .and_then(|d| u32::try_from(d).ok())
                .unwrap_or(DEFAULT_SLOT_MINUTES);
            filters
                .admits_minute(start)
                .then(|| MergedRange::new(start, start.saturating_add(duration)))
        })
        .collect();

    let ranges = merge_ranges(kept);
    if ranges.is_empty() {
        return None;
    }

    Some(DaySummary { date, ranges })
}

fn parse_api_datetime(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, API_DATETIME_FORMAT).ok()
}

fn format_minutes(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}
