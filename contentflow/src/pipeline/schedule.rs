//! Schedule metadata and next-run computation.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// How a pipeline is triggered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleType {
    /// Only when triggered explicitly.
    #[default]
    Manual,
    /// Once, at `scheduled_time`.
    Once,
    /// Repeatedly, at `recurring_frequency`.
    Recurring,
}

/// Cadence of a recurring schedule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurringFrequency {
    /// Every day.
    #[default]
    Daily,
    /// Every week, on the weekday of the anchor.
    Weekly,
    /// Every month, on the day of month of the anchor (clamped to short months).
    Monthly,
}

/// When a pipeline should run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// Trigger kind.
    #[serde(default)]
    pub schedule_type: ScheduleType,
    /// One-off time, or the anchor of a recurring schedule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_time: Option<DateTime<Utc>>,
    /// Recurring cadence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_frequency: Option<RecurringFrequency>,
    /// Recurring time of day, UTC. Defaults to the anchor's time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_time: Option<NaiveTime>,
}

fn at(date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(time))
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let first = NaiveDate::from_ymd_opt(year, month, 1);
    let next = first.and_then(|d| d.checked_add_months(Months::new(1)));
    match (first, next) {
        (Some(first), Some(next)) => u32::try_from((next - first).num_days()).unwrap_or(28),
        _ => 28,
    }
}

impl Schedule {
    /// A manual schedule.
    #[must_use]
    pub fn manual() -> Self {
        Self::default()
    }

    /// A one-off schedule.
    #[must_use]
    pub fn once(at: DateTime<Utc>) -> Self {
        Self {
            schedule_type: ScheduleType::Once,
            scheduled_time: Some(at),
            ..Self::default()
        }
    }

    /// A recurring schedule anchored at `anchor`.
    #[must_use]
    pub fn recurring(frequency: RecurringFrequency, anchor: DateTime<Utc>) -> Self {
        Self {
            schedule_type: ScheduleType::Recurring,
            scheduled_time: Some(anchor),
            recurring_frequency: Some(frequency),
            recurring_time: None,
        }
    }

    /// Sets the recurring time of day.
    #[must_use]
    pub fn with_recurring_time(mut self, time: NaiveTime) -> Self {
        self.recurring_time = Some(time);
        self
    }

    /// The first due time strictly after `now`, if any.
    #[must_use]
    pub fn next_run_after(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self.schedule_type {
            ScheduleType::Manual => None,
            ScheduleType::Once => self.scheduled_time.filter(|t| *t > now),
            ScheduleType::Recurring => self.next_recurring_after(now),
        }
    }

    fn next_recurring_after(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let anchor = self.scheduled_time.unwrap_or(now);
        let time = self.recurring_time.unwrap_or_else(|| anchor.time());
        let start = anchor.date_naive().max(now.date_naive());
        let after = |candidate: DateTime<Utc>| candidate > now && candidate >= at(anchor.date_naive(), time);

        match self.recurring_frequency.unwrap_or_default() {
            RecurringFrequency::Daily => (0..=1)
                .filter_map(|offset| start.checked_add_days(Days::new(offset)))
                .map(|d| at(d, time))
                .find(|c| after(*c)),
            RecurringFrequency::Weekly => (0..=7)
                .filter_map(|offset| start.checked_add_days(Days::new(offset)))
                .filter(|d| d.weekday() == anchor.weekday())
                .map(|d| at(d, time))
                .find(|c| after(*c)),
            RecurringFrequency::Monthly => {
                let first_of_month = NaiveDate::from_ymd_opt(start.year(), start.month(), 1)?;
                (0..=2)
                    .filter_map(|offset| first_of_month.checked_add_months(Months::new(offset)))
                    .filter_map(|month| {
                        let day = anchor.day().min(days_in_month(month.year(), month.month()));
                        NaiveDate::from_ymd_opt(month.year(), month.month(), day)
                    })
                    .map(|d| at(d, time))
                    .find(|c| after(*c))
            }
        }
    }
}
