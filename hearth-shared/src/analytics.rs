//! Registration and event analytics
//!
//! Everything here is a pure function over rows already loaded from the
//! database; the API recomputes the summaries on every request. Percentages
//! are rounded to one decimal place and a zero denominator yields `0.0`.

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use crate::models::event::Event;
use crate::models::registration::{Registration, RegistrationStatus};

/// Events listed in `top_events`
pub const TOP_EVENTS: usize = 5;

/// Label used when a registration has no gender recorded
pub const UNSPECIFIED: &str = "unspecified";

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// `part / whole` as a percentage with one decimal
pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round1(part as f64 * 100.0 / whole as f64)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CountShare {
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabeledCount {
    pub label: String,
    pub count: u64,
}

/// Registrations per age range; every registration lands in exactly one bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AgeBuckets {
    pub under_18: u64,
    #[serde(rename = "18_24")]
    pub age_18_24: u64,
    #[serde(rename = "25_34")]
    pub age_25_34: u64,
    #[serde(rename = "35_44")]
    pub age_35_44: u64,
    #[serde(rename = "45_54")]
    pub age_45_54: u64,
    #[serde(rename = "55_64")]
    pub age_55_64: u64,
    #[serde(rename = "65_plus")]
    pub age_65_plus: u64,
    pub unknown: u64,
}

impl AgeBuckets {
    pub fn record(&mut self, age: Option<i32>) {
        let bucket = match age {
            None => &mut self.unknown,
            Some(a) if a < 0 => &mut self.unknown,
            Some(a) if a < 18 => &mut self.under_18,
            Some(a) if a < 25 => &mut self.age_18_24,
            Some(a) if a < 35 => &mut self.age_25_34,
            Some(a) if a < 45 => &mut self.age_35_44,
            Some(a) if a < 55 => &mut self.age_45_54,
            Some(a) if a < 65 => &mut self.age_55_64,
            Some(_) => &mut self.age_65_plus,
        };
        *bucket += 1;
    }

    pub fn total(&self) -> u64 {
        self.under_18
            + self.age_18_24
            + self.age_25_34
            + self.age_35_44
            + self.age_45_54
            + self.age_55_64
            + self.age_65_plus
            + self.unknown
    }
}

/// Breakdowns shared by the organization-wide and per-event summaries
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistrationBreakdown {
    pub total: u64,

    /// Registrations not cancelled
    pub active: u64,

    pub checked_in: u64,

    /// Checked-in share of active registrations
    pub turnout_rate: f64,

    pub by_status: BTreeMap<String, CountShare>,
    pub by_gender: BTreeMap<String, CountShare>,
    pub age_groups: AgeBuckets,
}

fn normalize_gender(gender: Option<&str>) -> String {
    match gender.map(str::trim) {
        Some(g) if !g.is_empty() => g.to_lowercase(),
        _ => UNSPECIFIED.to_string(),
    }
}

fn shares(counts: BTreeMap<String, u64>, total: u64) -> BTreeMap<String, CountShare> {
    counts
        .into_iter()
        .map(|(label, count)| {
            (
                label,
                CountShare {
                    count,
                    percentage: percentage(count, total),
                },
            )
        })
        .collect()
}

pub fn breakdown(registrations: &[Registration]) -> RegistrationBreakdown {
    let total = registrations.len() as u64;

    let mut by_status: BTreeMap<String, u64> = RegistrationStatus::ALL
        .iter()
        .map(|s| (s.as_str().to_string(), 0))
        .collect();
    let mut by_gender: BTreeMap<String, u64> = BTreeMap::new();
    let mut age_groups = AgeBuckets::default();
    let mut active = 0;
    let mut checked_in = 0;

    for registration in registrations {
        *by_status
            .entry(registration.status.as_str().to_string())
            .or_default() += 1;
        *by_gender
            .entry(normalize_gender(registration.gender.as_deref()))
            .or_default() += 1;
        age_groups.record(registration.age);

        if registration.status.holds_seat() {
            active += 1;
            if registration.checked_in_at.is_some() {
                checked_in += 1;
            }
        }
    }

    RegistrationBreakdown {
        total,
        active,
        checked_in,
        turnout_rate: percentage(checked_in, active),
        by_status: shares(by_status, total),
        by_gender: shares(by_gender, total),
        age_groups,
    }
}

/// Counts keyed by a formatted timestamp, e.g. `"%Y-%m"` or `"%Y-%m-%d"`
pub fn group_by_period(timestamps: &[DateTime<Utc>], format: &str) -> BTreeMap<String, u64> {
    let mut groups = BTreeMap::new();
    for ts in timestamps {
        *groups.entry(ts.format(format).to_string()).or_default() += 1;
    }
    groups
}

/// Counts per weekday, Monday first, always seven entries
pub fn group_by_weekday(timestamps: &[DateTime<Utc>]) -> Vec<LabeledCount> {
    let mut counts = [0u64; 7];
    for ts in timestamps {
        counts[ts.weekday().num_days_from_monday() as usize] += 1;
    }

    WEEKDAYS
        .iter()
        .zip(counts)
        .map(|(day, count)| LabeledCount {
            label: day.to_string(),
            count,
        })
        .collect()
}

/// Registered share of capacity; None for unlimited events
pub fn utilization(capacity: i32, registered_attendees: i32) -> Option<f64> {
    if capacity <= 0 {
        return None;
    }
    Some(round1(
        registered_attendees.max(0) as f64 * 100.0 / capacity as f64,
    ))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub total_events: u64,
    pub upcoming_events: u64,
    pub past_events: u64,
    pub unlimited_events: u64,

    /// Sum of capacities of events with a limit
    pub total_capacity: i64,

    /// Sum of `registered_attendees` over all events
    pub total_attendees: i64,

    /// Mean utilization of events with a limit
    pub average_utilization: f64,

    /// Attendees over capacity, limited events only
    pub overall_utilization: f64,

    pub average_registrations_per_event: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopEvent {
    pub event_id: Uuid,
    pub title: String,
    pub date: NaiveDate,
    pub registrations: u64,
    pub capacity: i32,
    pub utilization: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrganizationAnalytics {
    pub overview: Overview,
    pub registrations: RegistrationBreakdown,
    pub registrations_by_month: BTreeMap<String, u64>,
    pub registrations_by_weekday: Vec<LabeledCount>,
    pub events_by_category: BTreeMap<String, u64>,
    pub events_by_month: BTreeMap<String, u64>,
    pub top_events: Vec<TopEvent>,
}

pub fn organization_summary(
    events: &[Event],
    registrations: &[Registration],
    today: NaiveDate,
) -> OrganizationAnalytics {
    let upcoming_events = events.iter().filter(|e| e.date >= today).count() as u64;
    let limited: Vec<&Event> = events.iter().filter(|e| e.capacity > 0).collect();

    let total_capacity: i64 = limited.iter().map(|e| e.capacity as i64).sum();
    let limited_attendees: i64 = limited.iter().map(|e| e.registered_attendees as i64).sum();
    let total_attendees: i64 = events.iter().map(|e| e.registered_attendees as i64).sum();

    let utilizations: Vec<f64> = limited
        .iter()
        .filter_map(|e| utilization(e.capacity, e.registered_attendees))
        .collect();
    let average_utilization = if utilizations.is_empty() {
        0.0
    } else {
        round1(utilizations.iter().sum::<f64>() / utilizations.len() as f64)
    };
    let overall_utilization = if total_capacity > 0 {
        round1(limited_attendees as f64 * 100.0 / total_capacity as f64)
    } else {
        0.0
    };

    let average_registrations_per_event = if events.is_empty() {
        0.0
    } else {
        round1(registrations.len() as f64 / events.len() as f64)
    };

    let mut events_by_category: BTreeMap<String, u64> = BTreeMap::new();
    for event in events {
        *events_by_category
            .entry(event.category.trim().to_string())
            .or_default() += 1;
    }

    let mut events_by_month: BTreeMap<String, u64> = BTreeMap::new();
    for event in events {
        *events_by_month
            .entry(event.date.format("%Y-%m").to_string())
            .or_default() += 1;
    }

    let timestamps: Vec<DateTime<Utc>> = registrations.iter().map(|r| r.registered_at).collect();

    OrganizationAnalytics {
        overview: Overview {
            total_events: events.len() as u64,
            upcoming_events,
            past_events: events.len() as u64 - upcoming_events,
            unlimited_events: (events.len() - limited.len()) as u64,
            total_capacity,
            total_attendees,
            average_utilization,
            overall_utilization,
            average_registrations_per_event,
        },
        registrations: breakdown(registrations),
        registrations_by_month: group_by_period(&timestamps, "%Y-%m"),
        registrations_by_weekday: group_by_weekday(&timestamps),
        events_by_category,
        events_by_month,
        top_events: top_events(events, registrations, TOP_EVENTS),
    }
}

/// Events with the most registrations; ties broken by date, then title
pub fn top_events(events: &[Event], registrations: &[Registration], limit: usize) -> Vec<TopEvent> {
    let mut per_event: HashMap<Uuid, u64> = HashMap::new();
    for registration in registrations {
        *per_event.entry(registration.event_id).or_default() += 1;
    }

    let mut ranked: Vec<TopEvent> = events
        .iter()
        .map(|e| TopEvent {
            event_id: e.id,
            title: e.title.clone(),
            date: e.date,
            registrations: per_event.get(&e.id).copied().unwrap_or(0),
            capacity: e.capacity,
            utilization: utilization(e.capacity, e.registered_attendees),
        })
        .filter(|e| e.registrations > 0)
        .collect();

    ranked.sort_by(|a, b| {
        b.registrations
            .cmp(&a.registrations)
            .then(a.date.cmp(&b.date))
            .then_with(|| a.title.cmp(&b.title))
    });
    ranked.truncate(limit);
    ranked
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventCapacity {
    pub event_id: Uuid,
    pub title: String,
    pub date: NaiveDate,
    pub capacity: i32,
    pub registered_attendees: i32,

    /// None when the event is unlimited
    pub remaining_spots: Option<i32>,
    pub utilization: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventAnalytics {
    pub event: EventCapacity,
    pub registrations: RegistrationBreakdown,
    pub registrations_by_day: BTreeMap<String, u64>,
    pub registrations_by_weekday: Vec<LabeledCount>,
}

pub fn event_summary(event: &Event, registrations: &[Registration]) -> EventAnalytics {
    let timestamps: Vec<DateTime<Utc>> = registrations
        .iter()
        .filter(|r| r.event_id == event.id)
        .map(|r| r.registered_at)
        .collect();
    let own: Vec<Registration> = registrations
        .iter()
        .filter(|r| r.event_id == event.id)
        .cloned()
        .collect();

    EventAnalytics {
        event: EventCapacity {
            event_id: event.id,
            title: event.title.clone(),
            date: event.date,
            capacity: event.capacity,
            registered_attendees: event.registered_attendees,
            remaining_spots: event.remaining_spots(),
            utilization: utilization(event.capacity, event.registered_attendees),
        },
        registrations: breakdown(&own),
        registrations_by_day: group_by_period(&timestamps, "%Y-%m-%d"),
        registrations_by_weekday: group_by_weekday(&timestamps),
    }
}
