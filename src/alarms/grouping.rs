use std::collections::HashMap;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::datetime::{parse_ts, ymd_in_tz};
use crate::types::Alarm;

/// Bucket for alarms whose timestamp failed to parse; always ordered last.
pub const UNDATED_KEY: &str = "—";

#[derive(Debug, Clone, PartialEq)]
pub struct DayGroup {
    pub day: String,
    pub items: Vec<Alarm>,
}

/// Group alarms by display-timezone calendar day: newest day first, newest
/// item first within each day.
pub fn group_by_day(alarms: &[Alarm], tz: Tz) -> Vec<DayGroup> {
    let mut buckets: HashMap<String, Vec<Alarm>> = HashMap::new();
    for alarm in alarms {
        let key = alarm_instant(alarm, tz)
            .map_or_else(|| UNDATED_KEY.to_string(), |instant| ymd_in_tz(instant, tz));
        buckets.entry(key).or_default().push(alarm.clone());
    }

    let mut days: Vec<String> = buckets.keys().cloned().collect();
    days.sort_by(|a, b| b.cmp(a));
    // The em-dash bucket would sort above the dated keys; keep it last.
    if let Some(at) = days.iter().position(|day| day == UNDATED_KEY) {
        let undated = days.remove(at);
        days.push(undated);
    }

    days.into_iter()
        .map(|day| {
            let mut items = buckets.remove(&day).unwrap_or_default();
            items.sort_by(|a, b| alarm_instant(b, tz).cmp(&alarm_instant(a, tz)));
            DayGroup { day, items }
        })
        .collect()
}

pub fn alarm_instant(alarm: &Alarm, tz: Tz) -> Option<DateTime<Utc>> {
    alarm.created_at.as_deref().and_then(|ts| parse_ts(ts, tz))
}
