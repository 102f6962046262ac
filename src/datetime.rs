use chrono::offset::LocalResult;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

pub const DAY_FMT: &str = "%Y-%m-%d";

/// Backend timestamps sometimes arrive as `"YYYY-MM-DD hh:mm:ss"`; swap the
/// space separator for the `T` that RFC 3339 parsing expects.
pub fn normalize_iso(ts: &str) -> String {
    ts.replacen(' ', "T", 1)
}

/// True when the string carries a trailing Zulu marker or `±HH:MM` offset.
pub fn has_explicit_offset(s: &str) -> bool {
    if s.ends_with('Z') || s.ends_with('z') {
        return true;
    }
    let bytes = s.as_bytes();
    let Some(tail) = bytes.len().checked_sub(6).map(|at| &bytes[at..]) else {
        return false;
    };
    (tail[0] == b'+' || tail[0] == b'-')
        && tail[1].is_ascii_digit()
        && tail[2].is_ascii_digit()
        && tail[3] == b':'
        && tail[4].is_ascii_digit()
        && tail[5].is_ascii_digit()
}

pub fn is_date_only(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| if matches!(i, 4 | 7) { *b == b'-' } else { b.is_ascii_digit() })
}

/// Parse a backend timestamp into an instant.
///
/// Strings with an explicit offset are taken at face value; naive date-times
/// and date-only strings are interpreted in the display timezone. Anything
/// unparseable is `None` and must be treated as absent by callers.
pub fn parse_ts(ts: &str, tz: Tz) -> Option<DateTime<Utc>> {
    let ts = ts.trim();
    if ts.is_empty() {
        return None;
    }
    let iso = normalize_iso(ts);
    if has_explicit_offset(&iso) {
        return DateTime::parse_from_rfc3339(&iso)
            .ok()
            .map(|dt| dt.with_timezone(&Utc));
    }
    if is_date_only(&iso) {
        return day_start(&iso, tz);
    }
    let naive = parse_naive(&iso)?;
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => Some(dt.with_timezone(&Utc)),
        LocalResult::None => None,
    }
}

fn parse_naive(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .ok()
}

/// Calendar-day key (`YYYY-MM-DD`) of an instant in the given timezone.
pub fn ymd_in_tz(instant: DateTime<Utc>, tz: Tz) -> String {
    instant.with_timezone(&tz).format(DAY_FMT).to_string()
}

/// Wall-clock time (`HH:MM:SS`) of an instant in the given timezone.
pub fn time_in_tz(instant: DateTime<Utc>, tz: Tz) -> String {
    instant.with_timezone(&tz).format("%H:%M:%S").to_string()
}

/// First instant of the calendar day in the given timezone.
///
/// Chile moves its clocks at local midnight, so the start of a day can land
/// inside a DST gap; in that case the first valid instant after the gap is
/// the day start.
pub fn day_start(ymd: &str, tz: Tz) -> Option<DateTime<Utc>> {
    let midnight = NaiveDate::parse_from_str(ymd, DAY_FMT)
        .ok()?
        .and_hms_opt(0, 0, 0)?;
    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => Some(dt.with_timezone(&Utc)),
        LocalResult::None => tz
            .from_local_datetime(&(midnight + Duration::hours(1)))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc)),
    }
}

/// Exclusive end of the calendar day: exactly 24 hours after its start.
pub fn day_end(ymd: &str, tz: Tz) -> Option<DateTime<Utc>> {
    day_start(ymd, tz).map(|start| start + Duration::hours(24))
}

/// Shift a calendar-day string by whole days, in the given timezone.
pub fn add_days(ymd: &str, delta: i64, tz: Tz) -> Option<String> {
    let start = day_start(ymd, tz)?;
    Some(ymd_in_tz(start + Duration::hours(24 * delta), tz))
}

/// UTC offset of the timezone at the given instant, in minutes.
pub fn tz_offset_minutes(instant: DateTime<Utc>, tz: Tz) -> i32 {
    tz.offset_from_utc_datetime(&instant.naive_utc())
        .fix()
        .local_minus_utc()
        / 60
}

/// UTC offset formatted as `±HH:MM`.
pub fn offset_str(instant: DateTime<Utc>, tz: Tz) -> String {
    let minutes = tz_offset_minutes(instant, tz);
    let sign = if minutes < 0 { '-' } else { '+' };
    let abs = minutes.abs();
    format!("{sign}{:02}:{:02}", abs / 60, abs % 60)
}

/// Today's calendar-day key in the given timezone.
pub fn today(tz: Tz) -> String {
    ymd_in_tz(Utc::now(), tz)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::America::Santiago;
    use chrono_tz::UTC;

    #[test]
    fn normalize_swaps_first_space_only() {
        assert_eq!(normalize_iso("2024-01-01 10:00:00"), "2024-01-01T10:00:00");
        assert_eq!(normalize_iso("2024-01-01T10:00:00Z"), "2024-01-01T10:00:00Z");
        let normalized = normalize_iso("2024-01-01 10:00:00");
        assert_eq!(normalized.matches('T').count(), 1);
        assert!(parse_ts(&normalized, UTC).is_some());
    }

    #[test]
    fn offset_detection() {
        assert!(has_explicit_offset("2024-01-01T10:00:00Z"));
        assert!(has_explicit_offset("2024-01-01T10:00:00-03:00"));
        assert!(has_explicit_offset("2024-01-01T10:00:00+09:30"));
        assert!(!has_explicit_offset("2024-01-01T10:00:00"));
        assert!(!has_explicit_offset("2024-01-01"));
        assert!(!has_explicit_offset("10:00"));
    }

    #[test]
    fn date_only_detection() {
        assert!(is_date_only("2024-01-01"));
        assert!(!is_date_only("2024-01-01T00:00:00"));
        assert!(!is_date_only("2024/01/01"));
        assert!(!is_date_only("01-01-2024x"));
    }

    #[test]
    fn naive_timestamps_resolve_in_display_tz() {
        let parsed = parse_ts("2024-01-01 10:00:00", Santiago).unwrap();
        // Santiago is UTC-3 in January (DST).
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 1, 13, 0, 0).unwrap());

        let explicit = parse_ts("2024-01-01T09:00:00Z", Santiago).unwrap();
        assert_eq!(explicit, Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap());
    }

    #[test]
    fn unparseable_timestamps_are_absent() {
        assert!(parse_ts("", Santiago).is_none());
        assert!(parse_ts("not a date", Santiago).is_none());
        assert!(parse_ts("2024-13-40 10:00:00", Santiago).is_none());
    }

    #[test]
    fn day_span_is_exactly_24_hours() {
        for day in ["2024-01-15", "2024-04-06", "2024-09-07"] {
            let start = day_start(day, Santiago).unwrap();
            let end = day_end(day, Santiago).unwrap();
            assert_eq!(end - start, Duration::hours(24), "day {day}");
        }
    }

    #[test]
    fn add_days_agrees_with_day_end() {
        for day in ["2024-01-15", "2024-06-30", "2024-12-31"] {
            let next = add_days(day, 1, Santiago).unwrap();
            assert_eq!(next, ymd_in_tz(day_end(day, Santiago).unwrap(), Santiago));
        }
        assert_eq!(add_days("2024-03-01", -1, Santiago).unwrap(), "2024-02-29");
    }

    #[test]
    fn dst_gap_day_still_starts() {
        // 2024-09-08: Chilean clocks jump from 00:00 to 01:00.
        let start = day_start("2024-09-08", Santiago).unwrap();
        assert_eq!(ymd_in_tz(start, Santiago), "2024-09-08");
        assert_eq!(time_in_tz(start, Santiago), "01:00:00");
    }

    #[test]
    fn offset_round_trips() {
        let instant = Utc.with_ymd_and_hms(2024, 1, 10, 15, 30, 45).unwrap();
        for tz in [Santiago, UTC, chrono_tz::Asia::Kathmandu] {
            let local = instant
                .with_timezone(&tz)
                .format("%Y-%m-%dT%H:%M:%S")
                .to_string();
            let rebuilt = format!("{local}{}", offset_str(instant, tz));
            let reparsed = DateTime::parse_from_rfc3339(&rebuilt).unwrap();
            assert_eq!(reparsed.with_timezone(&Utc), instant, "tz {tz}");
        }
    }

    #[test]
    fn offset_minutes_sign() {
        let january = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();
        assert_eq!(tz_offset_minutes(january, Santiago), -180);
        assert_eq!(offset_str(january, Santiago), "-03:00");
        assert_eq!(offset_str(january, chrono_tz::Asia::Kathmandu), "+05:45");
        assert_eq!(offset_str(january, UTC), "+00:00");
    }
}
