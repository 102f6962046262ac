use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::warn;

use crate::datetime::{
    add_days, day_end, day_start, has_explicit_offset, is_date_only, normalize_iso, offset_str,
    parse_ts,
};
use crate::request::{ApiClient, RecentQuery, DAY_LIMIT, RECENT_LIMIT};
use crate::types::Reading;

use super::types::{SeriesData, SeriesPoint, SeriesView};

/// Sort readings ascending by parsed instant and derive the level and flow
/// point sequences. Rows with unparseable timestamps sort first and never
/// become points; absent values are skipped per series.
pub fn build_series(mut readings: Vec<Reading>, tz: Tz) -> SeriesData {
    readings.sort_by_key(|reading| reading_instant(reading, tz));
    let nivel = points_of(&readings, tz, |r| r.nivel_m);
    let caudal = points_of(&readings, tz, |r| r.caudal_lps);
    SeriesData {
        rows: readings,
        nivel,
        caudal,
    }
}

pub fn reading_instant(reading: &Reading, tz: Tz) -> Option<DateTime<Utc>> {
    reading.created_at.as_deref().and_then(|ts| parse_ts(ts, tz))
}

fn points_of(
    readings: &[Reading],
    tz: Tz,
    value: impl Fn(&Reading) -> Option<f64>,
) -> Vec<SeriesPoint> {
    readings
        .iter()
        .filter_map(|reading| {
            let time = reading_instant(reading, tz)?;
            let value = value(reading)?;
            Some(SeriesPoint { time, value })
        })
        .collect()
}

/// Expand an explicit range bound into an instant string that carries the
/// display timezone's offset. Date-only bounds become that day's midnight;
/// bounds that already carry an offset pass through (normalized); anything
/// unparseable is treated as absent.
pub fn expand_range_param(raw: &str, tz: Tz) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if is_date_only(raw) {
        let start = day_start(raw, tz)?;
        return Some(format!("{raw}T00:00:00{}", offset_str(start, tz)));
    }
    let iso = normalize_iso(raw);
    if has_explicit_offset(&iso) {
        return Some(iso);
    }
    let instant = parse_ts(raw, tz)?;
    Some(format!("{iso}{}", offset_str(instant, tz)))
}

/// Keep the day clamp unless every plotted point lies outside it, in which
/// case fall back to scaling the axis to the data. Guards against a
/// client/server clock or timezone mismatch rendering an empty-looking
/// chart.
pub fn day_window_or_auto(
    data: &SeriesData,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> (Option<(DateTime<Utc>, DateTime<Utc>)>, bool) {
    let times = data
        .nivel
        .iter()
        .chain(&data.caudal)
        .map(|point| point.time);
    let Some(min) = times.clone().min() else {
        return (Some((start, end)), false);
    };
    let max = times.max().unwrap_or(min);

    if max < start || min >= end {
        (None, true)
    } else {
        (Some((start, end)), false)
    }
}

/// Load readings for a well over an optional explicit range (server default
/// window when absent).
pub async fn load_range(
    api: &ApiClient,
    tz: Tz,
    pozo: &str,
    start: Option<&str>,
    end: Option<&str>,
) -> SeriesView {
    let start_param = start.and_then(|raw| expand_range_param(raw, tz));
    let end_param = end.and_then(|raw| expand_range_param(raw, tz));

    let title = match &start_param {
        Some(s) => format!(
            "Tendencia – {} ({s} → {})",
            pozo.to_uppercase(),
            end_param.as_deref().unwrap_or("…")
        ),
        None => format!("Tendencia – {}", pozo.to_uppercase()),
    };

    let readings = api
        .recent(&RecentQuery {
            pozo: pozo.to_string(),
            limit: RECENT_LIMIT,
            start: start_param,
            end: end_param,
        })
        .await;

    SeriesView {
        title,
        data: build_series(readings, tz),
        window: None,
        auto_scaled: false,
    }
}

/// Load exactly one calendar day for a well, clamping the axis to the day's
/// bounds in the display timezone.
pub async fn load_day(api: &ApiClient, tz: Tz, pozo: &str, ymd: &str) -> SeriesView {
    let (Some(start), Some(end), Some(next_day)) =
        (day_start(ymd, tz), day_end(ymd, tz), add_days(ymd, 1, tz))
    else {
        warn!(ymd, "unparseable day for the series view");
        return SeriesView {
            title: day_title(pozo, ymd),
            ..SeriesView::default()
        };
    };

    let readings = api
        .recent(&RecentQuery {
            pozo: pozo.to_string(),
            limit: DAY_LIMIT,
            start: Some(ymd.to_string()),
            end: Some(next_day),
        })
        .await;

    assemble_day_view(readings, tz, pozo, ymd, start, end)
}

fn assemble_day_view(
    readings: Vec<Reading>,
    tz: Tz,
    pozo: &str,
    ymd: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> SeriesView {
    let data = build_series(readings, tz);
    let (window, auto_scaled) = day_window_or_auto(&data, start, end);

    let mut title = day_title(pozo, ymd);
    if auto_scaled {
        title.push_str(" (auto)");
        warn!(ymd, "series data lies outside the selected day, auto-scaling the axis");
    }

    SeriesView {
        title,
        data,
        window,
        auto_scaled,
    }
}

fn day_title(pozo: &str, ymd: &str) -> String {
    format!("Tendencia – {} – {ymd}", pozo.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::Santiago;

    fn reading(created_at: &str, nivel_m: Option<f64>, caudal_lps: Option<f64>) -> Reading {
        Reading {
            pozo: "pozo1".to_string(),
            site: None,
            created_at: Some(created_at.to_string()),
            nivel_m,
            caudal_lps,
            cloro_mg_l: None,
            presion_bar: None,
            bomba_on: None,
        }
    }

    #[test]
    fn points_sort_ascending_across_timestamp_formats() {
        // The first row is a naive local time (13:00 UTC in Santiago's
        // January offset), the second an explicit UTC instant before it.
        let data = build_series(
            vec![
                reading("2024-01-01 10:00:00", Some(1.2), None),
                reading("2024-01-01T09:00:00Z", Some(1.5), None),
            ],
            Santiago,
        );

        let values: Vec<f64> = data.nivel.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![1.5, 1.2]);
        assert!(data.nivel[0].time < data.nivel[1].time);
    }

    #[test]
    fn unparseable_or_absent_entries_never_become_points() {
        let mut rows = vec![
            reading("garbage", Some(1.0), Some(2.0)),
            reading("2024-01-01 10:00:00", None, Some(2.5)),
            reading("2024-01-01 11:00:00", Some(1.1), None),
        ];
        rows.push(Reading {
            created_at: None,
            ..rows[0].clone()
        });

        let data = build_series(rows, Santiago);
        assert_eq!(data.rows.len(), 4);
        assert_eq!(data.nivel.len(), 1);
        assert_eq!(data.caudal.len(), 1);
    }

    #[test]
    fn date_only_bound_expands_to_midnight_with_offset() {
        assert_eq!(
            expand_range_param("2024-01-15", Santiago).as_deref(),
            Some("2024-01-15T00:00:00-03:00")
        );
        // Winter offset differs.
        assert_eq!(
            expand_range_param("2024-06-15", Santiago).as_deref(),
            Some("2024-06-15T00:00:00-04:00")
        );
    }

    #[test]
    fn naive_bound_gains_the_display_offset() {
        assert_eq!(
            expand_range_param("2024-01-15 08:30:00", Santiago).as_deref(),
            Some("2024-01-15T08:30:00-03:00")
        );
    }

    #[test]
    fn explicit_offset_bound_passes_through_normalized() {
        assert_eq!(
            expand_range_param("2024-01-15 08:30:00Z", Santiago).as_deref(),
            Some("2024-01-15T08:30:00Z")
        );
        assert_eq!(expand_range_param("", Santiago), None);
        assert_eq!(expand_range_param("mañana", Santiago), None);
    }

    #[test]
    fn day_clamp_holds_when_data_overlaps_the_day() {
        let start = day_start("2024-01-15", Santiago).unwrap();
        let end = day_end("2024-01-15", Santiago).unwrap();
        let data = build_series(vec![reading("2024-01-15 10:00:00", Some(1.2), None)], Santiago);

        let (window, auto) = day_window_or_auto(&data, start, end);
        assert_eq!(window, Some((start, end)));
        assert!(!auto);
    }

    #[test]
    fn skewed_data_falls_back_to_auto_scaling() {
        // Simulated clock skew: everything lands on the following day.
        let start = day_start("2024-01-15", Santiago).unwrap();
        let end = day_end("2024-01-15", Santiago).unwrap();
        let readings = vec![
            reading("2024-01-16 00:10:00", Some(1.2), Some(3.0)),
            reading("2024-01-16 08:00:00", Some(1.3), Some(3.1)),
        ];

        let view = assemble_day_view(readings, Santiago, "pozo1", "2024-01-15", start, end);
        assert!(view.auto_scaled);
        assert_eq!(view.window, None);
        assert_eq!(view.title, "Tendencia – POZO1 – 2024-01-15 (auto)");
    }

    #[test]
    fn empty_day_keeps_the_clamp() {
        let start = day_start("2024-01-15", Santiago).unwrap();
        let end = day_end("2024-01-15", Santiago).unwrap();

        let view = assemble_day_view(Vec::new(), Santiago, "pozo1", "2024-01-15", start, end);
        assert!(!view.auto_scaled);
        assert_eq!(view.window, Some((start, end)));
        assert_eq!(view.title, "Tendencia – POZO1 – 2024-01-15");
    }
}
