use chrono::{DateTime, Utc};

use crate::types::Reading;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub time: DateTime<Utc>,
    pub value: f64,
}

/// Readings synchronized on the time axis: the sorted rows feed the table,
/// the two point sequences feed the chart.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SeriesData {
    pub rows: Vec<Reading>,
    pub nivel: Vec<SeriesPoint>,
    pub caudal: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesMode {
    /// One calendar day, axis clamped to its bounds.
    Day,
    /// Explicit or server-default window, axis follows the data.
    Range,
}

/// Everything the chart needs for one render: the synchronized data, the
/// axis window (`None` means scale to the data), and the title, already
/// marked when the day clamp had to be dropped.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SeriesView {
    pub title: String,
    pub data: SeriesData,
    pub window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    pub auto_scaled: bool,
}

/// Values under the cursor, shown by the chart tooltip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoverSample {
    pub time: DateTime<Utc>,
    pub nivel: Option<f64>,
    pub caudal: Option<f64>,
}
