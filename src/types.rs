use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One telemetry sample for a well, as returned by `/api/latest` and
/// `/api/recent`. Numeric fields are lenient: anything that is not a finite
/// JSON number deserializes as absent rather than failing the whole row.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Reading {
    pub pozo: String,
    #[serde(default)]
    pub site: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "finite_or_absent")]
    pub nivel_m: Option<f64>,
    #[serde(default, deserialize_with = "finite_or_absent")]
    pub caudal_lps: Option<f64>,
    #[serde(default, deserialize_with = "finite_or_absent", rename = "cloro_mgL")]
    pub cloro_mg_l: Option<f64>,
    #[serde(default, deserialize_with = "finite_or_absent")]
    pub presion_bar: Option<f64>,
    #[serde(default, deserialize_with = "bool_or_int")]
    pub bomba_on: Option<bool>,
}

fn finite_or_absent<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_f64().filter(|v| v.is_finite()))
}

// The backend stores the pump flag as an integer column.
fn bool_or_int<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Bool(flag) => Some(flag),
        Value::Number(n) => n.as_f64().map(|v| v != 0.0),
        _ => None,
    })
}

/// A discrete threshold-violation event tied to a well and timestamp.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Alarm {
    pub pozo: String,
    pub code: AlarmCode,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Alarm {
    /// Localized message for known codes; the backend's own message for the
    /// rest.
    pub fn display_message(&self) -> &str {
        self.code.message().unwrap_or(&self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum AlarmCode {
    LvlLow,
    LvlHigh,
    ClLow,
    ClHigh,
    PressLow,
    Other(String),
}

impl From<String> for AlarmCode {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "LVL_LOW" => Self::LvlLow,
            "LVL_HIGH" => Self::LvlHigh,
            "CL_LOW" => Self::ClLow,
            "CL_HIGH" => Self::ClHigh,
            "PRESS_LOW" => Self::PressLow,
            _ => Self::Other(raw),
        }
    }
}

impl AlarmCode {
    pub fn message(&self) -> Option<&'static str> {
        Some(match self {
            Self::LvlLow => "Nivel bajo en el estanque",
            Self::LvlHigh => "Nivel alto en el estanque",
            Self::ClLow => "Cloro bajo",
            Self::ClHigh => "Cloro alto",
            Self::PressLow => "Presión baja",
            Self::Other(_) => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum Severity {
    #[default]
    Ok,
    Warn,
    Crit,
}

impl From<String> for Severity {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "crit" => Self::Crit,
            "warn" => Self::Warn,
            // Unknown severities render with the neutral style.
            _ => Self::Ok,
        }
    }
}

impl Severity {
    pub fn class(self) -> &'static str {
        match self {
            Self::Crit => "crit",
            Self::Warn => "warn",
            Self::Ok => "ok",
        }
    }
}

/// Normal/critical range configuration, global to all wells.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Thresholds {
    pub nivel_low_m: f64,
    pub nivel_high_m: f64,
    #[serde(rename = "cloro_min_mgL")]
    pub cloro_min_mg_l: f64,
    #[serde(rename = "cloro_max_mgL")]
    pub cloro_max_mg_l: f64,
    pub presion_min_bar: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            nivel_low_m: 0.9,
            nivel_high_m: 2.5,
            cloro_min_mg_l: 0.2,
            cloro_max_mg_l: 1.5,
            presion_min_bar: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reading_tolerates_malformed_fields() {
        let reading: Reading = serde_json::from_str(
            r#"{
                "pozo": "pozo1",
                "created_at": "2024-01-01 10:00:00",
                "nivel_m": "n/a",
                "caudal_lps": 12.5,
                "cloro_mgL": null,
                "bomba_on": 1
            }"#,
        )
        .unwrap();

        assert_eq!(reading.nivel_m, None);
        assert_eq!(reading.caudal_lps, Some(12.5));
        assert_eq!(reading.cloro_mg_l, None);
        assert_eq!(reading.presion_bar, None);
        assert_eq!(reading.bomba_on, Some(true));
    }

    #[test]
    fn pump_flag_accepts_bool_and_int() {
        let on: Reading =
            serde_json::from_str(r#"{"pozo":"p","bomba_on":true}"#).unwrap();
        let off: Reading = serde_json::from_str(r#"{"pozo":"p","bomba_on":0}"#).unwrap();
        let junk: Reading =
            serde_json::from_str(r#"{"pozo":"p","bomba_on":"yes"}"#).unwrap();
        assert_eq!(on.bomba_on, Some(true));
        assert_eq!(off.bomba_on, Some(false));
        assert_eq!(junk.bomba_on, None);
    }

    #[test]
    fn alarm_codes_map_to_localized_messages() {
        let alarm: Alarm = serde_json::from_str(
            r#"{"pozo":"pozo1","code":"LVL_LOW","message":"Nivel bajo: 0.5 m","severity":"warn"}"#,
        )
        .unwrap();
        assert_eq!(alarm.code, AlarmCode::LvlLow);
        assert_eq!(alarm.display_message(), "Nivel bajo en el estanque");
        assert_eq!(alarm.severity, Severity::Warn);
    }

    #[test]
    fn unknown_codes_pass_raw_message_through() {
        let alarm: Alarm = serde_json::from_str(
            r#"{"pozo":"pozo2","code":"PUMP_STALL","message":"Bomba detenida","severity":"frobnicated"}"#,
        )
        .unwrap();
        assert_eq!(alarm.code, AlarmCode::Other("PUMP_STALL".to_string()));
        assert_eq!(alarm.display_message(), "Bomba detenida");
        assert_eq!(alarm.severity, Severity::Ok);
    }

    #[test]
    fn thresholds_default_matches_fallback_set() {
        let th = Thresholds::default();
        assert_eq!(th.nivel_low_m, 0.9);
        assert_eq!(th.nivel_high_m, 2.5);
        assert_eq!(th.cloro_min_mg_l, 0.2);
        assert_eq!(th.cloro_max_mg_l, 1.5);
        assert_eq!(th.presion_min_bar, 1.0);
    }

    #[test]
    fn thresholds_deserialize_with_wire_names() {
        let th: Thresholds = serde_json::from_str(
            r#"{"nivel_low_m":1.0,"nivel_high_m":2.0,"cloro_min_mgL":0.3,"cloro_max_mgL":1.2,"presion_min_bar":0.8}"#,
        )
        .unwrap();
        assert_eq!(th.cloro_min_mg_l, 0.3);
        assert_eq!(th.cloro_max_mg_l, 1.2);
    }
}
