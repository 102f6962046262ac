use anyhow::{anyhow, Context, Result};
use chrono_tz::Tz;

pub const REFRESH_MS: u64 = 5000;
pub const ALARM_LIMIT: u32 = 500;

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";
pub const DEFAULT_TZ: Tz = chrono_tz::America::Santiago;
const DEFAULT_WELLS: [&str; 2] = ["pozo1", "pozo2"];

const KEY_API_BASE: &str = "API_BASE";
const KEY_TZ: &str = "APP_TZ";
const KEY_WELLS: &str = "POZOS";

/// Page-session configuration, read once from browser storage at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_base: String,
    pub display_tz: Tz,
    pub wells: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            display_tz: DEFAULT_TZ,
            wells: DEFAULT_WELLS.iter().map(ToString::to_string).collect(),
        }
    }
}

impl AppConfig {
    /// Read configuration from `localStorage`. Missing keys fall back to the
    /// defaults; a key that is present but invalid is an initialization
    /// error, surfaced by the top-level handler.
    pub fn from_storage() -> Result<Self> {
        let defaults = Self::default();

        let api_base = storage_get(KEY_API_BASE)
            .map_or(defaults.api_base, |raw| normalize_base(&raw));

        let display_tz = match storage_get(KEY_TZ) {
            Some(raw) => parse_tz(&raw).ok_or_else(|| anyhow!("unknown timezone {raw:?}"))?,
            None => defaults.display_tz,
        };

        let wells = match storage_get(KEY_WELLS) {
            Some(raw) => parse_wells(&raw)
                .with_context(|| format!("stored well list {raw:?} is not a JSON string array"))?,
            None => defaults.wells,
        };

        Ok(Self {
            api_base,
            display_tz,
            wells,
        })
    }
}

fn storage_get(key: &str) -> Option<String> {
    let storage = leptos::window().local_storage().ok().flatten()?;
    storage
        .get_item(key)
        .ok()
        .flatten()
        .filter(|value| !value.trim().is_empty())
}

pub(crate) fn normalize_base(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

pub(crate) fn parse_tz(raw: &str) -> Option<Tz> {
    raw.trim().parse().ok()
}

pub(crate) fn parse_wells(raw: &str) -> Result<Vec<String>> {
    let wells: Vec<String> = serde_json::from_str(raw)?;
    if wells.is_empty() {
        return Err(anyhow!("well list is empty"));
    }
    Ok(wells)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_loses_trailing_slash() {
        assert_eq!(normalize_base("http://api.local/"), "http://api.local");
        assert_eq!(normalize_base("http://api.local"), "http://api.local");
        assert_eq!(normalize_base(" http://api.local// "), "http://api.local");
    }

    #[test]
    fn timezone_parses_iana_names() {
        assert_eq!(parse_tz("America/Santiago"), Some(DEFAULT_TZ));
        assert_eq!(parse_tz("UTC"), Some(chrono_tz::UTC));
        assert_eq!(parse_tz("Mars/Olympus"), None);
    }

    #[test]
    fn well_list_is_a_json_string_array() {
        assert_eq!(
            parse_wells(r#"["pozo1","pozo2","pozo3"]"#).unwrap(),
            vec!["pozo1", "pozo2", "pozo3"]
        );
        assert!(parse_wells("[]").is_err());
        assert!(parse_wells("pozo1,pozo2").is_err());
    }

    #[test]
    fn defaults_cover_the_documented_fallbacks() {
        let config = AppConfig::default();
        assert_eq!(config.api_base, "http://localhost:8000");
        assert_eq!(config.display_tz, chrono_tz::America::Santiago);
        assert_eq!(config.wells, vec!["pozo1", "pozo2"]);
    }
}
