use crate::types::Thresholds;

/// Card metrics are binary: normal or critical, no intermediate warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricState {
    Normal,
    Critical,
}

impl MetricState {
    pub fn class(self) -> &'static str {
        match self {
            Self::Normal => "ok",
            Self::Critical => "crit",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricStatus {
    pub state: MetricState,
    pub hint: Option<String>,
}

impl MetricStatus {
    pub fn normal() -> Self {
        Self {
            state: MetricState::Normal,
            hint: None,
        }
    }

    fn critical(hint: String) -> Self {
        Self {
            state: MetricState::Critical,
            hint: Some(hint),
        }
    }
}

/// Absent values are never critical; they render as an em-dash instead.
pub fn nivel_status(value: Option<f64>, th: &Thresholds) -> MetricStatus {
    match value {
        Some(v) if v < th.nivel_low_m => {
            MetricStatus::critical(format!("Nivel bajo (< {} m)", th.nivel_low_m))
        }
        Some(v) if v > th.nivel_high_m => {
            MetricStatus::critical(format!("Nivel alto (> {} m)", th.nivel_high_m))
        }
        _ => MetricStatus::normal(),
    }
}

pub fn cloro_status(value: Option<f64>, th: &Thresholds) -> MetricStatus {
    match value {
        Some(v) if v < th.cloro_min_mg_l => {
            MetricStatus::critical(format!("Cloro bajo (< {} mg/L)", th.cloro_min_mg_l))
        }
        Some(v) if v > th.cloro_max_mg_l => {
            MetricStatus::critical(format!("Cloro alto (> {} mg/L)", th.cloro_max_mg_l))
        }
        _ => MetricStatus::normal(),
    }
}

pub fn presion_status(value: Option<f64>, th: &Thresholds) -> MetricStatus {
    match value {
        Some(v) if v < th.presion_min_bar => {
            MetricStatus::critical(format!("Presión baja (< {} bar)", th.presion_min_bar))
        }
        _ => MetricStatus::normal(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InfoRow {
    pub titulo: &'static str,
    pub normal: String,
    pub alerta: String,
    pub nota: &'static str,
}

/// Rows for the threshold-information modal, one per monitored metric.
pub fn info_rows(th: &Thresholds) -> Vec<InfoRow> {
    vec![
        InfoRow {
            titulo: "Nivel (m)",
            normal: format!("Entre {} y {}", th.nivel_low_m, th.nivel_high_m),
            alerta: format!("Bajo < {} · Alto > {}", th.nivel_low_m, th.nivel_high_m),
            nota: "Evitar sobrellenado o vaciado.",
        },
        InfoRow {
            titulo: "Cloro (mg/L)",
            normal: format!("Entre {} y {}", th.cloro_min_mg_l, th.cloro_max_mg_l),
            alerta: format!("Bajo < {} · Alto > {}", th.cloro_min_mg_l, th.cloro_max_mg_l),
            nota: "Mantener dentro de norma sanitaria.",
        },
        InfoRow {
            titulo: "Presión (bar)",
            normal: format!("≥ {}", th.presion_min_bar),
            alerta: format!("Baja < {}", th.presion_min_bar),
            nota: "Revisar presurizadora o demanda alta.",
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_level_is_critical_with_a_low_hint() {
        let th = Thresholds::default();
        let status = nivel_status(Some(0.5), &th);
        assert_eq!(status.state, MetricState::Critical);
        assert_eq!(status.hint.as_deref(), Some("Nivel bajo (< 0.9 m)"));
    }

    #[test]
    fn in_range_level_is_normal() {
        let th = Thresholds::default();
        let status = nivel_status(Some(1.5), &th);
        assert_eq!(status.state, MetricState::Normal);
        assert_eq!(status.hint, None);
    }

    #[test]
    fn high_level_is_critical_with_a_high_hint() {
        let th = Thresholds::default();
        let status = nivel_status(Some(3.0), &th);
        assert_eq!(status.state, MetricState::Critical);
        assert_eq!(status.hint.as_deref(), Some("Nivel alto (> 2.5 m)"));
    }

    #[test]
    fn chlorine_band_is_checked_both_ways() {
        let th = Thresholds::default();
        assert_eq!(cloro_status(Some(0.1), &th).state, MetricState::Critical);
        assert_eq!(cloro_status(Some(2.0), &th).state, MetricState::Critical);
        assert_eq!(cloro_status(Some(0.8), &th).state, MetricState::Normal);
    }

    #[test]
    fn pressure_only_alerts_low() {
        let th = Thresholds::default();
        assert_eq!(presion_status(Some(0.4), &th).state, MetricState::Critical);
        assert_eq!(presion_status(Some(4.0), &th).state, MetricState::Normal);
    }

    #[test]
    fn absent_values_are_never_critical() {
        let th = Thresholds::default();
        assert_eq!(nivel_status(None, &th).state, MetricState::Normal);
        assert_eq!(cloro_status(None, &th).state, MetricState::Normal);
        assert_eq!(presion_status(None, &th).state, MetricState::Normal);
    }

    #[test]
    fn info_rows_cover_the_three_alerting_metrics() {
        let rows = info_rows(&Thresholds::default());
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].normal, "Entre 0.9 y 2.5");
        assert_eq!(rows[2].alerta, "Baja < 1");
    }
}
