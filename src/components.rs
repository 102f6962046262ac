use leptos::{component, view, IntoView};

#[component]
pub fn Spinner() -> impl IntoView {
    view! { <span class="spinner" aria-busy="true"></span> }
}

/// Metric display with the em-dash placeholder for absent values.
pub fn fmt_metric(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{v}{unit}"),
        None => "—".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_values_render_an_em_dash() {
        assert_eq!(fmt_metric(None, " m"), "—");
        assert_eq!(fmt_metric(Some(1.2), " m"), "1.2 m");
        assert_eq!(fmt_metric(Some(0.0), " bar"), "0 bar");
    }
}
