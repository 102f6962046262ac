use leptos::{
    component, provide_context, view, Callback, IntoView, Signal, SignalGet, SignalSet,
};
use tracing::error;

use crate::alarms::AlarmsPanel;
use crate::cards::{Cards, InfoModal};
use crate::series::SeriesPanel;
use crate::types::Thresholds;

use super::create_dashboard::create_dashboard;

/// Page shell. A failed initialization (invalid stored configuration) does
/// not crash the page; it replaces the status area with an error message.
#[component]
pub fn Dashboard() -> impl IntoView {
    let dash = match create_dashboard() {
        Ok(dash) => dash,
        Err(err) => {
            error!("dashboard initialization failed: {err:#}");
            return view! {
                <div class="status error">
                    "Error de inicialización. Revise la configuración guardada."
                </div>
            }
            .into_view();
        }
    };

    provide_context(dash.ctx.clone());

    let api_base = dash.ctx.config.api_base.clone();
    let wells = dash.ctx.config.wells.clone();
    let tz = dash.ctx.config.display_tz;

    let healthy = dash.healthy;
    let last_update = dash.last_update;
    let info_open = dash.info_open;
    let thresholds: Signal<Option<Thresholds>> = dash.thresholds.into();
    let on_info = Callback::new(move |pozo: String| info_open.set(Some(pozo)));

    view! {
        <header class="topbar">
            <h1>"Panel de Operación – Red de Pozos"</h1>
            <div class="top-meta">
                <span class="badge-api" class:error=move || !healthy.get()>{api_base}</span>
                <span class="last-update">{move || last_update.get()}</span>
            </div>
        </header>

        <Cards latest=dash.latest.into() thresholds on_info />
        <SeriesPanel />
        <AlarmsPanel alarms=dash.alarms.into() filter=dash.alarm_filter wells tz />
        <InfoModal open_for=info_open thresholds />
    }
    .into_view()
}
