use leptos::{
    component, view, Callable, Callback, For, IntoView, RwSignal, Signal, SignalGet, SignalSet,
};

use crate::components::fmt_metric;
use crate::types::{Reading, Thresholds};

use super::status::{cloro_status, info_rows, nivel_status, presion_status, MetricStatus};

/// One status card per configured well, newest reading and thresholds
/// applied reactively.
#[component]
pub fn Cards(
    latest: Signal<Vec<(String, Option<Reading>)>>,
    thresholds: Signal<Option<Thresholds>>,
    on_info: Callback<String>,
) -> impl IntoView {
    view! {
        <div class="cards">
            <For
                each=move || latest.get()
                key=|(pozo, reading)| {
                    (pozo.clone(), reading.as_ref().and_then(|r| r.created_at.clone()))
                }
                let:pair
            >
                <Card pozo=pair.0 reading=pair.1 thresholds on_info />
            </For>
        </div>
    }
}

#[component]
fn Card(
    pozo: String,
    reading: Option<Reading>,
    thresholds: Signal<Option<Thresholds>>,
    on_info: Callback<String>,
) -> impl IntoView {
    let title = pozo.to_uppercase();
    let info_pozo = pozo.clone();
    let info_button = view! {
        <button
            class="info-btn"
            title="Rangos de operación"
            on:click=move |_| on_info.call(info_pozo.clone())
        >
            "i"
        </button>
    };

    let Some(reading) = reading else {
        return view! {
            <div class="card">
                <div class="card-header">
                    <h3>{title}</h3>
                    {info_button}
                </div>
                <p>"Sin datos disponibles"</p>
            </div>
        }
        .into_view();
    };

    let bomba_on = reading.bomba_on.unwrap_or(false);
    let badge_label = if bomba_on { "Encendida" } else { "Apagada" };
    let badge_class = if bomba_on { "badge ok" } else { "badge off" };

    view! {
        <div class="card">
            <div class="card-header">
                <h3>{title}</h3>
                <div class="card-actions">
                    <span class=badge_class>{badge_label}</span>
                    {info_button}
                </div>
            </div>
            <div class="kpis">
                {move || {
                    let th = thresholds.get().unwrap_or_default();
                    view! {
                        <Kpi
                            label="Nivel del estanque"
                            value=fmt_metric(reading.nivel_m, " m")
                            status=nivel_status(reading.nivel_m, &th)
                        />
                        <Kpi
                            label="Caudal de salida"
                            value=fmt_metric(reading.caudal_lps, " L/s")
                            status=MetricStatus::normal()
                        />
                        <Kpi
                            label="Cloro residual"
                            value=fmt_metric(reading.cloro_mg_l, " mg/L")
                            status=cloro_status(reading.cloro_mg_l, &th)
                        />
                        <Kpi
                            label="Presión"
                            value=fmt_metric(reading.presion_bar, " bar")
                            status=presion_status(reading.presion_bar, &th)
                        />
                    }
                }}
            </div>
        </div>
    }
    .into_view()
}

#[component]
fn Kpi(label: &'static str, value: String, status: MetricStatus) -> impl IntoView {
    view! {
        <div class=format!("kpi {}", status.state.class())>
            <label>{label}</label>
            <strong>{value}</strong>
            {status.hint.map(|hint| view! { <div class="note">{hint}</div> })}
        </div>
    }
}

/// Modal listing the normal/alert ranges per metric for one well. Falls back
/// to the default threshold set, with a notice, when the server set never
/// loaded.
#[component]
pub fn InfoModal(
    open_for: RwSignal<Option<String>>,
    thresholds: Signal<Option<Thresholds>>,
) -> impl IntoView {
    view! {
        <div
            class="modal"
            class:hidden=move || open_for.get().is_none()
            on:click=move |ev| {
                if ev.target() == ev.current_target() {
                    open_for.set(None);
                }
            }
        >
            <div class="modal-box">
                <div class="modal-head">
                    <h3>
                        {move || {
                            open_for
                                .get()
                                .map(|pozo| {
                                    format!("Rangos de operación – {}", pozo.to_uppercase())
                                })
                                .unwrap_or_default()
                        }}
                    </h3>
                    <button class="info-btn" on:click=move |_| open_for.set(None)>
                        "✕"
                    </button>
                </div>
                {move || {
                    let server = thresholds.get();
                    let rows = info_rows(&server.unwrap_or_default());
                    view! {
                        <p class="small">
                            {if server.is_some() {
                                "Rangos definidos por el servidor."
                            } else {
                                "Umbrales del servidor no disponibles; mostrando valores por defecto."
                            }}
                        </p>
                        <div class="stats-grid">
                            <For each=move || rows.clone() key=|row| row.titulo let:row>
                                <div class="stat">
                                    <h4>{row.titulo} <span class="pill ok">"Normal"</span></h4>
                                    <div class="row">
                                        <div>"Rango"</div>
                                        <div class="value">{row.normal}</div>
                                    </div>
                                    <div class="row">
                                        <span class="pill warn">"Alerta"</span>
                                        <div class="value">{row.alerta}</div>
                                    </div>
                                    <div class="note">{row.nota}</div>
                                </div>
                            </For>
                        </div>
                    }
                }}
            </div>
        </div>
    }
}
