use chrono_tz::Tz;
use leptos::ev::MouseEvent;
use leptos::{
    component, event_target_value, expect_context, view, Callable, CollectView, IntoView, Signal,
    SignalGet, SignalSet,
};

use crate::components::{fmt_metric, Spinner};
use crate::dashboard::DashboardContext;
use crate::datetime::{time_in_tz, ymd_in_tz};
use crate::types::Reading;

use super::create_series::{create_series, CreateSeriesReturn};
use super::load::reading_instant;
use super::types::{HoverSample, SeriesMode};

const MAX_TABLE_ROWS: usize = 100;

/// Trend section: mode/well/day controls, the canvas chart with its hover
/// tooltip, and the table of plotted readings.
#[component]
pub fn SeriesPanel() -> impl IntoView {
    let ctx = expect_context::<DashboardContext>();
    let tz = ctx.config.display_tz;
    let wells = ctx.config.wells.clone();

    let CreateSeriesReturn {
        canvas_node_ref,
        set_mouse_x,
        set_hovering,
        mode,
        pozo,
        day,
        range_start,
        range_end,
        view,
        is_loading,
        hover,
        mouse_x,
        canvas_actual_width,
        canvas_actual_height,
        apply,
        step_day,
    } = create_series(&ctx);

    let handle_mousemove = move |evt: MouseEvent| {
        let Some(canvas_node) = canvas_node_ref.get() else {
            return;
        };
        let dom_rect = canvas_node.get_bounding_client_rect();
        set_mouse_x.set(f64::from(evt.client_x()) - dom_rect.left());
    };

    let rows = Signal::derive(move || view.get().data.rows);

    view! {
        <section class="panel">
            <div class="panel-header">
                <h2>{move || view.get().title}</h2>
                <div class="controls">
                    <div class="tabs">
                        <button
                            class:active=move || mode.get() == SeriesMode::Day
                            on:click=move |_| mode.set(SeriesMode::Day)
                        >
                            "Día"
                        </button>
                        <button
                            class:active=move || mode.get() == SeriesMode::Range
                            on:click=move |_| mode.set(SeriesMode::Range)
                        >
                            "Recientes"
                        </button>
                    </div>
                    <select
                        prop:value=move || pozo.get()
                        on:change=move |ev| pozo.set(event_target_value(&ev))
                    >
                        {wells
                            .iter()
                            .map(|well| {
                                let well = well.clone();
                                view! { <option value=well.clone()>{well.clone()}</option> }
                            })
                            .collect_view()}
                    </select>
                    <div class="controls" class:hidden=move || mode.get() != SeriesMode::Day>
                        <button on:click=move |_| step_day.call(-1)>"◀"</button>
                        <input
                            type="date"
                            prop:value=move || day.get()
                            on:change=move |ev| {
                                let value = event_target_value(&ev);
                                if !value.is_empty() {
                                    day.set(value);
                                }
                            }
                        />
                        <button on:click=move |_| step_day.call(1)>"▶"</button>
                    </div>
                    <div class="controls" class:hidden=move || mode.get() != SeriesMode::Range>
                        <input
                            type="text"
                            placeholder="Desde (2024-01-01 o 2024-01-01 08:00:00)"
                            prop:value=move || range_start.get()
                            on:change=move |ev| range_start.set(event_target_value(&ev))
                        />
                        <input
                            type="text"
                            placeholder="Hasta"
                            prop:value=move || range_end.get()
                            on:change=move |ev| range_end.set(event_target_value(&ev))
                        />
                        <button on:click=move |_| apply.call(())>"Aplicar"</button>
                    </div>
                </div>
            </div>

            <div
                class="chart-wrap"
                on:mousemove=handle_mousemove
                on:mouseenter=move |_| set_hovering.set(true)
                on:mouseleave=move |_| set_hovering.set(false)
            >
                <div class="chart-loading" class:hidden=move || !is_loading.get()>
                    <Spinner />
                </div>
                <canvas
                    node_ref=canvas_node_ref
                    width=canvas_actual_width
                    height=canvas_actual_height
                />
                <Tooltip hover mouse_x tz />
            </div>

            <SeriesTable rows tz />
        </section>
    }
}

#[component]
fn Tooltip(hover: Signal<Option<HoverSample>>, mouse_x: Signal<f64>, tz: Tz) -> impl IntoView {
    view! {
        <article
            class="tooltip"
            class:hidden=move || hover.get().is_none()
            style:left=move || format!("{}px", mouse_x.get() + 12.0)
        >
            {move || {
                hover
                    .get()
                    .map(|sample| {
                        view! {
                            <div>{time_in_tz(sample.time, tz)}</div>
                            <div class="nivel">"Nivel: " {fmt_metric(sample.nivel, " m")}</div>
                            <div class="caudal">
                                "Caudal: " {fmt_metric(sample.caudal, " L/s")}
                            </div>
                        }
                    })
            }}
        </article>
    }
}

/// Last rows of the plotted series, numbered by their absolute position.
#[component]
fn SeriesTable(rows: Signal<Vec<Reading>>, tz: Tz) -> impl IntoView {
    view! {
        <div class="table-wrap">
            <table>
                <thead>
                    <tr>
                        <th>"#"</th>
                        <th>"Hora"</th>
                        <th>"Nivel (m)"</th>
                        <th>"Caudal (L/s)"</th>
                    </tr>
                </thead>
                <tbody>
                    {move || {
                        let all = rows.get();
                        let total = all.len();
                        if total == 0 {
                            return view! {
                                <tr>
                                    <td colspan="4" class="empty">
                                        "Sin datos para los filtros actuales."
                                    </td>
                                </tr>
                            }
                                .into_view();
                        }
                        let skipped = total.saturating_sub(MAX_TABLE_ROWS);
                        all.into_iter()
                            .enumerate()
                            .skip(skipped)
                            .map(|(index, row)| {
                                let instant = reading_instant(&row, tz);
                                let hora = instant
                                    .map_or_else(|| "—".to_string(), |i| time_in_tz(i, tz));
                                let fecha = instant.map(|i| ymd_in_tz(i, tz));
                                view! {
                                    <tr>
                                        <td>{index + 1}</td>
                                        <td>
                                            {hora}
                                            {fecha
                                                .map(|f| {
                                                    view! { <small>{format!(" ({f})")}</small> }
                                                })}
                                        </td>
                                        <td>{fmt_metric(row.nivel_m, "")}</td>
                                        <td>{fmt_metric(row.caudal_lps, "")}</td>
                                    </tr>
                                }
                            })
                            .collect_view()
                            .into_view()
                    }}
                </tbody>
            </table>
        </div>
    }
}
