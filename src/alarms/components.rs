use chrono_tz::Tz;
use leptos::{
    component, event_target_value, view, CollectView, IntoView, RwSignal, Signal, SignalGet,
    SignalSet, SignalUpdate,
};

use crate::request::AlarmFilter;
use crate::types::Alarm;

use super::grouping::{alarm_instant, group_by_day};
use crate::datetime::time_in_tz;

/// Alarm history with well/day filters, grouped by calendar day.
#[component]
pub fn AlarmsPanel(
    alarms: Signal<Vec<Alarm>>,
    filter: RwSignal<AlarmFilter>,
    wells: Vec<String>,
    tz: Tz,
) -> impl IntoView {
    let options = wells.clone();

    view! {
        <section class="panel">
            <div class="panel-header">
                <h2>"Alarmas"</h2>
                <div class="controls">
                    <select
                        prop:value=move || filter.get().pozo.unwrap_or_default()
                        on:change=move |ev| {
                            let value = event_target_value(&ev);
                            filter
                                .update(|f| {
                                    f.pozo = (!value.is_empty()).then_some(value);
                                });
                        }
                    >
                        <option value="">"Todos los pozos"</option>
                        {options
                            .iter()
                            .map(|pozo| {
                                let pozo = pozo.clone();
                                view! { <option value=pozo.clone()>{pozo.clone()}</option> }
                            })
                            .collect_view()}
                    </select>
                    <input
                        type="date"
                        prop:value=move || filter.get().day.clone().unwrap_or_default()
                        on:change=move |ev| {
                            let value = event_target_value(&ev);
                            filter
                                .update(|f| {
                                    f.day = (!value.is_empty()).then_some(value);
                                });
                        }
                    />
                    <button on:click=move |_| filter.set(AlarmFilter::default())>
                        "Limpiar"
                    </button>
                </div>
            </div>
            <div class="alarm-list">
                {move || {
                    let groups = group_by_day(&alarms.get(), tz);
                    if groups.is_empty() {
                        view! {
                            <div class="item">
                                <div class="msg">
                                    "No hay alarmas para los filtros seleccionados."
                                </div>
                            </div>
                        }
                            .into_view()
                    } else {
                        groups
                            .into_iter()
                            .map(|group| {
                                view! {
                                    <div class="group">
                                        <div class="day">{group.day.clone()}</div>
                                        {group
                                            .items
                                            .iter()
                                            .map(|alarm| alarm_item(alarm, tz))
                                            .collect_view()}
                                    </div>
                                }
                            })
                            .collect_view()
                            .into_view()
                    }
                }}
            </div>
        </section>
    }
}

fn alarm_item(alarm: &Alarm, tz: Tz) -> impl IntoView {
    let time = alarm_instant(alarm, tz)
        .map_or_else(|| "—".to_string(), |instant| time_in_tz(instant, tz));

    view! {
        <div class=format!("item {}", alarm.severity.class())>
            <div class="msg">{alarm.display_message().to_string()}</div>
            <div class="meta">
                <span>{alarm.pozo.to_uppercase()}</span>
                <span>{time}</span>
            </div>
        </div>
    }
}
