use std::rc::Rc;

use chrono::DateTime;
use chrono_tz::Tz;
use leptos::html::Canvas;
use leptos::{
    create_effect, create_memo, create_node_ref, create_rw_signal, create_signal, spawn_local,
    Callback, NodeRef, RwSignal, Signal, SignalGet, SignalGetUntracked, SignalSet, SignalUpdate,
    SignalWith, WriteSignal,
};
use leptos_use::{use_device_pixel_ratio, use_element_size, UseElementSizeReturn};
use tracing::error;

use crate::dashboard::DashboardContext;
use crate::datetime::{add_days, today};
use crate::request::RequestSeq;

use super::canvas::{closest_point, Frame, SeriesCanvas};
use super::load::{load_day, load_range};
use super::types::{HoverSample, SeriesMode, SeriesView};

pub struct CreateSeriesReturn {
    pub canvas_node_ref: NodeRef<Canvas>,

    pub set_mouse_x: WriteSignal<f64>,
    pub set_hovering: WriteSignal<bool>,

    pub mode: RwSignal<SeriesMode>,
    pub pozo: RwSignal<String>,
    pub day: RwSignal<String>,
    pub range_start: RwSignal<String>,
    pub range_end: RwSignal<String>,

    pub view: Signal<SeriesView>,
    pub is_loading: Signal<bool>,
    pub hover: Signal<Option<HoverSample>>,
    pub mouse_x: Signal<f64>,
    pub canvas_actual_width: Signal<f64>,
    pub canvas_actual_height: Signal<f64>,

    pub apply: Callback<()>,
    pub step_day: Callback<i64>,
}

/// Signals and effects behind the trend panel: the selected well/day/range,
/// the loaded view, the canvas bound to it, and the hover readout.
pub fn create_series(ctx: &DashboardContext) -> CreateSeriesReturn {
    let tz = ctx.config.display_tz;
    let api = ctx.api.clone();
    let refresh_tick = ctx.refresh_tick;

    let default_pozo = ctx
        .config
        .wells
        .first()
        .cloned()
        .unwrap_or_else(|| "pozo1".to_string());

    let mode = create_rw_signal(SeriesMode::Day);
    let pozo = create_rw_signal(default_pozo);
    let day = create_rw_signal(today(tz));
    let range_start = create_rw_signal(String::new());
    let range_end = create_rw_signal(String::new());

    let (view, set_view) = create_signal(SeriesView::default());
    let (pending, set_pending) = create_signal(0_u32);
    let seq = RequestSeq::default();

    let reload = move || {
        let api = api.clone();
        let seq = seq.clone();
        let ticket = seq.begin();

        let mode = mode.get_untracked();
        let pozo = pozo.get_untracked();
        let day = day.get_untracked();
        let start = range_start.get_untracked();
        let end = range_end.get_untracked();

        set_pending.update(|n| *n += 1);
        spawn_local(async move {
            let loaded = match mode {
                SeriesMode::Day => load_day(&api, tz, &pozo, &day).await,
                SeriesMode::Range => {
                    load_range(&api, tz, &pozo, opt_param(&start), opt_param(&end)).await
                }
            };
            let _ = set_pending.try_update(|n| *n = n.saturating_sub(1));
            // A newer round may have started while this one was in flight.
            if seq.is_current(ticket) {
                let _ = set_view.try_set(loaded);
            }
        });
    };

    let reload_on_change = reload.clone();
    create_effect(move |_| {
        mode.track();
        pozo.track();
        day.track();
        refresh_tick.track();
        reload_on_change();
    });

    let apply_reload = reload.clone();
    let apply = Callback::new(move |()| apply_reload());

    let step_day = Callback::new(move |delta: i64| {
        let current = day.get_untracked();
        match add_days(&current, delta, tz) {
            Some(next) => day.set(next),
            None => error!(%current, "cannot step an unparseable day"),
        }
    });

    let canvas_node_ref = create_node_ref::<Canvas>();
    let dpr = use_device_pixel_ratio();
    let UseElementSizeReturn {
        width: canvas_width,
        height: canvas_height,
    } = use_element_size(canvas_node_ref);
    let canvas_actual_width = Signal::derive(move || canvas_width.get() * dpr.get());
    let canvas_actual_height = Signal::derive(move || canvas_height.get() * dpr.get());

    let (mouse_x, set_mouse_x) = create_signal(0.0);
    let (hovering, set_hovering) = create_signal(false);

    let (canvas, set_canvas) = create_signal::<Option<Rc<SeriesCanvas>>>(None);
    create_effect(move |_| {
        let Some(node) = canvas_node_ref.get() else {
            return;
        };
        match SeriesCanvas::try_new(&node) {
            Ok(series_canvas) => set_canvas.set(Some(Rc::new(series_canvas))),
            Err(err) => error!("series canvas failed to initialize: {err}"),
        }
    });

    create_effect(move |_| {
        let Some(canvas) = canvas.get() else {
            return;
        };
        view.with(|current| {
            canvas.render(
                current,
                tz,
                canvas_width.get(),
                canvas_height.get(),
                mouse_x.get(),
                dpr.get(),
            );
        });
    });

    let hover = create_memo(move |_| {
        if !hovering.get() {
            return None;
        }
        let width = canvas_width.get();
        let height = canvas_height.get();
        let x = mouse_x.get();

        view.with(|current| {
            let frame = Frame::for_view(current, width, height)?;
            if x < frame.plot_left() || x > frame.plot_right() {
                return None;
            }
            let at = DateTime::from_timestamp_millis(frame.x_to_time(x))?;
            let nivel = closest_point(&current.data.nivel, at).map(|p| p.value);
            let caudal = closest_point(&current.data.caudal, at).map(|p| p.value);
            if nivel.is_none() && caudal.is_none() {
                return None;
            }
            Some(HoverSample {
                time: at,
                nivel,
                caudal,
            })
        })
    });

    let is_loading = Signal::derive(move || pending.get() > 0);

    CreateSeriesReturn {
        canvas_node_ref,

        set_mouse_x,
        set_hovering,

        mode,
        pozo,
        day,
        range_start,
        range_end,

        view: view.into(),
        is_loading,
        hover: hover.into(),
        mouse_x: mouse_x.into(),
        canvas_actual_width,
        canvas_actual_height,

        apply,
        step_day,
    }
}

fn opt_param(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
