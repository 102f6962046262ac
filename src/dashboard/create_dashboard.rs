use anyhow::Result;
use chrono::Utc;
use futures::join;
use leptos::{
    create_effect, create_rw_signal, on_cleanup, spawn_local, RwSignal, SignalGet,
    SignalGetUntracked, SignalSet, SignalUpdate, SignalWith,
};
use leptos_use::utils::Pausable;
use leptos_use::{use_document_visibility, use_interval_fn, use_online};
use web_sys::VisibilityState;

use crate::config::{AppConfig, REFRESH_MS};
use crate::datetime::time_in_tz;
use crate::request::{AlarmFilter, ApiClient, RequestSeq};
use crate::types::{Alarm, Reading, Thresholds};

/// Shared plumbing the section components pull from the Leptos context.
#[derive(Clone)]
pub struct DashboardContext {
    pub config: AppConfig,
    pub api: ApiClient,
    /// Bumped after every timer round so the active series view reloads.
    pub refresh_tick: RwSignal<u64>,
}

pub struct CreateDashboardReturn {
    pub ctx: DashboardContext,
    pub healthy: RwSignal<bool>,
    pub latest: RwSignal<Vec<(String, Option<Reading>)>>,
    pub thresholds: RwSignal<Option<Thresholds>>,
    pub alarms: RwSignal<Vec<Alarm>>,
    pub alarm_filter: RwSignal<AlarmFilter>,
    pub last_update: RwSignal<String>,
    pub info_open: RwSignal<Option<String>>,
}

/// Wire the whole page: configuration, API client, the shared section
/// signals, and the pausable refresh loop.
///
/// The refresh machine has two states. The interval runs while the page is
/// visible and the browser online, and is paused otherwise; each round
/// fetches cards data and alarms concurrently and only stamps the
/// last-update label once both sides have settled.
pub fn create_dashboard() -> Result<CreateDashboardReturn> {
    let config = AppConfig::from_storage()?;
    let tz = config.display_tz;

    let healthy = create_rw_signal(true);
    let api = ApiClient::new(&config, healthy);

    let latest = create_rw_signal(
        config
            .wells
            .iter()
            .map(|well| (well.clone(), None))
            .collect::<Vec<_>>(),
    );
    let thresholds = create_rw_signal(None::<Thresholds>);
    let alarms = create_rw_signal(Vec::<Alarm>::new());
    let alarm_filter = create_rw_signal(AlarmFilter::default());
    let last_update = create_rw_signal("Cargando…".to_string());
    let info_open = create_rw_signal(None::<String>);
    let refresh_tick = create_rw_signal(0_u64);
    let seq = RequestSeq::default();

    let ctx = DashboardContext {
        config: config.clone(),
        api: api.clone(),
        refresh_tick,
    };

    let refresh = {
        let api = api.clone();
        let wells = config.wells.clone();
        let seq = seq.clone();
        move || {
            let api = api.clone();
            let wells = wells.clone();
            let seq = seq.clone();
            let ticket = seq.begin();
            let filter = alarm_filter.get_untracked();

            spawn_local(async move {
                let cards = async {
                    let th = api.thresholds().await;
                    let mut pairs = Vec::with_capacity(wells.len());
                    for pozo in &wells {
                        pairs.push((pozo.clone(), api.latest(pozo).await));
                    }
                    (th, pairs)
                };
                let ((th, pairs), alarm_rows) = join!(cards, api.alarms(&filter));

                // A newer round owns the view now; drop this one.
                if !seq.is_current(ticket) {
                    return;
                }
                let _ = thresholds.try_set(th);
                let _ = latest.try_set(pairs);
                let _ = alarms.try_set(alarm_rows);
                let _ = last_update.try_set(format!(
                    "Última actualización: {}",
                    time_in_tz(Utc::now(), tz)
                ));
            });
        }
    };

    // Runs once at setup (the initial refresh) and again whenever the alarm
    // filter changes.
    let filter_refresh = refresh.clone();
    create_effect(move |_| {
        alarm_filter.track();
        filter_refresh();
    });

    let visibility = use_document_visibility();
    let online = use_online();

    let tick_refresh = refresh.clone();
    let Pausable { pause, resume, .. } = use_interval_fn(
        move || {
            // The effect below governs the timer; this guard covers a tick
            // already queued when the page just went hidden or offline.
            if visibility.get_untracked() != VisibilityState::Visible || !online.get_untracked() {
                return;
            }
            tick_refresh();
            refresh_tick.update(|tick| *tick += 1);
        },
        REFRESH_MS,
    );

    create_effect(move |_| {
        if visibility.get() == VisibilityState::Visible && online.get() {
            resume();
        } else {
            pause();
        }
    });

    {
        let api = api.clone();
        on_cleanup(move || api.invalidate_thresholds());
    }

    Ok(CreateDashboardReturn {
        ctx,
        healthy,
        latest,
        thresholds,
        alarms,
        alarm_filter,
        last_update,
        info_open,
    })
}
