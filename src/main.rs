#![deny(clippy::all, clippy::pedantic)]
#![allow(non_snake_case, clippy::module_name_repetitions)]

use leptos::{component, view, IntoView};
use tracing::Level;
use wasm_tracing::WASMLayerConfigBuilder;

use crate::dashboard::Dashboard;

mod alarms;
mod cards;
mod components;
mod config;
mod dashboard;
mod datetime;
mod request;
mod series;
mod types;

fn main() {
    console_error_panic_hook::set_once();
    wasm_tracing::set_as_global_default_with_config(
        WASMLayerConfigBuilder::new()
            .set_max_level(Level::INFO)
            .build(),
    );
    leptos::mount_to_body(|| view! { <App /> });
}

#[component]
fn App() -> impl IntoView {
    view! {
        <main class="container">
            <Dashboard />
        </main>
    }
}
