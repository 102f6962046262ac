mod components;
mod grouping;

pub use components::AlarmsPanel;
