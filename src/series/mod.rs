mod canvas;
mod components;
mod create_series;
mod load;
mod types;

pub use components::SeriesPanel;
