use std::f64::consts::PI;

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use humantime::format_duration;
use leptos::html::Canvas;
use leptos::HtmlElement;
use tracing::error;
use wasm_bindgen::JsCast;
use web_sys::CanvasRenderingContext2d;

use super::types::{SeriesData, SeriesPoint, SeriesView};

const BACKGROUND: &str = "#0e1526";
const GRID_COLOR: &str = "#1f2c48";
const AXIS_TEXT: &str = "#90a0bf";
const NIVEL_COLOR: &str = "#00b8ff";
const CAUDAL_COLOR: &str = "#2ee6a8";

const MARGIN_SIDE: f64 = 48.0;
const MARGIN_TOP: f64 = 10.0;
const MARGIN_BOTTOM: f64 = 26.0;
const TICK_SPACING_PX: f64 = 110.0;
const VALUE_STEPS: u32 = 4;

/// Dual-scale line chart for one well: tank level against the left scale,
/// outflow against the right.
pub struct SeriesCanvas {
    ctx: CanvasRenderingContext2d,
}

impl SeriesCanvas {
    pub fn try_new(node: &HtmlElement<Canvas>) -> Result<Self> {
        #[derive(serde::Serialize)]
        struct ContextOptions {
            alpha: bool,
        }

        let ctx = node
            .get_context_with_context_options(
                "2d",
                &serde_wasm_bindgen::to_value(&ContextOptions { alpha: false })
                    .map_err(|err| anyhow!("context options serialization error: {err}"))?,
            )
            .map_err(|err| anyhow!("{err:?}"))?;
        let Some(ctx) = ctx else {
            bail!("canvas' 2d context not found");
        };

        let ctx = ctx
            .dyn_into()
            .map_err(|err| anyhow!("context dyn conversion error: {err:?}"))?;

        Ok(Self { ctx })
    }

    pub fn render(
        &self,
        view: &SeriesView,
        tz: Tz,
        width: f64,
        height: f64,
        mouse_x: f64,
        dpr: f64,
    ) {
        if width < f64::EPSILON || height < f64::EPSILON {
            return;
        }

        self.ctx.save();
        if let Err(err) = self.ctx.scale(dpr, dpr) {
            error!(dpr, "context scaling failed: {err:?}");
        }
        self.ctx.set_font("12px system-ui");
        self.ctx.set_fill_style_str(BACKGROUND);
        self.ctx.fill_rect(0.0, 0.0, width, height);

        let Some(frame) = Frame::for_view(view, width, height) else {
            self.ctx.set_fill_style_str(AXIS_TEXT);
            if let Err(err) =
                self.ctx
                    .fill_text("Sin datos para los filtros actuales.", MARGIN_SIDE, height / 2.0)
            {
                error!("fill text error: {err:?}");
            }
            self.ctx.restore();
            return;
        };

        self.render_time_ticks(&frame, tz);
        self.render_value_scale(&frame, frame.nivel_bounds, NIVEL_COLOR, ScaleSide::Left);
        self.render_value_scale(&frame, frame.caudal_bounds, CAUDAL_COLOR, ScaleSide::Right);
        self.render_line(&view.data.nivel, &frame, frame.nivel_bounds, NIVEL_COLOR);
        self.render_line(&view.data.caudal, &frame, frame.caudal_bounds, CAUDAL_COLOR);
        self.render_hover_dots(view, &frame, mouse_x);
        if cfg!(debug_assertions) {
            self.render_stats(view, &frame);
        }

        self.ctx.restore();
    }

    fn render_time_ticks(&self, frame: &Frame, tz: Tz) {
        let bottom = frame.plot_bottom();

        self.ctx.set_stroke_style_str(AXIS_TEXT);
        self.ctx.begin_path();
        self.ctx.move_to(frame.plot_left(), bottom);
        self.ctx.line_to(frame.plot_right(), bottom);
        self.ctx.stroke();

        #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let ticks = ((frame.plot_width() / TICK_SPACING_PX) as u32).max(1);

        for i in 0..=ticks {
            let t = frame.t0 + (frame.t1 - frame.t0) * i64::from(i) / i64::from(ticks);
            let x = frame.time_to_x(t);

            self.ctx.set_stroke_style_str(GRID_COLOR);
            self.ctx.begin_path();
            self.ctx.move_to(x, frame.plot_top());
            self.ctx.line_to(x, bottom);
            self.ctx.stroke();

            let Some(instant) = DateTime::from_timestamp_millis(t) else {
                continue;
            };
            let label = instant.with_timezone(&tz).format("%H:%M").to_string();
            self.ctx.set_fill_style_str(AXIS_TEXT);
            if let Err(err) = self.ctx.fill_text(&label, x - 16.0, bottom + 16.0) {
                error!("fill text error: {err:?}");
            }
        }
    }

    fn render_value_scale(
        &self,
        frame: &Frame,
        bounds: (f64, f64),
        color: &str,
        side: ScaleSide,
    ) {
        self.ctx.set_fill_style_str(color);
        for step in 0..=VALUE_STEPS {
            let value = bounds.0 + (bounds.1 - bounds.0) * f64::from(step) / f64::from(VALUE_STEPS);
            let y = frame.value_to_y(value, bounds);
            let label = format!("{value:.2}");
            let x = match side {
                ScaleSide::Left => 4.0,
                ScaleSide::Right => frame.plot_right() + 4.0,
            };
            if let Err(err) = self.ctx.fill_text(&label, x, y + 4.0) {
                error!("fill text error: {err:?}");
            }
        }
    }

    fn render_line(&self, points: &[SeriesPoint], frame: &Frame, bounds: (f64, f64), color: &str) {
        if points.is_empty() {
            return;
        }

        self.ctx.set_stroke_style_str(color);
        self.ctx.set_line_width(1.5);
        self.ctx.begin_path();
        let mut started = false;
        for point in points {
            let t = point.time.timestamp_millis();
            if t < frame.t0 || t > frame.t1 {
                continue;
            }
            let x = frame.time_to_x(t);
            let y = frame.value_to_y(point.value, bounds);
            if started {
                self.ctx.line_to(x, y);
            } else {
                self.ctx.move_to(x, y);
                started = true;
            }
        }
        self.ctx.stroke();
        self.ctx.set_line_width(1.0);
    }

    fn render_hover_dots(&self, view: &SeriesView, frame: &Frame, mouse_x: f64) {
        if mouse_x < frame.plot_left() || mouse_x > frame.plot_right() {
            return;
        }
        let Some(at) = DateTime::from_timestamp_millis(frame.x_to_time(mouse_x)) else {
            return;
        };

        let dots = [
            (&view.data.nivel, frame.nivel_bounds, NIVEL_COLOR),
            (&view.data.caudal, frame.caudal_bounds, CAUDAL_COLOR),
        ];
        for (points, bounds, color) in dots {
            let Some(point) = closest_point(points, at) else {
                continue;
            };
            let x = frame.time_to_x(point.time.timestamp_millis());
            let y = frame.value_to_y(point.value, bounds);

            self.ctx.set_fill_style_str(color);
            self.ctx.begin_path();
            if let Err(err) = self.ctx.arc(x, y, 3.0, 0.0, 2.0 * PI) {
                error!("arc drawing error: {err:?}");
            }
            self.ctx.fill();
        }
    }

    fn render_stats(&self, view: &SeriesView, frame: &Frame) {
        let num_points = view.data.nivel.len() + view.data.caudal.len();
        self.ctx.set_fill_style_str(AXIS_TEXT);
        if let Err(err) = self.ctx.fill_text(
            &format!("rendering {num_points} points"),
            frame.plot_left() + 8.0,
            frame.plot_top() + 14.0,
        ) {
            error!("fill text error: {err:?}");
        }

        #[expect(clippy::cast_sign_loss)]
        let span = std::time::Duration::from_millis((frame.t1 - frame.t0).max(0) as u64);
        let marker = if view.auto_scaled { " (auto)" } else { "" };
        if let Err(err) = self.ctx.fill_text(
            &format!("window {}{marker}", format_duration(span)),
            frame.plot_left() + 8.0,
            frame.plot_top() + 30.0,
        ) {
            error!("fill text error: {err:?}");
        }
    }
}

enum ScaleSide {
    Left,
    Right,
}

/// Plot geometry for one render: time range in epoch milliseconds plus the
/// padded value bounds of each series. Pure, so the coordinate math is
/// testable off the canvas.
pub struct Frame {
    pub width: f64,
    pub height: f64,
    pub t0: i64,
    pub t1: i64,
    pub nivel_bounds: (f64, f64),
    pub caudal_bounds: (f64, f64),
}

impl Frame {
    pub fn for_view(view: &SeriesView, width: f64, height: f64) -> Option<Self> {
        let (t0, t1) = match view.window {
            Some((start, end)) => (start.timestamp_millis(), end.timestamp_millis()),
            None => data_time_span(&view.data)?,
        };
        if t1 <= t0 {
            return None;
        }

        Some(Self {
            width,
            height,
            t0,
            t1,
            nivel_bounds: value_bounds(&view.data.nivel),
            caudal_bounds: value_bounds(&view.data.caudal),
        })
    }

    pub fn plot_left(&self) -> f64 {
        MARGIN_SIDE
    }

    pub fn plot_right(&self) -> f64 {
        self.width - MARGIN_SIDE
    }

    pub fn plot_top(&self) -> f64 {
        MARGIN_TOP
    }

    pub fn plot_bottom(&self) -> f64 {
        self.height - MARGIN_BOTTOM
    }

    pub fn plot_width(&self) -> f64 {
        (self.plot_right() - self.plot_left()).max(1.0)
    }

    #[expect(clippy::cast_precision_loss)]
    pub fn time_to_x(&self, t: i64) -> f64 {
        let factor = (t - self.t0) as f64 / (self.t1 - self.t0) as f64;
        self.plot_left() + factor * self.plot_width()
    }

    #[expect(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn x_to_time(&self, x: f64) -> i64 {
        let factor = (x - self.plot_left()) / self.plot_width();
        self.t0 + (factor * (self.t1 - self.t0) as f64) as i64
    }

    pub fn value_to_y(&self, value: f64, bounds: (f64, f64)) -> f64 {
        let factor = (value - bounds.0) / (bounds.1 - bounds.0);
        self.plot_bottom() - factor * (self.plot_bottom() - self.plot_top())
    }
}

/// Padded min/max of a point sequence; a flat series gets a unit band so it
/// draws mid-plot instead of on an empty range.
pub fn value_bounds(points: &[SeriesPoint]) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for point in points {
        min = min.min(point.value);
        max = max.max(point.value);
    }
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    if (max - min).abs() < f64::EPSILON {
        return (min - 1.0, max + 1.0);
    }
    let pad = (max - min) * 0.1;
    (min - pad, max + pad)
}

/// Time span of the data itself, used when no axis window is clamped. A
/// single instant widens to a minute so the frame keeps a nonzero span.
pub fn data_time_span(data: &SeriesData) -> Option<(i64, i64)> {
    let times = data
        .nivel
        .iter()
        .chain(&data.caudal)
        .map(|point| point.time.timestamp_millis());
    let min = times.clone().min()?;
    let max = times.max().unwrap_or(min);
    if min == max {
        Some((min - 60_000, max + 60_000))
    } else {
        Some((min, max))
    }
}

/// Closest point to an instant in an ascending sequence.
pub fn closest_point(points: &[SeriesPoint], at: DateTime<Utc>) -> Option<SeriesPoint> {
    let split = points.partition_point(|point| point.time < at);
    let after = points.get(split);
    let before = split.checked_sub(1).and_then(|i| points.get(i));

    match (before, after) {
        (Some(b), Some(a)) => {
            if at - b.time <= a.time - at {
                Some(*b)
            } else {
                Some(*a)
            }
        }
        (Some(b), None) => Some(*b),
        (None, Some(a)) => Some(*a),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn point(secs: i64, value: f64) -> SeriesPoint {
        SeriesPoint {
            time: Utc.timestamp_opt(secs, 0).unwrap(),
            value,
        }
    }

    fn frame() -> Frame {
        Frame {
            width: 448.0,
            height: 336.0,
            t0: 0,
            t1: 1000,
            nivel_bounds: (0.0, 10.0),
            caudal_bounds: (0.0, 1.0),
        }
    }

    #[test]
    fn time_x_mapping_round_trips_across_the_plot() {
        let frame = frame();
        assert_eq!(frame.time_to_x(0), frame.plot_left());
        assert_eq!(frame.time_to_x(1000), frame.plot_right());
        let mid_x = frame.time_to_x(500);
        assert_eq!(frame.x_to_time(mid_x), 500);
    }

    #[test]
    fn values_map_top_to_bottom() {
        let frame = frame();
        assert_eq!(frame.value_to_y(0.0, frame.nivel_bounds), frame.plot_bottom());
        assert_eq!(frame.value_to_y(10.0, frame.nivel_bounds), frame.plot_top());
    }

    #[test]
    fn bounds_pad_and_widen_flat_series() {
        let spread = value_bounds(&[point(0, 1.0), point(1, 3.0)]);
        assert!((spread.0 - 0.8).abs() < 1e-9);
        assert!((spread.1 - 3.2).abs() < 1e-9);

        assert_eq!(value_bounds(&[point(0, 2.0)]), (1.0, 3.0));
        assert_eq!(value_bounds(&[]), (0.0, 1.0));
    }

    #[test]
    fn data_span_widens_a_single_instant() {
        let mut data = SeriesData::default();
        assert_eq!(data_time_span(&data), None);

        data.nivel = vec![point(100, 1.0)];
        assert_eq!(data_time_span(&data), Some((100_000 - 60_000, 100_000 + 60_000)));

        data.caudal = vec![point(50, 2.0), point(200, 2.0)];
        assert_eq!(data_time_span(&data), Some((50_000, 200_000)));
    }

    #[test]
    fn closest_point_picks_the_nearer_neighbour() {
        let points = vec![point(0, 1.0), point(100, 2.0), point(200, 3.0)];

        let near_first = closest_point(&points, Utc.timestamp_opt(30, 0).unwrap()).unwrap();
        assert_eq!(near_first.value, 1.0);

        let near_second = closest_point(&points, Utc.timestamp_opt(80, 0).unwrap()).unwrap();
        assert_eq!(near_second.value, 2.0);

        let past_end = closest_point(&points, Utc.timestamp_opt(999, 0).unwrap()).unwrap();
        assert_eq!(past_end.value, 3.0);

        assert!(closest_point(&[], Utc.timestamp_opt(0, 0).unwrap()).is_none());
    }
}
