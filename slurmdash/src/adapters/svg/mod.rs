// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use serde::Serialize;
use tera::{Context, Tera};

use crate::app::errors::{AppError, AppErrorKind, AppResult, codes};
use crate::app::ports::HeatmapRendererPort;
use crate::app::ports::renderer::{SCALE_MAX, SCALE_MIN};
use crate::app::types::{GridLayout, Metric};

const CELL_SIZE: usize = 40;
const MARGIN: usize = 16;
const TITLE_HEIGHT: usize = 28;
const BAR_GAP: usize = 20;
const BAR_WIDTH: usize = 16;
const BAR_LABEL_WIDTH: usize = 36;
const BAR_STEPS: usize = 20;

/// Viridis anchor colours from 0 to 1.
const RAMP: [(f64, [u8; 3]); 5] = [
    (0.0, [68, 1, 84]),
    (0.25, [59, 82, 139]),
    (0.5, [33, 145, 140]),
    (0.75, [94, 201, 98]),
    (1.0, [253, 231, 37]),
];

const TEMPLATE: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{{ width }}" height="{{ height }}" viewBox="0 0 {{ width }} {{ height }}">
  <defs>
    <pattern id="nodata" width="8" height="8" patternUnits="userSpaceOnUse" patternTransform="rotate(45)">
      <rect width="8" height="8" fill="#d9d9d9"/>
      <line x1="0" y1="0" x2="0" y2="8" stroke="#9e9e9e" stroke-width="3"/>
    </pattern>
  </defs>
  <rect width="{{ width }}" height="{{ height }}" fill="#ffffff"/>
  <text x="{{ margin }}" y="{{ title_baseline }}" font-family="sans-serif" font-size="14">{{ title }}</text>
  <g class="cells">
{%- for cell in cells %}
    <rect x="{{ cell.x }}" y="{{ cell.y }}" width="{{ cell_size }}" height="{{ cell_size }}" fill="{{ cell.fill }}" stroke="#ffffff" stroke-width="1"><title>{{ cell.label }}</title></rect>
{%- endfor %}
  </g>
  <g class="colorbar">
{%- for step in bar %}
    <rect x="{{ bar_x }}" y="{{ step.y }}" width="{{ bar_width }}" height="{{ step.height }}" fill="{{ step.fill }}"/>
{%- endfor %}
    <text x="{{ bar_label_x }}" y="{{ bar_top_label_y }}" font-family="sans-serif" font-size="11">{{ scale_max }}</text>
    <text x="{{ bar_label_x }}" y="{{ bar_bottom_label_y }}" font-family="sans-serif" font-size="11">{{ scale_min }}</text>
  </g>
</svg>
"##;

#[derive(Serialize)]
struct CellView {
    x: usize,
    y: usize,
    fill: String,
    label: String,
}

#[derive(Serialize)]
struct BarStep {
    y: String,
    height: String,
    fill: String,
}

/// Renders heatmaps as standalone SVG documents.
#[derive(Clone, Default)]
pub struct SvgHeatmapRenderer;

impl SvgHeatmapRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl HeatmapRendererPort for SvgHeatmapRenderer {
    fn file_extension(&self) -> &'static str {
        "svg"
    }

    fn render(&self, grid: &GridLayout, partition: &str, metric: Metric) -> AppResult<Vec<u8>> {
        if grid.is_degenerate() {
            return Err(AppError::with_message(
                AppErrorKind::InvalidArgument,
                codes::DEGENERATE_SNAPSHOT,
                format!("refusing to render an empty grid for partition {partition}"),
            ));
        }

        let grid_top = TITLE_HEIGHT + MARGIN;
        let grid_width = grid.cols * CELL_SIZE;
        let grid_height = grid.rows * CELL_SIZE;
        let bar_x = MARGIN + grid_width + BAR_GAP;
        let width = bar_x + BAR_WIDTH + BAR_LABEL_WIDTH + MARGIN;
        let height = grid_top + grid_height + MARGIN;

        let mut cells = Vec::with_capacity(grid.rows * grid.cols);
        for row in 0..grid.rows {
            for col in 0..grid.cols {
                let value = grid.get(row, col);
                cells.push(CellView {
                    x: MARGIN + col * CELL_SIZE,
                    y: grid_top + row * CELL_SIZE,
                    fill: cell_fill(value),
                    label: match value {
                        Some(v) => format!("{v:.1}%"),
                        None => "no data".to_string(),
                    },
                });
            }
        }

        let step_height = grid_height as f64 / BAR_STEPS as f64;
        let bar: Vec<BarStep> = (0..BAR_STEPS)
            .map(|step| {
                // Top of the bar is the scale maximum.
                let t = 1.0 - (step as f64 + 0.5) / BAR_STEPS as f64;
                BarStep {
                    y: format!("{:.2}", grid_top as f64 + step as f64 * step_height),
                    height: format!("{:.2}", step_height),
                    fill: hex(ramp(t)),
                }
            })
            .collect();

        let mut context = Context::new();
        context.insert("width", &width);
        context.insert("height", &height);
        context.insert("margin", &MARGIN);
        context.insert("title_baseline", &(MARGIN + 12));
        context.insert("title", &format!("{partition}: {}", metric.title()));
        context.insert("cell_size", &CELL_SIZE);
        context.insert("cells", &cells);
        context.insert("bar", &bar);
        context.insert("bar_x", &bar_x);
        context.insert("bar_width", &BAR_WIDTH);
        context.insert("bar_label_x", &(bar_x + BAR_WIDTH + 4));
        context.insert("bar_top_label_y", &(grid_top + 10));
        context.insert("bar_bottom_label_y", &(grid_top + grid_height));
        context.insert("scale_min", &format!("{SCALE_MIN:.0}"));
        context.insert("scale_max", &format!("{SCALE_MAX:.0}"));

        let rendered = Tera::one_off(TEMPLATE, &context, true).map_err(|err| {
            AppError::with_message(
                AppErrorKind::Internal,
                codes::RENDER_FAILURE,
                format!("heatmap template render failed for partition {partition}: {err}"),
            )
        })?;
        Ok(rendered.into_bytes())
    }
}

/// Fill for one cell. Values outside the fixed scale saturate at its ends.
pub fn cell_fill(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => hex(ramp(scale_position(v))),
        Some(_) => hex(ramp(1.0)),
        None => "url(#nodata)".to_string(),
    }
}

fn scale_position(value: f64) -> f64 {
    ((value - SCALE_MIN) / (SCALE_MAX - SCALE_MIN)).clamp(0.0, 1.0)
}

fn ramp(t: f64) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0);
    for pair in RAMP.windows(2) {
        let (t0, c0) = pair[0];
        let (t1, c1) = pair[1];
        if t <= t1 {
            let f = (t - t0) / (t1 - t0);
            let mix = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * f).round() as u8;
            return [mix(c0[0], c1[0]), mix(c0[1], c1[1]), mix(c0[2], c1[2])];
        }
    }
    RAMP[RAMP.len() - 1].1
}

fn hex([r, g, b]: [u8; 3]) -> String {
    format!("#{r:02x}{g:02x}{b:02x}")
}
