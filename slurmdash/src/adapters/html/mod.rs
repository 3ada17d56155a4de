// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use serde::Serialize;
use tera::{Context, Tera};

use crate::app::errors::{AppError, AppErrorKind, AppResult, codes};
use crate::app::ports::{PartitionStatus, ReportComposerPort, ReportInput};
use crate::app::services::naming::sanitize_component;

pub const DEFAULT_REPORT_FILE: &str = "index.html";

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{{ title }}</title>
  <style>
    body { font-family: sans-serif; margin: 2em; }
    section { margin-bottom: 2em; }
    figure { display: inline-block; margin: 0 1em 1em 0; }
    .status { color: #666666; }
    .failed { color: #b00020; }
  </style>
</head>
<body>
  <h1>{{ title }}</h1>
{%- for section in sections %}
  <section id="partition-{{ section.anchor }}">
    <h2>{{ section.partition }}</h2>
{%- if section.failed %}
    <p class="status failed">Failed: {{ section.detail }}</p>
{%- elif section.empty %}
    <p class="status">No nodes reported.</p>
{%- else %}
    <p class="status">{{ section.node_count }} nodes{% if section.skipped | length > 0 %}, {{ section.skipped | length }} skipped{% endif %}</p>
{%- if section.skipped | length > 0 %}
    <details>
      <summary>Skipped node records</summary>
      <ul>
{%- for line in section.skipped %}
        <li>{{ line }}</li>
{%- endfor %}
      </ul>
    </details>
{%- endif %}
{%- for image in section.images %}
    <figure>
      <img src="{{ image.file_name }}" alt="{{ section.partition }} {{ image.metric }} heatmap">
      <figcaption>{{ image.caption }}</figcaption>
    </figure>
{%- endfor %}
{%- endif %}
  </section>
{%- endfor %}
</body>
</html>
"#;

#[derive(Serialize)]
struct SectionView {
    partition: String,
    anchor: String,
    node_count: usize,
    skipped: Vec<String>,
    failed: bool,
    empty: bool,
    detail: String,
    images: Vec<ImageView>,
}

#[derive(Serialize)]
struct ImageView {
    file_name: String,
    metric: &'static str,
    caption: &'static str,
}

/// Static HTML page with one section per partition, in processing order.
#[derive(Clone)]
pub struct HtmlReportComposer {
    file_name: String,
}

impl HtmlReportComposer {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }
}

impl Default for HtmlReportComposer {
    fn default() -> Self {
        Self::new(DEFAULT_REPORT_FILE)
    }
}

impl ReportComposerPort for HtmlReportComposer {
    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn compose(&self, report: &ReportInput) -> AppResult<String> {
        let sections: Vec<SectionView> = report
            .sections
            .iter()
            .map(|section| {
                let (failed, empty, detail) = match &section.status {
                    PartitionStatus::Rendered => (false, false, String::new()),
                    PartitionStatus::NoNodes => (false, true, String::new()),
                    PartitionStatus::Failed(message) => (true, false, message.clone()),
                };
                SectionView {
                    partition: section.partition.clone(),
                    anchor: sanitize_component(&section.partition),
                    node_count: section.node_count,
                    skipped: section.skipped.clone(),
                    failed,
                    empty,
                    detail,
                    images: section
                        .images
                        .iter()
                        .map(|image| ImageView {
                            file_name: image.file_name.clone(),
                            metric: image.metric.as_str(),
                            caption: image.metric.title(),
                        })
                        .collect(),
                }
            })
            .collect();

        let mut context = Context::new();
        context.insert("title", &report.title);
        context.insert("sections", &sections);
        Tera::one_off(TEMPLATE, &context, true).map_err(|err| {
            AppError::with_message(
                AppErrorKind::Internal,
                codes::REPORT_FAILURE,
                format!("report template render failed: {err}"),
            )
        })
    }
}
