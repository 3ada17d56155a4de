// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use crate::app::errors::{AppError, AppErrorKind, AppResult, codes, query_failure};
use crate::app::ports::ClusterQueryPort;
use crate::app::types::RawRecordValue;

pub const DEFAULT_SINFO_COMMAND: &str = "sinfo";

/// Top level of `sinfo --json`; only the record array and error list matter.
#[derive(Debug, Deserialize)]
struct SinfoResponse {
    sinfo: Vec<RawRecordValue>,
    #[serde(default)]
    errors: Vec<SinfoMessage>,
    #[serde(default)]
    warnings: Vec<SinfoMessage>,
}

#[derive(Debug, Deserialize)]
struct SinfoMessage {
    #[serde(default)]
    description: String,
    #[serde(default)]
    error: String,
}

impl SinfoMessage {
    fn text(&self) -> &str {
        if self.description.is_empty() {
            &self.error
        } else {
            &self.description
        }
    }
}

/// Runs `sinfo --Node --json -p <partition>` locally.
#[derive(Clone)]
pub struct SinfoQuery {
    program: String,
}

impl SinfoQuery {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

pub fn sinfo_args(partition: &str) -> [&str; 4] {
    ["--Node", "--json", "-p", partition]
}

#[async_trait]
impl ClusterQueryPort for SinfoQuery {
    #[tracing::instrument(name = "sinfo", level = "debug", skip(self), fields(program = %self.program))]
    async fn query_nodes(&self, partition: &str) -> AppResult<Vec<RawRecordValue>> {
        let output = Command::new(&self.program)
            .args(sinfo_args(partition))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|err| query_failure(partition, format!("failed to run {}: {err}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            let status = match output.status.code() {
                Some(code) => format!("exit status {code}"),
                None => "a signal".to_string(),
            };
            let message = if stderr.is_empty() {
                format!("{} terminated with {status}", self.program)
            } else {
                format!("{} terminated with {status}: {stderr}", self.program)
            };
            return Err(query_failure(partition, message));
        }

        tracing::debug!("sinfo produced {} bytes of output", output.stdout.len());
        parse_sinfo_output(partition, &output.stdout)
    }
}

/// Extracts the node record array from `sinfo --json` output.
pub fn parse_sinfo_output(partition: &str, stdout: &[u8]) -> AppResult<Vec<RawRecordValue>> {
    let response: SinfoResponse = serde_json::from_slice(stdout).map_err(|err| {
        AppError::with_message(
            AppErrorKind::DataLoss,
            codes::QUERY_FAILURE,
            format!("malformed sinfo JSON: {err}"),
        )
        .with_context(format!("partition={partition}"))
    })?;

    for warning in &response.warnings {
        tracing::warn!("sinfo warning partition={partition}: {}", warning.text());
    }
    if !response.errors.is_empty() {
        let messages: Vec<&str> = response.errors.iter().map(SinfoMessage::text).collect();
        return Err(query_failure(
            partition,
            format!("sinfo reported errors: {}", messages.join("; ")),
        ));
    }
    Ok(response.sinfo)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
      "meta": {"plugin": {"type": "openapi/v0.0.39"}},
      "errors": [],
      "warnings": [],
      "sinfo": [
        {"nodes": {"nodes": ["c001"], "total": 1},
         "sockets": {"minimum": 2, "maximum": 2},
         "cores": {"minimum": 32, "maximum": 32},
         "threads": {"minimum": 1, "maximum": 1},
         "cpus": {"allocated": 64, "idle": 0, "load": {"minimum": 6390, "maximum": 6410}},
         "gres": {"total": "", "used": ""}},
        {"nodes": {"nodes": ["g001"], "total": 1},
         "sockets": {"minimum": 2, "maximum": 2},
         "cores": {"minimum": 16, "maximum": 16},
         "threads": {"minimum": 2, "maximum": 2},
         "cpus": {"allocated": 8, "idle": 56, "load": {"minimum": 810, "maximum": 810}},
         "gres": {"total": "gpu:4(S:0-1)", "used": "gpu:1(IDX:0)"}}
      ]
    }"#;

    #[test]
    fn extracts_records_in_order() {
        let records = parse_sinfo_output("all", SAMPLE.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["nodes"]["nodes"][0], "c001");
        assert_eq!(records[1]["gres"]["total"], "gpu:4(S:0-1)");
    }

    #[test]
    fn malformed_json_is_a_query_failure() {
        let err = parse_sinfo_output("gpu", b"sinfo: error: oops").unwrap_err();
        assert!(err.is_query_failure());
        assert!(err.to_string().contains("malformed sinfo JSON"));
        assert_eq!(err.kind(), AppErrorKind::DataLoss);
        assert!(err.to_string().contains("partition=gpu"));
    }

    #[test]
    fn missing_record_array_is_a_query_failure() {
        let err = parse_sinfo_output("gpu", br#"{"errors": []}"#).unwrap_err();
        assert!(err.is_query_failure());
    }

    #[test]
    fn reported_errors_are_a_query_failure() {
        let body = br#"{"sinfo": [], "errors": [{"description": "Invalid partition name specified", "error_number": 2000}]}"#;
        let err = parse_sinfo_output("nope", body).unwrap_err();
        assert!(err.to_string().contains("Invalid partition name specified"));
    }

    #[test]
    fn builds_partition_arguments() {
        assert_eq!(sinfo_args("gpu"), ["--Node", "--json", "-p", "gpu"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_a_query_failure() {
        let query = SinfoQuery::new("false");
        let err = query.query_nodes("cpu").await.unwrap_err();
        assert!(err.is_query_failure());
        assert!(err.to_string().contains("exit status 1"));
        assert!(err.to_string().contains("partition=cpu"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn missing_program_is_a_query_failure() {
        let query = SinfoQuery::new("/nonexistent/slurmdash-sinfo");
        let err = query.query_nodes("cpu").await.unwrap_err();
        assert!(err.is_query_failure());
        assert!(err.to_string().contains("failed to run"));
    }
}
