// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::fmt;

pub mod codes {
    pub const QUERY_FAILURE: &str = "query_failure";
    pub const RECORD_PARSE_ERROR: &str = "record_parse_error";
    pub const DEGENERATE_SNAPSHOT: &str = "degenerate_snapshot";
    pub const RENDER_FAILURE: &str = "render_failure";
    pub const REPORT_FAILURE: &str = "report_failure";
    pub const LOCAL_ERROR: &str = "local_error";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppErrorKind {
    InvalidArgument,
    /// The cluster resource manager could not be queried or answered garbage.
    Unavailable,
    /// A record or response could not be interpreted.
    DataLoss,
    Internal,
}

#[derive(Debug, Clone)]
pub struct AppError {
    kind: AppErrorKind,
    code: &'static str,
    message: String,
    context: Option<String>,
}

impl AppError {
    pub fn with_message(
        kind: AppErrorKind,
        code: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            code,
            message: message.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn kind(&self) -> AppErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn is_query_failure(&self) -> bool {
        self.code == codes::QUERY_FAILURE
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ctx) = &self.context {
            write!(f, "{} ({})", self.message, ctx)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

pub fn query_failure(partition: &str, message: impl Into<String>) -> AppError {
    AppError::with_message(AppErrorKind::Unavailable, codes::QUERY_FAILURE, message)
        .with_context(format!("partition={partition}"))
}

pub fn local_error(message: impl Into<String>) -> AppError {
    AppError::with_message(AppErrorKind::Internal, codes::LOCAL_ERROR, message)
}
