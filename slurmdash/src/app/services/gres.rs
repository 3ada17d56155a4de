// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

//! Parser for Slurm generic resource (GRES) descriptions such as
//! `gpu:4(S:0-1)`, `gpu:a100:2(IDX:0,3)` or `gpu:2,mps:200`.
//!
//! Grammar:
//!
//! ```text
//! gres_list := entry ("," entry)*        commas inside (...) do not split
//! entry     := type ":" [model ":"] count ["(" indices ")"]
//! ```

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GresEntry {
    pub kind: String,
    pub model: Option<String>,
    pub count: u32,
    pub indices: Option<String>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GresParseError {
    #[error("gres entry '{0}' is missing ':'")]
    MissingSeparator(String),
    #[error("gres entry '{0}' has an empty resource type")]
    EmptyType(String),
    #[error("gres entry '{entry}' has a non-numeric count '{count}'")]
    InvalidCount { entry: String, count: String },
    #[error("gres description '{0}' has unbalanced parentheses")]
    UnbalancedParens(String),
}

/// Returns `true` when a description means "no generic resources".
pub fn is_absent(raw: &str) -> bool {
    let raw = raw.trim();
    raw.is_empty() || raw.eq_ignore_ascii_case("(null)") || raw.eq_ignore_ascii_case("n/a")
}

/// Parses a full description into its entries.
pub fn parse_gres(raw: &str) -> Result<Vec<GresEntry>, GresParseError> {
    split_entries(raw)?
        .into_iter()
        .map(parse_entry)
        .collect()
}

/// Resource type of the first entry. It is the type accelerator usage is measured in.
pub fn primary_kind(entries: &[GresEntry]) -> Option<&str> {
    entries.first().map(|entry| entry.kind.as_str())
}

/// Sum of the counts of every entry of `kind`.
pub fn count_of_kind(entries: &[GresEntry], kind: &str) -> u32 {
    for entry in entries {
        tracing::trace!(
            "gres entry type={} model={} count={} indices={}",
            entry.kind,
            entry.model.as_deref().unwrap_or("-"),
            entry.count,
            entry.indices.as_deref().unwrap_or("-")
        );
    }
    entries
        .iter()
        .filter(|entry| entry.kind == kind)
        .map(|entry| entry.count)
        .fold(0u32, u32::saturating_add)
}

fn split_entries(raw: &str) -> Result<Vec<&str>, GresParseError> {
    let mut entries = Vec::new();
    let mut depth: usize = 0;
    let mut start = 0;
    for (idx, ch) in raw.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| GresParseError::UnbalancedParens(raw.to_string()))?;
            }
            ',' if depth == 0 => {
                entries.push(raw[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(GresParseError::UnbalancedParens(raw.to_string()));
    }
    entries.push(raw[start..].trim());
    Ok(entries)
}

fn parse_entry(entry: &str) -> Result<GresEntry, GresParseError> {
    let (head, indices) = match entry.find('(') {
        Some(open) => {
            let inner = entry[open + 1..]
                .strip_suffix(')')
                .ok_or_else(|| GresParseError::UnbalancedParens(entry.to_string()))?;
            (&entry[..open], Some(inner.to_string()))
        }
        None => (entry, None),
    };

    let (kind, rest) = head
        .split_once(':')
        .ok_or_else(|| GresParseError::MissingSeparator(entry.to_string()))?;
    let kind = kind.trim();
    if kind.is_empty() {
        return Err(GresParseError::EmptyType(entry.to_string()));
    }

    // `rest` is either `count` or `model:count`.
    let (model, count) = match rest.rsplit_once(':') {
        Some((model, count)) => (Some(model.trim().to_string()), count.trim()),
        None => (None, rest.trim()),
    };
    let count = count
        .parse::<u32>()
        .map_err(|_| GresParseError::InvalidCount {
            entry: entry.to_string(),
            count: count.to_string(),
        })?;

    Ok(GresEntry {
        kind: kind.to_string(),
        model,
        count,
        indices,
    })
}
