// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

pub mod cli;
pub mod fs;
pub mod html;
pub mod sinfo;
pub mod svg;
pub mod terminal;
