// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

pub mod gres;
pub mod grid;
pub mod naming;
pub mod normalize;
pub mod snapshot;
pub mod summary;
