// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI subcommands: `login`, `config`, `check`.

pub mod check;
pub mod config;
pub mod login;
pub mod open;
