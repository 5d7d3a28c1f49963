// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Kubelogin CLI: browser login against a kubelogin server, with the
//! resulting token written into the kubeconfig.

pub mod alias;
pub mod command;
pub mod config;
pub mod error;
pub mod kubeconfig;
pub mod relay;
pub mod test_support;
