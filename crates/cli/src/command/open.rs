// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Best-effort browser launch.

use std::process::{Command, Stdio};

/// Open `url` in the default browser. Returns `false` if no launcher could
/// be started; the caller then prints the URL for manual use.
pub fn open_browser(url: &str) -> bool {
    // On macOS use `open`, on Windows `cmd /C start`, elsewhere `xdg-open`.
    let mut cmd = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    } else {
        Command::new("xdg-open")
    };

    match cmd.arg(url).stdout(Stdio::null()).stderr(Stdio::null()).spawn() {
        Ok(_) => true,
        Err(e) => {
            tracing::debug!(err = %e, "browser launch failed");
            false
        }
    }
}
