// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;

use kubelogin::command;
use kubelogin::config::{Cli, Command};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(&cli.log_level);
    let _ = rustls::crypto::ring::default_provider().install_default();

    let code = match cli.command {
        Command::Login(ref args) => exit_code(command::login::run(args).await.map(|()| 0)),
        Command::Config(ref args) => exit_code(command::config::run(args).map(|()| 0)),
        Command::Check(ref args) => {
            exit_code(command::check::run(args).map(|fresh| if fresh { 0 } else { 1 }))
        }
    };
    std::process::exit(code);
}

fn exit_code(result: anyhow::Result<i32>) -> i32 {
    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            1
        }
    }
}

fn init_tracing(level: &str) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
