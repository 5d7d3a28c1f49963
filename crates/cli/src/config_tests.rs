// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use super::{
    default_alias_file, home_from, kubeconfig_path, validate_server_url, Cli, Command, LoginTarget,
    TargetArgs, DEFAULT_KUBECTL_USER,
};
use crate::alias::{AliasConfig, AliasFile};
use crate::assert_err_contains;

fn target(alias: Option<&str>, server_url: Option<&str>, alias_file: PathBuf) -> TargetArgs {
    TargetArgs {
        alias: alias.map(str::to_owned),
        server_url: server_url.map(str::to_owned),
        kubectl_user: DEFAULT_KUBECTL_USER.to_owned(),
        kubeconfig: Some("/tmp/kubeconfig".to_owned()),
        alias_file: Some(alias_file),
    }
}

fn write_aliases(path: &std::path::Path) -> anyhow::Result<()> {
    let mut file = AliasFile::default();
    file.upsert(AliasConfig {
        alias: "prod".into(),
        server_url: "https://login.example.com".into(),
        kubectl_user: "prod_admin".into(),
    });
    file.save(path)
}

#[test]
fn login_flags_parse() -> anyhow::Result<()> {
    let cli = Cli::try_parse_from([
        "kubelogin",
        "login",
        "prod",
        "--timeout-secs",
        "0",
        "--no-browser",
        "--log-level",
        "debug",
    ])?;
    assert_eq!(cli.log_level, "debug");
    let Command::Login(args) = cli.command else {
        anyhow::bail!("expected login");
    };
    assert_eq!(args.target.alias.as_deref(), Some("prod"));
    assert!(args.no_browser);
    assert_eq!(args.timeout(), None);
    Ok(())
}

#[test]
fn login_defaults() -> anyhow::Result<()> {
    let cli = Cli::try_parse_from(["kubelogin", "login", "--server-url", "http://localhost:8080"])?;
    let Command::Login(args) = cli.command else {
        anyhow::bail!("expected login");
    };
    assert_eq!(args.target.kubectl_user, DEFAULT_KUBECTL_USER);
    assert_eq!(args.timeout(), Some(Duration::from_secs(300)));
    assert!(!args.no_browser);
    Ok(())
}

#[test]
fn config_defaults_alias_name() -> anyhow::Result<()> {
    let cli = Cli::try_parse_from(["kubelogin", "config", "--server-url", "http://localhost:8080"])?;
    let Command::Config(args) = cli.command else {
        anyhow::bail!("expected config");
    };
    assert_eq!(args.alias, "default");
    assert_eq!(args.kubectl_user, DEFAULT_KUBECTL_USER);
    Ok(())
}

#[test]
fn subcommand_is_required() {
    assert!(Cli::try_parse_from(["kubelogin"]).is_err());
}

#[test]
fn resolve_from_flags() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let args = target(None, Some("http://localhost:8080"), dir.path().join("rc.yaml"));
    assert_eq!(
        args.resolve()?,
        LoginTarget {
            server_url: "http://localhost:8080".into(),
            kubectl_user: DEFAULT_KUBECTL_USER.into(),
            kubeconfig: PathBuf::from("/tmp/kubeconfig"),
        }
    );
    Ok(())
}

#[test]
fn resolve_from_alias_overrides_flags() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("rc.yaml");
    write_aliases(&path)?;

    let args = target(Some("prod"), Some("http://ignored"), path);
    let resolved = args.resolve()?;
    assert_eq!(resolved.server_url, "https://login.example.com");
    assert_eq!(resolved.kubectl_user, "prod_admin");
    assert_eq!(args.resolve_user()?, "prod_admin");
    Ok(())
}

#[test]
fn resolve_unknown_alias() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("rc.yaml");
    write_aliases(&path)?;
    assert_err_contains!(target(Some("staging"), None, path).resolve(), "no alias \"staging\"");
    Ok(())
}

#[test]
fn resolve_alias_without_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let args = target(Some("prod"), None, dir.path().join("missing.yaml"));
    assert_err_contains!(args.resolve(), "failed to read");
    Ok(())
}

#[yare::parameterized(
    missing = { None, "--server-url or an alias is required" },
    empty = { Some(""), "--server-url or an alias is required" },
    bad_scheme = { Some("ftp://login.example.com"), "scheme must be http or https" },
    relative = { Some("login.example.com"), "invalid server url" },
)]
fn resolve_rejects_server_url(url: Option<&str>, expected: &str) -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    assert_err_contains!(target(None, url, dir.path().join("rc.yaml")).resolve(), expected);
    Ok(())
}

#[yare::parameterized(
    http = { "http://localhost:8080" },
    https_with_path = { "https://login.example.com/kubelogin/" },
)]
fn accepts_server_url(url: &str) -> anyhow::Result<()> {
    validate_server_url(url)
}

#[test]
fn kubeconfig_path_uses_first_list_entry() {
    let list = std::env::join_paths(["/a/config", "/b/config"]).map(|p| p.into_string());
    let Ok(Ok(list)) = list else {
        return;
    };
    assert_eq!(kubeconfig_path(Some(&list)).ok(), Some(PathBuf::from("/a/config")));
}

#[test]
#[serial_test::serial]
fn defaults_live_under_home() {
    let previous = std::env::var_os("HOME");
    std::env::set_var("HOME", "/home/tester");

    let alias = default_alias_file();
    let kube = kubeconfig_path(None);
    let blank = kubeconfig_path(Some(""));

    match previous {
        Some(home) => std::env::set_var("HOME", home),
        None => std::env::remove_var("HOME"),
    }
    assert_eq!(alias.ok(), Some(PathBuf::from("/home/tester/.kubeloginrc.yaml")));
    assert_eq!(kube.ok(), Some(PathBuf::from("/home/tester/.kube/config")));
    assert_eq!(blank.ok(), Some(PathBuf::from("/home/tester/.kube/config")));
}

#[yare::parameterized(
    unset = { None, None },
    both_empty = { Some(""), Some("") },
)]
fn home_is_required(home: Option<&str>, profile: Option<&str>) {
    let env = |name: &str| match name {
        "HOME" => home.map(OsString::from),
        "USERPROFILE" => profile.map(OsString::from),
        _ => None,
    };
    assert_err_contains!(home_from(env), "HOME is not set");
}

#[test]
fn home_falls_back_to_userprofile() -> anyhow::Result<()> {
    let env = |name: &str| match name {
        "HOME" => Some(OsString::new()),
        "USERPROFILE" => Some(OsString::from("C:\\Users\\tester")),
        _ => None,
    };
    assert_eq!(home_from(env)?, PathBuf::from("C:\\Users\\tester"));
    Ok(())
}

#[test]
fn explicit_kubeconfig_needs_no_home() -> anyhow::Result<()> {
    assert_eq!(kubeconfig_path(Some("/etc/kube/config"))?, PathBuf::from("/etc/kube/config"));
    Ok(())
}
