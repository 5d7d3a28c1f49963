// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end login: stub provider → broker → CLI relay → kubeconfig.

use std::sync::Arc;
use std::time::Duration;

use kubelogin::command::login::login;
use kubelogin::error::LoginError;
use kubelogin::kubeconfig::{user_token, KubeconfigWriter};
use kubelogin::relay::{allocate_free_port, build_login_url, serve_once, BrokerClient};
use kubelogin_specs::{browse, follow_until, spawn_broker, spawn_provider, ID_TOKEN};

const TIMEOUT: Duration = Duration::from_secs(10);

const KUBECONFIG: &str = "\
apiVersion: v1
kind: Config
clusters:
- name: dev
  cluster:
    server: https://dev.example.com
users:
- name: kubelogin_user
  user:
    token: old
";

fn read_token(path: &std::path::Path, user: &str) -> anyhow::Result<Option<String>> {
    let doc: serde_yaml::Value = serde_yaml::from_str(&std::fs::read_to_string(path)?)?;
    Ok(user_token(&doc, user).map(str::to_owned))
}

#[tokio::test]
async fn browser_login_writes_kubeconfig() -> anyhow::Result<()> {
    let provider = spawn_provider().await?;
    let broker = spawn_broker(&provider, &[]).await?;
    let dir = tempfile::tempdir()?;
    let kubeconfig = dir.path().join("config");
    std::fs::write(&kubeconfig, KUBECONFIG)?;
    let writer = Arc::new(KubeconfigWriter::new(&kubeconfig, "kubelogin_user"));

    let (page_tx, page_rx) = tokio::sync::oneshot::channel();
    login(&broker, writer, Some(TIMEOUT), move |url| {
        let url = url.to_owned();
        tokio::spawn(async move {
            let _ = page_tx.send(browse(&url).await);
        });
    })
    .await?;

    let (status, body) = page_rx.await??;
    assert_eq!(status, 200);
    assert!(body.contains("You are now logged in"), "body: {body}");

    assert_eq!(read_token(&kubeconfig, "kubelogin_user")?.as_deref(), Some(ID_TOKEN));
    let doc: serde_yaml::Value = serde_yaml::from_str(&std::fs::read_to_string(&kubeconfig)?)?;
    assert_eq!(doc["clusters"][0]["cluster"]["server"].as_str(), Some("https://dev.example.com"));
    Ok(())
}

#[tokio::test]
async fn redirect_carries_single_use_handle() -> anyhow::Result<()> {
    let provider = spawn_provider().await?;
    let broker = spawn_broker(&provider, &[]).await?;
    let dir = tempfile::tempdir()?;
    let kubeconfig = dir.path().join("config");
    let writer = Arc::new(KubeconfigWriter::new(&kubeconfig, "kubelogin_user"));

    let port = allocate_free_port()?;
    let relay = serve_once(port, BrokerClient::new(&broker)?, writer).await?;
    let send_back = follow_until(&build_login_url(&broker, port), "http://localhost:").await?;
    assert!(send_back.starts_with(&format!("http://localhost:{port}/exchange?token=")));
    let handle = send_back.rsplit('=').next().unwrap_or_default().to_owned();
    assert_eq!(handle.len(), 43);

    let (status, _) = browse(&send_back).await?;
    assert_eq!(status, 200);
    assert_eq!(relay.wait(Some(TIMEOUT)).await, Ok(()));
    assert_eq!(read_token(&kubeconfig, "kubelogin_user")?.as_deref(), Some(ID_TOKEN));

    // The relay already redeemed the handle.
    let (status, _) = browse(&format!("{broker}/exchange?token={handle}")).await?;
    assert_eq!(status, 401);
    Ok(())
}

#[tokio::test]
async fn expired_handle_fails_login() -> anyhow::Result<()> {
    let provider = spawn_provider().await?;
    let broker = spawn_broker(&provider, &["--token-ttl-secs", "1"]).await?;
    let dir = tempfile::tempdir()?;
    let kubeconfig = dir.path().join("config");
    let writer = Arc::new(KubeconfigWriter::new(&kubeconfig, "kubelogin_user"));

    let port = allocate_free_port()?;
    let relay = serve_once(port, BrokerClient::new(&broker)?, writer).await?;
    let send_back = follow_until(&build_login_url(&broker, port), "http://localhost:").await?;

    tokio::time::sleep(Duration::from_millis(1500)).await;
    let (status, _) = browse(&send_back).await?;
    assert_eq!(status, 502);

    let outcome = relay.wait(Some(TIMEOUT)).await;
    assert!(matches!(outcome, Err(LoginError::Exchange(_))), "{outcome:?}");
    assert!(!kubeconfig.exists());
    Ok(())
}

#[tokio::test]
async fn reusable_handles_survive_redemption() -> anyhow::Result<()> {
    let provider = spawn_provider().await?;
    let broker = spawn_broker(&provider, &["--reusable-handles"]).await?;
    let dir = tempfile::tempdir()?;
    let writer = Arc::new(KubeconfigWriter::new(dir.path().join("config"), "kubelogin_user"));

    let port = allocate_free_port()?;
    let relay = serve_once(port, BrokerClient::new(&broker)?, writer).await?;
    let send_back = follow_until(&build_login_url(&broker, port), "http://localhost:").await?;
    let handle = send_back.rsplit('=').next().unwrap_or_default().to_owned();

    browse(&send_back).await?;
    relay.wait(Some(TIMEOUT)).await?;

    let (status, body) = browse(&format!("{broker}/exchange?token={handle}")).await?;
    assert_eq!(status, 200);
    assert_eq!(body, ID_TOKEN);
    Ok(())
}

#[tokio::test]
async fn signed_state_round_trips() -> anyhow::Result<()> {
    let provider = spawn_provider().await?;
    let broker =
        spawn_broker(&provider, &["--state-mode", "signed", "--state-secret", "k"]).await?;
    let dir = tempfile::tempdir()?;
    let kubeconfig = dir.path().join("config");
    let writer = Arc::new(KubeconfigWriter::new(&kubeconfig, "kubelogin_user"));

    let (page_tx, page_rx) = tokio::sync::oneshot::channel();
    login(&broker, writer, Some(TIMEOUT), move |url| {
        let url = url.to_owned();
        tokio::spawn(async move {
            let _ = page_tx.send(browse(&url).await);
        });
    })
    .await?;

    let (status, _) = page_rx.await??;
    assert_eq!(status, 200);
    assert_eq!(read_token(&kubeconfig, "kubelogin_user")?.as_deref(), Some(ID_TOKEN));
    Ok(())
}
