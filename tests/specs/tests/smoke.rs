// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end smoke tests that run the real `keel` binary against an
//! in-process storefront API.

use std::sync::atomic::Ordering;

use keel_specs::{Keel, MockApi, PASSWORD};

#[tokio::test]
async fn login_cart_logout_flow() -> anyhow::Result<()> {
    let api = MockApi::start().await?;
    let keel = Keel::new(&api)?;

    let out = keel.run(&["login", "--identifier", "ada@example.com", "--password", PASSWORD]).await?;
    assert_eq!(out.code, 0, "{out:?}");
    assert_eq!(out.json()?["user"]["email"], "ada@example.com");
    assert!(!out.stdout.contains("accessToken"));
    assert!(keel.state_dir().join("credential.json").exists());

    let out = keel.run(&["whoami"]).await?;
    assert_eq!(out.code, 0, "{out:?}");
    assert_eq!(out.json()?["user"]["userId"], "u-1");
    assert_eq!(out.json()?["expired"], false);

    let out = keel.run(&["cart", "add", "7", "--quantity", "2"]).await?;
    assert_eq!(out.code, 0, "{out:?}");
    let cart = out.json()?;
    assert_eq!(cart["items"][0]["productId"], 7);
    assert_eq!(cart["items"][0]["quantity"], 2);
    assert_eq!(cart["cartTotal"], 20.0);

    let out = keel.run(&["cart", "add", "7"]).await?;
    assert_eq!(out.json()?["items"][0]["quantity"], 3);

    let out = keel.run(&["cart", "decrease", "7"]).await?;
    assert_eq!(out.json()?["items"][0]["quantity"], 2);

    let out = keel.run(&["cart", "remove", "7"]).await?;
    assert_eq!(out.json()?["items"], serde_json::json!([]));

    let out = keel.run(&["logout"]).await?;
    assert_eq!(out.code, 0, "{out:?}");
    assert_eq!(out.json()?["signedOut"], true);
    assert_eq!(api.backend.revoke_calls.load(Ordering::SeqCst), 1);

    let out = keel.run(&["whoami"]).await?;
    assert_eq!(out.code, 1);
    assert!(out.stderr.contains("not signed in"), "{out:?}");
    Ok(())
}

#[tokio::test]
async fn wrong_password_fails() -> anyhow::Result<()> {
    let api = MockApi::start().await?;
    let keel = Keel::new(&api)?;

    let out = keel.run(&["login", "--identifier", "ada@example.com", "--password", "nope"]).await?;
    assert_eq!(out.code, 1);
    assert!(out.stderr.contains("Invalid email or password"), "{out:?}");
    assert!(!keel.state_dir().join("credential.json").exists());
    Ok(())
}

#[tokio::test]
async fn refresh_without_cookie_expires_session() -> anyhow::Result<()> {
    let api = MockApi::start().await?;
    let keel = Keel::new(&api)?;
    let out = keel.run(&["login", "--identifier", "ada@example.com", "--password", PASSWORD]).await?;
    assert_eq!(out.code, 0, "{out:?}");

    // Each invocation starts with an empty cookie jar.
    let out = keel.run(&["refresh"]).await?;
    assert_eq!(out.code, 1);
    assert!(out.stderr.contains("session expired"), "{out:?}");
    assert_eq!(api.backend.refresh_calls.load(Ordering::SeqCst), 1);

    let out = keel.run(&["whoami"]).await?;
    assert_eq!(out.code, 1);
    Ok(())
}

#[tokio::test]
async fn invalid_config_exits_two() -> anyhow::Result<()> {
    let api = MockApi::start().await?;
    let keel = Keel::new(&api)?;
    let out = keel.run(&["--request-timeout-ms", "0", "whoami"]).await?;
    assert_eq!(out.code, 2, "{out:?}");
    Ok(())
}
