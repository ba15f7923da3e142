// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use keel_session::api::auth::RegisterRequest;
use keel_session::token;
use keel_session::{Credential, ErrorCode, Session, SessionError};
use serde_json::{json, Value};

use crate::config::{LoginArgs, RegisterArgs};

pub async fn login(session: &Session, args: &LoginArgs) -> Result<Value, SessionError> {
    let cred = session.login(&args.identifier, &args.password, args.remember_me).await?;
    Ok(describe(&cred))
}

pub async fn register(session: &Session, args: &RegisterArgs) -> Result<Value, SessionError> {
    let req = RegisterRequest {
        user_name: args.user_name.clone(),
        email: args.email.clone(),
        password: args.password.clone(),
        phone_number: args.phone_number.clone(),
        first_name: args.first_name.clone(),
        last_name: args.last_name.clone(),
    };
    let cred = session.register(&req).await?;
    Ok(describe(&cred))
}

pub async fn logout(session: &Session) -> Result<Value, SessionError> {
    session.logout().await;
    Ok(json!({ "signedOut": true }))
}

pub fn whoami(session: &Session) -> Result<Value, SessionError> {
    match session.current_credential() {
        Some(cred) => Ok(describe(&cred)),
        None => Err(SessionError::new(ErrorCode::Unauthorized, "not signed in")),
    }
}

pub async fn refresh(session: &Session) -> Result<Value, SessionError> {
    let cred = session.refresh().await?;
    Ok(describe(&cred))
}

/// The user plus token lifetime. The token itself is never printed.
fn describe(cred: &Credential) -> Value {
    json!({
        "user": cred.user,
        "expired": token::is_expired(&cred.access_token),
        "expiresInSecs": token::remaining_secs(&cred.access_token),
    })
}
