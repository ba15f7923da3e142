// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI subcommands: account (`login`, `register`, `logout`, `whoami`,
//! `refresh`) and `cart`.

pub mod account;
pub mod cart;

use keel_session::{Session, SessionError};
use serde_json::Value;

use crate::config::Command;

/// Run `command` and return the JSON document to print.
pub async fn dispatch(session: &Session, command: &Command) -> Result<Value, SessionError> {
    match command {
        Command::Login(args) => account::login(session, args).await,
        Command::Register(args) => account::register(session, args).await,
        Command::Logout => account::logout(session).await,
        Command::Whoami => account::whoami(session),
        Command::Refresh => account::refresh(session).await,
        Command::Cart(cmd) => cart::run(session, cmd).await,
    }
}
