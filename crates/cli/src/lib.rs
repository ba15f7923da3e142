// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `keel`: drive one storefront session tab from the command line.

pub mod command;
pub mod config;
pub mod notice;

use keel_session::{Origin, Session};

use crate::config::Cli;

/// Run the parsed command against a session rooted at the configured state
/// directory. Returns a process exit code.
pub async fn run(cli: Cli) -> i32 {
    let origin = Origin::persistent(&cli.session.state_dir());
    let session = match Session::open(cli.session.clone(), &origin) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return 2;
        }
    };
    let mut events = session.subscribe();

    let result = command::dispatch(&session, &cli.command).await;
    notice::report(&mut events);

    match result {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(json) => {
                println!("{json}");
                0
            }
            Err(e) => {
                eprintln!("error: {e}");
                1
            }
        },
        Err(e) => {
            eprintln!("error: {e}");
            1
        }
    }
}
