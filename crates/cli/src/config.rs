// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::{Parser, Subcommand};

use keel_session::SessionConfig;

/// Authenticated storefront session client.
#[derive(Debug, Parser)]
#[command(name = "keel", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub session: SessionConfig,

    /// Log filter (tracing `EnvFilter` syntax). Logs go to stderr.
    #[arg(long, default_value = "warn", env = "KEEL_LOG_LEVEL", global = true)]
    pub log_level: String,

    /// Log format: text or json.
    #[arg(long, default_value = "text", env = "KEEL_LOG_FORMAT", global = true)]
    pub log_format: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and store the credential.
    Login(LoginArgs),
    /// Create an account and sign in.
    Register(RegisterArgs),
    /// Revoke the session and forget the stored credential.
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// Exchange the refresh cookie for a new access token.
    Refresh,
    /// Inspect or change the cart.
    #[command(subcommand)]
    Cart(CartCommand),
}

#[derive(Debug, clap::Args)]
pub struct LoginArgs {
    /// Email or user name.
    #[arg(long)]
    pub identifier: String,

    #[arg(long, env = "KEEL_PASSWORD", hide_env_values = true)]
    pub password: String,

    #[arg(long)]
    pub remember_me: bool,
}

#[derive(Debug, clap::Args)]
pub struct RegisterArgs {
    #[arg(long)]
    pub user_name: String,

    #[arg(long)]
    pub email: String,

    #[arg(long, env = "KEEL_PASSWORD", hide_env_values = true)]
    pub password: String,

    #[arg(long)]
    pub phone_number: Option<String>,

    #[arg(long)]
    pub first_name: Option<String>,

    #[arg(long)]
    pub last_name: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum CartCommand {
    /// Fetch and print the cart.
    Show,
    /// Add a product, merging with an existing line.
    Add {
        product_id: u64,
        #[arg(long, default_value_t = 1)]
        quantity: u32,
    },
    /// Drop a product's line.
    Remove { product_id: u64 },
    /// Take one unit off a product.
    Decrease { product_id: u64 },
    /// Empty the cart.
    Clear,
}

impl Cli {
    pub fn validate(&self) -> anyhow::Result<()> {
        self.session.validate()?;
        match self.log_format.as_str() {
            "text" | "json" => {}
            other => anyhow::bail!("invalid log format: {other} (expected text or json)"),
        }
        if let Command::Cart(CartCommand::Add { quantity: 0, .. }) = self.command {
            anyhow::bail!("--quantity must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
