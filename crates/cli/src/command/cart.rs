// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use keel_session::cart::CartResponse;
use keel_session::{Session, SessionError};
use serde_json::Value;

use crate::config::CartCommand;

pub async fn run(session: &Session, cmd: &CartCommand) -> Result<Value, SessionError> {
    let cart = session.cart();
    let resp: CartResponse = match *cmd {
        CartCommand::Show => cart.fetch_cart().await?,
        CartCommand::Add { product_id, quantity } => {
            // Merging needs the current lines, which this process has not seen yet.
            cart.fetch_cart().await?;
            cart.add_to_cart(product_id, quantity).await?
        }
        CartCommand::Remove { product_id } => {
            cart.fetch_cart().await?;
            cart.remove_from_cart(product_id).await?
        }
        CartCommand::Decrease { product_id } => {
            cart.fetch_cart().await?;
            cart.decrease_from_cart(product_id).await?
        }
        CartCommand::Clear => cart.clear_cart().await?,
    };
    Ok(serde_json::to_value(&resp)?)
}
