// SPDX-FileCopyrightText: 2026 Mneme Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ctrl+C handling for in-flight responses.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Cancels `token` when Ctrl+C arrives.
///
/// Meant to be installed for the duration of one streamed turn; abort the
/// returned handle once the turn finishes so the next Ctrl+C reaches the
/// line editor instead.
pub fn cancel_on_ctrl_c(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if result.is_ok() {
                    info!("received Ctrl+C, cancelling response");
                    token.cancel();
                }
            }
            _ = token.cancelled() => {}
        }
        debug!("turn signal listener finished");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn listener_exits_when_token_cancelled_elsewhere() {
        let token = CancellationToken::new();
        let handle = cancel_on_ctrl_c(token.clone());
        token.cancel();
        handle.await.unwrap();
    }
}
