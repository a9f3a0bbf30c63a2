//! Bot run loop — channel stream in, intake engine, replies out.

use std::sync::Arc;

use futures::StreamExt;

use crate::channels::{ChannelManager, IncomingMessage, OutgoingResponse};
use crate::error::Error;
use crate::intake::IntakeEngine;
use crate::intake::messages;

/// Couples the intake engine to the active channels.
pub struct Bot {
    engine: Arc<IntakeEngine>,
    channels: Arc<ChannelManager>,
}

impl Bot {
    pub fn new(engine: Arc<IntakeEngine>, channels: ChannelManager) -> Self {
        Self {
            engine,
            channels: Arc::new(channels),
        }
    }

    /// Run until Ctrl+C or until every channel stream ends.
    ///
    /// Messages are handled one at a time, in arrival order.
    pub async fn run(self) -> Result<(), Error> {
        let mut message_stream = self.channels.start_all().await?;

        let failing = self.channels.health_check_all().await;
        if !failing.is_empty() {
            tracing::warn!("Unhealthy channels at startup: {}", failing.join(", "));
        }

        tracing::info!(
            channels = %self.channels.names().join(", "),
            "NutriKids ready and listening"
        );

        loop {
            let message = tokio::select! {
                biased;
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Ctrl+C received, shutting down...");
                    break;
                }
                msg = message_stream.next() => {
                    match msg {
                        Some(m) => m,
                        None => {
                            tracing::info!("All channel streams ended, shutting down...");
                            break;
                        }
                    }
                }
            };

            for reply in self.process(&message).await {
                if let Err(e) = self.channels.respond(&message, reply).await {
                    tracing::error!(
                        identity = %message.user_id,
                        channel = %message.channel,
                        "Failed to send reply: {}",
                        e
                    );
                    break;
                }
            }
        }

        tracing::info!("NutriKids shutting down...");
        self.channels.shutdown_all().await?;

        Ok(())
    }

    /// Handle one message. A persistence failure ends the turn with a
    /// generic apology instead of the engine's replies.
    async fn process(&self, message: &IncomingMessage) -> Vec<OutgoingResponse> {
        match self.engine.handle(message).await {
            Ok(replies) => replies,
            Err(e) => {
                tracing::error!(
                    identity = %message.user_id,
                    channel = %message.channel,
                    "Error handling message: {}",
                    e
                );
                vec![messages::processing_error()]
            }
        }
    }
}
