//! Broker subscription and per-message orchestration.
//!
//! The consumer owns the AMQP topology and acknowledgment policy; the
//! business logic lives in [`process_message`], which is invoked once per
//! delivered unit of work. A message is acknowledged only after the whole
//! pipeline has returned; a propagated failure leaves it unacknowledged and
//! the broker redelivers it.

use std::future::Future;
use std::sync::Arc;

use futures::StreamExt;
use lapin::message::Delivery;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, ExchangeDeclareOptions, QueueBindOptions,
    QueueDeclareOptions,
};
use lapin::types::{AMQPValue, FieldTable};
use lapin::{Channel, Connection, ConnectionProperties, ExchangeKind};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{ConnectionError, Result};
use crate::model::MatchRecord;
use crate::normalizer::normalize;
use crate::parser::parse_message;
use crate::registry::TeamRegistry;
use crate::store::MatchStore;

/// At most one message resides in the queue; the broker drops overflow
/// instead of this service buffering a backlog of stale odds.
const MAX_QUEUE_LENGTH: i32 = 1;

const CONSUMER_TAG: &str = "odds-processor";

/// Owns the broker connection and drives the processing pipeline.
pub struct QueueConsumer {
    connection: Connection,
    channel: Channel,
    queue: String,
    registry: Arc<TeamRegistry>,
    store: Arc<dyn MatchStore>,
}

impl QueueConsumer {
    /// Connect to the broker and declare the consuming topology: a topic
    /// exchange, a durable queue bounded to one resident message, and a
    /// binding whose routing key equals the queue name.
    pub async fn connect(
        config: &Config,
        registry: Arc<TeamRegistry>,
        store: Arc<dyn MatchStore>,
    ) -> Result<Self> {
        let connection = Connection::connect(&config.amqp_url, ConnectionProperties::default())
            .await
            .map_err(|e| ConnectionError::Broker {
                url: config.amqp_url.clone(),
                reason: e.to_string(),
            })?;
        info!(exchange = %config.amqp_exchange, "connected to broker");

        let channel = connection.create_channel().await?;

        channel
            .exchange_declare(
                &config.amqp_exchange,
                ExchangeKind::Topic,
                ExchangeDeclareOptions::default(),
                FieldTable::default(),
            )
            .await?;

        let mut queue_args = FieldTable::default();
        queue_args.insert("x-max-length".into(), AMQPValue::LongInt(MAX_QUEUE_LENGTH));
        channel
            .queue_declare(
                &config.amqp_queue,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                queue_args,
            )
            .await?;

        channel
            .queue_bind(
                &config.amqp_queue,
                &config.amqp_exchange,
                &config.amqp_queue,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await?;

        Ok(Self {
            connection,
            channel,
            queue: config.amqp_queue.clone(),
            registry,
            store,
        })
    }

    /// Consume deliveries until the shutdown future resolves, then release
    /// the broker connection.
    ///
    /// Each delivery is handled by its own task; a handler still in flight
    /// at shutdown is abandoned, and its unacknowledged message is
    /// redelivered by the broker.
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<()> {
        let mut consumer = self
            .channel
            .basic_consume(
                &self.queue,
                CONSUMER_TAG,
                // Manual acknowledgment: the orchestration layer acks after
                // the handler returns.
                BasicConsumeOptions {
                    no_ack: false,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;
        info!(queue = %self.queue, "consuming");

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                delivery = consumer.next() => match delivery {
                    Some(Ok(delivery)) => {
                        let registry = Arc::clone(&self.registry);
                        let store = Arc::clone(&self.store);
                        tokio::spawn(handle_delivery(delivery, registry, store));
                    }
                    Some(Err(e)) => {
                        error!(error = %e, "broker delivery error");
                    }
                    None => {
                        warn!("delivery stream closed by broker");
                        break;
                    }
                },
                _ = &mut shutdown => {
                    info!("shutdown signal received, stopping intake");
                    break;
                }
            }
        }

        self.connection.close(200, "shutting down").await?;
        info!("broker connection released");
        Ok(())
    }
}

/// Handle one delivered message end to end, acknowledging on success.
async fn handle_delivery(
    delivery: Delivery,
    registry: Arc<TeamRegistry>,
    store: Arc<dyn MatchStore>,
) {
    let text = String::from_utf8_lossy(&delivery.data);

    match process_message(&text, &registry, store.as_ref()).await {
        Ok(count) => {
            if let Err(e) = delivery.acker.ack(BasicAckOptions::default()).await {
                error!(error = %e, "failed to acknowledge message");
                return;
            }
            info!(records = count, "message processed");
        }
        Err(e) => {
            // Left unacknowledged: the broker redelivers it.
            error!(error = %e, "message processing failed");
        }
    }
}

/// Run one message through parser, normalizer and store.
///
/// Returns the number of records persisted. Entry-level failures are logged
/// and skipped here or inside the parser; message-level parse failures and
/// batch-level persistence failures propagate to the caller, which decides
/// the acknowledgment.
pub async fn process_message(
    text: &str,
    registry: &TeamRegistry,
    store: &dyn MatchStore,
) -> Result<usize> {
    let candidates = parse_message(text, registry)?;

    let mut records = Vec::with_capacity(candidates.len());
    for candidate in &candidates {
        match normalize(&candidate.score_odds) {
            Ok(odds) => {
                info!(
                    fixture = candidate.fixture_id,
                    "processing odds for {} vs {}",
                    candidate.home_team_name,
                    candidate.away_team_name
                );
                records.push(MatchRecord::from_candidate(candidate, odds));
            }
            Err(e) => {
                warn!(fixture = candidate.fixture_id, error = %e, "skipping match entry");
            }
        }
    }

    if records.is_empty() {
        return Ok(0);
    }

    store.persist_batch(&records).await?;
    Ok(records.len())
}
