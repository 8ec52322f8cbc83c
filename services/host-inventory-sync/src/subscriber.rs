//! Kafka Event Subscriber
//!
//! Durable subscription to the persister output topic. The consumer group is
//! the persist ref, so a restarted worker resumes after the last message it
//! finished. Offsets are stored only once the processor returned for a
//! message, and a failed message is stored all the same: nothing is ever
//! redelivered because of a processing error.

use std::future::Future;
use std::time::Duration;

use futures::StreamExt;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use rdkafka::message::BorrowedMessage;
use rdkafka::Message;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::error::{error_chain, SubscriberError, SyncError};
use crate::processor::{HostInventorySync, SyncOutcome};

/// How long startup waits for the broker to answer a metadata request
const METADATA_TIMEOUT: Duration = Duration::from_secs(10);

/// Where and as whom to subscribe
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    pub queue_host: String,
    pub queue_port: u16,
    pub topic: String,
    /// Consumer group; offsets are tracked under this name
    pub persist_ref: String,
    pub client_ref: String,
}

impl SubscriberConfig {
    pub fn brokers(&self) -> String {
        format!("{}:{}", self.queue_host, self.queue_port)
    }

    fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", self.brokers())
            .set("group.id", &self.persist_ref)
            .set("client.id", &self.client_ref)
            .set("auto.offset.reset", "earliest")
            .set("enable.auto.commit", "true")
            .set("enable.auto.offset.store", "false");
        config
    }
}

/// Owns the broker connection for the lifetime of the worker
pub struct EventSubscriber {
    consumer: StreamConsumer,
    topic: String,
}

impl EventSubscriber {
    /// Create the consumer, check the broker is reachable and subscribe.
    ///
    /// The broker gets up to [`METADATA_TIMEOUT`] to answer.
    pub async fn connect(config: &SubscriberConfig) -> Result<Self, SubscriberError> {
        let consumer: StreamConsumer = config
            .client_config()
            .create()
            .map_err(SubscriberError::Create)?;

        // Both calls block inside librdkafka
        let topic = config.topic.clone();
        let brokers = config.brokers();
        let consumer = tokio::task::spawn_blocking(move || {
            consumer
                .fetch_metadata(Some(topic.as_str()), METADATA_TIMEOUT)
                .map_err(|source| SubscriberError::Connect { brokers, source })?;
            consumer
                .subscribe(&[topic.as_str()])
                .map_err(SubscriberError::Create)?;
            Ok::<_, SubscriberError>(consumer)
        })
        .await??;

        info!(
            brokers = %config.brokers(),
            topic = %config.topic,
            group = %config.persist_ref,
            "Subscribed to persister output"
        );

        Ok(Self {
            consumer,
            topic: config.topic.clone(),
        })
    }

    /// Handle messages one at a time until `shutdown` resolves or the broker
    /// reports a fatal error. A message being processed when `shutdown`
    /// fires is finished first.
    pub async fn run<F>(&self, sync: &HostInventorySync, shutdown: F) -> Result<(), SubscriberError>
    where
        F: Future<Output = ()>,
    {
        let mut stream = self.consumer.stream();
        tokio::pin!(shutdown);

        loop {
            let next = tokio::select! {
                _ = &mut shutdown => {
                    info!(topic = %self.topic, "Shutdown requested, leaving subscription");
                    return Ok(());
                }
                next = stream.next() => next,
            };

            match next {
                Some(Ok(message)) => self.dispatch(sync, &message).await,
                Some(Err(err)) => check_stream_error(err)?,
                None => return Ok(()),
            }
        }
    }

    async fn dispatch(&self, sync: &HostInventorySync, message: &BorrowedMessage<'_>) {
        let span = info_span!(
            "message",
            topic = message.topic(),
            partition = message.partition(),
            offset = message.offset()
        );

        async {
            match message.payload() {
                Some(payload) => log_result(payload, &sync.handle_payload(payload).await),
                None => warn!("Received message without payload"),
            }

            if let Err(err) = self.consumer.store_offset_from_message(message) {
                warn!(error = %err, "Failed to store offset");
            }
        }
        .instrument(span)
        .await
    }
}

/// Errors librdkafka cannot recover from on its own
fn is_fatal(err: &KafkaError) -> bool {
    err.rdkafka_error_code() == Some(RDKafkaErrorCode::Fatal)
}

/// Fatal errors end the subscription, anything else is left to librdkafka
fn check_stream_error(err: KafkaError) -> Result<(), SubscriberError> {
    if is_fatal(&err) {
        error!(error = %err, "Fatal Kafka error");
        return Err(SubscriberError::Fatal(err));
    }

    warn!(error = %err, "Kafka error, waiting for the client to recover");
    Ok(())
}

fn log_result(payload: &[u8], result: &Result<SyncOutcome, SyncError>) {
    match result {
        Ok(outcome) => debug!(?outcome, "Event processed"),
        Err(SyncError::MissingTenant) => error!(
            payload = %String::from_utf8_lossy(payload),
            "Skipping payload because of missing external_tenant"
        ),
        Err(err) => error!(
            kind = err.kind(),
            error = %error_chain(err),
            "Failed to process event"
        ),
    }
}
