//! NATS JetStream transport for index jobs.

use std::future::IntoFuture;
use std::time::Duration;

use async_nats::jetstream::{self, consumer::pull::Config as ConsumerConfig, Context};
use async_trait::async_trait;
use futures::StreamExt;

use crate::config::QueueConfig;
use crate::error::{CoreError, CoreResult};

use super::{IndexJob, JobQueue, PUBLISH_BATCH_SIZE};

/// Jobs older than this are dropped by the stream.
const STREAM_MAX_AGE: Duration = Duration::from_secs(24 * 3600);

/// How long an indexer may hold a job before it is redelivered.
const ACK_WAIT: Duration = Duration::from_secs(15 * 60);

fn queue_error(e: impl std::fmt::Display) -> CoreError {
    CoreError::Queue(e.to_string())
}

async fn connect(config: &QueueConfig) -> CoreResult<Context> {
    let client = async_nats::connect(&config.url).await.map_err(queue_error)?;
    let js = jetstream::new(client);
    ensure_stream(&js, &config.stream, &config.subject).await?;
    Ok(js)
}

/// Ensure the JetStream stream exists.
async fn ensure_stream(js: &Context, stream: &str, subject: &str) -> CoreResult<()> {
    match js.get_stream(stream).await {
        Ok(_) => {
            tracing::debug!(stream = %stream, "Using existing NATS stream");
            Ok(())
        }
        Err(_) => {
            let config = jetstream::stream::Config {
                name: stream.to_string(),
                subjects: vec![subject.to_string()],
                max_age: STREAM_MAX_AGE,
                storage: jetstream::stream::StorageType::File,
                ..Default::default()
            };

            js.create_stream(config).await.map_err(queue_error)?;

            tracing::info!(stream = %stream, subject = %subject, "Created NATS stream");
            Ok(())
        }
    }
}

/// Publishes index jobs to JetStream.
#[derive(Clone)]
pub struct NatsJobQueue {
    js: Context,
    subject: String,
}

impl NatsJobQueue {
    pub async fn connect(config: &QueueConfig) -> CoreResult<Self> {
        let js = connect(config).await?;
        tracing::info!(url = %config.url, subject = %config.subject, "Connected job publisher");
        Ok(Self {
            js,
            subject: config.subject.clone(),
        })
    }
}

#[async_trait]
impl JobQueue for NatsJobQueue {
    async fn publish(&self, jobs: &[IndexJob]) -> CoreResult<()> {
        for batch in jobs.chunks(PUBLISH_BATCH_SIZE) {
            let mut acks = Vec::with_capacity(batch.len());
            for job in batch {
                let ack = self
                    .js
                    .publish(self.subject.clone(), job.to_payload()?.into())
                    .await
                    .map_err(queue_error)?;
                acks.push(ack.into_future());
            }

            futures::future::try_join_all(acks)
                .await
                .map_err(queue_error)?;

            tracing::debug!(count = batch.len(), "Published index job batch");
        }

        Ok(())
    }
}

/// Durable pull consumer for index jobs.
pub struct JobSubscriber {
    consumer: jetstream::consumer::Consumer<ConsumerConfig>,
}

impl JobSubscriber {
    /// Connect and create (or reuse) the durable consumer.
    pub async fn connect(config: &QueueConfig) -> CoreResult<Self> {
        let js = connect(config).await?;
        let stream = js.get_stream(&config.stream).await.map_err(queue_error)?;

        let consumer = match stream.get_consumer(&config.consumer).await {
            Ok(consumer) => consumer,
            Err(_) => {
                let consumer_config = ConsumerConfig {
                    durable_name: Some(config.consumer.clone()),
                    filter_subject: config.subject.clone(),
                    ack_wait: ACK_WAIT,
                    ..Default::default()
                };
                let consumer = stream
                    .create_consumer(consumer_config)
                    .await
                    .map_err(queue_error)?;
                tracing::info!(consumer = %config.consumer, "Created NATS consumer");
                consumer
            }
        };

        Ok(Self { consumer })
    }

    /// Fetch the next message, `None` when nothing arrived before the fetch expired.
    pub async fn receive(&self) -> CoreResult<Option<jetstream::Message>> {
        let mut messages = self
            .consumer
            .fetch()
            .max_messages(1)
            .messages()
            .await
            .map_err(queue_error)?;

        match messages.next().await {
            Some(message) => Ok(Some(message.map_err(queue_error)?)),
            None => Ok(None),
        }
    }

    /// Acknowledge a message.
    pub async fn ack(&self, message: &jetstream::Message) -> CoreResult<()> {
        message.ack().await.map_err(queue_error)
    }
}
