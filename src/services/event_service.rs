use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_sqs::{types::MessageAttributeValue, Client as SqsClient};

use crate::{
    config::AwsConfig,
    error::{AppError, Result},
};

pub const USER_LOGGED_IN: &str = "USER_LOGGED_IN";

/// At-least-once event sink. Callers decide whether a publish failure is
/// fatal; the login path treats it as best-effort and only logs.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(
        &self,
        event_type: &str,
        payload: serde_json::Value,
        metadata: HashMap<String, String>,
    ) -> Result<()>;
}

pub struct SqsEventPublisher {
    client: SqsClient,
    queue_url: String,
}

impl SqsEventPublisher {
    pub async fn new(config: &AwsConfig) -> Result<Self> {
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        let client = SqsClient::new(&aws_config);

        let queue_url = client
            .get_queue_url()
            .queue_name(&config.event_queue_name)
            .send()
            .await
            .map_err(|e| {
                AppError::ConfigError(format!(
                    "Failed to resolve queue url for {}: {}",
                    config.event_queue_name, e
                ))
            })?
            .queue_url()
            .ok_or_else(|| AppError::ConfigError("SQS returned no queue url".to_string()))?
            .to_string();

        tracing::info!("SQS event publisher initialized for {}", queue_url);

        Ok(Self { client, queue_url })
    }
}

#[async_trait]
impl EventPublisher for SqsEventPublisher {
    async fn publish(
        &self,
        event_type: &str,
        payload: serde_json::Value,
        metadata: HashMap<String, String>,
    ) -> Result<()> {
        let string_attr = |value: &str| {
            MessageAttributeValue::builder()
                .data_type("String")
                .string_value(value)
                .build()
                .map_err(|e| AppError::InternalError(format!("Invalid message attribute: {}", e)))
        };

        let mut request = self
            .client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(payload.to_string())
            .message_attributes("event_type", string_attr(event_type)?);

        for (key, value) in &metadata {
            request = request.message_attributes(key, string_attr(value)?);
        }

        request.send().await.map_err(|e| {
            tracing::error!("Failed to publish {} event: {:?}", event_type, e);
            AppError::InternalError("Failed to publish event".to_string())
        })?;

        Ok(())
    }
}
