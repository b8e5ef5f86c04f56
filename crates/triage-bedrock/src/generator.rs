//! The text-generation seam used by the intake dialogue.
//!
//! The dialogue only ever needs "prompt in, text out", so the model sits
//! behind [`TextGenerator`]. [`BedrockGenerator`] is the production
//! implementation (Converse API, single user turn); [`TimeoutGenerator`]
//! bounds any generator with a deployment-configured deadline so a hung
//! call resolves to an error instead of leaving a session busy forever.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use aws_sdk_bedrockruntime::Client;
use aws_sdk_bedrockruntime::types::{
    ContentBlock, ConversationRole, Message, SystemContentBlock,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::BedrockError;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

const SYSTEM_PROMPT: &str = "\
You support a patient intake service. Follow the formatting rules in each \
request exactly and do not add greetings or commentary.";

/// Anything that turns a prompt into freeform text.
///
/// Implementations fail with a [`BedrockError`] on transport or service
/// errors; no retries happen at this layer. Methods return boxed futures
/// for dyn compatibility.
pub trait TextGenerator: Send + Sync {
    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, BedrockError>>;
}

impl<T: TextGenerator + ?Sized> TextGenerator for Arc<T> {
    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, BedrockError>> {
        (**self).generate(prompt)
    }
}

/// Bedrock Converse-backed generator.
pub struct BedrockGenerator {
    client: Client,
    model_id: String,
}

impl BedrockGenerator {
    pub fn new(client: Client, model_id: impl Into<String>) -> Result<Self, BedrockError> {
        let model_id = model_id.into();
        if model_id.trim().is_empty() {
            return Err(BedrockError::Config("model id is empty".to_string()));
        }
        Ok(Self { client, model_id })
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn converse(&self, prompt: &str) -> Result<String, BedrockError> {
        let call_id = Uuid::new_v4();
        info!(
            call_id = %call_id,
            model = %self.model_id,
            prompt_len = prompt.len(),
            "starting generation"
        );

        let response = self
            .client
            .converse()
            .model_id(&self.model_id)
            .system(SystemContentBlock::Text(SYSTEM_PROMPT.to_string()))
            .messages(
                Message::builder()
                    .role(ConversationRole::User)
                    .content(ContentBlock::Text(prompt.to_string()))
                    .build()
                    .map_err(|e| BedrockError::Invocation(e.to_string()))?,
            )
            .send()
            .await
            .map_err(|e| BedrockError::Invocation(e.into_service_error().to_string()))?;

        let output_message = response
            .output()
            .and_then(|o| o.as_message().ok())
            .ok_or_else(|| BedrockError::ResponseParse("no message in response".to_string()))?;

        let text = output_message
            .content()
            .iter()
            .filter_map(|block| {
                if let ContentBlock::Text(text) = block {
                    Some(text.as_str())
                } else {
                    None
                }
            })
            .collect::<Vec<_>>()
            .join("");

        if text.trim().is_empty() {
            warn!(call_id = %call_id, "model returned no text");
            return Err(BedrockError::ResponseParse("empty response".to_string()));
        }

        info!(call_id = %call_id, response_len = text.len(), "generation complete");

        Ok(text)
    }
}

impl TextGenerator for BedrockGenerator {
    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, BedrockError>> {
        Box::pin(self.converse(prompt))
    }
}

/// Wraps a generator with a deadline.
pub struct TimeoutGenerator<G> {
    inner: G,
    timeout: Duration,
}

impl<G: TextGenerator> TimeoutGenerator<G> {
    pub fn new(inner: G, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

impl<G: TextGenerator> TextGenerator for TimeoutGenerator<G> {
    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, BedrockError>> {
        Box::pin(async move {
            match tokio::time::timeout(self.timeout, self.inner.generate(prompt)).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(timeout = ?self.timeout, "generation timed out");
                    Err(BedrockError::Timeout(self.timeout))
                }
            }
        })
    }
}
