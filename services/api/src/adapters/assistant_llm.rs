//! services/api/src/adapters/assistant_llm.rs
//!
//! This module contains the adapter for the legal assistant chat LLM.
//! It implements the `LegalAssistantService` port from the `core` crate.

const SYSTEM_INSTRUCTIONS: &str = r#"You are an AI legal assistant helping users understand and improve their documents.
You have access to the document context and can answer questions about clauses, risks, and suggestions.

Document Context: {document_context}

Provide helpful, accurate legal guidance while noting that users should consult with qualified legal professionals for important decisions."#;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use docureview_core::ports::{
    ChatMessage, ChatRole, LegalAssistantService, PortError, PortResult, TextStream,
};
use futures::StreamExt;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `LegalAssistantService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiAssistantAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiAssistantAdapter {
    /// Creates a new `OpenAiAssistantAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    fn to_request_message(message: &ChatMessage) -> PortResult<ChatCompletionRequestMessage> {
        let built: Result<ChatCompletionRequestMessage, OpenAIError> = match message.role {
            ChatRole::User => ChatCompletionRequestUserMessageArgs::default()
                .content(message.content.clone())
                .build()
                .map(Into::into),
            ChatRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                .content(message.content.clone())
                .build()
                .map(Into::into),
        };
        built.map_err(|e| PortError::Unexpected(e.to_string()))
    }
}

//=========================================================================================
// `LegalAssistantService` Trait Implementation
//=========================================================================================

#[async_trait]
impl LegalAssistantService for OpenAiAssistantAdapter {
    async fn answer_streaming(
        &self,
        messages: &[ChatMessage],
        document_context: Option<&str>,
    ) -> PortResult<TextStream> {
        let system = SYSTEM_INSTRUCTIONS.replace(
            "{document_context}",
            document_context.unwrap_or("No document context provided"),
        );

        let mut request_messages: Vec<ChatCompletionRequestMessage> =
            Vec::with_capacity(messages.len() + 1);
        request_messages.push(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        );
        for message in messages {
            request_messages.push(Self::to_request_message(message)?);
        }

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(request_messages)
            .stream(true)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let upstream = self
            .client
            .chat()
            .create_stream(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        // Keep only the text deltas; role-only and empty chunks are dropped.
        let chunks = upstream.filter_map(|item| async move {
            match item {
                Ok(response) => response
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.delta.content)
                    .filter(|text| !text.is_empty())
                    .map(Ok),
                Err(e) => Some(Err(PortError::Unexpected(e.to_string()))),
            }
        });

        Ok(Box::pin(chunks))
    }
}
