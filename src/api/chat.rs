use crate::api::client::ApiClient;
use crate::api::models::{ContentBody, Conversation, ConversationId, Message, TitleBody};
use crate::error::Result;
use async_trait::async_trait;
use reqwest::Method;

/// AI conversation endpoints. These answer with bare JSON rather than an envelope.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn create_conversation(&self) -> Result<Conversation>;
    async fn list_conversations(&self) -> Result<Vec<Conversation>>;
    async fn rename_conversation(&self, id: ConversationId, title: &str) -> Result<Conversation>;
    async fn delete_conversation(&self, id: ConversationId) -> Result<()>;
    /// Returns the assistant's reply.
    async fn send_message(&self, id: ConversationId, content: &str) -> Result<Message>;
    async fn messages(&self, id: ConversationId) -> Result<Vec<Message>>;
}

#[async_trait]
impl ChatApi for ApiClient {
    async fn create_conversation(&self) -> Result<Conversation> {
        self.post_empty("/ai/chat/conversations").await
    }

    async fn list_conversations(&self) -> Result<Vec<Conversation>> {
        self.get("/ai/chat/conversations").await
    }

    async fn rename_conversation(&self, id: ConversationId, title: &str) -> Result<Conversation> {
        self.patch(&format!("/ai/chat/{id}"), &TitleBody { title: title.trim() }).await
    }

    async fn delete_conversation(&self, id: ConversationId) -> Result<()> {
        self.execute(Method::DELETE, &format!("/ai/chat/{id}")).await
    }

    async fn send_message(&self, id: ConversationId, content: &str) -> Result<Message> {
        self.post(&format!("/ai/chat/{id}/messages"), &ContentBody { content }).await
    }

    async fn messages(&self, id: ConversationId) -> Result<Vec<Message>> {
        self.get(&format!("/ai/chat/{id}/messages")).await
    }
}
