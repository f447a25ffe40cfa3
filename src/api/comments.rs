use crate::api::client::ApiClient;
use crate::api::models::{Comment, ContentBody};
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait CommentApi: Send + Sync {
    async fn list(&self, article_id: i64) -> Result<Vec<Comment>>;
    async fn create(&self, article_id: i64, content: &str) -> Result<Comment>;
}

#[async_trait]
impl CommentApi for ApiClient {
    async fn list(&self, article_id: i64) -> Result<Vec<Comment>> {
        self.get(&format!("/comments/article/{article_id}")).await
    }

    async fn create(&self, article_id: i64, content: &str) -> Result<Comment> {
        self.post(&format!("/comments/article/{article_id}"), &ContentBody { content })
            .await
    }
}
