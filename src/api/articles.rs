use crate::api::client::ApiClient;
use crate::api::models::{Article, ArticlePage, ArticleQuery, NewArticle};
use crate::error::Result;
use async_trait::async_trait;
use reqwest::Method;

#[async_trait]
pub trait ArticleApi: Send + Sync {
    async fn list(&self, query: &ArticleQuery) -> Result<ArticlePage>;
    async fn detail(&self, slug: &str) -> Result<Article>;
    async fn like(&self, article_id: i64) -> Result<()>;
    async fn unlike(&self, article_id: i64) -> Result<()>;
    async fn create(&self, article: &NewArticle) -> Result<Article>;
}

fn query_params(query: &ArticleQuery) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(keyword) = query.search_keyword() {
        params.push(("keyword", keyword.to_string()));
    }
    if let Some(page) = query.page {
        params.push(("page", page.to_string()));
    }
    if let Some(size) = query.size {
        params.push(("size", size.to_string()));
    }
    if let Some(tag) = query.tag.as_deref().filter(|t| !t.is_empty()) {
        params.push(("tag", tag.to_string()));
    }
    params
}

#[async_trait]
impl ArticleApi for ApiClient {
    async fn list(&self, query: &ArticleQuery) -> Result<ArticlePage> {
        let path = if query.search_keyword().is_some() { "/articles/search" } else { "/articles" };
        self.get_query(path, &query_params(query)).await
    }

    async fn detail(&self, slug: &str) -> Result<Article> {
        self.get(&format!("/articles/slug/{slug}")).await
    }

    async fn like(&self, article_id: i64) -> Result<()> {
        self.execute(Method::POST, &format!("/likes/article/{article_id}")).await
    }

    async fn unlike(&self, article_id: i64) -> Result<()> {
        self.execute(Method::DELETE, &format!("/likes/article/{article_id}")).await
    }

    async fn create(&self, article: &NewArticle) -> Result<Article> {
        self.post("/articles", article).await
    }
}
