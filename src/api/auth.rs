use crate::api::client::ApiClient;
use crate::api::models::{AuthResponse, LoginRequest, RegisterRequest, UserProfile};
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, username: &str, password: &str) -> Result<AuthResponse>;
    async fn register(&self, username: &str, email: &str, password: &str) -> Result<UserProfile>;
    /// Profile of the user the stored token belongs to.
    async fn profile(&self) -> Result<UserProfile>;
    async fn profile_by_username(&self, username: &str) -> Result<UserProfile>;
}

#[async_trait]
impl AuthApi for ApiClient {
    async fn login(&self, username: &str, password: &str) -> Result<AuthResponse> {
        self.post("/auth/login", &LoginRequest { username, password }).await
    }

    async fn register(&self, username: &str, email: &str, password: &str) -> Result<UserProfile> {
        self.post("/auth/register", &RegisterRequest { username, email, password })
            .await
    }

    async fn profile(&self) -> Result<UserProfile> {
        self.get("/auth/me").await
    }

    async fn profile_by_username(&self, username: &str) -> Result<UserProfile> {
        self.get(&format!("/auth/search-user/{username}")).await
    }
}
