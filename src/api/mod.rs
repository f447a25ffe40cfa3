pub mod articles;
pub mod auth;
pub mod chat;
pub mod client;
pub mod comments;
pub mod models;

pub use articles::ArticleApi;
pub use auth::AuthApi;
pub use chat::ChatApi;
pub use client::ApiClient;
pub use comments::CommentApi;
