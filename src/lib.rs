//! Client for the blog REST API: session handling, the AI chat panel's
//! conversation cache, and article likes and comments.

pub mod api;
pub mod app;
pub mod chat;
pub mod engagement;
pub mod error;
pub mod optimistic;
pub mod session;
pub mod storage;
pub mod utils;

pub use error::{ClientError, Result};
