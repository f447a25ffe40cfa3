use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub type ConversationId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ConversationKind {
    #[default]
    #[serde(rename = "AI")]
    Assistant,
    #[serde(rename = "PRIVATE")]
    Direct,
    #[serde(rename = "GROUP")]
    Group,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: ConversationId,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub kind: ConversationKind,
    #[serde(default, deserialize_with = "lenient_timestamp", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Conversation {
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() { "New chat" } else { &self.title }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SenderKind {
    #[serde(rename = "USER")]
    User,
    #[serde(rename = "AI")]
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    #[serde(rename = "senderType")]
    pub sender: SenderKind,
    #[serde(default)]
    pub sender_id: Option<i64>,
    pub content: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub article_count: Option<i64>,
    #[serde(default)]
    pub like_count: Option<i64>,
    #[serde(default)]
    pub comment_count: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthResponse {
    pub user: UserProfile,
    pub token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub author: Option<UserProfile>,
    #[serde(default)]
    pub view_count: i64,
    #[serde(default)]
    pub like_count: i64,
    #[serde(default)]
    pub comment_count: i64,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub liked: Option<bool>,
}

impl Article {
    pub fn is_liked(&self) -> bool {
        self.liked.unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ArticlePage {
    #[serde(default)]
    pub content: Vec<Article>,
    #[serde(default)]
    pub total_elements: i64,
    #[serde(default)]
    pub total_pages: i64,
    #[serde(default)]
    pub number: i64,
    #[serde(default)]
    pub size: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewArticle {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub tag: Option<String>,
    pub keyword: Option<String>,
}

impl ArticleQuery {
    /// A non-blank keyword routes the query to the search endpoint.
    pub fn search_keyword(&self) -> Option<&str> {
        self.keyword.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub content: String,
    #[serde(default)]
    pub author: Option<UserProfile>,
    #[serde(default)]
    pub article_id: i64,
    #[serde(default)]
    pub parent_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_replies")]
    pub replies: Vec<Comment>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContentBody<'a> {
    pub content: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct TitleBody<'a> {
    pub title: &'a str,
}

fn lenient_replies<'de, D>(d: D) -> Result<Vec<Comment>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Comment>>::deserialize(d)?.unwrap_or_default())
}

/// Accepts `"2024-05-01T10:00:00"` as well as Jackson's array form
/// `[2024, 5, 1, 10, 0, 0]`.
fn lenient_timestamp<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(d)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Array(parts)) => {
            let n: Vec<i64> = parts.iter().filter_map(Value::as_i64).collect();
            match n.as_slice() {
                [y, mo, d, rest @ ..] => {
                    let h = rest.first().copied().unwrap_or(0);
                    let mi = rest.get(1).copied().unwrap_or(0);
                    let s = rest.get(2).copied().unwrap_or(0);
                    Some(format!("{y:04}-{mo:02}-{d:02}T{h:02}:{mi:02}:{s:02}"))
                }
                _ => None,
            }
        }
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
