use crate::api::models::{Article, ArticlePage, ArticleQuery, Comment, NewArticle, UserProfile};
use crate::api::{ArticleApi, AuthApi, CommentApi};
use crate::error::{ClientError, Result};
use crate::optimistic;
use std::cell::{Cell, RefCell};
use std::sync::Arc;

/// What a data-fetching view renders.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState<T> {
    #[default]
    Idle,
    Loading,
    Failed(String),
    Ready(T),
}

impl<T> LoadState<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            LoadState::Ready(v) => Some(v),
            _ => None,
        }
    }

    fn from_result(res: &Result<T>) -> Self
    where
        T: Clone,
    {
        match res {
            Ok(v) => LoadState::Ready(v.clone()),
            Err(e) => LoadState::Failed(e.message().to_string()),
        }
    }
}

// Clears the in-flight flag even when the toggle future is dropped early.
struct PendingGuard<'a>(&'a Cell<bool>);

impl<'a> PendingGuard<'a> {
    fn acquire(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.replace(true) { None } else { Some(Self(flag)) }
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// One article page: the article, its author card, its comments, and the
/// like toggle.
pub struct ArticleDetail {
    articles: Arc<dyn ArticleApi>,
    comments: Arc<dyn CommentApi>,
    users: Arc<dyn AuthApi>,
    slug: String,
    article: RefCell<LoadState<Article>>,
    author: RefCell<LoadState<UserProfile>>,
    comment_list: RefCell<LoadState<Vec<Comment>>>,
    like_pending: Cell<bool>,
}

impl ArticleDetail {
    pub fn new(
        articles: Arc<dyn ArticleApi>,
        comments: Arc<dyn CommentApi>,
        users: Arc<dyn AuthApi>,
        slug: &str,
    ) -> Self {
        Self {
            articles,
            comments,
            users,
            slug: slug.to_string(),
            article: RefCell::new(LoadState::Idle),
            author: RefCell::new(LoadState::Idle),
            comment_list: RefCell::new(LoadState::Idle),
            like_pending: Cell::new(false),
        }
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn article(&self) -> LoadState<Article> {
        self.article.borrow().clone()
    }

    pub fn author(&self) -> LoadState<UserProfile> {
        self.author.borrow().clone()
    }

    pub fn comments(&self) -> LoadState<Vec<Comment>> {
        self.comment_list.borrow().clone()
    }

    pub fn like_pending(&self) -> bool {
        self.like_pending.get()
    }

    fn loaded(&self) -> Result<Article> {
        self.article
            .borrow()
            .ready()
            .cloned()
            .ok_or_else(|| ClientError::Validation("Article is not loaded.".into()))
    }

    /// Loads the article, then its comments. A comment failure only marks
    /// the comment section as failed.
    pub async fn load(&self) -> Result<()> {
        *self.article.borrow_mut() = LoadState::Loading;
        let res = self.articles.detail(&self.slug).await;
        *self.article.borrow_mut() = LoadState::from_result(&res);
        let article = res?;
        self.load_comments(article.id).await;
        Ok(())
    }

    async fn load_comments(&self, article_id: i64) {
        *self.comment_list.borrow_mut() = LoadState::Loading;
        let res = self.comments.list(article_id).await;
        if let Err(e) = &res {
            log::warn!("failed to load comments for article {article_id}: {e}");
        }
        *self.comment_list.borrow_mut() = LoadState::from_result(&res);
    }

    /// Re-reads the article from the server; on failure the displayed
    /// record is kept.
    async fn reconcile(&self) {
        match self.articles.detail(&self.slug).await {
            Ok(fresh) => *self.article.borrow_mut() = LoadState::Ready(fresh),
            Err(e) => log::warn!("failed to reconcile article {}: {e}", self.slug),
        }
    }

    /// Fetches the author's public profile, the first time the author card
    /// is opened. A profile that already loaded is not fetched again.
    pub async fn load_author(&self) -> Result<UserProfile> {
        if let Some(author) = self.author.borrow().ready() {
            return Ok(author.clone());
        }
        let username = self
            .loaded()?
            .author
            .map(|a| a.username)
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| ClientError::Validation("Article has no author.".into()))?;

        *self.author.borrow_mut() = LoadState::Loading;
        let res = self.users.profile_by_username(&username).await;
        if let Err(e) = &res {
            log::warn!("failed to load profile of {username}: {e}");
        }
        *self.author.borrow_mut() = LoadState::from_result(&res);
        res
    }

    /// Flips the like state on screen first, then asks the server. A failed
    /// request restores the previous state; either way the article is
    /// re-fetched afterwards.
    pub async fn toggle_like(&self) -> Result<()> {
        let current = self.loaded()?;
        let Some(_pending) = PendingGuard::acquire(&self.like_pending) else {
            return Err(ClientError::Validation("Like request already in progress.".into()));
        };
        let was_liked = current.is_liked();

        let request = async {
            if was_liked {
                self.articles.unlike(current.id).await
            } else {
                self.articles.like(current.id).await
            }
        };
        let res = optimistic::apply(
            &self.article,
            |state| {
                if let LoadState::Ready(a) = state {
                    if was_liked {
                        a.like_count = (a.like_count - 1).max(0);
                    } else {
                        a.like_count += 1;
                    }
                    a.liked = Some(!was_liked);
                }
            },
            request,
        )
        .await;
        if let Err(e) = &res {
            log::warn!("like toggle on article {} failed: {e}", current.id);
        }

        self.reconcile().await;
        res
    }

    pub async fn post_comment(&self, content: &str) -> Result<Comment> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ClientError::Validation("Comment cannot be empty.".into()));
        }
        let article = self.loaded()?;
        let comment = self.comments.create(article.id, content).await?;

        {
            let mut list = self.comment_list.borrow_mut();
            match &mut *list {
                LoadState::Ready(items) => items.push(comment.clone()),
                other => *other = LoadState::Ready(vec![comment.clone()]),
            }
        }
        if let LoadState::Ready(a) = &mut *self.article.borrow_mut() {
            a.comment_count += 1;
        }
        Ok(comment)
    }
}

/// The article list, which doubles as search results.
pub struct ArticleFeed {
    articles: Arc<dyn ArticleApi>,
    page: RefCell<LoadState<ArticlePage>>,
    query: RefCell<ArticleQuery>,
}

impl ArticleFeed {
    pub fn new(articles: Arc<dyn ArticleApi>) -> Self {
        Self {
            articles,
            page: RefCell::new(LoadState::Idle),
            query: RefCell::new(ArticleQuery::default()),
        }
    }

    pub fn page(&self) -> LoadState<ArticlePage> {
        self.page.borrow().clone()
    }

    pub fn query(&self) -> ArticleQuery {
        self.query.borrow().clone()
    }

    pub async fn load(&self, query: ArticleQuery) -> Result<ArticlePage> {
        *self.query.borrow_mut() = query.clone();
        *self.page.borrow_mut() = LoadState::Loading;
        let res = self.articles.list(&query).await;
        // a newer query may have started while this one was in flight
        if *self.query.borrow() == query {
            *self.page.borrow_mut() = LoadState::from_result(&res);
        }
        res
    }

    /// Reloads with the last query; the retry action of the error state.
    pub async fn retry(&self) -> Result<ArticlePage> {
        let query = self.query();
        self.load(query).await
    }
}

/// Validates locally, then publishes. Blank tags are dropped.
pub async fn create_article(
    articles: &dyn ArticleApi,
    title: &str,
    content: &str,
    tags: &[String],
) -> Result<Article> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ClientError::Validation("Title cannot be empty.".into()));
    }
    if content.trim().is_empty() {
        return Err(ClientError::Validation("Content cannot be empty.".into()));
    }
    let mut clean: Vec<String> = Vec::new();
    for tag in tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if !clean.iter().any(|c| c == tag) {
            clean.push(tag.to_string());
        }
    }
    let new = NewArticle { title: title.to_string(), content: content.to_string(), tags: clean };
    articles.create(&new).await
}
