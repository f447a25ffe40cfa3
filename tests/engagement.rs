use async_trait::async_trait;
use blogdesk::api::models::{
    Article, ArticlePage, ArticleQuery, AuthResponse, Comment, NewArticle, UserProfile,
};
use blogdesk::api::{ArticleApi, AuthApi, CommentApi};
use blogdesk::engagement::{ArticleDetail, ArticleFeed, LoadState, create_article};
use blogdesk::error::{ClientError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

fn article(likes: i64, liked: bool) -> Article {
    Article {
        id: 11,
        title: "Ownership".into(),
        slug: "ownership".into(),
        like_count: likes,
        liked: Some(liked),
        ..Default::default()
    }
}

#[derive(Default)]
struct FakeArticles {
    server: Mutex<Article>,
    fail_like: Mutex<bool>,
    like_gate: Mutex<Option<oneshot::Receiver<()>>>,
    detail_calls: AtomicUsize,
    like_calls: AtomicUsize,
    queries: Mutex<Vec<ArticleQuery>>,
    created: Mutex<Vec<NewArticle>>,
}

impl FakeArticles {
    fn serving(a: Article) -> Self {
        let fake = Self::default();
        *fake.server.lock().unwrap() = a;
        fake
    }

    async fn toggle(&self, liked: bool) -> Result<()> {
        self.like_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.like_gate.lock().unwrap().take();
        if let Some(rx) = gate {
            let _ = rx.await;
        }
        if *self.fail_like.lock().unwrap() {
            return Err(ClientError::service(None));
        }
        let mut server = self.server.lock().unwrap();
        server.like_count += if liked { 1 } else { -1 };
        server.liked = Some(liked);
        Ok(())
    }
}

#[async_trait]
impl ArticleApi for FakeArticles {
    async fn list(&self, query: &ArticleQuery) -> Result<ArticlePage> {
        self.queries.lock().unwrap().push(query.clone());
        if query.search_keyword() == Some("boom") {
            return Err(ClientError::Service("Search is down".into()));
        }
        Ok(ArticlePage { content: vec![self.server.lock().unwrap().clone()], total_elements: 1, total_pages: 1, number: 0, size: 10 })
    }

    async fn detail(&self, slug: &str) -> Result<Article> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        let a = self.server.lock().unwrap().clone();
        if a.slug == slug { Ok(a) } else { Err(ClientError::Service("Article not found".into())) }
    }

    async fn like(&self, _article_id: i64) -> Result<()> {
        self.toggle(true).await
    }

    async fn unlike(&self, _article_id: i64) -> Result<()> {
        self.toggle(false).await
    }

    async fn create(&self, article: &NewArticle) -> Result<Article> {
        self.created.lock().unwrap().push(article.clone());
        Ok(Article { id: 99, title: article.title.clone(), tags: article.tags.clone(), ..Default::default() })
    }
}

#[derive(Default)]
struct FakeComments {
    stored: Mutex<Vec<Comment>>,
    fail_list: Mutex<bool>,
    creates: AtomicUsize,
}

#[async_trait]
impl CommentApi for FakeComments {
    async fn list(&self, _article_id: i64) -> Result<Vec<Comment>> {
        if *self.fail_list.lock().unwrap() {
            return Err(ClientError::service(None));
        }
        Ok(self.stored.lock().unwrap().clone())
    }

    async fn create(&self, article_id: i64, content: &str) -> Result<Comment> {
        let n = self.creates.fetch_add(1, Ordering::SeqCst) as i64;
        Ok(Comment {
            id: 500 + n,
            content: content.into(),
            author: None,
            article_id,
            parent_id: None,
            replies: vec![],
            created_at: None,
        })
    }
}

#[derive(Default)]
struct FakeUsers {
    lookups: AtomicUsize,
}

#[async_trait]
impl AuthApi for FakeUsers {
    async fn login(&self, _username: &str, _password: &str) -> Result<AuthResponse> {
        Err(ClientError::service(None))
    }

    async fn register(&self, _username: &str, _email: &str, _password: &str) -> Result<UserProfile> {
        Err(ClientError::service(None))
    }

    async fn profile(&self) -> Result<UserProfile> {
        Err(ClientError::Auth("Session expired".into()))
    }

    async fn profile_by_username(&self, username: &str) -> Result<UserProfile> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if username != "ada" {
            return Err(ClientError::Service("User not found".into()));
        }
        Ok(UserProfile {
            id: 7,
            username: "ada".into(),
            bio: Some("Writes about Rust".into()),
            article_count: Some(12),
            ..Default::default()
        })
    }
}

fn written_by(username: &str) -> Article {
    Article {
        author: Some(UserProfile { id: 7, username: username.into(), ..Default::default() }),
        ..article(0, false)
    }
}

fn detail(articles: FakeArticles) -> (ArticleDetail, Arc<FakeArticles>, Arc<FakeComments>) {
    let articles = Arc::new(articles);
    let comments = Arc::new(FakeComments::default());
    let users = Arc::new(FakeUsers::default());
    (ArticleDetail::new(articles.clone(), comments.clone(), users, "ownership"), articles, comments)
}

fn shown(d: &ArticleDetail) -> (i64, bool) {
    let a = d.article().ready().cloned().unwrap();
    (a.like_count, a.is_liked())
}

#[tokio::test]
async fn like_shows_immediately_and_reconciles() {
    let fake = FakeArticles::serving(article(4, false));
    let (tx, rx) = oneshot::channel();
    *fake.like_gate.lock().unwrap() = Some(rx);
    let (d, fake, _) = detail(fake);
    d.load().await.unwrap();

    let (res, ()) = tokio::join!(d.toggle_like(), async {
        tokio::task::yield_now().await;
        assert_eq!(shown(&d), (5, true));
        assert!(d.like_pending());
        tx.send(()).unwrap();
    });
    res.unwrap();

    assert_eq!(shown(&d), (5, true));
    assert!(!d.like_pending());
    // load + reconcile
    assert_eq!(fake.detail_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failed_like_restores_previous_state() {
    let fake = FakeArticles::serving(article(4, false));
    *fake.fail_like.lock().unwrap() = true;
    let (d, fake, _) = detail(fake);
    d.load().await.unwrap();

    assert!(d.toggle_like().await.is_err());
    assert_eq!(shown(&d), (4, false));
    assert_eq!(fake.detail_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failed_unlike_restores_previous_state() {
    let fake = FakeArticles::serving(article(1, true));
    *fake.fail_like.lock().unwrap() = true;
    let (d, _, _) = detail(fake);
    d.load().await.unwrap();

    assert!(d.toggle_like().await.is_err());
    assert_eq!(shown(&d), (1, true));
}

#[tokio::test]
async fn reconcile_picks_up_server_drift() {
    let fake = FakeArticles::serving(article(4, true));
    let (d, fake, _) = detail(fake);
    d.load().await.unwrap();
    // someone else liked it meanwhile
    fake.server.lock().unwrap().like_count = 10;

    d.toggle_like().await.unwrap();
    assert_eq!(shown(&d), (9, false));
}

#[tokio::test]
async fn second_toggle_while_pending_is_refused() {
    let fake = FakeArticles::serving(article(0, false));
    let (tx, rx) = oneshot::channel();
    *fake.like_gate.lock().unwrap() = Some(rx);
    let (d, fake, _) = detail(fake);
    d.load().await.unwrap();

    let (first, ()) = tokio::join!(d.toggle_like(), async {
        tokio::task::yield_now().await;
        assert!(d.toggle_like().await.unwrap_err().is_validation());
        tx.send(()).unwrap();
    });
    first.unwrap();
    assert_eq!(fake.like_calls.load(Ordering::SeqCst), 1);
    assert_eq!(shown(&d), (1, true));
}

#[tokio::test]
async fn cancelled_toggle_does_not_block_the_next_one() {
    let fake = FakeArticles::serving(article(4, false));
    // never released: the first request hangs until it is dropped
    let (_hold, rx) = oneshot::channel();
    *fake.like_gate.lock().unwrap() = Some(rx);
    let (d, fake, _) = detail(fake);
    d.load().await.unwrap();

    let timed_out = tokio::time::timeout(Duration::from_millis(20), d.toggle_like()).await;
    assert!(timed_out.is_err());
    assert!(!d.like_pending());
    assert_eq!(shown(&d), (4, false));

    d.toggle_like().await.unwrap();
    assert_eq!(fake.like_calls.load(Ordering::SeqCst), 2);
    assert_eq!(shown(&d), (5, true));
    assert!(!d.like_pending());
}

#[tokio::test]
async fn toggle_before_load_is_rejected() {
    let (d, fake, _) = detail(FakeArticles::serving(article(0, false)));
    assert!(d.toggle_like().await.unwrap_err().is_validation());
    assert_eq!(fake.like_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_article_shows_failure() {
    let articles = Arc::new(FakeArticles::serving(article(0, false)));
    let d = ArticleDetail::new(
        articles,
        Arc::new(FakeComments::default()),
        Arc::new(FakeUsers::default()),
        "nope",
    );
    assert!(d.load().await.is_err());
    assert_eq!(d.article(), LoadState::Failed("Article not found".into()));
    assert_eq!(d.comments(), LoadState::Idle);
}

#[tokio::test]
async fn comment_failure_only_affects_comments() {
    let (d, _, comments) = detail(FakeArticles::serving(article(0, false)));
    *comments.fail_list.lock().unwrap() = true;
    d.load().await.unwrap();
    assert!(d.article().ready().is_some());
    assert!(matches!(d.comments(), LoadState::Failed(_)));
}

#[tokio::test]
async fn author_profile_loads_once_on_demand() {
    let articles = Arc::new(FakeArticles::serving(written_by("ada")));
    let users = Arc::new(FakeUsers::default());
    let d = ArticleDetail::new(articles, Arc::new(FakeComments::default()), users.clone(), "ownership");

    assert!(d.load_author().await.unwrap_err().is_validation());
    d.load().await.unwrap();
    assert_eq!(d.author(), LoadState::Idle);
    assert_eq!(users.lookups.load(Ordering::SeqCst), 0);

    let author = d.load_author().await.unwrap();
    assert_eq!(author.bio.as_deref(), Some("Writes about Rust"));
    assert_eq!(d.author().ready().map(|a| a.id), Some(7));

    d.load_author().await.unwrap();
    assert_eq!(users.lookups.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unknown_author_shows_failure_without_touching_the_article() {
    let articles = Arc::new(FakeArticles::serving(written_by("ghost")));
    let d = ArticleDetail::new(
        articles,
        Arc::new(FakeComments::default()),
        Arc::new(FakeUsers::default()),
        "ownership",
    );
    d.load().await.unwrap();

    assert!(d.load_author().await.is_err());
    assert_eq!(d.author(), LoadState::Failed("User not found".into()));
    assert!(d.article().ready().is_some());
}

#[tokio::test]
async fn article_without_author_skips_the_lookup() {
    let (d, _, _) = detail(FakeArticles::serving(article(0, false)));
    d.load().await.unwrap();
    assert!(d.load_author().await.unwrap_err().is_validation());
    assert_eq!(d.author(), LoadState::Idle);
}

#[tokio::test]
async fn posting_a_comment_appends_and_counts() {
    let (d, _, comments) = detail(FakeArticles::serving(article(0, false)));
    d.load().await.unwrap();

    assert!(d.post_comment("   ").await.unwrap_err().is_validation());
    assert_eq!(comments.creates.load(Ordering::SeqCst), 0);

    let c = d.post_comment(" Nice read ").await.unwrap();
    assert_eq!(c.content, "Nice read");
    assert_eq!(c.article_id, 11);
    assert_eq!(d.comments().ready().map(Vec::len), Some(1));
    assert_eq!(d.article().ready().map(|a| a.comment_count), Some(1));
}

#[tokio::test]
async fn feed_routes_keyword_to_search_and_reports_errors() {
    let articles = Arc::new(FakeArticles::serving(article(0, false)));
    let feed = ArticleFeed::new(articles.clone());

    let page = feed.load(ArticleQuery { page: Some(0), size: Some(10), ..Default::default() }).await.unwrap();
    assert_eq!(page.content.len(), 1);
    assert!(feed.page().ready().is_some());

    let query = ArticleQuery { keyword: Some("boom".into()), ..Default::default() };
    assert!(feed.load(query.clone()).await.is_err());
    assert_eq!(feed.page(), LoadState::Failed("Search is down".into()));

    assert!(feed.retry().await.is_err());
    assert_eq!(articles.queries.lock().unwrap().last(), Some(&query));
}

#[tokio::test]
async fn article_creation_validates_and_cleans_tags() {
    let fake = FakeArticles::default();
    assert!(create_article(&fake, " ", "body", &[]).await.unwrap_err().is_validation());
    assert!(create_article(&fake, "Title", "  ", &[]).await.unwrap_err().is_validation());
    assert!(fake.created.lock().unwrap().is_empty());

    let tags = vec!["rust".to_string(), " ".to_string(), " rust ".to_string(), "async".to_string()];
    let created = create_article(&fake, " Title ", "body text", &tags).await.unwrap();
    assert_eq!(created.title, "Title");
    assert_eq!(created.tags, vec!["rust".to_string(), "async".to_string()]);
}
