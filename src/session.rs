use crate::api::AuthApi;
use crate::api::models::UserProfile;
use crate::app::TokenStore;
use crate::error::{ClientError, Result};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    pub user: Option<UserProfile>,
    pub loading: bool,
}

/// What a session-dependent view may do right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Profile fetch in flight; render nothing session-dependent yet.
    Pending,
    Allow,
    RedirectToLogin,
}

/// The one session context of the process. Built once at startup with
/// [`SessionStore::init`] and handed to every consumer that needs it.
pub struct SessionStore {
    auth: Arc<dyn AuthApi>,
    tokens: Arc<dyn TokenStore>,
    state: watch::Sender<Session>,
}

impl SessionStore {
    /// Starts in the loading state when a token is present. Call
    /// [`refresh_profile`](Self::refresh_profile) to resolve it, or use `init`.
    pub fn new(auth: Arc<dyn AuthApi>, tokens: Arc<dyn TokenStore>) -> Self {
        let loading = tokens.token().is_some();
        let (state, _) = watch::channel(Session { user: None, loading });
        Self { auth, tokens, state }
    }

    pub async fn init(auth: Arc<dyn AuthApi>, tokens: Arc<dyn TokenStore>) -> Self {
        let store = Self::new(auth, tokens);
        if store.tokens.token().is_some() {
            store.refresh_profile().await;
        }
        store
    }

    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.state.borrow().user.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    pub async fn wait_ready(&self) {
        let mut rx = self.subscribe();
        let _ = rx.wait_for(|s| !s.loading).await;
    }

    pub fn guard(&self) -> Guard {
        let state = self.state.borrow();
        if state.loading {
            Guard::Pending
        } else if state.user.is_some() {
            Guard::Allow
        } else {
            Guard::RedirectToLogin
        }
    }

    fn set(&self, user: Option<UserProfile>, loading: bool) {
        self.state.send_replace(Session { user, loading });
    }

    fn set_loading(&self, loading: bool) {
        self.state.send_modify(|s| s.loading = loading);
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<UserProfile> {
        self.set_loading(true);
        let resp = match self.auth.login(username, password).await {
            Ok(resp) => resp,
            Err(e) => {
                log::info!("login rejected for {username}: {e}");
                self.set(None, false);
                return Err(e);
            }
        };
        if let Err(e) = self.tokens.set_token(&resp.token) {
            self.set(None, false);
            return Err(e);
        }
        log::info!("logged in as {}", resp.user.username);
        self.set(Some(resp.user.clone()), false);
        Ok(resp.user)
    }

    /// Creates the account, then logs in with the same credentials.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<UserProfile> {
        self.auth.register(username, email, password).await?;
        self.login(username, password).await
    }

    pub fn logout(&self) {
        if let Err(e) = self.tokens.clear_token() {
            log::warn!("failed to clear stored token: {e}");
        }
        log::info!("logged out");
        self.set(None, false);
    }

    /// Never fails: an unusable token just leaves the session logged out.
    pub async fn refresh_profile(&self) {
        if self.tokens.token().is_none() {
            self.set(None, false);
            return;
        }
        self.set_loading(true);
        match self.auth.profile().await {
            Ok(user) => self.set(Some(user), false),
            Err(e) => {
                log::warn!("profile refresh failed, dropping session: {e}");
                if matches!(e, ClientError::Auth(_)) {
                    if let Err(e) = self.tokens.clear_token() {
                        log::warn!("failed to clear stored token: {e}");
                    }
                }
                self.set(None, false);
            }
        }
    }
}
