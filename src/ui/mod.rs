pub mod chat_view;
pub mod login;
pub mod main_window;
pub mod sidebar;

use adw::prelude::*;
use adw::Application;
use blogdesk::api::ApiClient;
use blogdesk::app::{AppState, FileTokenStore, MemoryTokenStore, TokenStore};
use blogdesk::session::{Guard, SessionStore};
use once_cell::sync::Lazy;
use std::future::Future;
use std::sync::Arc;

pub static RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to build Tokio runtime")
});

/// Runs `fut` on the GTK main loop, so it may touch widgets and `Rc` state.
pub fn spawn_local<F>(fut: F)
where
    F: Future<Output = ()> + 'static,
{
    glib::MainContext::default().spawn_local(fut);
}

/// Everything a window needs to talk to the backend.
#[derive(Clone)]
pub struct Context {
    pub base_url: String,
    pub api: Arc<ApiClient>,
    pub session: Arc<SessionStore>,
}

impl Context {
    pub fn connect(base_url: &str) -> blogdesk::Result<Self> {
        let tokens: Arc<dyn TokenStore> = match FileTokenStore::open_default() {
            Ok(store) => Arc::new(store),
            Err(e) => {
                log::warn!("token will not persist: {e}");
                Arc::new(MemoryTokenStore::new())
            }
        };
        let api = Arc::new(ApiClient::new(base_url, tokens.clone())?);
        let session = Arc::new(SessionStore::new(api.clone(), tokens));
        Ok(Self { base_url: base_url.to_string(), api, session })
    }
}

pub fn build_ui(app: &Application) {
    let state = AppState::load();
    let ctx = match Context::connect(&state.base_url) {
        Ok(ctx) => ctx,
        Err(e) => {
            log::error!("failed to set up the API client: {e}");
            return;
        }
    };

    // nothing session-dependent is shown until the stored token is checked
    let hold = app.hold();
    let app = app.clone();
    spawn_local(async move {
        ctx.session.refresh_profile().await;
        match ctx.session.guard() {
            Guard::Allow => main_window::show_main_window(&app, ctx),
            Guard::Pending | Guard::RedirectToLogin => login::show_login_window(&app, ctx),
        }
        drop(hold);
    });
}
