//! Conversation list and per-conversation message cache for the assistant panel.
//!
//! All state lives in a single `RefCell` driven from the UI thread. Borrows
//! are released before every `.await`, so several operations may be in
//! flight at once; each completion writes only into the slot of the
//! conversation it was issued for.

use crate::api::ChatApi;
use crate::api::models::{Conversation, ConversationId, Message, SenderKind};
use crate::error::{ClientError, Result};
use crate::storage::ConversationCache;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

pub const ASSISTANT_UNAVAILABLE: &str =
    "The assistant is unavailable right now. Please try again later.";

#[derive(Default)]
struct ChatState {
    conversations: Vec<Conversation>,
    active: Option<Conversation>,
    messages: HashMap<ConversationId, Vec<Message>>,
    // bumped on every fetch; a fetch only lands if its number is still current
    generations: HashMap<ConversationId, u64>,
    last_generation: u64,
    input: String,
    last_local_id: i64,
}

impl ChatState {
    fn bump(&mut self, id: ConversationId) -> u64 {
        self.last_generation += 1;
        self.generations.insert(id, self.last_generation);
        self.last_generation
    }

    fn next_local_id(&mut self) -> i64 {
        let id = crate::utils::now_millis().max(self.last_local_id + 1);
        self.last_local_id = id;
        id
    }

    fn local_message(&mut self, sender: SenderKind, content: &str) -> Message {
        Message {
            id: self.next_local_id(),
            sender,
            sender_id: None,
            content: content.to_string(),
            created_at: None,
        }
    }

    fn position(&self, id: ConversationId) -> Option<usize> {
        self.conversations.iter().position(|c| c.id == id)
    }
}

pub struct ChatSync {
    api: Arc<dyn ChatApi>,
    cache: Option<ConversationCache>,
    state: RefCell<ChatState>,
    listeners: RefCell<Vec<Box<dyn Fn()>>>,
}

impl ChatSync {
    pub fn new(api: Arc<dyn ChatApi>) -> Self {
        Self {
            api,
            cache: None,
            state: RefCell::new(ChatState::default()),
            listeners: RefCell::new(Vec::new()),
        }
    }

    /// Persist every fetched conversation list to `cache`.
    pub fn with_cache(mut self, cache: ConversationCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Called after every change to the list, the active conversation or
    /// any message slot. Listeners may read the state but must not register
    /// further listeners.
    pub fn connect_changed(&self, f: impl Fn() + 'static) {
        self.listeners.borrow_mut().push(Box::new(f));
    }

    fn notify(&self) {
        for f in self.listeners.borrow().iter() {
            f();
        }
    }

    pub fn conversations(&self) -> Vec<Conversation> {
        self.state.borrow().conversations.clone()
    }

    pub fn active(&self) -> Option<Conversation> {
        self.state.borrow().active.clone()
    }

    pub fn messages(&self, id: ConversationId) -> Option<Vec<Message>> {
        self.state.borrow().messages.get(&id).cloned()
    }

    pub fn active_messages(&self) -> Vec<Message> {
        let state = self.state.borrow();
        state
            .active
            .as_ref()
            .and_then(|c| state.messages.get(&c.id).cloned())
            .unwrap_or_default()
    }

    pub fn input(&self) -> String {
        self.state.borrow().input.clone()
    }

    pub fn set_input(&self, text: &str) {
        self.state.borrow_mut().input = text.to_string();
    }

    /// Shows previously cached conversations until the first fetch lands.
    pub fn seed(&self, conversations: Vec<Conversation>) {
        {
            let mut state = self.state.borrow_mut();
            if !state.conversations.is_empty() {
                return;
            }
            state.conversations = conversations;
        }
        self.notify();
    }

    /// Fetches the list; the first entry becomes active and its messages
    /// are loaded. An empty list clears the active conversation.
    pub async fn list_conversations(&self) -> Result<Vec<Conversation>> {
        let list = self.api.list_conversations().await?;
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.replace_all(&list) {
                log::warn!("failed to cache conversations: {e}");
            }
        }

        let first = {
            let mut state = self.state.borrow_mut();
            state.conversations = list.clone();
            state.active = list.first().cloned();
            state.active.as_ref().map(|c| c.id)
        };
        self.notify();
        if let Some(id) = first {
            if let Err(e) = self.load_messages(id).await {
                log::warn!("failed to load messages for conversation {id}: {e}");
            }
        }
        Ok(list)
    }

    /// Replaces the cached messages of `id` with the server's history,
    /// keeping anything sent after the fetch started. A response overtaken
    /// by a newer fetch of the same conversation is dropped.
    pub async fn load_messages(&self, id: ConversationId) -> Result<()> {
        let (generation, start_len) = {
            let mut state = self.state.borrow_mut();
            let start_len = state.messages.get(&id).map_or(0, Vec::len);
            (state.bump(id), start_len)
        };
        let mut list = self.api.messages(id).await?;

        {
            let mut state = self.state.borrow_mut();
            if state.generations.get(&id) != Some(&generation) {
                log::debug!("discarding stale history for conversation {id}");
                return Ok(());
            }
            // entries sent while the fetch was in flight go after the history
            if let Some(local) = state.messages.get(&id).and_then(|m| m.get(start_len..)) {
                list.extend_from_slice(local);
            }
            state.messages.insert(id, list);
        }
        self.notify();
        Ok(())
    }

    pub async fn create_conversation(&self) -> Result<Conversation> {
        let conv = self.api.create_conversation().await?;
        {
            let mut state = self.state.borrow_mut();
            // repeated clicks can hand back an id the list already holds
            if state.position(conv.id).is_none() {
                state.conversations.insert(0, conv.clone());
            }
            state.active = Some(conv.clone());
            state.messages.entry(conv.id).or_default();
        }
        log::debug!("created conversation {}", conv.id);
        self.notify();
        Ok(conv)
    }

    /// Appends the user's message immediately, then the assistant's reply.
    /// On failure a local notice is appended in place of the reply and the
    /// error is returned; the user's message stays.
    pub async fn send_message(&self, id: ConversationId, content: &str) -> Result<Message> {
        if content.trim().is_empty() {
            return Err(ClientError::Validation("Message cannot be empty.".into()));
        }
        {
            let mut state = self.state.borrow_mut();
            let entry = state.local_message(SenderKind::User, content);
            state.messages.entry(id).or_default().push(entry);
            state.input.clear();
        }
        self.notify();

        let res = self.api.send_message(id, content).await;
        {
            let mut state = self.state.borrow_mut();
            let entry = match &res {
                Ok(reply) => reply.clone(),
                Err(e) => {
                    log::warn!("send to conversation {id} failed: {e}");
                    state.local_message(SenderKind::Assistant, ASSISTANT_UNAVAILABLE)
                }
            };
            state.messages.entry(id).or_default().push(entry);
        }
        self.notify();
        res
    }

    /// Requires a non-empty title different from the current one.
    pub async fn rename_conversation(&self, id: ConversationId, title: &str) -> Result<Conversation> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ClientError::Validation("Title cannot be empty.".into()));
        }
        {
            let state = self.state.borrow();
            let Some(pos) = state.position(id) else {
                return Err(ClientError::Validation("Unknown conversation.".into()));
            };
            if state.conversations[pos].title == title {
                return Err(ClientError::Validation("Title is unchanged.".into()));
            }
        }

        let updated = self.api.rename_conversation(id, title).await?;
        let new_title = if updated.title.is_empty() { title.to_string() } else { updated.title.clone() };

        {
            let mut state = self.state.borrow_mut();
            if let Some(pos) = state.position(id) {
                state.conversations[pos].title = new_title.clone();
            }
            if let Some(active) = state.active.as_mut().filter(|c| c.id == id) {
                active.title = new_title;
            }
        }
        self.notify();
        Ok(updated)
    }

    /// Refuses to delete the last remaining conversation.
    pub async fn delete_conversation(&self, id: ConversationId) -> Result<()> {
        {
            let state = self.state.borrow();
            if state.position(id).is_none() {
                return Err(ClientError::Validation("Unknown conversation.".into()));
            }
            if state.conversations.len() <= 1 {
                return Err(ClientError::Validation(
                    "At least one conversation must remain.".into(),
                ));
            }
        }

        self.api.delete_conversation(id).await?;

        let next = {
            let mut state = self.state.borrow_mut();
            state.conversations.retain(|c| c.id != id);
            state.messages.remove(&id);
            state.generations.remove(&id);
            if state.active.as_ref().is_some_and(|c| c.id == id) {
                state.active = state.conversations.first().cloned();
                state.active.as_ref().map(|c| c.id)
            } else {
                None
            }
        };
        self.notify();
        if let Some(next) = next {
            if let Err(e) = self.load_messages(next).await {
                log::warn!("failed to load messages for conversation {next}: {e}");
            }
        }
        Ok(())
    }

    /// Activates `id` right away, then always re-fetches its history.
    pub async fn switch_conversation(&self, id: ConversationId) -> Result<()> {
        {
            let mut state = self.state.borrow_mut();
            let Some(pos) = state.position(id) else {
                return Err(ClientError::Validation("Unknown conversation.".into()));
            };
            state.active = Some(state.conversations[pos].clone());
        }
        self.notify();
        self.load_messages(id).await
    }
}
