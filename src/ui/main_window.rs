use super::chat_view::ChatView;
use super::sidebar::Sidebar;
use super::{Context, spawn_local};
use adw::prelude::*;
use adw::Application;
use blogdesk::api::ChatApi;
use blogdesk::chat::ChatSync;
use blogdesk::storage::ConversationCache;
use std::rc::Rc;
use std::sync::Arc;

fn toast_error(overlay: &adw::ToastOverlay, what: &str, err: &blogdesk::ClientError) {
    log::warn!("{what}: {err}");
    overlay.add_toast(adw::Toast::new(err.message()));
}

pub fn show_main_window(app: &Application, ctx: Context) {
    let window = adw::ApplicationWindow::builder()
        .application(app)
        .title("BlogDesk")
        .default_width(960)
        .default_height(640)
        .build();

    let overlay = adw::ToastOverlay::new();

    let split = adw::Flap::builder()
        .reveal_flap(true)
        .locked(true)
        .modal(false)
        .build();

    let sidebar = Rc::new(Sidebar::new());
    split.set_flap(Some(&sidebar.widget()));

    let chat_view = Rc::new(ChatView::new());
    split.set_content(Some(&chat_view.widget()));

    overlay.set_child(Some(&split));

    let container = gtk4::Box::new(gtk4::Orientation::Vertical, 0);
    let header = adw::HeaderBar::new();
    let title = gtk4::Label::new(Some("Assistant"));
    title.add_css_class("title");
    header.set_title_widget(Some(&title));

    let new_chat_btn = gtk4::Button::with_label("New Chat");
    new_chat_btn.add_css_class("suggested-action");
    header.pack_start(&new_chat_btn);

    let logout_btn = gtk4::Button::with_label("Log out");
    header.pack_end(&logout_btn);
    let delete_btn = gtk4::Button::from_icon_name("user-trash-symbolic");
    delete_btn.set_tooltip_text(Some("Delete conversation"));
    header.pack_end(&delete_btn);
    let rename_btn = gtk4::Button::from_icon_name("document-edit-symbolic");
    rename_btn.set_tooltip_text(Some("Rename conversation"));
    header.pack_end(&rename_btn);

    container.append(&header);
    container.append(&overlay);
    window.set_content(Some(&container));
    window.present();

    let api: Arc<dyn ChatApi> = ctx.api.clone();
    let mut chat = ChatSync::new(api);
    match ConversationCache::open_default() {
        Ok(cache) => {
            let cached = cache.list(Some(200)).unwrap_or_default();
            chat = chat.with_cache(cache);
            chat.seed(cached);
        }
        Err(e) => log::warn!("conversation cache unavailable: {e}"),
    }
    let chat = Rc::new(chat);

    let render = {
        let chat = Rc::downgrade(&chat);
        let sidebar = sidebar.clone();
        let chat_view = chat_view.clone();
        let title = title.clone();
        move || {
            let Some(chat) = chat.upgrade() else { return };
            let active = chat.active();
            sidebar.set_items(&chat.conversations(), active.as_ref().map(|c| c.id));
            chat_view.set_messages(&chat.active_messages());
            chat_view.set_input(&chat.input());
            title.set_label(active.as_ref().map(|c| c.display_title()).unwrap_or("Assistant"));
        }
    };
    render();
    chat.connect_changed(render);

    {
        let chat = chat.clone();
        chat_view.connect_input_changed(move |text| chat.set_input(&text));
    }

    {
        let chat = chat.clone();
        let overlay = overlay.clone();
        spawn_local(async move {
            if let Err(e) = chat.list_conversations().await {
                toast_error(&overlay, "failed to load conversations", &e);
            }
        });
    }

    {
        let chat = chat.clone();
        let overlay = overlay.clone();
        sidebar.connect_activated(move |id| {
            let chat = chat.clone();
            let overlay = overlay.clone();
            spawn_local(async move {
                if let Err(e) = chat.switch_conversation(id).await {
                    toast_error(&overlay, "failed to open conversation", &e);
                }
            });
        });
    }

    {
        let chat = chat.clone();
        let overlay = overlay.clone();
        chat_view.connect_send(move |text| {
            let Some(active) = chat.active() else {
                overlay.add_toast(adw::Toast::new("Create a conversation first."));
                return;
            };
            if text.trim().is_empty() {
                return;
            }
            let chat = chat.clone();
            let overlay = overlay.clone();
            spawn_local(async move {
                if let Err(e) = chat.send_message(active.id, &text).await {
                    toast_error(&overlay, "assistant request failed", &e);
                }
            });
        });
    }

    {
        let chat = chat.clone();
        let overlay = overlay.clone();
        new_chat_btn.connect_clicked(move |btn| {
            let chat = chat.clone();
            let overlay = overlay.clone();
            let btn = btn.clone();
            btn.set_sensitive(false);
            spawn_local(async move {
                if let Err(e) = chat.create_conversation().await {
                    toast_error(&overlay, "failed to create conversation", &e);
                }
                btn.set_sensitive(true);
            });
        });
    }

    {
        let chat = chat.clone();
        let overlay = overlay.clone();
        let window = window.clone();
        rename_btn.connect_clicked(move |_| {
            let Some(active) = chat.active() else { return };
            let dialog = gtk4::Dialog::builder()
                .title("Rename Conversation")
                .transient_for(&window)
                .modal(true)
                .build();
            let content = gtk4::Box::new(gtk4::Orientation::Vertical, 12);
            content.set_margin_top(12);
            content.set_margin_bottom(12);
            content.set_margin_start(12);
            content.set_margin_end(12);

            let entry = gtk4::Entry::new();
            entry.set_text(&active.title);
            entry.set_hexpand(true);
            entry.set_activates_default(true);
            content.append(&entry);

            dialog.set_child(Some(&content));
            let _ = dialog.add_button("Cancel", gtk4::ResponseType::Cancel);
            let ok_btn = dialog.add_button("Rename", gtk4::ResponseType::Ok);
            ok_btn.add_css_class("suggested-action");
            dialog.set_default_response(gtk4::ResponseType::Ok);

            let id = active.id;
            let chat = chat.clone();
            let overlay = overlay.clone();
            dialog.connect_response(move |dlg, resp| {
                if resp == gtk4::ResponseType::Ok {
                    let title = entry.text().to_string();
                    let chat = chat.clone();
                    let overlay = overlay.clone();
                    spawn_local(async move {
                        match chat.rename_conversation(id, &title).await {
                            Ok(_) => overlay.add_toast(adw::Toast::new("Conversation renamed")),
                            Err(e) => toast_error(&overlay, "rename failed", &e),
                        }
                    });
                }
                dlg.close();
            });

            dialog.present();
        });
    }

    {
        let chat = chat.clone();
        let overlay = overlay.clone();
        delete_btn.connect_clicked(move |_| {
            let Some(active) = chat.active() else { return };
            let chat = chat.clone();
            let overlay = overlay.clone();
            spawn_local(async move {
                match chat.delete_conversation(active.id).await {
                    Ok(()) => overlay.add_toast(adw::Toast::new("Conversation deleted")),
                    Err(e) => toast_error(&overlay, "delete failed", &e),
                }
            });
        });
    }

    {
        let app = app.clone();
        let window = window.clone();
        logout_btn.connect_clicked(move |_| {
            ctx.session.logout();
            super::login::show_login_window(&app, ctx.clone());
            window.close();
        });
    }
}
