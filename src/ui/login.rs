use super::Context;
use adw::prelude::*;
use adw::Application;
use blogdesk::app::AppState;
use gtk4 as gtk;
use std::rc::Rc;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Login,
    Register,
}

pub fn show_login_window(app: &Application, ctx: Context) {
    let window = adw::ApplicationWindow::builder()
        .application(app)
        .title("BlogDesk Login")
        .default_width(420)
        .default_height(320)
        .resizable(false)
        .build();

    let toast_overlay = adw::ToastOverlay::new();

    let root = gtk::Box::new(gtk::Orientation::Vertical, 12);
    root.set_margin_top(24);
    root.set_margin_bottom(24);
    root.set_margin_start(24);
    root.set_margin_end(24);

    let title = gtk::Label::new(Some("Sign in to BlogDesk"));
    title.add_css_class("title-2");
    title.set_halign(gtk::Align::Start);
    root.append(&title);

    let server_entry = gtk::Entry::new();
    server_entry.set_placeholder_text(Some("API base URL (e.g. https://blog.example.com/api)"));
    server_entry.set_text(&ctx.base_url);
    server_entry.set_hexpand(true);

    let user_entry = gtk::Entry::new();
    user_entry.set_placeholder_text(Some("Username"));

    let email_entry = gtk::Entry::new();
    email_entry.set_placeholder_text(Some("Email"));
    email_entry.set_visible(false);

    let pass_entry = gtk::PasswordEntry::new();
    pass_entry.set_placeholder_text(Some("Password"));
    pass_entry.set_show_peek_icon(true);

    let form = gtk::Box::new(gtk::Orientation::Vertical, 8);
    form.append(&server_entry);
    form.append(&user_entry);
    form.append(&email_entry);
    form.append(&pass_entry);
    root.append(&form);

    let status = gtk::Label::new(None);
    status.add_css_class("dim-label");
    status.set_halign(gtk::Align::Start);
    root.append(&status);

    let buttons = gtk::Box::new(gtk::Orientation::Horizontal, 8);
    buttons.set_halign(gtk::Align::End);
    let switch_btn = gtk::Button::with_label("Create account");
    switch_btn.add_css_class("flat");
    let submit_btn = gtk::Button::with_label("Log in");
    submit_btn.add_css_class("suggested-action");
    buttons.append(&switch_btn);
    buttons.append(&submit_btn);
    root.append(&buttons);

    toast_overlay.set_child(Some(&root));
    let container = gtk::Box::new(gtk::Orientation::Vertical, 0);
    let header = adw::HeaderBar::new();
    header.set_title_widget(Some(&gtk::Label::new(Some("BlogDesk"))));
    container.append(&header);
    container.append(&toast_overlay);
    window.set_content(Some(&container));

    let mode = Rc::new(std::cell::Cell::new(Mode::Login));
    {
        let mode = mode.clone();
        let email_entry = email_entry.clone();
        let submit_btn = submit_btn.clone();
        let title = title.clone();
        switch_btn.connect_clicked(move |btn| {
            let next = match mode.get() {
                Mode::Login => Mode::Register,
                Mode::Register => Mode::Login,
            };
            mode.set(next);
            let register = next == Mode::Register;
            email_entry.set_visible(register);
            submit_btn.set_label(if register { "Register" } else { "Log in" });
            btn.set_label(if register { "I have an account" } else { "Create account" });
            title.set_label(if register { "Create a BlogDesk account" } else { "Sign in to BlogDesk" });
        });
    }

    let ctx = Rc::new(std::cell::RefCell::new(ctx));
    let on_submit = {
        let app = app.clone();
        let window = window.clone();
        let overlay = toast_overlay.clone();
        let server_entry = server_entry.clone();
        let user_entry = user_entry.clone();
        let email_entry = email_entry.clone();
        let pass_entry = pass_entry.clone();
        let submit_btn = submit_btn.clone();
        let status = status.clone();
        move || {
            let url = blogdesk::utils::normalize_url(&server_entry.text());
            let username = user_entry.text().trim().to_string();
            let email = email_entry.text().trim().to_string();
            let password = pass_entry.text().to_string();
            let mode = mode.get();
            if url.is_empty() || username.is_empty() || password.is_empty() {
                overlay.add_toast(adw::Toast::new("Please fill in the server URL, username and password."));
                return;
            }
            if mode == Mode::Register && email.is_empty() {
                overlay.add_toast(adw::Toast::new("Please enter an email address."));
                return;
            }

            if url != ctx.borrow().base_url {
                let mut st = AppState::load();
                st.base_url = url.clone();
                if let Err(e) = st.save() {
                    overlay.add_toast(adw::Toast::new(&format!("Failed to save settings: {}", e)));
                }
                match Context::connect(&url) {
                    Ok(fresh) => *ctx.borrow_mut() = fresh,
                    Err(e) => {
                        overlay.add_toast(adw::Toast::new(e.message()));
                        return;
                    }
                }
            }

            status.set_label(match mode {
                Mode::Login => "Signing in…",
                Mode::Register => "Creating account…",
            });
            submit_btn.set_sensitive(false);

            let session_ctx = ctx.borrow().clone();
            let app = app.clone();
            let window = window.clone();
            let overlay = overlay.clone();
            let status = status.clone();
            let submit_btn = submit_btn.clone();
            super::spawn_local(async move {
                let res = match mode {
                    Mode::Login => session_ctx.session.login(&username, &password).await,
                    Mode::Register => session_ctx.session.register(&username, &email, &password).await,
                };
                submit_btn.set_sensitive(true);
                match res {
                    Ok(user) => {
                        log::info!("signed in as {}", user.username);
                        status.set_label("");
                        super::main_window::show_main_window(&app, session_ctx);
                        window.close();
                    }
                    Err(err) => {
                        log::warn!("sign-in failed: {err}");
                        status.set_label("Sign-in failed");
                        overlay.add_toast(adw::Toast::new(err.message()));
                    }
                }
            });
        }
    };

    let on_submit: Rc<dyn Fn()> = Rc::new(on_submit);
    {
        let on_submit = on_submit.clone();
        submit_btn.connect_clicked(move |_| (on_submit)());
    }
    {
        let on_submit = on_submit.clone();
        user_entry.connect_activate(move |_| (on_submit)());
    }
    {
        let on_submit = on_submit.clone();
        pass_entry.connect_activate(move |_| (on_submit)());
    }

    window.present();
}
