use blogdesk::api::models::{Message, SenderKind};
use gtk4::prelude::*;
use gtk4 as gtk;

pub struct ChatView {
    root: gtk::Box,
    scroller: gtk::ScrolledWindow,
    messages_box: gtk::Box,
    entry: gtk::Entry,
    send_btn: gtk::Button,
}

impl ChatView {
    pub fn new() -> Self {
        let root = gtk::Box::new(gtk::Orientation::Vertical, 6);
        root.set_margin_top(8);
        root.set_margin_bottom(8);
        root.set_margin_start(8);
        root.set_margin_end(8);

        let scroller = gtk::ScrolledWindow::builder()
            .vexpand(true)
            .hexpand(true)
            .build();
        let messages_box = gtk::Box::new(gtk::Orientation::Vertical, 6);
        scroller.set_child(Some(&messages_box));
        root.append(&scroller);

        let input_row = gtk::Box::new(gtk::Orientation::Horizontal, 6);
        let entry = gtk::Entry::new();
        entry.set_hexpand(true);
        entry.set_placeholder_text(Some("Ask the assistant…"));
        let send_btn = gtk::Button::with_label("Send");
        send_btn.add_css_class("suggested-action");
        input_row.append(&entry);
        input_row.append(&send_btn);
        root.append(&input_row);

        Self { root, scroller, messages_box, entry, send_btn }
    }

    pub fn widget(&self) -> gtk::Widget {
        self.root.clone().upcast()
    }

    pub fn set_messages(&self, messages: &[Message]) {
        while let Some(child) = self.messages_box.first_child() {
            self.messages_box.remove(&child);
        }
        if messages.is_empty() {
            let hint = gtk::Label::new(Some("No messages yet. Say hello!"));
            hint.add_css_class("dim-label");
            self.messages_box.append(&hint);
            return;
        }
        for msg in messages {
            let lbl = gtk::Label::new(Some(&msg.content));
            lbl.set_wrap(true);
            lbl.set_selectable(true);
            lbl.set_xalign(0.0);
            match msg.sender {
                SenderKind::User => lbl.set_halign(gtk::Align::End),
                SenderKind::Assistant => {
                    lbl.set_halign(gtk::Align::Start);
                    lbl.add_css_class("card");
                }
            }
            self.messages_box.append(&lbl);
        }
        let adj = self.scroller.vadjustment();
        adj.set_value(adj.upper());
    }

    pub fn set_input(&self, text: &str) {
        if self.entry.text().as_str() != text {
            self.entry.set_text(text);
        }
    }

    /// `f` receives the entry text; the entry keeps it until the caller clears it.
    pub fn connect_send(&self, f: impl Fn(String) + 'static) {
        use std::rc::Rc;
        let entry = self.entry.clone();
        let send: Rc<dyn Fn()> = Rc::new(move || f(entry.text().to_string()));
        {
            let send = send.clone();
            self.send_btn.connect_clicked(move |_| (send)());
        }
        self.entry.connect_activate(move |_| (send)());
    }

    pub fn connect_input_changed(&self, f: impl Fn(String) + 'static) {
        self.entry.connect_changed(move |e| f(e.text().to_string()));
    }
}
