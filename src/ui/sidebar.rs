use blogdesk::api::models::{Conversation, ConversationId};
use gtk4::prelude::*;
use gtk4 as gtk;
use std::cell::RefCell;
use std::rc::Rc;

pub struct Sidebar {
    root: gtk::Box,
    list: gtk::ListBox,
    // row index -> conversation id
    ids: Rc<RefCell<Vec<ConversationId>>>,
}

impl Sidebar {
    pub fn new() -> Self {
        let root = gtk::Box::new(gtk::Orientation::Vertical, 6);
        root.set_margin_top(8);
        root.set_margin_bottom(8);
        root.set_margin_start(8);
        root.set_margin_end(8);
        root.set_width_request(220);

        let title = gtk::Label::new(Some("Conversations"));
        title.add_css_class("heading");
        title.set_halign(gtk::Align::Start);
        root.append(&title);

        let scroller = gtk::ScrolledWindow::builder().vexpand(true).build();
        let list = gtk::ListBox::new();
        list.add_css_class("navigation-sidebar");
        scroller.set_child(Some(&list));
        root.append(&scroller);

        Self { root, list, ids: Rc::new(RefCell::new(Vec::new())) }
    }

    pub fn widget(&self) -> gtk::Widget {
        self.root.clone().upcast()
    }

    pub fn set_items(&self, items: &[Conversation], active: Option<ConversationId>) {
        while let Some(child) = self.list.first_child() {
            self.list.remove(&child);
        }
        let mut ids = self.ids.borrow_mut();
        ids.clear();
        for conv in items {
            let row = gtk::ListBoxRow::new();
            let label = gtk::Label::new(Some(conv.display_title()));
            label.set_margin_top(8);
            label.set_margin_bottom(8);
            label.set_margin_start(8);
            label.set_margin_end(8);
            label.set_halign(gtk::Align::Start);
            label.set_ellipsize(gtk::pango::EllipsizeMode::End);
            row.set_child(Some(&label));
            self.list.append(&row);
            if Some(conv.id) == active {
                self.list.select_row(Some(&row));
            }
            ids.push(conv.id);
        }
    }

    pub fn connect_activated(&self, f: impl Fn(ConversationId) + 'static) {
        let ids = self.ids.clone();
        self.list.connect_row_activated(move |_, row| {
            let id = usize::try_from(row.index())
                .ok()
                .and_then(|i| ids.borrow().get(i).copied());
            if let Some(id) = id {
                f(id);
            }
        });
    }
}
