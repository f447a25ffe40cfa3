mod ui;

use adw::prelude::*;
use adw::Application;

fn main() {
    // reqwest futures are polled on the GTK main loop and need the runtime's reactor
    let _rt = ui::RUNTIME.enter();

    let app = Application::builder()
        .application_id("com.example.BlogDesk")
        .build();
    app.connect_activate(|app| {
        ui::build_ui(app);
    });
    app.run();
}
