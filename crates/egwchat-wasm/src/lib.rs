use wasm_bindgen::prelude::*;
use web_sys::{Document, Window};

use egwchat_core::{route, Endpoints, Page, Route, SessionStore};

mod api;
mod chat_ui;
mod dashboard;
mod dom;
mod event_source;
mod login;
mod storage;
mod task_dialog;
mod voice;

pub use storage::LocalStorageStore;

/// Initialize the WASM application
/// This sets up panic hooks and logging
#[wasm_bindgen(start)]
pub fn init() {
    // Set panic hook for better error messages
    console_error_panic_hook::set_once();

    // Initialize logging
    wasm_logger::init(wasm_logger::Config::default());

    log::info!("egwchat WASM initialized");
}

/// Set up whichever page the browser is on, or redirect when the session state
/// does not match the page. Call once the DOM is loaded.
#[wasm_bindgen]
pub fn init_page() -> Result<(), JsValue> {
    let pathname = window()?.location().pathname()?;
    let store = LocalStorageStore::new()?;
    let endpoints = Endpoints::for_pathname(&pathname);

    match route(&pathname, store.load().is_some()) {
        Route::Redirect(url) => {
            log::info!("Redirecting to {}", url);
            dom::navigate(&url)
        }
        Route::Render(Page::Login) => {
            log::info!("Initializing login page");
            login::LoginPage::new(endpoints)?.attach()
        }
        Route::Render(Page::Chat) => {
            log::info!("Initializing chat page");
            chat_ui::ChatPage::new(endpoints, store)?.attach()
        }
    }
}

/// Get the window object
fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("No window object"))
}

/// Get the document object
fn document() -> Result<Document, JsValue> {
    window()?
        .document()
        .ok_or_else(|| JsValue::from_str("No document object"))
}
