//! Browser tests, run with `wasm-pack test --headless --firefox crates/egwchat-wasm`.
#![cfg(target_arch = "wasm32")]

use egwchat_core::SessionStore;
use egwchat_wasm::LocalStorageStore;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn local_storage_store_lifecycle() {
    let mut store = LocalStorageStore::new().unwrap();
    store.clear().unwrap();
    assert_eq!(store.load(), None);

    store.save("header.payload.signature").unwrap();
    assert_eq!(store.load().as_deref(), Some("header.payload.signature"));

    let raw = web_sys::window()
        .unwrap()
        .local_storage()
        .unwrap()
        .unwrap()
        .get_item("accessToken")
        .unwrap();
    assert_eq!(raw.as_deref(), Some("header.payload.signature"));

    store.clear().unwrap();
    assert_eq!(store.load(), None);
}

#[wasm_bindgen_test]
fn empty_stored_token_counts_as_logged_out() {
    let mut store = LocalStorageStore::new().unwrap();
    store.save("").unwrap();
    assert_eq!(store.load(), None);
    store.clear().unwrap();
}
