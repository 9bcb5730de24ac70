use egwchat_types::{CHAT_PATH, LOGIN_PATH, MOUNT_PREFIX};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Login,
    Chat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Set up this page in place
    Render(Page),
    /// Navigate to this URL instead
    Redirect(String),
}

/// Prefix the site is served under, derived from the current path
pub fn mount_prefix(pathname: &str) -> &'static str {
    if pathname.starts_with(&format!("{}/", MOUNT_PREFIX)) {
        MOUNT_PREFIX
    } else {
        ""
    }
}

/// Join a mount prefix and a path, inserting the separator when missing
pub fn create_url(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", prefix, path)
    } else {
        format!("{}/{}", prefix, path)
    }
}

pub fn page_for_path(pathname: &str) -> Page {
    if pathname.contains("chat-ui") {
        Page::Chat
    } else {
        Page::Login
    }
}

/// Decide what to do for `pathname` given whether a session token is stored
pub fn route(pathname: &str, has_token: bool) -> Route {
    let prefix = mount_prefix(pathname);
    match (page_for_path(pathname), has_token) {
        (Page::Chat, false) => Route::Redirect(create_url(prefix, LOGIN_PATH)),
        (Page::Chat, true) => Route::Render(Page::Chat),
        (Page::Login, true) => Route::Redirect(create_url(prefix, CHAT_PATH)),
        (Page::Login, false) => Route::Render(Page::Login),
    }
}
