use std::cell::RefCell;
use std::rc::Rc;

use egwchat_core::error::SESSION_EXPIRED_MESSAGE;
use egwchat_core::{
    ClientError, Endpoints, PageSession, Role, SessionStore, SubmitOutcome, TurnEffect, TurnId,
};
use futures::StreamExt;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, EventTarget, HtmlTextAreaElement, KeyboardEvent};

use crate::api::Backend;
use crate::dashboard::Dashboard;
use crate::dom;
use crate::event_source::{self, ChatEvents, EventSourceHandle};
use crate::storage::LocalStorageStore;
use crate::task_dialog::TaskDialog;
use crate::voice;

/// DOM nodes of one transcript entry
enum Bubble {
    User,
    Assistant { main: Element, status: Element },
}

struct ChatState {
    page: PageSession<EventSourceHandle>,
    store: LocalStorageStore,
    bubbles: Vec<Bubble>,
    quick_replies: Option<Element>,
}

/// The chat page. Cheap to clone; every clone shares one page session.
#[derive(Clone)]
pub struct ChatPage {
    document: Document,
    backend: Backend,
    chat_box: Element,
    input: HtmlTextAreaElement,
    state: Rc<RefCell<ChatState>>,
}

impl ChatPage {
    pub fn new(endpoints: Endpoints, store: LocalStorageStore) -> Result<Self, JsValue> {
        let document = crate::document()?;
        let chat_box = dom::get_element_by_id(&document, "chat-box")?;
        let input = dom::get_textarea_by_id(&document, "message-input")?;

        let state = ChatState {
            page: PageSession::new(),
            store,
            bubbles: Vec::new(),
            quick_replies: None,
        };

        Ok(Self {
            document,
            backend: Backend::new(endpoints),
            chat_box,
            input,
            state: Rc::new(RefCell::new(state)),
        })
    }

    pub fn attach(self) -> Result<(), JsValue> {
        self.setup_logout()?;
        self.setup_message_input()?;
        self.setup_chat_form()?;
        self.setup_quick_replies()?;

        let token = self.state.borrow().store.load();
        voice::VoiceInput::new(&self.document, self.backend.clone(), self.input.clone())?
            .attach(token.as_deref())?;

        let dashboard = Dashboard::new(&self.document, self.backend.clone(), self.input.clone());
        dashboard.attach()?;
        if let Some(dialog) = TaskDialog::new(&self.document, self.backend.clone(), dashboard.clone())? {
            dialog.attach()?;
        }

        // Quick replies for the greeting state
        let page = self.clone();
        let turn = self.state.borrow().page.current_turn();
        wasm_bindgen_futures::spawn_local(async move {
            page.fetch_suggestions(turn, egwchat_types::DEFAULT_SUGGESTION_COUNT)
                .await;
        });

        dashboard.refresh();
        Ok(())
    }

    fn setup_logout(&self) -> Result<(), JsValue> {
        let Some(button) = self.document.get_element_by_id("logout-btn") else {
            return Ok(());
        };
        let page = self.clone();
        dom::add_click_listener(&button, move || {
            let logged_out = {
                let mut state = page.state.borrow_mut();
                let state = &mut *state;
                state.page.logout(&mut state.store)
            };
            match logged_out {
                Ok(_) => {
                    if let Err(e) = dom::navigate(&page.backend.endpoints().login_page()) {
                        log::error!("Failed to navigate to login: {:?}", e);
                    }
                }
                Err(e) => log::error!("Logout failed: {}", e),
            }
        })
    }

    fn setup_message_input(&self) -> Result<(), JsValue> {
        // Auto-resize textarea
        let input = self.input.clone();
        dom::add_listener(&self.input, "input", move |_| {
            let _ = input.style().set_property("height", "auto");
            let height = format!("{}px", input.scroll_height());
            let _ = input.style().set_property("height", &height);
        })?;

        // Enter submits, Shift+Enter inserts a newline
        let page = self.clone();
        dom::add_listener(&self.input, "keydown", move |event| {
            let Some(key) = event.dyn_ref::<KeyboardEvent>() else {
                return;
            };
            if key.key() == "Enter" && !key.shift_key() {
                event.prevent_default();
                page.submit(&page.input.value());
            }
        })
    }

    fn setup_chat_form(&self) -> Result<(), JsValue> {
        let form = dom::get_element_by_id(&self.document, "chat-form")?;
        let page = self.clone();
        dom::add_listener(&form, "submit", move |event| {
            event.prevent_default();
            page.submit(&page.input.value());
        })
    }

    /// One listener on the chat box serves every chip, whichever turn rendered it
    fn setup_quick_replies(&self) -> Result<(), JsValue> {
        let page = self.clone();
        dom::add_listener(&self.chat_box, "click", move |event| {
            if let Some(reply) = quick_reply_text(event.target()) {
                page.input.set_value(&reply);
                page.submit(&reply);
            }
        })
    }

    /// Start a turn for `text`
    fn submit(&self, text: &str) {
        let token = self.state.borrow().store.load();
        let mut pending: Option<ChatEvents> = None;

        let outcome = {
            let mut state = self.state.borrow_mut();
            state.page.submit(text, token.as_deref(), |request| {
                let url = self.backend.endpoints().chat(&request.message, &request.token);
                let (events, handle) = event_source::open_chat(&url)?;
                pending = Some(events);
                Ok(handle)
            })
        };

        match outcome {
            Ok(SubmitOutcome::Ignored) => return,
            Ok(SubmitOutcome::Started(turn)) => log::debug!("Started turn {:?}", turn),
            Err(ClientError::SessionExpired) => {
                dom::alert(SESSION_EXPIRED_MESSAGE);
                if let Err(e) = dom::navigate(&self.backend.endpoints().login_page()) {
                    log::error!("Failed to navigate to login: {:?}", e);
                }
                return;
            }
            // The assistant bubble already carries the error text
            Err(e) => log::error!("Failed to open chat stream: {}", e),
        }

        self.reset_input();
        self.remove_quick_replies();
        self.refresh();

        if let Some(events) = pending {
            let page = self.clone();
            wasm_bindgen_futures::spawn_local(async move { page.drive(events).await });
        }
    }

    /// Feed stream events into the page session until the turn ends
    async fn drive(self, mut events: ChatEvents) {
        while let Some(item) = events.next().await {
            let effect = match item {
                Ok(event) => {
                    let mut state = self.state.borrow_mut();
                    state.page.handle_event(event)
                }
                Err(e) => {
                    log::warn!("{}", e);
                    self.state.borrow_mut().page.handle_transport_error();
                    self.refresh();
                    break;
                }
            };
            self.refresh();

            if let TurnEffect::FetchSuggestions { turn, count } = effect {
                self.fetch_suggestions(turn, count).await;
                break;
            }
        }
    }

    /// Fetch quick replies for `turn`; failures are silent
    async fn fetch_suggestions(&self, turn: TurnId, count: usize) {
        let token = self.state.borrow().store.load();
        let Some(token) = token else {
            self.state.borrow_mut().page.suggestions_failed(turn);
            return;
        };

        match self.backend.suggestions(&token, count).await {
            Ok(suggestions) => {
                let changed = self
                    .state
                    .borrow_mut()
                    .page
                    .apply_suggestions(turn, suggestions);
                if changed {
                    if let Err(e) = self.render_quick_replies() {
                        log::error!("Failed to render quick replies: {:?}", e);
                    }
                }
            }
            Err(e) => {
                log::debug!("Suggestions unavailable: {}", e);
                self.state.borrow_mut().page.suggestions_failed(turn);
            }
        }
    }

    fn reset_input(&self) {
        self.input.set_value("");
        let _ = self.input.style().set_property("height", "auto");
        let _ = self.input.focus();
    }

    fn refresh(&self) {
        if let Err(e) = self.render_transcript() {
            log::error!("Failed to render chat: {:?}", e);
        }
    }

    /// Bring the DOM in line with the transcript: append new bubbles, then redraw the
    /// bubble of the current turn
    fn render_transcript(&self) -> Result<(), JsValue> {
        let mut state = self.state.borrow_mut();
        let ChatState { page, bubbles, .. } = &mut *state;
        let entries = page.transcript().entries();

        for entry in &entries[bubbles.len()..] {
            let bubble = match entry.role {
                Role::User => {
                    let element =
                        dom::create_element_with_class(&self.document, "div", "message user-message")?;
                    dom::set_text_content(&element, &entry.main_text);
                    self.chat_box.append_child(&element)?;
                    Bubble::User
                }
                Role::Assistant => {
                    let element =
                        dom::create_element_with_class(&self.document, "div", "message bot-message")?;
                    let main =
                        dom::create_element_with_class(&self.document, "p", "main-response-text")?;
                    let status =
                        dom::create_element_with_class(&self.document, "div", "status-updates")?;
                    element.append_child(&main)?;
                    element.append_child(&status)?;
                    self.chat_box.append_child(&element)?;
                    Bubble::Assistant { main, status }
                }
            };
            bubbles.push(bubble);
        }

        if let Some(index) = page.active_entry_index() {
            if let (Some(entry), Some(Bubble::Assistant { main, status })) =
                (entries.get(index), bubbles.get(index))
            {
                main.set_inner_html(&entry.main_html());
                dom::clear_element(status);
                for line in &entry.status_log {
                    let row = dom::create_element_with_class(&self.document, "div", "status-line")?;
                    dom::set_text_content(&row, line);
                    status.append_child(&row)?;
                }
            }
        }

        dom::scroll_to_bottom(&self.chat_box);
        Ok(())
    }

    fn remove_quick_replies(&self) {
        if let Some(container) = self.state.borrow_mut().quick_replies.take() {
            container.remove();
        }
    }

    fn render_quick_replies(&self) -> Result<(), JsValue> {
        self.remove_quick_replies();

        let replies = self.state.borrow().page.quick_replies().to_vec();
        if replies.is_empty() {
            return Ok(());
        }

        let container = dom::create_element_with_class(&self.document, "div", "quick-replies")?;
        for reply in replies {
            let button = dom::create_element_with_class(&self.document, "button", "quick-reply-btn")?;
            button.set_attribute("type", "button")?;
            dom::set_text_content(&button, &reply);
            container.append_child(&button)?;
        }

        self.chat_box.append_child(&container)?;
        self.state.borrow_mut().quick_replies = Some(container);
        dom::scroll_to_bottom(&self.chat_box);
        Ok(())
    }
}

/// Text of the quick-reply chip a click landed on, if any
fn quick_reply_text(target: Option<EventTarget>) -> Option<String> {
    target?
        .dyn_into::<Element>()
        .ok()?
        .closest(".quick-reply-btn")
        .ok()
        .flatten()?
        .text_content()
        .filter(|text| !text.trim().is_empty())
}
