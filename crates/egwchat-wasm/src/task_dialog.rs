use std::cell::RefCell;
use std::rc::Rc;

use egwchat_core::tasks::{TASK_CREATING, TASK_SESSION_EXPIRED};
use egwchat_core::TaskDraft;
use egwchat_types::TASK_DIALOG_CLOSE_DELAY_MS;
use gloo_timers::callback::Timeout;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlInputElement, HtmlTextAreaElement};

use crate::api::Backend;
use crate::dashboard::Dashboard;
use crate::dom;
use crate::storage::stored_token;

/// Modal for creating a task from the quick actions
#[derive(Clone)]
pub struct TaskDialog {
    modal: Element,
    form: Element,
    title: HtmlInputElement,
    due: HtmlInputElement,
    description: HtmlTextAreaElement,
    status: Option<Element>,
    opener: Option<Element>,
    cancel: Option<Element>,
    backend: Backend,
    dashboard: Dashboard,
    /// Pending close after a successful submit; replacing it cancels the previous one
    close_timer: Rc<RefCell<Option<Timeout>>>,
}

impl TaskDialog {
    /// `None` when the page has no task modal
    pub fn new(
        document: &Document,
        backend: Backend,
        dashboard: Dashboard,
    ) -> Result<Option<Self>, JsValue> {
        let (Some(modal), Some(form)) = (
            document.get_element_by_id("task-modal"),
            document.get_element_by_id("task-form"),
        ) else {
            return Ok(None);
        };

        Ok(Some(Self {
            modal,
            form,
            title: dom::get_input_by_id(document, "task-title")?,
            due: dom::get_input_by_id(document, "task-due")?,
            description: dom::get_textarea_by_id(document, "task-desc")?,
            status: document.get_element_by_id("task-form-status"),
            opener: document.get_element_by_id("qa-create-task"),
            cancel: document.get_element_by_id("task-cancel"),
            backend,
            dashboard,
            close_timer: Rc::new(RefCell::new(None)),
        }))
    }

    pub fn attach(self) -> Result<(), JsValue> {
        if let Some(opener) = &self.opener {
            let dialog = self.clone();
            dom::add_click_listener(opener, move || dialog.open())?;
        }

        if let Some(cancel) = &self.cancel {
            let dialog = self.clone();
            dom::add_click_listener(cancel, move || dialog.close())?;
        }

        // Clicking the backdrop closes the dialog
        let dialog = self.clone();
        dom::add_listener(&self.modal, "click", move |event| {
            let Some(target) = event
                .target()
                .and_then(|target| target.dyn_into::<Element>().ok())
            else {
                return;
            };
            if target.is_same_node(Some(&dialog.modal)) || target.class_list().contains("modal-backdrop") {
                dialog.close();
            }
        })?;

        let dialog = self.clone();
        dom::add_listener(&self.form, "submit", move |event| {
            event.prevent_default();
            dialog.submit();
        })
    }

    fn open(&self) {
        self.close_timer.borrow_mut().take();
        let _ = self.modal.class_list().remove_1("hidden");
        self.title.set_value("");
        self.due.set_value("");
        self.description.set_value("");
        self.set_status("");
    }

    fn close(&self) {
        let _ = self.modal.class_list().add_1("hidden");
    }

    fn set_status(&self, text: &str) {
        if let Some(status) = &self.status {
            dom::set_text_content(status, text);
        }
    }

    fn submit(&self) {
        let draft = TaskDraft::new(self.title.value(), self.due.value(), self.description.value());
        let request = match draft.into_request() {
            Ok(request) => request,
            Err(e) => {
                self.set_status(&e.to_string());
                return;
            }
        };

        let Some(token) = stored_token() else {
            self.set_status(TASK_SESSION_EXPIRED);
            return;
        };

        self.set_status(TASK_CREATING);
        let dialog = self.clone();
        wasm_bindgen_futures::spawn_local(async move {
            match dialog.backend.create_task(&token, &request).await {
                Ok(message) => {
                    dialog.set_status(message);
                    dialog.dashboard.refresh();
                    let closing = dialog.clone();
                    let timer = Timeout::new(TASK_DIALOG_CLOSE_DELAY_MS, move || closing.close());
                    *dialog.close_timer.borrow_mut() = Some(timer);
                }
                Err(e) => {
                    log::error!("Task creation error: {}", e);
                    let message = match e {
                        egwchat_core::ClientError::Status { message, .. } => message,
                        other => other.to_string(),
                    };
                    dialog.set_status(&message);
                }
            }
        });
    }
}
