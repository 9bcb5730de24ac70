use egwchat_core::dashboard::{insight_prompt, render_insight_html};
use egwchat_core::{DashboardSnapshot, DateRange};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlTextAreaElement};

use crate::api::Backend;
use crate::dom;
use crate::storage::stored_token;

/// Counters, AI insight card and quick-action pills beside the chat
#[derive(Clone)]
pub struct Dashboard {
    document: Document,
    backend: Backend,
    input: HtmlTextAreaElement,
}

impl Dashboard {
    pub fn new(document: &Document, backend: Backend, input: HtmlTextAreaElement) -> Self {
        Self {
            document: document.clone(),
            backend,
            input,
        }
    }

    pub fn attach(&self) -> Result<(), JsValue> {
        if let Some(refresh) = self.document.get_element_by_id("insights-refresh") {
            let dashboard = self.clone();
            dom::add_click_listener(&refresh, move || dashboard.refresh())?;
        }

        if let Some(expand) = self.document.get_element_by_id("insights-expand") {
            let document = self.document.clone();
            dom::add_click_listener(&expand, move || {
                if let Some(card) = document.get_element_by_id("ai-insights-card") {
                    let _ = card.class_list().toggle("expanded");
                }
            })?;
        }

        if let Some(use_action) = self.document.get_element_by_id("insights-use-action") {
            let dashboard = self.clone();
            dom::add_click_listener(&use_action, move || dashboard.use_insight())?;
        }

        // Pills are matched by class anywhere in the document
        let input = self.input.clone();
        dom::add_listener(&self.document, "click", move |event| {
            let pill = event
                .target()
                .and_then(|target| target.dyn_into::<Element>().ok())
                .and_then(|target| target.closest(".pill").ok().flatten());
            if let Some(pill) = pill {
                input.set_value(&pill.text_content().unwrap_or_default());
                dom::dispatch_input(&input);
            }
        })
    }

    /// Reload every widget; a failed fetch leaves its widget as it was
    pub fn refresh(&self) {
        let Some(token) = stored_token() else {
            return;
        };
        let dashboard = self.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let snapshot = dashboard
                .backend
                .load_dashboard(&token, &DateRange::today())
                .await;
            dashboard.render(&snapshot);
        });
    }

    fn render(&self, snapshot: &DashboardSnapshot) {
        if let (Some(count), Some(element)) = (
            snapshot.events_today,
            self.document.get_element_by_id("events-count"),
        ) {
            dom::set_text_content(&element, &count.to_string());
        }
        if let (Some(count), Some(element)) = (
            snapshot.open_tasks,
            self.document.get_element_by_id("tasks-count"),
        ) {
            dom::set_text_content(&element, &count.to_string());
        }
        if let (Some(insight), Some(element)) = (
            snapshot.insight.as_deref(),
            self.document.get_element_by_id("ai-insight-box"),
        ) {
            element.set_inner_html(&render_insight_html(insight));
        }
    }

    /// Prefill the chat input from the first line of the insight box
    fn use_insight(&self) {
        let Some(insight_box) = self.document.get_element_by_id("ai-insight-box") else {
            return;
        };
        let text = insight_box.text_content().unwrap_or_default();
        self.input.set_value(&insight_prompt(&text));
        dom::dispatch_input(&self.input);
        let _ = self.input.focus();
    }
}
