//! Login page: provider switching, live field validation and the debounced
//! EGroupware URL check.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use egwchat_core::validation::FIX_ERRORS_MESSAGE;
use egwchat_core::{ClientError, Endpoints, Field, FieldState, FieldStatus, LoginForm, SessionStore, UrlCheckTicket};
use egwchat_types::{Provider, URL_CHECK_DEBOUNCE_MS};
use gloo_timers::callback::Timeout;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    Document, Element, HtmlButtonElement, HtmlElement, HtmlInputElement, HtmlSelectElement,
};

use crate::api::Backend;
use crate::dom;
use crate::storage::LocalStorageStore;

/// CSS class of a field's validation indicator
pub fn indicator_class(state: &FieldState) -> &'static str {
    match state.status {
        FieldStatus::Valid => "validation-indicator valid",
        FieldStatus::Invalid => "validation-indicator invalid",
        FieldStatus::Pending => "validation-indicator validating",
    }
}

fn input_id(field: Field) -> &'static str {
    match field {
        Field::EgwUrl => "egw-url",
        Field::AiKey => "ai-key",
        Field::BaseUrl => "base-url",
        Field::Username => "username",
        Field::Password => "password",
    }
}

struct LoginState {
    form: LoginForm,
    /// Scheduled URL check; dropping it cancels the check
    url_check: Option<Timeout>,
}

#[derive(Clone)]
pub struct LoginPage {
    backend: Backend,
    provider_select: HtmlSelectElement,
    inputs: BTreeMap<Field, HtmlInputElement>,
    indicators: BTreeMap<Field, Element>,
    base_url_group: Option<HtmlElement>,
    base_url_hint: Option<Element>,
    api_key_hint: Option<Element>,
    submit_button: HtmlButtonElement,
    error_message: Element,
    form_element: Element,
    state: Rc<RefCell<LoginState>>,
}

impl LoginPage {
    pub fn new(endpoints: Endpoints) -> Result<Self, JsValue> {
        let document = crate::document()?;
        let form_element = dom::get_element_by_id(&document, "login-form")?;

        let mut inputs = BTreeMap::new();
        let mut indicators = BTreeMap::new();
        for field in Field::ALL {
            let input = dom::get_input_by_id(&document, input_id(field))?;
            indicators.insert(field, create_indicator(&document, &input)?);
            inputs.insert(field, input);
        }

        let submit_button = form_element
            .query_selector("button[type=\"submit\"]")?
            .ok_or_else(|| JsValue::from_str("Login form has no submit button"))?
            .dyn_into::<HtmlButtonElement>()
            .map_err(|_| JsValue::from_str("Submit control is not a button"))?;

        let base_url_group = document
            .query_selector(".base-url-group")?
            .and_then(|element| element.dyn_into::<HtmlElement>().ok());

        Ok(Self {
            backend: Backend::new(endpoints),
            provider_select: dom::get_select_by_id(&document, "ai-model")?,
            inputs,
            indicators,
            base_url_group,
            base_url_hint: document.get_element_by_id("base-url-hint"),
            api_key_hint: document.get_element_by_id("api-key-hint"),
            submit_button,
            error_message: dom::get_element_by_id(&document, "error-message")?,
            form_element,
            state: Rc::new(RefCell::new(LoginState {
                form: LoginForm::default(),
                url_check: None,
            })),
        })
    }

    pub fn attach(self) -> Result<(), JsValue> {
        let page = self.clone();
        dom::add_listener(&self.provider_select, "change", move |_| page.provider_changed())?;

        for field in Field::ALL {
            let page = self.clone();
            dom::add_listener(&self.inputs[&field], "input", move |_| page.field_input(field))?;
        }

        let page = self.clone();
        dom::add_listener(&self.form_element, "submit", move |event| {
            event.prevent_default();
            page.submit();
        })?;

        // Set up for the initially selected provider
        self.provider_changed();
        self.submit_button.set_disabled(true);
        Ok(())
    }

    fn input_value(&self, field: Field) -> String {
        self.inputs[&field].value()
    }

    fn provider_changed(&self) {
        let provider = Provider::from_str(&self.provider_select.value()).unwrap_or_default();
        let config = provider.config();

        let base_url = {
            let mut state = self.state.borrow_mut();
            state.form.select_provider(provider);
            state.form.fields().base_url.clone()
        };

        if let Some(hint) = &self.api_key_hint {
            dom::set_text_content(hint, config.key_hint);
        }
        if let Some(group) = &self.base_url_group {
            dom::set_visible(group, config.requires_endpoint_url);
        }
        if let Some(hint) = &self.base_url_hint {
            if config.requires_endpoint_url {
                dom::set_text_content(
                    hint,
                    config.endpoint_hint.unwrap_or("Required for this provider"),
                );
            }
        }

        self.inputs[&Field::BaseUrl].set_value(&base_url);
        self.inputs[&Field::AiKey].set_value("");

        self.render_field(Field::AiKey);
        self.render_field(Field::BaseUrl);
        self.update_submit_button();
    }

    fn field_input(&self, field: Field) {
        let value = self.input_value(field);
        match field {
            Field::EgwUrl => {
                self.egw_url_changed(&value);
                return;
            }
            Field::AiKey => self.state.borrow_mut().form.set_ai_key(&value),
            Field::BaseUrl => self.state.borrow_mut().form.set_base_url(&value),
            Field::Username => self.state.borrow_mut().form.set_username(&value),
            Field::Password => self.state.borrow_mut().form.set_password(&value),
        }
        self.render_field(field);
        self.update_submit_button();
    }

    /// Each keystroke replaces the scheduled check; only the last one fires
    fn egw_url_changed(&self, value: &str) {
        let ticket = self.state.borrow_mut().form.egw_url_changed(value);
        self.render_field(Field::EgwUrl);
        self.update_submit_button();

        let page = self.clone();
        let timeout = Timeout::new(URL_CHECK_DEBOUNCE_MS, move || {
            wasm_bindgen_futures::spawn_local(async move { page.check_egw_url(ticket).await });
        });
        self.state.borrow_mut().url_check = Some(timeout);
    }

    async fn check_egw_url(self, ticket: UrlCheckTicket) {
        let url = self.state.borrow_mut().form.begin_url_check(ticket);

        if let Some(url) = url {
            let outcome = self.backend.validate_egroupware_url(&url).await;
            self.state.borrow_mut().form.finish_url_check(ticket, outcome);
        }

        self.render_field(Field::EgwUrl);
        self.update_submit_button();
    }

    fn render_field(&self, field: Field) {
        let state = self.state.borrow();
        let field_state = state.form.state(field);
        if let Some(indicator) = self.indicators.get(&field) {
            indicator.set_class_name(indicator_class(field_state));
            let _ = indicator.set_attribute("title", &field_state.message);
        }
    }

    fn update_submit_button(&self) {
        let can_submit = self.state.borrow().form.can_submit();
        self.submit_button.set_disabled(!can_submit);
    }

    fn submit(&self) {
        let request = match self.state.borrow().form.login_request() {
            Ok(request) => request,
            Err(_) => {
                dom::set_text_content(&self.error_message, FIX_ERRORS_MESSAGE);
                return;
            }
        };

        dom::set_text_content(&self.error_message, "Logging in...");

        let page = self.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let result = page.backend.login(&request).await.and_then(|token| {
                let mut store = LocalStorageStore::new()
                    .map_err(|e| ClientError::Storage(format!("{:?}", e)))?;
                store.save(&token)
            });

            match result {
                Ok(()) => {
                    if let Err(e) = dom::navigate(&page.backend.endpoints().chat_page()) {
                        log::error!("Failed to navigate to chat: {:?}", e);
                    }
                }
                Err(e) => {
                    log::warn!("Login failed: {}", e);
                    dom::set_text_content(&page.error_message, &e.to_string());
                }
            }
        });
    }
}

/// Indicator span appended next to an input
fn create_indicator(document: &Document, input: &HtmlInputElement) -> Result<Element, JsValue> {
    let indicator = dom::create_element_with_class(document, "span", "validation-indicator")?;
    if let Some(parent) = input.parent_node() {
        parent.append_child(&indicator)?;
    }
    Ok(indicator)
}
