//! Login form validation.
//!
//! [`validate`] is the pure rule set. [`LoginForm`] layers the stateful parts on top:
//! provider switching and the remote EGroupware URL check, whose results are matched
//! against a ticket so a superseded check can never overwrite a newer one.

use std::collections::BTreeMap;

use egwchat_types::{LoginRequest, Provider, ValidationResponse};

use crate::error::{ClientError, Result};

pub const FIX_ERRORS_MESSAGE: &str = "Please fix validation errors before submitting";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    EgwUrl,
    AiKey,
    BaseUrl,
    Username,
    Password,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::EgwUrl,
        Field::AiKey,
        Field::BaseUrl,
        Field::Username,
        Field::Password,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldStatus {
    Valid,
    Invalid,
    /// Remote check scheduled or in flight
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldState {
    pub status: FieldStatus,
    pub message: String,
}

impl FieldState {
    fn valid(message: impl Into<String>) -> Self {
        Self {
            status: FieldStatus::Valid,
            message: message.into(),
        }
    }

    fn invalid(message: impl Into<String>) -> Self {
        Self {
            status: FieldStatus::Invalid,
            message: message.into(),
        }
    }

    fn pending() -> Self {
        Self {
            status: FieldStatus::Pending,
            message: String::new(),
        }
    }

    fn from_check(valid: bool, ok: &str, err: &str) -> Self {
        if valid {
            Self::valid(ok)
        } else {
            Self::invalid(err)
        }
    }

    pub fn is_valid(&self) -> bool {
        self.status == FieldStatus::Valid
    }
}

/// Raw values of the login form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginFields {
    pub egw_url: String,
    pub ai_key: String,
    pub base_url: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub per_field: BTreeMap<Field, bool>,
    pub all_valid: bool,
}

impl ValidationReport {
    fn from_flags(per_field: BTreeMap<Field, bool>) -> Self {
        let all_valid = per_field.values().all(|v| *v);
        Self {
            per_field,
            all_valid,
        }
    }

    pub fn is_valid(&self, field: Field) -> bool {
        self.per_field.get(&field).copied().unwrap_or(false)
    }
}

fn key_is_valid(provider: Provider, key: &str) -> bool {
    let key = key.trim();
    !key.is_empty() && provider.config().key_format.accepts(key)
}

fn base_url_is_valid(provider: Provider, url: &str) -> bool {
    !provider.config().requires_endpoint_url || !url.trim().is_empty()
}

fn is_filled(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Synchronous validity of every tracked field.
///
/// The EGroupware URL only gets its local check here (non-empty); reachability is
/// decided by the backend through [`LoginForm`].
pub fn validate(provider: Provider, fields: &LoginFields) -> ValidationReport {
    let per_field = BTreeMap::from([
        (Field::EgwUrl, is_filled(&fields.egw_url)),
        (Field::AiKey, key_is_valid(provider, &fields.ai_key)),
        (Field::BaseUrl, base_url_is_valid(provider, &fields.base_url)),
        (Field::Username, is_filled(&fields.username)),
        (Field::Password, is_filled(&fields.password)),
    ]);
    ValidationReport::from_flags(per_field)
}

/// Proof of which URL check a result belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UrlCheckTicket(u64);

/// Stateful login form
#[derive(Debug, Clone)]
pub struct LoginForm {
    provider: Provider,
    fields: LoginFields,
    states: BTreeMap<Field, FieldState>,
    url_check: u64,
}

impl Default for LoginForm {
    fn default() -> Self {
        Self::new(Provider::default())
    }
}

impl LoginForm {
    pub fn new(provider: Provider) -> Self {
        let states = Field::ALL
            .iter()
            .map(|field| (*field, FieldState::invalid("")))
            .collect();

        let mut form = Self {
            provider,
            fields: LoginFields::default(),
            states,
            url_check: 0,
        };
        form.select_provider(provider);
        form
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn fields(&self) -> &LoginFields {
        &self.fields
    }

    pub fn state(&self, field: Field) -> &FieldState {
        // Every field is inserted in `new`
        &self.states[&field]
    }

    pub fn report(&self) -> ValidationReport {
        let per_field = self
            .states
            .iter()
            .map(|(field, state)| (*field, state.is_valid()))
            .collect();
        ValidationReport::from_flags(per_field)
    }

    pub fn can_submit(&self) -> bool {
        self.report().all_valid
    }

    /// Switch provider. Credentials are provider specific, so the key starts over.
    pub fn select_provider(&mut self, provider: Provider) {
        let config = provider.config();
        self.provider = provider;

        if config.requires_endpoint_url {
            self.fields.base_url = config.default_endpoint_url.unwrap_or_default().to_string();
            let valid = is_filled(&self.fields.base_url);
            self.set_state(
                Field::BaseUrl,
                FieldState::from_check(valid, "Base URL provided", "Base URL is required"),
            );
        } else {
            self.fields.base_url.clear();
            self.set_state(Field::BaseUrl, FieldState::valid(""));
        }

        self.fields.ai_key.clear();
        self.set_state(Field::AiKey, FieldState::invalid(""));
    }

    pub fn set_ai_key(&mut self, value: &str) {
        self.fields.ai_key = value.to_string();
        let state = if !is_filled(value) {
            FieldState::invalid("API key is required")
        } else {
            FieldState::from_check(
                key_is_valid(self.provider, value),
                &format!("Valid {} key format", self.provider),
                &format!("Invalid {} key format", self.provider),
            )
        };
        self.set_state(Field::AiKey, state);
    }

    pub fn set_base_url(&mut self, value: &str) {
        self.fields.base_url = value.to_string();
        let state = if self.provider.config().requires_endpoint_url {
            FieldState::from_check(is_filled(value), "Base URL provided", "Base URL is required")
        } else {
            FieldState::valid("")
        };
        self.set_state(Field::BaseUrl, state);
    }

    pub fn set_username(&mut self, value: &str) {
        self.fields.username = value.to_string();
        self.set_state(
            Field::Username,
            FieldState::from_check(is_filled(value), "Username provided", "Username is required"),
        );
    }

    pub fn set_password(&mut self, value: &str) {
        self.fields.password = value.to_string();
        self.set_state(
            Field::Password,
            FieldState::from_check(is_filled(value), "Password provided", "Password is required"),
        );
    }

    /// Record a new EGroupware URL value.
    ///
    /// Any earlier check is superseded; the field stays pending until the check for the
    /// returned ticket completes.
    pub fn egw_url_changed(&mut self, value: &str) -> UrlCheckTicket {
        self.fields.egw_url = value.to_string();
        self.url_check += 1;
        self.set_state(Field::EgwUrl, FieldState::pending());
        UrlCheckTicket(self.url_check)
    }

    /// Called once the debounce delay for `ticket` has elapsed.
    ///
    /// Returns the URL to send to the backend, or `None` when the ticket is stale or the
    /// field is empty (which settles the field as invalid right away).
    pub fn begin_url_check(&mut self, ticket: UrlCheckTicket) -> Option<String> {
        if ticket.0 != self.url_check {
            return None;
        }

        let url = self.fields.egw_url.trim();
        if url.is_empty() {
            self.set_state(Field::EgwUrl, FieldState::invalid("EGroupware URL is required"));
            return None;
        }
        Some(url.to_string())
    }

    /// Apply the backend's verdict for `ticket`. Returns whether it was applied.
    pub fn finish_url_check(
        &mut self,
        ticket: UrlCheckTicket,
        outcome: Result<ValidationResponse>,
    ) -> bool {
        if ticket.0 != self.url_check {
            log::debug!("Discarding stale EGroupware URL check {}", ticket.0);
            return false;
        }

        let state = match outcome {
            Ok(response) if response.valid => FieldState::valid("Valid EGroupware URL"),
            Ok(response) => FieldState::invalid(
                response
                    .detail
                    .unwrap_or_else(|| "Invalid EGroupware URL".to_string()),
            ),
            Err(e) => {
                log::warn!("EGroupware URL check failed: {}", e);
                FieldState::invalid("Error validating URL")
            }
        };
        self.set_state(Field::EgwUrl, state);
        true
    }

    /// Body for `POST /token`, or the reason the form cannot be submitted yet
    pub fn login_request(&self) -> Result<LoginRequest> {
        if !self.can_submit() {
            return Err(ClientError::Validation(FIX_ERRORS_MESSAGE.to_string()));
        }

        let base_url = self
            .provider
            .config()
            .requires_endpoint_url
            .then(|| self.fields.base_url.trim().to_string());

        Ok(LoginRequest {
            egw_url: self.fields.egw_url.trim().to_string(),
            ai_key: self.fields.ai_key.trim().to_string(),
            provider_type: self.provider,
            base_url,
            username: self.fields.username.trim().to_string(),
            password: self.fields.password.trim().to_string(),
        })
    }

    fn set_state(&mut self, field: Field, state: FieldState) {
        self.states.insert(field, state);
    }
}
