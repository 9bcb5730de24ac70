use anyhow::{Context, Result};
use colored::Colorize;
use egwchat_core::{Field, FieldState, FieldStatus, LoginForm, SessionStore};
use egwchat_types::Provider;

use crate::app::prompt::Prompter;
use crate::app::setup::AppConfig;
use crate::cli::{parse_provider, LoginArgs};

fn show_state(state: &FieldState) {
    if state.message.is_empty() {
        return;
    }
    match state.status {
        FieldStatus::Valid => println!("  {} {}", "✓".green(), state.message.green()),
        FieldStatus::Invalid => println!("  {} {}", "✗".red(), state.message.red()),
        FieldStatus::Pending => println!("  {}", state.message.bright_black()),
    }
}

/// Ask for the provider until a known one is given
fn choose_provider(prompter: &mut Prompter) -> Result<Provider> {
    let known: Vec<&str> = Provider::ALL.iter().map(|p| p.as_str()).collect();
    loop {
        let answer = prompter.ask(
            &format!("Provider ({})", known.join("/")),
            Some(Provider::default().as_str()),
        )?;
        match parse_provider(&answer) {
            Ok(provider) => return Ok(provider),
            Err(e) => println!("  {} {}", "✗".red(), e.red()),
        }
    }
}

/// Check the EGroupware URL with the backend. The terminal asks field by field, so
/// the check runs once per entered value instead of on a typing debounce.
async fn check_egw_url(config: &AppConfig, form: &mut LoginForm, value: &str) {
    let ticket = form.egw_url_changed(value);
    if let Some(url) = form.begin_url_check(ticket) {
        println!("  {}", "Checking EGroupware URL...".bright_black());
        let outcome = config.client.validate_egroupware_url(&url).await;
        form.finish_url_check(ticket, outcome);
    }
    show_state(form.state(Field::EgwUrl));
}

/// Fill the login form from flags, prompting for missing or invalid values
pub async fn fill_login_form(config: &AppConfig, args: LoginArgs) -> Result<LoginForm> {
    let mut prompter = Prompter::new()?;

    let provider = match args.provider {
        Some(provider) => provider,
        None => choose_provider(&mut prompter)?,
    };
    let mut form = LoginForm::new(provider);
    let provider_config = provider.config();

    if let Some(url) = &args.egw_url {
        check_egw_url(config, &mut form, url).await;
    }
    while !form.state(Field::EgwUrl).is_valid() {
        let url = prompter.ask("EGroupware URL", None)?;
        check_egw_url(config, &mut form, &url).await;
    }

    if let Some(key) = &args.ai_key {
        form.set_ai_key(key);
        show_state(form.state(Field::AiKey));
    }
    while !form.state(Field::AiKey).is_valid() {
        let key = prompter.ask(provider_config.key_hint, None)?;
        form.set_ai_key(&key);
        show_state(form.state(Field::AiKey));
    }

    if provider_config.requires_endpoint_url {
        match &args.base_url {
            Some(url) => form.set_base_url(url),
            None => {
                let current = form.fields().base_url.clone();
                let label = provider_config.endpoint_hint.unwrap_or("Base URL");
                let url = prompter.ask(label, Some(current.as_str()))?;
                form.set_base_url(&url);
            }
        }
        while !form.state(Field::BaseUrl).is_valid() {
            show_state(form.state(Field::BaseUrl));
            let url = prompter.ask("Base URL", None)?;
            form.set_base_url(&url);
        }
    }

    match &args.username {
        Some(username) => form.set_username(username),
        None => form.set_username(&prompter.ask("Username", None)?),
    }
    while !form.state(Field::Username).is_valid() {
        show_state(form.state(Field::Username));
        form.set_username(&prompter.ask("Username", None)?);
    }

    match &args.password {
        Some(password) => form.set_password(password),
        None => form.set_password(&prompter.ask("Password", None)?),
    }
    while !form.state(Field::Password).is_valid() {
        show_state(form.state(Field::Password));
        form.set_password(&prompter.ask("Password", None)?);
    }

    Ok(form)
}

/// Log in and store the token
pub async fn run_login(config: &mut AppConfig, args: LoginArgs) -> Result<()> {
    let form = fill_login_form(config, args).await?;
    let request = form.login_request()?;

    println!("{}", "Logging in...".bright_black());
    let token = config.client.login(&request).await?;
    config
        .store
        .save(&token)
        .context("Failed to store session token")?;

    println!(
        "{} {}",
        "✓".bright_green(),
        format!("Logged in to {} using {}", request.egw_url, request.provider_type).green()
    );
    Ok(())
}
