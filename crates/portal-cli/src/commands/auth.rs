//! Authentication commands.

use super::Context;
use crate::output::{self, OutputFormat};
use anyhow::{bail, Result};
use auth_engine::{
    guest_guard, select_auth_status, select_error, select_user, AuthEvent, AuthState,
    AuthStatusView, LoginRequest, RegisterRequest,
};
use serde::Serialize;
use std::fmt;
use std::io::{self, Write};

/// Login with email and password.
pub async fn login(ctx: &Context, email: Option<String>) -> Result<()> {
    if !guest_guard(&ctx.tokens, &ctx.config.routes).is_allowed() {
        let email = ctx
            .tokens
            .get_user()?
            .map(|user| user.email)
            .unwrap_or_else(|| "unknown".to_string());
        output::print_success(&format!("Already logged in as {}", email), ctx.format);
        return Ok(());
    }

    let email = match email {
        Some(email) => email,
        None => prompt("Email: ")?,
    };
    if email.is_empty() {
        bail!("Email is required");
    }

    let password = rpassword::prompt_password("Password: ")?;
    if password.is_empty() {
        bail!("Password is required");
    }

    let state = ctx
        .settle(AuthEvent::Login(LoginRequest { email, password }))
        .await;
    report_session(&state, "Login", ctx.format)
}

/// Create an account and sign in with it.
pub async fn register(ctx: &Context, name: Option<String>, email: Option<String>) -> Result<()> {
    let name = match name {
        Some(name) => name,
        None => prompt("Name: ")?,
    };
    let email = match email {
        Some(email) => email,
        None => prompt("Email: ")?,
    };
    if name.is_empty() || email.is_empty() {
        bail!("Name and email are required");
    }

    let password = rpassword::prompt_password("Password: ")?;
    if password.is_empty() {
        bail!("Password is required");
    }
    if rpassword::prompt_password("Confirm password: ")? != password {
        bail!("Passwords do not match");
    }

    let state = ctx
        .settle(AuthEvent::Register(RegisterRequest {
            name,
            email,
            password,
        }))
        .await;
    report_session(&state, "Registration", ctx.format)
}

/// Logout and clear the local session.
pub async fn logout(ctx: &Context) -> Result<()> {
    if !ctx.tokens.is_authenticated()? {
        output::print_success("Not logged in", ctx.format);
        return Ok(());
    }

    let state = ctx.settle(AuthEvent::Logout).await;
    if let Some(error) = select_error(&state) {
        bail!("Logout failed: {}", error);
    }
    output::print_success("Logged out successfully", ctx.format);
    Ok(())
}

/// Show the stored session.
pub async fn status(ctx: &Context) -> Result<()> {
    let state = ctx.settle(AuthEvent::LoadFromStorage).await;
    let report = StatusReport {
        auth: select_auth_status(&state),
        api_base_url: ctx.config.api_base_url.clone(),
    };
    output::print(&report, ctx.format);
    Ok(())
}

#[derive(Debug, Serialize)]
struct StatusReport {
    #[serde(flatten)]
    auth: AuthStatusView,
    api_base_url: String,
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.auth.is_authenticated, &self.auth.user) {
            (true, Some(user)) => {
                writeln!(f, "Auth:     logged in")?;
                writeln!(f, "User:     {} <{}>", user.name, user.email)?;
            }
            _ => writeln!(f, "Auth:     not logged in")?,
        }
        write!(f, "API:      {}", self.api_base_url)
    }
}

fn report_session(state: &AuthState, action: &str, format: OutputFormat) -> Result<()> {
    if let Some(error) = select_error(state) {
        bail!("{} failed: {}", action, error);
    }
    let email = select_user(state)
        .map(|user| user.email.as_str())
        .unwrap_or("user");
    output::print_success(&format!("Logged in as {}", email), format);
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}
