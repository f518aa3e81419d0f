//! Authenticated API requests.

use super::Context;
use crate::output::{self, OutputFormat};
use anyhow::{anyhow, bail, Result};
use auth_engine::auth_guard;
use auth_engine::messages::{describe_pipeline_error, message_for_status};
use serde_json::{json, Value};

/// GET an API path through the request pipeline and print the response.
pub async fn get(ctx: &Context, path: &str) -> Result<()> {
    let url = ctx
        .pipeline
        .url(path)
        .map_err(|e| anyhow!(describe_pipeline_error(&e)))?;

    if !ctx.pipeline.is_public(&url) {
        let decision = auth_guard(&ctx.tokens, path, &ctx.config.routes);
        if !decision.apply(ctx.navigator.as_ref()) {
            bail!("{}", message_for_status(401));
        }
    }

    let response = ctx
        .pipeline
        .get(path)
        .await
        .map_err(|e| anyhow!(describe_pipeline_error(&e)))?;
    let status = response.status();
    let body = response.text().await?;
    let parsed = serde_json::from_str::<Value>(&body).ok();

    match ctx.format {
        OutputFormat::Text => {
            output::print_row("Status", &status.to_string());
            match &parsed {
                Some(value) => println!("{}", serde_json::to_string_pretty(value)?),
                None if body.is_empty() => {}
                None => println!("{}", body),
            }
        }
        OutputFormat::Json => {
            let report = json!({
                "status": status.as_u16(),
                "body": parsed.clone().unwrap_or(Value::String(body)),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    if !status.is_success() {
        let message = parsed
            .as_ref()
            .and_then(server_message)
            .unwrap_or_else(|| message_for_status(status.as_u16()).to_string());
        bail!("{}", message);
    }
    Ok(())
}

/// The `message` or `error` string of an error body, if present.
fn server_message(body: &Value) -> Option<String> {
    ["message", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}
