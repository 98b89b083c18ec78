//! Confirmation prompt with a non-interactive fallback

use super::context::UiContext;
use crate::error::{RunError, RunResult};

/// Ask a yes/no question
///
/// Returns `true` straight away under `--yes`, and `default` when there is
/// no terminal to ask on.
pub async fn confirm(ctx: &UiContext, message: &str, default: bool) -> RunResult<bool> {
    if ctx.auto_yes() {
        println!("  {} (auto-approved)", message);
        return Ok(true);
    }

    if !ctx.is_interactive() {
        return Ok(default);
    }

    let message = message.to_string();
    let result = tokio::task::spawn_blocking(move || {
        cliclack::confirm(&message)
            .initial_value(default)
            .interact()
    })
    .await
    .map_err(|e| RunError::User(format!("Prompt task failed: {}", e)))?;

    result.map_err(|e| RunError::User(format!("Prompt failed: {}", e)))
}
