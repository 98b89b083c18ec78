//! Clean command - remove every cached script

use crate::cache::CacheStore;
use crate::config::Config;
use crate::error::RunResult;
use crate::ui::{self, UiContext};
use tracing::debug;

/// Execute the clean command
pub async fn execute(config: &Config, yes: bool) -> RunResult<()> {
    let ctx = UiContext::detect().with_auto_yes(yes);
    clear_cache(&ctx, config).await
}

async fn clear_cache(ctx: &UiContext, config: &Config) -> RunResult<()> {
    let store = CacheStore::new(&config.general.data_dir, &config.lock.suffix);
    let dir = store.base_dir().display().to_string();

    if !store.base_dir().exists() {
        ui::step_info(ctx, &format!("Nothing cached in {}", dir));
        return Ok(());
    }

    let prompt = format!("Remove all scripts cached in {}?", dir);
    if !ui::confirm(ctx, &prompt, false).await? {
        ui::step_warn(ctx, "Aborted, pass --yes to clean without asking");
        return Ok(());
    }

    let removed = store.clear().await?;
    debug!("Removed {} scope directories", removed);
    ui::step_ok_detail(ctx, "Cache cleared", &dir);
    Ok(())
}
