//! Init command - write the default config and create the data directory

use crate::config::ConfigManager;
use crate::error::{RunError, RunResult};
use crate::ui::{self, UiContext};

/// Template for the user config
const INIT_TEMPLATE: &str = r#"# runscripts configuration
# Every key is optional; commented values are the defaults.
# Docs: https://github.com/runscripts/runscripts

[general]
# data_dir = "~/.local/share/runscripts"   # where fetched scripts are cached
# log_format = "text"                      # text, json
# default_scope = "default"                # scope used when a reference has none
# default_ref = "master"                   # substituted for {ref} when no @ref is given

[lock]
# suffix = ".lock"
# timeout_secs = 0                         # 0 waits until the lock is free

[fetch]
# timeout_secs = 30
# user_agent = "runscripts/<version>"

[sources]
# Extra scopes, merged over the built-in "default" and "github" scopes.
# Placeholders: {script} {ref}, and {owner} {repo} {path} for OWNER/REPO/PATH names.
# mine = "https://raw.githubusercontent.com/me/scripts/{ref}/{script}"
# local = "file:///home/me/scripts/{script}"
"#;

/// Execute the init command
pub async fn execute(manager: &ConfigManager, force: bool) -> RunResult<()> {
    let ctx = UiContext::detect();

    write_template(manager, force).await?;
    ui::step_ok_detail(&ctx, "Created config", &manager.path().display().to_string());

    let config = manager.load().await?;
    ConfigManager::ensure_data_dir(&config).await?;
    ui::step_ok_detail(
        &ctx,
        "Data directory ready",
        &config.general.data_dir.display().to_string(),
    );

    Ok(())
}

async fn write_template(manager: &ConfigManager, force: bool) -> RunResult<()> {
    if manager.path().exists() && !force {
        return Err(RunError::User(format!(
            "{} already exists. Use --force to overwrite.",
            manager.path().display()
        )));
    }
    manager.write_raw(INIT_TEMPLATE).await
}
