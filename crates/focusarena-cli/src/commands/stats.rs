use focusarena_core::{reward, Config, CoreError, Reconciler};

use super::{print_json, CommandResult};

/// Ask the configured reconciler for the focus counters.
pub fn run() -> CommandResult {
    let config = Config::load()?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let stats = runtime.block_on(async {
        let reconciler: std::sync::Arc<dyn Reconciler> = reward::from_config(&config)?;
        tracing::debug!(reconciler = reconciler.name(), "loading focus stats");
        reconciler.load_stats().await.map_err(CoreError::from)
    })?;
    print_json(&stats)
}
