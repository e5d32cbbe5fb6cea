//! CLI command implementations

pub mod ext;
pub mod plugin;

use anyhow::Result;
use std::sync::Arc;

use desklab_core::{ConfigLoader, ExtensionHost, builtin_plugins};
use desklab_plugin_api::{ConfirmPrompt, FixedAnswer};

use crate::prompt::TerminalPrompt;

/// Options shared by every command that starts a host
#[derive(Debug, Clone, Copy, Default)]
pub struct HostOptions {
    pub assume_yes: bool,
}

/// Load configuration, start the built-ins and any plugins found on disk.
pub async fn open_host(options: HostOptions) -> Result<ExtensionHost> {
    let config = ConfigLoader::load()?;
    let confirm: Arc<dyn ConfirmPrompt> = if options.assume_yes {
        Arc::new(FixedAnswer(true))
    } else {
        Arc::new(TerminalPrompt::new(config.confirm_default))
    };

    let host = ExtensionHost::with_file_store(config, confirm);
    let report = host.start(builtin_plugins()).await?;
    for (id, error) in &report.bootstrap.failed {
        tracing::warn!(plugin = %id, %error, "Built-in plugin did not start");
    }
    Ok(host)
}
