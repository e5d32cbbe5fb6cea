//! Terminal confirmation prompt for plugin `show_confirm` calls

use async_trait::async_trait;
use dialoguer::Confirm;
use dialoguer::theme::ColorfulTheme;
use std::io::IsTerminal;

use desklab_plugin_api::ConfirmPrompt;

/// Asks on the terminal. Falls back to `default` when stdin is not a
/// terminal or the prompt fails.
pub struct TerminalPrompt {
    default: bool,
}

impl TerminalPrompt {
    pub fn new(default: bool) -> Self {
        Self { default }
    }
}

#[async_trait]
impl ConfirmPrompt for TerminalPrompt {
    async fn confirm(&self, text: &str) -> bool {
        if !std::io::stdin().is_terminal() {
            tracing::debug!(answer = self.default, "No terminal, using default answer");
            return self.default;
        }

        let text = text.to_string();
        let default = self.default;
        let answer = tokio::task::spawn_blocking(move || {
            Confirm::with_theme(&ColorfulTheme::default())
                .with_prompt(text)
                .default(default)
                .interact()
        })
        .await;

        match answer {
            Ok(Ok(answer)) => answer,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Confirmation prompt failed, using default answer");
                default
            }
            Err(e) => {
                tracing::warn!(error = %e, "Confirmation prompt task failed, using default answer");
                default
            }
        }
    }
}
