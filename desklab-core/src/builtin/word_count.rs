//! Word count - counts words, characters, and lines of the selection

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};

use desklab_plugin_api::{
    Command, CommandContext, Disposable, ExtensionKind, NotificationKind, Plugin, PluginContext,
    PluginError, PluginManifest, Teardown, ToolbarItem, ToolbarLocation,
};

pub const PLUGIN_ID: &str = "builtin.word-count";

/// Storage key holding the most recent [`TextStats`]
pub const LAST_STATS_KEY: &str = "lastStats";

pub fn manifest() -> PluginManifest {
    PluginManifest {
        version: "1.0.0".to_string(),
        description: "Shows word, character, and line counts for the current text".to_string(),
        author: Some("DeskLab".to_string()),
        extension_points: vec![ExtensionKind::Command, ExtensionKind::Toolbar],
        ..PluginManifest::new(PLUGIN_ID, "Word Count")
    }
}

/// Statistics for a piece of text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStats {
    /// Runs of ASCII letters plus individual CJK ideographs
    pub words: usize,
    pub characters: usize,
    pub characters_no_space: usize,
    pub lines: usize,
}

impl TextStats {
    pub fn summary(&self) -> String {
        format!(
            "Words: {} | Characters: {} | Lines: {}",
            self.words, self.characters, self.lines
        )
    }
}

fn is_cjk(c: char) -> bool {
    ('\u{4e00}'..='\u{9fa5}').contains(&c)
}

pub fn calculate_stats(text: &str) -> TextStats {
    let mut words = 0;
    let mut in_word = false;
    for c in text.chars() {
        let letter = c.is_ascii_alphabetic();
        if letter && !in_word {
            words += 1;
        }
        in_word = letter;
        if is_cjk(c) {
            words += 1;
        }
    }

    // \r\n, \r, and \n each end a line
    let mut breaks = 0;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                chars.next_if_eq(&'\n');
                breaks += 1;
            }
            '\n' => breaks += 1,
            _ => {}
        }
    }

    TextStats {
        words,
        characters: text.chars().count(),
        characters_no_space: text.chars().filter(|c| !c.is_whitespace()).count(),
        lines: breaks + 1,
    }
}

/// The word count plugin. Keeps its registrations so teardown can revoke them.
#[derive(Default)]
pub struct WordCountPlugin {
    disposables: Mutex<Vec<Disposable>>,
}

impl WordCountPlugin {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Plugin for WordCountPlugin {
    async fn activate(&self, ctx: PluginContext) -> Result<(), PluginError> {
        let command_ctx = ctx.clone();
        let command = Command::new(
            "showWordCount",
            "Show Word Count",
            move |run: CommandContext| {
                let ctx = command_ctx.clone();
                async move {
                    let Some(text) = run.selection_text() else {
                        ctx.show_notification("Select some text first", Some(NotificationKind::Info));
                        return Ok(());
                    };
                    let stats = calculate_stats(text);
                    ctx.storage().set(LAST_STATS_KEY, &stats)?;
                    ctx.show_notification(stats.summary(), Some(NotificationKind::Info));
                    Ok(())
                }
            },
        )
        .with_description("Show word, character, and line counts for the selection")
        .with_keybinding("Ctrl+Shift+W");

        let toolbar_ctx = ctx.clone();
        let toolbar = ToolbarItem::new("wordCount", "Word Count", "analytics", move || {
            match toolbar_ctx.storage().get::<TextStats>(LAST_STATS_KEY) {
                Some(stats) => {
                    toolbar_ctx.show_notification(stats.summary(), Some(NotificationKind::Success))
                }
                None => toolbar_ctx.show_notification("Nothing counted yet", None),
            }
        })
        .with_tooltip("Show word count (Ctrl+Shift+W)")
        .with_location(ToolbarLocation::Editor);

        let mut disposables = self
            .disposables
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        disposables.push(ctx.register_command(command));
        disposables.push(ctx.register_toolbar_item(toolbar));

        ctx.log_info("Word count activated");
        Ok(())
    }

    fn teardown(&self) -> Option<&dyn Teardown> {
        Some(self)
    }
}

#[async_trait]
impl Teardown for WordCountPlugin {
    async fn deactivate(&self) -> Result<(), PluginError> {
        let disposables = std::mem::take(
            &mut *self
                .disposables
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for disposable in &disposables {
            disposable.dispose();
        }
        tracing::info!(plugin = PLUGIN_ID, "Word count deactivated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_english_words() {
        let stats = calculate_stats("Hello, world! It's 2024.");
        // "It's" splits into "It" and "s"
        assert_eq!(stats.words, 4);
        assert_eq!(stats.lines, 1);
    }

    #[test]
    fn test_counts_cjk_characters_as_words() {
        let stats = calculate_stats("你好 world");
        assert_eq!(stats.words, 3);
        assert_eq!(stats.characters, 8);
        assert_eq!(stats.characters_no_space, 7);
    }

    #[test]
    fn test_line_breaks() {
        assert_eq!(calculate_stats("a\r\nb\rc\nd").lines, 4);
        assert_eq!(calculate_stats("").lines, 1);
        assert_eq!(calculate_stats("trailing\n").lines, 2);
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(
            calculate_stats(""),
            TextStats {
                lines: 1,
                ..TextStats::default()
            }
        );
    }

    #[test]
    fn test_manifest() {
        let manifest = manifest();
        assert_eq!(manifest.id, PLUGIN_ID);
        assert!(manifest.declares(ExtensionKind::Command));
        assert!(manifest.declares(ExtensionKind::Toolbar));
        assert!(manifest.permissions.is_empty());
    }

    #[test]
    fn test_stats_wire_format() {
        let json = serde_json::to_value(calculate_stats("ab cd")).unwrap();
        assert_eq!(json["charactersNoSpace"], 4);
    }
}
