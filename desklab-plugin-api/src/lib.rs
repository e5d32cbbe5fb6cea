//! desklab-plugin-api - Plugin API for the desklab extension host
//!
//! This crate provides the traits and types needed to write plugins for
//! desklab. A plugin is handed a [`PluginContext`] when it activates and uses
//! it to contribute extensions (toolbar items, sidebar panels, commands, file
//! handlers, export formats), keep data in its storage namespace, and talk to
//! the user.
//!
//! # Example
//!
//! ```
//! use async_trait::async_trait;
//! use desklab_plugin_api::{Command, CommandContext, Plugin, PluginContext, PluginError};
//!
//! pub struct Hello;
//!
//! #[async_trait]
//! impl Plugin for Hello {
//!     async fn activate(&self, ctx: PluginContext) -> Result<(), PluginError> {
//!         let notifier = ctx.clone();
//!         ctx.register_command(Command::new("greet", "Say hello", move |_: CommandContext| {
//!             let notifier = notifier.clone();
//!             async move {
//!                 notifier.show_notification("Hello!", None);
//!                 Ok(())
//!             }
//!         }));
//!         Ok(())
//!     }
//! }
//! ```

use async_trait::async_trait;

pub mod context;
pub mod error;
pub mod extension;
pub mod interaction;
pub mod listeners;
pub mod registry;
pub mod storage;
pub mod types;

pub use context::{ContextFactory, Disposable, PluginContext};
pub use error::PluginError;
pub use extension::{
    Command, CommandContext, CommandHandler, ContentKind, ExportContent, ExportFormat,
    ExportResult, Exporter, Extension, FileHandleResult, FileHandler, FileInfo, FileProcessor,
    PanelPosition, SidebarPanel, SidebarPanelProps, ToolbarItem, ToolbarLocation, qualify,
    split_qualified,
};
pub use interaction::{
    ConfirmPrompt, FixedAnswer, NotificationBus, NotificationKind, PluginNotification,
};
pub use listeners::{Listeners, Subscription};
pub use registry::{ExtensionRegistry, RegistryStats};
pub use storage::{KeyValueStore, MemoryStore, PluginStorage};
pub use types::*;

/// The core plugin trait - implement this to create a desklab plugin.
///
/// `activate` is called each time the host activates the plugin, with a
/// fresh context. Anything registered through the context is removed by the
/// host on deactivation whether or not the plugin cleans up itself.
#[async_trait]
pub trait Plugin: Send + Sync {
    async fn activate(&self, ctx: PluginContext) -> Result<(), PluginError>;

    /// Optional teardown hook run before the host clears registrations
    fn teardown(&self) -> Option<&dyn Teardown> {
        None
    }
}

/// Cleanup capability for plugins that hold resources beyond their
/// registrations
#[async_trait]
pub trait Teardown: Send + Sync {
    async fn deactivate(&self) -> Result<(), PluginError>;
}
