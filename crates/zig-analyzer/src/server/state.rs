use std::sync::Arc;

use tokio::sync::RwLock;
use tower_lsp::Client;

use crate::{document::DocumentStore, server::settings::ServerSettings, testing::TestRunRegistry};

/// The zig-analyzer backend that implements the Language Server Protocol.
pub struct ZigLanguageServer {
    /// The LSP client handle, used to send notifications back to the editor.
    pub(crate) client: Client,

    /// Thread-safe store of all open documents.
    pub(crate) document_store: Arc<DocumentStore>,

    /// Tracks every currently executing `zig test` process.
    pub(crate) test_runs: Arc<TestRunRegistry>,

    /// Runtime server settings updated from LSP configuration.
    pub(crate) settings: Arc<RwLock<ServerSettings>>,
}

impl ZigLanguageServer {
    /// Create a new `ZigLanguageServer` wired to the given LSP client.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            document_store: Arc::new(DocumentStore::new()),
            test_runs: Arc::new(TestRunRegistry::new()),
            settings: Arc::new(RwLock::new(ServerSettings::default())),
        }
    }

    pub(crate) async fn settings_snapshot(&self) -> ServerSettings {
        self.settings.read().await.clone()
    }

    pub(crate) async fn apply_settings(
        &self,
        settings: ServerSettings,
    ) {
        *self.settings.write().await = settings;
    }
}
