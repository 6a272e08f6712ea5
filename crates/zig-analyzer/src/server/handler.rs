use serde_json::Value;
use tower_lsp::{LanguageServer, jsonrpc::Result, lsp_types::*};
use tracing::{debug, info, warn};

use crate::{
    outline::{build_symbols, run_outline},
    server::{settings::ServerSettings, state::ZigLanguageServer},
};

const CLIENT_NOTIFICATION_PREFIX: &str = "zig-analyzer:";

pub(crate) const CMD_TEST_FILE: &str = "zig-analyzer.test.file";
pub(crate) const CMD_TEST_CURSOR: &str = "zig-analyzer.test.cursor";
pub(crate) const CMD_TEST_CANCEL: &str = "zig-analyzer.test.cancel";

#[tower_lsp::async_trait]
impl LanguageServer for ZigLanguageServer {
    async fn initialize(
        &self,
        params: InitializeParams,
    ) -> Result<InitializeResult> {
        info!("Initializing zig-analyzer...");

        let initial_settings = ServerSettings::from_lsp_payload(params.initialization_options.as_ref());
        self.apply_settings(initial_settings).await;

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::INCREMENTAL)),
                document_symbol_provider: Some(OneOf::Left(true)),
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: vec![
                        CMD_TEST_FILE.to_string(),
                        CMD_TEST_CURSOR.to_string(),
                        CMD_TEST_CANCEL.to_string(),
                    ],
                    work_done_progress_options: Default::default(),
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "zig-analyzer".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(
        &self,
        _: InitializedParams,
    ) {
        info!("zig-analyzer initialized");
        self.start_output_forwarder();
    }

    async fn did_change_configuration(
        &self,
        params: DidChangeConfigurationParams,
    ) {
        let current = self.settings_snapshot().await;
        let merged = current.merged_with_payload(&params.settings);
        if merged == current {
            return;
        }
        self.apply_settings(merged).await;
        info!("Applied updated zig-analyzer settings");
    }

    async fn shutdown(&self) -> Result<()> {
        info!("Shutting down zig-analyzer");
        self.test_runs.cancel_all().await;
        Ok(())
    }

    async fn did_open(
        &self,
        params: DidOpenTextDocumentParams,
    ) {
        let uri = params.text_document.uri;
        let text = params.text_document.text;
        let version = params.text_document.version;

        info!("Opened {} (v{version}, {} bytes)", short_name(&uri), text.len());
        self.document_store.open(uri, text, version);
    }

    async fn did_change(
        &self,
        params: DidChangeTextDocumentParams,
    ) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;
        self.document_store.apply_changes(&uri, params.content_changes, version);
    }

    async fn did_close(
        &self,
        params: DidCloseTextDocumentParams,
    ) {
        let uri = params.text_document.uri;
        debug!("Closed {}", short_name(&uri));
        self.document_store.close(&uri);
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        let uri = params.text_document.uri;
        let Some(document) = self.document_store.get(&uri) else {
            return Ok(None);
        };
        let Ok(path) = uri.to_file_path() else {
            return Ok(None);
        };
        let tools = self.settings_snapshot().await.tools;

        match run_outline(&tools.outline_path, &path).await {
            Ok(decls) => {
                let symbols = build_symbols(&decls, &document, None);
                Ok(Some(DocumentSymbolResponse::Nested(symbols)))
            },
            Err(error) => {
                // Outline failures must not block editing; log briefly and
                // report an empty outline.
                warn!("outline failed for {}: {error}", short_name(&uri));
                self.client
                    .log_message(MessageType::ERROR, prefixed_client_message(format!("outline: {error}")))
                    .await;
                Ok(None)
            },
        }
    }

    async fn execute_command(
        &self,
        params: ExecuteCommandParams,
    ) -> Result<Option<Value>> {
        match params.command.as_str() {
            CMD_TEST_FILE => {
                if let Some(uri) = argument_uri(&params.arguments) {
                    self.run_file_tests(&uri).await;
                }
            },
            CMD_TEST_CURSOR => {
                if let (Some(uri), Some(position)) =
                    (argument_uri(&params.arguments), argument_position(&params.arguments))
                {
                    self.run_test_at_cursor(&uri, position).await;
                }
            },
            CMD_TEST_CANCEL => {
                info!("cancelling all test runs");
                self.test_runs.cancel_all().await;
            },
            unknown => {
                warn!("unknown command: {unknown}");
            },
        }
        Ok(None)
    }
}

/// First command argument: the document URI.
fn argument_uri(arguments: &[Value]) -> Option<Url> {
    arguments.first().and_then(|value| value.as_str()).and_then(|raw| Url::parse(raw).ok())
}

/// Second command argument: a `{line, character}` cursor position.
fn argument_position(arguments: &[Value]) -> Option<Position> {
    arguments.get(1).and_then(|value| serde_json::from_value(value.clone()).ok())
}

fn short_name(uri: &Url) -> String {
    uri.path().rsplit('/').next().unwrap_or(uri.path()).to_owned()
}

pub(crate) fn prefixed_client_message(message: impl AsRef<str>) -> String {
    format!("{CLIENT_NOTIFICATION_PREFIX} {}", message.as_ref())
}
