use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio::sync::broadcast;
use tower_lsp::lsp_types::{DocumentSymbol, MessageType, Position, Url};
use tracing::{debug, info, warn};

use crate::{
    outline::run_outline,
    testing::{TestConfig, enclosing_test_name, run_tests, test_symbols},
};

use super::handler::prefixed_client_message;
use super::state::ZigLanguageServer;

impl ZigLanguageServer {
    /// Outline the file behind `uri` and return its test symbols, flattened
    /// in document order. Outline failures are logged to the client (a
    /// transient line, never a modal) and yield `None`.
    pub(crate) async fn locate_tests(
        &self,
        uri: &Url,
    ) -> Option<Vec<DocumentSymbol>> {
        let document = self.document_store.get(uri)?;
        let path = uri.to_file_path().ok()?;
        let tools = self.settings_snapshot().await.tools;

        match run_outline(&tools.outline_path, &path).await {
            Ok(decls) => Some(test_symbols(&decls, &document)),
            Err(error) => {
                warn!("outline failed for {uri}: {error}");
                let _ = AssertUnwindSafe(
                    self.client
                        .log_message(MessageType::ERROR, prefixed_client_message(format!("outline: {error}"))),
                )
                .catch_unwind()
                .await;
                None
            },
        }
    }

    /// Run every test in the file behind `uri`.
    pub(crate) async fn run_file_tests(
        &self,
        uri: &Url,
    ) {
        let Ok(path) = uri.to_file_path() else {
            return;
        };
        info!("running file tests for {uri}");
        self.start_test_run(TestConfig::file(path)).await;
    }

    /// Run the single test containing `position`, if there is one.
    pub(crate) async fn run_test_at_cursor(
        &self,
        uri: &Url,
        position: Position,
    ) {
        let Some(tests) = self.locate_tests(uri).await else {
            return;
        };
        let Some(name) = enclosing_test_name(&tests, position) else {
            self.client
                .show_message(MessageType::INFO, "No test function found at cursor.")
                .await;
            return;
        };
        let Ok(path) = uri.to_file_path() else {
            return;
        };
        info!("running test at cursor: {name}");
        let mut config = TestConfig::file(path);
        config.functions = vec![name];
        self.start_test_run(config).await;
    }

    /// Spawn one test run and report its spawn failure, if any. Completion
    /// reporting happens through the output sink, which the forwarder task
    /// relays to the client.
    pub(crate) async fn start_test_run(
        &self,
        config: TestConfig,
    ) {
        let tools = self.settings_snapshot().await.tools;
        match run_tests(&self.test_runs, &tools.zig_path, &config) {
            Ok(handle) => {
                tokio::spawn(async move {
                    match handle.await {
                        Ok(passed) => debug!("test run resolved: passed={passed}"),
                        Err(error) => warn!("test run task failed: {error}"),
                    }
                });
            },
            Err(error) => {
                warn!("failed to spawn test run: {error}");
                self.client
                    .show_message(MessageType::ERROR, prefixed_client_message(error.to_string()))
                    .await;
            },
        }
    }

    /// Relay output sink lines to the editor as log messages.
    pub(crate) fn start_output_forwarder(&self) {
        let client = self.client.clone();
        let mut lines = self.test_runs.output().subscribe();
        tokio::spawn(async move {
            loop {
                let line = match lines.recv().await {
                    Ok(line) => line,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("output forwarder lagged, {skipped} line(s) dropped");
                        continue;
                    },
                    Err(broadcast::error::RecvError::Closed) => return,
                };
                let result = AssertUnwindSafe(client.log_message(MessageType::LOG, line)).catch_unwind().await;
                if result.is_err() {
                    warn!("log_message panicked (client may have disconnected)");
                    return;
                }
            }
        });
    }
}
