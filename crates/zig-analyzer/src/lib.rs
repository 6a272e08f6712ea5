pub mod document;
pub mod outline;
pub mod server;
pub mod testing;

pub use document::{Document, DocumentStore};
pub use outline::{Declaration, DeclarationKind, OutlineError, build_symbols, run_outline};
pub use server::ZigLanguageServer;
pub use testing::{
    OutputSink, SpawnError, TestConfig, TestRunRegistry, detect_project_root, enclosing_test_name,
    test_symbols,
};
