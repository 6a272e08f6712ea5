pub(crate) mod locator;
pub(crate) mod registry;
pub(crate) mod runner;

pub use locator::{enclosing_test_name, test_symbols};
pub use registry::{OutputSink, SpawnError, TestRunRegistry};
pub use runner::{TestConfig, detect_project_root, run_tests, test_args};
