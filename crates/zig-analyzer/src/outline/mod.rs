pub(crate) mod builder;
pub(crate) mod declaration;
pub(crate) mod tool;

pub use builder::{build_symbols, flatten_symbols};
pub use declaration::{Declaration, DeclarationKind};
pub use tool::{OutlineError, parse_declarations, run_outline};
