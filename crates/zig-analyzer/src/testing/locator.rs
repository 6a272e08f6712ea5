use tower_lsp::lsp_types::{DocumentSymbol, Position, Range};
use tracing::warn;

use crate::{
    document::Document,
    outline::{Declaration, DeclarationKind, build_symbols, flatten_symbols},
};

/// Extract every test declaration in the file as a flat symbol list, in
/// document order. Tests nested inside containers (structs, unions) surface
/// as top-level entries here, so the result length equals the number of test
/// records at any depth.
pub fn test_symbols(
    decls: &[Declaration],
    document: &Document,
) -> Vec<DocumentSymbol> {
    let tree = build_symbols(decls, document, Some(&|decl: &Declaration| decl.kind == DeclarationKind::Test));
    flatten_symbols(&tree)
        .into_iter()
        .filter(|symbol| symbol.detail.as_deref() == Some(DeclarationKind::Test.as_str()))
        .cloned()
        .collect()
}

/// Name of the test whose range contains `position`, if any.
///
/// Test ranges never overlap when the outline tool upholds its sibling
/// invariant; if two containing ranges are observed anyway, this refuses to
/// pick one and returns `None`.
pub fn enclosing_test_name(
    symbols: &[DocumentSymbol],
    position: Position,
) -> Option<String> {
    let mut containing = symbols.iter().filter(|symbol| range_contains(symbol.range, position));
    let first = containing.next()?;
    if containing.next().is_some() {
        warn!(
            "overlapping test ranges contain {}:{}; ignoring the lookup",
            position.line, position.character,
        );
        return None;
    }
    Some(first.name.clone())
}

fn range_contains(
    range: Range,
    position: Position,
) -> bool {
    range.start <= position && position <= range.end
}

#[cfg(test)]
#[path = "../../tests/src/testing/locator_tests.rs"]
mod tests;
