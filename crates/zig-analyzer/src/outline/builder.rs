use std::collections::HashMap;

use once_cell::sync::Lazy;
use tower_lsp::lsp_types::{DocumentSymbol, Range, SymbolKind};
use tracing::warn;

use crate::document::Document;

use super::declaration::{Declaration, DeclarationKind};

/// Tool declaration categories mapped onto LSP symbol kinds.
///
/// Kept as a data table rather than a `match` so new categories only need a
/// row here. Categories without a row (including [`DeclarationKind::Unknown`])
/// fall back to `FUNCTION`.
static KIND_TABLE: Lazy<HashMap<DeclarationKind, SymbolKind>> = Lazy::new(|| {
    HashMap::from([
        (DeclarationKind::Enum, SymbolKind::ENUM),
        (DeclarationKind::Import, SymbolKind::NAMESPACE),
        (DeclarationKind::Const, SymbolKind::CONSTANT),
        (DeclarationKind::Variable, SymbolKind::VARIABLE),
        (DeclarationKind::Union, SymbolKind::INTERFACE),
        (DeclarationKind::Test, SymbolKind::FUNCTION),
        (DeclarationKind::Function, SymbolKind::FUNCTION),
        (DeclarationKind::Struct, SymbolKind::STRUCT),
    ])
});

pub(crate) fn symbol_kind_for(kind: DeclarationKind) -> SymbolKind {
    KIND_TABLE.get(&kind).copied().unwrap_or(SymbolKind::FUNCTION)
}

/// Convert declaration records into a nested `DocumentSymbol` tree.
///
/// The optional `filter` is applied at every level: a record is kept when it
/// or any of its descendants passes, and a record that fails with no passing
/// descendant is dropped together with its whole subtree. Records whose byte
/// offsets cannot be mapped into `document` are skipped (subtree included)
/// rather than failing the build.
pub fn build_symbols(
    decls: &[Declaration],
    document: &Document,
    filter: Option<&dyn Fn(&Declaration) -> bool>,
) -> Vec<DocumentSymbol> {
    let mut symbols = Vec::with_capacity(decls.len());
    for decl in decls {
        if let Some(filter) = filter
            && !subtree_matches(decl, filter)
        {
            continue;
        }
        let Some(mut symbol) = convert_declaration(decl, document) else {
            continue;
        };
        if !decl.children.is_empty() {
            let children = build_symbols(&decl.children, document, filter);
            if !children.is_empty() {
                symbol.children = Some(children);
            }
        }
        symbols.push(symbol);
    }
    symbols
}

/// Flatten a nested symbol tree into a single list, in document order.
pub fn flatten_symbols(symbols: &[DocumentSymbol]) -> Vec<&DocumentSymbol> {
    let mut result = Vec::new();
    for sym in symbols {
        result.push(sym);
        if let Some(children) = &sym.children {
            result.extend(flatten_symbols(children));
        }
    }
    result
}

fn subtree_matches(
    decl: &Declaration,
    filter: &dyn Fn(&Declaration) -> bool,
) -> bool {
    filter(decl) || decl.children.iter().any(|child| subtree_matches(child, filter))
}

fn convert_declaration(
    decl: &Declaration,
    document: &Document,
) -> Option<DocumentSymbol> {
    if decl.end < decl.start {
        warn!("outline: skipping '{}' with inverted offsets {}..{}", decl.label, decl.start, decl.end);
        return None;
    }
    let (Some(start), Some(end)) = (document.position_at(decl.start), document.position_at(decl.end)) else {
        warn!(
            "outline: skipping '{}', offsets {}..{} fall outside the document ({} bytes)",
            decl.label,
            decl.start,
            decl.end,
            document.text.len(),
        );
        return None;
    };

    let range = Range {
        start,
        end,
    };
    let selection_range = selection_range_for(range, document);

    let name = match decl.kind {
        DeclarationKind::Test => format!("test \"{}\"", decl.label),
        _ => decl.label.clone(),
    };

    Some(DocumentSymbol {
        name,
        detail: Some(decl.kind.as_str().to_string()),
        kind: symbol_kind_for(decl.kind),
        tags: None,
        #[allow(deprecated)]
        deprecated: None,
        range,
        selection_range,
        children: None,
    })
}

/// Narrow a multi-line declaration range down to its header line, so
/// consumers underline the declaration itself rather than its whole body.
fn selection_range_for(
    range: Range,
    document: &Document,
) -> Range {
    if range.start.line == range.end.line {
        return range;
    }
    Range {
        start: range.start,
        end: document.line_end(range.start.line),
    }
}

#[cfg(test)]
#[path = "../../tests/src/outline/builder_tests.rs"]
mod tests;
