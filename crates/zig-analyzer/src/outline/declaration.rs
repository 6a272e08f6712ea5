use serde::Deserialize;

/// One declaration record as emitted by the outline tool.
///
/// The tool prints a JSON array of these on stdout; offsets are byte offsets
/// into the file, and children are nested declarations in source order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Declaration {
    /// Declaration name; for test declarations this is the quoted description.
    pub label: String,
    /// Declaration category (`struct`, `function`, `test`, ...).
    #[serde(rename = "type")]
    pub kind: DeclarationKind,
    /// Owning type name, when the declaration is a method.
    #[serde(default)]
    pub receiver_type: Option<String>,
    /// Byte offset of the first character of the declaration.
    pub start: usize,
    /// Byte offset just past the last character of the declaration.
    pub end: usize,
    /// Nested declarations (e.g. methods inside a struct), in source order.
    #[serde(default)]
    pub children: Vec<Declaration>,
}

/// Declaration categories understood by the outline tool.
///
/// Categories added by future tool versions deserialize as [`Unknown`]
/// (via `#[serde(other)]`) instead of failing the whole outline.
///
/// [`Unknown`]: DeclarationKind::Unknown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationKind {
    Struct,
    Function,
    Test,
    Const,
    Variable,
    Enum,
    Union,
    Import,
    #[serde(other)]
    Unknown,
}

impl DeclarationKind {
    /// Raw category name, as the tool spells it.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Struct => "struct",
            Self::Function => "function",
            Self::Test => "test",
            Self::Const => "const",
            Self::Variable => "variable",
            Self::Enum => "enum",
            Self::Union => "union",
            Self::Import => "import",
            Self::Unknown => "unknown",
        }
    }
}
