//! Mapping from declared type names to node kinds.
//!
//! Built-in names cover the DAP constructors and base types. Unknown names
//! fall back to [`BaseType::Untyped`] rather than failing, so a declaration
//! can name any type the serving layer understands.

use std::{collections::HashMap, fmt};

use log::debug;

/// DAP atomic types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Float32,
    Float64,
    String,
    Url,
    /// A name the registry does not recognise.
    Untyped,
}

/// The structural role of a compiled node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Dataset,
    Sequence,
    Array,
    Structure,
    Grid,
    Base(BaseType),
}

impl NodeKind {
    /// Resolve one of the built-in type names.
    fn builtin(name: &str) -> Option<Self> {
        let kind = match name {
            "Dataset" => NodeKind::Dataset,
            "Sequence" => NodeKind::Sequence,
            "Array" => NodeKind::Array,
            "Structure" => NodeKind::Structure,
            "Grid" => NodeKind::Grid,
            "Byte" => NodeKind::Base(BaseType::Byte),
            "Int16" => NodeKind::Base(BaseType::Int16),
            "UInt16" => NodeKind::Base(BaseType::UInt16),
            "Int32" => NodeKind::Base(BaseType::Int32),
            "UInt32" => NodeKind::Base(BaseType::UInt32),
            "Float32" => NodeKind::Base(BaseType::Float32),
            "Float64" => NodeKind::Base(BaseType::Float64),
            "String" => NodeKind::Base(BaseType::String),
            "Url" => NodeKind::Base(BaseType::Url),
            _ => return None,
        };
        Some(kind)
    }

    /// Returns `true` for leaf kinds.
    pub fn is_base(&self) -> bool {
        matches!(self, NodeKind::Base(_))
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Base(BaseType::Untyped) => f.write_str("BaseType"),
            NodeKind::Base(base) => write!(f, "{base:?}"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Resolves declared type names to [`NodeKind`]s.
///
/// Registered aliases take precedence over built-in names.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    extensions: HashMap<String, NodeKind>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` as an alias for `kind`, replacing any earlier alias.
    pub fn register(&mut self, name: impl Into<String>, kind: NodeKind) -> &mut Self {
        self.extensions.insert(name.into(), kind);
        self
    }

    /// Look up the kind for a declared type name.
    pub fn lookup(&self, name: &str) -> NodeKind {
        if let Some(kind) = self.extensions.get(name) {
            return *kind;
        }
        NodeKind::builtin(name).unwrap_or_else(|| {
            debug!(type_name = name; "Unknown type name, using base type");
            NodeKind::Base(BaseType::Untyped)
        })
    }
}
