//! Manifest source documents.
//!
//! Sources are written as JSON or TOML. Both are read into the same [`Node`]
//! tree so that the compiler walks one shape and reports one set of type
//! names, whichever syntax the author used. Object members keep their
//! document order.

use std::fmt;
use std::io;
use std::path::Path;

use thiserror::Error;

/// Errors that can occur while reading a source document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// One node of a parsed document.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Null,
    Bool(bool),
    String(String),
    Array(Vec<Node>),
    /// Members in document order.
    Object(Vec<(String, Node)>),
    /// Wide enough for every integer JSON or TOML can carry, signed or not.
    Integer(i128),
    Real(f64),
}

/// The type of a [`Node`], as named in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Null,
    Boolean,
    String,
    Array,
    Object,
    Integer,
    Real,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Null => "NULL",
            NodeKind::Boolean => "BOOLEAN",
            NodeKind::String => "STRING",
            NodeKind::Array => "ARRAY",
            NodeKind::Object => "OBJECT",
            NodeKind::Integer => "INTEGER",
            NodeKind::Real => "REAL",
        };
        f.write_str(name)
    }
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Null => NodeKind::Null,
            Node::Bool(_) => NodeKind::Boolean,
            Node::String(_) => NodeKind::String,
            Node::Array(_) => NodeKind::Array,
            Node::Object(_) => NodeKind::Object,
            Node::Integer(_) => NodeKind::Integer,
            Node::Real(_) => NodeKind::Real,
        }
    }
}

impl From<serde_json::Value> for Node {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Node::Null,
            Value::Bool(b) => Node::Bool(b),
            Value::String(s) => Node::String(s),
            Value::Number(n) => match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => Node::Integer(i128::from(i)),
                (None, Some(u)) => Node::Integer(i128::from(u)),
                (None, None) => Node::Real(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::Array(items) => Node::Array(items.into_iter().map(Node::from).collect()),
            Value::Object(members) => Node::Object(
                members
                    .into_iter()
                    .map(|(name, value)| (name, Node::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<toml::Value> for Node {
    fn from(value: toml::Value) -> Self {
        use toml::Value;

        match value {
            Value::String(s) => Node::String(s),
            Value::Integer(i) => Node::Integer(i128::from(i)),
            Value::Float(x) => Node::Real(x),
            Value::Boolean(b) => Node::Bool(b),
            Value::Datetime(dt) => Node::String(dt.to_string()),
            Value::Array(items) => Node::Array(items.into_iter().map(Node::from).collect()),
            Value::Table(table) => table_to_node(table),
        }
    }
}

fn table_to_node(table: toml::Table) -> Node {
    Node::Object(
        table
            .into_iter()
            .map(|(name, value)| (name, Node::from(value)))
            .collect(),
    )
}

/// Source syntax of a manifest document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Json,
    Toml,
}

impl SourceFormat {
    /// `.toml` files are TOML; everything else is read as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => SourceFormat::Toml,
            _ => SourceFormat::Json,
        }
    }
}

/// Parse document text in the given syntax.
pub fn parse(text: &str, format: SourceFormat) -> Result<Node, DocumentError> {
    match format {
        SourceFormat::Json => {
            let value: serde_json::Value = serde_json::from_str(text)?;
            Ok(Node::from(value))
        }
        SourceFormat::Toml => {
            let table: toml::Table = text.parse()?;
            Ok(table_to_node(table))
        }
    }
}

/// Read and parse the document at `path`, choosing the syntax by extension.
pub fn load(path: &Path) -> Result<Node, DocumentError> {
    let text = std::fs::read_to_string(path)?;
    parse(&text, SourceFormat::from_path(path))
}
