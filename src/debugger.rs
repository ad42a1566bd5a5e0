//! Debugger abstraction and a scripted implementation backed by a snapshot file.
//!
//! A snapshot lists the variables visible at the current break:
//!
//! ```yaml
//! at_break: true
//! variables:
//!   pt: { type: point, value: [1.0, 2.0] }
//!   ring: { type: ring, value: [[0, 0], [4, 0], [4, 3], [0, 0]] }
//! ```
//!
//! Expressions are a variable name optionally followed by member and index
//! accessors, e.g. `poly.outer[2]`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Result of evaluating one expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation<V> {
    Valid { type_name: String, value: V },
    Invalid { reason: String },
}

impl<V> Evaluation<V> {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid {
            reason: reason.into(),
        }
    }
}

/// Source of expression values at the current break.
pub trait Debugger {
    /// Value handed to the drawing service.
    type Value;

    /// Whether the debugged process is paused.
    fn is_at_break(&self) -> bool;

    /// Evaluate an expression in the current frame.
    fn evaluate(&self, expression: &str) -> Evaluation<Self::Value>;
}

/// Error type for snapshot loading.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to read session {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse session {}: {details}", path.display())]
    Parse { path: PathBuf, details: String },
    #[error("session was not loaded from a file")]
    NoFile,
}

/// One variable in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    #[serde(rename = "type")]
    pub type_name: String,
    pub value: Value,
}

/// Serialized state of a paused process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default = "default_at_break")]
    pub at_break: bool,
    #[serde(default)]
    pub variables: BTreeMap<String, Variable>,
}

fn default_at_break() -> bool {
    true
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            at_break: true,
            variables: BTreeMap::new(),
        }
    }
}

/// Debugger that evaluates expressions against a [`Snapshot`].
#[derive(Debug, Clone, Default)]
pub struct SessionDebugger {
    path: Option<PathBuf>,
    snapshot: Snapshot,
}

impl SessionDebugger {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            path: None,
            snapshot,
        }
    }

    /// Load a snapshot file, YAML or JSON by extension.
    pub fn load(path: &Path) -> Result<Self, SessionError> {
        Ok(Self {
            path: Some(path.to_path_buf()),
            snapshot: read_snapshot(path)?,
        })
    }

    /// Re-read the snapshot file, as if the process hit a new break.
    pub fn reload(&mut self) -> Result<(), SessionError> {
        let path = self.path.as_deref().ok_or(SessionError::NoFile)?;
        self.snapshot = read_snapshot(path)?;
        debug!(
            path = %path.display(),
            variables = self.snapshot.variables.len(),
            "Session reloaded"
        );
        Ok(())
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn set_at_break(&mut self, at_break: bool) {
        self.snapshot.at_break = at_break;
    }

    /// Add or replace a variable.
    pub fn insert(&mut self, name: impl Into<String>, type_name: impl Into<String>, value: Value) {
        self.snapshot.variables.insert(
            name.into(),
            Variable {
                type_name: type_name.into(),
                value,
            },
        );
    }

    pub fn remove(&mut self, name: &str) -> Option<Variable> {
        self.snapshot.variables.remove(name)
    }
}

impl Debugger for SessionDebugger {
    type Value = Value;

    fn is_at_break(&self) -> bool {
        self.snapshot.at_break
    }

    fn evaluate(&self, expression: &str) -> Evaluation<Value> {
        if !self.snapshot.at_break {
            return Evaluation::invalid("process is not at a break");
        }
        let expression = expression.trim();
        let (root, accessors) = match parse_expression(expression) {
            Ok(parsed) => parsed,
            Err(reason) => return Evaluation::Invalid { reason },
        };
        let Some(variable) = self.snapshot.variables.get(root) else {
            return Evaluation::invalid(format!("identifier '{root}' is not defined"));
        };
        if accessors.is_empty() {
            return Evaluation::Valid {
                type_name: variable.type_name.clone(),
                value: variable.value.clone(),
            };
        }

        let mut value = &variable.value;
        for accessor in &accessors {
            let next = match accessor {
                Accessor::Member(name) => value.get(*name),
                Accessor::Index(i) => value.get(*i),
            };
            value = match next {
                Some(v) => v,
                None => return Evaluation::invalid(format!("'{expression}' has no value")),
            };
        }
        Evaluation::Valid {
            type_name: infer_type_name(value).to_string(),
            value: value.clone(),
        }
    }
}

fn read_snapshot(path: &Path) -> Result<Snapshot, SessionError> {
    let content = std::fs::read_to_string(path).map_err(|source| SessionError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let parsed: Result<Snapshot, String> = if is_json {
        serde_json::from_str(&content).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str(&content).map_err(|e| e.to_string())
    };
    parsed.map_err(|details| SessionError::Parse {
        path: path.to_path_buf(),
        details,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Accessor<'a> {
    Member(&'a str),
    Index(usize),
}

/// Split `name.member[3]` into the root name and its accessors.
fn parse_expression(expression: &str) -> Result<(&str, Vec<Accessor<'_>>), String> {
    let is_ident = |c: char| c.is_alphanumeric() || c == '_';

    let root_end = expression
        .find(|c: char| !is_ident(c))
        .unwrap_or(expression.len());
    let root = &expression[..root_end];
    if root.is_empty() {
        return Err(format!("'{expression}' is not an expression"));
    }

    let mut accessors = Vec::new();
    let mut rest = &expression[root_end..];
    while !rest.is_empty() {
        if let Some(tail) = rest.strip_prefix('.') {
            let end = tail.find(|c: char| !is_ident(c)).unwrap_or(tail.len());
            if end == 0 {
                return Err(format!("missing member name in '{expression}'"));
            }
            accessors.push(Accessor::Member(&tail[..end]));
            rest = &tail[end..];
        } else if let Some(tail) = rest.strip_prefix('[') {
            let end = tail
                .find(']')
                .ok_or_else(|| format!("unclosed '[' in '{expression}'"))?;
            let index = tail[..end]
                .trim()
                .parse::<usize>()
                .map_err(|_| format!("invalid index '{}' in '{expression}'", &tail[..end]))?;
            accessors.push(Accessor::Index(index));
            rest = &tail[end + 1..];
        } else {
            return Err(format!("unexpected '{rest}' in '{expression}'"));
        }
    }
    Ok((root, accessors))
}

/// Type name reported for a member or element reached through an accessor.
fn infer_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "double",
        Value::String(_) => "string",
        Value::Array(items) => {
            if is_point(value) {
                "point"
            } else if !items.is_empty() && items.iter().all(is_point) {
                "linestring"
            } else {
                "array"
            }
        }
        Value::Object(map) => {
            if map.get("x").is_some_and(Value::is_number) && map.get("y").is_some_and(Value::is_number)
            {
                "point"
            } else {
                "object"
            }
        }
    }
}

fn is_point(value: &Value) -> bool {
    matches!(value, Value::Array(items) if items.len() == 2 && items.iter().all(Value::is_number))
}
