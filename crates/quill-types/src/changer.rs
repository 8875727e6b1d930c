//! Mutation modes and type-level changers
use quill_core::{Result, TypeKey, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeMode {
    Set,
    Add,
    Remove,
    RemoveAll,
    Delete,
    Reset,
}

impl ChangeMode {
    pub const ALL: [ChangeMode; 6] = [
        ChangeMode::Set,
        ChangeMode::Add,
        ChangeMode::Remove,
        ChangeMode::RemoveAll,
        ChangeMode::Delete,
        ChangeMode::Reset,
    ];

    /// Delete and reset never carry a delta.
    pub fn takes_delta(self) -> bool {
        !matches!(self, ChangeMode::Delete | ChangeMode::Reset)
    }
}

impl fmt::Display for ChangeMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ChangeMode::Set => "set",
            ChangeMode::Add => "add",
            ChangeMode::Remove => "remove",
            ChangeMode::RemoveAll => "remove all",
            ChangeMode::Delete => "delete",
            ChangeMode::Reset => "reset",
        };
        f.write_str(name)
    }
}

/// Mutates values of one type on behalf of nodes that return it.
pub trait Changer: Send + Sync {
    /// Types a delta must have for `mode`, or `None` if the mode is unsupported.
    /// Return `[object]` to accept delete/reset.
    fn accept_change(&self, mode: ChangeMode) -> Option<Vec<TypeKey>>;

    /// Apply `mode` to every value in `what`. Only called with an approved
    /// mode and delta shape.
    fn change(&self, what: &[Value], delta: Option<&[Value]>, mode: ChangeMode) -> Result<()>;
}
