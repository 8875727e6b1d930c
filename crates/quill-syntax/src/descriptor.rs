//! Syntax descriptors and their kinds
use crate::pattern::{placeholders, Placeholder};
use crate::statement::{Element, InitArgs, Producer};
use quill_core::{QuillError, Result, TypeKey};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How specific an expression's patterns are. Lower ranks are matched first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpressionRank {
    /// Fixed wording with no sub-expressions
    Simple,
    /// "<property> of <owner>" and "<owner>'s <property>"
    Property,
    Normal,
    /// Patterns that start or end with a placeholder
    Combined,
    /// Patterns that would otherwise match any input
    PatternMatchesEverything,
}

impl ExpressionRank {
    pub const ALL: [ExpressionRank; 5] = [
        ExpressionRank::Simple,
        ExpressionRank::Property,
        ExpressionRank::Normal,
        ExpressionRank::Combined,
        ExpressionRank::PatternMatchesEverything,
    ];
    pub const COUNT: usize = Self::ALL.len();

    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxKind {
    Condition,
    Effect,
    Expression { rank: ExpressionRank, return_type: TypeKey },
    /// Host event kinds the matcher listens to
    Event { events: Vec<String> },
}

impl SyntaxKind {
    pub fn name(&self) -> &'static str {
        match self {
            SyntaxKind::Condition => "condition",
            SyntaxKind::Effect => "effect",
            SyntaxKind::Expression { .. } => "expression",
            SyntaxKind::Event { .. } => "event",
        }
    }

    pub fn is_statement(&self) -> bool {
        matches!(self, SyntaxKind::Condition | SyntaxKind::Effect)
    }
}

#[derive(Clone)]
pub struct SyntaxDescriptor {
    name: String,
    patterns: Vec<String>,
    producer: Producer,
    kind: SyntaxKind,
}

impl SyntaxDescriptor {
    pub fn new(name: impl Into<String>, kind: SyntaxKind, patterns: Vec<String>, producer: Producer) -> Self {
        Self {
            name: name.into(),
            patterns,
            producer,
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn kind(&self) -> &SyntaxKind {
        &self.kind
    }

    pub fn rank(&self) -> Option<ExpressionRank> {
        match &self.kind {
            SyntaxKind::Expression { rank, .. } => Some(*rank),
            _ => None,
        }
    }

    pub fn return_type(&self) -> Option<&TypeKey> {
        match &self.kind {
            SyntaxKind::Expression { return_type, .. } => Some(return_type),
            _ => None,
        }
    }

    /// Placeholders of every pattern, by pattern index.
    pub fn placeholders(&self) -> Result<Vec<Vec<Placeholder>>> {
        self.patterns.iter().map(|p| placeholders(p)).collect()
    }

    /// Run the producer. The element must match the descriptor's kind.
    pub fn produce(&self, args: InitArgs<'_>) -> Result<Element> {
        let element = (self.producer)(args)?;
        if element.kind_name() != self.kind.name() {
            return Err(QuillError::config(format!(
                "{} '{}' produced a {}",
                self.kind.name(),
                self.name,
                element.kind_name()
            )));
        }
        Ok(element)
    }
}

impl fmt::Debug for SyntaxDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("SyntaxDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("patterns", &self.patterns)
            .finish()
    }
}
