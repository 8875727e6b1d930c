//! Loaded scripts and their teardown
use chrono::{DateTime, Utc};
use quill_core::{ExecutionContext, Result};
use quill_expr::ExprRefExt;
use quill_syntax::Element;
use quill_types::TypeRegistry;
use std::sync::Arc;
use tracing::{info, warn};

/// What a teardown released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TeardownReport {
    pub nodes: usize,
    /// Roots still referenced from outside the trigger
    pub still_shared: usize,
}

/// One compiled script: its statements and the expressions they own.
pub struct Trigger {
    name: String,
    roots: Vec<Element>,
    loaded_at: DateTime<Utc>,
}

impl Trigger {
    pub fn new(name: impl Into<String>, roots: Vec<Element>) -> Self {
        Self {
            name: name.into(),
            roots,
            loaded_at: Utc::now(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn roots(&self) -> &[Element] {
        &self.roots
    }

    pub fn node_count(&self) -> usize {
        self.roots.iter().map(element_nodes).sum()
    }

    /// Run the statements in order. A failing condition or a revoked context
    /// stops the run; returns whether every statement ran.
    pub fn run(&self, ctx: &ExecutionContext, types: &TypeRegistry) -> Result<bool> {
        for root in &self.roots {
            if ctx.is_revoked() {
                return Ok(false);
            }
            match root {
                Element::Condition(c) => {
                    if !c.check(ctx, types) {
                        return Ok(false);
                    }
                }
                Element::Effect(e) => e.execute(ctx, types)?,
                Element::Expression(_) | Element::Event(_) => {}
            }
        }
        Ok(true)
    }

    /// Drop the compiled tree. Roots still held elsewhere are reported, not
    /// forced.
    pub fn teardown(self) -> TeardownReport {
        let nodes = self.node_count();
        let still_shared = self.roots.iter().filter(|r| strong_count(r) > 1).count();
        if still_shared > 0 {
            warn!(trigger = %self.name, still_shared, "trigger roots still referenced after unload");
        }
        info!(trigger = %self.name, nodes, "trigger unloaded");
        TeardownReport { nodes, still_shared }
    }
}

fn element_nodes(element: &Element) -> usize {
    match element {
        Element::Expression(expr) => expr.node_count(),
        other => 1 + other.children().iter().map(|c| c.node_count()).sum::<usize>(),
    }
}

fn strong_count(element: &Element) -> usize {
    match element {
        Element::Condition(c) => Arc::strong_count(c),
        Element::Effect(e) => Arc::strong_count(e),
        Element::Expression(x) => Arc::strong_count(x),
        Element::Event(m) => Arc::strong_count(m),
    }
}
