//! What producers build: conditions, effects, expressions and event matchers
use quill_core::{ExecutionContext, Kleenean, Result};
use quill_expr::ExprRef;
use quill_types::TypeRegistry;
use std::sync::Arc;

/// A boolean test over the current event.
pub trait Condition: Send + Sync {
    fn check(&self, ctx: &ExecutionContext, types: &TypeRegistry) -> bool;

    fn is_negated(&self) -> bool {
        false
    }

    fn children(&self) -> Vec<ExprRef> {
        Vec::new()
    }

    fn describe(&self, ctx: Option<&ExecutionContext>, debug: bool) -> String;
}

/// A statement run for its side effects.
pub trait Effect: Send + Sync {
    fn execute(&self, ctx: &ExecutionContext, types: &TypeRegistry) -> Result<()>;

    fn children(&self) -> Vec<ExprRef> {
        Vec::new()
    }

    fn describe(&self, ctx: Option<&ExecutionContext>, debug: bool) -> String;
}

/// Decides whether a host event starts a trigger.
pub trait EventMatcher: Send + Sync {
    fn matches(&self, ctx: &ExecutionContext) -> bool;

    fn describe(&self, ctx: Option<&ExecutionContext>, debug: bool) -> String;
}

/// A built syntax element.
#[derive(Clone)]
pub enum Element {
    Condition(Arc<dyn Condition>),
    Effect(Arc<dyn Effect>),
    Expression(ExprRef),
    Event(Arc<dyn EventMatcher>),
}

impl Element {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Element::Condition(_) => "condition",
            Element::Effect(_) => "effect",
            Element::Expression(_) => "expression",
            Element::Event(_) => "event",
        }
    }

    pub fn into_expression(self) -> Option<ExprRef> {
        match self {
            Element::Expression(expr) => Some(expr),
            _ => None,
        }
    }

    /// Expressions directly held by the element.
    pub fn children(&self) -> Vec<ExprRef> {
        match self {
            Element::Condition(c) => c.children(),
            Element::Effect(e) => e.children(),
            Element::Expression(expr) => vec![Arc::clone(expr)],
            Element::Event(_) => Vec::new(),
        }
    }

    pub fn describe(&self, ctx: Option<&ExecutionContext>, debug: bool) -> String {
        match self {
            Element::Condition(c) => c.describe(ctx, debug),
            Element::Effect(e) => e.describe(ctx, debug),
            Element::Expression(expr) => expr.describe(ctx, debug),
            Element::Event(m) => m.describe(ctx, debug),
        }
    }
}

/// Builds an element from a successful match.
pub type Producer = Arc<dyn Fn(InitArgs<'_>) -> Result<Element> + Send + Sync>;

/// Everything a producer learns about the match.
pub struct InitArgs<'a> {
    /// Sealed registry, for converting sub-expressions
    pub types: &'a TypeRegistry,
    /// One slot per placeholder, `None` where an optional one was left out
    pub exprs: Vec<Option<ExprRef>>,
    /// Index of the matched pattern within the descriptor
    pub matched_pattern: usize,
    /// Whether a delay may have happened before this element
    pub delay: Kleenean,
    /// Parse marks set by the matched pattern
    pub marks: i32,
}

impl<'a> InitArgs<'a> {
    pub fn new(types: &'a TypeRegistry, exprs: Vec<Option<ExprRef>>) -> Self {
        Self {
            types,
            exprs,
            matched_pattern: 0,
            delay: Kleenean::False,
            marks: 0,
        }
    }

    pub fn with_pattern(mut self, index: usize) -> Self {
        self.matched_pattern = index;
        self
    }

    pub fn with_delay(mut self, delay: Kleenean) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_marks(mut self, marks: i32) -> Self {
        self.marks = marks;
        self
    }

    pub fn expr(&self, index: usize) -> Option<&ExprRef> {
        self.exprs.get(index).and_then(Option::as_ref)
    }
}
