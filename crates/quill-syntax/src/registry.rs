//! Syntax Registry
use crate::descriptor::{ExpressionRank, SyntaxDescriptor, SyntaxKind};
use crate::statement::{Condition, Effect, Element, EventMatcher, InitArgs, Producer};
use quill_core::{QuillError, Result, TypeKey};
use quill_expr::Expression;
use quill_types::TypeRegistry;
use std::sync::Arc;
use tracing::{debug, info};

/// Descriptors by kind. Expressions are grouped by rank, most specific
/// first, and keep registration order within a rank.
#[derive(Debug, Default)]
pub struct SyntaxRegistry {
    sealed: bool,
    expressions: Vec<SyntaxDescriptor>,
    /// `rank_ends[r]` is one past the last expression of rank `r`
    rank_ends: [usize; ExpressionRank::COUNT],
    statements: Vec<SyntaxDescriptor>,
    events: Vec<SyntaxDescriptor>,
}

fn to_patterns<S: Into<String>>(patterns: impl IntoIterator<Item = S>) -> Vec<String> {
    patterns.into_iter().map(Into::into).collect()
}

impl SyntaxRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: SyntaxDescriptor) -> Result<()> {
        if self.sealed {
            return Err(QuillError::config(format!(
                "cannot register {} '{}': registering is disabled after seal",
                descriptor.kind().name(),
                descriptor.name()
            )));
        }
        if descriptor.patterns().is_empty() {
            return Err(QuillError::config(format!(
                "{} '{}' has no patterns",
                descriptor.kind().name(),
                descriptor.name()
            )));
        }

        debug!(
            kind = descriptor.kind().name(),
            name = descriptor.name(),
            patterns = descriptor.patterns().len(),
            "registered syntax"
        );

        if let Some(rank) = descriptor.rank() {
            let rank = rank.index();
            self.expressions.insert(self.rank_ends[rank], descriptor);
            for end in &mut self.rank_ends[rank..] {
                *end += 1;
            }
        } else if descriptor.kind().is_statement() {
            self.statements.push(descriptor);
        } else {
            self.events.push(descriptor);
        }
        Ok(())
    }

    pub fn register_condition<S, C, F>(
        &mut self,
        name: &str,
        patterns: impl IntoIterator<Item = S>,
        init: F,
    ) -> Result<()>
    where
        S: Into<String>,
        C: Condition + 'static,
        F: Fn(InitArgs<'_>) -> Result<C> + Send + Sync + 'static,
    {
        let producer: Producer = Arc::new(move |args: InitArgs<'_>| Ok(Element::Condition(Arc::new(init(args)?))));
        self.register(SyntaxDescriptor::new(name, SyntaxKind::Condition, to_patterns(patterns), producer))
    }

    pub fn register_effect<S, E, F>(&mut self, name: &str, patterns: impl IntoIterator<Item = S>, init: F) -> Result<()>
    where
        S: Into<String>,
        E: Effect + 'static,
        F: Fn(InitArgs<'_>) -> Result<E> + Send + Sync + 'static,
    {
        let producer: Producer = Arc::new(move |args: InitArgs<'_>| Ok(Element::Effect(Arc::new(init(args)?))));
        self.register(SyntaxDescriptor::new(name, SyntaxKind::Effect, to_patterns(patterns), producer))
    }

    pub fn register_expression<S, X, F>(
        &mut self,
        name: &str,
        return_type: impl Into<TypeKey>,
        rank: ExpressionRank,
        patterns: impl IntoIterator<Item = S>,
        init: F,
    ) -> Result<()>
    where
        S: Into<String>,
        X: Expression + 'static,
        F: Fn(InitArgs<'_>) -> Result<X> + Send + Sync + 'static,
    {
        let kind = SyntaxKind::Expression {
            rank,
            return_type: return_type.into(),
        };
        let producer: Producer = Arc::new(move |args: InitArgs<'_>| Ok(Element::Expression(Arc::new(init(args)?))));
        self.register(SyntaxDescriptor::new(name, kind, to_patterns(patterns), producer))
    }

    pub fn register_event<S, M, F>(
        &mut self,
        name: &str,
        events: &[&str],
        patterns: impl IntoIterator<Item = S>,
        init: F,
    ) -> Result<()>
    where
        S: Into<String>,
        M: EventMatcher + 'static,
        F: Fn(InitArgs<'_>) -> Result<M> + Send + Sync + 'static,
    {
        let kind = SyntaxKind::Event {
            events: events.iter().map(|e| e.to_string()).collect(),
        };
        let producer: Producer = Arc::new(move |args: InitArgs<'_>| Ok(Element::Event(Arc::new(init(args)?))));
        self.register(SyntaxDescriptor::new(name, kind, to_patterns(patterns), producer))
    }

    /// Every expression descriptor, in matching order.
    pub fn all_expressions(&self) -> &[SyntaxDescriptor] {
        &self.expressions
    }

    /// Expression descriptors able to yield one of `filter`, in matching
    /// order. A descriptor passes if it returns `object` (it may yield
    /// anything) or its return type converts to a filter type.
    pub fn expressions<'a>(
        &'a self,
        filter: &'a [TypeKey],
        types: &'a TypeRegistry,
    ) -> impl Iterator<Item = &'a SyntaxDescriptor> + 'a {
        self.expressions.iter().filter(move |d| match d.return_type() {
            Some(ty) => ty.is_object() || filter.iter().any(|t| types.converter_exists(ty, t)),
            None => false,
        })
    }

    /// Conditions and effects, interleaved in registration order.
    pub fn statements(&self) -> &[SyntaxDescriptor] {
        &self.statements
    }

    pub fn conditions(&self) -> impl Iterator<Item = &SyntaxDescriptor> {
        self.statements.iter().filter(|d| *d.kind() == SyntaxKind::Condition)
    }

    pub fn effects(&self) -> impl Iterator<Item = &SyntaxDescriptor> {
        self.statements.iter().filter(|d| *d.kind() == SyntaxKind::Effect)
    }

    pub fn events(&self) -> &[SyntaxDescriptor] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.expressions.len() + self.statements.len() + self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn descriptors(&self) -> impl Iterator<Item = &SyntaxDescriptor> {
        self.events.iter().chain(&self.statements).chain(&self.expressions)
    }

    /// Every placeholder must name a registered type.
    pub fn validate_patterns(&self, types: &TypeRegistry) -> Result<()> {
        for descriptor in self.descriptors() {
            for (index, found) in descriptor.placeholders()?.iter().enumerate() {
                for placeholder in found {
                    if let Some(name) = placeholder.names.iter().find(|n| types.resolve_name(n).is_none()) {
                        return Err(QuillError::config(format!(
                            "{} '{}' pattern {} names unknown type '{}'",
                            descriptor.kind().name(),
                            descriptor.name(),
                            index,
                            name
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn seal(&mut self) -> Result<()> {
        if self.sealed {
            return Err(QuillError::config("syntax registry is already sealed"));
        }
        self.sealed = true;
        info!(
            expressions = self.expressions.len(),
            statements = self.statements.len(),
            events = self.events.len(),
            "syntax registry sealed"
        );
        Ok(())
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::{ExecutionContext, Value};
    use quill_expr::Literal;
    use quill_types::TypeDescriptor;

    struct Noop;

    impl Effect for Noop {
        fn execute(&self, _ctx: &ExecutionContext, _types: &TypeRegistry) -> Result<()> {
            Ok(())
        }

        fn describe(&self, _ctx: Option<&ExecutionContext>, _debug: bool) -> String {
            "noop".to_string()
        }
    }

    struct Always;

    impl Condition for Always {
        fn check(&self, _ctx: &ExecutionContext, _types: &TypeRegistry) -> bool {
            true
        }

        fn describe(&self, _ctx: Option<&ExecutionContext>, _debug: bool) -> String {
            "always".to_string()
        }
    }

    fn literal(ty: &'static str) -> impl Fn(InitArgs<'_>) -> Result<Literal> + Send + Sync + 'static {
        move |_args: InitArgs<'_>| Ok(Literal::new(ty, Vec::<Value>::new()))
    }

    fn names<'a>(descriptors: impl IntoIterator<Item = &'a SyntaxDescriptor>) -> Vec<&'a str> {
        descriptors.into_iter().map(|d| d.name()).collect()
    }

    #[test]
    fn test_rank_grouping_ignores_call_order() {
        let mut syntax = SyntaxRegistry::new();
        syntax
            .register_expression("a", "integer", ExpressionRank::Normal, ["a %integer%"], literal("integer"))
            .unwrap();
        syntax
            .register_expression("b", "integer", ExpressionRank::Simple, ["b"], literal("integer"))
            .unwrap();
        syntax
            .register_expression("c", "integer", ExpressionRank::Property, ["c of %integer%"], literal("integer"))
            .unwrap();
        syntax
            .register_expression("d", "integer", ExpressionRank::Simple, ["d"], literal("integer"))
            .unwrap();

        assert_eq!(names(syntax.all_expressions()), vec!["b", "d", "c", "a"]);
    }

    #[test]
    fn test_statements_interleave() {
        let mut syntax = SyntaxRegistry::new();
        syntax.register_effect("e1", ["first"], |_| Ok(Noop)).unwrap();
        syntax.register_condition("c1", ["second"], |_| Ok(Always)).unwrap();
        syntax.register_effect("e2", ["third"], |_| Ok(Noop)).unwrap();

        assert_eq!(names(syntax.statements()), vec!["e1", "c1", "e2"]);
        assert_eq!(names(syntax.effects()), vec!["e1", "e2"]);
        assert_eq!(names(syntax.conditions()), vec!["c1"]);
    }

    #[test]
    fn test_expression_filter() {
        let mut types = TypeRegistry::new();
        types.register_type(TypeDescriptor::new::<i64>("integer")).unwrap();
        types.register_type(TypeDescriptor::new::<String>("text")).unwrap();
        types.register_type(TypeDescriptor::new::<bool>("boolean")).unwrap();
        types
            .register_converter("integer", "text", |i: &i64| Some(i.to_string()))
            .unwrap();
        types.seal().unwrap();

        let mut syntax = SyntaxRegistry::new();
        syntax
            .register_expression("count", "integer", ExpressionRank::Simple, ["count"], literal("integer"))
            .unwrap();
        syntax
            .register_expression("flag", "boolean", ExpressionRank::Simple, ["flag"], literal("boolean"))
            .unwrap();
        syntax
            .register_expression("anything", "object", ExpressionRank::Normal, ["%object%"], literal("object"))
            .unwrap();

        let text = [TypeKey::new("text")];
        assert_eq!(names(syntax.expressions(&text, &types)), vec!["count", "anything"]);
        let flags = [TypeKey::new("boolean")];
        assert_eq!(names(syntax.expressions(&flags, &types)), vec!["flag", "anything"]);
    }

    #[test]
    fn test_seal_boundary() {
        let mut syntax = SyntaxRegistry::new();
        syntax.seal().unwrap();
        assert!(syntax.seal().unwrap_err().is_configuration());
        assert!(syntax.register_effect("late", ["late"], |_| Ok(Noop)).is_err());
        assert!(syntax.is_empty());
    }

    #[test]
    fn test_validate_patterns() {
        let mut types = TypeRegistry::new();
        types.register_type(TypeDescriptor::new::<i64>("integer")).unwrap();
        types.seal().unwrap();

        let mut syntax = SyntaxRegistry::new();
        syntax.register_effect("add", ["add %integers% to %-integer%"], |_| Ok(Noop)).unwrap();
        assert!(syntax.validate_patterns(&types).is_ok());

        syntax.register_effect("grow", ["grow %structuretype%"], |_| Ok(Noop)).unwrap();
        let err = syntax.validate_patterns(&types).unwrap_err();
        assert!(err.to_string().contains("structuretype"));
    }

    #[test]
    fn test_empty_patterns_rejected() {
        let mut syntax = SyntaxRegistry::new();
        let none: [&str; 0] = [];
        assert!(syntax.register_condition("bare", none, |_| Ok(Always)).is_err());
    }
}
