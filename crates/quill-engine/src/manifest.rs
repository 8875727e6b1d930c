//! Ordered registration steps run at startup
use crate::registry::Registry;
use quill_core::{QuillError, Result};
use tracing::debug;

type Step = Box<dyn FnOnce(&mut Registry) -> Result<()>>;

/// Registration calls in the order they must run. Replaces any kind of
/// discovery: whatever is not listed here is not registered.
#[derive(Default)]
pub struct Manifest {
    steps: Vec<(String, Step)>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in types, converters and comparators.
    pub fn standard() -> Self {
        Self::new().step("defaults", crate::defaults::register)
    }

    pub fn step(mut self, name: impl Into<String>, step: impl FnOnce(&mut Registry) -> Result<()> + 'static) -> Self {
        self.steps.push((name.into(), Box::new(step)));
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Run every step in order, stopping at the first failure. Configuration
    /// errors are prefixed with the failing step's name.
    pub fn run(self, registry: &mut Registry) -> Result<()> {
        for (name, step) in self.steps {
            debug!(step = %name, "running registration step");
            step(registry).map_err(|err| match err {
                QuillError::Configuration(msg) => QuillError::Configuration(format!("{}: {}", name, msg)),
                other => other,
            })?;
        }
        Ok(())
    }
}
