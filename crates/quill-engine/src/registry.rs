//! The sealed pair of registries a host runs against
use crate::manifest::Manifest;
use crate::report::RegistryReport;
use quill_core::{EngineConfig, QuillError, Result, Verbosity};
use quill_syntax::SyntaxRegistry;
use quill_types::TypeRegistry;
use std::sync::Arc;
use tracing::{debug, info};

/// Types and syntax behind one seal flag.
///
/// Mutable access is for registration steps only; once sealed both halves
/// reject every registration and the whole registry is shared read-only.
#[derive(Debug)]
pub struct Registry {
    types: TypeRegistry,
    syntax: SyntaxRegistry,
    config: EngineConfig,
    report: Option<RegistryReport>,
}

impl Registry {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            types: TypeRegistry::new(),
            syntax: SyntaxRegistry::new(),
            config,
            report: None,
        }
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn syntax(&self) -> &SyntaxRegistry {
        &self.syntax
    }

    pub fn types_mut(&mut self) -> &mut TypeRegistry {
        &mut self.types
    }

    pub fn syntax_mut(&mut self) -> &mut SyntaxRegistry {
        &mut self.syntax
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_sealed(&self) -> bool {
        self.types.is_sealed() && self.syntax.is_sealed()
    }

    /// Validate patterns, seal both registries and fingerprint the result.
    /// Every check runs before either half is sealed, so a failure leaves
    /// both halves open.
    pub fn seal(&mut self) -> Result<()> {
        if self.is_sealed() {
            return Err(QuillError::config("registry is already sealed"));
        }
        if self.types.is_sealed() {
            return Err(QuillError::config("type registry was sealed outside the registry"));
        }
        if self.syntax.is_sealed() {
            return Err(QuillError::config("syntax registry was sealed outside the registry"));
        }
        if self.config.validate_patterns {
            self.syntax.validate_patterns(&self.types)?;
        }
        self.types.seal()?;
        self.syntax.seal()?;

        let report = RegistryReport::build(&self.types, &self.syntax)?;
        if self.config.logs(Verbosity::Normal) {
            info!(
                types = report.types.len(),
                converters = report.converters.len(),
                syntax = report.syntax.len(),
                fingerprint = %report.fingerprint,
                "registry sealed"
            );
        }
        if self.config.log_registry_order || self.config.is_debug() {
            let order: Vec<&str> = self.types.sorted_types().iter().map(|k| k.as_str()).collect();
            debug!(order = ?order, "all registered types in order");
        }
        self.report = Some(report);
        Ok(())
    }

    /// Set once sealed.
    pub fn report(&self) -> Option<&RegistryReport> {
        self.report.as_ref()
    }

    pub fn fingerprint(&self) -> Option<&str> {
        self.report.as_ref().map(|r| r.fingerprint.as_str())
    }
}

/// Run `manifest` against a fresh registry and seal it. Any error aborts
/// startup.
pub fn startup(config: EngineConfig, manifest: Manifest) -> Result<Arc<Registry>> {
    info!(steps = manifest.len(), verbosity = ?config.verbosity, "starting registration");
    let mut registry = Registry::new(config);
    manifest.run(&mut registry)?;
    registry.seal()?;
    Ok(Arc::new(registry))
}
