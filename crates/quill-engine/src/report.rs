//! Serializable snapshot of a sealed registry
use quill_core::{QuillError, Result, TypeKey, QUILL_VERSION};
use quill_syntax::{ExpressionRank, SyntaxDescriptor, SyntaxKind, SyntaxRegistry};
use quill_types::TypeRegistry;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeEntry {
    pub key: TypeKey,
    pub plural: String,
    pub user_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supertypes: Vec<TypeKey>,
    pub has_default: bool,
    pub has_changer: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConverterEntry {
    pub from: TypeKey,
    pub to: TypeKey,
    /// Types visited, endpoints included
    pub chain: Vec<TypeKey>,
    pub synthesized: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxEntry {
    pub name: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<ExpressionRank>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<TypeKey>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<String>,
    pub patterns: Vec<String>,
}

impl From<&SyntaxDescriptor> for SyntaxEntry {
    fn from(d: &SyntaxDescriptor) -> Self {
        let events = match d.kind() {
            SyntaxKind::Event { events } => events.clone(),
            _ => Vec::new(),
        };
        Self {
            name: d.name().to_string(),
            kind: d.kind().name().to_string(),
            rank: d.rank(),
            return_type: d.return_type().cloned(),
            events,
            patterns: d.patterns().to_vec(),
        }
    }
}

/// Everything registered, in the order the registries hand it out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryReport {
    pub version: String,
    /// Sorted descriptor order
    pub types: Vec<TypeEntry>,
    pub converters: Vec<ConverterEntry>,
    pub comparators: Vec<(TypeKey, TypeKey)>,
    /// Events, then statements, then expressions in matching order
    pub syntax: Vec<SyntaxEntry>,
    /// `blake3:<hex>` over the fields above
    pub fingerprint: String,
}

impl RegistryReport {
    pub fn build(types: &TypeRegistry, syntax: &SyntaxRegistry) -> Result<Self> {
        let type_entries = types
            .sorted_types()
            .iter()
            .filter_map(|k| types.descriptor(k))
            .map(|d| TypeEntry {
                key: d.key().clone(),
                plural: d.plural().to_string(),
                user_name: d.user_name().to_string(),
                supertypes: d.supertypes().to_vec(),
                has_default: d.has_default(),
                has_changer: d.changer().is_some(),
            })
            .collect();

        let converters = types
            .converters()
            .into_iter()
            .map(|e| ConverterEntry {
                from: e.from.clone(),
                to: e.to.clone(),
                chain: e.chain().to_vec(),
                synthesized: e.is_synthesized(),
            })
            .collect();

        let comparators = types.comparators().map(|c| (c.from.clone(), c.to.clone())).collect();

        let syntax_entries = syntax
            .events()
            .iter()
            .chain(syntax.statements())
            .chain(syntax.all_expressions())
            .map(SyntaxEntry::from)
            .collect();

        let mut report = Self {
            version: QUILL_VERSION.to_string(),
            types: type_entries,
            converters,
            comparators,
            syntax: syntax_entries,
            fingerprint: String::new(),
        };
        report.fingerprint = report.compute_fingerprint()?;
        Ok(report)
    }

    /// Hash of the catalog, independent of the fingerprint field itself.
    pub fn compute_fingerprint(&self) -> Result<String> {
        let catalog = (&self.version, &self.types, &self.converters, &self.comparators, &self.syntax);
        let bytes = serde_json::to_vec(&catalog)
            .map_err(|e| QuillError::config(format!("cannot serialize registry report: {}", e)))?;
        Ok(format!("blake3:{}", blake3::hash(&bytes)))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| QuillError::config(format!("cannot serialize registry report: {}", e)))
    }
}
