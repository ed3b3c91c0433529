//! Parse configuration.

use std::fmt;
use std::sync::Arc;

use sgml_scanner::{DEFAULT_MAX_DEPTH, EntityResolver, FileResolver};

/// Name of the source holding [`ParseOptions::subset`] in error contexts.
pub const SUBSET_NAME: &str = "[subset]";

/// Options for parsing a DTD.
///
/// Built with [`Default`] and the chained setters:
///
/// ```
/// use sgml_dtd::ParseOptions;
///
/// let options = ParseOptions::default()
///     .name("HTML")
///     .system_id("html.dtd")
///     .lenient_entities(true);
/// assert_eq!(options.name.as_deref(), Some("HTML"));
/// ```
#[derive(Clone)]
pub struct ParseOptions {
    /// Document type name. A DOCTYPE declaration binds it if unset.
    pub name: Option<String>,

    /// Base URI relative system identifiers resolve against.
    pub base_uri: Option<String>,

    /// Public identifier of the external subset.
    pub public_id: Option<String>,

    /// System identifier of the external subset.
    pub system_id: Option<String>,

    /// Internal subset text, read before the external subset.
    pub subset: Option<String>,

    /// Supplies the bytes of external entities.
    pub resolver: Arc<dyn EntityResolver>,

    /// Log and skip declaration-level parameter entity references whose
    /// content cannot be opened, instead of failing.
    pub lenient_entities: bool,

    /// Maximum number of simultaneously open sources.
    pub max_entity_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            name: None,
            base_uri: None,
            public_id: None,
            system_id: None,
            subset: None,
            resolver: Arc::new(FileResolver),
            lenient_entities: false,
            max_entity_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl fmt::Debug for ParseOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseOptions")
            .field("name", &self.name)
            .field("base_uri", &self.base_uri)
            .field("public_id", &self.public_id)
            .field("system_id", &self.system_id)
            .field("subset", &self.subset)
            .field("lenient_entities", &self.lenient_entities)
            .field("max_entity_depth", &self.max_entity_depth)
            .finish_non_exhaustive()
    }
}

impl ParseOptions {
    /// Set the document type name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the base URI for relative system identifiers.
    pub fn base_uri(mut self, uri: impl Into<String>) -> Self {
        self.base_uri = Some(uri.into());
        self
    }

    /// Set the external subset's public identifier.
    pub fn public_id(mut self, id: impl Into<String>) -> Self {
        self.public_id = Some(id.into());
        self
    }

    /// Set the external subset's system identifier.
    pub fn system_id(mut self, id: impl Into<String>) -> Self {
        self.system_id = Some(id.into());
        self
    }

    /// Set the internal subset text.
    pub fn subset(mut self, text: impl Into<String>) -> Self {
        self.subset = Some(text.into());
        self
    }

    /// Read external entities through `resolver`.
    pub fn resolver(mut self, resolver: impl EntityResolver + 'static) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    /// Skip unreadable declaration-level parameter entities.
    pub fn lenient_entities(mut self, lenient: bool) -> Self {
        self.lenient_entities = lenient;
        self
    }

    /// Bound the number of simultaneously open sources.
    pub fn max_entity_depth(mut self, depth: usize) -> Self {
        self.max_entity_depth = depth;
        self
    }
}
