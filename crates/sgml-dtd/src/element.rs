//! Element declarations and their attribute definitions.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::content::same_name;
use crate::{ContentModel, SgmlDtd};

/// Declared type of an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
#[repr(u8)]
pub enum AttributeType {
    CData,
    Entity,
    Entities,
    Id,
    IdRef,
    IdRefs,
    Name,
    Names,
    NmToken,
    NmTokens,
    Number,
    Numbers,
    NuToken,
    NuTokens,
    /// `NOTATION (a|b)`
    Notation,
    /// `(a|b|c)`
    Enumeration,
}

impl AttributeType {
    /// Parse a type keyword. Enumerations have no keyword; `NOTATION` is
    /// accepted here but needs its name group supplied separately.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword.to_ascii_uppercase().as_str() {
            "CDATA" => AttributeType::CData,
            "ENTITY" => AttributeType::Entity,
            "ENTITIES" => AttributeType::Entities,
            "ID" => AttributeType::Id,
            "IDREF" => AttributeType::IdRef,
            "IDREFS" => AttributeType::IdRefs,
            "NAME" => AttributeType::Name,
            "NAMES" => AttributeType::Names,
            "NMTOKEN" => AttributeType::NmToken,
            "NMTOKENS" => AttributeType::NmTokens,
            "NUMBER" => AttributeType::Number,
            "NUMBERS" => AttributeType::Numbers,
            "NUTOKEN" => AttributeType::NuToken,
            "NUTOKENS" => AttributeType::NuTokens,
            "NOTATION" => AttributeType::Notation,
            _ => return None,
        })
    }

    /// The declaration keyword; `ENUMERATION` for a bare name group.
    pub fn as_str(self) -> &'static str {
        match self {
            AttributeType::CData => "CDATA",
            AttributeType::Entity => "ENTITY",
            AttributeType::Entities => "ENTITIES",
            AttributeType::Id => "ID",
            AttributeType::IdRef => "IDREF",
            AttributeType::IdRefs => "IDREFS",
            AttributeType::Name => "NAME",
            AttributeType::Names => "NAMES",
            AttributeType::NmToken => "NMTOKEN",
            AttributeType::NmTokens => "NMTOKENS",
            AttributeType::Number => "NUMBER",
            AttributeType::Numbers => "NUMBERS",
            AttributeType::NuToken => "NUTOKEN",
            AttributeType::NuTokens => "NUTOKENS",
            AttributeType::Notation => "NOTATION",
            AttributeType::Enumeration => "ENUMERATION",
        }
    }

    /// Whether values come from an enumerated name group.
    pub fn is_enumerated(self) -> bool {
        matches!(self, AttributeType::Notation | AttributeType::Enumeration)
    }
}

/// Whether an attribute must be given, and what happens if it isn't.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
#[repr(u8)]
pub enum AttributePresence {
    /// A default value is given.
    #[default]
    Default,
    /// `#FIXED`: the default is the only permitted value.
    Fixed,
    /// `#REQUIRED`
    Required,
    /// `#IMPLIED`
    Implied,
}

impl AttributePresence {
    /// Parse the keyword after `#`.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_uppercase().as_str() {
            "FIXED" => Some(AttributePresence::Fixed),
            "REQUIRED" => Some(AttributePresence::Required),
            "IMPLIED" => Some(AttributePresence::Implied),
            _ => None,
        }
    }

    /// Whether a default value follows the keyword.
    pub fn has_default(self) -> bool {
        matches!(self, AttributePresence::Default | AttributePresence::Fixed)
    }
}

/// One attribute definition from an ATTLIST declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
pub struct AttDef {
    pub name: String,
    pub attribute_type: AttributeType,
    /// Permitted values; only for `Enumeration` and `Notation`.
    pub enum_values: Option<Vec<String>>,
    pub presence: AttributePresence,
    pub default_value: Option<String>,
}

impl AttDef {
    /// A definition with no default value.
    pub fn new(name: impl Into<String>, attribute_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attribute_type,
            enum_values: None,
            presence: AttributePresence::Default,
            default_value: None,
        }
    }

    /// An enumerated definition; `attribute_type` is `Enumeration` or `Notation`.
    pub fn enumerated(
        name: impl Into<String>,
        attribute_type: AttributeType,
        values: Vec<String>,
    ) -> Self {
        Self {
            enum_values: Some(values),
            ..Self::new(name, attribute_type)
        }
    }
}

/// Attribute definitions of one element, in declaration order.
///
/// Names are compared case-insensitively. The first definition of a name
/// wins, both within one ATTLIST and across several.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeTable {
    defs: Vec<AttDef>,
    index: HashMap<String, usize>,
}

impl AttributeTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `def` unless its name is already defined. Returns whether it was added.
    pub fn insert(&mut self, def: AttDef) -> bool {
        let key = def.name.to_uppercase();
        if self.index.contains_key(&key) {
            return false;
        }
        self.index.insert(key, self.defs.len());
        self.defs.push(def);
        true
    }

    /// Add every definition of `other` whose name is not yet defined.
    ///
    /// Returns the names that were already present and so ignored.
    pub fn merge(&mut self, other: &AttributeTable) -> Vec<String> {
        other
            .defs
            .iter()
            .filter(|def| !self.insert((*def).clone()))
            .map(|def| def.name.clone())
            .collect()
    }

    /// Look up a definition, ignoring case.
    pub fn get(&self, name: &str) -> Option<&AttDef> {
        self.index
            .get(&name.to_uppercase())
            .map(|&i| &self.defs[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttDef> {
        self.defs.iter()
    }

    /// Number of definitions.
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

impl<'a> IntoIterator for &'a AttributeTable {
    type Item = &'a AttDef;
    type IntoIter = std::slice::Iter<'a, AttDef>;

    fn into_iter(self) -> Self::IntoIter {
        self.defs.iter()
    }
}

/// One `<!ELEMENT>` declaration, for one element name.
///
/// Elements declared together in a name group share one content model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementDecl {
    name: String,
    start_tag_optional: bool,
    end_tag_optional: bool,
    content_model: Arc<ContentModel>,
    inclusions: Option<Vec<String>>,
    exclusions: Option<Vec<String>>,
    attributes: Option<AttributeTable>,
}

impl ElementDecl {
    /// A declaration with no attribute table yet.
    pub fn new(
        name: impl Into<String>,
        start_tag_optional: bool,
        end_tag_optional: bool,
        content_model: Arc<ContentModel>,
        inclusions: Option<Vec<String>>,
        exclusions: Option<Vec<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            start_tag_optional,
            end_tag_optional,
            content_model,
            inclusions,
            exclusions,
            attributes: None,
        }
    }

    /// Upper-cased element name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `O` in the first omission flag.
    pub fn start_tag_optional(&self) -> bool {
        self.start_tag_optional
    }

    /// `O` in the second omission flag.
    pub fn end_tag_optional(&self) -> bool {
        self.end_tag_optional
    }

    /// Content model, shared with the other names of the same declaration.
    pub fn content_model(&self) -> &Arc<ContentModel> {
        &self.content_model
    }

    /// Elements allowed anywhere inside this one: `+(…)`.
    pub fn inclusions(&self) -> Option<&[String]> {
        self.inclusions.as_deref()
    }

    /// Elements forbidden anywhere inside this one: `-(…)`.
    pub fn exclusions(&self) -> Option<&[String]> {
        self.exclusions.as_deref()
    }

    /// `None` if no ATTLIST named this element.
    pub fn attributes(&self) -> Option<&AttributeTable> {
        self.attributes.as_ref()
    }

    /// Look up an attribute, ignoring case.
    pub fn find_attribute(&self, name: &str) -> Option<&AttDef> {
        self.attributes.as_ref()?.get(name)
    }

    /// Merge an ATTLIST's definitions into this element's table; returns the
    /// names that were already defined.
    pub(crate) fn add_attributes(&mut self, table: &AttributeTable) -> Vec<String> {
        match &mut self.attributes {
            Some(existing) => existing.merge(table),
            None => {
                self.attributes = Some(table.clone());
                Vec::new()
            }
        }
    }

    /// Whether this element may contain an element named `name`.
    ///
    /// Exclusions are checked first, then inclusions, then the content model.
    /// Children whose start tag is optional are searched as well, since their
    /// own content could appear here once the tag is omitted. This is an
    /// approximation: inclusions and exclusions of enclosing elements do not
    /// propagate into nested ones.
    pub fn can_contain(&self, name: &str, dtd: &SgmlDtd) -> bool {
        self.can_contain_within(name, dtd, &mut HashSet::new())
    }

    /// `visited` holds the elements already searched in this query.
    pub(crate) fn can_contain_within(
        &self,
        name: &str,
        dtd: &SgmlDtd,
        visited: &mut HashSet<String>,
    ) -> bool {
        if !visited.insert(self.name.clone()) {
            return false;
        }
        if let Some(exclusions) = &self.exclusions {
            if exclusions.iter().any(|s| same_name(s, name)) {
                return false;
            }
        }
        if let Some(inclusions) = &self.inclusions {
            if inclusions.iter().any(|s| same_name(s, name)) {
                return true;
            }
        }
        self.content_model.can_contain_within(name, dtd, visited)
    }
}
