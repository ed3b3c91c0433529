//! Entity records: the named text a character source can be opened on.

/// How the replacement text of an internal entity is to be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
#[repr(u8)]
pub enum LiteralType {
    /// Character data, no markup recognized.
    CData,
    /// System-specific data.
    SData,
    /// Processing instruction text.
    Pi,
}

impl LiteralType {
    /// Parse a literal type keyword (`CDATA`, `SDATA`, `PI`), ignoring case.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_uppercase().as_str() {
            "CDATA" => Some(LiteralType::CData),
            "SDATA" => Some(LiteralType::SData),
            "PI" => Some(LiteralType::Pi),
            _ => None,
        }
    }

    /// The declaration keyword for this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            LiteralType::CData => "CDATA",
            LiteralType::SData => "SDATA",
            LiteralType::Pi => "PI",
        }
    }
}

/// Where an entity's text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityKind {
    /// Replacement text given inline in the declaration.
    Internal {
        /// The literal text, character references already expanded.
        literal: String,
    },
    /// Text fetched through an [`EntityResolver`](crate::EntityResolver).
    External {
        /// `PUBLIC` identifier, if any.
        public_id: Option<String>,
        /// System identifier (a URI, possibly relative).
        system_id: Option<String>,
    },
}

/// A named entity, general or parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    name: String,
    kind: EntityKind,
    literal_type: Option<LiteralType>,
}

impl Entity {
    /// An internal entity with the given replacement text.
    pub fn internal(name: impl Into<String>, literal: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntityKind::Internal {
                literal: literal.into(),
            },
            literal_type: None,
        }
    }

    /// An external entity identified by public and/or system identifier.
    pub fn external(
        name: impl Into<String>,
        public_id: Option<String>,
        system_id: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: EntityKind::External {
                public_id,
                system_id,
            },
            literal_type: None,
        }
    }

    /// Tag the entity's literal with a type keyword.
    pub fn with_literal_type(mut self, literal_type: LiteralType) -> Self {
        self.literal_type = Some(literal_type);
        self
    }

    /// Entity name as declared, without `%` or `;`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Where the entity's text comes from.
    pub fn kind(&self) -> &EntityKind {
        &self.kind
    }

    /// Whether the replacement text is given inline.
    pub fn is_internal(&self) -> bool {
        matches!(self.kind, EntityKind::Internal { .. })
    }

    /// Replacement text of an internal entity.
    pub fn literal(&self) -> Option<&str> {
        match &self.kind {
            EntityKind::Internal { literal } => Some(literal),
            EntityKind::External { .. } => None,
        }
    }

    /// `PUBLIC` identifier of an external entity.
    pub fn public_id(&self) -> Option<&str> {
        match &self.kind {
            EntityKind::External { public_id, .. } => public_id.as_deref(),
            EntityKind::Internal { .. } => None,
        }
    }

    /// System identifier of an external entity, as written.
    pub fn system_id(&self) -> Option<&str> {
        match &self.kind {
            EntityKind::External { system_id, .. } => system_id.as_deref(),
            EntityKind::Internal { .. } => None,
        }
    }

    /// Literal type keyword of an internal entity, if one was given.
    pub fn literal_type(&self) -> Option<LiteralType> {
        self.literal_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;

    #[test]
    fn test_literal_type_keywords() {
        assert_eq!(LiteralType::from_keyword("cdata"), Some(LiteralType::CData));
        assert_eq!(LiteralType::from_keyword("SDATA"), Some(LiteralType::SData));
        assert_eq!(LiteralType::from_keyword("PI"), Some(LiteralType::Pi));
        assert_eq!(LiteralType::from_keyword("PUBLIC"), None);
    }

    #[test]
    fn test_internal_and_external_accessors() {
        let e = Entity::internal("amp", "&").with_literal_type(LiteralType::CData);
        assert!(e.is_internal());
        assert_eq!(e.literal(), Some("&"));
        assert_eq!(e.system_id(), None);
        assert_eq!(e.literal_type(), Some(LiteralType::CData));

        let e = Entity::external(
            "HTMLlat1",
            Some("-//W3C//ENTITIES Latin1//EN".into()),
            Some("lat1.ent".into()),
        );
        assert!(!e.is_internal());
        assert_eq!(e.literal(), None);
        assert_eq!(e.public_id(), Some("-//W3C//ENTITIES Latin1//EN"));
        assert_eq!(e.system_id(), Some("lat1.ent"));
    }
}
