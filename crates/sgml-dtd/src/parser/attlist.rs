//! ATTLIST declarations.

use sgml_scanner::NameRule;
use tracing::{debug, warn};

use super::{Parser, describe};
use crate::{AttDef, AttributePresence, AttributeTable, AttributeType, DtdError, DtdErrorKind};

/// Ends an attribute type keyword.
const TYPE_TERMS: &str = " \r\n\t(";
/// Ends an attribute name, a presence keyword, a bare default value, or an
/// entity reference inside an ATTLIST.
const VALUE_TERMS: &str = " \r\n\t>";

impl Parser<'_> {
    /// `<!ATTLIST names definitions>`
    ///
    /// The definitions are merged into every named element's table; a name
    /// already defined for an element keeps its first definition.
    pub(super) fn parse_attlist_decl(&mut self) -> Result<(), DtdError> {
        self.skip_whitespace();
        let names = self.parse_name_group(NameRule::Name)?;

        let mut table = AttributeTable::new();
        self.parse_attribute_defs(&mut table)?;

        for name in &names {
            if !self.dtd.elements.contains(name) {
                return Err(self.error(DtdErrorKind::UndefinedElement { name: name.clone() }));
            }
        }
        self.expect_close("ATTLIST")?;

        for name in &names {
            let ignored = self
                .dtd
                .elements
                .get_mut(name)
                .map(|element| element.add_attributes(&table))
                .unwrap_or_default();
            for attribute in ignored {
                debug!(element = %name, %attribute, "attribute already defined, keeping the first definition");
            }
        }
        debug!(elements = ?names, attributes = table.len(), "ATTLIST");
        Ok(())
    }

    /// Definitions up to the closing `>`, which is left current.
    ///
    /// Parameter entity references may supply any part of a definition, or
    /// several definitions; each entity is closed when it runs out and
    /// parsing carries on in the source that referenced it.
    fn parse_attribute_defs(&mut self, table: &mut AttributeTable) -> Result<(), DtdError> {
        let base_depth = self.stack.depth();
        loop {
            match self.skip_attlist_separators(base_depth)? {
                Some('>') => return Ok(()),
                None => return Err(self.syntax("ATTLIST declaration was not closed")),
                Some(_) => {
                    let def = self.parse_attribute_def(base_depth)?;
                    let name = def.name.clone();
                    if !table.insert(def) {
                        warn!(attribute = %name, "duplicate attribute definition, keeping the first");
                    }
                }
            }
        }
    }

    /// Skip whitespace and `-- comments --`, opening referenced parameter
    /// entities and closing exhausted ones above `base_depth`.
    fn skip_attlist_separators(&mut self, base_depth: usize) -> Result<Option<char>, DtdError> {
        loop {
            match self.skip_declaration_comments()? {
                None if self.stack.depth() > base_depth => {
                    self.stack.pop();
                }
                Some('%') => {
                    let entity = self.parameter_entity_ref(VALUE_TERMS)?;
                    self.push_entity(&entity)?;
                }
                other => return Ok(other),
            }
        }
    }

    /// `name type default`
    fn parse_attribute_def(&mut self, base_depth: usize) -> Result<AttDef, DtdError> {
        let name = self.scan_token(VALUE_TERMS, NameRule::Name)?.to_uppercase();
        self.skip_attlist_separators(base_depth)?;
        let (attribute_type, enum_values) = self.parse_attribute_type(base_depth)?;
        self.skip_attlist_separators(base_depth)?;
        let (presence, default_value) = self.parse_attribute_default(base_depth)?;
        Ok(AttDef {
            name,
            attribute_type,
            enum_values,
            presence,
            default_value,
        })
    }

    /// A type keyword, `(enumeration)`, or `NOTATION (names)`.
    fn parse_attribute_type(
        &mut self,
        base_depth: usize,
    ) -> Result<(AttributeType, Option<Vec<String>>), DtdError> {
        if self.ch() == Some('(') {
            return Ok((
                AttributeType::Enumeration,
                Some(self.parse_name_group(NameRule::Any)?),
            ));
        }
        let keyword = self.scan_token(TYPE_TERMS, NameRule::Name)?;
        match AttributeType::from_keyword(&keyword) {
            Some(AttributeType::Notation) => {
                if self.skip_attlist_separators(base_depth)? != Some('(') {
                    return Err(self.syntax(format!(
                        "expecting name group '(' after NOTATION but found {}",
                        describe(self.ch())
                    )));
                }
                Ok((
                    AttributeType::Notation,
                    Some(self.parse_name_group(NameRule::Name)?),
                ))
            }
            Some(attribute_type) => Ok((attribute_type, None)),
            None => Err(self.syntax(format!("attribute type '{keyword}' is not supported"))),
        }
    }

    /// `#REQUIRED`, `#IMPLIED`, `#FIXED value`, or a default value.
    fn parse_attribute_default(
        &mut self,
        base_depth: usize,
    ) -> Result<(AttributePresence, Option<String>), DtdError> {
        if self.ch() != Some('#') {
            return Ok((AttributePresence::Default, Some(self.parse_default_value()?)));
        }
        self.read_char();
        let keyword = self.scan_token(VALUE_TERMS, NameRule::Name)?;
        let presence = AttributePresence::from_keyword(&keyword).ok_or_else(|| {
            self.syntax(format!("attribute presence '#{keyword}' is not supported"))
        })?;
        if !presence.has_default() {
            return Ok((presence, None));
        }
        self.skip_attlist_separators(base_depth)?;
        Ok((presence, Some(self.parse_default_value()?)))
    }

    /// A quoted literal, or a bare token (upper-cased).
    fn parse_default_value(&mut self) -> Result<String, DtdError> {
        match self.ch() {
            Some('"' | '\'') => self.scan_literal(),
            _ => Ok(self.scan_token(VALUE_TERMS, NameRule::Any)?.to_uppercase()),
        }
    }
}
