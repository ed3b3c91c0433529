//! Recursive-descent parser for DTD declarations.
//!
//! The parser reads from the current source of a [`SourceStack`]. Parameter
//! entity references at declaration level push the entity and parsing simply
//! continues in it. Inside name groups, content models and attribute lists
//! the referenced entity is pushed, parsed up to its end, and popped again,
//! so a construct may span several entities.

mod attlist;
mod element;

use sgml_scanner::{
    CharSource, Entity, LiteralType, NameRule, SourceStack, WHITESPACE, is_whitespace,
};
use tracing::{debug, trace, warn};

use crate::options::SUBSET_NAME;
use crate::{DtdError, DtdErrorKind, EntityContext, ParseOptions, SgmlDtd};

/// Ends a declaration keyword.
const KEYWORD_TERMS: &str = " \r\n\t>[%";
/// Ends the DOCTYPE name and the keyword of its external identifier.
const DOCTYPE_TERMS: &str = " \r\n\t[>";
/// Ends the keyword of a marked section.
const MARKED_SECTION_TERMS: &str = " \r\n\t[";

/// Declaration keyword after `<!`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    Entity,
    Element,
    Attlist,
    Doctype,
}

impl Keyword {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "ENTITY" => Some(Keyword::Entity),
            "ELEMENT" => Some(Keyword::Element),
            "ATTLIST" => Some(Keyword::Attlist),
            "DOCTYPE" => Some(Keyword::Doctype),
            _ => None,
        }
    }
}

/// Marked section keyword after `<![`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarkedSection {
    Ignore,
    Include,
}

impl MarkedSection {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "IGNORE" => Some(MarkedSection::Ignore),
            "INCLUDE" => Some(MarkedSection::Include),
            _ => None,
        }
    }
}

/// Describe a look-ahead character for error messages.
fn describe(c: Option<char>) -> String {
    match c {
        Some(c) => format!("'{c}'"),
        None => "end of input".to_string(),
    }
}

pub(crate) struct Parser<'o> {
    stack: SourceStack,
    options: &'o ParseOptions,
    dtd: SgmlDtd,
}

impl<'o> Parser<'o> {
    pub(crate) fn new(options: &'o ParseOptions) -> Self {
        let dtd = SgmlDtd {
            name: options.name.clone(),
            ..SgmlDtd::default()
        };
        Self {
            stack: SourceStack::with_max_depth(options.max_entity_depth),
            options,
            dtd,
        }
    }

    /// Name given to the top-level source in diagnostics.
    fn document_name(&self) -> &str {
        self.options.name.as_deref().unwrap_or("[dtd]")
    }

    fn base_uri(&self) -> Option<String> {
        self.stack
            .base_uri()
            .or(self.options.base_uri.as_deref())
            .map(str::to_owned)
    }

    /// Push in-memory DTD text as a source.
    pub(crate) fn push_text(&mut self, uri: Option<String>, text: &str) -> Result<(), DtdError> {
        let name = self.document_name().to_string();
        let source = CharSource::from_text(name.as_str(), uri, text);
        self.stack
            .push_source(source)
            .map_err(|e| self.error(DtdErrorKind::resolution(&name, &e)))
    }

    /// Push the external subset named by the options, if any.
    pub(crate) fn push_external_subset(&mut self) -> Result<(), DtdError> {
        if self.options.public_id.is_none() && self.options.system_id.is_none() {
            return Ok(());
        }
        let entity = Entity::external(
            self.document_name(),
            self.options.public_id.clone(),
            self.options.system_id.clone(),
        );
        let base = self.base_uri();
        let source = CharSource::open(&entity, base.as_deref(), self.options.resolver.as_ref())
            .map_err(|e| self.error(DtdErrorKind::resolution(entity.name(), &e)))?;
        self.stack
            .push_source(source)
            .map_err(|e| self.error(DtdErrorKind::resolution(entity.name(), &e)))
    }

    /// Push the internal subset from the options, if any, so it is read first.
    pub(crate) fn push_subset(&mut self) -> Result<(), DtdError> {
        let Some(subset) = &self.options.subset else {
            return Ok(());
        };
        let source = CharSource::from_text(SUBSET_NAME, self.base_uri(), subset.as_str());
        self.stack
            .push_source(source)
            .map_err(|e| self.error(DtdErrorKind::resolution(SUBSET_NAME, &e)))
    }

    /// Parse every pushed source and return the grammar.
    pub(crate) fn parse(mut self) -> Result<SgmlDtd, DtdError> {
        match self.parse_subset(0, false) {
            Ok(()) => Ok(self.dtd),
            Err(error) => {
                self.stack.close_all();
                Err(error)
            }
        }
    }

    // Character access

    #[inline]
    fn ch(&self) -> Option<char> {
        self.stack.current().current()
    }

    #[inline]
    fn read_char(&mut self) -> Option<char> {
        self.stack.current_mut().read_char()
    }

    #[inline]
    fn skip_whitespace(&mut self) -> Option<char> {
        self.stack.current_mut().skip_whitespace()
    }

    fn scan_token(&mut self, terminators: &str, rule: NameRule) -> Result<String, DtdError> {
        self.stack
            .current_mut()
            .scan_token(terminators, rule)
            .map_err(|e| self.error(e))
    }

    fn scan_literal(&mut self) -> Result<String, DtdError> {
        self.stack
            .current_mut()
            .scan_literal()
            .map_err(|e| self.error(e))
    }

    fn scan_to_end(&mut self, what: &'static str, marker: &str) -> Result<String, DtdError> {
        self.stack
            .current_mut()
            .scan_to_end(what, marker)
            .map_err(|e| self.error(e))
    }

    // Errors

    fn error(&self, kind: impl Into<DtdErrorKind>) -> DtdError {
        DtdError::new(kind.into(), EntityContext::new(self.stack.context()))
    }

    fn syntax(&self, message: impl Into<String>) -> DtdError {
        self.error(DtdErrorKind::syntax(message))
    }

    /// Consume the `>` closing a declaration.
    fn expect_close(&mut self, declaration: &str) -> Result<(), DtdError> {
        match self.ch() {
            Some('>') => {
                self.read_char();
                Ok(())
            }
            other => Err(self.syntax(format!(
                "expecting '>' to close the {declaration} declaration but found {}",
                describe(other)
            ))),
        }
    }

    // Entities

    /// Read a `%name;` reference at the current `%` and look the entity up.
    ///
    /// The name ends at `;` or any of `terminators`; the `;` is consumed.
    fn parameter_entity_ref(&mut self, terminators: &str) -> Result<Entity, DtdError> {
        self.read_char();
        let mut terms = String::with_capacity(terminators.len() + 1);
        terms.push(';');
        terms.push_str(terminators);
        let name = self.scan_token(&terms, NameRule::Any)?;
        if self.ch() == Some(';') {
            self.read_char();
        }
        trace!(entity = %name, "parameter entity reference");
        match self.dtd.find_parameter_entity(&name) {
            Some(entity) => Ok(entity.clone()),
            None => Err(self.error(DtdErrorKind::EntityResolution {
                name,
                reason: "reference to undefined parameter entity".to_string(),
            })),
        }
    }

    /// Make `entity` the current source.
    fn push_entity(&mut self, entity: &Entity) -> Result<(), DtdError> {
        self.stack
            .push(entity, self.options.resolver.as_ref())
            .map_err(|e| self.error(DtdErrorKind::resolution(entity.name(), &e)))
    }

    /// Pop an entity pushed to supply part of a declaration. Anything left in
    /// it other than whitespace is dropped.
    fn pop_entity(&mut self, what: &str) {
        if let Some(c) = self.skip_whitespace() {
            warn!(
                entity = self.stack.current().name(),
                found = %c,
                "ignoring text after the {what} in a parameter entity"
            );
        }
        self.stack.pop();
    }

    /// Scan a name, or take it from the literal of a parameter entity.
    fn scan_name(&mut self, terminators: &str) -> Result<String, DtdError> {
        if self.skip_whitespace() != Some('%') {
            return self.scan_token(terminators, NameRule::Name);
        }
        let entity = self.parameter_entity_ref(terminators)?;
        match entity.literal() {
            Some(literal) => Ok(literal.trim().to_string()),
            None => Err(self.error(DtdErrorKind::UnsupportedFeature {
                feature: format!(
                    "external parameter entity '%{};' in a name position",
                    entity.name()
                ),
            })),
        }
    }

    /// Skip whitespace and any number of `-- comment --` blocks.
    fn skip_declaration_comments(&mut self) -> Result<Option<char>, DtdError> {
        let mut ch = self.skip_whitespace();
        while ch == Some('-') {
            self.read_char();
            if self.ch() != Some('-') {
                return Err(self.syntax(format!(
                    "expecting comment delimiter '--' but found {}",
                    describe(self.ch())
                )));
            }
            self.read_char();
            self.scan_to_end("comment", "--")?;
            ch = self.skip_whitespace();
        }
        Ok(ch)
    }

    // Declaration level

    /// Parse declarations until the sources opened above `base_depth` are
    /// exhausted, or, inside a DOCTYPE, until its closing `]`.
    fn parse_subset(&mut self, base_depth: usize, in_doctype: bool) -> Result<(), DtdError> {
        loop {
            match self.ch() {
                None if self.stack.depth() > base_depth => {
                    self.stack.pop();
                }
                None if in_doctype => {
                    return Err(self.syntax("DOCTYPE internal subset was not closed with ']'"));
                }
                None => return Ok(()),
                Some(c) if is_whitespace(c) => {
                    self.skip_whitespace();
                }
                Some('<') => self.parse_markup()?,
                Some('%') => self.parse_entity_reference()?,
                Some(']') if in_doctype && self.stack.depth() == base_depth => return Ok(()),
                Some(c) => return Err(self.syntax(format!("unexpected character '{c}'"))),
            }
        }
    }

    /// A parameter entity reference between declarations.
    fn parse_entity_reference(&mut self) -> Result<(), DtdError> {
        let entity = self.parameter_entity_ref(WHITESPACE)?;
        match self.stack.push(&entity, self.options.resolver.as_ref()) {
            Ok(()) => Ok(()),
            Err(error) if self.options.lenient_entities => {
                warn!(entity = entity.name(), %error, "skipping parameter entity");
                Ok(())
            }
            Err(error) => Err(self.error(DtdErrorKind::resolution(entity.name(), &error))),
        }
    }

    fn parse_markup(&mut self) -> Result<(), DtdError> {
        if self.read_char() != Some('!') {
            return Err(self.syntax(format!(
                "expecting a declaration starting with '<!' but found {}",
                describe(self.ch())
            )));
        }
        match self.read_char() {
            Some('-') => {
                if self.read_char() != Some('-') {
                    return Err(self.syntax(format!(
                        "expecting comment '<!--' but found {}",
                        describe(self.ch())
                    )));
                }
                self.read_char();
                self.scan_to_end("comment", "-->")?;
                Ok(())
            }
            Some('[') => {
                self.read_char();
                self.parse_marked_section()
            }
            _ => {
                let token = self.scan_token(KEYWORD_TERMS, NameRule::Name)?;
                match Keyword::from_name(&token.to_uppercase()) {
                    Some(Keyword::Entity) => self.parse_entity_decl(),
                    Some(Keyword::Element) => self.parse_element_decl(),
                    Some(Keyword::Attlist) => self.parse_attlist_decl(),
                    Some(Keyword::Doctype) => self.parse_doctype(),
                    None => Err(self.syntax(format!(
                        "invalid declaration '<!{token}'; expecting ENTITY, ELEMENT, ATTLIST or DOCTYPE"
                    ))),
                }
            }
        }
    }

    /// `<![ keyword [ … ]]>`, after the `<![`.
    fn parse_marked_section(&mut self) -> Result<(), DtdError> {
        let keyword = self.scan_name(MARKED_SECTION_TERMS)?.to_uppercase();
        match MarkedSection::from_name(&keyword) {
            Some(MarkedSection::Ignore) => {
                if self.skip_whitespace() != Some('[') {
                    return Err(self.syntax(format!(
                        "expecting '[' after IGNORE but found {}",
                        describe(self.ch())
                    )));
                }
                self.read_char();
                self.stack
                    .current_mut()
                    .scan_ignored_section()
                    .map_err(|e| self.error(e))?;
                debug!("skipped IGNORE marked section");
                Ok(())
            }
            Some(MarkedSection::Include) => Err(self.error(DtdErrorKind::UnsupportedFeature {
                feature: "INCLUDE marked section".to_string(),
            })),
            None => Err(self.syntax(format!("unsupported marked section type '{keyword}'"))),
        }
    }

    /// `<!ENTITY [%] name (literal | type literal | external-id)>`
    fn parse_entity_decl(&mut self) -> Result<(), DtdError> {
        let parameter = self.skip_whitespace() == Some('%');
        if parameter {
            self.read_char();
            self.skip_whitespace();
        }
        let name = self.scan_token(WHITESPACE, NameRule::Name)?;

        let entity = match self.skip_whitespace() {
            Some('"' | '\'') => Entity::internal(name.as_str(), self.scan_literal()?),
            _ => {
                let keyword = self.scan_token(" \r\n\t>", NameRule::Name)?;
                match LiteralType::from_keyword(&keyword) {
                    Some(literal_type) => {
                        self.skip_whitespace();
                        Entity::internal(name.as_str(), self.scan_literal()?)
                            .with_literal_type(literal_type)
                    }
                    None => self.parse_external_id(&name, &keyword)?,
                }
            }
        };

        self.skip_declaration_comments()?;
        self.expect_close("ENTITY")?;

        debug!(entity = %name, parameter, internal = entity.is_internal(), "ENTITY");
        let table = if parameter {
            &mut self.dtd.parameter_entities
        } else {
            &mut self.dtd.entities
        };
        if table.insert(name.clone(), entity).is_err() {
            return Err(self.error(DtdErrorKind::DuplicateEntity { name, parameter }));
        }
        Ok(())
    }

    /// `PUBLIC "pubid" ["sysid"]` or `SYSTEM ["sysid"]`, after the keyword.
    fn parse_external_id(&mut self, name: &str, keyword: &str) -> Result<Entity, DtdError> {
        let public_id = match keyword.to_ascii_uppercase().as_str() {
            "PUBLIC" => match self.skip_whitespace() {
                Some('"' | '\'') => Some(self.scan_literal()?),
                other => {
                    return Err(self.syntax(format!(
                        "expecting public identifier literal but found {}",
                        describe(other)
                    )));
                }
            },
            "SYSTEM" => None,
            _ => {
                return Err(self.syntax(format!(
                    "invalid external identifier '{keyword}'; expecting PUBLIC or SYSTEM"
                )));
            }
        };
        let system_id = match self.skip_whitespace() {
            Some('"' | '\'') => Some(self.scan_literal()?),
            _ => None,
        };
        Ok(Entity::external(name, public_id, system_id))
    }

    /// `<!DOCTYPE name [external-id] [[ subset ]]>`
    ///
    /// The external subset, if any, is pushed after the `>` so it is read
    /// after the internal subset.
    fn parse_doctype(&mut self) -> Result<(), DtdError> {
        self.skip_whitespace();
        let name = self.scan_token(DOCTYPE_TERMS, NameRule::Name)?;
        if self.dtd.name.is_none() {
            self.dtd.name = Some(name.clone());
        }

        let mut external = None;
        if let Some(c) = self.skip_whitespace() {
            if c != '[' && c != '>' {
                let keyword = self.scan_token(DOCTYPE_TERMS, NameRule::Name)?;
                external = Some(self.parse_external_id(&name, &keyword)?);
            }
        }

        if self.skip_whitespace() == Some('[') {
            self.read_char();
            let depth = self.stack.depth();
            self.parse_subset(depth, true)?;
            // At the closing ']'.
            self.read_char();
            self.skip_whitespace();
        }
        self.expect_close("DOCTYPE")?;
        debug!(doctype = %name, external = external.is_some(), "DOCTYPE");

        if let Some(entity) = external {
            self.push_entity(&entity)?;
        }
        Ok(())
    }
}
