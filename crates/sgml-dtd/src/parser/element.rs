//! ELEMENT declarations, name groups and content models.

use std::sync::Arc;

use sgml_scanner::NameRule;
use tracing::debug;

use super::{Parser, describe};
use crate::{ContentModelBuilder, DtdError, DtdErrorKind, ElementDecl, Occurrence};

/// Ends a name inside a name group.
const NAME_GROUP_TERMS: &str = " \r\n\t|,&)";
/// Ends a single name given without parentheses.
const SINGLE_NAME_TERMS: &str = " \r\n\t>(";
/// Ends a declared content keyword or a content model entity reference.
const DECLARED_CONTENT_TERMS: &str = " \r\n\t>";
/// Ends a token inside a model group.
const MODEL_TERMS: &str = " \r\n\t,&|()?+*";

impl Parser<'_> {
    /// `<!ELEMENT names [O|- O|-] content [-(exclusions)] [+(inclusions)]>`
    pub(super) fn parse_element_decl(&mut self) -> Result<(), DtdError> {
        self.skip_whitespace();
        let names = self.parse_name_group(NameRule::Name)?;

        let mut start_tag_optional = false;
        let mut end_tag_optional = false;
        if let Some(c @ ('O' | 'o' | '-')) = self.skip_whitespace() {
            start_tag_optional = c != '-';
            self.read_char();
            if let Some(c @ ('O' | 'o' | '-')) = self.skip_whitespace() {
                end_tag_optional = c != '-';
                self.read_char();
            }
        }

        self.skip_whitespace();
        let mut builder = ContentModelBuilder::new();
        self.parse_content_model(&mut builder)?;
        let model = Arc::new(builder.finish());

        let mut exclusions = None;
        if self.skip_whitespace() == Some('-') {
            match self.read_char() {
                Some('(') => exclusions = Some(self.parse_name_group(NameRule::Name)?),
                Some('-') => {
                    self.read_char();
                    self.scan_to_end("comment", "--")?;
                }
                other => {
                    return Err(self.syntax(format!(
                        "expecting exclusions '-(' or a comment but found {}",
                        describe(other)
                    )));
                }
            }
        }

        let mut inclusions = None;
        if self.skip_declaration_comments()? == Some('+') {
            if self.read_char() != Some('(') {
                return Err(self.syntax(format!(
                    "expecting inclusions '+(' but found {}",
                    describe(self.ch())
                )));
            }
            inclusions = Some(self.parse_name_group(NameRule::Name)?);
        }

        self.skip_declaration_comments()?;
        self.expect_close("ELEMENT")?;

        debug!(elements = ?names, model = %model, "ELEMENT");
        for name in names {
            let decl = ElementDecl::new(
                name.as_str(),
                start_tag_optional,
                end_tag_optional,
                Arc::clone(&model),
                inclusions.clone(),
                exclusions.clone(),
            );
            if self.dtd.elements.insert(name.clone(), decl).is_err() {
                return Err(self.error(DtdErrorKind::DuplicateElement { name }));
            }
        }
        Ok(())
    }

    /// A single name, or a parenthesized group of names separated by `|`,
    /// `,` or `&`. Parameter entity references are expanded in place.
    /// Names are upper-cased.
    pub(super) fn parse_name_group(&mut self, rule: NameRule) -> Result<Vec<String>, DtdError> {
        let mut names = Vec::new();
        match self.ch() {
            Some('(') => {
                self.read_char();
                loop {
                    match self.skip_whitespace() {
                        Some(')') => {
                            self.read_char();
                            break;
                        }
                        None => return Err(self.syntax("name group was not closed")),
                        Some('%') => self.expand_name_list(&mut names, rule)?,
                        Some(_) => names.push(self.scan_token(NAME_GROUP_TERMS, rule)?.to_uppercase()),
                    }
                    if let Some('|' | ',' | '&') = self.skip_whitespace() {
                        self.read_char();
                    }
                }
            }
            Some('%') => self.expand_name_list(&mut names, rule)?,
            _ => names.push(self.scan_token(SINGLE_NAME_TERMS, rule)?.to_uppercase()),
        }
        Ok(names)
    }

    /// Push the entity referenced at the current `%` and read names from it
    /// until it ends.
    fn expand_name_list(&mut self, names: &mut Vec<String>, rule: NameRule) -> Result<(), DtdError> {
        let entity = self.parameter_entity_ref(NAME_GROUP_TERMS)?;
        self.push_entity(&entity)?;
        loop {
            match self.skip_whitespace() {
                None => break,
                Some('%') => self.expand_name_list(names, rule)?,
                Some('(') => names.extend(self.parse_name_group(rule)?),
                Some(_) => names.push(self.scan_token(NAME_GROUP_TERMS, rule)?.to_uppercase()),
            }
            if let Some('|' | ',' | '&') = self.skip_whitespace() {
                self.read_char();
            }
        }
        self.stack.pop();
        Ok(())
    }

    /// A model group, a parameter entity supplying the whole model, or a
    /// declared content keyword.
    fn parse_content_model(&mut self, builder: &mut ContentModelBuilder) -> Result<(), DtdError> {
        match self.ch() {
            Some('(') => {
                self.read_char();
                self.parse_model(builder, None)?;
                // At the root group's ')'.
                if let Some(occurrence) = self.read_char().and_then(Occurrence::from_char) {
                    builder.add_occurrence(occurrence);
                    self.read_char();
                }
            }
            Some('%') => {
                let entity = self.parameter_entity_ref(DECLARED_CONTENT_TERMS)?;
                self.push_entity(&entity)?;
                self.skip_whitespace();
                self.parse_content_model(builder)?;
                self.pop_entity("content model");
                builder.set_entity(entity.name());
            }
            _ => {
                let keyword = self.scan_name(DECLARED_CONTENT_TERMS)?.to_uppercase();
                builder
                    .set_declared_content(&keyword)
                    .map_err(|kind| self.error(kind))?;
            }
        }
        Ok(())
    }

    /// Tokens of a model group, after its `(`.
    ///
    /// At top level (`entity` is `None`) this stops at the `)` closing the
    /// group it started in, leaving it current. Inside a parameter entity it
    /// stops at the entity's end, which must leave the group depth where it
    /// was.
    fn parse_model(
        &mut self,
        builder: &mut ContentModelBuilder,
        entity: Option<&str>,
    ) -> Result<(), DtdError> {
        let depth = builder.depth();
        loop {
            let ch = self.skip_whitespace();
            match ch {
                None => {
                    return match entity {
                        None => Err(self.syntax("content model was not closed")),
                        Some(name) if builder.depth() > depth => Err(self.error(DtdErrorKind::Scope {
                            entity: name.to_string(),
                        })),
                        Some(_) => Ok(()),
                    };
                }
                Some(')') if builder.depth() == depth => {
                    return match entity {
                        None => Ok(()),
                        Some(name) => Err(self.error(DtdErrorKind::Scope {
                            entity: name.to_string(),
                        })),
                    };
                }
                Some(')') => {
                    if let Some(occurrence) = self.read_char().and_then(Occurrence::from_char) {
                        builder.add_occurrence(occurrence);
                        self.read_char();
                    }
                    builder.pop_group();
                }
                Some('(') => {
                    builder.push_group();
                    self.read_char();
                }
                Some('%') => {
                    let referenced = self.parameter_entity_ref(MODEL_TERMS)?;
                    builder.note_entity(referenced.name());
                    self.push_entity(&referenced)?;
                    self.parse_model(builder, Some(referenced.name()))?;
                    self.stack.pop();
                }
                Some(c @ (',' | '|' | '&')) => {
                    builder.add_connector(c).map_err(|kind| self.error(kind))?;
                    self.read_char();
                }
                Some(c) => {
                    let token = if c == '#' {
                        self.read_char();
                        format!("#{}", self.scan_token(MODEL_TERMS, NameRule::Name)?)
                    } else {
                        self.scan_token(MODEL_TERMS, NameRule::Name)?
                    }
                    .to_uppercase();

                    match self.ch().and_then(Occurrence::from_char) {
                        Some(occurrence) => {
                            builder.push_group();
                            builder.add_symbol(token);
                            builder.add_occurrence(occurrence);
                            builder.pop_group();
                            self.read_char();
                        }
                        None => builder.add_symbol(token),
                    }
                }
            }
        }
    }
}
