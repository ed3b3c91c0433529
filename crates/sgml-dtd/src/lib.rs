#![doc = include_str!("../README.md")]

mod builder;
mod content;
mod diagnostic;
mod dtd;
mod element;
mod error;
mod options;
mod parser;

pub use builder::ContentModelBuilder;
pub use content::{ContentModel, DeclaredContent, Group, GroupId, GroupMember, GroupType, Occurrence};
pub use dtd::SgmlDtd;
pub use element::{AttDef, AttributePresence, AttributeTable, AttributeType, ElementDecl};
pub use error::{DtdError, DtdErrorKind, EntityContext};
pub use options::{ParseOptions, SUBSET_NAME};
pub use sgml_scanner::{
    Entity, EntityKind, EntityResolver, FileResolver, Frame, LiteralType, Location, MemoryResolver,
    ResolvedEntity,
};

use parser::Parser;

/// Parse DTD text with default options.
pub fn parse(source: &str) -> Result<SgmlDtd, DtdError> {
    parse_with(source, &ParseOptions::default())
}

/// Parse DTD text.
///
/// `source` is the top-level source; relative system identifiers in it
/// resolve against `options.base_uri`, or else `options.system_id`. The
/// internal subset from the options, if any, is read first.
pub fn parse_with(source: &str, options: &ParseOptions) -> Result<SgmlDtd, DtdError> {
    let mut parser = Parser::new(options);
    let uri = options.base_uri.clone().or_else(|| options.system_id.clone());
    parser.push_text(uri, source)?;
    parser.push_subset()?;
    parser.parse()
}

/// Parse the external subset named by `options.public_id` and
/// `options.system_id`, read through `options.resolver`.
///
/// The internal subset from the options, if any, is read first.
pub fn parse_external(options: &ParseOptions) -> Result<SgmlDtd, DtdError> {
    let mut parser = Parser::new(options);
    parser.push_external_subset()?;
    parser.push_subset()?;
    parser.parse()
}

/// Parse DTD bytes, detecting UTF-16 and UCS-4 from a byte order mark and
/// falling back to UTF-8.
pub fn parse_bytes(bytes: &[u8], options: &ParseOptions) -> Result<SgmlDtd, DtdError> {
    let uri = options
        .base_uri
        .as_deref()
        .or(options.system_id.as_deref())
        .unwrap_or("[dtd]");
    let text = sgml_scanner::decode(uri, bytes).map_err(|e| {
        DtdError::new(
            DtdErrorKind::EntityResolution {
                name: options.name.clone().unwrap_or_else(|| "[dtd]".to_string()),
                reason: e.to_string(),
            },
            EntityContext::default(),
        )
    })?;
    parse_with(&text, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;

    #[test]
    fn test_parse_external_reads_through_resolver() {
        let resolver = MemoryResolver::new().with_system("dtd/html.dtd", "<!ELEMENT HTML O O ANY>");
        let options = ParseOptions::default()
            .name("HTML")
            .system_id("dtd/html.dtd")
            .resolver(resolver);
        let dtd = parse_external(&options).unwrap();
        assert_eq!(dtd.name(), Some("HTML"));
        assert!(dtd.find_element("html").is_some());
    }

    #[test]
    fn test_parse_external_without_identifiers_is_empty() {
        let dtd = parse_external(&ParseOptions::default()).unwrap();
        assert_eq!(dtd.element_count(), 0);
    }

    #[test]
    fn test_internal_subset_is_read_first() {
        let options = ParseOptions::default().subset(r#"<!ENTITY % model "(A)*">"#);
        let dtd = parse_with("<!ELEMENT B - - %model;> <!ELEMENT A - - EMPTY>", &options).unwrap();
        assert_eq!(dtd.find_element("B").unwrap().content_model().to_string(), "(A)*");
    }

    #[test]
    fn test_parse_bytes_decodes_utf16() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "<!ELEMENT É - - EMPTY>".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let dtd = parse_bytes(&bytes, &ParseOptions::default()).unwrap();
        assert!(dtd.find_element("é").is_some());
    }
}
