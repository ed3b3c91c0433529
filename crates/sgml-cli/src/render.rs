//! Text and JSON views of a parsed DTD.

use std::fmt::Write;

use serde_json::json;
use sgml_dtd::{AttDef, AttributePresence, AttributeType, ElementDecl, Entity, EntityKind, SgmlDtd};

fn omission(optional: bool) -> char {
    if optional { 'O' } else { '-' }
}

fn presence_keyword(presence: AttributePresence) -> Option<&'static str> {
    match presence {
        AttributePresence::Default => None,
        AttributePresence::Fixed => Some("#FIXED"),
        AttributePresence::Required => Some("#REQUIRED"),
        AttributePresence::Implied => Some("#IMPLIED"),
    }
}

fn attribute_type(def: &AttDef) -> String {
    let values = def.enum_values.as_deref().unwrap_or_default().join("|");
    match def.attribute_type {
        AttributeType::Enumeration => format!("({values})"),
        AttributeType::Notation => format!("NOTATION ({values})"),
        other => other.as_str().to_string(),
    }
}

/// One element in declaration syntax, followed by its attributes.
pub fn element_tree(element: &ElementDecl) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "ELEMENT {} {} {} {}",
        element.name(),
        omission(element.start_tag_optional()),
        omission(element.end_tag_optional()),
        element.content_model()
    );
    if let Some(exclusions) = element.exclusions() {
        let _ = write!(out, " -({})", exclusions.join("|"));
    }
    if let Some(inclusions) = element.inclusions() {
        let _ = write!(out, " +({})", inclusions.join("|"));
    }
    if let Some(entity) = element.content_model().entity() {
        let _ = write!(out, "  [%{entity};]");
    }
    out.push('\n');

    for def in element.attributes().into_iter().flatten() {
        let _ = write!(out, "    {} {}", def.name, attribute_type(def));
        if let Some(keyword) = presence_keyword(def.presence) {
            let _ = write!(out, " {keyword}");
        }
        if let Some(value) = &def.default_value {
            let _ = write!(out, " \"{value}\"");
        }
        out.push('\n');
    }
    out
}

/// Every element, then the entity tables.
pub fn dtd_tree(dtd: &SgmlDtd) -> String {
    let mut out = String::new();
    if let Some(name) = dtd.name() {
        let _ = writeln!(out, "DOCTYPE {name}");
    }
    for element in dtd.elements() {
        out.push_str(&element_tree(element));
    }
    for entity in dtd.parameter_entities() {
        let _ = writeln!(out, "ENTITY % {}", entity_summary(entity));
    }
    for entity in dtd.entities() {
        let _ = writeln!(out, "ENTITY {}", entity_summary(entity));
    }
    out
}

fn entity_summary(entity: &Entity) -> String {
    match entity.kind() {
        EntityKind::Internal { literal } => match entity.literal_type() {
            Some(literal_type) => format!("{} {} {literal:?}", entity.name(), literal_type.as_str()),
            None => format!("{} {literal:?}", entity.name()),
        },
        EntityKind::External {
            public_id,
            system_id,
        } => {
            let mut summary = entity.name().to_string();
            match public_id {
                Some(public_id) => {
                    let _ = write!(summary, " PUBLIC {public_id:?}");
                }
                None => summary.push_str(" SYSTEM"),
            }
            if let Some(system_id) = system_id {
                let _ = write!(summary, " {system_id:?}");
            }
            summary
        }
    }
}

fn attribute_json(def: &AttDef) -> serde_json::Value {
    json!({
        "name": def.name,
        "type": def.attribute_type.as_str(),
        "values": def.enum_values,
        "presence": presence_keyword(def.presence),
        "default": def.default_value,
    })
}

fn element_json(element: &ElementDecl) -> serde_json::Value {
    let model = element.content_model();
    json!({
        "name": element.name(),
        "startTagOptional": element.start_tag_optional(),
        "endTagOptional": element.end_tag_optional(),
        "declaredContent": model.declared_content().as_str(),
        "contentModel": model.to_string(),
        "textOnly": model.text_only(),
        "inclusions": element.inclusions(),
        "exclusions": element.exclusions(),
        "attributes": element
            .attributes()
            .map(|table| table.iter().map(attribute_json).collect::<Vec<_>>()),
    })
}

fn entity_json(entity: &Entity) -> serde_json::Value {
    json!({
        "name": entity.name(),
        "literal": entity.literal(),
        "literalType": entity.literal_type().map(|t| t.as_str()),
        "publicId": entity.public_id(),
        "systemId": entity.system_id(),
    })
}

/// The whole grammar as JSON.
pub fn dtd_json(dtd: &SgmlDtd) -> serde_json::Value {
    json!({
        "name": dtd.name(),
        "elements": dtd.elements().map(element_json).collect::<Vec<_>>(),
        "parameterEntities": dtd.parameter_entities().map(entity_json).collect::<Vec<_>>(),
        "entities": dtd.entities().map(entity_json).collect::<Vec<_>>(),
    })
}
