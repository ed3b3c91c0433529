//! Parameter entity expansion must not change what a declaration means.

use proptest::prelude::*;
use sgml_dtd::{ContentModel, SgmlDtd, parse};

fn name() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Z][A-Z0-9]{0,5}").unwrap()
}

fn connector() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just(","), Just("|"), Just("&")]
}

fn occurrence() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just(""), Just("?"), Just("*"), Just("+")]
}

/// Names with an occurrence indicator each.
fn terms() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec((name(), occurrence()), 2..8).prop_map(|terms| {
        terms
            .into_iter()
            .map(|(name, occurrence)| format!("{name}{occurrence}"))
            .collect()
    })
}

fn model(dtd: &SgmlDtd, element: &str) -> ContentModel {
    dtd.find_element(element)
        .unwrap()
        .content_model()
        .as_ref()
        .clone()
}

fn shape(model: &ContentModel) -> Vec<String> {
    model
        .groups()
        .iter()
        .map(|g| format!("{:?} {:?} {:?} {}", g.group_type(), g.occurrence(), g.members(), g.is_mixed()))
        .collect()
}

proptest! {
    /// Moving a prefix of a model group into a parameter entity yields the
    /// same model.
    #[test]
    fn entity_prefix_is_transparent(
        terms in terms(),
        connector in connector(),
        occurrence in occurrence(),
        split in 1usize..8,
    ) {
        let split = split.min(terms.len());
        let direct = format!(
            "<!ELEMENT X - - ({}){occurrence}>",
            terms.join(connector)
        );
        let mut rest = String::new();
        for term in &terms[split..] {
            rest.push_str(connector);
            rest.push_str(term);
        }
        let expanded = format!(
            "<!ENTITY % pe \"{}\">\n<!ELEMENT X - - (%pe;{rest}){occurrence}>",
            terms[..split].join(connector)
        );

        let direct_dtd = parse(&direct);
        prop_assert!(direct_dtd.is_ok(), "{direct}: {:?}", direct_dtd.err());
        let expanded_dtd = parse(&expanded);
        prop_assert!(expanded_dtd.is_ok(), "{expanded}: {:?}", expanded_dtd.err());

        let direct_model = model(&direct_dtd.unwrap(), "X");
        let expanded_model = model(&expanded_dtd.unwrap(), "X");
        prop_assert_eq!(direct_model.to_string(), expanded_model.to_string());
        prop_assert_eq!(shape(&direct_model), shape(&expanded_model));
        prop_assert_eq!(expanded_model.root_group().entity(), Some("pe"));
    }

    /// A name group given through a parameter entity declares the same
    /// elements, sharing one model.
    #[test]
    fn entity_name_group_declares_every_name(
        names in prop::collection::hash_set(name(), 1..6),
    ) {
        let names: Vec<_> = names.into_iter().collect();
        let source = format!(
            "<!ENTITY % names \"{}\">\n<!ELEMENT (%names;) - O (#PCDATA)>",
            names.join("|")
        );
        let dtd = parse(&source);
        prop_assert!(dtd.is_ok(), "{source}: {:?}", dtd.err());
        let dtd = dtd.unwrap();

        prop_assert_eq!(dtd.element_count(), names.len());
        let declared: Vec<_> = dtd.elements().map(|e| e.name().to_string()).collect();
        prop_assert_eq!(&declared, &names);
        let first = dtd.find_element(&names[0]).unwrap().content_model();
        for element in dtd.elements() {
            prop_assert!(std::sync::Arc::ptr_eq(first, element.content_model()));
            prop_assert!(element.content_model().text_only());
        }
    }
}
