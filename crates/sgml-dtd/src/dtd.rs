//! The parsed grammar.

use std::collections::HashMap;

use sgml_scanner::Entity;

use crate::ElementDecl;

/// Values in insertion order with lookup by key.
#[derive(Debug, Clone)]
pub(crate) struct Table<V> {
    values: Vec<V>,
    index: HashMap<String, usize>,
}

impl<V> Default for Table<V> {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<V> Table<V> {
    /// Insert under `key`; gives the value back if the key is taken.
    pub(crate) fn insert(&mut self, key: String, value: V) -> Result<(), V> {
        if self.index.contains_key(&key) {
            return Err(value);
        }
        self.index.insert(key, self.values.len());
        self.values.push(value);
        Ok(())
    }

    pub(crate) fn get(&self, key: &str) -> Option<&V> {
        self.index.get(key).map(|&i| &self.values[i])
    }

    pub(crate) fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        self.index.get(key).map(|&i| &mut self.values[i])
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub(crate) fn values(&self) -> std::slice::Iter<'_, V> {
        self.values.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.values.len()
    }
}

/// A parsed DTD: element declarations and the two entity tables, each in
/// declaration order. Immutable once parsing completes.
#[derive(Debug, Clone, Default)]
pub struct SgmlDtd {
    pub(crate) name: Option<String>,
    pub(crate) elements: Table<ElementDecl>,
    pub(crate) parameter_entities: Table<Entity>,
    pub(crate) entities: Table<Entity>,
}

impl SgmlDtd {
    /// Document type name, from the options or a DOCTYPE declaration.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Element declarations in declaration order.
    pub fn elements(&self) -> impl ExactSizeIterator<Item = &ElementDecl> {
        self.elements.values()
    }

    /// Number of declared elements.
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Look up an element, ignoring case.
    pub fn find_element(&self, name: &str) -> Option<&ElementDecl> {
        self.elements.get(&name.to_uppercase())
    }

    /// Parameter entities in declaration order.
    pub fn parameter_entities(&self) -> impl ExactSizeIterator<Item = &Entity> {
        self.parameter_entities.values()
    }

    /// General entities.
    pub fn entities(&self) -> impl ExactSizeIterator<Item = &Entity> {
        self.entities.values()
    }

    /// Look up a general entity by its exact name.
    pub fn find_entity(&self, name: &str) -> Option<&Entity> {
        self.entities.get(name)
    }

    /// Look up a parameter entity by its exact name.
    pub fn find_parameter_entity(&self, name: &str) -> Option<&Entity> {
        self.parameter_entities.get(name)
    }

    /// General entities keyed by their replacement text.
    ///
    /// External entities have no literal and are left out. When two entities
    /// share a literal the later declaration wins.
    pub fn entity_by_literal(&self) -> HashMap<&str, &Entity> {
        self.entities
            .values()
            .filter_map(|e| e.literal().map(|literal| (literal, e)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;

    #[test]
    fn test_table_keeps_order_and_rejects_duplicates() {
        let mut table = Table::default();
        table.insert("b".into(), 1).unwrap();
        table.insert("a".into(), 2).unwrap();
        assert_eq!(table.insert("b".into(), 3), Err(3));
        assert_eq!(table.values().copied().collect::<Vec<_>>(), [1, 2]);
        assert_eq!(table.get("a"), Some(&2));
        *table.get_mut("a").unwrap() = 5;
        assert_eq!(table.get("a"), Some(&5));
        assert!(table.contains("b"));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_entity_by_literal() {
        let mut dtd = SgmlDtd::default();
        dtd.entities
            .insert("amp".into(), Entity::internal("amp", "&#38;"))
            .unwrap();
        dtd.entities
            .insert("nbsp".into(), Entity::internal("nbsp", "\u{a0}"))
            .unwrap();
        dtd.entities
            .insert("ext".into(), Entity::external("ext", None, Some("x.ent".into())))
            .unwrap();

        let lookup = dtd.entity_by_literal();
        assert_eq!(lookup.len(), 2);
        assert_eq!(lookup["\u{a0}"].name(), "nbsp");
    }
}
