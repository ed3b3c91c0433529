//! Incremental construction of a content model.

use tracing::trace;

use crate::content::{ContentModel, DeclaredContent, Group, GroupId, GroupMember, GroupType, Occurrence};
use crate::DtdErrorKind;

/// Builds a [`ContentModel`] from model tokens, keeping the stack of open
/// groups. The root group is open from the start and sits at depth 0.
#[derive(Debug, Clone)]
pub struct ContentModelBuilder {
    declared: DeclaredContent,
    groups: Vec<Group>,
    /// Open groups, root first. Never empty.
    open: Vec<GroupId>,
    entity: Option<String>,
}

impl Default for ContentModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentModelBuilder {
    /// A builder with only the root group open.
    pub fn new() -> Self {
        Self {
            declared: DeclaredContent::Default,
            groups: vec![Group::new(None)],
            open: vec![GroupId(0)],
            entity: None,
        }
    }

    /// Number of open groups below the root.
    pub fn depth(&self) -> usize {
        self.open.len() - 1
    }

    fn current_id(&self) -> GroupId {
        self.open[self.open.len() - 1]
    }

    fn current(&mut self) -> &mut Group {
        let id = self.current_id();
        &mut self.groups[id.index()]
    }

    /// Open a group as the next member of the current one.
    pub fn push_group(&mut self) {
        let parent = self.current_id();
        let id = GroupId(self.groups.len() as u32);
        self.groups.push(Group::new(Some(parent)));
        self.current().members.push(GroupMember::Group(id));
        self.open.push(id);
        trace!(depth = self.depth(), "push group");
    }

    /// Close the current group and return the new depth, or `None` if the
    /// current group is the root.
    pub fn pop_group(&mut self) -> Option<usize> {
        if self.open.len() == 1 {
            return None;
        }
        self.open.pop();
        trace!(depth = self.depth(), "pop group");
        Some(self.depth())
    }

    /// Apply a connector (`,`, `|` or `&`) to the current group.
    pub fn add_connector(&mut self, connector: char) -> Result<(), DtdErrorKind> {
        let group = self.current();
        if !group.mixed && group.members.is_empty() {
            return Err(DtdErrorKind::syntax(format!(
                "missing token before connector '{connector}'"
            )));
        }
        let group_type = GroupType::from_connector(connector)
            .ok_or_else(|| DtdErrorKind::syntax(format!("'{connector}' is not a connector")))?;
        if group.group_type != GroupType::None && group.group_type != group_type {
            return Err(DtdErrorKind::GroupTypeConflict {
                connector,
                established: group.group_type,
            });
        }
        group.group_type = group_type;
        Ok(())
    }

    /// Add a symbol to the current group. `#PCDATA` marks the group mixed
    /// instead of adding a member.
    pub fn add_symbol(&mut self, symbol: impl Into<String>) {
        let symbol = symbol.into();
        let group = self.current();
        if symbol.eq_ignore_ascii_case("#PCDATA") {
            group.mixed = true;
        } else {
            group.members.push(GroupMember::Symbol(symbol));
        }
    }

    /// Set the occurrence of the current group.
    pub fn add_occurrence(&mut self, occurrence: Occurrence) {
        self.current().occurrence = occurrence;
    }

    /// Record the parameter entity referenced inside the current group,
    /// unless one was recorded already.
    pub fn note_entity(&mut self, name: &str) {
        let group = self.current();
        if group.entity.is_none() {
            group.entity = Some(name.to_string());
        }
    }

    /// Record the parameter entity that supplied the whole model.
    pub fn set_entity(&mut self, name: &str) {
        self.entity = Some(name.to_string());
    }

    /// Use a declared content keyword instead of a model group.
    pub fn set_declared_content(&mut self, keyword: &str) -> Result<(), DtdErrorKind> {
        self.declared = DeclaredContent::from_keyword(keyword).ok_or_else(|| {
            DtdErrorKind::syntax(format!("declared content type '{keyword}' is not supported"))
        })?;
        Ok(())
    }

    /// The finished model. Groups still open are kept as they are.
    pub fn finish(self) -> ContentModel {
        ContentModel {
            declared: self.declared,
            groups: self.groups,
            root: GroupId(0),
            entity: self.entity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;

    #[test]
    fn test_sequence_with_implicit_groups() {
        // (X,Y?,Z*)
        let mut b = ContentModelBuilder::new();
        b.add_symbol("X");
        b.add_connector(',').unwrap();
        b.push_group();
        b.add_symbol("Y");
        b.add_occurrence(Occurrence::Optional);
        assert_eq!(b.pop_group(), Some(0));
        b.add_connector(',').unwrap();
        b.push_group();
        b.add_symbol("Z");
        b.add_occurrence(Occurrence::ZeroOrMore);
        b.pop_group();
        let model = b.finish();

        let root = model.root_group();
        assert_eq!(root.group_type(), GroupType::Sequence);
        assert_eq!(root.members().len(), 3);
        let GroupMember::Group(y) = root.members()[1] else {
            panic!("expected a group");
        };
        assert_eq!(model.group(y).occurrence(), Occurrence::Optional);
        assert_eq!(model.group(y).parent(), Some(model.root()));
        assert_eq!(model.to_string(), "(X,Y?,Z*)");
    }

    #[test]
    fn test_connector_conflict() {
        let mut b = ContentModelBuilder::new();
        b.add_symbol("X");
        b.add_connector(',').unwrap();
        b.add_symbol("Y");
        let err = b.add_connector('|').unwrap_err();
        assert_eq!(
            err,
            DtdErrorKind::GroupTypeConflict {
                connector: '|',
                established: GroupType::Sequence
            }
        );
    }

    #[test]
    fn test_connector_needs_a_member() {
        let mut b = ContentModelBuilder::new();
        assert!(matches!(b.add_connector('|'), Err(DtdErrorKind::Syntax { .. })));

        // #PCDATA counts as the token before the connector.
        let mut b = ContentModelBuilder::new();
        b.add_symbol("#PCDATA");
        b.add_connector('|').unwrap();
        b.add_symbol("EM");
        b.add_occurrence(Occurrence::ZeroOrMore);
        let model = b.finish();
        assert!(model.root_group().is_mixed());
        assert!(!model.text_only());
        assert_eq!(model.to_string(), "(#PCDATA|EM)*");
    }

    #[test]
    fn test_text_only() {
        let mut b = ContentModelBuilder::new();
        b.add_symbol("#pcdata");
        let model = b.finish();
        assert!(model.text_only());
        assert!(model.root_group().members().is_empty());
        assert_eq!(model.to_string(), "(#PCDATA)");
    }

    #[test]
    fn test_pop_below_root() {
        let mut b = ContentModelBuilder::new();
        assert_eq!(b.pop_group(), None);
        b.push_group();
        b.push_group();
        assert_eq!(b.depth(), 2);
        assert_eq!(b.pop_group(), Some(1));
    }

    #[test]
    fn test_declared_content() {
        let mut b = ContentModelBuilder::new();
        b.set_declared_content("EMPTY").unwrap();
        let model = b.finish();
        assert_eq!(model.declared_content(), DeclaredContent::Empty);
        assert_eq!(model.to_string(), "EMPTY");

        let err = ContentModelBuilder::new()
            .set_declared_content("NOTHING")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "declared content type 'NOTHING' is not supported"
        );
    }

    #[test]
    fn test_entity_recorded_once_per_group() {
        let mut b = ContentModelBuilder::new();
        b.note_entity("first");
        b.note_entity("second");
        b.set_entity("whole");
        let model = b.finish();
        assert_eq!(model.root_group().entity(), Some("first"));
        assert_eq!(model.entity(), Some("whole"));
    }
}
