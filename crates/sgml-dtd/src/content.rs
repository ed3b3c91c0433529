//! Content models: the grammar of an element's children.
//!
//! A content model is a tree of groups stored in an arena. Each group holds
//! its members in source order and the id of its parent; children are
//! reached through the members, never by walking parents.

use std::collections::HashSet;
use std::fmt::{self, Write as _};

use crate::SgmlDtd;

/// How the members of a group are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
#[repr(u8)]
pub enum GroupType {
    /// No connector seen yet (zero or one member).
    #[default]
    None,
    /// `&`: all members, in any order.
    And,
    /// `|`: exactly one member.
    Or,
    /// `,`: all members, in order.
    Sequence,
}

impl GroupType {
    /// The group type a connector character establishes.
    pub fn from_connector(c: char) -> Option<Self> {
        match c {
            ',' => Some(GroupType::Sequence),
            '|' => Some(GroupType::Or),
            '&' => Some(GroupType::And),
            _ => None,
        }
    }

    /// The connector character, `None` for an untyped group.
    pub fn connector(self) -> Option<char> {
        match self {
            GroupType::None => None,
            GroupType::And => Some('&'),
            GroupType::Or => Some('|'),
            GroupType::Sequence => Some(','),
        }
    }
}

impl fmt::Display for GroupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GroupType::None => "an untyped",
            GroupType::And => "an and",
            GroupType::Or => "an or",
            GroupType::Sequence => "a sequence",
        })
    }
}

/// How many times a group may occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
#[repr(u8)]
pub enum Occurrence {
    #[default]
    Required,
    /// `?`
    Optional,
    /// `*`
    ZeroOrMore,
    /// `+`
    OneOrMore,
}

impl Occurrence {
    /// Parse an occurrence indicator.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '?' => Some(Occurrence::Optional),
            '*' => Some(Occurrence::ZeroOrMore),
            '+' => Some(Occurrence::OneOrMore),
            _ => None,
        }
    }

    /// The occurrence indicator, `None` for `Required`.
    pub fn as_char(self) -> Option<char> {
        match self {
            Occurrence::Required => None,
            Occurrence::Optional => Some('?'),
            Occurrence::ZeroOrMore => Some('*'),
            Occurrence::OneOrMore => Some('+'),
        }
    }
}

/// Declared content: a keyword standing in for a model group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
#[repr(u8)]
pub enum DeclaredContent {
    /// The content is described by the model group.
    #[default]
    Default,
    CData,
    RCData,
    Empty,
    Any,
}

impl DeclaredContent {
    /// Parse a declared content keyword. `Default` has no keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "CDATA" => Some(DeclaredContent::CData),
            "RCDATA" => Some(DeclaredContent::RCData),
            "EMPTY" => Some(DeclaredContent::Empty),
            "ANY" => Some(DeclaredContent::Any),
            _ => None,
        }
    }

    /// The declaration keyword, empty for `Default`.
    pub fn as_str(self) -> &'static str {
        match self {
            DeclaredContent::Default => "",
            DeclaredContent::CData => "CDATA",
            DeclaredContent::RCData => "RCDATA",
            DeclaredContent::Empty => "EMPTY",
            DeclaredContent::Any => "ANY",
        }
    }
}

/// Index of a group in its content model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
pub struct GroupId(pub(crate) u32);

impl GroupId {
    /// Position in [`ContentModel::groups`].
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One member of a group.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
#[repr(u8)]
pub enum GroupMember {
    /// An element name.
    Symbol(String),
    /// A nested group.
    Group(GroupId),
}

/// A parenthesized term of a content model, or the implicit group wrapping a
/// symbol with an occurrence indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
pub struct Group {
    pub(crate) parent: Option<GroupId>,
    pub(crate) members: Vec<GroupMember>,
    pub(crate) group_type: GroupType,
    pub(crate) occurrence: Occurrence,
    /// `#PCDATA` appeared in this group.
    pub(crate) mixed: bool,
    /// First parameter entity referenced directly inside this group.
    pub(crate) entity: Option<String>,
}

impl Group {
    pub(crate) fn new(parent: Option<GroupId>) -> Self {
        Self {
            parent,
            members: Vec::new(),
            group_type: GroupType::None,
            occurrence: Occurrence::Required,
            mixed: false,
            entity: None,
        }
    }

    /// The enclosing group, `None` for the root.
    pub fn parent(&self) -> Option<GroupId> {
        self.parent
    }

    /// Members in source order.
    pub fn members(&self) -> &[GroupMember] {
        &self.members
    }

    /// Connector type; `None` until a connector is seen.
    pub fn group_type(&self) -> GroupType {
        self.group_type
    }

    /// Occurrence indicator after the closing `)`.
    pub fn occurrence(&self) -> Occurrence {
        self.occurrence
    }

    /// Whether the group occurs at most once.
    pub fn occurrence_is_once(&self) -> bool {
        matches!(self.occurrence, Occurrence::Required | Occurrence::Optional)
    }

    /// Whether `#PCDATA` appeared in this group.
    pub fn is_mixed(&self) -> bool {
        self.mixed
    }

    /// `(#PCDATA)`: text allowed, no elements.
    pub fn text_only(&self) -> bool {
        self.mixed && self.members.is_empty()
    }

    /// First parameter entity referenced directly inside this group.
    pub fn entity(&self) -> Option<&str> {
        self.entity.as_deref()
    }

    /// Names of the symbol members, in order.
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.members.iter().filter_map(|m| match m {
            GroupMember::Symbol(s) => Some(s.as_str()),
            GroupMember::Group(_) => None,
        })
    }
}

/// The content facet of an element declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
pub struct ContentModel {
    pub(crate) declared: DeclaredContent,
    pub(crate) groups: Vec<Group>,
    pub(crate) root: GroupId,
    /// Parameter entity the whole model was given by, if any.
    pub(crate) entity: Option<String>,
}

impl ContentModel {
    /// Keyword content, or `Default` when the model group applies.
    pub fn declared_content(&self) -> DeclaredContent {
        self.declared
    }

    /// Id of the implicit outermost group.
    pub fn root(&self) -> GroupId {
        self.root
    }

    /// The implicit outermost group.
    pub fn root_group(&self) -> &Group {
        self.group(self.root)
    }

    /// The group with the given id.
    ///
    /// Ids are only meaningful for the model that produced them.
    pub fn group(&self, id: GroupId) -> &Group {
        &self.groups[id.index()]
    }

    /// Every group, root first, in the order they were opened.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Parameter entity that supplied the whole model, if any.
    pub fn entity(&self) -> Option<&str> {
        self.entity.as_deref()
    }

    /// `(#PCDATA)` and nothing else.
    pub fn text_only(&self) -> bool {
        self.declared == DeclaredContent::Default && self.root_group().text_only()
    }

    /// Whether an element with this model may contain `name`.
    ///
    /// See [`ElementDecl::can_contain`](crate::ElementDecl::can_contain).
    pub fn can_contain(&self, name: &str, dtd: &SgmlDtd) -> bool {
        self.can_contain_within(name, dtd, &mut HashSet::new())
    }

    pub(crate) fn can_contain_within(
        &self,
        name: &str,
        dtd: &SgmlDtd,
        visited: &mut HashSet<String>,
    ) -> bool {
        match self.declared {
            DeclaredContent::Default => self.group_can_contain(self.root, name, dtd, visited),
            DeclaredContent::Any => true,
            DeclaredContent::CData | DeclaredContent::RCData | DeclaredContent::Empty => false,
        }
    }

    /// Direct symbol members first, then elements whose start tag may be
    /// omitted (their own content could appear here), then nested groups.
    fn group_can_contain(
        &self,
        id: GroupId,
        name: &str,
        dtd: &SgmlDtd,
        visited: &mut HashSet<String>,
    ) -> bool {
        let group = self.group(id);
        if group.symbols().any(|s| same_name(s, name)) {
            return true;
        }
        group.members.iter().any(|member| match member {
            GroupMember::Symbol(symbol) => dtd
                .find_element(symbol)
                .filter(|decl| decl.start_tag_optional())
                .is_some_and(|decl| decl.can_contain_within(name, dtd, visited)),
            GroupMember::Group(child) => self.group_can_contain(*child, name, dtd, visited),
        })
    }

    fn fmt_group(&self, id: GroupId, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let group = self.group(id);

        // Implicit single-symbol group: `A?` rather than `(A)?`.
        if id != self.root && !group.mixed {
            if let [GroupMember::Symbol(symbol)] = group.members.as_slice() {
                f.write_str(symbol)?;
                return fmt_occurrence(group.occurrence, f);
            }
        }

        let separator = group
            .group_type
            .connector()
            .unwrap_or(if group.mixed { '|' } else { ',' });
        f.write_char('(')?;
        let mut first = true;
        if group.mixed {
            f.write_str("#PCDATA")?;
            first = false;
        }
        for member in &group.members {
            if !first {
                f.write_char(separator)?;
            }
            first = false;
            match member {
                GroupMember::Symbol(symbol) => f.write_str(symbol)?,
                GroupMember::Group(child) => self.fmt_group(*child, f)?,
            }
        }
        f.write_char(')')?;
        fmt_occurrence(group.occurrence, f)
    }
}

fn fmt_occurrence(occurrence: Occurrence, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match occurrence.as_char() {
        Some(c) => f.write_char(c),
        None => Ok(()),
    }
}

/// Case-insensitive name comparison.
pub(crate) fn same_name(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_uppercase)
        .eq(b.chars().flat_map(char::to_uppercase))
}

impl fmt::Display for ContentModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.declared {
            DeclaredContent::Default => self.fmt_group(self.root, f),
            declared => f.write_str(declared.as_str()),
        }
    }
}
