//! Error types for DTD parsing.

use std::fmt;

use sgml_scanner::{Frame, Location, ScanError, SourceError};

use crate::GroupType;

/// The chain of character sources that were open when an error was raised,
/// innermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityContext {
    frames: Vec<Frame>,
}

impl EntityContext {
    /// A context from frames ordered innermost first.
    pub fn new(frames: Vec<Frame>) -> Self {
        Self { frames }
    }

    /// Open sources, innermost first.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// The source the error was raised in.
    pub fn innermost(&self) -> Option<&Frame> {
        self.frames.first()
    }

    /// The top-level source (the DTD itself).
    pub fn outermost(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl fmt::Display for EntityContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for frame in &self.frames {
            write!(f, "\n\tat {frame}")?;
        }
        Ok(())
    }
}

/// Error that can occur while parsing a DTD.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DtdError {
    pub kind: DtdErrorKind,
    pub context: EntityContext,
}

impl DtdError {
    /// An error raised with `context` open.
    pub fn new(kind: DtdErrorKind, context: EntityContext) -> Self {
        Self { kind, context }
    }

    /// The source the error is reported against: the innermost one given as
    /// text (the DTD or the internal subset), or else the outermost.
    pub fn source_frame(&self) -> Option<&Frame> {
        self.context
            .frames()
            .iter()
            .find(|frame| !frame.is_entity)
            .or_else(|| self.context.outermost())
    }

    /// Position in [`source_frame`](Self::source_frame), if any source was open.
    pub fn location(&self) -> Option<Location> {
        self.source_frame().map(|frame| frame.location)
    }
}

impl fmt::Display for DtdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind, self.context)
    }
}

impl std::error::Error for DtdError {}

/// Kind of DTD error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DtdErrorKind {
    /// Something other than what the grammar allows at this point.
    Syntax { message: String },
    /// A parameter entity is undefined or its content cannot be read.
    EntityResolution { name: String, reason: String },
    /// A parameter entity closes a group it did not open, or ends inside
    /// one it opened.
    Scope { entity: String },
    /// A connector contradicts the type already established for its group.
    GroupTypeConflict {
        connector: char,
        established: GroupType,
    },
    DuplicateElement { name: String },
    DuplicateEntity { name: String, parameter: bool },
    /// An ATTLIST names an element that has not been declared.
    UndefinedElement { name: String },
    UnsupportedFeature { feature: String },
}

impl DtdErrorKind {
    /// A syntax error with the given message.
    pub fn syntax(message: impl Into<String>) -> Self {
        DtdErrorKind::Syntax {
            message: message.into(),
        }
    }

    pub(crate) fn resolution(name: &str, error: &SourceError) -> Self {
        DtdErrorKind::EntityResolution {
            name: name.to_string(),
            reason: error.to_string(),
        }
    }
}

impl From<ScanError> for DtdErrorKind {
    fn from(error: ScanError) -> Self {
        DtdErrorKind::Syntax {
            message: error.kind.to_string(),
        }
    }
}

impl fmt::Display for DtdErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DtdErrorKind::Syntax { message } => f.write_str(message),
            DtdErrorKind::EntityResolution { name, reason } => {
                write!(f, "cannot resolve entity '{name}': {reason}")
            }
            DtdErrorKind::Scope { entity } => write!(
                f,
                "parameter entity '%{entity};' cannot close a group outside its own scope"
            ),
            DtdErrorKind::GroupTypeConflict {
                connector,
                established,
            } => write!(
                f,
                "connector '{connector}' is inconsistent with {established} group"
            ),
            DtdErrorKind::DuplicateElement { name } => {
                write!(f, "element '{name}' is already declared")
            }
            DtdErrorKind::DuplicateEntity { name, parameter } => {
                let what = if *parameter {
                    "parameter entity"
                } else {
                    "entity"
                };
                write!(f, "{what} '{name}' is already declared")
            }
            DtdErrorKind::UndefinedElement { name } => {
                write!(f, "ATTLIST references undeclared element '{name}'")
            }
            DtdErrorKind::UnsupportedFeature { feature } => write!(f, "{feature} is not supported"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;

    fn frame(entity: &str, uri: Option<&str>, is_entity: bool, line: u32, column: u32) -> Frame {
        Frame {
            entity: entity.into(),
            uri: uri.map(Into::into),
            is_entity,
            location: Location {
                line,
                column,
                offset: 0,
            },
        }
    }

    #[test]
    fn test_display_includes_context_chain() {
        let err = DtdError::new(
            DtdErrorKind::Scope {
                entity: "model".into(),
            },
            EntityContext::new(vec![
                frame("model", Some("html.dtd"), true, 1, 4),
                frame("html", Some("html.dtd"), false, 12, 20),
            ]),
        );
        assert_eq!(
            err.to_string(),
            "parameter entity '%model;' cannot close a group outside its own scope\n\
             \tat model (html.dtd) line 1, col 4\n\
             \tat html (html.dtd) line 12, col 20"
        );
        assert_eq!(err.location().map(|l| l.line), Some(12));
    }

    #[test]
    fn test_location_is_in_innermost_text_source() {
        let err = DtdError::new(
            DtdErrorKind::syntax("bad"),
            EntityContext::new(vec![
                frame("pe", None, true, 1, 2),
                frame("[subset]", None, false, 3, 8),
                frame("[dtd]", Some("html.dtd"), false, 1, 1),
            ]),
        );
        assert_eq!(err.source_frame().map(|f| f.entity.as_str()), Some("[subset]"));
        assert_eq!(err.location().map(|l| (l.line, l.column)), Some((3, 8)));

        // Only entities open: fall back to the outermost.
        let err = DtdError::new(
            DtdErrorKind::syntax("bad"),
            EntityContext::new(vec![
                frame("pe", None, true, 1, 2),
                frame("HTML", Some("html.dtd"), true, 7, 1),
            ]),
        );
        assert_eq!(err.location().map(|l| l.line), Some(7));
    }

    #[test]
    fn test_scan_errors_become_syntax_errors() {
        let scan = ScanError::new(
            sgml_scanner::ScanErrorKind::InvalidNameStart('1'),
            Location::start(),
        );
        assert_eq!(
            DtdErrorKind::from(scan),
            DtdErrorKind::syntax("invalid name start character '1'")
        );
    }
}
