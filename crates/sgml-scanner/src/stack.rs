//! The stack of open character sources that implements entity inclusion.

use std::fmt;

use tracing::trace;

use crate::{CharSource, Entity, EntityResolver, Location, SourceError};

/// Default bound on the number of simultaneously open sources.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// A snapshot of one open source, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
pub struct Frame {
    /// Entity name the source was opened on.
    pub entity: String,
    pub uri: Option<String>,
    /// Opened on a declared entity rather than given as text.
    pub is_entity: bool,
    /// Position of the look-ahead character when the snapshot was taken.
    pub location: Location,
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.entity)?;
        if let Some(uri) = &self.uri {
            write!(f, " ({uri})")?;
        }
        write!(f, " {}", self.location)
    }
}

/// Open character sources, innermost on top.
///
/// The top of the stack is the current source. When the stack is empty
/// `current()` is an exhausted source, so callers always observe end of input
/// rather than having to special-case an empty stack.
#[derive(Debug)]
pub struct SourceStack {
    frames: Vec<CharSource>,
    exhausted: CharSource,
    max_depth: usize,
}

impl Default for SourceStack {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceStack {
    /// An empty stack bounded by [`DEFAULT_MAX_DEPTH`].
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }

    /// An empty stack that holds at most `max_depth` sources.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            frames: Vec::new(),
            exhausted: CharSource::from_text("", None, ""),
            max_depth,
        }
    }

    /// Number of open sources.
    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The current source.
    #[inline]
    pub fn current(&self) -> &CharSource {
        self.frames.last().unwrap_or(&self.exhausted)
    }

    /// The current source, mutably.
    #[inline]
    pub fn current_mut(&mut self) -> &mut CharSource {
        match self.frames.last_mut() {
            Some(top) => top,
            None => &mut self.exhausted,
        }
    }

    /// Make `source` current.
    pub fn push_source(&mut self, source: CharSource) -> Result<(), SourceError> {
        if self.frames.len() >= self.max_depth {
            return Err(SourceError::TooDeep {
                limit: self.max_depth,
            });
        }
        trace!(
            entity = source.name(),
            depth = self.frames.len() + 1,
            "push source"
        );
        self.frames.push(source);
        Ok(())
    }

    /// Open `entity` relative to the current base URI and make it current.
    pub fn push(&mut self, entity: &Entity, resolver: &dyn EntityResolver) -> Result<(), SourceError> {
        if self.frames.len() >= self.max_depth {
            return Err(SourceError::TooDeep {
                limit: self.max_depth,
            });
        }
        let source = CharSource::open(entity, self.base_uri(), resolver)?;
        self.push_source(source)
    }

    /// Close the current source and return it; the previous one becomes current.
    pub fn pop(&mut self) -> Option<CharSource> {
        let popped = self.frames.pop()?;
        trace!(entity = popped.name(), depth = self.frames.len(), "pop source");
        Some(popped)
    }

    /// URI of the innermost source that has one.
    pub fn base_uri(&self) -> Option<&str> {
        self.frames.iter().rev().find_map(|s| s.uri())
    }

    /// Describe the open sources, innermost first.
    pub fn context(&self) -> Vec<Frame> {
        self.frames
            .iter()
            .rev()
            .map(|s| Frame {
                entity: s.name().to_string(),
                uri: s.uri().map(str::to_owned),
                is_entity: s.is_entity(),
                location: s.location(),
            })
            .collect()
    }

    /// Close every open source.
    pub fn close_all(&mut self) {
        while self.pop().is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryResolver;
    use facet_testhelpers::test;

    #[test]
    fn test_push_pop_is_lifo() {
        let mut stack = SourceStack::new();
        assert!(stack.current().is_eof());

        stack
            .push_source(CharSource::from_text("outer", Some("a/outer.dtd".into()), "o"))
            .unwrap();
        stack
            .push(&Entity::internal("inner", "i"), &MemoryResolver::new())
            .unwrap();
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.current().current(), Some('i'));
        assert!(stack.context()[0].is_entity);
        // Internal entities inherit the base of the source that referenced them.
        assert_eq!(stack.current().uri(), Some("a/outer.dtd"));

        assert_eq!(stack.pop().map(|s| s.name().to_string()).as_deref(), Some("inner"));
        assert_eq!(stack.current().current(), Some('o'));
        assert!(stack.pop().is_some());
        assert!(stack.pop().is_none());
        assert!(stack.current().is_eof());
    }

    #[test]
    fn test_context_is_innermost_first() {
        let mut stack = SourceStack::new();
        stack
            .push_source(CharSource::from_text("main", Some("main.dtd".into()), "x"))
            .unwrap();
        stack.push_source(CharSource::from_text("p", None, "yz")).unwrap();
        stack.current_mut().read_char();

        let context = stack.context();
        assert_eq!(context.len(), 2);
        assert_eq!(context[0].entity, "p");
        assert_eq!(context[0].location.column, 2);
        assert!(!context[0].is_entity);
        assert_eq!(context[1].entity, "main");
        assert_eq!(context[1].to_string(), "main (main.dtd) line 1, col 1");
    }

    #[test]
    fn test_depth_limit() {
        let mut stack = SourceStack::with_max_depth(2);
        stack.push_source(CharSource::from_text("a", None, "")).unwrap();
        stack.push_source(CharSource::from_text("b", None, "")).unwrap();
        let err = stack
            .push(&Entity::internal("c", ""), &MemoryResolver::new())
            .unwrap_err();
        assert!(matches!(err, SourceError::TooDeep { limit: 2 }));
        stack.close_all();
        assert!(stack.is_empty());
    }

    #[test]
    fn test_unresolvable_external_entity_is_not_pushed() {
        let mut stack = SourceStack::new();
        let entity = Entity::external("missing", None, Some("missing.ent".into()));
        assert!(stack.push(&entity, &MemoryResolver::new()).is_err());
        assert_eq!(stack.depth(), 0);
    }
}
