//! A single character source with one character of look-ahead.

use tracing::trace;

use crate::{Entity, EntityKind, EntityResolver, Location, SourceError, decode};

/// One open input: the decoded text of an entity and a cursor into it.
///
/// `current()` is the look-ahead character; `None` is the end-of-input
/// sentinel and never collides with a real character.
#[derive(Debug, Clone)]
pub struct CharSource {
    /// Name of the entity this source was opened on.
    name: String,
    /// Resolved URI, used as the base for relative references inside it.
    uri: Option<String>,
    /// Opened on a declared entity rather than given as text.
    from_entity: bool,
    text: String,
    /// Byte offset of `current` in `text`.
    pos: usize,
    current: Option<char>,
    location: Location,
}

impl CharSource {
    /// A source over in-memory text, positioned on its first character.
    pub fn from_text(name: impl Into<String>, uri: Option<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let current = text.chars().next();
        Self {
            name: name.into(),
            uri,
            from_entity: false,
            text,
            pos: 0,
            current,
            location: Location::start(),
        }
    }

    /// Open `entity`, resolving external ones relative to `base`.
    ///
    /// Internal entities inherit `base` so that references inside their
    /// replacement text resolve against the declaring source.
    pub fn open(
        entity: &Entity,
        base: Option<&str>,
        resolver: &dyn EntityResolver,
    ) -> Result<Self, SourceError> {
        match entity.kind() {
            EntityKind::Internal { literal } => Ok(Self {
                from_entity: true,
                ..Self::from_text(entity.name(), base.map(str::to_owned), literal.clone())
            }),
            EntityKind::External {
                public_id,
                system_id,
            } => {
                let resolved = resolver.resolve(base, public_id.as_deref(), system_id.as_deref())?;
                let text = decode(&resolved.uri, &resolved.bytes)?;
                trace!(entity = entity.name(), uri = %resolved.uri, len = text.len(), "opened external entity");
                Ok(Self {
                    from_entity: true,
                    ..Self::from_text(entity.name(), Some(resolved.uri), text)
                })
            }
        }
    }

    /// Name of the entity this source was opened on.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// URI relative references inside this source resolve against.
    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    /// Whether this source was opened on a declared entity by [`open`](Self::open).
    pub fn is_entity(&self) -> bool {
        self.from_entity
    }

    /// The full decoded text of this source.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The look-ahead character, `None` at end of input.
    #[inline]
    pub fn current(&self) -> Option<char> {
        self.current
    }

    /// Position of the look-ahead character.
    #[inline]
    pub fn location(&self) -> Location {
        self.location
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.current.is_none()
    }

    /// Advance past the look-ahead character and return the new one.
    pub fn read_char(&mut self) -> Option<char> {
        if let Some(c) = self.current {
            self.pos += c.len_utf8();
            self.location.advance(c);
        }
        self.current = self.text[self.pos..].chars().next();
        self.current
    }

    /// Text from the look-ahead character to the end.
    #[inline]
    pub(crate) fn rest(&self) -> &str {
        &self.text[self.pos..]
    }

    /// Advance past `n` characters.
    pub(crate) fn skip_chars(&mut self, n: usize) {
        for _ in 0..n {
            self.read_char();
        }
    }
}
