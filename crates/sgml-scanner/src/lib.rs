#![doc = include_str!("../README.md")]

mod location;
pub use location::Location;

mod entity;
pub use entity::{Entity, EntityKind, LiteralType};

mod error;
pub use error::{ScanError, ScanErrorKind, SourceError};

mod decode;
pub use decode::decode;

mod resolver;
pub use resolver::{EntityResolver, FileResolver, MemoryResolver, ResolvedEntity, resolve_uri};

mod source;
pub use source::CharSource;

mod stack;
pub use stack::{DEFAULT_MAX_DEPTH, Frame, SourceStack};

mod scanner;
pub use scanner::{NameRule, WHITESPACE, is_name_char, is_name_start, is_whitespace};
