//! Resolution of external entities to byte streams.

use std::collections::HashMap;

use tracing::debug;

use crate::SourceError;

/// The bytes of an external entity and the URI they were read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEntity {
    /// Absolute (or base-relative) URI; becomes the base for nested references.
    pub uri: String,
    /// Raw, undecoded content.
    pub bytes: Vec<u8>,
}

/// Supplies the content of external entities.
///
/// `base` is the URI of the source containing the reference, if known.
pub trait EntityResolver: Send + Sync {
    fn resolve(
        &self,
        base: Option<&str>,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> Result<ResolvedEntity, SourceError>;
}

/// Join a system identifier to the directory of `base`.
///
/// Identifiers with a URI scheme or a leading `/` are returned unchanged.
pub fn resolve_uri(base: Option<&str>, system_id: &str) -> String {
    if is_absolute(system_id) {
        return system_id.to_string();
    }
    match base.and_then(|b| b.rfind('/').map(|slash| &b[..=slash])) {
        Some(dir) => format!("{dir}{system_id}"),
        None => system_id.to_string(),
    }
}

fn is_absolute(id: &str) -> bool {
    if id.starts_with('/') {
        return true;
    }
    match id.find(':') {
        Some(colon) if colon > 0 => {
            let scheme = &id[..colon];
            scheme.starts_with(|c: char| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}

/// Reads external entities from the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileResolver;

impl EntityResolver for FileResolver {
    fn resolve(
        &self,
        base: Option<&str>,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> Result<ResolvedEntity, SourceError> {
        let Some(system_id) = system_id else {
            return Err(SourceError::MissingSystemId {
                public_id: public_id.map(str::to_owned),
            });
        };
        let uri = resolve_uri(base, system_id);
        let path = uri.strip_prefix("file://").unwrap_or(&uri);
        debug!(%uri, "reading external entity");
        let bytes = std::fs::read(path).map_err(|error| SourceError::Io {
            uri: uri.clone(),
            error,
        })?;
        Ok(ResolvedEntity { uri, bytes })
    }
}

/// Serves external entities from memory, keyed by public identifier or URI.
///
/// Public identifiers take precedence, so a catalog of well-known entity
/// sets can be registered once and used regardless of system identifiers.
#[derive(Debug, Clone, Default)]
pub struct MemoryResolver {
    by_public_id: HashMap<String, Vec<u8>>,
    by_uri: HashMap<String, Vec<u8>>,
}

impl MemoryResolver {
    /// An empty resolver; every lookup fails until content is registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register content under a system identifier or resolved URI.
    pub fn with_system(mut self, uri: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.by_uri.insert(uri.into(), bytes.into());
        self
    }

    /// Register content under a public identifier.
    pub fn with_public(mut self, public_id: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.by_public_id.insert(public_id.into(), bytes.into());
        self
    }
}

impl EntityResolver for MemoryResolver {
    fn resolve(
        &self,
        base: Option<&str>,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> Result<ResolvedEntity, SourceError> {
        let uri = system_id.map(|id| resolve_uri(base, id));

        if let Some(bytes) = public_id.and_then(|id| self.by_public_id.get(id)) {
            let uri = uri
                .or_else(|| public_id.map(str::to_owned))
                .unwrap_or_default();
            return Ok(ResolvedEntity {
                uri,
                bytes: bytes.clone(),
            });
        }

        let (Some(system_id), Some(uri)) = (system_id, uri) else {
            return Err(SourceError::MissingSystemId {
                public_id: public_id.map(str::to_owned),
            });
        };
        let bytes = self
            .by_uri
            .get(&uri)
            .or_else(|| self.by_uri.get(system_id))
            .ok_or_else(|| SourceError::Io {
                uri: uri.clone(),
                error: std::io::Error::new(std::io::ErrorKind::NotFound, "not registered"),
            })?;
        Ok(ResolvedEntity {
            uri,
            bytes: bytes.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;

    #[test]
    fn test_resolve_uri_relative_to_base_directory() {
        assert_eq!(
            resolve_uri(Some("file:///dtd/html.dtd"), "lat1.ent"),
            "file:///dtd/lat1.ent"
        );
        assert_eq!(resolve_uri(Some("dtd/html.dtd"), "sub/x.ent"), "dtd/sub/x.ent");
        assert_eq!(resolve_uri(Some("html.dtd"), "x.ent"), "x.ent");
        assert_eq!(resolve_uri(None, "x.ent"), "x.ent");
    }

    #[test]
    fn test_resolve_uri_keeps_absolute_ids() {
        assert_eq!(resolve_uri(Some("a/b.dtd"), "/etc/x.ent"), "/etc/x.ent");
        assert_eq!(
            resolve_uri(Some("a/b.dtd"), "http://example.com/x.ent"),
            "http://example.com/x.ent"
        );
    }

    #[test]
    fn test_memory_resolver_prefers_public_id() {
        let resolver = MemoryResolver::new()
            .with_public("-//X//EN", "public")
            .with_system("x.ent", "system");
        let got = resolver.resolve(None, Some("-//X//EN"), Some("x.ent")).unwrap();
        assert_eq!(got.bytes, b"public");
        assert_eq!(got.uri, "x.ent");

        let got = resolver.resolve(None, Some("-//Y//EN"), Some("x.ent")).unwrap();
        assert_eq!(got.bytes, b"system");
    }

    #[test]
    fn test_memory_resolver_uses_base() {
        let resolver = MemoryResolver::new().with_system("dtd/x.ent", "nested");
        let got = resolver.resolve(Some("dtd/main.dtd"), None, Some("x.ent")).unwrap();
        assert_eq!(got.uri, "dtd/x.ent");
        assert_eq!(got.bytes, b"nested");
    }

    #[test]
    fn test_missing_entries() {
        let resolver = MemoryResolver::new();
        assert!(matches!(
            resolver.resolve(None, Some("-//X//EN"), None),
            Err(SourceError::MissingSystemId { .. })
        ));
        assert!(matches!(
            resolver.resolve(None, None, Some("nope.ent")),
            Err(SourceError::Io { .. })
        ));
    }

    #[test]
    fn test_file_resolver_reports_io_errors() {
        let err = FileResolver
            .resolve(None, None, Some("/definitely/not/here.dtd"))
            .unwrap_err();
        assert!(matches!(err, SourceError::Io { ref uri, .. } if uri == "/definitely/not/here.dtd"));
    }
}
