//! Lexical primitives over a single character source.
//!
//! None of these cross entity boundaries: they stop at the end of the
//! current source. Callers that need to see through parameter entity
//! references push and pop sources themselves.

use tracing::trace;

use crate::{CharSource, ScanError, ScanErrorKind};

/// Characters skipped by [`CharSource::skip_whitespace`].
pub const WHITESPACE: &str = " \r\n\t";

#[inline]
pub fn is_whitespace(c: char) -> bool {
    WHITESPACE.contains(c)
}

/// Whether `c` may start a name.
#[inline]
pub fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == ':'
}

/// Whether `c` may appear after the first character of a name.
#[inline]
pub fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | ':')
}

/// Which characters a token may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameRule {
    /// A name: letter, `_` or `:` first, then name characters.
    Name,
    /// Anything up to a terminator.
    Any,
}

impl CharSource {
    fn scan_error(&self, kind: ScanErrorKind) -> ScanError {
        ScanError::new(kind, self.location())
    }

    /// Skip spaces, tabs and line ends; return the first other character.
    pub fn skip_whitespace(&mut self) -> Option<char> {
        while let Some(c) = self.current() {
            if !is_whitespace(c) {
                break;
            }
            self.read_char();
        }
        self.current()
    }

    /// Accumulate characters until one in `terminators` or the end of input.
    ///
    /// The terminator is left as the current character. The token is returned
    /// as written; callers fold names to their canonical case.
    pub fn scan_token(&mut self, terminators: &str, rule: NameRule) -> Result<String, ScanError> {
        let first = match self.current() {
            None => {
                let expected = match rule {
                    NameRule::Name => "a name",
                    NameRule::Any => "a token",
                };
                return Err(self.scan_error(ScanErrorKind::UnexpectedEof { expected }));
            }
            Some(c) => c,
        };
        if terminators.contains(first) {
            let kind = match rule {
                NameRule::Name => ScanErrorKind::InvalidNameStart(first),
                NameRule::Any => ScanErrorKind::ExpectedToken(first),
            };
            return Err(self.scan_error(kind));
        }
        if rule == NameRule::Name && !is_name_start(first) {
            return Err(self.scan_error(ScanErrorKind::InvalidNameStart(first)));
        }

        let mut token = String::new();
        while let Some(c) = self.current() {
            if terminators.contains(c) {
                break;
            }
            if rule == NameRule::Name && !is_name_char(c) {
                return Err(self.scan_error(ScanErrorKind::InvalidNameChar(c)));
            }
            token.push(c);
            self.read_char();
        }
        trace!(%token, "scanned token");
        Ok(token)
    }

    /// Scan a quoted literal; the current character must be the opening quote.
    ///
    /// Numeric character references (`&#38;`, `&#x26;`) are expanded. Any
    /// other `&` is kept as written.
    pub fn scan_literal(&mut self) -> Result<String, ScanError> {
        let quote = match self.current() {
            Some(q @ ('"' | '\'')) => q,
            Some(c) => return Err(self.scan_error(ScanErrorKind::ExpectedLiteral(c))),
            None => {
                return Err(self.scan_error(ScanErrorKind::UnexpectedEof {
                    expected: "a quoted literal",
                }));
            }
        };
        let line = self.location().line;
        self.read_char();

        let mut literal = String::new();
        loop {
            match self.current() {
                None => return Err(self.scan_error(ScanErrorKind::UnterminatedLiteral { line })),
                Some(c) if c == quote => {
                    self.read_char();
                    return Ok(literal);
                }
                Some('&') if self.rest().starts_with("&#") => match self.char_ref()? {
                    Some(c) => literal.push(c),
                    None => {
                        literal.push('&');
                        self.read_char();
                    }
                },
                Some(c) => {
                    literal.push(c);
                    self.read_char();
                }
            }
        }
    }

    /// Expand a numeric character reference at the current `&#`.
    ///
    /// Returns `None`, consuming nothing, when no digits follow.
    fn char_ref(&mut self) -> Result<Option<char>, ScanError> {
        let body = &self.rest()[2..];
        let (radix, prefix) = if body.starts_with(['x', 'X']) {
            (16, 1)
        } else {
            (10, 0)
        };
        let digits: String = body[prefix..]
            .chars()
            .take_while(|c| c.is_digit(radix))
            .collect();
        if digits.is_empty() {
            return Ok(None);
        }

        let reference = format!("&#{}{digits}", &body[..prefix]);
        let c = u32::from_str_radix(&digits, radix)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| self.scan_error(ScanErrorKind::InvalidCharRef(reference.clone())))?;

        self.skip_chars(reference.chars().count());
        if self.current() == Some(';') {
            self.read_char();
        }
        Ok(Some(c))
    }

    /// Consume everything up to and including `marker`, returning the text
    /// before it.
    ///
    /// `what` names the construct in the error raised when the source ends
    /// first.
    pub fn scan_to_end(&mut self, what: &'static str, marker: &str) -> Result<String, ScanError> {
        let line = self.location().line;
        let mut text = String::new();
        loop {
            if self.rest().starts_with(marker) {
                self.skip_chars(marker.chars().count());
                return Ok(text);
            }
            match self.current() {
                Some(c) => {
                    text.push(c);
                    self.read_char();
                }
                None => return Err(self.scan_error(ScanErrorKind::Unterminated { what, line })),
            }
        }
    }

    /// Skip the body of an ignored marked section, through the `]]>` that
    /// closes it. The opening `<![ keyword [` has already been consumed.
    ///
    /// Marked sections nested inside are skipped with it.
    pub fn scan_ignored_section(&mut self) -> Result<(), ScanError> {
        let line = self.location().line;
        let mut depth = 1usize;
        loop {
            if self.rest().starts_with("<![") {
                depth += 1;
                self.skip_chars(3);
            } else if self.rest().starts_with("]]>") {
                depth -= 1;
                self.skip_chars(3);
                if depth == 0 {
                    return Ok(());
                }
            } else if self.read_char_or_eof().is_none() {
                return Err(self.scan_error(ScanErrorKind::Unterminated {
                    what: "marked section",
                    line,
                }));
            }
        }
    }

    /// Advance one character; `None` if already at the end.
    fn read_char_or_eof(&mut self) -> Option<()> {
        self.current()?;
        self.read_char();
        Some(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;

    fn src(text: &str) -> CharSource {
        CharSource::from_text("test", None, text)
    }

    #[test]
    fn test_skip_whitespace() {
        let mut s = src(" \t\r\n x");
        assert_eq!(s.skip_whitespace(), Some('x'));
        let mut s = src("   ");
        assert_eq!(s.skip_whitespace(), None);
    }

    #[test]
    fn test_scan_name_stops_at_terminator() {
        let mut s = src("html-4.0:x>rest");
        assert_eq!(s.scan_token(">", NameRule::Name).unwrap(), "html-4.0:x");
        assert_eq!(s.current(), Some('>'));
    }

    #[test]
    fn test_scan_name_stops_at_end_of_input() {
        let mut s = src("ELEMENT");
        assert_eq!(s.scan_token(WHITESPACE, NameRule::Name).unwrap(), "ELEMENT");
        assert!(s.is_eof());
    }

    #[test]
    fn test_scan_name_rejects_bad_characters() {
        let err = src("1abc ").scan_token(WHITESPACE, NameRule::Name).unwrap_err();
        assert_eq!(err.kind, ScanErrorKind::InvalidNameStart('1'));

        let err = src("ab;c ").scan_token(WHITESPACE, NameRule::Name).unwrap_err();
        assert_eq!(err.kind, ScanErrorKind::InvalidNameChar(';'));
        assert_eq!(err.location.column, 3);

        let err = src("").scan_token(WHITESPACE, NameRule::Name).unwrap_err();
        assert_eq!(
            err.kind,
            ScanErrorKind::UnexpectedEof {
                expected: "a name"
            }
        );
    }

    #[test]
    fn test_scan_any_token() {
        let mut s = src("1.5x|y");
        assert_eq!(s.scan_token("|", NameRule::Any).unwrap(), "1.5x");
        let err = s.scan_token("|", NameRule::Any).unwrap_err();
        assert_eq!(err.kind, ScanErrorKind::ExpectedToken('|'));
    }

    #[test]
    fn test_scan_literal_either_quote() {
        let mut s = src("\"a 'b'\" x");
        assert_eq!(s.scan_literal().unwrap(), "a 'b'");
        assert_eq!(s.current(), Some(' '));

        let mut s = src("'say \"hi\"'");
        assert_eq!(s.scan_literal().unwrap(), "say \"hi\"");
        assert!(s.is_eof());
    }

    #[test]
    fn test_scan_literal_expands_char_refs() {
        let mut s = src("\"&#160;&#x41;&#66 &amp; &#;\"");
        assert_eq!(s.scan_literal().unwrap(), "\u{a0}AB &amp; &#;");
    }

    #[test]
    fn test_scan_literal_rejects_invalid_char_ref() {
        let err = src("\"&#xD800;\"").scan_literal().unwrap_err();
        assert_eq!(err.kind, ScanErrorKind::InvalidCharRef("&#xD800".into()));
    }

    #[test]
    fn test_unterminated_literal_reports_start_line() {
        let mut s = src("\n\n\"abc\n");
        s.skip_whitespace();
        let err = s.scan_literal().unwrap_err();
        assert_eq!(err.kind, ScanErrorKind::UnterminatedLiteral { line: 3 });
    }

    #[test]
    fn test_scan_literal_requires_quote() {
        let err = src("abc").scan_literal().unwrap_err();
        assert_eq!(err.kind, ScanErrorKind::ExpectedLiteral('a'));
    }

    #[test]
    fn test_scan_to_end() {
        let mut s = src(" a comment -->after");
        assert_eq!(s.scan_to_end("comment", "-->").unwrap(), " a comment ");
        assert_eq!(s.current(), Some('a'));

        let err = src("never closed").scan_to_end("comment", "-->").unwrap_err();
        assert_eq!(
            err.kind,
            ScanErrorKind::Unterminated {
                what: "comment",
                line: 1
            }
        );
    }

    #[test]
    fn test_ignored_section_counts_nesting() {
        let mut s = src("<!ELEMENT a - - EMPTY> <![ IGNORE [ x ]]> ]]>tail");
        s.scan_ignored_section().unwrap();
        assert_eq!(s.current(), Some('t'));

        let err = src("<![ x ]]>").scan_ignored_section().unwrap_err();
        assert!(matches!(err.kind, ScanErrorKind::Unterminated { .. }));
    }
}
