//! Diagnostic rendering for DTD errors.

use ariadne::{Color, Config, Label, Report, ReportKind, Source};

use crate::{DtdError, DtdErrorKind, SUBSET_NAME};

/// Get ariadne config, respecting NO_COLOR env var.
fn ariadne_config() -> Config {
    let no_color = std::env::var("NO_COLOR").is_ok();
    if no_color {
        Config::default().with_color(false)
    } else {
        Config::default()
    }
}

impl DtdError {
    /// Render this error with ariadne.
    ///
    /// `source` is the text of [`source_frame`](Self::source_frame): the DTD,
    /// or the internal subset when the error was raised there. The label
    /// points at the position reached in it; the parameter entities the error
    /// was raised in are added as notes.
    pub fn render(&self, filename: &str, source: &str) -> String {
        let mut output = Vec::new();
        self.write_report(filename, source, &mut output);
        String::from_utf8(output).unwrap_or_else(|_| format!("{}", self))
    }

    /// Write the error report to a writer.
    pub fn write_report<W: std::io::Write>(&self, filename: &str, source: &str, writer: W) {
        let report = self.build_report(filename, source);
        let _ = report
            .with_config(ariadne_config())
            .finish()
            .write((filename, Source::from(source)), writer);
    }

    fn build_report<'a>(
        &self,
        filename: &'a str,
        source: &str,
    ) -> ariadne::ReportBuilder<'static, (&'a str, std::ops::Range<usize>)> {
        let range = self.char_range(source);

        let (label, help) = match &self.kind {
            DtdErrorKind::Syntax { .. } => ("here", None),
            DtdErrorKind::EntityResolution { .. } => (
                "referenced here",
                Some("declare the entity before it is used, or check that its system identifier can be read"),
            ),
            DtdErrorKind::Scope { .. } => (
                "in this declaration",
                Some("a parameter entity must close every group it opens, and only those"),
            ),
            DtdErrorKind::GroupTypeConflict { .. } => (
                "conflicting connector",
                Some("use one connector per group; nest a group to mix them"),
            ),
            DtdErrorKind::DuplicateElement { .. } => ("declared again here", None),
            DtdErrorKind::DuplicateEntity { .. } => ("declared again here", None),
            DtdErrorKind::UndefinedElement { .. } => (
                "in this ATTLIST",
                Some("declare the element before its attribute list"),
            ),
            DtdErrorKind::UnsupportedFeature { .. } => ("here", None),
        };

        let mut builder = Report::build(ReportKind::Error, (filename, range.clone()))
            .with_message(self.kind.to_string())
            .with_label(
                Label::new((filename, range))
                    .with_message(label)
                    .with_color(Color::Red),
            );
        if let Some(help) = help {
            builder = builder.with_help(help);
        }

        let labelled = self.source_frame();
        for frame in self.context.frames() {
            if labelled.is_some_and(|l| std::ptr::eq(l, frame)) {
                continue;
            }
            if frame.is_entity {
                builder = builder.with_note(format!("in parameter entity {frame}"));
            }
        }
        if labelled.is_some_and(|frame| frame.entity == SUBSET_NAME) {
            builder = builder.with_note("in the internal subset, read before the DTD");
        }
        builder
    }

    /// One-character range at the error position, in characters.
    fn char_range(&self, source: &str) -> std::ops::Range<usize> {
        let offset = self
            .location()
            .map(|location| location.offset as usize)
            .unwrap_or(source.len())
            .min(source.len());
        let start = source
            .char_indices()
            .take_while(|(i, _)| *i < offset)
            .count();
        start..start + 1
    }
}
