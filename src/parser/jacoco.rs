//! JaCoCo XML report dialect.

use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::Reader;

use super::{
    attr_value, numeric_attr, read_report, required_attr, resolve_source, xml_error,
    CoverageParser, SourcePolicy,
};
use crate::error::ReportError;
use crate::source::{SourceCallback, SourceFile};
use crate::source_loader::SourceLoader;

/// Parser for JaCoCo XML reports.
///
/// Coverage lives on `<line nr=".." ci=".."/>` elements under
/// `<sourcefile name="..">` inside `<package name="..">`; the source path
/// is the package name joined with the sourcefile name. JaCoCo reports
/// covered-instruction counts, not execution counts, so `ci` serves as the
/// hit count. Resolution policy: [`SourcePolicy::Strict`].
pub struct JacocoParser<'a> {
    report: PathBuf,
    loader: &'a SourceLoader<'a>,
    policy: SourcePolicy,
}

impl<'a> JacocoParser<'a> {
    /// Creates a parser for `report`.
    pub fn new(report: PathBuf, loader: &'a SourceLoader<'a>) -> Self {
        Self { report, loader, policy: SourcePolicy::Strict }
    }

    fn line_event(
        &self,
        element: &quick_xml::events::BytesStart<'_>,
        source: &mut SourceFile,
    ) -> Result<(), ReportError> {
        let nr = required_attr(&self.report, element, "nr")?;
        let nr: usize = numeric_attr(&self.report, "nr", &nr)?;
        let ci = match attr_value(&self.report, element, "ci")? {
            Some(value) => numeric_attr(&self.report, "ci", &value)?,
            None => 0,
        };
        source.add_coverage(nr, ci)?;
        Ok(())
    }
}

impl CoverageParser for JacocoParser<'_> {
    fn parse(&mut self, callback: &mut dyn SourceCallback) -> Result<(), ReportError> {
        let text = read_report(&self.report)?;
        let mut reader = Reader::from_str(&text);
        reader.trim_text(true);

        let mut package: Option<String> = None;
        let mut current: Option<SourceFile> = None;
        let mut skipped = Vec::new();

        loop {
            match reader.read_event().map_err(|err| xml_error(&self.report, &err))? {
                Event::Start(element) => match element.name().as_ref() {
                    b"package" => {
                        package = Some(required_attr(&self.report, &element, "name")?);
                    }
                    b"sourcefile" => {
                        let file = required_attr(&self.report, &element, "name")?;
                        let name = match package.as_deref() {
                            Some("") | None => file,
                            Some(package) => format!("{package}/{file}"),
                        };
                        current = resolve_source(
                            self.loader,
                            &self.report,
                            &name,
                            self.policy,
                            &mut skipped,
                        )?;
                    }
                    b"line" => {
                        if let Some(source) = current.as_mut() {
                            self.line_event(&element, source)?;
                        }
                    }
                    _ => {}
                },
                Event::Empty(element) => {
                    if element.name().as_ref() == b"line" {
                        if let Some(source) = current.as_mut() {
                            self.line_event(&element, source)?;
                        }
                    }
                }
                Event::End(element) => match element.name().as_ref() {
                    b"sourcefile" => {
                        if let Some(source) = current.take() {
                            callback.on_source(source)?;
                        }
                    }
                    b"package" => package = None,
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(())
    }

    fn report_path(&self) -> &Path {
        &self.report
    }
}
