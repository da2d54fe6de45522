//! Cobertura XML report dialect.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::Reader;

use super::{
    numeric_attr, read_report, required_attr, resolve_source, xml_error, CoverageParser,
    SourcePolicy,
};
use crate::error::ReportError;
use crate::source::{SourceCallback, SourceFile};
use crate::source_loader::SourceLoader;

/// Parser for Cobertura XML reports.
///
/// Coverage lives on `<line number=".." hits=".."/>` elements under each
/// `<class filename="..">`. Lines nested in `<methods>` repeat the
/// class-level lines and are ignored. Inner classes share their outer
/// class's filename, so records are merged per filename within the report
/// and emitted in first-appearance order. Resolution policy:
/// [`SourcePolicy::Strict`].
pub struct CoberturaParser<'a> {
    report: PathBuf,
    loader: &'a SourceLoader<'a>,
    policy: SourcePolicy,
}

impl<'a> CoberturaParser<'a> {
    /// Creates a parser for `report`.
    pub fn new(report: PathBuf, loader: &'a SourceLoader<'a>) -> Self {
        Self { report, loader, policy: SourcePolicy::Strict }
    }

    fn line_event(
        &self,
        element: &quick_xml::events::BytesStart<'_>,
        source: &mut SourceFile,
    ) -> Result<(), ReportError> {
        let number = required_attr(&self.report, element, "number")?;
        let hits = required_attr(&self.report, element, "hits")?;
        let number: usize = numeric_attr(&self.report, "number", &number)?;
        let hits: u32 = numeric_attr(&self.report, "hits", &hits)?;
        source.add_coverage(number, hits)?;
        Ok(())
    }
}

impl CoverageParser for CoberturaParser<'_> {
    fn parse(&mut self, callback: &mut dyn SourceCallback) -> Result<(), ReportError> {
        let text = read_report(&self.report)?;
        let mut reader = Reader::from_str(&text);
        reader.trim_text(true);

        let mut order: Vec<String> = Vec::new();
        let mut sources: HashMap<String, SourceFile> = HashMap::new();
        let mut current: Option<String> = None;
        let mut in_methods = false;
        let mut skipped = Vec::new();

        loop {
            match reader.read_event().map_err(|err| xml_error(&self.report, &err))? {
                Event::Start(element) => match element.name().as_ref() {
                    b"class" => {
                        let filename = required_attr(&self.report, &element, "filename")?;
                        if !sources.contains_key(&filename) {
                            if let Some(source) = resolve_source(
                                self.loader,
                                &self.report,
                                &filename,
                                self.policy,
                                &mut skipped,
                            )? {
                                order.push(filename.clone());
                                sources.insert(filename.clone(), source);
                            }
                        }
                        current = Some(filename);
                    }
                    b"methods" => in_methods = true,
                    b"line" if !in_methods => {
                        if let Some(source) =
                            current.as_ref().and_then(|name| sources.get_mut(name))
                        {
                            self.line_event(&element, source)?;
                        }
                    }
                    _ => {}
                },
                Event::Empty(element) => {
                    if element.name().as_ref() == b"line" && !in_methods {
                        if let Some(source) =
                            current.as_ref().and_then(|name| sources.get_mut(name))
                        {
                            self.line_event(&element, source)?;
                        }
                    }
                }
                Event::End(element) => match element.name().as_ref() {
                    b"methods" => in_methods = false,
                    b"class" => current = None,
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }

        for name in order {
            if let Some(source) = sources.remove(&name) {
                callback.on_source(source)?;
            }
        }
        Ok(())
    }

    fn report_path(&self) -> &Path {
        &self.report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::live::LiveFileSystem;
    use crate::error::ProcessingError;

    struct Collecting(Vec<SourceFile>);

    impl SourceCallback for Collecting {
        fn on_source(&mut self, source: SourceFile) -> Result<(), ReportError> {
            self.0.push(source);
            Ok(())
        }
    }

    const REPORT: &str = r#"<?xml version="1.0"?>
<coverage line-rate="0.5" version="2.1.1">
  <packages>
    <package name="com.example">
      <classes>
        <class name="com.example.Foo" filename="com/example/Foo.java" line-rate="0.5">
          <methods>
            <method name="bar" signature="()V">
              <lines><line number="2" hits="3"/></lines>
            </method>
          </methods>
          <lines>
            <line number="1" hits="1" branch="false"/>
            <line number="2" hits="3" branch="false"/>
            <line number="4" hits="0" branch="false"/>
          </lines>
        </class>
        <class name="com.example.Foo$Inner" filename="com/example/Foo.java" line-rate="0.5">
          <lines>
            <line number="5" hits="2" branch="false"/>
          </lines>
        </class>
      </classes>
    </package>
  </packages>
</coverage>
"#;

    fn fixture(report: &str, sources: &[(&str, &str)]) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let report_path = dir.path().join("cobertura.xml");
        std::fs::write(&report_path, report).unwrap();
        for (name, content) in sources {
            let path = dir.path().join("src").join(name);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }
        (dir, report_path)
    }

    #[test]
    fn parses_class_lines_and_merges_inner_classes() {
        let (dir, report) =
            fixture(REPORT, &[("com/example/Foo.java", "a\nb\nc\nd\ne\n")]);
        let fs = LiveFileSystem;
        let loader = SourceLoader::new(&fs, vec![dir.path().join("src")], "UTF-8");
        let mut parser = CoberturaParser::new(report, &loader);
        let mut callback = Collecting(Vec::new());

        parser.parse(&mut callback).unwrap();

        assert_eq!(callback.0.len(), 1);
        let file = &callback.0[0];
        assert_eq!(file.name(), "com/example/Foo.java");
        assert_eq!(
            file.coverage(),
            &[Some(1), Some(3), None, Some(0), Some(2)]
        );
    }

    #[test]
    fn missing_source_is_fatal() {
        let (dir, report) = fixture(REPORT, &[]);
        let fs = LiveFileSystem;
        let loader = SourceLoader::new(&fs, vec![dir.path().join("src")], "UTF-8");
        let mut parser = CoberturaParser::new(report, &loader);
        let mut callback = Collecting(Vec::new());

        let err = parser.parse(&mut callback).unwrap_err();
        assert!(matches!(
            err,
            ReportError::Processing(ProcessingError::SourceNotFound { source_path, .. })
                if source_path == "com/example/Foo.java"
        ));
    }

    #[test]
    fn non_numeric_hits_are_malformed() {
        let bad = REPORT.replace("hits=\"1\"", "hits=\"lots\"");
        let (dir, report) = fixture(&bad, &[("com/example/Foo.java", "a\nb\nc\nd\ne\n")]);
        let fs = LiveFileSystem;
        let loader = SourceLoader::new(&fs, vec![dir.path().join("src")], "UTF-8");
        let mut parser = CoberturaParser::new(report, &loader);
        let mut callback = Collecting(Vec::new());

        let err = parser.parse(&mut callback).unwrap_err();
        assert!(matches!(
            err,
            ReportError::Processing(ProcessingError::MalformedReport { .. })
        ));
    }

    #[test]
    fn mismatched_end_tag_is_malformed() {
        let unbalanced = REPORT.replace("</classes>", "</clazzes>");
        let (dir, report) =
            fixture(&unbalanced, &[("com/example/Foo.java", "a\nb\nc\nd\ne\n")]);
        let fs = LiveFileSystem;
        let loader = SourceLoader::new(&fs, vec![dir.path().join("src")], "UTF-8");
        let mut parser = CoberturaParser::new(report, &loader);
        let mut callback = Collecting(Vec::new());

        assert!(parser.parse(&mut callback).is_err());
    }
}
