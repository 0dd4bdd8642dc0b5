//! Reader for the html5lib tree-construction `.dat` format.
//!
//! ```text
//! #data
//! <p>One<p>Two
//! #errors
//! (1,3): expected-doctype-but-got-start-tag
//! #document
//! | <html>
//! |   <head>
//! |   <body>
//! |     <p>
//! |       "One"
//! |     <p>
//! |       "Two"
//! ```

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TestCase {
    pub input: String,
    pub errors: Vec<String>,
    /// `#document-fragment`, in html5lib notation (`td`, `svg path`).
    pub fragment_context: Option<String>,
    /// `Some(true)` for `#script-on`, `Some(false)` for `#script-off`.
    pub scripting: Option<bool>,
    /// The `#document` section, one `| ` line per node, newline-terminated.
    pub expected_document: String,
    /// Line on which the test's `#data` section starts.
    pub line_number: usize,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Data,
    Errors,
    Fragment,
    Document,
    Ignored,
}

pub fn parse_test_file(content: &str) -> Vec<TestCase> {
    let mut tests = Vec::new();
    let mut current: Option<TestCase> = None;
    let mut data_lines: Vec<&str> = Vec::new();
    let mut document_lines: Vec<&str> = Vec::new();
    let mut section = Section::Ignored;

    for (index, line) in content.lines().enumerate() {
        let line_number = index + 1;

        if line == "#data" {
            if let Some(test) = current.take() {
                tests.push(finish(test, &mut data_lines, &mut document_lines));
            }
            current = Some(TestCase {
                line_number,
                ..TestCase::default()
            });
            section = Section::Data;
            continue;
        }

        let Some(test) = current.as_mut() else {
            continue;
        };

        match line {
            "#errors" => section = Section::Errors,
            "#new-errors" => section = Section::Ignored,
            "#document-fragment" => section = Section::Fragment,
            "#document" => section = Section::Document,
            "#script-on" => {
                test.scripting = Some(true);
                section = Section::Ignored;
            }
            "#script-off" => {
                test.scripting = Some(false);
                section = Section::Ignored;
            }
            _ => match section {
                Section::Data => data_lines.push(line),
                Section::Errors if !line.is_empty() => test.errors.push(line.to_owned()),
                Section::Fragment if !line.is_empty() => {
                    test.fragment_context = Some(line.to_owned())
                }
                Section::Document => document_lines.push(line),
                _ => {}
            },
        }
    }

    if let Some(test) = current.take() {
        tests.push(finish(test, &mut data_lines, &mut document_lines));
    }
    tests
}

/// Lines of a multi-line text node are kept as they are; only the blank
/// line separating tests is dropped.
fn finish(mut test: TestCase, data_lines: &mut Vec<&str>, document_lines: &mut Vec<&str>) -> TestCase {
    test.input = data_lines.join("\n");
    data_lines.clear();

    while document_lines.last().is_some_and(|line| line.is_empty()) {
        document_lines.pop();
    }
    for line in document_lines.drain(..) {
        test.expected_document.push_str(line);
        test.expected_document.push('\n');
    }
    test
}

#[cfg(test)]
mod test {
    use super::*;

    const FILE: &str = "#data
<p>One
#errors
(1,3): expected-doctype-but-got-start-tag
#document
| <html>
|   <head>
|   <body>
|     <p>
|       \"One\"

#data
<b>
#errors
#document-fragment
td
#script-on
#document
| <b>
";

    #[test]
    fn reads_every_section() {
        let tests = parse_test_file(FILE);
        assert_eq!(tests.len(), 2);

        assert_eq!(tests[0].input, "<p>One");
        assert_eq!(tests[0].line_number, 1);
        assert_eq!(tests[0].errors, vec!["(1,3): expected-doctype-but-got-start-tag"]);
        assert_eq!(
            tests[0].expected_document,
            "| <html>\n|   <head>\n|   <body>\n|     <p>\n|       \"One\"\n"
        );

        assert_eq!(tests[1].line_number, 12);
        assert_eq!(tests[1].fragment_context.as_deref(), Some("td"));
        assert_eq!(tests[1].scripting, Some(true));
        assert_eq!(tests[1].expected_document, "| <b>\n");
    }

    #[test]
    fn multi_line_text_nodes_stay_together() {
        let tests = parse_test_file("#data\na\n\nb\n#errors\n#document\n| <html>\n|   \"a\n\nb\"\n");
        assert_eq!(tests[0].input, "a\n\nb");
        assert_eq!(tests[0].expected_document, "| <html>\n|   \"a\n\nb\"\n");
    }
}
