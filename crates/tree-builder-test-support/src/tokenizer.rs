//! A small HTML tokenizer for driving the tree builder in tests.
//!
//! It understands tags with attributes, comments, DOCTYPEs, CDATA sections
//! in foreign content and the text sub-states the tree builder asks for.
//! Character references are limited to numeric references and a handful of
//! common names.

use html_tree_builder::{
    atom::AtomTable,
    element_name::{classify_interned, ElementName},
    Attribute, Attributes, LexicalState, SourceLocation, SuspendReason, TokenizerControl,
    TreeBuilder, TreeBuilderError, TreeBuilderStepResult, TreeSink,
};
use memchr::{memchr, memchr2, memchr_iter, memmem};

pub struct TestTokenizer {
    input: String,
    position: usize,
    state: LexicalState,
    /// Name of the end tag that leaves RCDATA, RAWTEXT and script data.
    end_tag_name: Option<String>,
    names: AtomTable,
    line: u32,
    column: u32,
    located_up_to: usize,
    /// Suspensions requested by the tree builder, in order.
    pub suspensions: Vec<SuspendReason>,
}

impl TokenizerControl for TestTokenizer {
    fn set_lexical_state(&mut self, state: LexicalState, end_tag_name: Option<&ElementName>) {
        self.state = state;
        self.end_tag_name = end_tag_name.map(|name| name.name().to_string());
    }

    fn request_suspension(&mut self, reason: SuspendReason) {
        self.suspensions.push(reason);
    }
}

impl TestTokenizer {
    /// Normalizes newlines the way the input stream preprocessor does.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.replace("\r\n", "\n").replace('\r', "\n"),
            position: 0,
            state: LexicalState::Data,
            end_tag_name: None,
            names: AtomTable::new(),
            line: 1,
            column: 1,
            located_up_to: 0,
            suspensions: Vec::new(),
        }
    }

    /// Starts in `state`, as a fragment parse with a text context does.
    pub fn with_state(mut self, state: LexicalState, end_tag_name: Option<&str>) -> Self {
        self.state = state;
        self.end_tag_name = end_tag_name.map(str::to_owned);
        self
    }

    /// Feeds the whole input and the end-of-file token to `builder`.
    pub fn run<S: TreeSink>(&mut self, builder: &mut TreeBuilder<S>) -> Result<(), TreeBuilderError> {
        while self.position < self.input.len() {
            self.locate(builder);
            let result = match self.state {
                LexicalState::Data => self.data(builder)?,
                LexicalState::Rcdata => self.text_until_end_tag(builder, true)?,
                LexicalState::Rawtext | LexicalState::ScriptData => {
                    self.text_until_end_tag(builder, false)?
                }
                LexicalState::Plaintext => {
                    let text = self.input[self.position..].replace('\0', "\u{FFFD}");
                    self.position = self.input.len();
                    builder.characters(&text)?
                }
            };
            result.apply_to(self);
        }

        self.locate(builder);
        builder.eof()?.apply_to(self);
        Ok(())
    }

    fn rest(&self) -> &str {
        &self.input[self.position..]
    }

    fn locate<S: TreeSink>(&mut self, builder: &mut TreeBuilder<S>) {
        let consumed = &self.input.as_bytes()[self.located_up_to..self.position];
        match memchr_iter(b'\n', consumed).last() {
            Some(last) => {
                self.line += memchr_iter(b'\n', consumed).count() as u32;
                self.column = (consumed.len() - last) as u32;
            }
            None => self.column += consumed.len() as u32,
        }
        self.located_up_to = self.position;
        builder.set_source_location(Some(SourceLocation {
            line: self.line,
            column: self.column,
        }));
    }

    fn data<S: TreeSink>(
        &mut self,
        builder: &mut TreeBuilder<S>,
    ) -> Result<TreeBuilderStepResult, TreeBuilderError> {
        let bytes = self.rest().as_bytes();
        match memchr2(b'<', b'\0', bytes) {
            Some(0) if bytes[0] == b'\0' => {
                self.position += 1;
                builder.zero_originating_replacement_character()
            }
            Some(0) => self.markup(builder),
            found => {
                let end = self.position + found.unwrap_or(bytes.len());
                let text = decode_character_references(&self.input[self.position..end], false);
                self.position = end;
                builder.characters(&text)
            }
        }
    }

    fn markup<S: TreeSink>(
        &mut self,
        builder: &mut TreeBuilder<S>,
    ) -> Result<TreeBuilderStepResult, TreeBuilderError> {
        let rest = self.rest();
        let next = rest.as_bytes().get(1).copied();
        let after_slash = rest.as_bytes().get(2).copied();

        if rest.starts_with("<!--") {
            let body = &rest[4..];
            let (text, consumed) = match memmem::find(body.as_bytes(), b"-->") {
                Some(end) => (body[..end].to_owned(), 4 + end + 3),
                None => (body.to_owned(), rest.len()),
            };
            self.position += consumed;
            return builder.comment(&text);
        }

        if rest.len() >= 9 && rest[..9].eq_ignore_ascii_case("<!doctype") {
            let end = memchr(b'>', rest.as_bytes()).unwrap_or(rest.len());
            let body = rest[9..end].to_owned();
            let consumed = (end + 1).min(rest.len());
            self.position += consumed;
            return emit_doctype(builder, &body);
        }

        if rest.starts_with("<![CDATA[") && builder.cdata_section_allowed() {
            let body = &rest[9..];
            let (text, consumed) = match memmem::find(body.as_bytes(), b"]]>") {
                Some(end) => (body[..end].to_owned(), 9 + end + 3),
                None => (body.to_owned(), rest.len()),
            };
            self.position += consumed;
            return builder.characters(&text);
        }

        match next {
            Some(b'!') | Some(b'?') => {
                let skip = if next == Some(b'!') { 2 } else { 1 };
                let end = memchr(b'>', rest.as_bytes()).unwrap_or(rest.len());
                let text = rest[skip..end.max(skip)].to_owned();
                let consumed = (end + 1).min(rest.len());
                self.position += consumed;
                builder.comment(&text)
            }

            Some(b'/') => match after_slash {
                Some(c) if c.is_ascii_alphabetic() => {
                    let (name, _, _) = self.tag(2);
                    let name = classify_interned(&name, &mut self.names);
                    builder.end_tag(name)
                }
                Some(b'>') => {
                    self.position += 3;
                    Ok(TreeBuilderStepResult::Continue)
                }
                Some(_) => {
                    let end = memchr(b'>', rest.as_bytes()).unwrap_or(rest.len());
                    let text = rest[2..end.max(2)].to_owned();
                    let consumed = (end + 1).min(rest.len());
                    self.position += consumed;
                    builder.comment(&text)
                }
                None => {
                    self.position = self.input.len();
                    builder.characters("</")
                }
            },

            Some(c) if c.is_ascii_alphabetic() => {
                let (name, attributes, self_closing) = self.tag(1);
                if self.position >= self.input.len() && !self.input.ends_with('>') {
                    // EOF in a tag drops the tag.
                    return Ok(TreeBuilderStepResult::Continue);
                }
                let name = classify_interned(&name, &mut self.names);
                builder.start_tag(name, attributes, self_closing)
            }

            _ => {
                self.position += 1;
                builder.characters("<")
            }
        }
    }

    /// Reads a tag whose name starts `offset` bytes into the rest of the
    /// input, leaving the position after its `>`.
    fn tag(&mut self, offset: usize) -> (String, Attributes, bool) {
        let bytes = self.input.as_bytes();
        let mut at = self.position + offset;
        let name_start = at;
        while at < bytes.len() && !is_tag_delimiter(bytes[at]) {
            at += 1;
        }
        let name = self.input[name_start..at].to_ascii_lowercase().replace('\0', "\u{FFFD}");

        let mut attributes = Attributes::new();
        let mut self_closing = false;
        loop {
            while at < bytes.len() && bytes[at].is_ascii_whitespace() {
                at += 1;
            }
            match bytes.get(at) {
                None => break,
                Some(b'>') => {
                    at += 1;
                    break;
                }
                Some(b'/') => {
                    at += 1;
                    self_closing = bytes.get(at) == Some(&b'>');
                    continue;
                }
                Some(_) => {}
            }

            self_closing = false;
            let attr_start = at;
            at += 1;
            while at < bytes.len() && !is_tag_delimiter(bytes[at]) && bytes[at] != b'=' {
                at += 1;
            }
            let attr_name = self.input[attr_start..at].to_ascii_lowercase();

            while at < bytes.len() && bytes[at].is_ascii_whitespace() {
                at += 1;
            }
            let mut value = String::new();
            if bytes.get(at) == Some(&b'=') {
                at += 1;
                while at < bytes.len() && bytes[at].is_ascii_whitespace() {
                    at += 1;
                }
                match bytes.get(at) {
                    Some(&quote) if quote == b'"' || quote == b'\'' => {
                        let value_start = at + 1;
                        let end = memchr(quote, &bytes[value_start..])
                            .map(|end| value_start + end)
                            .unwrap_or(bytes.len());
                        value = decode_character_references(&self.input[value_start..end], true);
                        at = (end + 1).min(bytes.len());
                    }
                    _ => {
                        let value_start = at;
                        while at < bytes.len()
                            && !bytes[at].is_ascii_whitespace()
                            && bytes[at] != b'>'
                        {
                            at += 1;
                        }
                        value = decode_character_references(&self.input[value_start..at], true);
                    }
                }
            }

            if !attributes.contains(&attr_name) {
                attributes.push(Attribute::new(attr_name, value));
            }
        }

        self.position = at;
        (name, attributes, self_closing)
    }

    fn text_until_end_tag<S: TreeSink>(
        &mut self,
        builder: &mut TreeBuilder<S>,
        decode: bool,
    ) -> Result<TreeBuilderStepResult, TreeBuilderError> {
        let rest = self.rest();
        let end_tag = self.end_tag_name.as_deref().unwrap_or_default();
        let found = memmem::find_iter(rest.as_bytes(), b"</").find(|&at| {
            let after = &rest.as_bytes()[at + 2..];
            after.len() >= end_tag.len()
                && after[..end_tag.len()].eq_ignore_ascii_case(end_tag.as_bytes())
                && after
                    .get(end_tag.len())
                    .map(|&c| is_tag_delimiter(c))
                    .unwrap_or(false)
        });

        let text_end = found.unwrap_or(rest.len());
        if text_end > 0 {
            let mut text = rest[..text_end].replace('\0', "\u{FFFD}");
            if decode {
                text = decode_character_references(&text, false);
            }
            self.position += text_end;
            return builder.characters(&text);
        }

        self.state = LexicalState::Data;
        let (name, _, _) = self.tag(2);
        let name = classify_interned(&name, &mut self.names);
        builder.end_tag(name)
    }
}

fn is_tag_delimiter(c: u8) -> bool {
    c.is_ascii_whitespace() || c == b'/' || c == b'>'
}

/// `body` is everything between `<!DOCTYPE` and `>`.
fn emit_doctype<S: TreeSink>(
    builder: &mut TreeBuilder<S>,
    body: &str,
) -> Result<TreeBuilderStepResult, TreeBuilderError> {
    let mut rest = body.trim_start();
    let name_end = rest.find(|c: char| c.is_ascii_whitespace()).unwrap_or(rest.len());
    let name = (name_end > 0).then(|| rest[..name_end].to_ascii_lowercase());
    rest = rest[name_end..].trim_start();

    let mut force_quirks = name.is_none();
    let mut public_id = None;
    let mut system_id = None;

    let keyword = |rest: &str, word: &str| {
        rest.len() >= word.len() && rest[..word.len()].eq_ignore_ascii_case(word)
    };
    if keyword(rest, "public") {
        rest = &rest[6..];
        public_id = quoted(&mut rest);
        force_quirks |= public_id.is_none();
        system_id = quoted(&mut rest);
    } else if keyword(rest, "system") {
        rest = &rest[6..];
        system_id = quoted(&mut rest);
        force_quirks |= system_id.is_none();
    } else if !rest.is_empty() {
        force_quirks = true;
    }

    builder.doctype(
        name.as_deref(),
        public_id.as_deref(),
        system_id.as_deref(),
        force_quirks,
    )
}

/// Takes a quoted identifier from the front of `rest`.
fn quoted(rest: &mut &str) -> Option<String> {
    let trimmed = rest.trim_start();
    let quote = trimmed.chars().next().filter(|&c| c == '"' || c == '\'')?;
    let body = &trimmed[1..];
    let end = body.find(quote).unwrap_or(body.len());
    let value = body[..end].to_owned();
    *rest = body.get(end + 1..).unwrap_or_default();
    Some(value)
}

/// Decodes numeric references and a few named ones. Unknown or
/// unterminated references are kept as written.
pub fn decode_character_references(text: &str, in_attribute: bool) -> String {
    if memchr(b'&', text.as_bytes()).is_none() {
        return text.to_owned();
    }

    let mut decoded = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(at) = rest.find('&') {
        decoded.push_str(&rest[..at]);
        rest = &rest[at..];

        let Some(end) = rest.find(';').filter(|&end| end > 1 && end <= 12) else {
            decoded.push('&');
            rest = &rest[1..];
            continue;
        };
        let reference = &rest[1..end];
        let replacement = match reference.strip_prefix('#') {
            Some(number) => {
                let value = match number.strip_prefix(['x', 'X']) {
                    Some(hex) => u32::from_str_radix(hex, 16).ok(),
                    None => number.parse::<u32>().ok(),
                };
                value.map(|value| {
                    char::from_u32(value)
                        .filter(|&c| c != '\0')
                        .unwrap_or('\u{FFFD}')
                })
            }
            None => named_reference(reference),
        };

        match replacement {
            Some(c) if !(in_attribute && reference.is_empty()) => {
                decoded.push(c);
                rest = &rest[end + 1..];
            }
            _ => {
                decoded.push('&');
                rest = &rest[1..];
            }
        }
    }
    decoded.push_str(rest);
    decoded
}

fn named_reference(name: &str) -> Option<char> {
    Some(match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{A0}',
        "copy" => '\u{A9}',
        _ => return None,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decodes_known_references() {
        assert_eq!(decode_character_references("a &amp; b &lt;c&gt;", false), "a & b <c>");
        assert_eq!(decode_character_references("&#65;&#x42;", false), "AB");
        assert_eq!(decode_character_references("&#0;", false), "\u{FFFD}");
    }

    #[test]
    fn keeps_unknown_references() {
        assert_eq!(decode_character_references("&bogus; & &amp", false), "&bogus; & &amp");
    }

    #[test]
    fn quoted_identifiers() {
        let mut rest = r#" "-//W3C//DTD HTML 4.01//EN" 'x'"#;
        assert_eq!(quoted(&mut rest).as_deref(), Some("-//W3C//DTD HTML 4.01//EN"));
        assert_eq!(quoted(&mut rest).as_deref(), Some("x"));
        assert_eq!(quoted(&mut rest), None);
    }
}
