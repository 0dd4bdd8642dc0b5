use super::InsertionMode;
use crate::{attributes::Attributes, doctype::DoctypeInfo, element_name::ElementName};

#[derive(Debug, Clone)]
pub(crate) struct Tag {
    pub name: ElementName,
    pub attributes: Attributes,
    pub self_closing: bool,
}

/// A token as seen by the insertion mode handlers.
#[derive(Debug, Clone)]
pub(crate) enum Token {
    StartTag(Tag),
    EndTag(ElementName),
    Characters(String),
    /// U+0000 coming from the input, which some modes keep and some drop.
    NullCharacter,
    Comment(String),
    Doctype(DoctypeInfo),
    Eof,
}

impl Token {
    pub fn start_tag(name: ElementName) -> Self {
        Token::StartTag(Tag {
            name,
            attributes: Attributes::new(),
            self_closing: false,
        })
    }
}

/// What a mode handler did with a token.
#[derive(Debug)]
pub(crate) enum Step {
    Done,
    /// Switch to the mode and process the token again.
    Reprocess(InsertionMode, Token),
    /// Process the token again with the current mode's HTML rules,
    /// bypassing the foreign content check.
    ReprocessAsHtml(Token),
}

/// > A character token that is one of U+0009 CHARACTER TABULATION,
/// > U+000A LINE FEED (LF), U+000C FORM FEED (FF), U+000D CARRIAGE RETURN (CR),
/// > or U+0020 SPACE
pub(crate) fn is_html_whitespace(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\x0C' | '\r' | ' ')
}

pub(crate) fn is_all_whitespace(text: &str) -> bool {
    text.chars().all(is_html_whitespace)
}

/// Splits `text` after its leading run of whitespace.
pub(crate) fn split_leading_whitespace(text: &str) -> (&str, &str) {
    let end = text
        .char_indices()
        .find(|(_, c)| !is_html_whitespace(*c))
        .map(|(index, _)| index)
        .unwrap_or(text.len());
    text.split_at(end)
}

/// Only the whitespace characters of `text`, in order.
pub(crate) fn whitespace_only(text: &str) -> String {
    text.chars().filter(|c| is_html_whitespace(*c)).collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn leading_whitespace() {
        assert_eq!((" \n", "a b"), split_leading_whitespace(" \na b"));
        assert_eq!(("", "a"), split_leading_whitespace("a"));
        assert_eq!(("\t", ""), split_leading_whitespace("\t"));
    }

    #[test]
    fn whitespace_filter() {
        assert_eq!("  \n", whitespace_only(" a b\nc"));
        assert!(is_all_whitespace(" \r\n\t\x0C"));
        assert!(!is_all_whitespace(" \u{a0}"));
    }
}
