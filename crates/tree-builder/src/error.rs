use crate::atom::Atom;
use thiserror::Error;

/// Errors that stop the tree builder.
///
/// Malformed markup is never one of these; it produces a [`ParseError`]
/// through the sink and parsing continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeBuilderError {
    /// An infoset violation under [`XmlViolationPolicy::Fatal`](crate::config::XmlViolationPolicy::Fatal).
    #[error("fatal: {0}")]
    Fatal(String),
    /// A token was delivered after an earlier error stopped the builder.
    #[error("the tree builder stopped after an earlier error")]
    Halted,
    /// The builder's own bookkeeping went wrong.
    #[error("tree builder invariant violated: {0}")]
    InvariantViolation(&'static str),
}

/// Position of a token in the source, as reported by the tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

/// A recoverable tree-construction error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub location: Option<SourceLocation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("non-conforming DOCTYPE")]
    NonConformingDoctype,
    #[error("expected a DOCTYPE before content")]
    MissingDoctype,
    #[error("stray DOCTYPE")]
    UnexpectedDoctype,
    #[error("stray start tag \"{0}\"")]
    UnexpectedStartTag(Atom),
    #[error("stray end tag \"{0}\"")]
    UnexpectedEndTag(Atom),
    #[error("non-space characters in an unexpected place")]
    UnexpectedCharacters,
    #[error("U+0000 NULL character")]
    UnexpectedNullCharacter,
    #[error("end tag \"{0}\" seen, but there were open elements")]
    MisnestedEndTag(Atom),
    #[error("no \"{0}\" element in scope")]
    NoElementInScope(Atom),
    #[error("formatting element \"{0}\" is not open")]
    FormattingElementNotOpen(Atom),
    #[error("formatting element \"{0}\" is not in scope")]
    FormattingElementNotInScope(Atom),
    #[error("\"{0}\" start tag seen while the same element is open")]
    NestedElement(Atom),
    #[error("\"{0}\" start tag in a table caused foster parenting")]
    FosterParentedStartTag(Atom),
    #[error("non-space characters in a table caused foster parenting")]
    FosterParentedCharacters,
    #[error("self-closing syntax on non-void element \"{0}\"")]
    NonVoidSelfClosing(Atom),
    #[error("\"image\" start tag treated as \"img\"")]
    ImageStartTag,
    #[error("end tag \"br\" treated as a start tag")]
    EndTagBr,
    #[error("HTML start tag \"{0}\" in foreign content")]
    HtmlStartTagInForeignContent(Atom),
    #[error("end tag \"{0}\" did not match the current foreign element")]
    ForeignEndTagMismatch(Atom),
    #[error("end of input in raw text")]
    EofInText,
    #[error("open elements remain: {}", .names.iter().map(Atom::as_str).collect::<Vec<_>>().join(", "))]
    UnclosedElements { names: Vec<Atom> },
}

/// Diagnostics about the document that are not parse errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseWarning {
    #[error("the DOCTYPE triggers quirks mode")]
    QuirkyDoctype,
    #[error("the DOCTYPE triggers limited-quirks mode")]
    AlmostStandardsDoctype,
}
