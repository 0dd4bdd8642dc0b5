//! HTML tree construction.
//!
//! A [`TreeBuilder`] receives the tokens of an HTML document one at a time
//! and builds the document tree through a [`TreeSink`], recovering from
//! malformed markup the way browsers do.
//!
//! @see https://html.spec.whatwg.org/#tree-construction

pub mod atom;
pub mod attributes;
pub mod config;
pub mod doctype;
pub mod document_mode;
pub mod element_name;
pub mod error;
pub mod namespace;
pub mod sink;
pub mod tokenizer_control;
mod tree_builder;

pub use attributes::{Attribute, AttributeNamespace, Attributes};
pub use config::{TreeBuilderConfig, XmlViolationPolicy};
pub use document_mode::DocumentMode;
pub use element_name::ElementName;
pub use error::{ParseError, ParseErrorKind, ParseWarning, SourceLocation, TreeBuilderError};
pub use sink::TreeSink;
pub use tokenizer_control::{LexicalState, SuspendReason, TokenizerControl, TreeBuilderStepResult};
pub use tree_builder::{InsertionMode, StateSnapshot, TreeBuilder};
