mod active_formatting_elements;
mod after_body;
mod algorithms;
mod builder_state;
mod foreign_content;
mod in_body;
mod in_head;
mod in_select;
mod in_table;
mod in_template;
mod insertion;
mod insertion_mode;
mod snapshot;
mod stack_node;
mod stack_of_open_elements;
mod token;

use crate::{
    attributes::Attributes,
    config::{TreeBuilderConfig, XmlViolationPolicy},
    doctype::DoctypeInfo,
    document_mode::DocumentMode,
    element_name::{DispatchGroup, ElementName, TagName},
    error::{ParseError, ParseErrorKind, ParseWarning, SourceLocation, TreeBuilderError},
    namespace::Namespace,
    sink::TreeSink,
    tokenizer_control::{LexicalState, TreeBuilderStepResult},
};
use builder_state::BuilderState;
use stack_node::StackNode;
use std::rc::Rc;
use token::{Step, Tag, Token};

pub use insertion_mode::InsertionMode;
pub use snapshot::StateSnapshot;

/// Reprocessing allowance on top of two steps per open element.
const REPROCESS_BASE_LIMIT: usize = 32;

#[derive(Debug, Clone)]
struct FragmentContext<H> {
    name: ElementName,
    namespace: Namespace,
    node: Option<H>,
    quirks: bool,
}

/// Builds a document tree from tokens.
///
/// The tokenizer drives the builder through one method per token. Each call
/// returns what the tokenizer must do before delivering the next token.
/// Tree mutations and diagnostics go to the [`TreeSink`].
///
/// ```
/// use html_tree_builder::{
///     element_name::classify, Attributes, TreeBuilder, TreeBuilderConfig, TreeBuilderStepResult,
/// };
/// # use html_tree_builder::{atom::Atom, namespace::Namespace, TreeSink};
/// # #[derive(Default)]
/// # struct Count(usize);
/// # impl TreeSink for Count {
/// #     type Handle = usize;
/// #     fn create_element(&mut self, _: Namespace, _: &Atom, _: &Attributes, _: Option<&usize>, _: &usize) -> usize { self.0 += 1; self.0 }
/// #     fn create_html_root(&mut self, _: &Attributes) -> usize { self.0 += 1; self.0 }
/// #     fn append_element(&mut self, _: &usize, _: &usize) {}
/// #     fn append_children_to_new_parent(&mut self, _: &usize, _: &usize) {}
/// #     fn detach_from_parent(&mut self, _: &usize) {}
/// #     fn insert_foster_parented_child(&mut self, _: &usize, _: &usize, _: &usize) {}
/// #     fn insert_foster_parented_characters(&mut self, _: &str, _: &usize, _: &usize) {}
/// #     fn append_characters(&mut self, _: &usize, _: &str) {}
/// #     fn append_comment(&mut self, _: &usize, _: &str) {}
/// #     fn append_comment_to_document(&mut self, _: &str) {}
/// #     fn append_doctype_to_document(&mut self, _: Option<&str>, _: Option<&str>, _: Option<&str>) {}
/// #     fn add_attributes_to_element(&mut self, _: &usize, _: &Attributes) {}
/// #     fn same_node(&self, a: &usize, b: &usize) -> bool { a == b }
/// # }
/// let mut builder = TreeBuilder::new(Count::default(), TreeBuilderConfig::default());
/// builder.start_tokenization();
/// builder.doctype(Some("html"), None, None, false).unwrap();
/// let result = builder.start_tag(classify("title"), Attributes::new(), false).unwrap();
/// assert!(matches!(result, TreeBuilderStepResult::SwitchLexicalState { .. }));
/// builder.characters("Hello").unwrap();
/// builder.end_tag(classify("title")).unwrap();
/// builder.eof().unwrap();
///
/// // html, head, title and the implied body.
/// assert_eq!(4, builder.sink().0);
/// ```
pub struct TreeBuilder<S: TreeSink> {
    sink: S,
    config: TreeBuilderConfig,
    state: BuilderState<S::Handle>,
    fragment: Option<FragmentContext<S::Handle>>,
    location: Option<SourceLocation>,
    /// Directive for the tokenizer produced by the current token.
    result: TreeBuilderStepResult,
    last_error: Option<TreeBuilderError>,
    self_closing_acknowledged: bool,
    #[cfg(test)]
    adoption_agency_outer_loops: usize,
}

impl<S: TreeSink> TreeBuilder<S> {
    pub fn new(sink: S, config: TreeBuilderConfig) -> Self {
        Self {
            sink,
            config,
            state: BuilderState::new(),
            fragment: None,
            location: None,
            result: TreeBuilderStepResult::Continue,
            last_error: None,
            self_closing_acknowledged: false,
            #[cfg(test)]
            adoption_agency_outer_loops: 0,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn config(&self) -> &TreeBuilderConfig {
        &self.config
    }

    pub fn insertion_mode(&self) -> InsertionMode {
        self.state.mode
    }

    pub fn document_mode(&self) -> DocumentMode {
        self.state.document_mode
    }

    /// Returns the error that stopped the builder, if any.
    pub fn last_error(&self) -> Option<&TreeBuilderError> {
        self.last_error.as_ref()
    }

    /// Parses the following tokens as the children of a `context` element.
    ///
    /// Call before [`TreeBuilder::start_tokenization`]. `context_node` is only
    /// used to look up the form owner.
    ///
    /// @see https://html.spec.whatwg.org/#parsing-html-fragments
    pub fn set_fragment_context(
        &mut self,
        name: ElementName,
        namespace: Namespace,
        context_node: Option<S::Handle>,
        quirks: bool,
    ) {
        self.fragment = Some(FragmentContext {
            name,
            namespace,
            node: context_node,
            quirks,
        });
    }

    /// Prepares for a new parse and returns the tokenizer's initial state.
    pub fn start_tokenization(&mut self) -> LexicalState {
        self.state = BuilderState::new();
        self.result = TreeBuilderStepResult::Continue;
        self.last_error = None;
        self.location = None;

        let Some(fragment) = self.fragment.clone() else {
            log::trace!(target: "html5.tree_builder", "starting a document parse");
            return LexicalState::Data;
        };

        log::trace!(
            target: "html5.tree_builder",
            "starting a fragment parse in <{}>",
            fragment.name.name()
        );

        if fragment.quirks {
            self.state.document_mode = DocumentMode::Quirks;
        }

        let root = self.sink.create_html_root(&Attributes::new());
        match fragment.namespace {
            /*
             * Foreign contexts keep a root entry in the context's namespace so that
             * the foreign content checks see it as the adjusted current node.
             */
            Namespace::Svg => {
                let name = if fragment.name.is(TagName::TITLE)
                    || fragment.name.group() == DispatchGroup::ForeignObjectOrDesc
                {
                    TagName::FOREIGNOBJECT
                } else {
                    TagName::SVG
                };
                let entry =
                    StackNode::foreign(Namespace::Svg, ElementName::for_tag(name), root, false, None);
                self.push(Rc::new(entry));
                self.state.mode = InsertionMode::FRAMESET_OK;
                LexicalState::Data
            }

            Namespace::MathML => {
                let name = match fragment.name.group() {
                    DispatchGroup::MiMoMnMsMtext => TagName::MTEXT,
                    DispatchGroup::AnnotationXml => TagName::ANNOTATION_XML,
                    _ => TagName::MATH,
                };
                let entry = StackNode::foreign(
                    Namespace::MathML,
                    ElementName::for_tag(name),
                    root,
                    false,
                    None,
                );
                self.push(Rc::new(entry));
                self.state.mode = InsertionMode::FRAMESET_OK;
                LexicalState::Data
            }

            Namespace::Html => {
                let entry = StackNode::html(ElementName::for_tag(TagName::HTML), root, None);
                self.push(Rc::new(entry));

                if fragment.name.is(TagName::TEMPLATE) {
                    self.state.template_modes.push(InsertionMode::IN_TEMPLATE);
                }
                self.reset_insertion_mode_appropriately();
                self.state.form_element = self.sink.form_pointer_for_context(fragment.node.as_ref());

                match fragment.name.group() {
                    DispatchGroup::Title | DispatchGroup::Textarea => LexicalState::Rcdata,
                    DispatchGroup::Style
                    | DispatchGroup::Xmp
                    | DispatchGroup::Iframe
                    | DispatchGroup::Noembed
                    | DispatchGroup::Noframes => LexicalState::Rawtext,
                    DispatchGroup::Noscript if self.config.scripting_enabled => {
                        LexicalState::Rawtext
                    }
                    DispatchGroup::Plaintext => LexicalState::Plaintext,
                    DispatchGroup::Script => LexicalState::ScriptData,
                    _ => LexicalState::Data,
                }
            }
        }
    }

    /// Releases the parse state once the tokenizer has finished.
    pub fn end_tokenization(&mut self) {
        self.flush_pending_table_characters();
        self.state.stack.clear();
        self.state.formatting.clear();
        self.state.template_modes.clear();
        self.state.form_element = None;
        self.state.head_element = None;
        self.state.deep_tree_surrogate_parent = None;
        log::trace!(target: "html5.tree_builder", "tokenization ended");
    }

    /// Location attached to entries and diagnostics created from now on.
    pub fn set_source_location(&mut self, location: Option<SourceLocation>) {
        self.location = location;
    }

    /// Whether the tokenizer should treat `<![CDATA[` as a CDATA section.
    ///
    /// > If there is an adjusted current node and it is not an element in
    /// > the HTML namespace, then this is a CDATA section.
    pub fn cdata_section_allowed(&self) -> bool {
        self.state
            .stack
            .current_node()
            .map(|node| node.namespace != Namespace::Html)
            .unwrap_or(false)
    }

    pub fn start_tag(
        &mut self,
        name: ElementName,
        attributes: Attributes,
        self_closing: bool,
    ) -> Result<TreeBuilderStepResult, TreeBuilderError> {
        self.process(Token::StartTag(Tag {
            name,
            attributes,
            self_closing,
        }))
    }

    pub fn end_tag(&mut self, name: ElementName) -> Result<TreeBuilderStepResult, TreeBuilderError> {
        self.process(Token::EndTag(name))
    }

    pub fn characters(&mut self, text: &str) -> Result<TreeBuilderStepResult, TreeBuilderError> {
        if text.is_empty() {
            return Ok(TreeBuilderStepResult::Continue);
        }
        self.process(Token::Characters(text.to_owned()))
    }

    /// A U+0000 NULL from the data state, which the tree builder either
    /// drops or turns into U+FFFD depending on where it lands.
    pub fn zero_originating_replacement_character(
        &mut self,
    ) -> Result<TreeBuilderStepResult, TreeBuilderError> {
        self.process(Token::NullCharacter)
    }

    pub fn comment(&mut self, text: &str) -> Result<TreeBuilderStepResult, TreeBuilderError> {
        self.process(Token::Comment(text.to_owned()))
    }

    pub fn doctype(
        &mut self,
        name: Option<&str>,
        public_identifier: Option<&str>,
        system_identifier: Option<&str>,
        force_quirks: bool,
    ) -> Result<TreeBuilderStepResult, TreeBuilderError> {
        self.process(Token::Doctype(DoctypeInfo::new(
            name,
            public_identifier,
            system_identifier,
            force_quirks,
        )))
    }

    pub fn eof(&mut self) -> Result<TreeBuilderStepResult, TreeBuilderError> {
        self.process(Token::Eof)
    }

    fn process(&mut self, token: Token) -> Result<TreeBuilderStepResult, TreeBuilderError> {
        // Refuse to proceed if there was a previous error.
        if self.last_error.is_some() {
            return Err(TreeBuilderError::Halted);
        }

        let mut token = token;
        if !matches!(token, Token::Characters(_) | Token::NullCharacter) {
            self.flush_pending_table_characters();
        }

        if std::mem::take(&mut self.state.need_to_drop_lf) {
            if let Token::Characters(text) = &mut token {
                if text.starts_with('\n') {
                    text.remove(0);
                    if text.is_empty() {
                        return Ok(TreeBuilderStepResult::Continue);
                    }
                }
            }
        }

        let unacknowledged_self_closing = match &token {
            Token::StartTag(tag) => {
                if self.config.xml_violation_policy == XmlViolationPolicy::Fatal {
                    self.check_xml_names(tag)?;
                }
                self.self_closing_acknowledged = false;
                tag.self_closing.then(|| tag.name.name().clone())
            }
            _ => None,
        };

        self.result = TreeBuilderStepResult::Continue;
        if let Err(error) = self.dispatch(token) {
            self.last_error = Some(error);
        }
        if let Some(error) = &self.last_error {
            log::warn!(target: "html5.tree_builder", "stopping: {}", error);
            return Err(error.clone());
        }

        if let Some(name) = unacknowledged_self_closing {
            if !self.self_closing_acknowledged {
                self.parse_error(ParseErrorKind::NonVoidSelfClosing(name));
            }
        }

        Ok(std::mem::take(&mut self.result))
    }

    /// Runs mode handlers until the token is consumed.
    fn dispatch(&mut self, token: Token) -> Result<(), TreeBuilderError> {
        let limit = REPROCESS_BASE_LIMIT + 2 * self.state.stack.len();
        let mut token = token;
        let mut html_rules_only = false;

        for _ in 0..limit {
            let step = if !html_rules_only && self.should_use_foreign_content_rules(&token) {
                self.step_in_foreign_content(token)
            } else {
                let mode = self.state.mode;
                self.step_in_mode(mode, token)
            };

            if self.last_error.is_some() {
                return Ok(());
            }

            match step {
                Step::Done => return Ok(()),
                Step::Reprocess(mode, next) => {
                    self.set_mode(mode);
                    html_rules_only = false;
                    token = next;
                }
                Step::ReprocessAsHtml(next) => {
                    html_rules_only = true;
                    token = next;
                }
            }
        }

        Err(TreeBuilderError::InvariantViolation(
            "token reprocessed without being consumed",
        ))
    }

    /// > As each token is emitted from the tokenization stage, the user agent must follow
    /// > the appropriate steps from the following list, known as the tree construction dispatcher:
    /// >
    /// > - If the stack of open elements is empty
    /// > - If the adjusted current node is an element in the HTML namespace
    /// > - If the adjusted current node is a MathML text integration point and the token is a
    /// >   start tag whose tag name is neither "mglyph" nor "malignmark"
    /// > - If the adjusted current node is a MathML text integration point and the token is a
    /// >   character token
    /// > - If the adjusted current node is a MathML annotation-xml element and the token is a
    /// >   start tag whose tag name is "svg"
    /// > - If the adjusted current node is an HTML integration point and the token is a start tag
    /// > - If the adjusted current node is an HTML integration point and the token is a
    /// >   character token
    /// > - If the token is an end-of-file token
    /// >
    /// > Process the token according to the rules given in the section corresponding to the
    /// > current insertion mode in HTML content.
    /// >
    /// > Otherwise
    /// >
    /// > Process the token according to the rules given in the section for parsing tokens
    /// > in foreign content.
    ///
    /// @see https://html.spec.whatwg.org/#tree-construction-dispatcher
    fn should_use_foreign_content_rules(&self, token: &Token) -> bool {
        let Some(node) = self.state.stack.current_node() else {
            return false;
        };
        if node.namespace == Namespace::Html {
            return false;
        }

        match token {
            Token::Eof => false,
            Token::StartTag(tag) => {
                let mathml_text = node.is_mathml_text_integration_point()
                    && tag.name.group() != DispatchGroup::MglyphOrMalignmark;
                let svg_in_annotation = node.namespace == Namespace::MathML
                    && node.name.is(TagName::ANNOTATION_XML)
                    && tag.name.is(TagName::SVG);
                !(mathml_text || svg_in_annotation || node.is_html_integration_point())
            }
            Token::Characters(_) | Token::NullCharacter => {
                !(node.is_mathml_text_integration_point() || node.is_html_integration_point())
            }
            _ => true,
        }
    }

    fn step_in_mode(&mut self, mode: InsertionMode, token: Token) -> Step {
        match mode {
            InsertionMode::INITIAL => self.step_initial(token),
            InsertionMode::BEFORE_HTML => self.step_before_html(token),
            InsertionMode::BEFORE_HEAD => self.step_before_head(token),
            InsertionMode::IN_HEAD => self.step_in_head(token),
            InsertionMode::IN_HEAD_NOSCRIPT => self.step_in_head_noscript(token),
            InsertionMode::AFTER_HEAD => self.step_after_head(token),
            InsertionMode::IN_BODY | InsertionMode::FRAMESET_OK => self.step_in_body(token),
            InsertionMode::TEXT => self.step_text(token),
            InsertionMode::IN_TABLE => self.step_in_table(token),
            InsertionMode::IN_CAPTION => self.step_in_caption(token),
            InsertionMode::IN_COLUMN_GROUP => self.step_in_column_group(token),
            InsertionMode::IN_TABLE_BODY => self.step_in_table_body(token),
            InsertionMode::IN_ROW => self.step_in_row(token),
            InsertionMode::IN_CELL => self.step_in_cell(token),
            InsertionMode::IN_SELECT => self.step_in_select(token),
            InsertionMode::IN_SELECT_IN_TABLE => self.step_in_select_in_table(token),
            InsertionMode::IN_TEMPLATE => self.step_in_template(token),
            InsertionMode::AFTER_BODY => self.step_after_body(token),
            InsertionMode::IN_FRAMESET => self.step_in_frameset(token),
            InsertionMode::AFTER_FRAMESET => self.step_after_frameset(token),
            InsertionMode::AFTER_AFTER_BODY => self.step_after_after_body(token),
            InsertionMode::AFTER_AFTER_FRAMESET => self.step_after_after_frameset(token),
        }
    }

    fn set_mode(&mut self, mode: InsertionMode) {
        if self.state.mode != mode {
            log::trace!(
                target: "html5.tree_builder",
                "insertion mode {:?} -> {:?}",
                self.state.mode,
                mode
            );
        }
        self.state.mode = mode;
    }

    /// Stops the builder. The current token is abandoned.
    fn bail(&mut self, error: TreeBuilderError) -> Step {
        self.last_error = Some(error);
        Step::Done
    }

    fn parse_error(&mut self, kind: ParseErrorKind) {
        if !self.config.report_errors {
            return;
        }
        log::trace!(target: "html5.tree_builder", "parse error: {}", kind);
        self.sink.parse_error(ParseError {
            kind,
            location: self.location,
        });
    }

    fn warning(&mut self, warning: ParseWarning) {
        if !self.config.report_errors {
            return;
        }
        log::trace!(target: "html5.tree_builder", "warning: {}", warning);
        self.sink.warning(warning);
    }

    fn acknowledge_self_closing(&mut self) {
        self.self_closing_acknowledged = true;
    }

    fn switch_lexical_state(&mut self, state: LexicalState, end_tag_name: Option<ElementName>) {
        self.result = TreeBuilderStepResult::SwitchLexicalState {
            state,
            end_tag_name,
        };
    }

    /// Enforces [`XmlViolationPolicy::Fatal`] on a start tag.
    fn check_xml_names(&mut self, tag: &Tag) -> Result<(), TreeBuilderError> {
        let offending = if !is_xml_name(tag.name.name()) {
            Some(format!(
                "element name \"{}\" cannot be represented as XML 1.0",
                tag.name.name()
            ))
        } else {
            tag.attributes
                .iter()
                .find(|attr| !is_xml_name(&attr.local_name))
                .map(|attr| {
                    format!(
                        "attribute name \"{}\" cannot be represented as XML 1.0",
                        attr.local_name
                    )
                })
        };

        match offending {
            Some(message) => {
                let error = TreeBuilderError::Fatal(message);
                self.last_error = Some(error.clone());
                Err(error)
            }
            None => Ok(()),
        }
    }

    fn current_node(&self) -> Option<&Rc<StackNode<S::Handle>>> {
        self.state.stack.current_node()
    }

    fn current_node_is(&self, tag_name: TagName) -> bool {
        self.state.stack.current_node_is(tag_name)
    }

    fn is_fragment(&self) -> bool {
        self.fragment.is_some()
    }
}

/// Whether `name` matches the XML 1.0 `Name` production.
///
/// @see https://www.w3.org/TR/xml/#NT-Name
pub(crate) fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_xml_name_start_char(first) => chars.all(is_xml_name_char),
        _ => false,
    }
}

fn is_xml_name_start_char(c: char) -> bool {
    matches!(c,
        ':' | 'A'..='Z' | '_' | 'a'..='z'
        | '\u{C0}'..='\u{D6}'
        | '\u{D8}'..='\u{F6}'
        | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}'
        | '\u{37F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}'
        | '\u{10000}'..='\u{EFFFF}')
}

fn is_xml_name_char(c: char) -> bool {
    is_xml_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}'
            | '\u{300}'..='\u{36F}'
            | '\u{203F}'..='\u{2040}')
}

#[cfg(test)]
mod test;
