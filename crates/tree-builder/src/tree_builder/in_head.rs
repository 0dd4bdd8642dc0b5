use super::{
    stack_node::StackNode,
    token::{split_leading_whitespace, Step, Tag, Token},
    InsertionMode, TreeBuilder,
};
use crate::{
    doctype::DoctypeInfo,
    document_mode::DocumentMode,
    element_name::{DispatchGroup, ElementName, TagName},
    error::{ParseErrorKind, ParseWarning},
    sink::TreeSink,
    tokenizer_control::{LexicalState, SuspendReason, TreeBuilderStepResult},
};
use std::rc::Rc;

impl<S: TreeSink> TreeBuilder<S> {
    /// Parses next node in the "initial" insertion mode.
    ///
    /// @see https://html.spec.whatwg.org/#the-initial-insertion-mode
    pub(super) fn step_initial(&mut self, token: Token) -> Step {
        match token {
            /*
             * > A character token that is one of U+0009 CHARACTER TABULATION,
             * > U+000A LINE FEED (LF), U+000C FORM FEED (FF),
             * > U+000D CARRIAGE RETURN (CR), or U+0020 SPACE
             *
             * Ignore the token.
             */
            Token::Characters(text) => {
                let (_, rest) = split_leading_whitespace(&text);
                if rest.is_empty() {
                    return Step::Done;
                }
                let rest = rest.to_owned();
                self.initial_anything_else(Token::Characters(rest))
            }

            /*
             * > A comment token
             *
             * Insert a comment as the last child of the Document object.
             */
            Token::Comment(text) => {
                self.sink.append_comment_to_document(&text);
                Step::Done
            }

            /*
             * > A DOCTYPE token
             */
            Token::Doctype(doctype) => {
                self.process_doctype(&doctype);

                /*
                 * > Then, switch the insertion mode to "before html".
                 */
                self.set_mode(InsertionMode::BEFORE_HTML);
                Step::Done
            }

            /*
             * > Anything else
             */
            token => self.initial_anything_else(token),
        }
    }

    /// > If the document is not an iframe srcdoc document, then this is a parse error;
    /// > if the parser cannot change the mode flag is false, set the Document to quirks mode.
    /// >
    /// > In any case, switch the insertion mode to "before html", then reprocess the token.
    fn initial_anything_else(&mut self, token: Token) -> Step {
        if !self.config.is_srcdoc {
            self.parse_error(ParseErrorKind::MissingDoctype);
            self.set_document_mode(DocumentMode::Quirks, None, None);
        }
        Step::Reprocess(InsertionMode::BEFORE_HTML, token)
    }

    /// > If the DOCTYPE token's name is not "html", or the token's public identifier is not
    /// > missing, or the token's system identifier is neither missing nor "about:legacy-compat",
    /// > then there is a parse error.
    /// >
    /// > Append a DocumentType node to the Document node...
    /// >
    /// > Then, if the document is not an iframe srcdoc document, and the parser cannot change
    /// > the mode flag is false, and the DOCTYPE token matches one of the conditions in the
    /// > following list, then set the Document to quirks mode...
    fn process_doctype(&mut self, doctype: &DoctypeInfo) {
        if !doctype.is_conforming() {
            self.parse_error(ParseErrorKind::NonConformingDoctype);
        }

        self.sink.append_doctype_to_document(
            doctype.name.as_deref(),
            doctype.public_identifier.as_deref(),
            doctype.system_identifier.as_deref(),
        );

        if self.config.is_srcdoc {
            return;
        }

        let mode = doctype.document_mode();
        match mode {
            DocumentMode::Quirks => self.warning(ParseWarning::QuirkyDoctype),
            DocumentMode::LimitedQuirks => self.warning(ParseWarning::AlmostStandardsDoctype),
            DocumentMode::NoQuirks => {}
        }
        self.set_document_mode(
            mode,
            doctype.public_identifier.as_deref(),
            doctype.system_identifier.as_deref(),
        );
    }

    pub(super) fn set_document_mode(
        &mut self,
        mode: DocumentMode,
        public_identifier: Option<&str>,
        system_identifier: Option<&str>,
    ) {
        log::trace!(target: "html5.tree_builder", "document mode is {}", mode);
        self.state.document_mode = mode;
        self.sink
            .document_mode(mode, public_identifier, system_identifier);
    }

    /// Parses next node in the "before html" insertion mode.
    ///
    /// @see https://html.spec.whatwg.org/#the-before-html-insertion-mode
    pub(super) fn step_before_html(&mut self, token: Token) -> Step {
        match token {
            /*
             * > A DOCTYPE token
             *
             * Parse error: ignore the token.
             */
            Token::Doctype(_) => {
                self.parse_error(ParseErrorKind::UnexpectedDoctype);
                Step::Done
            }

            /*
             * > A comment token
             */
            Token::Comment(text) => {
                self.sink.append_comment_to_document(&text);
                Step::Done
            }

            /*
             * > A character token that is one of U+0009 CHARACTER TABULATION, …
             *
             * Ignore the token.
             */
            Token::Characters(text) => {
                let (_, rest) = split_leading_whitespace(&text);
                if rest.is_empty() {
                    return Step::Done;
                }
                let rest = rest.to_owned();
                self.before_html_anything_else(Token::Characters(rest))
            }

            /*
             * > A start tag whose tag name is "html"
             *
             * > Create an element for the token in the HTML namespace, with the Document as
             * > the intended parent. Append it to the Document object. Put this element in
             * > the stack of open elements.
             */
            Token::StartTag(tag) if tag.name.is(TagName::HTML) => {
                let root = self.sink.create_html_root(&tag.attributes);
                self.push(Rc::new(StackNode::html(tag.name, root, self.location)));
                self.set_mode(InsertionMode::BEFORE_HEAD);
                Step::Done
            }

            /*
             * > An end tag whose tag name is one of: "head", "body", "html", "br"
             *
             * Act as described in the "anything else" entry below.
             */
            Token::EndTag(ref name)
                if matches!(
                    name.group(),
                    DispatchGroup::Head | DispatchGroup::Body | DispatchGroup::Html | DispatchGroup::Br
                ) =>
            {
                self.before_html_anything_else(token)
            }

            /*
             * > Any other end tag
             *
             * Parse error: ignore the token.
             */
            Token::EndTag(name) => {
                self.parse_error(ParseErrorKind::UnexpectedEndTag(name.name().clone()));
                Step::Done
            }

            /*
             * > Anything else
             */
            token => self.before_html_anything_else(token),
        }
    }

    /// > Create an html element whose node document is the Document object. Append it to the
    /// > Document object. Put this element in the stack of open elements.
    /// >
    /// > Switch the insertion mode to "before head", then reprocess the token.
    fn before_html_anything_else(&mut self, token: Token) -> Step {
        let root = self.sink.create_html_root(&Default::default());
        self.push(Rc::new(StackNode::html(
            ElementName::for_tag(TagName::HTML),
            root,
            self.location,
        )));
        Step::Reprocess(InsertionMode::BEFORE_HEAD, token)
    }

    /// Parses next node in the "before head" insertion mode.
    ///
    /// @see https://html.spec.whatwg.org/#the-before-head-insertion-mode
    pub(super) fn step_before_head(&mut self, token: Token) -> Step {
        match token {
            /*
             * > A character token that is one of U+0009 CHARACTER TABULATION, …
             *
             * Ignore the token.
             */
            Token::Characters(text) => {
                let (_, rest) = split_leading_whitespace(&text);
                if rest.is_empty() {
                    return Step::Done;
                }
                let rest = rest.to_owned();
                self.before_head_anything_else(Token::Characters(rest))
            }

            Token::Comment(text) => {
                self.insert_comment(&text);
                Step::Done
            }

            Token::Doctype(_) => {
                self.parse_error(ParseErrorKind::UnexpectedDoctype);
                Step::Done
            }

            /*
             * > A start tag whose tag name is "html"
             *
             * Process the token using the rules for the "in body" insertion mode.
             */
            Token::StartTag(ref tag) if tag.name.is(TagName::HTML) => self.step_in_body(token),

            /*
             * > A start tag whose tag name is "head"
             *
             * > Insert an HTML element for the token.
             * > Set the head element pointer to the newly created head element.
             * > Switch the insertion mode to "in head".
             */
            Token::StartTag(tag) if tag.name.is(TagName::HEAD) => {
                if let Some(head) = self.insert_html_element(&tag) {
                    self.state.head_element = Some(head.node.clone());
                }
                self.set_mode(InsertionMode::IN_HEAD);
                Step::Done
            }

            /*
             * > An end tag whose tag name is one of: "head", "body", "html", "br"
             */
            Token::EndTag(ref name)
                if matches!(
                    name.group(),
                    DispatchGroup::Head | DispatchGroup::Body | DispatchGroup::Html | DispatchGroup::Br
                ) =>
            {
                self.before_head_anything_else(token)
            }

            Token::EndTag(name) => {
                self.parse_error(ParseErrorKind::UnexpectedEndTag(name.name().clone()));
                Step::Done
            }

            token => self.before_head_anything_else(token),
        }
    }

    /// > Insert an HTML element for a "head" start tag token with no attributes.
    /// > Set the head element pointer to the newly created head element.
    /// > Switch the insertion mode to "in head".
    /// > Reprocess the current token.
    fn before_head_anything_else(&mut self, token: Token) -> Step {
        if let Some(head) = self.insert_html_element_named(TagName::HEAD) {
            self.state.head_element = Some(head.node.clone());
        }
        Step::Reprocess(InsertionMode::IN_HEAD, token)
    }

    /// Parses next node in the "in head" insertion mode.
    ///
    /// @see https://html.spec.whatwg.org/#parsing-main-inhead
    pub(super) fn step_in_head(&mut self, token: Token) -> Step {
        match token {
            /*
             * > A character token that is one of U+0009 CHARACTER TABULATION, …
             *
             * Insert the character.
             */
            Token::Characters(text) => {
                let (whitespace, rest) = split_leading_whitespace(&text);
                if !whitespace.is_empty() {
                    self.insert_characters(whitespace);
                }
                if rest.is_empty() {
                    return Step::Done;
                }
                let rest = rest.to_owned();
                self.in_head_anything_else(Token::Characters(rest))
            }

            Token::Comment(text) => {
                self.insert_comment(&text);
                Step::Done
            }

            Token::Doctype(_) => {
                self.parse_error(ParseErrorKind::UnexpectedDoctype);
                Step::Done
            }

            Token::StartTag(tag) => match tag.name.group() {
                /*
                 * > A start tag whose tag name is "html"
                 */
                DispatchGroup::Html => self.step_in_body(Token::StartTag(tag)),

                /*
                 * > A start tag whose tag name is one of: "base", "basefont", "bgsound", "link"
                 *
                 * > Insert an HTML element for the token. Immediately pop the current node off
                 * > the stack of open elements.
                 * >
                 * > Acknowledge the token's self-closing flag, if it is set.
                 */
                DispatchGroup::Base | DispatchGroup::LinkOrBasefontOrBgsound => {
                    self.insert_void_html_element(&tag);
                    Step::Done
                }

                /*
                 * > A start tag whose tag name is "meta"
                 *
                 * > If the active speculative HTML parser is null, then:
                 * >   1. If the element has a charset attribute, and getting an encoding from
                 * >      its value results in an encoding, and the confidence is currently
                 * >      tentative, then change the encoding to the resulting encoding.
                 * >   2. Otherwise, if the element has an http-equiv attribute whose value is an
                 * >      ASCII case-insensitive match for the string "Content-Type", and the
                 * >      element has a content attribute, and applying the algorithm for
                 * >      extracting a character encoding from a meta element to that
                 * >      attribute's value returns an encoding, and the confidence is currently
                 * >      tentative, then change the encoding to the extracted encoding.
                 */
                DispatchGroup::Meta => {
                    self.insert_void_html_element(&tag);
                    self.check_encoding_declaration(&tag);
                    Step::Done
                }

                /*
                 * > A start tag whose tag name is "title"
                 *
                 * Follow the generic RCDATA element parsing algorithm.
                 */
                DispatchGroup::Title => {
                    self.parse_generic_text_element(&tag, LexicalState::Rcdata);
                    Step::Done
                }

                /*
                 * > A start tag whose tag name is "noscript", if the scripting flag is enabled
                 * > A start tag whose tag name is one of: "noframes", "style"
                 *
                 * Follow the generic raw text element parsing algorithm.
                 */
                DispatchGroup::Noscript if self.config.scripting_enabled => {
                    self.parse_generic_text_element(&tag, LexicalState::Rawtext);
                    Step::Done
                }
                DispatchGroup::Noframes | DispatchGroup::Style => {
                    self.parse_generic_text_element(&tag, LexicalState::Rawtext);
                    Step::Done
                }

                /*
                 * > A start tag whose tag name is "noscript", if the scripting flag is disabled
                 *
                 * > Insert an HTML element for the token.
                 * > Switch the insertion mode to "in head noscript".
                 */
                DispatchGroup::Noscript => {
                    self.insert_html_element(&tag);
                    self.set_mode(InsertionMode::IN_HEAD_NOSCRIPT);
                    Step::Done
                }

                /*
                 * > A start tag whose tag name is "script"
                 *
                 * Insert the element at the adjusted insertion location, switch the tokenizer
                 * to the script data state and enter "text".
                 */
                DispatchGroup::Script => {
                    self.insert_script_element(&tag);
                    Step::Done
                }

                /*
                 * > A start tag whose tag name is "template"
                 *
                 * > Insert an HTML element for the token.
                 * > Insert a marker at the end of the list of active formatting elements.
                 * > Set the frameset-ok flag to "not ok".
                 * > Switch the insertion mode to "in template".
                 * > Push "in template" onto the stack of template insertion modes so that it is
                 * > the new current template insertion mode.
                 */
                DispatchGroup::Template => {
                    self.insert_html_element(&tag);
                    self.state.formatting.insert_marker();
                    self.state.frameset_not_ok();
                    self.set_mode(InsertionMode::IN_TEMPLATE);
                    self.state.template_modes.push(InsertionMode::IN_TEMPLATE);
                    Step::Done
                }

                /*
                 * > A start tag whose tag name is "head"
                 *
                 * Parse error: ignore the token.
                 */
                DispatchGroup::Head => {
                    self.parse_error(ParseErrorKind::UnexpectedStartTag(tag.name.name().clone()));
                    Step::Done
                }

                _ => self.in_head_anything_else(Token::StartTag(tag)),
            },

            Token::EndTag(name) => match name.group() {
                /*
                 * > An end tag whose tag name is "head"
                 *
                 * > Pop the current node (which will be the head element) off the stack of
                 * > open elements.
                 * >
                 * > Switch the insertion mode to "after head".
                 */
                DispatchGroup::Head => {
                    self.pop();
                    self.set_mode(InsertionMode::AFTER_HEAD);
                    Step::Done
                }

                /*
                 * > An end tag whose tag name is one of: "body", "html", "br"
                 */
                DispatchGroup::Body | DispatchGroup::Html | DispatchGroup::Br => {
                    self.in_head_anything_else(Token::EndTag(name))
                }

                /*
                 * > An end tag whose tag name is "template"
                 */
                DispatchGroup::Template => {
                    self.close_template_element();
                    Step::Done
                }

                /*
                 * > Any other end tag
                 *
                 * Parse error: ignore the token.
                 */
                _ => {
                    self.parse_error(ParseErrorKind::UnexpectedEndTag(name.name().clone()));
                    Step::Done
                }
            },

            token => self.in_head_anything_else(token),
        }
    }

    /// > Pop the current node (which will be the head element) off the stack of open elements.
    /// >
    /// > Switch the insertion mode to "after head".
    /// >
    /// > Reprocess the token.
    fn in_head_anything_else(&mut self, token: Token) -> Step {
        self.pop();
        Step::Reprocess(InsertionMode::AFTER_HEAD, token)
    }

    /// > An end tag whose tag name is "template"
    /// >
    /// > If there is no template element on the stack of open elements, then this is a parse
    /// > error; ignore the token.
    /// >
    /// > Otherwise, run these steps:
    /// >
    /// > 1. Generate all implied end tags thoroughly.
    /// > 2. If the current node is not a template element, then this is a parse error.
    /// > 3. Pop elements from the stack of open elements until a template element has been
    /// >    popped from the stack.
    /// > 4. Clear the list of active formatting elements up to the last marker.
    /// > 5. Pop the current template insertion mode off the stack of template insertion modes.
    /// > 6. Reset the insertion mode appropriately.
    pub(super) fn close_template_element(&mut self) {
        let template = ElementName::for_tag(TagName::TEMPLATE);
        if !self.state.stack.contains(TagName::TEMPLATE) {
            self.parse_error(ParseErrorKind::UnexpectedEndTag(template.name().clone()));
            return;
        }

        self.generate_implied_end_tags_thoroughly();
        if !self.current_node_is(TagName::TEMPLATE) {
            self.parse_error(ParseErrorKind::MisnestedEndTag(template.name().clone()));
        }
        self.pop_until(TagName::TEMPLATE);
        self.state.formatting.clear_up_to_last_marker();
        if self.state.template_modes.pop().is_none() {
            self.bail(crate::error::TreeBuilderError::InvariantViolation(
                "template closed without a template insertion mode",
            ));
            return;
        }
        self.reset_insertion_mode_appropriately();
    }

    /// Asks the tokenizer to suspend once for the first encoding a `<meta>` declares.
    fn check_encoding_declaration(&mut self, tag: &Tag) {
        if !self.config.honor_encoding_declarations || self.state.seen_encoding_declaration {
            return;
        }

        let label = match tag.attributes.get("charset") {
            Some(charset) => Some(charset.trim_matches(super::token::is_html_whitespace).to_owned()),
            None if tag
                .attributes
                .has_value_ignore_ascii_case("http-equiv", "content-type") =>
            {
                tag.attributes
                    .get("content")
                    .and_then(extract_character_encoding)
            }
            None => None,
        };

        let Some(label) = label.filter(|label| !label.is_empty()) else {
            return;
        };

        log::debug!(target: "html5.tree_builder", "meta declares encoding {:?}", label);
        self.state.seen_encoding_declaration = true;
        self.result = TreeBuilderStepResult::Suspend(SuspendReason::EncodingDeclaration(label));
    }

    /// Parses next node in the "in head noscript" insertion mode.
    ///
    /// @see https://html.spec.whatwg.org/#parsing-main-inheadnoscript
    pub(super) fn step_in_head_noscript(&mut self, token: Token) -> Step {
        match token {
            Token::Doctype(_) => {
                self.parse_error(ParseErrorKind::UnexpectedDoctype);
                Step::Done
            }

            /*
             * > A start tag whose tag name is "html"
             */
            Token::StartTag(ref tag) if tag.name.is(TagName::HTML) => self.step_in_body(token),

            /*
             * > An end tag whose tag name is "noscript"
             *
             * > Pop the current node (which will be a noscript element) from the stack of open
             * > elements; the new current node will be a head element.
             * >
             * > Switch the insertion mode to "in head".
             */
            Token::EndTag(ref name) if name.is(TagName::NOSCRIPT) => {
                self.pop();
                self.set_mode(InsertionMode::IN_HEAD);
                Step::Done
            }

            /*
             * > A character token that is one of U+0009 CHARACTER TABULATION, …
             * > A comment token
             * > A start tag whose tag name is one of: "basefont", "bgsound", "link", "meta",
             * >   "noframes", "style"
             *
             * Process the token using the rules for the "in head" insertion mode.
             */
            Token::Characters(text) => {
                let (whitespace, rest) = split_leading_whitespace(&text);
                if !whitespace.is_empty() {
                    self.insert_characters(whitespace);
                }
                if rest.is_empty() {
                    return Step::Done;
                }
                let rest = rest.to_owned();
                self.in_head_noscript_anything_else(Token::Characters(rest))
            }
            Token::Comment(_) => self.step_in_head(token),
            Token::StartTag(ref tag)
                if matches!(
                    tag.name.group(),
                    DispatchGroup::LinkOrBasefontOrBgsound
                        | DispatchGroup::Meta
                        | DispatchGroup::Noframes
                        | DispatchGroup::Style
                ) =>
            {
                self.step_in_head(token)
            }

            /*
             * > An end tag whose tag name is "br"
             */
            Token::EndTag(ref name) if name.is(TagName::BR) => {
                self.in_head_noscript_anything_else(token)
            }

            /*
             * > A start tag whose tag name is one of: "head", "noscript"
             * > Any other end tag
             *
             * Parse error: ignore the token.
             */
            Token::StartTag(ref tag)
                if matches!(tag.name.group(), DispatchGroup::Head | DispatchGroup::Noscript) =>
            {
                self.parse_error(ParseErrorKind::UnexpectedStartTag(tag.name.name().clone()));
                Step::Done
            }
            Token::EndTag(name) => {
                self.parse_error(ParseErrorKind::UnexpectedEndTag(name.name().clone()));
                Step::Done
            }

            token => self.in_head_noscript_anything_else(token),
        }
    }

    /// > Parse error.
    /// >
    /// > Pop the current node (which will be a noscript element) from the stack of open
    /// > elements; the new current node will be a head element.
    /// >
    /// > Switch the insertion mode to "in head".
    /// >
    /// > Reprocess the token.
    fn in_head_noscript_anything_else(&mut self, token: Token) -> Step {
        match &token {
            Token::StartTag(tag) => {
                self.parse_error(ParseErrorKind::UnexpectedStartTag(tag.name.name().clone()))
            }
            Token::EndTag(name) => {
                self.parse_error(ParseErrorKind::UnexpectedEndTag(name.name().clone()))
            }
            Token::Characters(_) | Token::NullCharacter => {
                self.parse_error(ParseErrorKind::UnexpectedCharacters)
            }
            _ => {}
        }
        self.pop();
        Step::Reprocess(InsertionMode::IN_HEAD, token)
    }

    /// Parses next node in the "after head" insertion mode.
    ///
    /// @see https://html.spec.whatwg.org/#the-after-head-insertion-mode
    pub(super) fn step_after_head(&mut self, token: Token) -> Step {
        match token {
            Token::Characters(text) => {
                let (whitespace, rest) = split_leading_whitespace(&text);
                if !whitespace.is_empty() {
                    self.insert_characters(whitespace);
                }
                if rest.is_empty() {
                    return Step::Done;
                }
                let rest = rest.to_owned();
                self.after_head_anything_else(Token::Characters(rest))
            }

            Token::Comment(text) => {
                self.insert_comment(&text);
                Step::Done
            }

            Token::Doctype(_) => {
                self.parse_error(ParseErrorKind::UnexpectedDoctype);
                Step::Done
            }

            Token::StartTag(tag) => match tag.name.group() {
                DispatchGroup::Html => self.step_in_body(Token::StartTag(tag)),

                /*
                 * > A start tag whose tag name is "body"
                 *
                 * > Insert an HTML element for the token.
                 * > Set the frameset-ok flag to "not ok".
                 * > Switch the insertion mode to "in body".
                 */
                DispatchGroup::Body => {
                    self.insert_html_element(&tag);
                    self.state.frameset_ok = false;
                    self.set_mode(InsertionMode::IN_BODY);
                    Step::Done
                }

                /*
                 * > A start tag whose tag name is "frameset"
                 */
                DispatchGroup::Frameset => {
                    self.insert_html_element(&tag);
                    self.set_mode(InsertionMode::IN_FRAMESET);
                    Step::Done
                }

                /*
                 * > A start tag whose tag name is one of: "base", "basefont", "bgsound", "link",
                 * > "meta", "noframes", "script", "style", "template", "title"
                 *
                 * > Parse error.
                 * > Push the node pointed to by the head element pointer onto the stack of open
                 * > elements.
                 * > Process the token using the rules for the "in head" insertion mode.
                 * > Remove the node pointed to by the head element pointer from the stack of open
                 * > elements. (It might not be the current node at this point.)
                 */
                DispatchGroup::Base
                | DispatchGroup::LinkOrBasefontOrBgsound
                | DispatchGroup::Meta
                | DispatchGroup::Noframes
                | DispatchGroup::Script
                | DispatchGroup::Style
                | DispatchGroup::Template
                | DispatchGroup::Title => {
                    self.parse_error(ParseErrorKind::UnexpectedStartTag(tag.name.name().clone()));
                    let Some(head) = self.state.head_element.clone() else {
                        return self.step_in_head(Token::StartTag(tag));
                    };
                    let entry = Rc::new(StackNode::html(
                        ElementName::for_tag(TagName::HEAD),
                        head,
                        None,
                    ));
                    self.push(Rc::clone(&entry));
                    let step = self.step_in_head(Token::StartTag(tag));
                    if let Some(index) = self.state.stack.position_of(&entry) {
                        self.remove_from_stack(index);
                    }
                    step
                }

                /*
                 * > A start tag whose tag name is "head"
                 *
                 * Parse error: ignore the token.
                 */
                DispatchGroup::Head => {
                    self.parse_error(ParseErrorKind::UnexpectedStartTag(tag.name.name().clone()));
                    Step::Done
                }

                _ => self.after_head_anything_else(Token::StartTag(tag)),
            },

            Token::EndTag(name) => match name.group() {
                DispatchGroup::Template => self.step_in_head(Token::EndTag(name)),
                DispatchGroup::Body | DispatchGroup::Html | DispatchGroup::Br => {
                    self.after_head_anything_else(Token::EndTag(name))
                }
                _ => {
                    self.parse_error(ParseErrorKind::UnexpectedEndTag(name.name().clone()));
                    Step::Done
                }
            },

            token => self.after_head_anything_else(token),
        }
    }

    /// > Insert an HTML element for a "body" start tag token with no attributes.
    /// >
    /// > Switch the insertion mode to "in body".
    /// >
    /// > Reprocess the current token.
    fn after_head_anything_else(&mut self, token: Token) -> Step {
        self.insert_html_element_named(TagName::BODY);
        Step::Reprocess(self.state.body_mode(), token)
    }

    /// Parses next node in the "text" insertion mode.
    ///
    /// @see https://html.spec.whatwg.org/#parsing-main-incdata
    pub(super) fn step_text(&mut self, token: Token) -> Step {
        let original_mode = self.state.original_mode.unwrap_or(InsertionMode::IN_BODY);
        match token {
            /*
             * > A character token
             *
             * > Insert the token's character.
             */
            Token::Characters(text) => {
                self.insert_characters(&text);
                Step::Done
            }
            Token::NullCharacter => {
                self.insert_characters("\u{FFFD}");
                Step::Done
            }

            /*
             * > An end-of-file token
             *
             * > Parse error.
             * > If the current node is a script element, then set its already started to true.
             * > Pop the current node off the stack of open elements.
             * > Switch the insertion mode to the original insertion mode and reprocess the token.
             */
            Token::Eof => {
                self.parse_error(ParseErrorKind::EofInText);
                self.pop();
                self.state.original_mode = None;
                Step::Reprocess(original_mode, Token::Eof)
            }

            /*
             * > An end tag whose tag name is "script"
             * > Any other end tag
             *
             * > Pop the current node off the stack of open elements.
             * > Switch the insertion mode to the original insertion mode.
             *
             * Scripts are not executed, so both cases are the same.
             */
            Token::EndTag(_) => {
                self.pop();
                self.state.original_mode = None;
                self.set_mode(original_mode);
                Step::Done
            }

            _ => Step::Done,
        }
    }
}

/// The algorithm for extracting a character encoding from a meta element.
///
/// Returns the raw label; mapping it to an encoding is left to the caller.
///
/// @see https://html.spec.whatwg.org/#algorithm-for-extracting-a-character-encoding-from-a-meta-element
fn extract_character_encoding(content: &str) -> Option<String> {
    let bytes = content.as_bytes();
    let mut position = 0;

    loop {
        /*
         * > 2. Loop: Find the first seven characters in s after position that are an ASCII
         * >    case-insensitive match for the word "charset". If no such match is found,
         * >    return nothing.
         */
        let found = bytes
            .get(position..)?
            .windows(7)
            .position(|window| window.eq_ignore_ascii_case(b"charset"))?;
        position += found + 7;

        /*
         * > 3. Skip any ASCII whitespace that immediately follow the word "charset" (there
         * >    might not be any).
         * > 4. If the next character is not a U+003D EQUALS SIGN (=), then move position to
         * >    point just before that next character, and jump back to the step labeled loop.
         */
        while bytes.get(position).map_or(false, u8::is_ascii_whitespace) {
            position += 1;
        }
        if bytes.get(position) != Some(&b'=') {
            continue;
        }
        position += 1;
        while bytes.get(position).map_or(false, u8::is_ascii_whitespace) {
            position += 1;
        }

        /*
         * > 6. Process the next character as follows:
         * >    - If it is a U+0022 QUOTATION MARK character (") and there is a later U+0022
         * >      QUOTATION MARK character (") in s
         * >    - If it is a U+0027 APOSTROPHE character (') and there is a later U+0027
         * >      APOSTROPHE character (') in s
         * >      Return the result of getting an encoding from the substring that is between
         * >      this character and the next earliest occurrence of this character.
         * >    - If it is an unmatched U+0022 QUOTATION MARK character (")
         * >    - If it is an unmatched U+0027 APOSTROPHE character (')
         * >    - If there is no next character
         * >      Return nothing.
         * >    - Otherwise
         * >      Return the result of getting an encoding from the substring that consists of
         * >      this character up to but not including the first ASCII whitespace or U+003B
         * >      SEMICOLON character (;), or the end of s, whichever comes first.
         */
        let rest = content.get(position..)?;
        return match rest.as_bytes().first()? {
            quote @ (b'"' | b'\'') => {
                let inner = &rest[1..];
                let end = inner.find(*quote as char)?;
                Some(inner[..end].to_owned())
            }
            _ => {
                let end = rest
                    .find(|c: char| c.is_ascii_whitespace() || c == ';')
                    .unwrap_or(rest.len());
                Some(rest[..end].to_owned())
            }
        };
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn charset_from_content() {
        assert_eq!(
            Some("utf-8".to_owned()),
            extract_character_encoding("text/html; charset=utf-8")
        );
        assert_eq!(
            Some("windows-1252".to_owned()),
            extract_character_encoding("text/html;CHARSET = \"windows-1252\" ")
        );
        assert_eq!(
            Some("koi8-r".to_owned()),
            extract_character_encoding("charsetx; charset='koi8-r'")
        );
        assert_eq!(Some("x".to_owned()), extract_character_encoding("charset=x;y"));
    }

    #[test]
    fn charset_missing_or_unterminated() {
        assert_eq!(None, extract_character_encoding("text/html"));
        assert_eq!(None, extract_character_encoding("charset="));
        assert_eq!(None, extract_character_encoding("charset=\"utf-8"));
        assert_eq!(None, extract_character_encoding("chars"));
    }
}
