use super::{
    stack_of_open_elements::Scope,
    token::{is_all_whitespace, Step, Tag, Token},
    InsertionMode, TreeBuilder,
};
use crate::{
    element_name::{DispatchGroup, ElementName, TagName},
    error::ParseErrorKind,
    namespace::Namespace,
    sink::TreeSink,
    tokenizer_control::LexicalState,
};

impl<S: TreeSink> TreeBuilder<S> {
    /// Parses next node in the "in body" insertion mode.
    ///
    /// Also runs the FRAMESET_OK mode, which is "in body" with the frameset-ok
    /// flag still set.
    ///
    /// @see https://html.spec.whatwg.org/#parsing-main-inbody
    pub(super) fn step_in_body(&mut self, token: Token) -> Step {
        match token {
            /*
             * > A character token that is U+0000 NULL
             *
             * Parse error. Ignore the token.
             */
            Token::NullCharacter => {
                self.parse_error(ParseErrorKind::UnexpectedNullCharacter);
                Step::Done
            }

            /*
             * > A character token that is one of U+0009 CHARACTER TABULATION, …
             *
             * > Reconstruct the active formatting elements, if any.
             * > Insert the token's character.
             *
             * > Any other character token
             *
             * > Reconstruct the active formatting elements, if any.
             * > Insert the token's character.
             * > Set the frameset-ok flag to "not ok".
             */
            Token::Characters(text) => {
                self.reconstruct_active_formatting_elements();
                self.insert_characters(&text);
                if !is_all_whitespace(&text) {
                    self.state.frameset_not_ok();
                }
                Step::Done
            }

            Token::Comment(text) => {
                self.insert_comment(&text);
                Step::Done
            }

            Token::Doctype(_) => {
                self.parse_error(ParseErrorKind::UnexpectedDoctype);
                Step::Done
            }

            Token::StartTag(tag) => self.in_body_start_tag(tag),
            Token::EndTag(name) => self.in_body_end_tag(name),

            /*
             * > An end-of-file token
             *
             * > If the stack of template insertion modes is not empty, then process the token
             * > using the rules for the "in template" insertion mode.
             * >
             * > Otherwise, follow these steps:
             * >
             * > 1. If there is a node in the stack of open elements that is not either a dd
             * >    element, a dt element, an li element, an optgroup element, an option element,
             * >    a p element, an rb element, an rp element, an rt element, an rtc element, a
             * >    tbody element, a td element, a tfoot element, a th element, a thead element, a
             * >    tr element, the body element, or the html element, then this is a parse error.
             * > 2. Stop parsing.
             */
            Token::Eof => {
                if !self.state.template_modes.is_empty() {
                    return self.step_in_template(Token::Eof);
                }
                self.report_unclosed_elements();
                self.stop_parsing()
            }
        }
    }

    fn in_body_start_tag(&mut self, tag: Tag) -> Step {
        match tag.name.group() {
            /*
             * > A start tag whose tag name is "html"
             *
             * > Parse error.
             * >
             * > If there is a template element on the stack of open elements, then ignore the
             * > token.
             * >
             * > Otherwise, for each attribute on the token, check to see if the attribute is
             * > already present on the top element of the stack of open elements. If it is not,
             * > add the attribute and its corresponding value to that element.
             */
            DispatchGroup::Html => {
                self.parse_error(ParseErrorKind::UnexpectedStartTag(tag.name.name().clone()));
                if !self.state.stack.contains(TagName::TEMPLATE) {
                    self.merge_attributes_into(0, &tag.attributes);
                }
                Step::Done
            }

            /*
             * > A start tag whose tag name is one of: "base", "basefont", "bgsound", "link",
             * > "meta", "noframes", "script", "style", "template", "title"
             *
             * Process the token using the rules for the "in head" insertion mode.
             */
            DispatchGroup::Base
            | DispatchGroup::LinkOrBasefontOrBgsound
            | DispatchGroup::Meta
            | DispatchGroup::Noframes
            | DispatchGroup::Script
            | DispatchGroup::Style
            | DispatchGroup::Template
            | DispatchGroup::Title => self.step_in_head(Token::StartTag(tag)),

            /*
             * > A start tag whose tag name is "body"
             *
             * > Parse error.
             * >
             * > If the stack of open elements has only one node on it, or if the second element
             * > on the stack of open elements is not a body element, or if there is a template
             * > element on the stack of open elements, then ignore the token. (fragment case or
             * > there is a template element on the stack)
             * >
             * > Otherwise, set the frameset-ok flag to "not ok"; then, for each attribute on the
             * > token, check to see if the attribute is already present on the body element (the
             * > second element) on the stack of open elements, and if it is not, add the
             * > attribute and its corresponding value to that element.
             */
            DispatchGroup::Body => {
                self.parse_error(ParseErrorKind::UnexpectedStartTag(tag.name.name().clone()));
                if !self.second_element_is_body() || self.state.stack.contains(TagName::TEMPLATE) {
                    return Step::Done;
                }
                self.state.frameset_not_ok();
                self.merge_attributes_into(1, &tag.attributes);
                Step::Done
            }

            /*
             * > A start tag whose tag name is "frameset"
             *
             * > Parse error.
             * >
             * > If the stack of open elements has only one node on it, or if the second element
             * > on the stack of open elements is not a body element, then ignore the token.
             * > (fragment case or there is a template element on the stack)
             * >
             * > If the frameset-ok flag is set to "not ok", ignore the token.
             * >
             * > Otherwise, run the following steps:
             * >
             * > 1. Remove the second element on the stack of open elements from its parent
             * >    node, if it has one.
             * > 2. Pop all the nodes from the bottom of the stack of open elements, from the
             * >    current node up to, but not including, the root html element.
             * > 3. Insert an HTML element for the token.
             * > 4. Switch the insertion mode to "in frameset".
             */
            DispatchGroup::Frameset => {
                self.parse_error(ParseErrorKind::UnexpectedStartTag(tag.name.name().clone()));
                if !self.second_element_is_body() || !self.state.frameset_ok {
                    return Step::Done;
                }
                if let Some(body) = self.state.stack.get(1).map(|body| body.node.clone()) {
                    self.sink.detach_from_parent(&body);
                }
                self.pop_to_length(1);
                self.insert_html_element(&tag);
                self.set_mode(InsertionMode::IN_FRAMESET);
                Step::Done
            }

            /*
             * > A start tag whose tag name is one of: "address", "article", "aside",
             * > "blockquote", "center", "details", "dialog", "dir", "div", "dl", "fieldset",
             * > "figcaption", "figure", "footer", "header", "hgroup", "main", "menu", "nav",
             * > "ol", "p", "search", "section", "summary", "ul"
             *
             * > If the stack of open elements has a p element in button scope, then close a p
             * > element.
             * >
             * > Insert an HTML element for the token.
             */
            DispatchGroup::Address
            | DispatchGroup::DivOrBlockquoteOrCenterOrMenu
            | DispatchGroup::Fieldset
            | DispatchGroup::P
            | DispatchGroup::UlOrOlOrDl => {
                self.close_p_if_in_button_scope();
                self.insert_html_element(&tag);
                Step::Done
            }

            /*
             * > A start tag whose tag name is one of: "h1", "h2", "h3", "h4", "h5", "h6"
             *
             * > If the stack of open elements has a p element in button scope, then close a p
             * > element.
             * >
             * > If the current node is an HTML element whose tag name is one of "h1", "h2",
             * > "h3", "h4", "h5", or "h6", then this is a parse error; pop the current node off
             * > the stack of open elements.
             * >
             * > Insert an HTML element for the token.
             */
            DispatchGroup::H1ToH6 => {
                self.close_p_if_in_button_scope();
                let current_is_heading = self
                    .current_node()
                    .map(|node| node.html_group() == Some(DispatchGroup::H1ToH6))
                    .unwrap_or(false);
                if current_is_heading {
                    self.parse_error(ParseErrorKind::NestedElement(tag.name.name().clone()));
                    self.pop();
                }
                self.insert_html_element(&tag);
                Step::Done
            }

            /*
             * > A start tag whose tag name is one of: "pre", "listing"
             *
             * > If the stack of open elements has a p element in button scope, then close a p
             * > element.
             * >
             * > Insert an HTML element for the token.
             * >
             * > If the next token is a U+000A LINE FEED (LF) character token, then ignore that
             * > token and move on to the next one. (Newlines at the start of pre blocks are
             * > ignored as an authoring convenience.)
             * >
             * > Set the frameset-ok flag to "not ok".
             */
            DispatchGroup::PreOrListing => {
                self.close_p_if_in_button_scope();
                self.insert_html_element(&tag);
                self.state.need_to_drop_lf = true;
                self.state.frameset_not_ok();
                Step::Done
            }

            /*
             * > A start tag whose tag name is "form"
             *
             * > If the form element pointer is not null, and there is no template element on
             * > the stack of open elements, then this is a parse error; ignore the token.
             * >
             * > Otherwise:
             * >
             * > If the stack of open elements has a p element in button scope, then close a p
             * > element.
             * >
             * > Insert an HTML element for the token, and, if there is no template element on
             * > the stack of open elements, set the form element pointer to point to the element
             * > created.
             */
            DispatchGroup::Form => {
                let has_template = self.state.stack.contains(TagName::TEMPLATE);
                if self.state.form_element.is_some() && !has_template {
                    self.parse_error(ParseErrorKind::NestedElement(tag.name.name().clone()));
                    return Step::Done;
                }
                self.close_p_if_in_button_scope();
                let form = self.insert_html_element(&tag);
                if !has_template {
                    self.state.form_element = form.map(|entry| entry.node.clone());
                }
                Step::Done
            }

            /*
             * > A start tag whose tag name is "li"
             *
             * > 1. Set the frameset-ok flag to "not ok".
             * > 2. Initialize node to be the current node (the bottommost node of the stack).
             * > 3. Loop: If node is an li element, then run these substeps:
             * >    1. Generate implied end tags, except for li elements.
             * >    2. If the current node is not an li element, then this is a parse error.
             * >    3. Pop elements from the stack of open elements until an li element has been
             * >       popped from the stack.
             * >    4. Jump to the step labeled done below.
             * > 4. If node is in the special category, but is not an address, div, or p
             * >    element, then jump to the step labeled done below.
             * > 5. Otherwise, set node to the previous entry in the stack of open elements and
             * >    return to the step labeled loop.
             * > 6. Done: If the stack of open elements has a p element in button scope, then
             * >    close a p element.
             * > 7. Finally, insert an HTML element for the token.
             */
            DispatchGroup::Li => {
                self.state.frameset_not_ok();
                self.close_list_item(&[TagName::LI]);
                self.close_p_if_in_button_scope();
                self.insert_html_element(&tag);
                Step::Done
            }

            /*
             * > A start tag whose tag name is one of: "dd", "dt"
             *
             * The same steps as for "li", looking for either a dd or a dt element.
             */
            DispatchGroup::DdOrDt => {
                self.state.frameset_not_ok();
                self.close_list_item(&[TagName::DD, TagName::DT]);
                self.close_p_if_in_button_scope();
                self.insert_html_element(&tag);
                Step::Done
            }

            /*
             * > A start tag whose tag name is "plaintext"
             *
             * > If the stack of open elements has a p element in button scope, then close a p
             * > element.
             * >
             * > Insert an HTML element for the token.
             * >
             * > Switch the tokenizer to the PLAINTEXT state.
             */
            DispatchGroup::Plaintext => {
                self.close_p_if_in_button_scope();
                self.insert_html_element(&tag);
                self.switch_lexical_state(LexicalState::Plaintext, None);
                Step::Done
            }

            /*
             * > A start tag whose tag name is "button"
             *
             * > 1. If the stack of open elements has a button element in scope, then run these
             * >    substeps:
             * >    1. Parse error.
             * >    2. Generate implied end tags.
             * >    3. Pop elements from the stack of open elements until a button element has
             * >       been popped from the stack.
             * > 2. Reconstruct the active formatting elements, if any.
             * > 3. Insert an HTML element for the token.
             * > 4. Set the frameset-ok flag to "not ok".
             */
            DispatchGroup::Button => {
                if self.state.stack.has_element_in_scope(TagName::BUTTON) {
                    self.parse_error(ParseErrorKind::NestedElement(tag.name.name().clone()));
                    self.generate_implied_end_tags(None);
                    self.pop_until(TagName::BUTTON);
                }
                self.reconstruct_active_formatting_elements();
                self.insert_html_element(&tag);
                self.state.frameset_not_ok();
                Step::Done
            }

            /*
             * > A start tag whose tag name is "a"
             *
             * > If the list of active formatting elements contains an a element between the end
             * > of the list and the last marker on the list (or the start of the list if there is
             * > no marker on the list), then this is a parse error; run the adoption agency
             * > algorithm for the token, then remove that element from the list of active
             * > formatting elements and the stack of open elements if the adoption agency
             * > algorithm didn't already remove it (it might not have if the element is not in
             * > table scope).
             * >
             * > Reconstruct the active formatting elements, if any.
             * >
             * > Insert an HTML element for the token. Push onto the list of active formatting
             * > elements that element.
             */
            DispatchGroup::A => {
                let previous = self
                    .state
                    .formatting
                    .find_last_between_top_and_marker(&tag.name)
                    .and_then(|pos| self.state.formatting.get(pos))
                    .and_then(|entry| entry.element())
                    .cloned();

                if let Some(previous) = previous {
                    self.parse_error(ParseErrorKind::NestedElement(tag.name.name().clone()));
                    if !self.run_adoption_agency_algorithm(&tag.name) {
                        self.any_other_end_tag(&tag.name);
                    }
                    self.state.formatting.remove(&previous);
                    if let Some(index) = self.state.stack.position_of(&previous) {
                        self.remove_from_stack(index);
                    }
                }

                self.reconstruct_active_formatting_elements();
                self.insert_formatting_element(&tag);
                Step::Done
            }

            /*
             * > A start tag whose tag name is one of: "b", "big", "code", "em", "font", "i",
             * > "s", "small", "strike", "strong", "tt", "u"
             *
             * > Reconstruct the active formatting elements, if any.
             * >
             * > Insert an HTML element for the token. Push onto the list of active formatting
             * > elements that element.
             */
            DispatchGroup::B | DispatchGroup::Font => {
                self.reconstruct_active_formatting_elements();
                self.insert_formatting_element(&tag);
                Step::Done
            }

            /*
             * > A start tag whose tag name is "nobr"
             *
             * > Reconstruct the active formatting elements, if any.
             * >
             * > If the stack of open elements has a nobr element in scope, then this is a parse
             * > error; run the adoption agency algorithm for the token, then once again
             * > reconstruct the active formatting elements, if any.
             * >
             * > Insert an HTML element for the token. Push onto the list of active formatting
             * > elements that element.
             */
            DispatchGroup::Nobr => {
                self.reconstruct_active_formatting_elements();
                if self.state.stack.has_element_in_scope(TagName::NOBR) {
                    self.parse_error(ParseErrorKind::NestedElement(tag.name.name().clone()));
                    if !self.run_adoption_agency_algorithm(&tag.name) {
                        self.any_other_end_tag(&tag.name);
                    }
                    self.reconstruct_active_formatting_elements();
                }
                self.insert_formatting_element(&tag);
                Step::Done
            }

            /*
             * > A start tag whose tag name is one of: "applet", "marquee", "object"
             *
             * > Reconstruct the active formatting elements, if any.
             * >
             * > Insert an HTML element for the token.
             * >
             * > Insert a marker at the end of the list of active formatting elements.
             * >
             * > Set the frameset-ok flag to "not ok".
             */
            DispatchGroup::MarqueeOrApplet | DispatchGroup::Object => {
                self.reconstruct_active_formatting_elements();
                self.insert_html_element(&tag);
                self.state.formatting.insert_marker();
                self.state.frameset_not_ok();
                Step::Done
            }

            /*
             * > A start tag whose tag name is "table"
             *
             * > If the Document is not set to quirks mode, and the stack of open elements has a
             * > p element in button scope, then close a p element.
             * >
             * > Insert an HTML element for the token.
             * >
             * > Set the frameset-ok flag to "not ok".
             * >
             * > Switch the insertion mode to "in table".
             */
            DispatchGroup::Table => {
                if !self.state.is_quirks() {
                    self.close_p_if_in_button_scope();
                }
                self.insert_html_element(&tag);
                self.state.frameset_not_ok();
                self.set_mode(InsertionMode::IN_TABLE);
                Step::Done
            }

            /*
             * > A start tag whose tag name is one of: "area", "br", "embed", "img", "keygen",
             * > "wbr"
             *
             * > Reconstruct the active formatting elements, if any.
             * >
             * > Insert an HTML element for the token. Immediately pop the current node off the
             * > stack of open elements.
             * >
             * > Acknowledge the token's self-closing flag, if it is set.
             * >
             * > Set the frameset-ok flag to "not ok".
             */
            DispatchGroup::AreaOrWbr | DispatchGroup::Br | DispatchGroup::Embed | DispatchGroup::Img => {
                self.reconstruct_active_formatting_elements();
                self.insert_void_html_element(&tag);
                self.state.frameset_not_ok();
                Step::Done
            }

            /*
             * > A start tag whose tag name is "input"
             *
             * > Reconstruct the active formatting elements, if any.
             * >
             * > Insert an HTML element for the token. Immediately pop the current node off the
             * > stack of open elements.
             * >
             * > Acknowledge the token's self-closing flag, if it is set.
             * >
             * > If the token does not have an attribute with the name "type", or if it does, but
             * > that attribute's value is not an ASCII case-insensitive match for the string
             * > "hidden", then: set the frameset-ok flag to "not ok".
             */
            DispatchGroup::Input => {
                self.reconstruct_active_formatting_elements();
                self.insert_void_html_element(&tag);
                if !tag.attributes.has_value_ignore_ascii_case("type", "hidden") {
                    self.state.frameset_not_ok();
                }
                Step::Done
            }

            /*
             * > A start tag whose tag name is one of: "param", "source", "track"
             *
             * > Insert an HTML element for the token. Immediately pop the current node off the
             * > stack of open elements.
             * >
             * > Acknowledge the token's self-closing flag, if it is set.
             */
            DispatchGroup::ParamOrSourceOrTrack => {
                self.insert_void_html_element(&tag);
                Step::Done
            }

            /*
             * > A start tag whose tag name is "hr"
             *
             * > If the stack of open elements has a p element in button scope, then close a p
             * > element.
             * >
             * > Insert an HTML element for the token. Immediately pop the current node off the
             * > stack of open elements.
             * >
             * > Acknowledge the token's self-closing flag, if it is set.
             * >
             * > Set the frameset-ok flag to "not ok".
             */
            DispatchGroup::Hr => {
                self.close_p_if_in_button_scope();
                self.insert_void_html_element(&tag);
                self.state.frameset_not_ok();
                Step::Done
            }

            /*
             * > A start tag whose tag name is "image"
             *
             * > Parse error. Change the token's tag name to "img" and reprocess it. (Don't ask.)
             */
            DispatchGroup::Image => {
                self.parse_error(ParseErrorKind::ImageStartTag);
                let img = Tag {
                    name: ElementName::for_tag(TagName::IMG),
                    ..tag
                };
                Step::Reprocess(self.state.mode, Token::StartTag(img))
            }

            /*
             * > A start tag whose tag name is "textarea"
             *
             * > 1. Insert an HTML element for the token.
             * > 2. If the next token is a U+000A LINE FEED (LF) character token, then ignore
             * >    that token and move on to the next one. (Newlines at the start of textarea
             * >    elements are ignored as an authoring convenience.)
             * > 3. Switch the tokenizer to the RCDATA state.
             * > 4. Set the original insertion mode to the current insertion mode.
             * > 5. Set the frameset-ok flag to "not ok".
             * > 6. Switch the insertion mode to "text".
             *
             * The flag is cleared first so that the original insertion mode is not
             * FRAMESET_OK.
             */
            DispatchGroup::Textarea => {
                self.state.frameset_not_ok();
                self.parse_generic_text_element(&tag, LexicalState::Rcdata);
                self.state.need_to_drop_lf = true;
                Step::Done
            }

            /*
             * > A start tag whose tag name is "xmp"
             *
             * > If the stack of open elements has a p element in button scope, then close a p
             * > element.
             * >
             * > Reconstruct the active formatting elements, if any.
             * >
             * > Set the frameset-ok flag to "not ok".
             * >
             * > Follow the generic raw text element parsing algorithm.
             */
            DispatchGroup::Xmp => {
                self.close_p_if_in_button_scope();
                self.reconstruct_active_formatting_elements();
                self.state.frameset_not_ok();
                self.parse_generic_text_element(&tag, LexicalState::Rawtext);
                Step::Done
            }

            /*
             * > A start tag whose tag name is "iframe"
             *
             * > Set the frameset-ok flag to "not ok".
             * >
             * > Follow the generic raw text element parsing algorithm.
             */
            DispatchGroup::Iframe => {
                self.state.frameset_not_ok();
                self.parse_generic_text_element(&tag, LexicalState::Rawtext);
                Step::Done
            }

            /*
             * > A start tag whose tag name is "noembed"
             * > A start tag whose tag name is "noscript", if the scripting flag is enabled
             *
             * > Follow the generic raw text element parsing algorithm.
             */
            DispatchGroup::Noembed => {
                self.parse_generic_text_element(&tag, LexicalState::Rawtext);
                Step::Done
            }
            DispatchGroup::Noscript if self.config.scripting_enabled => {
                self.parse_generic_text_element(&tag, LexicalState::Rawtext);
                Step::Done
            }

            /*
             * > A start tag whose tag name is "select"
             *
             * > Reconstruct the active formatting elements, if any.
             * >
             * > Insert an HTML element for the token.
             * >
             * > Set the frameset-ok flag to "not ok".
             * >
             * > If the insertion mode is one of "in table", "in caption", "in table body", "in
             * > row", or "in cell", then switch the insertion mode to "in select in table".
             * > Otherwise, switch the insertion mode to "in select".
             */
            DispatchGroup::Select => {
                self.reconstruct_active_formatting_elements();
                self.insert_html_element(&tag);
                self.state.frameset_not_ok();
                let mode = match self.state.mode.is_table_related() {
                    true => InsertionMode::IN_SELECT_IN_TABLE,
                    false => InsertionMode::IN_SELECT,
                };
                self.set_mode(mode);
                Step::Done
            }

            /*
             * > A start tag whose tag name is one of: "optgroup", "option"
             *
             * > If the current node is an option element, then pop the current node off the
             * > stack of open elements.
             * >
             * > Reconstruct the active formatting elements, if any.
             * >
             * > Insert an HTML element for the token.
             */
            DispatchGroup::Optgroup | DispatchGroup::Option => {
                if self.current_node_is(TagName::OPTION) {
                    self.pop();
                }
                self.reconstruct_active_formatting_elements();
                self.insert_html_element(&tag);
                Step::Done
            }

            /*
             * > A start tag whose tag name is one of: "rb", "rtc"
             *
             * > If the stack of open elements has a ruby element in scope, then generate implied
             * > end tags. If the current node is not now a ruby element, this is a parse error.
             * >
             * > Insert an HTML element for the token.
             */
            DispatchGroup::RbOrRtc => {
                if self.state.stack.has_element_in_scope(TagName::RUBY) {
                    self.generate_implied_end_tags(None);
                    if !self.current_node_is(TagName::RUBY) {
                        self.parse_error(ParseErrorKind::UnexpectedStartTag(
                            tag.name.name().clone(),
                        ));
                    }
                }
                self.insert_html_element(&tag);
                Step::Done
            }

            /*
             * > A start tag whose tag name is one of: "rp", "rt"
             *
             * > If the stack of open elements has a ruby element in scope, then generate implied
             * > end tags, except for rtc elements. If the current node is not now a rtc element
             * > or a ruby element, this is a parse error.
             * >
             * > Insert an HTML element for the token.
             */
            DispatchGroup::RtOrRp => {
                if self.state.stack.has_element_in_scope(TagName::RUBY) {
                    self.generate_implied_end_tags(Some(&ElementName::for_tag(TagName::RTC)));
                    if !self.current_node_is(TagName::RTC) && !self.current_node_is(TagName::RUBY) {
                        self.parse_error(ParseErrorKind::UnexpectedStartTag(
                            tag.name.name().clone(),
                        ));
                    }
                }
                self.insert_html_element(&tag);
                Step::Done
            }

            /*
             * > A start tag whose tag name is "math"
             *
             * > Reconstruct the active formatting elements, if any.
             * >
             * > Adjust MathML attributes for the token. (This fixes the case of MathML
             * > attributes that are not all lowercase.)
             * >
             * > Adjust foreign attributes for the token. (This fixes the use of namespaced
             * > attributes, in particular XLink.)
             * >
             * > Insert a foreign element for the token, with MathML namespace and false.
             * >
             * > If the token has its self-closing flag set, pop the current node off the stack of
             * > open elements and acknowledge the token's self-closing flag.
             */
            DispatchGroup::Math => {
                self.insert_foreign_root(tag, Namespace::MathML);
                Step::Done
            }

            /*
             * > A start tag whose tag name is "svg"
             *
             * The same steps as for "math", in the SVG namespace.
             */
            DispatchGroup::Svg => {
                self.insert_foreign_root(tag, Namespace::Svg);
                Step::Done
            }

            /*
             * > A start tag whose tag name is one of: "caption", "col", "colgroup", "frame",
             * > "head", "tbody", "td", "tfoot", "th", "thead", "tr"
             *
             * Parse error. Ignore the token.
             */
            DispatchGroup::Caption
            | DispatchGroup::Col
            | DispatchGroup::Colgroup
            | DispatchGroup::Frame
            | DispatchGroup::Head
            | DispatchGroup::TbodyOrTheadOrTfoot
            | DispatchGroup::TdOrTh
            | DispatchGroup::Tr => {
                self.parse_error(ParseErrorKind::UnexpectedStartTag(tag.name.name().clone()));
                Step::Done
            }

            /*
             * > Any other start tag
             *
             * > Reconstruct the active formatting elements, if any.
             * >
             * > Insert an HTML element for the token.
             */
            _ => {
                self.reconstruct_active_formatting_elements();
                self.insert_html_element(&tag);
                Step::Done
            }
        }
    }

    fn in_body_end_tag(&mut self, name: ElementName) -> Step {
        match name.group() {
            /*
             * > An end tag whose tag name is "template"
             *
             * Process the token using the rules for the "in head" insertion mode.
             */
            DispatchGroup::Template => self.step_in_head(Token::EndTag(name)),

            /*
             * > An end tag whose tag name is "body"
             *
             * > If the stack of open elements does not have a body element in scope, this is a
             * > parse error; ignore the token.
             * >
             * > Otherwise, if there is a node in the stack of open elements that is not either a
             * > dd element, … the body element, or the html element, then this is a parse error.
             * >
             * > Switch the insertion mode to "after body".
             */
            DispatchGroup::Body => {
                if !self.state.stack.has_element_in_scope(TagName::BODY) {
                    self.parse_error(ParseErrorKind::NoElementInScope(name.name().clone()));
                    return Step::Done;
                }
                self.set_mode(InsertionMode::AFTER_BODY);
                Step::Done
            }

            /*
             * > An end tag whose tag name is "html"
             *
             * > If the stack of open elements does not have a body element in scope, this is a
             * > parse error; ignore the token.
             * >
             * > Otherwise, … switch the insertion mode to "after body". Reprocess the token.
             */
            DispatchGroup::Html => {
                if !self.state.stack.has_element_in_scope(TagName::BODY) {
                    self.parse_error(ParseErrorKind::NoElementInScope(name.name().clone()));
                    return Step::Done;
                }
                Step::Reprocess(InsertionMode::AFTER_BODY, Token::EndTag(name))
            }

            /*
             * > An end tag whose tag name is one of: "address", "article", "aside",
             * > "blockquote", "button", "center", "details", "dialog", "dir", "div", "dl",
             * > "fieldset", "figcaption", "figure", "footer", "header", "hgroup", "listing",
             * > "main", "menu", "nav", "ol", "pre", "search", "section", "summary", "ul"
             *
             * > If the stack of open elements does not have an element in scope that is an HTML
             * > element with the same tag name as that of the token, then this is a parse error;
             * > ignore the token.
             * >
             * > Otherwise, run these steps:
             * >
             * > 1. Generate implied end tags.
             * > 2. If the current node is not an HTML element with the same tag name as that of
             * >    the token, then this is a parse error.
             * > 3. Pop elements from the stack of open elements until an HTML element with the
             * >    same tag name as the token has been popped from the stack.
             */
            DispatchGroup::Address
            | DispatchGroup::Button
            | DispatchGroup::DivOrBlockquoteOrCenterOrMenu
            | DispatchGroup::Fieldset
            | DispatchGroup::PreOrListing
            | DispatchGroup::UlOrOlOrDl => {
                if !self.state.stack.has_element_in_scope(name.tag_name()) {
                    self.parse_error(ParseErrorKind::NoElementInScope(name.name().clone()));
                    return Step::Done;
                }
                self.close_element_in_scope(&name, false);
                Step::Done
            }

            /*
             * > An end tag whose tag name is "form"
             */
            DispatchGroup::Form => {
                self.in_body_form_end_tag(&name);
                Step::Done
            }

            /*
             * > An end tag whose tag name is "p"
             *
             * > If the stack of open elements does not have a p element in button scope, then
             * > this is a parse error; insert an HTML element for a "p" start tag token with no
             * > attributes.
             * >
             * > Close a p element.
             */
            DispatchGroup::P => {
                if !self.state.stack.has_p_in_button_scope() {
                    self.parse_error(ParseErrorKind::NoElementInScope(name.name().clone()));
                    self.insert_html_element_named(TagName::P);
                }
                self.close_a_p_element();
                Step::Done
            }

            /*
             * > An end tag whose tag name is "li"
             *
             * > If the stack of open elements does not have an li element in list item scope,
             * > then this is a parse error; ignore the token.
             * >
             * > Otherwise, run these steps:
             * >
             * > 1. Generate implied end tags, except for li elements.
             * > 2. If the current node is not an li element, then this is a parse error.
             * > 3. Pop elements from the stack of open elements until an li element has been
             * >    popped from the stack.
             */
            DispatchGroup::Li => {
                if !self.state.stack.has_element_in_list_item_scope(TagName::LI) {
                    self.parse_error(ParseErrorKind::NoElementInScope(name.name().clone()));
                    return Step::Done;
                }
                self.close_element_in_scope(&name, true);
                Step::Done
            }

            /*
             * > An end tag whose tag name is one of: "dd", "dt"
             *
             * > If the stack of open elements does not have an element in scope that is an HTML
             * > element with the same tag name as that of the token, then this is a parse error;
             * > ignore the token.
             * >
             * > Otherwise, run these steps:
             * >
             * > 1. Generate implied end tags, except for HTML elements with the same tag name as
             * >    the token.
             * > 2. If the current node is not an HTML element with the same tag name as that of
             * >    the token, then this is a parse error.
             * > 3. Pop elements from the stack of open elements until an HTML element with the
             * >    same tag name as the token has been popped from the stack.
             */
            DispatchGroup::DdOrDt => {
                if !self.state.stack.has_element_in_scope(name.tag_name()) {
                    self.parse_error(ParseErrorKind::NoElementInScope(name.name().clone()));
                    return Step::Done;
                }
                self.close_element_in_scope(&name, true);
                Step::Done
            }

            /*
             * > An end tag whose tag name is one of: "h1", "h2", "h3", "h4", "h5", "h6"
             *
             * > If the stack of open elements does not have an element in scope that is an HTML
             * > element and whose tag name is one of "h1", "h2", "h3", "h4", "h5", or "h6", then
             * > this is a parse error; ignore the token.
             * >
             * > Otherwise, run these steps:
             * >
             * > 1. Generate implied end tags.
             * > 2. If the current node is not an HTML element with the same tag name as that of
             * >    the token, then this is a parse error.
             * > 3. Pop elements from the stack of open elements until an HTML element whose tag
             * >    name is one of "h1", "h2", "h3", "h4", "h5", or "h6" has been popped from the
             * >    stack.
             */
            DispatchGroup::H1ToH6 => {
                if !self.state.stack.has_any_h1_to_h6_element_in_scope() {
                    self.parse_error(ParseErrorKind::NoElementInScope(name.name().clone()));
                    return Step::Done;
                }
                self.generate_implied_end_tags(None);
                if !self.current_node_is(name.tag_name()) {
                    self.parse_error(ParseErrorKind::MisnestedEndTag(name.name().clone()));
                }
                while let Some(popped) = self.pop() {
                    if popped.html_group() == Some(DispatchGroup::H1ToH6) {
                        break;
                    }
                }
                Step::Done
            }

            /*
             * > An end tag whose tag name is one of: "a", "b", "big", "code", "em", "font", "i",
             * > "nobr", "s", "small", "strike", "strong", "tt", "u"
             *
             * > Run the adoption agency algorithm for the token.
             */
            DispatchGroup::A | DispatchGroup::B | DispatchGroup::Font | DispatchGroup::Nobr => {
                if !self.run_adoption_agency_algorithm(&name) {
                    self.any_other_end_tag(&name);
                }
                Step::Done
            }

            /*
             * > An end tag token whose tag name is one of: "applet", "marquee", "object"
             *
             * > If the stack of open elements does not have an element in scope that is an HTML
             * > element with the same tag name as that of the token, then this is a parse error;
             * > ignore the token.
             * >
             * > Otherwise, run these steps:
             * >
             * > 1. Generate implied end tags.
             * > 2. If the current node is not an HTML element with the same tag name as that of
             * >    the token, then this is a parse error.
             * > 3. Pop elements from the stack of open elements until an HTML element with the
             * >    same tag name as the token has been popped from the stack.
             * > 4. Clear the list of active formatting elements up to the last marker.
             */
            DispatchGroup::MarqueeOrApplet | DispatchGroup::Object => {
                if !self.state.stack.has_element_in_scope(name.tag_name()) {
                    self.parse_error(ParseErrorKind::NoElementInScope(name.name().clone()));
                    return Step::Done;
                }
                self.close_element_in_scope(&name, false);
                self.state.formatting.clear_up_to_last_marker();
                Step::Done
            }

            /*
             * > An end tag whose tag name is "br"
             *
             * > Parse error. Drop the attributes from the token, and act as described in the
             * > next entry; i.e. act as if this was a "br" start tag token with no attributes,
             * > rather than the end tag token that it actually is.
             */
            DispatchGroup::Br => {
                self.parse_error(ParseErrorKind::EndTagBr);
                Step::Reprocess(self.state.mode, Token::start_tag(name))
            }

            /*
             * > Any other end tag
             */
            _ => {
                self.any_other_end_tag(&name);
                Step::Done
            }
        }
    }

    /// > An end tag whose tag name is "form"
    /// >
    /// > If there is no template element on the stack of open elements, then run these
    /// > substeps:
    /// >
    /// > 1. Let node be the element that the form element pointer is set to, or null if it is
    /// >    not set to an element.
    /// > 2. Set the form element pointer to null.
    /// > 3. If node is null or if the stack of open elements does not have node in scope, then
    /// >    this is a parse error; return and ignore the token.
    /// > 4. Generate implied end tags.
    /// > 5. If the current node is not node, then this is a parse error.
    /// > 6. Remove node from the stack of open elements.
    /// >
    /// > If there is a template element on the stack of open elements, then run these
    /// > substeps instead:
    /// >
    /// > 1. If the stack of open elements does not have a form element in scope, then this is
    /// >    a parse error; return and ignore the token.
    /// > 2. Generate implied end tags.
    /// > 3. If the current node is not a form element, then this is a parse error.
    /// > 4. Pop elements from the stack of open elements until a form element has been popped
    /// >    from the stack.
    fn in_body_form_end_tag(&mut self, name: &ElementName) {
        if self.state.stack.contains(TagName::TEMPLATE) {
            if !self.state.stack.has_element_in_scope(TagName::FORM) {
                self.parse_error(ParseErrorKind::NoElementInScope(name.name().clone()));
                return;
            }
            self.close_element_in_scope(name, false);
            return;
        }

        let Some(form) = self.state.form_element.take() else {
            self.parse_error(ParseErrorKind::NoElementInScope(name.name().clone()));
            return;
        };

        let sink = &self.sink;
        let Some(index) = self
            .state
            .stack
            .find_last_in_scope_matching(Scope::Default, |entry| sink.same_node(&entry.node, &form))
        else {
            self.parse_error(ParseErrorKind::NoElementInScope(name.name().clone()));
            return;
        };

        self.generate_implied_end_tags(None);
        if index + 1 != self.state.stack.len() {
            self.parse_error(ParseErrorKind::MisnestedEndTag(name.name().clone()));
        }
        self.remove_from_stack(index);
    }

    /// > If the stack of open elements has a p element in button scope, then close a p element.
    fn close_p_if_in_button_scope(&mut self) {
        if self.state.stack.has_p_in_button_scope() {
            self.close_a_p_element();
        }
    }

    fn second_element_is_body(&self) -> bool {
        self.state
            .stack
            .get(1)
            .map(|entry| entry.is_html(TagName::BODY))
            .unwrap_or(false)
    }

    /// The loop shared by the "li", "dd" and "dt" start tags.
    fn close_list_item(&mut self, names: &[TagName]) {
        let mut found = None;
        for entry in self.state.stack.iter().rev() {
            if names.iter().any(|name| entry.is_html(*name)) {
                found = Some(entry.name.clone());
                break;
            }
            if entry.is_special()
                && !entry.is_html(TagName::ADDRESS)
                && !entry.is_html(TagName::DIV)
                && !entry.is_html(TagName::P)
            {
                break;
            }
        }

        let Some(name) = found else {
            return;
        };
        self.close_element_in_scope(&name, true);
    }

    /// Inserts a `<math>` or `<svg>` element from HTML content.
    pub(super) fn insert_foreign_root(&mut self, mut tag: Tag, namespace: Namespace) {
        self.reconstruct_active_formatting_elements();
        tag.attributes.adjust_for_namespace(namespace);
        self.insert_foreign_element(&tag, namespace);
        if tag.self_closing {
            self.pop();
            self.acknowledge_self_closing();
        }
    }
}
