use super::{
    token::{split_leading_whitespace, Step, Tag, Token},
    InsertionMode, TreeBuilder,
};
use crate::{
    element_name::{DispatchGroup, ElementName, TagName},
    error::ParseErrorKind,
    sink::TreeSink,
};

/// > The current node is a table, tbody, template, tfoot, thead, or tr element.
fn is_table_text_context(group: Option<DispatchGroup>) -> bool {
    matches!(
        group,
        Some(
            DispatchGroup::Table
                | DispatchGroup::TbodyOrTheadOrTfoot
                | DispatchGroup::Template
                | DispatchGroup::Tr
        )
    )
}

impl<S: TreeSink> TreeBuilder<S> {
    /// Parses next node in the "in table" insertion mode.
    ///
    /// Character runs are collected in the pending table character buffer
    /// rather than a separate "in table text" mode. The buffer is flushed
    /// before the next token that is not a character token.
    ///
    /// @see https://html.spec.whatwg.org/#parsing-main-intable
    pub(super) fn step_in_table(&mut self, token: Token) -> Step {
        match token {
            /*
             * > A character token, if the current node is table, tbody, template, tfoot,
             * > thead, or tr element
             *
             * > Let the pending table character tokens be an empty list of tokens.
             * > Let the original insertion mode be the current insertion mode.
             * > Switch the insertion mode to "in table text" and reprocess the token.
             */
            Token::Characters(text)
                if self.state.mode.buffers_table_text()
                    && is_table_text_context(self.current_node().and_then(|node| node.html_group())) =>
            {
                self.state.pending_table_characters.push_str(&text);
                Step::Done
            }

            /*
             * > A character token that is U+0000 NULL
             *
             * Parse error. Ignore the token.
             */
            Token::NullCharacter
                if is_table_text_context(self.current_node().and_then(|node| node.html_group())) =>
            {
                self.parse_error(ParseErrorKind::UnexpectedNullCharacter);
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

            Token::StartTag(tag) => self.in_table_start_tag(tag),

            Token::EndTag(name) => match name.group() {
                /*
                 * > An end tag whose tag name is "table"
                 *
                 * > If the stack of open elements does not have a table element in table scope,
                 * > this is a parse error; ignore the token.
                 * >
                 * > Otherwise:
                 * >
                 * > Pop elements from this stack until a table element has been popped from the
                 * > stack.
                 * >
                 * > Reset the insertion mode appropriately.
                 */
                DispatchGroup::Table => {
                    if !self.state.stack.has_element_in_table_scope(TagName::TABLE) {
                        self.parse_error(ParseErrorKind::NoElementInScope(name.name().clone()));
                        return Step::Done;
                    }
                    self.pop_until(TagName::TABLE);
                    self.reset_insertion_mode_appropriately();
                    Step::Done
                }

                /*
                 * > An end tag whose tag name is one of: "body", "caption", "col", "colgroup",
                 * > "html", "tbody", "td", "tfoot", "th", "thead", "tr"
                 *
                 * Parse error. Ignore the token.
                 */
                DispatchGroup::Body
                | DispatchGroup::Caption
                | DispatchGroup::Col
                | DispatchGroup::Colgroup
                | DispatchGroup::Html
                | DispatchGroup::TbodyOrTheadOrTfoot
                | DispatchGroup::TdOrTh
                | DispatchGroup::Tr => {
                    self.parse_error(ParseErrorKind::UnexpectedEndTag(name.name().clone()));
                    Step::Done
                }

                /*
                 * > An end tag whose tag name is "template"
                 */
                DispatchGroup::Template => self.step_in_head(Token::EndTag(name)),

                _ => self.in_table_anything_else(Token::EndTag(name)),
            },

            /*
             * > An end-of-file token
             *
             * Process the token using the rules for the "in body" insertion mode.
             */
            Token::Eof => self.step_in_body(Token::Eof),

            token => self.in_table_anything_else(token),
        }
    }

    fn in_table_start_tag(&mut self, tag: Tag) -> Step {
        match tag.name.group() {
            /*
             * > A start tag whose tag name is "caption"
             *
             * > Clear the stack back to a table context.
             * > Insert a marker at the end of the list of active formatting elements.
             * > Insert an HTML element for the token, then switch the insertion mode to
             * > "in caption".
             */
            DispatchGroup::Caption => {
                self.clear_the_stack_back_to_a_table_context();
                self.state.formatting.insert_marker();
                self.insert_html_element(&tag);
                self.set_mode(InsertionMode::IN_CAPTION);
                Step::Done
            }

            /*
             * > A start tag whose tag name is "colgroup"
             *
             * > Clear the stack back to a table context.
             * > Insert an HTML element for the token, then switch the insertion mode to
             * > "in column group".
             */
            DispatchGroup::Colgroup => {
                self.clear_the_stack_back_to_a_table_context();
                self.insert_html_element(&tag);
                self.set_mode(InsertionMode::IN_COLUMN_GROUP);
                Step::Done
            }

            /*
             * > A start tag whose tag name is "col"
             *
             * > Clear the stack back to a table context.
             * > Insert an HTML element for a "colgroup" start tag token with no attributes,
             * > then switch the insertion mode to "in column group".
             * > Reprocess the current token.
             */
            DispatchGroup::Col => {
                self.clear_the_stack_back_to_a_table_context();
                self.insert_html_element_named(TagName::COLGROUP);
                Step::Reprocess(InsertionMode::IN_COLUMN_GROUP, Token::StartTag(tag))
            }

            /*
             * > A start tag whose tag name is one of: "tbody", "tfoot", "thead"
             *
             * > Clear the stack back to a table context.
             * > Insert an HTML element for the token, then switch the insertion mode to
             * > "in table body".
             */
            DispatchGroup::TbodyOrTheadOrTfoot => {
                self.clear_the_stack_back_to_a_table_context();
                self.insert_html_element(&tag);
                self.set_mode(InsertionMode::IN_TABLE_BODY);
                Step::Done
            }

            /*
             * > A start tag whose tag name is one of: "td", "th", "tr"
             *
             * > Clear the stack back to a table context.
             * > Insert an HTML element for a "tbody" start tag token with no attributes, then
             * > switch the insertion mode to "in table body".
             * > Reprocess the current token.
             */
            DispatchGroup::TdOrTh | DispatchGroup::Tr => {
                self.clear_the_stack_back_to_a_table_context();
                self.insert_html_element_named(TagName::TBODY);
                Step::Reprocess(InsertionMode::IN_TABLE_BODY, Token::StartTag(tag))
            }

            /*
             * > A start tag whose tag name is "table"
             *
             * > Parse error.
             * >
             * > If the stack of open elements does not have a table element in table scope,
             * > ignore the token.
             * >
             * > Otherwise:
             * >
             * > Pop elements from this stack until a table element has been popped from the
             * > stack.
             * >
             * > Reset the insertion mode appropriately.
             * >
             * > Reprocess the token.
             */
            DispatchGroup::Table => {
                self.parse_error(ParseErrorKind::NestedElement(tag.name.name().clone()));
                if !self.state.stack.has_element_in_table_scope(TagName::TABLE) {
                    return Step::Done;
                }
                self.pop_until(TagName::TABLE);
                self.reset_insertion_mode_appropriately();
                Step::Reprocess(self.state.mode, Token::StartTag(tag))
            }

            /*
             * > A start tag whose tag name is one of: "style", "script", "template"
             *
             * Process the token using the rules for the "in head" insertion mode.
             */
            DispatchGroup::Style | DispatchGroup::Script | DispatchGroup::Template => {
                self.step_in_head(Token::StartTag(tag))
            }

            /*
             * > A start tag whose tag name is "input"
             *
             * > If the token does not have an attribute with the name "type", or if it does, but
             * > that attribute's value is not an ASCII case-insensitive match for the string
             * > "hidden", then: act as described in the "anything else" entry below.
             * >
             * > Otherwise:
             * >
             * > Parse error.
             * >
             * > Insert an HTML element for the token.
             * >
             * > Pop that input element off the stack of open elements.
             * >
             * > Acknowledge the token's self-closing flag, if it is set.
             */
            DispatchGroup::Input if tag.attributes.has_value_ignore_ascii_case("type", "hidden") => {
                self.parse_error(ParseErrorKind::UnexpectedStartTag(tag.name.name().clone()));
                self.insert_void_html_element(&tag);
                Step::Done
            }

            /*
             * > A start tag whose tag name is "form"
             *
             * > Parse error.
             * >
             * > If there is a template element on the stack of open elements, or if the form
             * > element pointer is not null, ignore the token.
             * >
             * > Otherwise:
             * >
             * > Insert an HTML element for the token, and set the form element pointer to point
             * > to the element created.
             * >
             * > Pop that form element off the stack of open elements.
             */
            DispatchGroup::Form => {
                self.parse_error(ParseErrorKind::UnexpectedStartTag(tag.name.name().clone()));
                if self.state.stack.contains(TagName::TEMPLATE) || self.state.form_element.is_some()
                {
                    return Step::Done;
                }
                if let Some(form) = self.insert_html_element(&tag) {
                    self.state.form_element = Some(form.node.clone());
                    self.pop();
                }
                Step::Done
            }

            _ => self.in_table_anything_else(Token::StartTag(tag)),
        }
    }

    /// > Parse error. Enable foster parenting, process the token using the rules for the
    /// > "in body" insertion mode, and then disable foster parenting.
    fn in_table_anything_else(&mut self, token: Token) -> Step {
        match &token {
            Token::StartTag(tag) => {
                self.parse_error(ParseErrorKind::FosterParentedStartTag(tag.name.name().clone()))
            }
            Token::EndTag(name) => {
                self.parse_error(ParseErrorKind::UnexpectedEndTag(name.name().clone()))
            }
            Token::Characters(_) | Token::NullCharacter => {
                self.parse_error(ParseErrorKind::FosterParentedCharacters)
            }
            _ => {}
        }

        self.state.foster_parenting = true;
        let step = self.step_in_body(token);
        self.state.foster_parenting = false;
        step
    }

    /// Parses next node in the "in caption" insertion mode.
    ///
    /// @see https://html.spec.whatwg.org/#parsing-main-incaption
    pub(super) fn step_in_caption(&mut self, token: Token) -> Step {
        match token {
            /*
             * > An end tag whose tag name is "caption"
             *
             * > If the stack of open elements does not have a caption element in table scope,
             * > this is a parse error; ignore the token. (fragment case)
             * >
             * > Otherwise:
             * >
             * > Generate implied end tags.
             * >
             * > Now, if the current node is not a caption element, then this is a parse error.
             * >
             * > Pop elements from this stack until a caption element has been popped from the
             * > stack.
             * >
             * > Clear the list of active formatting elements up to the last marker.
             * >
             * > Switch the insertion mode to "in table".
             */
            Token::EndTag(ref name) if name.is(TagName::CAPTION) => {
                self.close_caption();
                Step::Done
            }

            /*
             * > A start tag whose tag name is one of: "caption", "col", "colgroup", "tbody",
             * > "td", "tfoot", "th", "thead", "tr"
             * > An end tag whose tag name is "table"
             *
             * > If the stack of open elements does not have a caption element in table scope,
             * > this is a parse error; ignore the token. (fragment case)
             * >
             * > Otherwise:
             * >
             * > Generate implied end tags. … Switch the insertion mode to "in table".
             * >
             * > Reprocess the token.
             */
            Token::StartTag(ref tag)
                if matches!(
                    tag.name.group(),
                    DispatchGroup::Caption
                        | DispatchGroup::Col
                        | DispatchGroup::Colgroup
                        | DispatchGroup::TbodyOrTheadOrTfoot
                        | DispatchGroup::TdOrTh
                        | DispatchGroup::Tr
                ) =>
            {
                match self.close_caption() {
                    true => Step::Reprocess(InsertionMode::IN_TABLE, token),
                    false => Step::Done,
                }
            }
            Token::EndTag(ref name) if name.is(TagName::TABLE) => match self.close_caption() {
                true => Step::Reprocess(InsertionMode::IN_TABLE, token),
                false => Step::Done,
            },

            /*
             * > An end tag whose tag name is one of: "body", "col", "colgroup", "html", "tbody",
             * > "td", "tfoot", "th", "thead", "tr"
             *
             * Parse error. Ignore the token.
             */
            Token::EndTag(name)
                if matches!(
                    name.group(),
                    DispatchGroup::Body
                        | DispatchGroup::Col
                        | DispatchGroup::Colgroup
                        | DispatchGroup::Html
                        | DispatchGroup::TbodyOrTheadOrTfoot
                        | DispatchGroup::TdOrTh
                        | DispatchGroup::Tr
                ) =>
            {
                self.parse_error(ParseErrorKind::UnexpectedEndTag(name.name().clone()));
                Step::Done
            }

            /*
             * > Anything else
             *
             * Process the token using the rules for the "in body" insertion mode.
             */
            token => self.step_in_body(token),
        }
    }

    /// Closes the caption; `false` when there was none in table scope.
    fn close_caption(&mut self) -> bool {
        if !self.state.stack.has_element_in_table_scope(TagName::CAPTION) {
            self.parse_error(ParseErrorKind::NoElementInScope(
                ElementName::for_tag(TagName::CAPTION).name().clone(),
            ));
            return false;
        }

        self.generate_implied_end_tags(None);
        if !self.current_node_is(TagName::CAPTION) {
            let name = self.current_name();
            self.parse_error(ParseErrorKind::MisnestedEndTag(name));
        }
        self.pop_until(TagName::CAPTION);
        self.state.formatting.clear_up_to_last_marker();
        self.set_mode(InsertionMode::IN_TABLE);
        true
    }

    /// Parses next node in the "in column group" insertion mode.
    ///
    /// @see https://html.spec.whatwg.org/#parsing-main-incolgroup
    pub(super) fn step_in_column_group(&mut self, token: Token) -> Step {
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
                self.in_column_group_anything_else(Token::Characters(rest))
            }

            Token::Comment(text) => {
                self.insert_comment(&text);
                Step::Done
            }

            Token::Doctype(_) => {
                self.parse_error(ParseErrorKind::UnexpectedDoctype);
                Step::Done
            }

            Token::StartTag(ref tag) if tag.name.is(TagName::HTML) => self.step_in_body(token),

            /*
             * > A start tag whose tag name is "col"
             *
             * > Insert an HTML element for the token. Immediately pop the current node off the
             * > stack of open elements.
             * >
             * > Acknowledge the token's self-closing flag, if it is set.
             */
            Token::StartTag(tag) if tag.name.is(TagName::COL) => {
                self.insert_void_html_element(&tag);
                Step::Done
            }

            /*
             * > An end tag whose tag name is "colgroup"
             *
             * > If the current node is not a colgroup element, then this is a parse error;
             * > ignore the token.
             * >
             * > Otherwise, pop the current node from the stack of open elements. Switch the
             * > insertion mode to "in table".
             */
            Token::EndTag(name) if name.is(TagName::COLGROUP) => {
                if !self.current_node_is(TagName::COLGROUP) {
                    self.parse_error(ParseErrorKind::UnexpectedEndTag(name.name().clone()));
                    return Step::Done;
                }
                self.pop();
                self.set_mode(InsertionMode::IN_TABLE);
                Step::Done
            }

            /*
             * > An end tag whose tag name is "col"
             *
             * Parse error. Ignore the token.
             */
            Token::EndTag(name) if name.is(TagName::COL) => {
                self.parse_error(ParseErrorKind::UnexpectedEndTag(name.name().clone()));
                Step::Done
            }

            /*
             * > A start tag whose tag name is "template"
             * > An end tag whose tag name is "template"
             *
             * Process the token using the rules for the "in head" insertion mode.
             */
            Token::StartTag(ref tag) if tag.name.is(TagName::TEMPLATE) => self.step_in_head(token),
            Token::EndTag(ref name) if name.is(TagName::TEMPLATE) => self.step_in_head(token),

            Token::Eof => self.step_in_body(Token::Eof),

            token => self.in_column_group_anything_else(token),
        }
    }

    /// > If the current node is not a colgroup element, then this is a parse error; ignore
    /// > the token.
    /// >
    /// > Otherwise, pop the current node from the stack of open elements.
    /// >
    /// > Switch the insertion mode to "in table".
    /// >
    /// > Reprocess the token.
    fn in_column_group_anything_else(&mut self, token: Token) -> Step {
        if !self.current_node_is(TagName::COLGROUP) {
            match &token {
                Token::StartTag(tag) => {
                    self.parse_error(ParseErrorKind::UnexpectedStartTag(tag.name.name().clone()))
                }
                Token::EndTag(name) => {
                    self.parse_error(ParseErrorKind::UnexpectedEndTag(name.name().clone()))
                }
                _ => self.parse_error(ParseErrorKind::UnexpectedCharacters),
            }
            return Step::Done;
        }
        self.pop();
        Step::Reprocess(InsertionMode::IN_TABLE, token)
    }

    /// Parses next node in the "in table body" insertion mode.
    ///
    /// @see https://html.spec.whatwg.org/#parsing-main-intbody
    pub(super) fn step_in_table_body(&mut self, token: Token) -> Step {
        match token {
            Token::StartTag(tag) => match tag.name.group() {
                /*
                 * > A start tag whose tag name is "tr"
                 *
                 * > Clear the stack back to a table body context.
                 * >
                 * > Insert an HTML element for the token, then switch the insertion mode to
                 * > "in row".
                 */
                DispatchGroup::Tr => {
                    self.clear_the_stack_back_to_a_table_body_context();
                    self.insert_html_element(&tag);
                    self.set_mode(InsertionMode::IN_ROW);
                    Step::Done
                }

                /*
                 * > A start tag whose tag name is one of: "th", "td"
                 *
                 * > Parse error.
                 * >
                 * > Clear the stack back to a table body context.
                 * >
                 * > Insert an HTML element for a "tr" start tag token with no attributes, then
                 * > switch the insertion mode to "in row".
                 * >
                 * > Reprocess the current token.
                 */
                DispatchGroup::TdOrTh => {
                    self.parse_error(ParseErrorKind::UnexpectedStartTag(tag.name.name().clone()));
                    self.clear_the_stack_back_to_a_table_body_context();
                    self.insert_html_element_named(TagName::TR);
                    Step::Reprocess(InsertionMode::IN_ROW, Token::StartTag(tag))
                }

                /*
                 * > A start tag whose tag name is one of: "caption", "col", "colgroup", "tbody",
                 * > "tfoot", "thead"
                 */
                DispatchGroup::Caption
                | DispatchGroup::Col
                | DispatchGroup::Colgroup
                | DispatchGroup::TbodyOrTheadOrTfoot => self.leave_table_body(Token::StartTag(tag)),

                _ => self.step_in_table(Token::StartTag(tag)),
            },

            Token::EndTag(name) => match name.group() {
                /*
                 * > An end tag whose tag name is one of: "tbody", "tfoot", "thead"
                 *
                 * > If the stack of open elements does not have an element in table scope that
                 * > is an HTML element with the same tag name as the token, this is a parse
                 * > error; ignore the token.
                 * >
                 * > Otherwise:
                 * >
                 * > Clear the stack back to a table body context.
                 * >
                 * > Pop the current node from the stack of open elements. Switch the insertion
                 * > mode to "in table".
                 */
                DispatchGroup::TbodyOrTheadOrTfoot => {
                    if !self.state.stack.has_element_in_table_scope(name.tag_name()) {
                        self.parse_error(ParseErrorKind::NoElementInScope(name.name().clone()));
                        return Step::Done;
                    }
                    self.clear_the_stack_back_to_a_table_body_context();
                    self.pop();
                    self.set_mode(InsertionMode::IN_TABLE);
                    Step::Done
                }

                /*
                 * > An end tag whose tag name is "table"
                 *
                 * > If the stack of open elements does not have a tbody, thead, or tfoot element
                 * > in table scope, this is a parse error; ignore the token.
                 * >
                 * > Otherwise:
                 * >
                 * > Clear the stack back to a table body context.
                 * >
                 * > Pop the current node from the stack of open elements. Switch the insertion
                 * > mode to "in table".
                 * >
                 * > Reprocess the token.
                 */
                DispatchGroup::Table => self.leave_table_body(Token::EndTag(name)),

                /*
                 * > An end tag whose tag name is one of: "body", "caption", "col", "colgroup",
                 * > "html", "td", "th", "tr"
                 *
                 * Parse error. Ignore the token.
                 */
                DispatchGroup::Body
                | DispatchGroup::Caption
                | DispatchGroup::Col
                | DispatchGroup::Colgroup
                | DispatchGroup::Html
                | DispatchGroup::TdOrTh
                | DispatchGroup::Tr => {
                    self.parse_error(ParseErrorKind::UnexpectedEndTag(name.name().clone()));
                    Step::Done
                }

                _ => self.step_in_table(Token::EndTag(name)),
            },

            /*
             * > Anything else
             *
             * Process the token using the rules for the "in table" insertion mode.
             */
            token => self.step_in_table(token),
        }
    }

    fn leave_table_body(&mut self, token: Token) -> Step {
        if !self.state.stack.has_table_body_in_table_scope() {
            match &token {
                Token::StartTag(tag) => {
                    self.parse_error(ParseErrorKind::UnexpectedStartTag(tag.name.name().clone()))
                }
                Token::EndTag(name) => {
                    self.parse_error(ParseErrorKind::NoElementInScope(name.name().clone()))
                }
                _ => {}
            }
            return Step::Done;
        }
        self.clear_the_stack_back_to_a_table_body_context();
        self.pop();
        Step::Reprocess(InsertionMode::IN_TABLE, token)
    }

    /// Parses next node in the "in row" insertion mode.
    ///
    /// @see https://html.spec.whatwg.org/#parsing-main-intr
    pub(super) fn step_in_row(&mut self, token: Token) -> Step {
        match token {
            Token::StartTag(tag) => match tag.name.group() {
                /*
                 * > A start tag whose tag name is one of: "th", "td"
                 *
                 * > Clear the stack back to a table row context.
                 * >
                 * > Insert an HTML element for the token, then switch the insertion mode to
                 * > "in cell".
                 * >
                 * > Insert a marker at the end of the list of active formatting elements.
                 */
                DispatchGroup::TdOrTh => {
                    self.clear_the_stack_back_to_a_table_row_context();
                    self.insert_html_element(&tag);
                    self.set_mode(InsertionMode::IN_CELL);
                    self.state.formatting.insert_marker();
                    Step::Done
                }

                /*
                 * > A start tag whose tag name is one of: "caption", "col", "colgroup", "tbody",
                 * > "tfoot", "thead", "tr"
                 *
                 * > If the stack of open elements does not have a tr element in table scope,
                 * > this is a parse error; ignore the token.
                 * >
                 * > Otherwise:
                 * >
                 * > Clear the stack back to a table row context.
                 * >
                 * > Pop the current node (which will be a tr element) from the stack of open
                 * > elements. Switch the insertion mode to "in table body".
                 * >
                 * > Reprocess the token.
                 */
                DispatchGroup::Caption
                | DispatchGroup::Col
                | DispatchGroup::Colgroup
                | DispatchGroup::TbodyOrTheadOrTfoot
                | DispatchGroup::Tr => match self.close_row() {
                    true => Step::Reprocess(InsertionMode::IN_TABLE_BODY, Token::StartTag(tag)),
                    false => Step::Done,
                },

                _ => self.step_in_table(Token::StartTag(tag)),
            },

            Token::EndTag(name) => match name.group() {
                /*
                 * > An end tag whose tag name is "tr"
                 *
                 * > If the stack of open elements does not have a tr element in table scope,
                 * > this is a parse error; ignore the token.
                 * >
                 * > Otherwise:
                 * >
                 * > Clear the stack back to a table row context.
                 * >
                 * > Pop the current node (which will be a tr element) from the stack of open
                 * > elements. Switch the insertion mode to "in table body".
                 */
                DispatchGroup::Tr => {
                    self.close_row();
                    Step::Done
                }

                /*
                 * > An end tag whose tag name is "table"
                 *
                 * Close the row as above, then reprocess the token.
                 */
                DispatchGroup::Table => match self.close_row() {
                    true => Step::Reprocess(InsertionMode::IN_TABLE_BODY, Token::EndTag(name)),
                    false => Step::Done,
                },

                /*
                 * > An end tag whose tag name is one of: "tbody", "tfoot", "thead"
                 *
                 * > If the stack of open elements does not have an element in table scope that
                 * > is an HTML element with the same tag name as the token, this is a parse
                 * > error; ignore the token.
                 * >
                 * > If the stack of open elements does not have a tr element in table scope,
                 * > ignore the token.
                 * >
                 * > Otherwise:
                 * >
                 * > Clear the stack back to a table row context. … Reprocess the token.
                 */
                DispatchGroup::TbodyOrTheadOrTfoot => {
                    if !self.state.stack.has_element_in_table_scope(name.tag_name()) {
                        self.parse_error(ParseErrorKind::NoElementInScope(name.name().clone()));
                        return Step::Done;
                    }
                    if !self.state.stack.has_element_in_table_scope(TagName::TR) {
                        return Step::Done;
                    }
                    self.close_row();
                    Step::Reprocess(InsertionMode::IN_TABLE_BODY, Token::EndTag(name))
                }

                /*
                 * > An end tag whose tag name is one of: "body", "caption", "col", "colgroup",
                 * > "html", "td", "th"
                 *
                 * Parse error. Ignore the token.
                 */
                DispatchGroup::Body
                | DispatchGroup::Caption
                | DispatchGroup::Col
                | DispatchGroup::Colgroup
                | DispatchGroup::Html
                | DispatchGroup::TdOrTh => {
                    self.parse_error(ParseErrorKind::UnexpectedEndTag(name.name().clone()));
                    Step::Done
                }

                _ => self.step_in_table(Token::EndTag(name)),
            },

            token => self.step_in_table(token),
        }
    }

    /// Closes the current row; `false` when there was none in table scope.
    fn close_row(&mut self) -> bool {
        if !self.state.stack.has_element_in_table_scope(TagName::TR) {
            self.parse_error(ParseErrorKind::NoElementInScope(
                ElementName::for_tag(TagName::TR).name().clone(),
            ));
            return false;
        }
        self.clear_the_stack_back_to_a_table_row_context();
        self.pop();
        self.set_mode(InsertionMode::IN_TABLE_BODY);
        true
    }

    /// Parses next node in the "in cell" insertion mode.
    ///
    /// @see https://html.spec.whatwg.org/#parsing-main-intd
    pub(super) fn step_in_cell(&mut self, token: Token) -> Step {
        match token {
            Token::EndTag(name) => match name.group() {
                /*
                 * > An end tag whose tag name is one of: "td", "th"
                 *
                 * > If the stack of open elements does not have an element in table scope that
                 * > is an HTML element with the same tag name as that of the token, then this is
                 * > a parse error; ignore the token.
                 * >
                 * > Otherwise:
                 * >
                 * > Generate implied end tags.
                 * >
                 * > Now, if the current node is not an HTML element with the same tag name as the
                 * > token, then this is a parse error.
                 * >
                 * > Pop elements from the stack of open elements stack until an HTML element with
                 * > the same tag name as the token has been popped from the stack.
                 * >
                 * > Clear the list of active formatting elements up to the last marker.
                 * >
                 * > Switch the insertion mode to "in row".
                 */
                DispatchGroup::TdOrTh => {
                    if !self.state.stack.has_element_in_table_scope(name.tag_name()) {
                        self.parse_error(ParseErrorKind::NoElementInScope(name.name().clone()));
                        return Step::Done;
                    }
                    self.close_element_in_scope(&name, false);
                    self.state.formatting.clear_up_to_last_marker();
                    self.set_mode(InsertionMode::IN_ROW);
                    Step::Done
                }

                /*
                 * > An end tag whose tag name is one of: "body", "caption", "col", "colgroup",
                 * > "html"
                 *
                 * Parse error. Ignore the token.
                 */
                DispatchGroup::Body
                | DispatchGroup::Caption
                | DispatchGroup::Col
                | DispatchGroup::Colgroup
                | DispatchGroup::Html => {
                    self.parse_error(ParseErrorKind::UnexpectedEndTag(name.name().clone()));
                    Step::Done
                }

                /*
                 * > An end tag whose tag name is one of: "table", "tbody", "tfoot", "thead", "tr"
                 *
                 * > If the stack of open elements does not have an element in table scope that
                 * > is an HTML element with the same tag name as that of the token, then this is
                 * > a parse error; ignore the token.
                 * >
                 * > Otherwise, close the cell and reprocess the token.
                 */
                DispatchGroup::Table | DispatchGroup::TbodyOrTheadOrTfoot | DispatchGroup::Tr => {
                    if !self.state.stack.has_element_in_table_scope(name.tag_name()) {
                        self.parse_error(ParseErrorKind::NoElementInScope(name.name().clone()));
                        return Step::Done;
                    }
                    self.close_the_cell();
                    Step::Reprocess(InsertionMode::IN_ROW, Token::EndTag(name))
                }

                _ => self.step_in_body(Token::EndTag(name)),
            },

            /*
             * > A start tag whose tag name is one of: "caption", "col", "colgroup", "tbody",
             * > "td", "tfoot", "th", "thead", "tr"
             *
             * > Assert: The stack of open elements has a td or th element in table scope.
             * >
             * > Close the cell and reprocess the token.
             */
            Token::StartTag(ref tag)
                if matches!(
                    tag.name.group(),
                    DispatchGroup::Caption
                        | DispatchGroup::Col
                        | DispatchGroup::Colgroup
                        | DispatchGroup::TbodyOrTheadOrTfoot
                        | DispatchGroup::TdOrTh
                        | DispatchGroup::Tr
                ) =>
            {
                if !self.state.stack.has_cell_in_table_scope() {
                    self.parse_error(ParseErrorKind::UnexpectedStartTag(tag.name.name().clone()));
                    return Step::Done;
                }
                self.close_the_cell();
                Step::Reprocess(InsertionMode::IN_ROW, token)
            }

            token => self.step_in_body(token),
        }
    }
}
