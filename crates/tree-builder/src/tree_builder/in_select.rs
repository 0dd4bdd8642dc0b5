use super::{
    token::{Step, Tag, Token},
    TreeBuilder,
};
use crate::{
    element_name::{DispatchGroup, ElementName, TagName},
    error::ParseErrorKind,
    sink::TreeSink,
};

/// > "caption", "table", "tbody", "tfoot", "thead", "tr", "td", "th"
fn is_table_boundary(name: &ElementName) -> bool {
    matches!(
        name.group(),
        DispatchGroup::Caption
            | DispatchGroup::Table
            | DispatchGroup::TbodyOrTheadOrTfoot
            | DispatchGroup::Tr
            | DispatchGroup::TdOrTh
    )
}

impl<S: TreeSink> TreeBuilder<S> {
    /// Parses next node in the "in select" insertion mode.
    ///
    /// @see https://html.spec.whatwg.org/#parsing-main-inselect
    pub(super) fn step_in_select(&mut self, token: Token) -> Step {
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
             * > Any other character token
             *
             * > Insert the token's character.
             */
            Token::Characters(text) => {
                self.insert_characters(&text);
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

            Token::StartTag(tag) => self.in_select_start_tag(tag),

            Token::EndTag(name) => match name.group() {
                /*
                 * > An end tag whose tag name is "optgroup"
                 *
                 * > First, if the current node is an option element, and the node immediately
                 * > before it in the stack of open elements is an optgroup element, then pop the
                 * > current node from the stack of open elements.
                 * >
                 * > If the current node is an optgroup element, then pop that node from the stack
                 * > of open elements. Otherwise, this is a parse error; ignore the token.
                 */
                DispatchGroup::Optgroup => {
                    let len = self.state.stack.len();
                    let option_in_optgroup = self.current_node_is(TagName::OPTION)
                        && len >= 2
                        && self
                            .state
                            .stack
                            .get(len - 2)
                            .map(|node| node.is_html(TagName::OPTGROUP))
                            .unwrap_or(false);
                    if option_in_optgroup {
                        self.pop();
                    }

                    if self.current_node_is(TagName::OPTGROUP) {
                        self.pop();
                    } else {
                        self.parse_error(ParseErrorKind::UnexpectedEndTag(name.name().clone()));
                    }
                    Step::Done
                }

                /*
                 * > An end tag whose tag name is "option"
                 *
                 * > If the current node is an option element, then pop that node from the stack
                 * > of open elements. Otherwise, this is a parse error; ignore the token.
                 */
                DispatchGroup::Option => {
                    if self.current_node_is(TagName::OPTION) {
                        self.pop();
                    } else {
                        self.parse_error(ParseErrorKind::UnexpectedEndTag(name.name().clone()));
                    }
                    Step::Done
                }

                /*
                 * > An end tag whose tag name is "select"
                 *
                 * > If the stack of open elements does not have a select element in select scope,
                 * > this is a parse error; ignore the token. (fragment case)
                 * >
                 * > Otherwise:
                 * >
                 * > Pop elements from the stack of open elements until a select element has been
                 * > popped from the stack.
                 * >
                 * > Reset the insertion mode appropriately.
                 */
                DispatchGroup::Select => {
                    if !self.state.stack.has_element_in_select_scope(TagName::SELECT) {
                        self.parse_error(ParseErrorKind::NoElementInScope(name.name().clone()));
                        return Step::Done;
                    }
                    self.close_select();
                    Step::Done
                }

                /*
                 * > An end tag whose tag name is "template"
                 *
                 * Process the token using the rules for the "in head" insertion mode.
                 */
                DispatchGroup::Template => self.step_in_head(Token::EndTag(name)),

                _ => {
                    self.parse_error(ParseErrorKind::UnexpectedEndTag(name.name().clone()));
                    Step::Done
                }
            },

            /*
             * > An end-of-file token
             *
             * Process the token using the rules for the "in body" insertion mode.
             */
            Token::Eof => self.step_in_body(Token::Eof),
        }
    }

    fn in_select_start_tag(&mut self, tag: Tag) -> Step {
        match tag.name.group() {
            DispatchGroup::Html => self.step_in_body(Token::StartTag(tag)),

            /*
             * > A start tag whose tag name is "option"
             *
             * > If the current node is an option element, pop that node from the stack of open
             * > elements.
             * >
             * > Insert an HTML element for the token.
             */
            DispatchGroup::Option => {
                if self.current_node_is(TagName::OPTION) {
                    self.pop();
                }
                self.insert_html_element(&tag);
                Step::Done
            }

            /*
             * > A start tag whose tag name is "optgroup"
             *
             * > If the current node is an option element, pop that node from the stack of open
             * > elements.
             * >
             * > If the current node is an optgroup element, pop that node from the stack of open
             * > elements.
             * >
             * > Insert an HTML element for the token.
             */
            DispatchGroup::Optgroup => {
                self.pop_option_and_optgroup();
                self.insert_html_element(&tag);
                Step::Done
            }

            /*
             * > A start tag whose tag name is "hr"
             *
             * > If the current node is an option element, pop that node from the stack of open
             * > elements.
             * >
             * > If the current node is an optgroup element, pop that node from the stack of open
             * > elements.
             * >
             * > Insert an HTML element for the token. Immediately pop the current node off the
             * > stack of open elements.
             * >
             * > Acknowledge the token's self-closing flag, if it is set.
             */
            DispatchGroup::Hr => {
                self.pop_option_and_optgroup();
                self.insert_void_html_element(&tag);
                Step::Done
            }

            /*
             * > A start tag whose tag name is "select"
             *
             * > Parse error.
             * >
             * > If the stack of open elements does not have a select element in select scope,
             * > ignore the token. (fragment case)
             * >
             * > Otherwise:
             * >
             * > Pop elements from the stack of open elements until a select element has been
             * > popped from the stack.
             * >
             * > Reset the insertion mode appropriately.
             * >
             * > Note: It just gets treated like an end tag.
             */
            DispatchGroup::Select => {
                self.parse_error(ParseErrorKind::NestedElement(tag.name.name().clone()));
                if self.state.stack.has_element_in_select_scope(TagName::SELECT) {
                    self.close_select();
                }
                Step::Done
            }

            /*
             * > A start tag whose tag name is one of: "input", "keygen", "textarea"
             *
             * > Parse error.
             * >
             * > If the stack of open elements does not have a select element in select scope,
             * > ignore the token. (fragment case)
             * >
             * > Otherwise:
             * >
             * > Pop elements from the stack of open elements until a select element has been
             * > popped from the stack.
             * >
             * > Reset the insertion mode appropriately.
             * >
             * > Reprocess the token.
             */
            DispatchGroup::Input | DispatchGroup::Textarea => self.leave_select(tag),
            DispatchGroup::AreaOrWbr if tag.name.is(TagName::KEYGEN) => self.leave_select(tag),

            /*
             * > A start tag whose tag name is one of: "script", "template"
             *
             * Process the token using the rules for the "in head" insertion mode.
             */
            DispatchGroup::Script | DispatchGroup::Template => {
                self.step_in_head(Token::StartTag(tag))
            }

            /*
             * > Anything else
             *
             * Parse error. Ignore the token.
             */
            _ => {
                self.parse_error(ParseErrorKind::UnexpectedStartTag(tag.name.name().clone()));
                Step::Done
            }
        }
    }

    fn leave_select(&mut self, tag: Tag) -> Step {
        self.parse_error(ParseErrorKind::UnexpectedStartTag(tag.name.name().clone()));
        if !self.state.stack.has_element_in_select_scope(TagName::SELECT) {
            return Step::Done;
        }
        self.close_select();
        Step::Reprocess(self.state.mode, Token::StartTag(tag))
    }

    fn pop_option_and_optgroup(&mut self) {
        if self.current_node_is(TagName::OPTION) {
            self.pop();
        }
        if self.current_node_is(TagName::OPTGROUP) {
            self.pop();
        }
    }

    fn close_select(&mut self) {
        self.pop_until(TagName::SELECT);
        self.reset_insertion_mode_appropriately();
    }

    /// Parses next node in the "in select in table" insertion mode.
    ///
    /// @see https://html.spec.whatwg.org/#parsing-main-inselectintable
    pub(super) fn step_in_select_in_table(&mut self, token: Token) -> Step {
        match token {
            /*
             * > A start tag whose tag name is one of: "caption", "table", "tbody", "tfoot",
             * > "thead", "tr", "td", "th"
             *
             * > Parse error.
             * >
             * > Pop elements from the stack of open elements until a select element has been
             * > popped from the stack.
             * >
             * > Reset the insertion mode appropriately.
             * >
             * > Reprocess the token.
             */
            Token::StartTag(ref tag) if is_table_boundary(&tag.name) => {
                self.parse_error(ParseErrorKind::UnexpectedStartTag(tag.name.name().clone()));
                self.close_select();
                Step::Reprocess(self.state.mode, token)
            }

            /*
             * > An end tag whose tag name is one of: "caption", "table", "tbody", "tfoot",
             * > "thead", "tr", "td", "th"
             *
             * > Parse error.
             * >
             * > If the stack of open elements does not have an element in table scope that is an
             * > HTML element with the same tag name as that of the token, then ignore the token.
             * >
             * > Otherwise:
             * >
             * > Pop elements from the stack of open elements until a select element has been
             * > popped from the stack.
             * >
             * > Reset the insertion mode appropriately.
             * >
             * > Reprocess the token.
             */
            Token::EndTag(ref name) if is_table_boundary(name) => {
                self.parse_error(ParseErrorKind::UnexpectedEndTag(name.name().clone()));
                if !self.state.stack.has_element_in_table_scope(name.tag_name()) {
                    return Step::Done;
                }
                self.close_select();
                Step::Reprocess(self.state.mode, token)
            }

            /*
             * > Anything else
             *
             * Process the token using the rules for the "in select" insertion mode.
             */
            token => self.step_in_select(token),
        }
    }
}
