use super::{
    token::{split_leading_whitespace, whitespace_only, Step, Token},
    InsertionMode, TreeBuilder,
};
use crate::{
    element_name::{DispatchGroup, TagName},
    error::ParseErrorKind,
    sink::TreeSink,
};

impl<S: TreeSink> TreeBuilder<S> {
    /// Parses next node in the "after body" insertion mode.
    ///
    /// @see https://html.spec.whatwg.org/#parsing-main-afterbody
    pub(super) fn step_after_body(&mut self, token: Token) -> Step {
        match token {
            /*
             * > A character token that is one of U+0009 CHARACTER TABULATION, U+000A LINE FEED (LF),
             * > U+000C FORM FEED (FF), U+000D CARRIAGE RETURN (CR), or U+0020 SPACE
             *
             * Process the token using the rules for the "in body" insertion mode.
             */
            Token::Characters(text) => {
                let (whitespace, rest) = split_leading_whitespace(&text);
                if !whitespace.is_empty() {
                    let whitespace = whitespace.to_owned();
                    self.step_in_body(Token::Characters(whitespace));
                }
                if rest.is_empty() {
                    return Step::Done;
                }
                let rest = rest.to_owned();
                self.reopen_body(Token::Characters(rest))
            }

            /*
             * > A comment token
             *
             * > Insert a comment as the last child of the first element in the stack of open
             * > elements (the html element).
             */
            Token::Comment(text) => {
                self.insert_comment_in_root(&text);
                Step::Done
            }

            Token::Doctype(_) => {
                self.parse_error(ParseErrorKind::UnexpectedDoctype);
                Step::Done
            }

            Token::StartTag(ref tag) if tag.name.is(TagName::HTML) => self.step_in_body(token),

            /*
             * > An end tag whose tag name is "html"
             *
             * > If the parser was created as part of the HTML fragment parsing algorithm, this is
             * > a parse error; ignore the token. (fragment case)
             * >
             * > Otherwise, switch the insertion mode to "after after body".
             */
            Token::EndTag(name) if name.is(TagName::HTML) => {
                if self.is_fragment() {
                    self.parse_error(ParseErrorKind::UnexpectedEndTag(name.name().clone()));
                    return Step::Done;
                }
                self.set_mode(InsertionMode::AFTER_AFTER_BODY);
                Step::Done
            }

            Token::Eof => self.stop_parsing(),

            token => self.reopen_body(token),
        }
    }

    /// > Parse error. Switch the insertion mode to "in body" and reprocess the token.
    fn reopen_body(&mut self, token: Token) -> Step {
        self.report_unexpected(&token);
        Step::Reprocess(InsertionMode::IN_BODY, token)
    }

    fn report_unexpected(&mut self, token: &Token) {
        let kind = match token {
            Token::StartTag(tag) => ParseErrorKind::UnexpectedStartTag(tag.name.name().clone()),
            Token::EndTag(name) => ParseErrorKind::UnexpectedEndTag(name.name().clone()),
            Token::NullCharacter => ParseErrorKind::UnexpectedNullCharacter,
            Token::Doctype(_) => ParseErrorKind::UnexpectedDoctype,
            _ => ParseErrorKind::UnexpectedCharacters,
        };
        self.parse_error(kind);
    }

    /// Keeps the whitespace of a character run and drops the rest.
    fn insert_whitespace_only(&mut self, text: &str) {
        let whitespace = whitespace_only(text);
        if whitespace.len() != text.len() {
            self.parse_error(ParseErrorKind::UnexpectedCharacters);
        }
        if !whitespace.is_empty() {
            self.insert_characters(&whitespace);
        }
    }

    /// Parses next node in the "in frameset" insertion mode.
    ///
    /// @see https://html.spec.whatwg.org/#parsing-main-inframeset
    pub(super) fn step_in_frameset(&mut self, token: Token) -> Step {
        match token {
            Token::Characters(text) => {
                self.insert_whitespace_only(&text);
                Step::Done
            }

            Token::Comment(text) => {
                self.insert_comment(&text);
                Step::Done
            }

            Token::StartTag(tag) => match tag.name.group() {
                DispatchGroup::Html => self.step_in_body(Token::StartTag(tag)),

                /*
                 * > A start tag whose tag name is "frameset"
                 *
                 * > Insert an HTML element for the token.
                 */
                DispatchGroup::Frameset => {
                    self.insert_html_element(&tag);
                    Step::Done
                }

                /*
                 * > A start tag whose tag name is "frame"
                 *
                 * > Insert an HTML element for the token. Immediately pop the current node off the
                 * > stack of open elements.
                 * >
                 * > Acknowledge the token's self-closing flag, if it is set.
                 */
                DispatchGroup::Frame => {
                    self.insert_void_html_element(&tag);
                    Step::Done
                }

                /*
                 * > A start tag whose tag name is "noframes"
                 *
                 * Process the token using the rules for the "in head" insertion mode.
                 */
                DispatchGroup::Noframes => self.step_in_head(Token::StartTag(tag)),

                _ => {
                    self.parse_error(ParseErrorKind::UnexpectedStartTag(tag.name.name().clone()));
                    Step::Done
                }
            },

            /*
             * > An end tag whose tag name is "frameset"
             *
             * > If the current node is the root html element, then this is a parse error; ignore
             * > the token. (fragment case)
             * >
             * > Otherwise, pop the current node from the stack of open elements.
             * >
             * > If the parser was not created as part of the HTML fragment parsing algorithm
             * > (fragment case), and the current node is no longer a frameset element, then
             * > switch the insertion mode to "after frameset".
             */
            Token::EndTag(name) if name.is(TagName::FRAMESET) => {
                if self.state.stack.len() <= 1 {
                    self.parse_error(ParseErrorKind::UnexpectedEndTag(name.name().clone()));
                    return Step::Done;
                }
                self.pop();
                if !self.is_fragment() && !self.current_node_is(TagName::FRAMESET) {
                    self.set_mode(InsertionMode::AFTER_FRAMESET);
                }
                Step::Done
            }

            /*
             * > An end-of-file token
             *
             * > If the current node is not the root html element, then this is a parse error.
             * >
             * > Note: The current node can only be the root html element in the fragment case.
             * >
             * > Stop parsing.
             */
            Token::Eof => {
                if self.state.stack.len() > 1 {
                    self.report_unclosed_elements();
                }
                self.stop_parsing()
            }

            token => {
                self.report_unexpected(&token);
                Step::Done
            }
        }
    }

    /// Parses next node in the "after frameset" insertion mode.
    ///
    /// @see https://html.spec.whatwg.org/#parsing-main-afterframeset
    pub(super) fn step_after_frameset(&mut self, token: Token) -> Step {
        match token {
            Token::Characters(text) => {
                self.insert_whitespace_only(&text);
                Step::Done
            }

            Token::Comment(text) => {
                self.insert_comment(&text);
                Step::Done
            }

            Token::StartTag(ref tag) if tag.name.is(TagName::HTML) => self.step_in_body(token),

            /*
             * > An end tag whose tag name is "html"
             *
             * > Switch the insertion mode to "after after frameset".
             */
            Token::EndTag(ref name) if name.is(TagName::HTML) => {
                self.set_mode(InsertionMode::AFTER_AFTER_FRAMESET);
                Step::Done
            }

            Token::StartTag(ref tag) if tag.name.is(TagName::NOFRAMES) => self.step_in_head(token),

            Token::Eof => self.stop_parsing(),

            token => {
                self.report_unexpected(&token);
                Step::Done
            }
        }
    }

    /// Parses next node in the "after after body" insertion mode.
    ///
    /// @see https://html.spec.whatwg.org/#the-after-after-body-insertion-mode
    pub(super) fn step_after_after_body(&mut self, token: Token) -> Step {
        match token {
            /*
             * > A comment token
             *
             * > Insert a comment as the last child of the Document object.
             */
            Token::Comment(text) => {
                self.sink.append_comment_to_document(&text);
                Step::Done
            }

            /*
             * > A DOCTYPE token
             * > A character token that is one of U+0009 CHARACTER TABULATION, U+000A LINE FEED (LF),
             * > U+000C FORM FEED (FF), U+000D CARRIAGE RETURN (CR), or U+0020 SPACE
             * > A start tag whose tag name is "html"
             *
             * Process the token using the rules for the "in body" insertion mode.
             */
            Token::Doctype(_) => self.step_in_body(token),
            Token::StartTag(ref tag) if tag.name.is(TagName::HTML) => self.step_in_body(token),
            Token::Characters(text) => {
                let (whitespace, rest) = split_leading_whitespace(&text);
                if !whitespace.is_empty() {
                    let whitespace = whitespace.to_owned();
                    self.step_in_body(Token::Characters(whitespace));
                }
                if rest.is_empty() {
                    return Step::Done;
                }
                let rest = rest.to_owned();
                self.reopen_body(Token::Characters(rest))
            }

            Token::Eof => self.stop_parsing(),

            token => self.reopen_body(token),
        }
    }

    /// Parses next node in the "after after frameset" insertion mode.
    ///
    /// @see https://html.spec.whatwg.org/#the-after-after-frameset-insertion-mode
    pub(super) fn step_after_after_frameset(&mut self, token: Token) -> Step {
        match token {
            Token::Comment(text) => {
                self.sink.append_comment_to_document(&text);
                Step::Done
            }

            Token::Doctype(_) => self.step_in_body(token),
            Token::StartTag(ref tag) if tag.name.is(TagName::HTML) => self.step_in_body(token),
            Token::Characters(text) => {
                let whitespace = whitespace_only(&text);
                if whitespace.len() != text.len() {
                    self.parse_error(ParseErrorKind::UnexpectedCharacters);
                }
                if whitespace.is_empty() {
                    return Step::Done;
                }
                self.step_in_body(Token::Characters(whitespace))
            }

            Token::Eof => self.stop_parsing(),

            Token::StartTag(ref tag) if tag.name.is(TagName::NOFRAMES) => self.step_in_head(token),

            token => {
                self.report_unexpected(&token);
                Step::Done
            }
        }
    }
}
