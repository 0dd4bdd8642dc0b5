use super::{
    token::{Step, Token},
    InsertionMode, TreeBuilder,
};
use crate::{element_name::DispatchGroup, error::ParseErrorKind, sink::TreeSink};

impl<S: TreeSink> TreeBuilder<S> {
    /// Parses next node in the "in template" insertion mode.
    ///
    /// @see https://html.spec.whatwg.org/#parsing-main-intemplate
    pub(super) fn step_in_template(&mut self, token: Token) -> Step {
        match token {
            /*
             * > A character token
             * > A comment token
             * > A DOCTYPE token
             *
             * Process the token using the rules for the "in body" insertion mode.
             */
            Token::Characters(_) | Token::NullCharacter | Token::Comment(_) | Token::Doctype(_) => {
                self.step_in_body(token)
            }

            Token::StartTag(ref tag) => match tag.name.group() {
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
                | DispatchGroup::Title => self.step_in_head(token),

                /*
                 * > A start tag whose tag name is one of: "caption", "colgroup", "tbody", "tfoot",
                 * > "thead"
                 *
                 * > Pop the current template insertion mode off the stack of template insertion
                 * > modes.
                 * >
                 * > Push "in table" onto the stack of template insertion modes so that it is the
                 * > new current template insertion mode.
                 * >
                 * > Switch the insertion mode to "in table", and reprocess the token.
                 */
                DispatchGroup::Caption | DispatchGroup::Colgroup | DispatchGroup::TbodyOrTheadOrTfoot => {
                    self.switch_template_mode(InsertionMode::IN_TABLE, token)
                }

                /*
                 * > A start tag whose tag name is "col"
                 *
                 * Same as above, with "in column group".
                 */
                DispatchGroup::Col => self.switch_template_mode(InsertionMode::IN_COLUMN_GROUP, token),

                /*
                 * > A start tag whose tag name is "tr"
                 *
                 * Same as above, with "in table body".
                 */
                DispatchGroup::Tr => self.switch_template_mode(InsertionMode::IN_TABLE_BODY, token),

                /*
                 * > A start tag whose tag name is one of: "td", "th"
                 *
                 * Same as above, with "in row".
                 */
                DispatchGroup::TdOrTh => self.switch_template_mode(InsertionMode::IN_ROW, token),

                /*
                 * > Any other start tag
                 *
                 * Same as above, with "in body".
                 */
                _ => self.switch_template_mode(InsertionMode::IN_BODY, token),
            },

            /*
             * > An end tag whose tag name is "template"
             *
             * Process the token using the rules for the "in head" insertion mode.
             */
            Token::EndTag(ref name) if name.group() == DispatchGroup::Template => {
                self.step_in_head(token)
            }

            /*
             * > Any other end tag
             *
             * Parse error. Ignore the token.
             */
            Token::EndTag(name) => {
                self.parse_error(ParseErrorKind::UnexpectedEndTag(name.name().clone()));
                Step::Done
            }

            /*
             * > An end-of-file token
             */
            Token::Eof => self.eof_with_templates(),
        }
    }

    fn switch_template_mode(&mut self, mode: InsertionMode, token: Token) -> Step {
        self.state.template_modes.pop();
        self.state.template_modes.push(mode);
        Step::Reprocess(mode, token)
    }
}
