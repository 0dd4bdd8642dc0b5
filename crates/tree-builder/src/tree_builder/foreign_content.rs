use super::{
    token::{is_all_whitespace, Step, Tag, Token},
    TreeBuilder,
};
use crate::{
    element_name::TagName, error::ParseErrorKind, namespace::Namespace, sink::TreeSink,
};

/// > A start tag whose tag name is one of: "b", "big", "blockquote", "body", "br", "center",
/// > "code", "dd", "div", "dl", "dt", "em", "embed", "h1", "h2", "h3", "h4", "h5", "h6",
/// > "head", "hr", "i", "img", "li", "listing", "menu", "meta", "nobr", "ol", "p", "pre",
/// > "ruby", "s", "small", "span", "strong", "strike", "sub", "sup", "table", "tt", "u",
/// > "ul", "var"
/// >
/// > A start tag whose tag name is "font", if the token has any attributes named "color",
/// > "face", or "size"
fn breaks_out_of_foreign_content(tag: &Tag) -> bool {
    match tag.name.tag_name() {
        TagName::B
        | TagName::BIG
        | TagName::BLOCKQUOTE
        | TagName::BODY
        | TagName::BR
        | TagName::CENTER
        | TagName::CODE
        | TagName::DD
        | TagName::DIV
        | TagName::DL
        | TagName::DT
        | TagName::EM
        | TagName::EMBED
        | TagName::H1
        | TagName::H2
        | TagName::H3
        | TagName::H4
        | TagName::H5
        | TagName::H6
        | TagName::HEAD
        | TagName::HR
        | TagName::I
        | TagName::IMG
        | TagName::LI
        | TagName::LISTING
        | TagName::MENU
        | TagName::META
        | TagName::NOBR
        | TagName::OL
        | TagName::P
        | TagName::PRE
        | TagName::RUBY
        | TagName::S
        | TagName::SMALL
        | TagName::SPAN
        | TagName::STRONG
        | TagName::STRIKE
        | TagName::SUB
        | TagName::SUP
        | TagName::TABLE
        | TagName::TT
        | TagName::U
        | TagName::UL
        | TagName::VAR => true,

        TagName::FONT => {
            tag.attributes.contains("color")
                || tag.attributes.contains("face")
                || tag.attributes.contains("size")
        }

        _ => false,
    }
}

impl<S: TreeSink> TreeBuilder<S> {
    /// Parses next node using the rules for parsing tokens in foreign content.
    ///
    /// Tokens that leave foreign content are handed back to the dispatcher as
    /// [`Step::ReprocessAsHtml`] so they run through the current insertion mode.
    ///
    /// @see https://html.spec.whatwg.org/#parsing-main-inforeign
    pub(super) fn step_in_foreign_content(&mut self, token: Token) -> Step {
        match token {
            /*
             * > A character token that is U+0000 NULL
             *
             * > Parse error. Insert a U+FFFD REPLACEMENT CHARACTER character.
             */
            Token::NullCharacter => {
                self.parse_error(ParseErrorKind::UnexpectedNullCharacter);
                self.insert_characters("\u{FFFD}");
                Step::Done
            }

            /*
             * > A character token that is one of U+0009 CHARACTER TABULATION, U+000A LINE FEED (LF),
             * > U+000C FORM FEED (FF), U+000D CARRIAGE RETURN (CR), or U+0020 SPACE
             *
             * > Insert the token's character.
             *
             * > Any other character token
             *
             * > Insert the token's character.
             * > Set the frameset-ok flag to "not ok".
             */
            Token::Characters(text) => {
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

            /*
             * > If the parser was created as part of the HTML fragment parsing algorithm, then act
             * > as described in the "any other start tag" entry below. (fragment case)
             * >
             * > Otherwise:
             * >
             * > Parse error.
             * >
             * > While the current node is not a MathML text integration point, an HTML
             * > integration point, or an element in the HTML namespace, pop elements from the
             * > stack of open elements.
             * >
             * > Reprocess the token according to the rules given in the section corresponding to
             * > the current insertion mode in HTML content.
             */
            Token::StartTag(tag) if breaks_out_of_foreign_content(&tag) => {
                self.parse_error(ParseErrorKind::HtmlStartTagInForeignContent(
                    tag.name.name().clone(),
                ));
                if self.is_fragment() {
                    return self.foreign_start_tag(tag);
                }
                self.pop_until_html_or_integration_point();
                Step::ReprocessAsHtml(Token::StartTag(tag))
            }

            /*
             * > An end tag whose tag name is "br", "p"
             *
             * Same as the breakout start tags above.
             */
            Token::EndTag(ref name) if name.is(TagName::BR) || name.is(TagName::P) => {
                self.parse_error(ParseErrorKind::UnexpectedEndTag(name.name().clone()));
                self.pop_until_html_or_integration_point();
                Step::ReprocessAsHtml(token)
            }

            Token::StartTag(tag) => self.foreign_start_tag(tag),

            Token::EndTag(name) => {
                /*
                 * > An end tag whose tag name is "script", if the current node is an SVG script
                 * > element
                 *
                 * > Pop the current node off the stack of open elements.
                 */
                let svg_script = self
                    .current_node()
                    .map(|node| node.namespace == Namespace::Svg && node.name.is(TagName::SCRIPT))
                    .unwrap_or(false);
                if svg_script && name.is(TagName::SCRIPT) {
                    self.pop();
                    return Step::Done;
                }

                self.foreign_end_tag(Token::EndTag(name))
            }

            /*
             * The dispatcher never sends an end-of-file token here.
             */
            Token::Eof => Step::ReprocessAsHtml(Token::Eof),
        }
    }

    /// > Any other start tag
    /// >
    /// > If the adjusted current node is an element in the MathML namespace, adjust MathML
    /// > attributes for the token.
    /// >
    /// > If the adjusted current node is an element in the SVG namespace, and the token's tag name
    /// > is one of the ones in the first column of the following table, change the tag name to
    /// > the name given in the corresponding cell in the second column.
    /// >
    /// > If the adjusted current node is an element in the SVG namespace, adjust SVG attributes
    /// > for the token.
    /// >
    /// > Adjust foreign attributes for the token.
    /// >
    /// > Insert a foreign element for the token, with adjusted current node's namespace and false.
    /// >
    /// > If the token has its self-closing flag set, then run the appropriate steps from the
    /// > following list:
    /// >
    /// > - If the token's tag name is "script", and the new current node is in the SVG namespace
    /// >
    /// >   Acknowledge the token's self-closing flag, and then act as described in the steps
    /// >   for a "script" end tag below.
    /// >
    /// > - Otherwise
    /// >
    /// >   Pop the current node off the stack of open elements and acknowledge the token's
    /// >   self-closing flag.
    fn foreign_start_tag(&mut self, mut tag: Tag) -> Step {
        let namespace = self
            .current_node()
            .map(|node| node.namespace)
            .unwrap_or(Namespace::Html);
        tag.attributes.adjust_for_namespace(namespace);
        self.insert_foreign_element(&tag, namespace);

        if tag.self_closing {
            self.pop();
            self.acknowledge_self_closing();
        }
        Step::Done
    }

    /// > Any other end tag
    /// >
    /// > Run these steps:
    /// >
    /// > 1. Initialize node to be the current node (the bottommost node of the stack).
    /// > 2. If node's tag name, converted to ASCII lowercase, is not the same as the tag name
    /// >    of the token, then this is a parse error.
    /// > 3. Loop: If node is the topmost element in the stack of open elements, then return.
    /// >    (fragment case)
    /// > 4. If node's tag name, converted to ASCII lowercase, is the same as the tag name of the
    /// >    token, pop elements from the stack of open elements until node has been popped from
    /// >    the stack, and then return.
    /// > 5. Set node to the previous entry in the stack of open elements.
    /// > 6. If node is not an element in the HTML namespace, return to the step labeled loop.
    /// > 7. Otherwise, process the token according to the rules given in the section
    /// >    corresponding to the current insertion mode in HTML content.
    fn foreign_end_tag(&mut self, token: Token) -> Step {
        let Token::EndTag(ref name) = token else {
            return Step::Done;
        };

        let mut index = self.state.stack.len();
        let mut reported = false;
        while index > 0 {
            index -= 1;
            let Some(node) = self.state.stack.get(index) else {
                break;
            };

            if index + 1 < self.state.stack.len() && node.namespace == Namespace::Html {
                return Step::ReprocessAsHtml(token);
            }

            let matches = node.name.name() == name.name();
            if !matches && !reported {
                reported = true;
                self.parse_error(ParseErrorKind::ForeignEndTagMismatch(name.name().clone()));
                continue;
            }

            if matches {
                if index == 0 {
                    return Step::Done;
                }
                self.pop_to_length(index);
                return Step::Done;
            }

            if index == 0 {
                return Step::Done;
            }
        }
        Step::Done
    }
}
