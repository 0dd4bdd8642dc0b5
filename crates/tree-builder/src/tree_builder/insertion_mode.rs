/// Insertion mode.
///
/// @see https://html.spec.whatwg.org/#the-insertion-mode
#[allow(non_camel_case_types, clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InsertionMode {
    /// Initial insertion mode for a full document.
    ///
    /// @see https://html.spec.whatwg.org/#the-initial-insertion-mode
    INITIAL,

    /// Before the root `html` element exists.
    ///
    /// @see https://html.spec.whatwg.org/#the-before-html-insertion-mode
    BEFORE_HTML,

    /// @see https://html.spec.whatwg.org/#the-before-head-insertion-mode
    BEFORE_HEAD,

    /// @see https://html.spec.whatwg.org/#parsing-main-inhead
    IN_HEAD,

    /// Inside `<noscript>` in the head, only used with scripting disabled.
    ///
    /// @see https://html.spec.whatwg.org/#parsing-main-inheadnoscript
    IN_HEAD_NOSCRIPT,

    /// @see https://html.spec.whatwg.org/#the-after-head-insertion-mode
    AFTER_HEAD,

    /// @see https://html.spec.whatwg.org/#parsing-main-inbody
    IN_BODY,

    /// In body while a `<frameset>` could still replace the body.
    ///
    /// Equivalent to IN_BODY with the frameset-ok flag set to "ok". Any rule
    /// that sets the flag to "not ok" leaves this mode for IN_BODY.
    FRAMESET_OK,

    /// Raw text, RCDATA and script content. Ends at the element's end tag.
    ///
    /// @see https://html.spec.whatwg.org/#parsing-main-incdata
    TEXT,

    /// Character tokens are buffered and flushed before the next token.
    ///
    /// @see https://html.spec.whatwg.org/#parsing-main-intable
    IN_TABLE,

    /// @see https://html.spec.whatwg.org/#parsing-main-intbody
    IN_TABLE_BODY,

    /// @see https://html.spec.whatwg.org/#parsing-main-intr
    IN_ROW,

    /// @see https://html.spec.whatwg.org/#parsing-main-intd
    IN_CELL,

    /// @see https://html.spec.whatwg.org/#parsing-main-incaption
    IN_CAPTION,

    /// @see https://html.spec.whatwg.org/#parsing-main-incolgroup
    IN_COLUMN_GROUP,

    /// @see https://html.spec.whatwg.org/#parsing-main-inselect
    IN_SELECT,

    /// @see https://html.spec.whatwg.org/#parsing-main-inselectintable
    IN_SELECT_IN_TABLE,

    /// @see https://html.spec.whatwg.org/#parsing-main-intemplate
    IN_TEMPLATE,

    /// @see https://html.spec.whatwg.org/#parsing-main-afterbody
    AFTER_BODY,

    /// @see https://html.spec.whatwg.org/#parsing-main-inframeset
    IN_FRAMESET,

    /// @see https://html.spec.whatwg.org/#parsing-main-afterframeset
    AFTER_FRAMESET,

    /// @see https://html.spec.whatwg.org/#the-after-after-body-insertion-mode
    AFTER_AFTER_BODY,

    /// @see https://html.spec.whatwg.org/#the-after-after-frameset-insertion-mode
    AFTER_AFTER_FRAMESET,
}

impl InsertionMode {
    /// Modes in which character tokens are buffered as table text.
    pub(crate) fn buffers_table_text(&self) -> bool {
        matches!(
            self,
            InsertionMode::IN_TABLE | InsertionMode::IN_TABLE_BODY | InsertionMode::IN_ROW
        )
    }

    /// Modes in which a `<select>` start tag enters IN_SELECT_IN_TABLE.
    pub(crate) fn is_table_related(&self) -> bool {
        matches!(
            self,
            InsertionMode::IN_TABLE
                | InsertionMode::IN_CAPTION
                | InsertionMode::IN_TABLE_BODY
                | InsertionMode::IN_ROW
                | InsertionMode::IN_CELL
        )
    }
}
