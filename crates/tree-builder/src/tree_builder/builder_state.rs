use super::{
    active_formatting_elements::ActiveFormattingElements,
    stack_of_open_elements::StackOfOpenElements, InsertionMode,
};
use crate::document_mode::DocumentMode;

/// Mutable tree construction state, everything a snapshot captures.
#[derive(Debug)]
pub(crate) struct BuilderState<H> {
    pub mode: InsertionMode,
    /// Mode to return to when the TEXT mode ends.
    pub original_mode: Option<InsertionMode>,
    pub stack: StackOfOpenElements<H>,
    pub formatting: ActiveFormattingElements<H>,
    pub template_modes: Vec<InsertionMode>,
    pub form_element: Option<H>,
    pub head_element: Option<H>,
    pub frameset_ok: bool,
    /// Drop a single leading LF from the next character token.
    pub need_to_drop_lf: bool,
    pub document_mode: DocumentMode,
    /// Set while IN_TABLE rules delegate to IN_BODY.
    pub foster_parenting: bool,
    /// Node that receives children once the stack is deeper than allowed.
    pub deep_tree_surrogate_parent: Option<H>,
    /// Character tokens collected while the current node is table-ish.
    pub pending_table_characters: String,
    pub seen_encoding_declaration: bool,
}

impl<H> BuilderState<H> {
    pub fn new() -> Self {
        Self {
            mode: InsertionMode::INITIAL,
            original_mode: None,
            stack: StackOfOpenElements::new(),
            formatting: ActiveFormattingElements::new(),
            template_modes: Vec::new(),
            form_element: None,
            head_element: None,
            frameset_ok: true,
            need_to_drop_lf: false,
            document_mode: DocumentMode::NoQuirks,
            foster_parenting: false,
            deep_tree_surrogate_parent: None,
            pending_table_characters: String::new(),
            seen_encoding_declaration: false,
        }
    }

    /// The body mode matching the frameset-ok flag.
    pub fn body_mode(&self) -> InsertionMode {
        if self.frameset_ok {
            InsertionMode::FRAMESET_OK
        } else {
            InsertionMode::IN_BODY
        }
    }

    /// > Set the frameset-ok flag to "not ok".
    pub fn frameset_not_ok(&mut self) {
        self.frameset_ok = false;
        if self.mode == InsertionMode::FRAMESET_OK {
            self.mode = InsertionMode::IN_BODY;
        }
    }

    pub fn is_quirks(&self) -> bool {
        self.document_mode.is_quirks()
    }
}
