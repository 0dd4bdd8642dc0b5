use crate::element_name::ElementName;

/// Tokenizer sub-states the tree builder can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexicalState {
    Data,
    Rcdata,
    Rawtext,
    ScriptData,
    Plaintext,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuspendReason {
    /// A `<meta>` declared this encoding label. The caller may want to
    /// restart the parse with a different decoder.
    EncodingDeclaration(String),
}

/// What the tokenizer must do before delivering the next token.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TreeBuilderStepResult {
    #[default]
    Continue,
    SwitchLexicalState {
        state: LexicalState,
        /// The appropriate end tag for RCDATA, RAWTEXT and script data.
        end_tag_name: Option<ElementName>,
    },
    Suspend(SuspendReason),
}

/// The tokenizer side of [`TreeBuilderStepResult`].
pub trait TokenizerControl {
    fn set_lexical_state(&mut self, state: LexicalState, end_tag_name: Option<&ElementName>);

    fn request_suspension(&mut self, reason: SuspendReason);
}

impl TreeBuilderStepResult {
    pub fn is_continue(&self) -> bool {
        matches!(self, TreeBuilderStepResult::Continue)
    }

    pub fn apply_to(self, control: &mut dyn TokenizerControl) {
        match self {
            TreeBuilderStepResult::Continue => {}
            TreeBuilderStepResult::SwitchLexicalState {
                state,
                end_tag_name,
            } => control.set_lexical_state(state, end_tag_name.as_ref()),
            TreeBuilderStepResult::Suspend(reason) => control.request_suspension(reason),
        }
    }
}
