use super::{
    active_formatting_elements::{ActiveFormattingElements, FormattingEntry},
    stack_node::StackNode,
    stack_of_open_elements::StackOfOpenElements,
    InsertionMode, TreeBuilder,
};
use crate::{
    atom::{Atom, NameInterner},
    attributes::Attributes,
    document_mode::DocumentMode,
    element_name::{ElementFlags, ElementName},
    error::SourceLocation,
    namespace::Namespace,
    sink::TreeSink,
};
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// An owned copy of one open element.
#[derive(Debug, Clone)]
struct SnapshotEntry<H> {
    namespace: Namespace,
    name: ElementName,
    local_name: Atom,
    pop_name: Atom,
    node: H,
    flags: ElementFlags,
    attributes: Option<Attributes>,
    location: Option<SourceLocation>,
}

impl<H: Clone> SnapshotEntry<H> {
    fn capture(entry: &StackNode<H>) -> Self {
        Self {
            namespace: entry.namespace,
            name: entry.name.clone(),
            local_name: entry.local_name.clone(),
            pop_name: entry.pop_name.clone(),
            node: entry.node.clone(),
            flags: entry.flags,
            attributes: entry.attributes.clone(),
            location: entry.location,
        }
    }

    fn rebuild(&self, interner: &mut dyn NameInterner) -> StackNode<H> {
        StackNode {
            namespace: self.namespace,
            name: self.name.reintern(interner),
            local_name: self.local_name.reintern(interner),
            pop_name: self.pop_name.reintern(interner),
            node: self.node.clone(),
            flags: self.flags,
            attributes: self.attributes.clone(),
            location: self.location,
        }
    }
}

/// A copy of the tree builder's state that can be restored later.
///
/// Open elements are stored once; the stack and the list of active
/// formatting elements refer to them by index, so an element present in
/// both is restored as one shared entry.
///
/// The snapshot owns everything it holds and is `Send` as long as the node
/// handles are.
#[derive(Debug, Clone)]
pub struct StateSnapshot<H> {
    entries: Vec<SnapshotEntry<H>>,
    stack: Vec<usize>,
    /// `None` is a marker.
    formatting: Vec<Option<usize>>,
    template_modes: Vec<InsertionMode>,
    mode: InsertionMode,
    original_mode: Option<InsertionMode>,
    frameset_ok: bool,
    need_to_drop_lf: bool,
    document_mode: DocumentMode,
    form_element: Option<H>,
    head_element: Option<H>,
    deep_tree_surrogate_parent: Option<H>,
    seen_encoding_declaration: bool,
    /// Table text not yet inserted.
    pending_table_characters: String,
}

impl<H> StateSnapshot<H> {
    pub fn insertion_mode(&self) -> InsertionMode {
        self.mode
    }

    pub fn stack_len(&self) -> usize {
        self.stack.len()
    }

    pub fn formatting_len(&self) -> usize {
        self.formatting.len()
    }
}

impl<S: TreeSink> TreeBuilder<S> {
    /// Copies the current state, including table text that is still
    /// buffered. Taking a snapshot does not touch the sink.
    pub fn snapshot(&self) -> StateSnapshot<S::Handle> {
        let mut entries = Vec::with_capacity(self.state.stack.len());
        let mut index_of: FxHashMap<*const StackNode<S::Handle>, usize> = FxHashMap::default();
        let mut intern = |entry: &Rc<StackNode<S::Handle>>| -> usize {
            *index_of.entry(Rc::as_ptr(entry)).or_insert_with(|| {
                entries.push(SnapshotEntry::capture(entry));
                entries.len() - 1
            })
        };

        let stack: Vec<usize> = self.state.stack.iter().map(&mut intern).collect();
        let formatting: Vec<Option<usize>> = self
            .state
            .formatting
            .iter()
            .map(|item| item.element().map(&mut intern))
            .collect();

        log::debug!(
            target: "html5.tree_builder",
            "snapshot: {} open elements, {} formatting entries, {} distinct",
            stack.len(),
            formatting.len(),
            entries.len()
        );

        StateSnapshot {
            entries,
            stack,
            formatting,
            template_modes: self.state.template_modes.clone(),
            mode: self.state.mode,
            original_mode: self.state.original_mode,
            frameset_ok: self.state.frameset_ok,
            need_to_drop_lf: self.state.need_to_drop_lf,
            document_mode: self.state.document_mode,
            form_element: self.state.form_element.clone(),
            head_element: self.state.head_element.clone(),
            deep_tree_surrogate_parent: self.state.deep_tree_surrogate_parent.clone(),
            seen_encoding_declaration: self.state.seen_encoding_declaration,
            pending_table_characters: self.state.pending_table_characters.clone(),
        }
    }

    /// Whether the current state is the one `snapshot` captured.
    ///
    /// Nodes are compared with [`TreeSink::same_node`]. Attribute contents
    /// are not compared.
    pub fn snapshot_matches(&self, snapshot: &StateSnapshot<S::Handle>) -> bool {
        let state = &self.state;
        if state.mode != snapshot.mode
            || state.original_mode != snapshot.original_mode
            || state.frameset_ok != snapshot.frameset_ok
            || state.need_to_drop_lf != snapshot.need_to_drop_lf
            || state.document_mode != snapshot.document_mode
            || state.template_modes != snapshot.template_modes
            || state.pending_table_characters != snapshot.pending_table_characters
        {
            return false;
        }

        if !self.same_optional_node(&state.form_element, &snapshot.form_element)
            || !self.same_optional_node(&state.head_element, &snapshot.head_element)
            || !self.same_optional_node(
                &state.deep_tree_surrogate_parent,
                &snapshot.deep_tree_surrogate_parent,
            )
        {
            return false;
        }

        if state.stack.len() != snapshot.stack.len()
            || state.formatting.len() != snapshot.formatting.len()
        {
            return false;
        }

        let same_entry = |live: &Rc<StackNode<S::Handle>>, index: usize| {
            snapshot
                .entries
                .get(index)
                .map(|saved| {
                    saved.namespace == live.namespace
                        && self.sink.same_node(&saved.node, &live.node)
                })
                .unwrap_or(false)
        };

        let stack_matches = state
            .stack
            .iter()
            .zip(snapshot.stack.iter())
            .all(|(live, &index)| same_entry(live, index));

        stack_matches
            && state
                .formatting
                .iter()
                .zip(snapshot.formatting.iter())
                .all(|(live, saved)| match (live, saved) {
                    (FormattingEntry::Marker, None) => true,
                    (FormattingEntry::Element(live), Some(index)) => same_entry(live, *index),
                    _ => false,
                })
    }

    /// Replaces the current state with `snapshot`.
    ///
    /// Dynamic names are re-interned through `interner`. The sink is not
    /// told about the elements that reappear on the stack.
    pub fn restore(
        &mut self,
        snapshot: &StateSnapshot<S::Handle>,
        interner: &mut dyn NameInterner,
    ) {
        let entries: Vec<Rc<StackNode<S::Handle>>> = snapshot
            .entries
            .iter()
            .map(|entry| Rc::new(entry.rebuild(interner)))
            .collect();

        let mut stack = StackOfOpenElements::new();
        for entry in snapshot.stack.iter().filter_map(|&index| entries.get(index)) {
            stack.push(Rc::clone(entry));
        }

        let mut formatting = ActiveFormattingElements::new();
        for saved in snapshot.formatting.iter() {
            match saved.and_then(|index| entries.get(index)) {
                Some(entry) => formatting.insert_at(formatting.len(), Rc::clone(entry)),
                None => formatting.insert_marker(),
            }
        }

        log::debug!(
            target: "html5.tree_builder",
            "restore: {} open elements, {} formatting entries, mode {:?}",
            stack.len(),
            formatting.len(),
            snapshot.mode
        );

        let state = &mut self.state;
        state.stack = stack;
        state.formatting = formatting;
        state.template_modes = snapshot.template_modes.clone();
        state.mode = snapshot.mode;
        state.original_mode = snapshot.original_mode;
        state.frameset_ok = snapshot.frameset_ok;
        state.need_to_drop_lf = snapshot.need_to_drop_lf;
        state.document_mode = snapshot.document_mode;
        state.form_element = snapshot.form_element.clone();
        state.head_element = snapshot.head_element.clone();
        state.deep_tree_surrogate_parent = snapshot.deep_tree_surrogate_parent.clone();
        state.seen_encoding_declaration = snapshot.seen_encoding_declaration;
        state.foster_parenting = false;
        state.pending_table_characters = snapshot.pending_table_characters.clone();
    }

    fn same_optional_node(&self, a: &Option<S::Handle>, b: &Option<S::Handle>) -> bool {
        match (a, b) {
            (Some(a), Some(b)) => self.sink.same_node(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}
