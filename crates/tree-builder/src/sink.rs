use crate::{
    atom::Atom,
    attributes::Attributes,
    document_mode::DocumentMode,
    error::{ParseError, ParseWarning},
    namespace::Namespace,
};

/// Receives tree mutations from the tree builder.
///
/// The builder never inspects the tree; everything it needs to know about
/// nodes is kept on its own stacks. Handles are cloned freely and must stay
/// valid for the whole parse.
///
/// Appending to an HTML `template` element appends to its template contents.
pub trait TreeSink {
    type Handle: Clone;

    /// Creates an element that is not yet in the tree.
    ///
    /// `form` is the form owner for form-associated elements. `intended_parent`
    /// is where the element is about to be inserted.
    fn create_element(
        &mut self,
        namespace: Namespace,
        local_name: &Atom,
        attributes: &Attributes,
        form: Option<&Self::Handle>,
        intended_parent: &Self::Handle,
    ) -> Self::Handle;

    /// Creates the root `html` element and appends it to the document.
    fn create_html_root(&mut self, attributes: &Attributes) -> Self::Handle;

    fn append_element(&mut self, child: &Self::Handle, parent: &Self::Handle);

    /// Moves every child of `old_parent` to the end of `new_parent`.
    fn append_children_to_new_parent(&mut self, old_parent: &Self::Handle, new_parent: &Self::Handle);

    fn detach_from_parent(&mut self, node: &Self::Handle);

    /// Inserts `child` before `table` if `table` has a parent, otherwise
    /// appends it to `stack_parent`.
    fn insert_foster_parented_child(
        &mut self,
        child: &Self::Handle,
        table: &Self::Handle,
        stack_parent: &Self::Handle,
    );

    /// Character counterpart of [`TreeSink::insert_foster_parented_child`].
    fn insert_foster_parented_characters(
        &mut self,
        text: &str,
        table: &Self::Handle,
        stack_parent: &Self::Handle,
    );

    /// Appends text, merging with a preceding text node.
    fn append_characters(&mut self, parent: &Self::Handle, text: &str);

    fn append_comment(&mut self, parent: &Self::Handle, text: &str);

    fn append_comment_to_document(&mut self, text: &str);

    fn append_doctype_to_document(
        &mut self,
        name: Option<&str>,
        public_id: Option<&str>,
        system_id: Option<&str>,
    );

    /// Adds the attributes that `element` does not have yet.
    fn add_attributes_to_element(&mut self, element: &Self::Handle, attributes: &Attributes);

    /// Node identity.
    fn same_node(&self, a: &Self::Handle, b: &Self::Handle) -> bool;

    fn document_mode(
        &mut self,
        _mode: DocumentMode,
        _public_id: Option<&str>,
        _system_id: Option<&str>,
    ) {
    }

    /// The form element owning a fragment's context element, if any.
    fn form_pointer_for_context(&mut self, _context: Option<&Self::Handle>) -> Option<Self::Handle> {
        None
    }

    fn element_pushed(&mut self, _namespace: Namespace, _name: &Atom, _node: &Self::Handle) {}

    fn element_popped(&mut self, _namespace: Namespace, _name: &Atom, _node: &Self::Handle) {}

    fn parse_error(&mut self, _error: ParseError) {}

    fn warning(&mut self, _warning: ParseWarning) {}
}
