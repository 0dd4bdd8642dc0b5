use super::{stack_node::StackNode, token::Tag, TreeBuilder};
use crate::{
    atom::Atom,
    attributes::Attributes,
    element_name::{ElementName, TagName},
    error::ParseErrorKind,
    namespace::Namespace,
    sink::TreeSink,
};
use std::rc::Rc;

/// Where the next node goes.
///
/// @see https://html.spec.whatwg.org/#appropriate-place-for-inserting-a-node
pub(super) enum InsertionPlace<H> {
    AppendTo(H),
    /// Before `table` if it has a parent, otherwise as the last child of `stack_parent`.
    FosterParent { table: H, stack_parent: H },
}

impl<H> InsertionPlace<H> {
    /// The node the new element is expected to end up in.
    pub fn intended_parent(&self) -> &H {
        match self {
            InsertionPlace::AppendTo(parent) => parent,
            InsertionPlace::FosterParent { stack_parent, .. } => stack_parent,
        }
    }
}

/// > Listed, labelable, submittable, resettable, and autocapitalize-and-autocorrect
/// > inheriting form-associated elements.
fn is_form_associated(name: &ElementName) -> bool {
    [
        TagName::BUTTON,
        TagName::FIELDSET,
        TagName::IMG,
        TagName::INPUT,
        TagName::OBJECT,
        TagName::OUTPUT,
        TagName::SELECT,
        TagName::TEXTAREA,
    ]
    .iter()
    .any(|tag_name| name.is(*tag_name))
}

impl<S: TreeSink> TreeBuilder<S> {
    /// Pushes an entry onto the stack of open elements.
    pub(super) fn push(&mut self, entry: Rc<StackNode<S::Handle>>) {
        self.sink
            .element_pushed(entry.namespace, &entry.local_name, &entry.node);
        self.state.stack.push(entry);
        self.update_deep_tree_surrogate();
    }

    /// Pops the current node off the stack of open elements.
    pub(super) fn pop(&mut self) -> Option<Rc<StackNode<S::Handle>>> {
        let entry = self.state.stack.pop()?;
        self.sink
            .element_popped(entry.namespace, &entry.pop_name, &entry.node);
        self.update_deep_tree_surrogate();
        Some(entry)
    }

    /// Removes an entry from the middle of the stack.
    pub(super) fn remove_from_stack(&mut self, index: usize) {
        if index + 1 == self.state.stack.len() {
            self.pop();
        } else {
            self.state.stack.remove_at(index);
            self.update_deep_tree_surrogate();
        }
    }

    /// Pops entries until the stack has `len` entries left.
    pub(super) fn pop_to_length(&mut self, len: usize) {
        while self.state.stack.len() > len {
            self.pop();
        }
    }

    /// Pops elements until an HTML element named `tag_name` has been popped.
    pub(super) fn pop_until(&mut self, tag_name: TagName) {
        while let Some(entry) = self.pop() {
            if entry.is_html(tag_name) {
                break;
            }
        }
    }

    /// Pops until the current node is an HTML element or an integration point.
    pub(super) fn pop_until_html_or_integration_point(&mut self) {
        // A foreign fragment root stays.
        while self.state.stack.len() > 1 {
            let Some(current) = self.current_node() else {
                break;
            };
            if current.namespace == Namespace::Html
                || current.is_mathml_text_integration_point()
                || current.is_html_integration_point()
            {
                break;
            }
            self.pop();
        }
    }

    fn update_deep_tree_surrogate(&mut self) {
        let limit = self.config.max_tree_depth;
        self.state.deep_tree_surrogate_parent = match self.state.stack.len() > limit {
            true => self
                .state
                .stack
                .get(limit.saturating_sub(1))
                .map(|entry| entry.node.clone()),
            false => None,
        };
    }

    /// Finds the appropriate place for inserting a node.
    ///
    /// > 1. If there was an override target specified, then let target be the override target.
    /// >    Otherwise, let target be the current node.
    /// >
    /// > 2. Determine the adjusted insertion location using the first matching steps from the
    /// >    following list:
    /// >
    /// >    - If foster parenting is enabled and target is a table, tbody, tfoot, thead, or tr element
    /// >      ...
    /// >    - Otherwise
    /// >      Let adjusted insertion location be inside target, after its last child (if any).
    /// >
    /// > 3. If the adjusted insertion location is inside a template element, let it instead be
    /// >    inside the template element's template contents, after its last child (if any).
    ///
    /// Step 3 is the sink's job.
    ///
    /// `None` only when the stack of open elements is empty.
    pub(super) fn appropriate_place(
        &self,
        override_target: Option<usize>,
    ) -> Option<InsertionPlace<S::Handle>> {
        let target = match override_target {
            Some(index) => self.state.stack.get(index),
            None => self.current_node(),
        }?;

        if self.state.foster_parenting && target.is_foster_parenting() {
            return self.foster_parenting_place();
        }

        if override_target.is_none() {
            if let Some(surrogate) = &self.state.deep_tree_surrogate_parent {
                return Some(InsertionPlace::AppendTo(surrogate.clone()));
            }
        }

        Some(InsertionPlace::AppendTo(target.node.clone()))
    }

    /// > 2.1. Let last template be the last template element in the stack of open elements, if any.
    /// > 2.2. Let last table be the last table element in the stack of open elements, if any.
    /// > 2.3. If there is a last template and either there is no last table, or there is one,
    /// >      but last template is lower (more recently added) than last table in the stack of
    /// >      open elements, then: let adjusted insertion location be inside last template's
    /// >      template contents, after its last child (if any), and abort these steps.
    /// > 2.4. If there is no last table, then let adjusted insertion location be inside the
    /// >      first element in the stack of open elements (the html element), after its last
    /// >      child (if any), and abort these steps. (fragment case)
    /// > 2.5. If last table has a parent node, then let adjusted insertion location be inside
    /// >      last table's parent node, immediately before last table, and abort these steps.
    /// > 2.6. Let previous element be the element immediately above last table in the stack of
    /// >      open elements.
    /// > 2.7. Let adjusted insertion location be inside previous element, after its last child
    /// >      (if any).
    pub(super) fn foster_parenting_place(&self) -> Option<InsertionPlace<S::Handle>> {
        let stack = &self.state.stack;
        let table_pos = stack.find_last_or_root(TagName::TABLE);
        let template_pos = stack.find_last_or_root(TagName::TEMPLATE);
        debug_assert!(
            table_pos != template_pos || table_pos == 0,
            "a table and a template share a stack slot"
        );

        if template_pos >= table_pos {
            let template = stack.get(template_pos)?;
            return Some(InsertionPlace::AppendTo(template.node.clone()));
        }

        log::debug!(target: "html5.tree_builder", "foster parenting before <table>");
        let table = stack.get(table_pos)?;
        let stack_parent = stack.get(table_pos - 1)?;
        Some(InsertionPlace::FosterParent {
            table: table.node.clone(),
            stack_parent: stack_parent.node.clone(),
        })
    }

    pub(super) fn insert_node_at(&mut self, place: &InsertionPlace<S::Handle>, node: &S::Handle) {
        match place {
            InsertionPlace::AppendTo(parent) => self.sink.append_element(node, parent),
            InsertionPlace::FosterParent {
                table,
                stack_parent,
            } => self
                .sink
                .insert_foster_parented_child(node, table, stack_parent),
        }
    }

    /// Creates an element for a token and inserts it at the appropriate place.
    fn create_and_insert(
        &mut self,
        namespace: Namespace,
        local_name: &Atom,
        attributes: &Attributes,
        form_associated: bool,
    ) -> Option<S::Handle> {
        let Some(place) = self.appropriate_place(None) else {
            log::warn!(target: "html5.tree_builder", "no open element to insert <{}> into", local_name);
            return None;
        };
        let form = match form_associated && !self.state.stack.contains(TagName::TEMPLATE) {
            true => self.state.form_element.clone(),
            false => None,
        };
        let node = self.sink.create_element(
            namespace,
            local_name,
            attributes,
            form.as_ref(),
            place.intended_parent(),
        );
        self.insert_node_at(&place, &node);
        Some(node)
    }

    /// Inserts an HTML element for a token and pushes it.
    ///
    /// @see https://html.spec.whatwg.org/#insert-an-html-element
    pub(super) fn insert_html_element(&mut self, tag: &Tag) -> Option<Rc<StackNode<S::Handle>>> {
        let node = self.create_and_insert(
            Namespace::Html,
            tag.name.name(),
            &tag.attributes,
            is_form_associated(&tag.name),
        )?;
        let entry = Rc::new(StackNode::html(tag.name.clone(), node, self.location));
        self.push(Rc::clone(&entry));
        Some(entry)
    }

    /// Inserts an HTML element with no attributes, e.g. an implied `<tbody>`.
    pub(super) fn insert_html_element_named(
        &mut self,
        tag_name: TagName,
    ) -> Option<Rc<StackNode<S::Handle>>> {
        self.insert_html_element(&Tag {
            name: ElementName::for_tag(tag_name),
            attributes: Attributes::new(),
            self_closing: false,
        })
    }

    /// Inserts and immediately pops a void element, acknowledging the
    /// self-closing flag.
    pub(super) fn insert_void_html_element(&mut self, tag: &Tag) {
        if self.insert_html_element(tag).is_some() {
            self.pop();
        }
        self.acknowledge_self_closing();
    }

    /// Inserts a formatting element and pushes it onto the list of active
    /// formatting elements.
    ///
    /// @see https://html.spec.whatwg.org/#push-onto-the-list-of-active-formatting-elements
    pub(super) fn insert_formatting_element(&mut self, tag: &Tag) {
        let Some(node) =
            self.create_and_insert(Namespace::Html, tag.name.name(), &tag.attributes, false)
        else {
            return;
        };
        let entry = Rc::new(StackNode::formatting(
            tag.name.clone(),
            node,
            tag.attributes.clone(),
            self.location,
        ));
        self.push(Rc::clone(&entry));
        self.state.formatting.push(entry);
    }

    /// Inserts a foreign element. The attributes must already be adjusted.
    ///
    /// @see https://html.spec.whatwg.org/#insert-a-foreign-element
    pub(super) fn insert_foreign_element(&mut self, tag: &Tag, namespace: Namespace) {
        let local_name = match namespace {
            Namespace::Svg => tag.name.camel_case_name().clone(),
            _ => tag.name.name().clone(),
        };
        let Some(node) = self.create_and_insert(namespace, &local_name, &tag.attributes, false)
        else {
            return;
        };

        /*
         * > A node is an HTML integration point if it is one of the following elements:
         * >
         * > - A MathML annotation-xml element whose start tag token had an attribute
         * >   with the name "encoding" whose value was an ASCII case-insensitive match
         * >   for the string "text/html"
         * > - A MathML annotation-xml element whose start tag token had an attribute
         * >   with the name "encoding" whose value was an ASCII case-insensitive match
         * >   for the string "application/xhtml+xml"
         */
        let integration_point = namespace == Namespace::MathML
            && tag.name.is(TagName::ANNOTATION_XML)
            && (tag
                .attributes
                .has_value_ignore_ascii_case("encoding", "text/html")
                || tag
                    .attributes
                    .has_value_ignore_ascii_case("encoding", "application/xhtml+xml"));

        let entry = StackNode::foreign(
            namespace,
            tag.name.clone(),
            node,
            integration_point,
            self.location,
        );
        self.push(Rc::new(entry));
    }

    /// Recreates `entry` at the appropriate place and pushes the copy.
    pub(super) fn insert_copy_of(
        &mut self,
        entry: &StackNode<S::Handle>,
    ) -> Option<Rc<StackNode<S::Handle>>> {
        let empty = Attributes::new();
        let attributes = entry.attributes.as_ref().unwrap_or(&empty);
        let node = self.create_and_insert(entry.namespace, &entry.local_name, attributes, false)?;
        let copy = Rc::new(entry.with_node(node));
        self.push(Rc::clone(&copy));
        Some(copy)
    }

    /// Inserts characters at the appropriate place.
    ///
    /// @see https://html.spec.whatwg.org/#insert-a-character
    pub(super) fn insert_characters(&mut self, text: &str) {
        match self.appropriate_place(None) {
            Some(InsertionPlace::AppendTo(parent)) => self.sink.append_characters(&parent, text),
            Some(InsertionPlace::FosterParent {
                table,
                stack_parent,
            }) => self
                .sink
                .insert_foster_parented_characters(text, &table, &stack_parent),
            None => log::warn!(target: "html5.tree_builder", "dropping text outside of the tree"),
        }
    }

    /// Inserts a comment as the last child of the current node.
    ///
    /// @see https://html.spec.whatwg.org/#insert-a-comment
    pub(super) fn insert_comment(&mut self, text: &str) {
        let parent = match &self.state.deep_tree_surrogate_parent {
            Some(surrogate) => surrogate.clone(),
            None => match self.current_node() {
                Some(current) => current.node.clone(),
                None => {
                    self.sink.append_comment_to_document(text);
                    return;
                }
            },
        };
        self.sink.append_comment(&parent, text);
    }

    /// > Insert a comment as the last child of the first element in the stack
    /// > of open elements (the html element).
    pub(super) fn insert_comment_in_root(&mut self, text: &str) {
        match self.state.stack.get(0).map(|root| root.node.clone()) {
            Some(root) => self.sink.append_comment(&root, text),
            None => self.sink.append_comment_to_document(text),
        }
    }

    /// Inserts the characters collected in a table.
    ///
    /// > If any of the tokens in the pending table character tokens list are character
    /// > tokens that are not ASCII whitespace, then this is a parse error: reprocess the
    /// > character tokens in the pending table character tokens list using the rules given
    /// > in the "anything else" entry in the "in table" insertion mode.
    /// >
    /// > Otherwise, insert the characters given by the pending table character tokens list.
    ///
    /// @see https://html.spec.whatwg.org/#parsing-main-intabletext
    pub(super) fn flush_pending_table_characters(&mut self) {
        if self.state.pending_table_characters.is_empty() {
            return;
        }

        let text = std::mem::take(&mut self.state.pending_table_characters);
        if super::token::is_all_whitespace(&text) {
            self.insert_characters(&text);
            return;
        }

        self.parse_error(ParseErrorKind::FosterParentedCharacters);
        self.state.foster_parenting = true;
        self.reconstruct_active_formatting_elements();
        self.insert_characters(&text);
        self.state.foster_parenting = false;
        self.state.frameset_not_ok();
    }
}
