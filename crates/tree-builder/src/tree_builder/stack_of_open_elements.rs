use super::stack_node::StackNode;
use crate::element_name::{DispatchGroup, TagName};
use std::rc::Rc;

/// The flavors of "has an element in scope".
///
/// Default scope terminates on every SCOPING entry; the flag already covers
/// the HTML, MathML and SVG members of the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scope {
    /// @see https://html.spec.whatwg.org/#has-an-element-in-scope
    Default,
    /// > ...the following element types: All the element types listed above
    /// > for the has an element in scope algorithm. ol in the HTML namespace,
    /// > ul in the HTML namespace
    ListItem,
    /// > ...the following element types: All the element types listed above
    /// > for the has an element in scope algorithm. button in the HTML namespace
    Button,
    /// > html, table, template in the HTML namespace
    Table,
    /// > ...all element types except the following: optgroup in the HTML namespace,
    /// > option in the HTML namespace
    Select,
}

impl Scope {
    fn terminates<H>(self, entry: &StackNode<H>) -> bool {
        match self {
            Scope::Default => entry.is_scoping(),
            Scope::ListItem => {
                entry.is_scoping() || entry.is_html(TagName::OL) || entry.is_html(TagName::UL)
            }
            Scope::Button => entry.is_scoping() || entry.is_html(TagName::BUTTON),
            Scope::Table => {
                entry.is_html(TagName::HTML)
                    || entry.is_html(TagName::TABLE)
                    || entry.is_html(TagName::TEMPLATE)
            }
            Scope::Select => !(entry.is_html(TagName::OPTGROUP) || entry.is_html(TagName::OPTION)),
        }
    }
}

/// The stack of open elements.
///
/// > Initially, the stack of open elements is empty. The stack grows
/// > downwards; the topmost node on the stack is the first one added
/// > to the stack, and the bottommost node of the stack is the most
/// > recently added node in the stack (notwithstanding when the stack
/// > is manipulated in a random access fashion as part of the handling
/// > for misnested tags).
///
/// Index 0 is the topmost node. Sink notifications for pushes and pops are
/// sent by the tree builder, not here.
///
/// @see https://html.spec.whatwg.org/#stack-of-open-elements
#[derive(Debug)]
pub(crate) struct StackOfOpenElements<H> {
    stack: Vec<Rc<StackNode<H>>>,
}

impl<H> StackOfOpenElements<H> {
    pub fn new() -> Self {
        Self { stack: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn push(&mut self, entry: Rc<StackNode<H>>) {
        self.stack.push(entry);
    }

    pub fn pop(&mut self) -> Option<Rc<StackNode<H>>> {
        self.stack.pop()
    }

    pub fn remove_at(&mut self, index: usize) -> Rc<StackNode<H>> {
        self.stack.remove(index)
    }

    pub fn insert_at(&mut self, index: usize, entry: Rc<StackNode<H>>) {
        self.stack.insert(index, entry);
    }

    pub fn replace_at(&mut self, index: usize, entry: Rc<StackNode<H>>) {
        self.stack[index] = entry;
    }

    pub fn clear(&mut self) -> Vec<Rc<StackNode<H>>> {
        std::mem::take(&mut self.stack)
    }

    pub fn current_node(&self) -> Option<&Rc<StackNode<H>>> {
        self.stack.last()
    }

    pub fn get(&self, index: usize) -> Option<&Rc<StackNode<H>>> {
        self.stack.get(index)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Rc<StackNode<H>>> + ExactSizeIterator {
        self.stack.iter()
    }

    pub fn current_node_is(&self, tag_name: TagName) -> bool {
        self.current_node()
            .map(|node| node.is_html(tag_name))
            .unwrap_or(false)
    }

    pub fn position_of(&self, entry: &Rc<StackNode<H>>) -> Option<usize> {
        self.stack.iter().rposition(|item| Rc::ptr_eq(item, entry))
    }

    pub fn contains_node(&self, entry: &Rc<StackNode<H>>) -> bool {
        self.position_of(entry).is_some()
    }

    /// Whether an HTML element named `tag_name` is anywhere on the stack.
    pub fn contains(&self, tag_name: TagName) -> bool {
        self.stack.iter().any(|item| item.is_html(tag_name))
    }

    /// Index of the last HTML element named `tag_name`, ignoring scope.
    pub fn find_last(&self, tag_name: TagName) -> Option<usize> {
        self.stack.iter().rposition(|item| item.is_html(tag_name))
    }

    /// Index of the last HTML element named `tag_name`, or 0 for the root.
    pub fn find_last_or_root(&self, tag_name: TagName) -> usize {
        self.find_last(tag_name).unwrap_or(0)
    }

    /// Index of the last entry matching `target`, as long as no entry that
    /// terminates `scope` comes first.
    pub fn find_last_in_scope_matching(
        &self,
        scope: Scope,
        target: impl Fn(&StackNode<H>) -> bool,
    ) -> Option<usize> {
        for (index, item) in self.stack.iter().enumerate().rev() {
            if target(item.as_ref()) {
                return Some(index);
            }
            if scope.terminates(item) {
                return None;
            }
        }
        None
    }

    pub fn find_last_in_scope(&self, tag_name: TagName, scope: Scope) -> Option<usize> {
        self.find_last_in_scope_matching(scope, |item| item.is_html(tag_name))
    }

    /// Returns whether a particular element is in scope.
    ///
    /// @see https://html.spec.whatwg.org/#has-an-element-in-scope
    pub fn has_element_in_scope(&self, tag_name: TagName) -> bool {
        self.find_last_in_scope(tag_name, Scope::Default).is_some()
    }

    /// @see https://html.spec.whatwg.org/#has-an-element-in-list-item-scope
    pub fn has_element_in_list_item_scope(&self, tag_name: TagName) -> bool {
        self.find_last_in_scope(tag_name, Scope::ListItem).is_some()
    }

    /// @see https://html.spec.whatwg.org/#has-an-element-in-button-scope
    pub fn has_element_in_button_scope(&self, tag_name: TagName) -> bool {
        self.find_last_in_scope(tag_name, Scope::Button).is_some()
    }

    pub fn has_p_in_button_scope(&self) -> bool {
        self.has_element_in_button_scope(TagName::P)
    }

    /// @see https://html.spec.whatwg.org/#has-an-element-in-table-scope
    pub fn has_element_in_table_scope(&self, tag_name: TagName) -> bool {
        self.find_last_in_scope(tag_name, Scope::Table).is_some()
    }

    /// @see https://html.spec.whatwg.org/#has-an-element-in-select-scope
    pub fn has_element_in_select_scope(&self, tag_name: TagName) -> bool {
        self.find_last_in_scope(tag_name, Scope::Select).is_some()
    }

    /// Whether any of `h1` through `h6` is in scope.
    pub fn has_any_h1_to_h6_element_in_scope(&self) -> bool {
        self.find_last_in_scope_matching(Scope::Default, |item| {
            item.html_group() == Some(DispatchGroup::H1ToH6)
        })
        .is_some()
    }

    /// Whether any of `tbody`, `thead` or `tfoot` is in table scope.
    pub fn has_table_body_in_table_scope(&self) -> bool {
        self.find_last_in_scope_matching(Scope::Table, |item| {
            item.html_group() == Some(DispatchGroup::TbodyOrTheadOrTfoot)
        })
        .is_some()
    }

    /// Whether a `td` or `th` is in table scope.
    pub fn has_cell_in_table_scope(&self) -> bool {
        self.find_last_in_scope_matching(Scope::Table, |item| {
            item.html_group() == Some(DispatchGroup::TdOrTh)
        })
        .is_some()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{element_name::classify, namespace::Namespace};

    fn stack_of(names: &[&str]) -> StackOfOpenElements<()> {
        let mut stack = StackOfOpenElements::new();
        for name in names {
            let entry = match name.split_once(' ') {
                Some(("svg", local)) => {
                    StackNode::foreign(Namespace::Svg, classify(local), (), false, None)
                }
                Some(("math", local)) => {
                    StackNode::foreign(Namespace::MathML, classify(local), (), false, None)
                }
                _ => StackNode::html(classify(name), (), None),
            };
            stack.push(Rc::new(entry));
        }
        stack
    }

    #[test]
    fn scope_is_terminated_by_scoping_elements() {
        let stack = stack_of(&["html", "body", "p", "table", "tr", "td", "span"]);
        assert!(stack.has_element_in_scope(TagName::TD));
        assert!(!stack.has_element_in_scope(TagName::P));
        assert!(stack.has_element_in_table_scope(TagName::TR));
        assert!(!stack.has_element_in_table_scope(TagName::BODY));
        assert!(stack.has_cell_in_table_scope());
    }

    #[test]
    fn button_and_list_item_scopes() {
        let stack = stack_of(&["html", "body", "p", "button", "span"]);
        assert!(stack.has_element_in_scope(TagName::P));
        assert!(!stack.has_p_in_button_scope());

        let stack = stack_of(&["html", "body", "li", "ul", "span"]);
        assert!(stack.has_element_in_scope(TagName::LI));
        assert!(!stack.has_element_in_list_item_scope(TagName::LI));
    }

    #[test]
    fn foreign_integration_points_terminate_scope() {
        let stack = stack_of(&["html", "body", "p", "svg svg", "svg foreignobject", "div"]);
        assert!(!stack.has_element_in_scope(TagName::P));

        let stack = stack_of(&["html", "body", "p", "svg svg", "svg g"]);
        assert!(stack.has_element_in_scope(TagName::P));
    }

    #[test]
    fn foreign_elements_do_not_match_html_names() {
        let stack = stack_of(&["html", "body", "svg svg", "svg title"]);
        assert!(!stack.has_element_in_scope(TagName::TITLE));
        assert!(!stack.contains(TagName::TITLE));
    }

    #[test]
    fn select_scope_only_sees_through_options() {
        let stack = stack_of(&["html", "body", "select", "optgroup", "option"]);
        assert!(stack.has_element_in_select_scope(TagName::SELECT));
        let stack = stack_of(&["html", "body", "select", "div"]);
        assert!(!stack.has_element_in_select_scope(TagName::SELECT));
    }

    #[test]
    fn headings_in_scope() {
        let stack = stack_of(&["html", "body", "h3", "b"]);
        assert!(stack.has_any_h1_to_h6_element_in_scope());
        assert_eq!(0, stack.find_last_or_root(TagName::TABLE));
        assert_eq!(Some(2), stack.find_last(TagName::H3));
    }
}
