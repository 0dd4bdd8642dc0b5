use super::stack_node::StackNode;
use crate::element_name::ElementName;
use std::rc::Rc;

#[derive(Debug)]
pub(crate) enum FormattingEntry<H> {
    Element(Rc<StackNode<H>>),
    Marker,
}

impl<H> FormattingEntry<H> {
    pub fn is_marker(&self) -> bool {
        matches!(self, FormattingEntry::Marker)
    }

    pub fn element(&self) -> Option<&Rc<StackNode<H>>> {
        match self {
            FormattingEntry::Element(entry) => Some(entry),
            FormattingEntry::Marker => None,
        }
    }
}

impl<H> Clone for FormattingEntry<H> {
    fn clone(&self) -> Self {
        match self {
            FormattingEntry::Element(entry) => FormattingEntry::Element(Rc::clone(entry)),
            FormattingEntry::Marker => FormattingEntry::Marker,
        }
    }
}

/// The list of active formatting elements.
///
/// > Initially, the list of active formatting elements is empty.
/// > It is used to handle mis-nested formatting element tags.
/// >
/// > The list contains elements in the formatting category, and markers.
/// > The markers are inserted when entering applet, object, marquee,
/// > template, td, th, and caption elements, and are used to prevent
/// > formatting from "leaking" into applet, object, marquee, template,
/// > td, th, and caption elements.
///
/// Entries are shared with the stack of open elements.
///
/// @see https://html.spec.whatwg.org/#list-of-active-formatting-elements
#[derive(Debug)]
pub(crate) struct ActiveFormattingElements<H> {
    list: Vec<FormattingEntry<H>>,
}

impl<H> ActiveFormattingElements<H> {
    pub fn new() -> Self {
        Self { list: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FormattingEntry<H>> {
        self.list.get(index)
    }

    pub fn last(&self) -> Option<&FormattingEntry<H>> {
        self.list.last()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &FormattingEntry<H>> {
        self.list.iter()
    }

    /// Inserts a "marker" at the end of the list of active formatting elements.
    ///
    /// @see https://html.spec.whatwg.org/#concept-parser-marker
    pub fn insert_marker(&mut self) {
        self.list.push(FormattingEntry::Marker);
    }

    /// Pushes an element onto the list of active formatting elements.
    ///
    /// > 1. If there are already three elements in the list of active formatting
    /// >    elements after the last marker, if any, or anywhere in the list if
    /// >    there are no markers, that have the same tag name, namespace, and
    /// >    attributes as element, then remove the earliest such element from
    /// >    the list of active formatting elements. For these purposes, the
    /// >    attributes must be compared as they were when the elements were
    /// >    created by the parser; two elements have the same attributes if all
    /// >    their parsed attributes can be paired such that the two attributes
    /// >    in each pair have identical names, namespaces, and values (the order
    /// >    of the attributes does not matter).
    /// >
    /// > 2. Add element to the list of active formatting elements.
    ///
    /// @see https://html.spec.whatwg.org/#push-onto-the-list-of-active-formatting-elements
    pub fn push(&mut self, entry: Rc<StackNode<H>>) {
        let mut count = 0;
        let mut earliest = None;
        for (index, item) in self.list.iter().enumerate().rev() {
            let existing = match item {
                FormattingEntry::Marker => break,
                FormattingEntry::Element(existing) => existing,
            };
            if is_same_formatting_element(existing, &entry) {
                count += 1;
                earliest = Some(index);
            }
        }

        if count >= 3 {
            if let Some(index) = earliest {
                log::debug!(
                    target: "html5.tree_builder",
                    "dropping the earliest of three <{}> formatting entries",
                    entry.local_name
                );
                self.list.remove(index);
            }
        }

        self.list.push(FormattingEntry::Element(entry));
    }

    pub fn insert_at(&mut self, index: usize, entry: Rc<StackNode<H>>) {
        self.list.insert(index, FormattingEntry::Element(entry));
    }

    pub fn remove_at(&mut self, index: usize) -> FormattingEntry<H> {
        self.list.remove(index)
    }

    pub fn replace_at(&mut self, index: usize, entry: Rc<StackNode<H>>) {
        self.list[index] = FormattingEntry::Element(entry);
    }

    /// Removes `entry` if it is in the list. Returns whether it was.
    pub fn remove(&mut self, entry: &Rc<StackNode<H>>) -> bool {
        match self.position_of(entry) {
            Some(index) => {
                self.list.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn position_of(&self, entry: &Rc<StackNode<H>>) -> Option<usize> {
        self.list.iter().rposition(|item| match item {
            FormattingEntry::Element(existing) => Rc::ptr_eq(existing, entry),
            FormattingEntry::Marker => false,
        })
    }

    pub fn contains(&self, entry: &Rc<StackNode<H>>) -> bool {
        self.position_of(entry).is_some()
    }

    /// Finds the last HTML element named `name` that comes after the last marker.
    pub fn find_last_between_top_and_marker(&self, name: &ElementName) -> Option<usize> {
        for (index, item) in self.list.iter().enumerate().rev() {
            match item {
                FormattingEntry::Marker => return None,
                FormattingEntry::Element(entry) if entry.is_html_named(name) => {
                    return Some(index)
                }
                FormattingEntry::Element(_) => {}
            }
        }
        None
    }

    /// Clears the list of active formatting elements up to the last marker.
    ///
    /// > 1. Let entry be the last (most recently added) entry in the list of active
    /// >    formatting elements.
    /// > 2. Remove entry from the list of active formatting elements.
    /// > 3. If entry was a marker, then stop the algorithm at this point.
    /// >    The list has been cleared up to the last marker.
    /// > 4. Go to step 1.
    ///
    /// @see https://html.spec.whatwg.org/multipage/parsing.html#clear-the-list-of-active-formatting-elements-up-to-the-last-marker
    pub fn clear_up_to_last_marker(&mut self) {
        while let Some(entry) = self.list.pop() {
            if entry.is_marker() {
                break;
            }
        }
    }

    pub fn clear(&mut self) -> Vec<FormattingEntry<H>> {
        std::mem::take(&mut self.list)
    }
}

fn is_same_formatting_element<H>(a: &StackNode<H>, b: &StackNode<H>) -> bool {
    if a.namespace != b.namespace || a.name != b.name {
        return false;
    }
    match (&a.attributes, &b.attributes) {
        (Some(a), Some(b)) => a.same_set(b),
        (None, None) => true,
        (Some(attrs), None) | (None, Some(attrs)) => attrs.is_empty(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{attributes::Attributes, element_name::classify};

    fn formatting(name: &str, attrs: &[(&str, &str)], id: u32) -> Rc<StackNode<u32>> {
        let attrs: Attributes = attrs.iter().copied().collect();
        Rc::new(StackNode::formatting(classify(name), id, attrs, None))
    }

    fn nodes(list: &ActiveFormattingElements<u32>) -> Vec<Option<u32>> {
        list.iter()
            .map(|entry| entry.element().map(|e| e.node))
            .collect()
    }

    #[test]
    fn noahs_ark_drops_the_earliest_duplicate() {
        let mut list = ActiveFormattingElements::new();
        list.push(formatting("b", &[("class", "x")], 1));
        list.push(formatting("b", &[("class", "x")], 2));
        list.push(formatting("i", &[], 3));
        list.push(formatting("b", &[("class", "x")], 4));
        assert_eq!(vec![Some(1), Some(2), Some(3), Some(4)], nodes(&list));

        list.push(formatting("b", &[("class", "x")], 5));
        assert_eq!(vec![Some(2), Some(3), Some(4), Some(5)], nodes(&list));
    }

    #[test]
    fn noahs_ark_compares_attribute_sets() {
        let mut list = ActiveFormattingElements::new();
        list.push(formatting("b", &[("a", "1"), ("b", "2")], 1));
        list.push(formatting("b", &[("b", "2"), ("a", "1")], 2));
        list.push(formatting("b", &[("a", "1"), ("b", "2")], 3));
        list.push(formatting("b", &[("a", "1")], 4));
        assert_eq!(4, list.len());

        list.push(formatting("b", &[("a", "1"), ("b", "2")], 5));
        assert_eq!(vec![Some(2), Some(3), Some(4), Some(5)], nodes(&list));
    }

    #[test]
    fn noahs_ark_stops_at_markers() {
        let mut list = ActiveFormattingElements::new();
        list.push(formatting("b", &[], 1));
        list.push(formatting("b", &[], 2));
        list.insert_marker();
        list.push(formatting("b", &[], 3));
        list.push(formatting("b", &[], 4));
        list.push(formatting("b", &[], 5));
        assert_eq!(
            vec![Some(1), Some(2), None, Some(3), Some(4), Some(5)],
            nodes(&list)
        );
    }

    #[test]
    fn lookup_does_not_cross_markers() {
        let mut list = ActiveFormattingElements::new();
        list.push(formatting("a", &[], 1));
        list.insert_marker();
        list.push(formatting("b", &[], 2));
        assert_eq!(Some(2), list.find_last_between_top_and_marker(&classify("b")));
        assert_eq!(None, list.find_last_between_top_and_marker(&classify("a")));

        list.clear_up_to_last_marker();
        assert_eq!(vec![Some(1)], nodes(&list));
        assert_eq!(Some(0), list.find_last_between_top_and_marker(&classify("a")));
    }

    #[test]
    fn removal_is_by_identity() {
        let mut list = ActiveFormattingElements::new();
        let first = formatting("b", &[], 1);
        let second = formatting("b", &[], 2);
        list.push(Rc::clone(&first));
        list.push(Rc::clone(&second));
        assert!(list.remove(&first));
        assert!(!list.remove(&first));
        assert_eq!(Some(0), list.position_of(&second));
    }
}
