use crate::{
    atom::Atom,
    attributes::Attributes,
    element_name::{DispatchGroup, ElementFlags, ElementName, TagName},
    error::SourceLocation,
    namespace::Namespace,
};

/// An open element, shared between the stack of open elements and the list
/// of active formatting elements.
///
/// Entries are immutable once created. Identity is `Rc::ptr_eq`; two
/// entries for elements with the same name are still different entries.
#[derive(Debug)]
pub(crate) struct StackNode<H> {
    pub namespace: Namespace,
    /// Dispatch information, keyed by the lowercase tag name.
    pub name: ElementName,
    /// The local name the element was created with.
    pub local_name: Atom,
    /// Name reported when the element is left unclosed.
    pub pop_name: Atom,
    pub node: H,
    /// `name.flags()` adjusted for `namespace`.
    pub flags: ElementFlags,
    /// Kept for formatting elements so they can be recreated.
    pub attributes: Option<Attributes>,
    pub location: Option<SourceLocation>,
}

impl<H> StackNode<H> {
    pub fn html(name: ElementName, node: H, location: Option<SourceLocation>) -> Self {
        Self {
            namespace: Namespace::Html,
            local_name: name.name().clone(),
            pop_name: name.name().clone(),
            flags: name.flags(),
            name,
            node,
            attributes: None,
            location,
        }
    }

    /// A formatting element: remembers its attributes for reconstruction.
    pub fn formatting(
        name: ElementName,
        node: H,
        attributes: Attributes,
        location: Option<SourceLocation>,
    ) -> Self {
        Self {
            attributes: Some(attributes),
            ..Self::html(name, node, location)
        }
    }

    /// A foreign element. `annotation-xml` integration points are decided
    /// by the caller because they depend on an attribute.
    pub fn foreign(
        namespace: Namespace,
        name: ElementName,
        node: H,
        html_integration_point: bool,
        location: Option<SourceLocation>,
    ) -> Self {
        let local_name = match namespace {
            Namespace::Svg => name.camel_case_name().clone(),
            _ => name.name().clone(),
        };
        let flags = foreign_flags(namespace, name.flags(), html_integration_point);
        Self {
            namespace,
            pop_name: local_name.clone(),
            local_name,
            flags,
            name,
            node,
            attributes: None,
            location,
        }
    }

    /// A copy of this entry for a freshly cloned node.
    pub fn with_node(&self, node: H) -> Self {
        Self {
            namespace: self.namespace,
            name: self.name.clone(),
            local_name: self.local_name.clone(),
            pop_name: self.pop_name.clone(),
            node,
            flags: self.flags,
            attributes: self.attributes.clone(),
            location: self.location,
        }
    }

    pub fn is_html(&self, tag_name: TagName) -> bool {
        self.namespace == Namespace::Html && self.name.is(tag_name)
    }

    /// Matches an end tag's name against this HTML element.
    pub fn is_html_named(&self, name: &ElementName) -> bool {
        self.namespace == Namespace::Html && self.name == *name
    }

    /// The dispatch group, for HTML elements only.
    pub fn html_group(&self) -> Option<DispatchGroup> {
        match self.namespace {
            Namespace::Html => Some(self.name.group()),
            _ => None,
        }
    }

    pub fn is_special(&self) -> bool {
        self.flags.contains(ElementFlags::SPECIAL)
    }

    pub fn is_scoping(&self) -> bool {
        self.flags.contains(ElementFlags::SCOPING)
    }

    pub fn is_foster_parenting(&self) -> bool {
        self.flags.contains(ElementFlags::FOSTER_PARENTING)
    }

    pub fn is_html_integration_point(&self) -> bool {
        self.flags.contains(ElementFlags::HTML_INTEGRATION_POINT)
    }

    pub fn has_optional_end_tag(&self) -> bool {
        self.flags.contains(ElementFlags::OPTIONAL_END_TAG)
    }

    /// > A node is a MathML text integration point if it is one of the following elements:
    /// > A MathML mi element, mo, mn, ms, mtext
    pub fn is_mathml_text_integration_point(&self) -> bool {
        self.namespace == Namespace::MathML && self.name.group() == DispatchGroup::MiMoMnMsMtext
    }
}

fn foreign_flags(namespace: Namespace, flags: ElementFlags, integration_point: bool) -> ElementFlags {
    let mut adjusted = flags;
    match namespace {
        Namespace::Html => return flags,
        Namespace::Svg => {
            adjusted.remove(html_only_flags());
            if flags.contains(ElementFlags::SCOPING_AS_SVG) {
                adjusted.insert(
                    ElementFlags::SCOPING
                        | ElementFlags::SPECIAL
                        | ElementFlags::HTML_INTEGRATION_POINT,
                );
            }
        }
        Namespace::MathML => {
            adjusted.remove(html_only_flags());
            if flags.contains(ElementFlags::SCOPING_AS_MATHML) {
                adjusted.insert(ElementFlags::SCOPING | ElementFlags::SPECIAL);
            }
        }
    }
    if integration_point {
        adjusted.insert(ElementFlags::HTML_INTEGRATION_POINT);
    }
    adjusted
}

fn html_only_flags() -> ElementFlags {
    ElementFlags::FOSTER_PARENTING
        | ElementFlags::SCOPING
        | ElementFlags::SPECIAL
        | ElementFlags::OPTIONAL_END_TAG
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::element_name::classify;

    #[test]
    fn svg_title_is_an_integration_point() {
        let title = StackNode::foreign(Namespace::Svg, classify("title"), (), false, None);
        assert!(title.is_html_integration_point());
        assert!(title.is_scoping());
        assert!(title.is_special());
        assert!(!title.is_html(TagName::TITLE));
    }

    #[test]
    fn foreign_elements_lose_html_categories() {
        let table = StackNode::foreign(Namespace::MathML, classify("table"), (), false, None);
        assert!(!table.is_foster_parenting());
        assert!(!table.is_scoping());
        assert!(!table.is_special());
    }

    #[test]
    fn svg_local_names_are_camel_cased() {
        let node = StackNode::foreign(Namespace::Svg, classify("clippath"), (), false, None);
        assert_eq!("clipPath", node.local_name.as_str());
        assert_eq!("clipPath", node.pop_name.as_str());
        assert_eq!("clippath", node.name.name().as_str());
    }

    #[test]
    fn mathml_text_integration_points() {
        let mi = StackNode::foreign(Namespace::MathML, classify("mi"), (), false, None);
        assert!(mi.is_mathml_text_integration_point());
        assert!(mi.is_scoping());
        let annotation =
            StackNode::foreign(Namespace::MathML, classify("annotation-xml"), (), true, None);
        assert!(annotation.is_html_integration_point());
        assert!(!annotation.is_mathml_text_integration_point());
    }
}
