use html_tree_builder::{
    atom::Atom, namespace::Namespace, Attributes, DocumentMode, ParseError, ParseWarning,
    SuspendReason, TreeBuilderError, TreeSink,
};

pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Document,
    Doctype {
        name: String,
        public_id: Option<String>,
        system_id: Option<String>,
    },
    Element(ElementData),
    Text(String),
    Comment(String),
    /// The document fragment holding a template's contents.
    TemplateContents,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub namespace: Namespace,
    pub local_name: Atom,
    pub attributes: Attributes,
    pub template_contents: Option<NodeId>,
    pub form_owner: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub data: NodeData,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// A DOM kept in a flat arena, indexed by [`NodeId`].
#[derive(Debug)]
pub struct ArenaDom {
    nodes: Vec<Node>,
    pub document_mode: DocumentMode,
    pub errors: Vec<ParseError>,
    pub warnings: Vec<ParseWarning>,
    /// The error that stopped the parse, if any.
    pub fatal_error: Option<TreeBuilderError>,
    /// Suspensions the tokenizer was asked for.
    pub suspensions: Vec<SuspendReason>,
    pub pushed: usize,
    pub popped: usize,
}

impl Default for ArenaDom {
    fn default() -> Self {
        Self::new()
    }
}

impl ArenaDom {
    pub const DOCUMENT: NodeId = 0;

    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                data: NodeData::Document,
                parent: None,
                children: Vec::new(),
            }],
            document_mode: DocumentMode::NoQuirks,
            errors: Vec::new(),
            warnings: Vec::new(),
            fatal_error: None,
            suspensions: Vec::new(),
            pushed: 0,
            popped: 0,
        }
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes[id].data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    /// The root `html` element.
    pub fn root_element(&self) -> Option<NodeId> {
        self.children(Self::DOCUMENT)
            .iter()
            .copied()
            .find(|&child| self.element(child).is_some())
    }

    /// Elements in document order whose local name is `name`.
    pub fn elements_named(&self, name: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        self.collect_named(Self::DOCUMENT, name, &mut found);
        found
    }

    fn collect_named(&self, id: NodeId, name: &str, found: &mut Vec<NodeId>) {
        if let Some(element) = self.element(id) {
            if element.local_name == name {
                found.push(id);
            }
        }
        for &child in self.children(id) {
            self.collect_named(child, name, found);
        }
        if let Some(contents) = self.element(id).and_then(|element| element.template_contents) {
            self.collect_named(contents, name, found);
        }
    }

    fn new_node(&mut self, data: NodeData) -> NodeId {
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        self.nodes.len() - 1
    }

    /// Where children appended to `parent` actually go.
    fn container(&self, parent: NodeId) -> NodeId {
        self.element(parent)
            .and_then(|element| element.template_contents)
            .unwrap_or(parent)
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node].parent.take() {
            self.nodes[parent].children.retain(|&child| child != node);
        }
    }

    fn append(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        let parent = self.container(parent);
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
    }

    fn insert_before(&mut self, sibling: NodeId, child: NodeId) {
        self.detach(child);
        let Some(parent) = self.nodes[sibling].parent else {
            return;
        };
        let index = self.nodes[parent]
            .children
            .iter()
            .position(|&candidate| candidate == sibling)
            .unwrap_or(0);
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.insert(index, child);
    }

    fn text_node(&mut self, id: Option<NodeId>) -> Option<&mut String> {
        match id.map(|id| &mut self.nodes[id].data) {
            Some(NodeData::Text(text)) => Some(text),
            _ => None,
        }
    }
}

impl TreeSink for ArenaDom {
    type Handle = NodeId;

    fn create_element(
        &mut self,
        namespace: Namespace,
        local_name: &Atom,
        attributes: &Attributes,
        form: Option<&NodeId>,
        _intended_parent: &NodeId,
    ) -> NodeId {
        let template_contents = (namespace == Namespace::Html && local_name == "template")
            .then(|| self.new_node(NodeData::TemplateContents));
        let element = self.new_node(NodeData::Element(ElementData {
            namespace,
            local_name: local_name.clone(),
            attributes: attributes.clone(),
            template_contents,
            form_owner: form.copied(),
        }));
        if let Some(contents) = template_contents {
            self.nodes[contents].parent = Some(element);
        }
        element
    }

    fn create_html_root(&mut self, attributes: &Attributes) -> NodeId {
        let root = self.new_node(NodeData::Element(ElementData {
            namespace: Namespace::Html,
            local_name: Atom::from_static("html"),
            attributes: attributes.clone(),
            template_contents: None,
            form_owner: None,
        }));
        self.append(Self::DOCUMENT, root);
        root
    }

    fn append_element(&mut self, child: &NodeId, parent: &NodeId) {
        self.append(*parent, *child);
    }

    fn append_children_to_new_parent(&mut self, old_parent: &NodeId, new_parent: &NodeId) {
        let children = std::mem::take(&mut self.nodes[*old_parent].children);
        for child in children {
            self.nodes[child].parent = None;
            self.append(*new_parent, child);
        }
    }

    fn detach_from_parent(&mut self, node: &NodeId) {
        self.detach(*node);
    }

    fn insert_foster_parented_child(&mut self, child: &NodeId, table: &NodeId, stack_parent: &NodeId) {
        if self.nodes[*table].parent.is_some() {
            self.insert_before(*table, *child);
        } else {
            self.append(*stack_parent, *child);
        }
    }

    fn insert_foster_parented_characters(&mut self, text: &str, table: &NodeId, stack_parent: &NodeId) {
        let Some(parent) = self.nodes[*table].parent else {
            self.append_characters(stack_parent, text);
            return;
        };

        let siblings = &self.nodes[parent].children;
        let previous = siblings
            .iter()
            .position(|&candidate| candidate == *table)
            .and_then(|index| index.checked_sub(1))
            .map(|index| siblings[index]);
        if let Some(existing) = self.text_node(previous) {
            existing.push_str(text);
            return;
        }

        let node = self.new_node(NodeData::Text(text.to_owned()));
        self.insert_before(*table, node);
    }

    fn append_characters(&mut self, parent: &NodeId, text: &str) {
        let parent = self.container(*parent);
        let last = self.nodes[parent].children.last().copied();
        if let Some(existing) = self.text_node(last) {
            existing.push_str(text);
            return;
        }
        let node = self.new_node(NodeData::Text(text.to_owned()));
        self.append(parent, node);
    }

    fn append_comment(&mut self, parent: &NodeId, text: &str) {
        let node = self.new_node(NodeData::Comment(text.to_owned()));
        self.append(*parent, node);
    }

    fn append_comment_to_document(&mut self, text: &str) {
        self.append_comment(&Self::DOCUMENT, text);
    }

    fn append_doctype_to_document(
        &mut self,
        name: Option<&str>,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) {
        let node = self.new_node(NodeData::Doctype {
            name: name.unwrap_or_default().to_owned(),
            public_id: public_id.map(str::to_owned),
            system_id: system_id.map(str::to_owned),
        });
        self.append(Self::DOCUMENT, node);
    }

    fn add_attributes_to_element(&mut self, element: &NodeId, attributes: &Attributes) {
        if let NodeData::Element(data) = &mut self.nodes[*element].data {
            let missing: Vec<_> = data.attributes.missing_from(attributes).cloned().collect();
            for attribute in missing {
                data.attributes.push(attribute);
            }
        }
    }

    fn same_node(&self, a: &NodeId, b: &NodeId) -> bool {
        a == b
    }

    fn document_mode(&mut self, mode: DocumentMode, _public_id: Option<&str>, _system_id: Option<&str>) {
        self.document_mode = mode;
    }

    fn element_pushed(&mut self, _namespace: Namespace, _name: &Atom, _node: &NodeId) {
        self.pushed += 1;
    }

    fn element_popped(&mut self, _namespace: Namespace, _name: &Atom, _node: &NodeId) {
        self.popped += 1;
    }

    fn parse_error(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    fn warning(&mut self, warning: ParseWarning) {
        self.warnings.push(warning);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn appending_to_a_template_fills_its_contents() {
        let mut dom = ArenaDom::new();
        let root = dom.create_html_root(&Attributes::new());
        let template = dom.create_element(
            Namespace::Html,
            &Atom::from_static("template"),
            &Attributes::new(),
            None,
            &root,
        );
        dom.append_element(&template, &root);
        dom.append_characters(&template, "a");
        dom.append_characters(&template, "b");

        let contents = dom.element(template).and_then(|e| e.template_contents);
        assert!(dom.children(template).is_empty());
        let contents = contents.unwrap();
        assert_eq!(dom.children(contents).len(), 1);
        assert_eq!(
            dom.node(dom.children(contents)[0]).data,
            NodeData::Text("ab".to_owned())
        );
    }

    #[test]
    fn foster_parented_text_merges_before_the_table() {
        let mut dom = ArenaDom::new();
        let root = dom.create_html_root(&Attributes::new());
        let table = dom.create_element(
            Namespace::Html,
            &Atom::from_static("table"),
            &Attributes::new(),
            None,
            &root,
        );
        dom.append_element(&table, &root);
        dom.insert_foster_parented_characters("x", &table, &root);
        dom.insert_foster_parented_characters("y", &table, &root);

        assert_eq!(dom.children(root).len(), 2);
        assert_eq!(dom.node(dom.children(root)[0]).data, NodeData::Text("xy".to_owned()));
        assert_eq!(dom.children(root)[1], table);
    }

    #[test]
    fn added_attributes_keep_existing_values() {
        let mut dom = ArenaDom::new();
        let root = dom.create_html_root(&[("lang", "en")].into_iter().collect());
        dom.add_attributes_to_element(&root, &[("lang", "fr"), ("dir", "rtl")].into_iter().collect());

        let attributes = &dom.element(root).unwrap().attributes;
        assert_eq!(attributes.get("lang"), Some("en"));
        assert_eq!(attributes.get("dir"), Some("rtl"));
    }
}
