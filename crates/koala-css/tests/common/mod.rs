//! Minimal arena-backed DOM fixture implementing `NodeHandler`, shared by
//! the integration test binaries. The real DOM is out of scope for this
//! crate, so every test that needs tree context builds one of these.

use koala_css::NodeHandler;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct Element {
    pub tag: String,
    pub attributes: HashMap<String, String>,
    pub disabled: bool,
}

#[derive(Debug, Clone)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Default)]
pub struct Tree {
    nodes: Vec<Node>,
    parent: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    root: Option<usize>,
}

#[allow(dead_code)]
impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_element(&mut self, parent: Option<usize>, tag: &str) -> usize {
        self.add(
            parent,
            Node::Element(Element {
                tag: tag.to_string(),
                attributes: HashMap::new(),
                disabled: false,
            }),
        )
    }

    pub fn add_text(&mut self, parent: Option<usize>, text: &str) -> usize {
        self.add(parent, Node::Text(text.to_string()))
    }

    fn add(&mut self, parent: Option<usize>, node: Node) -> usize {
        let id = self.nodes.len();
        self.nodes.push(node);
        self.parent.push(parent);
        self.children.push(Vec::new());
        if let Some(p) = parent {
            self.children[p].push(id);
        } else {
            self.root = Some(id);
        }
        id
    }

    pub fn set_attr(&mut self, node: usize, key: &str, value: &str) {
        if let Node::Element(el) = &mut self.nodes[node] {
            let _ = el.attributes.insert(key.to_string(), value.to_string());
        }
    }

    pub fn set_disabled(&mut self, node: usize, disabled: bool) {
        if let Node::Element(el) = &mut self.nodes[node] {
            el.disabled = disabled;
        }
    }
}

impl NodeHandler for Tree {
    type Node = usize;

    fn tag_name(&self, node: usize) -> Option<&str> {
        match &self.nodes[node] {
            Node::Element(el) => Some(el.tag.as_str()),
            Node::Text(_) => None,
        }
    }

    fn id(&self, node: usize) -> Option<&str> {
        self.attribute(node, "id")
    }

    fn attribute(&self, node: usize, attr: &str) -> Option<&str> {
        match &self.nodes[node] {
            Node::Element(el) => el.attributes.get(attr).map(String::as_str),
            Node::Text(_) => None,
        }
    }

    fn classes(&self, node: usize) -> Vec<&str> {
        self.attribute(node, "class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    fn parent(&self, node: usize) -> Option<usize> {
        self.parent[node]
    }

    fn children(&self, node: usize) -> Vec<usize> {
        self.children[node].clone()
    }

    fn is_element(&self, node: usize) -> bool {
        matches!(self.nodes[node], Node::Element(_))
    }

    fn is_root(&self, node: usize) -> bool {
        self.root == Some(node)
    }

    fn has_no_content(&self, node: usize) -> bool {
        self.children[node].iter().all(|&c| match &self.nodes[c] {
            Node::Text(t) => t.trim().is_empty(),
            Node::Element(_) => false,
        })
    }

    fn is_disabled(&self, node: usize) -> bool {
        matches!(&self.nodes[node], Node::Element(el) if el.disabled)
    }

    fn preceding_siblings(&self, node: usize) -> Vec<usize> {
        let Some(parent) = self.parent[node] else {
            return Vec::new();
        };
        let siblings = &self.children[parent];
        let Some(pos) = siblings.iter().position(|&n| n == node) else {
            return Vec::new();
        };
        siblings[..pos].iter().rev().copied().collect()
    }

    fn following_siblings(&self, node: usize) -> Vec<usize> {
        let Some(parent) = self.parent[node] else {
            return Vec::new();
        };
        let siblings = &self.children[parent];
        let Some(pos) = siblings.iter().position(|&n| n == node) else {
            return Vec::new();
        };
        siblings[pos + 1..].to_vec()
    }
}
