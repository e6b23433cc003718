// src/sanitizer/tree.rs

use html5ever::{ParseOpts, parse_document, tendril::TendrilSink, tree_builder::QuirksMode};
use markup5ever_rcdom::{Handle, NodeData as DomData, RcDom};

const HTML_NS: &str = "http://www.w3.org/1999/xhtml";
const SVG_NS: &str = "http://www.w3.org/2000/svg";
const MATHML_NS: &str = "http://www.w3.org/1998/Math/MathML";

/// Index of a node inside its [`Tree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Html,
    Svg,
    MathMl,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// `<!DOCTYPE>` token. Missing identifiers are empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Doctype {
    pub name: String,
    pub public_id: String,
    pub system_id: String,
}

impl Doctype {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Document { doctype: Option<Doctype> },
    Element {
        name: String,
        namespace: Namespace,
        attrs: Vec<Attribute>,
    },
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub data: NodeData,
    pub children: Vec<NodeId>,
}

/// Arena-backed document. Children are index lists, so splicing a subtree
/// into a grandparent is a `Vec` operation rather than pointer surgery.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Tree {
    /// Creates a tree holding only an empty document node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                data: NodeData::Document { doctype: None },
                children: Vec::new(),
            }],
            root: NodeId(0),
        }
    }

    /// Parses a complete HTML document with html5ever's error-tolerant
    /// tree builder.
    pub fn parse(html: &str) -> Self {
        let dom = parse_document(RcDom::default(), ParseOpts::default()).one(html);
        Self::from_dom(&dom)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Allocates a detached node.
    pub fn alloc(&mut self, data: NodeData) -> NodeId {
        self.nodes.push(Node {
            data,
            children: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    pub fn append(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = self.alloc(data);
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Pre-order list of the nodes reachable from the root.
    pub fn descendants(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.node(id).children.iter().rev().copied());
        }
        out
    }

    /// Copies an rcdom into the arena with an explicit stack so adversarially
    /// deep markup cannot exhaust the call stack.
    fn from_dom(dom: &RcDom) -> Self {
        let mut tree = Tree::new();
        let root = tree.root;

        let mut stack: Vec<(Handle, NodeId)> = dom
            .document
            .children
            .borrow()
            .iter()
            .rev()
            .map(|child| (child.clone(), root))
            .collect();

        while let Some((handle, parent)) = stack.pop() {
            let data = match handle.data {
                DomData::Doctype {
                    ref name,
                    ref public_id,
                    ref system_id,
                } => {
                    let token = Doctype {
                        name: name.to_string(),
                        public_id: public_id.to_string(),
                        system_id: system_id.to_string(),
                    };
                    if let NodeData::Document { doctype } = &mut tree.node_mut(root).data {
                        *doctype = keep_doctype(token, dom.quirks_mode);
                    }
                    continue;
                }
                DomData::Text { ref contents } => NodeData::Text(contents.borrow().to_string()),
                DomData::Comment { ref contents } => NodeData::Comment(contents.to_string()),
                // Template contents live in a separate fragment and are never
                // carried over; `template` is not renderable content.
                DomData::Element {
                    ref name,
                    ref attrs,
                    ..
                } => NodeData::Element {
                    name: name.local.to_string(),
                    namespace: namespace_of(&name.ns),
                    attrs: attrs
                        .borrow()
                        .iter()
                        .map(|attr| Attribute {
                            name: match attr.name.prefix {
                                Some(ref prefix) => format!("{}:{}", prefix, attr.name.local),
                                None => attr.name.local.to_string(),
                            },
                            value: attr.value.to_string(),
                        })
                        .collect(),
                },
                // Never produced by the HTML parser; nothing to keep.
                DomData::Document | DomData::ProcessingInstruction { .. } => continue,
            };

            let id = tree.append(parent, data);
            stack.extend(
                handle
                    .children
                    .borrow()
                    .iter()
                    .rev()
                    .map(|child| (child.clone(), id)),
            );
        }

        tree
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

/// A bare `<!DOCTYPE html>` that still put the parser in quirks mode was
/// malformed (force-quirks). Written back out it would select no-quirks, so it
/// is dropped: a document without a doctype re-parses in quirks mode.
fn keep_doctype(doctype: Doctype, mode: QuirksMode) -> Option<Doctype> {
    let bare_html = doctype.name.eq_ignore_ascii_case("html")
        && doctype.public_id.is_empty()
        && doctype.system_id.is_empty();
    if bare_html && matches!(mode, QuirksMode::Quirks) {
        None
    } else {
        Some(doctype)
    }
}

fn namespace_of(ns: &str) -> Namespace {
    match ns {
        HTML_NS => Namespace::Html,
        SVG_NS => Namespace::Svg,
        MATHML_NS => Namespace::MathMl,
        _ => Namespace::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element_names(tree: &Tree) -> Vec<String> {
        tree.descendants()
            .into_iter()
            .filter_map(|id| match &tree.node(id).data {
                NodeData::Element { name, .. } => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn parse_builds_full_document() {
        let tree = Tree::parse("<p>hi</p>");
        assert_eq!(element_names(&tree), ["html", "head", "body", "p"]);
    }

    #[test]
    fn parse_records_doctype() {
        let tree = Tree::parse("<!DOCTYPE html><title>t</title>");
        assert_eq!(
            tree.node(tree.root()).data,
            NodeData::Document {
                doctype: Some(Doctype::new("html"))
            }
        );
    }

    #[test]
    fn parse_keeps_doctype_identifiers() {
        let tree = Tree::parse(
            r#"<!DOCTYPE html PUBLIC "-//W3C//DTD HTML 4.01//EN" "http://www.w3.org/TR/html4/strict.dtd"><p>x"#,
        );
        let NodeData::Document { doctype: Some(doctype) } = &tree.node(tree.root()).data else {
            panic!("doctype missing");
        };
        assert_eq!(doctype.name, "html");
        assert_eq!(doctype.public_id, "-//W3C//DTD HTML 4.01//EN");
        assert_eq!(doctype.system_id, "http://www.w3.org/TR/html4/strict.dtd");
    }

    #[test]
    fn malformed_bare_doctype_is_dropped() {
        let tree = Tree::parse("<!DOCTYPE html bogus><p>x");
        assert_eq!(
            tree.node(tree.root()).data,
            NodeData::Document { doctype: None }
        );
    }

    #[test]
    fn parse_keeps_attribute_order_and_values() {
        let tree = Tree::parse(r#"<a title="T" href="/x?a=%20b">x</a>"#);
        let attrs = tree
            .descendants()
            .into_iter()
            .find_map(|id| match &tree.node(id).data {
                NodeData::Element { name, attrs, .. } if name == "a" => Some(attrs.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(attrs[0].name, "title");
        assert_eq!(attrs[1].name, "href");
        assert_eq!(attrs[1].value, "/x?a=%20b");
    }

    #[test]
    fn parse_tags_foreign_namespaces() {
        let tree = Tree::parse("<svg><circle/></svg><math><mi>x</mi></math>");
        let namespaces: Vec<(String, Namespace)> = tree
            .descendants()
            .into_iter()
            .filter_map(|id| match &tree.node(id).data {
                NodeData::Element {
                    name, namespace, ..
                } => Some((name.clone(), *namespace)),
                _ => None,
            })
            .collect();
        assert!(namespaces.contains(&("svg".to_string(), Namespace::Svg)));
        assert!(namespaces.contains(&("circle".to_string(), Namespace::Svg)));
        assert!(namespaces.contains(&("mi".to_string(), Namespace::MathMl)));
        assert!(namespaces.contains(&("body".to_string(), Namespace::Html)));
    }

    #[test]
    fn deep_nesting_does_not_overflow() {
        let depth = 10_000;
        let html = "<div>".repeat(depth);
        let tree = Tree::parse(&html);
        assert_eq!(element_names(&tree).len(), depth + 3);
    }
}
