// src/sanitizer/serialize.rs

use super::tree::{Doctype, Namespace, NodeData, NodeId, Tree};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "bgsound", "br", "col", "embed", "frame", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

/// Elements whose text children are emitted unescaped.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "iframe", "noembed", "noframes", "noscript", "plaintext", "script", "style", "xmp",
];

/// The parser eats one newline right after these start tags.
const NEWLINE_EATERS: &[&str] = &["listing", "pre", "textarea"];

enum Step {
    Open { id: NodeId, raw_text: bool },
    Close(NodeId),
}

/// Renders the tree as HTML. Identical trees give identical strings: there is
/// no map iteration or other source of nondeterminism.
pub fn serialize(tree: &Tree) -> String {
    let mut out = String::new();
    let mut stack = vec![Step::Open {
        id: tree.root(),
        raw_text: false,
    }];

    while let Some(step) = stack.pop() {
        match step {
            Step::Open { id, raw_text } => {
                let node = tree.node(id);
                match &node.data {
                    NodeData::Document { doctype } => {
                        if let Some(doctype) = doctype {
                            write_doctype(&mut out, doctype);
                        }
                        push_children(&mut stack, &node.children, false);
                    }
                    NodeData::Text(text) => {
                        if raw_text {
                            out.push_str(text);
                        } else {
                            escape_text(&mut out, text);
                        }
                    }
                    NodeData::Comment(text) => {
                        out.push_str("<!--");
                        out.push_str(text);
                        out.push_str("-->");
                    }
                    NodeData::Element {
                        name,
                        namespace,
                        attrs,
                    } => {
                        out.push('<');
                        out.push_str(name);
                        for attr in attrs {
                            out.push(' ');
                            out.push_str(&attr.name);
                            out.push_str("=\"");
                            escape_attribute(&mut out, &attr.value);
                            out.push('"');
                        }
                        out.push('>');

                        let html = *namespace == Namespace::Html;
                        if html && VOID_ELEMENTS.contains(&name.as_str()) {
                            continue;
                        }
                        if html
                            && NEWLINE_EATERS.contains(&name.as_str())
                            && starts_with_newline(tree, &node.children)
                        {
                            out.push('\n');
                        }

                        stack.push(Step::Close(id));
                        let raw = html && RAW_TEXT_ELEMENTS.contains(&name.as_str());
                        push_children(&mut stack, &node.children, raw);
                    }
                }
            }
            Step::Close(id) => {
                if let NodeData::Element { name, .. } = &tree.node(id).data {
                    out.push_str("</");
                    out.push_str(name);
                    out.push('>');
                }
            }
        }
    }

    out
}

/// Public and system identifiers are written back because they select the
/// parser's quirks mode, which changes how the rest of the document nests.
fn write_doctype(out: &mut String, doctype: &Doctype) {
    out.push_str("<!DOCTYPE");
    if !doctype.name.is_empty() {
        out.push(' ');
        out.push_str(&doctype.name);
    }
    if !doctype.public_id.is_empty() {
        out.push_str(" PUBLIC ");
        push_quoted(out, &doctype.public_id);
        if !doctype.system_id.is_empty() {
            out.push(' ');
            push_quoted(out, &doctype.system_id);
        }
    } else if !doctype.system_id.is_empty() {
        out.push_str(" SYSTEM ");
        push_quoted(out, &doctype.system_id);
    }
    out.push('>');
}

/// An identifier never contains both quote characters; it was quoted with
/// the one it lacks.
fn push_quoted(out: &mut String, value: &str) {
    let quote = if value.contains('"') { '\'' } else { '"' };
    out.push(quote);
    out.push_str(value);
    out.push(quote);
}

fn push_children(stack: &mut Vec<Step>, children: &[NodeId], raw_text: bool) {
    stack.extend(
        children
            .iter()
            .rev()
            .map(|&id| Step::Open { id, raw_text }),
    );
}

fn starts_with_newline(tree: &Tree, children: &[NodeId]) -> bool {
    match children.first().map(|&id| &tree.node(id).data) {
        Some(NodeData::Text(text)) => text.starts_with('\n'),
        _ => false,
    }
}

fn escape_text(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn escape_attribute(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sanitizer::tree::Attribute;

    fn element(name: &str, attrs: &[(&str, &str)]) -> NodeData {
        NodeData::Element {
            name: name.to_string(),
            namespace: Namespace::Html,
            attrs: attrs
                .iter()
                .map(|(n, v)| Attribute {
                    name: n.to_string(),
                    value: v.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn round_trips_simple_document() {
        let html = "<!DOCTYPE html><html><head><title>hi</title></head><body>hello.</body></html>";
        assert_eq!(serialize(&Tree::parse(html)), html);
    }

    #[test]
    fn doctype_identifiers_are_written_back() {
        let html = r#"<!DOCTYPE html PUBLIC "-//W3C//DTD HTML 4.01 Transitional//EN"><html><head></head><body></body></html>"#;
        assert_eq!(serialize(&Tree::parse(html)), html);

        let html = r#"<!DOCTYPE html SYSTEM 'about:"legacy"'><html><head></head><body></body></html>"#;
        assert_eq!(serialize(&Tree::parse(html)), html);
    }

    #[test]
    fn void_elements_have_no_end_tag() {
        let mut tree = Tree::new();
        let p = tree.append(tree.root(), element("p", &[]));
        tree.append(p, element("br", &[]));
        tree.append(p, element("img", &[("src", "/a.png")]));
        assert_eq!(serialize(&tree), r#"<p><br><img src="/a.png"></p>"#);
    }

    #[test]
    fn empty_elements_get_explicit_end_tags() {
        let mut tree = Tree::new();
        tree.append(tree.root(), element("div", &[]));
        assert_eq!(serialize(&tree), "<div></div>");
    }

    #[test]
    fn escapes_text_minimally() {
        let mut tree = Tree::new();
        let p = tree.append(tree.root(), element("p", &[]));
        tree.append(p, NodeData::Text("a & b < c > d \"q\" 'r' \u{a0}\u{2026}".to_string()));
        assert_eq!(
            serialize(&tree),
            "<p>a &amp; b &lt; c &gt; d \"q\" 'r' \u{a0}\u{2026}</p>"
        );
    }

    #[test]
    fn attributes_always_use_double_quotes() {
        let tree = Tree::parse(r#"<a title='say "hi"' href=/x?a=1&amp;b=2>x</a>"#);
        let out = serialize(&tree);
        assert!(out.contains(r#"<a title="say &quot;hi&quot;" href="/x?a=1&amp;b=2">x</a>"#));
    }

    #[test]
    fn raw_text_children_are_not_escaped() {
        let mut tree = Tree::new();
        let style = tree.append(tree.root(), element("style", &[]));
        tree.append(style, NodeData::Text("a > b { }".to_string()));
        assert_eq!(serialize(&tree), "<style>a > b { }</style>");
    }

    #[test]
    fn pre_keeps_leading_newline_through_reparse() {
        let html = "<html><head></head><body><pre>\n\nindented</pre></body></html>";
        let once = serialize(&Tree::parse(html));
        assert_eq!(once, html);
        assert_eq!(serialize(&Tree::parse(&once)), once);
    }

    #[test]
    fn deep_trees_serialize_iteratively() {
        let mut tree = Tree::new();
        let mut parent = tree.root();
        for _ in 0..100_000 {
            parent = tree.append(parent, element("b", &[]));
        }
        let out = serialize(&tree);
        assert!(out.starts_with("<b><b>"));
        assert_eq!(out.len(), 100_000 * "<b></b>".len());
    }
}
