// src/sanitizer/policy.rs

use std::{
    borrow::Cow,
    collections::{BTreeMap, BTreeSet},
    sync::OnceLock,
};

use regex::Regex;
use serde::Serialize;

use super::{SanitizeError, tree::Namespace};

/// What the filter does with an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Whitelisted: keep the element, filter its attributes.
    Keep,
    /// Not whitelisted: drop the tag, splice its children into the parent.
    Unwrap,
    /// Not whitelisted and carries a non-rendering payload: drop the subtree.
    Remove,
}

/// Immutable whitelist driving both enforcement and the published config.
///
/// Construct it with [`PolicyBuilder`] (or [`Policy::default`] for the
/// standard whitelist). Names are stored lower-case; all lookups normalize.
#[derive(Debug, Clone)]
pub struct Policy {
    elements: BTreeMap<String, BTreeSet<String>>,
    global_attributes: BTreeSet<String>,
    removed_elements: BTreeSet<String>,
    url_attributes: BTreeSet<String>,
    url_schemes: BTreeSet<String>,
    link_elements: BTreeSet<String>,
}

/// Machine-readable view of the whitelist, served at `/api/config`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicySnapshot {
    pub allowed_elements: Vec<String>,
    pub allowed_attributes: BTreeMap<String, Vec<String>>,
}

/// Lower-cases ASCII without allocating when the name already is.
fn normalize(name: &str) -> Cow<'_, str> {
    if name.bytes().any(|b| b.is_ascii_uppercase()) {
        Cow::Owned(name.to_ascii_lowercase())
    } else {
        Cow::Borrowed(name)
    }
}

/// Matches a leading URL scheme once blanks have been stripped.
fn scheme_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([a-zA-Z][a-zA-Z0-9+.\-]*):").expect("valid regex"))
}

/// Characters browsers skip while reading a URL scheme.
fn url_blank_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[\u{0000}-\u{0020}\u{007F}\u{00A0}\u{1680}\u{180E}\u{2000}-\u{2029}\u{205F}\u{3000}\u{FEFF}]")
            .expect("valid regex")
    })
}

impl Policy {
    pub fn builder() -> PolicyBuilder {
        PolicyBuilder::default()
    }

    pub fn is_element_allowed(&self, name: &str) -> bool {
        self.elements.contains_key(normalize(name).as_ref())
    }

    /// True only for a whitelisted element and an attribute listed for it
    /// (or globally).
    pub fn is_attribute_allowed(&self, element: &str, attr: &str) -> bool {
        let attr = normalize(attr);
        match self.elements.get(normalize(element).as_ref()) {
            Some(attrs) => {
                attrs.contains(attr.as_ref()) || self.global_attributes.contains(attr.as_ref())
            }
            None => false,
        }
    }

    /// Decides the fate of an element. Nothing outside the HTML namespace is
    /// ever kept.
    pub fn disposition(&self, name: &str, namespace: Namespace) -> Disposition {
        let name = normalize(name);
        if namespace == Namespace::Html && self.elements.contains_key(name.as_ref()) {
            Disposition::Keep
        } else if self.removed_elements.contains(name.as_ref()) {
            Disposition::Remove
        } else {
            Disposition::Unwrap
        }
    }

    pub fn is_url_attribute(&self, attr: &str) -> bool {
        self.url_attributes.contains(normalize(attr).as_ref())
    }

    /// Relative URLs pass; absolute ones need a permitted scheme.
    pub fn is_url_allowed(&self, value: &str) -> bool {
        let compact = url_blank_regex().replace_all(value, "");
        match scheme_regex().captures(&compact) {
            Some(caps) => self.url_schemes.contains(&caps[1].to_ascii_lowercase()),
            None => true,
        }
    }

    pub fn is_link_element(&self, name: &str) -> bool {
        self.link_elements.contains(normalize(name).as_ref())
    }

    pub fn link_elements(&self) -> impl Iterator<Item = &str> {
        self.link_elements.iter().map(String::as_str)
    }

    /// Exact enumeration of what is enforced, global attributes folded into
    /// every element.
    pub fn snapshot(&self) -> PolicySnapshot {
        let allowed_attributes: BTreeMap<String, Vec<String>> = self
            .elements
            .iter()
            .map(|(element, attrs)| {
                let merged: BTreeSet<&String> =
                    attrs.iter().chain(self.global_attributes.iter()).collect();
                (element.clone(), merged.into_iter().cloned().collect::<Vec<_>>())
            })
            .collect();

        PolicySnapshot {
            allowed_elements: self.elements.keys().cloned().collect(),
            allowed_attributes,
        }
    }
}

impl Default for Policy {
    fn default() -> Self {
        let mut builder = Policy::builder();
        builder
            .allow_global_attributes(&["dir", "lang", "title"])
            // document structure
            .allow_element("html", &[])
            .allow_element("head", &[])
            .allow_element("title", &[])
            .allow_element("meta", &["charset"])
            .allow_element("body", &[])
            // sections and grouping
            .allow_elements(
                &[
                    "address", "article", "aside", "div", "figcaption", "figure", "footer",
                    "h1", "h2", "h3", "h4", "h5", "h6", "header", "hgroup", "hr", "main", "nav",
                    "p", "pre", "section",
                ],
                &[],
            )
            .allow_element("blockquote", &["cite"])
            .allow_element("ol", &["reversed", "start", "type"])
            .allow_element("ul", &[])
            .allow_element("li", &["value"])
            .allow_element("dl", &[])
            .allow_element("dt", &[])
            .allow_element("dd", &[])
            .allow_element("details", &["open"])
            .allow_element("summary", &[])
            // text-level
            .allow_element("a", &["href", "hreflang", "rel"])
            .allow_elements(
                &[
                    "abbr", "b", "bdi", "br", "cite", "code", "dfn", "em", "i", "kbd", "mark",
                    "rp", "rt", "ruby", "s", "samp", "small", "span", "strong", "sub", "sup",
                    "u", "var", "wbr",
                ],
                &[],
            )
            .allow_element("bdo", &["dir"])
            .allow_element("q", &["cite"])
            .allow_element("time", &["datetime"])
            .allow_element("del", &["cite", "datetime"])
            .allow_element("ins", &["cite", "datetime"])
            .allow_element("img", &["alt", "height", "src", "width"])
            // tables
            .allow_element("table", &["summary"])
            .allow_element("caption", &[])
            .allow_element("colgroup", &["span"])
            .allow_element("col", &["span"])
            .allow_element("thead", &[])
            .allow_element("tbody", &[])
            .allow_element("tfoot", &[])
            .allow_element("tr", &[])
            .allow_element("td", &["colspan", "headers", "rowspan"])
            .allow_element("th", &["abbr", "colspan", "headers", "rowspan", "scope"])
            .remove_elements(&[
                "applet", "embed", "frame", "frameset", "iframe", "math", "noembed", "noframes",
                "noscript", "object", "param", "plaintext", "script", "style", "svg", "template",
                "xmp",
            ])
            .url_attributes(&["action", "background", "cite", "formaction", "href", "longdesc", "poster", "src"])
            .url_schemes(&["ftp", "http", "https", "mailto", "tel"])
            .link_elements(&["a"]);

        // The literal tables above never overlap, so this cannot fail.
        match builder.build() {
            Ok(policy) => policy,
            Err(e) => unreachable!("built-in policy is inconsistent: {e}"),
        }
    }
}

/// Mutable staging area for a [`Policy`].
#[derive(Debug, Default, Clone)]
pub struct PolicyBuilder {
    elements: BTreeMap<String, BTreeSet<String>>,
    global_attributes: BTreeSet<String>,
    removed_elements: BTreeSet<String>,
    url_attributes: BTreeSet<String>,
    url_schemes: BTreeSet<String>,
    link_elements: BTreeSet<String>,
}

fn lowered<'a>(names: &'a [&'a str]) -> impl Iterator<Item = String> + 'a {
    names.iter().map(|n| n.to_ascii_lowercase())
}

impl PolicyBuilder {
    /// Whitelists `name`; repeated calls merge attribute sets.
    pub fn allow_element(&mut self, name: &str, attrs: &[&str]) -> &mut Self {
        self.elements
            .entry(name.to_ascii_lowercase())
            .or_default()
            .extend(lowered(attrs));
        self
    }

    pub fn allow_elements(&mut self, names: &[&str], attrs: &[&str]) -> &mut Self {
        for name in names {
            self.allow_element(name, attrs);
        }
        self
    }

    pub fn allow_global_attributes(&mut self, attrs: &[&str]) -> &mut Self {
        self.global_attributes.extend(lowered(attrs));
        self
    }

    pub fn remove_elements(&mut self, names: &[&str]) -> &mut Self {
        self.removed_elements.extend(lowered(names));
        self
    }

    pub fn url_attributes(&mut self, attrs: &[&str]) -> &mut Self {
        self.url_attributes.extend(lowered(attrs));
        self
    }

    pub fn url_schemes(&mut self, schemes: &[&str]) -> &mut Self {
        self.url_schemes.extend(lowered(schemes));
        self
    }

    pub fn link_elements(&mut self, names: &[&str]) -> &mut Self {
        self.link_elements.extend(lowered(names));
        self
    }

    pub fn build(&self) -> Result<Policy, SanitizeError> {
        if let Some(name) = self
            .removed_elements
            .iter()
            .find(|name| self.elements.contains_key(*name))
        {
            return Err(SanitizeError::Configuration(format!(
                "element '{name}' is both allowed and marked for removal"
            )));
        }

        Ok(Policy {
            elements: self.elements.clone(),
            global_attributes: self.global_attributes.clone(),
            removed_elements: self.removed_elements.clone(),
            url_attributes: self.url_attributes.clone(),
            url_schemes: self.url_schemes.clone(),
            link_elements: self.link_elements.clone(),
        })
    }
}
