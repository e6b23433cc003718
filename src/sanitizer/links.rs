// src/sanitizer/links.rs

use super::{
    SanitizeError,
    policy::Policy,
    tree::{Attribute, NodeData, Tree},
};

const NOFOLLOW: &str = "nofollow";

/// Startup check: the pass may only ever write an attribute the policy
/// already permits on every hyperlink element.
pub fn validate(policy: &Policy) -> Result<(), SanitizeError> {
    for element in policy.link_elements() {
        if !policy.is_element_allowed(element) {
            return Err(SanitizeError::Configuration(format!(
                "link element '{element}' is not whitelisted"
            )));
        }
        if !policy.is_attribute_allowed(element, "rel") {
            return Err(SanitizeError::Configuration(format!(
                "'rel' is not whitelisted on link element '{element}'"
            )));
        }
    }
    Ok(())
}

/// Ensures every hyperlink with an `href` carries the `nofollow` relation.
///
/// Existing `rel` tokens keep their order; `nofollow` is appended only when
/// absent. A brand new `rel` goes after the existing attributes. Returns the
/// number of elements touched.
pub fn apply_nofollow(tree: &mut Tree, policy: &Policy) -> usize {
    let mut touched = 0;

    for id in tree.descendants() {
        let NodeData::Element { name, attrs, .. } = &mut tree.node_mut(id).data else {
            continue;
        };
        if !policy.is_link_element(name) || !attrs.iter().any(|a| a.name == "href") {
            continue;
        }

        match attrs.iter_mut().find(|a| a.name == "rel") {
            Some(rel) => {
                if !has_token(&rel.value, NOFOLLOW) {
                    rel.value = add_token(&rel.value, NOFOLLOW);
                    touched += 1;
                }
            }
            None => {
                attrs.push(Attribute {
                    name: "rel".to_string(),
                    value: NOFOLLOW.to_string(),
                });
                touched += 1;
            }
        }
    }

    touched
}

fn has_token(value: &str, token: &str) -> bool {
    value
        .split_ascii_whitespace()
        .any(|t| t.eq_ignore_ascii_case(token))
}

fn add_token(value: &str, token: &str) -> String {
    let existing = value.trim_end_matches(|c: char| c.is_ascii_whitespace());
    if existing.trim_start().is_empty() {
        token.to_string()
    } else {
        format!("{existing} {token}")
    }
}
