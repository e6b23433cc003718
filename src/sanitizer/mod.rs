// src/sanitizer/mod.rs

//! Whitelist HTML sanitizer.
//!
//! Untrusted markup is parsed by html5ever, copied into an arena tree,
//! filtered against a [`Policy`], optionally given `rel="nofollow"` on links,
//! and serialized back to a canonical string.

pub mod filter;
pub mod links;
pub mod policy;
pub mod serialize;
pub mod tree;

use std::str::Utf8Error;

use thiserror::Error;

pub use policy::{Disposition, Policy, PolicyBuilder, PolicySnapshot};
pub use tree::Tree;

/// Upper bound on sanitize passes. After the first pass only whitelisted
/// elements remain, so the second one has nothing left to unwrap.
const MAX_PASSES: usize = 3;

#[derive(Error, Debug)]
pub enum SanitizeError {
    /// Input bytes are not valid UTF-8.
    #[error("input is not valid UTF-8: {0}")]
    Decoding(#[from] Utf8Error),

    /// The policy cannot support the requested passes. Raised at startup only.
    #[error("invalid sanitizer configuration: {0}")]
    Configuration(String),
}

/// How the caller wants to see a stored page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Rendered in the browser; links get `rel="nofollow"`.
    Page,
    /// Same markup shown as text for remixing; links are left as written.
    Source,
}

impl View {
    pub fn nofollow(self) -> bool {
        matches!(self, View::Page)
    }

    pub fn content_kind(self) -> ContentKind {
        match self {
            View::Page => ContentKind::Html,
            View::Source => ContentKind::PlainText,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Html,
    PlainText,
}

impl ContentKind {
    pub fn mime_type(self) -> &'static str {
        match self {
            ContentKind::Html => "text/html; charset=utf-8",
            ContentKind::PlainText => "text/plain; charset=utf-8",
        }
    }
}

/// Sanitized markup together with how it should be labelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sanitized {
    pub body: String,
    pub kind: ContentKind,
}

/// Entry point: holds the immutable policy and runs the passes.
///
/// Cheap to share behind an `Arc`; every call works on its own tree.
#[derive(Debug, Clone)]
pub struct Sanitizer {
    policy: Policy,
}

impl Sanitizer {
    /// Fails if the link pass could write an attribute the policy forbids.
    pub fn new(policy: Policy) -> Result<Self, SanitizeError> {
        links::validate(&policy)?;
        Ok(Self { policy })
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Parses, filters and re-serializes `raw`. Broken markup is repaired the
    /// way a browser would; only undecodable bytes are an error.
    ///
    /// Unwrapping can leave nesting the parser never builds itself (a `p`
    /// inside a `p` once a `button` between them is gone). When that happened
    /// the output is run through again, so what is returned re-parses to the
    /// tree it was written from.
    pub fn sanitize(&self, raw: &[u8], nofollow: bool) -> Result<String, SanitizeError> {
        let mut html = std::str::from_utf8(raw)?.to_owned();

        for pass in 1..=MAX_PASSES {
            let mut tree = Tree::parse(&html);
            let stats = filter::filter(&mut tree, &self.policy);
            let links = if nofollow {
                links::apply_nofollow(&mut tree, &self.policy)
            } else {
                0
            };
            html = serialize::serialize(&tree);

            tracing::debug!(
                pass,
                input_bytes = raw.len(),
                output_bytes = html.len(),
                removed = stats.removed,
                unwrapped = stats.unwrapped,
                dropped_attributes = stats.dropped_attributes,
                dropped_comments = stats.dropped_comments,
                nofollow_links = links,
                "sanitized html"
            );

            if stats.unwrapped == 0 {
                break;
            }
        }

        Ok(html)
    }

    pub fn render(&self, raw: &[u8], view: View) -> Result<Sanitized, SanitizeError> {
        Ok(Sanitized {
            body: self.sanitize(raw, view.nofollow())?,
            kind: view.content_kind(),
        })
    }
}
