// src/sanitizer/filter.rs

use std::mem;

use super::{
    policy::{Disposition, Policy},
    tree::{NodeData, NodeId, Tree},
};

/// Counters reported by [`filter`] for logging.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FilterStats {
    pub removed: usize,
    pub unwrapped: usize,
    pub dropped_attributes: usize,
    pub dropped_comments: usize,
}

/// What happens to one child while its parent's list is rebuilt.
enum Decision {
    Keep { descend: bool },
    Drop,
    Unwrap,
}

/// Strips everything the policy does not whitelist, in place.
///
/// Works parent by parent with an explicit stack: each parent's child list is
/// rebuilt from a queue, and the children of an unwrapped element are pushed
/// back onto that same queue so they are judged in the parent's context,
/// exactly once.
pub fn filter(tree: &mut Tree, policy: &Policy) -> FilterStats {
    let mut stats = FilterStats::default();
    let mut parents = vec![tree.root()];

    while let Some(parent) = parents.pop() {
        let original = mem::take(&mut tree.node_mut(parent).children);
        let mut queue: Vec<NodeId> = original.into_iter().rev().collect();
        let mut kept = Vec::with_capacity(queue.len());

        while let Some(child) = queue.pop() {
            match decide(tree, policy, child, &mut stats) {
                Decision::Keep { descend } => {
                    kept.push(child);
                    if descend {
                        parents.push(child);
                    }
                }
                Decision::Drop => {}
                Decision::Unwrap => {
                    let grandchildren = mem::take(&mut tree.node_mut(child).children);
                    queue.extend(grandchildren.into_iter().rev());
                }
            }
        }

        tree.node_mut(parent).children = kept;
    }

    stats
}

fn decide(tree: &mut Tree, policy: &Policy, id: NodeId, stats: &mut FilterStats) -> Decision {
    match &mut tree.node_mut(id).data {
        NodeData::Text(_) => Decision::Keep { descend: false },
        NodeData::Comment(_) => {
            stats.dropped_comments += 1;
            Decision::Drop
        }
        // Only ever the root; never a child.
        NodeData::Document { .. } => Decision::Drop,
        NodeData::Element {
            name,
            namespace,
            attrs,
        } => match policy.disposition(name, *namespace) {
            Disposition::Keep => {
                let before = attrs.len();
                attrs.retain(|attr| {
                    policy.is_attribute_allowed(name, &attr.name)
                        && (!policy.is_url_attribute(&attr.name)
                            || policy.is_url_allowed(&attr.value))
                });
                stats.dropped_attributes += before - attrs.len();
                Decision::Keep { descend: true }
            }
            Disposition::Unwrap => {
                stats.unwrapped += 1;
                Decision::Unwrap
            }
            Disposition::Remove => {
                stats.removed += 1;
                Decision::Drop
            }
        },
    }
}
