//! Tree presentation of the linked side for many-to-many setups.
//!
//! Each linked target feature becomes a [`FeatureTreeRow`] whose leaf
//! is the [`FeatureItem`] itself and whose single child, present only
//! when a join relation is configured, is the join-store row backing
//! the link. For persisted links the child is the stored join row; for
//! pending links it is synthesized from the current key values so the
//! user can inspect what a commit would write.

use tracing::warn;

use crate::feature::{Feature, FeatureId};
use crate::item::{FeatureItem, LinkState};
use crate::relation::{join_records, Relation};

/// A node of the linked-features tree.
#[derive(Clone, Debug)]
pub enum FeatureNode {
    /// A linked (or pending) target feature.
    Leaf(FeatureItem),
    /// The join-store row backing the parent leaf.
    JoinChild {
        feature: Feature,
        parent_id: FeatureId,
        /// False when the row is synthesized for a pending link and
        /// does not exist in the join store yet.
        persisted: bool,
    },
}

/// One top-level row of the tree with its children.
#[derive(Clone, Debug)]
pub struct FeatureTreeRow {
    pub node: FeatureNode,
    pub children: Vec<FeatureNode>,
}

/// Build the tree for the linked collection's items.
///
/// `base` relates the join store to `parent`, `nm` relates it to the
/// target layer. Without an `nm` relation every row is a bare leaf.
pub fn build_feature_tree(
    items: &[FeatureItem],
    base: &Relation,
    nm: Option<&Relation>,
    parent: &Feature,
) -> Vec<FeatureTreeRow> {
    items
        .iter()
        .map(|item| FeatureTreeRow {
            node: FeatureNode::Leaf(item.clone()),
            children: match nm {
                Some(nm) => join_child(item, base, nm, parent).into_iter().collect(),
                None => Vec::new(),
            },
        })
        .collect()
}

fn join_child(
    item: &FeatureItem,
    base: &Relation,
    nm: &Relation,
    parent: &Feature,
) -> Option<FeatureNode> {
    let target = item.feature();
    match item.state() {
        LinkState::Linked | LinkState::ToBeUnlinked => {
            let rows = nm.related_features(target);
            // Several parents can share a target; prefer the join row
            // belonging to the edited parent.
            let row = rows
                .iter()
                .find(|row| {
                    base.field_pairs()
                        .iter()
                        .all(|(join_field, parent_field)| {
                            row.attribute(join_field) == parent.attribute(parent_field)
                        })
                })
                .or_else(|| rows.first());
            match row {
                Some(row) => Some(FeatureNode::JoinChild {
                    feature: row.clone(),
                    parent_id: target.id(),
                    persisted: true,
                }),
                None => {
                    warn!(
                        feature_id = target.id(),
                        "no join row found for linked feature"
                    );
                    None
                }
            }
        }
        LinkState::ToBeLinked => {
            let record = join_records(base, nm, parent, std::slice::from_ref(target))
                .into_iter()
                .next()?;
            Some(FeatureNode::JoinChild {
                feature: Feature::new(0, record),
                parent_id: target.id(),
                persisted: false,
            })
        }
        LinkState::Unlinked => None,
    }
}
