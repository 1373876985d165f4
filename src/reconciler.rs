//! Link reconciliation between the two feature lists.
//!
//! [`LinkReconciler`] owns the editing workflow: it moves items
//! between the unlinked-candidates collection (viewed through its
//! filter) and the linked collection, flipping link states as it goes.
//! Nothing here writes to a store; the accumulated `ToBeLinked` and
//! `ToBeUnlinked` states are the change set a host commits later.
//!
//! Every operation validates first and mutates only when the whole
//! move is allowed, so a rejected request leaves both lists untouched.

use std::rc::Rc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::collection::{CollectionError, FeatureCollection};
use crate::feature::{Feature, FeatureId};
use crate::filter::FeatureCollectionFilter;
use crate::item::{FeatureItem, LinkState};
use crate::store::FeatureStore;

/// How many features may be linked to one parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cardinality {
    OneToMany,
    /// At most one linked feature; enforced before every link.
    OneToOne,
    ManyToMany,
}

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("in one-to-one mode only one feature can be linked")]
    CardinalityViolation,
    #[error(transparent)]
    Collection(#[from] CollectionError),
}

/// Outcome of a map pick, split into features that are already on the
/// linked side (reported back to the user) and ids usable as a map
/// filter on the candidates list.
#[derive(Clone, Debug, Default)]
pub struct PickFeedback {
    /// Display strings of picked features that are already linked.
    pub already_linked: Vec<String>,
    /// Ids of picked features still available for linking.
    pub candidate_ids: Vec<FeatureId>,
}

/// Moves items between the candidates and linked collections.
pub struct LinkReconciler {
    store: Rc<dyn FeatureStore>,
    candidates: Rc<FeatureCollection>,
    candidates_filter: Rc<FeatureCollectionFilter>,
    linked: Rc<FeatureCollection>,
    cardinality: Cardinality,
}

impl LinkReconciler {
    pub fn new(
        store: Rc<dyn FeatureStore>,
        candidates: Rc<FeatureCollection>,
        candidates_filter: Rc<FeatureCollectionFilter>,
        linked: Rc<FeatureCollection>,
        cardinality: Cardinality,
    ) -> Self {
        Self {
            store,
            candidates,
            candidates_filter,
            linked,
            cardinality,
        }
    }

    pub fn candidates(&self) -> &Rc<FeatureCollection> {
        &self.candidates
    }

    pub fn candidates_filter(&self) -> &Rc<FeatureCollectionFilter> {
        &self.candidates_filter
    }

    pub fn linked(&self) -> &Rc<FeatureCollection> {
        &self.linked
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    // ------------------------------------------------------------------
    // Moves
    // ------------------------------------------------------------------

    /// Move the candidates at the given filtered rows to the linked
    /// side. Row indices address the filter proxy, not the source.
    pub fn link_selected(&self, filtered_rows: &[usize]) -> Result<(), LinkError> {
        if filtered_rows.is_empty() {
            return Ok(());
        }
        if self.cardinality == Cardinality::OneToOne
            && (!self.linked.is_empty() || filtered_rows.len() > 1)
        {
            return Err(LinkError::CardinalityViolation);
        }

        let source_rows: Vec<usize> = filtered_rows
            .iter()
            .filter_map(|&row| self.candidates_filter.map_to_source(row))
            .collect();
        let items = self.candidates.take_items(&source_rows)?;
        self.candidates_filter.invalidate();
        self.move_to_linked(items);
        Ok(())
    }

    /// Move the linked items at the given rows back to the candidates.
    pub fn unlink_selected(&self, rows: &[usize]) -> Result<(), LinkError> {
        if rows.is_empty() {
            return Ok(());
        }
        let items = self.linked.take_items(rows)?;
        self.move_to_candidates(items);
        Ok(())
    }

    /// Link every candidate the filter currently shows; with no active
    /// quick or map filter, link the whole candidates list.
    pub fn link_all(&self) -> Result<(), LinkError> {
        use slint::Model;

        if self.cardinality == Cardinality::OneToOne
            && (!self.linked.is_empty() || self.candidates_filter.row_count() > 1)
        {
            return Err(LinkError::CardinalityViolation);
        }

        let items = if self.candidates_filter.filter_active() {
            let source_rows: Vec<usize> = (0..self.candidates_filter.row_count())
                .filter_map(|row| self.candidates_filter.map_to_source(row))
                .collect();
            let items = self.candidates.take_items(&source_rows)?;
            self.candidates_filter.invalidate();
            items
        } else {
            let items = self.candidates.take_all();
            self.candidates_filter.invalidate();
            items
        };
        self.move_to_linked(items);
        Ok(())
    }

    /// Move everything from the linked side back to the candidates.
    pub fn unlink_all(&self) {
        let items = self.linked.take_all();
        self.move_to_candidates(items);
    }

    fn move_to_linked(&self, mut items: Vec<FeatureItem>) {
        if items.is_empty() {
            return;
        }
        for item in &mut items {
            item.set_state(item.state().moved_to_linked_side());
        }
        debug!(count = items.len(), "moved candidates to linked side");
        self.linked.add_items(items);
    }

    fn move_to_candidates(&self, mut items: Vec<FeatureItem>) {
        if items.is_empty() {
            return;
        }
        for item in &mut items {
            item.set_state(item.state().moved_to_unlinked_side());
        }
        debug!(count = items.len(), "moved linked items back to candidates");
        self.candidates.add_items(items);
        self.candidates_filter.invalidate();
    }

    // ------------------------------------------------------------------
    // Change set
    // ------------------------------------------------------------------

    /// Ids whose link would be created by a commit.
    pub fn feature_ids_to_link(&self) -> Vec<FeatureId> {
        self.linked.feature_ids_in_state(LinkState::ToBeLinked)
    }

    /// Ids whose link would be removed by a commit.
    pub fn feature_ids_to_unlink(&self) -> Vec<FeatureId> {
        self.candidates.feature_ids_in_state(LinkState::ToBeUnlinked)
    }

    /// Whether a commit would change anything.
    pub fn has_pending_changes(&self) -> bool {
        !self.feature_ids_to_link().is_empty() || !self.feature_ids_to_unlink().is_empty()
    }

    // ------------------------------------------------------------------
    // Map picking
    // ------------------------------------------------------------------

    /// Partition picked features into already-linked ones (reported to
    /// the user) and linkable candidate ids. Stale references are
    /// skipped.
    pub fn map_selection_feedback(&self, picked: &[Feature]) -> PickFeedback {
        let mut feedback = PickFeedback::default();
        for feature in picked {
            let id = feature.id();
            if self.store.feature(id).is_none() {
                warn!(feature_id = id, "skipping stale feature reference");
                continue;
            }
            if self.linked.contains(id) {
                feedback
                    .already_linked
                    .push(self.store.display_string(feature));
            } else {
                feedback.candidate_ids.push(id);
            }
        }
        feedback
    }
}
