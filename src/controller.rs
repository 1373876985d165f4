//! High-level controller for relation link editors.
//!
//! The [`LinkManagerController`] wires everything together for one
//! editing session: it resolves the initial linked/unlinked partition
//! for a parent feature, owns the two collections, the candidates
//! filter, the reconciler and the map picker, and exposes the command
//! surface a dialog binds its buttons and callbacks to.
//!
//! # Example
//!
//! ```ignore
//! use relation_link_editor::{Cardinality, LinkManagerController};
//!
//! let ctrl = LinkManagerController::new(relation, None, parent, Cardinality::OneToMany, None);
//!
//! // Bind the models.
//! dialog.set_unlinked_features(ctrl.candidates_model().into());
//! dialog.set_linked_features(ctrl.linked_model().into());
//!
//! // Bind the commands.
//! dialog.on_link_selected({
//!     let ctrl = ctrl.clone();
//!     move |rows| { let _ = ctrl.link_selected(&rows); }
//! });
//!
//! // On accept, apply the change set to the stores.
//! let to_unlink = ctrl.feature_ids_to_unlink();
//! let new_join_rows = ctrl.pending_join_records();
//! ```

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use tracing::debug;

use crate::collection::FeatureCollection;
use crate::feature::{AttributeMap, Feature, FeatureId, Value};
use crate::filter::{FeatureCollectionFilter, FilterError, FilterMode};
use crate::geometry::{Point, Rect};
use crate::item::LinkState;
use crate::picker::SpatialPicker;
use crate::reconciler::{Cardinality, LinkError, LinkReconciler, PickFeedback};
use crate::relation::{child_key_updates, join_records, Relation};
use crate::store::{FeatureStore, MapCanvas};
use crate::tree::{build_feature_tree, FeatureTreeRow};

/// Half-width of the click-identify search box, in map units.
const PICK_SEARCH_RADIUS: f64 = 5.0;

/// Controller for one link-editing session on a parent feature.
///
/// Clone this controller to share it across callbacks; clones refer to
/// the same session.
#[derive(Clone)]
pub struct LinkManagerController {
    inner: Rc<ControllerInner>,
}

struct ControllerInner {
    relation: Rc<Relation>,
    nm_relation: Option<Rc<Relation>>,
    parent: Feature,
    /// The layer being linked: the target layer for many-to-many,
    /// otherwise the referencing (child) layer.
    store: Rc<dyn FeatureStore>,
    canvas: Option<Rc<dyn MapCanvas>>,
    reconciler: LinkReconciler,
    picker: RefCell<SpatialPicker>,
}

impl LinkManagerController {
    /// Partition the store's features into linked and unlinked for
    /// `parent` and set up the editing session.
    ///
    /// For many-to-many setups `nm_relation` points the join store at
    /// the target layer and `relation` points it at the parent layer;
    /// otherwise `relation` is the plain child-to-parent relation.
    pub fn new(
        relation: Rc<Relation>,
        nm_relation: Option<Rc<Relation>>,
        parent: Feature,
        cardinality: Cardinality,
        canvas: Option<Rc<dyn MapCanvas>>,
    ) -> Self {
        let store: Rc<dyn FeatureStore> = match &nm_relation {
            Some(nm) => nm.referenced_store(),
            None => relation.referencing_store(),
        };

        let linked_features = linked_features(&relation, nm_relation.as_deref(), &parent);
        let linked_ids: HashSet<FeatureId> = linked_features.iter().map(Feature::id).collect();
        let unlinked_features: Vec<Feature> = store
            .features()
            .into_iter()
            .filter(|f| !linked_ids.contains(&f.id()))
            .collect();
        debug!(
            linked = linked_features.len(),
            unlinked = unlinked_features.len(),
            relation = relation.name(),
            "initialized link editing session"
        );

        let candidates = Rc::new(FeatureCollection::from_features(
            unlinked_features,
            LinkState::Unlinked,
            store.as_ref(),
        ));
        let linked = Rc::new(FeatureCollection::from_features(
            linked_features,
            LinkState::Linked,
            store.as_ref(),
        ));
        let filter = Rc::new(FeatureCollectionFilter::new(
            candidates.clone(),
            store.clone(),
        ));
        let reconciler = LinkReconciler::new(
            store.clone(),
            candidates,
            filter,
            linked,
            cardinality,
        );
        let picker = RefCell::new(SpatialPicker::new(store.clone(), PICK_SEARCH_RADIUS));

        Self {
            inner: Rc::new(ControllerInner {
                relation,
                nm_relation,
                parent,
                store,
                canvas,
                reconciler,
                picker,
            }),
        }
    }

    // ------------------------------------------------------------------
    // View bindings
    // ------------------------------------------------------------------

    /// The filtered unlinked-candidates model (left list).
    pub fn candidates_model(&self) -> Rc<FeatureCollectionFilter> {
        self.inner.reconciler.candidates_filter().clone()
    }

    /// The linked model (right list).
    pub fn linked_model(&self) -> Rc<FeatureCollection> {
        self.inner.reconciler.linked().clone()
    }

    /// Title for the hosting dialog.
    pub fn window_title(&self) -> String {
        format!(
            "Manage linked features for {} \"{}\"",
            self.inner.store.name(),
            self.parent_display_string(),
        )
    }

    /// Display string of the edited parent feature.
    pub fn parent_display_string(&self) -> String {
        self.inner
            .relation
            .referenced_store()
            .display_string(&self.inner.parent)
    }

    /// Whether map-based tooling (picking, zooming) applies.
    pub fn is_spatial(&self) -> bool {
        self.inner.store.is_spatial() && self.inner.canvas.is_some()
    }

    // ------------------------------------------------------------------
    // Link commands
    // ------------------------------------------------------------------

    /// Link the candidates at the given filtered rows.
    pub fn link_selected(&self, filtered_rows: &[usize]) -> Result<(), LinkError> {
        self.inner.reconciler.link_selected(filtered_rows)
    }

    /// Unlink the linked features at the given rows.
    pub fn unlink_selected(&self, rows: &[usize]) -> Result<(), LinkError> {
        self.inner.reconciler.unlink_selected(rows)
    }

    /// Link every candidate the filter shows.
    pub fn link_all(&self) -> Result<(), LinkError> {
        self.inner.reconciler.link_all()
    }

    /// Unlink every linked feature.
    pub fn unlink_all(&self) {
        self.inner.reconciler.unlink_all()
    }

    // ------------------------------------------------------------------
    // Filter commands
    // ------------------------------------------------------------------

    pub fn set_quick_filter(&self, text: &str) {
        self.inner
            .reconciler
            .candidates_filter()
            .set_quick_filter(text);
    }

    pub fn clear_quick_filter(&self) {
        self.inner.reconciler.candidates_filter().clear_quick_filter();
    }

    pub fn set_filter_mode(&self, mode: FilterMode) -> Result<(), FilterError> {
        self.inner.reconciler.candidates_filter().set_mode(mode)
    }

    /// Install the predicate for [`FilterMode::ShowExpression`].
    pub fn set_filter_expression(
        &self,
        expression: impl Fn(&Feature) -> Result<bool, String> + 'static,
    ) -> Result<(), FilterError> {
        self.inner
            .reconciler
            .candidates_filter()
            .set_expression(expression)
    }

    /// Forward a map extent change, refreshing the visible-only mode.
    pub fn extent_changed(&self, extent: Rect) {
        self.inner.reconciler.candidates_filter().extent_changed(extent);
    }

    /// Forward an edit-buffer change, refreshing the edited-only mode.
    pub fn edits_changed(&self) {
        self.inner.reconciler.candidates_filter().edits_changed();
    }

    // ------------------------------------------------------------------
    // Map picking
    // ------------------------------------------------------------------

    /// Begin a pick gesture. Returns false when one is in progress.
    pub fn map_pick_pressed(&self, at: Point) -> bool {
        self.inner.picker.borrow_mut().press(at)
    }

    /// Extend the pick gesture.
    pub fn map_pick_dragged(&self, at: Point) -> bool {
        self.inner.picker.borrow_mut().drag_to(at)
    }

    /// The rectangle to visualize for the active gesture.
    pub fn map_pick_rubber_band(&self) -> Option<Rect> {
        self.inner.picker.borrow().rubber_band()
    }

    /// Finish the pick gesture and apply its result as the map filter.
    pub fn map_pick_released(&self) -> Option<PickFeedback> {
        let result = self.inner.picker.borrow_mut().release()?;
        Some(self.apply_pick(result))
    }

    /// Abort the pick gesture, clearing the map filter.
    pub fn map_pick_cancelled(&self) -> Option<PickFeedback> {
        let result = self.inner.picker.borrow_mut().cancel()?;
        Some(self.apply_pick(result))
    }

    fn apply_pick(&self, picked: Vec<Feature>) -> PickFeedback {
        let feedback = self.inner.reconciler.map_selection_feedback(&picked);
        let filter = self.inner.reconciler.candidates_filter();
        if feedback.candidate_ids.is_empty() {
            filter.clear_map_filter();
        } else {
            filter.set_map_filter(feedback.candidate_ids.iter().copied());
        }
        feedback
    }

    /// Zoom the canvas to the given features, if there is a canvas.
    pub fn zoom_to(&self, ids: &[FeatureId]) {
        if let Some(canvas) = &self.inner.canvas {
            canvas.zoom_to(ids);
        }
    }

    // ------------------------------------------------------------------
    // Change set
    // ------------------------------------------------------------------

    /// Ids whose link a commit would create.
    pub fn feature_ids_to_link(&self) -> Vec<FeatureId> {
        self.inner.reconciler.feature_ids_to_link()
    }

    /// Ids whose link a commit would remove.
    pub fn feature_ids_to_unlink(&self) -> Vec<FeatureId> {
        self.inner.reconciler.feature_ids_to_unlink()
    }

    pub fn has_pending_changes(&self) -> bool {
        self.inner.reconciler.has_pending_changes()
    }

    /// Join-store records a commit must add, one per pending link.
    /// Empty unless a join relation is configured.
    pub fn pending_join_records(&self) -> Vec<AttributeMap> {
        let Some(nm) = &self.inner.nm_relation else {
            return Vec::new();
        };
        let targets: Vec<Feature> = self
            .inner
            .reconciler
            .linked()
            .items()
            .into_iter()
            .filter(|item| item.state() == LinkState::ToBeLinked)
            .map(|item| item.feature().clone())
            .collect();
        join_records(&self.inner.relation, nm, &self.inner.parent, &targets)
    }

    /// Foreign-key rewrites a commit must apply to each pending child.
    /// Empty when a join relation is configured, since many-to-many
    /// commits write join rows instead.
    pub fn pending_child_key_updates(&self) -> Vec<(String, Value)> {
        if self.inner.nm_relation.is_some() {
            return Vec::new();
        }
        child_key_updates(&self.inner.relation, &self.inner.parent)
    }

    /// Tree presentation of the linked side, with join-row children
    /// for many-to-many setups.
    pub fn linked_feature_tree(&self) -> Vec<FeatureTreeRow> {
        build_feature_tree(
            &self.inner.reconciler.linked().items(),
            &self.inner.relation,
            self.inner.nm_relation.as_deref(),
            &self.inner.parent,
        )
    }
}

/// Resolve the features currently linked to `parent`: the related
/// children directly, or through the join store when `nm` is set.
fn linked_features(relation: &Relation, nm: Option<&Relation>, parent: &Feature) -> Vec<Feature> {
    let related = relation.related_features(parent);
    let Some(nm) = nm else {
        return related;
    };
    let mut seen = HashSet::new();
    let mut targets = Vec::new();
    for join_row in related {
        for target in nm.referenced_features(&join_row) {
            if seen.insert(target.id()) {
                targets.push(target);
            }
        }
    }
    targets
}
