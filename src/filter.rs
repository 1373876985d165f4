//! Filter proxy over the unlinked-candidates collection.
//!
//! [`FeatureCollectionFilter`] implements [`slint::Model`] and exposes
//! the rows of its source [`FeatureCollection`] that pass three
//! independent, conjunctive filters:
//!
//! - the *quick filter*, a free-text search over the cached display
//!   strings. The text is split on whitespace and every token must
//!   match case-insensitively;
//! - the *map filter*, an id allow-list fed by map picking;
//! - the *mode filter*, one of the [`FilterMode`] variants.
//!
//! The proxy does not observe its source. Anything that mutates the
//! source collection behind its back must call [`invalidate`] to
//! refresh the row mapping, which is what the reconciler does after
//! every move.
//!
//! [`invalidate`]: FeatureCollectionFilter::invalidate

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use slint::{Model, ModelNotify, ModelTracker};
use thiserror::Error;
use tracing::warn;

use crate::collection::FeatureCollection;
use crate::feature::{Feature, FeatureId};
use crate::geometry::Rect;
use crate::item::FeatureItem;
use crate::store::FeatureStore;

/// Predicate backing [`FilterMode::ShowExpression`]. Returning `Err`
/// marks the expression invalid with the given message.
pub type FilterExpression = Box<dyn Fn(&Feature) -> Result<bool, String>>;

/// The coarse row filter selected in the filter menu.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FilterMode {
    #[default]
    ShowAll,
    /// Only features selected in the store.
    ShowSelected,
    /// Only features whose geometry lies in the current map extent.
    ShowVisible,
    /// Only features with pending edits in the store's edit buffer.
    ShowEdited,
    /// Only features matching the configured expression.
    ShowExpression,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    /// The expression failed to evaluate. The mode keeps showing all
    /// rows until a working expression is supplied.
    #[error("filter expression is invalid: {0}")]
    InvalidExpression(String),
}

struct FilterState {
    quick_filter: String,
    map_filter: Option<HashSet<FeatureId>>,
    mode: FilterMode,
    /// Ids precomputed for the extent and expression modes. The
    /// selection and edit modes query the store live instead.
    mode_ids: HashSet<FeatureId>,
    expression: Option<FilterExpression>,
    expression_valid: bool,
    extent: Option<Rect>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            quick_filter: String::new(),
            map_filter: None,
            mode: FilterMode::ShowAll,
            mode_ids: HashSet::new(),
            expression: None,
            expression_valid: false,
            extent: None,
        }
    }
}

/// Filtering proxy model over a [`FeatureCollection`].
pub struct FeatureCollectionFilter {
    source: Rc<FeatureCollection>,
    store: Rc<dyn FeatureStore>,
    state: RefCell<FilterState>,
    row_map: RefCell<Vec<usize>>,
    notify: ModelNotify,
}

impl FeatureCollectionFilter {
    pub fn new(source: Rc<FeatureCollection>, store: Rc<dyn FeatureStore>) -> Self {
        let filter = Self {
            source,
            store,
            state: RefCell::new(FilterState::default()),
            row_map: RefCell::new(Vec::new()),
            notify: ModelNotify::default(),
        };
        filter.invalidate();
        filter
    }

    pub fn source(&self) -> &Rc<FeatureCollection> {
        &self.source
    }

    // ------------------------------------------------------------------
    // Quick filter
    // ------------------------------------------------------------------

    pub fn set_quick_filter(&self, text: &str) {
        self.state.borrow_mut().quick_filter = text.to_string();
        self.invalidate();
    }

    pub fn clear_quick_filter(&self) {
        self.set_quick_filter("");
    }

    pub fn quick_filter_active(&self) -> bool {
        !self.state.borrow().quick_filter.trim().is_empty()
    }

    // ------------------------------------------------------------------
    // Map filter
    // ------------------------------------------------------------------

    /// Restrict visible rows to the given ids until cleared.
    pub fn set_map_filter(&self, ids: impl IntoIterator<Item = FeatureId>) {
        self.state.borrow_mut().map_filter = Some(ids.into_iter().collect());
        self.invalidate();
    }

    pub fn clear_map_filter(&self) {
        self.state.borrow_mut().map_filter = None;
        self.invalidate();
    }

    pub fn map_filter_active(&self) -> bool {
        self.state.borrow().map_filter.is_some()
    }

    /// Whether a user-entered filter narrows the list right now. The
    /// mode filter intentionally does not count: "link all" honors the
    /// searched/picked subset but ignores the display mode.
    pub fn filter_active(&self) -> bool {
        self.quick_filter_active() || self.map_filter_active()
    }

    // ------------------------------------------------------------------
    // Mode filter
    // ------------------------------------------------------------------

    pub fn mode(&self) -> FilterMode {
        self.state.borrow().mode
    }

    pub fn set_mode(&self, mode: FilterMode) -> Result<(), FilterError> {
        self.state.borrow_mut().mode = mode;
        let result = self.recompute_mode_ids();
        self.invalidate();
        result
    }

    /// Install the expression backing [`FilterMode::ShowExpression`].
    pub fn set_expression(
        &self,
        expression: impl Fn(&Feature) -> Result<bool, String> + 'static,
    ) -> Result<(), FilterError> {
        self.state.borrow_mut().expression = Some(Box::new(expression));
        if self.mode() != FilterMode::ShowExpression {
            return Ok(());
        }
        let result = self.recompute_mode_ids();
        self.invalidate();
        result
    }

    /// Notify the filter that the map extent moved.
    pub fn extent_changed(&self, extent: Rect) {
        self.state.borrow_mut().extent = Some(extent);
        if self.mode() == FilterMode::ShowVisible {
            // Recomputing from an extent cannot fail.
            let _ = self.recompute_mode_ids();
            self.invalidate();
        }
    }

    /// Notify the filter that the store's edit buffer changed.
    pub fn edits_changed(&self) {
        if self.mode() == FilterMode::ShowEdited {
            self.invalidate();
        }
    }

    fn recompute_mode_ids(&self) -> Result<(), FilterError> {
        let mut state = self.state.borrow_mut();
        match state.mode {
            FilterMode::ShowAll | FilterMode::ShowSelected | FilterMode::ShowEdited => {
                state.mode_ids.clear();
                Ok(())
            }
            FilterMode::ShowVisible => {
                state.mode_ids = match state.extent {
                    Some(extent) => self
                        .store
                        .features_in_rect(extent)
                        .iter()
                        .map(Feature::id)
                        .collect(),
                    None => HashSet::new(),
                };
                Ok(())
            }
            FilterMode::ShowExpression => {
                let mut ids = HashSet::new();
                let mut first_error = None;
                match state.expression.as_ref() {
                    None => first_error = Some("no filter expression set".to_string()),
                    Some(expression) => {
                        for feature in self.store.features() {
                            match expression(&feature) {
                                Ok(true) => {
                                    ids.insert(feature.id());
                                }
                                Ok(false) => {}
                                Err(message) => {
                                    if first_error.is_none() {
                                        first_error = Some(message);
                                    }
                                }
                            }
                        }
                    }
                }
                if let Some(message) = first_error {
                    warn!(error = %message, "filter expression failed, showing all rows");
                    state.expression_valid = false;
                    return Err(FilterError::InvalidExpression(message));
                }
                state.expression_valid = true;
                state.mode_ids = ids;
                Ok(())
            }
        }
    }

    // ------------------------------------------------------------------
    // Row mapping
    // ------------------------------------------------------------------

    /// Rebuild the proxy-to-source row mapping and reset the model.
    ///
    /// Must be called after any out-of-band change to the source
    /// collection or to store state the current mode depends on.
    pub fn invalidate(&self) {
        {
            let state = self.state.borrow();
            let selection = self.store.selected_ids();
            let mut row_map = self.row_map.borrow_mut();
            row_map.clear();
            for (source_row, item) in self.source.items().iter().enumerate() {
                if self.accepts(item, &selection, &state) {
                    row_map.push(source_row);
                }
            }
        }
        self.notify.reset();
    }

    /// Source row behind a proxy row.
    pub fn map_to_source(&self, row: usize) -> Option<usize> {
        self.row_map.borrow().get(row).copied()
    }

    fn accepts(
        &self,
        item: &FeatureItem,
        selection: &HashSet<FeatureId>,
        state: &FilterState,
    ) -> bool {
        let id = item.feature_id();

        let mode_accepts = match state.mode {
            FilterMode::ShowAll => true,
            FilterMode::ShowSelected => selection.contains(&id),
            FilterMode::ShowVisible => state.mode_ids.contains(&id),
            FilterMode::ShowEdited => {
                if self.store.feature(id).is_none() {
                    warn!(feature_id = id, "skipping stale feature reference");
                    return false;
                }
                self.store.edit_state(id).is_edited()
            }
            FilterMode::ShowExpression => {
                !state.expression_valid || state.mode_ids.contains(&id)
            }
        };
        if !mode_accepts {
            return false;
        }

        if let Some(allowed) = &state.map_filter {
            if !allowed.contains(&id) {
                return false;
            }
        }

        if state.quick_filter.trim().is_empty() {
            return true;
        }
        let haystack = item.display_string().to_lowercase();
        state
            .quick_filter
            .split_whitespace()
            .all(|token| haystack.contains(&token.to_lowercase()))
    }
}

impl Model for FeatureCollectionFilter {
    type Data = FeatureItem;

    fn row_count(&self) -> usize {
        self.row_map.borrow().len()
    }

    fn row_data(&self, row: usize) -> Option<Self::Data> {
        let source_row = self.map_to_source(row)?;
        self.source.item(source_row)
    }

    fn model_tracker(&self) -> &dyn ModelTracker {
        &self.notify
    }
}
