//! Ordered feature-item collections backing the two editor lists.
//!
//! [`FeatureCollection`] implements [`slint::Model`] so a view can bind
//! to it directly; every mutation goes through [`slint::ModelNotify`]
//! with minimal row events. Reconciliation moves items between the two
//! collections with the `take_*` operations, which remove rows without
//! losing them.

use std::cell::RefCell;
use std::collections::HashMap;

use slint::{Model, ModelNotify, ModelTracker};
use thiserror::Error;

use crate::feature::{Feature, FeatureId};
use crate::item::{FeatureItem, LinkState};
use crate::store::FeatureStore;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CollectionError {
    #[error("row {row} is out of bounds, the collection has {len} rows")]
    RowOutOfBounds { row: usize, len: usize },
}

/// An ordered, observable list of [`FeatureItem`]s.
#[derive(Default)]
pub struct FeatureCollection {
    items: RefCell<Vec<FeatureItem>>,
    notify: ModelNotify,
}

impl FeatureCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection from store features, all in the same state.
    pub fn from_features(
        features: Vec<Feature>,
        state: LinkState,
        store: &dyn FeatureStore,
    ) -> Self {
        let collection = Self::new();
        collection.populate(features, state, store);
        collection
    }

    /// Replace the whole content. Emits a model reset.
    pub fn populate(&self, features: Vec<Feature>, state: LinkState, store: &dyn FeatureStore) {
        {
            let mut items = self.items.borrow_mut();
            *items = features
                .into_iter()
                .map(|f| FeatureItem::new(f, state, store))
                .collect();
        }
        self.notify.reset();
    }

    /// Append items, typically ones taken from the other collection.
    pub fn add_items(&self, new_items: Vec<FeatureItem>) {
        if new_items.is_empty() {
            return;
        }
        let (index, count) = {
            let mut items = self.items.borrow_mut();
            let index = items.len();
            let count = new_items.len();
            items.extend(new_items);
            (index, count)
        };
        self.notify.row_added(index, count);
    }

    /// Remove and return the item at `row`.
    pub fn take_item(&self, row: usize) -> Result<FeatureItem, CollectionError> {
        let len = self.row_count();
        if row >= len {
            return Err(CollectionError::RowOutOfBounds { row, len });
        }
        let item = self.items.borrow_mut().remove(row);
        self.notify.row_removed(row, 1);
        Ok(item)
    }

    /// Remove and return the items at `rows`.
    ///
    /// Rows are removed highest-first so earlier removals never shift
    /// later ones, but the returned items follow the order of `rows`.
    /// Duplicate rows are taken once. Fails without removing anything
    /// if any row is out of bounds.
    pub fn take_items(&self, rows: &[usize]) -> Result<Vec<FeatureItem>, CollectionError> {
        let len = self.row_count();
        if let Some(&row) = rows.iter().find(|&&row| row >= len) {
            return Err(CollectionError::RowOutOfBounds { row, len });
        }

        let mut descending = rows.to_vec();
        descending.sort_unstable_by(|a, b| b.cmp(a));
        descending.dedup();

        let mut taken: HashMap<usize, FeatureItem> = HashMap::with_capacity(descending.len());
        for row in descending {
            let item = self.items.borrow_mut().remove(row);
            self.notify.row_removed(row, 1);
            taken.insert(row, item);
        }

        Ok(rows.iter().filter_map(|row| taken.remove(row)).collect())
    }

    /// Remove and return everything, preserving order. Emits a reset.
    pub fn take_all(&self) -> Vec<FeatureItem> {
        let items = std::mem::take(&mut *self.items.borrow_mut());
        if !items.is_empty() {
            self.notify.reset();
        }
        items
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    pub fn contains(&self, id: FeatureId) -> bool {
        self.index_of(id).is_some()
    }

    /// Row of the item holding feature `id`, if present.
    pub fn index_of(&self, id: FeatureId) -> Option<usize> {
        self.items
            .borrow()
            .iter()
            .position(|item| item.feature_id() == id)
    }

    pub fn item(&self, row: usize) -> Option<FeatureItem> {
        self.items.borrow().get(row).cloned()
    }

    /// Snapshot of all items in row order.
    pub fn items(&self) -> Vec<FeatureItem> {
        self.items.borrow().clone()
    }

    /// Ids of all items currently in `state`, in row order.
    pub fn feature_ids_in_state(&self, state: LinkState) -> Vec<FeatureId> {
        self.items
            .borrow()
            .iter()
            .filter(|item| item.state() == state)
            .map(|item| item.feature_id())
            .collect()
    }

    /// Update one row in place. Emits a row-changed event.
    pub fn update_item(
        &self,
        row: usize,
        update: impl FnOnce(&mut FeatureItem),
    ) -> Result<(), CollectionError> {
        {
            let mut items = self.items.borrow_mut();
            let len = items.len();
            let Some(item) = items.get_mut(row) else {
                return Err(CollectionError::RowOutOfBounds { row, len });
            };
            update(item);
        }
        self.notify.row_changed(row);
        Ok(())
    }
}

impl Model for FeatureCollection {
    type Data = FeatureItem;

    fn row_count(&self) -> usize {
        self.items.borrow().len()
    }

    fn row_data(&self, row: usize) -> Option<Self::Data> {
        self.items.borrow().get(row).cloned()
    }

    fn set_row_data(&self, row: usize, data: Self::Data) {
        {
            let mut items = self.items.borrow_mut();
            let Some(item) = items.get_mut(row) else {
                return;
            };
            *item = data;
        }
        self.notify.row_changed(row);
    }

    fn model_tracker(&self) -> &dyn ModelTracker {
        &self.notify
    }
}
