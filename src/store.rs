//! Store and canvas seams.
//!
//! The editor logic talks to the host application through two traits:
//! [`FeatureStore`] for everything layer-shaped (records, selection,
//! edit buffer, display strings) and [`MapCanvas`] for the view port.
//! [`MemoryLayer`] is the in-process reference store used by the test
//! suites and by applications that do not have a real backend.
//!
//! # Example
//!
//! ```ignore
//! let layer = Rc::new(MemoryLayer::with_display("tracks", |f| {
//!     format!("tracks-{}", f.attribute("pk"))
//! }));
//! let id = layer.add_feature([("pk".into(), Value::Int(1))].into());
//! assert!(layer.feature(id).is_some());
//! ```

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use crate::feature::{AttributeMap, EditState, Feature, FeatureId, Value};
use crate::geometry::{Point, Rect};

/// Read access to a layer of features plus the per-layer state the
/// editor needs: current selection, edit buffer and display strings.
pub trait FeatureStore {
    /// Human-readable layer name, also used as the type discriminator
    /// token for polymorphic relations.
    fn name(&self) -> String;

    /// Resolve a feature by id. `None` means the id is stale.
    fn feature(&self, id: FeatureId) -> Option<Feature>;

    /// All features of the store, in insertion order.
    fn features(&self) -> Vec<Feature>;

    /// Features whose geometry falls inside `rect`. Features without
    /// geometry never match.
    fn features_in_rect(&self, rect: Rect) -> Vec<Feature>;

    /// Ids currently selected in the host application.
    fn selected_ids(&self) -> HashSet<FeatureId>;

    /// Edit-buffer status of a feature. Unknown ids report clean.
    fn edit_state(&self, id: FeatureId) -> EditState;

    /// Render the display string for a feature of this store.
    fn display_string(&self, feature: &Feature) -> String;

    /// Whether the store carries geometry at all. Spatial tooling
    /// (zooming, map picking) is only offered for spatial stores.
    fn is_spatial(&self) -> bool;
}

/// The map view port. Only the two operations the editor needs.
pub trait MapCanvas {
    fn current_extent(&self) -> Rect;
    fn zoom_to(&self, ids: &[FeatureId]);
}

struct LayerData {
    features: Vec<Feature>,
    next_id: FeatureId,
    selection: HashSet<FeatureId>,
    edits: HashMap<FeatureId, EditState>,
    spatial: bool,
}

/// In-memory [`FeatureStore`] with interior mutability, so it can be
/// shared as `Rc<MemoryLayer>` and still accept new features,
/// selection changes and edit-buffer updates.
pub struct MemoryLayer {
    name: String,
    display_fn: Box<dyn Fn(&Feature) -> String>,
    data: RefCell<LayerData>,
}

impl MemoryLayer {
    /// A layer whose display string defaults to `"{name}-{id}"`.
    pub fn new(name: &str) -> Self {
        let layer_name = name.to_string();
        let prefix = layer_name.clone();
        Self {
            name: layer_name,
            display_fn: Box::new(move |f| format!("{}-{}", prefix, f.id())),
            data: RefCell::new(LayerData {
                features: Vec::new(),
                next_id: 1,
                selection: HashSet::new(),
                edits: HashMap::new(),
                spatial: false,
            }),
        }
    }

    /// A layer with a custom display expression.
    pub fn with_display(name: &str, display_fn: impl Fn(&Feature) -> String + 'static) -> Self {
        Self {
            display_fn: Box::new(display_fn),
            ..Self::new(name)
        }
    }

    /// Add a feature without geometry, returning its assigned id.
    pub fn add_feature(&self, attributes: AttributeMap) -> FeatureId {
        self.add(attributes, None)
    }

    /// Add a feature with point geometry, returning its assigned id.
    /// Marks the layer spatial.
    pub fn add_feature_at(&self, attributes: AttributeMap, at: Point) -> FeatureId {
        self.add(attributes, Some(at))
    }

    /// Add several attribute records at once, as a commit of pending
    /// join records would.
    pub fn add_features(&self, records: Vec<AttributeMap>) -> Vec<FeatureId> {
        records.into_iter().map(|r| self.add(r, None)).collect()
    }

    fn add(&self, attributes: AttributeMap, at: Option<Point>) -> FeatureId {
        let mut data = self.data.borrow_mut();
        let id = data.next_id;
        data.next_id += 1;
        let feature = match at {
            Some(point) => {
                data.spatial = true;
                Feature::with_geometry(id, attributes, point)
            }
            None => Feature::new(id, attributes),
        };
        data.features.push(feature);
        id
    }

    /// Replace the current selection.
    pub fn set_selection(&self, ids: impl IntoIterator<Item = FeatureId>) {
        let mut data = self.data.borrow_mut();
        data.selection = ids.into_iter().collect();
    }

    /// Record an edit-buffer status for a feature.
    pub fn mark_edited(&self, id: FeatureId, state: EditState) {
        self.data.borrow_mut().edits.insert(id, state);
    }

    /// Overwrite one attribute of a stored feature and flag it as
    /// attribute-edited. Returns false for stale ids.
    pub fn set_attribute(&self, id: FeatureId, name: &str, value: Value) -> bool {
        let mut data = self.data.borrow_mut();
        let Some(feature) = data.features.iter_mut().find(|f| f.id() == id) else {
            return false;
        };
        feature.set_attribute(name, value);
        data.edits
            .entry(id)
            .or_insert_with(EditState::default)
            .attributes_changed = true;
        true
    }
}

impl FeatureStore for MemoryLayer {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn feature(&self, id: FeatureId) -> Option<Feature> {
        self.data
            .borrow()
            .features
            .iter()
            .find(|f| f.id() == id)
            .cloned()
    }

    fn features(&self) -> Vec<Feature> {
        self.data.borrow().features.clone()
    }

    fn features_in_rect(&self, rect: Rect) -> Vec<Feature> {
        self.data
            .borrow()
            .features
            .iter()
            .filter(|f| f.geometry().is_some_and(|p| rect.contains(p)))
            .cloned()
            .collect()
    }

    fn selected_ids(&self) -> HashSet<FeatureId> {
        self.data.borrow().selection.clone()
    }

    fn edit_state(&self, id: FeatureId) -> EditState {
        self.data
            .borrow()
            .edits
            .get(&id)
            .copied()
            .unwrap_or_default()
    }

    fn display_string(&self, feature: &Feature) -> String {
        (self.display_fn)(feature)
    }

    fn is_spatial(&self) -> bool {
        self.data.borrow().spatial
    }
}
