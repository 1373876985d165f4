//! # Relation Link Editor Library
//!
//! A UI-toolkit-agnostic logic layer for dual-list relation editors:
//! dialogs that link and unlink features between two stores related by
//! foreign keys, including many-to-many setups through a join store.
//!
//! ## Features
//!
//! - **Deferred editing** - Moves between the lists accumulate a change
//!   set; stores are only touched when the host commits
//! - **Trait-Based Architecture** - Zero coupling via `FeatureStore` and
//!   `MapCanvas` traits
//! - **Model/View Ready** - Both lists implement `slint::Model` with
//!   minimal change notifications
//! - **Filtering** - Free-text, map-pick and mode filters compose over
//!   the candidates list
//! - **Map Picking** - Rectangle and click-identify gesture handling
//!   with a single completion event per gesture
//!
//! ## Core Components
//!
//! - [`LinkManagerController`] - One editing session, wired end to end
//! - [`FeatureCollection`] - Observable list of [`FeatureItem`]s
//! - [`FeatureCollectionFilter`] - Filtering proxy over a collection
//! - [`LinkReconciler`] - The link/unlink state machine
//! - [`SpatialPicker`] - Map gesture handling
//! - [`MemoryLayer`] - In-process reference [`FeatureStore`]

pub mod collection;
pub mod controller;
pub mod feature;
pub mod filter;
pub mod geometry;
pub mod item;
pub mod picker;
pub mod reconciler;
pub mod relation;
pub mod store;
pub mod tree;

// Re-export the primary surface
pub use collection::{CollectionError, FeatureCollection};
pub use controller::LinkManagerController;
pub use feature::{AttributeMap, EditState, Feature, FeatureId, Value};
pub use filter::{FeatureCollectionFilter, FilterError, FilterExpression, FilterMode};
pub use geometry::{Point, Rect};
pub use item::{DisplayIcon, FeatureItem, LinkState};
pub use picker::{PickResult, SpatialPicker};
pub use reconciler::{Cardinality, LinkError, LinkReconciler, PickFeedback};
pub use relation::{child_key_updates, join_records, PolymorphicConfig, Relation};
pub use store::{FeatureStore, MapCanvas, MemoryLayer};
pub use tree::{build_feature_tree, FeatureNode, FeatureTreeRow};
