//! Common test fixtures for integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use slint::Model;

use relation_link_editor::{
    AttributeMap, Cardinality, Feature, FeatureId, FeatureItem, FeatureStore,
    LinkManagerController, MapCanvas, MemoryLayer, Point, Rect, Relation, Value,
};

pub fn attrs(pairs: &[(&str, Value)]) -> AttributeMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// A small two-table schema with a join table:
///
/// - `layer1` (children): pk, fk, name; displayed as
///   `"Layer1-{pk}: {name}"`
/// - `layer2` (parents): pk; displayed as `"Layer2-{pk}"`
/// - `join_layer`: pk, fk_layer1, fk_layer2
///
/// `relation` links layer1 to layer2 directly (fk → pk);
/// `relation_1n` and `relation_nm` chain the join table between
/// layer1 (as parent) and layer2 (as target).
pub struct Schema {
    pub layer1: Rc<MemoryLayer>,
    pub layer2: Rc<MemoryLayer>,
    pub join_layer: Rc<MemoryLayer>,
    pub relation: Rc<Relation>,
    pub relation_1n: Rc<Relation>,
    pub relation_nm: Rc<Relation>,
}

impl Schema {
    pub fn new() -> Self {
        let layer1 = Rc::new(MemoryLayer::with_display("vl1", |f| {
            format!("Layer1-{}: {}", f.attribute("pk"), f.attribute("name"))
        }));
        let layer2 = Rc::new(MemoryLayer::with_display("vl2", |f| {
            format!("Layer2-{}", f.attribute("pk"))
        }));
        let join_layer = Rc::new(MemoryLayer::with_display("join_layer", |f| {
            format!("LayerJoin-{}", f.attribute("pk"))
        }));

        layer1.add_feature(attrs(&[
            ("pk", Value::Int(0)),
            ("fk", Value::Int(10)),
            ("name", Value::from("The Artist formerly known as Prince")),
        ]));
        layer1.add_feature(attrs(&[
            ("pk", Value::Int(1)),
            ("fk", Value::Int(11)),
            ("name", Value::from("Martina formerly known as Prisca")),
        ]));

        layer2.add_feature(attrs(&[("pk", Value::Int(10))]));
        layer2.add_feature(attrs(&[("pk", Value::Int(11))]));
        layer2.add_feature(attrs(&[("pk", Value::Int(12))]));

        join_layer.add_feature(attrs(&[
            ("pk", Value::Int(101)),
            ("fk_layer1", Value::Int(0)),
            ("fk_layer2", Value::Int(10)),
        ]));
        join_layer.add_feature(attrs(&[
            ("pk", Value::Int(102)),
            ("fk_layer1", Value::Int(1)),
            ("fk_layer2", Value::Int(11)),
        ]));
        join_layer.add_feature(attrs(&[
            ("pk", Value::Int(103)),
            ("fk_layer1", Value::Int(0)),
            ("fk_layer2", Value::Int(11)),
        ]));

        let relation = Rc::new(Relation::new(
            "vl1.vl2",
            layer1.clone(),
            layer2.clone(),
            &[("fk", "pk")],
        ));
        let relation_1n = Rc::new(Relation::new(
            "join_layer.vl1",
            join_layer.clone(),
            layer1.clone(),
            &[("fk_layer1", "pk")],
        ));
        let relation_nm = Rc::new(Relation::new(
            "join_layer.vl2",
            join_layer.clone(),
            layer2.clone(),
            &[("fk_layer2", "pk")],
        ));

        Self {
            layer1,
            layer2,
            join_layer,
            relation,
            relation_1n,
            relation_nm,
        }
    }

    /// Find a feature by its pk attribute.
    pub fn feature_with_pk(&self, layer: &Rc<MemoryLayer>, pk: i64) -> Feature {
        layer
            .features()
            .into_iter()
            .find(|f| f.attribute("pk") == Value::Int(pk))
            .expect("no feature with this pk")
    }

    /// Session editing the children of a layer2 parent (1:n).
    pub fn one_to_many_session(&self, parent_pk: i64) -> LinkManagerController {
        LinkManagerController::new(
            self.relation.clone(),
            None,
            self.feature_with_pk(&self.layer2, parent_pk),
            Cardinality::OneToMany,
            None,
        )
    }

    /// Session editing the layer2 targets of a layer1 parent through
    /// the join table (n:m).
    pub fn many_to_many_session(&self, parent_pk: i64) -> LinkManagerController {
        LinkManagerController::new(
            self.relation_1n.clone(),
            Some(self.relation_nm.clone()),
            self.feature_with_pk(&self.layer1, parent_pk),
            Cardinality::ManyToMany,
            None,
        )
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

/// Canvas double recording zoom requests.
#[derive(Default)]
pub struct RecordingCanvas {
    pub extent: RefCell<Option<Rect>>,
    pub zoom_requests: RefCell<Vec<Vec<FeatureId>>>,
}

impl MapCanvas for RecordingCanvas {
    fn current_extent(&self) -> Rect {
        self.extent
            .borrow()
            .unwrap_or_else(|| Rect::from_points(Point::new(0.0, 0.0), Point::new(100.0, 100.0)))
    }

    fn zoom_to(&self, ids: &[FeatureId]) {
        self.zoom_requests.borrow_mut().push(ids.to_vec());
    }
}

/// Display strings of a model's rows, in row order.
pub fn model_display_strings(model: &impl Model<Data = FeatureItem>) -> Vec<String> {
    (0..model.row_count())
        .filter_map(|row| model.row_data(row))
        .map(|item| item.display_string().to_string())
        .collect()
}

/// Feature ids of a model's rows, in row order.
pub fn model_feature_ids(model: &impl Model<Data = FeatureItem>) -> Vec<FeatureId> {
    (0..model.row_count())
        .filter_map(|row| model.row_data(row))
        .map(|item| item.feature_id())
        .collect()
}
