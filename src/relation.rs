//! Relation descriptors and foreign-key bookkeeping.
//!
//! A [`Relation`] links a referencing (child) store to a referenced
//! (parent) store through one or more field pairs. Many-to-many setups
//! chain two relations across a join store: the base relation points
//! the join store at the parent, a second relation points it at the
//! target layer.
//!
//! The two free functions at the bottom compute the attribute changes
//! a commit needs: [`join_records`] synthesizes the join-store rows for
//! pending many-to-many links, [`child_key_updates`] the foreign-key
//! rewrites for pending one-to-many links.

use std::rc::Rc;

use crate::feature::{AttributeMap, Feature, Value};
use crate::store::FeatureStore;

/// Configuration of a polymorphic relation: the join store carries a
/// discriminator field naming which layer each row refers to.
#[derive(Clone, Debug)]
pub struct PolymorphicConfig {
    pub discriminator_field: String,
}

/// A foreign-key relation between two feature stores.
pub struct Relation {
    name: String,
    referencing: Rc<dyn FeatureStore>,
    referenced: Rc<dyn FeatureStore>,
    field_pairs: Vec<(String, String)>,
    polymorphic: Option<PolymorphicConfig>,
}

impl Relation {
    /// `field_pairs` maps referencing-store field names to
    /// referenced-store field names.
    pub fn new(
        name: &str,
        referencing: Rc<dyn FeatureStore>,
        referenced: Rc<dyn FeatureStore>,
        field_pairs: &[(&str, &str)],
    ) -> Self {
        Self {
            name: name.to_string(),
            referencing,
            referenced,
            field_pairs: field_pairs
                .iter()
                .map(|(a, b)| (a.to_string(), b.to_string()))
                .collect(),
            polymorphic: None,
        }
    }

    /// Mark the relation polymorphic with the given discriminator field.
    pub fn polymorphic(mut self, discriminator_field: &str) -> Self {
        self.polymorphic = Some(PolymorphicConfig {
            discriminator_field: discriminator_field.to_string(),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn referencing_store(&self) -> Rc<dyn FeatureStore> {
        Rc::clone(&self.referencing)
    }

    pub fn referenced_store(&self) -> Rc<dyn FeatureStore> {
        Rc::clone(&self.referenced)
    }

    pub fn field_pairs(&self) -> &[(String, String)] {
        &self.field_pairs
    }

    pub fn is_polymorphic(&self) -> bool {
        self.polymorphic.is_some()
    }

    pub fn polymorphic_config(&self) -> Option<&PolymorphicConfig> {
        self.polymorphic.as_ref()
    }

    /// The discriminator value identifying `store` in a polymorphic
    /// join row.
    pub fn type_token(&self, store: &dyn FeatureStore) -> Value {
        Value::Text(store.name())
    }

    /// All referencing-store features whose foreign keys point at
    /// `parent`. For a join store these are the join rows of `parent`.
    pub fn related_features(&self, parent: &Feature) -> Vec<Feature> {
        self.referencing
            .features()
            .into_iter()
            .filter(|f| self.keys_match(f, parent))
            .collect()
    }

    /// All referenced-store features a referencing feature points at.
    /// Usually zero or one, more only for degenerate data.
    pub fn referenced_features(&self, child: &Feature) -> Vec<Feature> {
        self.referenced
            .features()
            .into_iter()
            .filter(|parent| self.keys_match(child, parent))
            .collect()
    }

    fn keys_match(&self, child: &Feature, parent: &Feature) -> bool {
        !self.field_pairs.is_empty()
            && self.field_pairs.iter().all(|(child_field, parent_field)| {
                let key = child.attribute(child_field);
                !key.is_null() && key == parent.attribute(parent_field)
            })
    }
}

/// Synthesize one join-store record per target feature, ready to be
/// added to the join store when pending many-to-many links are
/// committed.
///
/// Each record carries the parent's keys through `base`, the target's
/// keys through `nm`, and the parent layer's discriminator token when
/// `base` is polymorphic.
pub fn join_records(
    base: &Relation,
    nm: &Relation,
    parent: &Feature,
    targets: &[Feature],
) -> Vec<AttributeMap> {
    targets
        .iter()
        .map(|target| {
            let mut record = AttributeMap::new();
            if let Some(config) = base.polymorphic_config() {
                record.insert(
                    config.discriminator_field.clone(),
                    base.type_token(&*base.referenced_store()),
                );
            }
            for (join_field, parent_field) in base.field_pairs() {
                record.insert(join_field.clone(), parent.attribute(parent_field));
            }
            for (join_field, target_field) in nm.field_pairs() {
                record.insert(join_field.clone(), target.attribute(target_field));
            }
            record
        })
        .collect()
}

/// The attribute rewrites that point a child feature at `parent`,
/// applied to each pending one-to-many link on commit.
pub fn child_key_updates(relation: &Relation, parent: &Feature) -> Vec<(String, Value)> {
    let mut updates = Vec::new();
    if let Some(config) = relation.polymorphic_config() {
        updates.push((
            config.discriminator_field.clone(),
            relation.type_token(&*relation.referenced_store()),
        ));
    }
    for (child_field, parent_field) in relation.field_pairs() {
        updates.push((child_field.clone(), parent.attribute(parent_field)));
    }
    updates
}
