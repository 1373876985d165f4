//! Many-to-many sessions: join-record synthesis and the linked tree.

mod common;

use std::rc::Rc;

use common::{attrs, model_display_strings, Schema};
use relation_link_editor::{
    Cardinality, FeatureNode, LinkManagerController, Relation, Value,
};

// ============================================================================
// Initial partition through the join table
// ============================================================================

#[test]
fn test_session_resolves_targets_through_join_rows() {
    let schema = Schema::new();
    // Parent layer1 pk=0 has join rows to layer2 pk=10 and pk=11.
    let session = schema.many_to_many_session(0);

    let linked = session.linked_model();
    assert_eq!(
        model_display_strings(linked.as_ref()),
        vec!["Layer2-10", "Layer2-11"]
    );
    let candidates = session.candidates_model();
    assert_eq!(model_display_strings(candidates.as_ref()), vec!["Layer2-12"]);
}

#[test]
fn test_window_title_names_target_layer() {
    let schema = Schema::new();
    let session = schema.many_to_many_session(0);
    assert_eq!(
        session.window_title(),
        "Manage linked features for vl2 \"Layer1-0: The Artist formerly known as Prince\""
    );
}

// ============================================================================
// Join-record synthesis
// ============================================================================

#[test]
fn test_linking_two_targets_synthesizes_two_join_records() {
    let schema = Schema::new();
    // A parent with no join rows yet, so all three targets start
    // unlinked.
    schema.layer1.add_feature(attrs(&[
        ("pk", Value::Int(2)),
        ("name", Value::from("Newcomer")),
    ]));
    let session = schema.many_to_many_session(2);
    assert!(session.linked_model().is_empty());
    assert_eq!(session.candidates_model().source().len(), 3);

    // Link Layer2-10 and Layer2-11 (filtered rows 0 and 1).
    session.link_selected(&[0, 1]).unwrap();

    let records = session.pending_join_records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].get("fk_layer1"), Some(&Value::Int(2)));
    assert_eq!(records[0].get("fk_layer2"), Some(&Value::Int(10)));
    assert_eq!(records[1].get("fk_layer1"), Some(&Value::Int(2)));
    assert_eq!(records[1].get("fk_layer2"), Some(&Value::Int(11)));

    // No foreign-key rewrites in a join-table session.
    assert!(session.pending_child_key_updates().is_empty());
}

#[test]
fn test_relinking_persisted_target_produces_no_record() {
    let schema = Schema::new();
    let session = schema.many_to_many_session(0);

    session.unlink_selected(&[0]).unwrap();
    assert_eq!(session.feature_ids_to_unlink(), vec![1]);

    // Relink it: the persisted join row still covers the link.
    let row = session.candidates_model().source().index_of(1).unwrap();
    session.link_selected(&[row]).unwrap();
    assert!(session.pending_join_records().is_empty());
    assert!(!session.has_pending_changes());
}

#[test]
fn test_committing_join_records_closes_the_loop() {
    let schema = Schema::new();
    let session = schema.many_to_many_session(0);

    session.link_all().unwrap();
    let records = session.pending_join_records();
    assert_eq!(records.len(), 1);
    schema.join_layer.add_features(records);

    let session = schema.many_to_many_session(0);
    assert_eq!(session.linked_model().len(), 3);
    assert!(session.candidates_model().source().is_empty());
}

#[test]
fn test_polymorphic_base_relation_adds_discriminator() {
    let schema = Schema::new();
    let base = Rc::new(
        Relation::new(
            "join_layer.vl1",
            schema.join_layer.clone(),
            schema.layer1.clone(),
            &[("fk_layer1", "pk")],
        )
        .polymorphic("parent_layer"),
    );
    let session = LinkManagerController::new(
        base,
        Some(schema.relation_nm.clone()),
        schema.feature_with_pk(&schema.layer1, 1),
        Cardinality::ManyToMany,
        None,
    );

    session.link_all().unwrap();
    let records = session.pending_join_records();
    assert!(!records.is_empty());
    for record in &records {
        assert_eq!(record.get("parent_layer"), Some(&Value::Text("vl1".into())));
        assert_eq!(record.get("fk_layer1"), Some(&Value::Int(1)));
    }
}

// ============================================================================
// Linked tree
// ============================================================================

#[test]
fn test_tree_shows_persisted_join_rows_as_children() {
    let schema = Schema::new();
    let session = schema.many_to_many_session(0);

    let tree = session.linked_feature_tree();
    assert_eq!(tree.len(), 2);

    let join_pks: Vec<Value> = tree
        .iter()
        .map(|row| {
            assert_eq!(row.children.len(), 1);
            let FeatureNode::JoinChild {
                feature, persisted, ..
            } = &row.children[0]
            else {
                panic!("expected a join child");
            };
            assert!(*persisted);
            feature.attribute("pk")
        })
        .collect();
    assert_eq!(join_pks, vec![Value::Int(101), Value::Int(103)]);
}

#[test]
fn test_tree_synthesizes_rows_for_pending_links() {
    let schema = Schema::new();
    let session = schema.many_to_many_session(0);

    session.link_all().unwrap(); // links Layer2-12
    let tree = session.linked_feature_tree();
    assert_eq!(tree.len(), 3);

    let FeatureNode::JoinChild {
        feature, persisted, ..
    } = &tree[2].children[0]
    else {
        panic!("expected a join child");
    };
    assert!(!*persisted);
    assert_eq!(feature.attribute("fk_layer1"), Value::Int(0));
    assert_eq!(feature.attribute("fk_layer2"), Value::Int(12));
}

#[test]
fn test_one_to_many_tree_has_no_children() {
    let schema = Schema::new();
    let session = schema.one_to_many_session(10);

    let tree = session.linked_feature_tree();
    assert_eq!(tree.len(), 1);
    assert!(tree[0].children.is_empty());
    assert!(matches!(tree[0].node, FeatureNode::Leaf(_)));
}
