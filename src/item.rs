//! List items and their link-state machine.
//!
//! Every row of the two editor lists is a [`FeatureItem`]: a feature
//! snapshot, its [`LinkState`], and the display string cached at
//! construction so scrolling never re-renders expressions.
//!
//! The state machine is deliberately tiny. Moving an item to the
//! linked side undoes a pending unlink, otherwise it schedules a link;
//! moving it to the unlinked side is the mirror image. Nothing touches
//! the stores until the host application commits.

use crate::feature::{Feature, FeatureId};
use crate::store::FeatureStore;

/// Link status of a feature relative to the edited parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LinkState {
    /// Persisted link, no pending change.
    Linked,
    /// No link, no pending change.
    Unlinked,
    /// Link scheduled for the next commit.
    ToBeLinked,
    /// Unlink scheduled for the next commit.
    ToBeUnlinked,
}

impl LinkState {
    /// State after the item is moved to the linked (right) list.
    pub fn moved_to_linked_side(self) -> Self {
        match self {
            LinkState::ToBeUnlinked => LinkState::Linked,
            _ => LinkState::ToBeLinked,
        }
    }

    /// State after the item is moved to the unlinked (left) list.
    pub fn moved_to_unlinked_side(self) -> Self {
        match self {
            LinkState::ToBeLinked => LinkState::Unlinked,
            _ => LinkState::ToBeUnlinked,
        }
    }

    /// Whether a commit would change this feature.
    pub fn is_pending(self) -> bool {
        matches!(self, LinkState::ToBeLinked | LinkState::ToBeUnlinked)
    }

    pub fn display_icon(self) -> DisplayIcon {
        match self {
            LinkState::Linked | LinkState::Unlinked => DisplayIcon::NoAction,
            LinkState::ToBeLinked => DisplayIcon::PendingLink,
            LinkState::ToBeUnlinked => DisplayIcon::PendingUnlink,
        }
    }
}

/// Decoration shown next to a row, derived from its state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayIcon {
    NoAction,
    PendingLink,
    PendingUnlink,
}

/// One row of a feature list.
#[derive(Clone, Debug)]
pub struct FeatureItem {
    feature: Feature,
    state: LinkState,
    display_string: String,
}

impl FeatureItem {
    /// Snapshot `feature` and cache its display string from `store`.
    pub fn new(feature: Feature, state: LinkState, store: &dyn FeatureStore) -> Self {
        let display_string = store.display_string(&feature);
        Self {
            feature,
            state,
            display_string,
        }
    }

    pub fn feature(&self) -> &Feature {
        &self.feature
    }

    pub fn feature_id(&self) -> FeatureId {
        self.feature.id()
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn set_state(&mut self, state: LinkState) {
        self.state = state;
    }

    pub fn display_string(&self) -> &str {
        &self.display_string
    }

    pub fn display_icon(&self) -> DisplayIcon {
        self.state.display_icon()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{AttributeMap, Value};
    use crate::store::MemoryLayer;

    // ========================================================================
    // LinkState transitions
    // ========================================================================

    #[test]
    fn test_unlinked_moved_right_becomes_to_be_linked() {
        assert_eq!(
            LinkState::Unlinked.moved_to_linked_side(),
            LinkState::ToBeLinked
        );
    }

    #[test]
    fn test_to_be_unlinked_moved_right_restores_linked() {
        assert_eq!(
            LinkState::ToBeUnlinked.moved_to_linked_side(),
            LinkState::Linked
        );
    }

    #[test]
    fn test_linked_moved_left_becomes_to_be_unlinked() {
        assert_eq!(
            LinkState::Linked.moved_to_unlinked_side(),
            LinkState::ToBeUnlinked
        );
    }

    #[test]
    fn test_to_be_linked_moved_left_restores_unlinked() {
        assert_eq!(
            LinkState::ToBeLinked.moved_to_unlinked_side(),
            LinkState::Unlinked
        );
    }

    #[test]
    fn test_roundtrips_are_identity() {
        for state in [LinkState::Linked, LinkState::ToBeUnlinked] {
            assert_eq!(
                state.moved_to_unlinked_side().moved_to_linked_side(),
                LinkState::Linked
            );
        }
        for state in [LinkState::Unlinked, LinkState::ToBeLinked] {
            assert_eq!(
                state.moved_to_linked_side().moved_to_unlinked_side(),
                LinkState::Unlinked
            );
        }
    }

    #[test]
    fn test_pending_states() {
        assert!(LinkState::ToBeLinked.is_pending());
        assert!(LinkState::ToBeUnlinked.is_pending());
        assert!(!LinkState::Linked.is_pending());
        assert!(!LinkState::Unlinked.is_pending());
    }

    // ========================================================================
    // Display decoration
    // ========================================================================

    #[test]
    fn test_display_icon_follows_state() {
        assert_eq!(LinkState::Linked.display_icon(), DisplayIcon::NoAction);
        assert_eq!(LinkState::Unlinked.display_icon(), DisplayIcon::NoAction);
        assert_eq!(
            LinkState::ToBeLinked.display_icon(),
            DisplayIcon::PendingLink
        );
        assert_eq!(
            LinkState::ToBeUnlinked.display_icon(),
            DisplayIcon::PendingUnlink
        );
    }

    // ========================================================================
    // FeatureItem caching
    // ========================================================================

    #[test]
    fn test_display_string_is_cached_at_construction() {
        let layer = MemoryLayer::with_display("vl1", |f| format!("Layer1-{}", f.attribute("pk")));
        let id = layer.add_feature(AttributeMap::from([("pk".to_string(), Value::Int(3))]));
        let feature = layer.feature(id).unwrap();

        let item = FeatureItem::new(feature, LinkState::Linked, &layer);
        assert_eq!(item.display_string(), "Layer1-3");

        // Later store edits do not reach the cached string.
        layer.set_attribute(id, "pk", Value::Int(9));
        assert_eq!(item.display_string(), "Layer1-3");
    }

    #[test]
    fn test_item_state_mutation() {
        let layer = MemoryLayer::new("vl");
        let id = layer.add_feature(AttributeMap::new());
        let feature = layer.feature(id).unwrap();

        let mut item = FeatureItem::new(feature, LinkState::Unlinked, &layer);
        assert_eq!(item.display_icon(), DisplayIcon::NoAction);

        item.set_state(item.state().moved_to_linked_side());
        assert_eq!(item.state(), LinkState::ToBeLinked);
        assert_eq!(item.display_icon(), DisplayIcon::PendingLink);
    }
}
