//! Tests for synaptic-core: identity types, value enums, errors

use synaptic_core::*;

// ===========================================================================
// AtomId
// ===========================================================================

#[test]
fn atom_id_new_and_display() {
    let id = AtomId::new("atom-42");
    assert_eq!(id.as_str(), "atom-42");
    assert_eq!(format!("{}", id), "atom-42");
}

#[test]
fn atom_id_clone_shares_storage() {
    let id = AtomId::new("shared");
    let cloned = id.clone();
    assert_eq!(id, cloned);
    assert!(std::ptr::eq(id.as_str(), cloned.as_str()));
}

#[test]
fn atom_id_borrows_as_str_for_map_lookup() {
    use std::collections::BTreeMap;
    let mut map = BTreeMap::new();
    map.insert(AtomId::new("a"), 1);
    assert_eq!(map.get("a"), Some(&1));
    assert_eq!(map.get("b"), None);
}

#[test]
fn atom_id_derefs_to_str() {
    fn takes_str(s: &str) -> usize {
        s.len()
    }
    let id = AtomId::from("abc");
    assert_eq!(takes_str(&id), 3);
    assert!(id.starts_with("ab"));
}

#[test]
fn atom_id_serializes_as_plain_string() {
    let id = AtomId::from("love-1");
    assert_eq!(serde_json::to_string(&id).unwrap(), r#""love-1""#);
    let back: AtomId = serde_json::from_str(r#""love-1""#).unwrap();
    assert_eq!(back, id);
}

// ===========================================================================
// EdgeKind / ActivationLevel
// ===========================================================================

#[test]
fn edge_kind_serializes_lowercase() {
    assert_eq!(serde_json::to_string(&EdgeKind::Semantic).unwrap(), r#""semantic""#);
    assert_eq!(serde_json::to_string(&EdgeKind::Hierarchical).unwrap(), r#""hierarchical""#);
    assert_eq!(EdgeKind::Causal.to_string(), "causal");
}

#[test]
fn activation_level_is_ordered_by_intensity() {
    let levels = ActivationLevel::ALL;
    for pair in levels.windows(2) {
        assert!(pair[0] < pair[1]);
        assert!(pair[0].decay_factor() > pair[1].decay_factor());
    }
}

#[test]
fn activation_level_decay_factors() {
    assert_eq!(ActivationLevel::Dormant.decay_factor(), 1.0);
    assert_eq!(ActivationLevel::Low.decay_factor(), 0.9);
    assert_eq!(ActivationLevel::Moderate.decay_factor(), 0.7);
    assert_eq!(ActivationLevel::High.decay_factor(), 0.5);
    assert_eq!(ActivationLevel::Peak.decay_factor(), 0.2);
}

#[test]
fn activation_level_high_threshold() {
    assert!(!ActivationLevel::Moderate.is_high());
    assert!(ActivationLevel::High.is_high());
    assert!(ActivationLevel::Peak.is_high());
}

// ===========================================================================
// Error
// ===========================================================================

#[test]
fn error_display_messages() {
    assert_eq!(Error::DuplicateAtom("x".into()).to_string(), "atom already exists: x");
    assert_eq!(
        Error::malformed("edge to unknown atom").to_string(),
        "malformed snapshot: edge to unknown atom"
    );
    assert_eq!(Error::non_finite("y").to_string(), "non-finite weight on atom y");
}

#[test]
fn error_from_json() {
    let err: Error = serde_json::from_str::<serde_json::Value>("{not json")
        .unwrap_err()
        .into();
    assert!(matches!(err, Error::JsonError(_)));
}
