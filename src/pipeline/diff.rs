//! Snapshot diffing with stable-identity reconciliation
//!
//! Pure functions: the previous snapshot is only read, the returned snapshot
//! is a fresh value carrying the reconciled ids.

use crate::types::{ElementId, ElementSet, ModelElement, Snapshot, Update};

/// Result of comparing a freshly discovered snapshot with the previous one
#[derive(Debug, Clone)]
pub struct Diff {
    /// New snapshot with ids carried over from the previous one
    pub snapshot: Snapshot,
    pub update: Update,
    /// No previous snapshot existed
    pub first: bool,
}

impl Diff {
    /// Whether the update must be published
    ///
    /// The first model of a log is always published, later ones only when
    /// something changed.
    pub fn should_publish(&self) -> bool {
        self.first || !self.update.is_empty()
    }
}

/// Per-kind outcome of [`reconcile`]
#[derive(Debug, Clone)]
pub struct Reconciled<T: ModelElement> {
    pub set: ElementSet<T>,
    pub added: Vec<T>,
    pub removed: Vec<T>,
}

/// Carry ids from `old` onto equal elements of `new`.
///
/// Elements only present in `new` get freshly generated ids and are reported
/// as added; elements only present in `old` are reported as removed.
pub fn reconcile<T: ModelElement>(old: &ElementSet<T>, new: ElementSet<T>) -> Reconciled<T> {
    let removed = old.difference(&new);
    let mut added = Vec::new();

    let set = new
        .into_iter()
        .map(|element| match old.get(&element.key()) {
            Some(survivor) => element.with_id(survivor.id()),
            None => {
                let element = element.with_id(ElementId::generate());
                added.push(element.clone());
                element
            }
        })
        .collect();

    Reconciled { set, added, removed }
}

fn fresh_ids<T: ModelElement>(set: ElementSet<T>) -> ElementSet<T> {
    set.into_iter()
        .map(|element| element.with_id(ElementId::generate()))
        .collect()
}

/// Compare `next` with `previous` and compute the update for `tenant`
pub fn diff(tenant: &str, previous: Option<&Snapshot>, next: Snapshot) -> Diff {
    let Some(previous) = previous else {
        let snapshot = Snapshot {
            places: fresh_ids(next.places),
            transitions: fresh_ids(next.transitions),
            edges: fresh_ids(next.edges),
        };
        let update = Update::full(tenant, &snapshot);
        return Diff {
            snapshot,
            update,
            first: true,
        };
    };

    let places = reconcile(&previous.places, next.places);
    let transitions = reconcile(&previous.transitions, next.transitions);
    let edges = reconcile(&previous.edges, next.edges);

    let update = Update {
        tenant: tenant.to_string(),
        new_places: places.added,
        removed_places: places.removed,
        new_transitions: transitions.added,
        removed_transitions: transitions.removed,
        new_edges: edges.added,
        removed_edges: edges.removed,
    };

    Diff {
        snapshot: Snapshot {
            places: places.set,
            transitions: transitions.set,
            edges: edges.set,
        },
        update,
        first: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Place, Transition};

    fn model(places: &[&str], transitions: &[&str], edges: &[(&str, &str)]) -> Snapshot {
        let mut snapshot = Snapshot::new();
        for p in places {
            snapshot.add_place(*p);
        }
        for t in transitions {
            snapshot.add_transition(*t);
        }
        for (s, t) in edges {
            snapshot.add_edge(*s, *t);
        }
        snapshot
    }

    fn id_of_place(snapshot: &Snapshot, name: &str) -> ElementId {
        snapshot.places.get(&name.to_string()).unwrap().id
    }

    #[test]
    fn test_first_diff_reports_everything_as_new() {
        let next = model(&["p1", "p2"], &["t1"], &[("p1", "t1")]);
        let engine_ids: Vec<_> = next.places.iter().map(|p| p.id).collect();

        let diff = diff("L", None, next);
        assert!(diff.first);
        assert!(diff.should_publish());
        assert_eq!(diff.update.new_places.len(), 2);
        assert_eq!(diff.update.new_transitions.len(), 1);
        assert_eq!(diff.update.new_edges.len(), 1);
        assert!(diff.update.removed_places.is_empty());
        assert!(diff.update.removed_transitions.is_empty());
        assert!(diff.update.removed_edges.is_empty());

        // Ids are freshly assigned, not taken over from the engine output
        for place in diff.snapshot.places.iter() {
            assert!(!engine_ids.contains(&place.id));
        }
    }

    #[test]
    fn test_first_diff_of_empty_model_is_still_published() {
        let diff = diff("L", None, Snapshot::new());
        assert!(diff.update.is_empty());
        assert!(diff.should_publish());
    }

    #[test]
    fn test_diff_against_itself_is_empty() {
        let first = diff("L", None, model(&["p1"], &["t1"], &[("p1", "t1")]));
        let again = diff("L", Some(&first.snapshot), first.snapshot.clone());

        assert!(!again.first);
        assert!(again.update.is_empty());
        assert!(!again.should_publish());
    }

    #[test]
    fn test_rediscovered_model_is_empty_update() {
        let first = diff("L", None, model(&["p1"], &["t1"], &[("p1", "t1")]));
        // Same content, but new ids from the engine
        let again = diff(
            "L",
            Some(&first.snapshot),
            model(&["p1"], &["t1"], &[("p1", "t1")]),
        );
        assert!(again.update.is_empty());
    }

    #[test]
    fn test_identity_preserved_for_surviving_place() {
        let first = diff("L", None, model(&["p1"], &[], &[]));
        let a = id_of_place(&first.snapshot, "p1");

        let second = diff("L", Some(&first.snapshot), model(&["p1", "p2"], &[], &[]));
        assert_eq!(id_of_place(&second.snapshot, "p1"), a);
        assert_ne!(id_of_place(&second.snapshot, "p2"), a);

        let added: Vec<_> = second.update.new_places.iter().map(|p| p.name.clone()).collect();
        assert_eq!(added, vec!["p2"]);
        assert_eq!(
            second.update.new_places[0].id,
            id_of_place(&second.snapshot, "p2")
        );
    }

    #[test]
    fn test_removed_elements_keep_their_old_ids() {
        let first = diff("L", None, model(&["p1"], &["t1", "t2"], &[("t1", "p1"), ("p1", "t2")]));
        let t2 = first
            .snapshot
            .transitions
            .get(&"t2".to_string())
            .unwrap()
            .id;

        let second = diff("L", Some(&first.snapshot), model(&["p1"], &["t1"], &[("t1", "p1")]));
        assert_eq!(second.update.removed_transitions.len(), 1);
        assert_eq!(second.update.removed_transitions[0].id, t2);
        assert_eq!(second.update.removed_edges.len(), 1);
        assert_eq!(second.update.removed_edges[0].target, "t2");
        assert!(second.update.new_places.is_empty());
    }

    #[test]
    fn test_edge_identity_follows_endpoints() {
        let first = diff("L", None, model(&[], &[], &[("a", "b")]));
        let id = first.snapshot.edges.iter().next().unwrap().id;

        let second = diff("L", Some(&first.snapshot), model(&[], &[], &[("a", "b"), ("b", "a")]));
        let ab = second
            .snapshot
            .edges
            .get(&("a".to_string(), "b".to_string()))
            .unwrap();
        assert_eq!(ab.id, id);
        assert_eq!(second.update.new_edges.len(), 1);
        assert_eq!(second.update.new_edges[0].source, "b");
    }

    #[test]
    fn test_previous_snapshot_is_not_mutated() {
        let first = diff("L", None, model(&["p1"], &[], &[]));
        let before = first.snapshot.clone();
        let _ = diff("L", Some(&first.snapshot), model(&["p2"], &[], &[]));

        assert_eq!(
            id_of_place(&first.snapshot, "p1"),
            id_of_place(&before, "p1")
        );
        assert_eq!(first.snapshot.places.len(), 1);
    }

    #[test]
    fn test_reconcile_generic_over_element_kind() {
        let old: ElementSet<Transition> = [Transition::new("x")].into_iter().collect();
        let new: ElementSet<Transition> = [Transition::new("x"), Transition::new("y")]
            .into_iter()
            .collect();
        let result = reconcile(&old, new);
        assert_eq!(result.added.len(), 1);
        assert!(result.removed.is_empty());
        assert_eq!(
            result.set.get(&"x".to_string()).unwrap().id,
            old.get(&"x".to_string()).unwrap().id
        );

        let old: ElementSet<Place> = [Place::new("gone")].into_iter().collect();
        let result = reconcile(&old, ElementSet::new());
        assert_eq!(result.removed.len(), 1);
        assert!(result.set.is_empty());
    }
}
