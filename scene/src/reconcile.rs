use std::collections::HashSet;
use std::time::Duration;

use mapgeom::ScreenPt;

use crate::Color;

/// A stable handle for one marker node. Survives repositioning; only
/// assigned fresh when a key enters the set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub u64);

/// What a marker looks like right now. Everything here is replaced wholesale
/// on each update; identity lives in the owning node.
#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    pub pt: ScreenPt,
    pub fill: Color,
    pub class: String,
    pub label: String,
    pub radius: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MarkerNode {
    pub id: NodeId,
    pub key: String,
    pub marker: Marker,
    /// Set when the last update moved this marker, for animating the hop.
    pub transition: Option<Transition>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub from: ScreenPt,
    pub duration: Duration,
}

/// The live marker layer, diffed against each incoming update so surviving
/// keys keep their node (and so their on-screen continuity) instead of being
/// torn down and redrawn.
pub struct MarkerSet {
    nodes: Vec<MarkerNode>,
    next_id: u64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReconcileStats {
    pub added: usize,
    pub moved: usize,
    pub removed: usize,
    pub unchanged: usize,
}

impl MarkerSet {
    pub fn new() -> MarkerSet {
        MarkerSet {
            nodes: Vec::new(),
            next_id: 0,
        }
    }

    /// Replaces the set's contents with `updates`, preserving nodes whose key
    /// survives. Absent keys are dropped, surviving keys are repositioned in
    /// place (recording a transition when the position actually changed), new
    /// keys are appended in update order. The first call draws everything
    /// fresh, with no transitions.
    pub fn reconcile(
        &mut self,
        updates: Vec<(String, Marker)>,
        transition: Duration,
    ) -> ReconcileStats {
        let staged_keys: HashSet<&str> = updates.iter().map(|(key, _)| key.as_str()).collect();

        let before = self.nodes.len();
        self.nodes
            .retain(|node| staged_keys.contains(node.key.as_str()));
        let removed = before - self.nodes.len();

        let mut stats = ReconcileStats {
            added: 0,
            moved: 0,
            removed,
            unchanged: 0,
        };
        for (key, marker) in updates {
            if let Some(node) = self.nodes.iter_mut().find(|n| n.key == key) {
                // Positions come from the same projection each time, so exact
                // comparison detects a genuine move.
                if node.marker.pt != marker.pt {
                    node.transition = Some(Transition {
                        from: node.marker.pt,
                        duration: transition,
                    });
                    stats.moved += 1;
                } else {
                    node.transition = None;
                    stats.unchanged += 1;
                }
                node.marker = marker;
            } else {
                let id = NodeId(self.next_id);
                self.next_id += 1;
                self.nodes.push(MarkerNode {
                    id,
                    key,
                    marker,
                    transition: None,
                });
                stats.added += 1;
            }
        }
        stats
    }

    pub fn nodes(&self) -> &[MarkerNode] {
        &self.nodes
    }

    pub fn get(&self, key: &str) -> Option<&MarkerNode> {
        self.nodes.iter().find(|n| n.key == key)
    }

    pub fn keys(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.key.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Default for MarkerSet {
    fn default() -> Self {
        MarkerSet::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(x: f64, y: f64) -> Marker {
        Marker {
            pt: ScreenPt::new(x, y),
            fill: Color::RED,
            class: "route-5".to_string(),
            label: "5".to_string(),
            radius: 3.0,
        }
    }

    fn update(key: &str, x: f64, y: f64) -> (String, Marker) {
        (key.to_string(), marker(x, y))
    }

    const DUR: Duration = Duration::from_millis(900);

    #[test]
    fn keys_track_the_latest_update() {
        let mut set = MarkerSet::new();
        let stats = set.reconcile(vec![update("a", 1.0, 1.0), update("b", 2.0, 2.0)], DUR);
        assert_eq!((stats.added, stats.moved, stats.removed), (2, 0, 0));
        assert_eq!(set.keys(), vec!["a", "b"]);

        let stats = set.reconcile(vec![update("b", 2.0, 2.0), update("c", 3.0, 3.0)], DUR);
        assert_eq!((stats.added, stats.moved, stats.removed), (1, 0, 1));
        assert_eq!(set.keys(), vec!["b", "c"]);

        let stats = set.reconcile(Vec::new(), DUR);
        assert_eq!(stats.removed, 2);
        assert!(set.is_empty());
    }

    #[test]
    fn surviving_keys_keep_their_node() {
        let mut set = MarkerSet::new();
        set.reconcile(vec![update("a", 1.0, 1.0)], DUR);
        let id = set.get("a").unwrap().id;

        set.reconcile(vec![update("a", 5.0, 6.0)], DUR);
        let node = set.get("a").unwrap();
        assert_eq!(node.id, id);
        assert_eq!(node.marker.pt, ScreenPt::new(5.0, 6.0));
        assert_eq!(
            node.transition,
            Some(Transition {
                from: ScreenPt::new(1.0, 1.0),
                duration: DUR,
            })
        );
    }

    #[test]
    fn a_key_that_leaves_and_returns_is_a_new_node() {
        let mut set = MarkerSet::new();
        set.reconcile(vec![update("a", 1.0, 1.0)], DUR);
        let id = set.get("a").unwrap().id;

        set.reconcile(Vec::new(), DUR);
        set.reconcile(vec![update("a", 1.0, 1.0)], DUR);
        assert_ne!(set.get("a").unwrap().id, id);
    }

    #[test]
    fn first_render_and_holds_record_no_transition() {
        let mut set = MarkerSet::new();
        set.reconcile(vec![update("a", 1.0, 1.0)], DUR);
        assert_eq!(set.get("a").unwrap().transition, None);

        // A marker that didn't move clears any previous transition.
        set.reconcile(vec![update("a", 4.0, 4.0)], DUR);
        assert!(set.get("a").unwrap().transition.is_some());
        let stats = set.reconcile(vec![update("a", 4.0, 4.0)], DUR);
        assert_eq!(stats.unchanged, 1);
        assert_eq!(set.get("a").unwrap().transition, None);
    }

    #[test]
    fn new_keys_append_after_survivors() {
        let mut set = MarkerSet::new();
        set.reconcile(vec![update("a", 1.0, 1.0), update("b", 2.0, 2.0)], DUR);
        // "z" sorts before nothing here; order is update order, not key order.
        set.reconcile(
            vec![update("z", 9.0, 9.0), update("a", 1.0, 1.0), update("b", 2.0, 2.0)],
            DUR,
        );
        assert_eq!(set.keys(), vec!["a", "b", "z"]);
    }
}
