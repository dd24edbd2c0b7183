//! Branching river trees grown from ocean-side drain points.
//!
//! A network holds one tree per drain. Trees grow by appending edges
//! upstream: each new vertex continues from the previous one at a slightly
//! turned angle and a slightly shorter length. Edges that would leave the
//! legal area, cross another edge, or pass too close to one are rejected.
//! Trees with too few edges are discarded. All trees share one RNG and are
//! grown interleaved, so the result depends only on the RNG seed.

use std::collections::VecDeque;
use std::f64::consts::TAU;

use glam::DVec2;
use rand::Rng;

use super::fractal::distance_to_segment_sq;
use crate::seed::{det_cos, det_sin};

/// Smallest angle between a branch and the edge it leaves from.
pub const MIN_BRANCH_ANGLE: f64 = 0.4;
/// Branch edges are only queued for further branching at least this many
/// edges from the drain.
pub const MIN_BRANCH_DISTANCE: u32 = 2;
/// Trees with fewer edges are discarded.
pub const MIN_RIVER_EDGE_COUNT: usize = 6;

/// A point in a river tree.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub id: u32,
    pub pos: DVec2,
    /// Heading from the downstream neighbour to this vertex.
    pub angle: f64,
    /// Length of the next edge grown from this vertex.
    pub length: f64,
    /// Number of edges between this vertex and the drain.
    pub distance: u32,
}

/// One river segment. Water flows from `source` to `drain`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
    pub source: Vertex,
    pub drain: Vertex,
}

impl Edge {
    /// Whether this edge is too close to `candidate`, ignoring edges that
    /// share the candidate's drain vertex.
    fn conflicts(&self, candidate: &Edge, feather_sq: f64) -> bool {
        let shared = candidate.drain.id;
        if self.source.id == shared || self.drain.id == shared {
            return false;
        }
        distance_to_segment_sq(self.source.pos, self.drain.pos, candidate.source.pos) < feather_sq
            || segments_intersect(
                self.source.pos,
                self.drain.pos,
                candidate.source.pos,
                candidate.drain.pos,
            )
    }
}

/// Growth parameters for one tree.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RiverParams {
    pub length: f64,
    pub depth: u32,
    pub feather: f64,
}

struct Tree {
    root: Vertex,
    edges: Vec<Edge>,
    branch_queue: VecDeque<Edge>,
    params: RiverParams,
}

impl Tree {
    fn priority(&self) -> usize {
        self.edges.len() + 10 * self.branch_queue.len()
    }

    fn prune_if_too_short(&mut self) {
        if self.edges.len() < MIN_RIVER_EDGE_COUNT {
            self.edges.clear();
            self.branch_queue.clear();
        }
    }

    fn can_branch_from(&self, vertex: &Vertex) -> bool {
        vertex.distance < self.params.depth && vertex.distance >= MIN_BRANCH_DISTANCE
    }
}

/// A set of river trees grown together so they never cross each other.
pub struct RiverNetwork {
    trees: Vec<Tree>,
    next_id: u32,
}

impl Default for RiverNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl RiverNetwork {
    pub fn new() -> Self {
        Self {
            trees: Vec::new(),
            next_id: 0,
        }
    }

    /// Add a tree draining at `drain`, growing initially along `angle`.
    pub fn add_river(&mut self, drain: DVec2, angle: f64, params: RiverParams) {
        let root = Vertex {
            id: self.fresh_id(),
            pos: drain,
            angle,
            length: params.length,
            distance: 0,
        };
        self.trees.push(Tree {
            root,
            edges: Vec::new(),
            branch_queue: VecDeque::new(),
            params,
        });
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Grow every tree to completion and return the surviving edge lists,
    /// one per tree, in insertion order. Trees that were pruned come back empty.
    ///
    /// `is_legal` decides whether a new upstream vertex may be placed.
    pub fn build<R, F>(mut self, rng: &mut R, is_legal: F) -> Vec<Vec<Edge>>
    where
        R: Rng + ?Sized,
        F: Fn(DVec2) -> bool,
    {
        for index in 0..self.trees.len() {
            self.grow_trunk(index, rng, &is_legal);
        }

        let mut working: Vec<usize> = (0..self.trees.len())
            .filter(|&i| !self.trees[i].edges.is_empty())
            .collect();
        while !working.is_empty() {
            // Largest tree first; ties go to the earliest tree.
            let Some((slot, &index)) = working.iter().enumerate().max_by(|(ia, a), (ib, b)| {
                self.trees[**a]
                    .priority()
                    .cmp(&self.trees[**b].priority())
                    .then(ib.cmp(ia))
            }) else {
                break;
            };
            if self.grow_branch(index, rng, &is_legal) {
                working.remove(slot);
            }
        }

        self.trees.into_iter().map(|tree| tree.edges).collect()
    }

    fn fresh_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn next_vertex<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        previous: &Vertex,
        distance: u32,
    ) -> Vertex {
        let angle = if distance == 0 {
            previous.angle
        } else {
            let turn = rng.random::<f64>() * 0.5 + 0.2;
            if rng.random_bool(0.5) {
                previous.angle + turn
            } else {
                previous.angle - turn
            }
        };
        let length = previous.length * (rng.random::<f64>() * 0.08 + 0.92);
        let pos = previous.pos + DVec2::new(det_cos(angle), det_sin(angle)) * length;
        Vertex {
            id: self.fresh_id(),
            pos,
            angle,
            length,
            distance: distance + 1,
        }
    }

    fn blocked<F: Fn(DVec2) -> bool>(
        &self,
        index: usize,
        candidate: &Edge,
        pending: &[Edge],
        is_legal: &F,
    ) -> bool {
        if !is_legal(candidate.source.pos) {
            return true;
        }
        let own_feather = self.trees[index].params.feather;
        pending
            .iter()
            .any(|e| e.conflicts(candidate, own_feather * own_feather))
            || self.trees.iter().any(|tree| {
                let feather_sq = tree.params.feather * tree.params.feather;
                tree.edges.iter().any(|e| e.conflicts(candidate, feather_sq))
            })
    }

    fn grow_trunk<R: Rng + ?Sized, F: Fn(DVec2) -> bool>(
        &mut self,
        index: usize,
        rng: &mut R,
        is_legal: &F,
    ) {
        let params = self.trees[index].params;
        let extra = (params.depth as f64 * 0.3) as u32;
        let count = params.depth + rng.random_range(0..=extra);

        let mut previous = self.trees[index].root;
        for _ in 0..count {
            let next = self.next_vertex(rng, &previous, previous.distance);
            let edge = Edge {
                source: next,
                drain: previous,
            };
            if self.blocked(index, &edge, &[], is_legal) {
                break;
            }
            let tree = &mut self.trees[index];
            tree.edges.push(edge);
            if next.distance < params.depth {
                tree.branch_queue.push_back(edge);
            }
            previous = next;
        }
        self.trees[index].prune_if_too_short();
    }

    /// Try one branch. Returns `true` once the tree has nothing left to grow.
    fn grow_branch<R: Rng + ?Sized, F: Fn(DVec2) -> bool>(
        &mut self,
        index: usize,
        rng: &mut R,
        is_legal: &F,
    ) -> bool {
        let Some(from) = self.trees[index].branch_queue.pop_front() else {
            self.trees[index].prune_if_too_short();
            return true;
        };
        let params = self.trees[index].params;

        let start = from.drain;
        let start_distance = start.distance + rng.random_range(0..3);
        let first = self.next_vertex(rng, &start, start_distance);
        let delta = (from.source.angle - first.angle).rem_euclid(TAU);
        if delta < MIN_BRANCH_ANGLE || TAU - delta < MIN_BRANCH_ANGLE {
            return false;
        }
        let first_edge = Edge {
            source: first,
            drain: start,
        };
        if self.blocked(index, &first_edge, &[], is_legal) {
            return false;
        }

        let mut branch = vec![first_edge];
        let mut previous = first;
        let extra = (params.depth as f64 * 0.3) as u32;
        let count = (params.depth + rng.random_range(0..=extra)).saturating_sub(previous.distance);
        for _ in 0..count {
            let next = self.next_vertex(rng, &previous, previous.distance);
            let edge = Edge {
                source: next,
                drain: previous,
            };
            if self.blocked(index, &edge, &branch, is_legal) {
                break;
            }
            branch.push(edge);
            previous = next;
        }

        let tree = &mut self.trees[index];
        for edge in branch {
            if tree.can_branch_from(&edge.source) {
                tree.branch_queue.push_back(edge);
            }
            tree.edges.push(edge);
        }
        false
    }
}

fn orientation(a: DVec2, b: DVec2, c: DVec2) -> f64 {
    (b - a).perp_dot(c - a)
}

/// Whether the closed segments `a1..a2` and `b1..b2` cross.
pub fn segments_intersect(a1: DVec2, a2: DVec2, b1: DVec2, b2: DVec2) -> bool {
    let d1 = orientation(b1, b2, a1);
    let d2 = orientation(b1, b2, a2);
    let d3 = orientation(a1, a2, b1);
    let d4 = orientation(a1, a2, b2);
    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }
    let on_segment = |p: DVec2, q: DVec2, r: DVec2| {
        r.x >= p.x.min(q.x) && r.x <= p.x.max(q.x) && r.y >= p.y.min(q.y) && r.y <= p.y.max(q.y)
    };
    (d1 == 0.0 && on_segment(b1, b2, a1))
        || (d2 == 0.0 && on_segment(b1, b2, a2))
        || (d3 == 0.0 && on_segment(a1, a2, b1))
        || (d4 == 0.0 && on_segment(a1, a2, b2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const PARAMS: RiverParams = RiverParams {
        length: 0.8,
        depth: 14,
        feather: 0.2,
    };

    fn grow(seed: u64, drains: &[(DVec2, f64)], legal: impl Fn(DVec2) -> bool) -> Vec<Vec<Edge>> {
        let mut network = RiverNetwork::new();
        for &(drain, angle) in drains {
            network.add_river(drain, angle, PARAMS);
        }
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        network.build(&mut rng, legal)
    }

    fn open_field(p: DVec2) -> bool {
        p.x.abs() < 30.0 && p.y.abs() < 30.0
    }

    #[test]
    fn test_trees_are_deterministic() {
        let drains = [(DVec2::new(-10.0, 0.0), 0.0), (DVec2::new(10.0, 0.0), std::f64::consts::PI)];
        assert_eq!(grow(4, &drains, open_field), grow(4, &drains, open_field));
    }

    #[test]
    fn test_surviving_trees_meet_minimum_size() {
        for seed in 0..20 {
            for edges in grow(seed, &[(DVec2::ZERO, 1.0)], open_field) {
                assert!(edges.is_empty() || edges.len() >= MIN_RIVER_EDGE_COUNT);
            }
        }
    }

    #[test]
    fn test_all_vertices_legal() {
        let legal = |p: DVec2| p.x > -0.5 && p.x < 12.0 && p.y.abs() < 8.0;
        for seed in 0..10 {
            for edges in grow(seed, &[(DVec2::ZERO, 0.0)], legal) {
                for edge in &edges {
                    assert!(legal(edge.source.pos), "illegal vertex {:?}", edge.source.pos);
                }
            }
        }
    }

    #[test]
    fn test_edges_connect_toward_drain() {
        let trees = grow(11, &[(DVec2::ZERO, 0.5)], open_field);
        let edges = &trees[0];
        assert!(!edges.is_empty());
        for edge in edges {
            assert!(edge.source.distance > edge.drain.distance);
            if edge.drain.distance > 0 {
                assert!(
                    edges.iter().any(|e| e.source.id == edge.drain.id),
                    "edge drains into a vertex that is not part of the tree"
                );
            }
        }
    }

    #[test]
    fn test_no_edges_cross() {
        let drains = [(DVec2::new(-6.0, 0.0), 0.0), (DVec2::new(6.0, 0.0), std::f64::consts::PI)];
        for seed in 0..8 {
            let all: Vec<Edge> = grow(seed, &drains, open_field).into_iter().flatten().collect();
            for (i, a) in all.iter().enumerate() {
                for b in &all[i + 1..] {
                    let shares_vertex = [a.source.id, a.drain.id]
                        .iter()
                        .any(|id| *id == b.source.id || *id == b.drain.id);
                    if !shares_vertex {
                        assert!(
                            !segments_intersect(a.source.pos, a.drain.pos, b.source.pos, b.drain.pos),
                            "edges cross for seed {seed}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_tiny_legal_area_prunes_tree() {
        let legal = |p: DVec2| p.length() < 1.0;
        let trees = grow(3, &[(DVec2::ZERO, 0.0)], legal);
        assert!(trees[0].is_empty());
    }

    #[test]
    fn test_segments_intersect() {
        let p = DVec2::new;
        assert!(segments_intersect(p(0.0, 0.0), p(2.0, 2.0), p(0.0, 2.0), p(2.0, 0.0)));
        assert!(!segments_intersect(p(0.0, 0.0), p(1.0, 0.0), p(0.0, 1.0), p(1.0, 1.0)));
        assert!(segments_intersect(p(0.0, 0.0), p(2.0, 0.0), p(1.0, 0.0), p(1.0, 5.0)));
    }
}
