//! Shape reference graph
//!
//! A directed graph over shape IDs built from selected model relationships.
//! Uses petgraph for cycle detection.

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

use super::id::ShapeId;
use super::model::Model;
use super::neighbor::{NeighborProvider, Relationship};

/// A directed graph of shape references
///
/// Edge weights carry the ID of the shape that introduced the edge (for
/// member targets, the member).
#[derive(Debug, Default)]
pub struct ShapeGraph {
    graph: DiGraph<ShapeId, ShapeId>,
    node_map: HashMap<ShapeId, NodeIndex>,
}

impl ShapeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from every relationship accepted by `include`
    ///
    /// Member relationships are collapsed: a `container -> member -> target`
    /// path becomes one `container -> target` edge labelled with the member.
    pub fn from_model<F>(model: &Model, include: F) -> Self
    where
        F: Fn(&Relationship<'_>) -> bool,
    {
        let provider = NeighborProvider::new(model);
        let mut graph = Self::new();

        for shape in model.shapes().filter(|s| !s.is_member()) {
            for relationship in provider.neighbors(shape) {
                if relationship.shape.id() != shape.id() || !include(&relationship) {
                    continue;
                }
                match relationship.neighbor {
                    Some(member) if member.is_member() => {
                        if let Some(target) = member.target() {
                            graph.add_edge(shape.id(), target, member.id());
                        }
                    }
                    _ => graph.add_edge(shape.id(), &relationship.neighbor_id, shape.id()),
                }
            }
        }

        graph
    }

    fn node(&mut self, id: &ShapeId) -> NodeIndex {
        if let Some(idx) = self.node_map.get(id) {
            return *idx;
        }
        let idx = self.graph.add_node(id.clone());
        self.node_map.insert(id.clone(), idx);
        idx
    }

    pub fn add_edge(&mut self, from: &ShapeId, to: &ShapeId, via: &ShapeId) {
        let from_idx = self.node(from);
        let to_idx = self.node(to);
        self.graph.add_edge(from_idx, to_idx, via.clone());
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns every cycle as a sorted list of the shapes that form it
    ///
    /// A shape that references itself directly is a cycle of one.
    pub fn cycles(&self) -> Vec<Vec<ShapeId>> {
        let mut cycles: Vec<Vec<ShapeId>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || self
                        .graph
                        .find_edge(component[0], component[0])
                        .is_some()
            })
            .map(|component| {
                let mut ids: Vec<ShapeId> = component
                    .into_iter()
                    .filter_map(|idx| self.graph.node_weight(idx).cloned())
                    .collect();
                ids.sort();
                ids
            })
            .collect();
        cycles.sort();
        cycles
    }

    /// IDs of the shapes that introduced edges from `from` to `to`
    pub fn edges_between(&self, from: &ShapeId, to: &ShapeId) -> Vec<&ShapeId> {
        let (Some(a), Some(b)) = (self.node_map.get(from), self.node_map.get(to)) else {
            return Vec::new();
        };
        self.graph
            .edges_connecting(*a, *b)
            .map(|edge| edge.weight())
            .collect()
    }
}
