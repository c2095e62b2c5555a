//! Selector evaluation over a model's neighbor index

use super::ast::{Direction, NeighborStep, Step};
use super::attribute::{matches_attribute, matches_scoped};
use crate::domain::{
    Model, NeighborIndex, NeighborProvider, RelationshipType, Shape, ShapeId, ShapeType,
};
use std::collections::{BTreeSet, VecDeque};

pub(crate) type ShapeSet<'m> = BTreeSet<&'m ShapeId>;

pub(crate) struct Evaluator<'m> {
    model: &'m Model,
    index: NeighborIndex<'m>,
}

impl<'m> Evaluator<'m> {
    pub(crate) fn new(model: &'m Model, trait_relationships: bool) -> Self {
        let provider = if trait_relationships {
            NeighborProvider::with_trait_relationships(model)
        } else {
            NeighborProvider::new(model)
        };
        Self {
            model,
            index: NeighborIndex::new(&provider),
        }
    }

    pub(crate) fn all_shapes(&self) -> ShapeSet<'m> {
        self.model.shape_ids().collect()
    }

    fn shape(&self, id: &ShapeId) -> Option<&'m Shape> {
        self.model.get_shape(id)
    }

    pub(crate) fn eval(&self, steps: &[Step], input: ShapeSet<'m>) -> ShapeSet<'m> {
        steps
            .iter()
            .fold(input, |shapes, step| self.apply(step, shapes))
    }

    fn filter(&self, input: ShapeSet<'m>, predicate: impl Fn(&Shape) -> bool) -> ShapeSet<'m> {
        input
            .into_iter()
            .filter(|id| self.shape(id).is_some_and(&predicate))
            .collect()
    }

    /// True if `steps` yields anything when applied to `id` alone
    fn yields(&self, steps: &[Step], id: &'m ShapeId) -> bool {
        !self.eval(steps, BTreeSet::from([id])).is_empty()
    }

    fn apply(&self, step: &Step, input: ShapeSet<'m>) -> ShapeSet<'m> {
        match step {
            Step::Type(filter) => self.filter(input, |s| filter.matches(s.shape_type())),
            Step::Attribute(filter) => self.filter(input, |s| matches_attribute(s, filter)),
            Step::ScopedAttribute(filter) => self.filter(input, |s| matches_scoped(s, filter)),
            Step::Neighbor(neighbor) => input
                .into_iter()
                .flat_map(|id| self.neighbors(id, neighbor))
                .collect(),
            Step::Recursive => input
                .into_iter()
                .flat_map(|id| self.closure(id))
                .collect(),
            Step::Is(alternatives) => alternatives
                .iter()
                .flat_map(|steps| self.eval(steps, input.clone()))
                .collect(),
            Step::Not(steps) => input
                .into_iter()
                .filter(|id| !self.yields(steps, *id))
                .collect(),
            Step::Test(alternatives) => input
                .into_iter()
                .filter(|id| alternatives.iter().any(|steps| self.yields(steps, *id)))
                .collect(),
            Step::TopDown {
                qualifier,
                disqualifier,
            } => {
                let mut out = BTreeSet::new();
                let roots = self.filter(input, |s| {
                    matches!(
                        s.shape_type(),
                        ShapeType::Service | ShapeType::Resource | ShapeType::Operation
                    )
                });
                for id in roots {
                    let mut visited = BTreeSet::new();
                    let disqualifier = disqualifier.as_deref();
                    self.top_down(id, false, qualifier, disqualifier, &mut visited, &mut out);
                }
                out
            }
        }
    }

    fn neighbors(&self, id: &'m ShapeId, step: &NeighborStep) -> Vec<&'m ShapeId> {
        match step.direction {
            Direction::Forward => self
                .index
                .outgoing(id)
                .iter()
                .filter(|rel| step.accepts(rel.relationship_type))
                .filter_map(|rel| rel.neighbor.map(Shape::id))
                .collect(),
            Direction::Reverse => self
                .index
                .incoming(id)
                .iter()
                .filter(|rel| step.accepts(rel.relationship_type))
                .map(|rel| rel.shape.id())
                .collect(),
        }
    }

    /// Every shape reachable from `root` through directed relationships
    fn closure(&self, root: &'m ShapeId) -> ShapeSet<'m> {
        let any = NeighborStep {
            direction: Direction::Forward,
            labels: Vec::new(),
        };
        let mut visited: ShapeSet<'m> = BTreeSet::new();
        let mut queue: VecDeque<&'m ShapeId> = VecDeque::from([root]);
        while let Some(id) = queue.pop_front() {
            for next in self.neighbors(id, &any) {
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        visited
    }

    /// Walks service, resource and operation bindings from `id`, emitting
    /// shapes while the qualifier holds and no disqualifier has matched
    fn top_down(
        &self,
        id: &'m ShapeId,
        qualified: bool,
        qualifier: &[Step],
        disqualifier: Option<&[Step]>,
        visited: &mut ShapeSet<'m>,
        out: &mut ShapeSet<'m>,
    ) {
        if !visited.insert(id) {
            return;
        }
        let mut qualified = qualified || self.yields(qualifier, id);
        if qualified && disqualifier.is_some_and(|steps| self.yields(steps, id)) {
            qualified = false;
        }
        if qualified {
            out.insert(id);
        }
        let children: Vec<&'m ShapeId> = self
            .index
            .outgoing(id)
            .iter()
            .filter(|rel| {
                matches!(
                    rel.relationship_type,
                    RelationshipType::Resource | RelationshipType::Operation
                )
            })
            .filter_map(|rel| rel.neighbor.map(Shape::id))
            .filter(|child| *child != id)
            .collect();
        for child in children {
            self.top_down(child, qualified, qualifier, disqualifier, visited, out);
        }
    }
}
