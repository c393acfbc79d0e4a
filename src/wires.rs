use std::collections::HashMap;

use crate::grid::{Facing, GridPos};

/// Cardinal direction a wire segment leaves a node in. Indexed like [`Facing`].
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    East = 0,
    North = 1,
    West = 2,
    South = 3,
}

impl Direction {
    pub const ALL: [Self; 4] = [Self::East, Self::North, Self::West, Self::South];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn opposite(self) -> Self {
        Self::ALL[(self.index() + 2) % 4]
    }

    /// Unit step to the neighbouring lattice point.
    pub fn offset(self) -> GridPos {
        Facing::from_index(self.index()).rotate(GridPos::new(1, 0))
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Self::North | Self::South)
    }
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct WireNode {
    pub connections: [bool; 4],
    /// Four-way crossing without an electrical join. Only meaningful when
    /// every direction is connected.
    pub overlap: bool,
}

impl WireNode {
    pub fn all_connected(&self) -> bool {
        self.connections.iter().all(|c| *c)
    }

    pub fn is_connected(&self, dir: Direction) -> bool {
        self.connections[dir.index()]
    }

    pub fn is_empty(&self) -> bool {
        !self.connections.iter().any(|c| *c)
    }

    /// Junction dot: a four-way node that joins electrically.
    pub fn is_junction(&self) -> bool {
        self.all_connected() && !self.overlap
    }

    /// Flips the crossing flag. Returns false and leaves the node untouched
    /// when it is not a four-way node.
    pub fn toggle_overlap(&mut self) -> bool {
        if !self.all_connected() {
            return false;
        }
        self.overlap ^= true;
        true
    }
}

/// Straight, axis-aligned wire run between two lattice points.
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Segment {
    pub start: GridPos,
    pub end: GridPos,
}

impl Segment {
    pub const fn new(start: GridPos, end: GridPos) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn is_orthogonal(&self) -> bool {
        self.start.x == self.end.x || self.start.y == self.end.y
    }

    /// Unit steps from the smaller to the larger end, as (node, direction
    /// towards the next node).
    fn unit_steps(&self) -> Vec<(GridPos, Direction)> {
        let (a, b) = (self.start, self.end);
        if a.x == b.x {
            (a.y.min(b.y)..a.y.max(b.y))
                .map(|y| (GridPos::new(a.x, y), Direction::South))
                .collect()
        } else {
            (a.x.min(b.x)..a.x.max(b.x))
                .map(|x| (GridPos::new(x, a.y), Direction::East))
                .collect()
        }
    }
}

/// How committing a segment treats connections that already exist.
#[derive(serde::Deserialize, serde::Serialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum WirePolicy {
    /// Re-drawing an existing run erases it.
    #[default]
    Toggle,
    /// Segments only ever add connections.
    Additive,
}

/// Sparse wire mesh keyed by lattice point.
#[derive(serde::Deserialize, serde::Serialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct WireNetwork {
    nodes: HashMap<GridPos, WireNode>,
    pub policy: WirePolicy,
}

impl WireNetwork {
    pub fn new(policy: WirePolicy) -> Self {
        Self {
            nodes: HashMap::new(),
            policy,
        }
    }

    pub fn get(&self, pos: GridPos) -> Option<&WireNode> {
        self.nodes.get(&pos)
    }

    pub fn get_mut(&mut self, pos: GridPos) -> Option<&mut WireNode> {
        self.nodes.get_mut(&pos)
    }

    pub fn iter(&self) -> impl Iterator<Item = (GridPos, &WireNode)> {
        self.nodes.iter().map(|(pos, node)| (*pos, node))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Existing mesh merged with hypothetical segments. `self` is untouched.
    pub fn preview(&self, segments: &[Segment]) -> Self {
        let mut merged = self.clone();
        merged.commit(segments);
        merged
    }

    pub fn commit(&mut self, segments: &[Segment]) {
        for segment in segments {
            if segment.is_empty() {
                continue;
            }
            if !segment.is_orthogonal() {
                log::warn!(
                    "ignoring diagonal wire {} -> {}",
                    segment.start,
                    segment.end
                );
                continue;
            }
            for (pos, dir) in segment.unit_steps() {
                self.link(pos, dir);
                self.link(pos + dir.offset(), dir.opposite());
            }
        }
    }

    /// Flips the crossing flag of a fully connected node at `pos`.
    pub fn toggle_crossing(&mut self, pos: GridPos) -> bool {
        self.nodes
            .get_mut(&pos)
            .is_some_and(WireNode::toggle_overlap)
    }

    fn link(&mut self, pos: GridPos, dir: Direction) {
        let node = self.nodes.entry(pos).or_default();
        let slot = &mut node.connections[dir.index()];
        match self.policy {
            WirePolicy::Toggle => *slot ^= true,
            WirePolicy::Additive => *slot = true,
        }
        if !node.all_connected() {
            node.overlap = false;
        }
        if node.is_empty() {
            self.nodes.remove(&pos);
        }
    }
}
