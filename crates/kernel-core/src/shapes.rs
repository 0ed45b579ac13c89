//! Invariant-checked spatial query results.
//!
//! Every shape validates its node sequence against the grid when built. A
//! shape value that exists is proof that the relation it names held at the
//! moment it was constructed.

use std::collections::BTreeSet;

use contracts::{EntityId, Position};
use serde::Serialize;
use thiserror::Error;

use crate::entity::EntityArena;
use crate::grid::Grid;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("{shape} has no nodes")]
    Empty { shape: &'static str },

    #[error("{shape} includes {position}, which is outside the grid")]
    OutOfBounds {
        shape: &'static str,
        position: Position,
    },

    #[error("{shape} steps from {from} to {to}, which are not adjacent")]
    NotAdjacent {
        shape: &'static str,
        from: Position,
        to: Position,
    },

    #[error("{shape} passes through blocking node {position}")]
    Blocked {
        shape: &'static str,
        position: Position,
    },

    #[error("{shape} should start at {expected} but starts at {found}")]
    WrongStart {
        shape: &'static str,
        expected: Position,
        found: Position,
    },

    #[error("{shape} should end at {expected} but ends at {found}")]
    WrongEnd {
        shape: &'static str,
        expected: Position,
        found: Position,
    },

    #[error("{shape} includes {position} at distance {distance}, beyond {max}")]
    OutOfRange {
        shape: &'static str,
        position: Position,
        distance: u32,
        max: u32,
    },

    #[error("{shape} lists {position} more than once")]
    Duplicate {
        shape: &'static str,
        position: Position,
    },

    #[error("{shape} does not include its origin {origin}")]
    MissingSource {
        shape: &'static str,
        origin: Position,
    },

    #[error("{shape} includes {position}, outside {top_left}..={bottom_right}")]
    OutsideBounds {
        shape: &'static str,
        position: Position,
        top_left: Position,
        bottom_right: Position,
    },

    #[error("rectangle corners {top_left} and {bottom_right} are inverted")]
    InvertedBounds {
        top_left: Position,
        bottom_right: Position,
    },

    #[error("blocking node {position} does not block light")]
    NotABlocker { position: Position },

    #[error("entity {entity} on {position} is not what blocks the line")]
    BlockerMismatch { entity: EntityId, position: Position },
}

fn check_in_bounds(grid: &Grid, shape: &'static str, nodes: &[Position]) -> Result<(), ShapeError> {
    match nodes.iter().find(|position| !grid.contains(**position)) {
        Some(position) => Err(ShapeError::OutOfBounds {
            shape,
            position: *position,
        }),
        None => Ok(()),
    }
}

fn check_unique(shape: &'static str, nodes: &[Position]) -> Result<(), ShapeError> {
    let mut seen = BTreeSet::new();
    for position in nodes {
        if !seen.insert(*position) {
            return Err(ShapeError::Duplicate {
                shape,
                position: *position,
            });
        }
    }
    Ok(())
}

fn check_chain(
    shape: &'static str,
    nodes: &[Position],
    allow_diagonal: bool,
) -> Result<(), ShapeError> {
    for pair in nodes.windows(2) {
        if !pair[0].touches(pair[1], allow_diagonal, false) {
            return Err(ShapeError::NotAdjacent {
                shape,
                from: pair[0],
                to: pair[1],
            });
        }
    }
    Ok(())
}

fn blocks_movement(grid: &Grid, position: Position) -> bool {
    grid.node(position).is_some_and(|node| node.blocks_movement())
}

fn blocks_light(grid: &Grid, position: Position) -> bool {
    grid.node(position).is_some_and(|node| node.blocks_light())
}

fn distance(from: Position, to: Position, allow_diagonal: bool) -> u32 {
    if allow_diagonal {
        from.chebyshev(to)
    } else {
        from.manhattan(to)
    }
}

// ---------------------------------------------------------------------------
// Path
// ---------------------------------------------------------------------------

/// A walkable route. Every node after the first is adjacent to its
/// predecessor and does not block movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Path {
    start: Position,
    goal: Position,
    allow_diagonal: bool,
    nodes: Vec<Position>,
}

impl Path {
    const SHAPE: &'static str = "path";

    pub fn new(
        grid: &Grid,
        nodes: Vec<Position>,
        allow_diagonal: bool,
    ) -> Result<Self, ShapeError> {
        let (Some(start), Some(goal)) = (nodes.first().copied(), nodes.last().copied()) else {
            return Err(ShapeError::Empty { shape: Self::SHAPE });
        };
        check_in_bounds(grid, Self::SHAPE, &nodes)?;
        check_chain(Self::SHAPE, &nodes, allow_diagonal)?;
        if let Some(position) = nodes.iter().skip(1).find(|p| blocks_movement(grid, **p)) {
            return Err(ShapeError::Blocked {
                shape: Self::SHAPE,
                position: *position,
            });
        }
        Ok(Self {
            start,
            goal,
            allow_diagonal,
            nodes,
        })
    }

    pub fn start(&self) -> Position {
        self.start
    }

    pub fn goal(&self) -> Position {
        self.goal
    }

    pub fn nodes(&self) -> &[Position] {
        &self.nodes
    }

    /// Number of nodes, start and goal included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of moves from start to goal.
    pub fn steps(&self) -> usize {
        self.nodes.len() - 1
    }
}

// ---------------------------------------------------------------------------
// Radius
// ---------------------------------------------------------------------------

/// Nodes reachable from `source` within `max_radius` steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Radius {
    source: Position,
    max_radius: u32,
    allow_diagonal: bool,
    nodes: Vec<Position>,
}

impl Radius {
    const SHAPE: &'static str = "radius";

    pub fn new(
        grid: &Grid,
        source: Position,
        max_radius: u32,
        allow_diagonal: bool,
        nodes: Vec<Position>,
    ) -> Result<Self, ShapeError> {
        check_in_bounds(grid, Self::SHAPE, &nodes)?;
        check_unique(Self::SHAPE, &nodes)?;
        if !nodes.contains(&source) {
            return Err(ShapeError::MissingSource {
                shape: Self::SHAPE,
                origin: source,
            });
        }
        for position in &nodes {
            let dist = distance(source, *position, allow_diagonal);
            if dist > max_radius {
                return Err(ShapeError::OutOfRange {
                    shape: Self::SHAPE,
                    position: *position,
                    distance: dist,
                    max: max_radius,
                });
            }
            if *position != source && blocks_movement(grid, *position) {
                return Err(ShapeError::Blocked {
                    shape: Self::SHAPE,
                    position: *position,
                });
            }
        }
        Ok(Self {
            source,
            max_radius,
            allow_diagonal,
            nodes,
        })
    }

    pub fn source(&self) -> Position {
        self.source
    }

    pub fn max_radius(&self) -> u32 {
        self.max_radius
    }

    pub fn nodes(&self) -> &[Position] {
        &self.nodes
    }

    pub fn contains(&self, position: Position) -> bool {
        self.nodes.contains(&position)
    }
}

// ---------------------------------------------------------------------------
// Shadow
// ---------------------------------------------------------------------------

/// Nodes visible from `source` within `max_radius` (Chebyshev).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Shadow {
    source: Position,
    max_radius: u32,
    nodes: Vec<Position>,
}

impl Shadow {
    const SHAPE: &'static str = "shadow";

    pub fn new(
        grid: &Grid,
        source: Position,
        max_radius: u32,
        nodes: Vec<Position>,
    ) -> Result<Self, ShapeError> {
        check_in_bounds(grid, Self::SHAPE, &nodes)?;
        check_unique(Self::SHAPE, &nodes)?;
        if !nodes.contains(&source) {
            return Err(ShapeError::MissingSource {
                shape: Self::SHAPE,
                origin: source,
            });
        }
        if let Some(position) = nodes.iter().find(|p| p.chebyshev(source) > max_radius) {
            return Err(ShapeError::OutOfRange {
                shape: Self::SHAPE,
                position: *position,
                distance: position.chebyshev(source),
                max: max_radius,
            });
        }
        Ok(Self {
            source,
            max_radius,
            nodes,
        })
    }

    pub fn source(&self) -> Position {
        self.source
    }

    pub fn max_radius(&self) -> u32 {
        self.max_radius
    }

    pub fn nodes(&self) -> &[Position] {
        &self.nodes
    }

    pub fn contains(&self, position: Position) -> bool {
        self.nodes.contains(&position)
    }
}

// ---------------------------------------------------------------------------
// RayCast / BlockedRaycast
// ---------------------------------------------------------------------------

/// An unobstructed line from `source` to `target`, endpoints included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RayCast {
    source: Position,
    target: Position,
    nodes: Vec<Position>,
}

impl RayCast {
    const SHAPE: &'static str = "raycast";

    pub fn new(
        grid: &Grid,
        source: Position,
        target: Position,
        nodes: Vec<Position>,
    ) -> Result<Self, ShapeError> {
        let (Some(first), Some(last)) = (nodes.first().copied(), nodes.last().copied()) else {
            return Err(ShapeError::Empty { shape: Self::SHAPE });
        };
        if first != source {
            return Err(ShapeError::WrongStart {
                shape: Self::SHAPE,
                expected: source,
                found: first,
            });
        }
        if last != target {
            return Err(ShapeError::WrongEnd {
                shape: Self::SHAPE,
                expected: target,
                found: last,
            });
        }
        check_in_bounds(grid, Self::SHAPE, &nodes)?;
        check_chain(Self::SHAPE, &nodes, true)?;
        let inner = if nodes.len() > 2 {
            &nodes[1..nodes.len() - 1]
        } else {
            &[]
        };
        if let Some(position) = inner.iter().find(|p| blocks_light(grid, **p)) {
            return Err(ShapeError::Blocked {
                shape: Self::SHAPE,
                position: *position,
            });
        }
        Ok(Self {
            source,
            target,
            nodes,
        })
    }

    pub fn source(&self) -> Position {
        self.source
    }

    pub fn target(&self) -> Position {
        self.target
    }

    pub fn nodes(&self) -> &[Position] {
        &self.nodes
    }
}

/// A line from `source` toward `target` stopped by `blocking_node`. `nodes`
/// are exactly the traced cells strictly before the blocker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockedRaycast {
    source: Position,
    target: Position,
    nodes: Vec<Position>,
    blocking_node: Position,
    blocking_entity: EntityId,
}

impl BlockedRaycast {
    const SHAPE: &'static str = "blocked raycast";

    pub fn new(
        grid: &Grid,
        arena: &EntityArena,
        source: Position,
        target: Position,
        nodes: Vec<Position>,
        blocking_node: Position,
        blocking_entity: EntityId,
    ) -> Result<Self, ShapeError> {
        let (Some(first), Some(last)) = (nodes.first().copied(), nodes.last().copied()) else {
            return Err(ShapeError::Empty { shape: Self::SHAPE });
        };
        if first != source {
            return Err(ShapeError::WrongStart {
                shape: Self::SHAPE,
                expected: source,
                found: first,
            });
        }
        check_in_bounds(grid, Self::SHAPE, &nodes)?;
        check_in_bounds(grid, Self::SHAPE, &[blocking_node, target])?;
        check_chain(Self::SHAPE, &nodes, true)?;
        if !last.touches(blocking_node, true, false) {
            return Err(ShapeError::NotAdjacent {
                shape: Self::SHAPE,
                from: last,
                to: blocking_node,
            });
        }
        if let Some(position) = nodes.iter().skip(1).find(|p| blocks_light(grid, **p)) {
            return Err(ShapeError::Blocked {
                shape: Self::SHAPE,
                position: *position,
            });
        }
        if blocking_node == target || !blocks_light(grid, blocking_node) {
            return Err(ShapeError::NotABlocker {
                position: blocking_node,
            });
        }
        let on_node = grid
            .node(blocking_node)
            .is_some_and(|node| node.entities().contains(&blocking_entity));
        let blocks = arena
            .get(blocking_entity)
            .is_some_and(|entity| entity.blocks_light());
        if !on_node || !blocks {
            return Err(ShapeError::BlockerMismatch {
                entity: blocking_entity,
                position: blocking_node,
            });
        }
        Ok(Self {
            source,
            target,
            nodes,
            blocking_node,
            blocking_entity,
        })
    }

    pub fn source(&self) -> Position {
        self.source
    }

    pub fn target(&self) -> Position {
        self.target
    }

    pub fn nodes(&self) -> &[Position] {
        &self.nodes
    }

    pub fn blocking_node(&self) -> Position {
        self.blocking_node
    }

    pub fn blocking_entity(&self) -> EntityId {
        self.blocking_entity
    }
}

/// Line-of-sight query result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Sightline {
    Clear(RayCast),
    Blocked(BlockedRaycast),
}

impl Sightline {
    pub fn is_clear(&self) -> bool {
        matches!(self, Self::Clear(_))
    }

    pub fn nodes(&self) -> &[Position] {
        match self {
            Self::Clear(ray) => ray.nodes(),
            Self::Blocked(ray) => ray.nodes(),
        }
    }
}

// ---------------------------------------------------------------------------
// Rectangle
// ---------------------------------------------------------------------------

/// Nodes inside inclusive bounds, row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rectangle {
    top_left: Position,
    bottom_right: Position,
    nodes: Vec<Position>,
}

impl Rectangle {
    const SHAPE: &'static str = "rectangle";

    pub fn new(
        grid: &Grid,
        top_left: Position,
        bottom_right: Position,
        nodes: Vec<Position>,
    ) -> Result<Self, ShapeError> {
        if top_left.x > bottom_right.x || top_left.y > bottom_right.y {
            return Err(ShapeError::InvertedBounds {
                top_left,
                bottom_right,
            });
        }
        check_in_bounds(grid, Self::SHAPE, &nodes)?;
        check_unique(Self::SHAPE, &nodes)?;
        let inside = |p: &Position| {
            (top_left.x..=bottom_right.x).contains(&p.x)
                && (top_left.y..=bottom_right.y).contains(&p.y)
        };
        if let Some(position) = nodes.iter().find(|p| !inside(p)) {
            return Err(ShapeError::OutsideBounds {
                shape: Self::SHAPE,
                position: *position,
                top_left,
                bottom_right,
            });
        }
        Ok(Self {
            top_left,
            bottom_right,
            nodes,
        })
    }

    pub fn top_left(&self) -> Position {
        self.top_left
    }

    pub fn bottom_right(&self) -> Position {
        self.bottom_right
    }

    pub fn nodes(&self) -> &[Position] {
        &self.nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: i32, y: i32) -> Position {
        Position::new(x, y)
    }

    #[test]
    fn path_rejects_gaps_and_empty_sequences() {
        let grid = Grid::new(4, 4);
        assert_eq!(
            Path::new(&grid, Vec::new(), true).unwrap_err(),
            ShapeError::Empty { shape: "path" }
        );
        assert_eq!(
            Path::new(&grid, vec![p(0, 0), p(2, 0)], true).unwrap_err(),
            ShapeError::NotAdjacent {
                shape: "path",
                from: p(0, 0),
                to: p(2, 0),
            }
        );
        assert!(Path::new(&grid, vec![p(0, 0), p(1, 1)], false).is_err());
        let path = Path::new(&grid, vec![p(0, 0), p(1, 1), p(2, 2)], true).expect("valid");
        assert_eq!(path.steps(), 2);
        assert_eq!(path.goal(), p(2, 2));
    }

    #[test]
    fn path_rejects_out_of_bounds_nodes() {
        let grid = Grid::new(2, 2);
        assert!(matches!(
            Path::new(&grid, vec![p(1, 1), p(2, 1)], true),
            Err(ShapeError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn shadow_requires_source_and_range() {
        let grid = Grid::new(5, 5);
        assert!(matches!(
            Shadow::new(&grid, p(2, 2), 1, vec![p(2, 3)]),
            Err(ShapeError::MissingSource { .. })
        ));
        assert!(matches!(
            Shadow::new(&grid, p(2, 2), 1, vec![p(2, 2), p(4, 2)]),
            Err(ShapeError::OutOfRange { distance: 2, .. })
        ));
        assert!(matches!(
            Shadow::new(&grid, p(2, 2), 1, vec![p(2, 2), p(2, 2)]),
            Err(ShapeError::Duplicate { .. })
        ));
    }

    #[test]
    fn raycast_endpoints_must_match() {
        let grid = Grid::new(4, 1);
        assert!(matches!(
            RayCast::new(&grid, p(0, 0), p(3, 0), vec![p(0, 0), p(1, 0), p(2, 0)]),
            Err(ShapeError::WrongEnd { .. })
        ));
        let ray = RayCast::new(
            &grid,
            p(0, 0),
            p(3, 0),
            vec![p(0, 0), p(1, 0), p(2, 0), p(3, 0)],
        )
        .expect("clear line");
        assert_eq!(ray.nodes().len(), 4);
    }

    #[test]
    fn blocked_raycast_needs_a_real_blocker() {
        let grid = Grid::new(4, 1);
        let arena = EntityArena::new();
        assert_eq!(
            BlockedRaycast::new(
                &grid,
                &arena,
                p(0, 0),
                p(3, 0),
                vec![p(0, 0)],
                p(1, 0),
                EntityId(99),
            )
            .unwrap_err(),
            ShapeError::NotABlocker { position: p(1, 0) }
        );
    }

    #[test]
    fn rectangle_checks_bounds() {
        let grid = Grid::new(4, 4);
        assert!(matches!(
            Rectangle::new(&grid, p(2, 2), p(1, 1), Vec::new()),
            Err(ShapeError::InvertedBounds { .. })
        ));
        assert!(matches!(
            Rectangle::new(&grid, p(0, 0), p(1, 1), vec![p(2, 2)]),
            Err(ShapeError::OutsideBounds { .. })
        ));
        let rect = Rectangle::new(&grid, p(0, 0), p(1, 0), vec![p(0, 0), p(1, 0)]).expect("valid");
        assert_eq!(rect.nodes(), &[p(0, 0), p(1, 0)]);
    }
}
