//! Grid search over passability matrices: A* shortest path and bounded
//! frontier expansion.
//!
//! Both searches work on a [`PassabilityMatrix`] captured from live node state
//! at query time. Steps cost 1 whether cardinal or diagonal.

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BinaryHeap};

use contracts::{PathHeuristic, Position};

use crate::grid::neighbor_offsets;

// ---------------------------------------------------------------------------
// Passability matrix
// ---------------------------------------------------------------------------

/// Row-major open/blocked flags for one concern (movement or light).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassabilityMatrix {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl PassabilityMatrix {
    pub fn new(width: u32, height: u32, cells: Vec<bool>) -> Self {
        assert_eq!(
            cells.len(),
            width as usize * height as usize,
            "passability matrix size must match its extent"
        );
        Self {
            width,
            height,
            cells,
        }
    }

    /// Builds a matrix with `blocked` positions closed and everything else open.
    pub fn with_blocked(width: u32, height: u32, blocked: &[Position]) -> Self {
        let mut matrix = Self::new(width, height, vec![true; width as usize * height as usize]);
        for position in blocked {
            if let Some(idx) = matrix.index(*position) {
                matrix.cells[idx] = false;
            }
        }
        matrix
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn contains(&self, position: Position) -> bool {
        position.x >= 0
            && position.y >= 0
            && (position.x as u32) < self.width
            && (position.y as u32) < self.height
    }

    fn index(&self, position: Position) -> Option<usize> {
        self.contains(position)
            .then(|| position.y as usize * self.width as usize + position.x as usize)
    }

    /// Out-of-bounds cells read as closed.
    pub fn is_open(&self, position: Position) -> bool {
        self.index(position).is_some_and(|idx| self.cells[idx])
    }

    fn neighbors(
        &self,
        position: Position,
        allow_diagonal: bool,
    ) -> impl Iterator<Item = Position> + '_ {
        neighbor_offsets(allow_diagonal)
            .map(move |(dx, dy)| position.offset(dx, dy))
            .filter(move |next| self.contains(*next))
    }
}

// ---------------------------------------------------------------------------
// Open-set ordering
// ---------------------------------------------------------------------------

/// Priority entry: lowest `priority` first, then earliest `sequence`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenEntry {
    priority: u32,
    sequence: u64,
    cost: u32,
    position: Position,
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| self.sequence.cmp(&other.sequence))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Default)]
struct OpenSet {
    heap: BinaryHeap<Reverse<OpenEntry>>,
    next_sequence: u64,
}

impl OpenSet {
    fn push(&mut self, priority: u32, cost: u32, position: Position) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.heap.push(Reverse(OpenEntry {
            priority,
            sequence,
            cost,
            position,
        }));
    }

    fn pop(&mut self) -> Option<OpenEntry> {
        self.heap.pop().map(|Reverse(entry)| entry)
    }
}

fn heuristic(kind: PathHeuristic, from: Position, goal: Position) -> u32 {
    match kind {
        PathHeuristic::Manhattan => from.manhattan(goal),
        PathHeuristic::Chebyshev => from.chebyshev(goal),
    }
}

/// Walks parent links back from `to` and returns the route start-first.
pub fn reconstruct(parents: &BTreeMap<Position, Position>, to: Position) -> Vec<Position> {
    let mut route = vec![to];
    let mut current = to;
    while let Some(parent) = parents.get(&current) {
        route.push(*parent);
        current = *parent;
    }
    route.reverse();
    route
}

// ---------------------------------------------------------------------------
// A*
// ---------------------------------------------------------------------------

/// Shortest route from `start` to `goal`, both inclusive. The start cell is
/// exempt from the walkability check; every other cell must be open.
/// Returns `None` when the goal is out of bounds, blocked, or unreachable.
pub fn find_path(
    walkable: &PassabilityMatrix,
    start: Position,
    goal: Position,
    allow_diagonal: bool,
    heuristic_kind: PathHeuristic,
) -> Option<Vec<Position>> {
    if !walkable.contains(start) || !walkable.contains(goal) {
        return None;
    }
    if start == goal {
        return Some(vec![start]);
    }
    if !walkable.is_open(goal) {
        return None;
    }

    let mut best: BTreeMap<Position, u32> = BTreeMap::from([(start, 0)]);
    let mut parents: BTreeMap<Position, Position> = BTreeMap::new();
    let mut open = OpenSet::default();
    open.push(heuristic(heuristic_kind, start, goal), 0, start);

    while let Some(entry) = open.pop() {
        if entry.position == goal {
            return Some(reconstruct(&parents, goal));
        }
        if best.get(&entry.position).is_some_and(|cost| entry.cost > *cost) {
            continue;
        }
        let next_cost = entry.cost + 1;
        for next in walkable.neighbors(entry.position, allow_diagonal) {
            if !walkable.is_open(next) {
                continue;
            }
            if best.get(&next).is_some_and(|cost| *cost <= next_cost) {
                continue;
            }
            best.insert(next, next_cost);
            parents.insert(next, entry.position);
            open.push(
                next_cost + heuristic(heuristic_kind, next, goal),
                next_cost,
                next,
            );
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Frontier
// ---------------------------------------------------------------------------

/// Result of a bounded uniform-cost expansion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frontier {
    pub distances: BTreeMap<Position, u32>,
    pub parents: BTreeMap<Position, Position>,
}

impl Frontier {
    pub fn route_to(&self, position: Position) -> Option<Vec<Position>> {
        self.distances
            .contains_key(&position)
            .then(|| reconstruct(&self.parents, position))
    }
}

/// Every cell reachable from `start` within `max_distance` steps, with its
/// distance and parent link. `start` is always present at distance 0.
pub fn expand_frontier(
    walkable: &PassabilityMatrix,
    start: Position,
    max_distance: u32,
    allow_diagonal: bool,
) -> Frontier {
    let mut frontier = Frontier::default();
    if !walkable.contains(start) {
        return frontier;
    }
    frontier.distances.insert(start, 0);
    let mut open = OpenSet::default();
    open.push(0, 0, start);

    while let Some(entry) = open.pop() {
        if frontier
            .distances
            .get(&entry.position)
            .is_some_and(|cost| entry.cost > *cost)
        {
            continue;
        }
        if entry.cost >= max_distance {
            continue;
        }
        let next_cost = entry.cost + 1;
        for next in walkable.neighbors(entry.position, allow_diagonal) {
            if !walkable.is_open(next) {
                continue;
            }
            if frontier
                .distances
                .get(&next)
                .is_some_and(|cost| *cost <= next_cost)
            {
                continue;
            }
            frontier.distances.insert(next, next_cost);
            frontier.parents.insert(next, entry.position);
            open.push(next_cost, next_cost, next);
        }
    }
    frontier
}
