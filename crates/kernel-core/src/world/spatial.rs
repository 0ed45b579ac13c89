use serde::Serialize;

use super::*;
use crate::shapes::{
    BlockedRaycast, Path, Radius, RayCast, Rectangle, ShapeError, Shadow, Sightline,
};
use crate::spatial::{expand_frontier, find_path};
use crate::visibility::{cast_shadow, trace_line, LineOfSight};

/// One node found by a frontier search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reachable {
    pub position: Position,
    pub distance: u32,
    pub path: Path,
}

// Resolvers read matrices built from the live nodes on every call.
impl World {
    fn require_in_bounds(&self, position: Position) -> Result<(), WorldError> {
        if self.grid.contains(position) {
            Ok(())
        } else {
            Err(WorldError::OutOfBounds(position))
        }
    }

    /// Shortest walkable route, or `None` when the goal cannot be reached.
    pub fn get_path(&self, start: Position, goal: Position) -> Result<Option<Path>, WorldError> {
        self.require_in_bounds(start)?;
        self.require_in_bounds(goal)?;
        let route = find_path(
            &self.grid.walkable_matrix(),
            start,
            goal,
            self.config.allow_diagonal,
            self.config.path_heuristic,
        );
        match route {
            Some(nodes) => Ok(Some(Path::new(
                &self.grid,
                nodes,
                self.config.allow_diagonal,
            )?)),
            None => Ok(None),
        }
    }

    /// Every node reachable within `max_distance` steps with its distance and
    /// route, ordered by distance then row-major.
    pub fn get_path_distance(
        &self,
        start: Position,
        max_distance: u32,
    ) -> Result<Vec<Reachable>, WorldError> {
        self.require_in_bounds(start)?;
        let frontier = expand_frontier(
            &self.grid.walkable_matrix(),
            start,
            max_distance,
            self.config.allow_diagonal,
        );
        let mut reachable = Vec::with_capacity(frontier.distances.len());
        for (position, distance) in &frontier.distances {
            let route = frontier
                .route_to(*position)
                .ok_or(ShapeError::Empty { shape: "path" })?;
            reachable.push(Reachable {
                position: *position,
                distance: *distance,
                path: Path::new(&self.grid, route, self.config.allow_diagonal)?,
            });
        }
        reachable.sort_by_key(|entry| (entry.distance, entry.position.y, entry.position.x));
        Ok(reachable)
    }

    /// The frontier's node set as a Radius shape, row-major.
    pub fn get_radius(&self, source: Position, max_radius: u32) -> Result<Radius, WorldError> {
        self.require_in_bounds(source)?;
        let frontier = expand_frontier(
            &self.grid.walkable_matrix(),
            source,
            max_radius,
            self.config.allow_diagonal,
        );
        let mut nodes: Vec<Position> = frontier.distances.into_keys().collect();
        nodes.sort_by_key(|position| (position.y, position.x));
        Ok(Radius::new(
            &self.grid,
            source,
            max_radius,
            self.config.allow_diagonal,
            nodes,
        )?)
    }

    /// Cells visible from `source` by angular ray sampling, row-major.
    pub fn get_shadow(&self, source: Position, max_radius: u32) -> Result<Shadow, WorldError> {
        self.require_in_bounds(source)?;
        let visible = cast_shadow(
            &self.grid.visibility_matrix(),
            source,
            max_radius,
            self.config.shadow_samples,
        );
        let mut nodes: Vec<Position> = visible.into_iter().collect();
        nodes.sort_by_key(|position| (position.y, position.x));
        Ok(Shadow::new(&self.grid, source, max_radius, nodes)?)
    }

    /// Line of sight from `source` to `target`. A blocked line names the first
    /// blocking node and the entity on it that blocks light.
    pub fn get_raycast(&self, source: Position, target: Position) -> Result<Sightline, WorldError> {
        self.require_in_bounds(source)?;
        self.require_in_bounds(target)?;
        match trace_line(&self.grid.visibility_matrix(), source, target) {
            LineOfSight::Clear(nodes) => Ok(Sightline::Clear(RayCast::new(
                &self.grid, source, target, nodes,
            )?)),
            LineOfSight::Blocked { visible, blocker } => {
                let blocking_entity = self
                    .grid
                    .node(blocker)
                    .and_then(|node| {
                        node.entities().iter().copied().find(|id| {
                            self.entities
                                .get(*id)
                                .is_some_and(|entity| entity.blocks_light())
                        })
                    })
                    .ok_or(ShapeError::NotABlocker { position: blocker })?;
                Ok(Sightline::Blocked(BlockedRaycast::new(
                    &self.grid,
                    &self.entities,
                    source,
                    target,
                    visible,
                    blocker,
                    blocking_entity,
                )?))
            }
        }
    }

    /// In-bounds nodes inside the inclusive corners, row-major.
    pub fn get_rectangle(
        &self,
        top_left: Position,
        bottom_right: Position,
    ) -> Result<Rectangle, WorldError> {
        let max_x = self.grid.width() as i32 - 1;
        let max_y = self.grid.height() as i32 - 1;
        let mut nodes = Vec::new();
        for y in top_left.y.max(0)..=bottom_right.y.min(max_y) {
            for x in top_left.x.max(0)..=bottom_right.x.min(max_x) {
                nodes.push(Position::new(x, y));
            }
        }
        Ok(Rectangle::new(&self.grid, top_left, bottom_right, nodes)?)
    }
}
