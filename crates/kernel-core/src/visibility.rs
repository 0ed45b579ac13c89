//! Light resolvers: discrete lines, angular shadow sampling, and line of sight.

use std::collections::BTreeSet;
use std::f64::consts::TAU;

use contracts::Position;

use crate::spatial::PassabilityMatrix;

/// Cells on the discrete line from `from` to `to`, both inclusive. Consecutive
/// cells are king-move neighbours.
pub fn bresenham(from: Position, to: Position) -> Vec<Position> {
    let dx = (to.x - from.x).abs();
    let dy = -(to.y - from.y).abs();
    let sx = if from.x < to.x { 1 } else { -1 };
    let sy = if from.y < to.y { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (from.x, from.y);
    let mut cells = Vec::with_capacity(dx.max(-dy) as usize + 1);
    loop {
        cells.push(Position::new(x, y));
        if x == to.x && y == to.y {
            break;
        }
        let doubled = 2 * err;
        if doubled >= dy {
            err += dy;
            x += sx;
        }
        if doubled <= dx {
            err += dx;
            y += sy;
        }
    }
    cells
}

/// Union of `samples` rays cast from `source` out to `max_radius`. Each ray
/// keeps cells up to and including the first light-blocking cell. The source
/// is always visible, even when it blocks light itself.
///
/// This is an approximation: at large radii adjacent rays can skip cells.
/// Radii beyond the grid extent are traced as if they stopped at it.
pub fn cast_shadow(
    light: &PassabilityMatrix,
    source: Position,
    max_radius: u32,
    samples: u32,
) -> BTreeSet<Position> {
    let mut visible = BTreeSet::new();
    if !light.contains(source) {
        return visible;
    }
    visible.insert(source);
    if max_radius == 0 {
        return visible;
    }
    // Rays never need to reach past the far edge of the grid.
    let reach = max_radius.min(light.width().max(light.height()));
    let radius = f64::from(reach);
    for sample in 0..samples.max(1) {
        let angle = f64::from(sample) * TAU / f64::from(samples.max(1));
        let end = source.offset(
            (radius * angle.cos()).round() as i32,
            (radius * angle.sin()).round() as i32,
        );
        for cell in bresenham(source, end).into_iter().skip(1) {
            if !light.contains(cell) {
                break;
            }
            visible.insert(cell);
            if !light.is_open(cell) {
                break;
            }
        }
    }
    visible
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOfSight {
    /// Every intermediate cell passes light; holds the full traced line.
    Clear(Vec<Position>),
    /// `visible` holds the cells strictly before `blocker`.
    Blocked {
        visible: Vec<Position>,
        blocker: Position,
    },
}

/// Traces the line from `source` to `target`. Endpoints never count as
/// blockers; only intermediate cells do.
pub fn trace_line(light: &PassabilityMatrix, source: Position, target: Position) -> LineOfSight {
    let line = bresenham(source, target);
    let last = line.len() - 1;
    for (idx, cell) in line.iter().enumerate() {
        if idx == 0 || idx == last {
            continue;
        }
        if !light.is_open(*cell) {
            return LineOfSight::Blocked {
                visible: line[..idx].to_vec(),
                blocker: *cell,
            };
        }
    }
    LineOfSight::Clear(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bresenham_covers_endpoints_and_steps_by_one() {
        let line = bresenham(Position::new(0, 0), Position::new(5, 2));
        assert_eq!(line.first(), Some(&Position::new(0, 0)));
        assert_eq!(line.last(), Some(&Position::new(5, 2)));
        assert_eq!(line.len(), 6);
        for pair in line.windows(2) {
            assert_eq!(pair[0].chebyshev(pair[1]), 1);
        }
        assert_eq!(
            bresenham(Position::new(3, 3), Position::new(3, 3)),
            vec![Position::new(3, 3)]
        );
    }

    #[test]
    fn bresenham_runs_backwards() {
        let line = bresenham(Position::new(4, 4), Position::new(0, 1));
        assert_eq!(line.first(), Some(&Position::new(4, 4)));
        assert_eq!(line.last(), Some(&Position::new(0, 1)));
    }

    #[test]
    fn shadow_on_open_grid_stays_inside_radius() {
        let light = PassabilityMatrix::with_blocked(9, 9, &[]);
        let source = Position::new(4, 4);
        let visible = cast_shadow(&light, source, 3, 360);
        assert!(visible.contains(&source));
        assert!(visible.contains(&Position::new(7, 4)));
        assert!(visible.contains(&Position::new(4, 1)));
        assert!(visible.iter().all(|cell| cell.chebyshev(source) <= 3));
    }

    #[test]
    fn wall_stops_rays_but_is_itself_visible() {
        let light = PassabilityMatrix::with_blocked(7, 1, &[Position::new(3, 0)]);
        let visible = cast_shadow(&light, Position::new(0, 0), 6, 360);
        assert!(visible.contains(&Position::new(2, 0)));
        assert!(visible.contains(&Position::new(3, 0)));
        assert!(!visible.contains(&Position::new(4, 0)));
    }

    #[test]
    fn zero_radius_sees_only_the_source() {
        let light = PassabilityMatrix::with_blocked(3, 3, &[]);
        let visible = cast_shadow(&light, Position::new(1, 1), 0, 360);
        assert_eq!(visible.len(), 1);
    }

    #[test]
    fn line_of_sight_reports_first_blocker() {
        let light = PassabilityMatrix::with_blocked(
            6,
            1,
            &[Position::new(2, 0), Position::new(4, 0)],
        );
        match trace_line(&light, Position::new(0, 0), Position::new(5, 0)) {
            LineOfSight::Blocked { visible, blocker } => {
                assert_eq!(blocker, Position::new(2, 0));
                assert_eq!(visible, vec![Position::new(0, 0), Position::new(1, 0)]);
            }
            other => panic!("expected blocked line, got {other:?}"),
        }
    }

    #[test]
    fn blocking_endpoints_do_not_block() {
        let light = PassabilityMatrix::with_blocked(
            3,
            1,
            &[Position::new(0, 0), Position::new(2, 0)],
        );
        assert_eq!(
            trace_line(&light, Position::new(0, 0), Position::new(2, 0)),
            LineOfSight::Clear(vec![
                Position::new(0, 0),
                Position::new(1, 0),
                Position::new(2, 0)
            ])
        );
    }
}
