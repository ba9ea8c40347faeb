use std::collections::HashSet;

use thiserror::Error;

use crate::{Cell, Velocity};
use Direction::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right
}

impl Direction {
    pub fn velocity(self) -> Velocity {
        match self {
            Up => Velocity::new(-1, 0),
            Down => Velocity::new(1, 0),
            Left => Velocity::new(0, -1),
            Right => Velocity::new(0, 1),
        }
    }
}

/// The chain became invalid. Ends the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Collision {
    #[error("snake ran into itself at ({}, {})", .cell.row, .cell.col)]
    SelfOverlap { cell: Cell },
    #[error("snake has no segments left")]
    Emptied,
}

/// Wrap-around limits of the grid the snake lives on.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Bounds {
    pub rows: i32,
    pub cols: i32,
}

/// A chain of segments, head first. Every segment carries its own velocity;
/// followers pick up the velocity of the segment ahead of them one step later.
#[derive(Clone, Debug)]
pub struct Snake {
    positions: Vec<Cell>,
    velocities: Vec<Velocity>,
    bounds: Option<Bounds>,
}

impl Snake {
    pub fn new(start: Vec<Cell>, velocity: Velocity) -> Self {
        let velocities = vec![velocity; start.len()];
        Snake { positions: start, velocities, bounds: None }
    }

    pub fn set_bounds(&mut self, rows: i32, cols: i32) {
        self.bounds = Some(Bounds { rows, cols });
        self.positions = self.positions.iter().map(|&cell| self.wrap(cell)).collect();
    }

    pub fn positions(&self) -> &[Cell] {
        &self.positions
    }

    pub fn velocities(&self) -> &[Velocity] {
        &self.velocities
    }

    pub fn head(&self) -> Option<Cell> {
        self.positions.first().copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn occupies(&self, cell: Cell) -> bool {
        self.positions.contains(&cell)
    }

    /// Points the head in `direction`, unless that would reverse it onto the
    /// second segment.
    pub fn steer(&mut self, direction: Direction) {
        let new_velocity = direction.velocity();

        match self.velocities.first_mut() {
            Some(head) if *head != -new_velocity => *head = new_velocity,
            _ => {},
        }
    }

    pub fn advance(&mut self) -> Result<(), Collision> {
        let resolved: Vec<Velocity> = self.positions.iter()
            .zip(&self.velocities)
            .enumerate()
            .map(|(i, (&cell, &velocity))| {
                if i == 0 {
                    return velocity;
                }

                // Following its own velocity would run into the chain, so take
                // the heading of the segment ahead instead.
                if self.occupies(self.wrap(cell + velocity)) {
                    self.velocities[i - 1]
                } else {
                    velocity
                }
            })
            .collect();

        // This step moves with the velocities held going in; the resolved
        // ones take effect on the next step.
        let moved = self.positions.iter()
            .zip(&self.velocities)
            .map(|(&cell, &velocity)| self.wrap(cell + velocity))
            .collect();

        self.positions = moved;
        self.velocities = resolved;

        self.check()
    }

    /// Appends a segment one step behind the tail, heading the same way.
    pub fn grow(&mut self) {
        let (tail, velocity) = match (self.positions.last(), self.velocities.last()) {
            (Some(&tail), Some(&velocity)) => (tail, velocity),
            _ => return,
        };

        self.positions.push(self.wrap(tail - velocity));
        self.velocities.push(velocity);
    }

    /// Drops up to `n` segments from the tail. Running out of segments is fatal.
    pub fn shrink(&mut self, n: usize) -> Result<(), Collision> {
        for _ in 0..n {
            if self.positions.pop().is_none() || self.velocities.pop().is_none() {
                return Err(Collision::Emptied);
            }
        }

        if self.positions.is_empty() {
            return Err(Collision::Emptied);
        }

        Ok(())
    }

    /// Brings a cell that overshot the grid by at most one step back inside it.
    pub fn wrap(&self, cell: Cell) -> Cell {
        match self.bounds {
            Some(Bounds { rows, cols }) => Cell::new(wrap_axis(cell.row, rows), wrap_axis(cell.col, cols)),
            None => cell,
        }
    }

    ///////////////////////////////////////////////////////////////////////////

    fn check(&self) -> Result<(), Collision> {
        if self.positions.is_empty() {
            return Err(Collision::Emptied);
        }

        let mut seen = HashSet::with_capacity(self.positions.len());
        for &cell in &self.positions {
            if !seen.insert(cell) {
                return Err(Collision::SelfOverlap { cell });
            }
        }

        Ok(())
    }
}

fn wrap_axis(value: i32, bound: i32) -> i32 {
    if value < 0 {
        bound - 1
    } else if value >= bound {
        0
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn up() -> Velocity {
        Up.velocity()
    }

    fn bound_snake(cells: &[(i32, i32)], velocity: Velocity) -> Snake {
        let start = cells.iter().map(|&(r, c)| Cell::new(r, c)).collect();
        let mut snake = Snake::new(start, velocity);
        snake.set_bounds(15, 40);
        snake
    }

    fn cells(snake: &Snake) -> Vec<(i32, i32)> {
        snake.positions().iter().map(|c| (c.row, c.col)).collect()
    }

    #[test]
    fn test_advance_straight_up() {
        let mut snake = bound_snake(&[(7, 20), (8, 20), (9, 20)], up());

        snake.advance().unwrap();
        assert_eq!(cells(&snake), vec![(6, 20), (7, 20), (8, 20)]);

        snake.advance().unwrap();
        assert_eq!(cells(&snake), vec![(5, 20), (6, 20), (7, 20)]);
        assert_eq!(snake.velocities(), &[up(), up(), up()]);
    }

    #[test]
    fn test_advance_wraps_top_to_bottom() {
        let mut snake = bound_snake(&[(0, 20), (1, 20), (2, 20)], up());
        snake.advance().unwrap();
        assert_eq!(cells(&snake), vec![(14, 20), (0, 20), (1, 20)]);
    }

    #[test]
    fn test_head_moves_by_velocity_every_step() {
        let mut snake = bound_snake(&[(3, 38), (3, 37), (3, 36)], Right.velocity());

        for _ in 0..100 {
            let before = snake.head().unwrap();
            snake.advance().unwrap();
            assert_eq!(snake.head().unwrap(), snake.wrap(before + Right.velocity()));
            assert_eq!(snake.len(), 3);
        }
    }

    #[test]
    fn test_steer_opposite_is_ignored() {
        let mut snake = bound_snake(&[(7, 20), (8, 20)], up());
        snake.steer(Down);
        assert_eq!(snake.velocities()[0], up());
    }

    #[test]
    fn test_steer_other_directions() {
        for dir in [Up, Left, Right].iter() {
            let mut snake = bound_snake(&[(7, 20), (8, 20)], up());
            snake.steer(*dir);
            assert_eq!(snake.velocities()[0], dir.velocity());
            // Only the head changes
            assert_eq!(snake.velocities()[1], up());
        }
    }

    #[test]
    fn test_chain_follows_through_corner() {
        let mut snake = bound_snake(&[(7, 20), (8, 20), (9, 20)], up());
        snake.steer(Right);

        snake.advance().unwrap();
        assert_eq!(cells(&snake), vec![(7, 21), (7, 20), (8, 20)]);

        snake.advance().unwrap();
        assert_eq!(cells(&snake), vec![(7, 22), (7, 21), (7, 20)]);

        let right = Right.velocity();
        snake.advance().unwrap();
        assert_eq!(snake.velocities(), &[right, right, right]);
    }

    fn touching(a: Cell, b: Cell) -> bool {
        let drow = (a.row - b.row).rem_euclid(15);
        let dcol = (a.col - b.col).rem_euclid(40);
        let drow = drow.min(15 - drow);
        let dcol = dcol.min(40 - dcol);
        drow + dcol == 1
    }

    #[test]
    fn test_long_chain_traces_head_path() {
        let mut snake = bound_snake(&[(7, 20), (8, 20), (9, 20), (10, 20), (11, 20)], up());
        // Oldest first; the body starts on the cells the head just left
        let mut trail: Vec<Cell> = snake.positions().iter().rev().copied().collect();

        let turns = [(Right, 6), (Down, 10), (Right, 4), (Up, 3)];
        for (dir, steps) in turns.iter() {
            snake.steer(*dir);
            for _ in 0..*steps {
                snake.advance().unwrap();
                trail.push(snake.head().unwrap());

                let body = snake.positions();
                for pair in body.windows(2) {
                    assert!(touching(pair[0], pair[1]), "chain split between {:?} and {:?}", pair[0], pair[1]);
                }
                let expected: Vec<Cell> = trail.iter().rev().take(body.len()).copied().collect();
                assert_eq!(body, &expected[..]);
            }
        }
    }

    #[test]
    fn test_single_segment_never_collides() {
        for dir in [Up, Down, Left, Right].iter() {
            let mut snake = bound_snake(&[(0, 0)], dir.velocity());
            for _ in 0..50 {
                assert!(snake.advance().is_ok());
            }
        }
    }

    #[test]
    fn test_tight_turn_bites_itself() {
        let mut snake = bound_snake(&[(5, 5), (6, 5), (7, 5), (8, 5), (9, 5)], up());

        snake.steer(Right);
        snake.advance().unwrap();
        snake.steer(Down);
        snake.advance().unwrap();
        snake.steer(Left);

        assert_eq!(snake.advance(), Err(Collision::SelfOverlap { cell: Cell::new(6, 5) }));
    }

    #[test]
    fn test_grow_appends_behind_tail() {
        let mut snake = bound_snake(&[(7, 20), (8, 20), (9, 20)], up());
        snake.grow();
        assert_eq!(cells(&snake), vec![(7, 20), (8, 20), (9, 20), (10, 20)]);
        assert_eq!(snake.velocities().len(), 4);
        assert_eq!(snake.velocities()[3], up());
    }

    #[test]
    fn test_grow_wraps_behind_tail() {
        let mut snake = bound_snake(&[(13, 0), (14, 0)], up());
        snake.grow();
        assert_eq!(snake.positions()[2], Cell::new(0, 0));
    }

    #[test]
    fn test_grow_then_shrink_round_trip() {
        let mut snake = bound_snake(&[(7, 20), (8, 20), (9, 20)], up());
        snake.steer(Left);
        snake.advance().unwrap();

        let positions = snake.positions().to_vec();
        let velocities = snake.velocities().to_vec();

        snake.grow();
        snake.shrink(1).unwrap();

        assert_eq!(snake.positions(), &positions[..]);
        assert_eq!(snake.velocities(), &velocities[..]);
    }

    #[test]
    fn test_shrink_past_length_collides() {
        let mut snake = bound_snake(&[(7, 20), (8, 20), (9, 20)], up());
        assert_eq!(snake.shrink(8), Err(Collision::Emptied));
        assert!(snake.is_empty());
        assert_eq!(snake.velocities().len(), 0);
    }

    #[test]
    fn test_shrink_to_nothing_collides() {
        let mut snake = bound_snake(&[(7, 20), (8, 20)], up());
        assert_eq!(snake.shrink(2), Err(Collision::Emptied));
    }

    #[test]
    fn test_shrink_partial() {
        let mut snake = bound_snake(&[(7, 20), (8, 20), (9, 20)], up());
        snake.shrink(2).unwrap();
        assert_eq!(cells(&snake), vec![(7, 20)]);
        assert_eq!(snake.velocities().len(), 1);
    }

    #[test]
    fn test_wrap() {
        let snake = bound_snake(&[(0, 0)], up());
        assert_eq!(snake.wrap(Cell::new(-1, 5)), Cell::new(14, 5));
        assert_eq!(snake.wrap(Cell::new(15, 5)), Cell::new(0, 5));
        assert_eq!(snake.wrap(Cell::new(3, -1)), Cell::new(3, 39));
        assert_eq!(snake.wrap(Cell::new(3, 40)), Cell::new(3, 0));
        assert_eq!(snake.wrap(Cell::new(3, 4)), Cell::new(3, 4));
    }

    #[test]
    fn test_wrap_without_bounds_is_identity() {
        let snake = Snake::new(vec![Cell::new(0, 0)], up());
        assert_eq!(snake.wrap(Cell::new(-1, 99)), Cell::new(-1, 99));
    }
}
