pub mod config;
pub mod game;
pub mod snake;
pub mod term;
pub mod world;

use std::ops::{Add, Neg, Sub};

/// A grid coordinate, row first.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Cell {
    pub row: i32,
    pub col: i32,
}

/// A single cardinal step.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Velocity {
    pub drow: i32,
    pub dcol: i32,
}

impl Cell {
    pub fn new(row: i32, col: i32) -> Self {
        Cell { row, col }
    }
}

impl Velocity {
    pub fn new(drow: i32, dcol: i32) -> Self {
        Velocity { drow, dcol }
    }
}

impl Add<Velocity> for Cell {
    type Output = Cell;

    fn add(self, v: Velocity) -> Cell {
        Cell::new(self.row + v.drow, self.col + v.dcol)
    }
}

impl Sub<Velocity> for Cell {
    type Output = Cell;

    fn sub(self, v: Velocity) -> Cell {
        Cell::new(self.row - v.drow, self.col - v.dcol)
    }
}

impl Neg for Velocity {
    type Output = Velocity;

    fn neg(self) -> Velocity {
        Velocity::new(-self.drow, -self.dcol)
    }
}
