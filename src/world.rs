use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::Cell;
use crate::config::{EntityConfig, GameConfig, Symbols};
use crate::snake::{Direction, Snake};

/// Fastest and slowest the clock may be set to.
pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(10);
pub const MAX_TICK_INTERVAL: Duration = Duration::from_secs(5);

/// What a tick (or a command) left the match in.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Lost,
    Ended,
}

/// Food or a trap: where it sits and how many ticks it has left.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TimedEntity {
    pub cell: Cell,
    pub expires: u32,
}

/// Rows of characters, one per grid cell.
pub type Grid = Vec<Vec<char>>;

#[derive(Copy, Clone, Debug)]
pub struct BorderStyle {
    pub left: usize,
    pub right: usize,
    pub top: usize,
    pub bottom: usize,
    pub sym_lr: char,
    pub sym_tb: char,
}

impl Default for BorderStyle {
    fn default() -> Self {
        BorderStyle { left: 1, right: 1, top: 1, bottom: 1, sym_lr: '|', sym_tb: '-' }
    }
}

pub struct GameWorld {
    height: i32,
    width: i32,
    tick_interval: Duration,
    snake: Option<Snake>,
    food: Vec<TimedEntity>,
    traps: Vec<TimedEntity>,
    score: i64,
    state: Outcome,
    food_config: EntityConfig,
    trap_config: EntityConfig,
    trap_damage: usize,
    symbols: Symbols,
    rng: StdRng,
}

impl GameWorld {
    pub fn new(config: &GameConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        GameWorld {
            height: config.height,
            width: config.width,
            tick_interval: clamp_interval(config.tick_interval),
            snake: None,
            food: vec![],
            traps: vec![],
            score: 0,
            state: Outcome::Continue,
            food_config: config.food.clone(),
            trap_config: config.trap.clone(),
            trap_damage: config.trap_damage,
            symbols: config.symbols.clone(),
            rng,
        }
    }

    pub fn set_snake(&mut self, mut snake: Snake) {
        snake.set_bounds(self.height, self.width);
        self.snake = Some(snake);
    }

    /// Runs one step of the simulation. Once the match is lost or ended this
    /// only reports that state back.
    pub fn tick(&mut self) -> Outcome {
        if self.state != Outcome::Continue {
            return self.state;
        }

        let snake = match self.snake.as_mut() {
            Some(snake) => snake,
            None => return self.state,
        };

        if let Err(collision) = snake.advance() {
            return self.lose(&collision);
        }

        // Anything on its last tick goes before the snake gets a chance at it
        expire(&mut self.food);
        expire(&mut self.traps);

        if self.roll(self.food_config.probability) {
            let (cell, life) = self.spawn_spot(self.food_config.min_life, self.food_config.max_life);
            debug!(row = cell.row, col = cell.col, life, "food spawned");
            self.place_food(cell, life);
        }
        self.eat_food();

        if self.roll(self.trap_config.probability) {
            let (cell, life) = self.spawn_spot(self.trap_config.min_life, self.trap_config.max_life);
            debug!(row = cell.row, col = cell.col, life, "trap spawned");
            self.place_trap(cell, life);
        }
        self.spring_traps()
    }

    pub fn steer(&mut self, direction: Direction) {
        if let Some(snake) = self.snake.as_mut() {
            snake.steer(direction);
        }
    }

    pub fn grow_snake(&mut self) {
        if self.state != Outcome::Continue {
            return;
        }

        if let Some(snake) = self.snake.as_mut() {
            snake.grow();
            info!(len = snake.len(), "snake grown by hand");
        }
    }

    pub fn shrink_snake(&mut self) -> Outcome {
        if self.state != Outcome::Continue {
            return self.state;
        }

        let res = match self.snake.as_mut() {
            Some(snake) => snake.shrink(1),
            None => return self.state,
        };

        match res {
            Ok(()) => {
                info!(len = self.snake_len(), "snake shrunk by hand");
                self.state
            },
            Err(collision) => self.lose(&collision),
        }
    }

    /// Stretches the time between ticks by `factor`, staying within
    /// `MIN_TICK_INTERVAL..=MAX_TICK_INTERVAL`.
    pub fn adjust_speed(&mut self, factor: f64) {
        self.tick_interval = clamp_interval(self.tick_interval.as_secs_f64() * factor);
        info!(interval_ms = self.tick_interval.as_millis() as u64, "tick interval changed");
    }

    pub fn end(&mut self) {
        if self.state == Outcome::Continue {
            info!(score = self.score, "match ended");
            self.state = Outcome::Ended;
        }
    }

    pub fn place_food(&mut self, cell: Cell, life: u32) {
        self.food.push(TimedEntity { cell, expires: life });
    }

    pub fn place_trap(&mut self, cell: Cell, life: u32) {
        self.traps.push(TimedEntity { cell, expires: life });
    }

    /// Draws snake, food and traps into a fresh grid, in that order.
    pub fn snapshot(&self) -> Grid {
        let mut grid = vec![vec![self.symbols.blank; self.width as usize]; self.height as usize];

        let snake_cells = self.snake.iter().flat_map(|snake| snake.positions().iter());
        let layers = snake_cells.map(|&cell| (cell, self.symbols.snake))
            .chain(self.food.iter().map(|e| (e.cell, self.symbols.food)))
            .chain(self.traps.iter().map(|e| (e.cell, self.symbols.trap)));

        for (cell, ch) in layers {
            if let Some(slot) = grid.get_mut(cell.row as usize).and_then(|row| row.get_mut(cell.col as usize)) {
                *slot = ch;
            }
        }

        grid
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn state(&self) -> Outcome {
        self.state
    }

    pub fn snake(&self) -> Option<&Snake> {
        self.snake.as_ref()
    }

    pub fn food(&self) -> &[TimedEntity] {
        &self.food
    }

    pub fn traps(&self) -> &[TimedEntity] {
        &self.traps
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    ///////////////////////////////////////////////////////////////////////////

    fn snake_len(&self) -> usize {
        self.snake.as_ref().map_or(0, Snake::len)
    }

    fn lose(&mut self, reason: &dyn std::error::Error) -> Outcome {
        info!(score = self.score, %reason, "snake died");
        self.state = Outcome::Lost;
        self.state
    }

    fn roll(&mut self, probability: f64) -> bool {
        self.rng.gen::<f64>() < probability
    }

    fn spawn_spot(&mut self, min_life: u32, max_life: u32) -> (Cell, u32) {
        let cell = Cell::new(self.rng.gen_range(0..self.height), self.rng.gen_range(0..self.width));
        let life = self.rng.gen_range(min_life..=max_life);
        (cell, life)
    }

    fn eat_food(&mut self) {
        let snake = match self.snake.as_mut() {
            Some(snake) => snake,
            None => return,
        };

        // The snake grows as it eats, so later food is checked against the longer body
        let mut i = 0;
        while i < self.food.len() {
            if snake.occupies(self.food[i].cell) {
                snake.grow();
                self.food.remove(i);
                self.score += self.food_config.score;
                info!(score = self.score, len = snake.len(), "food eaten");
            } else {
                i += 1;
            }
        }
    }

    fn spring_traps(&mut self) -> Outcome {
        let mut i = 0;
        while i < self.traps.len() {
            let hit = self.snake.as_ref().map_or(false, |snake| snake.occupies(self.traps[i].cell));
            if !hit {
                i += 1;
                continue;
            }

            let res = match self.snake.as_mut() {
                Some(snake) => snake.shrink(self.trap_damage),
                None => return self.state,
            };
            if let Err(collision) = res {
                return self.lose(&collision);
            }

            self.traps.remove(i);
            self.score -= self.trap_damage as i64 * self.trap_config.score;
            info!(score = self.score, len = self.snake_len(), "trap sprung");
        }

        self.state
    }
}

fn clamp_interval(secs: f64) -> Duration {
    if secs.is_nan() {
        return MAX_TICK_INTERVAL;
    }
    let secs = secs.max(MIN_TICK_INTERVAL.as_secs_f64()).min(MAX_TICK_INTERVAL.as_secs_f64());
    Duration::from_secs_f64(secs)
}

/// Counts every entity down by one tick and drops the spent ones.
fn expire(entities: &mut Vec<TimedEntity>) {
    for entity in entities.iter_mut() {
        entity.expires = entity.expires.saturating_sub(1);
    }
    entities.retain(|entity| entity.expires > 0);
}

/// Frames `grid` with a border of the given widths and characters.
pub fn add_borders(grid: &[Vec<char>], style: &BorderStyle) -> Grid {
    let width = grid.first().map_or(0, Vec::len);
    let full_width = style.left + width + style.right;

    let mut framed = Vec::with_capacity(style.top + grid.len() + style.bottom);
    framed.extend((0..style.top).map(|_| vec![style.sym_tb; full_width]));
    for row in grid {
        let mut line = Vec::with_capacity(full_width);
        line.extend(std::iter::repeat(style.sym_lr).take(style.left));
        line.extend_from_slice(row);
        line.extend(std::iter::repeat(style.sym_lr).take(style.right));
        framed.push(line);
    }
    framed.extend((0..style.bottom).map(|_| vec![style.sym_tb; full_width]));

    framed
}
