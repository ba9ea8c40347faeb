use std::{collections::VecDeque, fmt, time::{Duration, Instant}};

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::info;

use crate::Cell;
use crate::config::{GameConfig, START_LENGTH};
use crate::snake::{Direction::{self, *}, Snake};
use crate::term::TermManager;
use crate::world::{add_borders, BorderStyle, GameWorld, Outcome};

const SPEED_STEP: f64 = 1.1;
const PAUSE_POLL_MS: u64 = 20;

const HELP_TEXT: &[&str] = &[
    "Hello reptile! Hunt little bunnies(%),",
    "be careful with huntsman's traps(^) and try not to",
    "eat yourself. Since you are a super-snake, you can",
    "slow down or speed up the stream of time.",
    "But it looks like you have recently damaged your brain",
    "and your response is a bit slow. Have fun :)",
    "",
    "h(a) - left, l(d) - right, j(s) - down, k(w) - up;",
    "q - slow down, e - speed up;",
    "p - pause; ctrl-c - exit;",
];

const EXIT_TEXT: &str = "Thanks for the game! Press <Enter> to exit.";
const LOSE_TEXT: &str = "You lose!!! Press <Enter> to exit.";
const PAUSE_TEXT: &str = "Pause...";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Steer(Direction),
    Pause,
    Quit,
    SpeedUp,
    SpeedDown,
    Grow,
    Shrink,
}

impl Command {
    pub fn from_key(ev: &KeyEvent) -> Option<Command> {
        if is_ctrl_c(ev) {
            return Some(Command::Quit);
        }

        match ev.code {
            KeyCode::Char('h') | KeyCode::Char('a') | KeyCode::Left => Some(Command::Steer(Left)),
            KeyCode::Char('j') | KeyCode::Char('s') | KeyCode::Down => Some(Command::Steer(Down)),
            KeyCode::Char('k') | KeyCode::Char('w') | KeyCode::Up => Some(Command::Steer(Up)),
            KeyCode::Char('l') | KeyCode::Char('d') | KeyCode::Right => Some(Command::Steer(Right)),
            KeyCode::Char('q') => Some(Command::SpeedDown),
            KeyCode::Char('e') => Some(Command::SpeedUp),
            KeyCode::Char('r') => Some(Command::Grow),
            KeyCode::Char('t') => Some(Command::Shrink),
            KeyCode::Char('p') => Some(Command::Pause),
            _ => None,
        }
    }
}

/// How a match finished.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Summary {
    pub outcome: Outcome,
    pub score: i64,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.outcome {
            Outcome::Continue => "running",
            Outcome::Lost => "lost",
            Outcome::Ended => "ended",
        };
        write!(f, "Your score is {} ({}).", self.score, tag)
    }
}

pub struct SnakeGame {
    world: GameWorld,
    term: TermManager,
    pending: VecDeque<Command>,
    paused: bool,
}

impl SnakeGame {
    pub fn new(config: GameConfig) -> Result<Self> {
        let mut world = GameWorld::new(&config);
        world.set_snake(starting_snake(&config));
        Ok(SnakeGame { world, term: TermManager::new()?, pending: VecDeque::new(), paused: false })
    }

    pub fn initialize(&mut self) -> Result<()> {
        self.term.setup()?;
        self.term.clear()
    }

    pub fn restore(&mut self) -> Result<()> {
        self.term.restore()
    }

    /// Sets the terminal up, plays one match and puts the terminal back,
    /// even if setting up or playing failed.
    pub fn run(&mut self) -> Result<Summary> {
        with_restore(
            self,
            |game| {
                game.initialize()?;
                game.play()
            },
            |game| game.restore(),
        )
    }

    /// Runs the match until the snake dies or the player quits, then waits
    /// for Enter.
    pub fn play(&mut self) -> Result<Summary> {
        info!(height = self.world.height(), width = self.world.width(), "match started");

        let outcome = loop {
            let wait = if self.paused { Duration::from_millis(PAUSE_POLL_MS) } else { self.world.tick_interval() };
            self.wait_for_tick(wait)?;

            if self.pending.contains(&Command::Quit) {
                self.world.end();
                break Outcome::Ended;
            }

            if self.paused {
                self.wait_out_pause()?;
                continue;
            }

            // One command per tick; the rest wait their turn
            let command = self.pending.pop_front();
            if command == Some(Command::Pause) {
                self.toggle_pause()?;
            }

            let outcome = run_cycle(&mut self.world, command);
            self.render()?;
            if outcome != Outcome::Continue {
                break outcome;
            }

            if self.paused {
                self.term.show_message(&[PAUSE_TEXT])?;
            }
        };

        let text = if outcome == Outcome::Lost { LOSE_TEXT } else { EXIT_TEXT };
        self.term.show_message(&[text, &*format!("Your score is {}.", self.world.score())])?;
        self.wait_for_enter()?;

        Ok(Summary { outcome, score: self.world.score() })
    }

    ///////////////////////////////////////////////////////////////////////////

    /// Queues keys until `wait` has passed. Returns early on Ctrl-C.
    fn wait_for_tick(&mut self, wait: Duration) -> Result<()> {
        let deadline = Instant::now() + wait;

        loop {
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }

            if let Some(command) = self.term.next_key(deadline - now)?.as_ref().and_then(Command::from_key) {
                self.pending.push_back(command);
                if command == Command::Quit {
                    return Ok(());
                }
            }
        }
    }

    fn wait_out_pause(&mut self) -> Result<()> {
        while let Some(command) = self.pending.pop_front() {
            if command == Command::Pause {
                return self.toggle_pause();
            }
        }
        Ok(())
    }

    /// Flips the pause flag. The pause banner goes up after the next frame is drawn.
    fn toggle_pause(&mut self) -> Result<()> {
        self.paused = !self.paused;
        info!(paused = self.paused, "pause toggled");

        if self.paused {
            Ok(())
        } else {
            self.term.hide_message()
        }
    }

    fn wait_for_enter(&mut self) -> Result<()> {
        loop {
            let ev = self.term.read_key_blocking()?;
            if ev.code == KeyCode::Enter || is_ctrl_c(&ev) {
                return Ok(());
            }
        }
    }

    fn render(&mut self) -> Result<()> {
        let framed = add_borders(&self.world.snapshot(), &BorderStyle::default());
        let mut lines: Vec<String> = framed.iter().map(|row| row.iter().collect()).collect();

        lines.extend(HELP_TEXT.iter().map(|line| line.to_string()));
        lines.push(String::new());
        lines.push(format!("Your score is {}.", self.world.score()));

        self.term.draw_lines(0, &lines)?;
        self.term.flush()
    }
}

/// One tick, then the command that was waiting for it. Pause is the
/// driver's business and does nothing here.
fn run_cycle(world: &mut GameWorld, command: Option<Command>) -> Outcome {
    let outcome = world.tick();
    if outcome != Outcome::Continue {
        return outcome;
    }

    match command {
        Some(Command::Steer(dir)) => world.steer(dir),
        Some(Command::SpeedUp) => world.adjust_speed(1.0 / SPEED_STEP),
        Some(Command::SpeedDown) => world.adjust_speed(SPEED_STEP),
        Some(Command::Grow) => world.grow_snake(),
        Some(Command::Shrink) => return world.shrink_snake(),
        Some(Command::Quit) => world.end(),
        Some(Command::Pause) | None => {},
    }

    world.state()
}

/// Runs `body`, then `restore` whatever happened. The body's error wins.
fn with_restore<S, T>(
    state: &mut S,
    body: impl FnOnce(&mut S) -> Result<T>,
    restore: impl FnOnce(&mut S) -> Result<()>,
) -> Result<T> {
    let res = body(state);
    let restored = restore(state);
    let value = res?;
    restored?;
    Ok(value)
}

/// Segments stacked under the centre of the grid, heading up.
fn starting_snake(config: &GameConfig) -> Snake {
    let (row, col) = (config.height / 2, config.width / 2);
    let start = (0..START_LENGTH).map(|i| Cell::new(row + i, col)).collect();
    Snake::new(start, Up.velocity())
}

fn is_ctrl_c(ev: &KeyEvent) -> bool {
    matches!(ev, KeyEvent { code: KeyCode::Char('c'), modifiers: KeyModifiers::CONTROL })
}
