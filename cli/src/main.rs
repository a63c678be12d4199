//! # 4096 CLI
//!
//! Terminal front end for the game core: play interactively with the
//! keyboard, or run headless simulations with simple policies.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use env_logger::Env;
use game_4096_core::{
    Direction, EndReason, GameSession, MergeHazard, SessionConfig, SessionState,
    SkillProgress, Snapshot, DEFAULT_SIZE, DEFAULT_WIN_TILE,
};
use log::{debug, info, warn};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

#[derive(Parser, Debug)]
#[command(name = "game-4096")]
#[command(author, version, about = "Play 4096 in the terminal or run simulations")]
struct Args {
    /// Run in interactive mode (default if no other mode specified)
    #[arg(short, long, conflicts_with = "episodes")]
    interactive: bool,

    /// Number of episodes to run in headless mode
    #[arg(short, long)]
    episodes: Option<u32>,

    /// Random seed for deterministic runs
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Board side length
    #[arg(long, default_value_t = DEFAULT_SIZE)]
    size: usize,

    /// Tile value that counts as a win
    #[arg(long, default_value_t = DEFAULT_WIN_TILE)]
    win_tile: u32,

    /// Chance of dying on each merge (0 disables the hazard)
    #[arg(long, default_value_t = 0.0)]
    death_rate: f64,

    /// Maximum steps per episode (0 = unlimited)
    #[arg(short, long, default_value_t = 10000)]
    max_steps: u32,

    /// Policy for headless mode
    #[arg(short, long, value_enum, default_value = "random")]
    policy: Policy,

    /// Show board after each move in headless mode
    #[arg(long)]
    verbose: bool,

    /// JSON file holding the best score and the last game (interactive mode)
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// Continue the game saved in --state-file instead of starting fresh
    #[arg(long, requires = "state_file")]
    resume: bool,
}

impl Args {
    fn config(&self) -> SessionConfig {
        SessionConfig {
            size: self.size,
            win_tile: self.win_tile,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Policy {
    /// Random legal moves
    Random,
    /// Cycle through moves: Left, Down, Right, Up
    Cycle,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let args = Args::parse();
    args.config().validate().context("invalid game settings")?;

    match args.episodes {
        Some(episodes) if !args.interactive => run_headless(&args, episodes),
        _ => run_interactive(&args),
    }
}

// =============================================================================
// Interactive mode
// =============================================================================

/// Run interactive mode where the user plays with the keyboard.
fn run_interactive(args: &Args) -> Result<()> {
    let saved = match &args.state_file {
        Some(path) => load_state(path)?,
        None => None,
    };
    let best_score = saved.as_ref().map_or(0, |s| s.best_score);

    let mut session = match saved.filter(|_| args.resume) {
        Some(snapshot) => {
            info!("resuming saved game with score {}", snapshot.score);
            GameSession::resume_with_rng(
                &snapshot,
                args.win_tile,
                SmallRng::seed_from_u64(args.seed),
            )
            .context("saved game is corrupt")?
        }
        None => GameSession::with_config(args.config(), args.seed)?,
    }
    .with_best_score(best_score);

    let mut skills = SkillProgress::new();
    let mut hazard = MergeHazard::new(args.death_rate, args.seed.wrapping_add(1))?;

    // Set terminal to raw mode for single-key input
    let raw_mode = RawMode::enable();
    let mut stdin = io::stdin();
    let mut buffer = [0u8; 3];
    redraw(&session, &skills, None)?;

    loop {
        let bytes_read = stdin.read(&mut buffer).unwrap_or(0);
        if bytes_read == 0 {
            continue;
        }

        match parse_input(&buffer[..bytes_read]) {
            InputAction::Move(direction) => {
                let delta =
                    session.apply_move_observed(direction, &mut [&mut skills, &mut hazard]);
                if !delta.accepted {
                    continue;
                }

                let mut notes = Vec::new();
                if delta.score_delta > 0 {
                    notes.push(format!("+{} points!", delta.score_delta));
                }
                if delta.reached_win {
                    notes.push(format!("*** {} reached! Keep going ***", args.win_tile));
                }
                redraw(&session, &skills, Some(notes.as_slice()))?;

                // The terminal draws the whole move at once, so the
                // transition is finished as soon as the frame is out.
                if delta.state == SessionState::Animating {
                    session.animations_complete();
                }
                if delta.moved {
                    save_session(args.state_file.as_deref(), &session);
                }
            }
            InputAction::Restart => {
                session.reset();
                skills.reset_progress();
                redraw(&session, &skills, None)?;
            }
            InputAction::Quit => {
                save_session(args.state_file.as_deref(), &session);
                drop(raw_mode);
                println!("\nGoodbye!");
                return Ok(());
            }
            InputAction::None => {}
        }
    }
}

fn redraw(
    session: &GameSession,
    skills: &SkillProgress,
    notes: Option<&[String]>,
) -> Result<()> {
    let mut out = io::stdout().lock();
    write!(out, "\x1b[2J\x1b[H")?; // Clear screen
    writeln!(out, "=== 4096 ===")?;
    writeln!(out, "Controls: WASD or Arrow Keys | Q to quit | R to restart\n")?;
    writeln!(
        out,
        "Score: {}  Best: {}  Skill points: {} ({}/100)",
        session.score(),
        session.best_score(),
        skills.points(),
        skills.toward_next()
    )?;
    write!(out, "{}", session.board())?;

    for note in notes.unwrap_or_default() {
        writeln!(out, "  {note}")?;
    }

    if session.is_over() {
        let reason = match session.end_reason() {
            Some(EndReason::Observer) => "Killed on a merge",
            _ => "No moves left",
        };
        writeln!(out, "\n  *** GAME OVER: {reason} ***")?;
        writeln!(out, "  Final Score: {}", session.score())?;
        writeln!(out, "  Max Tile: {}", session.board().max_tile())?;
        writeln!(out, "\n  Press R to restart or Q to quit")?;
    }
    out.flush()?;
    Ok(())
}

enum InputAction {
    Move(Direction),
    Restart,
    Quit,
    None,
}

fn parse_input(bytes: &[u8]) -> InputAction {
    match bytes {
        // Arrow keys (escape sequences)
        [27, 91, 65] => InputAction::Move(Direction::Up),
        [27, 91, 66] => InputAction::Move(Direction::Down),
        [27, 91, 67] => InputAction::Move(Direction::Right),
        [27, 91, 68] => InputAction::Move(Direction::Left),

        // WASD keys
        [b'w'] | [b'W'] => InputAction::Move(Direction::Up),
        [b's'] | [b'S'] => InputAction::Move(Direction::Down),
        [b'a'] | [b'A'] => InputAction::Move(Direction::Left),
        [b'd'] | [b'D'] => InputAction::Move(Direction::Right),

        // Control keys
        [b'q'] | [b'Q'] | [3] | [27] => InputAction::Quit, // q, Q, Ctrl+C, Esc
        [b'r'] | [b'R'] => InputAction::Restart,

        _ => InputAction::None,
    }
}

// =============================================================================
// Persistence
// =============================================================================

fn load_state(path: &Path) -> Result<Option<Snapshot>> {
    if !path.exists() {
        return Ok(None);
    }
    let json = fs::read_to_string(path)
        .with_context(|| format!("reading state file {}", path.display()))?;
    let snapshot = Snapshot::from_json(&json)
        .with_context(|| format!("parsing state file {}", path.display()))?;
    Ok(Some(snapshot))
}

fn write_state(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let json = snapshot.to_json()?;
    fs::write(path, json).with_context(|| format!("writing state file {}", path.display()))
}

/// Best effort: a failed save must not take the game down with it.
fn save_session(path: Option<&Path>, session: &GameSession) {
    if let Some(path) = path {
        if let Err(err) = write_state(path, &session.snapshot()) {
            warn!("could not save game: {err:#}");
        }
    }
}

// =============================================================================
// Headless mode
// =============================================================================

/// Run headless simulation mode.
fn run_headless(args: &Args, episodes: u32) -> Result<()> {
    if episodes == 0 {
        anyhow::bail!("--episodes must be at least 1");
    }

    let mut scores: Vec<u32> = Vec::with_capacity(episodes as usize);
    let mut max_tiles: Vec<u32> = Vec::with_capacity(episodes as usize);
    let mut wins = 0u32;

    // Separate RNG for action selection so policies do not disturb spawns
    let mut action_rng = SmallRng::seed_from_u64(args.seed.wrapping_add(1000));

    for episode in 0..episodes {
        let episode_seed = args.seed.wrapping_add(episode as u64);
        let mut session = GameSession::with_config(args.config(), episode_seed)?;
        let mut hazard = MergeHazard::new(args.death_rate, episode_seed.wrapping_add(1))?;
        let mut steps = 0;
        let mut action_cycle = 0;

        while !session.is_over() && (args.max_steps == 0 || steps < args.max_steps) {
            let action = match args.policy {
                Policy::Random => select_random_action(&session, &mut action_rng),
                Policy::Cycle => select_cycle_action(&session, &mut action_cycle),
            };

            let Some(direction) = action else {
                break; // No legal moves
            };
            let delta = session.apply_move_observed(direction, &mut [&mut hazard]);
            if delta.state == SessionState::Animating {
                session.animations_complete();
            }
            steps += 1;

            if args.verbose {
                println!("Episode {} Step {}: {}", episode + 1, steps, direction);
                print!("{}", session.board());
            }
        }

        let score = session.score();
        let max_tile = session.board().max_tile();
        debug!("episode {} finished after {steps} steps", episode + 1);

        scores.push(score);
        max_tiles.push(max_tile);
        if session.has_won() {
            wins += 1;
        }

        if args.verbose {
            println!(
                "Episode {}: Score={}, MaxTile={}, Steps={}",
                episode + 1,
                score,
                max_tile,
                steps
            );
        }
    }

    print_summary(args, &mut scores, &max_tiles, wins);
    Ok(())
}

/// Print results in a parseable key=value format.
fn print_summary(args: &Args, scores: &mut [u32], max_tiles: &[u32], wins: u32) {
    let episodes = scores.len();
    let total: u64 = scores.iter().map(|&s| s as u64).sum();
    let avg_score = total as f64 / episodes as f64;
    scores.sort_unstable();
    let median_score = if episodes % 2 == 0 {
        (scores[episodes / 2 - 1] as f64 + scores[episodes / 2] as f64) / 2.0
    } else {
        scores[episodes / 2] as f64
    };

    let mut tile_counts: BTreeMap<u32, u32> = BTreeMap::new();
    for &tile in max_tiles {
        *tile_counts.entry(tile).or_insert(0) += 1;
    }

    println!("=== Simulation Results ===");
    println!("episodes={}", episodes);
    println!("policy={:?}", args.policy);
    println!("seed={}", args.seed);
    println!("size={}", args.size);
    println!("max_steps={}", args.max_steps);
    println!("death_rate={}", args.death_rate);
    println!("avg_score={:.2}", avg_score);
    println!("median_score={:.2}", median_score);
    println!("min_score={}", scores.first().unwrap_or(&0));
    println!("max_score={}", scores.last().unwrap_or(&0));
    println!("max_tile_overall={}", max_tiles.iter().max().unwrap_or(&0));
    println!("wins={}", wins);

    let distribution: Vec<String> = tile_counts
        .iter()
        .map(|(tile, count)| format!("{tile}:{count}"))
        .collect();
    println!("tile_distribution={}", distribution.join(","));
}

/// Select a random legal move.
fn select_random_action(session: &GameSession, rng: &mut SmallRng) -> Option<Direction> {
    let legal = session.legal_directions();
    let candidates: Vec<Direction> = Direction::all()
        .into_iter()
        .zip(legal)
        .filter_map(|(direction, ok)| ok.then_some(direction))
        .collect();
    candidates.choose(rng).copied()
}

/// Select moves in a cycle: Left, Down, Right, Up.
fn select_cycle_action(session: &GameSession, cycle: &mut usize) -> Option<Direction> {
    let order = [Direction::Left, Direction::Down, Direction::Right, Direction::Up];
    let legal = session.legal_directions();

    // Try moves in cycle order, starting from current position
    for _ in 0..order.len() {
        let direction = order[*cycle % order.len()];
        *cycle += 1;
        if legal[direction as usize] {
            return Some(direction);
        }
    }

    None
}

// =============================================================================
// Terminal raw mode
// =============================================================================

/// Keeps stdin in raw mode until dropped, including on early error returns.
struct RawMode;

impl RawMode {
    fn enable() -> Self {
        enable_raw_mode();
        RawMode
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        disable_raw_mode();
    }
}

#[cfg(unix)]
fn enable_raw_mode() {
    use std::os::unix::io::AsRawFd;
    // SAFETY: termios is plain data and the fd is our own stdin.
    unsafe {
        let fd = io::stdin().as_raw_fd();
        let mut termios: libc::termios = std::mem::zeroed();
        libc::tcgetattr(fd, &mut termios);
        termios.c_lflag &= !(libc::ICANON | libc::ECHO);
        termios.c_cc[libc::VMIN] = 1;
        termios.c_cc[libc::VTIME] = 0;
        libc::tcsetattr(fd, libc::TCSANOW, &termios);
    }
}

#[cfg(unix)]
fn disable_raw_mode() {
    use std::os::unix::io::AsRawFd;
    // SAFETY: see enable_raw_mode.
    unsafe {
        let fd = io::stdin().as_raw_fd();
        let mut termios: libc::termios = std::mem::zeroed();
        libc::tcgetattr(fd, &mut termios);
        termios.c_lflag |= libc::ICANON | libc::ECHO;
        libc::tcsetattr(fd, libc::TCSANOW, &termios);
    }
}

#[cfg(not(unix))]
fn enable_raw_mode() {
    // Without raw mode every key needs Enter
}

#[cfg(not(unix))]
fn disable_raw_mode() {}
