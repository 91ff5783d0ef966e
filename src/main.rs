use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use tripeaks_solver::{
    action::{Solution, format_actions, format_solution},
    board::{Board, Deck, Opening, Pyramid},
    card::parse_ranks,
    samples,
    solver::{SolveOptions, SolveResult, solve_with},
};

use std::io::{IsTerminal, Write, stderr, stdout};
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};
use std::time::Duration;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Built-in sample deal to solve (1-6)
    #[arg(short = 'S', long, value_name = "NUM", conflicts_with_all = ["pyramid", "deck"])]
    sample: Option<usize>,
    /// The 28 pyramid ranks, peaks first and base last (e.g. "K,7,J,6,6,...")
    #[arg(short, long, value_name = "RANKS", requires = "deck")]
    pyramid: Option<String>,
    /// Deck ranks in draw order
    #[arg(short, long, value_name = "RANKS", requires = "pyramid")]
    deck: Option<String>,
    /// How the first card is played
    #[arg(short, long, value_enum, default_value_t = OpeningArg::Free)]
    opening: OpeningArg,
    /// Max states to explore before stopping
    #[arg(short = 's', long, value_name = "NUM")]
    max_states: Option<u64>,
    /// Stop searching after this many seconds
    #[arg(short, long, value_name = "SECS")]
    time_limit: Option<u64>,
    /// Search the first moves on all cores
    #[arg(short = 'j', long)]
    parallel: bool,
    /// Expand every configuration, even ones already seen (slow)
    #[arg(long)]
    no_memo: bool,
    /// Print only the summary, not every solution
    #[arg(short, long)]
    quiet: bool,
    /// Print solutions as a compact move grid
    #[arg(short, long)]
    compact: bool,
    /// Preview the deal without solving
    #[arg(long)]
    preview: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OpeningArg {
    /// Any free pyramid card or the first deck card may be played first
    Free,
    /// The first deck card is turned up before play starts
    Stock,
}

impl From<OpeningArg> for Opening {
    fn from(value: OpeningArg) -> Self {
        match value {
            OpeningArg::Free => Opening::Free,
            OpeningArg::Stock => Opening::Stock,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut board = if let Some(number) = cli.sample {
        samples::sample(number)?
    } else if let (Some(pyramid), Some(deck)) = (&cli.pyramid, &cli.deck) {
        let ranks = parse_ranks(pyramid).context("Failed to parse pyramid")?;
        let pyramid = Pyramid::tripeaks(&ranks)?;
        let deck = Deck::parse(deck).context("Failed to parse deck")?;
        Board::new(pyramid, deck)
    } else {
        bail!("No deal provided; use `--sample` or `--pyramid` with `--deck`.");
    };
    board.set_opening(cli.opening.into());

    println!("{}\n", board.pretty_print());
    if cli.preview {
        return Ok(());
    }

    let options = SolveOptions {
        memoize: !cli.no_memo,
        parallel: cli.parallel,
        max_states: cli.max_states,
        time_limit: cli.time_limit.map(Duration::from_secs),
    };
    let result = if cli.quiet {
        with_spinner("Solving the game...", || {
            solve_with(&board, &options, |_| {})
        })?
    } else {
        let found = AtomicU64::new(0);
        solve_with(&board, &options, |solution| {
            print_solution(&found, solution, cli.compact)
        })?
    };
    print_summary(&result);

    Ok(())
}

fn print_solution(found: &AtomicU64, solution: &Solution, compact: bool) {
    let number = found.fetch_add(1, Ordering::Relaxed) + 1;
    let body = if compact {
        format_actions(&solution.actions())
    } else {
        format_solution(solution)
    };
    let mut handle = stdout().lock();
    let _ = writeln!(handle, "#{number} ({} moves)\n{body}", solution.len());
    let _ = handle.flush();
}

fn print_summary(result: &SolveResult) {
    for line in summary_lines(result) {
        println!("{line}");
    }
}

fn summary_lines(result: &SolveResult) -> Vec<String> {
    let SolveResult {
        count,
        states,
        max_depth,
        elapsed,
        truncated,
        ..
    } = result;
    let secs = elapsed.as_secs();
    let time = if secs < 90 {
        format!("{secs}.{:03}s", elapsed.subsec_millis())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    };
    let mut lines = Vec::new();
    match (*count, *truncated) {
        (0, false) => lines.push(format!("✗ No solutions found. Time: {time}, States: {states}")),
        (0, true) => lines.push(format!(
            "✗ No solutions found before the limit was reached. Time: {time}, States: {states}"
        )),
        (1, _) => lines.push(format!(
            "✓ 1 solution found. Time: {time}, States: {states}, Depth: {max_depth}"
        )),
        (count, _) => lines.push(format!(
            "✓ {count} solutions found. Time: {time}, States: {states}, Depth: {max_depth}"
        )),
    }
    if *truncated && *count > 0 {
        lines.push("⚠ Search stopped at the state or time limit; results are partial.".into());
    }
    lines
}

/// Runs `solve` while a spinner on stderr shows that the search is still going.
fn with_spinner<T, F: FnOnce() -> T>(message: &str, solve: F) -> T {
    if !stderr().is_terminal() {
        return solve();
    }

    let spinning = Arc::new(AtomicBool::new(true));
    let handle = {
        let spinning = Arc::clone(&spinning);
        let message = message.to_string();
        std::thread::spawn(move || {
            let mut err = stderr().lock();
            let _ = write!(err, "\x1b[?25l"); // hide cursor
            for frame in ['|', '/', '-', '\\'].into_iter().cycle() {
                if !spinning.load(Ordering::Relaxed) {
                    break;
                }
                let _ = write!(err, "\r{frame} {message}");
                let _ = err.flush();
                std::thread::sleep(Duration::from_millis(100));
            }
            let _ = write!(err, "\r\x1b[2K\r\x1b[?25h"); // clear line, show cursor
            let _ = err.flush();
        })
    };

    let result = solve();
    spinning.store(false, Ordering::Relaxed);
    let _ = handle.join();
    result
}
