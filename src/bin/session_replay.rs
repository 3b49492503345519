//! Replay a recorded landmark stream through the repetition engine.
//!
//! Input is JSON lines, one frame per line:
//!   {"landmarks": [[x, y, visibility], null, ...]}
//! with up to 33 entries in BlazePose order.
//!
//! Usage:
//!   session_replay --input session.jsonl --exercise squat

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use rep_tracker::config::Config;
use rep_tracker::pose::{Landmark, Landmarks};
use rep_tracker::{CueSink, ExerciseType, RepEngine};

#[derive(Parser, Debug)]
#[command(name = "session_replay")]
#[command(about = "Count repetitions in a recorded landmark stream")]
struct Args {
    /// JSON lines file with one landmark frame per line
    #[arg(long)]
    input: PathBuf,

    /// Exercise name ("Bicep Curl", "Squat", "Lunges")
    #[arg(long, default_value = "Bicep Curl")]
    exercise: String,

    /// Engine configuration
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Only print the final summary
    #[arg(long)]
    quiet: bool,
}

#[derive(Debug, Deserialize)]
struct ReplayFrame {
    landmarks: Vec<Option<[f32; 3]>>,
}

impl ReplayFrame {
    fn to_landmarks(&self) -> Landmarks {
        let points: Vec<Option<Landmark>> = self
            .landmarks
            .iter()
            .map(|p| p.map(|[x, y, v]| Landmark::new(x, y, v)))
            .collect();
        Landmarks::from_slice(&points)
    }
}

/// レップ完了をターミナルに通知
struct TerminalCue;

impl CueSink for TerminalCue {
    fn success(&mut self) {
        println!("  *** rep ***");
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let exercise: ExerciseType = args.exercise.parse()?;
    let config = Config::load_or_default(&args.config);
    let file = File::open(&args.input)
        .with_context(|| format!("failed to open {}", args.input.display()))?;

    println!("Session Replay");
    println!("Exercise: {}", exercise);
    println!("Input: {}", args.input.display());
    println!(
        "Filter: min_cutoff={}, beta={}, window={}",
        config.filter.min_cutoff, config.filter.beta, config.filter.window
    );
    println!("Visibility gate: {}", config.tracking.visibility_threshold);
    println!();

    let mut engine = RepEngine::with_cue(config, Box::new(TerminalCue));
    engine.reset_session();

    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        // 壊れた行はロストフレームとして扱う
        let landmarks = match serde_json::from_str::<ReplayFrame>(&line) {
            Ok(frame) => frame.to_landmarks(),
            Err(e) => {
                log::warn!("line {}: {}", line_no + 1, e);
                Landmarks::default()
            }
        };

        let out = engine.process_frame(exercise, &landmarks);
        if args.quiet {
            continue;
        }
        let angle = out
            .filtered_angle
            .map_or_else(|| "---".to_string(), |a| format!("{:>3}", a));
        println!(
            "{:>5} angle={} speed={:>6.0} reps={:>2} {:?} [{:?}] {}{}",
            line_no + 1,
            angle,
            out.speed,
            out.snapshot.reps,
            out.snapshot.phase,
            out.snapshot.tone,
            out.snapshot.feedback,
            if out.tracking_lost { "  LOST TRACKING" } else { "" }
        );
    }

    let summary = engine.summary(exercise);
    println!();
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
