//! The `mathquiz play` command.

use std::io::BufRead;
use std::path::PathBuf;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use mathquiz_core::generator::RandomSource;
use mathquiz_core::timer::TokioCountdown;
use mathquiz_core::{
    load_config_from, Intent, Operator, QuizConfig, QuizEvent, RoundEngine, Session, SessionEnd,
};

use crate::render::{print_summary, ConsoleObserver, JsonObserver};

/// Command-line options for a play run.
pub struct PlayOptions {
    pub mode: Option<Operator>,
    pub seed: Option<u64>,
    pub time_limit_ms: Option<u64>,
    pub tick_ms: Option<u64>,
    pub lives: Option<u32>,
    pub json: bool,
    pub config: Option<PathBuf>,
}

pub async fn execute(options: PlayOptions) -> Result<()> {
    let config = resolve_config(&options)?;
    if options.json && options.mode.or(config.default_mode).is_none() {
        anyhow::bail!("--json needs --mode or a default_mode in the config");
    }

    let (events, mut queue) = mpsc::unbounded_channel();
    spawn_input_reader(events.clone());

    let mut games: u64 = 0;
    loop {
        let operator = match options.mode.or(config.default_mode) {
            Some(op) => op,
            None => match choose_mode(&mut queue).await {
                Some(op) => op,
                None => return Ok(()),
            },
        };

        let end = play_one(&config, &options, operator, games, &events, &mut queue).await;
        games += 1;

        if options.json {
            return Ok(());
        }
        print_summary(&end, operator.title());
        if let SessionEnd::Abandoned { .. } = end {
            println!("Game abandoned.");
            return Ok(());
        }

        println!("\nPlay again? [y/N]");
        match next_line(&mut queue).await {
            Some(answer) if matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") => {}
            _ => return Ok(()),
        }
    }
}

/// Merge flags over the loaded config file.
fn resolve_config(options: &PlayOptions) -> Result<QuizConfig> {
    let mut config = load_config_from(options.config.as_deref())?;
    if let Some(ms) = options.time_limit_ms {
        config.time_limit_ms = ms;
    }
    if let Some(ms) = options.tick_ms {
        config.tick_ms = ms;
    }
    if let Some(lives) = options.lives {
        config.starting_lives = lives;
    }
    config.finalize()
}

async fn play_one(
    config: &QuizConfig,
    options: &PlayOptions,
    operator: Operator,
    game: u64,
    events: &UnboundedSender<QuizEvent>,
    queue: &mut UnboundedReceiver<QuizEvent>,
) -> SessionEnd {
    let rng: Box<dyn RandomSource> = match options.seed {
        Some(seed) => Box::new(StdRng::seed_from_u64(seed.wrapping_add(game))),
        None => Box::new(StdRng::from_entropy()),
    };
    let mut engine = RoundEngine::new(
        config.engine_config(),
        rng,
        Box::new(TokioCountdown::new(events.clone())),
    );
    if options.json {
        engine.subscribe(Box::new(JsonObserver));
    } else {
        println!("{} game: answer each question before the timer runs out.", operator.title());
        engine.subscribe(Box::new(ConsoleObserver));
    }

    let mut session = Session::new(engine);
    session.run(operator, queue).await
}

/// Show the mode menu until the player picks one. `None` if they leave.
async fn choose_mode(queue: &mut UnboundedReceiver<QuizEvent>) -> Option<Operator> {
    loop {
        println!("Choose a game:");
        for (i, op) in Operator::ALL.iter().enumerate() {
            println!("  {}) {}", i + 1, op.title());
        }
        let line = next_line(queue).await?;
        match parse_mode_choice(&line) {
            Some(op) => return Some(op),
            None => println!("Unknown choice: {}", line.trim()),
        }
    }
}

fn parse_mode_choice(line: &str) -> Option<Operator> {
    match line.trim() {
        "1" => Some(Operator::Add),
        "2" => Some(Operator::Subtract),
        "3" => Some(Operator::Multiply),
        other => other.parse().ok(),
    }
}

/// Next line of player input outside a game. Leftover countdown events are
/// skipped.
async fn next_line(queue: &mut UnboundedReceiver<QuizEvent>) -> Option<String> {
    while let Some(event) = queue.recv().await {
        match event {
            QuizEvent::Intent(Intent::Submit(line)) => return Some(line),
            QuizEvent::Intent(Intent::Advance) => return Some("next".to_string()),
            QuizEvent::Intent(Intent::Abandon) => return None,
            QuizEvent::Timer(_) => continue,
        }
    }
    None
}

/// Map a line of input to a player intent.
fn parse_intent(line: &str) -> Intent {
    match line.trim().to_lowercase().as_str() {
        "next" | "n" => Intent::Advance,
        "quit" | "q" | "exit" => Intent::Abandon,
        _ => Intent::Submit(line.to_string()),
    }
}

/// Read stdin on a plain thread so a pending read never holds up exit.
fn spawn_input_reader(events: UnboundedSender<QuizEvent>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let intent = match line {
                Ok(line) => parse_intent(&line),
                Err(e) => {
                    tracing::warn!("failed to read input: {e}");
                    break;
                }
            };
            if events.send(intent.into()).is_err() {
                return;
            }
        }
        let _ = events.send(Intent::Abandon.into());
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intents_from_lines() {
        assert_eq!(parse_intent("12"), Intent::Submit("12".into()));
        assert_eq!(parse_intent(""), Intent::Submit(String::new()));
        assert_eq!(parse_intent(" Next "), Intent::Advance);
        assert_eq!(parse_intent("n"), Intent::Advance);
        assert_eq!(parse_intent("q"), Intent::Abandon);
    }

    #[test]
    fn mode_choices() {
        assert_eq!(parse_mode_choice("1"), Some(Operator::Add));
        assert_eq!(parse_mode_choice(" 3 "), Some(Operator::Multiply));
        assert_eq!(parse_mode_choice("subtract"), Some(Operator::Subtract));
        assert_eq!(parse_mode_choice("4"), None);
    }

    #[test]
    fn flags_override_config() {
        let options = PlayOptions {
            mode: None,
            seed: None,
            time_limit_ms: Some(500),
            tick_ms: None,
            lives: Some(1),
            json: false,
            config: None,
        };
        let config = resolve_config(&options).unwrap();
        assert_eq!(config.time_limit_ms, 500);
        assert_eq!(config.tick_ms, 500);
        assert_eq!(config.starting_lives, 1);
    }

    fn options_with_config(path: PathBuf) -> PlayOptions {
        PlayOptions {
            mode: None,
            seed: None,
            time_limit_ms: None,
            tick_ms: None,
            lives: None,
            json: false,
            config: Some(path),
        }
    }

    #[test]
    fn long_tick_flag_is_fitted_to_time_limit() {
        let options = PlayOptions {
            mode: None,
            seed: None,
            time_limit_ms: Some(1_000),
            tick_ms: Some(5_000),
            lives: Some(2),
            json: false,
            config: None,
        };
        let config = resolve_config(&options).unwrap();
        assert_eq!(config.tick_ms, 1_000);
    }

    #[test]
    fn invalid_flags_are_rejected() {
        let options = PlayOptions {
            mode: None,
            seed: None,
            time_limit_ms: Some(1_000),
            tick_ms: None,
            lives: Some(0),
            json: false,
            config: None,
        };
        let err = resolve_config(&options).unwrap_err();
        assert!(err.to_string().contains("starting_lives must be at least 1"));
    }

    #[test]
    fn lives_flag_fixes_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quiz.toml");
        std::fs::write(&path, "starting_lives = 0\n").unwrap();

        let mut options = options_with_config(path);
        options.lives = Some(3);
        let config = resolve_config(&options).unwrap();
        assert_eq!(config.starting_lives, 3);
    }

    #[test]
    fn short_time_limit_in_file_shortens_tick() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quiz.toml");
        std::fs::write(&path, "time_limit_ms = 500\n").unwrap();

        let mut options = options_with_config(path);
        options.lives = Some(3);
        let config = resolve_config(&options).unwrap();
        if std::env::var("MATHQUIZ_TIME_LIMIT_MS").is_err() {
            assert_eq!(config.time_limit_ms, 500);
            assert_eq!(config.tick_ms, 500);
        }
    }
}
