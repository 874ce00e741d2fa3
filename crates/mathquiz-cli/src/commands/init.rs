//! The `mathquiz init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("mathquiz.toml").exists() {
        println!("mathquiz.toml already exists, skipping.");
    } else {
        std::fs::write("mathquiz.toml", SAMPLE_CONFIG)?;
        println!("Created mathquiz.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit mathquiz.toml to change the time limit or lives");
    println!("  2. Run: mathquiz play");
    println!("  3. Or pick a mode directly: mathquiz play --mode multiply");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# mathquiz configuration

# Time allowed per question, in milliseconds.
time_limit_ms = 10000

# How often the countdown updates, in milliseconds.
tick_ms = 1000

starting_lives = 3
points_per_correct = 10

# Uncomment to skip the mode menu: "add", "subtract" or "multiply".
# default_mode = "add"
"#;
