//! Command-line surface for the `coach-agent` binary.

use crate::evaluation::Category;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub const DISCLAIMER: &str =
    "⚠️  Disclaimer: This is general information only. Consult professionals for personalized advice.";
pub const GOODBYE: &str = "👋 Goodbye! Stay fit!";
pub const QUESTION_PROMPT: &str = "💪 What's your fitness question?";

#[derive(Parser, Debug)]
#[command(name = "coach-agent")]
#[command(about = "Fitness AI assistant backed by a tool-calling agent", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the retriever config file
    #[arg(long, value_parser = existing_path)]
    pub retriever_config_path: PathBuf,

    /// Query to run
    #[arg(short, long)]
    pub query: Option<String>,

    /// Use a predefined example query
    #[arg(short, long, value_enum)]
    pub example: Option<Example>,

    /// Show detailed agent reasoning
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Score the agent on the built-in fitness questions
    Evaluate {
        /// Include tests for the workout, nutrition and safety tools
        #[arg(long)]
        include_tool_tests: bool,

        /// Test only one category of questions
        #[arg(long, value_enum, default_value_t = Category::All)]
        category: Category,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Example {
    Beginner,
    Nutrition,
    Safety,
    Muscle,
    Program,
}

impl Example {
    pub fn query(self) -> &'static str {
        match self {
            Example::Beginner => "I'm new to fitness. What's a good starter workout routine?",
            Example::Nutrition => {
                "Calculate my daily calories: 30yo male, 80kg, 180cm, moderately active, want to lose fat"
            }
            Example::Safety => "Is deadlifting safe if I have lower back pain?",
            Example::Muscle => "What's the best way to build muscle as a beginner?",
            Example::Program => "Create a 3-day workout plan for muscle gain with full gym access",
        }
    }
}

fn existing_path(raw: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(raw);
    if path.exists() {
        Ok(path)
    } else {
        Err(format!("Path '{}' does not exist.", raw))
    }
}

/// The query line printed before the agent runs.
pub fn render_query(query: &str) -> String {
    format!("\n📝 Query: {}\n{}", query, "-".repeat(50))
}

/// The framed answer followed by the disclaimer.
pub fn render_response(answer: &str) -> String {
    let rule = "=".repeat(50);
    format!("\n🤖 Fitness AI Assistant Response:\n{rule}\n{answer}\n{rule}\n\n{DISCLAIMER}")
}
