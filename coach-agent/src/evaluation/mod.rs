//! Offline evaluation: runs a fixed prompt set through the agent and scores
//! each answer with an LLM judge.
pub mod density_judge;

pub use density_judge::{parse_judgement, SummaryDensityJudge};

use crate::agent::FitnessAgent;
use crate::error::JudgeError;
use async_trait::async_trait;
use clap::ValueEnum;

pub const EVALUATION_PROMPTS: &[&str] = &[
    "What is progressive overload?

Explain to me:
- what is progressive overload
- how it works in practice
- why it's essential for muscle growth
- different ways to implement it
- common mistakes to avoid

Retrieve the sources when compiling the answer. Also, return the sources you used as context.
",
    "What is muscle protein synthesis and how can I optimize it?",
    "Explain the difference between compound and isolation exercises with examples.",
    "Write me a paragraph on muscle hypertrophy following this structure:

- introduction to muscle growth
- what are the main mechanisms (mechanical tension, metabolic stress, muscle damage)
- practical recommendations for maximizing growth

Include scientific sources where applicable.",
    "What is the role of caloric deficit in fat loss and how do I calculate mine?",
    "List 5 evidence-based strategies for sustainable fat loss and explain why each works.",
    "How does High-Intensity Interval Training (HIIT) compare to steady-state cardio for fat loss?

Explain:
- what is HIIT
- benefits vs drawbacks
- when to use each method
- sample protocols for beginners
",
    "What are macronutrients and how should I distribute them for muscle gain?",
    "Explain the importance of meal timing around workouts for performance and recovery.",
    "List the top 5 supplements for muscle building with:
- what they do
- recommended dosages
- timing
- scientific evidence level
",
    "What is periodization in training and why is it important?",
    "Explain the differences between training for strength vs hypertrophy vs endurance.",
    "How do I know if I'm overtraining?

Include:
- signs and symptoms
- how to prevent it
- recovery strategies
- when to deload
",
    "What are the most common deadlift mistakes and how to fix them?",
    "I have lower back pain - what exercises should I avoid and what are safe alternatives?",
    "How should women adjust their training during different phases of their menstrual cycle?",
    "Is it true that lifting weights will make women bulky? Explain the science.",
    "What is the optimal amount of sleep for muscle recovery and why?",
    "List 5 active recovery methods and their benefits for muscle growth.",
    "I'm completely new to fitness. Create a beginner's roadmap including:
- where to start
- basic exercises to master
- nutrition basics
- common mistakes to avoid
- realistic timeline for results
",
    "What is blood flow restriction training and is it effective?",
    "How can I break through a strength plateau on bench press?",
    "What's the science behind German Volume Training?",
    "How can I maintain muscle mass while traveling frequently?",
    "What are the best strategies for fitting workouts into a busy schedule?",
    "How should a runner incorporate strength training without hurting running performance?",
    "What's the difference between training for powerlifting vs bodybuilding?",
    "What are the best exercises for preventing knee injuries?",
    "How do I properly warm up before heavy lifting?",
    "What are evidence-based strategies for maintaining long-term exercise adherence?",
    "How do I stay motivated when I'm not seeing results?",
];

/// Prompts aimed at the formula-driven tools.
pub const TOOL_SPECIFIC_PROMPTS: &[&str] = &[
    "Create a 3-day beginner workout plan for fat loss with only dumbbells available.",
    "I'm intermediate level, want to build muscle, have access to a full gym, and can train 5 days per week. Design a program for me.",
    "I'm a 30-year-old woman, 65kg, 165cm, moderately active, and want to lose fat. Calculate my daily calories and macros.",
    "Calculate nutrition needs for a 25-year-old male, 80kg, 180cm, very active, trying to gain muscle.",
    "Is it safe to do squats if I have knee pain?",
    "I'm a beginner with lower back issues - check if deadlifts are safe for me.",
    "I'm 35, male, 90kg, 175cm, sedentary, with mild back pain. I want to lose weight and get stronger. Create a complete plan including safe exercises and nutrition.",
    "Design a muscle-building program for someone who can only train 2 days per week, including nutrition recommendations.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Category {
    #[default]
    All,
    General,
    MuscleBuilding,
    FatLoss,
    Nutrition,
    Training,
    Safety,
    Women,
    Recovery,
    Beginner,
    Advanced,
}

impl Category {
    /// Keywords a prompt must contain to fall in this category. `None`
    /// selects every prompt.
    pub fn keywords(self) -> Option<&'static [&'static str]> {
        match self {
            Category::All | Category::General => None,
            Category::MuscleBuilding => {
                Some(&["muscle", "hypertrophy", "protein synthesis", "compound"])
            }
            Category::FatLoss => Some(&["fat loss", "caloric deficit", "HIIT", "cardio"]),
            Category::Nutrition => Some(&["macronutrients", "meal timing", "supplements"]),
            Category::Training => Some(&["periodization", "strength", "overtraining", "plateau"]),
            Category::Safety => Some(&["mistakes", "pain", "injury", "warm up"]),
            Category::Women => Some(&["women", "menstrual"]),
            Category::Recovery => Some(&["sleep", "recovery"]),
            Category::Beginner => Some(&["new to fitness", "beginner"]),
            Category::Advanced => Some(&["blood flow restriction", "German Volume", "plateau"]),
        }
    }

    pub fn matches(self, prompt: &str) -> bool {
        let Some(keywords) = self.keywords() else {
            return true;
        };
        let prompt = prompt.to_lowercase();
        keywords.iter().any(|k| prompt.contains(&k.to_lowercase()))
    }
}

pub fn select_prompts(category: Category, include_tool_tests: bool) -> Vec<&'static str> {
    let mut prompts: Vec<&'static str> = EVALUATION_PROMPTS
        .iter()
        .copied()
        .filter(|p| category.matches(p))
        .collect();
    if include_tool_tests {
        prompts.extend_from_slice(TOOL_SPECIFIC_PROMPTS);
    }
    prompts
}

#[derive(Debug, Clone, PartialEq)]
pub struct Judgement {
    /// Raw rubric score.
    pub score: u8,
    /// Score normalised to `0.0..=1.0`.
    pub value: f64,
    pub reason: String,
}

#[async_trait]
pub trait AnswerJudge: Send + Sync {
    fn name(&self) -> &str;

    async fn judge(&self, input: &str, output: &str) -> Result<Judgement, JudgeError>;
}

#[derive(Debug, Clone)]
pub struct EvaluationResult {
    pub prompt: String,
    pub answer: Option<String>,
    /// Normalised judge score. Failed runs and failed judgements score 0.
    pub score: f64,
    pub reason: String,
    pub steps: usize,
    pub error: Option<String>,
}

/// Runs each prompt through the agent in order and scores the answers.
pub async fn evaluate_agent(
    agent: &FitnessAgent,
    judge: &dyn AnswerJudge,
    prompts: &[&str],
) -> Vec<EvaluationResult> {
    let mut results = Vec::with_capacity(prompts.len());

    for (i, prompt) in prompts.iter().enumerate() {
        tracing::info!(index = i + 1, total = prompts.len(), "Evaluating prompt");

        let report = match agent.run(prompt).await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(error = %e, "Agent run failed");
                results.push(EvaluationResult {
                    prompt: prompt.to_string(),
                    answer: None,
                    score: 0.0,
                    reason: String::new(),
                    steps: 0,
                    error: Some(e.to_string()),
                });
                continue;
            }
        };

        let result = match judge.judge(prompt, &report.answer).await {
            Ok(judgement) => {
                tracing::info!(
                    judge = judge.name(),
                    score = judgement.value,
                    steps = report.steps,
                    "Answer scored"
                );
                EvaluationResult {
                    prompt: prompt.to_string(),
                    answer: Some(report.answer),
                    score: judgement.value,
                    reason: judgement.reason,
                    steps: report.steps,
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!(judge = judge.name(), error = %e, "Judgement failed");
                EvaluationResult {
                    prompt: prompt.to_string(),
                    answer: Some(report.answer),
                    score: 0.0,
                    reason: String::new(),
                    steps: report.steps,
                    error: Some(e.to_string()),
                }
            }
        };
        results.push(result);
    }

    results
}

#[derive(Debug, Clone)]
pub struct EvaluationSummary {
    pub total: usize,
    pub mean: f64,
    pub best: Vec<EvaluationResult>,
    pub worst: Vec<EvaluationResult>,
}

impl EvaluationSummary {
    /// `None` when there is nothing to summarise.
    pub fn from_results(results: &[EvaluationResult]) -> Option<Self> {
        if results.is_empty() {
            return None;
        }

        let mean = results.iter().map(|r| r.score).sum::<f64>() / results.len() as f64;
        let mut sorted = results.to_vec();
        sorted.sort_by(|a, b| b.score.total_cmp(&a.score));

        let best = sorted.iter().take(3).cloned().collect();
        let worst = sorted[sorted.len().saturating_sub(3)..].to_vec();

        Some(Self {
            total: results.len(),
            mean,
            best,
            worst,
        })
    }

    pub fn render(&self) -> String {
        let rule = "=".repeat(50);
        let mut out = format!(
            "{rule}\nEVALUATION SUMMARY\n{rule}\nTotal prompts evaluated: {}\nAverage score: {:.2}\n",
            self.total, self.mean
        );

        out.push_str("\nTop 3 best responses:\n");
        for (i, r) in self.best.iter().enumerate() {
            out.push_str(&summary_line(i + 1, r));
        }
        out.push_str("\nTop 3 worst responses:\n");
        for (i, r) in self.worst.iter().enumerate() {
            out.push_str(&summary_line(i + 1, r));
        }
        out
    }
}

fn summary_line(rank: usize, result: &EvaluationResult) -> String {
    let preview: String = result.prompt.chars().take(50).collect();
    format!("{}. Score: {:.2} - {}...\n", rank, result.score, preview)
}
