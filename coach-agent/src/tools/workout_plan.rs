use super::{humanize, required_i64, required_str, title_case, today, Tool};
use crate::error::ToolError;
use async_trait::async_trait;
use serde_json::{json, Value};

const NAME: &str = "workout_plan_generator";

const MAX_EXERCISES_PER_DAY: usize = 6;

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepScheme {
    pub sets: &'static str,
    pub reps: &'static str,
    pub rest: &'static str,
}

const fn scheme(sets: &'static str, reps: &'static str, rest: &'static str) -> RepScheme {
    RepScheme { sets, reps, rest }
}

struct DayTemplate {
    day: &'static str,
    exercises: &'static [&'static str],
}

struct EquipmentTemplates {
    equipment: &'static str,
    days: &'static [DayTemplate],
}

const BEGINNER: &[EquipmentTemplates] = &[
    EquipmentTemplates {
        equipment: "full_gym",
        days: &[
            DayTemplate {
                day: "upper",
                exercises: &["Bench Press", "Lat Pulldown", "Shoulder Press", "Seated Row", "Bicep Curls", "Tricep Pushdowns"],
            },
            DayTemplate {
                day: "lower",
                exercises: &["Squats", "Leg Press", "Leg Curls", "Leg Extensions", "Calf Raises", "Planks"],
            },
            DayTemplate {
                day: "full_body",
                exercises: &["Squats", "Bench Press", "Bent-Over Row", "Shoulder Press", "Deadlifts", "Planks"],
            },
        ],
    },
    EquipmentTemplates {
        equipment: "home_basic",
        days: &[
            DayTemplate {
                day: "upper",
                exercises: &["Dumbbell Press", "Dumbbell Rows", "Shoulder Press", "Bicep Curls", "Tricep Extensions", "Band Pull-Aparts"],
            },
            DayTemplate {
                day: "lower",
                exercises: &["Goblet Squats", "Lunges", "Romanian Deadlifts", "Calf Raises", "Glute Bridges", "Planks"],
            },
            DayTemplate {
                day: "full_body",
                exercises: &["Goblet Squats", "Dumbbell Press", "Dumbbell Rows", "Lunges", "Shoulder Press", "Planks"],
            },
        ],
    },
    EquipmentTemplates {
        equipment: "bodyweight_only",
        days: &[
            DayTemplate {
                day: "upper",
                exercises: &["Push-ups", "Pull-ups/Inverted Rows", "Pike Push-ups", "Dips", "Diamond Push-ups", "Planks"],
            },
            DayTemplate {
                day: "lower",
                exercises: &["Bodyweight Squats", "Lunges", "Jump Squats", "Single-Leg Deadlifts", "Calf Raises", "Wall Sits"],
            },
            DayTemplate {
                day: "full_body",
                exercises: &["Burpees", "Push-ups", "Squats", "Mountain Climbers", "Lunges", "Planks"],
            },
        ],
    },
];

const INTERMEDIATE: &[EquipmentTemplates] = &[EquipmentTemplates {
    equipment: "full_gym",
    days: &[
        DayTemplate {
            day: "push",
            exercises: &["Bench Press", "Incline Dumbbell Press", "Shoulder Press", "Lateral Raises", "Tricep Dips", "Cable Flyes"],
        },
        DayTemplate {
            day: "pull",
            exercises: &["Deadlifts", "Pull-ups", "Barbell Rows", "Face Pulls", "Bicep Curls", "Shrugs"],
        },
        DayTemplate {
            day: "legs",
            exercises: &["Squats", "Romanian Deadlifts", "Leg Press", "Walking Lunges", "Leg Curls", "Calf Raises"],
        },
        DayTemplate {
            day: "upper",
            exercises: &["Bench Press", "Bent-Over Row", "Overhead Press", "Pull-ups", "Dumbbell Curls", "Skullcrushers"],
        },
        DayTemplate {
            day: "lower",
            exercises: &["Front Squats", "Deadlifts", "Bulgarian Split Squats", "Leg Curls", "Leg Extensions", "Calf Raises"],
        },
    ],
}];

const ADVANCED: &[EquipmentTemplates] = &[EquipmentTemplates {
    equipment: "full_gym",
    days: &[
        DayTemplate {
            day: "push",
            exercises: &["Bench Press", "Incline Barbell Press", "Dumbbell Press", "Military Press", "Dips", "Cable Crossovers", "Tricep Extensions"],
        },
        DayTemplate {
            day: "pull",
            exercises: &["Deadlifts", "Weighted Pull-ups", "T-Bar Rows", "Cable Rows", "Barbell Curls", "Hammer Curls", "Face Pulls"],
        },
        DayTemplate {
            day: "legs",
            exercises: &["Back Squats", "Front Squats", "Romanian Deadlifts", "Walking Lunges", "Leg Press", "Leg Curls", "Calf Raises"],
        },
    ],
}];

/// Sets, reps and rest by goal and experience. Unknown goals use
/// `general_fitness`; unknown experience levels use general fitness for
/// beginners.
pub fn rep_scheme(goal: &str, experience: &str) -> RepScheme {
    let general_beginner = scheme("3", "10-12", "60 seconds");
    let level = match experience {
        "beginner" => 0,
        "intermediate" => 1,
        "advanced" => 2,
        _ => return general_beginner,
    };

    let table: [RepScheme; 3] = match goal {
        "muscle_gain" => [
            scheme("3", "8-12", "60-90 seconds"),
            scheme("4", "8-12", "60-90 seconds"),
            scheme("4-5", "6-12", "90-120 seconds"),
        ],
        "strength" => [
            scheme("3", "5-8", "2-3 minutes"),
            scheme("4-5", "3-6", "3-4 minutes"),
            scheme("5-6", "1-5", "3-5 minutes"),
        ],
        "fat_loss" => [
            scheme("3", "12-15", "30-45 seconds"),
            scheme("3-4", "12-20", "30-45 seconds"),
            scheme("4", "15-20", "30 seconds"),
        ],
        "endurance" => [
            scheme("2-3", "15-20", "30 seconds"),
            scheme("3", "15-25", "30 seconds"),
            scheme("3-4", "20-30", "15-30 seconds"),
        ],
        _ => [
            general_beginner,
            scheme("3-4", "10-15", "45-60 seconds"),
            scheme("4", "8-15", "45-60 seconds"),
        ],
    };
    table[level]
}

/// Day types for a training frequency. `days_per_week` is already validated.
pub fn split_for(days_per_week: i64, experience: &str) -> &'static [&'static str] {
    match days_per_week {
        2 => &["full_body", "full_body"],
        4 => &["upper", "lower", "upper", "lower"],
        5 => &["push", "pull", "legs", "upper", "lower"],
        6 => &["push", "pull", "legs", "push", "pull", "legs"],
        _ if experience == "beginner" => &["full_body", "full_body", "full_body"],
        _ => &["push", "pull", "legs"],
    }
}

/// Exercise list for a day. Falls back from the requested equipment to
/// `full_gym`, and from the requested day type to `full_body`; either
/// fallback may come up empty.
fn exercises_for(experience: &str, equipment: &str, day: &str) -> &'static [&'static str] {
    let templates = match experience {
        "intermediate" => INTERMEDIATE,
        "advanced" => ADVANCED,
        _ => BEGINNER,
    };

    let find_equipment = |name: &str| templates.iter().find(|t| t.equipment == name);
    let Some(equipment) = find_equipment(equipment).or_else(|| find_equipment("full_gym")) else {
        return &[];
    };

    let find_day = |name: &str| equipment.days.iter().find(|d| d.day == name);
    find_day(day)
        .or_else(|| find_day("full_body"))
        .map(|d| d.exercises)
        .unwrap_or(&[])
}

#[derive(Debug, Clone)]
pub struct WorkoutRequest {
    pub goals: String,
    pub experience: String,
    pub equipment: String,
    pub days_per_week: i64,
}

/// Renders the weekly plan as Markdown.
pub fn render_plan(request: &WorkoutRequest, date: &str) -> Result<String, ToolError> {
    if !(2..=6).contains(&request.days_per_week) {
        return Err(ToolError::InvalidInput(
            "Training days must be between 2 and 6 per week.".to_string(),
        ));
    }

    let goals = request.goals.to_lowercase();
    let experience = request.experience.to_lowercase();
    let equipment = request.equipment.to_lowercase();
    let days = request.days_per_week;

    let split = split_for(days, &experience);
    let reps = rep_scheme(&goals, &experience);

    let mut plan = format!(
        "# Personalized Workout Plan

## Overview
- **Goal**: {goal}
- **Experience**: {experience_title}
- **Equipment**: {equipment_title}
- **Frequency**: {days} days per week
- **Split**: {split_title}

## Training Parameters
- **Sets**: {sets} per exercise
- **Reps**: {reps_range}
- **Rest**: {rest}

## Weekly Schedule
",
        goal = humanize(&goals),
        experience_title = title_case(&experience),
        equipment_title = humanize(&equipment),
        split_title = humanize(&split.join(", ")),
        sets = reps.sets,
        reps_range = reps.reps,
        rest = reps.rest,
    );

    let mut schedule = Vec::new();
    for (i, day_type) in split.iter().enumerate() {
        let day = WEEKDAYS
            .get(i)
            .map_or_else(|| format!("Day {}", i + 1), |d| d.to_string());
        schedule.push(format!("\n### {}: {}", day, humanize(day_type)));

        let exercises = exercises_for(&experience, &equipment, day_type);
        for (j, exercise) in exercises.iter().take(MAX_EXERCISES_PER_DAY).enumerate() {
            schedule.push(format!(
                "{}. **{}** - {} sets x {} reps",
                j + 1,
                exercise,
                reps.sets,
                reps.reps
            ));
        }
    }
    plan.push_str(&schedule.join("\n"));

    plan.push_str(&format!(
        "

## Important Notes
- **Warm-up**: Always start with 5-10 minutes of light cardio and dynamic stretching
- **Cool-down**: End with 5-10 minutes of stretching
- **Progressive Overload**: Increase weight/reps/sets gradually each week
- **Form First**: Focus on proper form before increasing weight
- **Rest Days**: Take at least {rest_days} rest days per week
- **Nutrition**: Ensure adequate protein intake (0.7-1g per lb of body weight)
- **Hydration**: Drink plenty of water before, during, and after workouts

⚠️ **Disclaimer**: This is a general workout plan. Consult with a certified personal trainer for personalized guidance, especially if you have any injuries or health conditions.

Generated on: {date}
",
        rest_days = 7 - days,
    ));

    Ok(plan)
}

pub struct WorkoutPlanGeneratorTool;

#[async_trait]
impl Tool for WorkoutPlanGeneratorTool {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Generate personalized workout plans based on user goals, experience level, and \
         available equipment. Creates structured workout routines with exercises, sets, \
         reps, and rest periods."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "goals": {
                    "type": "string",
                    "description": "User's fitness goals: 'muscle_gain', 'fat_loss', 'strength', 'endurance', or 'general_fitness'"
                },
                "experience": {
                    "type": "string",
                    "description": "Experience level: 'beginner', 'intermediate', or 'advanced'"
                },
                "equipment": {
                    "type": "string",
                    "description": "Available equipment: 'full_gym', 'home_basic' (dumbbells/bands), or 'bodyweight_only'"
                },
                "days_per_week": {
                    "type": "integer",
                    "description": "Number of training days per week (2-6)"
                }
            },
            "required": ["goals", "experience", "equipment", "days_per_week"]
        })
    }

    async fn call(&self, args: Value) -> Result<String, ToolError> {
        let request = WorkoutRequest {
            goals: required_str(NAME, &args, "goals")?.to_string(),
            experience: required_str(NAME, &args, "experience")?.to_string(),
            equipment: required_str(NAME, &args, "equipment")?.to_string(),
            days_per_week: required_i64(NAME, &args, "days_per_week")?,
        };
        tracing::debug!(?request, "Generating workout plan");
        render_plan(&request, &today())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(goals: &str, experience: &str, equipment: &str, days: i64) -> WorkoutRequest {
        WorkoutRequest {
            goals: goals.into(),
            experience: experience.into(),
            equipment: equipment.into(),
            days_per_week: days,
        }
    }

    #[test]
    fn rejects_out_of_range_frequency() {
        for days in [1, 7] {
            let err = render_plan(&request("strength", "beginner", "full_gym", days), "2025-01-01")
                .unwrap_err();
            assert_eq!(err.to_string(), "Training days must be between 2 and 6 per week.");
        }
    }

    #[test]
    fn beginner_three_days_is_full_body() {
        let plan = render_plan(
            &request("Muscle_Gain", "BEGINNER", "home_basic", 3),
            "2025-01-01",
        )
        .unwrap();

        assert!(plan.contains("- **Goal**: Muscle Gain"));
        assert!(plan.contains("- **Split**: Full Body, Full Body, Full Body"));
        assert!(plan.contains("- **Sets**: 3 per exercise"));
        assert!(plan.contains("### Monday: Full Body"));
        assert!(plan.contains("### Wednesday: Full Body"));
        assert!(!plan.contains("### Thursday"));
        assert!(plan.contains("1. **Goblet Squats** - 3 sets x 8-12 reps"));
        assert!(plan.contains("Take at least 4 rest days per week"));
        assert!(plan.ends_with("Generated on: 2025-01-01\n"));
    }

    #[test]
    fn intermediate_three_days_is_push_pull_legs() {
        let plan = render_plan(
            &request("strength", "intermediate", "full_gym", 3),
            "2025-01-01",
        )
        .unwrap();
        assert!(plan.contains("### Monday: Push"));
        assert!(plan.contains("### Tuesday: Pull"));
        assert!(plan.contains("### Wednesday: Legs"));
        assert!(plan.contains("- **Rest**: 3-4 minutes"));
    }

    #[test]
    fn advanced_days_are_capped_at_six_exercises() {
        let plan = render_plan(
            &request("muscle_gain", "advanced", "full_gym", 6),
            "2025-01-01",
        )
        .unwrap();
        assert!(plan.contains("6. **Cable Crossovers**"));
        assert!(!plan.contains("Tricep Extensions"));
        assert!(plan.contains("### Saturday: Legs"));
    }

    #[test]
    fn advanced_upper_lower_has_no_template() {
        assert!(exercises_for("advanced", "full_gym", "upper").is_empty());
        assert_eq!(exercises_for("intermediate", "home_basic", "push")[0], "Bench Press");
        assert_eq!(exercises_for("expert", "bodyweight_only", "upper")[0], "Push-ups");
        assert_eq!(exercises_for("beginner", "full_gym", "push")[0], "Squats");
    }

    #[test]
    fn rep_scheme_fallbacks() {
        assert_eq!(rep_scheme("yoga", "advanced"), scheme("4", "8-15", "45-60 seconds"));
        assert_eq!(rep_scheme("strength", "expert"), scheme("3", "10-12", "60 seconds"));
        assert_eq!(rep_scheme("endurance", "advanced").rest, "15-30 seconds");
    }

    #[tokio::test]
    async fn tool_reads_json_arguments() {
        let out = WorkoutPlanGeneratorTool
            .call(json!({
                "goals": "fat_loss",
                "experience": "beginner",
                "equipment": "bodyweight_only",
                "days_per_week": "2"
            }))
            .await
            .unwrap();
        assert!(out.contains("1. **Burpees** - 3 sets x 12-15 reps"));

        let err = WorkoutPlanGeneratorTool
            .call(json!({"goals": "fat_loss"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }
}
