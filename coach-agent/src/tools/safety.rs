use super::{humanize, optional_str, required_str, title_case, today, Tool};
use crate::error::ToolError;
use async_trait::async_trait;
use serde_json::{json, Value};

const NAME: &str = "exercise_safety_validator";

struct Modification {
    condition: &'static str,
    advice: &'static str,
}

struct ExerciseRisk {
    exercise: &'static str,
    risks: &'static [&'static str],
    contraindications: &'static [&'static str],
    high_risk_for: &'static [&'static str],
    modifications: &'static [Modification],
}

const EXERCISE_RISKS: &[ExerciseRisk] = &[
    ExerciseRisk {
        exercise: "deadlift",
        risks: &["lower back strain", "hamstring injury", "bicep tear"],
        contraindications: &["acute_back_pain", "herniated_disc", "severe_scoliosis"],
        high_risk_for: &["lower_back_pain", "back_injury", "beginner"],
        modifications: &[
            Modification {
                condition: "lower_back_pain",
                advice: "Try trap bar deadlifts or Romanian deadlifts with lighter weight",
            },
            Modification {
                condition: "beginner",
                advice: "Start with Romanian deadlifts or rack pulls to learn the movement",
            },
            Modification {
                condition: "knee_issues",
                advice: "Use sumo stance for better knee angle",
            },
        ],
    },
    ExerciseRisk {
        exercise: "squats",
        risks: &["knee strain", "lower back compression", "hip impingement"],
        contraindications: &["acute_knee_injury", "severe_hip_issues"],
        high_risk_for: &["knee_issues", "hip_issues", "ankle_mobility", "beginner"],
        modifications: &[
            Modification {
                condition: "knee_issues",
                advice: "Try box squats, goblet squats, or leg press instead",
            },
            Modification {
                condition: "hip_issues",
                advice: "Use wider stance or switch to split squats",
            },
            Modification {
                condition: "ankle_mobility",
                advice: "Use heel elevation or work on mobility first",
            },
            Modification {
                condition: "beginner",
                advice: "Start with goblet squats or bodyweight squats",
            },
        ],
    },
    ExerciseRisk {
        exercise: "bench_press",
        risks: &["shoulder impingement", "rotator cuff injury", "elbow strain"],
        contraindications: &["acute_shoulder_injury", "torn_rotator_cuff"],
        high_risk_for: &["shoulder_issues", "elbow_issues", "beginner"],
        modifications: &[
            Modification {
                condition: "shoulder_issues",
                advice: "Use dumbbells with neutral grip or decline angle",
            },
            Modification {
                condition: "elbow_issues",
                advice: "Reduce range of motion or use lighter weight",
            },
            Modification {
                condition: "beginner",
                advice: "Start with dumbbells for better control",
            },
        ],
    },
    ExerciseRisk {
        exercise: "overhead_press",
        risks: &["shoulder impingement", "lower back hyperextension"],
        contraindications: &["shoulder_impingement", "acute_shoulder_injury"],
        high_risk_for: &["shoulder_issues", "lower_back_pain", "neck_issues"],
        modifications: &[
            Modification {
                condition: "shoulder_issues",
                advice: "Use landmine press or Arnold press variation",
            },
            Modification {
                condition: "lower_back_pain",
                advice: "Perform seated with back support",
            },
            Modification {
                condition: "neck_issues",
                advice: "Use dumbbells and avoid behind-the-neck variation",
            },
        ],
    },
    ExerciseRisk {
        exercise: "pull_ups",
        risks: &["shoulder strain", "elbow tendonitis", "grip fatigue"],
        contraindications: &["acute_shoulder_injury", "severe_elbow_issues"],
        high_risk_for: &["shoulder_issues", "elbow_issues", "overweight", "beginner"],
        modifications: &[
            Modification {
                condition: "beginner",
                advice: "Use assisted pull-up machine or resistance bands",
            },
            Modification {
                condition: "overweight",
                advice: "Start with lat pulldowns until strength improves",
            },
            Modification {
                condition: "shoulder_issues",
                advice: "Use neutral grip or wider grip",
            },
        ],
    },
];

struct Guideline {
    condition: &'static str,
    tips: &'static [&'static str],
}

const SAFETY_GUIDELINES: &[Guideline] = &[
    Guideline {
        condition: "beginner",
        tips: &[
            "Always start with bodyweight or light weights",
            "Focus on form over weight",
            "Consider working with a trainer initially",
            "Progress gradually (10% increase per week maximum)",
        ],
    },
    Guideline {
        condition: "lower_back_pain",
        tips: &[
            "Avoid heavy axial loading",
            "Strengthen core before heavy compounds",
            "Maintain neutral spine at all times",
            "Consider using a belt for support on heavy lifts",
        ],
    },
    Guideline {
        condition: "knee_issues",
        tips: &[
            "Avoid deep knee flexion initially",
            "Focus on proper knee tracking",
            "Strengthen supporting muscles (quads, hamstrings, glutes)",
            "Consider knee sleeves for support",
        ],
    },
    Guideline {
        condition: "shoulder_issues",
        tips: &[
            "Warm up thoroughly with band work",
            "Avoid behind-the-neck movements",
            "Focus on scapular stability",
            "Limit overhead work until cleared",
        ],
    },
];

const UNKNOWN_EXERCISE_GUIDANCE: &str = "## Status: ⚠️ Limited Information Available

This exercise is not in our detailed safety database. Here are general safety guidelines:

### General Precautions:
1. **Learn Proper Form**: Work with a qualified trainer or study reputable sources
2. **Start Light**: Begin with minimal weight to master the movement
3. **Warm Up**: Always perform dynamic warm-up before exercising
4. **Listen to Your Body**: Stop if you feel pain (not to be confused with muscle fatigue)
5. **Progress Gradually**: Increase weight/intensity by no more than 10% per week

### Red Flags to Stop Immediately:
- Sharp or shooting pain
- Joint pain (not muscle soreness)
- Dizziness or lightheadedness
- Unusual shortness of breath
- Numbness or tingling

⚠️ **Important**: Always consult with a fitness professional for exercises you're unfamiliar with.
";

const GENERAL_PROTOCOL: &str = "
## General Safety Protocol:
1. **Warm-Up**: 5-10 minutes of light cardio + dynamic stretching
2. **Form Check**: Use mirrors or record yourself
3. **Breathing**: Never hold your breath - exhale on exertion
4. **Spotter**: Use one for heavy lifts when applicable
5. **Recovery**: Allow 48-72 hours between training same muscle groups

## Progressive Loading:
- **Week 1-2**: Master form with bodyweight/empty bar
- **Week 3-4**: Add minimal weight (5-10 lbs)
- **Week 5+**: Increase by 5-10% when you can complete all sets with good form

## When to Stop:
- Any sharp or acute pain
- Feeling of instability or \"giving out\"
- Significant form breakdown
- Dizziness or nausea

⚠️ **Medical Disclaimer**: This is general safety information only. Always consult with healthcare providers about your specific conditions before starting any exercise program. If you have injuries or medical conditions, work with qualified professionals.
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    High,
    Moderate,
    Low,
}

impl RiskLevel {
    pub fn status(&self) -> &'static str {
        match self {
            RiskLevel::High => "❌ NOT RECOMMENDED",
            RiskLevel::Moderate => "⚠️ CAUTION ADVISED",
            RiskLevel::Low => "✅ GENERALLY SAFE",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::High => "HIGH RISK",
            RiskLevel::Moderate => "MODERATE RISK",
            RiskLevel::Low => "LOW RISK",
        }
    }
}

/// Maps common aliases onto the risk database keys.
pub fn normalize_exercise(exercise: &str) -> String {
    let exercise = exercise.trim().to_lowercase();
    let alias = match exercise.as_str() {
        "back squat" | "barbell squat" | "squat" => Some("squats"),
        "conventional deadlift" | "barbell deadlift" => Some("deadlift"),
        "military press" | "shoulder press" | "ohp" => Some("overhead_press"),
        "pullups" | "chin ups" | "chinups" => Some("pull_ups"),
        _ => None,
    };
    alias.map_or_else(|| exercise.replace(' ', "_"), str::to_string)
}

pub fn parse_conditions(conditions: &str) -> Vec<String> {
    conditions
        .split(',')
        .map(|c| c.trim().to_lowercase().replace(' ', "_"))
        .filter(|c| !c.is_empty())
        .collect()
}

pub fn assess(exercise: &str, conditions: &str, date: &str) -> String {
    let normalized = normalize_exercise(exercise);
    let user_conditions = parse_conditions(conditions);
    let title = title_case(exercise);

    let Some(info) = EXERCISE_RISKS.iter().find(|r| r.exercise == normalized) else {
        return format!("# Safety Assessment: {}\n\n{}", title, UNKNOWN_EXERCISE_GUIDANCE);
    };

    let mut contraindications = Vec::new();
    let mut high_risks = Vec::new();
    let mut modifications: Vec<&Modification> = Vec::new();

    for condition in &user_conditions {
        if info.contraindications.contains(&condition.as_str()) {
            contraindications.push(condition.as_str());
        } else if info.high_risk_for.contains(&condition.as_str()) {
            high_risks.push(condition.as_str());
            if let Some(m) = info.modifications.iter().find(|m| m.condition == condition.as_str()) {
                if !modifications.iter().any(|seen| seen.condition == m.condition) {
                    modifications.push(m);
                }
            }
        }
    }

    let level = if !contraindications.is_empty() {
        RiskLevel::High
    } else if !high_risks.is_empty() {
        RiskLevel::Moderate
    } else {
        RiskLevel::Low
    };

    let conditions_display = if user_conditions.is_empty() {
        "None specified".to_string()
    } else {
        user_conditions.join(", ")
    };

    let mut out = format!(
        "# Safety Assessment: {title}\n\n## Status: {status}\n**Safety Level**: {label}\n**Your Conditions**: {conditions_display}\n\n## Risk Analysis\n### General Risks for {title}:\n",
        status = level.status(),
        label = level.label(),
    );
    for risk in info.risks {
        out.push_str(&format!("- {}\n", title_case(risk)));
    }

    match level {
        RiskLevel::High => {
            out.push_str(
                "\n### ❌ CONTRAINDICATIONS FOUND: **This exercise is NOT recommended due to:**\n",
            );
            for c in &contraindications {
                out.push_str(&format!("- {}\n", humanize(c)));
            }
            out.push_str("\n**Recommended Alternatives:**\n");
            out.push_str("- Consult with a physical therapist for safe alternatives\n");
            out.push_str("- Focus on rehabilitation exercises first\n");
            out.push_str("- Consider lower-impact variations\n");
        }
        RiskLevel::Moderate => {
            out.push_str("\n### ⚠️ CAUTION AREAS: **Extra care needed due to:**\n");
            for r in &high_risks {
                out.push_str(&format!("- {}\n", humanize(r)));
            }
            out.push_str("\n### Recommended Modifications:\n");
            for m in &modifications {
                out.push_str(&format!(
                    "**For {}**: {}\n",
                    m.condition.replace('_', " "),
                    m.advice
                ));
            }
        }
        RiskLevel::Low => {}
    }

    out.push_str("\n## Safety Guidelines:\n");
    let mut added: Vec<&str> = Vec::new();
    for condition in &user_conditions {
        if added.contains(&condition.as_str()) {
            continue;
        }
        if let Some(guideline) = SAFETY_GUIDELINES
            .iter()
            .find(|g| g.condition == condition.as_str())
        {
            out.push_str(&format!("\n### For {}:\n", humanize(condition)));
            for tip in guideline.tips {
                out.push_str(&format!("- {}\n", tip));
            }
            added.push(condition.as_str());
        }
    }

    out.push_str(GENERAL_PROTOCOL);
    out.push_str(&format!("\nGenerated on: {}\n", date));
    out
}

pub struct ExerciseSafetyValidatorTool;

#[async_trait]
impl Tool for ExerciseSafetyValidatorTool {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Validate if exercises are safe given user's conditions, experience level, or \
         physical limitations. Provides safety warnings and exercise modifications when needed."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "exercise": {
                    "type": "string",
                    "description": "The exercise name to validate (e.g., 'deadlift', 'bench press', 'squats')"
                },
                "conditions": {
                    "type": ["string", "null"],
                    "description": "User conditions/limitations as comma-separated list (e.g., 'lower_back_pain,beginner,knee_issues')"
                }
            },
            "required": ["exercise"]
        })
    }

    async fn call(&self, args: Value) -> Result<String, ToolError> {
        let exercise = required_str(NAME, &args, "exercise")?;
        let conditions = optional_str(&args, "conditions").unwrap_or_default();
        tracing::debug!(exercise, conditions, "Validating exercise safety");
        Ok(assess(exercise, conditions, &today()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_are_normalized() {
        assert_eq!(normalize_exercise("OHP"), "overhead_press");
        assert_eq!(normalize_exercise(" Chin Ups "), "pull_ups");
        assert_eq!(normalize_exercise("squat"), "squats");
        assert_eq!(normalize_exercise("Bench Press"), "bench_press");
        assert_eq!(normalize_exercise("leg press"), "leg_press");
    }

    #[test]
    fn conditions_are_normalized() {
        assert_eq!(
            parse_conditions(" Lower Back Pain,beginner, "),
            vec!["lower_back_pain".to_string(), "beginner".to_string()]
        );
        assert!(parse_conditions("").is_empty());
    }

    #[test]
    fn contraindication_is_not_recommended() {
        let out = assess("deadlift", "herniated disc, beginner", "2025-01-01");
        assert!(out.contains("## Status: ❌ NOT RECOMMENDED"));
        assert!(out.contains("**Safety Level**: HIGH RISK"));
        assert!(out.contains("**Your Conditions**: herniated_disc, beginner"));
        assert!(out.contains("- Herniated Disc\n"));
        assert!(out.contains("**Recommended Alternatives:**"));
        assert!(!out.contains("Recommended Modifications"));
        assert!(out.contains("### For Beginner:"));
    }

    #[test]
    fn high_risk_condition_gets_modifications() {
        let out = assess("squat", "knee_issues", "2025-01-01");
        assert!(out.starts_with("# Safety Assessment: Squat\n"));
        assert!(out.contains("## Status: ⚠️ CAUTION ADVISED"));
        assert!(out.contains("**Safety Level**: MODERATE RISK"));
        assert!(out.contains("- Knee Strain\n"));
        assert!(out.contains(
            "**For knee issues**: Try box squats, goblet squats, or leg press instead"
        ));
        assert!(out.contains("### For Knee Issues:\n- Avoid deep knee flexion initially"));
        assert!(out.ends_with("Generated on: 2025-01-01\n"));
    }

    #[test]
    fn no_conditions_is_generally_safe() {
        let out = assess("bench press", "", "2025-01-01");
        assert!(out.contains("## Status: ✅ GENERALLY SAFE"));
        assert!(out.contains("**Your Conditions**: None specified"));
        assert!(out.contains("## General Safety Protocol:"));
    }

    #[test]
    fn unlisted_condition_is_low_risk() {
        let out = assess("pull ups", "asthma", "2025-01-01");
        assert!(out.contains("**Safety Level**: LOW RISK"));
        assert!(!out.contains("### For Asthma"));
    }

    #[test]
    fn unknown_exercise_gets_generic_guidance() {
        let out = assess("kettlebell swing", "beginner", "2025-01-01");
        assert!(out.starts_with("# Safety Assessment: Kettlebell Swing\n"));
        assert!(out.contains("Limited Information Available"));
        assert!(!out.contains("Generated on"));
    }

    #[tokio::test]
    async fn conditions_are_optional() {
        let out = ExerciseSafetyValidatorTool
            .call(json!({"exercise": "deadlift", "conditions": null}))
            .await
            .unwrap();
        assert!(out.contains("GENERALLY SAFE"));
    }
}
