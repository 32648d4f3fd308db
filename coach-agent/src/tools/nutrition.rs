use super::{format_number, humanize, required_f64, required_i64, required_str, round_half_even, title_case, today, Tool};
use crate::error::ToolError;
use async_trait::async_trait;
use serde_json::{json, Value};

const NAME: &str = "nutrition_calculator";

const KG_TO_LB: f64 = 2.205;
const CM_PER_INCH: f64 = 2.54;
const LITRES_PER_KG: f64 = 0.033;
const PROTEIN_KCAL_PER_G: f64 = 4.0;
const CARB_KCAL_PER_G: f64 = 4.0;
const FAT_KCAL_PER_G: f64 = 9.0;

/// TDEE multiplier for an activity level; unknown levels count as sedentary.
pub fn activity_multiplier(level: &str) -> f64 {
    match level {
        "lightly_active" => 1.375,
        "moderately_active" => 1.55,
        "very_active" => 1.725,
        "extra_active" => 1.9,
        _ => 1.2,
    }
}

/// Daily calorie adjustment for a goal.
pub fn goal_adjustment(goal: &str) -> f64 {
    match goal {
        "lose_fat" => -500.0,
        "gain_muscle" => 300.0,
        "recomp" => -100.0,
        _ => 0.0,
    }
}

/// Mifflin-St Jeor basal metabolic rate.
pub fn bmr(weight_kg: f64, height_cm: f64, age: i64, gender: &str) -> f64 {
    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * age as f64;
    if gender == "male" {
        base + 5.0
    } else {
        base - 161.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Macro {
    pub grams: i64,
    pub calories: i64,
    pub percentage: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Macros {
    pub protein: Macro,
    pub carbs: Macro,
    pub fat: Macro,
}

/// Protein by body weight, fat by share of calories, carbs make up the rest.
pub fn macros(calories: f64, weight_kg: f64, goal: &str) -> Macros {
    let (protein_per_lb, fat_share) = match goal {
        "lose_fat" => (1.0, 0.25),
        "gain_muscle" => (0.8, 0.25),
        "recomp" => (1.0, 0.30),
        _ => (0.8, 0.30),
    };

    let protein_g = weight_kg * KG_TO_LB * protein_per_lb;
    let protein_cal = protein_g * PROTEIN_KCAL_PER_G;
    let fat_cal = calories * fat_share;
    let fat_g = fat_cal / FAT_KCAL_PER_G;
    let carb_cal = calories - protein_cal - fat_cal;
    let carb_g = carb_cal / CARB_KCAL_PER_G;

    let entry = |grams: f64, kcal: f64| Macro {
        grams: round_half_even(grams),
        calories: round_half_even(kcal),
        percentage: round_half_even(kcal / calories * 100.0),
    };

    Macros {
        protein: entry(protein_g, protein_cal),
        carbs: entry(carb_g, carb_cal),
        fat: entry(fat_g, fat_cal),
    }
}

#[derive(Debug, Clone)]
pub struct NutritionRequest {
    pub age: i64,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub gender: String,
    pub activity_level: String,
    pub goal: String,
}

pub fn render_report(request: &NutritionRequest, date: &str) -> Result<String, ToolError> {
    if !(15..=100).contains(&request.age) {
        return Err(ToolError::InvalidInput(
            "Age must be between 15 and 100 years.".to_string(),
        ));
    }
    if !(30.0..=300.0).contains(&request.weight_kg) {
        return Err(ToolError::InvalidInput(
            "Weight must be between 30 and 300 kg.".to_string(),
        ));
    }
    if !(100.0..=250.0).contains(&request.height_cm) {
        return Err(ToolError::InvalidInput(
            "Height must be between 100 and 250 cm.".to_string(),
        ));
    }

    let gender = request.gender.to_lowercase();
    let activity = request.activity_level.to_lowercase();
    let goal = request.goal.to_lowercase();
    let weight = request.weight_kg;

    let bmr = bmr(weight, request.height_cm, request.age, &gender);
    let tdee = bmr * activity_multiplier(&activity);
    let target = tdee + goal_adjustment(&goal);
    let m = macros(target, weight, &goal);

    Ok(format!(
        "# Personalized Nutrition Plan

## Your Stats
- **Age**: {age} years
- **Weight**: {weight_display} kg ({weight_lbs} lbs)
- **Height**: {height_display} cm ({height_in} inches)
- **Gender**: {gender_title}
- **Activity Level**: {activity_title}
- **Goal**: {goal_title}

## Calorie Calculations
- **BMR (Basal Metabolic Rate)**: {bmr_r} calories/day
- **TDEE (Total Daily Energy Expenditure)**: {tdee_r} calories/day
- **Target Daily Calories**: **{target_r}** calories/day

## Macronutrient Breakdown
### Protein 🥩
- **{protein_g}g** daily ({protein_pct}% of calories)
- {servings} servings of 25g protein portions

### Carbohydrates 🍞
- **{carb_g}g** daily ({carb_pct}% of calories)
- Focus on complex carbs: oats, rice, sweet potatoes, fruits

### Fats 🥑
- **{fat_g}g** daily ({fat_pct}% of calories)
- Include healthy fats: nuts, avocado, olive oil, fatty fish

## Meal Timing Suggestions
- **Protein**: Spread evenly across {meals} meals
- **Pre-workout**: 20-30g carbs, 10-15g protein (1-2 hours before)
- **Post-workout**: 30-40g carbs, 20-30g protein (within 2 hours)
- **Hydration**: Minimum {water} liters of water daily

## Important Notes
- These are estimates based on formulas - individual needs vary
- Track progress and adjust calories by 100-200 if needed
- Weigh yourself weekly at the same time for consistency
- Focus on whole, minimally processed foods
- Consider a multivitamin and omega-3 supplement

⚠️ **Disclaimer**: This is general nutritional guidance. Consult with a registered dietitian for personalized meal planning, especially if you have health conditions or dietary restrictions.

Generated on: {date}
",
        age = request.age,
        weight_display = format_number(weight),
        weight_lbs = round_half_even(weight * KG_TO_LB),
        height_display = format_number(request.height_cm),
        height_in = round_half_even(request.height_cm / CM_PER_INCH),
        gender_title = title_case(&gender),
        activity_title = humanize(&activity),
        goal_title = humanize(&goal),
        bmr_r = round_half_even(bmr),
        tdee_r = round_half_even(tdee),
        target_r = round_half_even(target),
        protein_g = m.protein.grams,
        protein_pct = m.protein.percentage,
        servings = round_half_even(m.protein.grams as f64 / 4.0),
        carb_g = m.carbs.grams,
        carb_pct = m.carbs.percentage,
        fat_g = m.fat.grams,
        fat_pct = m.fat.percentage,
        meals = round_half_even(m.protein.grams as f64 / 30.0),
        water = round_half_even(weight * LITRES_PER_KG),
    ))
}

pub struct NutritionCalculatorTool;

#[async_trait]
impl Tool for NutritionCalculatorTool {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Calculate daily caloric needs and macronutrient splits based on user stats and \
         fitness goals. Provides TDEE (Total Daily Energy Expenditure) and recommended \
         protein, carb, and fat intake."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "age": {"type": "integer", "description": "Age in years"},
                "weight": {"type": "number", "description": "Body weight in kilograms"},
                "height": {"type": "number", "description": "Height in centimeters"},
                "gender": {"type": "string", "description": "Biological gender: 'male' or 'female'"},
                "activity_level": {
                    "type": "string",
                    "description": "Activity level: 'sedentary', 'lightly_active', 'moderately_active', 'very_active', 'extra_active'"
                },
                "goal": {
                    "type": "string",
                    "description": "Fitness goal: 'lose_fat', 'gain_muscle', 'maintain', or 'recomp'"
                }
            },
            "required": ["age", "weight", "height", "gender", "activity_level", "goal"]
        })
    }

    async fn call(&self, args: Value) -> Result<String, ToolError> {
        let request = NutritionRequest {
            age: required_i64(NAME, &args, "age")?,
            weight_kg: required_f64(NAME, &args, "weight")?,
            height_cm: required_f64(NAME, &args, "height")?,
            gender: required_str(NAME, &args, "gender")?.to_string(),
            activity_level: required_str(NAME, &args, "activity_level")?.to_string(),
            goal: required_str(NAME, &args, "goal")?.to_string(),
        };
        tracing::debug!(?request, "Calculating nutrition");
        render_report(&request, &today())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> NutritionRequest {
        NutritionRequest {
            age: 30,
            weight_kg: 80.0,
            height_cm: 180.0,
            gender: "Male".into(),
            activity_level: "moderately_active".into(),
            goal: "lose_fat".into(),
        }
    }

    #[test]
    fn bmr_uses_mifflin_st_jeor() {
        assert_eq!(bmr(80.0, 180.0, 30, "male"), 1780.0);
        assert_eq!(bmr(65.0, 165.0, 30, "female"), 1370.25);
        assert_eq!(bmr(65.0, 165.0, 30, "other"), 1370.25);
    }

    #[test]
    fn unknown_levels_fall_back() {
        assert_eq!(activity_multiplier("couch"), 1.2);
        assert_eq!(goal_adjustment("bulk"), 0.0);
    }

    #[test]
    fn fat_loss_macros() {
        let m = macros(2259.0, 80.0, "lose_fat");
        assert_eq!(m.protein, Macro { grams: 176, calories: 706, percentage: 31 });
        assert_eq!(m.fat, Macro { grams: 63, calories: 565, percentage: 25 });
        assert_eq!(m.carbs, Macro { grams: 247, calories: 989, percentage: 44 });
    }

    #[test]
    fn report_for_moderately_active_male() {
        let report = render_report(&request(), "2025-01-01").unwrap();
        assert!(report.contains("- **Weight**: 80 kg (176 lbs)"));
        assert!(report.contains("- **Height**: 180 cm (71 inches)"));
        assert!(report.contains("- **Gender**: Male"));
        assert!(report.contains("- **Activity Level**: Moderately Active"));
        assert!(report.contains("- **Goal**: Lose Fat"));
        assert!(report.contains("**BMR (Basal Metabolic Rate)**: 1780 calories/day"));
        assert!(report.contains("**TDEE (Total Daily Energy Expenditure)**: 2759 calories/day"));
        assert!(report.contains("**Target Daily Calories**: **2259** calories/day"));
        assert!(report.contains("- **176g** daily (31% of calories)"));
        assert!(report.contains("- 44 servings of 25g protein portions"));
        assert!(report.contains("Spread evenly across 6 meals"));
        assert!(report.contains("Minimum 3 liters of water daily"));
        assert!(report.ends_with("Generated on: 2025-01-01\n"));
    }

    #[test]
    fn out_of_range_inputs_are_rejected() {
        let mut r = request();
        r.age = 14;
        assert_eq!(
            render_report(&r, "d").unwrap_err().to_string(),
            "Age must be between 15 and 100 years."
        );

        let mut r = request();
        r.weight_kg = 301.0;
        assert!(render_report(&r, "d").unwrap_err().to_string().starts_with("Weight"));

        let mut r = request();
        r.height_cm = 99.5;
        assert!(render_report(&r, "d").unwrap_err().to_string().starts_with("Height"));
    }
}
