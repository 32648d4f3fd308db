mod common;

use coach_agent::{extract_tool_responses, AgentError};
use common::{
    agent_with, answer, empty_reply, raw_tool_call, test_config, tool_call, ScriptedModel,
    RETRIEVER_OUTPUT,
};
use serde_json::json;
use service_core::llm::ChatRole;
use std::sync::Arc;

#[tokio::test]
async fn tool_result_is_fed_back_before_the_answer() {
    let model = Arc::new(ScriptedModel::new(vec![
        tool_call(
            "call_1",
            "nutrition_calculator",
            json!({
                "age": 30,
                "weight": 80,
                "height": 180,
                "gender": "male",
                "activity_level": "moderately_active",
                "goal": "lose_fat"
            }),
        ),
        answer("Aim for about 2259 calories a day."),
    ]));
    let agent = agent_with(model.clone(), &test_config(5));

    let report = agent.run("How many calories should I eat?").await.unwrap();

    assert_eq!(report.answer, "Aim for about 2259 calories a day.");
    assert_eq!(report.steps, 2);
    assert_eq!(report.tool_calls, 1);
    assert_eq!(report.usage.total_tokens, 30);
    assert!(!report.medical_query);

    let calls = model.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(
        calls[0].tool_names,
        vec![
            "what_can_i_do",
            "pinecone_vector_search_retriever",
            "workout_plan_generator",
            "nutrition_calculator",
            "exercise_safety_validator",
        ]
    );

    let second = &calls[1].messages;
    assert_eq!(second.len(), 4);
    assert_eq!(second[0].role, ChatRole::System);
    assert_eq!(second[1].content.as_deref(), Some("How many calories should I eat?"));
    assert_eq!(second[2].role, ChatRole::Assistant);
    assert_eq!(second[2].tool_calls[0].id, "call_1");
    assert_eq!(second[3].role, ChatRole::Tool);
    assert_eq!(second[3].tool_call_id.as_deref(), Some("call_1"));
    assert!(second[3]
        .content
        .as_deref()
        .unwrap()
        .contains("**Target Daily Calories**: **2259** calories/day"));
}

#[tokio::test]
async fn unknown_tool_becomes_an_error_observation() {
    let model = Arc::new(ScriptedModel::new(vec![
        tool_call("call_1", "lift_weights", json!({})),
        answer("Sorry, I can't do that."),
    ]));
    let agent = agent_with(model.clone(), &test_config(5));

    let report = agent.run("Lift for me").await.unwrap();

    assert_eq!(
        extract_tool_responses(&report.messages),
        "-------- OBSERVATION 1 --------\nError: Unknown tool: lift_weights"
    );
    assert_eq!(report.answer, "Sorry, I can't do that.");
}

#[tokio::test]
async fn malformed_arguments_become_an_error_observation() {
    let model = Arc::new(ScriptedModel::new(vec![
        raw_tool_call("call_1", "what_can_i_do", "not json"),
        answer("Here is what I can do."),
    ]));
    let agent = agent_with(model, &test_config(5));

    let report = agent.run("What can you do?").await.unwrap();
    let observation = report.tool_responses();

    assert!(observation.contains("Error: Invalid arguments for what_can_i_do"));
}

#[tokio::test]
async fn out_of_range_input_is_reported_verbatim() {
    let model = Arc::new(ScriptedModel::new(vec![
        tool_call(
            "call_1",
            "workout_plan_generator",
            json!({
                "goals": "build_muscle",
                "experience": "beginner",
                "equipment": "full_gym",
                "days_per_week": 7
            }),
        ),
        answer("Please pick between 2 and 6 days."),
    ]));
    let agent = agent_with(model, &test_config(5));

    let report = agent.run("Plan 7 days of training").await.unwrap();

    assert!(report
        .tool_responses()
        .ends_with("Error: Training days must be between 2 and 6 per week."));
}

#[tokio::test]
async fn observations_accumulate_across_steps() {
    let model = Arc::new(ScriptedModel::new(vec![
        tool_call("call_1", "pinecone_vector_search_retriever", json!({"query": "{\"query\": \"squat form\"}"})),
        tool_call(
            "call_2",
            "exercise_safety_validator",
            json!({"exercise": "squats", "conditions": "knee_issues"}),
        ),
        answer("Squat to a box and keep your knees tracking over your toes."),
    ]));
    let agent = agent_with(model.clone(), &test_config(5));

    let report = agent.run("Are squats OK with bad knees?").await.unwrap();

    assert_eq!(report.steps, 3);
    assert_eq!(report.tool_calls, 2);
    let responses = report.tool_responses();
    assert!(responses.starts_with(&format!("-------- OBSERVATION 1 --------\n{}", RETRIEVER_OUTPUT)));
    assert!(responses.contains("\n-------- OBSERVATION 2 --------\n"));
    assert!(responses.contains("CAUTION ADVISED"));
    assert_eq!(model.calls()[2].messages.len(), 6);
}

#[tokio::test]
async fn exhausted_steps_force_a_final_answer_without_tools() {
    let model = Arc::new(ScriptedModel::new(vec![
        tool_call("call_1", "what_can_i_do", json!({"question": "help"})),
        tool_call("call_2", "what_can_i_do", json!({"question": "help"})),
        answer("I can plan workouts and calculate nutrition."),
    ]));
    let agent = agent_with(model.clone(), &test_config(2));

    let report = agent.run("What can you do?").await.unwrap();

    assert_eq!(report.answer, "I can plan workouts and calculate nutrition.");
    assert_eq!(report.steps, 3);
    assert_eq!(report.tool_calls, 2);

    let calls = model.calls();
    assert_eq!(calls.len(), 3);
    assert!(!calls[1].tool_names.is_empty());
    assert!(calls[2].tool_names.is_empty());
    let last = calls[2].messages.last().unwrap();
    assert_eq!(last.role, ChatRole::User);
    assert!(last.content.as_deref().unwrap().contains("final answer"));
}

#[tokio::test]
async fn empty_final_answer_is_an_error() {
    let model = Arc::new(ScriptedModel::new(vec![
        tool_call("call_1", "what_can_i_do", json!({})),
        empty_reply(),
    ]));
    let agent = agent_with(model, &test_config(1));

    let err = agent.run("Hello").await.unwrap_err();
    assert!(matches!(err, AgentError::NoAnswer));
}

#[tokio::test]
async fn blank_reply_uses_a_step_without_answering() {
    let model = Arc::new(ScriptedModel::new(vec![
        empty_reply(),
        answer("Start with three full-body sessions a week."),
    ]));
    let agent = agent_with(model, &test_config(3));

    let report = agent.run("How should I start?").await.unwrap();
    assert_eq!(report.steps, 2);
    assert_eq!(report.tool_calls, 0);
}

#[tokio::test]
async fn provider_failures_propagate() {
    let model = Arc::new(ScriptedModel::new(Vec::new()));
    let agent = agent_with(model, &test_config(3));

    let err = agent.run("Hello").await.unwrap_err();
    assert!(matches!(err, AgentError::Model(_)));
}

#[tokio::test]
async fn medical_queries_are_flagged_when_detection_is_enabled() {
    let model = Arc::new(ScriptedModel::new(vec![answer("Please see a doctor.")]));
    let agent = agent_with(model, &test_config(3));
    assert!(agent.is_medical_query("Can you Diagnose my knee?"));

    let report = agent.run("Which medication helps sore muscles?").await.unwrap();
    assert!(report.medical_query);

    let mut config = test_config(3);
    config.safety.enable_medical_detection = false;
    let model = Arc::new(ScriptedModel::new(Vec::new()));
    assert!(!agent_with(model, &config).is_medical_query("Can you diagnose my knee?"));
}

#[test]
fn disabled_tools_are_not_offered() {
    let mut config = test_config(3);
    config.tools.workout_generator = false;
    config.tools.safety_validator = false;
    let agent = agent_with(Arc::new(ScriptedModel::new(Vec::new())), &config);

    assert_eq!(
        agent.tool_names(),
        vec!["what_can_i_do", "pinecone_vector_search_retriever", "nutrition_calculator"]
    );
    assert!(agent.system_prompt().contains("- nutrition_calculator:"));
    assert!(!agent.system_prompt().contains("- exercise_safety_validator:"));
}
