use std::sync::Arc;

use colloquy_core::domain::{NO_ANALYSIS_SUMMARY, RETRY_HINT, SYNTHESIS_FAILED_SUMMARY};
use colloquy_core::fakes::{evaluation_answer, Scripted, ScriptedCapability};
use colloquy_core::{Category, Purpose, RubricTable, Workflow, WorkflowConfig};

const TRANSCRIPT: &str = "Speaker 1: Um, so, like, what do you think?\n\
                          Speaker 2: I mean, I guess it's fine, sort of.";

fn fluency_at_0_8() -> Scripted {
    Scripted::Value(evaluation_answer(&[
        ("raw_filler_words", 0.5),
        ("raw_run_ons", 0.0),
        ("raw_wpm", 0.0),
    ]))
}

fn prosody_at_0_6() -> Scripted {
    Scripted::Value(evaluation_answer(&[
        ("raw_pace", 0.4),
        ("raw_pauses", 0.4),
        ("raw_volume_variance", 0.6),
    ]))
}

fn pragmatics_at_1_0() -> Scripted {
    Scripted::Value(evaluation_answer(&[
        ("raw_answered_question", 1.0),
        ("raw_rambling", 0.0),
    ]))
}

fn three_way() -> ScriptedCapability {
    ScriptedCapability::new().route_to(&[
        Category::Fluency,
        Category::Prosody,
        Category::Pragmatics,
    ])
}

fn workflow(cap: Arc<ScriptedCapability>) -> Workflow {
    Workflow::new(cap, RubricTable::standard(), WorkflowConfig::default()).unwrap()
}

#[tokio::test]
async fn all_evaluators_succeed_and_total_is_local_mean() {
    let cap = Arc::new(
        three_way()
            .evaluate(Category::Fluency, fluency_at_0_8())
            .evaluate(Category::Prosody, prosody_at_0_6())
            .evaluate(Category::Pragmatics, pragmatics_at_1_0())
            .summarize("Fluent but hedgy."),
    );
    let result = workflow(cap.clone()).run(TRANSCRIPT).await;

    let scores: Vec<f64> = result.reports.iter().map(|r| r.score).collect();
    assert!((scores[0] - 0.8).abs() < 1e-9);
    assert!((scores[1] - 0.6).abs() < 1e-9);
    assert!((scores[2] - 1.0).abs() < 1e-9);
    assert_eq!(result.total_score, 0.80);
    assert_eq!(result.summary, "Fluent but hedgy.");

    assert_eq!(cap.calls(Purpose::Route), 1);
    assert_eq!(cap.calls(Purpose::Synthesize), 1);
    for category in [Category::Fluency, Category::Prosody, Category::Pragmatics] {
        assert_eq!(cap.calls(Purpose::Evaluate(category)), 1);
    }
}

#[tokio::test]
async fn second_task_failure_leaves_siblings_untouched() {
    let cap = Arc::new(
        three_way()
            .evaluate(Category::Fluency, fluency_at_0_8())
            .evaluate(Category::Prosody, Scripted::Fail("upstream 500".into()))
            .evaluate(Category::Pragmatics, pragmatics_at_1_0())
            .summarize("Partial analysis."),
    );
    let result = workflow(cap).run(TRANSCRIPT).await;

    assert_eq!(result.reports.len(), 3);
    assert!((result.reports[0].score - 0.8).abs() < 1e-9);
    assert_eq!(result.reports[1].category, Category::Prosody);
    assert_eq!(result.reports[1].score, 0.0);
    assert!(result.reports[1]
        .commentary
        .what_went_wrong
        .contains("upstream 500"));
    assert_eq!(result.reports[1].commentary.how_to_improve, RETRY_HINT);
    assert!((result.reports[2].score - 1.0).abs() < 1e-9);
    // (0.8 + 0.0 + 1.0) / 3
    assert_eq!(result.total_score, 0.6);
}

#[tokio::test]
async fn synthesis_failure_zeroes_total() {
    let cap = Arc::new(
        three_way()
            .evaluate(Category::Fluency, fluency_at_0_8())
            .evaluate(Category::Prosody, prosody_at_0_6())
            .evaluate(Category::Pragmatics, pragmatics_at_1_0())
            .on(Purpose::Synthesize, Scripted::Fail("model overloaded".into())),
    );
    let result = workflow(cap).run(TRANSCRIPT).await;

    assert_eq!(result.summary, SYNTHESIS_FAILED_SUMMARY);
    assert_eq!(result.total_score, 0.0);
    assert_eq!(result.reports.len(), 3);
    assert!(result.reports.iter().all(|r| r.score > 0.0));
}

#[tokio::test]
async fn empty_input_is_no_analysis_without_any_call() {
    let cap = Arc::new(three_way().summarize("should not be used"));
    let result = workflow(cap.clone()).run("").await;

    assert!(result.reports.is_empty());
    assert_eq!(result.summary, NO_ANALYSIS_SUMMARY);
    assert_eq!(result.total_score, 0.0);
    assert_eq!(cap.total_calls(), 0);
}

#[tokio::test]
async fn transcription_marker_routes_to_nothing() {
    let cap = Arc::new(
        ScriptedCapability::new()
            .route_to(&[])
            .summarize("should not be used"),
    );
    let result = workflow(cap.clone()).run("transcribing...").await;

    assert!(result.reports.is_empty());
    assert_eq!(result.summary, NO_ANALYSIS_SUMMARY);
    assert_eq!(result.total_score, 0.0);
    assert_eq!(cap.calls(Purpose::Synthesize), 0);
}

#[tokio::test]
async fn unrouteable_answer_yields_no_analysis() {
    let cap = Arc::new(ScriptedCapability::new().on(
        Purpose::Route,
        Scripted::Value(serde_json::json!({ "subagents_to_call": [{ "category": "GRAMMAR" }] })),
    ));
    let result = workflow(cap).run(TRANSCRIPT).await;
    assert_eq!(result.summary, NO_ANALYSIS_SUMMARY);
    assert!(result.reports.is_empty());
}

#[tokio::test]
async fn disabled_category_degrades_without_evaluator_call() {
    let cap = Arc::new(
        ScriptedCapability::new()
            .route_to(&[Category::TimeBalance, Category::Pragmatics])
            .evaluate(Category::TimeBalance, pragmatics_at_1_0())
            .evaluate(Category::Pragmatics, pragmatics_at_1_0())
            .summarize("Answered the question."),
    );
    let config = WorkflowConfig::default().with_enabled_categories(vec![Category::Pragmatics]);
    let result = Workflow::new(cap.clone(), RubricTable::standard(), config)
        .unwrap()
        .run(TRANSCRIPT)
        .await;

    assert_eq!(result.reports[0].category, Category::TimeBalance);
    assert!(result.reports[0].is_placeholder());
    assert_eq!(cap.calls(Purpose::Evaluate(Category::TimeBalance)), 0);
    assert_eq!(result.total_score, 0.5);
}
