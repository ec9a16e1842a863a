mod helpers;

use std::sync::Arc;
use std::time::Duration;

use interlocutor::application::ports::RetrievedContext;
use interlocutor::application::services::generators::{
    FollowUpGenerator, QuestionGenerator, answer_excerpt, fallback_follow_up, render_template,
};
use interlocutor::domain::{CatalogId, Session, StageDefinition};

use helpers::{GENERATION_TIMEOUT, ScriptedLlm, SlowLlm, new_session_attrs};

fn session() -> Session {
    Session::new(
        new_session_attrs("Computer Science", "Backend Engineer"),
        CatalogId::Standard,
    )
}

fn skill_stage() -> StageDefinition {
    StageDefinition::generated(
        "skill",
        3,
        "{target_role} skills",
        "Ask about the strongest skill for {target_role}.",
    )
    .with_category("technical")
}

fn skill_followup() -> StageDefinition {
    StageDefinition::follow_up("skill_followup", 4, "skill", "Dig deeper.")
}

#[test]
fn given_known_slots_when_rendering_then_fills_them() {
    let vars = vec![
        ("candidate_name", "Dana".to_string()),
        ("target_role", "Backend Engineer".to_string()),
    ];

    assert_eq!(
        render_template("Hello {candidate_name}, welcome to the {target_role} interview.", &vars),
        "Hello Dana, welcome to the Backend Engineer interview."
    );
}

#[test]
fn given_unknown_slot_when_rendering_then_keeps_it_verbatim() {
    let vars = vec![("candidate_name", "Dana".to_string())];

    assert_eq!(
        render_template("Hi {candidate_name} from {team_name}", &vars),
        "Hi Dana from {team_name}"
    );
}

#[test]
fn given_long_answer_when_excerpting_then_keeps_first_sentence_up_to_twelve_words() {
    let answer = "I rebuilt the billing pipeline in Rust over six months with two other \
                  engineers on the team. Then I moved on.";

    assert_eq!(
        answer_excerpt(answer).as_deref(),
        Some("I rebuilt the billing pipeline in Rust over six months with two")
    );
}

#[test]
fn given_short_answer_when_excerpting_then_keeps_it_whole() {
    assert_eq!(
        answer_excerpt("  Mostly Kafka!  And some Redis.").as_deref(),
        Some("Mostly Kafka")
    );
}

#[test]
fn given_blank_answer_when_excerpting_then_returns_none() {
    assert_eq!(answer_excerpt("   \n "), None);
}

#[test]
fn given_blank_answer_when_building_fallback_follow_up_then_asks_for_example() {
    let text = fallback_follow_up("");

    assert!(text.contains("concrete example"));
    assert!(!text.contains("You mentioned"));
}

#[tokio::test]
async fn given_model_reply_when_generating_question_then_uses_it() {
    let llm = Arc::new(ScriptedLlm::new("unused"));
    llm.push_reply("Which Rust crates do you reach for first?");
    let generator = QuestionGenerator::new(llm.clone(), GENERATION_TIMEOUT);

    let generated = generator.generate(&session(), &skill_stage(), &[]).await;

    assert_eq!(generated.text, "Which Rust crates do you reach for first?");
    assert!(!generated.used_fallback);
}

#[tokio::test]
async fn given_labelled_quoted_reply_when_generating_question_then_strips_label_and_quotes() {
    let llm = Arc::new(ScriptedLlm::new("unused"));
    llm.push_reply("Question:   \"How do you   profile a slow endpoint?\"");
    let generator = QuestionGenerator::new(llm, GENERATION_TIMEOUT);

    let generated = generator.generate(&session(), &skill_stage(), &[]).await;

    assert_eq!(generated.text, "How do you profile a slow endpoint?");
}

#[tokio::test]
async fn given_llm_failure_when_generating_question_then_falls_back_on_topic() {
    let llm = Arc::new(ScriptedLlm::new("unused"));
    llm.push_failure();
    let generator = QuestionGenerator::new(llm, GENERATION_TIMEOUT);

    let generated = generator.generate(&session(), &skill_stage(), &[]).await;

    assert!(generated.used_fallback);
    assert!(generated.text.contains("Backend Engineer"));
}

#[tokio::test]
async fn given_empty_reply_when_generating_question_then_falls_back() {
    let llm = Arc::new(ScriptedLlm::new("unused"));
    llm.push_reply("   ");
    let generator = QuestionGenerator::new(llm, GENERATION_TIMEOUT);

    let generated = generator.generate(&session(), &skill_stage(), &[]).await;

    assert!(generated.used_fallback);
}

#[tokio::test(start_paused = true)]
async fn given_slow_llm_when_generating_question_then_times_out_to_fallback() {
    let generator = QuestionGenerator::new(
        Arc::new(SlowLlm(Duration::from_secs(30))),
        Duration::from_secs(1),
    );

    let generated = generator.generate(&session(), &skill_stage(), &[]).await;

    assert!(generated.used_fallback);
}

#[tokio::test]
async fn given_context_when_generating_question_then_prompt_carries_excerpts_and_guide() {
    let llm = Arc::new(ScriptedLlm::new("What did you own on the ledger service?"));
    let generator = QuestionGenerator::new(llm.clone(), GENERATION_TIMEOUT);
    let context = vec![RetrievedContext {
        text: "Led the ledger service migration".to_string(),
        category: Some("experience".to_string()),
    }];

    generator.generate(&session(), &skill_stage(), &context).await;

    let prompt = &llm.prompts()[0];
    assert!(prompt.system.contains("- [experience] Led the ledger service migration"));
    assert!(prompt.system.contains("strongest skill for Backend Engineer"));
    assert!(prompt.user.contains("\"skill\""));
}

#[tokio::test]
async fn given_reply_quoting_answer_when_generating_follow_up_then_keeps_it_unchanged() {
    let llm = Arc::new(ScriptedLlm::new(
        "You mentioned \"blue green releases\". What broke the first time?",
    ));
    let generator = FollowUpGenerator::new(llm, GENERATION_TIMEOUT);

    let generated = generator
        .generate(
            &session(),
            &skill_followup(),
            "I moved our deploys to blue green releases.",
            &[],
        )
        .await;

    assert_eq!(
        generated.text,
        "You mentioned \"blue green releases\". What broke the first time?"
    );
}

#[tokio::test]
async fn given_reply_without_citation_when_generating_follow_up_then_prefixes_answer_excerpt() {
    let llm = Arc::new(ScriptedLlm::new("What broke the first time?"));
    let generator = FollowUpGenerator::new(llm.clone(), GENERATION_TIMEOUT);

    let generated = generator
        .generate(
            &session(),
            &skill_followup(),
            "I moved our deploys to blue green releases. It took a quarter.",
            &[],
        )
        .await;

    assert_eq!(
        generated.text,
        "You mentioned \"I moved our deploys to blue green releases\". What broke the first time?"
    );
    assert!(!generated.used_fallback);
    assert!(llm.prompts()[0].user.contains("blue green releases"));
}

#[tokio::test]
async fn given_llm_failure_when_generating_follow_up_then_fallback_still_cites_answer() {
    let llm = Arc::new(ScriptedLlm::new("unused"));
    llm.push_failure();
    let generator = FollowUpGenerator::new(llm, GENERATION_TIMEOUT);

    let generated = generator
        .generate(&session(), &skill_followup(), "Mostly Kafka.", &[])
        .await;

    assert!(generated.used_fallback);
    assert!(generated.text.starts_with("You mentioned \"Mostly Kafka\""));
}
