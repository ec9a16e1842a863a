mod helpers;

use std::sync::Arc;
use std::time::Duration;

use interlocutor::application::ports::{LockStore, SessionRepository, TurnRepository};
use interlocutor::application::services::{
    AdvanceOutcome, OrchestratorError, OrchestratorSettings, SkipReason,
};
use interlocutor::domain::{
    CatalogId, NewTurn, ProducedQuestion, Session, SessionId, SessionStatus, StageType, TaskKind,
};
use serde_json::json;

use helpers::{Harness, SlowLlm, new_session_attrs, skill_registry};

fn produced_stage(outcome: &AdvanceOutcome) -> &str {
    match outcome {
        AdvanceOutcome::Produced { stage, .. } => stage,
        other => panic!("expected a produced stage, got {:?}", other),
    }
}

async fn reload(harness: &Harness, session: &Session) -> Session {
    harness.repo.get_by_id(session.id).await.unwrap().unwrap()
}

#[tokio::test]
async fn given_skill_catalog_when_walking_every_stage_then_produces_each_once_and_completes() {
    let harness = Harness::with_skill_catalog();
    harness
        .llm
        .push_reply("Which skill carries most of your Backend Engineer work?");
    harness.llm.push_reply("What broke the first time you tried it?");
    let session = harness.live_session().await;
    harness.ask(&session, "intro").await;
    harness.answer(&session, "Hi, I'm Dana.").await;

    let outcome = harness.orchestrator.advance(session.id).await.unwrap();
    assert_eq!(produced_stage(&outcome), "motivation");
    let log = harness.repo.load_log(session.id).await.unwrap();
    assert_eq!(log.last().unwrap().turn.text, "Why Backend Engineer?");

    harness.answer(&session, "I like building APIs.").await;
    let outcome = harness.orchestrator.advance(session.id).await.unwrap();
    assert!(matches!(
        outcome,
        AdvanceOutcome::Produced {
            stage_type: StageType::Generated,
            used_fallback: false,
            reused: false,
            ..
        }
    ));
    assert_eq!(produced_stage(&outcome), "skill");

    harness
        .answer(&session, "I moved our deploys to blue green releases.")
        .await;
    let outcome = harness.orchestrator.advance(session.id).await.unwrap();
    assert_eq!(produced_stage(&outcome), "skill_followup");
    let follow_up = harness
        .repo
        .find_question(session.id, "skill_followup")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        follow_up.content,
        "You mentioned \"I moved our deploys to blue green releases\". What broke the first time you tried it?"
    );

    harness.answer(&session, "The health checks lied.").await;
    let outcome = harness.orchestrator.advance(session.id).await.unwrap();
    assert_eq!(outcome, AdvanceOutcome::Completed);

    let session = reload(&harness, &session).await;
    assert_eq!(session.status, SessionStatus::Completed);
    assert!(session.completed_at.is_some());
    assert_eq!(
        harness.stage_names(&session).await,
        vec!["intro", "motivation", "skill", "skill_followup"]
    );
    assert_eq!(harness.dispatcher.count(TaskKind::FinalizeSession), 1);
    assert_eq!(harness.dispatcher.count(TaskKind::SynthesizeSpeech), 3);
}

#[tokio::test]
async fn given_completed_session_when_advancing_again_then_converges_without_new_dispatch() {
    let harness = Harness::with_skill_catalog();
    let session = harness.live_session().await;
    for stage in ["intro", "motivation", "skill", "skill_followup"] {
        harness.ask(&session, stage).await;
        harness.answer(&session, "An answer.").await;
    }

    let first = harness.orchestrator.advance(session.id).await.unwrap();
    let second = harness.orchestrator.advance(session.id).await.unwrap();

    assert_eq!(first, AdvanceOutcome::Completed);
    assert_eq!(second, AdvanceOutcome::Completed);
    assert_eq!(harness.dispatcher.count(TaskKind::FinalizeSession), 1);
    assert_eq!(harness.stage_names(&session).await.len(), 4);
}

#[tokio::test]
async fn given_live_session_without_turns_when_advancing_then_asks_first_stage() {
    let harness = Harness::new();
    let session = harness.live_session().await;

    let outcome = harness.orchestrator.advance(session.id).await.unwrap();

    assert_eq!(produced_stage(&outcome), "intro");
    let session = reload(&harness, &session).await;
    assert_eq!(session.current_stage.as_deref(), Some("intro"));
}

#[tokio::test]
async fn given_scheduled_session_when_advancing_then_session_goes_live() {
    let harness = Harness::new();
    let session = Session::new(
        new_session_attrs("Computer Science", "Backend Engineer"),
        CatalogId::Standard,
    );
    harness.repo.create(&session).await.unwrap();

    let outcome = harness.orchestrator.advance(session.id).await.unwrap();

    assert_eq!(produced_stage(&outcome), "intro");
    let session = reload(&harness, &session).await;
    assert_eq!(session.status, SessionStatus::Live);
    assert!(session.started_at.is_some());
}

#[tokio::test]
async fn given_answered_stage_when_advancing_then_current_stage_moves_with_the_question() {
    let harness = Harness::new();
    let session = harness.live_session().await;
    harness.ask(&session, "intro").await;
    harness.answer(&session, "Hello there.").await;

    harness.orchestrator.advance(session.id).await.unwrap();

    let session = reload(&harness, &session).await;
    assert_eq!(session.current_stage.as_deref(), Some("motivation"));
}

#[tokio::test]
async fn given_fresh_ai_turn_when_advancing_then_skips_as_ai_just_spoke() {
    let harness = Harness::new();
    let session = harness.live_session().await;
    let question = ProducedQuestion::new(
        session.id,
        "intro".to_string(),
        "Hello".to_string(),
        None,
        json!({}),
    );
    harness
        .repo
        .append_question_turn(
            &question,
            &NewTurn::ai(session.id, question.id, question.content.clone()),
        )
        .await
        .unwrap();

    let outcome = harness.orchestrator.advance(session.id).await.unwrap();

    assert_eq!(outcome, AdvanceOutcome::Skipped(SkipReason::AiJustSpoke));
    assert_eq!(harness.stage_names(&session).await, vec!["intro"]);
}

#[tokio::test]
async fn given_next_stage_already_asked_when_advancing_then_skips_as_already_exists() {
    let harness = Harness::new();
    let session = harness.live_session().await;
    harness.ask(&session, "intro").await;
    harness.answer(&session, "Hello.").await;
    harness.ask(&session, "motivation").await;

    let outcome = harness.orchestrator.advance(session.id).await.unwrap();

    assert_eq!(outcome, AdvanceOutcome::Skipped(SkipReason::AlreadyExists));
    assert_eq!(harness.stage_names(&session).await.len(), 2);
}

#[tokio::test]
async fn given_lease_held_elsewhere_when_advancing_then_skips_and_leaves_log_untouched() {
    let harness = Harness::new();
    let session = harness.live_session().await;
    harness.ask(&session, "intro").await;
    harness.answer(&session, "Hello.").await;
    let lease = format!("lease:advance:{}", session.id);
    assert!(harness
        .locks
        .try_set_if_absent(&lease, Duration::from_secs(60))
        .await
        .unwrap());

    let outcome = harness.orchestrator.advance(session.id).await.unwrap();

    assert_eq!(outcome, AdvanceOutcome::Skipped(SkipReason::SessionLocked));
    assert_eq!(harness.stage_names(&session).await, vec!["intro"]);

    harness.locks.release(&lease).await.unwrap();
    let outcome = harness.orchestrator.advance(session.id).await.unwrap();
    assert_eq!(produced_stage(&outcome), "motivation");
}

#[tokio::test(start_paused = true)]
async fn given_advance_abandoned_mid_generation_when_retrying_then_lease_is_free() {
    let harness = Harness::with_model(
        skill_registry(),
        OrchestratorSettings::default(),
        Arc::new(SlowLlm(Duration::from_secs(100))),
    );
    let session = harness.live_session().await;
    harness.ask(&session, "intro").await;
    harness.answer(&session, "Hello.").await;
    harness.ask(&session, "motivation").await;
    harness.answer(&session, "I like backend work.").await;
    let lease = format!("lease:advance:{}", session.id);

    let abandoned = tokio::time::timeout(
        Duration::from_millis(100),
        harness.orchestrator.advance(session.id),
    )
    .await;
    assert!(abandoned.is_err());
    tokio::time::sleep(Duration::from_millis(1)).await;

    assert!(!harness.locks.is_held(&lease).await);
    let outcome = harness.orchestrator.advance(session.id).await.unwrap();
    assert_eq!(produced_stage(&outcome), "skill");
    assert!(matches!(outcome, AdvanceOutcome::Produced { used_fallback: true, .. }));
}

#[tokio::test]
async fn given_successful_advance_when_it_returns_then_lease_is_released() {
    let harness = Harness::new();
    let session = harness.live_session().await;

    harness.orchestrator.advance(session.id).await.unwrap();

    assert!(
        !harness
            .locks
            .is_held(&format!("lease:advance:{}", session.id))
            .await
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn given_concurrent_advances_when_racing_then_exactly_one_produces_the_stage() {
    let harness = Harness::new();
    let session = harness.live_session().await;
    harness.ask(&session, "intro").await;
    harness.answer(&session, "Hello.").await;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let orchestrator = Arc::clone(&harness.orchestrator);
            let session_id = session.id;
            tokio::spawn(async move { orchestrator.advance(session_id).await })
        })
        .collect();

    let mut produced = 0;
    for handle in handles {
        match handle.await.unwrap().unwrap() {
            AdvanceOutcome::Produced { stage, .. } => {
                assert_eq!(stage, "motivation");
                produced += 1;
            }
            AdvanceOutcome::Skipped(_) => {}
            AdvanceOutcome::Completed => panic!("session must not complete"),
        }
    }

    assert_eq!(produced, 1);
    let questions = harness.repo.list_questions(session.id).await.unwrap();
    assert_eq!(
        questions.iter().filter(|q| q.stage == "motivation").count(),
        1
    );
    let ai_turns = harness
        .repo
        .load_log(session.id)
        .await
        .unwrap()
        .into_iter()
        .filter(|e| e.turn.is_ai() && e.stage.as_deref() == Some("motivation"))
        .count();
    assert_eq!(ai_turns, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn given_concurrent_final_advances_when_racing_then_finalization_is_dispatched_once() {
    let harness = Harness::with_skill_catalog();
    let session = harness.live_session().await;
    for stage in ["intro", "motivation", "skill", "skill_followup"] {
        harness.ask(&session, stage).await;
        harness.answer(&session, "An answer.").await;
    }

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let orchestrator = Arc::clone(&harness.orchestrator);
            let session_id = session.id;
            tokio::spawn(async move { orchestrator.advance(session_id).await })
        })
        .collect();
    for handle in handles {
        let outcome = handle.await.unwrap().unwrap();
        assert!(!matches!(outcome, AdvanceOutcome::Produced { .. }));
    }

    assert_eq!(harness.dispatcher.count(TaskKind::FinalizeSession), 1);
    assert_eq!(
        reload(&harness, &session).await.status,
        SessionStatus::Completed
    );
}

#[tokio::test]
async fn given_blank_answer_to_parent_when_advancing_then_passes_over_its_follow_up() {
    let harness = Harness::new();
    let session = harness.live_session().await;
    for stage in ["intro", "motivation"] {
        harness.ask(&session, stage).await;
        harness.answer(&session, "Fine.").await;
    }
    harness.ask(&session, "experience").await;
    harness.answer(&session, "   ").await;

    let outcome = harness.orchestrator.advance(session.id).await.unwrap();

    assert_eq!(produced_stage(&outcome), "technical");
    assert!(
        !harness
            .stage_names(&session)
            .await
            .contains(&"experience_followup".to_string())
    );
}

#[tokio::test]
async fn given_blank_answer_before_final_follow_up_when_advancing_then_completes() {
    let harness = Harness::with_skill_catalog();
    let session = harness.live_session().await;
    for stage in ["intro", "motivation"] {
        harness.ask(&session, stage).await;
        harness.answer(&session, "Fine.").await;
    }
    harness.ask(&session, "skill").await;
    harness.answer(&session, "").await;

    let outcome = harness.orchestrator.advance(session.id).await.unwrap();

    assert_eq!(outcome, AdvanceOutcome::Completed);
    assert_eq!(harness.dispatcher.count(TaskKind::FinalizeSession), 1);
}

#[tokio::test]
async fn given_legacy_stage_names_in_log_when_advancing_then_continues_from_current_name() {
    let harness = Harness::new();
    let session = harness.live_session().await;
    harness.ask(&session, "greeting").await;
    harness.answer(&session, "Hello.").await;
    harness.ask(&session, "why_apply").await;
    harness.answer(&session, "Because.").await;

    let outcome = harness.orchestrator.advance(session.id).await.unwrap();

    assert_eq!(produced_stage(&outcome), "experience");
}

#[tokio::test]
async fn given_llm_failure_when_advancing_into_generated_stage_then_persists_fallback() {
    let harness = Harness::new();
    harness.llm.push_failure();
    let session = harness.live_session().await;
    for stage in ["intro", "motivation"] {
        harness.ask(&session, stage).await;
        harness.answer(&session, "Fine.").await;
    }

    let outcome = harness.orchestrator.advance(session.id).await.unwrap();

    assert!(matches!(
        outcome,
        AdvanceOutcome::Produced {
            used_fallback: true,
            ..
        }
    ));
    let question = harness
        .repo
        .find_question(session.id, "experience")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(question.metadata["fallback"], json!(true));
    assert_eq!(question.evaluation_category.as_deref(), Some("experience"));
}

#[tokio::test]
async fn given_resume_context_when_advancing_into_generated_stage_then_prompt_includes_it() {
    let harness = Harness::new();
    let resume_id = uuid::Uuid::new_v4();
    harness
        .retriever
        .add_chunk(
            resume_id,
            "Built a Backend Engineer toolkit for project experience tracking",
            Some("experience"),
        )
        .await;
    let mut attrs = new_session_attrs("Computer Science", "Backend Engineer");
    attrs.resume_id = Some(resume_id);
    let session = Session::new(attrs, CatalogId::Standard);
    harness.repo.create(&session).await.unwrap();
    harness.repo.mark_live(session.id, chrono::Utc::now()).await.unwrap();
    for stage in ["intro", "motivation"] {
        harness.ask(&session, stage).await;
        harness.answer(&session, "Fine.").await;
    }

    harness.orchestrator.advance(session.id).await.unwrap();

    let prompt = harness.llm.prompts().pop().unwrap();
    assert!(prompt.system.contains("Backend Engineer toolkit"));
    let question = harness
        .repo
        .find_question(session.id, "experience")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(question.metadata["context_items"], json!(1));
}

#[tokio::test]
async fn given_follow_up_with_own_query_when_advancing_then_retrieves_with_it() {
    let harness = Harness::new();
    let resume_id = uuid::Uuid::new_v4();
    harness
        .retriever
        .add_chunk(
            resume_id,
            "Chose Kafka over RabbitMQ after weighing trade-offs against alternatives",
            None,
        )
        .await;
    let mut attrs = new_session_attrs("Computer Science", "Backend Engineer");
    attrs.resume_id = Some(resume_id);
    let session = Session::new(attrs, CatalogId::Standard);
    harness.repo.create(&session).await.unwrap();
    harness.repo.mark_live(session.id, chrono::Utc::now()).await.unwrap();
    for stage in ["intro", "motivation", "experience"] {
        harness.ask(&session, stage).await;
        harness.answer(&session, "We moved billing to an event log.").await;
    }

    let outcome = harness.orchestrator.advance(session.id).await.unwrap();

    assert_eq!(produced_stage(&outcome), "experience_followup");
    let question = harness
        .repo
        .find_question(session.id, "experience_followup")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(question.metadata["context_items"], json!(1));
}

#[tokio::test]
async fn given_unknown_session_when_advancing_then_returns_not_found() {
    let harness = Harness::new();

    let result = harness.orchestrator.advance(SessionId::new()).await;

    assert!(matches!(result, Err(OrchestratorError::SessionNotFound(_))));
}
