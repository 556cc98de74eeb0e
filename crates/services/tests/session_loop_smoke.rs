mod common;

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use common::{CountingStore, QUESTIONS, seed};
use quiz_core::model::{Markup, QuizSession};
use quiz_core::results::{GradeBand, QuestionOutcome};
use quiz_core::time::fixed_now;
use services::{
    AppServices, Clock, LoopExit, Route, SessionError, SessionEvent, SessionInitializer,
    SessionLoop, SubmitTrigger, Submission, parse_question_source,
};
use storage::codec::encode_timestamp;
use storage::repository::{SessionKey, SessionStore};

async fn seeded() -> CountingStore {
    let store = CountingStore::new();
    seed(Arc::new(store.clone()), Clock::fixed(fixed_now())).await;
    store
}

fn initializer(store: &CountingStore, clock: Clock) -> SessionInitializer {
    SessionInitializer::new(clock, Arc::new(store.clone()))
}

fn assert_progress_invariants(session: &QuizSession) {
    for question in session.questions() {
        if question.attempted() {
            assert!(question.visited(), "question {} attempted unseen", question.id());
            assert!(question.user_answer().is_some());
        }
    }
}

#[tokio::test]
async fn reload_after_deadline_submits_once_without_a_tick() {
    let clock = Clock::fixed(fixed_now() + Duration::seconds(1805));
    let store = seeded().await;
    let service = initializer(&store, clock).initialize().await.unwrap();

    let (session_loop, _handle) = SessionLoop::new(service);
    let outcome = session_loop.run().await.unwrap();

    assert_eq!(outcome.exit, LoopExit::Submitted(SubmitTrigger::Timeout));
    assert_eq!(outcome.exit.route(), Route::Results);
    assert_eq!(outcome.snapshot.countdown.remaining_secs, 0);
    assert!(outcome.snapshot.session.is_completed());
    assert_progress_invariants(&outcome.snapshot.session);
    assert_eq!(store.writes(SessionKey::Completed), 1);
    assert_eq!(
        store.get(SessionKey::SubmittedAt).await.unwrap(),
        Some(encode_timestamp(fixed_now() + Duration::seconds(1805)))
    );
}

#[tokio::test(start_paused = true)]
async fn countdown_expiry_submits_exactly_once() {
    let mut clock = Clock::manual(fixed_now() + Duration::seconds(1799));
    let store = seeded().await;
    let service = initializer(&store, clock.clone())
        .initialize()
        .await
        .unwrap();

    let (session_loop, handle) = SessionLoop::new(service);
    let running = tokio::spawn(session_loop.run());

    tokio::time::sleep(StdDuration::from_millis(1500)).await;
    let snapshot = handle.snapshot();
    assert_eq!(snapshot.countdown.remaining_secs, 1);
    assert!(snapshot.countdown.is_low_time);
    assert!(!snapshot.session.is_completed());

    clock.advance(Duration::seconds(1));
    let outcome = running.await.unwrap().unwrap();

    assert_eq!(outcome.exit, LoopExit::Submitted(SubmitTrigger::Timeout));
    assert!(handle.snapshot().session.is_completed());
    assert_progress_invariants(&outcome.snapshot.session);

    // Ticker is gone: more time passing writes nothing.
    clock.advance(Duration::seconds(60));
    tokio::time::sleep(StdDuration::from_secs(5)).await;
    assert_eq!(store.writes(SessionKey::Completed), 1);
    assert!(!handle.send(SessionEvent::Submit).await);
}

#[tokio::test(start_paused = true)]
async fn manual_submit_wins_over_later_timeout() {
    let mut clock = Clock::manual(fixed_now());
    let store = seeded().await;
    let service = initializer(&store, clock.clone())
        .initialize()
        .await
        .unwrap();

    let (session_loop, handle) = SessionLoop::new(service);
    let running = tokio::spawn(session_loop.run());

    assert!(handle.send(SessionEvent::Next).await);
    assert!(
        handle
            .send(SessionEvent::SelectAnswer(Markup::from("Jupiter")))
            .await
    );
    clock.advance(Duration::seconds(125));
    assert!(handle.send(SessionEvent::Submit).await);

    let outcome = running.await.unwrap().unwrap();
    assert_eq!(outcome.exit, LoopExit::Submitted(SubmitTrigger::Manual));
    assert_progress_invariants(&outcome.snapshot.session);

    clock.advance(Duration::seconds(3600));
    tokio::time::sleep(StdDuration::from_secs(10)).await;
    assert_eq!(store.writes(SessionKey::Completed), 1);

    let err = initializer(&store, clock.clone())
        .initialize()
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Completed));

    let results = outcome.snapshot.session.results(clock.now());
    assert_eq!(results.score, 1);
    assert_eq!(results.completion_time.to_string(), "2m 5s");
}

#[tokio::test]
async fn interrupted_submit_keeps_the_attempt_resumable() {
    let mut clock = Clock::manual(fixed_now());
    let store = seeded().await;
    let mut service = initializer(&store, clock.clone())
        .initialize()
        .await
        .unwrap();
    service.select_answer(Markup::from("4")).await.unwrap();

    store.fail_next_write(SessionKey::Completed);
    clock.advance(Duration::seconds(60));
    let err = service.submit().await.unwrap_err();
    assert!(matches!(err, SessionError::Storage(_)));
    assert!(!service.is_complete());
    assert!(store.get(SessionKey::SubmittedAt).await.unwrap().is_some());
    assert_eq!(store.get(SessionKey::Completed).await.unwrap(), None);

    // The half-written submission does not cost the taker the attempt.
    let mut resumed = initializer(&store, clock.clone())
        .initialize()
        .await
        .unwrap();
    assert!(!resumed.is_complete());
    assert_eq!(resumed.session().submitted_at(), None);
    assert_eq!(
        resumed.session().questions()[0].user_answer(),
        Some(&Markup::from("4"))
    );
    assert_progress_invariants(resumed.session());

    clock.advance(Duration::seconds(65));
    assert_eq!(resumed.submit().await.unwrap(), Submission::Accepted);
    assert_eq!(
        store.get(SessionKey::SubmittedAt).await.unwrap(),
        Some(encode_timestamp(fixed_now() + Duration::seconds(125)))
    );
    assert_eq!(
        resumed.results().unwrap().completion_time.to_string(),
        "2m 5s"
    );
}

#[tokio::test(start_paused = true)]
async fn rejected_navigation_keeps_the_loop_running() {
    let clock = Clock::manual(fixed_now());
    let store = seeded().await;
    let service = initializer(&store, clock.clone())
        .initialize()
        .await
        .unwrap();

    let (session_loop, handle) = SessionLoop::new(service);
    let running = tokio::spawn(session_loop.run());

    assert!(handle.send(SessionEvent::GoTo(99)).await);
    assert!(handle.send(SessionEvent::GoTo(2)).await);
    assert!(handle.send(SessionEvent::Previous).await);
    assert!(handle.send(SessionEvent::Submit).await);

    let outcome = running.await.unwrap().unwrap();
    assert_eq!(outcome.snapshot.current_index, 1);
    assert_progress_invariants(&outcome.snapshot.session);
    let visited: Vec<_> = outcome
        .snapshot
        .session
        .questions()
        .iter()
        .map(|q| q.visited())
        .collect();
    assert_eq!(visited, vec![true, true, true]);
}

#[tokio::test(start_paused = true)]
async fn closed_handle_leaves_the_session_open() {
    let clock = Clock::manual(fixed_now());
    let store = seeded().await;
    let service = initializer(&store, clock.clone())
        .initialize()
        .await
        .unwrap();

    let (session_loop, handle) = SessionLoop::new(service);
    drop(handle);

    let outcome = session_loop.run().await.unwrap();
    assert_eq!(outcome.exit, LoopExit::Disconnected);
    assert_eq!(outcome.exit.route(), Route::Quiz);
    assert_progress_invariants(&outcome.snapshot.session);
    assert_eq!(store.writes(SessionKey::Completed), 0);
}

#[tokio::test]
async fn sqlite_flow_from_setup_to_retake() {
    let clock = Clock::manual(fixed_now());
    let services = AppServices::new_sqlite(
        "sqlite:file:memdb_quiz_flow?mode=memory&cache=shared",
        "tab-1",
        clock.clone(),
    )
    .await
    .expect("sqlite services");

    services
        .setup()
        .begin("taker@example.com", parse_question_source(QUESTIONS).unwrap())
        .await
        .unwrap();
    let service = services.initializer().initialize().await.unwrap();
    let (session_loop, handle) = SessionLoop::new(service);
    let running = tokio::spawn(session_loop.run());

    for event in [
        SessionEvent::SelectAnswer(Markup::from("4")),
        SessionEvent::Next,
        SessionEvent::SelectAnswer(Markup::from("Mars")),
        SessionEvent::Submit,
    ] {
        assert!(handle.send(event).await);
    }
    let outcome = running.await.unwrap().unwrap();
    assert_progress_invariants(&outcome.snapshot.session);

    let report = services.results().load().await.unwrap();
    assert_eq!(report.taker.as_str(), "taker@example.com");
    assert_eq!((report.results.score, report.results.total), (1, 3));
    assert_eq!(report.results.percentage, 33);
    assert_eq!(report.results.grade, GradeBand::KeepLearning);
    let outcomes: Vec<_> = report.results.outcomes.iter().map(|r| r.outcome).collect();
    assert_eq!(
        outcomes,
        vec![
            QuestionOutcome::Correct,
            QuestionOutcome::Incorrect,
            QuestionOutcome::NotAnswered
        ]
    );

    assert_eq!(services.results().retake().await.unwrap(), Route::Setup);
    let err = services.initializer().initialize().await.unwrap_err();
    assert_eq!(err.route(), Some(Route::Setup));
}
