//! End-to-end engine behavior: startup, live refresh, duplicate policy,
//! deletion, fail-soft staleness and coalescing.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use tokio_test::assert_ok;

use habit_streaks::{
    CompletionEvent, DuplicatePolicy, EngineConfig, EngineError, Frequency, Habit, HabitStore,
    InMemoryStore, RankedView, RecordOutcome, StoreError, StreakEngine, UserId,
};

fn test_config() -> EngineConfig {
    EngineConfig {
        debounce: Duration::from_millis(20),
        duplicate_policy: DuplicatePolicy::RejectSameDay,
    }
}

fn habit(user_id: &UserId, title: &str) -> Habit {
    Habit::new(user_id.clone(), title.to_string(), None, Frequency::Daily).expect("valid habit")
}

async fn seed_completions(store: &InMemoryStore, habit: &Habit, days_ago: &[i64]) {
    for offset in days_ago {
        let at = Utc::now() - chrono::Duration::days(*offset);
        store
            .append_completion(&CompletionEvent::new(
                habit.id.clone(),
                habit.user_id.clone(),
                at,
            ))
            .await
            .expect("append completion");
    }
}

/// Poll the engine's view until the predicate holds or two seconds pass
async fn wait_for_view<F>(engine: &StreakEngine, predicate: F) -> RankedView
where
    F: Fn(&RankedView) -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        let view = engine.view();
        if predicate(&view) {
            return view;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "ranked view did not reach the expected state: {view:?}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn startup_publishes_a_ranked_view_immediately() {
    let store = Arc::new(InMemoryStore::new());
    let user_id = UserId::new();
    let run = habit(&user_id, "Run");
    let read = habit(&user_id, "Read");
    store.create_habit(&run).await.unwrap();
    store.create_habit(&read).await.unwrap();
    seed_completions(&store, &run, &[1, 2, 3]).await;
    seed_completions(&store, &read, &[1]).await;

    let engine = assert_ok!(
        StreakEngine::start(store.clone() as Arc<dyn HabitStore>, user_id, test_config()).await
    );

    let view = engine.view();
    assert_eq!(view.ranked.len(), 2);
    assert_eq!(view.ranked[0].habit.title, "Run");
    assert_eq!(view.ranked[0].streak.current, 3);

    let top = engine.top_n(1);
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].habit.id, view.ranked[0].habit.id);

    engine.shutdown().await;
}

#[tokio::test]
async fn record_completion_flows_into_the_ranked_view() {
    let store = Arc::new(InMemoryStore::new());
    let user_id = UserId::new();
    let run = habit(&user_id, "Run");
    store.create_habit(&run).await.unwrap();

    let engine = StreakEngine::start(
        store.clone() as Arc<dyn HabitStore>,
        user_id,
        test_config(),
    )
    .await
    .unwrap();

    let outcome = engine.record_completion(&run.id).await.unwrap();
    assert_eq!(outcome, RecordOutcome::Logged { current_streak: 1 });

    let view = wait_for_view(&engine, |view| {
        view.get(&run.id).map(|e| e.streak.total) == Some(1)
    })
    .await;
    assert_eq!(view.ranked[0].streak.current, 1);

    // the submission path also refreshed the cached display fields
    let stored = store.get_habit(&run.id).await.unwrap();
    assert_eq!(stored.streak_count, 1);
    assert!(stored.last_completed.is_some());

    engine.shutdown().await;
}

#[tokio::test]
async fn same_day_duplicates_are_rejected_by_default() {
    let store = Arc::new(InMemoryStore::new());
    let user_id = UserId::new();
    let run = habit(&user_id, "Run");
    store.create_habit(&run).await.unwrap();

    let engine = StreakEngine::start(
        store.clone() as Arc<dyn HabitStore>,
        user_id.clone(),
        test_config(),
    )
    .await
    .unwrap();

    let first = engine.record_completion(&run.id).await.unwrap();
    assert!(matches!(first, RecordOutcome::Logged { .. }));

    let second = engine.record_completion(&run.id).await.unwrap();
    assert_eq!(second, RecordOutcome::AlreadyCompletedToday);

    // only one event reached the log
    let events = store.fetch_completions(&user_id).await.unwrap();
    assert_eq!(events.len(), 1);

    engine.shutdown().await;
}

#[tokio::test]
async fn allow_multiple_policy_credits_every_submission() {
    let store = Arc::new(InMemoryStore::new());
    let user_id = UserId::new();
    let run = habit(&user_id, "Run");
    store.create_habit(&run).await.unwrap();

    let config = EngineConfig {
        duplicate_policy: DuplicatePolicy::AllowMultiple,
        ..test_config()
    };
    let engine = StreakEngine::start(
        store.clone() as Arc<dyn HabitStore>,
        user_id.clone(),
        config,
    )
    .await
    .unwrap();

    for _ in 0..3 {
        let outcome = engine.record_completion(&run.id).await.unwrap();
        assert!(matches!(outcome, RecordOutcome::Logged { .. }));
    }

    let events = store.fetch_completions(&user_id).await.unwrap();
    assert_eq!(events.len(), 3);

    engine.shutdown().await;
}

#[tokio::test]
async fn deleting_a_habit_drops_it_without_touching_others() {
    let store = Arc::new(InMemoryStore::new());
    let user_id = UserId::new();
    let doomed = habit(&user_id, "Doomed");
    let kept = habit(&user_id, "Kept");
    store.create_habit(&doomed).await.unwrap();
    store.create_habit(&kept).await.unwrap();
    seed_completions(&store, &doomed, &[1, 2, 3]).await;
    seed_completions(&store, &kept, &[1, 2]).await;

    let engine = StreakEngine::start(
        store.clone() as Arc<dyn HabitStore>,
        user_id,
        test_config(),
    )
    .await
    .unwrap();
    let before = engine.view().get(&kept.id).unwrap().streak.clone();

    store.delete_habit(&doomed.id).await.unwrap();

    let view = wait_for_view(&engine, |view| view.ranked.len() == 1).await;
    assert!(view.get(&doomed.id).is_none());
    assert_eq!(view.get(&kept.id).unwrap().streak, before);

    engine.shutdown().await;
}

#[tokio::test]
async fn fetch_failure_keeps_the_previous_view_flagged_stale() {
    let store = Arc::new(InMemoryStore::new());
    let user_id = UserId::new();
    let run = habit(&user_id, "Run");
    store.create_habit(&run).await.unwrap();
    seed_completions(&store, &run, &[1, 2]).await;

    let engine = StreakEngine::start(
        store.clone() as Arc<dyn HabitStore>,
        user_id.clone(),
        test_config(),
    )
    .await
    .unwrap();
    assert_eq!(engine.view().get(&run.id).unwrap().streak.total, 2);

    // the append succeeds but the follow-up fetch fails
    store.set_fail_fetches(true);
    seed_completions(&store, &run, &[0]).await;

    let stale = wait_for_view(&engine, |view| view.is_stale).await;
    assert_eq!(stale.get(&run.id).unwrap().streak.total, 2);

    // the store comes back; the next mutation recovers a fresh view
    store.set_fail_fetches(false);
    seed_completions(&store, &run, &[5]).await;

    let recovered = wait_for_view(&engine, |view| !view.is_stale).await;
    assert_eq!(recovered.get(&run.id).unwrap().streak.total, 4);

    engine.shutdown().await;
}

#[tokio::test]
async fn a_burst_of_mutations_coalesces_into_a_consistent_view() {
    let store = Arc::new(InMemoryStore::new());
    let user_id = UserId::new();
    let run = habit(&user_id, "Run");
    store.create_habit(&run).await.unwrap();

    let engine = StreakEngine::start(
        store.clone() as Arc<dyn HabitStore>,
        user_id,
        test_config(),
    )
    .await
    .unwrap();

    // five appends land inside one debounce window
    seed_completions(&store, &run, &[1, 2, 3, 4, 5]).await;

    let view = wait_for_view(&engine, |view| {
        view.get(&run.id).map(|e| e.streak.total) == Some(5)
    })
    .await;
    assert_eq!(view.get(&run.id).unwrap().streak.current, 5);
    assert_eq!(view.get(&run.id).unwrap().streak.best, 5);

    engine.shutdown().await;
}

#[tokio::test]
async fn recording_on_an_unknown_habit_is_a_store_error() {
    let store = Arc::new(InMemoryStore::new());
    let user_id = UserId::new();

    let engine = StreakEngine::start(
        store.clone() as Arc<dyn HabitStore>,
        user_id,
        test_config(),
    )
    .await
    .unwrap();

    let result = engine
        .record_completion(&habit(&UserId::new(), "ghost").id)
        .await;
    assert!(matches!(
        result,
        Err(EngineError::Store(StoreError::HabitNotFound { .. }))
    ));

    engine.shutdown().await;
}

#[tokio::test]
async fn startup_fails_when_the_initial_fetch_fails() {
    let store = Arc::new(InMemoryStore::new());
    store.set_fail_fetches(true);

    let result = StreakEngine::start(
        store.clone() as Arc<dyn HabitStore>,
        UserId::new(),
        test_config(),
    )
    .await;

    assert!(matches!(
        result,
        Err(EngineError::Store(StoreError::Transport(_)))
    ));
}
