//! Integration tests for the played-game path: aggregates, leveling,
//! streaks, and the unlock pass, over a real temp SQLite file.

use chrono::{Duration, TimeZone, Utc};
use linguad::{
    achievements::catalog,
    clock::{Clock, FixedClock},
    config::EngineConfig,
    progress::model::PlayedGameEvent,
    progress::storage::ProgressStore,
    storage::Storage,
    AppContext,
};
use std::sync::Arc;
use tempfile::TempDir;

async fn make_test_ctx(dir: &TempDir, clock: Arc<FixedClock>) -> AppContext {
    let config = Arc::new(EngineConfig {
        data_dir: dir.path().to_path_buf(),
        ..EngineConfig::default()
    });
    let storage = Arc::new(Storage::new(dir.path()).await.unwrap());
    AppContext::new(config, storage, catalog::builtin(), clock)
}

fn test_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::at(
        Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap(),
    ))
}

fn game(score: u32, max_score: u32, correct: u32, total: u32) -> PlayedGameEvent {
    PlayedGameEvent {
        game_type: "quiz".to_string(),
        name: "Animals".to_string(),
        level_name: "A1".to_string(),
        stage_name: "1".to_string(),
        score,
        max_score,
        time_spent_seconds: 75,
        correct_answers: correct,
        total_questions: total,
    }
}

#[tokio::test]
async fn perfect_game_at_950_xp_levels_up_to_two() {
    let dir = TempDir::new().unwrap();
    let clock = test_clock();
    let ctx = make_test_ctx(&dir, clock.clone()).await;

    // Seed a user sitting just below the level boundary.
    let store = ProgressStore::new(ctx.storage.pool());
    let mut snapshot = store.load_or_create("user-1", clock.now_utc()).await.unwrap();
    snapshot.total_xp = 950;
    store.save(&snapshot).await.unwrap();

    // Perfect game with 6 correct answers: 60 + 50 = 110 XP.
    let report = ctx
        .engine
        .record_played_game("user-1", game(100, 100, 6, 6), None)
        .await
        .unwrap();

    assert_eq!(report.xp_earned, 110);
    assert_eq!(report.new_level, 2);
    assert!(report.level_up);

    let snapshot = ctx.engine.get_progress("user-1").await.unwrap();
    assert_eq!(snapshot.total_xp, 1_060);
    assert_eq!(snapshot.level, 2);
    snapshot.validate().unwrap();

    let level_2 = snapshot
        .achievements
        .iter()
        .find(|a| a.achievement_id == "level_2")
        .expect("level_2 achievement");
    assert_eq!(level_2.points, 200);

    // The unlock pass saw the post-play XP: first_game, perfect_1 and
    // xp_1000 all unlock in the same call.
    let ids: Vec<_> = report
        .unlocked
        .iter()
        .map(|a| a.achievement_id.as_str())
        .collect();
    assert!(ids.contains(&"first_game"));
    assert!(ids.contains(&"perfect_1"));
    assert!(ids.contains(&"xp_1000"));
}

#[tokio::test]
async fn duplicate_event_id_is_ignored() {
    let dir = TempDir::new().unwrap();
    let ctx = make_test_ctx(&dir, test_clock()).await;

    let first = ctx
        .engine
        .record_played_game("user-1", game(80, 100, 8, 10), Some("evt-1"))
        .await
        .unwrap();
    assert_eq!(first.xp_earned, 80);

    let replay = ctx
        .engine
        .record_played_game("user-1", game(80, 100, 8, 10), Some("evt-1"))
        .await
        .unwrap();
    assert_eq!(replay.xp_earned, 0);
    assert!(replay.unlocked.is_empty());

    let snapshot = ctx.engine.get_progress("user-1").await.unwrap();
    assert_eq!(snapshot.statistics.total_games_played, 1);
    assert_eq!(snapshot.total_xp, 80);
    assert_eq!(snapshot.games_played.len(), 1);
}

#[tokio::test]
async fn streak_increments_across_days_and_resets_after_gap() {
    let dir = TempDir::new().unwrap();
    let clock = test_clock();
    let ctx = make_test_ctx(&dir, clock.clone()).await;

    let day1 = ctx
        .engine
        .record_played_game("user-1", game(50, 100, 5, 10), None)
        .await
        .unwrap();
    assert_eq!(day1.streak, 1);

    clock.advance(Duration::days(1));
    let day2 = ctx
        .engine
        .record_played_game("user-1", game(50, 100, 5, 10), None)
        .await
        .unwrap();
    assert_eq!(day2.streak, 2);

    // Same day again: no double increment.
    let day2_again = ctx
        .engine
        .record_played_game("user-1", game(50, 100, 5, 10), None)
        .await
        .unwrap();
    assert_eq!(day2_again.streak, 2);

    // Skip a day: reset to 1, best streak survives.
    clock.advance(Duration::days(2));
    let day4 = ctx
        .engine
        .record_played_game("user-1", game(50, 100, 5, 10), None)
        .await
        .unwrap();
    assert_eq!(day4.streak, 1);

    let snapshot = ctx.engine.get_progress("user-1").await.unwrap();
    assert_eq!(snapshot.statistics.best_streak, 2);
    snapshot.validate().unwrap();
}

#[tokio::test]
async fn average_score_rounds_like_full_history_mean() {
    let dir = TempDir::new().unwrap();
    let ctx = make_test_ctx(&dir, test_clock()).await;

    for score in [70, 75] {
        ctx.engine
            .record_played_game("user-1", game(score, 100, 5, 10), None)
            .await
            .unwrap();
    }
    let snapshot = ctx.engine.get_progress("user-1").await.unwrap();
    assert_eq!(snapshot.statistics.average_score, 73); // 72.5 rounds up
}

#[tokio::test]
async fn completing_three_categories_unlocks_explorer() {
    let dir = TempDir::new().unwrap();
    let ctx = make_test_ctx(&dir, test_clock()).await;

    let mut last_unlocked = Vec::new();
    for (i, category) in ["basics", "food", "travel"].iter().enumerate() {
        let stage = serde_json::json!({
            "levelName": format!("A{}", i + 1),
            "levelType": "beginner",
            "stageName": "Intro",
            "stageNumber": 1,
            "score": 90,
            "maxScore": 100,
            "timeSpentSeconds": 120,
            "totalStages": 1,
            "category": { "name": category, "categoryType": "vocabulary", "totalLessons": 1 }
        });
        let event = serde_json::from_value(stage).unwrap();
        let report = ctx.engine.complete_stage("user-1", event).await.unwrap();
        assert_eq!(report.level_completion_percentage, 100);
        assert!(report.level_completed);
        assert!(report.category_completed);
        last_unlocked = report.unlocked;
    }

    let ids: Vec<_> = last_unlocked
        .iter()
        .map(|a| a.achievement_id.as_str())
        .collect();
    assert!(ids.contains(&"explorer"), "got {ids:?}");

    let snapshot = ctx.engine.get_progress("user-1").await.unwrap();
    assert_eq!(snapshot.categories.len(), 3);
    assert!(snapshot.categories.iter().all(|c| c.is_completed));
    snapshot.validate().unwrap();
}

#[tokio::test]
async fn repeating_a_stage_keeps_best_score_and_counts_attempts() {
    let dir = TempDir::new().unwrap();
    let clock = test_clock();
    let ctx = make_test_ctx(&dir, clock.clone()).await;
    let first_attempt_at = clock.now_utc();

    for score in [60, 95, 80] {
        let stage = serde_json::json!({
            "levelName": "A1",
            "stageName": "Greetings",
            "stageNumber": 1,
            "score": score,
            "maxScore": 100,
            "totalStages": 4
        });
        let event = serde_json::from_value(stage).unwrap();
        ctx.engine.complete_stage("user-1", event).await.unwrap();
        clock.advance(Duration::hours(1));
    }

    let snapshot = ctx.engine.get_progress("user-1").await.unwrap();
    let level = snapshot.levels.iter().find(|l| l.name == "A1").unwrap();
    assert_eq!(level.completion_percentage, 25); // 1 of 4 stages
    let stage = &level.stages[0];
    assert_eq!(stage.attempts, 3);
    assert_eq!(stage.score, 95);
    // completed_at was set once, on the first completion.
    assert_eq!(stage.completed_at.unwrap(), first_attempt_at);
}

#[tokio::test]
async fn rpc_dispatch_round_trip() {
    let dir = TempDir::new().unwrap();
    let ctx = make_test_ctx(&dir, test_clock()).await;

    let request = serde_json::json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "progress.recordGame",
        "params": {
            "userId": "user-1",
            "game": {
                "gameType": "quiz", "name": "Animals",
                "score": 80, "maxScore": 100,
                "correctAnswers": 8, "totalQuestions": 10
            }
        }
    });
    let response = linguad::rpc::dispatch_text(&request.to_string(), &ctx).await;
    let json: serde_json::Value = serde_json::from_str(&response).unwrap();
    assert_eq!(json["result"]["xpEarned"], 80);
    assert!(json["error"].is_null());

    // Unknown method → -32601.
    let response = linguad::rpc::dispatch_text(
        r#"{"jsonrpc":"2.0","id":2,"method":"progress.nope","params":{}}"#,
        &ctx,
    )
    .await;
    let json: serde_json::Value = serde_json::from_str(&response).unwrap();
    assert_eq!(json["error"]["code"], -32601);

    // Malformed event → validation code -32003.
    let request = serde_json::json!({
        "jsonrpc": "2.0",
        "id": 3,
        "method": "progress.recordGame",
        "params": {
            "userId": "user-1",
            "game": {
                "gameType": "quiz", "name": "Animals",
                "score": 120, "maxScore": 100,
                "correctAnswers": 8, "totalQuestions": 10
            }
        }
    });
    let response = linguad::rpc::dispatch_text(&request.to_string(), &ctx).await;
    let json: serde_json::Value = serde_json::from_str(&response).unwrap();
    assert_eq!(json["error"]["code"], -32003);
}
