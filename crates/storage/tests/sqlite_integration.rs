use practice_core::graph::TopicGraph;
use practice_core::model::{
    AnswerPayload, Attempt, AttemptId, AttemptStatus, Band, Confidence, FeedbackDraft,
    QuestionId, Role, RubricCategory, RubricScore, TopicId, TopicNode, TopicsState,
};
use practice_core::practice::{DifficultyBias, PracticeContext};
use practice_core::time::fixed_now;
use storage::repository::{
    AttemptRepository, BookmarkRepository, HistoryRepository, PracticeContextRepository,
    Storage, StorageError, TopicsStateRepository,
};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn skipped(question: &str) -> Attempt {
    Attempt::start(AttemptId::generate(), QuestionId::new(question), fixed_now())
        .skip(AnswerPayload::Text("partial".into()), fixed_now())
        .unwrap()
}

#[tokio::test]
async fn topics_state_round_trips() {
    let repo = connect("memdb_topics").await;
    assert!(repo.load_topics_state().await.unwrap().is_none());

    let graph = TopicGraph::new([TopicNode {
        id: TopicId::new("de_sql"),
        role: Role::DataEngineer,
        label: "SQL".into(),
        parent_id: None,
        children_ids: Vec::new(),
        level: 1,
        metrics: None,
    }]);
    let state = TopicsState::default()
        .select_explicit(&graph, &TopicId::new("de_sql"))
        .unwrap()
        .set_active_role(Role::DataAnalyst);

    repo.save_topics_state(&state).await.unwrap();
    repo.save_topics_state(&state).await.unwrap();
    assert_eq!(repo.load_topics_state().await.unwrap(), Some(state));

    repo.clear_topics_state().await.unwrap();
    assert!(repo.load_topics_state().await.unwrap().is_none());
}

#[tokio::test]
async fn practice_context_round_trips() {
    let repo = connect("memdb_context").await;
    let mut context = PracticeContext::new(Role::DataScientist, vec!["ML".into()]);
    context.difficulty_bias = DifficultyBias::Harder;

    repo.save_context(&context).await.unwrap();
    assert_eq!(repo.load_context().await.unwrap(), Some(context));
}

#[tokio::test]
async fn unfinished_attempt_reloads_exactly() {
    let repo = connect("memdb_unfinished").await;
    let attempt = Attempt::start(AttemptId::generate(), QuestionId::new("q_sql_001"), fixed_now())
        .record_answer(AnswerPayload::Text("LEFT JOIN keeps".into()), fixed_now())
        .unwrap();

    repo.save_unfinished(&attempt).await.unwrap();
    let loaded = repo.load_unfinished().await.unwrap().expect("stored attempt");
    assert_eq!(loaded, attempt);
    assert_eq!(loaded.status(), AttemptStatus::InProgress);
    assert_eq!(loaded.answer_text(), Some("LEFT JOIN keeps"));

    repo.clear_unfinished().await.unwrap();
    assert!(repo.load_unfinished().await.unwrap().is_none());
}

#[tokio::test]
async fn submitted_attempt_reloads_with_feedback() {
    let repo = connect("memdb_submitted").await;
    let band = Band::new(4).unwrap();
    let feedback = FeedbackDraft {
        overall_score: 78,
        overall_band: band,
        confidence: Confidence::from_band(band),
        rubric: RubricCategory::ALL
            .into_iter()
            .map(|category| RubricScore {
                category,
                band,
                rationale: format!("solid {}", category.label()),
            })
            .collect(),
        went_well: vec!["Named both join types".into()],
        missing: vec!["No example of NULL padding".into()],
        exemplar_answer: "LEFT JOIN keeps every left row.".into(),
    }
    .validate()
    .unwrap();
    let attempt = Attempt::start(AttemptId::generate(), QuestionId::new("q_sql_001"), fixed_now())
        .submit(
            AnswerPayload::Text("LEFT JOIN keeps".into()),
            feedback.clone(),
            fixed_now(),
        )
        .unwrap();

    repo.save_unfinished(&attempt).await.unwrap();
    let loaded = repo.load_unfinished().await.unwrap().expect("stored attempt");
    assert_eq!(loaded, attempt);
    assert_eq!(loaded.status(), AttemptStatus::SubmittedUnresolved);
    assert_eq!(loaded.feedback(), Some(&feedback));
    assert_eq!(loaded.answer_text(), Some("LEFT JOIN keeps"));
}

#[tokio::test]
async fn undecodable_unfinished_attempt_reports_serialization() {
    let repo = connect("memdb_undecodable").await;
    sqlx::query(
        r#"
        INSERT INTO unfinished_attempt (id, attempt_id, question_id, status, attempt_json, updated_at)
        VALUES (1, x'00', 'q_sql_001', 'in_progress', '{"id": 1}', '2024-01-01T00:00:00Z')
        "#,
    )
    .execute(repo.pool())
    .await
    .unwrap();

    let err = repo.load_unfinished().await.unwrap_err();
    assert!(matches!(err, StorageError::Serialization(_)), "{err:?}");

    repo.clear_unfinished().await.unwrap();
    assert!(repo.load_unfinished().await.unwrap().is_none());
}

#[tokio::test]
async fn history_keeps_most_recent_entries_newest_first() {
    let repo = connect("memdb_history").await;
    for q in ["q1", "q2", "q3", "q4"] {
        repo.append_history(&skipped(q), 3).await.unwrap();
    }

    let listed = repo.list_history(10).await.unwrap();
    let ids: Vec<_> = listed.iter().map(|a| a.question_id().as_str()).collect();
    assert_eq!(ids, vec!["q4", "q3", "q2"]);

    repo.clear_history().await.unwrap();
    assert!(repo.list_history(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn bookmarks_toggle_and_list_newest_first() {
    let repo = connect("memdb_bookmarks").await;
    let first = QuestionId::new("q_sql_001");
    let second = QuestionId::new("q_py_001");

    assert!(repo.toggle_bookmark(&first, fixed_now()).await.unwrap());
    assert!(repo.toggle_bookmark(&second, fixed_now()).await.unwrap());
    let listed: Vec<_> = repo
        .list_bookmarks()
        .await
        .unwrap()
        .into_iter()
        .map(|b| b.question_id)
        .collect();
    assert_eq!(listed, vec![second.clone(), first.clone()]);

    assert!(!repo.toggle_bookmark(&first, fixed_now()).await.unwrap());
    assert_eq!(repo.list_bookmarks().await.unwrap().len(), 1);
}

#[tokio::test]
async fn migrations_are_idempotent_and_storage_wires_sqlite() {
    let repo = connect("memdb_migrate").await;
    repo.migrate().await.expect("second migrate");

    let storage = Storage::sqlite("sqlite:file:memdb_migrate?mode=memory&cache=shared")
        .await
        .expect("storage");
    storage.history.append_history(&skipped("q1"), 200).await.unwrap();
    assert_eq!(storage.history.list_history(5).await.unwrap().len(), 1);
}
