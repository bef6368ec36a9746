use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use services::{
    Advance, BankSource, QuizLoopService, QuizMode, SessionError, SessionRequest, StartNotice,
    parse_bank,
};
use storage::{InMemoryStore, KeyValueStore, QuizRecords, Storage, StorageError};

const BANK: &str = r#"[
    {"연월일": "20240101", "과목": "A", "문제번호": "2", "문제내용": "second",
     "선택지1": "a", "선택지2": "b", "정답": 1},
    {"연월일": "20240101", "과목": "A", "문제번호": 1, "문제내용": "first",
     "선택지1": "a", "선택지2": "b", "정답": "①"},
    {"연월일": "20240101", "과목": "A", "문제번호": 3, "문제내용": "third",
     "선택지1": "a", "선택지2": "b", "선택지3": "c", "정답": "3"},
    {"연월일": "20240202", "과목": "A", "문제번호": 1, "문제내용": "next round",
     "선택지1": "a", "선택지2": "b", "정답": "2"},
    {"연월일": "20230101", "과목": "Math", "문제번호": 5, "문제내용": "older",
     "선택지1": "a", "선택지2": "b", "정답": "1"},
    {"연월일": "20240101", "과목": "Math", "문제번호": 9, "문제내용": "newer",
     "선택지1": "a", "선택지2": "b", "정답": "1"}
]"#;

fn setup() -> (InMemoryStore, QuizLoopService) {
    let store = InMemoryStore::new();
    let bank = Arc::new(parse_bank(BANK.as_bytes()).unwrap());
    let records = QuizRecords::new(Arc::new(store.clone()));
    (store, QuizLoopService::new(bank, records))
}

fn round_a() -> SessionRequest {
    SessionRequest::Normal {
        round: "20240101".into(),
        subjects: vec!["A".into()],
    }
}

#[tokio::test]
async fn normal_round_scores_and_clears_resume_state() {
    let (store, svc) = setup();
    let mut started = svc.start_session(round_a(), 0).await.unwrap();
    let session = &mut started.session;

    let order: Vec<u32> = session
        .questions()
        .iter()
        .map(|q| q.question.number())
        .collect();
    assert_eq!(order, vec![1, 2, 3]);
    assert!(store.get("lastQuizState").await.unwrap().is_some());

    svc.select_option(session, 1).unwrap();
    assert_eq!(svc.advance(session).await.unwrap(), Advance::Moved(1));

    let saved = QuizRecords::new(Arc::new(store.clone()))
        .last_quiz()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(saved.question_index, 1);

    svc.select_option(session, 2).unwrap();
    svc.advance(session).await.unwrap();
    svc.select_option(session, 3).unwrap();
    assert_eq!(svc.advance(session).await.unwrap(), Advance::Completed);

    let summary = svc.session_summary(session);
    assert_eq!((summary.score, summary.total), (2, 3));
    assert_eq!(summary.percentage(), 66.7);
    assert_eq!(summary.incorrect.len(), 1);
    assert_eq!(summary.incorrect[0].number(), 2);

    assert!(store.get("lastQuizState").await.unwrap().is_none());
}

#[tokio::test]
async fn checked_quiz_orders_round_major() {
    let (_store, svc) = setup();
    svc.toggle_checked(&"20240101-9".parse().unwrap())
        .await
        .unwrap();
    svc.toggle_checked(&"20230101-5".parse().unwrap())
        .await
        .unwrap();

    let started = svc.start_checked_quiz(vec!["Math".into()]).await.unwrap();
    let keys: Vec<String> = started
        .session
        .questions()
        .iter()
        .map(|q| q.question.key().to_string())
        .collect();
    assert_eq!(keys, vec!["20230101-5", "20240101-9"]);
    assert_eq!(started.session.mode(), QuizMode::Checked);
}

#[tokio::test]
async fn review_session_never_touches_resume_state() {
    let (store, svc) = setup();
    let mut started = svc.start_session(round_a(), 0).await.unwrap();
    svc.reveal(&mut started.session).unwrap();
    let summary = svc.finish(&mut started.session).await.unwrap();
    assert_eq!(summary.incorrect.len(), 1);

    // A stale pointer from another quiz must survive the review untouched.
    store
        .set(
            "lastQuizState",
            r#"{"round":"20240101","subjects":["A"],"questionIndex":2}"#,
        )
        .await
        .unwrap();

    let mut review = svc.start_review(&summary).await.unwrap();
    assert_eq!(review.session.mode(), QuizMode::Review);
    svc.select_option(&mut review.session, 2).unwrap();
    svc.advance(&mut review.session).await.unwrap();

    assert!(review.session.incorrect().is_empty());
    assert_eq!(
        store.get("lastQuizState").await.unwrap().as_deref(),
        Some(r#"{"round":"20240101","subjects":["A"],"questionIndex":2}"#)
    );
    assert!(store.get("lastCheckedQuizState").await.unwrap().is_none());
}

#[tokio::test]
async fn review_requires_incorrect_answers() {
    let (_store, svc) = setup();
    let mut started = svc.start_session(round_a(), 0).await.unwrap();
    svc.select_option(&mut started.session, 1).unwrap();
    let summary = svc.finish(&mut started.session).await.unwrap();

    let err = svc.start_review(&summary).await.unwrap_err();
    assert!(matches!(err, SessionError::NoIncorrectQuestions));
}

#[tokio::test]
async fn continue_last_quiz_resumes_with_fresh_flags() {
    let (_store, svc) = setup();
    let mut started = svc.start_session(round_a(), 0).await.unwrap();
    svc.select_option(&mut started.session, 1).unwrap();
    svc.advance(&mut started.session).await.unwrap();
    svc.reveal(&mut started.session).unwrap();
    svc.back(&mut started.session).await.unwrap();
    svc.advance(&mut started.session).await.unwrap();

    let resumed = svc.continue_last_quiz().await.unwrap();
    assert_eq!(resumed.session.current_index(), 1);
    assert!(resumed.notice.is_none());
    assert!(resumed.session.questions().iter().all(|q| !q.answered));
    assert_eq!(resumed.session.score(), 0);
}

#[tokio::test]
async fn continue_restarts_when_index_is_out_of_range() {
    let (store, svc) = setup();
    store
        .set(
            "lastQuizState",
            r#"{"round":"20240101","subjects":["A"],"questionIndex":10}"#,
        )
        .await
        .unwrap();

    let resumed = svc.continue_last_quiz().await.unwrap();
    assert_eq!(resumed.session.current_index(), 0);
    assert_eq!(
        resumed.notice,
        Some(StartNotice::RestartedFromBeginning {
            saved_index: 10,
            total: 3
        })
    );
}

#[tokio::test]
async fn continue_without_matching_questions_clears_the_record() {
    let (store, svc) = setup();
    let err = svc.continue_last_quiz().await.unwrap_err();
    assert!(matches!(err, SessionError::NoResumeState));

    store
        .set(
            "lastQuizState",
            r#"{"round":"19990101","subjects":["A"],"questionIndex":0}"#,
        )
        .await
        .unwrap();
    let err = svc.continue_last_quiz().await.unwrap_err();
    assert!(matches!(err, SessionError::ResumeDataMissing));
    assert!(store.get("lastQuizState").await.unwrap().is_none());
}

#[tokio::test]
async fn next_round_keeps_subjects() {
    let (_store, svc) = setup();
    let started = svc.start_session(round_a(), 0).await.unwrap();

    let next = svc.start_next_round(&started.session).await.unwrap();
    assert_eq!(next.session.round(), Some("20240202"));
    assert_eq!(next.session.subjects(), ["A".to_owned()]);

    let err = svc.start_next_round(&next.session).await.unwrap_err();
    assert!(matches!(err, SessionError::NoNextRound));
}

#[tokio::test]
async fn question_view_reflects_bookmarks_and_notes() {
    let (_store, svc) = setup();
    let started = svc.start_session(round_a(), 0).await.unwrap();
    let key = started.session.questions()[0].question.key().clone();

    svc.set_checked(&key, true).await.unwrap();
    svc.save_explanation(key.clone(), "remember, this")
        .await
        .unwrap();

    let view = svc.question_view(&started.session).await.unwrap().unwrap();
    assert_eq!(view.key, key);
    assert!(view.is_checked);
    assert_eq!(view.note.as_deref(), Some("remember, this"));
    assert_eq!(view.options.len(), 2);
}

#[tokio::test]
async fn app_services_load_bank_from_file() {
    let path = std::env::temp_dir().join(format!("quiz_smoke_{}.json", std::process::id()));
    std::fs::write(&path, BANK).unwrap();

    let app = services::AppServices::from_storage(
        Storage::in_memory(),
        &BankSource::Path(path.clone()),
        None,
    )
    .await
    .unwrap();
    assert_eq!(app.quiz_loop().bank().len(), 6);

    std::fs::remove_file(path).unwrap();
}

/// Delegates to an in-memory store until writes are switched off.
struct FlakyStore {
    inner: InMemoryStore,
    fail_writes: Arc<AtomicBool>,
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Connection("disk unplugged".into()));
        }
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Connection("disk unplugged".into()));
        }
        self.inner.remove(key).await
    }
}

#[tokio::test]
async fn failed_resume_write_is_reported_after_moving() {
    let inner = InMemoryStore::new();
    let fail_writes = Arc::new(AtomicBool::new(false));
    let store = FlakyStore {
        inner: inner.clone(),
        fail_writes: Arc::clone(&fail_writes),
    };
    let bank = Arc::new(parse_bank(BANK.as_bytes()).unwrap());
    let svc = QuizLoopService::new(bank, QuizRecords::new(Arc::new(store)));

    let mut started = svc.start_session(round_a(), 0).await.unwrap();
    svc.select_option(&mut started.session, 1).unwrap();
    fail_writes.store(true, Ordering::SeqCst);

    let err = svc.advance(&mut started.session).await.unwrap_err();
    assert!(matches!(err, SessionError::Storage(StorageError::Connection(_))));
    assert_eq!(started.session.current_index(), 1);

    let saved = QuizRecords::new(Arc::new(inner))
        .last_quiz()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(saved.question_index, 0);

    let err = svc.toggle_checked(&"20240101-1".parse().unwrap()).await.unwrap_err();
    assert!(matches!(err, StorageError::Connection(_)));
}
