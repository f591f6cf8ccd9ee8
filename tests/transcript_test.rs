use bankr::job::{Job, JobStatus};
use bankr::transcript::sqlite::SqliteTranscript;
use bankr::transcript::{Role, Transcript, TranscriptEntry};

#[tokio::test]
async fn append_and_read_back() {
    let transcript = SqliteTranscript::in_memory().unwrap();

    transcript
        .append(TranscriptEntry::user("swap 10 USDC to ETH"))
        .await
        .unwrap();
    let job = Job::new("job_1", "completed").with_result("Swapped.");
    transcript
        .append(TranscriptEntry::assistant("Swapped.", Some(&job)))
        .await
        .unwrap();

    let entries = transcript.recent(10).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].role, Role::User);
    assert_eq!(entries[0].content, "swap 10 USDC to ETH");
    assert!(entries[0].job_id.is_none());
    assert_eq!(entries[1].role, Role::Assistant);
    assert_eq!(entries[1].job_id.as_deref(), Some("job_1"));
    assert_eq!(entries[1].status, Some(JobStatus::Completed));
    assert!(!entries[1].timestamp.is_empty());
}

#[tokio::test]
async fn recent_keeps_the_newest_in_order() {
    let transcript = SqliteTranscript::in_memory().unwrap();
    for i in 0..5 {
        transcript
            .append(TranscriptEntry::user(format!("prompt {i}")))
            .await
            .unwrap();
    }

    let entries = transcript.recent(3).await.unwrap();
    let contents: Vec<_> = entries.iter().map(|e| e.content.as_str()).collect();
    assert_eq!(contents, ["prompt 2", "prompt 3", "prompt 4"]);
}

#[tokio::test]
async fn unknown_status_survives_storage() {
    let transcript = SqliteTranscript::in_memory().unwrap();
    let job = Job::new("job_1", "queued");
    transcript
        .append(TranscriptEntry::assistant("still queued", Some(&job)))
        .await
        .unwrap();

    let entries = transcript.recent(1).await.unwrap();
    assert_eq!(entries[0].status, Some(JobStatus::Other("queued".to_string())));
}

#[tokio::test]
async fn clear_empties_history() {
    let transcript = SqliteTranscript::in_memory().unwrap();
    transcript
        .append(TranscriptEntry::user("hello"))
        .await
        .unwrap();

    transcript.clear().await.unwrap();

    assert!(transcript.recent(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bankr.db");
    let path = path.to_str().unwrap();

    {
        let transcript = SqliteTranscript::new(path).unwrap();
        transcript
            .append(TranscriptEntry::user("remember me"))
            .await
            .unwrap();
    }

    let transcript = SqliteTranscript::new(path).unwrap();
    let entries = transcript.recent(10).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].content, "remember me");
}
