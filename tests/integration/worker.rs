// Background worker and its message channel

use crate::common::fake_tool::FakeTool;
use crate::common::helpers::{Season, touch};
use trackmux::engine::{
    BatchMessage, BatchOptions, BatchOutcome, BatchRunner, BatchWorker, CancelToken,
};

#[test]
fn test_worker_streams_messages_in_order() {
    let season = Season::new();
    season.video("ep01.mkv");
    season.video("ep02.mkv");
    touch(&season.audio, "ep01.mka");
    touch(&season.audio, "ep02.mka");
    touch(&season.subs, "ep01.srt");
    touch(&season.subs, "ep02.srt");

    let runner = BatchRunner::new(FakeTool::new(), season.request(), BatchOptions::default());
    let worker = BatchWorker::spawn(runner);

    let messages: Vec<BatchMessage> = worker.receiver().iter().collect();
    let report = worker.join();

    assert_eq!(report.outcome, BatchOutcome::Completed);
    assert_eq!(messages.last(), Some(&BatchMessage::Finished));

    let progress: Vec<u8> = messages
        .iter()
        .filter_map(|m| match m {
            BatchMessage::Progress { percent } => Some(*percent),
            _ => None,
        })
        .collect();
    assert_eq!(progress, vec![50, 100]);

    assert_eq!(
        messages.first(),
        Some(&BatchMessage::Status {
            text: "Merging: ep01...".to_string()
        })
    );
}

#[test]
fn test_worker_cancel_token_is_shared() {
    let season = Season::new();
    season.video("ep01.mkv");
    season.video("ep02.mkv");

    let token = CancelToken::new();
    let hook_token = token.clone();
    let tool = FakeTool::new().on_run(move |_| hook_token.cancel());
    let invocations = tool.invocations();

    let runner = BatchRunner::new(tool, season.request(), BatchOptions::default())
        .with_cancel_token(token);
    let worker = BatchWorker::spawn(runner);
    let shared = worker.cancel_token();

    let messages: Vec<BatchMessage> = worker.receiver().iter().collect();
    let report = worker.join();

    assert_eq!(report.outcome, BatchOutcome::Stopped);
    assert!(shared.is_cancelled());
    assert_eq!(invocations.lock().unwrap().len(), 1);
    assert!(messages.contains(&BatchMessage::Status {
        text: "Stopped by user.".to_string()
    }));
}

#[test]
fn test_worker_cancel_before_first_video() {
    let season = Season::new();
    season.video("ep01.mkv");

    let tool = FakeTool::new();
    let invocations = tool.invocations();
    let runner = BatchRunner::new(tool, season.request(), BatchOptions::default());
    runner.cancel_token().cancel();

    let worker = BatchWorker::spawn(runner);
    let _: Vec<BatchMessage> = worker.receiver().iter().collect();
    let report = worker.join();

    assert_eq!(report.outcome, BatchOutcome::Stopped);
    assert!(invocations.lock().unwrap().is_empty());
}

#[test]
fn test_message_json_shape() {
    let progress = serde_json::to_value(BatchMessage::Progress { percent: 50 }).unwrap();
    assert_eq!(progress, serde_json::json!({"event": "progress", "percent": 50}));

    let status = serde_json::to_value(BatchMessage::Status {
        text: "Merging: ep01...".to_string(),
    })
    .unwrap();
    assert_eq!(status["event"], "status");
    assert_eq!(status["text"], "Merging: ep01...");

    let finished = serde_json::to_string(&BatchMessage::Finished).unwrap();
    assert_eq!(finished, r#"{"event":"finished"}"#);
}
