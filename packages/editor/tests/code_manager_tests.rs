//! Write queue behavior: ordering, failure isolation, refresh and cleanup.

mod common;

use common::*;
use onlook_editor::code::get_code_diff_requests;
use onlook_editor::{
    Action, ActionTargetWithSelector, CodeDiff, CodeManager, CodeWriter, EditorError, MoveActionLocation,
    MoveElementAction, NoopAnalytics, PreviewRegistry, ServiceError, StaticTemplateNodeMap, WriteCodeAction,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

struct Harness {
    code: CodeManager,
    sandbox: Arc<FakeSandbox>,
    diffs: Arc<ScriptedDiffService>,
    preview: Arc<FakePreview>,
    analytics: Arc<RecordingAnalytics>,
}

fn harness(diffs: Arc<ScriptedDiffService>) -> Harness {
    let mapper = StaticTemplateNodeMap::new();
    mapper.insert("w1", "#a", node(1));
    mapper.insert("w1", "#b", node(2));
    mapper.insert("w1", "#list", node(3));
    mapper.insert("w1", "#item", node(4));

    let sandbox = FakeSandbox::new();
    let preview = FakePreview::new();
    let previews = Arc::new(PreviewRegistry::new());
    previews.register("w1", preview.clone());
    let analytics = Arc::new(RecordingAnalytics::default());

    let code = CodeManager::new(
        &config(),
        Arc::new(mapper),
        diffs.clone(),
        sandbox.clone(),
        previews,
        analytics.clone(),
    );

    Harness {
        code,
        sandbox,
        diffs,
        preview,
        analytics,
    }
}

fn move_item() -> Action {
    Action::MoveElement(MoveElementAction {
        targets: vec![ActionTargetWithSelector::new("w1", "#item")],
        location: MoveActionLocation {
            target_selector: "#list".to_string(),
            index: 1,
            original_index: 0,
        },
    })
}

#[tokio::test(start_paused = true)]
async fn test_back_to_back_writes_land_in_call_order() {
    let h = harness(ScriptedDiffService::class_names());
    h.diffs.delay("#a", Duration::from_millis(50));

    h.code.write(style("#a", "", "red"));
    h.code.write(style("#b", "", "blue"));
    assert!(h.code.is_executing());

    h.code.flush().await;

    assert_eq!(h.sandbox.written_contents(), vec!["text-[red]", "text-[blue]"]);
    assert!(!h.code.is_executing());
    assert_eq!(h.code.queue_len(), 0);
    assert_eq!(h.analytics.events(), vec!["write code", "write code"]);
}

#[tokio::test(start_paused = true)]
async fn test_failed_write_does_not_block_the_queue() {
    let diffs = ScriptedDiffService::new(|request| {
        if request.selector == "#a" {
            return Err(ServiceError::Other("diff service down".to_string()));
        }
        Ok(Some(CodeDiff {
            path: request.template_node.path.clone(),
            original: String::new(),
            generated: "ok".to_string(),
        }))
    });
    let h = harness(diffs);

    h.code.write(style("#a", "", "red"));
    h.code.write(style("#b", "", "blue"));
    h.code.flush().await;

    assert_eq!(h.sandbox.written_contents(), vec!["ok"]);
    let failures = h.code.take_failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].action, style("#a", "", "red"));
    assert!(failures[0].reason.contains("diff service down"));
    assert!(h.code.take_failures().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_panicking_cycle_is_recorded_and_skipped() {
    let diffs = ScriptedDiffService::new(|request| {
        if request.selector == "#a" {
            panic!("malformed request");
        }
        Ok(Some(CodeDiff {
            path: request.template_node.path.clone(),
            original: String::new(),
            generated: "ok".to_string(),
        }))
    });
    let h = harness(diffs);

    h.code.write(style("#a", "", "red"));
    h.code.write(style("#b", "", "blue"));
    h.code.flush().await;

    assert_eq!(h.sandbox.written_contents(), vec!["ok"]);
    let failures = h.code.take_failures();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].reason.contains("malformed request"));
}

#[tokio::test(start_paused = true)]
async fn test_empty_diff_is_a_failure_without_a_write() {
    let h = harness(ScriptedDiffService::new(|_| Ok(None)));

    h.code.write(style("#a", "", "red"));
    h.code.flush().await;

    assert!(h.sandbox.writes().is_empty());
    let failures = h.code.take_failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].reason, EditorError::EmptyDiff("update-style").to_string());
    assert!(h.analytics.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unresolvable_action_skips_the_diff_service() {
    let h = harness(ScriptedDiffService::class_names());

    h.code.write(style("#gone", "", "red"));
    h.code.flush().await;

    assert!(h.diffs.calls().is_empty());
    assert_eq!(h.code.failure_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_rejected_write_is_recorded() {
    let h = harness(ScriptedDiffService::class_names());
    h.sandbox.reject(PAGE);

    h.code.write(style("#a", "", "red"));
    h.code.flush().await;

    let failures = h.code.take_failures();
    assert_eq!(failures[0].reason, EditorError::WriteRejected(PAGE.to_string()).to_string());
    assert_eq!(h.preview.refreshes(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_write_code_goes_straight_to_the_sandbox() {
    let h = harness(ScriptedDiffService::class_names());

    h.code.write(Action::WriteCode(WriteCodeAction {
        diffs: vec![CodeDiff {
            path: "app/layout.tsx".to_string(),
            original: "before".to_string(),
            generated: "after".to_string(),
        }],
    }));
    h.code.flush().await;

    assert!(h.diffs.calls().is_empty());
    assert_eq!(h.sandbox.file("app/layout.tsx").as_deref(), Some("after"));
}

#[tokio::test(start_paused = true)]
async fn test_previews_refresh_after_the_settle_delay() {
    let h = harness(ScriptedDiffService::class_names());

    h.code.write(style("#a", "", "red"));
    h.code.flush().await;
    assert_eq!(h.preview.refreshes(), 0);

    tokio::time::sleep(Duration::from_millis(350)).await;
    assert_eq!(h.preview.refreshes(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_rapid_moves_share_one_cleanup() {
    let h = harness(ScriptedDiffService::class_names());

    h.code.write(move_item());
    h.code.write(move_item());
    h.code.flush().await;
    assert!(h.sandbox.cleaned().is_empty());

    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(h.sandbox.cleaned(), vec![vec![PAGE.to_string()]]);
}

#[tokio::test(start_paused = true)]
async fn test_dispose_drops_queued_writes_and_cleanup() {
    let h = harness(ScriptedDiffService::class_names());
    h.diffs.delay("#list", Duration::from_millis(50));

    h.code.write(move_item());
    h.code.write(style("#a", "", "red"));
    h.code.write(style("#b", "", "blue"));
    tokio::time::sleep(Duration::from_millis(10)).await;

    h.code.dispose();
    assert!(h.code.is_disposed());
    h.code.write(style("#a", "", "green"));
    assert_eq!(h.code.queue_len(), 0, "writes after dispose are refused");

    h.code.flush().await;
    assert_eq!(h.sandbox.writes().len(), 1, "in-flight move still completes");

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(h.sandbox.cleaned().is_empty());
    assert_eq!(h.preview.refreshes(), 0);
    assert_eq!(h.sandbox.writes().len(), 1);
    assert!(matches!(
        h.code.write_now(&style("#a", "", "green")).await,
        Err(EditorError::Disposed)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_dispose_cancels_pending_refreshes() {
    let h = harness(ScriptedDiffService::class_names());

    h.code.write(style("#a", "", "red"));
    h.code.flush().await;
    h.code.dispose();

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(h.sandbox.writes().len(), 1);
    assert_eq!(h.preview.refreshes(), 0);
}

#[tokio::test]
async fn test_get_code_diffs_fills_missing_originals() {
    let h = harness(ScriptedDiffService::class_names());
    h.sandbox.clone().with_file(PAGE, "<div />");

    let mapper = StaticTemplateNodeMap::new();
    mapper.insert("w1", "#a", node(1));
    let requests = get_code_diff_requests(&mapper, &[style("#a", "", "red")]).await;
    let diffs = h.code.get_code_diffs(&requests).await.unwrap();

    assert_eq!(
        diffs,
        vec![CodeDiff {
            path: PAGE.to_string(),
            original: "<div />".to_string(),
            generated: "text-[red]".to_string(),
        }]
    );
    assert!(h.sandbox.writes().is_empty(), "computing diffs writes nothing");
    assert!(h.code.get_code_diffs(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_write_now_bypasses_the_queue() {
    let mapper = StaticTemplateNodeMap::new();
    mapper.insert("w1", "#a", node(1));
    let sandbox = FakeSandbox::new();
    let code = CodeManager::new(
        &config(),
        Arc::new(mapper),
        ScriptedDiffService::class_names(),
        sandbox.clone(),
        Arc::new(PreviewRegistry::new()),
        Arc::new(NoopAnalytics),
    );

    code.write_now(&style("#a", "", "red")).await.unwrap();

    assert_eq!(sandbox.written_contents(), vec!["text-[red]"]);
    assert!(!code.is_executing());
}
