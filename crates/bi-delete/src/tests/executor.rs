use crate::tests::{confirmed, context_with, full_cascade, sales_filter, two_dashboard_platform};
use crate::{
    AbortReason, CascadeOptions, DeleteEngine, DeleteOutcome, EngineState, ExecutionOptions,
    RollbackOutcome, plan_deletion,
};

use bi_core::ResourceKind;

use std::io::{self, Write};

use tempfile::TempDir;

/// Accepts `remaining` writes, then fails like a closed pipe.
struct ClosingOutput {
    remaining: usize,
}

impl Write for ClosingOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
        }
        self.remaining -= 1;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn backups_in(dir: &TempDir) -> usize {
    std::fs::read_dir(dir.path()).unwrap().count()
}

#[test]
fn test_engine_transitions() {
    use EngineState::*;

    assert!(Planned.can_transition_to(DryRunDisplay));
    assert!(Planned.can_transition_to(ConfirmationPending));
    assert!(ConfirmationPending.can_transition_to(Executing));
    assert!(Executing.can_transition_to(Completed));
    assert!(Executing.can_transition_to(PartiallyFailed));

    assert!(!Planned.can_transition_to(Executing));
    assert!(!DryRunDisplay.can_transition_to(ConfirmationPending));
    assert!(!Completed.can_transition_to(Executing));

    assert!(ConfirmationPending.can_transition_to(Rejected));
    assert!(!Rejected.can_transition_to(Executing));

    assert!(DryRunDisplay.is_terminal());
    assert!(Rejected.is_terminal());
    assert!(!ConfirmationPending.is_terminal());
    assert!(PartiallyFailed.is_terminal());
    assert!(!Executing.is_terminal());
}

#[tokio::test]
async fn given_dry_run_when_running_then_nothing_mutated() {
    let dir = TempDir::new().unwrap();
    let api = two_dashboard_platform();
    let context = context_with(sales_filter(), full_cascade(), dir.path());
    let plan = plan_deletion(&api, &context).await.unwrap().unwrap();
    let mut out = Vec::new();

    let outcome = DeleteEngine::new(&api, &context)
        .run(&plan, &mut out)
        .await
        .unwrap();

    assert_eq!(outcome, DeleteOutcome::DryRun);
    assert!(api.deletes().is_empty());
    assert_eq!(api.imports(), 0);
    assert_eq!(backups_in(&dir), 0);
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("No changes will be made."));
    assert!(text.contains("--dry-run=false --confirm=DELETE"));
}

#[tokio::test]
async fn given_wrong_confirm_token_when_running_then_aborted_without_deletes() {
    for token in [None, Some("delete"), Some("yes")] {
        let dir = TempDir::new().unwrap();
        let api = two_dashboard_platform();
        let mut context = context_with(sales_filter(), CascadeOptions::default(), dir.path());
        context.execution = ExecutionOptions {
            dry_run: false,
            confirm: token.map(String::from),
            rollback: true,
        };
        let plan = plan_deletion(&api, &context).await.unwrap().unwrap();
        let mut out = Vec::new();
        let mut engine = DeleteEngine::new(&api, &context);

        let outcome = engine.run(&plan, &mut out).await.unwrap();

        assert_eq!(outcome, DeleteOutcome::ConfirmationRejected);
        assert_eq!(engine.state(), EngineState::Rejected);
        assert!(engine.state().is_terminal());
        assert!(api.deletes().is_empty());
        assert_eq!(backups_in(&dir), 0);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Deletion aborted. Pass --confirm=DELETE to proceed with deletion.\n"
        );
    }
}

#[tokio::test]
async fn given_full_cascade_when_confirmed_then_deleted_in_dependency_order() {
    let dir = TempDir::new().unwrap();
    let api = two_dashboard_platform();
    let mut context = context_with(sales_filter(), full_cascade(), dir.path());
    context.execution = confirmed(true);
    context.db_passwords = [(String::from("db-1"), String::from("pw"))]
        .into_iter()
        .collect();
    let plan = plan_deletion(&api, &context).await.unwrap().unwrap();
    let mut out = Vec::new();
    let mut engine = DeleteEngine::new(&api, &context);

    let outcome = engine.run(&plan, &mut out).await.unwrap();

    assert_eq!(
        api.deletes(),
        vec![
            (ResourceKind::Dashboard, 1),
            (ResourceKind::Chart, 11),
            (ResourceKind::Chart, 12),
            (ResourceKind::Dataset, 21),
            (ResourceKind::Database, 31),
        ]
    );
    assert!(matches!(outcome, DeleteOutcome::Completed(ref report) if report.failed.is_empty()));
    assert_eq!(engine.state(), EngineState::Completed);
    assert_eq!(backups_in(&dir), 1);
    assert_eq!(api.ids(ResourceKind::Dashboard), vec![2]);
    assert_eq!(api.ids(ResourceKind::Chart), vec![13]);

    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("Assets to be deleted:"));
    assert!(text.contains("Backup saved to: "));
    assert!(text.contains("--asset-type dashboard"));
}

#[tokio::test]
async fn given_shared_chart_when_confirmed_then_only_dashboard_deleted() {
    let dir = TempDir::new().unwrap();
    let api = two_dashboard_platform()
        .with(
            ResourceKind::Dashboard,
            serde_json::json!({"id": 3, "dashboard_title": "Exec"}),
        )
        .with_dashboard_files(3, &[("charts/Revenue_11.yaml", crate::tests::REVENUE_CHART)]);
    let cascade = CascadeOptions {
        charts: true,
        datasets: true,
        databases: true,
        skip_shared_check: false,
    };
    let mut context = context_with(sales_filter(), cascade, dir.path());
    context.execution = confirmed(true);
    let plan = plan_deletion(&api, &context).await.unwrap().unwrap();

    DeleteEngine::new(&api, &context)
        .run(&plan, &mut Vec::new())
        .await
        .unwrap();

    // Margin (12) is only used by Sales; Revenue and its dataset stay.
    assert_eq!(
        api.deletes(),
        vec![(ResourceKind::Dashboard, 1), (ResourceKind::Chart, 12)]
    );
}

#[tokio::test]
async fn given_one_chart_delete_fails_when_confirmed_then_rest_continue_and_rollback_runs() {
    let dir = TempDir::new().unwrap();
    let api = two_dashboard_platform().failing_delete(ResourceKind::Chart, 12);
    let cascade = CascadeOptions {
        charts: true,
        ..CascadeOptions::default()
    };
    let mut context = context_with(sales_filter(), cascade, dir.path());
    context.execution = confirmed(true);
    let plan = plan_deletion(&api, &context).await.unwrap().unwrap();
    let mut out = Vec::new();
    let mut engine = DeleteEngine::new(&api, &context);

    let outcome = engine.run(&plan, &mut out).await.unwrap();

    assert_eq!(
        api.deletes(),
        vec![
            (ResourceKind::Dashboard, 1),
            (ResourceKind::Chart, 11),
            (ResourceKind::Chart, 12),
        ]
    );
    match outcome {
        DeleteOutcome::PartiallyFailed { report, rollback } => {
            assert_eq!(report.succeeded.len(), 2);
            assert_eq!(report.failed.len(), 1);
            assert_eq!(report.failed[0].id, 12);
            assert!(matches!(rollback, RollbackOutcome::Succeeded { .. }));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(engine.state(), EngineState::PartiallyFailed);
    assert_eq!(api.imports(), 1);

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Some deletions failed:"));
    assert!(text.contains("chart:12"));
    assert!(text.contains("Best-effort rollback attempted"));
    assert!(text.contains("Rollback succeeded."));
}

#[tokio::test]
async fn given_output_closes_after_backup_when_partially_failed_then_rollback_still_runs() {
    let dir = TempDir::new().unwrap();
    let api = two_dashboard_platform().failing_delete(ResourceKind::Chart, 12);
    let cascade = CascadeOptions {
        charts: true,
        ..CascadeOptions::default()
    };
    let mut context = context_with(sales_filter(), cascade, dir.path());
    context.execution = confirmed(true);
    let plan = plan_deletion(&api, &context).await.unwrap().unwrap();
    // Plan and backup notice get through, everything after fails.
    let mut out = ClosingOutput { remaining: 2 };
    let mut engine = DeleteEngine::new(&api, &context);

    let outcome = engine.run(&plan, &mut out).await.unwrap();

    assert!(matches!(
        outcome,
        DeleteOutcome::PartiallyFailed {
            rollback: RollbackOutcome::Succeeded { .. },
            ..
        }
    ));
    assert_eq!(engine.state(), EngineState::PartiallyFailed);
    assert_eq!(api.imports(), 1);
}

#[tokio::test]
async fn given_output_closes_after_backup_when_all_deleted_then_completed() {
    let dir = TempDir::new().unwrap();
    let api = two_dashboard_platform();
    let mut context = context_with(sales_filter(), CascadeOptions::default(), dir.path());
    context.execution = confirmed(true);
    let plan = plan_deletion(&api, &context).await.unwrap().unwrap();

    let outcome = DeleteEngine::new(&api, &context)
        .run(&plan, &mut ClosingOutput { remaining: 2 })
        .await
        .unwrap();

    assert!(matches!(outcome, DeleteOutcome::Completed(_)));
    assert_eq!(api.deletes(), vec![(ResourceKind::Dashboard, 1)]);
}

#[tokio::test]
async fn given_rollback_disabled_when_partially_failed_then_no_import() {
    let dir = TempDir::new().unwrap();
    let api = two_dashboard_platform().failing_delete(ResourceKind::Chart, 12);
    let cascade = CascadeOptions {
        charts: true,
        ..CascadeOptions::default()
    };
    let mut context = context_with(sales_filter(), cascade, dir.path());
    context.execution = confirmed(false);
    let plan = plan_deletion(&api, &context).await.unwrap().unwrap();

    let outcome = DeleteEngine::new(&api, &context)
        .run(&plan, &mut Vec::new())
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        DeleteOutcome::PartiallyFailed {
            rollback: RollbackOutcome::NotAttempted,
            ..
        }
    ));
    assert_eq!(api.imports(), 0);
}

#[tokio::test]
async fn given_every_delete_fails_when_confirmed_then_rollback_not_attempted() {
    let dir = TempDir::new().unwrap();
    let api = two_dashboard_platform().failing_delete(ResourceKind::Dashboard, 1);
    let mut context = context_with(sales_filter(), CascadeOptions::default(), dir.path());
    context.execution = confirmed(true);
    let plan = plan_deletion(&api, &context).await.unwrap().unwrap();

    let outcome = DeleteEngine::new(&api, &context)
        .run(&plan, &mut Vec::new())
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        DeleteOutcome::PartiallyFailed {
            rollback: RollbackOutcome::NotAttempted,
            ..
        }
    ));
    assert_eq!(api.imports(), 0);
}

#[tokio::test]
async fn given_database_cascade_without_password_when_confirmed_then_refused() {
    let dir = TempDir::new().unwrap();
    let api = two_dashboard_platform();
    let mut context = context_with(sales_filter(), full_cascade(), dir.path());
    context.execution = confirmed(true);
    let plan = plan_deletion(&api, &context).await.unwrap().unwrap();

    let err = DeleteEngine::new(&api, &context)
        .run(&plan, &mut Vec::new())
        .await
        .unwrap_err();

    assert!(matches!(err, AbortReason::CredentialsMissing { .. }));
    assert!(api.deletes().is_empty());
    assert_eq!(backups_in(&dir), 0);
}

#[tokio::test]
async fn given_database_cascade_without_password_and_no_rollback_when_confirmed_then_runs() {
    let dir = TempDir::new().unwrap();
    let api = two_dashboard_platform();
    let mut context = context_with(sales_filter(), full_cascade(), dir.path());
    context.execution = confirmed(false);
    let plan = plan_deletion(&api, &context).await.unwrap().unwrap();

    let outcome = DeleteEngine::new(&api, &context)
        .run(&plan, &mut Vec::new())
        .await
        .unwrap();

    assert!(matches!(outcome, DeleteOutcome::Completed(_)));
    assert_eq!(api.deletes().len(), 5);
}

#[tokio::test]
async fn given_finished_engine_when_run_again_then_illegal_transition() {
    let dir = TempDir::new().unwrap();
    let api = two_dashboard_platform();
    let context = context_with(sales_filter(), CascadeOptions::default(), dir.path());
    let plan = plan_deletion(&api, &context).await.unwrap().unwrap();
    let mut engine = DeleteEngine::new(&api, &context);
    engine.run(&plan, &mut Vec::new()).await.unwrap();

    let err = engine.run(&plan, &mut Vec::new()).await.unwrap_err();

    assert!(matches!(err, AbortReason::IllegalTransition { .. }));
}
