//! The dry-run / confirm / execute state machine.

use crate::backup::take_backup;
use crate::display::{
    render_abort, render_backup, render_completed, render_failures, render_plan,
    render_rollback, render_rollback_start,
};
use crate::rollback::{RollbackOutcome, rollback_deletion, should_rollback};
use crate::{AbortReason, DeleteContext, DeletePlan, DeleteResult};

use bi_client::PlatformApi;
use bi_core::ResourceKind;

use std::io::Write;

use log::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Planned,
    DryRunDisplay,
    ConfirmationPending,
    /// Confirmation token missing or wrong
    Rejected,
    Executing,
    Completed,
    PartiallyFailed,
}

impl EngineState {
    pub fn can_transition_to(self, next: EngineState) -> bool {
        use EngineState::*;
        matches!(
            (self, next),
            (Planned, DryRunDisplay)
                | (Planned, ConfirmationPending)
                | (ConfirmationPending, Rejected)
                | (ConfirmationPending, Executing)
                | (Executing, Completed)
                | (Executing, PartiallyFailed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            EngineState::DryRunDisplay
                | EngineState::Rejected
                | EngineState::Completed
                | EngineState::PartiallyFailed
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteFailure {
    pub kind: ResourceKind,
    pub id: i64,
    pub message: String,
}

/// What happened to each attempted delete call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    pub succeeded: Vec<(ResourceKind, i64)>,
    pub failed: Vec<DeleteFailure>,
}

impl ExecutionReport {
    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    DryRun,
    ConfirmationRejected,
    Completed(ExecutionReport),
    PartiallyFailed {
        report: ExecutionReport,
        rollback: RollbackOutcome,
    },
}

/// Issue every delete in the plan: dashboards, charts, datasets, databases,
/// ascending ids within a kind. A failure never stops the remaining calls.
pub async fn execute_plan(api: &dyn PlatformApi, plan: &DeletePlan) -> ExecutionReport {
    let mut report = ExecutionReport::default();
    for kind in ResourceKind::DELETE_ORDER {
        for &id in plan.ids(kind) {
            match api.delete_resource(kind, id).await {
                Ok(()) => {
                    debug!("Deleted {kind} {id}");
                    report.succeeded.push((kind, id));
                }
                Err(e) => {
                    error!("Failed to delete {kind} {id}: {e}");
                    report.failed.push(DeleteFailure {
                        kind,
                        id,
                        message: e.to_string(),
                    });
                }
            }
        }
    }
    report
}

/// Report writes after the first delete call never fail the run.
fn write_report<W: Write>(out: &mut W, text: &str) {
    if let Err(e) = out.write_all(text.as_bytes()) {
        warn!("Failed to write report: {e}");
    }
}

pub struct DeleteEngine<'a> {
    api: &'a dyn PlatformApi,
    context: &'a DeleteContext,
    state: EngineState,
}

impl<'a> DeleteEngine<'a> {
    pub fn new(api: &'a dyn PlatformApi, context: &'a DeleteContext) -> Self {
        Self {
            api,
            context,
            state: EngineState::Planned,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    fn transition(&mut self, next: EngineState) -> DeleteResult<()> {
        if !self.state.can_transition_to(next) {
            return Err(AbortReason::illegal_transition(self.state, next));
        }
        debug!("Engine {:?} -> {:?}", self.state, next);
        self.state = next;
        Ok(())
    }

    /// Rollback needs credentials to recreate database connections.
    fn check_rollback_credentials(&self, plan: &DeletePlan) -> DeleteResult<()> {
        let context = self.context;
        if context.execution.rollback
            && context.cascade.databases
            && !plan.databases.ids.is_empty()
            && context.db_passwords.is_empty()
        {
            return Err(AbortReason::credentials_missing());
        }
        Ok(())
    }

    /// Drive `plan` to a terminal state, writing the operator report to `out`.
    pub async fn run<W: Write>(
        &mut self,
        plan: &DeletePlan,
        out: &mut W,
    ) -> DeleteResult<DeleteOutcome> {
        let context = self.context;
        let execution = &context.execution;

        if execution.dry_run {
            self.transition(EngineState::DryRunDisplay)?;
            out.write_all(render_plan(plan, true).as_bytes())?;
            return Ok(DeleteOutcome::DryRun);
        }

        self.transition(EngineState::ConfirmationPending)?;
        if !execution.is_confirmed() {
            self.transition(EngineState::Rejected)?;
            info!("Confirmation token missing or wrong, nothing deleted");
            out.write_all(render_abort().as_bytes())?;
            return Ok(DeleteOutcome::ConfirmationRejected);
        }
        self.check_rollback_credentials(plan)?;

        out.write_all(render_plan(plan, false).as_bytes())?;
        let backup = take_backup(self.api, context, plan).await?;
        out.write_all(render_backup(&backup.path).as_bytes())?;

        self.transition(EngineState::Executing)?;
        let report = execute_plan(self.api, plan).await;
        info!(
            "Deleted {} of {} resources",
            report.succeeded.len(),
            report.attempted()
        );

        if report.failed.is_empty() {
            self.transition(EngineState::Completed)?;
            write_report(out, &render_completed(&report));
            return Ok(DeleteOutcome::Completed(report));
        }

        self.transition(EngineState::PartiallyFailed)?;
        let attempted = should_rollback(execution.rollback, &report);
        let rollback = if attempted {
            rollback_deletion(
                self.api,
                &backup.data,
                &context.db_passwords,
                &plan.scheduled_kinds(),
            )
            .await
        } else {
            RollbackOutcome::NotAttempted
        };

        write_report(out, &render_failures(&report));
        if attempted {
            write_report(out, &render_rollback_start());
        }
        write_report(out, &render_rollback(&rollback, &backup.path));

        Ok(DeleteOutcome::PartiallyFailed { report, rollback })
    }
}
