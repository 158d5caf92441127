//! Runs the stage table from a checkpoint cursor
//!
//! Stages move strictly forward through Pending, Running and then Completed
//! or Aborted. The first failure aborts the run; nothing is retried or rolled
//! back, and the caller resumes by passing the failed stage's index as the
//! cursor of the next run.

use std::fmt::{self, Display};

use itertools::Itertools;
use tracing::{error, info};

use crate::{
    errors::{ScriptError, StageFailure},
    stages::{StageContext, StageId, StageOutcome},
    types::Idempotence,
};

/// The lifecycle state of a stage within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageState {
    /// Not yet reached, or skipped by the cursor
    Pending,
    /// Currently executing
    Running,
    /// Every operation of the stage succeeded
    Completed,
    /// An operation of the stage failed
    Aborted,
}

impl Display for StageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageState::Pending => write!(f, "pending"),
            StageState::Running => write!(f, "running"),
            StageState::Completed => write!(f, "completed"),
            StageState::Aborted => write!(f, "aborted"),
        }
    }
}

/// The state a stage finished the run in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    /// The stage
    pub stage: StageId,
    /// The state the stage ended the run in
    pub state: StageState,
    /// The outcome of the stage, if it completed
    pub outcome: Option<StageOutcome>,
}

/// The result of a run of the stage table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    /// The cursor the run started from
    pub start_from: usize,
    /// The highest-indexed stage known to have completed, counting the stages
    /// skipped by the cursor
    pub last_completed_stage: Option<usize>,
    /// The final state of every stage in the table
    pub stages: Vec<StageReport>,
    /// The failure that aborted the run, if any
    pub failure: Option<StageFailure>,
}

impl RunResult {
    /// Whether every stage from the cursor onward completed
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// The cursor to pass to the next run, if this one aborted
    pub fn resume_cursor(&self) -> Option<usize> {
        self.failure.as_ref().map(|f| f.index)
    }

    /// Convert into a `Result`, discarding the per-stage reports
    pub fn into_result(self) -> Result<Option<usize>, StageFailure> {
        match self.failure {
            Some(failure) => Err(failure),
            None => Ok(self.last_completed_stage),
        }
    }
}

/// Executes an ordered stage table
#[derive(Debug, Clone)]
pub struct Orchestrator {
    /// The stages, in execution order
    stages: Vec<StageId>,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::bootstrap()
    }
}

impl Orchestrator {
    /// The orchestrator of the full bootstrap table
    pub fn bootstrap() -> Self {
        Self {
            stages: StageId::ALL.to_vec(),
        }
    }

    /// The stage table
    pub fn stages(&self) -> &[StageId] {
        &self.stages
    }

    /// A printable rendering of the stage table
    pub fn describe(&self) -> String {
        self.stages
            .iter()
            .enumerate()
            .map(|(i, stage)| format!("{:>3}  {:<22} {}", i, stage.label(), stage.idempotence()))
            .join("\n")
    }

    /// Check that a run can start from `cursor`. A cursor equal to the table
    /// length is valid and runs nothing.
    pub fn check_cursor(&self, cursor: usize) -> Result<(), ScriptError> {
        if cursor > self.stages.len() {
            return Err(ScriptError::InvalidCheckpoint {
                cursor,
                num_stages: self.stages.len(),
            });
        }
        Ok(())
    }

    /// Run every stage with an index of at least `cursor`, in order, stopping
    /// at the first failure.
    ///
    /// An out-of-range cursor is rejected before any remote call is made.
    pub async fn run(&self, cursor: usize, ctx: &StageContext) -> Result<RunResult, ScriptError> {
        self.check_cursor(cursor)?;

        let mut reports: Vec<StageReport> = self
            .stages
            .iter()
            .map(|stage| StageReport {
                stage: *stage,
                state: StageState::Pending,
                outcome: None,
            })
            .collect();
        let mut last_completed_stage = cursor.checked_sub(1);
        let mut failure = None;

        if cursor > 0 {
            info!(cursor, "skipping stages before the cursor");
        }

        for (index, stage) in self.stages.iter().enumerate().skip(cursor) {
            reports[index].state = StageState::Running;
            info!(
                index,
                stage = stage.label(),
                class = %stage.idempotence(),
                state = %reports[index].state,
                "stage started"
            );

            match stage.execute(ctx).await {
                Ok(outcome) => {
                    reports[index].state = StageState::Completed;
                    reports[index].outcome = Some(outcome);
                    last_completed_stage = Some(index);
                    info!(index, stage = stage.label(), %outcome, "stage completed");
                }
                Err(cause) => {
                    reports[index].state = StageState::Aborted;
                    error!(
                        index,
                        stage = stage.label(),
                        component = %cause.component,
                        operation = cause.operation,
                        error = %cause.error,
                        "stage aborted"
                    );
                    if stage.idempotence() == Idempotence::Unsafe {
                        error!(
                            stage = stage.label(),
                            "some operations of this stage may have landed, check remote state \
                             before resuming from it"
                        );
                    }

                    failure = Some(StageFailure {
                        index,
                        label: stage.label(),
                        cause,
                    });
                    break;
                }
            }
        }

        Ok(RunResult {
            start_from: cursor,
            last_completed_stage,
            stages: reports,
            failure,
        })
    }
}
