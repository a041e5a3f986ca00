//! Refresh run state machine.
//!
//! One machine drives one run: `Idle → Requesting`, then per attempt either
//! `Succeeded → Idle` or a failure that goes to `Retrying(n) → Requesting`
//! while attempts remain and to `Failed → Idle` once they are used up.

use chrono::{DateTime, Utc};

/// Refresh state published to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshState {
    #[default]
    Idle,
    Requesting,
    /// Waiting to retry after the given number of failed attempts
    Retrying(u32),
    Failed,
    Succeeded,
}

impl RefreshState {
    /// True while a run is in progress.
    pub fn is_busy(self) -> bool {
        !matches!(self, RefreshState::Idle)
    }
}

/// Snapshot of the orchestrator's progress for observers
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RefreshStatus {
    pub state: RefreshState,
    /// Failed attempts in the current or last run
    pub attempt: u32,
    /// The last run gave up after exhausting its attempts
    pub terminal_failure: bool,
    pub last_error: Option<String>,
    pub last_success: Option<DateTime<Utc>>,
}

/// Attempt counting and transitions for a single run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshMachine {
    state: RefreshState,
    attempt: u32,
    max_attempts: u32,
}

impl RefreshMachine {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            state: RefreshState::Idle,
            attempt: 0,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn state(&self) -> RefreshState {
        self.state
    }

    /// Failed attempts so far in this run
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// True if a new run can be started.
    pub fn can_start(&self) -> bool {
        matches!(self.state, RefreshState::Idle)
    }

    /// Begin a run. Returns false if one is already in progress.
    pub fn start(&mut self) -> bool {
        if !self.can_start() {
            return false;
        }
        self.attempt = 0;
        self.state = RefreshState::Requesting;
        true
    }

    /// Record a failed attempt. Returns the new state.
    pub fn on_failure(&mut self) -> RefreshState {
        self.attempt += 1;
        self.state = if self.attempt < self.max_attempts {
            RefreshState::Retrying(self.attempt)
        } else {
            RefreshState::Failed
        };
        self.state
    }

    /// Record a failure that no retry can fix.
    pub fn on_fatal(&mut self) -> RefreshState {
        self.attempt += 1;
        self.state = RefreshState::Failed;
        self.state
    }

    /// Leave the backoff wait and request again.
    pub fn on_retry(&mut self) -> RefreshState {
        if let RefreshState::Retrying(_) = self.state {
            self.state = RefreshState::Requesting;
        }
        self.state
    }

    pub fn on_success(&mut self) -> RefreshState {
        self.attempt = 0;
        self.state = RefreshState::Succeeded;
        self.state
    }

    /// Close a finished run.
    pub fn finish(&mut self) -> RefreshState {
        if matches!(self.state, RefreshState::Succeeded | RefreshState::Failed) {
            self.state = RefreshState::Idle;
        }
        self.state
    }
}
