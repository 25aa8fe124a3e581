//! Per-invocation step state.
//!
//! Every command keeps its partially answered data in a [`StepState`]. The
//! [`Progress`] half tracks how many leading positions are answered; a step
//! at position `k` is shown only when `counter < k` or its field is still
//! missing, and is re-checked on every pass of the command's loop.

use std::ops::{Deref, DerefMut};

use crate::steps::StepResult;

/// Counter, confirmation request and lifecycle of one command invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Progress {
    /// Number of leading positions treated as answered.
    pub counter: usize,
    /// `Some(false)` asks to skip the confirm step, `Some(true)` forces it.
    pub confirm: Option<bool>,
    ended: bool,
    backed_out: bool,
}

impl Progress {
    pub fn new(counter: usize, confirm: Option<bool>) -> Self {
        Self {
            counter,
            confirm,
            ended: false,
            backed_out: false,
        }
    }

    /// No more steps may be shown once this is false.
    pub fn can_continue(&self) -> bool {
        !self.ended
    }

    /// Whether the step at `position` must be shown.
    pub fn needs(&self, position: usize, answered: bool) -> bool {
        self.counter < position || !answered
    }

    /// Terminate stepping; only execution or returning remains.
    pub fn end(&mut self) {
        tracing::debug!("Ending steps at counter {}", self.counter);
        self.ended = true;
    }

    /// End because the user cancelled.
    pub fn cancel(&mut self) {
        tracing::debug!("Steps cancelled at counter {}", self.counter);
        self.ended = true;
    }

    pub fn advance(&mut self) {
        self.counter += 1;
    }

    /// Undo one answered position after a back directive.
    pub fn back(&mut self) {
        self.counter = self.counter.saturating_sub(1);
    }

    /// Retreat one more position past a step that was answered for the user.
    ///
    /// Retreating from zero means there is nothing left to return to: the
    /// command is left and reports `Break` to its caller.
    pub fn retreat(&mut self) {
        match self.counter.checked_sub(1) {
            Some(counter) => self.counter = counter,
            None => {
                tracing::debug!("Backed out past the first step");
                self.backed_out = true;
                self.ended = true;
            }
        }
    }

    /// Leave the command from its first step. A cancelled command stays
    /// cancelled rather than backing out.
    pub fn back_out(&mut self) {
        if !self.ended {
            tracing::debug!("Backed out of the first step");
            self.backed_out = true;
            self.ended = true;
        }
    }

    pub fn backed_out(&self) -> bool {
        self.backed_out
    }

    /// The command's result once its loop has exited.
    pub fn outcome(&self) -> StepResult<()> {
        if self.backed_out {
            StepResult::Break
        } else {
            StepResult::Value(())
        }
    }
}

/// A command's data together with its [`Progress`].
#[derive(Debug, Clone, Default)]
pub struct StepState<S> {
    pub progress: Progress,
    pub data: S,
}

impl<S> StepState<S> {
    pub fn new(data: S, counter: usize, confirm: Option<bool>) -> Self {
        Self {
            progress: Progress::new(counter, confirm),
            data,
        }
    }
}

impl<S> Deref for StepState<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.data
    }
}

impl<S> DerefMut for StepState<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.data
    }
}

/// Remembers whether a position is answered automatically, because it has
/// exactly one possible answer.
///
/// Set at the top of every pass with [`SkipTracker::begin_pass`], whether or
/// not that pass re-examines the position. When the user backs out of the
/// step that follows, [`SkipTracker::back_past`] retreats the counter through
/// the skipped position as well, so the user is not bounced forward again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipTracker {
    skipped: bool,
}

impl SkipTracker {
    pub fn reset(&mut self) {
        self.skipped = false;
    }

    pub fn mark(&mut self) {
        self.skipped = true;
    }

    pub fn begin_pass(&mut self, single_answer: bool) {
        self.reset();
        if single_answer {
            self.mark();
        }
    }

    pub fn skipped(&self) -> bool {
        self.skipped
    }

    pub fn back_past(&self, progress: &mut Progress) {
        if self.skipped && progress.can_continue() {
            progress.retreat();
        }
    }
}

/// A caller-supplied field that counts toward the initial counter.
pub trait Answered {
    fn is_answered(&self) -> bool;
}

impl<T> Answered for Option<T> {
    fn is_answered(&self) -> bool {
        self.is_some()
    }
}

impl<T> Answered for Vec<T> {
    fn is_answered(&self) -> bool {
        !self.is_empty()
    }
}

impl Answered for String {
    fn is_answered(&self) -> bool {
        !self.is_empty()
    }
}

/// Initial counter derived from caller-supplied partial data.
///
/// ```
/// use gitstep::engine::CounterSeed;
///
/// let repo: Option<&str> = Some("app");
/// let refs: Vec<&str> = Vec::new();
/// let counter = CounterSeed::new().field(&repo).field(&refs).value();
/// assert_eq!(counter, 1);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSeed(usize);

impl CounterSeed {
    pub fn new() -> Self {
        Self(0)
    }

    /// Count one position if the field is answered.
    pub fn field(self, value: &impl Answered) -> Self {
        self.weighted(value, 1)
    }

    /// Count `weight` positions for a field that answers several steps.
    pub fn weighted(self, value: &impl Answered, weight: usize) -> Self {
        if value.is_answered() {
            Self(self.0 + weight)
        } else {
            self
        }
    }

    /// Count one position if `condition` holds.
    pub fn when(self, condition: bool) -> Self {
        if condition {
            Self(self.0 + 1)
        } else {
            self
        }
    }

    pub fn value(self) -> usize {
        self.0
    }
}
