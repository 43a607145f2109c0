//! Reload state machine types

use std::fmt;

/// One stage of a reload, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReloadStage {
    Build,
    Weave,
    Unload,
    Load,
    Reinstance,
}

impl ReloadStage {
    /// All stages in the order they run
    pub const ALL: [ReloadStage; 5] = [
        ReloadStage::Build,
        ReloadStage::Weave,
        ReloadStage::Unload,
        ReloadStage::Load,
        ReloadStage::Reinstance,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Progress label shown while the stage runs
    pub fn label(&self) -> &'static str {
        match self {
            ReloadStage::Build => "Building C# Project...",
            ReloadStage::Weave => "Weaving C# Assembly...",
            ReloadStage::Unload => "Unloading Assembly...",
            ReloadStage::Load => "Loading C# Assembly...",
            ReloadStage::Reinstance => "Reinstancing...",
        }
    }
}

impl fmt::Display for ReloadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Why a reload stopped early
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbortReason {
    BuildFailed,
    WeaveFailed,
    UnloadFailed,
    LoadFailed,
}

impl AbortReason {
    /// Stage that produced this failure
    pub fn stage(&self) -> ReloadStage {
        match self {
            AbortReason::BuildFailed => ReloadStage::Build,
            AbortReason::WeaveFailed => ReloadStage::Weave,
            AbortReason::UnloadFailed => ReloadStage::Unload,
            AbortReason::LoadFailed => ReloadStage::Load,
        }
    }
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::BuildFailed => write!(f, "build failed"),
            AbortReason::WeaveFailed => write!(f, "weave failed"),
            AbortReason::UnloadFailed => write!(f, "unload failed"),
            AbortReason::LoadFailed => write!(f, "load failed"),
        }
    }
}

/// Observable state of the reload coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadState {
    /// Nothing pending
    Idle,
    /// A qualifying change arrived; waiting for host focus
    PendingFocusGate,
    /// A reload is queued or running; the stage is the current or next one
    Reloading(ReloadStage),
    /// A stage failed; only visible while the outcome is being reported
    Aborted(AbortReason),
}

impl ReloadState {
    /// Whether new file events are currently ignored
    pub fn is_busy(&self) -> bool {
        matches!(self, ReloadState::PendingFocusGate | ReloadState::Reloading(_))
    }
}

/// Result of one reload attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    Completed,
    Aborted(AbortReason),
}

impl ReloadOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, ReloadOutcome::Completed)
    }
}

impl fmt::Display for ReloadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReloadOutcome::Completed => write!(f, "completed"),
            ReloadOutcome::Aborted(reason) => write!(f, "aborted ({})", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abort_reason_stage() {
        assert_eq!(AbortReason::BuildFailed.stage(), ReloadStage::Build);
        assert_eq!(AbortReason::LoadFailed.stage(), ReloadStage::Load);
    }

    #[test]
    fn test_busy_states() {
        assert!(!ReloadState::Idle.is_busy());
        assert!(ReloadState::PendingFocusGate.is_busy());
        assert!(ReloadState::Reloading(ReloadStage::Weave).is_busy());
        assert!(!ReloadState::Aborted(AbortReason::WeaveFailed).is_busy());
    }
}
