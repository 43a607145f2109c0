//! Hot-reload coordinator
//!
//! Turns source changes into a strictly ordered reload:
//! build, weave, unload the user assembly, load it again, reinstance.
//!
//! File events only update the session under its lock; the stages run from
//! [`ReloadCoordinator::tick`] (or [`ReloadCoordinator::force_reload`]) on the
//! host thread. While a reload is pending or running, further events are
//! dropped, so at most one reload is ever in flight.

use crate::build_tool::{BuildAction, BuildTool};
use crate::filter::SourceFilter;
use crate::host::{AlwaysFocused, AssemblyHost, FocusSource};
use crate::progress::{LogProgress, ReloadProgress};
use crate::reinstancer::Reinstancer;
use crate::settings::HotReloadSettings;
use crate::state::{AbortReason, ReloadOutcome, ReloadStage, ReloadState};
use crate::watcher::FileChange;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

struct ReloadSession {
    state: ReloadState,
    /// A stage sequence is executing on some thread
    running: bool,
    last_outcome: Option<ReloadOutcome>,
    completed: u64,
}

impl ReloadSession {
    fn new() -> Self {
        Self {
            state: ReloadState::Idle,
            running: false,
            last_outcome: None,
            completed: 0,
        }
    }
}

/// Drives the reload pipeline
pub struct ReloadCoordinator {
    settings: RwLock<HotReloadSettings>,
    filter: SourceFilter,
    build_tool: Arc<dyn BuildTool>,
    host: Arc<dyn AssemblyHost>,
    reinstancer: Arc<dyn Reinstancer>,
    focus: Arc<dyn FocusSource>,
    progress: Arc<dyn ReloadProgress>,
    session: Mutex<ReloadSession>,
}

impl ReloadCoordinator {
    /// Create a coordinator that is always focused and reports to the log
    pub fn new(
        settings: HotReloadSettings,
        build_tool: Arc<dyn BuildTool>,
        host: Arc<dyn AssemblyHost>,
        reinstancer: Arc<dyn Reinstancer>,
    ) -> Self {
        Self {
            filter: SourceFilter::from_settings(&settings),
            settings: RwLock::new(settings),
            build_tool,
            host,
            reinstancer,
            focus: Arc::new(AlwaysFocused),
            progress: Arc::new(LogProgress),
            session: Mutex::new(ReloadSession::new()),
        }
    }

    /// Use a different focus source
    pub fn with_focus(mut self, focus: Arc<dyn FocusSource>) -> Self {
        self.focus = focus;
        self
    }

    /// Use a different progress reporter
    pub fn with_progress(mut self, progress: Arc<dyn ReloadProgress>) -> Self {
        self.progress = progress;
        self
    }

    pub fn settings(&self) -> HotReloadSettings {
        self.settings.read().clone()
    }

    /// Toggle focus gating for changes that arrive from now on
    pub fn set_require_focus(&self, require: bool) {
        self.settings.write().require_focus_for_hot_reload = require;
    }

    pub fn filter(&self) -> &SourceFilter {
        &self.filter
    }

    // ========== Queries ==========

    pub fn state(&self) -> ReloadState {
        self.session.lock().state
    }

    pub fn is_reloading(&self) -> bool {
        self.session.lock().state.is_busy()
    }

    pub fn last_outcome(&self) -> Option<ReloadOutcome> {
        self.session.lock().last_outcome
    }

    /// Number of reloads that ran every stage
    pub fn reload_count(&self) -> u64 {
        self.session.lock().completed
    }

    // ========== Triggers ==========

    /// Handle a batch of file changes; callable from any thread
    ///
    /// Returns `true` if the batch scheduled a reload.
    pub fn on_files_changed(&self, changes: &[FileChange]) -> bool {
        let mut session = self.session.lock();
        if session.state.is_busy() {
            log::trace!("Reload already pending, ignoring {} change(s)", changes.len());
            return false;
        }

        let Some(change) = changes.iter().find(|c| self.filter.is_qualifying(&c.path)) else {
            return false;
        };

        if self.settings.read().require_focus_for_hot_reload {
            log::info!("{:?} changed, reload waits for focus", change.path);
            session.state = ReloadState::PendingFocusGate;
        } else {
            log::info!("{:?} changed, reload scheduled", change.path);
            session.state = ReloadState::Reloading(ReloadStage::Build);
        }
        true
    }

    /// Periodic host tick
    ///
    /// Releases a focus-gated reload once the host has focus, and runs any
    /// scheduled reload to completion on the calling thread.
    pub fn tick(&self) -> Option<ReloadOutcome> {
        {
            let mut session = self.session.lock();
            if session.running {
                return None;
            }
            match session.state {
                ReloadState::PendingFocusGate if self.focus.has_focus() => {
                    session.state = ReloadState::Reloading(ReloadStage::Build);
                }
                ReloadState::Reloading(_) => {}
                _ => return None,
            }
            session.running = true;
        }

        Some(self.run())
    }

    /// Reload now, bypassing focus gating
    ///
    /// Returns `None` if a reload is already running.
    pub fn force_reload(&self) -> Option<ReloadOutcome> {
        {
            let mut session = self.session.lock();
            if session.running {
                log::warn!("Reload already in progress");
                return None;
            }
            session.state = ReloadState::Reloading(ReloadStage::Build);
            session.running = true;
        }

        log::info!("Manual reload requested");
        Some(self.run())
    }

    // ========== Pipeline ==========

    fn run(&self) -> ReloadOutcome {
        self.progress.begin(ReloadStage::COUNT);
        let outcome = self.run_stages();

        // The attempt is resolved here; a change arriving while the outcome
        // is reported starts the next pending reload.
        {
            let mut session = self.session.lock();
            session.state = match outcome {
                ReloadOutcome::Completed => ReloadState::Idle,
                ReloadOutcome::Aborted(reason) => ReloadState::Aborted(reason),
            };
            session.last_outcome = Some(outcome);
            if outcome.is_completed() {
                session.completed += 1;
            }
        }
        self.progress.finish(&outcome);

        let mut session = self.session.lock();
        session.running = false;
        if matches!(session.state, ReloadState::Aborted(_)) {
            session.state = ReloadState::Idle;
        }
        outcome
    }

    fn run_stages(&self) -> ReloadOutcome {
        self.enter(ReloadStage::Build);
        if !self.build_tool.invoke(BuildAction::Build) {
            return ReloadOutcome::Aborted(AbortReason::BuildFailed);
        }

        self.enter(ReloadStage::Weave);
        if !self.build_tool.invoke(BuildAction::Weave) {
            return ReloadOutcome::Aborted(AbortReason::WeaveFailed);
        }

        self.enter(ReloadStage::Unload);
        let name = self.host.user_assembly_name();
        if self.host.is_assembly_loaded(&name) {
            if !self.host.unload_assembly(&name) {
                return ReloadOutcome::Aborted(AbortReason::UnloadFailed);
            }
        } else {
            log::debug!("{} not loaded, nothing to unload", name);
        }

        self.enter(ReloadStage::Load);
        if !self.host.load_user_assembly() {
            log::error!("Failed to load {}; no user assembly until the next reload", name);
            return ReloadOutcome::Aborted(AbortReason::LoadFailed);
        }

        self.enter(ReloadStage::Reinstance);
        self.reinstancer.start_reinstancing();
        ReloadOutcome::Completed
    }

    fn enter(&self, stage: ReloadStage) {
        self.session.lock().state = ReloadState::Reloading(stage);
        self.progress.enter_stage(stage);
    }
}

impl std::fmt::Debug for ReloadCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReloadCoordinator")
            .field("root", &self.filter.root())
            .field("state", &self.state())
            .finish()
    }
}
