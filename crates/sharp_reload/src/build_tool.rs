//! External build tool invocation

use crate::settings::BuildSettings;
use std::process::Command;

/// Actions the build tool understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildAction {
    /// Compile the managed project
    Build,
    /// Post-process the compiled output
    Weave,
}

impl std::fmt::Display for BuildAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildAction::Build => write!(f, "Build"),
            BuildAction::Weave => write!(f, "Weave"),
        }
    }
}

/// Runs a build action to completion and reports success
pub trait BuildTool: Send + Sync {
    fn invoke(&self, action: BuildAction) -> bool;
}

/// Build tool backed by an external process
///
/// Blocks the calling thread until the process exits.
#[derive(Debug, Clone)]
pub struct ProcessBuildTool {
    settings: BuildSettings,
}

impl ProcessBuildTool {
    pub fn new(settings: BuildSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &BuildSettings {
        &self.settings
    }

    fn command(&self, action: BuildAction) -> Command {
        let args = match action {
            BuildAction::Build => &self.settings.build_args,
            BuildAction::Weave => &self.settings.weave_args,
        };

        let mut command = Command::new(&self.settings.program);
        command.args(args);
        if let Some(dir) = &self.settings.working_dir {
            command.current_dir(dir);
        }
        command
    }
}

impl BuildTool for ProcessBuildTool {
    fn invoke(&self, action: BuildAction) -> bool {
        log::info!("Running {} ({})", action, self.settings.program);

        let output = match self.command(action).output() {
            Ok(output) => output,
            Err(e) => {
                log::error!("Failed to start build tool '{}': {}", self.settings.program, e);
                return false;
            }
        };

        if output.status.success() {
            log::debug!("{} succeeded", action);
            return true;
        }

        log::error!("{} failed with {}", action, output.status);
        for line in String::from_utf8_lossy(&output.stdout)
            .lines()
            .chain(String::from_utf8_lossy(&output.stderr).lines())
        {
            log::error!("  {}", line);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_program_fails() {
        let tool = ProcessBuildTool::new(BuildSettings {
            program: "definitely-not-a-real-build-tool".into(),
            ..Default::default()
        });
        assert!(!tool.invoke(BuildAction::Build));
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_status_decides_result() {
        let tool = ProcessBuildTool::new(BuildSettings {
            program: "sh".into(),
            build_args: vec!["-c".into(), "exit 0".into()],
            weave_args: vec!["-c".into(), "echo weave broke >&2; exit 3".into()],
            working_dir: None,
        });

        assert!(tool.invoke(BuildAction::Build));
        assert!(!tool.invoke(BuildAction::Weave));
    }

    #[cfg(unix)]
    #[test]
    fn test_working_dir_is_used() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker"), b"").unwrap();

        let tool = ProcessBuildTool::new(BuildSettings {
            program: "sh".into(),
            build_args: vec!["-c".into(), "test -f marker".into()],
            weave_args: vec![],
            working_dir: Some(dir.path().to_path_buf()),
        });
        assert!(tool.invoke(BuildAction::Build));
    }
}
