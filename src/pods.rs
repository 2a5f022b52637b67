use crate::context::Context;
use crate::error::Error;
use crate::platform::Platform;
use crate::result::Result;
use crate::shell;
use std::path::Path;
use std::thread;
use std::time::Duration;

const INIT_COMMAND: &str = "pod init";
const INSTALL_COMMAND: &str = "pod install";
const PODFILE: &str = "Podfile";

/// Install CocoaPods dependencies into an exported Xcode project.
///
/// Only meaningful on macOS; elsewhere the step is skipped with a warning.
pub fn install(ctx: &Context, project_dir: &Path, wait: Duration, shell: Option<&str>) -> Result<()> {
    if Platform::current() != Platform::MacOS {
        cliclack::log::warning(format!(
            "Skipping CocoaPods installation: not available on {}",
            Platform::current()
        ))?;
        return Ok(());
    }

    run_steps(ctx, project_dir, wait, shell)
}

fn run_steps(ctx: &Context, project_dir: &Path, wait: Duration, shell: Option<&str>) -> Result<()> {
    if !project_dir.exists() {
        return Err(Error::NotFound(project_dir.to_path_buf()));
    }
    if !project_dir.is_dir() {
        return Err(Error::custom(format!(
            "CocoaPods needs an Xcode project directory, {} is not a directory",
            project_dir.display()
        )));
    }

    if project_dir.join(PODFILE).exists() {
        cliclack::log::info(format!("{} already present, skipping `{}`", PODFILE, INIT_COMMAND))?;
    } else {
        run_pod_command(ctx, project_dir, INIT_COMMAND, shell)?;
        // pod init returns before the Podfile is fully flushed
        thread::sleep(wait);
    }

    run_pod_command(ctx, project_dir, INSTALL_COMMAND, shell)
}

fn run_pod_command(ctx: &Context, project_dir: &Path, command: &str, shell: Option<&str>) -> Result<()> {
    cliclack::log::step(format!("[pods] {}", command))?;

    let code = shell::run(ctx, project_dir, command, shell)?;
    if code != 0 {
        return Err(Error::CommandFailed(format!(
            "{} failed in {} (exit code {})",
            command,
            project_dir.display(),
            code
        )));
    }

    Ok(())
}
