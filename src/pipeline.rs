use crate::archive::{self, Target};
use crate::context::Context;
use crate::pods;
use crate::result::Result;
use crate::settings::Settings;
use crate::shell;
use std::path::{Path, PathBuf};

/// What a pipeline run produced
#[derive(Debug, Default)]
pub struct Outcome {
    pub commands_run: usize,
    pub archive: Option<PathBuf>,
}

/// Post-process a build output: pods, then user commands, then the archive.
/// The first failing step aborts the run.
pub fn run(ctx: &Context, settings: &Settings, path: &Path) -> Result<Outcome> {
    let target = Target::resolve(path)?;
    let mut outcome = Outcome::default();
    let shell = settings.shell.as_deref();

    if settings.pods {
        cliclack::log::step("Installing CocoaPods...")?;
        pods::install(ctx, target.path(), settings.pod_wait, shell)?;
    }

    if !settings.commands.is_empty() {
        let working_dir = working_dir(ctx, &target);
        let commands = settings.resolve_commands(target.path(), &target.base_name()?);

        for command in &commands {
            cliclack::log::step(format!("Running: {}", command))?;
            shell::execute(ctx, &working_dir, command, shell)?;
            outcome.commands_run += 1;
        }
    }

    if settings.archive {
        let spinner = cliclack::spinner();
        spinner.start("Creating zip archive...");
        match archive::create(ctx, target.path()) {
            Ok(archive_path) => {
                spinner.stop(format!("Archive created: {}", archive_path.display()));
                outcome.archive = Some(archive_path);
            }
            Err(e) => {
                spinner.error("Failed to create archive");
                return Err(e);
            }
        }
    }

    Ok(outcome)
}

/// Directory targets run commands inside themselves, file targets beside themselves
fn working_dir(ctx: &Context, target: &Target) -> PathBuf {
    match target {
        Target::Directory(dir) => dir.clone(),
        Target::File(file) => match file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => ctx.base_dir.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_nothing_enabled() {
        let tmp = tempdir().unwrap();
        let build = tmp.path().join("build");
        fs::create_dir_all(&build).unwrap();
        let ctx = Context::new(tmp.path().to_path_buf(), false);

        let outcome = run(&ctx, &Settings::default(), &build).unwrap();

        assert_eq!(outcome.commands_run, 0);
        assert!(outcome.archive.is_none());
        assert!(!tmp.path().join("build.zip").exists());
    }

    #[test]
    fn test_missing_target_without_steps() {
        let tmp = tempdir().unwrap();
        let ctx = Context::new(tmp.path().to_path_buf(), false);
        let missing = tmp.path().join("does-not-exist");

        let err = run(&ctx, &Settings::default(), &missing).unwrap_err();

        assert!(matches!(err, Error::NotFound(ref path) if path == &missing));
    }

    #[test]
    fn test_missing_target() {
        let tmp = tempdir().unwrap();
        let ctx = Context::new(tmp.path().to_path_buf(), false);
        let settings = Settings {
            archive: true,
            ..Settings::default()
        };

        let err = run(&ctx, &settings, &tmp.path().join("missing")).unwrap_err();

        assert!(matches!(err, Error::NotFound(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_commands_run_before_archive() {
        let tmp = tempdir().unwrap();
        let build = tmp.path().join("build");
        fs::create_dir_all(&build).unwrap();
        fs::write(build.join("game.bin"), b"payload").unwrap();
        let ctx = Context::new(tmp.path().to_path_buf(), false);
        let settings = Settings {
            archive: true,
            shell: Some("/bin/sh".to_string()),
            commands: vec!["echo $BUILD_NAME > notes.txt".to_string()],
            ..Settings::default()
        };

        let outcome = run(&ctx, &settings, &build).unwrap();

        assert_eq!(outcome.commands_run, 1);
        assert_eq!(
            fs::read_to_string(build.join("notes.txt")).unwrap().trim(),
            "build"
        );

        let archive_path = outcome.archive.unwrap();
        let archive = zip::ZipArchive::new(fs::File::open(archive_path).unwrap()).unwrap();
        let mut names: Vec<&str> = archive.file_names().collect();
        names.sort();
        assert_eq!(names, ["game.bin", "notes.txt"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_command_skips_archive() {
        let tmp = tempdir().unwrap();
        let apk = tmp.path().join("game.apk");
        fs::write(&apk, b"apk").unwrap();
        let ctx = Context::new(tmp.path().to_path_buf(), false);
        let settings = Settings {
            archive: true,
            shell: Some("/bin/sh".to_string()),
            commands: vec!["exit 2".to_string()],
            ..Settings::default()
        };

        let err = run(&ctx, &settings, &apk).unwrap_err();

        assert!(matches!(err, Error::CommandFailed(_)));
        assert!(!tmp.path().join("game.apk.zip").exists());
    }

    #[test]
    fn test_working_dir() {
        let ctx = Context::new(PathBuf::from("/work"), false);

        assert_eq!(
            working_dir(&ctx, &Target::File(PathBuf::from("/out/game.apk"))),
            PathBuf::from("/out")
        );
        assert_eq!(
            working_dir(&ctx, &Target::File(PathBuf::from("game.apk"))),
            PathBuf::from("/work")
        );
        assert_eq!(
            working_dir(&ctx, &Target::Directory(PathBuf::from("/out/ios"))),
            PathBuf::from("/out/ios")
        );
    }
}
