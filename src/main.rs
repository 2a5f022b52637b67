mod archive;
mod args;
mod context;
mod error;
mod pipeline;
mod platform;
mod pods;
mod result;
mod settings;
mod shell;
mod tpl;

use args::Args;
use context::Context;
use settings::Settings;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> result::Result<()> {
    // Parse command-line arguments
    let Args {
        verbose,
        archive: archive_flag,
        pods: pods_flag,
        no_commands,
        path,
        config,
    } = Args::parse();

    let ctx = Context::current(verbose);

    cliclack::intro("postbuild")?;

    let mut settings = {
        let spinner = cliclack::spinner();
        spinner.start("Loading settings...");
        match Settings::load(&ctx, config.as_deref()) {
            Ok(s) => {
                spinner.stop("Settings loaded");
                s
            }
            Err(e) => {
                spinner.error("Failed to load settings");
                return Err(e);
            }
        }
    };

    // flags only ever enable steps
    settings.archive |= archive_flag;
    settings.pods |= pods_flag;
    if no_commands {
        settings.commands.clear();
    }

    // the target is validated even when no step is enabled
    let outcome = pipeline::run(&ctx, &settings, &path)?;

    if !settings.has_steps() {
        cliclack::outro_cancel("Nothing to do: enable --archive, --pods or add commands")?;
        return Ok(());
    }

    if outcome.commands_run > 0 {
        cliclack::log::info(format!("Commands run: {}", outcome.commands_run))?;
    }

    if let Some(archive_path) = outcome.archive {
        cliclack::log::success(format!("Archive: {}", archive_path.display()))?;
    }

    cliclack::outro("Post-build completed successfully!")?;
    Ok(())
}
