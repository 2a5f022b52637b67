use crate::context::Context;
use crate::error::Error;
use crate::platform::Platform;
use crate::result::Result;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

const LOG_PREFIX: &str = "[shell]";
const SHELL_ENCODING: &str = "en_US.UTF-8";

/// Run `command` through the platform shell inside `working_dir`.
///
/// Stdout lines are logged as info and stderr lines as warnings while the
/// process runs. Returns the exit code, `-1` when the process was killed by a
/// signal. `shell` overrides the platform's shell program.
pub fn run(ctx: &Context, working_dir: &Path, command: &str, shell: Option<&str>) -> Result<i32> {
    let (default_shell, shell_args) = Platform::current().shell();
    let program = shell.unwrap_or(default_shell);

    if ctx.verbose {
        cliclack::log::step(format!(
            "Executing in {}: {} {} \"{}\"",
            working_dir.display(),
            program,
            shell_args.join(" "),
            command
        ))?;
    }

    let mut cmd = Command::new(program);
    cmd.args(shell_args)
        .arg(command)
        .current_dir(working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    if cfg!(unix) {
        cmd.env("LANG", SHELL_ENCODING).env("LC_ALL", SHELL_ENCODING);
    }

    let mut child = cmd.spawn().map_err(|e| Error::io(program, e))?;

    // stderr drains on its own thread so a chatty stream cannot block the other
    let stderr = child
        .stderr
        .take()
        .map(|stderr| thread::spawn(move || stream_lines(stderr, true)));

    let stdout_result = match child.stdout.take() {
        Some(stdout) => stream_lines(stdout, false),
        None => Ok(()),
    };

    let stderr_result = match stderr {
        Some(handle) => handle
            .join()
            .map_err(|_| Error::custom(format!("stderr reader for `{}` panicked", command)))?,
        None => Ok(()),
    };

    // both pipes are at EOF here, so the child is reaped before any error surfaces
    let status = child.wait().map_err(|e| Error::io(program, e))?;
    stdout_result.map_err(|e| Error::io(program, e))?;
    stderr_result.map_err(|e| Error::io(program, e))?;

    Ok(status.code().unwrap_or(-1))
}

/// Run `command` and fail unless it exits with code 0
pub fn execute(ctx: &Context, working_dir: &Path, command: &str, shell: Option<&str>) -> Result<()> {
    let code = run(ctx, working_dir, command, shell)?;

    if code != 0 {
        return Err(Error::CommandFailed(format!(
            "{} failed with exit code: {}",
            command, code
        )));
    }

    Ok(())
}

/// Log every line until EOF. Output is decoded lossily; the pipe is always
/// drained so the child never sees a closed pipe. The first terminal write
/// error is returned once draining finishes.
fn stream_lines<R: Read>(reader: R, is_stderr: bool) -> io::Result<()> {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut log_result = Ok(());

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }

        let line = decode_line(&buf);
        if line.trim().is_empty() {
            continue;
        }

        let logged = if is_stderr {
            cliclack::log::warning(format!("{} {}", LOG_PREFIX, line))
        } else {
            cliclack::log::info(format!("{} {}", LOG_PREFIX, line))
        };
        if log_result.is_ok() {
            log_result = logged;
        }
    }

    log_result
}

fn decode_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches(['\r', '\n'])
        .to_string()
}
