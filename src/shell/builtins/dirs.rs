use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;

use crate::errors::{Error, Result};
use crate::shell::builtins::{self, parse_args, BuiltinCommand};
use crate::shell::Shell;

#[derive(Debug)]
pub struct Cd;

#[derive(Debug, Deserialize)]
struct CdArgs {
    arg_dir: Option<String>,
}

impl BuiltinCommand for Cd {
    const NAME: &'static str = builtins::CD_NAME;

    const HELP: &'static str = "
cd: change the shell working directory.

Usage:
    cd [<dir>]

Change the current directory to DIR. Without DIR, change to the home
directory. A relative DIR is resolved against the current directory.
";

    fn run<T: AsRef<str>>(_shell: &mut Shell, args: &[T], _stdout: &mut dyn Write) -> Result<()> {
        if args.len() > 1 {
            return Err(Error::builtin_command("cd: too many arguments", 1));
        }
        let args: CdArgs = parse_args(Self::HELP, Self::NAME, args.iter().map(|a| a.as_ref()))?;
        debug!("{:?}", args);

        let cwd = env::current_dir()?;
        let dir = resolve_target(args.arg_dir.as_deref(), &cwd, ::dirs::home_dir())?;
        env::set_current_dir(&dir).map_err(|e| {
            Error::builtin_command(format!("cd: {}: {}", dir.display(), e), 1)
        })?;

        env::set_var("OLDPWD", &cwd);
        env::set_var("PWD", &dir);
        debug!("changed directory to {}", dir.display());
        Ok(())
    }
}

/// Works out where `cd [dir]` should go from `cwd`.
fn resolve_target(dir: Option<&str>, cwd: &Path, home: Option<PathBuf>) -> Result<PathBuf> {
    match dir {
        None => home.ok_or_else(|| Error::builtin_command("cd: HOME not set", 1)),
        Some(dir) if Path::new(dir).is_absolute() => Ok(PathBuf::from(dir)),
        Some(dir) => Ok(cwd.join(dir)),
    }
}
