use std::io::Write;

use crate::errors::Result;
use crate::shell::builtins::{self, BuiltinCommand};
use crate::shell::Shell;

const EXIT_STATUS: i32 = 0;

#[derive(Debug)]
pub struct Exit;

impl BuiltinCommand for Exit {
    const NAME: &'static str = builtins::EXIT_NAME;

    const HELP: &'static str = "\
exit: exit
    Exit the shell with a status of 0. Background jobs that are still
    running are sent SIGTERM first.";

    fn run<T: AsRef<str>>(shell: &mut Shell, _args: &[T], stdout: &mut dyn Write) -> Result<()> {
        stdout.flush()?;
        shell.exit(Some(EXIT_STATUS));
    }
}
