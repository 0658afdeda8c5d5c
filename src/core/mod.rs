//! Shell-independent pieces: turning a line into a `CommandSpec`, and the
//! vocabulary for processes the shell has launched.

pub mod command;
pub mod job;
pub mod redirection;
pub mod variable_expansion;
