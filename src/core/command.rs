use crate::core::redirection::{self, Redirects};
use crate::core::variable_expansion;
use crate::errors::{Error, Result};

const BACKGROUND_MARKER: &str = "&";
const COMMENT_MARKER: char = '#';

/// Splits a line on whitespace. Never yields empty tokens.
pub fn tokenize(line: &str) -> Vec<String> {
    line.split_whitespace().map(String::from).collect()
}

/// A fully parsed command, ready to dispatch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandSpec {
    argv: Vec<String>,
    background: bool,
    redirects: Redirects,
}

impl CommandSpec {
    /// Parses one input line.
    ///
    /// Returns `Ok(None)` for blank and comment lines. A trailing `&` is
    /// always stripped but only makes the command a background command when
    /// `allow_background` is set. Every `$$` outside the program name becomes
    /// `pid`.
    pub fn parse(line: &str, pid: u32, allow_background: bool) -> Result<Option<Self>> {
        let mut words = tokenize(line);
        match words.first() {
            None => return Ok(None),
            Some(first) if first.starts_with(COMMENT_MARKER) => return Ok(None),
            _ => (),
        }

        let background_requested = words.last().map(String::as_str) == Some(BACKGROUND_MARKER);
        if background_requested {
            words.pop();
        }

        let mut argv = variable_expansion::expand_variables(&words, pid);
        let redirects = redirection::extract_redirects(&mut argv)?;
        if argv.is_empty() {
            return Err(Error::syntax(format!("missing command in '{}'", line.trim())));
        }

        Ok(Some(Self {
            argv,
            background: background_requested && allow_background,
            redirects,
        }))
    }

    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn is_background(&self) -> bool {
        self.background
    }

    pub fn redirects(&self) -> &Redirects {
        &self.redirects
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> CommandSpec {
        CommandSpec::parse(line, 1234, true).unwrap().unwrap()
    }

    #[test]
    fn empty() {
        assert!(CommandSpec::parse("", 1, true).unwrap().is_none());
        assert!(CommandSpec::parse("   \t ", 1, true).unwrap().is_none());
    }

    #[test]
    fn comment() {
        assert!(CommandSpec::parse("# ls -la", 1, true).unwrap().is_none());
        assert!(CommandSpec::parse("#ls", 1, true).unwrap().is_none());
    }

    #[test]
    fn single_cmd_with_args() {
        let spec = parse("cmd var1 var2 var3");
        assert_eq!(spec.program(), "cmd");
        assert_eq!(spec.args(), &["var1", "var2", "var3"]);
        assert!(!spec.is_background());
        assert!(spec.redirects().is_empty());
    }

    #[test]
    fn trailing_ampersand_marks_background() {
        let spec = parse("sleep 5 &");
        assert_eq!(spec.argv(), &["sleep", "5"]);
        assert!(spec.is_background());
    }

    #[test]
    fn ampersand_is_stripped_in_foreground_only_mode() {
        let spec = CommandSpec::parse("sleep 5 &", 1, false).unwrap().unwrap();
        assert_eq!(spec.argv(), &["sleep", "5"]);
        assert!(!spec.is_background());
    }

    #[test]
    fn inner_ampersand_is_an_argument() {
        let spec = parse("echo & done");
        assert_eq!(spec.argv(), &["echo", "&", "done"]);
        assert!(!spec.is_background());
    }

    #[test]
    fn redirection_and_expansion() {
        let spec = parse("wc -l < in$$.txt > out.txt &");
        assert_eq!(spec.argv(), &["wc", "-l"]);
        assert!(spec.is_background());
        assert_eq!(spec.redirects().stdin.as_deref(), Some("in1234.txt"));
        assert_eq!(spec.redirects().stdout.as_deref(), Some("out.txt"));
    }

    #[test]
    fn missing_command_is_error() {
        assert!(CommandSpec::parse("&", 1, true).is_err());
        assert!(CommandSpec::parse("< in.txt", 1, true).is_err());
        assert!(CommandSpec::parse("cat >", 1, true).is_err());
    }
}
