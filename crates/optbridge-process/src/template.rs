use std::path::Path;

use crate::{CommandSpec, RunCommandError};

/// A configured command line with `{name}` placeholders.
///
/// The first element is the program. Placeholders may appear anywhere
/// inside an argument, several per argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    argv: Vec<String>,
}

impl CommandTemplate {
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// Fills in every placeholder from `vars`.
    pub fn render(&self, cwd: &Path, vars: &[(&str, &str)]) -> Result<CommandSpec, RunCommandError> {
        let Some((program, args)) = self.argv.split_first() else {
            return Err(self.error("command is empty"));
        };
        let program = self.fill(program, vars)?;
        let args = args
            .iter()
            .map(|arg| self.fill(arg, vars))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CommandSpec::new(cwd, Path::new(&program), &args))
    }

    fn fill(&self, arg: &str, vars: &[(&str, &str)]) -> Result<String, RunCommandError> {
        let mut out = String::with_capacity(arg.len());
        let mut rest = arg;
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let close = after
                .find('}')
                .ok_or_else(|| self.error(format!("unclosed placeholder in `{arg}`")))?;
            let name = &after[..close];
            let value = vars
                .iter()
                .find_map(|(key, value)| (*key == name).then_some(*value))
                .ok_or_else(|| self.error(format!("unknown placeholder {{{name}}}")))?;
            out.push_str(value);
            rest = &after[close + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }

    fn error(&self, message: impl Into<String>) -> RunCommandError {
        RunCommandError::Template {
            template: self.argv.join(" "),
            message: message.into(),
        }
    }
}
