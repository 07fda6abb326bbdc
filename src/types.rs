use std::fmt;
use std::str::FromStr;

/// A single command line: program plus ordered arguments.
///
/// Built once from configuration and never mutated afterwards. The command
/// is executed directly (no shell), so quoting and pipes are not supported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
}

impl CommandSpec {
    pub fn new<P, I, A>(program: P, args: I) -> Self
    where
        P: Into<String>,
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

/// `"cargo test --all"` → program `cargo`, args `["test", "--all"]`.
impl FromStr for CommandSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        match parts.next() {
            Some(program) => Ok(CommandSpec::new(program, parts)),
            None => Err(format!("command line {s:?} does not name a program")),
        }
    }
}

/// Renders the literal command text shown next to status markers.
impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}
