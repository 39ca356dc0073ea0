use std::fmt;

/// A bare command invocation: the program (or builtin) name followed by its
/// arguments. The parser never constructs one with an empty word list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleCmd {
    pub words: Vec<String>,
}

impl SimpleCmd {
    pub fn name(&self) -> &str {
        &self.words[0]
    }
}

impl fmt::Display for SimpleCmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.words.join(" "))
    }
}

/// One pipeline stage: a simple command plus optional input and output
/// redirections. The grammar accepts `< in > out` and `> out < in` alike,
/// so only the operators matter here, not their source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirCmd {
    pub simple: SimpleCmd,
    pub input: Option<String>,
    pub output: Option<String>,
}

impl RedirCmd {
    pub fn is_redirected(&self) -> bool {
        self.input.is_some() || self.output.is_some()
    }
}

impl fmt::Display for RedirCmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.simple)?;
        if let Some(input) = &self.input {
            write!(f, " < {}", input)?;
        }
        if let Some(output) = &self.output {
            write!(f, " > {}", output)?;
        }
        Ok(())
    }
}

/// An ordered, non-empty chain of stages. Stage order equals source order
/// equals data-flow order: stage i's stdout feeds stage i+1's stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub stages: Vec<RedirCmd>,
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.stages.iter().map(|s| s.to_string()).collect();
        write!(f, "{}", rendered.join(" | "))
    }
}
