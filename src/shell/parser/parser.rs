//! Recursive-descent parser over the token sequence.
//!
//! Grammar, after left-factoring the redirection rules so the simple
//! command is parsed exactly once per stage:
//!
//! ```text
//! simple-cmd    := WORD+
//! redirect-tail := '>' WORD ('<' WORD)?
//!                | '<' WORD ('>' WORD)?
//!                | ε
//! redir-cmd     := simple-cmd redirect-tail
//! pipeline      := redir-cmd ('|' pipeline)?
//! ```
//!
//! The only lookahead beyond one token is in `redirect-tail`: the `>`-first
//! branch is tried first and the `<`-first branch is retried from the saved
//! position only when `>` itself did not match. A branch is committed once
//! its leading operator matched, so a missing file name is a syntax error
//! rather than a reason to backtrack.

use super::ast::{Pipeline, RedirCmd, SimpleCmd};
use super::lexer::Token;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Syntax { reason: String, position: usize },
    TrailingTokens { position: usize },
    UnsupportedBackground { position: usize },
    EmptyInput,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Syntax { reason, position } => {
                write!(f, "syntax error at token {}: {}", position, reason)
            }
            ParseError::TrailingTokens { position } => {
                write!(f, "trailing tokens starting at token {}", position)
            }
            ParseError::UnsupportedBackground { position } => {
                write!(
                    f,
                    "background execution is not supported (`&` at token {})",
                    position
                )
            }
            ParseError::EmptyInput => write!(f, "empty input"),
        }
    }
}

impl std::error::Error for ParseError {}

pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Parse the whole token sequence into a pipeline. Success requires the
    /// sequence to be fully consumed; anything left over is reported
    /// separately from a structural mismatch.
    pub fn parse(mut self) -> Result<Pipeline, ParseError> {
        if self.tokens.is_empty() {
            return Err(ParseError::EmptyInput);
        }
        let pipeline = self.parse_pipeline()?;
        match self.peek() {
            None => Ok(pipeline),
            Some(Token::Background) => {
                Err(ParseError::UnsupportedBackground { position: self.pos })
            }
            Some(_) => Err(ParseError::TrailingTokens { position: self.pos }),
        }
    }

    fn parse_pipeline(&mut self) -> Result<Pipeline, ParseError> {
        let first = self.parse_redir_cmd()?;
        if self.eat(&Token::Pipe) {
            let mut rest = self.parse_pipeline()?;
            rest.stages.insert(0, first);
            Ok(rest)
        } else {
            Ok(Pipeline {
                stages: vec![first],
            })
        }
    }

    fn parse_redir_cmd(&mut self) -> Result<RedirCmd, ParseError> {
        let simple = self.parse_simple_cmd()?;
        let (input, output) = self.parse_redirect_tail()?;
        Ok(RedirCmd {
            simple,
            input,
            output,
        })
    }

    fn parse_simple_cmd(&mut self) -> Result<SimpleCmd, ParseError> {
        let mut words = Vec::new();
        while let Some(Token::Word(w)) = self.peek() {
            words.push(w.clone());
            self.pos += 1;
        }
        if words.is_empty() {
            return Err(ParseError::Syntax {
                reason: "expected a command word".to_string(),
                position: self.pos,
            });
        }
        Ok(SimpleCmd { words })
    }

    /// At most one `<` and one `>`, in either order. Returns
    /// `(input, output)`.
    fn parse_redirect_tail(&mut self) -> Result<(Option<String>, Option<String>), ParseError> {
        let backup = self.pos;
        if self.eat(&Token::GreaterThan) {
            let output = self.expect_word("expected a file name after `>`")?;
            if self.eat(&Token::LessThan) {
                let input = self.expect_word("expected a file name after `<`")?;
                return Ok((Some(input), Some(output)));
            }
            return Ok((None, Some(output)));
        }
        // `>` did not match; retry the `<`-first branch from the same spot.
        self.pos = backup;
        if self.eat(&Token::LessThan) {
            let input = self.expect_word("expected a file name after `<`")?;
            if self.eat(&Token::GreaterThan) {
                let output = self.expect_word("expected a file name after `>`")?;
                return Ok((Some(input), Some(output)));
            }
            return Ok((Some(input), None));
        }
        Ok((None, None))
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_word(&mut self, reason: &str) -> Result<String, ParseError> {
        match self.peek() {
            Some(Token::Word(w)) => {
                let w = w.clone();
                self.pos += 1;
                Ok(w)
            }
            _ => Err(ParseError::Syntax {
                reason: reason.to_string(),
                position: self.pos,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::lexer::tokenize;
    use super::*;

    #[allow(clippy::unwrap_used)]
    fn parse_line(line: &str) -> Result<Pipeline, ParseError> {
        Parser::new(&tokenize(line).unwrap()).parse()
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_simple_command() {
        let pipeline = parse_line("ls -l").unwrap();
        assert_eq!(pipeline.stages.len(), 1);
        let stage = &pipeline.stages[0];
        assert_eq!(stage.simple.words, vec!["ls", "-l"]);
        assert!(!stage.is_redirected());
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_redirections_are_order_insensitive() {
        let a = parse_line("ls < in > out").unwrap();
        let b = parse_line("ls > out < in").unwrap();
        assert_eq!(a, b);
        let stage = &a.stages[0];
        assert_eq!(stage.input.as_deref(), Some("in"));
        assert_eq!(stage.output.as_deref(), Some("out"));
    }

    #[test]
    fn test_duplicate_input_redirection_fails() {
        assert_eq!(
            parse_line("ls < in < in"),
            Err(ParseError::TrailingTokens { position: 3 })
        );
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_three_stage_pipeline_in_source_order() {
        let pipeline = parse_line("a | b | c").unwrap();
        let names: Vec<&str> = pipeline.stages.iter().map(|s| s.simple.name()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_redirected_pipeline_stage() {
        let pipeline = parse_line("grep foo < in | wc > out").unwrap();
        assert_eq!(pipeline.stages.len(), 2);
        assert_eq!(pipeline.stages[0].input.as_deref(), Some("in"));
        assert_eq!(pipeline.stages[0].output, None);
        assert_eq!(pipeline.stages[1].input, None);
        assert_eq!(pipeline.stages[1].output.as_deref(), Some("out"));
    }

    #[test]
    fn test_trailing_pipe_fails() {
        assert!(matches!(
            parse_line("ls |"),
            Err(ParseError::Syntax { .. })
        ));
    }

    #[test]
    fn test_missing_file_name_fails() {
        assert!(matches!(
            parse_line("ls >"),
            Err(ParseError::Syntax { .. })
        ));
        assert!(matches!(
            parse_line("ls > out <"),
            Err(ParseError::Syntax { .. })
        ));
    }

    #[test]
    fn test_background_marker_is_rejected() {
        assert_eq!(
            parse_line("sleep 10 &"),
            Err(ParseError::UnsupportedBackground { position: 2 })
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse_line(""), Err(ParseError::EmptyInput));
    }

    #[test]
    fn test_leading_operator_fails() {
        assert!(matches!(
            parse_line("| ls"),
            Err(ParseError::Syntax { .. })
        ));
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_render_and_reparse_round_trip() {
        for line in [
            "ls -l",
            "ls > out < in",
            "a | b | c",
            "grep foo < in | sort | wc > out",
        ] {
            let parsed = parse_line(line).unwrap();
            let reparsed = parse_line(&parsed.to_string()).unwrap();
            assert_eq!(parsed, reparsed);
        }
    }
}
