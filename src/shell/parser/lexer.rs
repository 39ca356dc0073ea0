//! Tokenizer built from six finite-state recognizers run in lockstep.
//!
//! Every recognizer sees every input character. As long as any of them is
//! still `Running` the character is consumed and the current span grows.
//! Once none is running, the recognizers are polled in priority order and
//! the first `Succeeded` one names the finished token; the character that
//! forced the decision is *not* consumed and is rescanned as the start of
//! the next token.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Word(String),
    LessThan,
    GreaterThan,
    Pipe,
    Background,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(w) => write!(f, "{}", w),
            Token::LessThan => write!(f, "<"),
            Token::GreaterThan => write!(f, ">"),
            Token::Pipe => write!(f, "|"),
            Token::Background => write!(f, "&"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    UnrecognizedCharacter { ch: char, position: usize },
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexError::UnrecognizedCharacter { ch, position } => {
                write!(f, "unrecognized character `{}` at position {}", ch, position)
            }
        }
    }
}

impl std::error::Error for LexError {}

/// The lexical classes the recognizers can report. `Blank` never becomes a
/// [`Token`]; its spans are dropped at emission time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Word,
    LessThan,
    GreaterThan,
    Blank,
    Pipe,
    Background,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Initial,
    Running,
    Succeeded,
    Failed,
}

fn is_metachar(c: char) -> bool {
    matches!(
        c,
        '<' | '>' | '|' | '&' | '\'' | '"' | '$' | ';' | ' ' | '\t' | '\n' | '\0'
    )
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n')
}

/// One 4-state automaton. `None` stands for the synthetic terminator fed at
/// end of input; no recognizer can start or keep running on it, which is
/// exactly what forces a trailing token to finalize.
#[derive(Debug)]
struct Recognizer {
    kind: Kind,
    status: Status,
}

impl Recognizer {
    fn new(kind: Kind) -> Self {
        Self {
            kind,
            status: Status::Initial,
        }
    }

    fn reset(&mut self) {
        self.status = Status::Initial;
    }

    fn feed(&mut self, c: Option<char>) -> Status {
        self.status = match self.status {
            Status::Initial => {
                if self.starts(c) {
                    Status::Running
                } else {
                    Status::Failed
                }
            }
            Status::Running => {
                if self.continues(c) {
                    Status::Running
                } else {
                    // The terminating character belongs to the next token.
                    Status::Succeeded
                }
            }
            Status::Succeeded | Status::Failed => Status::Failed,
        };
        self.status
    }

    fn starts(&self, c: Option<char>) -> bool {
        let Some(c) = c else { return false };
        match self.kind {
            Kind::Word => !is_metachar(c),
            Kind::Blank => is_blank(c),
            Kind::LessThan => c == '<',
            Kind::GreaterThan => c == '>',
            Kind::Pipe => c == '|',
            Kind::Background => c == '&',
        }
    }

    fn continues(&self, c: Option<char>) -> bool {
        match self.kind {
            Kind::Word => c.is_some_and(|c| !is_metachar(c)),
            Kind::Blank => c.is_some_and(is_blank),
            // The single-character operators succeed on whatever follows.
            Kind::LessThan | Kind::GreaterThan | Kind::Pipe | Kind::Background => false,
        }
    }
}

enum Outcome {
    Running,
    Matched(Kind),
    Failed,
}

/// All six recognizers plus the tie-break rule. The array order is the
/// priority order used when several recognizers succeed on the same span.
struct RecognizerBank {
    recognizers: [Recognizer; 6],
}

impl RecognizerBank {
    fn new() -> Self {
        Self {
            recognizers: [
                Recognizer::new(Kind::Word),
                Recognizer::new(Kind::LessThan),
                Recognizer::new(Kind::GreaterThan),
                Recognizer::new(Kind::Blank),
                Recognizer::new(Kind::Pipe),
                Recognizer::new(Kind::Background),
            ],
        }
    }

    fn reset(&mut self) {
        for r in &mut self.recognizers {
            r.reset();
        }
    }

    fn feed(&mut self, c: Option<char>) -> Outcome {
        let mut statuses = [Status::Failed; 6];
        for (status, r) in statuses.iter_mut().zip(&mut self.recognizers) {
            *status = r.feed(c);
        }
        if statuses.contains(&Status::Running) {
            return Outcome::Running;
        }
        for (status, r) in statuses.iter().zip(&self.recognizers) {
            if *status == Status::Succeeded {
                return Outcome::Matched(r.kind);
            }
        }
        Outcome::Failed
    }
}

/// Turn one input line into its token sequence, or fail at the first
/// character no recognizer can start on. Empty input is an empty sequence.
pub fn tokenize(line: &str) -> Result<Vec<Token>, LexError> {
    let chars: Vec<char> = line.chars().collect();
    let mut bank = RecognizerBank::new();
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut pos = 0;

    while pos < chars.len() {
        match bank.feed(Some(chars[pos])) {
            Outcome::Running => pos += 1,
            Outcome::Matched(kind) => {
                emit(&mut tokens, kind, &chars[start..pos]);
                bank.reset();
                // Rescan the character that closed the token.
                start = pos;
            }
            Outcome::Failed => {
                return Err(LexError::UnrecognizedCharacter {
                    ch: chars[pos],
                    position: pos,
                })
            }
        }
    }

    // A token may still be running at end of input; the synthetic terminator
    // forces it to finalize.
    if pos > start {
        if let Outcome::Matched(kind) = bank.feed(None) {
            emit(&mut tokens, kind, &chars[start..pos]);
        }
    }

    Ok(tokens)
}

fn emit(tokens: &mut Vec<Token>, kind: Kind, span: &[char]) {
    let token = match kind {
        Kind::Blank => return,
        Kind::Word => Token::Word(span.iter().collect()),
        Kind::LessThan => Token::LessThan,
        Kind::GreaterThan => Token::GreaterThan,
        Kind::Pipe => Token::Pipe,
        Kind::Background => Token::Background,
    };
    tokens.push(token);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(s: &str) -> Token {
        Token::Word(s.to_string())
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_single_word() {
        assert_eq!(tokenize("ls").unwrap(), vec![word("ls")]);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_words_and_collapsed_blanks() {
        assert_eq!(
            tokenize("ls -l  file.txt").unwrap(),
            vec![word("ls"), word("-l"), word("file.txt")]
        );
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_operators_need_no_whitespace() {
        assert_eq!(
            tokenize("a|b").unwrap(),
            vec![word("a"), Token::Pipe, word("b")]
        );
        assert_eq!(
            tokenize("a<b>c").unwrap(),
            vec![
                word("a"),
                Token::LessThan,
                word("b"),
                Token::GreaterThan,
                word("c")
            ]
        );
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_redirection_line() {
        assert_eq!(
            tokenize("echo hello > output.txt").unwrap(),
            vec![
                word("echo"),
                word("hello"),
                Token::GreaterThan,
                word("output.txt")
            ]
        );
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_background_marker() {
        assert_eq!(
            tokenize("sleep 10 &").unwrap(),
            vec![word("sleep"), word("10"), Token::Background]
        );
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_trailing_operator() {
        assert_eq!(tokenize("ls |").unwrap(), vec![word("ls"), Token::Pipe]);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_empty_and_blank_input() {
        assert_eq!(tokenize("").unwrap(), Vec::<Token>::new());
        assert_eq!(tokenize("  \t ").unwrap(), Vec::<Token>::new());
    }

    #[test]
    fn test_unrecognized_character() {
        assert_eq!(
            tokenize("$"),
            Err(LexError::UnrecognizedCharacter {
                ch: '$',
                position: 0
            })
        );
    }

    #[test]
    fn test_unrecognized_character_after_word() {
        // The word finalizes first, then the rescan of `$` fails.
        assert_eq!(
            tokenize("ls$"),
            Err(LexError::UnrecognizedCharacter {
                ch: '$',
                position: 2
            })
        );
    }

    #[test]
    fn test_quote_is_reserved() {
        assert!(matches!(
            tokenize("echo 'hi'"),
            Err(LexError::UnrecognizedCharacter { ch: '\'', .. })
        ));
    }
}
