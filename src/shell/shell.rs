use log::{debug, error, warn};
use std::error::Error;
use std::fmt;
use std::io::Write;

use crate::shell::builtins::Registry;
use crate::shell::executor::Executor;
use crate::shell::parser::{lexer, Parser};
use crate::shell::readline::{ReadlineError, ReadlineManager};
use crate::shell::signals;
use crate::utils::config::Config;
use crate::utils::theme::Theme;

pub struct Shell<'a> {
    theme: Theme,
    readline: ReadlineManager<'a>,
    executor: Executor,
}

impl<'a> Shell<'a> {
    pub fn new(config: &'a Config, theme: Theme) -> Result<Self, ReadlineError> {
        Ok(Self {
            theme,
            readline: ReadlineManager::new(config)?,
            executor: Executor::new(Registry::default()),
        })
    }

    pub fn run(&mut self) -> Result<(), Box<dyn Error>> {
        debug!("initializing ush...");

        signals::ignore_interactive_signals();
        self.readline.load_history();

        println!("{}", self.theme.welcome_message);
        debug!("ush ready");

        self.run_loop()?;
        self.readline.save_history();

        debug!("leaving ush...");
        Ok(())
    }

    fn run_loop(&mut self) -> Result<(), Box<dyn Error>> {
        loop {
            std::io::stdout().flush()?;
            let prompt = self.theme.prompt.clone();

            match self.readline.readline(&prompt) {
                Ok(line) => {
                    if line.trim() == "exit" {
                        println!("{}", self.theme.exit_message);
                        break;
                    }
                    self.handle_input(&line);
                }
                Err(ReadlineError::Eof) => {
                    warn!("received EOF, leaving ush...");
                    println!("\n{}", self.theme.exit_message);
                    break;
                }
                Err(ReadlineError::Interrupted) => {
                    debug!("interrupt at the prompt");
                    println!("{}", (self.theme.warning_style)("^C".to_string()));
                }
                Err(err) => {
                    error!("readline error: {}", err);
                    self.report(&err);
                    break;
                }
            }
        }
        Ok(())
    }

    /// One line in, one pipeline out. Every failure produces exactly one
    /// diagnostic line and the loop goes on to the next prompt.
    fn handle_input(&mut self, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        self.readline.add_history(line.to_string());

        let tokens = match lexer::tokenize(line) {
            Ok(tokens) => tokens,
            Err(e) => {
                self.report(&e);
                return;
            }
        };
        if tokens.is_empty() {
            return;
        }

        let pipeline = match Parser::new(&tokens).parse() {
            Ok(pipeline) => pipeline,
            Err(e) => {
                self.report(&e);
                return;
            }
        };
        debug!("parsed pipeline: {}", pipeline);

        match self.executor.execute(&pipeline) {
            Ok(0) => {}
            Ok(status) => self.report(&format!("exit status {}", status)),
            Err(e) => self.report(&e),
        }
    }

    fn report(&self, message: &dyn fmt::Display) {
        eprintln!(
            "{} {}",
            (self.theme.error_style)(self.theme.error_symbol.clone()),
            (self.theme.error_style)(message.to_string())
        );
    }
}
