use colored::Colorize;

pub struct Theme {
    pub prompt: String,
    pub error_symbol: String,
    pub welcome_message: String,
    pub exit_message: String,
    pub error_style: Box<dyn Fn(String) -> String>,
    pub warning_style: Box<dyn Fn(String) -> String>,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            prompt: "ush> ".bright_cyan().to_string(),
            error_symbol: "✗".red().to_string(),
            welcome_message: "ush — type a command, `exit` to leave".bright_cyan().to_string(),
            exit_message: "bye".bright_cyan().to_string(),
            error_style: Box::new(|s| s.bright_red().to_string()),
            warning_style: Box::new(|s| s.yellow().to_string()),
        }
    }
}

pub fn load_theme(theme_name: &str) -> Theme {
    match theme_name {
        // No escape sequences; for dumb terminals and log-friendly runs.
        "plain" => Theme {
            prompt: "ush> ".to_string(),
            error_symbol: "!".to_string(),
            welcome_message: "ush — type a command, `exit` to leave".to_string(),
            exit_message: "bye".to_string(),
            error_style: Box::new(|s| s),
            warning_style: Box::new(|s| s),
        },
        _ => Theme::default(),
    }
}
