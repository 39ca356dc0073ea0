use dotenv::dotenv;
use log::warn;
use rustyline::EditMode;
use std::env;
use std::fs;
use std::path::PathBuf;

pub struct Config {
    pub name: String,
    pub theme: String,
    pub history_file: PathBuf,
    pub editor_mode: String,
    pub logger_level: String,
    pub logger_dir: PathBuf,
}

impl Config {
    fn get_config_dir() -> PathBuf {
        if let Ok(home) = env::var("HOME") {
            PathBuf::from(home).join(".config/ush")
        } else {
            PathBuf::from("tmp")
        }
    }

    fn default() -> Self {
        let config_dir = Self::get_config_dir();
        Config {
            name: String::from("ush"),
            theme: String::from("default"),
            history_file: config_dir.join("history"),
            editor_mode: String::from("emacs"),
            logger_level: String::from("warn"),
            logger_dir: config_dir.join("logs"),
        }
    }

    pub fn new() -> Self {
        if cfg!(debug_assertions) {
            dotenv::from_filename(".env.development").ok();
        } else {
            dotenv().ok();
        }

        let mut config = Config::default();

        if let Ok(theme) = env::var("USH_THEME") {
            config.theme = theme;
        }
        if let Ok(editor) = env::var("USH_EDITOR") {
            config.editor_mode = editor;
        }
        if let Ok(history) = env::var("USH_HISTORY") {
            config.history_file = PathBuf::from(history);
        }
        if let Ok(level) = env::var("USH_LOG_LEVEL") {
            config.logger_level = level;
        }
        if let Ok(dir) = env::var("USH_LOG_DIR") {
            config.logger_dir = PathBuf::from(dir);
        }

        if let Some(parent) = config.history_file.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!("could not create history directory: {}", e);
            }
        }

        config
    }

    pub fn get_edit_mode(&self) -> EditMode {
        match self.editor_mode.to_lowercase().as_str() {
            "vi" => EditMode::Vi,
            _ => EditMode::Emacs,
        }
    }
}
