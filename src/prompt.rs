//! Prompt rendering: a static string by default, or a small function-computed
//! form selected via `CRSH_PROMPT=fn:user-cwd`.

use crate::config::Config;

pub fn render(config: &Config) -> String {
    match config.prompt.as_deref() {
        Some("fn:user-cwd") => user_cwd_prompt(),
        Some(literal) => literal.to_string(),
        None => "> ".to_string(),
    }
}

fn user_cwd_prompt() -> String {
    let user = std::env::var("USER").unwrap_or_else(|_| "user".to_string());
    let cwd = std::env::current_dir().unwrap_or_else(|_| "/".into());
    let base = cwd
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "/".to_string());
    format!("{user} : {base} > ")
}
