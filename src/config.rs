//! Startup configuration, read once from the environment. There is no
//! config file and no scripting layer — that would reintroduce the shell
//! features this implementation deliberately leaves out.

#[derive(Debug, Clone, Default)]
pub struct Config {
    /// `CRSH_PROMPT`: a literal prompt string, or `fn:user-cwd` to select
    /// the function-computed `<user> : <basename-of-cwd> > ` prompt.
    pub prompt: Option<String>,
    /// `CRSH_HISTFILE`: path used by the line editor to persist input
    /// history across sessions. Independent of the in-memory `HistoryStore`,
    /// which is session-only.
    pub histfile: Option<String>,
    /// `CRSH_LOG`: `env_logger` filter string, default `info`.
    pub log_filter: String,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            prompt: std::env::var("CRSH_PROMPT").ok(),
            histfile: std::env::var("CRSH_HISTFILE").ok(),
            log_filter: std::env::var("CRSH_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_info_log_filter_when_unset() {
        std::env::remove_var("CRSH_LOG");
        let config = Config::from_env();
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn picks_up_overrides_from_the_environment() {
        std::env::set_var("CRSH_PROMPT", "=> ");
        std::env::set_var("CRSH_LOG", "debug");
        let config = Config::from_env();
        assert_eq!(config.prompt.as_deref(), Some("=> "));
        assert_eq!(config.log_filter, "debug");
        std::env::remove_var("CRSH_PROMPT");
        std::env::remove_var("CRSH_LOG");
    }
}
