use serde::Deserialize;

/// Service defaults applied when a command omits an optional argument
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LOGIN username when none is given
    pub anonymous_user: String,
    /// LOGIN password when none is given
    pub anonymous_password: String,
    /// CD target when no path is given
    pub root_directory: String,
    pub force_disconnect: bool,
    pub force_abort: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            anonymous_user: "anonymous".to_owned(),
            anonymous_password: String::new(),
            root_directory: "/".to_owned(),
            force_disconnect: true,
            force_abort: true,
        }
    }
}
