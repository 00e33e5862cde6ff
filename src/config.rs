//! Configuration of the console host.
//!
//! The configuration is read from an optional YAML file, then overridden by
//! environment variables prefixed with `SLASHKIT_`, using `__` to reach nested
//! keys. Every setting has a default, so the host runs without any file.
//!
//! # Configuration File Format
//!
//! ```yaml
//! console:
//!   # Prefix of text commands
//!   prefix: "!"
//!   # Identity the console user is given in invocations
//!   user_id: "console"
//!   channel_id: "stdin"
//!   # Optional guild, needed to use guild-restricted commands
//!   guild_id: "668485643487412234"
//! ```
//!
//! # Environment Variable Overrides
//!
//! ```bash
//! export SLASHKIT_CONSOLE__PREFIX="?"
//! export SLASHKIT_CONSOLE__GUILD_ID="668485643487412234"
//! ```

use anyhow::Context;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Yaml},
};
use serde::{Deserialize, Serialize};

/// Root configuration of the console host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Console session settings
    #[serde(default)]
    pub console: Console,
}

/// Identity and prefix of the console session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Console {
    /// Prefix of text commands, e.g. `!` in `!todo add milk`
    pub prefix: String,
    pub user_id: String,
    pub channel_id: String,
    /// Guild the console pretends to be in, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<String>,
}

impl Default for Console {
    fn default() -> Self {
        Console {
            prefix: "!".to_owned(),
            user_id: "console".to_owned(),
            channel_id: "stdin".to_owned(),
            guild_id: None,
        }
    }
}

impl Config {
    /// Loads the configuration.
    ///
    /// # Arguments
    ///
    /// * `path` - Path of the YAML file, `None` to use defaults and environment only
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or if a value has the wrong type.
    pub fn load(path: Option<&str>) -> anyhow::Result<Config> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            if !std::path::Path::new(path).exists() {
                anyhow::bail!("configuration file {} not found", path);
            }
            figment = figment.merge(Yaml::file(path));
        }

        figment
            .merge(Env::prefixed("SLASHKIT_").split("__"))
            .extract()
            .context("invalid configuration")
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serial_test::serial;
    use tempfile::NamedTempFile;

    use super::*;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    #[serial]
    fn test_load_defaults() {
        let config = Config::load(None).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.console.prefix, "!");
    }

    #[test]
    #[serial]
    fn test_load_file() {
        let file = write_config(
            r#"
console:
  prefix: "?"
  user_id: "alice"
  channel_id: "general"
  guild_id: "668485643487412234"
"#,
        );

        let config = Config::load(file.path().to_str()).unwrap();
        assert_eq!(config.console.prefix, "?");
        assert_eq!(config.console.user_id, "alice");
        assert_eq!(config.console.channel_id, "general");
        assert_eq!(config.console.guild_id.as_deref(), Some("668485643487412234"));
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        let file = write_config(
            r#"
console:
  prefix: "?"
  user_id: "alice"
  channel_id: "general"
"#,
        );

        unsafe {
            std::env::set_var("SLASHKIT_CONSOLE__USER_ID", "bob");
        }
        let config = Config::load(file.path().to_str());
        unsafe {
            std::env::remove_var("SLASHKIT_CONSOLE__USER_ID");
        }

        let config = config.unwrap();
        assert_eq!(config.console.user_id, "bob");
        assert_eq!(config.console.prefix, "?");
    }

    #[test]
    #[serial]
    fn test_missing_file() {
        let error = Config::load(Some("/nonexistent/slashkit.yaml")).unwrap_err();
        assert!(error.to_string().contains("not found"));
    }

    #[test]
    #[serial]
    fn test_invalid_file() {
        let file = write_config("console: 3\n");
        assert!(Config::load(file.path().to_str()).is_err());
    }
}
