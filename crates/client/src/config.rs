// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::Parser;

/// Connection and session settings shared by every subcommand.
#[derive(Debug, Clone, Parser)]
pub struct Config {
    /// Backend base URL.
    #[arg(long, env = "MESA_URL", default_value = "http://localhost:3000")]
    pub url: String,

    /// Table code for table-scoped guest sessions.
    #[arg(long, env = "MESA_TABLE")]
    pub table: Option<String>,

    /// Directory holding the persisted session state.
    #[arg(long, env = "MESA_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// OAuth redirect return URL (pasted back after a browser login).
    #[arg(long, env = "MESA_OAUTH_REDIRECT")]
    pub oauth_redirect: Option<String>,

    /// Request timeout in milliseconds.
    #[arg(long, env = "MESA_TIMEOUT_MS", default_value = "10000")]
    pub timeout_ms: u64,

    /// Log format (json or text).
    #[arg(long, env = "MESA_LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "MESA_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Skip state-file persistence entirely (set by `Config::test()`).
    #[clap(skip)]
    pub ephemeral: bool,
}

impl Config {
    /// Validate the configuration after parsing.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            anyhow::bail!("--url must be an http(s) URL: {}", self.url);
        }
        if self.timeout_ms == 0 {
            anyhow::bail!("--timeout-ms must be greater than zero");
        }
        match self.log_format.as_str() {
            "json" | "text" => {}
            other => anyhow::bail!("invalid log format: {other}"),
        }
        Ok(())
    }

    /// Where the session state file lives. `--state-dir` wins; the
    /// default is `$HOME/.mesa`. `None` means run without persistence.
    pub fn state_path(&self) -> Option<PathBuf> {
        if self.ephemeral {
            return None;
        }
        let dir = match &self.state_dir {
            Some(dir) => dir.clone(),
            None => PathBuf::from(std::env::var("HOME").ok()?).join(".mesa"),
        };
        Some(dir.join("session.json"))
    }

    /// Minimal config for tests: in-memory state, short timeout.
    #[doc(hidden)]
    pub fn test(url: &str) -> Self {
        Self {
            url: url.to_owned(),
            table: None,
            state_dir: None,
            oauth_redirect: None,
            timeout_ms: 2_000,
            log_format: "text".into(),
            log_level: "debug".into(),
            ephemeral: true,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
