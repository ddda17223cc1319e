use color_eyre::{eyre::eyre, Result};
use crate::family::mock::{FailureMode, MockOp};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub backend: BackendConfig,
  #[serde(default)]
  pub profile: ProfileConfig,
  #[serde(default)]
  pub presence: PresenceConfig,
  #[serde(default)]
  pub log: LogConfig,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
  /// In-process simulated backend
  #[default]
  Mock,
  /// PostgREST-style HTTP backend
  Rest,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
  pub kind: BackendKind,
  /// Base URL of the REST backend, e.g. https://xyz.supabase.co
  pub url: Option<String>,
  /// Simulated round-trip delay for the mock backend
  pub latency_ms: u64,
  /// Start the mock backend with a demo family
  pub seed_demo: bool,
  /// Mock operations that should fail, e.g. `create: unavailable`
  pub failures: HashMap<MockOp, FailureMode>,
}

impl Default for BackendConfig {
  fn default() -> Self {
    Self {
      kind: BackendKind::Mock,
      url: None,
      latency_ms: 300,
      seed_demo: true,
      failures: HashMap::new(),
    }
  }
}

impl BackendConfig {
  pub fn latency(&self) -> Duration {
    Duration::from_millis(self.latency_ms)
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
  pub nickname: Option<String>,
  pub avatar: String,
}

impl Default for ProfileConfig {
  fn default() -> Self {
    Self {
      nickname: None,
      avatar: "🙂".to_string(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PresenceConfig {
  /// Members seen within this many seconds count as online
  pub window_secs: u64,
  /// How often members are re-fetched and a heartbeat is sent
  pub refresh_secs: u64,
}

impl Default for PresenceConfig {
  fn default() -> Self {
    Self {
      window_secs: 300,
      refresh_secs: 30,
    }
  }
}

impl PresenceConfig {
  pub fn window(&self) -> Duration {
    Duration::from_secs(self.window_secs)
  }

  pub fn refresh(&self) -> Duration {
    Duration::from_secs(self.refresh_secs.max(1))
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
  pub level: String,
  /// Directory for log files (defaults to the platform data directory)
  pub dir: Option<PathBuf>,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: "info".to_string(),
      dir: None,
    }
  }
}

impl LogConfig {
  pub fn directory(&self) -> PathBuf {
    self.dir.clone().unwrap_or_else(|| {
      dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("famlist")
    })
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./famlist.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/famlist/config.yaml
  ///
  /// Without any file the defaults apply: the simulated backend seeded
  /// with a demo family.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("famlist.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("famlist").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Get the REST API key from environment variables.
  ///
  /// Checks FAMLIST_API_KEY first, then SUPABASE_ANON_KEY as fallback.
  pub fn get_api_key() -> Result<String> {
    std::env::var("FAMLIST_API_KEY")
      .or_else(|_| std::env::var("SUPABASE_ANON_KEY"))
      .map_err(|_| {
        eyre!("REST API key not found. Set FAMLIST_API_KEY or SUPABASE_ANON_KEY environment variable.")
      })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
  }

  #[test]
  fn test_load_full_file() {
    let file = write_config(
      r#"
backend:
  kind: rest
  url: https://demo.supabase.co
  failures:
    fetch_list: reject
    notify: unavailable
profile:
  nickname: Dad
  avatar: "👨"
presence:
  window_secs: 120
log:
  level: debug
  dir: /tmp/famlist-logs
"#,
    );

    let config = Config::load(Some(file.path())).unwrap();
    assert_eq!(config.backend.kind, BackendKind::Rest);
    assert_eq!(config.backend.url.as_deref(), Some("https://demo.supabase.co"));
    assert_eq!(config.backend.latency_ms, 300);
    assert_eq!(config.backend.failures.get(&MockOp::FetchList), Some(&FailureMode::Reject));
    assert_eq!(config.backend.failures.get(&MockOp::Notify), Some(&FailureMode::Unavailable));
    assert_eq!(config.profile.nickname.as_deref(), Some("Dad"));
    assert_eq!(config.profile.avatar, "👨");
    assert_eq!(config.presence.window(), Duration::from_secs(120));
    assert_eq!(config.presence.refresh_secs, 30);
    assert_eq!(config.log.level, "debug");
    assert_eq!(config.log.directory(), PathBuf::from("/tmp/famlist-logs"));
  }

  #[test]
  fn test_empty_sections_use_defaults() {
    let file = write_config("profile:\n  nickname: Mom\n");
    let config = Config::load(Some(file.path())).unwrap();

    assert_eq!(config.backend.kind, BackendKind::Mock);
    assert!(config.backend.seed_demo);
    assert_eq!(config.presence.window_secs, 300);
    assert_eq!(config.log.level, "info");
  }

  #[test]
  fn test_missing_explicit_path_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.yaml");
    let err = Config::load(Some(&missing)).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
  }

  #[test]
  fn test_invalid_yaml_is_an_error() {
    let file = write_config("backend:\n  kind: carrier-pigeon\n");
    let err = Config::load(Some(file.path())).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
  }

  #[test]
  fn test_refresh_never_zero() {
    let presence = PresenceConfig {
      window_secs: 60,
      refresh_secs: 0,
    };
    assert_eq!(presence.refresh(), Duration::from_secs(1));
  }
}
