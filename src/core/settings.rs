use crate::core::dispatch::dispatchers::DEFAULT_DISPATCHER_ID;
use crate::core::dispatch::mailbox::mailbox_type::MailboxType;
use config::{Config, ConfigError, File, FileFormat, Value};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const ROOT: &str = "actuator";

pub const DEFAULT_THROUGHPUT: usize = 5;
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(5000);

#[derive(Error, Debug)]
pub enum SettingsError {
  #[error(transparent)]
  Config(#[from] ConfigError),
  #[error("Invalid value for [{key}]: {reason}")]
  InvalidValue { key: String, reason: String },
}

impl SettingsError {
  fn invalid(key: &str, reason: impl Into<String>) -> Self {
    SettingsError::InvalidValue {
      key: key.to_owned(),
      reason: reason.into(),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorKind {
  Tokio,
  Inline,
}

impl FromStr for ExecutorKind {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "tokio" => Ok(ExecutorKind::Tokio),
      "inline" => Ok(ExecutorKind::Inline),
      other => Err(format!("unknown executor `{}`, expected `tokio` or `inline`", other)),
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DispatcherSettings {
  pub id: String,
  pub throughput: usize,
  pub throughput_deadline: Option<Duration>,
}

impl DispatcherSettings {
  pub fn new(id: &str, throughput: usize, throughput_deadline: Option<Duration>) -> Self {
    Self {
      id: id.to_owned(),
      throughput,
      throughput_deadline,
    }
  }
}

/// Runtime settings of an actor system.
///
/// Read from the `actuator` table of a TOML document:
///
/// ```toml
/// [actuator]
/// executor = "tokio"
/// worker_threads = 4
/// shutdown_timeout_ms = 5000
///
/// [actuator.default_dispatcher]
/// throughput = 5
/// throughput_deadline_ms = 0
///
/// [actuator.dispatchers.io-dispatcher]
/// throughput = 1
///
/// [actuator.default_mailbox]
/// mailbox_type = "unbounded"
///
/// [actuator.mailboxes.small]
/// mailbox_type = "bounded"
/// capacity = 16
/// push_timeout_ms = 10
/// ```
///
/// Absent keys keep their defaults.
#[derive(Debug, Clone)]
pub struct Settings {
  executor: ExecutorKind,
  worker_threads: usize,
  shutdown_timeout: Duration,
  default_dispatcher: DispatcherSettings,
  dispatchers: Vec<DispatcherSettings>,
  default_mailbox: MailboxType,
  mailboxes: Vec<(String, MailboxType)>,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      executor: ExecutorKind::Tokio,
      worker_threads: default_worker_threads(),
      shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
      default_dispatcher: DispatcherSettings::new(DEFAULT_DISPATCHER_ID, DEFAULT_THROUGHPUT, None),
      dispatchers: Vec::new(),
      default_mailbox: MailboxType::Unbounded,
      mailboxes: Vec::new(),
    }
  }
}

fn default_worker_threads() -> usize {
  std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4)
}

fn key_of(path: &str) -> String {
  format!("{}.{}", ROOT, path)
}

fn optional<T>(result: Result<T, ConfigError>) -> Result<Option<T>, SettingsError> {
  match result {
    Ok(value) => Ok(Some(value)),
    Err(ConfigError::NotFound(_)) => Ok(None),
    Err(err) => Err(err.into()),
  }
}

fn to_unsigned(key: &str, value: i64) -> Result<u64, SettingsError> {
  u64::try_from(value).map_err(|_| SettingsError::invalid(key, format!("must not be negative, got {}", value)))
}

// Lookups inside a table fetched with `get_table`; keys there are not reachable through path expressions.
struct Table<'a> {
  key: String,
  entries: &'a HashMap<String, Value>,
}

impl<'a> Table<'a> {
  fn entry_key(&self, name: &str) -> String {
    format!("{}.{}", self.key, name)
  }

  fn get_unsigned(&self, name: &str) -> Result<Option<u64>, SettingsError> {
    match self.entries.get(name) {
      None => Ok(None),
      Some(value) => {
        let key = self.entry_key(name);
        let int = value.clone().into_int()?;
        to_unsigned(&key, int).map(Some)
      }
    }
  }

  fn get_int(&self, name: &str) -> Result<Option<i64>, SettingsError> {
    match self.entries.get(name) {
      None => Ok(None),
      Some(value) => Ok(Some(value.clone().into_int()?)),
    }
  }

  fn get_str(&self, name: &str) -> Result<Option<String>, SettingsError> {
    match self.entries.get(name) {
      None => Ok(None),
      Some(value) => Ok(Some(value.clone().into_str()?)),
    }
  }
}

fn dispatcher_settings(
  id: &str,
  table: &Table<'_>,
  base: &DispatcherSettings,
) -> Result<DispatcherSettings, SettingsError> {
  // zero or negative means one message per run
  let throughput = table
    .get_int("throughput")?
    .map(|n| n.max(1) as usize)
    .unwrap_or(base.throughput);
  let throughput_deadline = match table.get_unsigned("throughput_deadline_ms")? {
    Some(0) => None,
    Some(ms) => Some(Duration::from_millis(ms)),
    None => base.throughput_deadline,
  };
  Ok(DispatcherSettings::new(id, throughput, throughput_deadline))
}

fn mailbox_type(table: &Table<'_>) -> Result<MailboxType, SettingsError> {
  let kind = table.get_str("mailbox_type")?.unwrap_or_else(|| "unbounded".to_owned());
  match kind.as_str() {
    "unbounded" => Ok(MailboxType::of_unbounded()),
    "bounded" => {
      let capacity = table
        .get_unsigned("capacity")?
        .ok_or_else(|| SettingsError::invalid(&table.entry_key("capacity"), "required for a bounded mailbox"))?;
      if capacity == 0 {
        return Err(SettingsError::invalid(&table.entry_key("capacity"), "must be at least 1"));
      }
      let push_time_out = Duration::from_millis(table.get_unsigned("push_timeout_ms")?.unwrap_or(0));
      Ok(MailboxType::of_bounded(capacity as usize, push_time_out))
    }
    other => Err(SettingsError::invalid(
      &table.entry_key("mailbox_type"),
      format!("unknown mailbox type `{}`, expected `unbounded` or `bounded`", other),
    )),
  }
}

fn named_tables(config: &Config, path: &str) -> Result<Vec<(String, HashMap<String, Value>)>, SettingsError> {
  let key = key_of(path);
  let tables = optional(config.get_table(&key))?.unwrap_or_default();
  let mut result = tables
    .into_iter()
    .map(|(id, value)| value.into_table().map(|table| (id, table)))
    .collect::<Result<Vec<_>, _>>()?;
  result.sort_by(|a, b| a.0.cmp(&b.0));
  Ok(result)
}

impl Settings {
  pub fn from_config(config: &Config) -> Result<Self, SettingsError> {
    let defaults = Settings::default();

    let executor = match optional(config.get_str(&key_of("executor")))? {
      Some(s) => ExecutorKind::from_str(&s).map_err(|reason| SettingsError::invalid(&key_of("executor"), reason))?,
      None => defaults.executor,
    };

    let worker_threads = match optional(config.get_int(&key_of("worker_threads")))? {
      Some(n) => {
        let n = to_unsigned(&key_of("worker_threads"), n)? as usize;
        if n == 0 {
          return Err(SettingsError::invalid(&key_of("worker_threads"), "must be at least 1"));
        }
        n
      }
      None => defaults.worker_threads,
    };

    let shutdown_timeout = match optional(config.get_int(&key_of("shutdown_timeout_ms")))? {
      Some(ms) => Duration::from_millis(to_unsigned(&key_of("shutdown_timeout_ms"), ms)?),
      None => defaults.shutdown_timeout,
    };

    let default_dispatcher_entries = optional(config.get_table(&key_of("default_dispatcher")))?.unwrap_or_default();
    let default_dispatcher = dispatcher_settings(
      DEFAULT_DISPATCHER_ID,
      &Table {
        key: key_of("default_dispatcher"),
        entries: &default_dispatcher_entries,
      },
      &defaults.default_dispatcher,
    )?;

    let mut dispatchers = Vec::new();
    for (id, entries) in named_tables(config, "dispatchers")? {
      let table = Table {
        key: key_of(&format!("dispatchers.{}", id)),
        entries: &entries,
      };
      dispatchers.push(dispatcher_settings(&id, &table, &default_dispatcher)?);
    }

    let default_mailbox_entries = optional(config.get_table(&key_of("default_mailbox")))?.unwrap_or_default();
    let default_mailbox = mailbox_type(&Table {
      key: key_of("default_mailbox"),
      entries: &default_mailbox_entries,
    })?;

    let mut mailboxes = Vec::new();
    for (id, entries) in named_tables(config, "mailboxes")? {
      let table = Table {
        key: key_of(&format!("mailboxes.{}", id)),
        entries: &entries,
      };
      mailboxes.push((id, mailbox_type(&table)?));
    }

    let settings = Self {
      executor,
      worker_threads,
      shutdown_timeout,
      default_dispatcher,
      dispatchers,
      default_mailbox,
      mailboxes,
    };
    log::debug!("settings = {:?}", settings);
    Ok(settings)
  }

  pub fn from_toml_str(toml: &str) -> Result<Self, SettingsError> {
    let mut config = Config::default();
    config.merge(File::from_str(toml, FileFormat::Toml))?;
    Self::from_config(&config)
  }

  pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
    let path = path.as_ref();
    let mut config = Config::default();
    config
      .merge(File::from(path))
      .map_err(|err| anyhow::anyhow!("failed to read settings from {}: {}", path.display(), err))?;
    Ok(Self::from_config(&config)?)
  }

  pub fn with_executor(mut self, executor: ExecutorKind) -> Self {
    self.executor = executor;
    self
  }

  pub fn with_worker_threads(mut self, worker_threads: usize) -> Self {
    self.worker_threads = worker_threads.max(1);
    self
  }

  pub fn with_shutdown_timeout(mut self, shutdown_timeout: Duration) -> Self {
    self.shutdown_timeout = shutdown_timeout;
    self
  }

  pub fn with_default_dispatcher(mut self, throughput: usize, throughput_deadline: Option<Duration>) -> Self {
    self.default_dispatcher = DispatcherSettings::new(DEFAULT_DISPATCHER_ID, throughput, throughput_deadline);
    self
  }

  pub fn with_dispatcher(mut self, dispatcher: DispatcherSettings) -> Self {
    self.dispatchers.retain(|d| d.id != dispatcher.id);
    self.dispatchers.push(dispatcher);
    self
  }

  pub fn with_default_mailbox(mut self, mailbox_type: MailboxType) -> Self {
    self.default_mailbox = mailbox_type;
    self
  }

  pub fn with_mailbox(mut self, id: &str, mailbox_type: MailboxType) -> Self {
    self.mailboxes.retain(|(existing, _)| existing != id);
    self.mailboxes.push((id.to_owned(), mailbox_type));
    self
  }

  pub fn executor(&self) -> ExecutorKind {
    self.executor
  }

  pub fn worker_threads(&self) -> usize {
    self.worker_threads
  }

  pub fn shutdown_timeout(&self) -> Duration {
    self.shutdown_timeout
  }

  pub fn default_dispatcher(&self) -> &DispatcherSettings {
    &self.default_dispatcher
  }

  pub fn dispatchers(&self) -> &[DispatcherSettings] {
    &self.dispatchers
  }

  pub fn default_mailbox(&self) -> &MailboxType {
    &self.default_mailbox
  }

  pub fn mailboxes(&self) -> &[(String, MailboxType)] {
    &self.mailboxes
  }
}
