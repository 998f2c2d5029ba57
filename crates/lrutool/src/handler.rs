//! Command parsing and execution against a cache

use std::fmt;

use lrukit::LruCache;
use serde::Serialize;

use crate::record::Record;

/// A single cache command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Set { key: String, value: i32 },
    Get { key: String },
    Del { key: String },
    Clear,
    Print,
    Dump,
}

impl Command {
    /// Parse one script line; blank lines and `#` comments yield `None`
    pub fn parse(line: &str) -> Result<Option<Command>, String> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let mut parts = line.split_whitespace();
        let name = parts.next().unwrap_or_default().to_lowercase();
        let args: Vec<&str> = parts.collect();

        let command = match name.as_str() {
            "set" => {
                let [key, value] = args.as_slice() else {
                    return Err(arity("set"));
                };
                let value = value
                    .parse()
                    .map_err(|_| format!("ERR value is not an integer: '{}'", value))?;
                Command::Set {
                    key: key.to_string(),
                    value,
                }
            }
            "get" => {
                let [key] = args.as_slice() else {
                    return Err(arity("get"));
                };
                Command::Get {
                    key: key.to_string(),
                }
            }
            "del" => {
                let [key] = args.as_slice() else {
                    return Err(arity("del"));
                };
                Command::Del {
                    key: key.to_string(),
                }
            }
            "clear" | "print" | "dump" if !args.is_empty() => return Err(arity(&name)),
            "clear" => Command::Clear,
            "print" => Command::Print,
            "dump" => Command::Dump,
            _ => return Err(format!("ERR unknown command '{}'", name)),
        };

        Ok(Some(command))
    }
}

impl From<Record> for Command {
    fn from(record: Record) -> Self {
        match record {
            Record::Set { key, value } => Command::Set { key, value },
            Record::Get { key } => Command::Get { key },
            Record::Delete { key } => Command::Del { key },
            Record::Clear => Command::Clear,
        }
    }
}

fn arity(command: &str) -> String {
    format!("ERR wrong number of arguments for '{}' command", command)
}

/// Outcome of a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Ok,
    Value(Option<i32>),
    Text(String),
    Error(String),
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Ok => f.write_str("OK"),
            Response::Value(Some(value)) => write!(f, "{}", value),
            Response::Value(None) => f.write_str("(nil)"),
            Response::Text(text) => f.write_str(text),
            Response::Error(e) => f.write_str(e),
        }
    }
}

/// Serializable view of the cache, entries most recently used first
#[derive(Debug, Serialize)]
pub struct Snapshot {
    pub capacity: usize,
    pub len: usize,
    pub entries: Vec<SnapshotEntry>,
}

#[derive(Debug, Serialize)]
pub struct SnapshotEntry {
    pub key: String,
    pub value: i32,
}

pub struct CommandHandler {
    cache: LruCache<String, i32>,
}

impl CommandHandler {
    pub fn new(cache: LruCache<String, i32>) -> Self {
        Self { cache }
    }

    pub fn handle(&mut self, cmd: Command) -> Response {
        match cmd {
            Command::Set { key, value } => {
                self.cache.set(key, value);
                Response::Ok
            }
            Command::Get { key } => Response::Value(self.cache.get(key.as_str())),
            Command::Del { key } => {
                self.cache.delete(key.as_str());
                Response::Ok
            }
            Command::Clear => {
                self.cache.clear();
                Response::Ok
            }
            Command::Print => Response::Text(self.cache.to_string()),
            Command::Dump => match serde_json::to_string(&self.snapshot()) {
                Ok(json) => Response::Text(json),
                Err(e) => Response::Error(format!("ERR {}", e)),
            },
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            capacity: self.cache.capacity(),
            len: self.cache.len(),
            entries: self
                .cache
                .iter()
                .map(|(key, value)| SnapshotEntry {
                    key: key.clone(),
                    value: *value,
                })
                .collect(),
        }
    }

    pub fn cache(&self) -> &LruCache<String, i32> {
        &self.cache
    }
}
