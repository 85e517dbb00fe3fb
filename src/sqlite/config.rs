use std::path::Path;

use rusqlite::OpenFlags;

use crate::error::RemapMiddlewareError;

const MEMORY_PATH: &str = ":memory:";

/// Connection settings for a `SQLite` session, parsed from a libpq-style connection
/// string such as `dbname=app path=/var/lib/app.db mode=rw`.
///
/// * `dbname` - logical database name (what the engine is initialised for)
/// * `path` - database file, or `:memory:` (the default)
/// * `mode` - `ro`, `rw` or `rwc` (the default: read-write, create if missing)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteConnInfo {
    pub dbname: String,
    pub path: String,
    pub mode: OpenMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    ReadOnly,
    ReadWrite,
    #[default]
    ReadWriteCreate,
}

impl OpenMode {
    fn parse(value: &str) -> Result<Self, RemapMiddlewareError> {
        match value {
            "ro" => Ok(OpenMode::ReadOnly),
            "rw" => Ok(OpenMode::ReadWrite),
            "rwc" => Ok(OpenMode::ReadWriteCreate),
            other => Err(RemapMiddlewareError::ConfigError(format!(
                "invalid mode value: \"{other}\""
            ))),
        }
    }

    pub(crate) fn flags(self) -> OpenFlags {
        let base = OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        match self {
            OpenMode::ReadOnly => base | OpenFlags::SQLITE_OPEN_READ_ONLY,
            OpenMode::ReadWrite => base | OpenFlags::SQLITE_OPEN_READ_WRITE,
            OpenMode::ReadWriteCreate => {
                base | OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE
            }
        }
    }
}

#[derive(Default)]
struct Settings {
    dbname: Option<String>,
    path: Option<String>,
    mode: Option<OpenMode>,
}

impl Settings {
    fn set(&mut self, key: &str, value: &str) -> Result<(), RemapMiddlewareError> {
        // Empty values mean "not given", as in libpq.
        if value.is_empty() {
            return Ok(());
        }
        match key {
            "dbname" => self.dbname = Some(value.to_string()),
            "path" => self.path = Some(value.to_string()),
            "mode" => self.mode = Some(OpenMode::parse(value)?),
            other => {
                return Err(RemapMiddlewareError::ConfigError(format!(
                    "invalid connection option \"{other}\""
                )));
            }
        }
        Ok(())
    }

    fn finish(self) -> SqliteConnInfo {
        let path = self.path.unwrap_or_else(|| MEMORY_PATH.to_string());
        let dbname = self.dbname.unwrap_or_else(|| default_dbname(&path));
        SqliteConnInfo {
            dbname,
            path,
            mode: self.mode.unwrap_or_default(),
        }
    }
}

fn default_dbname(path: &str) -> String {
    if path == MEMORY_PATH {
        return "main".to_string();
    }
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("main")
        .to_string()
}

impl SqliteConnInfo {
    /// Parse a `key=value` connection string. Values may be single-quoted, with `\'`
    /// and `\\` escapes.
    ///
    /// # Errors
    /// Returns `RemapMiddlewareError::ConfigError` for malformed strings and unknown
    /// options.
    pub fn parse(conninfo: &str) -> Result<Self, RemapMiddlewareError> {
        let mut settings = Settings::default();
        for (key, value) in parse_pairs(conninfo)? {
            settings.set(&key, &value)?;
        }
        Ok(settings.finish())
    }

    /// Build settings from parallel keyword/value arrays. With `expand_dbname`, a
    /// `dbname` value containing `=` is parsed as a connection string; keywords after it
    /// override what it set.
    ///
    /// # Errors
    /// Returns `RemapMiddlewareError::ConfigError` for mismatched arrays, malformed
    /// expanded strings and unknown options.
    pub fn from_params(
        keywords: &[&str],
        values: &[&str],
        expand_dbname: bool,
    ) -> Result<Self, RemapMiddlewareError> {
        if keywords.len() != values.len() {
            return Err(RemapMiddlewareError::ConfigError(format!(
                "{} keywords but {} values",
                keywords.len(),
                values.len()
            )));
        }
        let mut settings = Settings::default();
        for (key, value) in keywords.iter().zip(values) {
            if expand_dbname && *key == "dbname" && value.contains('=') {
                for (k, v) in parse_pairs(value)? {
                    settings.set(&k, &v)?;
                }
            } else {
                settings.set(key, value)?;
            }
        }
        Ok(settings.finish())
    }

    #[must_use]
    pub fn is_memory(&self) -> bool {
        self.path == MEMORY_PATH
    }
}

fn parse_pairs(conninfo: &str) -> Result<Vec<(String, String)>, RemapMiddlewareError> {
    let mut pairs = Vec::new();
    let mut chars = conninfo.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.peek().is_none() {
            break;
        }

        let mut key = String::new();
        while let Some(c) = chars.next_if(|c| *c != '=' && !c.is_whitespace()) {
            key.push(c);
        }
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.next() != Some('=') {
            return Err(RemapMiddlewareError::ConfigError(format!(
                "missing \"=\" after \"{key}\" in connection info string"
            )));
        }
        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        let mut value = String::new();
        if chars.next_if_eq(&'\'').is_some() {
            loop {
                match chars.next() {
                    Some('\\') => match chars.next() {
                        Some(c) => value.push(c),
                        None => break,
                    },
                    Some('\'') => break,
                    Some(c) => value.push(c),
                    None => {
                        return Err(RemapMiddlewareError::ConfigError(
                            "unterminated quoted string in connection info string".to_string(),
                        ));
                    }
                }
            }
        } else {
            while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                if c == '\\' {
                    if let Some(escaped) = chars.next() {
                        value.push(escaped);
                    }
                } else {
                    value.push(c);
                }
            }
        }
        pairs.push((key, value));
    }
    Ok(pairs)
}
