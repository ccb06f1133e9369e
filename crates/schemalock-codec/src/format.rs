use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use schemalock_core::{Error, Result};

/// Read a file and parse it as JSON, mapping failures to format errors.
pub(crate) fn read_json(path: &Path) -> Result<Value> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        Err(err) => {
            return Err(Error::invalid_format(
                path,
                format!("file is unreadable: {err}"),
            ));
        }
    };
    parse_json(&text, path)
}

pub(crate) fn parse_json(text: &str, path: &Path) -> Result<Value> {
    serde_json::from_str(text)
        .map_err(|err| Error::invalid_format(path, format!("not valid JSON: {err}")))
}

/// Pretty JSON with a trailing newline.
pub(crate) fn to_text(value: &Value) -> String {
    let mut text = serde_json::to_string_pretty(value).unwrap_or_default();
    text.push('\n');
    text
}

/// Field accessors that report the location of malformed entries.
pub(crate) struct Reader<'a> {
    path: &'a Path,
    location: String,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(path: &'a Path, location: impl Into<String>) -> Self {
        Self {
            path,
            location: location.into(),
        }
    }

    pub(crate) fn nested(&self, location: impl AsRef<str>) -> Reader<'a> {
        Reader {
            path: self.path,
            location: format!("{}, {}", self.location, location.as_ref()),
        }
    }

    pub(crate) fn error(&self, reason: impl AsRef<str>) -> Error {
        Error::invalid_format(
            PathBuf::from(self.path),
            format!("{}: {}", self.location, reason.as_ref()),
        )
    }

    pub(crate) fn object<'v>(&self, value: &'v Value) -> Result<&'v Map<String, Value>> {
        value
            .as_object()
            .ok_or_else(|| self.error("expected a mapping"))
    }

    pub(crate) fn string(&self, entry: &Map<String, Value>, key: &str) -> Result<String> {
        self.optional_string(entry, key)?
            .ok_or_else(|| self.error(format!("`{key}` is required")))
    }

    pub(crate) fn optional_string(
        &self,
        entry: &Map<String, Value>,
        key: &str,
    ) -> Result<Option<String>> {
        match entry.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(text)) => Ok(Some(text.clone())),
            Some(_) => Err(self.error(format!("`{key}` must be a string"))),
        }
    }

    pub(crate) fn bool_or(&self, entry: &Map<String, Value>, key: &str, fallback: bool) -> Result<bool> {
        match entry.get(key) {
            None | Some(Value::Null) => Ok(fallback),
            Some(Value::Bool(flag)) => Ok(*flag),
            Some(_) => Err(self.error(format!("`{key}` must be a boolean"))),
        }
    }

    pub(crate) fn optional_u32(&self, entry: &Map<String, Value>, key: &str) -> Result<Option<u32>> {
        match entry.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value
                .as_u64()
                .and_then(|number| u32::try_from(number).ok())
                .map(Some)
                .ok_or_else(|| self.error(format!("`{key}` must be a non-negative integer"))),
        }
    }

    pub(crate) fn strings(&self, entry: &Map<String, Value>, key: &str) -> Result<Vec<String>> {
        let items = entry
            .get(key)
            .and_then(Value::as_array)
            .ok_or_else(|| self.error(format!("`{key}` must be a list of names")))?;

        items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| self.error(format!("`{key}` must contain only names")))
            })
            .collect()
    }
}

pub(crate) fn string_list(items: &[String]) -> Value {
    Value::Array(items.iter().cloned().map(Value::String).collect())
}
