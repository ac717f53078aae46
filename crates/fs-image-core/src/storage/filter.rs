use rusqlite::types::Value;
use std::fmt;

/// Row filter for the hash pass, applied to `FileEntry` columns.
///
/// An empty filter selects every file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileFilter {
    /// SQL `like` pattern over the file name, e.g. `%.jpg`.
    pub name_like: Option<String>,
    /// Inclusive lower bound on file size in bytes.
    pub min_size: Option<u64>,
    /// Exclusive upper bound on file size in bytes.
    pub max_size: Option<u64>,
}

impl FileFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_name_like(mut self, pattern: &str) -> Self {
        self.name_like = Some(pattern.to_string());
        self
    }

    pub fn with_min_size(mut self, bytes: u64) -> Self {
        self.min_size = Some(bytes);
        self
    }

    pub fn with_max_size(mut self, bytes: u64) -> Self {
        self.max_size = Some(bytes);
        self
    }

    /// Condition over the `ff` (FileEntry) alias plus its bound values.
    pub(crate) fn where_clause(&self) -> (String, Vec<Value>) {
        let mut terms = Vec::new();
        let mut values = Vec::new();

        if let Some(pattern) = &self.name_like {
            terms.push("ff.name like ?");
            values.push(Value::Text(pattern.clone()));
        }
        if let Some(min) = self.min_size {
            terms.push("ff.size >= ?");
            values.push(Value::Integer(clamp_size(min)));
        }
        if let Some(max) = self.max_size {
            terms.push("ff.size < ?");
            values.push(Value::Integer(clamp_size(max)));
        }

        if terms.is_empty() {
            ("1 = 1".to_string(), values)
        } else {
            (terms.join(" and "), values)
        }
    }
}

fn clamp_size(bytes: u64) -> i64 {
    i64::try_from(bytes).unwrap_or(i64::MAX)
}

impl fmt::Display for FileFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(pattern) = &self.name_like {
            parts.push(format!("name like '{}'", pattern));
        }
        if let Some(min) = self.min_size {
            parts.push(format!("size >= {}", min));
        }
        if let Some(max) = self.max_size {
            parts.push(format!("size < {}", max));
        }
        if parts.is_empty() {
            write!(f, "all files")
        } else {
            write!(f, "{}", parts.join(" and "))
        }
    }
}
