//! Key/value records and the ordered, lock-guarded list holding them.

use parking_lot::Mutex;

/// One display row: the first word of a status line and the rest of it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub key: String,
    pub value: String,
}

/// Replaces tabs and line terminators with spaces, and drops leading spaces.
pub fn normalize(line: &str) -> String {
    let spaced: String = line
        .chars()
        .map(|c| match c {
            '\t' | '\n' | '\r' => ' ',
            c => c,
        })
        .collect();
    spaced.trim_start_matches(' ').to_string()
}

impl Record {
    pub fn new<K: Into<String>, V: Into<String>>(key: K, value: V) -> Record {
        Record {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Splits a raw line into key (first space-delimited token) and value
    /// (the remainder, left-trimmed). Returns `None` when the line has no
    /// separating space.
    pub fn parse(line: &str) -> Option<Record> {
        let line = normalize(line);
        let (key, value) = line.split_once(' ')?;
        Some(Record::new(key, value.trim_start_matches(' ')))
    }
}

/// Ordered list of records. Keys may repeat and insertion order is kept.
///
/// All access goes through an internal mutex, so a `Records` can be shared
/// with another reader without auditing each call site.
#[derive(Debug, Default)]
pub struct Records {
    inner: Mutex<Vec<Record>>,
}

impl Records {
    pub fn new() -> Records {
        Records {
            inner: Mutex::new(Vec::with_capacity(1000)),
        }
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Parses and appends a raw line. Returns false, appending nothing,
    /// if the line has no key/value separator.
    pub fn add_line(&self, line: &str) -> bool {
        match Record::parse(line) {
            Some(record) => {
                self.inner.lock().push(record);
                true
            }
            None => false,
        }
    }

    pub fn add<K: Into<String>, V: Into<String>>(&self, key: K, value: V) {
        self.push(Record::new(key, value));
    }

    pub fn push(&self, record: Record) {
        self.inner.lock().push(record);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Returns the record at `index`, if there is one.
    pub fn get(&self, index: usize) -> Option<Record> {
        self.inner.lock().get(index).cloned()
    }

    /// Like `get`, but returns an empty record when `index` is out of range.
    pub fn record_at(&self, index: usize) -> Record {
        self.get(index).unwrap_or_default()
    }

    pub fn exists(&self, key: &str) -> bool {
        self.inner.lock().iter().any(|r| r.key == key)
    }

    /// Value of the first record with this key.
    pub fn value(&self, key: &str) -> Option<String> {
        self.inner
            .lock()
            .iter()
            .find(|r| r.key == key)
            .map(|r| r.value.clone())
    }

    /// Returns a new list holding the records whose key starts with `prefix`,
    /// in their original order.
    pub fn with_key_prefix(&self, prefix: &str) -> Records {
        let subset: Vec<Record> = self
            .inner
            .lock()
            .iter()
            .filter(|r| r.key.starts_with(prefix))
            .cloned()
            .collect();
        Records {
            inner: Mutex::new(subset),
        }
    }

    /// Joins all records as `key<separator>value`, one per line, each line
    /// cut to `max_len` characters.
    pub fn to_text(&self, separator: &str, line_end: &str, max_len: usize) -> String {
        self.inner
            .lock()
            .iter()
            .map(|r| {
                format!("{}{}{}", r.key, separator, r.value)
                    .chars()
                    .take(max_len)
                    .collect::<String>()
            })
            .collect::<Vec<String>>()
            .join(line_end)
    }

    /// Character length of the longest key.
    pub fn max_key_len(&self) -> usize {
        self.inner
            .lock()
            .iter()
            .map(|r| r.key.chars().count())
            .max()
            .unwrap_or(0)
    }

    /// Copies the current contents out.
    pub fn to_vec(&self) -> Vec<Record> {
        self.inner.lock().clone()
    }
}
