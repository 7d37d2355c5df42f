use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;
use serde_json::Value;

/// Composite cache address: a resource name followed by the parameters that
/// distinguish one read from another.
///
/// Keys compare structurally. Two filter objects with the same field values
/// produce the same key no matter how they were built, and object members are
/// ordered canonically before hashing.
#[derive(Clone)]
pub struct QueryKey {
    segments: Vec<Value>,
    canonical: String,
}

impl QueryKey {
    pub fn new(resource: &str) -> Self {
        Self::from_segments(vec![Value::String(resource.to_string())])
    }

    /// Appends one parameter segment. A part that cannot be represented as
    /// JSON becomes `null`.
    pub fn with(self, part: impl Serialize) -> Self {
        let mut segments = self.segments;
        segments.push(serde_json::to_value(part).unwrap_or(Value::Null));
        Self::from_segments(segments)
    }

    fn from_segments(segments: Vec<Value>) -> Self {
        let mut canonical = String::new();
        for segment in &segments {
            write_canonical(segment, &mut canonical);
            canonical.push('/');
        }
        Self {
            segments,
            canonical,
        }
    }

    /// Partial match used by invalidation: `["offers"]` covers every
    /// offer list, detail and history key.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.segments.len() >= prefix.segments.len()
            && self.canonical.starts_with(&prefix.canonical)
    }
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut members: Vec<_> = map.iter().collect();
            members.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (name, member)) in members.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(name.clone()).to_string());
                out.push(':');
                write_canonical(member, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

impl PartialEq for QueryKey {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for QueryKey {}

impl Hash for QueryKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl fmt::Debug for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QueryKey({})", self)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical.trim_end_matches('/'))
    }
}
