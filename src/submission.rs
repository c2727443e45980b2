use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, SecondsFormat, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Caller-supplied payload of a submission. No schema is imposed.
pub type Fields = Map<String, Value>;

/// Keys assigned by the store; submitted values under these names are dropped.
pub const RESERVED_KEYS: [&str; 2] = ["id", "timestamp"];

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 9;

/// Last millisecond value handed out by [`generate_id`].
static LAST_MILLIS: AtomicU64 = AtomicU64::new(0);

/// One feedback entry.
///
/// Serialized as a flat object: `id` and `timestamp` sit beside the
/// submitter's own fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    pub timestamp: String,
    #[serde(flatten)]
    pub fields: Fields,
}

impl Submission {
    /// Build a new submission stamped with a fresh id and the current time.
    pub fn new(mut fields: Fields) -> Self {
        for key in RESERVED_KEYS {
            fields.remove(key);
        }
        let now = Utc::now();
        Self {
            id: generate_id(now),
            timestamp: format_timestamp(now),
            fields,
        }
    }

    /// String value of a submitted field, if present and a string.
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }
}

/// ISO-8601 UTC with millisecond precision, e.g. `2024-05-01T09:30:00.123Z`.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Generate a submission id: a base-36 millisecond component followed by a
/// random base-36 suffix.
///
/// The millisecond component never repeats within a process. When the clock
/// has not moved past the last issued value it is bumped by one, so ids stay
/// distinct even for calls landing in the same millisecond.
pub fn generate_id(now: DateTime<Utc>) -> String {
    let now_ms = u64::try_from(now.timestamp_millis()).unwrap_or(0);
    let millis = match LAST_MILLIS.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
        Some(now_ms.max(last + 1))
    }) {
        Ok(prev) | Err(prev) => now_ms.max(prev + 1),
    };

    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();

    format!("{}{}", to_base36(millis), suffix)
}

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE36[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}
