use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Label used when a stored record has no category.
pub const FALLBACK_CATEGORY: &str = "Other";

/// A finished (or explicitly saved) work interval.
///
/// Records are immutable and append-only. The JSON shape uses camelCase so
/// histories written by earlier app versions load unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: i64,
    /// Focused seconds, never above the configured work duration.
    #[serde(default, deserialize_with = "null_as_zero")]
    pub duration: u64,
    #[serde(default = "fallback_category", deserialize_with = "null_as_fallback_category")]
    pub category: String,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub distractions: u32,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub pause_count: u32,
    /// Completion time.
    pub date: DateTime<Utc>,
}

fn fallback_category() -> String {
    FALLBACK_CATEGORY.to_string()
}

fn null_as_fallback_category<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(fallback_category))
}

/// Counters written as `null` read as zero, like absent ones.
fn null_as_zero<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Hands out record ids from the completion timestamp.
///
/// Two records created within the same millisecond get consecutive ids.
#[derive(Debug, Clone, Default)]
pub struct RecordIdGen {
    last: i64,
}

impl RecordIdGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self, at: DateTime<Utc>) -> i64 {
        let candidate = at.timestamp_millis();
        self.last = if candidate > self.last {
            candidate
        } else {
            self.last + 1
        };
        self.last
    }
}
