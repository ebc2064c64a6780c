use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

use crate::models::ContentItem;

/// A closed status vocabulary. Missing, null, non-string and unrecognised
/// wire values all decode to `DEFAULT`.
pub trait Vocabulary: Copy + Ord + Sized + 'static {
    /// Wire name of the field this vocabulary describes.
    const FIELD: &'static str;
    const DEFAULT: Self;
    const VALUES: &'static [(&'static str, Self)];

    fn as_str(&self) -> &'static str {
        Self::VALUES
            .iter()
            .find(|(_, v)| v == self)
            .map(|(name, _)| *name)
            .unwrap_or("")
    }

    /// Look up a raw wire value, defaulting when absent or unknown.
    fn parse(raw: Option<&str>) -> Self {
        raw.map(|s| s.trim().to_ascii_lowercase())
            .and_then(|s| {
                Self::VALUES
                    .iter()
                    .find(|(name, _)| *name == s)
                    .map(|(_, v)| *v)
            })
            .unwrap_or(Self::DEFAULT)
    }

    fn from_value(value: &serde_json::Value) -> Self {
        Self::parse(value.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AsrStatus {
    Ready,
    Fallback,
    Pending,
    Missing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SummaryStatus {
    Ready,
    Pending,
    SkippedFallback,
    Blocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContentQuality {
    Full,
    Summary,
    Missing,
}

impl Vocabulary for AsrStatus {
    const FIELD: &'static str = "asr_status";
    const DEFAULT: Self = AsrStatus::Pending;
    const VALUES: &'static [(&'static str, Self)] = &[
        ("ready", AsrStatus::Ready),
        ("fallback", AsrStatus::Fallback),
        ("pending", AsrStatus::Pending),
        ("missing", AsrStatus::Missing),
    ];
}

impl Vocabulary for SummaryStatus {
    const FIELD: &'static str = "summary_status";
    const DEFAULT: Self = SummaryStatus::Pending;
    const VALUES: &'static [(&'static str, Self)] = &[
        ("ready", SummaryStatus::Ready),
        ("pending", SummaryStatus::Pending),
        ("skipped_fallback", SummaryStatus::SkippedFallback),
        ("blocked", SummaryStatus::Blocked),
    ];
}

impl Vocabulary for ContentQuality {
    const FIELD: &'static str = "content_quality";
    const DEFAULT: Self = ContentQuality::Summary;
    const VALUES: &'static [(&'static str, Self)] = &[
        ("full", ContentQuality::Full),
        ("summary", ContentQuality::Summary),
        ("missing", ContentQuality::Missing),
    ];
}

impl Default for AsrStatus {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Default for SummaryStatus {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Default for ContentQuality {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Field name, accepted values and default for each vocabulary.
pub fn vocabulary_table() -> [(&'static str, Vec<&'static str>, &'static str); 3] {
    fn row<V: Vocabulary>() -> (&'static str, Vec<&'static str>, &'static str) {
        (
            V::FIELD,
            V::VALUES.iter().map(|(name, _)| *name).collect(),
            V::DEFAULT.as_str(),
        )
    }
    [row::<AsrStatus>(), row::<SummaryStatus>(), row::<ContentQuality>()]
}

macro_rules! wire_string {
    ($($ty:ty),*) => {$(
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let value = serde_json::Value::deserialize(deserializer)?;
                Ok(<$ty>::from_value(&value))
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    )*};
}

wire_string!(AsrStatus, SummaryStatus, ContentQuality);

/// The three status tags of one item, defaults already applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ItemStatus {
    pub asr: AsrStatus,
    pub summary: SummaryStatus,
    pub quality: ContentQuality,
}

impl ItemStatus {
    pub fn of(item: &ContentItem) -> Self {
        Self {
            asr: item.asr_status,
            summary: item.summary_status,
            quality: item.content_quality,
        }
    }
}

/// Per-value tallies over a set of items. Unobserved values have no key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub total: usize,
    pub asr_status: BTreeMap<AsrStatus, usize>,
    pub summary_status: BTreeMap<SummaryStatus, usize>,
    pub content_quality: BTreeMap<ContentQuality, usize>,
}

impl StatusCounts {
    /// Single pass over the items.
    pub fn rollup<'a, I>(items: I) -> Self
    where
        I: IntoIterator<Item = &'a ContentItem>,
    {
        let mut counts = StatusCounts::default();
        for item in items {
            counts.record(ItemStatus::of(item));
        }
        counts
    }

    pub fn record(&mut self, status: ItemStatus) {
        self.total += 1;
        *self.asr_status.entry(status.asr).or_insert(0) += 1;
        *self.summary_status.entry(status.summary).or_insert(0) += 1;
        *self.content_quality.entry(status.quality).or_insert(0) += 1;
    }

    pub fn asr(&self, value: AsrStatus) -> usize {
        self.asr_status.get(&value).copied().unwrap_or(0)
    }

    pub fn summary(&self, value: SummaryStatus) -> usize {
        self.summary_status.get(&value).copied().unwrap_or(0)
    }

    pub fn quality(&self, value: ContentQuality) -> usize {
        self.content_quality.get(&value).copied().unwrap_or(0)
    }
}

/// Wire shape of a rollup embedded by the backend. Keys are free strings until
/// folded into the vocabularies, so two unknown keys may merge into the default.
#[derive(Debug, Default, Deserialize)]
struct RawStatusCounts {
    #[serde(default)]
    total: Option<usize>,
    #[serde(default)]
    asr_status: BTreeMap<String, usize>,
    #[serde(default)]
    summary_status: BTreeMap<String, usize>,
    #[serde(default)]
    content_quality: BTreeMap<String, usize>,
}

fn fold<V: Vocabulary>(raw: BTreeMap<String, usize>) -> BTreeMap<V, usize> {
    let mut out = BTreeMap::new();
    for (key, count) in raw {
        if count > 0 {
            *out.entry(V::parse(Some(&key))).or_insert(0) += count;
        }
    }
    out
}

impl<'de> Deserialize<'de> for StatusCounts {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawStatusCounts::deserialize(deserializer)?;
        let asr_status = fold::<AsrStatus>(raw.asr_status);
        let total = raw
            .total
            .unwrap_or_else(|| asr_status.values().sum());
        Ok(StatusCounts {
            total,
            asr_status,
            summary_status: fold::<SummaryStatus>(raw.summary_status),
            content_quality: fold::<ContentQuality>(raw.content_quality),
        })
    }
}
