use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::comic::{ComicId, Entry};

const KEY_PREFIX: &str = "xkcd-";

/// Dataset key. Always textual so consumers with loose key typing never treat
/// the mapping as an array.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct DatasetKey(String);

impl DatasetKey {
    pub fn for_id(id: ComicId) -> Self {
        Self(format!("{KEY_PREFIX}{id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatasetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Ord for DatasetKey {
    fn cmp(&self, other: &Self) -> Ordering {
        natural_cmp(&self.0, &other.0).then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for DatasetKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compares strings so that runs of digits order by numeric value, e.g.
/// `xkcd-9` before `xkcd-10`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a = a;
    let mut b = b;
    loop {
        match (a.chars().next(), b.chars().next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(ca), Some(cb)) if ca.is_ascii_digit() && cb.is_ascii_digit() => {
                let (da, rest_a) = split_digits(a);
                let (db, rest_b) = split_digits(b);
                let ord = cmp_digit_runs(da, db);
                if ord != Ordering::Equal {
                    return ord;
                }
                a = rest_a;
                b = rest_b;
            }
            (Some(ca), Some(cb)) => {
                let ord = ca.cmp(&cb);
                if ord != Ordering::Equal {
                    return ord;
                }
                a = &a[ca.len_utf8()..];
                b = &b[cb.len_utf8()..];
            }
        }
    }
}

fn split_digits(s: &str) -> (&str, &str) {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(end)
}

// Leading zeros don't change the value; after stripping them the longer run
// is the larger number.
fn cmp_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// All known comics, keyed by [`DatasetKey`]. Iteration (and therefore
/// serialization) follows natural key order.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct Dataset {
    entries: BTreeMap<DatasetKey, Entry>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Highest comic id present, or 0 for an empty dataset.
    pub fn max_id(&self) -> ComicId {
        self.entries.values().map(|e| e.id).max().unwrap_or(0)
    }

    /// Inserts under the key derived from `entry.id`, returning any entry it
    /// replaced.
    pub fn insert(&mut self, entry: Entry) -> Option<Entry> {
        self.entries.insert(DatasetKey::for_id(entry.id), entry)
    }

    pub fn get(&self, id: ComicId) -> Option<&Entry> {
        self.entries.get(&DatasetKey::for_id(id))
    }

    pub fn contains(&self, id: ComicId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DatasetKey, &Entry)> {
        self.entries.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = ComicId> + '_ {
        self.entries.values().map(|e| e.id)
    }
}

/// Accepts a JSON object, or `[]`: PHP's `json_encode` writes an empty
/// associative array as a list.
impl<'de> Deserialize<'de> for Dataset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DatasetVisitor)
    }
}

struct DatasetVisitor;

impl<'de> Visitor<'de> for DatasetVisitor {
    type Value = Dataset;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of comics or an empty list")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut entries = BTreeMap::new();
        while let Some((key, entry)) = map.next_entry::<DatasetKey, Entry>()? {
            entries.insert(key, entry);
        }
        Ok(Dataset { entries })
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        if seq.next_element::<IgnoredAny>()?.is_some() {
            return Err(de::Error::invalid_length(1, &"an empty list"));
        }
        Ok(Dataset::default())
    }
}

impl FromIterator<Entry> for Dataset {
    fn from_iter<T: IntoIterator<Item = Entry>>(iter: T) -> Self {
        let mut dataset = Self::new();
        for entry in iter {
            dataset.insert(entry);
        }
        dataset
    }
}

#[cfg(test)]
pub(crate) fn sample_entry(id: ComicId) -> Entry {
    Entry {
        id,
        date: 1_136_113_200 + i64::from(id) * 86_400,
        title: format!("Comic {id}"),
        image_url: format!("https://imgs.xkcd.com/comics/comic_{id}.png"),
        alt_text: format!("alt text {id}"),
        transcript: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_embeds_id() {
        assert_eq!(DatasetKey::for_id(614).as_str(), "xkcd-614");
        assert_eq!(DatasetKey::for_id(1).to_string(), "xkcd-1");
    }

    #[test]
    fn natural_order_is_numeric_aware() {
        assert_eq!(natural_cmp("xkcd-9", "xkcd-10"), Ordering::Less);
        assert_eq!(natural_cmp("xkcd-100", "xkcd-99"), Ordering::Greater);
        assert_eq!(natural_cmp("xkcd-10", "xkcd-10"), Ordering::Equal);
        assert_eq!(natural_cmp("xkcd-007", "xkcd-7"), Ordering::Equal);
        assert_eq!(natural_cmp("a2", "b1"), Ordering::Less);
        assert_eq!(natural_cmp("xkcd", "xkcd-1"), Ordering::Less);
    }

    #[test]
    fn key_order_is_total() {
        let a = DatasetKey("xkcd-007".into());
        let b = DatasetKey("xkcd-7".into());
        assert_ne!(a.cmp(&b), Ordering::Equal);
        assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
    }

    #[test]
    fn iteration_follows_natural_order() {
        let dataset: Dataset = [10, 2, 1, 100, 9].into_iter().map(sample_entry).collect();
        let keys: Vec<_> = dataset.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, ["xkcd-1", "xkcd-2", "xkcd-9", "xkcd-10", "xkcd-100"]);
    }

    #[test]
    fn max_id_of_empty_dataset_is_zero() {
        let mut dataset = Dataset::new();
        assert_eq!(dataset.max_id(), 0);
        dataset.insert(sample_entry(12));
        dataset.insert(sample_entry(3));
        assert_eq!(dataset.max_id(), 12);
    }

    #[test]
    fn insert_overwrites_existing_entry() {
        let mut dataset = Dataset::new();
        assert!(dataset.insert(sample_entry(5)).is_none());

        let mut updated = sample_entry(5);
        updated.title = "Retitled".into();
        let previous = dataset.insert(updated).unwrap();

        assert_eq!(previous.title, "Comic 5");
        assert_eq!(dataset.get(5).unwrap().title, "Retitled");
        assert_eq!(dataset.len(), 1);
    }

    #[test]
    fn empty_list_deserializes_as_empty_dataset() {
        let dataset: Dataset = serde_json::from_str("[]").unwrap();
        assert!(dataset.is_empty());
        assert_eq!(dataset.max_id(), 0);

        let dataset: Dataset = serde_json::from_str("[\n\n]").unwrap();
        assert!(dataset.is_empty());
    }

    #[test]
    fn non_empty_list_is_rejected() {
        assert!(serde_json::from_str::<Dataset>("[1]").is_err());
        assert!(serde_json::from_str::<Dataset>("[{}]").is_err());
        assert!(serde_json::from_str::<Dataset>("42").is_err());
    }

    #[test]
    fn deserializes_from_stored_mapping() {
        let json = r#"{
            "xkcd-2": {"id": 2, "date": 1136199600, "title": "Petit Trees (sketch)",
                       "image": "https://imgs.xkcd.com/comics/tree_cropped_(1).jpg",
                       "alt": "'Petit' being a reference to Le Petit Prince", "transcript": ""},
            "xkcd-1": {"id": 1, "date": 1136113200, "title": "Barrel - Part 1",
                       "image": "https://imgs.xkcd.com/comics/barrel_cropped_(1).jpg",
                       "alt": "Don't we all.", "transcript": ""}
        }"#;
        let dataset: Dataset = serde_json::from_str(json).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.max_id(), 2);
        assert_eq!(dataset.ids().collect::<Vec<_>>(), [1, 2]);
        assert_eq!(dataset.get(1).unwrap().alt_text, "Don't we all.");
    }
}
