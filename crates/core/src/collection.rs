//! Ordered container over model instances.
//!
//! Insertion order is significant for display; uniqueness is not enforced
//! (dedup via [`Collection::unique_by`] is opt-in). Lookup helpers are
//! linear scans with no index maintained — fine at UI list scale, not
//! meant for high-volume sets.

use uuid::Uuid;

use crate::{Choice, Keyed};

#[derive(Debug, Clone)]
pub struct Collection<T> {
    items: Vec<T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> Collection<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_not_empty(&self) -> bool {
        !self.is_empty()
    }

    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn push(&mut self, item: T) -> &mut Self {
        self.items.push(item);
        self
    }

    pub fn push_many(&mut self, items: impl IntoIterator<Item = T>) -> &mut Self {
        self.items.extend(items);
        self
    }

    /// Remove by position; `None` when the index is out of range.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        if index < self.items.len() {
            Some(self.items.remove(index))
        } else {
            None
        }
    }

    /// Remove the first element matching the predicate, returning it.
    pub fn remove_by(&mut self, predicate: impl Fn(&T) -> bool) -> Option<T> {
        let idx = self.items.iter().position(predicate)?;
        Some(self.items.remove(idx))
    }

    pub fn clear(&mut self) -> &mut Self {
        self.items.clear();
        self
    }

    pub fn each(&self, mut f: impl FnMut(&T, usize)) {
        for (i, item) in self.items.iter().enumerate() {
            f(item, i);
        }
    }

    pub fn find(&self, predicate: impl Fn(&T) -> bool) -> Option<&T> {
        self.items.iter().find(|item| predicate(item))
    }

    pub fn find_index(&self, predicate: impl Fn(&T) -> bool) -> Option<usize> {
        self.items.iter().position(predicate)
    }

    pub fn map<U>(&self, mut f: impl FnMut(&T, usize) -> U) -> Collection<U> {
        Collection::new(self.items.iter().enumerate().map(|(i, item)| f(item, i)).collect())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn to_options(
        &self,
        label: impl Fn(&T) -> String,
        value: impl Fn(&T) -> serde_json::Value,
    ) -> Vec<Choice> {
        self.items.iter().map(|item| Choice::new(label(item), value(item))).collect()
    }
}

impl<T: Clone> Collection<T> {
    /// Defensive copy of the backing sequence.
    pub fn all(&self) -> Vec<T> {
        self.items.clone()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.all()
    }

    /// New collection of the elements matching the predicate; the source
    /// is left untouched.
    pub fn filter(&self, predicate: impl Fn(&T) -> bool) -> Collection<T> {
        Collection::new(self.items.iter().filter(|item| predicate(item)).cloned().collect())
    }

    /// New collection sorted by the comparator; the source is left
    /// untouched.
    pub fn sorted_by(&self, mut cmp: impl FnMut(&T, &T) -> std::cmp::Ordering) -> Collection<T> {
        let mut items = self.items.clone();
        items.sort_by(&mut cmp);
        Collection::new(items)
    }

    /// New collection of `[start, end)`; out-of-range bounds are clamped.
    pub fn slice(&self, start: usize, end: Option<usize>) -> Collection<T> {
        let len = self.items.len();
        let start = start.min(len);
        let end = end.unwrap_or(len).min(len).max(start);
        Collection::new(self.items[start..end].to_vec())
    }

    /// Stable first-occurrence dedup keyed by `key`.
    pub fn unique_by<K: std::hash::Hash + Eq>(&self, key: impl Fn(&T) -> K) -> Collection<T> {
        let mut seen = std::collections::HashSet::new();
        let mut items = Vec::new();
        for item in &self.items {
            if seen.insert(key(item)) {
                items.push(item.clone());
            }
        }
        Collection::new(items)
    }
}

impl<T: Keyed> Collection<T> {
    pub fn find_by_id(&self, id: i64) -> Option<&T> {
        self.find(|item| item.id() == Some(id))
    }

    pub fn find_by_uuid(&self, uuid: Uuid) -> Option<&T> {
        self.find(|item| item.uuid() == uuid)
    }

    pub fn contains(&self, item: &T) -> bool {
        self.find_by_uuid(item.uuid()).is_some()
    }

    pub fn remove_by_id(&mut self, id: i64) -> Option<T> {
        self.remove_by(|item| item.id() == Some(id))
    }

    pub fn remove_by_uuid(&mut self, uuid: Uuid) -> Option<T> {
        self.remove_by(|item| item.uuid() == uuid)
    }

    /// Replace the element with the given uuid, if present.
    pub fn replace_by_uuid(&mut self, uuid: Uuid, next: T) -> &mut Self {
        if let Some(idx) = self.find_index(|item| item.uuid() == uuid) {
            self.items[idx] = next;
        }
        self
    }

    pub fn replace_by_id(&mut self, id: i64, next: T) -> &mut Self {
        if let Some(idx) = self.find_index(|item| item.id() == Some(id)) {
            self.items[idx] = next;
        }
        self
    }
}

impl<T: Keyed + Clone> Collection<T> {
    pub fn where_ids(&self, ids: &[i64]) -> Collection<T> {
        self.filter(|item| item.id().map(|id| ids.contains(&id)).unwrap_or(false))
    }
}

impl<T> FromIterator<T> for Collection<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<T> IntoIterator for Collection<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Collection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        uuid: Uuid,
        id: Option<i64>,
        name: &'static str,
    }

    impl Item {
        fn new(id: i64, name: &'static str) -> Self {
            Self { uuid: Uuid::new_v4(), id: Some(id), name }
        }
    }

    impl Keyed for Item {
        fn uuid(&self) -> Uuid {
            self.uuid
        }
        fn id(&self) -> Option<i64> {
            self.id
        }
    }

    fn abc() -> Collection<Item> {
        Collection::new(vec![Item::new(1, "a"), Item::new(2, "b"), Item::new(3, "c")])
    }

    #[test]
    fn remove_by_id_returns_element_and_keeps_order() {
        let mut col = abc();
        let removed = col.remove_by_id(2).unwrap();
        assert_eq!(removed.name, "b");
        let names: Vec<_> = col.iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["a", "c"]);
        assert!(col.remove_by_id(99).is_none());
    }

    #[test]
    fn transforms_never_mutate_the_source() {
        let col = abc();
        let filtered = col.filter(|i| i.id() == Some(1));
        let sorted = col.sorted_by(|a, b| b.id.cmp(&a.id));
        let sliced = col.slice(1, Some(2));
        assert_eq!(filtered.count(), 1);
        assert_eq!(sorted.first().unwrap().name, "c");
        assert_eq!(sliced.count(), 1);
        assert_eq!(col.count(), 3);
        let names: Vec<_> = col.iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn unique_by_keeps_first_occurrence() {
        let mut col = abc();
        let dup = Item::new(1, "a2");
        col.push(dup);
        let unique = col.unique_by(|i| i.id);
        assert_eq!(unique.count(), 3);
        assert_eq!(unique.first().unwrap().name, "a");
    }

    #[test]
    fn where_ids_filters_by_key() {
        let col = abc();
        let subset = col.where_ids(&[1, 3]);
        let names: Vec<_> = subset.iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn replace_by_uuid_swaps_in_place() {
        let mut col = abc();
        let target = col.get(1).unwrap().uuid();
        let next = Item::new(20, "b2");
        col.replace_by_uuid(target, next);
        assert_eq!(col.get(1).unwrap().name, "b2");
        assert_eq!(col.count(), 3);
    }

    #[test]
    fn to_options_builds_label_value_pairs() {
        let col = abc();
        let options = col.to_options(
            |i| i.name.to_string(),
            |i| serde_json::Value::from(i.id.unwrap_or_default()),
        );
        assert_eq!(options.len(), 3);
        assert_eq!(options[0].label, "a");
        assert_eq!(options[0].value, serde_json::Value::from(1));
    }

    #[test]
    fn slice_clamps_out_of_range_bounds() {
        let col = abc();
        assert_eq!(col.slice(2, Some(99)).count(), 1);
        assert_eq!(col.slice(9, None).count(), 0);
    }
}
