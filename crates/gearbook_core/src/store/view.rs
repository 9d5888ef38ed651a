//! Read-only views over the working buffer: search, progress and set groups.

use serde::Serialize;

use crate::entry::CollectionEntry;
use crate::sets::{SetMap, find_item_set};
use crate::slot::Slot;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFilter {
    pub query: String,
    pub hide_completed: bool,
}

impl EntryFilter {
    pub fn new(query: &str, hide_completed: bool) -> Self {
        Self {
            query: query.trim().to_lowercase(),
            hide_completed,
        }
    }

    pub fn is_searching(&self) -> bool {
        !self.query.is_empty()
    }

    fn matches_query(&self, entry: &CollectionEntry) -> bool {
        !self.is_searching() || entry.name.to_lowercase().contains(&self.query)
    }

    pub fn matches(&self, entry: &CollectionEntry) -> bool {
        self.matches_query(entry) && !(self.hide_completed && entry.done)
    }
}

/// An entry with its position in the working buffer.
pub type IndexedEntry<'a> = (usize, &'a CollectionEntry);

pub fn filter_entries<'a>(entries: &'a [CollectionEntry], filter: &EntryFilter) -> Vec<IndexedEntry<'a>> {
    entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| filter.matches(entry))
        .collect()
}

fn percent(done: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (done as f64 / total as f64 * 100.0).round() as u32
}

/// Rounded share of done entries. While searching only matching entries
/// count; "hide completed" never changes the figure.
pub fn completion_percent(entries: &[CollectionEntry], filter: &EntryFilter) -> u32 {
    let counted: Vec<&CollectionEntry> = entries
        .iter()
        .filter(|entry| filter.matches_query(entry))
        .collect();
    percent(counted.iter().filter(|e| e.done).count(), counted.len())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetGroup<'a> {
    pub name: String,
    pub done: usize,
    pub total: usize,
    pub percent: u32,
    #[serde(skip)]
    pub entries: Vec<IndexedEntry<'a>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupedEntries<'a> {
    pub sets: Vec<SetGroup<'a>>,
    pub individual: Vec<IndexedEntry<'a>>,
}

/// Groups filtered entries under their equipment set. An entry's explicit
/// `set` tag wins; otherwise the catalog slot is used to match a member.
/// Groups whose set is no longer derived fall back to individual entries.
pub fn group_by_sets<'a, F>(entries: &[IndexedEntry<'a>], sets: &SetMap, slot_of: F) -> GroupedEntries<'a>
where
    F: Fn(&CollectionEntry) -> Option<Slot>,
{
    let mut grouped = GroupedEntries::default();
    for &(idx, entry) in entries {
        let set_name = entry
            .set
            .as_deref()
            .filter(|name| sets.contains_key(*name))
            .or_else(|| find_item_set(sets, &entry.name, slot_of(entry)));

        let Some(set_name) = set_name else {
            grouped.individual.push((idx, entry));
            continue;
        };

        match grouped.sets.iter_mut().find(|g| g.name == set_name) {
            Some(group) => group.entries.push((idx, entry)),
            None => {
                let total = sets.get(set_name).map_or(0, |set| set.items.len());
                grouped.sets.push(SetGroup {
                    name: set_name.to_string(),
                    done: 0,
                    total,
                    percent: 0,
                    entries: vec![(idx, entry)],
                });
            }
        }
    }

    for group in &mut grouped.sets {
        group.done = group.entries.iter().filter(|(_, e)| e.done).count();
        group.percent = percent(group.done, group.total);
    }
    grouped
}
