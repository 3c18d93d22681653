//! Domain-wave scheduler.
//!
//! Splits a batch into waves so that no wave holds two URLs for the same
//! host. Waves run one after another with a pause in between, which keeps
//! the checker from hammering one server with dozens of parallel requests.

use std::collections::HashSet;

/// One wave: entries that may be dispatched together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wave<T> {
    entries: Vec<(String, T)>,
    hosts: HashSet<String>,
}

impl<T> Default for Wave<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            hosts: HashSet::new(),
        }
    }
}

impl<T> Wave<T> {
    fn has_host(&self, host: &str) -> bool {
        self.hosts.contains(host)
    }

    fn push(&mut self, host: String, item: T) {
        self.hosts.insert(host.clone());
        self.entries.push((host, item));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hosts in insertion order.
    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(h, _)| h.as_str())
    }

    pub fn items(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(_, item)| item)
    }

    pub fn into_items(self) -> Vec<T> {
        self.entries.into_iter().map(|(_, item)| item).collect()
    }
}

/// Partitions `(host, item)` pairs into waves.
///
/// With `queue_by_domain` each entry goes into the first wave that has not
/// seen its host yet, opening a new wave when every existing one has. Input
/// order is kept within a wave and the wave count equals the largest number
/// of entries sharing one host. Without it everything lands in one wave.
///
/// Hosts are compared as given; callers lower-case them first.
pub fn schedule<T>(items: Vec<(String, T)>, queue_by_domain: bool) -> Vec<Wave<T>> {
    if items.is_empty() {
        return Vec::new();
    }
    if !queue_by_domain {
        let mut wave = Wave::default();
        for (host, item) in items {
            wave.entries.push((host, item));
        }
        return vec![wave];
    }

    let mut waves: Vec<Wave<T>> = Vec::new();
    for (host, item) in items {
        match waves.iter_mut().find(|w| !w.has_host(&host)) {
            Some(wave) => wave.push(host, item),
            None => {
                let mut wave = Wave::default();
                wave.push(host, item);
                waves.push(wave);
            }
        }
    }
    waves
}
