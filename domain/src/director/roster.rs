//! The set of directors available to a process.

use super::entities::Director;

/// Directors keyed by id, in load order. Ids are unique.
#[derive(Debug, Clone, Default)]
pub struct DirectorRoster {
    directors: Vec<Director>,
}

impl DirectorRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a director unless one with the same id is already present.
    ///
    /// Returns `false` when the director was a duplicate and dropped.
    pub fn insert(&mut self, director: Director) -> bool {
        if self.contains(&director.id) {
            return false;
        }
        self.directors.push(director);
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: &str) -> Option<&Director> {
        self.directors.iter().find(|d| d.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Director> {
        self.directors.iter()
    }

    pub fn len(&self) -> usize {
        self.directors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directors.is_empty()
    }

    /// Resolve ids in request order. Unknown ids are returned separately;
    /// repeated ids are selected once.
    pub fn select<S: AsRef<str>>(&self, ids: &[S]) -> (Vec<Director>, Vec<String>) {
        let mut selected: Vec<Director> = Vec::new();
        let mut unknown = Vec::new();
        for id in ids {
            let id = id.as_ref();
            match self.get(id) {
                Some(d) if !selected.iter().any(|s| s.id == d.id) => selected.push(d.clone()),
                Some(_) => {}
                None => unknown.push(id.to_string()),
            }
        }
        (selected, unknown)
    }
}

impl FromIterator<Director> for DirectorRoster {
    fn from_iter<I: IntoIterator<Item = Director>>(iter: I) -> Self {
        let mut roster = DirectorRoster::new();
        for director in iter {
            roster.insert(director);
        }
        roster
    }
}
