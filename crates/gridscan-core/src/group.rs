//! Groups of buttons identified by id.

use indexmap::IndexSet;

use crate::button::ButtonId;
use crate::error::GridError;

/// A set of button ids, used both as a row/column query result and as a
/// selection event payload.
///
/// A group starts *open* (ids may be added) and becomes *sealed*, after
/// which any mutation is an error. Groups built from queries are sealed
/// on construction. Equality is set equality; iteration order carries no
/// meaning.
#[derive(Debug, Clone)]
pub struct ButtonGroup {
    ids: IndexSet<ButtonId>,
    sealed: bool,
}

impl ButtonGroup {
    /// Create an open, empty group.
    pub fn new() -> Self {
        Self {
            ids: IndexSet::new(),
            sealed: false,
        }
    }

    /// Create a sealed, empty group.
    pub fn empty() -> Self {
        Self {
            ids: IndexSet::new(),
            sealed: true,
        }
    }

    /// Create a sealed group containing exactly one id.
    pub fn single(id: impl Into<ButtonId>) -> Self {
        let mut ids = IndexSet::new();
        ids.insert(id.into());
        Self { ids, sealed: true }
    }

    /// Create a sealed group from the given ids (duplicates collapse).
    pub fn from_ids<I, T>(ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ButtonId>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
            sealed: true,
        }
    }

    /// Add a button id to an open group.
    pub fn add(&mut self, id: impl Into<ButtonId>) -> Result<(), GridError> {
        self.check_open()?;
        self.ids.insert(id.into());
        Ok(())
    }

    /// Add all ids from another group to this open group.
    pub fn add_all(&mut self, other: &ButtonGroup) -> Result<(), GridError> {
        self.check_open()?;
        for id in other.iter() {
            self.ids.insert(id.clone());
        }
        Ok(())
    }

    fn check_open(&self) -> Result<(), GridError> {
        if self.sealed {
            Err(GridError::SealedGroup)
        } else {
            Ok(())
        }
    }

    /// Seal the group; further mutation is rejected.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    /// Whether the group is sealed.
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Number of ids in the group.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the group contains no ids.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Whether the group contains the given id.
    pub fn contains(&self, id: &ButtonId) -> bool {
        self.ids.contains(id)
    }

    /// Iterate over the ids in the group.
    pub fn iter(&self) -> impl Iterator<Item = &ButtonId> {
        self.ids.iter()
    }
}

impl Default for ButtonGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for ButtonGroup {
    /// Set equality over the contained ids; the seal state is ignored.
    fn eq(&self, other: &Self) -> bool {
        self.ids.len() == other.ids.len() && self.ids.iter().all(|id| other.ids.contains(id))
    }
}

impl Eq for ButtonGroup {}

impl<'a> IntoIterator for &'a ButtonGroup {
    type Item = &'a ButtonId;
    type IntoIter = indexmap::set::Iter<'a, ButtonId>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_group_accepts_ids() {
        let mut group = ButtonGroup::new();
        group.add("a").unwrap();
        group.add("b").unwrap();
        group.add("a").unwrap(); // duplicate collapses
        assert_eq!(group.len(), 2);
        assert!(!group.is_sealed());
    }

    #[test]
    fn test_sealed_group_rejects_ids() {
        let mut group = ButtonGroup::new();
        group.add("a").unwrap();
        group.seal();
        assert!(matches!(group.add("b"), Err(GridError::SealedGroup)));
        assert_eq!(group.len(), 1);
    }

    #[test]
    fn test_empty_is_permanently_sealed() {
        let mut group = ButtonGroup::empty();
        assert!(group.is_sealed());
        assert!(group.is_empty());
        assert!(group.add("a").is_err());
    }

    #[test]
    fn test_single_is_sealed() {
        let group = ButtonGroup::single("a");
        assert!(group.is_sealed());
        assert_eq!(group.len(), 1);
        assert!(group.contains(&ButtonId::new("a")));
    }

    #[test]
    fn test_set_equality() {
        let a = ButtonGroup::from_ids(["x", "y"]);
        let b = ButtonGroup::from_ids(["y", "x"]);
        assert_eq!(a, b);

        let mut open = ButtonGroup::new();
        open.add("x").unwrap();
        open.add("y").unwrap();
        assert_eq!(a, open); // seal state does not affect equality
    }

    #[test]
    fn test_add_all() {
        let mut group = ButtonGroup::new();
        group.add("a").unwrap();
        group.add_all(&ButtonGroup::from_ids(["b", "c"])).unwrap();
        assert_eq!(group.len(), 3);
    }
}
