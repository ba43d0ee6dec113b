//! Row selection state for bulk actions.

/// Ordered set of selected post ids.
///
/// Ids keep the order in which they were selected so bulk operations run in a
/// predictable sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<String>,
}

impl Selection {
    /// Empty selection.
    #[must_use]
    pub const fn new() -> Self {
        Self { ids: Vec::new() }
    }

    /// Add the id when absent, remove it when present.
    pub fn toggle(&mut self, id: &str) {
        if let Some(index) = self.ids.iter().position(|selected| selected == id) {
            self.ids.remove(index);
        } else {
            self.ids.push(id.to_string());
        }
    }

    /// Select every visible id, or clear when all of them are already selected.
    pub fn select_all_or_clear<'a, I>(&mut self, visible: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let visible: Vec<&str> = visible.into_iter().collect();
        let all_selected = !visible.is_empty() && visible.iter().all(|id| self.contains(id));
        if all_selected || visible.is_empty() {
            self.ids.clear();
        } else {
            self.ids = visible.into_iter().map(str::to_string).collect();
        }
    }

    /// Drop every selected id.
    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Whether the id is selected.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|selected| selected == id)
    }

    /// Selected ids in selection order.
    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Number of selected ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
