//! Runtime pages and their linear ordering.
//!
//! [`WizardPage`] wraps a [`PageDefinition`] with the state that changes
//! while the wizard runs: the completion flag and the per-field
//! enabled/visible cache. [`PageModel`] owns the pages in order and answers
//! the linear navigation questions used when no workflow manager overrides
//! them.

use std::collections::BTreeMap;

use crate::definition::{FieldDefinitionState, PageDefinition};
use crate::validation::FieldStateDelta;

/// Cached enabled/visible state for the fields of one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldStateCache {
    states: BTreeMap<String, FieldDefinitionState>,
}

impl FieldStateCache {
    /// Seed the cache from each field's initial state.
    pub fn from_page(page: &PageDefinition) -> Self {
        Self {
            states: page
                .fields()
                .map(|field| (field.id.clone(), field.initial_state))
                .collect(),
        }
    }

    /// State of a field; fully enabled and visible if unknown.
    pub fn get(&self, field_id: &str) -> FieldDefinitionState {
        self.states.get(field_id).copied().unwrap_or_default()
    }

    /// Whether the cache tracks this field.
    pub fn contains(&self, field_id: &str) -> bool {
        self.states.contains_key(field_id)
    }

    /// Apply a delta to a known field.
    ///
    /// Returns `None` for unknown fields, otherwise whether the field must be
    /// re-rendered.
    pub fn apply(&mut self, field_id: &str, delta: &FieldStateDelta) -> Option<bool> {
        let state = self.states.get_mut(field_id)?;
        let changed = state.apply(delta);
        Some(changed || delta.force_refresh)
    }
}

/// A page plus its runtime state.
#[derive(Debug, Clone)]
pub struct WizardPage {
    definition: PageDefinition,
    complete: bool,
    states: FieldStateCache,
}

impl WizardPage {
    /// Build a page. Pages start complete until a validator says otherwise.
    pub fn new(definition: PageDefinition) -> Self {
        let states = FieldStateCache::from_page(&definition);
        Self {
            definition,
            complete: true,
            states,
        }
    }

    /// The page id.
    pub fn id(&self) -> &str {
        &self.definition.id
    }

    /// The static definition.
    pub fn definition(&self) -> &PageDefinition {
        &self.definition
    }

    /// Whether the last validation found no errors.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Set the completion flag.
    pub fn set_complete(&mut self, complete: bool) {
        self.complete = complete;
    }

    /// The field to focus when the page is shown.
    pub fn focused_field(&self) -> Option<&str> {
        self.definition.focused_field().map(|field| field.id.as_str())
    }

    /// The field state cache.
    pub fn states(&self) -> &FieldStateCache {
        &self.states
    }

    /// The field state cache, mutably.
    pub fn states_mut(&mut self) -> &mut FieldStateCache {
        &mut self.states
    }
}

/// Pages in linear order.
#[derive(Debug, Clone, Default)]
pub struct PageModel {
    pages: Vec<WizardPage>,
}

impl PageModel {
    /// An empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a page.
    pub fn add_page(&mut self, page: WizardPage) {
        self.pages.push(page);
    }

    /// The first page.
    pub fn starting_page(&self) -> Option<&WizardPage> {
        self.pages.first()
    }

    /// The page after `id`; `None` at the end or if `id` is unknown.
    pub fn next_page(&self, id: &str) -> Option<&WizardPage> {
        let index = self.index_of(id)?;
        self.pages.get(index + 1)
    }

    /// The page before `id`; `None` at the start or if `id` is unknown.
    pub fn previous_page(&self, id: &str) -> Option<&WizardPage> {
        let index = self.index_of(id)?;
        index.checked_sub(1).and_then(|i| self.pages.get(i))
    }

    /// Whether every page is complete.
    pub fn can_finish(&self) -> bool {
        self.pages.iter().all(WizardPage::is_complete)
    }

    /// Look up a page.
    pub fn page(&self, id: &str) -> Option<&WizardPage> {
        self.pages.iter().find(|page| page.id() == id)
    }

    /// Look up a page mutably.
    pub fn page_mut(&mut self, id: &str) -> Option<&mut WizardPage> {
        self.pages.iter_mut().find(|page| page.id() == id)
    }

    /// Position of a page.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.pages.iter().position(|page| page.id() == id)
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// All pages in order.
    pub fn pages(&self) -> &[WizardPage] {
        &self.pages
    }

    /// All pages in order, mutably.
    pub fn pages_mut(&mut self) -> &mut [WizardPage] {
        &mut self.pages
    }
}

impl FromIterator<PageDefinition> for PageModel {
    fn from_iter<I: IntoIterator<Item = PageDefinition>>(iter: I) -> Self {
        Self {
            pages: iter.into_iter().map(WizardPage::new).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::FieldDefinition;

    fn setup() -> PageModel {
        ["one", "two", "three"]
            .into_iter()
            .map(PageDefinition::new)
            .collect()
    }

    #[test]
    fn test_linear_navigation() {
        let model = setup();
        assert_eq!(model.starting_page().unwrap().id(), "one");
        assert_eq!(model.next_page("one").unwrap().id(), "two");
        assert_eq!(model.next_page("two").unwrap().id(), "three");
        assert!(model.next_page("three").is_none());
        assert!(model.previous_page("one").is_none());
        assert_eq!(model.previous_page("three").unwrap().id(), "two");
        assert!(model.next_page("missing").is_none());
        assert!(model.previous_page("missing").is_none());
    }

    #[test]
    fn test_empty_model() {
        let model = PageModel::new();
        assert!(model.starting_page().is_none());
        assert!(model.can_finish());
        assert_eq!(model.page_count(), 0);
    }

    #[test]
    fn test_can_finish_requires_all_complete() {
        let mut model = setup();
        assert!(model.can_finish());
        model.page_mut("two").unwrap().set_complete(false);
        assert!(!model.can_finish());
        assert_eq!(model.index_of("three"), Some(2));
    }

    #[test]
    fn test_state_cache() {
        let page = PageDefinition::new("p")
            .with_field(FieldDefinition::textbox("a", "A").disabled())
            .with_field(FieldDefinition::textbox("b", "B"));
        let mut cache = FieldStateCache::from_page(&page);

        assert!(!cache.get("a").enabled);
        assert_eq!(cache.apply("a", &FieldStateDelta::new().enabled(false)), Some(false));
        assert_eq!(cache.apply("a", &FieldStateDelta::new().enabled(true)), Some(true));
        assert_eq!(cache.apply("b", &FieldStateDelta::new().force_refresh()), Some(true));
        assert_eq!(cache.apply("zzz", &FieldStateDelta::new().enabled(false)), None);
        assert!(!cache.contains("zzz"));
        assert!(cache.get("zzz").visible);
    }
}
