//! Sidebar section overlay rules.

use std::collections::{BTreeSet, HashSet};

use uuid::Uuid;

use crate::domain::entities::{
    FAVORITES_SECTION_ID, OTHER_SECTION_ID, OTHER_SECTION_ORDER, ResourceKind, Section,
    SectionItem, SectionsData, WatchedChannel,
};

/// User-curated grouping of chats and channels.
///
/// "Favorites" and "Other" always exist. An item sits in at most one explicit
/// section; anything unplaced implicitly belongs to "Other".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionLayout {
    sections: Vec<Section>,
    hidden_item_keys: BTreeSet<String>,
}

impl Default for SectionLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl SectionLayout {
    /// Creates the first-run layout with only the built-in sections.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sections: vec![Section::favorites(), Section::other()],
            hidden_item_keys: BTreeSet::new(),
        }
    }

    /// Restores a layout from persisted data, repairing missing built-ins.
    #[must_use]
    pub fn from_data(data: SectionsData) -> Self {
        let mut sections = data.sections;

        if !sections.iter().any(|s| s.id == FAVORITES_SECTION_ID) {
            sections.insert(0, Section::favorites());
        }
        if !sections.iter().any(Section::is_other) {
            sections.push(Section::other());
        }
        for section in &mut sections {
            if section.id == FAVORITES_SECTION_ID {
                section.is_default = true;
            } else if section.is_other() {
                section.is_default = true;
                section.order = OTHER_SECTION_ORDER;
            }
        }

        Self {
            sections,
            hidden_item_keys: data.hidden_item_keys.into_iter().collect(),
        }
    }

    /// Returns the persisted form.
    #[must_use]
    pub fn to_data(&self) -> SectionsData {
        SectionsData {
            sections: self.sections.clone(),
            hidden_item_keys: self.hidden_item_keys.iter().cloned().collect(),
        }
    }

    /// Returns sections in storage order.
    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Returns sections sorted by their order key.
    #[must_use]
    pub fn sorted(&self) -> Vec<&Section> {
        let mut sorted: Vec<_> = self.sections.iter().collect();
        sorted.sort_by_key(|s| s.order);
        sorted
    }

    /// Looks up a section by id.
    #[must_use]
    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    /// Adds a custom section just before "Other" and returns its id.
    pub fn create_section(&mut self, label: impl Into<String>) -> String {
        let max_order = self
            .sections
            .iter()
            .filter(|s| !s.is_other())
            .map(|s| s.order)
            .max()
            .unwrap_or(0)
            .max(0);

        let id = Uuid::new_v4().to_string();
        self.sections
            .push(Section::new(id.clone(), label, max_order + 1));
        id
    }

    /// Renames a custom section. Built-in sections are left alone.
    pub fn rename_section(&mut self, id: &str, label: impl Into<String>) -> bool {
        match self
            .sections
            .iter_mut()
            .find(|s| s.id == id && !s.is_default)
        {
            Some(section) => {
                section.label = label.into();
                true
            }
            None => false,
        }
    }

    /// Deletes a custom section, moving its items into "Other".
    pub fn delete_section(&mut self, id: &str) -> bool {
        let Some(index) = self
            .sections
            .iter()
            .position(|s| s.id == id && !s.is_default)
        else {
            return false;
        };

        let removed = self.sections.remove(index);
        if let Some(other) = self.sections.iter_mut().find(|s| s.is_other()) {
            other.items.extend(removed.items);
        }
        true
    }

    /// Moves an item into `target_section_id`, taking it out of any other
    /// section and un-hiding it. Moving into "Other" only takes it out.
    pub fn move_item(&mut self, item: SectionItem, target_section_id: &str) -> bool {
        let into_other = target_section_id == OTHER_SECTION_ID;
        if !into_other && self.section(target_section_id).is_none() {
            return false;
        }

        let key = item.key();
        self.hidden_item_keys.remove(&key);
        self.remove_everywhere(&key);

        if !into_other
            && let Some(target) = self
                .sections
                .iter_mut()
                .find(|s| s.id == target_section_id)
        {
            target.items.push(item);
        }
        true
    }

    /// Hides an item and takes it out of any explicit section.
    pub fn hide_item(&mut self, item: &SectionItem) {
        let key = item.key();
        self.remove_everywhere(&key);
        self.hidden_item_keys.insert(key);
    }

    /// Un-hides an item. Returns false if it was not hidden.
    pub fn unhide_item(&mut self, item: &SectionItem) -> bool {
        self.hidden_item_keys.remove(&item.key())
    }

    /// Returns whether an item is hidden.
    #[must_use]
    pub fn is_hidden(&self, item: &SectionItem) -> bool {
        self.hidden_item_keys.contains(&item.key())
    }

    /// Keys of items placed in any section other than "Other".
    #[must_use]
    pub fn assigned_item_keys(&self) -> HashSet<String> {
        self.explicit_items().map(SectionItem::key).collect()
    }

    /// Channels placed in any section other than "Other"; the set the poller
    /// watches.
    #[must_use]
    pub fn watched_channels(&self) -> Vec<WatchedChannel> {
        self.explicit_items()
            .filter(|item| item.kind == ResourceKind::Channel)
            .filter_map(|item| {
                item.team_id
                    .as_ref()
                    .map(|team_id| WatchedChannel::new(team_id, &item.id))
            })
            .collect()
    }

    /// Chats placed in any section other than "Other".
    #[must_use]
    pub fn section_chat_ids(&self) -> Vec<String> {
        self.explicit_items()
            .filter(|item| item.kind == ResourceKind::Chat)
            .map(|item| item.id.clone())
            .collect()
    }

    fn explicit_items(&self) -> impl Iterator<Item = &SectionItem> {
        self.sections
            .iter()
            .filter(|s| !s.is_other())
            .flat_map(|s| s.items.iter())
    }

    fn remove_everywhere(&mut self, key: &str) {
        for section in &mut self.sections {
            section.items.retain(|i| i.key() != key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items_of<'a>(layout: &'a SectionLayout, id: &str) -> &'a [SectionItem] {
        &layout.section(id).unwrap().items
    }

    #[test]
    fn test_defaults_exist_and_other_sorts_last() {
        let mut layout = SectionLayout::new();
        layout.create_section("Work");

        let sorted: Vec<_> = layout.sorted().iter().map(|s| s.label.clone()).collect();
        assert_eq!(sorted, vec!["Favorites", "Work", "Other"]);
    }

    #[test]
    fn test_create_section_orders_after_existing_custom_sections() {
        let mut layout = SectionLayout::new();
        let first = layout.create_section("A");
        let second = layout.create_section("B");

        assert_eq!(layout.section(&first).unwrap().order, 1);
        assert_eq!(layout.section(&second).unwrap().order, 2);
        assert!(!layout.section(&second).unwrap().is_default);
    }

    #[test]
    fn test_default_sections_cannot_be_renamed_or_deleted() {
        let mut layout = SectionLayout::new();

        assert!(!layout.rename_section(FAVORITES_SECTION_ID, "Stars"));
        assert!(!layout.delete_section(OTHER_SECTION_ID));
        assert!(!layout.delete_section(FAVORITES_SECTION_ID));
        assert_eq!(layout.sections().len(), 2);
    }

    #[test]
    fn test_rename_custom_section() {
        let mut layout = SectionLayout::new();
        let id = layout.create_section("Old");

        assert!(layout.rename_section(&id, "New"));
        assert_eq!(layout.section(&id).unwrap().label, "New");
    }

    #[test]
    fn test_delete_moves_items_to_other() {
        let mut layout = SectionLayout::new();
        let id = layout.create_section("Temp");
        layout.move_item(SectionItem::chat("c1"), &id);
        layout.move_item(SectionItem::channel("t1", "ch1"), &id);

        assert!(layout.delete_section(&id));

        assert!(layout.section(&id).is_none());
        assert_eq!(items_of(&layout, OTHER_SECTION_ID).len(), 2);
        assert!(layout.watched_channels().is_empty());
    }

    #[test]
    fn test_move_item_keeps_single_membership() {
        let mut layout = SectionLayout::new();
        let work = layout.create_section("Work");
        let item = SectionItem::channel("t1", "ch1");

        layout.move_item(item.clone(), FAVORITES_SECTION_ID);
        layout.move_item(item.clone(), &work);

        assert!(items_of(&layout, FAVORITES_SECTION_ID).is_empty());
        assert_eq!(items_of(&layout, &work), &[item.clone()]);

        layout.move_item(item, OTHER_SECTION_ID);
        assert!(items_of(&layout, &work).is_empty());
        assert!(items_of(&layout, OTHER_SECTION_ID).is_empty());
    }

    #[test]
    fn test_move_item_to_unknown_section_is_rejected() {
        let mut layout = SectionLayout::new();
        layout.move_item(SectionItem::chat("c1"), FAVORITES_SECTION_ID);

        assert!(!layout.move_item(SectionItem::chat("c1"), "missing"));
        assert_eq!(items_of(&layout, FAVORITES_SECTION_ID).len(), 1);
    }

    #[test]
    fn test_same_channel_id_in_different_teams_are_distinct_items() {
        let mut layout = SectionLayout::new();
        layout.move_item(SectionItem::channel("t1", "general"), FAVORITES_SECTION_ID);
        layout.move_item(SectionItem::channel("t2", "general"), FAVORITES_SECTION_ID);

        assert_eq!(items_of(&layout, FAVORITES_SECTION_ID).len(), 2);
    }

    #[test]
    fn test_hide_and_move_unhides() {
        let mut layout = SectionLayout::new();
        let item = SectionItem::chat("c1");
        layout.move_item(item.clone(), FAVORITES_SECTION_ID);

        layout.hide_item(&item);
        assert!(layout.is_hidden(&item));
        assert!(items_of(&layout, FAVORITES_SECTION_ID).is_empty());

        layout.move_item(item.clone(), FAVORITES_SECTION_ID);
        assert!(!layout.is_hidden(&item));

        layout.hide_item(&item);
        assert!(layout.unhide_item(&item));
        assert!(!layout.unhide_item(&item));
    }

    #[test]
    fn test_watched_channels_and_assigned_keys() {
        let mut layout = SectionLayout::new();
        let work = layout.create_section("Work");
        layout.move_item(SectionItem::channel("t1", "ch1"), FAVORITES_SECTION_ID);
        layout.move_item(SectionItem::channel("t2", "ch2"), &work);
        layout.move_item(SectionItem::chat("c1"), &work);

        assert_eq!(
            layout.watched_channels(),
            vec![WatchedChannel::new("t1", "ch1"), WatchedChannel::new("t2", "ch2")]
        );
        let assigned = layout.assigned_item_keys();
        assert!(assigned.contains("t1:ch1"));
        assert!(assigned.contains("c1"));
        assert_eq!(assigned.len(), 3);
        assert_eq!(layout.section_chat_ids(), vec!["c1".to_string()]);
    }

    #[test]
    fn test_from_data_repairs_missing_defaults() {
        let mut custom = Section::new("custom", "Custom", 3);
        custom.items.push(SectionItem::chat("c1"));
        let data = SectionsData {
            sections: vec![custom],
            hidden_item_keys: vec!["c9".into()],
        };

        let layout = SectionLayout::from_data(data);

        assert!(layout.section(FAVORITES_SECTION_ID).unwrap().is_default);
        assert_eq!(layout.section(OTHER_SECTION_ID).unwrap().order, OTHER_SECTION_ORDER);
        assert!(layout.is_hidden(&SectionItem::chat("c9")));
        assert_eq!(layout.to_data().sections.len(), 3);
    }
}
