//! Unread reconciliation over local and server read facts.

use std::collections::HashMap;

use crate::domain::entities::{
    ChatSummary, ReadTimestamp, ResourceKey, SectionItem, UnreadSnapshot,
};

/// In-memory unread bookkeeping for chats and channels.
///
/// Counts are a heuristic: a resource gains at most one unread per distinct
/// latest message observed between reads. The remote API exposes no
/// per-message delta, so a count of 3 means "three new latest messages were
/// seen", not "three messages arrived".
///
/// Every method runs to completion without suspension, so callers can apply
/// a whole poll result under one lock.
#[derive(Debug, Clone, Default)]
pub struct UnreadLedger {
    read_timestamps: HashMap<String, ReadTimestamp>,
    unread_counts: HashMap<String, u32>,
    last_known_preview_ids: HashMap<String, String>,
    channel_last_message_times: HashMap<String, String>,
}

impl UnreadLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves the later of the local and server read timestamps for `key`.
    ///
    /// A local mark is never overridden by an older server value, while a
    /// newer server value (read on another device) still wins.
    #[must_use]
    pub fn effective_last_read<'a>(
        &'a self,
        key: &str,
        server_timestamp: Option<&'a str>,
    ) -> Option<&'a str> {
        let local = self
            .read_timestamps
            .get(key)
            .map(|ts| ts.timestamp.as_str());

        match (local, server_timestamp) {
            (Some(local), Some(server)) => Some(if local > server { local } else { server }),
            (local, server) => local.or(server),
        }
    }

    /// Reconciles a conversation list.
    ///
    /// Returns true when state that should survive a restart changed.
    pub fn apply_chats(&mut self, chats: &[ChatSummary], current_user_id: &str) -> bool {
        let mut durable_changed = false;

        for chat in chats {
            let Some(preview) = &chat.last_message_preview else {
                continue;
            };
            let key = chat.id.as_str();
            let server_last_read = chat.server_last_read.as_deref();

            let is_new = self
                .effective_last_read(key, server_last_read)
                .is_none_or(|last_read| preview.created_at.as_str() > last_read);
            let from_self = preview.author_id.as_deref() == Some(current_user_id);

            if is_new && !from_self {
                if self.last_known_preview_ids.get(key) != Some(&preview.id) {
                    self.increment(key);
                    self.last_known_preview_ids
                        .insert(key.to_string(), preview.id.clone());
                    durable_changed = true;
                }
                self.ensure_unread(key);
            } else {
                self.unread_counts.insert(key.to_string(), 0);
            }

            if let Some(server) = server_last_read
                && !self.read_timestamps.contains_key(key)
            {
                self.read_timestamps
                    .insert(key.to_string(), ReadTimestamp::server(server));
                durable_changed = true;
            }
        }

        durable_changed
    }

    /// Reconciles the result of a channel peek.
    ///
    /// Repeating a peek with an unchanged `latest_message_time` never
    /// increments. A newer message authored by the current user leaves the
    /// count untouched. Returns true when durable state changed.
    pub fn apply_channel_peek(
        &mut self,
        team_id: &str,
        channel_id: &str,
        latest_message_time: &str,
        from_user_id: Option<&str>,
        current_user_id: &str,
    ) -> bool {
        let key = ResourceKey::channel(team_id, channel_id).storage_key();

        let is_new = self
            .effective_last_read(&key, None)
            .is_none_or(|last_read| latest_message_time > last_read);
        let from_self = from_user_id == Some(current_user_id);

        let mut durable_changed = false;
        if is_new && !from_self {
            if self.channel_last_message_times.get(&key).map(String::as_str)
                != Some(latest_message_time)
            {
                self.increment(&key);
                self.channel_last_message_times
                    .insert(key.clone(), latest_message_time.to_string());
                durable_changed = true;
            }
            self.ensure_unread(&key);
        } else if !is_new {
            self.unread_counts.insert(key, 0);
        }

        durable_changed
    }

    /// Records a local read at `max(now, message_timestamp)` and clears the
    /// unread count.
    pub fn touch(&mut self, key: &ResourceKey, now: &str, message_timestamp: Option<&str>) {
        let timestamp = match message_timestamp {
            Some(message_ts) if message_ts > now => message_ts,
            _ => now,
        };
        let key = key.storage_key();
        self.read_timestamps
            .insert(key.clone(), ReadTimestamp::local(timestamp));
        self.unread_counts.insert(key, 0);
    }

    /// Overrides the heuristic with an exact count.
    pub fn set_exact_count(&mut self, key: &ResourceKey, count: u32) {
        self.unread_counts.insert(key.storage_key(), count);
    }

    /// Returns the unread count for a resource.
    #[must_use]
    pub fn unread_count(&self, key: &ResourceKey) -> u32 {
        self.count_for(&key.storage_key())
    }

    /// Returns whether a resource has unread activity.
    #[must_use]
    pub fn is_unread(&self, key: &ResourceKey) -> bool {
        self.unread_count(key) > 0
    }

    /// Returns the stored read timestamp for a resource.
    #[must_use]
    pub fn last_read(&self, key: &ResourceKey) -> Option<&str> {
        self.read_timestamps
            .get(&key.storage_key())
            .map(|ts| ts.timestamp.as_str())
    }

    /// Returns the number of resources with unread activity.
    #[must_use]
    pub fn total_unread(&self) -> usize {
        self.unread_counts.values().filter(|&&c| c > 0).count()
    }

    /// Returns how many of `items` currently have unread activity.
    #[must_use]
    pub fn section_unread_item_count(&self, items: &[SectionItem]) -> usize {
        items
            .iter()
            .filter(|item| self.count_for(&item.key()) > 0)
            .count()
    }

    /// Returns `(key, count)` for every unread resource, sorted by key.
    #[must_use]
    pub fn unread_entries(&self) -> Vec<(String, u32)> {
        let mut entries: Vec<_> = self
            .unread_counts
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(key, count)| (key.clone(), *count))
            .collect();
        entries.sort();
        entries
    }

    /// Captures the durable subset of state.
    #[must_use]
    pub fn snapshot(&self) -> UnreadSnapshot {
        UnreadSnapshot {
            read_timestamps: self
                .read_timestamps
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            last_known_preview_ids: self
                .last_known_preview_ids
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            channel_last_message_times: self
                .channel_last_message_times
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            ..UnreadSnapshot::default()
        }
    }

    /// Merges a persisted snapshot without overriding fresher in-memory state.
    ///
    /// Timestamps are taken when the key is absent or the loaded value is
    /// newer; preview cursors only fill absent keys.
    pub fn merge_snapshot(&mut self, snapshot: UnreadSnapshot) {
        for (key, loaded) in snapshot.read_timestamps {
            let newer = self
                .read_timestamps
                .get(&key)
                .is_none_or(|existing| loaded.timestamp > existing.timestamp);
            if newer {
                self.read_timestamps.insert(key, loaded);
            }
        }

        for (key, preview_id) in snapshot.last_known_preview_ids {
            self.last_known_preview_ids.entry(key).or_insert(preview_id);
        }

        for (key, loaded) in snapshot.channel_last_message_times {
            let newer = self
                .channel_last_message_times
                .get(&key)
                .is_none_or(|existing| loaded > *existing);
            if newer {
                self.channel_last_message_times.insert(key, loaded);
            }
        }
    }

    /// Drops all state.
    pub fn clear(&mut self) {
        self.read_timestamps.clear();
        self.unread_counts.clear();
        self.last_known_preview_ids.clear();
        self.channel_last_message_times.clear();
    }

    fn count_for(&self, key: &str) -> u32 {
        self.unread_counts.get(key).copied().unwrap_or(0)
    }

    fn increment(&mut self, key: &str) {
        let count = self.unread_counts.entry(key.to_string()).or_insert(0);
        *count = count.saturating_add(1);
    }

    fn ensure_unread(&mut self, key: &str) {
        let count = self.unread_counts.entry(key.to_string()).or_insert(0);
        if *count == 0 {
            *count = 1;
        }
    }
}
