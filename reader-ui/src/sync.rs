//! Fetch-on-load and upload-on-every-edit for one page's annotation set.

use shared_types::{AnnotationSet, PageKey};

use crate::api;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    Loading,
    Synced,
    Saving,
    LoadFailed,
    SaveFailed,
}

impl SyncStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SyncStatus::Loading => "Loading annotations...",
            SyncStatus::Synced => "All changes saved",
            SyncStatus::Saving => "Saving...",
            SyncStatus::LoadFailed => "Could not load your annotations",
            SyncStatus::SaveFailed => "Could not save your last change",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SyncStatus::LoadFailed | SyncStatus::SaveFailed)
    }
}

/// Turn a fetched payload into a set. `None` (signed out or nothing saved)
/// and unreadable payloads both load as an empty set.
pub fn decode_fetched(payload: Option<&str>) -> AnnotationSet {
    let Some(payload) = payload else {
        return AnnotationSet::default();
    };
    match AnnotationSet::decode(payload) {
        Ok(set) => set,
        Err(e) => {
            log::warn!("Discarding unreadable annotation payload: {e}");
            AnnotationSet::default()
        }
    }
}

/// Talks to the annotation store for the page being read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncClient {
    page: PageKey,
    csrf_token: Option<String>,
}

impl SyncClient {
    pub fn new(page: PageKey, csrf_token: Option<String>) -> Self {
        Self { page, csrf_token }
    }

    pub fn page(&self) -> PageKey {
        self.page
    }

    /// The stored payload, or `None` when there is nothing for this reader.
    pub async fn fetch(&self) -> Result<Option<String>, String> {
        api::fetch_annotations(self.page, self.csrf_token.as_deref()).await
    }

    /// Replace the stored set with `payload`. Not retried.
    pub async fn upload(&self, payload: &str) -> Result<(), String> {
        api::upload_annotations(self.page, payload, self.csrf_token.as_deref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_broken_payloads_are_empty() {
        assert!(decode_fetched(None).is_empty());
        assert!(decode_fetched(Some("")).is_empty());
        assert!(decode_fetched(Some("null")).is_empty());
        assert!(decode_fetched(Some("{\"oops\":")).is_empty());
        assert!(decode_fetched(Some("{\"not\":\"a list\"}")).is_empty());
    }

    #[test]
    fn stored_payload_decodes() {
        let set = decode_fetched(Some(
            r##"[{"id":"#1","body":[],"target":{},"style":"blue-highlight"}]"##,
        ));
        assert_eq!(set.len(), 1);
        assert_eq!(set.0[0].style.as_deref(), Some("blue-highlight"));
    }

    #[test]
    fn only_failures_are_errors() {
        assert!(SyncStatus::LoadFailed.is_error());
        assert!(SyncStatus::SaveFailed.is_error());
        assert!(!SyncStatus::Saving.is_error());
        assert!(!SyncStatus::Synced.is_error());
        assert_ne!(SyncStatus::LoadFailed.label(), SyncStatus::SaveFailed.label());
    }
}
