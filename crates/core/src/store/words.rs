//! Word catalog cache and per-session word usage.

use tracing::debug;

use super::SessionStore;
use crate::{error::StoreResult, models::Word};

impl SessionStore {
    /// Return the word catalog, fetching it only on first use.
    pub async fn load_all_words(&self) -> StoreResult<Vec<Word>> {
        {
            let cache = self.words.read();
            if cache.loaded {
                return Ok(cache.words.clone());
            }
        }

        let words = self.api.list_words().await?;
        debug!(count = words.len(), "word catalog loaded");
        let mut cache = self.words.write();
        cache.words = words.clone();
        cache.loaded = true;
        Ok(words)
    }

    /// Forget the cached catalog so the next load hits the backend.
    pub fn invalidate_words(&self) {
        let mut cache = self.words.write();
        cache.words.clear();
        cache.loaded = false;
    }

    /// Exclude a word from every later draw in this session.
    pub fn mark_word_as_used(&self, word_id: i64) {
        self.session
            .send_if_modified(|session| session.used_word_ids.insert(word_id));
    }

    /// Whether the word was already drawn in this session.
    pub fn is_word_used(&self, word_id: i64) -> bool {
        self.session.borrow().used_word_ids.contains(&word_id)
    }

    /// Cached catalog minus the words used in this session.
    pub fn available_words(&self) -> Vec<Word> {
        let session = self.session.borrow();
        self.words
            .read()
            .words
            .iter()
            .filter(|word| {
                word.id
                    .map(|id| !session.used_word_ids.contains(&id))
                    .unwrap_or(true)
            })
            .cloned()
            .collect()
    }

    /// Pick one of the available words and mark it used in one step.
    ///
    /// `pick` sees the current available words; concurrent callers never
    /// receive the same word.
    pub fn claim_word<F>(&self, pick: F) -> Option<Word>
    where
        F: FnOnce(&[Word]) -> Option<Word>,
    {
        let _pending = self.pending.lock();
        let available = self.available_words();
        let word = pick(&available)?;
        if let Some(id) = word.id {
            self.mark_word_as_used(id);
        }
        debug!(word_id = ?word.id, category = %word.category, "word claimed");
        Some(word)
    }

    /// Number of distinct words drawn in this session.
    pub fn used_word_count(&self) -> usize {
        self.session.borrow().used_word_ids.len()
    }

    /// Make every word available again without touching the rest of the session.
    pub fn reset_word_tracking(&self) {
        self.session.send_if_modified(|session| {
            let changed = !session.used_word_ids.is_empty();
            session.used_word_ids.clear();
            changed
        });
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::store;

    #[tokio::test]
    async fn catalog_is_fetched_once() -> anyhow::Result<()> {
        let (store, api) = store();
        let first = store.load_all_words().await?;
        let second = store.load_all_words().await?;
        assert_eq!(first, second);
        assert_eq!(api.calls("list_words"), 1);

        store.invalidate_words();
        store.load_all_words().await?;
        assert_eq!(api.calls("list_words"), 2);
        Ok(())
    }

    #[tokio::test]
    async fn failed_catalog_load_is_retried_next_time() -> anyhow::Result<()> {
        let (store, api) = store();
        api.fail("list_words");
        assert!(store.load_all_words().await.unwrap_err().is_remote());
        assert!(store.available_words().is_empty());
        api.recover("list_words");
        assert_eq!(store.load_all_words().await?.len(), 15);
        Ok(())
    }

    #[tokio::test]
    async fn marking_is_idempotent_and_filters_availability() -> anyhow::Result<()> {
        let (store, _) = store();
        let words = store.load_all_words().await?;
        let id = words[0].id.expect("id");

        store.mark_word_as_used(id);
        let once = store.snapshot();
        store.mark_word_as_used(id);
        assert_eq!(store.snapshot(), once);

        assert!(store.is_word_used(id));
        assert_eq!(store.used_word_count(), 1);
        let available = store.available_words();
        assert_eq!(available.len(), words.len() - 1);
        assert!(available.iter().all(|word| word.id != Some(id)));
        Ok(())
    }

    #[tokio::test]
    async fn new_session_keeps_catalog_but_resets_usage() -> anyhow::Result<()> {
        let (store, api) = store();
        let words = store.load_all_words().await?;
        store.mark_word_as_used(words[1].id.expect("id"));

        store.start_new_session(5);
        assert_eq!(store.used_word_count(), 0);
        assert_eq!(store.available_words().len(), words.len());
        store.load_all_words().await?;
        assert_eq!(api.calls("list_words"), 1);
        Ok(())
    }

    #[tokio::test]
    async fn claimed_words_are_never_offered_again() -> anyhow::Result<()> {
        let (store, _) = store();
        let total = store.load_all_words().await?.len();
        let mut seen = std::collections::HashSet::new();
        while let Some(word) = store.claim_word(|available| available.first().cloned()) {
            assert!(seen.insert(word.id));
        }
        assert_eq!(seen.len(), total);
        assert_eq!(store.used_word_count(), total);
        assert!(store.available_words().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn reset_word_tracking_only_clears_usage() -> anyhow::Result<()> {
        let (store, _) = store();
        store.start_new_session(3);
        let words = store.load_all_words().await?;
        store.mark_word_as_used(words[0].id.expect("id"));
        store.reset_word_tracking();
        assert_eq!(store.used_word_count(), 0);
        assert_eq!(store.current_game_id(), Some(3));
        Ok(())
    }
}
