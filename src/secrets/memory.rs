use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;

use super::{PageSource, SecretDeleter, SecretError, SecretRecord, SecretResult};

/// In-memory page source (for testing only).
///
/// Yields the scripted pages in order; an `Err` entry is returned once and the
/// source then moves on to the next entry.
pub struct MemoryPageSource {
    pages: VecDeque<SecretResult<Vec<SecretRecord>>>,
}

impl MemoryPageSource {
    pub fn new(pages: Vec<SecretResult<Vec<SecretRecord>>>) -> Self {
        Self {
            pages: pages.into(),
        }
    }

    /// A source whose pages all succeed.
    pub fn from_pages(pages: Vec<Vec<SecretRecord>>) -> Self {
        Self::new(pages.into_iter().map(Ok).collect())
    }

    /// A source with no pages at all.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl PageSource for MemoryPageSource {
    fn has_more_pages(&self) -> bool {
        !self.pages.is_empty()
    }

    async fn next_page(&mut self) -> SecretResult<Vec<SecretRecord>> {
        self.pages.pop_front().unwrap_or(Err(SecretError::Exhausted))
    }
}

/// In-memory deleter that records every call (for testing only).
#[derive(Clone, Default)]
pub struct MemorySecretStore {
    calls: Arc<Mutex<Vec<(String, Option<u32>)>>>,
    failing: Arc<Mutex<Vec<String>>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make deletes of `identifier` fail.
    pub fn fail_on(self, identifier: impl Into<String>) -> Self {
        if let Ok(mut failing) = self.failing.lock() {
            failing.push(identifier.into());
        }
        self
    }

    /// Every delete call received, in order, with its recovery window.
    pub fn calls(&self) -> Vec<(String, Option<u32>)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Identifiers of every delete call received, in order.
    pub fn deleted_identifiers(&self) -> Vec<String> {
        self.calls().into_iter().map(|(id, _)| id).collect()
    }
}

#[async_trait]
impl SecretDeleter for MemorySecretStore {
    async fn delete(
        &self,
        identifier: &str,
        recovery_window_days: Option<u32>,
    ) -> SecretResult<()> {
        self.calls
            .lock()
            .map_err(|e| SecretError::Internal(e.to_string()))?
            .push((identifier.to_string(), recovery_window_days));

        let failing = self
            .failing
            .lock()
            .map_err(|e| SecretError::Internal(e.to_string()))?;
        if failing.iter().any(|f| f == identifier) {
            return Err(SecretError::Connection(format!(
                "simulated failure deleting '{}'",
                identifier
            )));
        }
        Ok(())
    }
}
