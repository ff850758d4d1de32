//! In-memory checkpointer. Not persistent; for the default counter run and tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::memory::checkpoint::{window_list, Checkpoint, CheckpointListItem, CheckpointMetadata};
use crate::memory::checkpointer::{CheckpointError, Checkpointer};
use crate::memory::config::RunnableConfig;

/// Key: `thread_id:checkpoint_ns`; each key holds its checkpoints newest last.
pub struct MemorySaver<S> {
    by_thread: Arc<RwLock<HashMap<String, Vec<Checkpoint<S>>>>>,
}

impl<S> MemorySaver<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            by_thread: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn thread_key(config: &RunnableConfig) -> Result<String, CheckpointError> {
        let thread_id = config
            .thread_id
            .as_deref()
            .ok_or(CheckpointError::ThreadIdRequired)?;
        Ok(format!("{}:{}", thread_id, config.checkpoint_ns))
    }
}

impl<S> Default for MemorySaver<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<S> Checkpointer<S> for MemorySaver<S>
where
    S: Clone + Send + Sync + 'static,
{
    async fn put(
        &self,
        config: &RunnableConfig,
        checkpoint: &Checkpoint<S>,
    ) -> Result<String, CheckpointError> {
        let key = Self::thread_key(config)?;
        let mut guard = self.by_thread.write().await;
        guard.entry(key).or_default().push(checkpoint.clone());
        Ok(checkpoint.id.clone())
    }

    async fn get_tuple(
        &self,
        config: &RunnableConfig,
    ) -> Result<Option<(Checkpoint<S>, CheckpointMetadata)>, CheckpointError> {
        let key = Self::thread_key(config)?;
        let guard = self.by_thread.read().await;
        let Some(list) = guard.get(&key) else {
            return Ok(None);
        };
        let found = match &config.checkpoint_id {
            Some(cid) => list.iter().find(|cp| &cp.id == cid),
            None => list.last(),
        };
        Ok(found.map(|cp| (cp.clone(), cp.metadata.clone())))
    }

    async fn list(
        &self,
        config: &RunnableConfig,
        limit: Option<usize>,
        before: Option<&str>,
        after: Option<&str>,
    ) -> Result<Vec<CheckpointListItem>, CheckpointError> {
        let key = Self::thread_key(config)?;
        let guard = self.by_thread.read().await;
        let items = guard
            .get(&key)
            .map(|list| {
                list.iter()
                    .map(|cp| CheckpointListItem {
                        checkpoint_id: cp.id.clone(),
                        metadata: cp.metadata.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(window_list(items, limit, before, after))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::CheckpointSource;

    /// **Scenario**: get_tuple returns the newest checkpoint, or the one named by checkpoint_id.
    #[tokio::test]
    async fn get_tuple_latest_or_by_id() {
        let saver = MemorySaver::<i32>::new();
        let config = RunnableConfig::for_thread("1");
        let first = Checkpoint::from_state(1, CheckpointSource::Update, 1);
        saver.put(&config, &first).await.unwrap();
        saver
            .put(&config, &Checkpoint::from_state(2, CheckpointSource::Update, 1))
            .await
            .unwrap();

        let (latest, _) = saver.get_tuple(&config).await.unwrap().unwrap();
        assert_eq!(latest.state, 2);

        let by_id = RunnableConfig {
            checkpoint_id: Some(first.id.clone()),
            ..config.clone()
        };
        let (old, _) = saver.get_tuple(&by_id).await.unwrap().unwrap();
        assert_eq!(old.state, 1);
        assert_eq!(saver.list(&config, None, None, None).await.unwrap().len(), 2);
    }

    /// **Scenario**: Missing thread_id is rejected.
    #[tokio::test]
    async fn thread_id_required() {
        let saver = MemorySaver::<i32>::new();
        let err = saver.get_tuple(&RunnableConfig::default()).await.unwrap_err();
        assert!(matches!(err, CheckpointError::ThreadIdRequired));
    }
}
