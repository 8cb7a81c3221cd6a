//! Browser Pool Management
//!
//! Runs browser tasks, each in a fresh session, with a semaphore bounding how
//! many sessions are open at the same time.

use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::engine::{BrowserEngine, BrowserTask, SessionOptions};
use crate::error::EngineError;

/// Hard ceiling on concurrent browser sessions for a batch
pub const MAX_PARALLEL: usize = 5;

/// Clamp a caller-requested parallelism into `1..=MAX_PARALLEL`
pub fn effective_parallelism(requested: i64) -> usize {
    requested.clamp(1, MAX_PARALLEL as i64) as usize
}

/// Run one task in its own session. The session is closed whether or not
/// the task succeeds.
pub async fn execute<T>(
    engine: &dyn BrowserEngine,
    options: &SessionOptions,
    task: &T,
) -> Result<T::Output, EngineError>
where
    T: BrowserTask + ?Sized,
{
    let mut session = engine.open_session(options).await?;
    let result = task.run(session.as_mut()).await;

    if let Err(e) = session.close().await {
        warn!("Failed to close browser session: {}", e);
    }

    result
}

/// Bounded pool for running a batch of tasks
pub struct BrowserPool {
    engine: Arc<dyn BrowserEngine>,
    semaphore: Arc<Semaphore>,
    max_instances: usize,
}

impl BrowserPool {
    /// Create new browser pool
    pub fn new(engine: Arc<dyn BrowserEngine>, max_instances: usize) -> Self {
        let max_instances = max_instances.clamp(1, MAX_PARALLEL);
        Self {
            engine,
            semaphore: Arc::new(Semaphore::new(max_instances)),
            max_instances,
        }
    }

    pub fn max_instances(&self) -> usize {
        self.max_instances
    }

    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Run every task and return outputs in input order.
    ///
    /// All spawned tasks are awaited even when one fails, so no session
    /// outlives the call. The first error in input order is returned.
    pub async fn run_all<T>(
        &self,
        options: &SessionOptions,
        tasks: Vec<T>,
    ) -> Result<Vec<T::Output>, EngineError>
    where
        T: BrowserTask + 'static,
        T::Output: 'static,
    {
        info!(
            "Running {} browser tasks with parallelism {}",
            tasks.len(),
            self.max_instances
        );

        let handles: Vec<_> = tasks
            .into_iter()
            .enumerate()
            .map(|(index, task)| {
                let engine = self.engine.clone();
                let semaphore = self.semaphore.clone();
                let options = options.clone();

                tokio::spawn(async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|e| EngineError::Worker(e.to_string()))?;
                    debug!("Browser task {} acquired a session slot", index);
                    execute(engine.as_ref(), &options, &task).await
                })
            })
            .collect();

        let joined = futures_util::future::join_all(handles).await;

        let mut outputs = Vec::with_capacity(joined.len());
        for outcome in joined {
            let output = outcome.map_err(|e| EngineError::Worker(e.to_string()))??;
            outputs.push(output);
        }

        Ok(outputs)
    }
}
