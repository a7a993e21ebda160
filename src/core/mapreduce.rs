//! In-process map/shuffle/reduce engine.
//!
//! The map phase splits the input into at most `workers` contiguous partitions
//! and maps them on the blocking thread pool. The shuffle groups the emitted
//! pairs by key. The reduce phase deals the key groups into at most `workers`
//! chunks and reduces them the same way. Partitions are stitched back together
//! in their original order, so output is sorted by key and reruns are
//! byte-identical.

use crate::core::shuffle::{group_by_key, partition};
use crate::domain::model::StageCounters;
use crate::domain::ports::{Mapper, Reducer};
use crate::utils::error::{EtlError, Result};
use std::sync::Arc;
use tokio::task::JoinSet;

#[derive(Debug, Clone)]
pub struct MapReduceOutput<O> {
    pub records: Vec<O>,
    pub counters: StageCounters,
}

#[derive(Debug, Clone)]
pub struct LocalMapReduce {
    workers: usize,
}

impl LocalMapReduce {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs one full map/reduce stage over `lines`.
    ///
    /// Any mapper or reducer error aborts the stage; when several partitions
    /// fail, the error from the earliest partition is returned.
    pub async fn run<M, R>(
        &self,
        stage: &str,
        lines: Vec<String>,
        mapper: M,
        reducer: R,
    ) -> Result<MapReduceOutput<R::Output>>
    where
        M: Mapper,
        R: Reducer<Key = M::Key, Value = M::Value>,
    {
        let input_records = lines.len();

        let pairs = self.map_phase(stage, lines, Arc::new(mapper)).await?;
        let map_output_records = pairs.len();

        let grouped = group_by_key(pairs);
        let reduce_input_groups = grouped.len();
        tracing::debug!(
            "[{}] shuffled {} pairs into {} groups",
            stage,
            map_output_records,
            reduce_input_groups
        );

        let records = self
            .reduce_phase(stage, grouped.into_iter().collect(), Arc::new(reducer))
            .await?;

        let counters = StageCounters {
            input_records,
            map_output_records,
            reduce_input_groups,
            reduce_output_records: records.len(),
        };

        Ok(MapReduceOutput { records, counters })
    }

    async fn map_phase<M: Mapper>(
        &self,
        stage: &str,
        lines: Vec<String>,
        mapper: Arc<M>,
    ) -> Result<Vec<(M::Key, M::Value)>> {
        let numbered: Vec<(usize, String)> = lines
            .into_iter()
            .enumerate()
            .map(|(index, line)| (index + 1, line))
            .collect();
        let partitions = partition(numbered, self.workers);
        tracing::debug!("[{}] map phase over {} partitions", stage, partitions.len());

        let mut tasks = JoinSet::new();
        for (index, chunk) in partitions.into_iter().enumerate() {
            let mapper = Arc::clone(&mapper);
            tasks.spawn_blocking(move || -> Result<(usize, Vec<(M::Key, M::Value)>)> {
                let mut pairs = Vec::with_capacity(chunk.len());
                for (line_no, line) in &chunk {
                    if let Some(pair) = mapper.map(*line_no, line)? {
                        pairs.push(pair);
                    }
                }
                Ok((index, pairs))
            });
        }

        let chunks = join_in_order(stage, tasks).await?;
        Ok(chunks.into_iter().flatten().collect())
    }

    async fn reduce_phase<R: Reducer>(
        &self,
        stage: &str,
        groups: Vec<(R::Key, Vec<R::Value>)>,
        reducer: Arc<R>,
    ) -> Result<Vec<R::Output>> {
        let chunks = partition(groups, self.workers);
        tracing::debug!("[{}] reduce phase over {} chunks", stage, chunks.len());

        let mut tasks = JoinSet::new();
        for (index, chunk) in chunks.into_iter().enumerate() {
            let reducer = Arc::clone(&reducer);
            tasks.spawn_blocking(move || -> Result<(usize, Vec<R::Output>)> {
                let outputs = chunk
                    .into_iter()
                    .map(|(key, values)| reducer.reduce(&key, values))
                    .collect::<Result<Vec<_>>>()?;
                Ok((index, outputs))
            });
        }

        let outputs = join_in_order(stage, tasks).await?;
        Ok(outputs.into_iter().flatten().collect())
    }
}

/// Waits for every task, then returns the chunks in partition order.
async fn join_in_order<T: Send + 'static>(
    stage: &str,
    mut tasks: JoinSet<Result<(usize, Vec<T>)>>,
) -> Result<Vec<Vec<T>>> {
    let mut chunks = Vec::new();
    let mut failures: Vec<(usize, EtlError)> = Vec::new();

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(chunk)) => chunks.push(chunk),
            Ok(Err(e)) => failures.push((failure_rank(&e), e)),
            Err(join_error) => failures.push((
                usize::MAX,
                EtlError::StageError {
                    stage: stage.to_string(),
                    details: format!("worker task failed: {}", join_error),
                },
            )),
        }
    }

    if let Some((_, e)) = failures.into_iter().min_by_key(|(rank, _)| *rank) {
        return Err(e);
    }

    chunks.sort_by_key(|(index, _)| *index);
    Ok(chunks.into_iter().map(|(_, chunk)| chunk).collect())
}

fn failure_rank(error: &EtlError) -> usize {
    match error {
        EtlError::MalformedFieldError { line, .. } => *line,
        _ => usize::MAX - 1,
    }
}
