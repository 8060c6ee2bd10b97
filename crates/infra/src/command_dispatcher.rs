//! Command execution pipeline (application-level orchestration).
//!
//! ```text
//! Command
//!   ↓
//! 1. Start from a known state (a committed snapshot, or an empty aggregate)
//!   ↓
//! 2. Catch up (apply the stream events recorded after that state)
//!   ↓
//! 3. Handle the command (pure decision, produces events)
//!   ↓
//! 4. Append with an exact expected version (optimistic concurrency)
//!   ↓
//! 5. Apply the committed events and return the new state
//! ```
//!
//! A version conflict at step 4 means another writer appended first. The
//! dispatcher goes back to step 2, reading only the events it has not seen,
//! so concurrent commands against the same aggregate are serialized without
//! losing updates. Retries are unbounded unless a cap is set with
//! [`CommandDispatcher::with_max_attempts`].

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use kivu_core::{Aggregate, AggregateId, AggregateRoot, DomainError, ExpectedVersion};

use crate::event_store::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};

/// Conflicts answered with a plain `yield_now` before retries start sleeping.
const YIELD_ATTEMPTS: u32 = 8;

/// Longest pause between two attempts.
const MAX_BACKOFF: Duration = Duration::from_millis(1);

#[derive(Debug, Error)]
pub enum DispatchError {
    /// Deterministic domain failure (validation, not found, invalid state...).
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Optimistic concurrency kept failing past a configured attempt cap.
    #[error("concurrent modification: {0}")]
    Concurrency(String),

    /// A stored payload could not be decoded into the aggregate's event type.
    #[error("failed to deserialize stored event: {0}")]
    Deserialize(String),

    /// Any other event store failure.
    #[error(transparent)]
    Store(EventStoreError),
}

impl From<EventStoreError> for DispatchError {
    fn from(value: EventStoreError) -> Self {
        match value {
            EventStoreError::Concurrency(msg) => DispatchError::Concurrency(msg),
            other => DispatchError::Store(other),
        }
    }
}

/// Outcome of a successful dispatch.
#[derive(Debug, Clone)]
pub struct Dispatched<A> {
    /// Aggregate state after the committed events were applied.
    pub aggregate: A,
    pub committed: Vec<StoredEvent>,
}

/// Reusable command execution engine for event-sourced aggregates.
#[derive(Debug)]
pub struct CommandDispatcher<S> {
    store: S,
    max_attempts: Option<u32>,
}

impl<S> CommandDispatcher<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            max_attempts: None,
        }
    }

    /// Give up with [`DispatchError::Concurrency`] after `max_attempts` conflicts.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts.max(1));
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S> CommandDispatcher<S>
where
    S: EventStore,
{
    /// Rehydrate an aggregate from its full stream without handling a command.
    pub fn load<A>(
        &self,
        aggregate_id: AggregateId,
        make_aggregate: impl FnOnce(AggregateId) -> A,
    ) -> Result<(A, Vec<StoredEvent>), DispatchError>
    where
        A: Aggregate,
        A::Event: DeserializeOwned,
    {
        let history = self.store.load_stream(aggregate_id)?;
        validate_loaded_stream(aggregate_id, 0, &history)?;

        let mut aggregate = make_aggregate(aggregate_id);
        apply_history(&mut aggregate, &history)?;
        Ok((aggregate, history))
    }

    /// Bring `aggregate` up to the head of its stream. Returns how many events
    /// were applied.
    pub fn catch_up<A>(&self, aggregate_id: AggregateId, aggregate: &mut A) -> Result<usize, DispatchError>
    where
        A: Aggregate,
        A::Event: DeserializeOwned,
    {
        let from = aggregate.version();
        let tail = self.store.load_stream_after(aggregate_id, from)?;
        validate_loaded_stream(aggregate_id, from, &tail)?;
        apply_history(aggregate, &tail)?;
        Ok(tail.len())
    }

    /// Dispatch a command against a freshly rehydrated aggregate.
    pub fn dispatch<A>(
        &self,
        aggregate_id: AggregateId,
        aggregate_type: &str,
        command: &A::Command,
        make_aggregate: impl Fn(AggregateId) -> A,
    ) -> Result<Dispatched<A>, DispatchError>
    where
        A: Aggregate<Error = DomainError>,
        A::Event: kivu_events::Event + Serialize + DeserializeOwned,
    {
        self.dispatch_from(aggregate_id, aggregate_type, command, None, make_aggregate)
    }

    /// Dispatch a command, starting from `snapshot` when one is given.
    ///
    /// `snapshot` must be a state this dispatcher committed earlier; only the
    /// events after its version are read. If the stream turns out to be behind
    /// the snapshot, the snapshot is dropped and the stream replayed from the
    /// start.
    pub fn dispatch_from<A>(
        &self,
        aggregate_id: AggregateId,
        aggregate_type: &str,
        command: &A::Command,
        snapshot: Option<A>,
        make_aggregate: impl Fn(AggregateId) -> A,
    ) -> Result<Dispatched<A>, DispatchError>
    where
        A: Aggregate<Error = DomainError>,
        A::Event: kivu_events::Event + Serialize + DeserializeOwned,
    {
        let mut aggregate = snapshot.unwrap_or_else(|| make_aggregate(aggregate_id));
        let mut attempt = 1;
        loop {
            let applied = self.catch_up(aggregate_id, &mut aggregate)?;
            if attempt > 1 && applied == 0 && aggregate.version() > 0 {
                // The last append conflicted yet the stream has nothing newer.
                debug!(aggregate_id = %aggregate_id, aggregate_type, "snapshot ahead of stream, replaying");
                aggregate = make_aggregate(aggregate_id);
                self.catch_up(aggregate_id, &mut aggregate)?;
            }

            // Decide events (no mutation)
            let decided = aggregate.handle(command)?;
            if decided.is_empty() {
                return Ok(Dispatched {
                    aggregate,
                    committed: vec![],
                });
            }

            // Persist (append-only, optimistic)
            let uncommitted = decided
                .iter()
                .map(|ev| UncommittedEvent::from_typed(aggregate_id, aggregate_type, Uuid::now_v7(), ev))
                .collect::<Result<Vec<_>, _>>()?;

            match self
                .store
                .append(uncommitted, ExpectedVersion::Exact(aggregate.version()))
            {
                Ok(committed) => {
                    for ev in &decided {
                        aggregate.apply(ev);
                    }
                    return Ok(Dispatched {
                        aggregate,
                        committed,
                    });
                }
                Err(EventStoreError::Concurrency(msg)) => {
                    if self.max_attempts.is_some_and(|max| attempt >= max) {
                        return Err(DispatchError::Concurrency(msg));
                    }
                    debug!(
                        aggregate_id = %aggregate_id,
                        aggregate_type,
                        attempt,
                        reason = %msg,
                        "version conflict, retrying command"
                    );
                    backoff(attempt);
                    attempt += 1;
                }
                Err(other) => return Err(other.into()),
            }
        }
    }
}

fn backoff(attempt: u32) {
    if attempt <= YIELD_ATTEMPTS {
        std::thread::yield_now();
        return;
    }
    let exp = (attempt - YIELD_ATTEMPTS).min(10);
    std::thread::sleep(Duration::from_micros(1u64 << exp).min(MAX_BACKOFF));
}

fn validate_loaded_stream(aggregate_id: AggregateId, from: u64, stream: &[StoredEvent]) -> Result<(), DispatchError> {
    // Streams must be gap-free and belong to the requested aggregate.
    let mut last = from;
    for (idx, e) in stream.iter().enumerate() {
        if e.aggregate_id != aggregate_id {
            return Err(DispatchError::Store(EventStoreError::InvalidAppend(format!(
                "loaded stream contains wrong aggregate_id at index {idx}"
            ))));
        }
        if e.sequence_number != last + 1 {
            return Err(DispatchError::Store(EventStoreError::InvalidAppend(format!(
                "non-contiguous sequence_number in loaded stream (last={last}, found={})",
                e.sequence_number
            ))));
        }
        last = e.sequence_number;
    }
    Ok(())
}

fn apply_history<A>(aggregate: &mut A, history: &[StoredEvent]) -> Result<(), DispatchError>
where
    A: Aggregate,
    A::Event: DeserializeOwned,
{
    for stored in history {
        let ev: A::Event = serde_json::from_value(stored.payload.clone())
            .map_err(|e| DispatchError::Deserialize(e.to_string()))?;
        aggregate.apply(&ev);
    }
    Ok(())
}
