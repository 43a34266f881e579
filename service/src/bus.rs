//! In-process bet bus with per-jackpot FIFO delivery.
//!
//! Events are keyed by `jackpot_id` onto a fixed set of partitions, each
//! drained by a single worker, so all events for one jackpot are applied
//! in publish order. Delivery is at-least-once: a version-conflict abort
//! in the contribution pipeline is redelivered to the same worker, and
//! duplicates are absorbed by the engine's `bet_id` idempotency.

use std::sync::Arc;

use jackpot_engine::contribute::ContributionService;
use jackpot_engine::EngineError;
use jackpot_types::BetEvent;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Queued events per partition before publishers are backpressured.
const PARTITION_BUFFER: usize = 1024;

/// Redelivery attempts for one event before it is dropped to the log.
const MAX_DELIVERY_ATTEMPTS: u32 = 5;

#[derive(Debug, thiserror::Error)]
#[error("bet bus is shut down")]
pub struct BusClosed;

/// Producer half of the bus.
pub struct BetBus {
    senders: Vec<mpsc::Sender<BetEvent>>,
}

impl BetBus {
    /// Spawn one worker per partition, each feeding the contribution
    /// pipeline. Returns the producer and the worker handles.
    pub fn start(
        contribution: Arc<ContributionService>,
        partitions: usize,
    ) -> (Self, Vec<JoinHandle<()>>) {
        let partitions = partitions.max(1);
        let mut senders = Vec::with_capacity(partitions);
        let mut workers = Vec::with_capacity(partitions);
        for partition in 0..partitions {
            let (sender, receiver) = mpsc::channel(PARTITION_BUFFER);
            senders.push(sender);
            workers.push(tokio::spawn(drain_partition(
                partition,
                receiver,
                Arc::clone(&contribution),
            )));
        }
        (Self { senders }, workers)
    }

    /// Publish an event to its jackpot's partition, awaiting if the
    /// partition buffer is full.
    pub async fn publish(&self, event: BetEvent) -> Result<(), BusClosed> {
        let partition = self.partition_for(event.jackpot_id);
        self.senders[partition]
            .send(event)
            .await
            .map_err(|_| BusClosed)
    }

    /// Stable jackpot-to-partition assignment; per-jackpot FIFO depends
    /// on every event for a jackpot landing on the same partition.
    pub fn partition_for(&self, jackpot_id: i64) -> usize {
        (jackpot_id.unsigned_abs() % self.senders.len() as u64) as usize
    }
}

async fn drain_partition(
    partition: usize,
    mut receiver: mpsc::Receiver<BetEvent>,
    contribution: Arc<ContributionService>,
) {
    info!(partition, "bet bus partition worker started");
    while let Some(event) = receiver.recv().await {
        deliver(partition, &event, &contribution);
    }
    info!(partition, "bet bus partition worker stopped");
}

fn deliver(partition: usize, event: &BetEvent, contribution: &ContributionService) {
    for attempt in 1..=MAX_DELIVERY_ATTEMPTS {
        match contribution.contribute(event) {
            Ok(_) => return,
            Err(EngineError::VersionConflict(jackpot_id)) => {
                warn!(
                    partition,
                    bet_id = event.bet_id,
                    jackpot_id,
                    attempt,
                    "contribution lost version race; redelivering"
                );
            }
            Err(err) => {
                error!(
                    partition,
                    bet_id = event.bet_id,
                    jackpot_id = event.jackpot_id,
                    %err,
                    "bet event rejected"
                );
                return;
            }
        }
    }
    error!(
        partition,
        bet_id = event.bet_id,
        jackpot_id = event.jackpot_id,
        attempts = MAX_DELIVERY_ATTEMPTS,
        "bet event dropped after redelivery attempts"
    );
}
