//! Fan-out / fan-in over many probes.
//!
//! [`run_all`] puts every probe on its own thread and returns at once;
//! [`Aggregation::collect`] waits for all of them and hands results back
//! in submission order. Downstream formatting indexes results
//! positionally, so the reordering is part of the contract.

use crate::probe::{Probe, ProbeResult, ProbeStatus};
use crate::shell::Shell;
use log::{debug, trace};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};
use std::thread;

/// Handle to a set of in-flight probes.
///
/// Consumed by [`collect`](Self::collect); it cannot be collected twice.
#[derive(Debug)]
pub struct Aggregation<T> {
    names: Vec<String>,
    receiver: Receiver<ProbeResult<T>>,
}

/// Dispatch every probe concurrently. Does not block.
pub fn run_all<T: Send + 'static>(probes: Vec<Probe<T>>, shell: Arc<dyn Shell>) -> Aggregation<T> {
    let (sender, receiver) = mpsc::channel();
    let names = probes.iter().map(|p| p.name().to_string()).collect();

    for (index, probe) in probes.into_iter().enumerate() {
        let sender = sender.clone();
        let shell = Arc::clone(&shell);
        let spawned = thread::Builder::new()
            .name(format!("probe-{}", probe.name()))
            .spawn(move || {
                let result = probe.execute(shell.as_ref(), index);
                trace!("probe {} finished: {:?}", result.name, result.status);
                // The receiver only goes away if the handle was dropped uncollected.
                let _ = sender.send(result);
            });
        if let Err(e) = spawned {
            debug!("could not spawn probe thread #{index}: {e}");
        }
    }

    Aggregation { names, receiver }
}

impl<T> Aggregation<T> {
    /// Number of probes dispatched.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Block until every probe reported; results come back in submission order.
    ///
    /// A probe that never reports (its thread died or could not start) is
    /// back-filled with a failed result, so the output length always equals
    /// the number of probes dispatched.
    pub fn collect(self) -> Vec<ProbeResult<T>> {
        let mut slots: Vec<Option<ProbeResult<T>>> = self.names.iter().map(|_| None).collect();

        // Ends once every sender clone has been dropped.
        for result in self.receiver {
            match slots.get_mut(result.index) {
                Some(slot) if slot.is_none() => *slot = Some(result),
                Some(_) => debug!("duplicate result for probe #{}", result.index),
                None => debug!("result for unknown probe #{}", result.index),
            }
        }

        slots
            .into_iter()
            .zip(self.names)
            .enumerate()
            .map(|(index, (slot, name))| {
                slot.unwrap_or_else(|| {
                    ProbeResult::absent(
                        &name,
                        index,
                        ProbeStatus::Failed("probe did not report".to_string()),
                    )
                })
            })
            .collect()
    }

    /// Collect, keeping only values that were found, keyed by probe name.
    pub fn collect_found(self) -> BTreeMap<String, T> {
        self.collect()
            .into_iter()
            .filter_map(|r| r.value.map(|v| (r.name, v)))
            .collect()
    }
}

/// Counts per status, computed after collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub found: usize,
    pub empty: usize,
    pub not_installed: usize,
    pub failed: usize,
}

impl Tally {
    pub fn of<T>(results: &[ProbeResult<T>]) -> Self {
        results.iter().fold(Self::default(), |mut tally, r| {
            match r.status {
                ProbeStatus::Found => tally.found += 1,
                ProbeStatus::Empty => tally.empty += 1,
                ProbeStatus::NotInstalled => tally.not_installed += 1,
                ProbeStatus::Failed(_) => tally.failed += 1,
            }
            tally
        })
    }

    pub fn total(&self) -> usize {
        self.found + self.empty + self.not_installed + self.failed
    }
}
