//! Choice of the kernels that sample offspring in a round.

use crate::options::UpdateOrder;
use crate::pool::KernelId;
use rand::rngs::StdRng;
use std::collections::BTreeMap;
use tracing::debug;

/// Sort `ids` by `order`, computing each key once. Stable for equal keys.
fn sorted(ids: &[KernelId], order: &UpdateOrder, rng: &mut StdRng) -> Vec<KernelId> {
    let mut keyed: Vec<(f64, KernelId)> = ids.iter().map(|&id| (order.key(id, rng), id)).collect();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
    keyed.into_iter().map(|(_, id)| id).collect()
}

/// Pick `number_to_ask` kernels, draining `remaining` first.
///
/// When `remaining` runs short, the shortfall is taken from the whole
/// `active` set sorted by `order`, skipping kernels already chosen, and what
/// is left of that sort becomes the new remaining pool. `number_to_ask` must
/// not exceed `active.len()`. Returns `(chosen, new_remaining)`.
pub fn ask_indices(
    active: &[KernelId],
    remaining: &[KernelId],
    number_to_ask: usize,
    order: &UpdateOrder,
    rng: &mut StdRng,
) -> (Vec<KernelId>, Vec<KernelId>) {
    let pending: Vec<KernelId> = remaining
        .iter()
        .copied()
        .filter(|id| active.contains(id))
        .collect();
    let mut pending = sorted(&pending, order, rng);

    if number_to_ask <= pending.len() {
        let rest = pending.split_off(number_to_ask);
        return (pending, rest);
    }

    let mut chosen = pending;
    let refill: Vec<KernelId> = sorted(active, order, rng)
        .into_iter()
        .filter(|id| !chosen.contains(id))
        .collect();
    let shortfall = (number_to_ask - chosen.len()).min(refill.len());
    chosen.extend_from_slice(&refill[..shortfall]);
    (chosen, refill[shortfall..].to_vec())
}

/// Round-robin scheduler over the active kernels.
#[derive(Debug)]
pub struct AskScheduler {
    order: UpdateOrder,
    remaining: Vec<KernelId>,
    rng: StdRng,
}

impl AskScheduler {
    pub fn new(order: UpdateOrder, initial: Vec<KernelId>, rng: StdRng) -> Self {
        Self {
            order,
            remaining: initial,
            rng,
        }
    }

    /// Choose the kernels of the next round and advance the rotation.
    pub fn next(&mut self, active: &[KernelId], number_to_ask: usize) -> Vec<KernelId> {
        let (chosen, remaining) = ask_indices(
            active,
            &self.remaining,
            number_to_ask,
            &self.order,
            &mut self.rng,
        );
        debug!(?chosen, remaining = remaining.len(), "kernels scheduled");
        self.remaining = remaining;
        chosen
    }

    /// Kernels not yet visited in the current rotation.
    pub fn remaining(&self) -> &[KernelId] {
        &self.remaining
    }

    pub fn order(&self) -> &UpdateOrder {
        &self.order
    }

    pub fn set_order(&mut self, order: UpdateOrder) {
        self.order = order;
    }

    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Apply a renumbering produced by pool compaction.
    pub fn remap(&mut self, mapping: &BTreeMap<KernelId, KernelId>) {
        self.remaining = self
            .remaining
            .iter()
            .filter_map(|id| mapping.get(id).copied())
            .collect();
    }
}
