//! Identity-stable storage of the kernel population.

use crate::error::{SofomoreError, SofomoreResult};
use serde::{Deserialize, Serialize};
use sofomore_archive::ObjectiveVector;
use sofomore_kernel::{Kernel, StopStatus};
use std::collections::BTreeMap;
use std::fmt;
use tracing::info;

/// Index of a kernel in the pool. Never reused until [`KernelPool::compact`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct KernelId(pub usize);

impl fmt::Display for KernelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stop reason reported for kernels turned off with [`KernelPool::inactivate`].
pub const INACTIVE_REASON: &str = "inactive";

/// One kernel plus the bookkeeping the coordinator keeps about it.
pub struct KernelSlot {
    kernel: Box<dyn Kernel>,
    objective_values: Option<ObjectiveVector>,
    inactive: bool,
    readmitted: bool,
    last_offspring_values: Vec<ObjectiveVector>,
    nondominated_ratio: Option<f64>,
}

impl KernelSlot {
    fn new(kernel: Box<dyn Kernel>) -> Self {
        Self {
            kernel,
            objective_values: None,
            inactive: false,
            readmitted: false,
            last_offspring_values: Vec::new(),
            nondominated_ratio: None,
        }
    }

    pub fn kernel(&self) -> &dyn Kernel {
        self.kernel.as_ref()
    }

    pub fn kernel_mut(&mut self) -> &mut dyn Kernel {
        self.kernel.as_mut()
    }

    pub fn into_kernel(self) -> Box<dyn Kernel> {
        self.kernel
    }

    /// Objective vector of the incumbent, `None` until first evaluated.
    pub fn objective_values(&self) -> Option<&ObjectiveVector> {
        self.objective_values.as_ref()
    }

    pub fn set_objective_values(&mut self, values: ObjectiveVector) {
        self.objective_values = Some(values);
    }

    pub fn is_inactive(&self) -> bool {
        self.inactive
    }

    /// Re-admitted with [`KernelPool::activate`] and not told since.
    pub fn is_readmitted(&self) -> bool {
        self.readmitted
    }

    /// The kernel was told; its own stop status applies again.
    pub(crate) fn clear_readmission(&mut self) {
        self.readmitted = false;
    }

    /// Objective vectors of the offspring told in the last round this
    /// kernel was asked.
    pub fn last_offspring_values(&self) -> &[ObjectiveVector] {
        &self.last_offspring_values
    }

    pub(crate) fn set_last_offspring_values(&mut self, values: Vec<ObjectiveVector>) {
        self.last_offspring_values = values;
    }

    /// Share of the last offspring batch that was non-dominated by the
    /// other kernels' front.
    pub fn nondominated_ratio(&self) -> Option<f64> {
        self.nondominated_ratio
    }

    pub(crate) fn set_nondominated_ratio(&mut self, ratio: f64) {
        self.nondominated_ratio = Some(ratio);
    }

    /// Kernel stop status, extended with [`INACTIVE_REASON`] when turned off.
    pub fn status(&self) -> StopStatus {
        let mut status = self.kernel.stop();
        if self.inactive {
            status.insert(INACTIVE_REASON, 1.0);
        }
        status
    }
}

impl fmt::Debug for KernelSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelSlot")
            .field("dimension", &self.kernel.dimension())
            .field("objective_values", &self.objective_values)
            .field("inactive", &self.inactive)
            .field("stop", &self.kernel.stop())
            .finish()
    }
}

/// Ordered kernel collection with tombstoned removals and the sorted set of
/// kernels eligible for scheduling.
#[derive(Debug, Default)]
pub struct KernelPool {
    slots: Vec<Option<KernelSlot>>,
    active: Vec<KernelId>,
}

impl KernelPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live kernels.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Id the next added kernel receives.
    pub fn next_id(&self) -> KernelId {
        KernelId(self.slots.len())
    }

    pub fn get(&self, id: KernelId) -> Option<&KernelSlot> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: KernelId) -> Option<&mut KernelSlot> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn slot(&self, id: KernelId) -> SofomoreResult<&KernelSlot> {
        self.get(id).ok_or(SofomoreError::InvalidKernelIndex(id))
    }

    pub fn slot_mut(&mut self, id: KernelId) -> SofomoreResult<&mut KernelSlot> {
        self.get_mut(id).ok_or(SofomoreError::InvalidKernelIndex(id))
    }

    pub fn contains(&self, id: KernelId) -> bool {
        self.get(id).is_some()
    }

    /// Ids of all live kernels, ascending.
    pub fn ids(&self) -> Vec<KernelId> {
        self.iter().map(|(id, _)| id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (KernelId, &KernelSlot)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|slot| (KernelId(i), slot)))
    }

    /// Kernels eligible for scheduling, ascending.
    pub fn active(&self) -> &[KernelId] {
        &self.active
    }

    pub fn is_active(&self, id: KernelId) -> bool {
        self.active.binary_search(&id).is_ok()
    }

    /// Append kernels and recompute the active set; already terminated
    /// kernels are stored but not scheduled.
    pub fn add(&mut self, kernels: Vec<Box<dyn Kernel>>) -> Vec<KernelId> {
        let ids: Vec<KernelId> = kernels
            .into_iter()
            .map(|kernel| {
                let id = self.next_id();
                self.slots.push(Some(KernelSlot::new(kernel)));
                info!(kernel = %id, "kernel added");
                id
            })
            .collect();
        self.recompute_active();
        ids
    }

    /// Delete a kernel, leaving a tombstone so other ids stay valid.
    pub fn remove(&mut self, id: KernelId) -> SofomoreResult<KernelSlot> {
        let slot = self
            .slots
            .get_mut(id.0)
            .and_then(Option::take)
            .ok_or(SofomoreError::InvalidKernelIndex(id))?;
        info!(kernel = %id, "kernel removed");
        self.recompute_active();
        Ok(slot)
    }

    /// Drop a kernel from scheduling, e.g. after it terminated.
    pub fn deactivate(&mut self, id: KernelId) -> bool {
        match self.active.binary_search(&id) {
            Ok(pos) => {
                self.active.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    /// Turn a kernel off: it keeps its objective vector on the front but is
    /// no longer scheduled.
    pub fn inactivate(&mut self, id: KernelId) -> SofomoreResult<()> {
        let slot = self.slot_mut(id)?;
        if slot.inactive {
            return Err(SofomoreError::KernelAlreadyInactive(id));
        }
        slot.inactive = true;
        slot.readmitted = false;
        self.deactivate(id);
        info!(kernel = %id, "kernel inactivated");
        Ok(())
    }

    /// Re-admit an inactivated kernel to scheduling regardless of its own
    /// stop status.
    pub fn activate(&mut self, id: KernelId) -> SofomoreResult<()> {
        let slot = self.slot_mut(id)?;
        if !slot.inactive {
            return Err(SofomoreError::KernelNotInactive(id));
        }
        slot.inactive = false;
        slot.readmitted = true;
        if let Err(pos) = self.active.binary_search(&id) {
            self.active.insert(pos, id);
        }
        info!(kernel = %id, "kernel activated");
        Ok(())
    }

    /// Active set = live kernels neither inactive nor stopped. Kernels
    /// re-admitted with [`activate`](Self::activate) stay scheduled until
    /// they are told again.
    pub fn recompute_active(&mut self) {
        self.active = self
            .iter()
            .filter(|(_, slot)| {
                !slot.inactive && (slot.readmitted || slot.kernel.stop().is_running())
            })
            .map(|(id, _)| id)
            .collect();
    }

    /// Objective vectors of every evaluated kernel, optionally skipping one.
    pub fn objective_values(&self, excluding: Option<KernelId>) -> Vec<ObjectiveVector> {
        self.iter()
            .filter(|(id, _)| Some(*id) != excluding)
            .filter_map(|(_, slot)| slot.objective_values.clone())
            .collect()
    }

    /// Renumber live kernels densely. Returns the old-to-new id mapping.
    pub fn compact(&mut self) -> BTreeMap<KernelId, KernelId> {
        let mut mapping = BTreeMap::new();
        let slots = std::mem::take(&mut self.slots);
        for (old, slot) in slots.into_iter().enumerate() {
            if let Some(slot) = slot {
                mapping.insert(KernelId(old), KernelId(self.slots.len()));
                self.slots.push(Some(slot));
            }
        }
        self.active = self
            .active
            .iter()
            .filter_map(|id| mapping.get(id).copied())
            .collect();
        mapping
    }
}
