//! The coordinator: ask/tell rounds over a population of kernels.

use crate::convergence::ConvergenceTracker;
use crate::diagnostics::Diagnostic;
use crate::error::{RestartError, SofomoreError, SofomoreResult};
use crate::fitness::FitnessAssigner;
use crate::lifecycle::{
    aggregate_stop, restart_allowed, termination_status, RestartContext, RestartFactory,
};
use crate::options::SofomoreOptions;
use crate::pool::{KernelId, KernelPool};
use crate::scheduler::AskScheduler;
use rand::rngs::StdRng;
use rand::SeedableRng;
use sofomore_archive::{ArchiveError, NondominatedList, ObjectiveVector, ParetoArchive};
use sofomore_kernel::{Kernel, Point, StopStatus};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// How many kernels sample offspring in a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AskCount {
    Count(usize),
    /// Every active kernel.
    All,
}

impl From<usize> for AskCount {
    fn from(n: usize) -> Self {
        Self::Count(n)
    }
}

/// State of an ask waiting for its tell.
#[derive(Debug)]
struct PendingRound {
    told: Vec<KernelId>,
    offspring: Vec<(KernelId, Vec<Point>)>,
    size: usize,
}

/// Multiobjective optimizer built from single-objective kernels.
///
/// Every round is one [`ask`](Self::ask) followed by exactly one
/// [`tell`](Self::tell) with the evaluations of the returned points, in
/// order.
pub struct Sofomore<A: ParetoArchive = NondominatedList> {
    pool: KernelPool,
    options: SofomoreOptions,
    reference_point: Vec<f64>,
    dimension: usize,
    told: Vec<KernelId>,
    pending: Option<PendingRound>,
    scheduler: AskScheduler,
    fitness: FitnessAssigner,
    convergence: ConvergenceTracker,
    archive: Option<A>,
    restart: Option<Box<dyn RestartFactory>>,
    diagnostics: Vec<Diagnostic>,
    countiter: u64,
    countevals: u64,
}

impl Sofomore<NondominatedList> {
    /// Coordinator over `kernels`, whose incumbents all get evaluated in the
    /// first round.
    pub fn new(
        kernels: Vec<Box<dyn Kernel>>,
        options: SofomoreOptions,
        reference_point: Vec<f64>,
    ) -> SofomoreResult<Self> {
        Self::build(kernels, options, reference_point)
    }

    pub fn from_kernels<K: Kernel + 'static>(
        kernels: Vec<K>,
        options: SofomoreOptions,
        reference_point: Vec<f64>,
    ) -> SofomoreResult<Self> {
        let kernels = kernels
            .into_iter()
            .map(|k| Box::new(k) as Box<dyn Kernel>)
            .collect();
        Self::build(kernels, options, reference_point)
    }

    /// Like [`new`](Self::new) with options read by
    /// [`SofomoreOptions::from_json`]; its warnings become diagnostics.
    pub fn from_json_options(
        kernels: Vec<Box<dyn Kernel>>,
        options: &serde_json::Value,
        reference_point: Vec<f64>,
    ) -> SofomoreResult<Self> {
        let (options, diagnostics) = SofomoreOptions::from_json(options);
        let mut sofomore = Self::build(kernels, options, reference_point)?;
        sofomore.diagnostics.extend(diagnostics);
        Ok(sofomore)
    }
}

impl<A: ParetoArchive> Sofomore<A> {
    /// Coordinator using `A` for fronts and the archive.
    pub fn build(
        kernels: Vec<Box<dyn Kernel>>,
        options: SofomoreOptions,
        reference_point: Vec<f64>,
    ) -> SofomoreResult<Self> {
        let dimension = kernels
            .first()
            .map(|k| k.dimension())
            .ok_or(SofomoreError::EmptyKernelList)?;
        if let Some(k) = kernels.iter().find(|k| k.dimension() != dimension) {
            return Err(SofomoreError::KernelDimensionMismatch {
                expected: dimension,
                actual: k.dimension(),
            });
        }
        if reference_point.is_empty() {
            return Err(ArchiveError::EmptyReferencePoint.into());
        }

        let mut pool = KernelPool::new();
        let told = pool.add(kernels);
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let scheduler = AskScheduler::new(options.update_order.clone(), told.clone(), rng);
        info!(
            kernels = told.len(),
            dimension,
            objectives = reference_point.len(),
            "sofomore initialized"
        );

        Ok(Self {
            pool,
            options,
            reference_point,
            dimension,
            told,
            pending: None,
            scheduler,
            fitness: FitnessAssigner::new(),
            convergence: ConvergenceTracker::new(),
            archive: None,
            restart: None,
            diagnostics: Vec::new(),
            countiter: 0,
            countevals: 0,
        })
    }

    /// Replace terminated kernels with kernels from `factory`.
    pub fn with_restart(mut self, factory: impl RestartFactory + 'static) -> Self {
        self.restart = Some(Box::new(factory));
        self
    }

    pub fn set_restart(&mut self, factory: Option<Box<dyn RestartFactory>>) {
        self.restart = factory;
    }

    /// Incumbents pending evaluation followed by offspring of the kernels
    /// scheduled this round.
    ///
    /// A request above the number of active kernels is clipped with a
    /// [`Diagnostic::CapacityWarning`]. Asking again before telling discards
    /// the previous offspring.
    pub fn ask(&mut self, number_to_ask: usize) -> SofomoreResult<Vec<Point>> {
        self.ask_count(AskCount::Count(number_to_ask))
    }

    /// [`ask`](Self::ask) with every active kernel.
    pub fn ask_all(&mut self) -> SofomoreResult<Vec<Point>> {
        self.ask_count(AskCount::All)
    }

    pub fn ask_count(&mut self, count: AskCount) -> SofomoreResult<Vec<Point>> {
        let active = self.pool.active().len();
        let requested = match count {
            AskCount::Count(0) => return Err(SofomoreError::InvalidAskCount),
            AskCount::Count(n) => n,
            AskCount::All => active,
        };

        if let Some(pending) = self.pending.take() {
            warn!(
                offspring = pending.offspring.len(),
                "ask called again before tell, previous offspring discarded"
            );
            let added = std::mem::replace(&mut self.told, pending.told);
            self.extend_told(added);
        }
        if active == 0 && self.told.is_empty() {
            return Err(SofomoreError::NoActiveKernels);
        }

        let number_to_ask = if requested > active {
            self.diagnose(Diagnostic::CapacityWarning { requested, active });
            active
        } else {
            requested
        };

        let mut told = std::mem::take(&mut self.told);
        told.retain(|&id| self.pool.contains(id));
        let mut points = told
            .iter()
            .filter_map(|&id| self.pool.get(id).map(|slot| slot.kernel().incumbent()))
            .collect::<Vec<_>>();
        let chosen = if number_to_ask > 0 {
            self.scheduler.next(self.pool.active(), number_to_ask)
        } else {
            Vec::new()
        };
        let mut offspring = Vec::with_capacity(chosen.len());
        for id in chosen {
            let slot = self.pool.slot_mut(id)?;
            let batch = slot.kernel_mut().ask();
            points.extend(batch.iter().cloned());
            offspring.push((id, batch));
        }
        debug!(
            round = self.countiter,
            told = told.len(),
            asked = offspring.len(),
            points = points.len(),
            "ask"
        );

        self.pending = Some(PendingRound {
            told,
            offspring,
            size: points.len(),
        });
        Ok(points)
    }

    /// Feed back the evaluations of the points returned by the last
    /// [`ask`](Self::ask).
    ///
    /// `constraints[c][i]` is the value of constraint `c` at `solutions[i]`,
    /// satisfied when `<= 0`. An empty batch is a no-op.
    pub fn tell(
        &mut self,
        solutions: &[Point],
        objective_values: &[ObjectiveVector],
        constraints: &[Vec<f64>],
    ) -> SofomoreResult<()> {
        if solutions.len() != objective_values.len() {
            return Err(SofomoreError::SolutionCountMismatch {
                solutions: solutions.len(),
                objective_values: objective_values.len(),
            });
        }
        if objective_values.is_empty() {
            if self.pending.as_ref().is_some_and(|p| p.size == 0) {
                self.pending = None;
            }
            return Ok(());
        }
        self.validate_batch(objective_values, constraints)?;
        let Some(pending) = self.pending.take() else {
            return Err(SofomoreError::NoPendingAsk);
        };

        for (id, values) in pending.told.iter().zip(objective_values) {
            if let Some(slot) = self.pool.get_mut(*id) {
                slot.set_objective_values(values.clone());
            }
        }

        let mut start = pending.told.len();
        let mut restarted = Vec::new();
        for (id, offspring) in &pending.offspring {
            let end = start + offspring.len();
            let values = &objective_values[start..end];
            let g_values: Vec<Vec<f64>> =
                constraints.iter().map(|g| g[start..end].to_vec()).collect();
            start = end;
            if !self.pool.contains(*id) {
                debug!(kernel = %id, "kernel removed during the round, offspring dropped");
                continue;
            }

            let assignment = match self.fitness.assign::<A>(
                &self.pool,
                *id,
                values,
                &g_values,
                &self.reference_point,
            ) {
                Ok(assignment) => assignment,
                Err(e) => {
                    self.diagnose(Diagnostic::UpdateFailure {
                        kernel: *id,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            let slot = self.pool.slot_mut(*id)?;
            if let Err(e) = slot.kernel_mut().tell(offspring, &assignment.fitness) {
                self.diagnose(Diagnostic::UpdateFailure {
                    kernel: *id,
                    reason: e.to_string(),
                });
                continue;
            }
            slot.clear_readmission();
            slot.set_last_offspring_values(values.to_vec());
            slot.set_nondominated_ratio(assignment.nondominated_ratio);
            let logged = slot.kernel_mut().log_state();
            let status = slot.kernel().stop();

            if let Err(e) = logged {
                self.diagnose(Diagnostic::LoggingFailure {
                    kernel: *id,
                    reason: e.to_string(),
                });
            }
            if status.is_stopped() {
                self.pool.deactivate(*id);
                info!(kernel = %id, %status, "kernel stopped");
                if self.restart.is_some()
                    && restart_allowed(&status, &self.options.restart_skip_reasons)
                {
                    restarted.extend(self.restart_kernel(*id));
                }
            }
        }

        let added = std::mem::take(&mut self.told);
        self.told = restarted;
        let asked = pending
            .offspring
            .iter()
            .map(|(id, _)| *id)
            .filter(|id| self.pool.contains(*id))
            .collect::<Vec<_>>();
        self.extend_told(asked);
        self.extend_told(added);

        let hypervolume = self.pareto_front()?.hypervolume();
        self.convergence.update(hypervolume);
        if self.options.archive {
            match self.archive.as_mut() {
                Some(archive) => {
                    archive.add_list(objective_values.to_vec())?;
                }
                None => {
                    self.archive = Some(A::from_points(
                        objective_values.to_vec(),
                        &self.reference_point,
                    )?);
                }
            }
        }
        self.countiter += 1;
        self.countevals += objective_values.len() as u64;
        debug!(
            round = self.countiter,
            evaluations = self.countevals,
            hypervolume,
            "tell"
        );
        Ok(())
    }

    fn validate_batch(
        &self,
        objective_values: &[ObjectiveVector],
        constraints: &[Vec<f64>],
    ) -> SofomoreResult<()> {
        let n = objective_values.len();
        let pending = self.pending.as_ref().ok_or(SofomoreError::NoPendingAsk)?;
        if pending.size != n {
            return Err(SofomoreError::BatchSizeMismatch {
                expected: pending.size,
                actual: n,
            });
        }
        if let Some(g) = constraints.iter().find(|g| g.len() != n) {
            return Err(SofomoreError::ConstraintLengthMismatch {
                expected: n,
                actual: g.len(),
            });
        }
        let m = self.reference_point.len();
        if let Some(v) = objective_values.iter().find(|v| v.len() != m) {
            return Err(SofomoreError::ObjectiveDimensionMismatch {
                expected: m,
                actual: v.len(),
            });
        }
        Ok(())
    }

    fn extend_told(&mut self, ids: Vec<KernelId>) {
        for id in ids {
            if !self.told.contains(&id) {
                self.told.push(id);
            }
        }
    }

    /// Ask the restart factory for a replacement of `stopped`.
    fn restart_kernel(&mut self, stopped: KernelId) -> Option<KernelId> {
        let mut factory = self.restart.take()?;
        let contributions = self.hypervolume_contributions().unwrap_or_default();
        let front = self
            .pareto_front()
            .map(|f| f.points().to_vec())
            .unwrap_or_default();
        let ctx = RestartContext {
            stopped,
            pool: &self.pool,
            reference_point: &self.reference_point,
            dimension: self.dimension,
            contributions,
            front,
        };
        let result = factory.restart(&ctx).and_then(|kernel| {
            if kernel.dimension() == self.dimension {
                Ok(kernel)
            } else {
                Err(RestartError::NonConforming {
                    expected: self.dimension,
                    actual: kernel.dimension(),
                })
            }
        });
        self.restart = Some(factory);

        match result {
            Ok(kernel) => {
                let id = self.pool.add(vec![kernel]).first().copied();
                if let Some(id) = id {
                    info!(stopped = %stopped, kernel = %id, "kernel restarted");
                }
                id
            }
            Err(e) => {
                self.diagnose(Diagnostic::RestartFailure {
                    kernel: stopped,
                    reason: e.to_string(),
                });
                None
            }
        }
    }

    fn diagnose(&mut self, diagnostic: Diagnostic) {
        match &diagnostic {
            Diagnostic::LoggingFailure { .. } => debug!(%diagnostic, "diagnostic"),
            _ => warn!(%diagnostic, "diagnostic"),
        }
        self.diagnostics.push(diagnostic);
    }

    /// Append kernels; they are scheduled if running and their incumbents
    /// are evaluated in the next round.
    pub fn add(&mut self, kernels: Vec<Box<dyn Kernel>>) -> SofomoreResult<Vec<KernelId>> {
        if let Some(k) = kernels.iter().find(|k| k.dimension() != self.dimension) {
            return Err(SofomoreError::KernelDimensionMismatch {
                expected: self.dimension,
                actual: k.dimension(),
            });
        }
        let ids = self.pool.add(kernels);
        self.extend_told(ids.clone());
        Ok(ids)
    }

    /// Delete kernels. Their objective vectors leave the front; their ids
    /// are not reused until [`compact`](Self::compact).
    pub fn remove(&mut self, ids: &[KernelId]) -> SofomoreResult<Vec<Box<dyn Kernel>>> {
        let mut ids = ids.to_vec();
        ids.sort();
        ids.dedup();
        if let Some(&id) = ids.iter().find(|&&id| !self.pool.contains(id)) {
            return Err(SofomoreError::InvalidKernelIndex(id));
        }
        let mut removed = Vec::with_capacity(ids.len());
        for id in ids {
            let slot = self.pool.remove(id)?;
            self.told.retain(|&t| t != id);
            self.fitness.forget(id);
            removed.push(slot);
        }
        Ok(removed.into_iter().map(|slot| slot.into_kernel()).collect())
    }

    /// Stop scheduling a kernel; its last objective vector stays on the
    /// front.
    pub fn inactivate(&mut self, id: KernelId) -> SofomoreResult<()> {
        self.pool.inactivate(id)
    }

    /// Re-admit an inactivated kernel to scheduling.
    pub fn activate(&mut self, id: KernelId) -> SofomoreResult<()> {
        self.pool.activate(id)
    }

    /// Renumber kernels densely after removals. Returns the old-to-new
    /// mapping. Not allowed between ask and tell.
    pub fn compact(&mut self) -> SofomoreResult<BTreeMap<KernelId, KernelId>> {
        if self.pending.is_some() {
            return Err(SofomoreError::RoundInProgress);
        }
        let mapping = self.pool.compact();
        self.told = self
            .told
            .iter()
            .filter_map(|id| mapping.get(id).copied())
            .collect();
        self.scheduler.remap(&mapping);
        self.fitness.remap(&mapping);
        info!(kernels = mapping.len(), "kernel pool compacted");
        Ok(mapping)
    }

    /// Move the reference point; the archive is rebuilt relative to it.
    pub fn set_reference_point(&mut self, reference_point: Vec<f64>) -> SofomoreResult<()> {
        if reference_point.len() != self.reference_point.len() {
            return Err(ArchiveError::DimensionMismatch {
                expected: self.reference_point.len(),
                actual: reference_point.len(),
            }
            .into());
        }
        if let Some(archive) = &self.archive {
            self.archive = Some(A::from_points(archive.points().to_vec(), &reference_point)?);
        }
        self.reference_point = reference_point;
        Ok(())
    }

    /// `Some` status of every kernel once all have stopped.
    pub fn stop(&self) -> Option<BTreeMap<KernelId, StopStatus>> {
        aggregate_stop(&self.pool)
    }

    pub fn termination_status(&self) -> BTreeMap<KernelId, StopStatus> {
        termination_status(&self.pool)
    }

    /// Non-dominated subset of the evaluated incumbents.
    pub fn pareto_front(&self) -> SofomoreResult<A> {
        Ok(A::from_points(
            self.pool.objective_values(None),
            &self.reference_point,
        )?)
    }

    /// Incumbents whose objective vector is on the front.
    pub fn pareto_set(&self) -> SofomoreResult<Vec<Point>> {
        let front = self.pareto_front()?;
        Ok(self
            .pool
            .iter()
            .filter(|(_, slot)| slot.objective_values().is_some_and(|v| front.contains(v)))
            .map(|(_, slot)| slot.kernel().incumbent())
            .collect())
    }

    /// Hypervolume improvement of each evaluated incumbent against the
    /// front of the other kernels.
    pub fn hypervolume_contributions(&self) -> SofomoreResult<Vec<(KernelId, f64)>> {
        self.pool
            .iter()
            .filter_map(|(id, slot)| slot.objective_values().map(|v| (id, v)))
            .map(|(id, v)| -> SofomoreResult<(KernelId, f64)> {
                let front: A =
                    FitnessAssigner::front_excluding(&self.pool, id, &self.reference_point)?;
                Ok((id, front.hypervolume_improvement(v)?))
            })
            .collect()
    }

    /// Non-dominated archive of every evaluation, once a round was told with
    /// archiving enabled.
    pub fn archive(&self) -> Option<&A> {
        self.archive.as_ref()
    }

    pub fn archive_hypervolume(&self) -> Option<f64> {
        self.archive.as_ref().map(|a| a.hypervolume())
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Column titles matching [`display_line`](Self::display_line).
    pub fn display_header() -> &'static str {
        "Iterat #Fevals   Hypervolume           Front Active"
    }

    pub fn display_line(&self) -> String {
        let hypervolume = self.pareto_front().map(|f| f.hypervolume()).unwrap_or(0.0);
        let front = self.pareto_front().map(|f| f.len()).unwrap_or(0);
        format!(
            "{:>6} {:>7} {:.15e} {:>5} {:>6}",
            self.countiter,
            self.countevals,
            hypervolume,
            front,
            self.pool.active().len()
        )
    }

    /// Log the status line on the first three rounds, every `modulo` rounds
    /// and once stopped. `None` uses the configured modulo, 0 disables.
    /// Returns the line when it was logged.
    pub fn disp(&self, modulo: Option<u64>) -> Option<String> {
        let modulo = modulo.unwrap_or(self.options.display_modulo);
        if modulo == 0 || self.countiter == 0 {
            return None;
        }
        if self.countiter < 4 || self.countiter % modulo == 0 || self.stop().is_some() {
            let line = self.display_line();
            info!("{}", line);
            Some(line)
        } else {
            None
        }
    }

    /// Run ask/evaluate/tell rounds until every kernel stopped, no kernel is
    /// left to ask, or `max_rounds` is reached. Returns the rounds run.
    pub fn optimize<F>(
        &mut self,
        objective: F,
        number_to_ask: AskCount,
        max_rounds: Option<u64>,
    ) -> SofomoreResult<u64>
    where
        F: Fn(&[f64]) -> ObjectiveVector,
    {
        let mut rounds = 0;
        while self.stop().is_none() && max_rounds.map_or(true, |max| rounds < max) {
            if self.pool.active().is_empty() && self.told.is_empty() {
                break;
            }
            let solutions = self.ask_count(number_to_ask)?;
            let values: Vec<ObjectiveVector> = solutions.iter().map(|x| objective(x)).collect();
            self.tell(&solutions, &values, &[])?;
            self.disp(None);
            rounds += 1;
        }
        Ok(rounds)
    }

    pub fn pool(&self) -> &KernelPool {
        &self.pool
    }

    pub fn kernel(&self, id: KernelId) -> Option<&dyn Kernel> {
        self.pool.get(id).map(|slot| slot.kernel())
    }

    /// Number of live kernels.
    pub fn num_kernels(&self) -> usize {
        self.pool.len()
    }

    pub fn active_kernels(&self) -> &[KernelId] {
        self.pool.active()
    }

    /// Kernels whose incumbents the next ask returns for evaluation.
    pub fn told(&self) -> &[KernelId] {
        &self.told
    }

    pub fn reference_point(&self) -> &[f64] {
        &self.reference_point
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn options(&self) -> &SofomoreOptions {
        &self.options
    }

    pub fn scheduler(&self) -> &AskScheduler {
        &self.scheduler
    }

    pub fn convergence(&self) -> &ConvergenceTracker {
        &self.convergence
    }

    pub fn countiter(&self) -> u64 {
        self.countiter
    }

    pub fn countevals(&self) -> u64 {
        self.countevals
    }
}

impl<A: ParetoArchive> std::fmt::Debug for Sofomore<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sofomore")
            .field("kernels", &self.pool.len())
            .field("active", &self.pool.active())
            .field("told", &self.told)
            .field("reference_point", &self.reference_point)
            .field("countiter", &self.countiter)
            .field("countevals", &self.countevals)
            .finish()
    }
}
