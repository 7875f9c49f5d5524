//! The dense state-vector engine
//!
//! A [`Simulator`] owns the wavefunction, the map from external qubit
//! ids to bit positions, the gate fusion buffer, two retained scratch
//! buffers, and a seeded RNG. The driver must serialise access; every
//! operation is synchronous and complete on return. Inside an
//! operation, passes over the amplitude space may fan out across the
//! rayon pool when the state is large enough to pay for it.

use crate::error::{Result, SimulatorError};
use dqsim_core::{GateMatrix, QubitId};
use dqsim_fusion::Fusion;
use dqsim_kernels::{select_kernel, Backend};
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Tolerance below which an amplitude counts as empty
pub const DEFAULT_TOLERANCE: f64 = 1e-12;

/// Composite sizes in `min..=max` trigger a flush as soon as they are
/// reached; the defaults match the kernel specialisation range.
const FUSION_QUBITS_MIN: usize = 4;
const FUSION_QUBITS_MAX: usize = 5;

/// Reductions over fewer amplitudes than this stay single-threaded
pub(crate) const PARALLEL_MIN_AMPLITUDES: usize = 1 << 14;

/// Dense state-vector simulator
///
/// # Example
/// ```
/// use dqsim_core::matrices::HADAMARD;
/// use dqsim_core::{GateMatrix, QubitId};
/// use dqsim_engine::Simulator;
///
/// let mut sim = Simulator::new(42);
/// let q = QubitId::new(0);
/// sim.allocate_qubit(q).unwrap();
/// sim.apply_controlled_gate(GateMatrix::from_2x2(&HADAMARD), &[q], &[]).unwrap();
/// let p = sim.get_probability(&[true], &[q]).unwrap();
/// assert!((p - 0.5).abs() < 1e-12);
/// ```
pub struct Simulator {
    num_qubits: usize,
    state: Vec<Complex64>,
    map: BTreeMap<QubitId, usize>,
    fused_gates: Fusion,
    fusion_min: usize,
    fusion_max: usize,
    backend: Backend,
    rng: StdRng,
    scratch_primary: Vec<Complex64>,
    scratch_secondary: Vec<Complex64>,
}

impl Simulator {
    /// Create an engine with no qubits and a seeded RNG
    pub fn new(seed: u64) -> Self {
        Self {
            num_qubits: 0,
            state: vec![Complex64::new(1.0, 0.0)],
            map: BTreeMap::new(),
            fused_gates: Fusion::new(),
            fusion_min: FUSION_QUBITS_MIN,
            fusion_max: FUSION_QUBITS_MAX,
            backend: Backend::Auto,
            rng: StdRng::seed_from_u64(seed),
            scratch_primary: Vec::new(),
            scratch_secondary: Vec::new(),
        }
    }

    /// Override the fusion flush bounds
    ///
    /// `max` may not exceed the kernel specialisation range; composites
    /// wider than that fail at flush time.
    pub fn with_fusion_bounds(mut self, min: usize, max: usize) -> Self {
        self.fusion_min = min;
        self.fusion_max = max;
        self
    }

    /// Number of currently allocated qubits
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// The backend pending flushes will dispatch through
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Switch the kernel family used by subsequent flushes
    ///
    /// Pending gates are flushed through the previous backend first so a
    /// flush never mixes families.
    ///
    /// # Errors
    /// [`SimulatorError::Backend`] if the backend has no kernels on this
    /// build (`Unknown` and the offload targets).
    pub fn select_backend(&mut self, backend: Backend) -> Result<()> {
        self.run()?;
        if !backend.is_available() {
            return Err(dqsim_kernels::KernelError::BackendUnavailable { backend }.into());
        }
        self.backend = backend;
        Ok(())
    }

    /// Allocate a new qubit in |0⟩
    ///
    /// The wavefunction doubles; old amplitudes become the low half and
    /// the new high half is zero-filled.
    ///
    /// # Errors
    /// [`SimulatorError::AllocationConflict`] if `id` is already mapped.
    pub fn allocate_qubit(&mut self, id: QubitId) -> Result<()> {
        if self.map.contains_key(&id) {
            return Err(SimulatorError::AllocationConflict(id));
        }
        self.map.insert(id, self.num_qubits);
        self.num_qubits += 1;

        let new_len = 1usize << self.num_qubits;
        let mut grown = self.take_primary(new_len);
        grown[..self.state.len()].copy_from_slice(&self.state);
        std::mem::swap(&mut self.state, &mut grown);
        self.release_primary(grown);
        Ok(())
    }

    /// Deallocate a classical qubit
    ///
    /// Flushes, checks the qubit has a determined value, then collapses
    /// and shrinks the wavefunction along that value.
    ///
    /// # Errors
    /// [`SimulatorError::UnknownQubit`] for unmapped ids;
    /// [`SimulatorError::NonClassicalDeallocation`] when the qubit still
    /// carries mass on both values — that is a client bug, caught here
    /// so it does not silently collapse entangled state.
    pub fn deallocate_qubit(&mut self, id: QubitId) -> Result<()> {
        self.run()?;
        if !self.map.contains_key(&id) {
            return Err(SimulatorError::UnknownQubit(id));
        }
        if !self.is_classical(id, DEFAULT_TOLERANCE)? {
            return Err(SimulatorError::NonClassicalDeallocation(id));
        }
        let value = self.get_classical_value(id, DEFAULT_TOLERANCE)?;
        self.collapse_vector(id, value, true)
    }

    /// Queue a controlled gate through the fusion buffer
    ///
    /// `matrix` is 2^k × 2^k for k target ids, little-endian over `ids`.
    /// The gate is deferred; it lands on the wavefunction at the next
    /// flush, which this call triggers itself once the pending composite
    /// reaches the configured size window.
    ///
    /// # Errors
    /// [`SimulatorError::UnknownQubit`] if any target or control id is
    /// unmapped (checked before anything is queued);
    /// [`SimulatorError::Backend`] if a flush is triggered and fails.
    pub fn apply_controlled_gate(
        &mut self,
        matrix: GateMatrix,
        ids: &[QubitId],
        ctrls: &[QubitId],
    ) -> Result<()> {
        self.check_ids(ids)?;
        self.check_ids(ctrls)?;
        debug_assert_eq!(matrix.dim(), 1 << ids.len());

        let mut tentative = self.fused_gates.clone();
        tentative.insert(matrix.clone(), ids, ctrls);
        let pending = tentative.num_qubits();

        if pending >= self.fusion_min && pending <= self.fusion_max {
            self.fused_gates = tentative;
            self.run()
        } else if pending > self.fusion_max
            || pending - ids.len() > self.fused_gates.num_qubits()
        {
            // the new gate alone outgrows what is queued: flush the old
            // composite and start a fresh one around this gate
            self.run()?;
            self.fused_gates.insert(matrix, ids, ctrls);
            Ok(())
        } else {
            self.fused_gates = tentative;
            Ok(())
        }
    }

    /// Flush the fusion buffer
    ///
    /// Flattens the queue to one dense composite, resolves the kernel
    /// for the selected backend, and applies it. Idempotent when the
    /// buffer is empty.
    ///
    /// # Errors
    /// [`SimulatorError::Backend`] when no kernel exists for the
    /// composite width or the backend is unavailable.
    pub fn run(&mut self) -> Result<()> {
        if self.fused_gates.is_empty() {
            return Ok(());
        }
        let kernel = select_kernel(self.backend, self.fused_gates.num_qubits())?;

        let fusion = std::mem::take(&mut self.fused_gates);
        let (matrix, target_ids, ctrl_ids) = fusion.flatten();
        let ctrlmask = self.control_mask(&ctrl_ids)?;

        // the composite is little-endian over ascending targets; the
        // kernel wants positions high-to-low
        let mut positions: SmallVec<[usize; 8]> = SmallVec::new();
        for id in target_ids.iter().rev() {
            positions.push(self.position(*id)?);
        }

        kernel(&mut self.state, &matrix, ctrlmask, &positions);
        Ok(())
    }

    /// True iff the qubit's value is determined (all mass on one side)
    ///
    /// # Errors
    /// [`SimulatorError::UnknownQubit`] for unmapped ids.
    pub fn is_classical(&mut self, id: QubitId, tolerance: f64) -> Result<bool> {
        self.run()?;
        let pos = self.position(id)?;
        let delta = 1usize << pos;
        let state = &self.state;
        let blocks = state.len() / (2 * delta);

        let scan_block = |b: usize| {
            let base = b * 2 * delta;
            let mut zero_mass = false;
            let mut one_mass = false;
            for j in 0..delta {
                zero_mass |= state[base + j].norm_sqr() > tolerance;
                one_mass |= state[base + j + delta].norm_sqr() > tolerance;
            }
            (zero_mass, one_mass)
        };

        let (zero_mass, one_mass) = if state.len() >= PARALLEL_MIN_AMPLITUDES {
            (0..blocks)
                .into_par_iter()
                .map(scan_block)
                .reduce(|| (false, false), |a, b| (a.0 | b.0, a.1 | b.1))
        } else {
            (0..blocks)
                .map(scan_block)
                .fold((false, false), |a, b| (a.0 | b.0, a.1 | b.1))
        };

        Ok(zero_mass != one_mass)
    }

    /// Read the determined value of a classical qubit
    ///
    /// # Errors
    /// [`SimulatorError::UnknownQubit`] for unmapped ids;
    /// [`SimulatorError::InternalInconsistency`] when no amplitude on
    /// either side clears the tolerance — the wavefunction is corrupt.
    pub fn get_classical_value(&mut self, id: QubitId, tolerance: f64) -> Result<bool> {
        self.run()?;
        let pos = self.position(id)?;
        let delta = 1usize << pos;

        let mut i = 0;
        while i < self.state.len() {
            for j in 0..delta {
                if self.state[i + j].norm_sqr() > tolerance {
                    return Ok(false);
                }
                if self.state[i + j + delta].norm_sqr() > tolerance {
                    return Ok(true);
                }
            }
            i += 2 * delta;
        }
        Err(SimulatorError::InternalInconsistency)
    }

    /// Project a qubit onto `value`
    ///
    /// Without `shrink`, amplitudes on the rejected half are zeroed and
    /// the vector is left unnormalised — renormalising is the caller's
    /// job. With `shrink`, the kept half is compacted into a vector of
    /// half the size, the id leaves the map, and every position above it
    /// shifts down by one.
    ///
    /// # Errors
    /// [`SimulatorError::UnknownQubit`] for unmapped ids.
    pub fn collapse_vector(&mut self, id: QubitId, value: bool, shrink: bool) -> Result<()> {
        self.run()?;
        let pos = self.position(id)?;
        let delta = 1usize << pos;

        if !shrink {
            let rejected = if value { 0 } else { delta };
            let zero = Complex64::new(0.0, 0.0);
            if self.state.len() >= PARALLEL_MIN_AMPLITUDES {
                self.state.par_chunks_mut(2 * delta).for_each(|chunk| {
                    chunk[rejected..rejected + delta].fill(zero);
                });
            } else {
                for chunk in self.state.chunks_mut(2 * delta) {
                    chunk[rejected..rejected + delta].fill(zero);
                }
            }
            return Ok(());
        }

        let kept = if value { delta } else { 0 };
        let mut compact = self.take_primary(self.state.len() / 2);
        for (block, chunk) in self.state.chunks(2 * delta).enumerate() {
            let dst = block * delta;
            compact[dst..dst + delta].copy_from_slice(&chunk[kept..kept + delta]);
        }
        std::mem::swap(&mut self.state, &mut compact);
        self.release_primary(compact);

        for position in self.map.values_mut() {
            if *position > pos {
                *position -= 1;
            }
        }
        self.map.remove(&id);
        self.num_qubits -= 1;
        Ok(())
    }

    /// Measure the given qubits projectively
    ///
    /// One basis state is sampled from the full cumulative distribution,
    /// so correlations between entangled qubits are preserved exactly.
    /// The wavefunction collapses onto the observed outcome and is
    /// renormalised.
    ///
    /// # Errors
    /// [`SimulatorError::UnknownQubit`] for unmapped ids.
    pub fn measure_qubits(&mut self, ids: &[QubitId]) -> Result<Vec<bool>> {
        self.run()?;
        let positions = self.positions_of(ids)?;

        let r: f64 = self.rng.gen();
        let mut cumulative = 0.0;
        let mut pick = 0usize;
        while cumulative < r && pick < self.state.len() {
            cumulative += self.state[pick].norm_sqr();
            pick += 1;
        }
        pick = pick.saturating_sub(1);

        let mut results = Vec::with_capacity(ids.len());
        let mut mask = 0usize;
        let mut val = 0usize;
        for &p in &positions {
            let bit = (pick >> p) & 1 == 1;
            results.push(bit);
            mask |= 1 << p;
            if bit {
                val |= 1 << p;
            }
        }

        let zero = Complex64::new(0.0, 0.0);
        let drop_and_sum = |(i, amp): (usize, &mut Complex64)| -> f64 {
            if i & mask != val {
                *amp = zero;
                0.0
            } else {
                amp.norm_sqr()
            }
        };
        let norm = if self.state.len() >= PARALLEL_MIN_AMPLITUDES {
            self.state
                .par_iter_mut()
                .enumerate()
                .map(drop_and_sum)
                .sum::<f64>()
        } else {
            self.state
                .iter_mut()
                .enumerate()
                .map(drop_and_sum)
                .sum::<f64>()
        };

        self.scale_state(1.0 / norm.sqrt());
        Ok(results)
    }

    /// Collapse onto a caller-chosen outcome instead of sampling one
    ///
    /// # Errors
    /// [`SimulatorError::ShapeMismatch`] on ids/values length mismatch;
    /// [`SimulatorError::UnknownQubit`] for unmapped ids;
    /// [`SimulatorError::DegenerateCollapse`] when the requested outcome
    /// carries probability below tolerance.
    pub fn collapse_wavefunction(&mut self, ids: &[QubitId], values: &[bool]) -> Result<()> {
        self.run()?;
        if ids.len() != values.len() {
            return Err(SimulatorError::ShapeMismatch {
                ids: ids.len(),
                values: values.len(),
            });
        }
        let positions = self.positions_of(ids)?;
        let mut mask = 0usize;
        let mut val = 0usize;
        for (&p, &bit) in positions.iter().zip(values) {
            mask |= 1 << p;
            if bit {
                val |= 1 << p;
            }
        }

        let probability = self.masked_probability(mask, val);
        if probability < DEFAULT_TOLERANCE {
            return Err(SimulatorError::DegenerateCollapse { probability });
        }

        let factor = 1.0 / probability.sqrt();
        let zero = Complex64::new(0.0, 0.0);
        let project = |(i, amp): (usize, &mut Complex64)| {
            if i & mask != val {
                *amp = zero;
            } else {
                *amp *= factor;
            }
        };
        if self.state.len() >= PARALLEL_MIN_AMPLITUDES {
            self.state.par_iter_mut().enumerate().for_each(project);
        } else {
            self.state.iter_mut().enumerate().for_each(project);
        }
        Ok(())
    }

    /// Probability of observing `bits` on `ids`
    ///
    /// # Errors
    /// [`SimulatorError::UnknownQubit`] for unmapped ids.
    pub fn get_probability(&mut self, bits: &[bool], ids: &[QubitId]) -> Result<f64> {
        self.run()?;
        debug_assert_eq!(bits.len(), ids.len());
        let positions = self.positions_of(ids)?;
        let mut mask = 0usize;
        let mut val = 0usize;
        for (&p, &bit) in positions.iter().zip(bits) {
            mask |= 1 << p;
            if bit {
                val |= 1 << p;
            }
        }
        Ok(self.masked_probability(mask, val))
    }

    /// Amplitude of the basis state selected by `bits` on `ids`
    ///
    /// `ids` must be a permutation of every allocated qubit. Pending
    /// gates are not flushed; the caller flushes first.
    ///
    /// # Errors
    /// [`SimulatorError::IncompleteAmplitudeQuery`] when `ids` does not
    /// cover the allocated set exactly.
    pub fn get_amplitude(&mut self, bits: &[bool], ids: &[QubitId]) -> Result<Complex64> {
        debug_assert_eq!(bits.len(), ids.len());
        let mut covered = 0usize;
        let mut index = 0usize;
        for (&bit, id) in bits.iter().zip(ids) {
            let pos = match self.map.get(id) {
                Some(&p) => p,
                None => break,
            };
            covered |= 1 << pos;
            if bit {
                index |= 1 << pos;
            }
        }
        if covered + 1 != self.state.len() {
            return Err(SimulatorError::IncompleteAmplitudeQuery);
        }
        Ok(self.state[index])
    }

    /// Replace the wavefunction and the id→position mapping
    ///
    /// `ordering[i]` becomes the qubit at bit position i.
    ///
    /// # Errors
    /// [`SimulatorError::InvalidOrdering`] if the amplitude count is not
    /// 2^|ordering| or `ordering` is not exactly the allocated id set.
    pub fn set_wavefunction(
        &mut self,
        wavefunction: &[Complex64],
        ordering: &[QubitId],
    ) -> Result<()> {
        self.run()?;
        if wavefunction.len() != 1usize << ordering.len() {
            return Err(SimulatorError::InvalidOrdering {
                reason: format!(
                    "{} amplitudes cannot describe {} qubit(s)",
                    wavefunction.len(),
                    ordering.len()
                ),
            });
        }
        let distinct: std::collections::BTreeSet<QubitId> = ordering.iter().copied().collect();
        if distinct.len() != ordering.len()
            || self.map.len() != ordering.len()
            || ordering.iter().any(|id| !self.map.contains_key(id))
        {
            return Err(SimulatorError::InvalidOrdering {
                reason: "ordering is not a permutation of the allocated qubits".to_string(),
            });
        }

        for (i, id) in ordering.iter().enumerate() {
            self.map.insert(*id, i);
        }
        self.state.copy_from_slice(wavefunction);
        Ok(())
    }

    /// Flush and expose the mapping and amplitudes for inspection
    pub fn cheat(&mut self) -> Result<(BTreeMap<QubitId, usize>, &[Complex64])> {
        self.run()?;
        Ok((self.map.clone(), &self.state))
    }

    // ---- internal helpers ----------------------------------------------

    pub(crate) fn position(&self, id: QubitId) -> Result<usize> {
        self.map
            .get(&id)
            .copied()
            .ok_or(SimulatorError::UnknownQubit(id))
    }

    pub(crate) fn positions_of(&self, ids: &[QubitId]) -> Result<SmallVec<[usize; 8]>> {
        ids.iter().map(|&id| self.position(id)).collect()
    }

    pub(crate) fn check_ids(&self, ids: &[QubitId]) -> Result<()> {
        match ids.iter().find(|id| !self.map.contains_key(id)) {
            Some(&missing) => Err(SimulatorError::UnknownQubit(missing)),
            None => Ok(()),
        }
    }

    pub(crate) fn control_mask(&self, ctrls: &[QubitId]) -> Result<usize> {
        let mut mask = 0usize;
        for &id in ctrls {
            mask |= 1 << self.position(id)?;
        }
        Ok(mask)
    }

    pub(crate) fn state(&self) -> &[Complex64] {
        &self.state
    }

    pub(crate) fn state_mut(&mut self) -> &mut Vec<Complex64> {
        &mut self.state
    }

    pub(crate) fn masked_probability(&self, mask: usize, val: usize) -> f64 {
        let state = &self.state;
        if state.len() >= PARALLEL_MIN_AMPLITUDES {
            state
                .par_iter()
                .enumerate()
                .filter(|(i, _)| i & mask == val)
                .map(|(_, amp)| amp.norm_sqr())
                .sum()
        } else {
            state
                .iter()
                .enumerate()
                .filter(|(i, _)| i & mask == val)
                .map(|(_, amp)| amp.norm_sqr())
                .sum()
        }
    }

    pub(crate) fn scale_state(&mut self, factor: f64) {
        if self.state.len() >= PARALLEL_MIN_AMPLITUDES {
            self.state.par_iter_mut().for_each(|amp| *amp *= factor);
        } else {
            for amp in &mut self.state {
                *amp *= factor;
            }
        }
    }

    /// Borrow a zeroed buffer of `len`, reusing retained capacity
    pub(crate) fn take_primary(&mut self, len: usize) -> Vec<Complex64> {
        let mut buffer = Vec::new();
        if self.scratch_primary.capacity() >= len {
            std::mem::swap(&mut buffer, &mut self.scratch_primary);
        }
        buffer.clear();
        buffer.resize(len, Complex64::new(0.0, 0.0));
        buffer
    }

    /// Hand a buffer back; the larger of the two scratches stays primary
    pub(crate) fn release_primary(&mut self, buffer: Vec<Complex64>) {
        self.scratch_primary = buffer;
        if self.scratch_primary.capacity() < self.scratch_secondary.capacity() {
            std::mem::swap(&mut self.scratch_primary, &mut self.scratch_secondary);
        }
    }

    pub(crate) fn take_secondary(&mut self, len: usize) -> Vec<Complex64> {
        let mut buffer = Vec::new();
        if self.scratch_secondary.capacity() >= len {
            std::mem::swap(&mut buffer, &mut self.scratch_secondary);
        }
        buffer.clear();
        buffer.resize(len, Complex64::new(0.0, 0.0));
        buffer
    }

    pub(crate) fn release_secondary(&mut self, buffer: Vec<Complex64>) {
        self.scratch_secondary = buffer;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dqsim_core::matrices::{HADAMARD, PAULI_X};

    fn h() -> GateMatrix {
        GateMatrix::from_2x2(&HADAMARD)
    }

    fn x() -> GateMatrix {
        GateMatrix::from_2x2(&PAULI_X)
    }

    #[test]
    fn test_allocation_grows_state() {
        let mut sim = Simulator::new(1);
        assert_eq!(sim.state().len(), 1);
        sim.allocate_qubit(QubitId::new(0)).unwrap();
        sim.allocate_qubit(QubitId::new(1)).unwrap();
        assert_eq!(sim.num_qubits(), 2);
        assert_eq!(sim.state().len(), 4);
        assert_eq!(sim.state()[0], Complex64::new(1.0, 0.0));
    }

    #[test]
    fn test_duplicate_allocation_rejected() {
        let mut sim = Simulator::new(1);
        sim.allocate_qubit(QubitId::new(3)).unwrap();
        assert!(matches!(
            sim.allocate_qubit(QubitId::new(3)),
            Err(SimulatorError::AllocationConflict(_))
        ));
    }

    #[test]
    fn test_classical_queries_on_flipped_qubit() {
        let mut sim = Simulator::new(1);
        let q = QubitId::new(0);
        sim.allocate_qubit(q).unwrap();
        assert!(sim.is_classical(q, DEFAULT_TOLERANCE).unwrap());
        assert!(!sim.get_classical_value(q, DEFAULT_TOLERANCE).unwrap());

        sim.apply_controlled_gate(x(), &[q], &[]).unwrap();
        sim.run().unwrap();
        assert!(sim.is_classical(q, DEFAULT_TOLERANCE).unwrap());
        assert!(sim.get_classical_value(q, DEFAULT_TOLERANCE).unwrap());
    }

    #[test]
    fn test_superposed_qubit_is_not_classical() {
        let mut sim = Simulator::new(1);
        let q = QubitId::new(0);
        sim.allocate_qubit(q).unwrap();
        sim.apply_controlled_gate(h(), &[q], &[]).unwrap();
        sim.run().unwrap();
        assert!(!sim.is_classical(q, DEFAULT_TOLERANCE).unwrap());
    }

    #[test]
    fn test_shrinking_collapse_remaps_positions() {
        let mut sim = Simulator::new(1);
        let (a, b, c) = (QubitId::new(10), QubitId::new(20), QubitId::new(30));
        sim.allocate_qubit(a).unwrap();
        sim.allocate_qubit(b).unwrap();
        sim.allocate_qubit(c).unwrap();

        sim.apply_controlled_gate(x(), &[b], &[]).unwrap();
        sim.deallocate_qubit(b).unwrap();

        assert_eq!(sim.num_qubits(), 2);
        let (map, state) = sim.cheat().unwrap();
        assert_eq!(map[&a], 0);
        assert_eq!(map[&c], 1);
        assert_eq!(state.len(), 4);
        assert!((state[0].re - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_run_is_idempotent_when_empty() {
        let mut sim = Simulator::new(1);
        sim.allocate_qubit(QubitId::new(0)).unwrap();
        sim.run().unwrap();
        let before = sim.state().to_vec();
        sim.run().unwrap();
        assert_eq!(before, sim.state());
    }

    #[test]
    fn test_unknown_ids_rejected_before_queueing() {
        let mut sim = Simulator::new(1);
        sim.allocate_qubit(QubitId::new(0)).unwrap();
        let err = sim.apply_controlled_gate(x(), &[QubitId::new(5)], &[]);
        assert!(matches!(err, Err(SimulatorError::UnknownQubit(_))));
        // nothing was queued; flushing is a no-op
        sim.run().unwrap();
        assert!((sim.state()[0].re - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_set_wavefunction_validates() {
        let mut sim = Simulator::new(1);
        let q = QubitId::new(0);
        sim.allocate_qubit(q).unwrap();

        let wrong_len = vec![Complex64::new(1.0, 0.0)];
        assert!(matches!(
            sim.set_wavefunction(&wrong_len, &[q]),
            Err(SimulatorError::InvalidOrdering { .. })
        ));

        let psi = vec![Complex64::new(0.0, 0.0), Complex64::new(1.0, 0.0)];
        assert!(matches!(
            sim.set_wavefunction(&psi, &[QubitId::new(9)]),
            Err(SimulatorError::InvalidOrdering { .. })
        ));

        sim.set_wavefunction(&psi, &[q]).unwrap();
        assert!(sim.get_classical_value(q, DEFAULT_TOLERANCE).unwrap());
    }

    #[test]
    fn test_scratch_capacity_is_retained() {
        let mut sim = Simulator::new(1);
        for i in 0..10 {
            sim.allocate_qubit(QubitId::new(i)).unwrap();
        }
        // growth went through the scratch; it now retains 2^9 capacity
        assert!(sim.scratch_primary.capacity() >= 1 << 9);
    }
}
