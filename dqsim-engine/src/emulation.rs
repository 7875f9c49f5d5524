//! Arithmetic emulation over qubit registers
//!
//! A register is an ordered list of qubit ids, little-endian: bit 0 of
//! the register value lives on the first id. `emulate_math` permutes
//! basis states so the register bits encode f(x) wherever they encoded
//! x, touching only indices selected by the control mask.
//!
//! The mapping must be a bijection over the register values that carry
//! amplitude; a colliding f silently aliases amplitudes and corrupts
//! the state. This is not checked.

use crate::error::Result;
use crate::simulator::Simulator;
use dqsim_core::QubitId;
use smallvec::SmallVec;

impl Simulator {
    /// Permute basis states by an arbitrary register function
    ///
    /// `f` receives the decoded value of every register and rewrites
    /// them in place; it runs once per basis index matching the control
    /// mask. The add/add-mod/mul-mod variants below cover the common
    /// cases without a callout per index.
    ///
    /// # Errors
    /// [`crate::SimulatorError::UnknownQubit`] if any register or
    /// control id is unmapped.
    pub fn emulate_math<F>(
        &mut self,
        f: F,
        quregs: &[Vec<QubitId>],
        ctrls: &[QubitId],
    ) -> Result<()>
    where
        F: Fn(&mut [i64]),
    {
        self.run()?;
        let ctrlmask = self.control_mask(ctrls)?;
        let registers: Vec<SmallVec<[usize; 8]>> = quregs
            .iter()
            .map(|reg| self.positions_of(reg))
            .collect::<Result<_>>()?;

        let len = self.state().len();
        let mut output = self.take_primary(len);
        let mut values = vec![0i64; registers.len()];

        for i in 0..len {
            if i & ctrlmask == ctrlmask {
                for (value, register) in values.iter_mut().zip(&registers) {
                    let mut v = 0i64;
                    for (bit, &p) in register.iter().enumerate() {
                        v |= (((i >> p) & 1) as i64) << bit;
                    }
                    *value = v;
                }
                f(&mut values);
                let mut new_index = i;
                for (value, register) in values.iter().zip(&registers) {
                    for (bit, &p) in register.iter().enumerate() {
                        if ((new_index >> p) & 1) as i64 != (value >> bit) & 1 {
                            new_index ^= 1 << p;
                        }
                    }
                }
                output[new_index] += self.state()[i];
            } else {
                output[i] += self.state()[i];
            }
        }

        std::mem::swap(self.state_mut(), &mut output);
        self.release_primary(output);
        Ok(())
    }

    /// x ← x + a on every register
    pub fn emulate_math_add_constant(
        &mut self,
        a: i64,
        quregs: &[Vec<QubitId>],
        ctrls: &[QubitId],
    ) -> Result<()> {
        self.emulate_math(
            |values| {
                for x in values {
                    *x = x.wrapping_add(a);
                }
            },
            quregs,
            ctrls,
        )
    }

    /// x ← (x + a) mod n on every register
    pub fn emulate_math_add_constant_mod_n(
        &mut self,
        a: i64,
        n: i64,
        quregs: &[Vec<QubitId>],
        ctrls: &[QubitId],
    ) -> Result<()> {
        self.emulate_math(
            |values| {
                for x in values {
                    *x = x.wrapping_add(a).rem_euclid(n);
                }
            },
            quregs,
            ctrls,
        )
    }

    /// x ← (x · a) mod n on every register
    pub fn emulate_math_multiply_constant_mod_n(
        &mut self,
        a: i64,
        n: i64,
        quregs: &[Vec<QubitId>],
        ctrls: &[QubitId],
    ) -> Result<()> {
        self.emulate_math(
            |values| {
                for x in values {
                    *x = x.wrapping_mul(a).rem_euclid(n);
                }
            },
            quregs,
            ctrls,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    fn engine_with_register(width: usize) -> (Simulator, Vec<QubitId>) {
        let mut sim = Simulator::new(5);
        let register: Vec<QubitId> = (0..width as u64).map(QubitId::new).collect();
        for &q in &register {
            sim.allocate_qubit(q).unwrap();
        }
        (sim, register)
    }

    fn basis_state(sim: &mut Simulator, register: &[QubitId], value: usize) {
        let dim = 1usize << register.len();
        let mut psi = vec![Complex64::new(0.0, 0.0); dim];
        psi[value] = Complex64::new(1.0, 0.0);
        sim.set_wavefunction(&psi, register).unwrap();
    }

    #[test]
    fn test_add_constant_wraps_register_width() {
        let (mut sim, register) = engine_with_register(3);
        basis_state(&mut sim, &register, 6);
        sim.emulate_math_add_constant(3, &[register.clone()], &[])
            .unwrap();
        // 6 + 3 = 9; only the low 3 bits land back in the register
        let (_, state) = sim.cheat().unwrap();
        assert!((state[9 & 0b111].re - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_add_constant_mod_n() {
        let (mut sim, register) = engine_with_register(3);
        basis_state(&mut sim, &register, 2);
        sim.emulate_math_add_constant_mod_n(3, 8, &[register.clone()], &[])
            .unwrap();
        let (_, state) = sim.cheat().unwrap();
        assert!((state[5].re - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_multiply_mod_n() {
        let (mut sim, register) = engine_with_register(3);
        basis_state(&mut sim, &register, 3);
        sim.emulate_math_multiply_constant_mod_n(5, 7, &[register.clone()], &[])
            .unwrap();
        // 3·5 mod 7 = 1
        let (_, state) = sim.cheat().unwrap();
        assert!((state[1].re - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_control_gates_the_permutation() {
        let mut sim = Simulator::new(5);
        let ctrl = QubitId::new(99);
        let register: Vec<QubitId> = (0..2).map(QubitId::new).collect();
        sim.allocate_qubit(ctrl).unwrap();
        for &q in &register {
            sim.allocate_qubit(q).unwrap();
        }

        // control stays |0⟩: the register must not move
        sim.emulate_math_add_constant(1, &[register.clone()], &[ctrl])
            .unwrap();
        let (map, state) = sim.cheat().unwrap();
        assert_eq!(map[&ctrl], 0);
        assert!((state[0].re - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_two_registers_permute_independently() {
        let (mut sim, qubits) = engine_with_register(4);
        let reg_a = qubits[..2].to_vec();
        let reg_b = qubits[2..].to_vec();
        // |a=1, b=2⟩ = index 1 + 4·2
        basis_state(&mut sim, &qubits, 0b1001);
        sim.emulate_math_add_constant(1, &[reg_a, reg_b], &[])
            .unwrap();
        // both registers increment: a=2, b=3 → index 2 + 4·3
        let (_, state) = sim.cheat().unwrap();
        assert!((state[0b1110].re - 1.0).abs() < 1e-12);
    }
}
