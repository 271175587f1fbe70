//! Spawn-slot occupancy for sphere targets.
//!
//! Targets spawn on a 5×5 grid of fixed positions on a plane in front of the back
//! wall. [`SlotGrid`] tracks which slots are held so that no two targets ever
//! overlap.

use glam::Vec3;
use rand::Rng;
use rand::seq::IteratorRandom;

use crate::error::{Error, Result};

pub const GRID_COLUMNS: usize = 5;
pub const GRID_ROWS: usize = 5;
pub const SLOT_COUNT: usize = GRID_COLUMNS * GRID_ROWS;

/// Distance between neighbouring slot centres.
pub const SLOT_SPACING: f32 = 3.0;

/// World position of the lower-left slot.
const FIRST_SLOT: Vec3 = Vec3::new(10.0 + 1.5, 1.5, 1.0);

/// Occupancy flags for the spawn grid, one per slot.
#[derive(Clone, Debug, Default)]
pub struct SlotGrid {
    occupied: [bool; SLOT_COUNT],
}

impl SlotGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// World-space centre of slot `index`. Slots are numbered row by row from the
    /// bottom-left; column is `index % 5` and row is `index / 5`.
    pub fn slot_position(index: usize) -> Vec3 {
        let column = (index % GRID_COLUMNS) as f32;
        let row = (index / GRID_COLUMNS) as f32;
        FIRST_SLOT + Vec3::new(column * SLOT_SPACING, row * SLOT_SPACING, 0.0)
    }

    pub fn is_occupied(&self, index: usize) -> bool {
        self.occupied.get(index).copied().unwrap_or(false)
    }

    pub fn occupied_count(&self) -> usize {
        self.occupied.iter().filter(|&&taken| taken).count()
    }

    pub fn is_full(&self) -> bool {
        self.occupied.iter().all(|&taken| taken)
    }

    /// Move a holder from `previous` (if any) to a uniformly random free slot.
    ///
    /// `previous` is still occupied while the new slot is drawn, so a target never
    /// lands back where it was. Nothing is mutated on failure.
    ///
    /// # Errors
    ///
    /// [`Error::SlotPoolExhausted`] when no slot is free.
    pub fn reassign(&mut self, previous: Option<usize>, rng: &mut impl Rng) -> Result<usize> {
        if self.is_full() {
            return Err(Error::SlotPoolExhausted(SLOT_COUNT));
        }

        let chosen = self
            .occupied
            .iter()
            .enumerate()
            .filter(|(_, taken)| !**taken)
            .map(|(index, _)| index)
            .choose(rng)
            .ok_or(Error::SlotPoolExhausted(SLOT_COUNT))?;

        if let Some(slot) = previous.and_then(|index| self.occupied.get_mut(index)) {
            *slot = false;
        }
        self.occupied[chosen] = true;
        Ok(chosen)
    }

    /// Move a holder from `previous` (if any) to the specific slot `index`.
    ///
    /// # Errors
    ///
    /// [`Error::SlotOccupied`] when `index` is out of range or already taken.
    pub fn claim(&mut self, previous: Option<usize>, index: usize) -> Result<()> {
        if index >= SLOT_COUNT || self.occupied[index] {
            return Err(Error::SlotOccupied(index));
        }
        if let Some(slot) = previous.and_then(|index| self.occupied.get_mut(index)) {
            *slot = false;
        }
        self.occupied[index] = true;
        Ok(())
    }

    /// Free `index` without claiming anything else.
    pub fn release(&mut self, index: usize) {
        if let Some(slot) = self.occupied.get_mut(index) {
            *slot = false;
        }
    }
}
