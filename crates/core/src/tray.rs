//! The three-slot tray of pieces waiting to be placed

use crate::types::{ColorId, ShapeId, TRAY_SIZE};

/// A dealt piece: a catalog shape and its color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrayPiece {
    pub shape: ShapeId,
    pub color: ColorId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tray {
    slots: [Option<TrayPiece>; TRAY_SIZE],
}

impl Tray {
    pub fn new() -> Self {
        Self::default()
    }

    /// Piece in `slot`; `None` if the slot is empty or out of range
    pub fn get(&self, slot: usize) -> Option<TrayPiece> {
        self.slots.get(slot).copied().flatten()
    }

    /// Remove and return the piece in `slot`
    pub fn take(&mut self, slot: usize) -> Option<TrayPiece> {
        self.slots.get_mut(slot).and_then(Option::take)
    }

    /// Put `piece` in `slot`. Returns false if the slot is out of range.
    pub fn set(&mut self, slot: usize, piece: TrayPiece) -> bool {
        match self.slots.get_mut(slot) {
            Some(s) => {
                *s = Some(piece);
                true
            }
            None => false,
        }
    }

    pub fn slots(&self) -> &[Option<TrayPiece>; TRAY_SIZE] {
        &self.slots
    }

    /// Remaining pieces with their slot index
    pub fn pieces(&self) -> impl Iterator<Item = (usize, TrayPiece)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|p| (i, p)))
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Indices of empty slots, in order
    pub fn empty_slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_none())
            .map(|(i, _)| i)
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn clear(&mut self) {
        self.slots = [None; TRAY_SIZE];
    }
}
