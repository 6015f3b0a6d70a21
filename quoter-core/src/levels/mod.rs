//! The quoting grid's own book: per-side, contiguous-in-ticks sequence of
//! [`Level`]s, each carrying the four volume counters `GridOrder` reconciles.

use std::collections::VecDeque;

use crate::core::price::approx_zero;
use crate::core::{Dir, PriceT, VolumeT};
use crate::error::FatalError;

/// One price rung of our quoting grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Level {
    pub price: PriceT,
    pub desired_volume: VolumeT,
    pub working_volume: VolumeT,
    pub pending_volume: VolumeT,
    pub canceling_volume: VolumeT,
}

impl Level {
    pub fn new(price: PriceT) -> Self {
        Self {
            price,
            desired_volume: 0.0,
            working_volume: 0.0,
            pending_volume: 0.0,
            canceling_volume: 0.0,
        }
    }

    /// `working + pending - canceling`: the quantity that will be live at
    /// quiescence if every in-flight transaction at this level succeeds.
    pub fn expected_volume(&self) -> VolumeT {
        self.working_volume + self.pending_volume - self.canceling_volume
    }

    pub fn free_volume(&self) -> VolumeT {
        self.desired_volume - self.expected_volume()
    }

    /// A level is empty iff all four counters are zero, within epsilon.
    pub fn is_empty(&self) -> bool {
        approx_zero(self.desired_volume)
            && approx_zero(self.working_volume)
            && approx_zero(self.pending_volume)
            && approx_zero(self.canceling_volume)
    }

    /// Zeroes all four counters, leaving `price` untouched.
    pub fn reset(&mut self) {
        self.desired_volume = 0.0;
        self.working_volume = 0.0;
        self.pending_volume = 0.0;
        self.canceling_volume = 0.0;
    }
}

/// A side-aware, auto-extending sequence of [`Level`]s, contiguous in units
/// of `tick_size`. Index 0 is always the current top (most competitive
/// price for this direction).
#[derive(Debug, Clone)]
pub struct Levels {
    dir: Dir,
    tick_size: Option<f64>,
    levels: VecDeque<Level>,
}

impl Levels {
    pub fn new(dir: Dir) -> Self {
        Self {
            dir,
            tick_size: None,
            levels: VecDeque::new(),
        }
    }

    pub fn dir(&self) -> Dir {
        self.dir
    }

    pub fn tick_size(&self) -> Option<f64> {
        self.tick_size
    }

    /// Sets the tick size. Only valid while the book is empty — the source
    /// asserts this precondition, since changing it mid-flight would break
    /// the contiguity invariant for already-materialized levels.
    pub fn set_tick_size(&mut self, tick_size: f64) {
        debug_assert!(
            self.levels.is_empty(),
            "set_tick_size called on a non-empty Levels book"
        );
        self.tick_size = Some(tick_size);
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn top_price(&self) -> Option<PriceT> {
        self.levels.front().map(|l| l.price)
    }

    pub fn top(&self) -> Option<&Level> {
        self.levels.front()
    }

    pub fn bottom(&self) -> Option<&Level> {
        self.levels.back()
    }

    pub fn price(&self, index: usize) -> Option<PriceT> {
        self.levels.get(index).map(|l| l.price)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Level> {
        self.levels.iter()
    }

    pub fn iter_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut Level> {
        self.levels.iter_mut()
    }

    fn index_of(&self, price: PriceT) -> Result<i64, FatalError> {
        let tick_size = self.tick_size.ok_or(FatalError::MissingTickSize)?;
        if !price.is_finite() {
            return Err(FatalError::NonFinitePrice { price });
        }
        let Some(top_price) = self.top_price() else {
            return Ok(0);
        };
        let sign = self.dir.sign();
        let raw_idx = (top_price - price) / (tick_size * sign);
        let idx = raw_idx.round();
        if (idx - raw_idx).abs() > 1e-6 {
            return Err(FatalError::PriceNotOnTick { price, tick_size });
        }
        Ok(idx as i64)
    }

    /// Returns the Level at `price`, extending the contiguous sequence
    /// (inserting empty intermediates) as needed.
    pub fn get_or_create(&mut self, price: PriceT) -> Result<&mut Level, FatalError> {
        let tick_size = self.tick_size.ok_or(FatalError::MissingTickSize)?;
        if !price.is_finite() {
            return Err(FatalError::NonFinitePrice { price });
        }

        if self.levels.is_empty() {
            self.levels.push_back(Level::new(price));
            return Ok(&mut self.levels[0]);
        }

        let sign = self.dir.sign();
        let mut idx = self.index_of(price)?;

        while idx < 0 {
            let new_top = self.levels.front().unwrap().price + tick_size * sign;
            self.levels.push_front(Level::new(new_top));
            idx += 1;
        }
        while idx as usize >= self.levels.len() {
            let next_price = self.levels.back().unwrap().price - tick_size * sign;
            self.levels.push_back(Level::new(next_price));
        }

        Ok(&mut self.levels[idx as usize])
    }

    /// Resets the Level at `price` to all-zero counters, then shrinks.
    /// A no-op if `price` has no corresponding level.
    pub fn erase(&mut self, price: PriceT) -> Result<(), FatalError> {
        let idx = self.index_of(price)?;
        if idx >= 0 && (idx as usize) < self.levels.len() {
            self.levels[idx as usize].reset();
            self.shrink();
        }
        Ok(())
    }

    /// Drops empty levels from both ends.
    pub fn shrink(&mut self) {
        while matches!(self.levels.front(), Some(l) if l.is_empty()) {
            self.levels.pop_front();
        }
        while matches!(self.levels.back(), Some(l) if l.is_empty()) {
            self.levels.pop_back();
        }
    }

    pub fn clear(&mut self) {
        self.levels.clear();
    }

    /// Forces every level's `desired_volume` to zero, leaving the other
    /// counters untouched (outstanding orders drain on the next `execute`).
    pub fn retract_all(&mut self) {
        for level in self.levels.iter_mut() {
            level.desired_volume = 0.0;
        }
    }

    /// First price (scanning top to bottom) whose level satisfies
    /// `predicate`.
    pub fn find_top<P>(&self, predicate: P) -> Option<PriceT>
    where
        P: Fn(&Level) -> bool,
    {
        self.levels.iter().find(|l| predicate(l)).map(|l| l.price)
    }

    /// Last price (scanning top to bottom) whose level satisfies
    /// `predicate` — equivalently, the first match scanning bottom to top.
    pub fn find_bottom<P>(&self, predicate: P) -> Option<PriceT>
    where
        P: Fn(&Level) -> bool,
    {
        self.levels.iter().rev().find(|l| predicate(l)).map(|l| l.price)
    }
}
