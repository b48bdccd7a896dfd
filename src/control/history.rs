use std::collections::VecDeque;

/// Fixed-length history of block-averaged magnetization, newest first
///
/// Every `block` recorded values are averaged into one point; the oldest point
/// falls off the back once `capacity` points are held.
#[derive(Debug, Clone, PartialEq)]
pub struct MagnetizationHistory {
    points: VecDeque<f64>,
    capacity: usize,
    block: usize,
    block_sum: f64,
    block_count: usize,
}

impl MagnetizationHistory {
    pub fn new(capacity: usize, block: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
            block: block.max(1),
            block_sum: 0.0,
            block_count: 0,
        }
    }

    pub fn record(&mut self, magnetization: f64) {
        if self.capacity == 0 {
            return;
        }
        self.block_sum += magnetization;
        self.block_count += 1;
        if self.block_count == self.block {
            if self.points.len() == self.capacity {
                self.points.pop_back();
            }
            self.points.push_front(self.block_sum / self.block as f64);
            self.block_sum = 0.0;
            self.block_count = 0;
        }
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.block_sum = 0.0;
        self.block_count = 0;
    }

    pub fn points(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn latest(&self) -> Option<f64> {
        self.points.front().copied()
    }
}

impl Default for MagnetizationHistory {
    fn default() -> Self {
        Self::new(40, 25)
    }
}
