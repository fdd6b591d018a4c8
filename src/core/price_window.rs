// Fixed-capacity price window with a running moving average

use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WindowError {
    #[error("Window size must be greater than 0")]
    ZeroCapacity,

    #[error("Moving average not ready: {have}/{need} samples collected")]
    NotWarm { have: usize, need: usize },
}

/// Ring buffer of the most recent `capacity` prices.
///
/// Pushing is O(1): the oldest slot is overwritten in place and the running
/// sum is adjusted, so the average never rescans the buffer.
#[derive(Debug, Clone)]
pub struct PriceWindow {
    buffer: Vec<Decimal>,
    capacity: usize,
    head: usize,
    len: usize,
    sum: Decimal,
}

impl PriceWindow {
    pub fn new(capacity: usize) -> Result<Self, WindowError> {
        if capacity == 0 {
            return Err(WindowError::ZeroCapacity);
        }

        Ok(Self {
            buffer: vec![Decimal::ZERO; capacity],
            capacity,
            head: 0,
            len: 0,
            sum: Decimal::ZERO,
        })
    }

    pub fn push(&mut self, price: Decimal) {
        if self.len == self.capacity {
            self.sum -= self.buffer[self.head];
        } else {
            self.len += 1;
        }

        self.buffer[self.head] = price;
        self.sum += price;
        self.head = (self.head + 1) % self.capacity;
    }

    pub fn is_warm(&self) -> bool {
        self.len == self.capacity
    }

    pub fn average(&self) -> Result<Decimal, WindowError> {
        if !self.is_warm() {
            return Err(WindowError::NotWarm {
                have: self.len,
                need: self.capacity,
            });
        }

        Ok(self.sum / Decimal::from(self.capacity))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
