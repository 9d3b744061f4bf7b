use std::sync::atomic::{AtomicU64, Ordering};

/// `f64` accumulator stored as raw bits in an `AtomicU64`.
#[derive(Debug, Default)]
pub struct AtomicF64 {
    bits: AtomicU64,
}

impl AtomicF64 {
    pub fn new(value: f64) -> Self {
        Self {
            bits: AtomicU64::new(value.to_bits()),
        }
    }

    pub fn load(&self, ordering: Ordering) -> f64 {
        f64::from_bits(self.bits.load(ordering))
    }

    /// Adds `value` with a CAS loop and returns the previous total.
    pub fn fetch_add(&self, value: f64, ordering: Ordering) -> f64 {
        let previous = self
            .bits
            .fetch_update(ordering, Ordering::Relaxed, |bits| {
                Some((f64::from_bits(bits) + value).to_bits())
            })
            .unwrap_or_else(|bits| bits);
        f64::from_bits(previous)
    }

    pub fn into_inner(self) -> f64 {
        f64::from_bits(self.bits.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_default_is_zero() {
        assert_eq!(AtomicF64::default().load(Ordering::Relaxed), 0.0);
    }

    #[test]
    fn test_fetch_add_returns_previous() {
        let total = AtomicF64::new(0.5);
        assert_eq!(total.fetch_add(0.25, Ordering::AcqRel), 0.5);
        assert_eq!(total.into_inner(), 0.75);
    }

    #[test]
    fn test_concurrent_adds() {
        let total = Arc::new(AtomicF64::new(0.0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let total = total.clone();
                thread::spawn(move || {
                    for _ in 0..1000 {
                        total.fetch_add(1.0, Ordering::AcqRel);
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(total.load(Ordering::Acquire), 8000.0);
    }
}
