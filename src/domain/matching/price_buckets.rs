//! Stable counting sort over the fixed integer price range
//!
//! Prices live in `[MIN_PRICE, MAX_PRICE]`, so one pass to count, one pass
//! over the `PRICE_LEVELS` buckets to turn counts into offsets, and one pass
//! to scatter gives an O(n + PRICE_LEVELS) sort. Orders sharing a price keep
//! their input (dequeue) order.

use crate::shared::protocol::{Order, Side, MAX_PRICE, MIN_PRICE, PRICE_LEVELS};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceOrder {
    /// Lowest price first (sell side)
    Ascending,
    /// Highest price first (buy side)
    Descending,
}

impl PriceOrder {
    /// Best-first order for a side of the book
    pub fn best_first(side: Side) -> Self {
        match side {
            Side::Buy => PriceOrder::Descending,
            Side::Sell => PriceOrder::Ascending,
        }
    }

    #[inline]
    fn bucket(self, price: u32) -> Option<usize> {
        if !(MIN_PRICE..=MAX_PRICE).contains(&price) {
            return None;
        }
        Some(match self {
            PriceOrder::Ascending => (price - MIN_PRICE) as usize,
            PriceOrder::Descending => (MAX_PRICE - price) as usize,
        })
    }
}

/// Reusable bucket counters
pub struct PriceBuckets {
    // offsets[b] is the output index of the next order in bucket b;
    // one extra slot so the prefix sum can run in place
    offsets: Box<[usize]>,
}

impl PriceBuckets {
    pub fn new() -> Self {
        Self {
            offsets: vec![0; PRICE_LEVELS + 1].into_boxed_slice(),
        }
    }

    /// Sorts `input` into `output` by price.
    ///
    /// Orders with zero quantity or a price outside the bucket range are
    /// left out. `output` is cleared first; if it already has room for
    /// `input.len()` orders nothing is allocated.
    ///
    /// Returns the number of elementary steps taken, which is always
    /// `2 * input.len() + PRICE_LEVELS` plus the number of orders written.
    pub fn sort_into(&mut self, input: &[Order], output: &mut Vec<Order>, order: PriceOrder) -> usize {
        self.offsets.fill(0);

        for o in input {
            if o.quantity > 0 {
                if let Some(b) = order.bucket(o.price) {
                    self.offsets[b + 1] += 1;
                }
            }
        }

        for b in 0..PRICE_LEVELS {
            self.offsets[b + 1] += self.offsets[b];
        }

        let total = self.offsets[PRICE_LEVELS];
        output.clear();
        // 占位值，随后全部被覆盖
        output.resize(total, Order::new(Side::Buy, 0, 0, MIN_PRICE));

        for o in input {
            if o.quantity > 0 {
                if let Some(b) = order.bucket(o.price) {
                    output[self.offsets[b]] = *o;
                    self.offsets[b] += 1;
                }
            }
        }

        2 * input.len() + PRICE_LEVELS + total
    }
}

impl Default for PriceBuckets {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sell(quantity: u32, price: u32) -> Order {
        Order::new(Side::Sell, 0, quantity, price)
    }

    fn prices(orders: &[Order]) -> Vec<u32> {
        orders.iter().map(|o| o.price).collect()
    }

    #[test]
    fn test_ascending() {
        let mut buckets = PriceBuckets::new();
        let mut out = Vec::new();
        let input = [sell(1, 300), sell(1, 10), sell(1, 1000), sell(1, 55)];

        buckets.sort_into(&input, &mut out, PriceOrder::Ascending);
        assert_eq!(prices(&out), vec![10, 55, 300, 1000]);
    }

    #[test]
    fn test_descending() {
        let mut buckets = PriceBuckets::new();
        let mut out = Vec::new();
        let input = [sell(1, 300), sell(1, 10), sell(1, 1000), sell(1, 55)];

        buckets.sort_into(&input, &mut out, PriceOrder::Descending);
        assert_eq!(prices(&out), vec![1000, 300, 55, 10]);
    }

    #[test]
    fn test_stable_within_price() {
        let mut buckets = PriceBuckets::new();
        let mut out = Vec::new();
        // 数量用作到达顺序标记
        let input = [sell(1, 50), sell(2, 40), sell(3, 50), sell(4, 40), sell(5, 50)];

        buckets.sort_into(&input, &mut out, PriceOrder::Ascending);
        let seq: Vec<u32> = out.iter().map(|o| o.quantity).collect();
        assert_eq!(seq, vec![2, 4, 1, 3, 5]);

        buckets.sort_into(&input, &mut out, PriceOrder::Descending);
        let seq: Vec<u32> = out.iter().map(|o| o.quantity).collect();
        assert_eq!(seq, vec![1, 3, 5, 2, 4]);
    }

    #[test]
    fn test_excludes_filled_and_out_of_band() {
        let mut buckets = PriceBuckets::new();
        let mut out = Vec::new();
        let input = [sell(0, 50), sell(1, 9), sell(1, 1001), sell(7, 60)];

        buckets.sort_into(&input, &mut out, PriceOrder::Ascending);
        assert_eq!(out, vec![sell(7, 60)]);
    }

    #[test]
    fn test_reuse_clears_previous_output() {
        let mut buckets = PriceBuckets::new();
        let mut out = Vec::with_capacity(8);

        buckets.sort_into(&[sell(1, 20), sell(1, 30)], &mut out, PriceOrder::Ascending);
        buckets.sort_into(&[sell(1, 70)], &mut out, PriceOrder::Ascending);
        assert_eq!(prices(&out), vec![70]);
        assert!(out.capacity() >= 8);
    }

    #[test]
    fn test_step_count_is_linear() {
        let mut buckets = PriceBuckets::new();
        let mut out = Vec::new();
        let input: Vec<Order> = (0..100).map(|i| sell(1, 10 + i * 3)).collect();

        let steps = buckets.sort_into(&input, &mut out, PriceOrder::Ascending);
        assert_eq!(steps, 3 * 100 + PRICE_LEVELS);
    }

    #[test]
    fn test_best_first() {
        assert_eq!(PriceOrder::best_first(Side::Buy), PriceOrder::Descending);
        assert_eq!(PriceOrder::best_first(Side::Sell), PriceOrder::Ascending);
    }
}
