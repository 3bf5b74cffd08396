//! Best solution so far.

use std::time::Instant;

/// Best complete tour found so far.
///
/// Only ever replaced by a strictly cheaper tour, so the recorded history is
/// strictly decreasing.
#[derive(Debug, Clone)]
pub struct Incumbent {
    route: Vec<usize>,
    cost: f64,
    history: Vec<(f64, f64)>,
}

impl Incumbent {
    /// Seed the incumbent; an infinite `cost` means no tour is known yet.
    pub fn new(route: Vec<usize>, cost: f64, started: Instant) -> Self {
        let mut history = Vec::new();
        if cost.is_finite() {
            history.push((started.elapsed().as_secs_f64(), cost));
        }
        Incumbent {
            route: if cost.is_finite() { route } else { Vec::new() },
            cost,
            history,
        }
    }

    #[inline]
    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn route(&self) -> &[usize] {
        &self.route
    }

    /// `(elapsed seconds, cost)` of every accepted tour, seed included
    pub fn history(&self) -> &[(f64, f64)] {
        &self.history
    }

    /// Whether a bound still leaves room for a strictly better tour
    #[inline]
    pub fn admits(&self, bound: f64) -> bool {
        bound < self.cost
    }

    /// Replace the incumbent when `cost` is strictly lower. Returns whether it did.
    pub fn offer(&mut self, route: &[usize], cost: f64, started: Instant) -> bool {
        if cost.is_nan() || cost >= self.cost {
            return false;
        }
        self.route = route.to_vec();
        self.cost = cost;
        self.history.push((started.elapsed().as_secs_f64(), cost));
        true
    }

    pub fn into_parts(self) -> (Vec<usize>, f64) {
        (self.route, self.cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offer_only_accepts_strict_improvements() {
        let start = Instant::now();
        let mut inc = Incumbent::new(vec![0, 1, 2], 10.0, start);
        assert!(!inc.offer(&[0, 2, 1], 10.0, start));
        assert!(!inc.offer(&[0, 2, 1], 12.0, start));
        assert!(inc.offer(&[0, 2, 1], 8.0, start));
        assert_eq!(inc.route(), &[0, 2, 1]);
        assert_eq!(inc.cost(), 8.0);
        assert!(!inc.offer(&[0, 1, 2], f64::NAN, start));

        let costs: Vec<f64> = inc.history().iter().map(|&(_, c)| c).collect();
        assert_eq!(costs, vec![10.0, 8.0]);
    }

    #[test]
    fn test_unseeded_incumbent_admits_any_finite_bound() {
        let start = Instant::now();
        let mut inc = Incumbent::new(vec![0, 1], f64::INFINITY, start);
        assert!(inc.route().is_empty());
        assert!(inc.history().is_empty());
        assert!(inc.admits(1e12));
        assert!(!inc.admits(f64::INFINITY));
        assert!(!inc.offer(&[0, 1], f64::INFINITY, start));
        assert!(!inc.offer(&[0, 1], f64::NAN, start));
        assert!(inc.route().is_empty());
        assert!(inc.offer(&[0, 1], 5.0, start));
        assert_eq!(inc.into_parts(), (vec![0, 1], 5.0));
    }
}
