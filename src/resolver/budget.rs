use log::warn;

use crate::model::Catalog;

const MIN_VISITS: usize = 4096;
const VISITS_PER_PAIR: usize = 16;

/// Bounds applied to every recursive walk over the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_depth: usize,
    pub max_visits: usize,
}

impl Limits {
    /// A simple path never has more nodes than the catalog has resources, so depth is
    /// bounded by the catalog size. Visits grow with the square of it.
    pub fn for_catalog(catalog: &Catalog) -> Self {
        let size = catalog.len() + 1;
        Limits {
            max_depth: size,
            max_visits: size
                .saturating_mul(size)
                .saturating_mul(VISITS_PER_PAIR)
                .max(MIN_VISITS),
        }
    }

    pub fn with_max_visits(self, max_visits: usize) -> Self {
        Limits { max_visits, ..self }
    }
}

/// Visit allowance consumed by one walk.
#[derive(Debug)]
pub struct Budget {
    walk: &'static str,
    limits: Limits,
    visits: usize,
    exhausted: bool,
}

impl Budget {
    pub fn new(walk: &'static str, limits: Limits) -> Self {
        Budget {
            walk,
            limits,
            visits: 0,
            exhausted: false,
        }
    }

    /// Accounts for one step at `depth`. Returns false when the walk must stop descending.
    pub fn enter(&mut self, depth: usize) -> bool {
        if depth > self.limits.max_depth {
            let limit = self.limits.max_depth;
            self.stop("depth limit", limit);
            return false;
        }
        if self.visits >= self.limits.max_visits {
            let limit = self.limits.max_visits;
            self.stop("visit budget", limit);
            return false;
        }
        self.visits += 1;
        true
    }

    fn stop(&mut self, what: &str, limit: usize) {
        if !self.exhausted {
            warn!(
                "{}: {what} of {limit} exhausted, result may be incomplete",
                self.walk
            );
            self.exhausted = true;
        }
    }

    pub fn visits(&self) -> usize {
        self.visits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn limits_scale_with_catalog() {
        let catalog = Catalog::default();
        assert_eq!(
            Limits::for_catalog(&catalog),
            Limits {
                max_depth: 1,
                max_visits: MIN_VISITS
            }
        );
    }

    #[test]
    fn budget_stops_after_allowance() {
        let mut budget = Budget::new(
            "test",
            Limits {
                max_depth: 10,
                max_visits: 2,
            },
        );
        assert!(budget.enter(0));
        assert!(budget.enter(1));
        assert!(!budget.enter(1));
        assert!(budget.exhausted);
        assert_eq!(budget.visits(), 2);
    }

    #[test]
    fn budget_refuses_deep_steps() {
        let mut budget = Budget::new(
            "test",
            Limits {
                max_depth: 1,
                max_visits: 100,
            },
        );
        assert!(budget.enter(1));
        assert!(!budget.enter(2));
        assert!(budget.exhausted);
        assert!(budget.enter(0));
    }
}
