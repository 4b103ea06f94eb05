//! Generic traversal over a network's cell/portal graph
//!
//! One engine serves every query: localization, containment and portal
//! visibility are just different `on_visit` / `enter` closures.
//!
//! - Visited cells are tracked in a bitset, so cycles terminate and each
//!   cell is visited at most once per pass
//! - Pending cells are dequeued from the front (breadth-first) or the
//!   back (depth-first)
//! - Scratch buffers are cleared and reused between passes; a visitor is
//!   not re-entrant

use std::collections::VecDeque;

use super::{Cell, Network, Portal};

/// Which pending cell is processed next
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchOrder {
    /// Oldest pending cell first
    #[default]
    BreadthFirst,
    /// Newest pending cell first
    DepthFirst,
}

/// What `on_visit` wants the traversal to do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// How a traversal ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// `on_visit` stopped at this cell
    Stopped(usize),
    /// Every reachable cell was visited
    Exhausted,
}

impl Outcome {
    pub fn stopped_at(self) -> Option<usize> {
        match self {
            Outcome::Stopped(cell) => Some(cell),
            Outcome::Exhausted => None,
        }
    }
}

/// Reusable traversal state
#[derive(Debug, Default)]
pub struct Visitor {
    order: SearchOrder,
    pending: VecDeque<usize>,
    visited: Vec<u64>,
}

impl Visitor {
    pub fn new(order: SearchOrder) -> Self {
        Self { order, pending: VecDeque::new(), visited: Vec::new() }
    }

    pub fn order(&self) -> SearchOrder {
        self.order
    }

    fn reset(&mut self, cells: usize) {
        self.pending.clear();
        self.visited.clear();
        self.visited.resize(cells.div_ceil(64), 0);
    }

    fn is_visited(&self, cell: usize) -> bool {
        self.visited[cell / 64] & (1 << (cell % 64)) != 0
    }

    fn mark(&mut self, cell: usize) {
        self.visited[cell / 64] |= 1 << (cell % 64);
    }

    fn next(&mut self) -> Option<usize> {
        match self.order {
            SearchOrder::BreadthFirst => self.pending.pop_front(),
            SearchOrder::DepthFirst => self.pending.pop_back(),
        }
    }

    /// Traverse `network` from `start`.
    ///
    /// `on_visit` runs once per reached cell and may stop the pass.
    /// `enter(from, portal, to)` is asked before a not-yet-visited neighbor
    /// is queued; a refused neighbor stays reachable through other portals.
    pub fn visit<V, E>(&mut self, network: &Network, start: usize, mut on_visit: V, mut enter: E) -> Outcome
    where
        V: FnMut(usize, &Cell) -> Flow,
        E: FnMut(usize, &Portal, usize) -> bool,
    {
        let cells = network.cells();
        self.reset(cells.len());
        if start >= cells.len() {
            return Outcome::Exhausted;
        }

        self.mark(start);
        self.pending.push_back(start);

        while let Some(current) = self.next() {
            let cell = &cells[current];
            if on_visit(current, cell) == Flow::Stop {
                return Outcome::Stopped(current);
            }

            for &index in cell.portals() {
                let Some(portal) = network.portal(index) else {
                    continue;
                };
                let Some(neighbor) = portal.other(current) else {
                    continue;
                };
                if neighbor >= cells.len() || self.is_visited(neighbor) {
                    continue;
                }
                if enter(current, portal, neighbor) {
                    self.mark(neighbor);
                    self.pending.push_back(neighbor);
                }
            }
        }

        Outcome::Exhausted
    }
}

/// Plain breadth-first pass with a fresh visitor
pub fn breadth_first_search<V>(network: &Network, start: usize, on_visit: V) -> Outcome
where
    V: FnMut(usize, &Cell) -> Flow,
{
    Visitor::new(SearchOrder::BreadthFirst).visit(network, start, on_visit, |_, _, _| true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_cycle_visits_each_cell_once() {
        let level = fixtures::cycle();
        let network = &level.networks()[0];
        let mut visits = 0;
        let outcome = breadth_first_search(network, 0, |_, _| {
            visits += 1;
            Flow::Continue
        });
        assert_eq!(outcome, Outcome::Exhausted);
        assert_eq!(visits, 4);
    }

    #[test]
    fn test_stop_reports_cell() {
        let level = fixtures::corridor(4);
        let network = &level.networks()[0];
        let outcome = breadth_first_search(network, 0, |i, _| if i == 2 { Flow::Stop } else { Flow::Continue });
        assert_eq!(outcome, Outcome::Stopped(2));
        assert_eq!(outcome.stopped_at(), Some(2));
    }

    #[test]
    fn test_breadth_and_depth_order() {
        // Star: cell 0 linked to 1, 2 and 3
        let level = fixtures::star(3);
        let network = &level.networks()[0];

        let mut order = Vec::new();
        Visitor::new(SearchOrder::BreadthFirst).visit(network, 1, |i, _| {
            order.push(i);
            Flow::Continue
        }, |_, _, _| true);
        assert_eq!(order, vec![1, 0, 2, 3]);

        let mut order = Vec::new();
        let mut visitor = Visitor::new(SearchOrder::DepthFirst);
        assert_eq!(visitor.order(), SearchOrder::DepthFirst);
        assert_eq!(Visitor::default().order(), SearchOrder::BreadthFirst);
        visitor.visit(network, 0, |i, _| {
            order.push(i);
            Flow::Continue
        }, |_, _, _| true);
        assert_eq!(order, vec![0, 3, 2, 1]);
    }

    #[test]
    fn test_refused_neighbors_are_not_visited() {
        let level = fixtures::corridor(3);
        let network = &level.networks()[0];
        let mut seen = Vec::new();
        let outcome = Visitor::default().visit(network, 0, |i, _| {
            seen.push(i);
            Flow::Continue
        }, |_, _, to| to != 2);
        assert_eq!(outcome, Outcome::Exhausted);
        assert_eq!(seen, vec![0, 1]);
    }

    #[test]
    fn test_visitor_is_reusable() {
        let level = fixtures::corridor(3);
        let network = &level.networks()[0];
        let mut visitor = Visitor::default();
        for start in 0..3 {
            let mut count = 0;
            visitor.visit(network, start, |_, _| {
                count += 1;
                Flow::Continue
            }, |_, _, _| true);
            assert_eq!(count, 3);
        }
        assert_eq!(visitor.visit(network, 99, |_, _| Flow::Stop, |_, _, _| true), Outcome::Exhausted);
    }
}
