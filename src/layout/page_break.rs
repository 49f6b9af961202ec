//! # Break Decisions
//!
//! Where a stack of indivisible units (paragraph lines) ends in an area.

use super::EPSILON;

/// What to do with a stack of units offered some remaining height.
#[derive(Debug, Clone, PartialEq)]
pub enum BreakDecision {
    /// Every unit fits.
    Place,
    /// Nothing goes here: the first unit does not fit, or the stack may not
    /// be split.
    Defer {
        /// Some units would have fit, but splitting is not allowed.
        would_split: bool,
    },
    /// Place the first `units_in_area` units, continue with the rest.
    Split { units_in_area: usize },
}

/// Decide how a stack of `unit_heights` goes into `remaining_height`.
pub fn decide_break(remaining_height: f64, unit_heights: &[f64], breakable: bool) -> BreakDecision {
    let total: f64 = unit_heights.iter().sum();
    if total <= remaining_height + EPSILON {
        return BreakDecision::Place;
    }

    let mut running = 0.0;
    let mut fit_count = 0;
    for &h in unit_heights {
        if running + h > remaining_height + EPSILON {
            break;
        }
        running += h;
        fit_count += 1;
    }

    if fit_count == 0 {
        return BreakDecision::Defer { would_split: false };
    }
    if !breakable {
        return BreakDecision::Defer { would_split: true };
    }
    BreakDecision::Split {
        units_in_area: fit_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn everything_fits() {
        assert_eq!(decide_break(100.0, &[20.0, 30.0, 40.0], true), BreakDecision::Place);
        // exact fit is a fit
        assert_eq!(decide_break(90.0, &[20.0, 30.0, 40.0], false), BreakDecision::Place);
    }

    #[test]
    fn unbreakable_defers() {
        assert_eq!(
            decide_break(50.0, &[20.0, 30.0, 40.0], false),
            BreakDecision::Defer { would_split: true }
        );
    }

    #[test]
    fn split_at_right_point() {
        assert_eq!(
            decide_break(55.0, &[20.0, 30.0, 40.0], true),
            BreakDecision::Split { units_in_area: 2 }
        );
    }

    #[test]
    fn first_unit_too_tall() {
        assert_eq!(
            decide_break(10.0, &[20.0, 30.0], true),
            BreakDecision::Defer { would_split: false }
        );
    }

    #[test]
    fn empty_stack_always_fits() {
        assert_eq!(decide_break(0.0, &[], true), BreakDecision::Place);
    }
}
