//! Timing constraints registered against a platform during elaboration.

use serde::Serialize;

/// A clock period constraint on a pad or net.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodConstraint {
    /// Clock name in the constraint file.
    pub clock: String,
    /// Port or net carrying the clock.
    pub target: String,
    /// Whether `target` is a top-level port (otherwise a net).
    pub is_port: bool,
    /// Period in nanoseconds.
    pub period_ns: f64,
}

/// A false path between two unrelated clocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FalsePath {
    /// Net of the first clock (e.g., `sys_clk`).
    pub from: String,
    /// Net of the second clock (e.g., `clk25`).
    pub to: String,
}

/// All timing constraints of an elaborated design.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimingConstraints {
    pub periods: Vec<PeriodConstraint>,
    pub false_paths: Vec<FalsePath>,
}

impl TimingConstraints {
    /// Register a period constraint. A later constraint on the same target
    /// replaces the earlier one.
    pub fn add_period(&mut self, constraint: PeriodConstraint) {
        self.periods.retain(|p| p.target != constraint.target);
        self.periods.push(constraint);
    }

    /// Register a false path. Duplicate pairs, in either direction, are ignored.
    pub fn add_false_path(&mut self, from: impl Into<String>, to: impl Into<String>) {
        let (from, to) = (from.into(), to.into());
        if self.has_false_path(&from, &to) {
            return;
        }
        self.false_paths.push(FalsePath { from, to });
    }

    /// Whether a false path exists between two nets, in either direction.
    pub fn has_false_path(&self, a: &str, b: &str) -> bool {
        self.false_paths
            .iter()
            .any(|fp| (fp.from == a && fp.to == b) || (fp.from == b && fp.to == a))
    }

    pub fn period_of(&self, target: &str) -> Option<f64> {
        self.periods
            .iter()
            .find(|p| p.target == target)
            .map(|p| p.period_ns)
    }
}
