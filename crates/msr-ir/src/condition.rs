//! Branch conditions and flow tests.

use core::fmt;

use crate::reg::Pred;

/// Condition-code test encoded in branch instructions.
///
/// A flow test reads the Z/S/C/O flag bits. Only the tests the translator
/// currently meets are materializable; the remaining encodings decode but
/// surface `NotImplemented` when a handler asks for their value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FlowTest {
    /// Always true.
    T,
    /// Always false.
    F,
    /// Z flag set.
    Eq,
    /// Z flag clear.
    Ne,
    /// Signed less-than flag combination.
    Lt,
    /// Signed greater-than flag combination.
    Gt,
    /// Carry set.
    Cs,
    /// Carry clear.
    Cc,
}

impl fmt::Display for FlowTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlowTest::T => "T",
            FlowTest::F => "F",
            FlowTest::Eq => "EQ",
            FlowTest::Ne => "NE",
            FlowTest::Lt => "LT",
            FlowTest::Gt => "GT",
            FlowTest::Cs => "CS",
            FlowTest::Cc => "CC",
        };
        f.write_str(name)
    }
}

/// A branch condition: a flow test combined with an optionally negated
/// predicate. The branch is taken when both hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Condition {
    flow_test: FlowTest,
    pred: Pred,
    pred_negated: bool,
}

impl Condition {
    /// Condition from all three fields.
    pub fn new(flow_test: FlowTest, pred: Pred, pred_negated: bool) -> Self {
        Self {
            flow_test,
            pred,
            pred_negated,
        }
    }

    /// Condition testing only a predicate.
    pub fn pred(pred: Pred, negated: bool) -> Self {
        Self::new(FlowTest::T, pred, negated)
    }

    /// The constant true or false condition.
    pub fn always(value: bool) -> Self {
        Self::new(
            if value { FlowTest::T } else { FlowTest::F },
            Pred::PT,
            false,
        )
    }

    pub fn flow_test(self) -> FlowTest {
        self.flow_test
    }

    /// The predicate and whether it is negated.
    pub fn predicate(self) -> (Pred, bool) {
        (self.pred, self.pred_negated)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.pred_negated {
            write!(f, "{}.!{}", self.flow_test, self.pred)
        } else {
            write!(f, "{}.{}", self.flow_test, self.pred)
        }
    }
}
