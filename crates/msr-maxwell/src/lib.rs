//! Maxwell instruction translation surface.
//!
//! Hardware instruction handlers program against [`TranslatorVisitor`]: it
//! wraps the IR emitter with register accessors (`x`, `f`, the `set_`
//! variants) and operand decoders for the common instruction-word forms
//! (register fields, constant buffer slots, packed immediates). The
//! handlers in [`impl_`] translate one hardware opcode family each; opcode
//! dispatch from raw instruction words lives with the decoder, outside this
//! crate.

#![no_std]

extern crate alloc;

mod bitfield;
mod common;
pub mod impl_;
mod visitor;

pub use common::{
    floating_point_compare, integer_compare, predicate_combine, BooleanOp, ComparisonOp,
    FpCompareOp,
};
pub use visitor::TranslatorVisitor;
