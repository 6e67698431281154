//! Program passes.
//!
//! Each pass takes the whole program and walks every function over its
//! cached post-order block list. New passes slot in here.

mod ssa_rewrite;
mod verify;

pub use ssa_rewrite::ssa_rewrite_pass;
pub use verify::{verification_pass, verify, VerifierError};
