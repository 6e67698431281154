//! Typed SSA intermediate representation for a Maxwell shader recompiler.
//!
//! This crate defines the middle-end the instruction translators target:
//! - Types and tagged values (immediates, opaque names, instruction refs)
//! - An arena of instructions with use tracking and pseudo-operation links
//! - Basic blocks with predecessor records and an intrusive layout
//! - The `IREmitter` surface used by frontend translators
//! - The SSA construction pass and an IR verifier
//!
//! Translators emit reads and writes of virtual registers, predicates, and
//! flag bits; the SSA pass then rewrites those into SSA values and phi
//! nodes, leaving a program later passes and backends can consume.

#![no_std]

extern crate alloc;

mod attribute;
mod block;
mod condition;
mod dfg;
mod emitter;
mod entity;
mod entity_map;
mod error;
mod flags;
mod function;
mod inst;
mod layout;
mod opcode;
pub mod opt;
mod program;
mod reg;
mod types;
mod value;

pub use attribute::{Attribute, Component};
pub use block::{BlockBranch, BlockData};
pub use condition::{Condition, FlowTest};
pub use dfg::DataFlowGraph;
pub use emitter::IREmitter;
pub use entity::{Block, EntityRef, Inst};
pub use entity_map::PrimaryMap;
pub use error::{IrError, IrResult};
pub use flags::{FmzMode, FpControl, FpRounding, InstFlags, TextureInstInfo, TextureType};
pub use function::Function;
pub use inst::InstData;
pub use layout::{BlockInsts, Layout};
pub use opcode::Opcode;
pub use program::Program;
pub use reg::{Pred, Reg, NUM_PREDS, NUM_REGS, NUM_USER_PREDS, NUM_USER_REGS};
pub use types::Type;
pub use value::Value;
