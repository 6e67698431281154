//! Per-opcode-family instruction handlers.
//!
//! Each module adds handler methods to [`TranslatorVisitor`] for one
//! hardware opcode family. Handlers decode their operand fields, emit IR,
//! and surface unsupported encodings as `NotImplemented`.
//!
//! [`TranslatorVisitor`]: crate::TranslatorVisitor

mod floating_point_compare;
mod floating_point_conversion_integer;
mod load_store_attribute;
