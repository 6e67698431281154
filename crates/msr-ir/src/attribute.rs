//! Shader input/output attribute names.

use core::fmt;

use crate::error::{IrError, IrResult};

/// One component of a four-wide attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Component {
    X,
    Y,
    Z,
    W,
}

impl Component {
    fn from_raw(raw: u64) -> Component {
        match raw & 3 {
            0 => Component::X,
            1 => Component::Y,
            2 => Component::Z,
            _ => Component::W,
        }
    }

    fn letter(self) -> char {
        match self {
            Component::X => 'x',
            Component::Y => 'y',
            Component::Z => 'z',
            Component::W => 'w',
        }
    }
}

/// An attribute name as addressed by attribute load/store instructions.
///
/// The raw encoding is the hardware attribute word divided by four: the
/// position vector starts at slot 28, generic attributes at slot 32 with four
/// components each, and the front-face bit sits past the generic range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Attribute {
    PrimitiveId,
    Position(Component),
    Generic { index: u32, component: Component },
    FrontFace,
}

const PRIMITIVE_ID_SLOT: u64 = 24;
const POSITION_BASE: u64 = 28;
const GENERIC_BASE: u64 = 32;
const NUM_GENERICS: u64 = 32;
const FRONT_FACE_SLOT: u64 = GENERIC_BASE + NUM_GENERICS * 4 + 3;

impl Attribute {
    /// Decode an attribute from the raw instruction field.
    pub fn from_raw(raw: u64) -> IrResult<Attribute> {
        match raw {
            PRIMITIVE_ID_SLOT => Ok(Attribute::PrimitiveId),
            POSITION_BASE..=31 => Ok(Attribute::Position(Component::from_raw(
                raw - POSITION_BASE,
            ))),
            GENERIC_BASE.. if raw < GENERIC_BASE + NUM_GENERICS * 4 => {
                let slot = raw - GENERIC_BASE;
                Ok(Attribute::Generic {
                    index: (slot / 4) as u32,
                    component: Component::from_raw(slot),
                })
            }
            FRONT_FACE_SLOT => Ok(Attribute::FrontFace),
            _ => Err(IrError::invalid_argument(format_args!(
                "attribute encoding {raw} out of range"
            ))),
        }
    }

    /// True for the generic (user varying) attribute range.
    pub fn is_generic(self) -> bool {
        matches!(self, Attribute::Generic { .. })
    }

    /// Index within the generic range, if this is a generic attribute.
    pub fn generic_index(self) -> Option<u32> {
        match self {
            Attribute::Generic { index, .. } => Some(index),
            _ => None,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::PrimitiveId => f.write_str("primitive_id"),
            Attribute::Position(c) => write!(f, "position.{}", c.letter()),
            Attribute::Generic { index, component } => {
                write!(f, "attr{}.{}", index, component.letter())
            }
            Attribute::FrontFace => f.write_str("front_face"),
        }
    }
}
