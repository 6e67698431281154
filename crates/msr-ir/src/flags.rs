//! Typed per-instruction flag payloads.

/// Rounding mode requested by a floating point instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FpRounding {
    /// The instruction does not care about rounding.
    #[default]
    DontCare,
    /// Round to nearest even.
    RoundEven,
    /// Round towards zero.
    Zero,
    /// Round towards positive infinity.
    Up,
    /// Round towards negative infinity.
    Down,
}

/// Denormal flush behavior requested by a floating point instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FmzMode {
    /// The instruction does not care about denormals.
    #[default]
    DontCare,
    /// Denormals pass through.
    None,
    /// Flush denormal inputs and outputs to zero.
    Ftz,
    /// Flush denormals and treat NaN inputs as zero in multiplications.
    Fmz,
}

/// Floating point control word threaded through FP emit calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FpControl {
    /// Forbid contracting a multiply-add pair into a fused operation.
    pub no_contraction: bool,
    pub rounding: FpRounding,
    pub fmz_mode: FmzMode,
}

/// Dimensionality of an image operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureType {
    Color1D,
    ColorArray1D,
    Color2D,
    ColorArray2D,
    Color3D,
    ColorCube,
    ColorArrayCube,
}

/// Static description of an image instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureInstInfo {
    pub texture_type: TextureType,
    /// Depth comparison sample.
    pub is_depth: bool,
    /// A level-of-detail bias operand is present.
    pub has_bias: bool,
    /// A level-of-detail clamp operand is present.
    pub has_lod_clamp: bool,
    /// Component selected by a gather operation.
    pub gather_component: u8,
    /// Which descriptor of the bound set the handle refers to.
    pub descriptor_index: u8,
}

impl TextureInstInfo {
    pub fn new(texture_type: TextureType) -> Self {
        Self {
            texture_type,
            is_depth: false,
            has_bias: false,
            has_lod_clamp: false,
            gather_component: 0,
            descriptor_index: 0,
        }
    }
}

/// Flags payload carried by an instruction.
///
/// Most instructions carry nothing; floating point instructions carry an
/// `FpControl` and image instructions a `TextureInstInfo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InstFlags {
    #[default]
    None,
    Fp(FpControl),
    Texture(TextureInstInfo),
}

impl InstFlags {
    /// The FP control word, if this instruction carries one.
    pub fn fp_control(self) -> Option<FpControl> {
        match self {
            InstFlags::Fp(control) => Some(control),
            _ => None,
        }
    }

    /// The texture description, if this instruction carries one.
    pub fn texture_info(self) -> Option<TextureInstInfo> {
        match self {
            InstFlags::Texture(info) => Some(info),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_dont_care() {
        let control = FpControl::default();
        assert_eq!(control.rounding, FpRounding::DontCare);
        assert_eq!(control.fmz_mode, FmzMode::DontCare);
        assert!(!control.no_contraction);
    }

    #[test]
    fn payload_accessors() {
        let flags = InstFlags::Fp(FpControl {
            no_contraction: true,
            ..FpControl::default()
        });
        assert!(flags.fp_control().unwrap().no_contraction);
        assert_eq!(flags.texture_info(), None);
        assert_eq!(InstFlags::None.fp_control(), None);
    }
}
