/// Addressing mode outside the [0, 1] UV range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapMode {
    Wrap,
    Clamp,
    Mirror,
}

impl WrapMode {
    pub const ALL: [WrapMode; 3] = [WrapMode::Wrap, WrapMode::Clamp, WrapMode::Mirror];

    pub fn label(self) -> &'static str {
        match self {
            WrapMode::Wrap => "Wrap",
            WrapMode::Clamp => "Clamp",
            WrapMode::Mirror => "Mirror",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingMode {
    Nearest,
    Bilinear,
    Trilinear,
}

impl SamplingMode {
    pub const ALL: [SamplingMode; 3] = [
        SamplingMode::Nearest,
        SamplingMode::Bilinear,
        SamplingMode::Trilinear,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SamplingMode::Nearest => "Nearest",
            SamplingMode::Bilinear => "Bilinear",
            SamplingMode::Trilinear => "Trilinear",
        }
    }
}

/// Runtime sampling and UV-placement state of a texture. The pixel data lives
/// with the renderer; this is the object the inspector panel edits.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub name: String,
    /// Output multiplier applied in the shader.
    pub level: f32,
    pub u_offset: f32,
    pub v_offset: f32,
    pub u_scale: f32,
    pub v_scale: f32,
    /// Rotation of the UV plane, in radians.
    pub w_rotation: f32,
    pub wrap_u: WrapMode,
    pub wrap_v: WrapMode,
    pub sampling_mode: SamplingMode,
    pub has_alpha: bool,
    pub invert_y: bool,
    pub gamma_space: bool,
}

impl Texture {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: 1.0,
            u_offset: 0.0,
            v_offset: 0.0,
            u_scale: 1.0,
            v_scale: 1.0,
            w_rotation: 0.0,
            wrap_u: WrapMode::Wrap,
            wrap_v: WrapMode::Wrap,
            sampling_mode: SamplingMode::Trilinear,
            has_alpha: false,
            invert_y: false,
            gamma_space: true,
        }
    }
}
