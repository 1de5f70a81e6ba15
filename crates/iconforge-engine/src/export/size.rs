use std::fmt;

/// Enumerated icon edge lengths supported by an export request.
///
/// Targets are square; the edge length fixes both dimensions for the whole
/// session.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExportSize {
    E16,
    E32,
    E64,
    E128,
    E256,
    E512,
    E1024,
}

impl ExportSize {
    pub const ALL: [ExportSize; 7] = [
        ExportSize::E16,
        ExportSize::E32,
        ExportSize::E64,
        ExportSize::E128,
        ExportSize::E256,
        ExportSize::E512,
        ExportSize::E1024,
    ];

    /// Edge length in pixels.
    pub fn edge(self) -> u32 {
        match self {
            ExportSize::E16 => 16,
            ExportSize::E32 => 32,
            ExportSize::E64 => 64,
            ExportSize::E128 => 128,
            ExportSize::E256 => 256,
            ExportSize::E512 => 512,
            ExportSize::E1024 => 1024,
        }
    }
}

impl Default for ExportSize {
    fn default() -> Self {
        ExportSize::E64
    }
}

impl fmt::Display for ExportSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let e = self.edge();
        write!(f, "{e}x{e}")
    }
}

/// Requested edge length is not one of the supported sizes.
#[derive(Debug, thiserror::Error)]
#[error("unsupported export size {0}; expected one of 16, 32, 64, 128, 256, 512, 1024")]
pub struct UnsupportedSize(pub u32);

impl TryFrom<u32> for ExportSize {
    type Error = UnsupportedSize;

    fn try_from(edge: u32) -> Result<Self, Self::Error> {
        ExportSize::ALL
            .into_iter()
            .find(|s| s.edge() == edge)
            .ok_or(UnsupportedSize(edge))
    }
}
