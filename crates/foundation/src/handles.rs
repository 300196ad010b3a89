/// Generational handle: `(index, generation)`.
///
/// A handle stays valid only while the slot it points at still holds the
/// generation it was issued with, so a handle to a destroyed marker can never
/// alias the marker that later reuses its slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(u32, u32);

impl Handle {
    pub fn new(index: u32, generation: u32) -> Self {
        Handle(index, generation)
    }

    pub fn index(&self) -> u32 {
        self.0
    }

    pub fn generation(&self) -> u32 {
        self.1
    }
}

/// Handle to a pin owned by the map surface.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkerHandle(pub Handle);

impl MarkerHandle {
    pub fn index(&self) -> u32 {
        self.0.index()
    }
}

impl std::fmt::Display for MarkerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "marker#{}v{}", self.0.index(), self.0.generation())
    }
}
