use std::ops::{BitOr, BitOrAssign};

/// Bitset describing what kind of node a `ShadowNode` is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ShadowNodeTraits(u32);

impl ShadowNodeTraits {
    pub const NONE: Self = Self(0);
    pub const ROOT_NODE_KIND: Self = Self(1 << 0);
    /// Participates in layout as a leaf; children are not laid out.
    pub const LEAF_YOGA_NODE: Self = Self(1 << 1);
    pub const RAW_TEXT: Self = Self(1 << 2);
    /// Backed by a host view.
    pub const VIEW_KIND: Self = Self(1 << 3);
    pub const CLONED_BY_NATIVE_STATE_UPDATE: Self = Self(1 << 4);

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl BitOr for ShadowNodeTraits {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ShadowNodeTraits {
    fn bitor_assign(&mut self, rhs: Self) {
        self.insert(rhs);
    }
}
