//! Packed render-state sort key.
//!
//! Draw calls are ordered by a single `u64` key so the sorter needs one
//! unsigned comparison instead of four field compares. The fields are
//! packed high-to-low by priority:
//!
//! ```text
//! bit 63                                                      bit 0
//! +------------+-------+---------------------+------------------+
//! | fullscreen |  hud  |        depth        |   translucency   |
//! |   2 bits   | 5 bits|       25 bits       |     32 bits      |
//! |  shift 62  |shift57|      shift 32       |     shift 0      |
//! +------------+-------+---------------------+------------------+
//! ```
//!
//! Fullscreen content sorts first (coarsest field), translucency breaks
//! ties last (finest field), so opaque/background/fullscreen draws land
//! before translucent overlays and blending composites correctly.

use static_assertions::const_assert_eq;

/// Bit width of the fullscreen field.
pub const FULLSCREEN_BITS: u32 = 2;
/// Bit width of the hud field.
pub const HUD_BITS: u32 = 5;
/// Bit width of the depth field.
pub const DEPTH_BITS: u32 = 25;
/// Bit width of the translucency field.
pub const TRANSLUCENCY_BITS: u32 = 32;

const FULLSCREEN_SHIFT: u32 = 62;
const HUD_SHIFT: u32 = 57;
const DEPTH_SHIFT: u32 = 32;
const TRANSLUCENCY_SHIFT: u32 = 0;

const FULLSCREEN_MASK: u64 = (1 << FULLSCREEN_BITS) - 1;
const HUD_MASK: u64 = (1 << HUD_BITS) - 1;
const DEPTH_MASK: u64 = (1 << DEPTH_BITS) - 1;
const TRANSLUCENCY_MASK: u64 = (1 << TRANSLUCENCY_BITS) - 1;

// The four fields fill the key exactly.
const_assert_eq!(
    FULLSCREEN_BITS + HUD_BITS + DEPTH_BITS + TRANSLUCENCY_BITS,
    u64::BITS
);

/// Packed draw-order priority key.
///
/// Comparing two keys as unsigned integers is equivalent to comparing the
/// tuples `(fullscreen, hud, depth, translucency)` lexicographically.
/// Field setters mask their input to the field width; passing an
/// out-of-range value is a caller bug caught by a debug assertion.
///
/// # Example
///
/// ```
/// use imdraw::RenderState;
///
/// let opaque = RenderState::new().with_depth(12);
/// let overlay = RenderState::new().with_hud(1);
/// assert!(opaque < overlay);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RenderState {
    key: u64,
}

impl RenderState {
    /// Create a key with all fields zero.
    pub fn new() -> Self {
        Self { key: 0 }
    }

    /// Pack the four priority fields into a key.
    pub fn pack(fullscreen: u32, hud: u32, depth: u32, translucency: u32) -> Self {
        Self::new()
            .with_fullscreen(fullscreen)
            .with_hud(hud)
            .with_depth(depth)
            .with_translucency(translucency)
    }

    /// The raw packed key.
    pub fn key(&self) -> u64 {
        self.key
    }

    /// Set the fullscreen field (2 bits, coarsest priority).
    pub fn with_fullscreen(mut self, fullscreen: u32) -> Self {
        debug_assert!(u64::from(fullscreen) <= FULLSCREEN_MASK, "fullscreen out of range");
        self.key = (self.key & !(FULLSCREEN_MASK << FULLSCREEN_SHIFT))
            | ((u64::from(fullscreen) & FULLSCREEN_MASK) << FULLSCREEN_SHIFT);
        self
    }

    /// Set the hud field (5 bits).
    pub fn with_hud(mut self, hud: u32) -> Self {
        debug_assert!(u64::from(hud) <= HUD_MASK, "hud out of range");
        self.key =
            (self.key & !(HUD_MASK << HUD_SHIFT)) | ((u64::from(hud) & HUD_MASK) << HUD_SHIFT);
        self
    }

    /// Set the depth field (25 bits).
    pub fn with_depth(mut self, depth: u32) -> Self {
        debug_assert!(u64::from(depth) <= DEPTH_MASK, "depth out of range");
        self.key = (self.key & !(DEPTH_MASK << DEPTH_SHIFT))
            | ((u64::from(depth) & DEPTH_MASK) << DEPTH_SHIFT);
        self
    }

    /// Set the translucency field (32 bits, finest priority).
    pub fn with_translucency(mut self, translucency: u32) -> Self {
        self.key = (self.key & !(TRANSLUCENCY_MASK << TRANSLUCENCY_SHIFT))
            | ((u64::from(translucency) & TRANSLUCENCY_MASK) << TRANSLUCENCY_SHIFT);
        self
    }

    /// The fullscreen field.
    pub fn fullscreen(&self) -> u32 {
        ((self.key >> FULLSCREEN_SHIFT) & FULLSCREEN_MASK) as u32
    }

    /// The hud field.
    pub fn hud(&self) -> u32 {
        ((self.key >> HUD_SHIFT) & HUD_MASK) as u32
    }

    /// The depth field.
    pub fn depth(&self) -> u32 {
        ((self.key >> DEPTH_SHIFT) & DEPTH_MASK) as u32
    }

    /// The translucency field.
    pub fn translucency(&self) -> u32 {
        ((self.key >> TRANSLUCENCY_SHIFT) & TRANSLUCENCY_MASK) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_unpack_roundtrip() {
        let cases = [
            (0, 0, 0, 0),
            (3, 31, (1 << 25) - 1, u32::MAX),
            (1, 0, 0, 0),
            (0, 1, 0, 0),
            (0, 0, 1, 0),
            (0, 0, 0, 1),
            (2, 17, 123_456, 987_654_321),
        ];
        for (fullscreen, hud, depth, translucency) in cases {
            let state = RenderState::pack(fullscreen, hud, depth, translucency);
            assert_eq!(state.fullscreen(), fullscreen);
            assert_eq!(state.hud(), hud);
            assert_eq!(state.depth(), depth);
            assert_eq!(state.translucency(), translucency);
        }
    }

    #[test]
    fn test_field_priority_ordering() {
        // fullscreen dominates everything below it.
        let a = RenderState::pack(0, 31, (1 << 25) - 1, u32::MAX);
        let b = RenderState::pack(1, 0, 0, 0);
        assert!(a < b);

        // hud dominates depth and translucency.
        let a = RenderState::pack(1, 2, (1 << 25) - 1, u32::MAX);
        let b = RenderState::pack(1, 3, 0, 0);
        assert!(a < b);

        // depth dominates translucency.
        let a = RenderState::pack(1, 3, 9, u32::MAX);
        let b = RenderState::pack(1, 3, 10, 0);
        assert!(a < b);

        // translucency breaks the final tie.
        let a = RenderState::pack(1, 3, 10, 4);
        let b = RenderState::pack(1, 3, 10, 5);
        assert!(a < b);
    }

    #[test]
    fn test_key_compare_matches_tuple_compare() {
        let tuples = [
            (0u32, 0u32, 0u32, 0u32),
            (0, 0, 0, 5),
            (0, 0, 7, 0),
            (0, 4, 0, 0),
            (2, 0, 0, 0),
            (2, 4, 7, 5),
            (3, 31, (1 << 25) - 1, u32::MAX),
        ];
        for &a in &tuples {
            for &b in &tuples {
                let ka = RenderState::pack(a.0, a.1, a.2, a.3);
                let kb = RenderState::pack(b.0, b.1, b.2, b.3);
                assert_eq!(ka.key().cmp(&kb.key()), a.cmp(&b), "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn test_setters_do_not_clobber_neighbors() {
        let state = RenderState::pack(3, 31, (1 << 25) - 1, u32::MAX).with_depth(0);
        assert_eq!(state.fullscreen(), 3);
        assert_eq!(state.hud(), 31);
        assert_eq!(state.depth(), 0);
        assert_eq!(state.translucency(), u32::MAX);
    }
}
