//! Name hashing for attribute and uniform lookup.
//!
//! Attributes and uniforms are matched between the caller's declarations
//! and the shader's introspected interface by a 32-bit multiplicative
//! string hash, so the per-draw hot path never compares strings.
//!
//! Collisions within one table are rejected at registration/link time
//! (see [`crate::types::VertexLayout::add_attribute`] and
//! [`crate::shader::Shader::load`]), never silently tolerated.

/// Hash a name to its 32-bit lookup identifier.
///
/// Multiplicative hash with seed 5381 and multiplier 33, computed with
/// wrapping arithmetic over the UTF-8 bytes of `name`.
pub fn name_hash(name: &str) -> u32 {
    let mut hash: u32 = 5381;
    for byte in name.bytes() {
        hash = hash.wrapping_mul(33).wrapping_add(u32::from(byte));
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_values() {
        // Empty input returns the seed; one byte is seed * 33 + byte.
        assert_eq!(name_hash(""), 5381);
        assert_eq!(name_hash("a"), 5381 * 33 + 97);
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(name_hash("u_mvp"), name_hash("u_mvp"));
        assert_eq!(name_hash("a_position"), name_hash("a_position"));
    }

    #[test]
    fn test_common_names_distinct() {
        let names = [
            "a_position",
            "a_normal",
            "a_texcoord",
            "a_color",
            "u_mvp",
            "u_model",
            "u_tint",
            "u_texture",
        ];
        for (i, a) in names.iter().enumerate() {
            for b in &names[i + 1..] {
                assert_ne!(name_hash(a), name_hash(b), "{a} vs {b}");
            }
        }
    }
}
