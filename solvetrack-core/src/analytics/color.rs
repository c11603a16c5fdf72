//! Deterministic per-user chart colors
//!
//! A username always maps to the same HSL color, within and across
//! sessions: no randomness, no runtime-seeded state. Hue, saturation, and
//! lightness come from three independently salted rolling hashes of the
//! username so that nearby names still spread across the color space.

/// An HSL color with integer components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HslColor {
    /// Hue in degrees, `0..360`
    pub hue: u32,
    /// Saturation percent, `40..99`
    pub saturation: u32,
    /// Lightness percent, `40..80`
    pub lightness: u32,
}

impl HslColor {
    /// CSS `hsl()` notation.
    pub fn css(&self) -> String {
        format!("hsl({}, {}%, {}%)", self.hue, self.saturation, self.lightness)
    }
}

const HASH_MULTIPLIER: u32 = 31;

/// Polynomial rolling hash over the string's character codes, folded into
/// the unsigned 32-bit range.
fn rolling_hash(input: &str) -> u32 {
    input.chars().fold(0u32, |acc, c| {
        acc.wrapping_mul(HASH_MULTIPLIER).wrapping_add(c as u32)
    })
}

/// Derive a stable chart color for a username.
///
/// Saturation and lightness are kept off the extremes so every line stays
/// legible on a white chart background.
pub fn hash_color(username: &str) -> HslColor {
    let hue = rolling_hash(&format!("hue:{username}")) % 360;
    let saturation = 40 + rolling_hash(&format!("saturation:{username}")) % 59;
    let lightness = 40 + rolling_hash(&format!("lightness:{username}")) % 40;
    HslColor {
        hue,
        saturation,
        lightness,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_hash_color_is_deterministic() {
        assert_eq!(hash_color("alice"), hash_color("alice"));
    }

    #[test]
    fn test_distinct_usernames_get_distinct_colors() {
        assert_ne!(hash_color("alice"), hash_color("bob"));
    }

    #[test]
    fn test_components_stay_in_range() {
        for name in ["", "a", "alice", "某用戶", "a-very-long-username-indeed"] {
            let color = hash_color(name);
            assert!(color.hue < 360);
            assert!((40..99).contains(&color.saturation));
            assert!((40..80).contains(&color.lightness));
        }
    }

    #[test]
    fn test_collisions_are_rare_over_a_corpus() {
        let corpus: Vec<String> = (0..200).map(|i| format!("user{i}")).collect();
        let distinct: HashSet<(u32, u32, u32)> = corpus
            .iter()
            .map(|name| {
                let c = hash_color(name);
                (c.hue, c.saturation, c.lightness)
            })
            .collect();
        // Full-tuple collisions should be a small fraction of the corpus.
        assert!(distinct.len() >= 195, "too many collisions: {}", distinct.len());
    }

    #[test]
    fn test_css_notation() {
        let color = HslColor {
            hue: 120,
            saturation: 50,
            lightness: 60,
        };
        assert_eq!(color.css(), "hsl(120, 50%, 60%)");
    }
}
