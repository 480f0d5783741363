// Color defaults and deterministic series colors

/// Color used for a graph's primary trace until the user picks one
pub const DEFAULT_COLOR: &str = "blue";

/// Slice colors for pie charts, in slice order
pub const PIE_COLORS: [&str; 5] = ["#FF7F0E", "#1F77B4", "#2CA02C", "#D62728", "#9467BD"];

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Color for an additional series, derived from the feature name.
///
/// The same name always maps to the same hue, so repeated compiles of an
/// unchanged graph produce identical output.
pub fn series_color(feature: &str) -> String {
    let hue = fnv1a(feature.as_bytes()) % 360;
    format!("hsl({}, 70%, 50%)", hue)
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, &b| {
        (hash ^ b as u64).wrapping_mul(FNV_PRIME)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color;

    #[test]
    fn test_series_color_deterministic() {
        assert_eq!(series_color("revenue"), series_color("revenue"));
    }

    #[test]
    fn test_series_color_varies_by_name() {
        let colors: Vec<String> = ["a", "b", "c", "d"].iter().map(|f| series_color(f)).collect();
        let mut unique = colors.clone();
        unique.sort();
        unique.dedup();
        assert!(unique.len() > 1);
    }

    #[test]
    fn test_series_color_is_parseable() {
        for name in ["x", "temperature", "Umsatz €", ""] {
            assert!(color::recognize(&series_color(name)).is_ok());
        }
    }

    #[test]
    fn test_palette_colors_parse() {
        assert!(color::recognize(DEFAULT_COLOR).is_ok());
        for c in PIE_COLORS {
            assert!(color::recognize(c).is_ok());
        }
    }

    #[test]
    fn test_fnv1a_known_value() {
        // Reference value for the empty input is the offset basis
        assert_eq!(fnv1a(b""), FNV_OFFSET);
        assert_eq!(fnv1a(b"a"), 0xaf63_dc4c_8601_ec8c);
    }
}
