//! Color string recognition
//!
//! Recognizes the CSS color notations a plot renderer understands:
//! `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`, `rgb()`/`rgba()` with numeric or
//! percentage channels, `hsl()`/`hsla()`, and the CSS named colors.

use nom::{
    branch::alt,
    bytes::complete::{tag_no_case, take_while1},
    character::complete::{char, hex_digit1, multispace0},
    combinator::{all_consuming, map, opt, value, verify},
    number::complete::double,
    sequence::{delimited, preceded, terminated},
    IResult,
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("Unrecognized color '{0}'")]
    Unrecognized(String),
}

/// Which notation a color string is written in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorNotation {
    Hex,
    Rgb,
    Hsl,
    Named,
}

/// Identify the notation of `input`, or fail if it is not a color
pub fn recognize(input: &str) -> Result<ColorNotation, ColorError> {
    all_consuming(ws(alt((hex_color, rgb_color, hsl_color, named_color))))(input)
        .map(|(_, notation)| notation)
        .map_err(|_| ColorError::Unrecognized(input.to_string()))
}

/// Wrap a parser so it tolerates surrounding whitespace
fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

// === Hex ===

fn hex_color(input: &str) -> IResult<&str, ColorNotation> {
    value(
        ColorNotation::Hex,
        preceded(
            char('#'),
            verify(hex_digit1, |digits: &str| matches!(digits.len(), 3 | 4 | 6 | 8)),
        ),
    )(input)
}

// === Functional notation ===

fn number(input: &str) -> IResult<&str, f64> {
    verify(double, |v: &f64| v.is_finite())(input)
}

fn bounded<'a>(max: f64) -> impl FnMut(&'a str) -> IResult<&'a str, f64> {
    verify(number, move |v: &f64| (0.0..=max).contains(v))
}

fn percent(input: &str) -> IResult<&str, f64> {
    terminated(bounded(100.0), char('%'))(input)
}

fn rgb_channel(input: &str) -> IResult<&str, f64> {
    alt((percent, bounded(255.0)))(input)
}

fn alpha(input: &str) -> IResult<&str, f64> {
    alt((percent, bounded(1.0)))(input)
}

fn hue(input: &str) -> IResult<&str, f64> {
    terminated(number, opt(tag_no_case("deg")))(input)
}

fn comma(input: &str) -> IResult<&str, char> {
    char(',')(input)
}

fn rgb_color(input: &str) -> IResult<&str, ColorNotation> {
    let (input, _) = tag_no_case("rgb")(input)?;
    let (input, _) = opt(tag_no_case("a"))(input)?;
    let (input, _) = ws(char('('))(input)?;
    let (input, _) = ws(rgb_channel)(input)?;
    let (input, _) = comma(input)?;
    let (input, _) = ws(rgb_channel)(input)?;
    let (input, _) = comma(input)?;
    let (input, _) = ws(rgb_channel)(input)?;
    let (input, _) = opt(preceded(comma, ws(alpha)))(input)?;
    let (input, _) = char(')')(input)?;

    Ok((input, ColorNotation::Rgb))
}

fn hsl_color(input: &str) -> IResult<&str, ColorNotation> {
    let (input, _) = tag_no_case("hsl")(input)?;
    let (input, _) = opt(tag_no_case("a"))(input)?;
    let (input, _) = ws(char('('))(input)?;
    let (input, _) = ws(hue)(input)?;
    let (input, _) = comma(input)?;
    let (input, _) = ws(percent)(input)?;
    let (input, _) = comma(input)?;
    let (input, _) = ws(percent)(input)?;
    let (input, _) = opt(preceded(comma, ws(alpha)))(input)?;
    let (input, _) = char(')')(input)?;

    Ok((input, ColorNotation::Hsl))
}

// === Named ===

fn named_color(input: &str) -> IResult<&str, ColorNotation> {
    map(
        verify(take_while1(|c: char| c.is_ascii_alphabetic()), |name: &str| {
            is_named(name)
        }),
        |_| ColorNotation::Named,
    )(input)
}

fn is_named(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    name == "transparent" || CSS_NAMES.contains(&name.as_str())
}

// The CSS Color Module Level 4 keyword list
const CSS_NAMES: [&str; 148] = [
    "aliceblue", "antiquewhite", "aqua", "aquamarine", "azure", "beige", "bisque", "black",
    "blanchedalmond", "blue", "blueviolet", "brown", "burlywood", "cadetblue", "chartreuse",
    "chocolate", "coral", "cornflowerblue", "cornsilk", "crimson", "cyan", "darkblue",
    "darkcyan", "darkgoldenrod", "darkgray", "darkgreen", "darkgrey", "darkkhaki",
    "darkmagenta", "darkolivegreen", "darkorange", "darkorchid", "darkred", "darksalmon",
    "darkseagreen", "darkslateblue", "darkslategray", "darkslategrey", "darkturquoise",
    "darkviolet", "deeppink", "deepskyblue", "dimgray", "dimgrey", "dodgerblue", "firebrick",
    "floralwhite", "forestgreen", "fuchsia", "gainsboro", "ghostwhite", "gold", "goldenrod",
    "gray", "green", "greenyellow", "grey", "honeydew", "hotpink", "indianred", "indigo",
    "ivory", "khaki", "lavender", "lavenderblush", "lawngreen", "lemonchiffon", "lightblue",
    "lightcoral", "lightcyan", "lightgoldenrodyellow", "lightgray", "lightgreen", "lightgrey",
    "lightpink", "lightsalmon", "lightseagreen", "lightskyblue", "lightslategray",
    "lightslategrey", "lightsteelblue", "lightyellow", "lime", "limegreen", "linen", "magenta",
    "maroon", "mediumaquamarine", "mediumblue", "mediumorchid", "mediumpurple",
    "mediumseagreen", "mediumslateblue", "mediumspringgreen", "mediumturquoise",
    "mediumvioletred", "midnightblue", "mintcream", "mistyrose", "moccasin", "navajowhite",
    "navy", "oldlace", "olive", "olivedrab", "orange", "orangered", "orchid", "palegoldenrod",
    "palegreen", "paleturquoise", "palevioletred", "papayawhip", "peachpuff", "peru", "pink",
    "plum", "powderblue", "purple", "rebeccapurple", "red", "rosybrown", "royalblue",
    "saddlebrown", "salmon", "sandybrown", "seagreen", "seashell", "sienna", "silver",
    "skyblue", "slateblue", "slategray", "slategrey", "snow", "springgreen", "steelblue",
    "tan", "teal", "thistle", "tomato", "turquoise", "violet", "wheat", "white", "whitesmoke",
    "yellow", "yellowgreen",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognize_hex() {
        for hex in ["#F00", "#F00A", "#FF7F0E", "#FF000080", "  #abcdef  "] {
            assert_eq!(recognize(hex), Ok(ColorNotation::Hex), "{}", hex);
        }
        assert!(recognize("#12345").is_err());
        assert!(recognize("#GG0000").is_err());
    }

    #[test]
    fn test_recognize_rgb() {
        assert_eq!(recognize("rgb(255, 0, 0)"), Ok(ColorNotation::Rgb));
        assert_eq!(recognize("rgba(245, 245, 245, 0.9)"), Ok(ColorNotation::Rgb));
        assert_eq!(recognize("rgb(10%, 20%, 30%)"), Ok(ColorNotation::Rgb));
        assert_eq!(recognize("RGBA(0,0,0,50%)"), Ok(ColorNotation::Rgb));
        assert!(recognize("rgb(256, 0, 0)").is_err());
        assert!(recognize("rgb(150%, 0, 0)").is_err());
        assert!(recognize("rgba(0, 0, 0, 2)").is_err());
        assert!(recognize("rgb(0, 0)").is_err());
    }

    #[test]
    fn test_recognize_hsl() {
        assert_eq!(recognize("hsl(120, 100%, 25%)"), Ok(ColorNotation::Hsl));
        assert_eq!(recognize("hsla(120, 50%, 50%, 0.5)"), Ok(ColorNotation::Hsl));
        assert_eq!(recognize("hsl(210deg, 40%, 60%)"), Ok(ColorNotation::Hsl));
        assert!(recognize("hsl(0, 120%, 50%)").is_err());
        assert!(recognize("hsl(0, 50, 50)").is_err());
    }

    #[test]
    fn test_recognize_named() {
        for name in ["blue", "White", "steelblue", "darkred", "rebeccapurple", "transparent"] {
            assert_eq!(recognize(name), Ok(ColorNotation::Named), "{}", name);
        }
        assert!(recognize("notacolor").is_err());
        assert!(recognize("").is_err());
    }

    #[test]
    fn test_named_table_is_unique() {
        let mut names = CSS_NAMES.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), CSS_NAMES.len());
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        assert!(recognize("red blue").is_err());
        assert!(recognize("#FF0000;").is_err());
    }
}
