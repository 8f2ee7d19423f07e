use serde::{Deserialize, Serialize};

/// An 8-bit RGB color, the unit stored in a picture palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Convert a unit-range color to 8 bits, rounding to nearest
    ///
    /// Components outside [0, 1] are clamped; callers validate beforehand.
    pub fn from_unit(color: [f64; 3]) -> Self {
        let to_byte = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self {
            r: to_byte(color[0]),
            g: to_byte(color[1]),
            b: to_byte(color[2]),
        }
    }

    /// Squared euclidean distance in RGB space
    pub fn distance_sq(&self, other: &Rgb) -> u32 {
        let dr = i32::from(self.r) - i32::from(other.r);
        let dg = i32::from(self.g) - i32::from(other.g);
        let db = i32::from(self.b) - i32::from(other.b);
        (dr * dr + dg * dg + db * db) as u32
    }

    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

/// A per-cell color as supplied by the mesh
///
/// Deserializes from 1 to 4 unsigned byte components:
/// - 1: gray
/// - 2: gray + alpha
/// - 3: RGB
/// - 4: RGBA
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Build a color from 1-4 components; returns None for any other count
    pub fn from_components(components: &[u8]) -> Option<Self> {
        match *components {
            [v] => Some(Self::new(v, v, v, 255)),
            [v, a] => Some(Self::new(v, v, v, a)),
            [r, g, b] => Some(Self::new(r, g, b, 255)),
            [r, g, b, a] => Some(Self::new(r, g, b, a)),
            _ => None,
        }
    }

    /// Drop the alpha channel; the picture format has no transparency
    pub fn rgb(&self) -> Rgb {
        Rgb::new(self.r, self.g, self.b)
    }
}

impl TryFrom<Vec<u8>> for Rgba {
    type Error = String;

    fn try_from(components: Vec<u8>) -> Result<Self, Self::Error> {
        Rgba::from_components(&components).ok_or_else(|| {
            format!(
                "cell color needs 1 to 4 components, got {}",
                components.len()
            )
        })
    }
}

impl From<Rgba> for Vec<u8> {
    fn from(color: Rgba) -> Self {
        vec![color.r, color.g, color.b, color.a]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_unit_rounds() {
        assert_eq!(Rgb::from_unit([0.0, 0.5, 1.0]), Rgb::new(0, 128, 255));
        assert_eq!(Rgb::from_unit([1.5, -0.2, 0.0]), Rgb::new(255, 0, 0));
    }

    #[test]
    fn test_rgba_components() {
        assert_eq!(Rgba::from_components(&[7]), Some(Rgba::new(7, 7, 7, 255)));
        assert_eq!(Rgba::from_components(&[7, 9]), Some(Rgba::new(7, 7, 7, 9)));
        assert_eq!(
            Rgba::from_components(&[1, 2, 3]),
            Some(Rgba::new(1, 2, 3, 255))
        );
        assert_eq!(Rgba::from_components(&[]), None);
        assert_eq!(Rgba::from_components(&[1, 2, 3, 4, 5]), None);
    }

    #[test]
    fn test_rgba_deserialize() {
        let color: Rgba = serde_json::from_str("[10, 20, 30]").unwrap();
        assert_eq!(color.rgb(), Rgb::new(10, 20, 30));
        assert!(serde_json::from_str::<Rgba>("[1, 2, 3, 4, 5]").is_err());
    }

    #[test]
    fn test_distance() {
        let a = Rgb::new(0, 0, 0);
        let b = Rgb::new(3, 4, 0);
        assert_eq!(a.distance_sq(&b), 25);
    }
}
