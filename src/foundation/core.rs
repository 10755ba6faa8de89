use crate::foundation::error::{RefraktError, RefraktResult};

pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// Pixel dimensions of a render target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> RefraktResult<Self> {
        if width == 0 || height == 0 {
            return Err(RefraktError::validation("canvas width/height must be > 0"));
        }
        Ok(Self { width, height })
    }
}

/// Straight (non-premultiplied) RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// A ray as handed to the tracer: an origin and a (not necessarily unit) direction.
///
/// A fresh value is built for every pointer update; nothing about it is shared between
/// frames.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RayState {
    pub origin: Point,
    pub direction: Vec2,
}

impl RayState {
    pub fn new(origin: Point, direction: Vec2) -> Self {
        Self { origin, direction }
    }

    /// Ray leaving `emitter` towards the pointer position.
    ///
    /// Fails when the pointer sits on the emitter, since no direction can be derived.
    pub fn from_pointer(emitter: Point, pointer: Point) -> RefraktResult<Self> {
        let direction = pointer - emitter;
        let len2 = direction.hypot2();
        if !len2.is_finite() || len2 <= 0.0 {
            return Err(RefraktError::geometry(
                "pointer coincides with emitter; ray direction is undefined",
            ));
        }
        Ok(Self {
            origin: emitter,
            direction,
        })
    }

    /// Same ray with a unit-length direction, or `None` for a zero/non-finite direction.
    pub fn normalized(self) -> Option<Self> {
        let len = self.direction.hypot();
        if !len.is_finite() || len <= 0.0 {
            return None;
        }
        Some(Self {
            origin: self.origin,
            direction: self.direction / len,
        })
    }
}

/// Parse an `x,y` pair as used on the command line.
pub fn parse_point(s: &str) -> RefraktResult<Point> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| RefraktError::validation(format!("expected 'x,y', got '{s}'")))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .ok_or_else(|| RefraktError::validation(format!("invalid coordinate '{v}'")))
    };
    Ok(Point::new(parse(x)?, parse(y)?))
}
