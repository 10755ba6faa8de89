//! Snell's-law primitives. Inputs are expected to be unit vectors.

use crate::foundation::core::Vec2;

/// Mirror `incident` about the surface with unit `normal`.
pub fn reflect(incident: Vec2, normal: Vec2) -> Vec2 {
    incident - 2.0 * incident.dot(normal) * normal
}

/// Refract `incident` through a surface with unit `normal` (opposing the incident ray) and
/// index ratio `eta` = n_from / n_to.
///
/// Returns `None` on total internal reflection.
pub fn refract(incident: Vec2, normal: Vec2, eta: f64) -> Option<Vec2> {
    let d = incident.dot(normal);
    let k = 1.0 - eta * eta * (1.0 - d * d);
    if k < 0.0 {
        return None;
    }
    Some(eta * incident - (eta * d + k.sqrt()) * normal)
}

/// Refract, falling back to reflection when no refracted ray exists.
pub fn refract_or_reflect(incident: Vec2, normal: Vec2, eta: f64) -> Vec2 {
    refract(incident, normal, eta).unwrap_or_else(|| reflect(incident, normal))
}
