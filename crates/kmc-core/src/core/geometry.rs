use nalgebra::{Point3, Vector3};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("Box dimensions must be finite and positive, got {0:?}")]
    InvalidDimensions([f64; 3]),
}

/// A rectangular simulation box with periodic boundaries along all three axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodicBox {
    dimensions: Vector3<f64>,
}

impl PeriodicBox {
    pub fn new(x: f64, y: f64, z: f64) -> Result<Self, GeometryError> {
        let dims = [x, y, z];
        if dims.iter().any(|d| !d.is_finite() || *d <= 0.0) {
            return Err(GeometryError::InvalidDimensions(dims));
        }
        Ok(Self {
            dimensions: Vector3::new(x, y, z),
        })
    }

    #[inline]
    pub fn dimensions(&self) -> &Vector3<f64> {
        &self.dimensions
    }

    /// Shortest vector pointing from `from` to `to` under the minimum-image convention.
    #[inline]
    pub fn minimum_image(&self, from: &Point3<f64>, to: &Point3<f64>) -> Vector3<f64> {
        let raw = to - from;
        Vector3::from_fn(|k, _| {
            let l = self.dimensions[k];
            raw[k] - (raw[k] / l + 0.5).floor() * l
        })
    }

    /// Maps a position back into `[0, L)` along every axis.
    #[inline]
    pub fn wrap(&self, position: &Point3<f64>) -> Point3<f64> {
        Point3::from(Vector3::from_fn(|k, _| {
            let l = self.dimensions[k];
            position[k] - (position[k] / l).floor() * l
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-12;

    fn cube(l: f64) -> PeriodicBox {
        PeriodicBox::new(l, l, l).unwrap()
    }

    #[test]
    fn new_rejects_non_positive_dimensions() {
        assert!(PeriodicBox::new(1.0, 0.0, 1.0).is_err());
        assert!(PeriodicBox::new(-1.0, 1.0, 1.0).is_err());
        assert!(PeriodicBox::new(1.0, 1.0, f64::NAN).is_err());
    }

    #[test]
    fn minimum_image_leaves_short_vectors_untouched() {
        let pbc = cube(10.0);
        let dr = pbc.minimum_image(&Point3::new(1.0, 1.0, 1.0), &Point3::new(2.0, 3.0, 4.0));
        assert!((dr - Vector3::new(1.0, 2.0, 3.0)).norm() < TOLERANCE);
    }

    #[test]
    fn minimum_image_crosses_the_boundary() {
        let pbc = cube(10.0);
        let dr = pbc.minimum_image(&Point3::new(0.5, 5.0, 9.5), &Point3::new(9.5, 5.0, 0.5));
        assert!((dr - Vector3::new(-1.0, 0.0, 1.0)).norm() < TOLERANCE);
    }

    #[test]
    fn minimum_image_is_antisymmetric() {
        let pbc = PeriodicBox::new(4.0, 6.0, 8.0).unwrap();
        let a = Point3::new(0.2, 5.9, 3.0);
        let b = Point3::new(3.7, 0.3, 7.5);
        let ab = pbc.minimum_image(&a, &b);
        let ba = pbc.minimum_image(&b, &a);
        assert!((ab + ba).norm() < TOLERANCE);
    }

    #[test]
    fn wrap_maps_positions_into_the_box() {
        let pbc = cube(10.0);
        let wrapped = pbc.wrap(&Point3::new(-1.0, 12.5, 10.0));
        assert!((wrapped - Point3::new(9.0, 2.5, 0.0)).norm() < TOLERANCE);
    }
}
