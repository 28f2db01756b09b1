use std::ops::Add;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const ZERO: Vector3 = Vector3::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl Add for Vector3 {
    type Output = Vector3;

    fn add(self, other: Vector3) -> Vector3 {
        Vector3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

/// A vector where only some components are given. Applying it to a full
/// vector overwrites just those components.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SparseVector3 {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

impl SparseVector3 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_x(mut self, x: f64) -> Self {
        self.x = Some(x);
        self
    }

    pub fn with_y(mut self, y: f64) -> Self {
        self.y = Some(y);
        self
    }

    pub fn with_z(mut self, z: f64) -> Self {
        self.z = Some(z);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none() && self.z.is_none()
    }

    pub fn apply_to(&self, base: Vector3) -> Vector3 {
        Vector3 {
            x: self.x.unwrap_or(base.x),
            y: self.y.unwrap_or(base.y),
            z: self.z.unwrap_or(base.z),
        }
    }
}

impl From<Vector3> for SparseVector3 {
    fn from(vector: Vector3) -> Self {
        Self {
            x: Some(vector.x),
            y: Some(vector.y),
            z: Some(vector.z),
        }
    }
}
