//! Minimal geometry types for tile-map crates (no renderer dependency).
#![forbid(unsafe_code)]

use core::ops::{Add, AddAssign, Mul, Sub, SubAssign};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };
    pub const ONE: Vec3 = Vec3 {
        x: 1.0,
        y: 1.0,
        z: 1.0,
    };

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn dot(self, rhs: Vec3) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    #[inline]
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    #[inline]
    fn add_assign(&mut self, rhs: Vec3) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    #[inline]
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl SubAssign for Vec3 {
    #[inline]
    fn sub_assign(&mut self, rhs: Vec3) {
        self.x -= rhs.x;
        self.y -= rhs.y;
        self.z -= rhs.z;
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    #[inline]
    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Row-major 3x3 basis. `transform` treats rows as the output axes, so a
/// point transforms as `x' = rows[0] . v`, matching column-vector math.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Basis {
    pub rows: [[f32; 3]; 3],
}

impl Basis {
    pub const IDENTITY: Basis = Basis {
        rows: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    #[inline]
    pub const fn from_rows(rows: [[f32; 3]; 3]) -> Self {
        Self { rows }
    }

    #[inline]
    pub fn transform(self, v: Vec3) -> Vec3 {
        let r = self.rows;
        Vec3::new(
            r[0][0] * v.x + r[0][1] * v.y + r[0][2] * v.z,
            r[1][0] * v.x + r[1][1] * v.y + r[1][2] * v.z,
            r[2][0] * v.x + r[2][1] * v.y + r[2][2] * v.z,
        )
    }

    /// One of the 24 rotations mapping a cube onto itself. `None` when the
    /// index is out of range.
    #[inline]
    pub fn orthogonal(index: u8) -> Option<Basis> {
        ORTHO_BASES.get(index as usize).copied()
    }

    pub const ORTHO_COUNT: u8 = 24;
}

impl Default for Basis {
    fn default() -> Self {
        Basis::IDENTITY
    }
}

impl Mul for Basis {
    type Output = Basis;
    fn mul(self, rhs: Basis) -> Basis {
        let a = self.rows;
        let b = rhs.rows;
        let mut out = [[0.0f32; 3]; 3];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j];
            }
        }
        Basis { rows: out }
    }
}

/// Affine 3D transform: rotation/scale basis plus translation.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Affine3 {
    pub basis: Basis,
    pub origin: Vec3,
}

impl Affine3 {
    pub const IDENTITY: Affine3 = Affine3 {
        basis: Basis::IDENTITY,
        origin: Vec3::ZERO,
    };

    #[inline]
    pub const fn new(basis: Basis, origin: Vec3) -> Self {
        Self { basis, origin }
    }

    #[inline]
    pub const fn from_translation(origin: Vec3) -> Self {
        Self {
            basis: Basis::IDENTITY,
            origin,
        }
    }

    #[inline]
    pub const fn from_basis(basis: Basis) -> Self {
        Self {
            basis,
            origin: Vec3::ZERO,
        }
    }

    #[inline]
    pub fn transform_point(self, v: Vec3) -> Vec3 {
        self.basis.transform(v) + self.origin
    }
}

impl Mul for Affine3 {
    type Output = Affine3;
    #[inline]
    fn mul(self, rhs: Affine3) -> Affine3 {
        Affine3 {
            basis: self.basis * rhs.basis,
            origin: self.transform_point(rhs.origin),
        }
    }
}

// The 24 orthonormal bases with entries in {-1, 0, 1} and determinant +1,
// indexed in the conventional order: six Y-up/down-facing groups of four
// quarter turns each.
const ORTHO_BASES: [Basis; 24] = [
    Basis::from_rows([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]),
    Basis::from_rows([[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]]),
    Basis::from_rows([[-1.0, 0.0, 0.0], [0.0, -1.0, 0.0], [0.0, 0.0, 1.0]]),
    Basis::from_rows([[0.0, 1.0, 0.0], [-1.0, 0.0, 0.0], [0.0, 0.0, 1.0]]),
    Basis::from_rows([[1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]]),
    Basis::from_rows([[0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]),
    Basis::from_rows([[-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]]),
    Basis::from_rows([[0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]),
    Basis::from_rows([[1.0, 0.0, 0.0], [0.0, -1.0, 0.0], [0.0, 0.0, -1.0]]),
    Basis::from_rows([[0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]]),
    Basis::from_rows([[-1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, -1.0]]),
    Basis::from_rows([[0.0, -1.0, 0.0], [-1.0, 0.0, 0.0], [0.0, 0.0, -1.0]]),
    Basis::from_rows([[1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, -1.0, 0.0]]),
    Basis::from_rows([[0.0, 0.0, -1.0], [1.0, 0.0, 0.0], [0.0, -1.0, 0.0]]),
    Basis::from_rows([[-1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, -1.0, 0.0]]),
    Basis::from_rows([[0.0, 0.0, 1.0], [-1.0, 0.0, 0.0], [0.0, -1.0, 0.0]]),
    Basis::from_rows([[0.0, 0.0, 1.0], [0.0, 1.0, 0.0], [-1.0, 0.0, 0.0]]),
    Basis::from_rows([[0.0, -1.0, 0.0], [0.0, 0.0, 1.0], [-1.0, 0.0, 0.0]]),
    Basis::from_rows([[0.0, 0.0, -1.0], [0.0, -1.0, 0.0], [-1.0, 0.0, 0.0]]),
    Basis::from_rows([[0.0, 1.0, 0.0], [0.0, 0.0, -1.0], [-1.0, 0.0, 0.0]]),
    Basis::from_rows([[0.0, 0.0, 1.0], [0.0, -1.0, 0.0], [1.0, 0.0, 0.0]]),
    Basis::from_rows([[0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]]),
    Basis::from_rows([[0.0, 0.0, -1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]]),
    Basis::from_rows([[0.0, -1.0, 0.0], [0.0, 0.0, -1.0], [1.0, 0.0, 0.0]]),
];
