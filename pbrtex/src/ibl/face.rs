//! Cube faces, their fixed view matrices and direction ↔ texel mapping.
//!
//! Faces use the DDS order (+X, −X, +Y, −Y, +Z, −Z). Each face is rendered
//! with a right-handed look-at view from the origin and a shared 90° square
//! projection whose Y axis is flipped so that row 0 of a rendered face is the
//! top row of the corresponding DDS cube face.

use std::f32::consts::FRAC_PI_2;
use std::fmt;

use glam::{Mat4, Vec3, Vec4};

/// Vertical field of view of every face.
pub const FIELD_OF_VIEW: f32 = FRAC_PI_2;
pub const NEAR_PLANE: f32 = 0.1;
pub const FAR_PLANE: f32 = 10.0;

/// One of the six faces of a cube map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeFace {
    PositiveX = 0,
    NegativeX = 1,
    PositiveY = 2,
    NegativeY = 3,
    PositiveZ = 4,
    NegativeZ = 5,
}

impl CubeFace {
    /// All faces in DDS order.
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn descriptor(self) -> &'static FaceDescriptor {
        &FACES[self.index()]
    }

    pub fn name(self) -> &'static str {
        match self {
            CubeFace::PositiveX => "+X",
            CubeFace::NegativeX => "-X",
            CubeFace::PositiveY => "+Y",
            CubeFace::NegativeY => "-Y",
            CubeFace::PositiveZ => "+Z",
            CubeFace::NegativeZ => "-Z",
        }
    }
}

impl fmt::Display for CubeFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixed camera of one face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceDescriptor {
    pub face: CubeFace,
    /// Direction through the face center.
    pub forward: Vec3,
    pub up: Vec3,
}

impl FaceDescriptor {
    /// World → view transform of the face camera.
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(Vec3::ZERO, self.forward, self.up)
    }

    /// Combined projection × view.
    pub fn view_projection(&self) -> Mat4 {
        projection() * self.view()
    }

    /// Unit direction through normalized device coordinates `(x, y)`.
    pub fn direction_from_ndc(&self, x: f32, y: f32) -> Vec3 {
        let inverse = self.view_projection().inverse();
        let far = inverse * Vec4::new(x, y, 1.0, 1.0);
        (far.truncate() / far.w).normalize()
    }

    /// Unit direction through the center of texel `(x, y)` of a `size`² face.
    pub fn texel_direction(&self, x: u32, y: u32, size: u32) -> Vec3 {
        self.raster(size).direction(x, y)
    }

    /// Precomputed texel → direction mapping for a `size`² viewport.
    pub fn raster(&self, size: u32) -> FaceRaster {
        FaceRaster {
            inverse: self.view_projection().inverse(),
            size,
        }
    }
}

/// Texel → direction mapping of one face at one viewport size.
#[derive(Debug, Clone, Copy)]
pub struct FaceRaster {
    inverse: Mat4,
    size: u32,
}

impl FaceRaster {
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Unit direction through the center of texel `(x, y)`.
    pub fn direction(&self, x: u32, y: u32) -> Vec3 {
        let s = self.size as f32;
        let ndc_x = 2.0 * (x as f32 + 0.5) / s - 1.0;
        let ndc_y = 1.0 - 2.0 * (y as f32 + 0.5) / s;
        let far = self.inverse * Vec4::new(ndc_x, ndc_y, 1.0, 1.0);
        (far.truncate() / far.w).normalize()
    }
}

/// The six face cameras, indexed by [`CubeFace::index`].
pub const FACES: [FaceDescriptor; 6] = [
    FaceDescriptor {
        face: CubeFace::PositiveX,
        forward: Vec3::X,
        up: Vec3::NEG_Y,
    },
    FaceDescriptor {
        face: CubeFace::NegativeX,
        forward: Vec3::NEG_X,
        up: Vec3::NEG_Y,
    },
    FaceDescriptor {
        face: CubeFace::PositiveY,
        forward: Vec3::Y,
        up: Vec3::Z,
    },
    FaceDescriptor {
        face: CubeFace::NegativeY,
        forward: Vec3::NEG_Y,
        up: Vec3::NEG_Z,
    },
    FaceDescriptor {
        face: CubeFace::PositiveZ,
        forward: Vec3::Z,
        up: Vec3::NEG_Y,
    },
    FaceDescriptor {
        face: CubeFace::NegativeZ,
        forward: Vec3::NEG_Z,
        up: Vec3::NEG_Y,
    },
];

/// Shared face projection: 90° FOV, aspect 1, near 0.1, far 10, Y flipped.
pub fn projection() -> Mat4 {
    let flip_y = Mat4::from_scale(Vec3::new(1.0, -1.0, 1.0));
    flip_y * Mat4::perspective_rh(FIELD_OF_VIEW, 1.0, NEAR_PLANE, FAR_PLANE)
}

/// Face hit by `direction` and the normalized `(u, v)` on that face.
///
/// `(0, 0)` is the top-left corner of the face.
pub fn direction_to_face(direction: Vec3) -> (CubeFace, f32, f32) {
    let a = direction.abs();
    let (face, sc, tc, ma) = if a.x >= a.y && a.x >= a.z {
        if direction.x > 0.0 {
            (CubeFace::PositiveX, -direction.z, -direction.y, a.x)
        } else {
            (CubeFace::NegativeX, direction.z, -direction.y, a.x)
        }
    } else if a.y >= a.z {
        if direction.y > 0.0 {
            (CubeFace::PositiveY, direction.x, direction.z, a.y)
        } else {
            (CubeFace::NegativeY, direction.x, -direction.z, a.y)
        }
    } else if direction.z > 0.0 {
        (CubeFace::PositiveZ, direction.x, -direction.y, a.z)
    } else {
        (CubeFace::NegativeZ, -direction.x, -direction.y, a.z)
    };

    let ma = ma.max(f32::MIN_POSITIVE);
    (face, (sc / ma + 1.0) * 0.5, (tc / ma + 1.0) * 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-4, "{:?} != {:?}", a, b);
    }

    #[test]
    fn test_face_centers_are_canonical_axes() {
        let expected = [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z];
        for (face, axis) in CubeFace::ALL.iter().zip(expected) {
            assert_close(face.descriptor().direction_from_ndc(0.0, 0.0), axis);
        }
    }

    #[test]
    fn test_descriptors_are_indexed_by_face() {
        for face in CubeFace::ALL {
            assert_eq!(face.descriptor().face, face);
        }
    }

    #[test]
    fn test_top_left_corner_of_positive_x() {
        // Top of every side face is +Y; left of +X is +Z.
        let corner = CubeFace::PositiveX.descriptor().direction_from_ndc(-1.0, 1.0);
        assert_close(corner, Vec3::new(1.0, 1.0, 1.0).normalize());
    }

    #[test]
    fn test_top_left_corner_of_positive_y() {
        let corner = CubeFace::PositiveY.descriptor().direction_from_ndc(-1.0, 1.0);
        assert_close(corner, Vec3::new(-1.0, 1.0, -1.0).normalize());
    }

    #[test]
    fn test_texel_direction_round_trips_through_face_lookup() {
        let size = 8;
        for face in CubeFace::ALL {
            for (x, y) in [(0, 0), (3, 5), (7, 7), (7, 0)] {
                let dir = face.descriptor().texel_direction(x, y, size);
                let (hit, u, v) = direction_to_face(dir);
                assert_eq!(hit, face);
                assert!((u * size as f32 - (x as f32 + 0.5)).abs() < 1e-3);
                assert!((v * size as f32 - (y as f32 + 0.5)).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn test_direction_to_face_center() {
        let (face, u, v) = direction_to_face(Vec3::NEG_Z);
        assert_eq!(face, CubeFace::NegativeZ);
        assert!((u - 0.5).abs() < 1e-6 && (v - 0.5).abs() < 1e-6);
    }
}
