//! Change-of-basis math between the sensor convention and the engine
//! convention.
//!
//! The fused transform is composed as
//! `engine = world_from_service * TRS(slot) * device_from_engine`,
//! where both outer matrices are constant and fixed at adapter construction.

use nalgebra::{Isometry3, Matrix3, Matrix4, Rotation3, Translation3, UnitQuaternion, Vector3};

/// Tolerance below which a basis vector is treated as degenerate.
const DEGENERATE_EPS: f64 = 1e-9;

/// Constant matrix converting the service's start-of-service frame to the
/// engine world frame. The service is right-handed with Z up; the engine is
/// left-handed with Y up, so the Y and Z basis columns swap.
pub fn world_from_service() -> Matrix4<f64> {
    Matrix4::new(
        1.0, 0.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    )
}

/// Constant matrix converting the engine's local frame to the device frame.
/// The engine looks down +Z, the device down -Z, so the Z basis column
/// negates.
pub fn device_from_engine() -> Matrix4<f64> {
    Matrix4::new(
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, -1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    )
}

/// Homogeneous translation-rotation matrix with unit scale.
pub fn trs(translation: &Vector3<f64>, rotation: &UnitQuaternion<f64>) -> Matrix4<f64> {
    Isometry3::from_parts(Translation3::from(*translation), *rotation).to_homogeneous()
}

/// Rotation whose forward (Z) axis equals `forward` and whose up axis is as
/// close to `up` as orthonormality allows.
///
/// Degenerate input (zero-length forward, or forward parallel to up) falls
/// back to the identity rotation.
pub fn look_rotation(forward: &Vector3<f64>, up: &Vector3<f64>) -> UnitQuaternion<f64> {
    if forward.norm() < DEGENERATE_EPS {
        return UnitQuaternion::identity();
    }
    let z = forward.normalize();

    let x = up.cross(&z);
    if x.norm() < DEGENERATE_EPS {
        return UnitQuaternion::identity();
    }
    let x = x.normalize();
    let y = z.cross(&x);

    let basis = Rotation3::from_matrix_unchecked(Matrix3::from_columns(&[x, y, z]));
    UnitQuaternion::from_rotation_matrix(&basis)
}

/// Translation column of a homogeneous transform.
pub fn translation_of(m: &Matrix4<f64>) -> Vector3<f64> {
    Vector3::new(m[(0, 3)], m[(1, 3)], m[(2, 3)])
}

/// Basis column `i` of a homogeneous transform (0 = right, 1 = up,
/// 2 = forward).
pub fn basis_column(m: &Matrix4<f64>, i: usize) -> Vector3<f64> {
    Vector3::new(m[(0, i)], m[(1, i)], m[(2, i)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_from_service_swaps_y_and_z() {
        let m = world_from_service();
        let p = m.transform_point(&nalgebra::Point3::new(1.0, 2.0, 3.0));
        assert!((p.x - 1.0).abs() < 1e-12);
        assert!((p.y - 3.0).abs() < 1e-12);
        assert!((p.z - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_device_from_engine_negates_z() {
        let m = device_from_engine();
        let p = m.transform_point(&nalgebra::Point3::new(1.0, 2.0, 3.0));
        assert!((p.x - 1.0).abs() < 1e-12);
        assert!((p.y - 2.0).abs() < 1e-12);
        assert!((p.z + 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_trs_translation_column() {
        let t = Vector3::new(0.5, -1.0, 2.0);
        let m = trs(&t, &UnitQuaternion::identity());
        assert_eq!(translation_of(&m), t);
        assert!((m[(0, 0)] - 1.0).abs() < 1e-12);
        assert!((m[(3, 3)] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_look_rotation_identity_basis() {
        let q = look_rotation(&Vector3::z(), &Vector3::y());
        assert!(q.angle_to(&UnitQuaternion::identity()) < 1e-10);
    }

    #[test]
    fn test_look_rotation_quarter_turn() {
        // Forward along +X with +Y up is a 90 degree yaw.
        let q = look_rotation(&Vector3::x(), &Vector3::y());
        let expected = UnitQuaternion::from_axis_angle(
            &Vector3::y_axis(),
            std::f64::consts::FRAC_PI_2,
        );
        assert!(q.angle_to(&expected) < 1e-10);
    }

    #[test]
    fn test_look_rotation_degenerate_falls_back_to_identity() {
        let zero = look_rotation(&Vector3::zeros(), &Vector3::y());
        assert!(zero.angle_to(&UnitQuaternion::identity()) < 1e-12);

        let parallel = look_rotation(&Vector3::y(), &Vector3::y());
        assert!(parallel.angle_to(&UnitQuaternion::identity()) < 1e-12);
    }

    #[test]
    fn test_look_rotation_matches_composed_matrix() {
        let rot = UnitQuaternion::from_euler_angles(0.2, -0.4, 0.9);
        let m = trs(&Vector3::zeros(), &rot);
        let q = look_rotation(&basis_column(&m, 2), &basis_column(&m, 1));
        assert!(q.angle_to(&rot) < 1e-9);
    }
}
