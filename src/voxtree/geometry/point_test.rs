// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

#[cfg(test)]
mod tests {
    use crate::voxtree::geometry::point::{Point3, Vector3};

    #[test]
    fn test_validate_accepts_domain_points() {
        assert!(Point3::new(0.0, 0.0, 0.0).validate().is_ok());
        assert!(Point3::new(100.0, 200.0, 300.0).validate().is_ok());
        assert!(Point3::new(2097151.0, 1.0, 1.0).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_negative() {
        assert!(Point3::new(-0.1, 0.0, 0.0).validate().is_err());
        assert!(Point3::new(0.0, -5.0, 0.0).validate().is_err());
        assert!(Point3::new(0.0, 0.0, -1e9).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_nan_and_infinite() {
        assert!(Point3::new(f32::NAN, 0.0, 0.0).validate().is_err());
        assert!(Point3::new(0.0, f32::INFINITY, 0.0).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_domain() {
        assert!(Point3::new(2097152.0, 0.0, 0.0).validate().is_err());
    }

    #[test]
    fn test_distance() {
        let a = Point3::new(1.0, 2.0, 3.0);
        let b = Point3::new(4.0, 6.0, 3.0);
        assert_eq!(a.distance_sq(&b), 25.0);
        assert_eq!(a.distance(&b), 5.0);
    }

    #[test]
    fn test_vector_normalise() {
        let v = Vector3::new(3.0, 0.0, 4.0).normalised().unwrap();
        assert!((v.length() - 1.0).abs() < 1e-6);
        assert!(Vector3::new(0.0, 0.0, 0.0).normalised().is_err());
        assert!(Vector3::new(f32::NAN, 1.0, 0.0).normalised().is_err());
    }

    #[test]
    fn test_cross_product_handedness() {
        let x = Vector3::new(1.0, 0.0, 0.0);
        let y = Vector3::new(0.0, 1.0, 0.0);
        let z = x.cross(&y);
        assert_eq!(z, Vector3::new(0.0, 0.0, 1.0));
    }
}
