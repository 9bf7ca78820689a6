use super::*;

#[test]
fn quad_layout() {
    let v = quad_vertices(Region::new(1, 2, 3, 4), Region::new(5, 6, 3, 4), [1.0; 4]);
    assert_eq!(v.len(), 4 * VERTEX_FLOAT_COUNT);
    assert_eq!(
        vertex_at(&v, 0),
        Vertex {
            dst: [1.0, 2.0],
            src: [5.0, 6.0],
            color: [1.0; 4],
        }
    );
    assert_eq!(vertex_at(&v, 3).dst, [4.0, 6.0]);
    assert_eq!(vertex_at(&v, 3).src, [8.0, 10.0]);
    assert!(validate_mesh(&v, &quad_indices()).is_ok());
}

#[test]
fn mesh_shape_errors() {
    let v = quad_vertices(Region::from_size(1, 1), Region::from_size(1, 1), [1.0; 4]);
    assert!(validate_mesh(&v[..7], &[]).is_err());
    assert!(validate_mesh(&v, &[0, 1]).is_err());
    assert!(validate_mesh(&v, &[0, 1, 4]).is_err());

    let mut nan = v.clone();
    nan[0] = f32::NAN;
    assert!(matches!(
        validate_mesh(&nan, &quad_indices()),
        Err(RestorableError::Bounds(_))
    ));
}

#[test]
fn source_coords_respect_region() {
    let v = quad_vertices(Region::from_size(1, 1), Region::new(1, 0, 1, 1), [1.0; 4]);
    assert!(validate_source_coords(&v, Region::new(1, 0, 1, 1)).is_ok());
    assert!(validate_source_coords(&v, Region::from_size(3, 1)).is_ok());
    assert!(validate_source_coords(&v, Region::from_size(1, 1)).is_err());
}
