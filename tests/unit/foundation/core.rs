use super::*;

#[test]
fn byte_len_and_area() {
    let r = Region::new(1, 2, 3, 4);
    assert_eq!(r.area(), 12);
    assert_eq!(r.byte_len(), 48);
    assert_eq!(r.right(), 4);
    assert_eq!(r.bottom(), 6);
    assert!(Region::new(0, 0, 0, 5).is_empty());
}

#[test]
fn containment() {
    let outer = Region::from_size(4, 4);
    assert!(outer.contains_region(Region::new(1, 1, 3, 3)));
    assert!(!outer.contains_region(Region::new(1, 1, 4, 3)));
    assert!(outer.contains_pixel(3, 3));
    assert!(!outer.contains_pixel(4, 0));
}

#[test]
fn intersection_is_exclusive_at_edges() {
    let a = Region::new(0, 0, 2, 2);
    let b = Region::new(2, 0, 2, 2);
    assert_eq!(a.intersect(b), None);
    assert!(!a.intersects(b));

    let c = Region::new(1, 1, 4, 4);
    assert_eq!(a.intersect(c), Some(Region::new(1, 1, 1, 1)));
}

#[test]
fn ensure_within_rejects_overflowing_regions() {
    assert!(Region::new(0, 0, 2, 2).ensure_within(2, 2, "write").is_ok());
    let err = Region::new(u32::MAX, 0, 2, 1)
        .ensure_within(2, 2, "write")
        .unwrap_err();
    assert!(matches!(err, RestorableError::Bounds(_)));
}

#[test]
fn region_serde_shape() {
    let r: Region = serde_json::from_str(r#"{"x":1,"y":2,"width":3,"height":4}"#).unwrap();
    assert_eq!(r, Region::new(1, 2, 3, 4));
}
