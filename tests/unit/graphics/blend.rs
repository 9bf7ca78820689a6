use super::*;

const RED: PremulRgba8 = [255, 0, 0, 255];
const HALF_BLUE: PremulRgba8 = [0, 0, 128, 128];

#[test]
fn clear_and_copy() {
    assert_eq!(BlendMode::Clear.apply(RED, HALF_BLUE), [0; 4]);
    assert_eq!(BlendMode::Copy.apply(RED, HALF_BLUE), HALF_BLUE);
    assert_eq!(BlendMode::Copy.apply(RED, [0; 4]), [0; 4]);
}

#[test]
fn source_over_premultiplied() {
    assert_eq!(BlendMode::SourceOver.apply(RED, HALF_BLUE), [127, 0, 128, 255]);
    assert_eq!(BlendMode::SourceOver.apply(RED, [0; 4]), RED);
    assert_eq!(BlendMode::SourceOver.apply([0; 4], HALF_BLUE), HALF_BLUE);
}

#[test]
fn destination_over_swaps_operands() {
    assert_eq!(BlendMode::DestinationOver.apply(RED, HALF_BLUE), RED);
    assert_eq!(
        BlendMode::DestinationOver.apply(HALF_BLUE, RED),
        [127, 0, 128, 255]
    );
}

#[test]
fn lighter_saturates() {
    assert_eq!(
        BlendMode::Lighter.apply([200, 10, 0, 200], [100, 10, 0, 100]),
        [255, 20, 0, 255]
    );
}

#[test]
fn default_and_serde_names() {
    assert_eq!(BlendMode::default(), BlendMode::SourceOver);
    let m: BlendMode = serde_json::from_str("\"destination_over\"").unwrap();
    assert_eq!(m, BlendMode::DestinationOver);
}
