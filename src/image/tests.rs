use super::*;
use Color as C;

fn count(image: &Image, color: Color) -> usize {
    let mut n = 0;
    for y in 0..image.height() {
        for x in 0..image.width() {
            if image.get(x, y) == color {
                n += 1;
            }
        }
    }
    n
}

#[test]
fn new_image_is_transparent() {
    let image = Image::new(3, 2);
    assert_eq!(image.resolution(), Resolution::new(3, 2));
    assert_eq!(count(&image, C::NULL), 6);
}

#[test]
fn to_rgb8_drops_alpha() {
    let mut image = Image::new(2, 1);
    image.set(0, 0, C::RED.with_alpha(7));
    image.set(1, 0, C::from_rgb8(1, 2, 3));
    assert_eq!(image.to_rgb8(), [255, 0, 0, 1, 2, 3]);
}

#[test]
fn from_rgba8() {
    let image = Image::from_rgba8(Resolution::new(1, 2), &[1, 2, 3, 4, 5, 6, 7, 8]);
    assert_eq!(image.get(0, 0), C([1, 2, 3, 4]));
    assert_eq!(image.get(0, 1), C([5, 6, 7, 8]));
}

#[test]
#[should_panic]
fn from_rgba8_wrong_size() {
    Image::from_rgba8(Resolution::new(2, 2), &[0; 15]);
}

#[test]
fn clear() {
    let mut image = Image::new(4, 4);
    image.clear(C::WHITE);
    assert_eq!(count(&image, C::WHITE), 16);
}

#[test]
fn shapes_far_outside_are_skipped() {
    let mut image = Image::new(4, 4);
    draw::line(&mut image, i32::MIN, i32::MIN, i32::MAX, i32::MIN).stroke_width(3);
    draw::line(&mut image, -5_000_000, 2, -40_000, 9_000_000).stroke_width(2);
    draw::disc(&mut image, i32::MIN, i32::MAX).radius(4);
    draw::disc(&mut image, i32::MAX, 0).radius(4);
    assert_eq!(count(&image, C::NULL), 16);
}

#[test]
fn long_line_is_clipped() {
    let mut image = Image::new(4, 4);
    draw::line(&mut image, 2, 2, 2_000_000_000, 2).color(C::GREEN).stroke_width(2);
    draw::line(&mut image, 1, -2_000_000_000, 1, 0).color(C::RED);
    assert_eq!(image.get(3, 2), C::GREEN);
    assert_eq!(image.get(1, 0), C::RED);
    assert_eq!(image.get(0, 2), C::NULL);
}

#[test]
fn line_is_clipped() {
    let mut image = Image::new(4, 4);
    draw::line(&mut image, -10, 1, 10, 1).color(C::GREEN);
    assert_eq!(count(&image, C::GREEN), 4);
    for x in 0..4 {
        assert_eq!(image.get(x, 1), C::GREEN);
    }
}

#[test]
fn disc_is_centered() {
    let mut image = Image::new(11, 11);
    draw::disc(&mut image, 5, 5).radius(4).color(C::RED);
    assert_eq!(image.get(5, 5), C::RED);
    assert_eq!(image.get(1, 5), C::RED);
    assert_eq!(image.get(9, 5), C::RED);
    assert_eq!(image.get(5, 1), C::RED);
    assert_eq!(image.get(5, 9), C::RED);
    assert_eq!(image.get(0, 5), C::NULL);
    assert_eq!(image.get(10, 5), C::NULL);
    assert_eq!(image.get(0, 0), C::NULL);
}

#[test]
fn disc_partially_outside() {
    let mut image = Image::new(4, 4);
    draw::disc(&mut image, 0, 0).radius(1).color(C::RED);
    assert_eq!(image.get(0, 0), C::RED);
    assert_eq!(image.get(3, 3), C::NULL);

    let mut image = Image::new(4, 4);
    draw::disc(&mut image, -100, 100).radius(4);
    assert_eq!(count(&image, C::NULL), 16);
}
