use image::{DynamicImage, GrayImage};

pub const UPSCALE_BELOW_WIDTH: u32 = 1000;
pub const UPSCALE_FACTOR: u32 = 2;
pub const BINARIZE_THRESHOLD: u8 = 140;

/// Grayscale, upscale narrow images, binarize, then despeckle.
///
/// Label photos are usually small and noisy; tesseract does best with
/// glyphs around 30px tall on a clean two-tone background.
pub fn preprocess(image: &DynamicImage) -> DynamicImage {
    let luma = grayscale(image);
    let (width, height) = luma.dimensions();

    let resized = if width < UPSCALE_BELOW_WIDTH {
        image::imageops::resize(
            &luma,
            width.saturating_mul(UPSCALE_FACTOR),
            height.saturating_mul(UPSCALE_FACTOR),
            image::imageops::FilterType::Lanczos3,
        )
    } else {
        luma
    };

    let bin = binarize(&resized, BINARIZE_THRESHOLD);
    let despeckled = imageproc::filter::median_filter(&bin, 1, 1);
    DynamicImage::ImageLuma8(despeckled)
}

/// ITU-R 601 luma. Alpha is discarded, not composited.
fn grayscale(image: &DynamicImage) -> GrayImage {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    let mut luma = GrayImage::new(width, height);

    for (x, y, pixel) in rgb.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        let value = (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32).round() as u8;
        luma.put_pixel(x, y, image::Luma([value]));
    }
    luma
}

fn binarize(image: &GrayImage, threshold: u8) -> GrayImage {
    let mut output = image.clone();
    for pixel in output.pixels_mut() {
        pixel[0] = if pixel[0] < threshold { 0 } else { 255 };
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, RgbImage};

    fn gradient(width: u32, height: u32) -> DynamicImage {
        let image = RgbImage::from_fn(width, height, |x, y| {
            let value = ((x + y) % 256) as u8;
            Rgb([value, value / 2, 255 - value])
        });
        DynamicImage::ImageRgb8(image)
    }

    fn is_two_tone(image: &DynamicImage) -> bool {
        image
            .to_luma8()
            .pixels()
            .all(|pixel| pixel[0] == 0 || pixel[0] == 255)
    }

    #[test]
    fn narrow_images_are_doubled() {
        let output = preprocess(&gradient(320, 40));
        assert_eq!((output.width(), output.height()), (640, 80));
    }

    #[test]
    fn wide_images_keep_their_size() {
        let output = preprocess(&gradient(1000, 12));
        assert_eq!((output.width(), output.height()), (1000, 12));
        let output = preprocess(&gradient(1400, 9));
        assert_eq!((output.width(), output.height()), (1400, 9));
    }

    #[test]
    fn output_is_strictly_two_tone() {
        assert!(is_two_tone(&preprocess(&gradient(300, 30))));
        assert!(is_two_tone(&preprocess(&gradient(1100, 10))));
    }

    #[test]
    fn input_is_left_untouched() {
        let input = gradient(64, 8);
        let before = input.to_rgb8().into_raw();
        let _ = preprocess(&input);
        assert_eq!(input.to_rgb8().into_raw(), before);
    }

    #[test]
    fn threshold_splits_at_140() {
        let image = GrayImage::from_fn(2, 1, |x, _| Luma([if x == 0 { 139 } else { 140 }]));
        let bin = binarize(&image, BINARIZE_THRESHOLD);
        assert_eq!(bin.get_pixel(0, 0)[0], 0);
        assert_eq!(bin.get_pixel(1, 0)[0], 255);
    }

    #[test]
    fn isolated_speckle_is_removed() {
        let mut page = GrayImage::from_pixel(1200, 20, Luma([255]));
        page.put_pixel(600, 10, Luma([0]));
        let output = preprocess(&DynamicImage::ImageLuma8(page)).to_luma8();
        assert!(output.pixels().all(|pixel| pixel[0] == 255));
    }

    #[test]
    fn alpha_channel_is_ignored() {
        let mut image = image::RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 0, 0]));
        image.put_pixel(1, 1, image::Rgba([255, 255, 255, 0]));
        let luma = grayscale(&DynamicImage::ImageRgba8(image));
        assert_eq!(luma.get_pixel(0, 0)[0], 0);
        assert_eq!(luma.get_pixel(1, 1)[0], 255);
    }

    #[test]
    fn transparent_black_stays_black_after_preprocessing() {
        let image = image::RgbaImage::from_pixel(1200, 4, image::Rgba([0, 0, 0, 0]));
        let output = preprocess(&DynamicImage::ImageRgba8(image)).to_luma8();
        assert!(output.pixels().all(|pixel| pixel[0] == 0));
    }
}
