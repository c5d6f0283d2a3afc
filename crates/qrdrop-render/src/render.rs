use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use qrcode::{Color, QrCode};
use tracing::debug;

use crate::error::{RenderError, RenderResult};
use crate::options::RenderOptions;

const DARK: Luma<u8> = Luma([0]);
const LIGHT: Luma<u8> = Luma([255]);

/// Encode `data` as a QR code and draw it as a PNG.
///
/// The smallest symbol version that fits is chosen. Output is identical for
/// identical inputs.
pub fn render(data: &str, options: &RenderOptions) -> RenderResult<Vec<u8>> {
    options.validate()?;
    let code = QrCode::with_error_correction_level(data.as_bytes(), options.ec_level.into())?;
    let image = rasterize(&code, options)?;

    let mut png = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(image).write_to(&mut png, ImageFormat::Png)?;
    let png = png.into_inner();
    debug!(
        modules = code.width(),
        ec = %options.ec_level,
        bytes = png.len(),
        "rendered QR code"
    );
    Ok(png)
}

/// Draw the module grid, one `module_size` square per module, inside a
/// light border of `quiet_zone` modules.
fn rasterize(code: &QrCode, options: &RenderOptions) -> RenderResult<GrayImage> {
    let width = u32::try_from(code.width())
        .map_err(|_| RenderError::InvalidOptions("symbol too wide".into()))?;
    let modules_per_side = width + 2 * options.quiet_zone;
    let side = modules_per_side
        .checked_mul(options.module_size)
        .ok_or_else(|| RenderError::InvalidOptions("image side overflows u32".into()))?;

    let colors = code.to_colors();
    let quiet = options.quiet_zone;
    Ok(GrayImage::from_fn(side, side, |x, y| {
        let (mx, my) = (x / options.module_size, y / options.module_size);
        if mx < quiet || my < quiet || mx >= quiet + width || my >= quiet + width {
            return LIGHT;
        }
        let index = ((my - quiet) * width + (mx - quiet)) as usize;
        match colors[index] {
            Color::Dark => DARK,
            Color::Light => LIGHT,
        }
    }))
}

/// Build a `data:` URI carrying `bytes` as standard base64.
pub fn to_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::EcLevel;

    const URL: &str = "http://localhost:5000/image/0123456789abcdef0123456789abcdef";

    /// Read back the module grid by sampling the centre of every module.
    fn sample_grid(png: &[u8], opts: &RenderOptions) -> (usize, Vec<bool>) {
        let img = image::load_from_memory_with_format(png, ImageFormat::Png)
            .unwrap()
            .to_luma8();
        assert_eq!(img.width(), img.height());
        let per_side = (img.width() / opts.module_size) as usize;
        let width = per_side - 2 * opts.quiet_zone as usize;

        let mut dark = Vec::with_capacity(width * width);
        for my in 0..width {
            for mx in 0..width {
                let px = (mx as u32 + opts.quiet_zone) * opts.module_size + opts.module_size / 2;
                let py = (my as u32 + opts.quiet_zone) * opts.module_size + opts.module_size / 2;
                dark.push(img.get_pixel(px, py).0[0] < 128);
            }
        }
        (width, dark)
    }

    fn expected_grid(data: &str, level: qrcode::EcLevel) -> (usize, Vec<bool>) {
        let code = QrCode::with_error_correction_level(data, level).unwrap();
        let dark = code.to_colors().into_iter().map(|c| c == Color::Dark).collect();
        (code.width(), dark)
    }

    #[test]
    fn png_carries_the_expected_module_grid() {
        let opts = RenderOptions::default();
        let png = render(URL, &opts).unwrap();
        assert_eq!(sample_grid(&png, &opts), expected_grid(URL, qrcode::EcLevel::L));
    }

    #[test]
    fn dimensions_follow_options() {
        let opts = RenderOptions::default().with_module_size(3);
        let png = render(URL, &opts).unwrap();
        let img = image::load_from_memory(&png).unwrap();
        let (width, _) = expected_grid(URL, qrcode::EcLevel::L);
        assert_eq!(img.width() as usize, (width + 8) * 3);
    }

    #[test]
    fn quiet_zone_is_light() {
        let opts = RenderOptions::default();
        let png = render(URL, &opts).unwrap();
        let img = image::load_from_memory(&png).unwrap().to_luma8();
        let border = opts.quiet_zone * opts.module_size;
        for i in 0..img.width() {
            assert_eq!(img.get_pixel(i, border - 1).0[0], 255);
            assert_eq!(img.get_pixel(border - 1, i).0[0], 255);
        }
    }

    #[test]
    fn higher_ec_level_is_honoured() {
        let opts = RenderOptions::default().with_ec_level(EcLevel::High);
        let png = render(URL, &opts).unwrap();
        assert_eq!(sample_grid(&png, &opts), expected_grid(URL, qrcode::EcLevel::H));
    }

    #[test]
    fn rendering_is_deterministic() {
        let opts = RenderOptions::default();
        assert_eq!(render(URL, &opts).unwrap(), render(URL, &opts).unwrap());
    }

    #[test]
    fn data_over_capacity_fails_cleanly() {
        let long = "x".repeat(4000);
        let err = render(&long, &RenderOptions::default()).unwrap_err();
        assert!(matches!(err, RenderError::EncodingFailed(_)));
    }

    #[test]
    fn invalid_options_are_rejected_before_encoding() {
        let opts = RenderOptions::default().with_module_size(0);
        assert!(matches!(render(URL, &opts), Err(RenderError::InvalidOptions(_))));
    }

    #[test]
    fn data_uri_format() {
        assert_eq!(to_data_uri("image/png", b"hi"), "data:image/png;base64,aGk=");
        assert_eq!(to_data_uri("image/gif", b""), "data:image/gif;base64,");
    }
}
