use std::env::{self, VarError};

use anyhow::bail;
use image::ImageBuffer;
use once_cell::sync::Lazy;

use super::Image;

const ENV_VAR_JPEG_BACKEND: &str = "HANDVIEW_JPEG_BACKEND";

/// The JPEG decoders webcam frames can be decoded with.
#[derive(Debug)]
enum JpegBackend {
    /// Uses the `jpeg-decoder` crate (through `image`), a robust but slow pure-Rust JPEG decoder.
    JpegDecoder,
    /// Uses the `zune-jpeg` crate, a pure-Rust JPEG decoder somewhat faster than `jpeg-decoder`.
    ZuneJpeg,
}

const DEFAULT_BACKEND: JpegBackend = JpegBackend::ZuneJpeg;

static JPEG_BACKEND: Lazy<JpegBackend> = Lazy::new(|| {
    let backend = match env::var(ENV_VAR_JPEG_BACKEND) {
        Ok(v) if v == "zune-jpeg" => JpegBackend::ZuneJpeg,
        Ok(v) if v == "jpeg-decoder" => JpegBackend::JpegDecoder,
        Ok(v) => {
            log::warn!(
                "invalid value set for `{ENV_VAR_JPEG_BACKEND}` variable: '{v}'; using {DEFAULT_BACKEND:?}"
            );
            DEFAULT_BACKEND
        }
        Err(VarError::NotPresent) => DEFAULT_BACKEND,
        Err(VarError::NotUnicode(s)) => {
            log::warn!(
                "invalid value set for `{ENV_VAR_JPEG_BACKEND}` variable: {}; using {DEFAULT_BACKEND:?}",
                s.to_string_lossy()
            );
            DEFAULT_BACKEND
        }
    };
    log::debug!("using JPEG decode backend: {:?}", backend);
    backend
});

pub(super) fn decode_jpeg(data: &[u8]) -> anyhow::Result<Image> {
    let buf = match *JPEG_BACKEND {
        JpegBackend::JpegDecoder => {
            image::load_from_memory_with_format(data, image::ImageFormat::Jpeg)?.to_rgba8()
        }
        JpegBackend::ZuneJpeg => {
            use zune_jpeg::zune_core::colorspace::ColorSpace;
            use zune_jpeg::zune_core::options::DecoderOptions;

            let mut decomp = zune_jpeg::JpegDecoder::new_with_options(
                DecoderOptions::new_fast().jpeg_set_out_colorspace(ColorSpace::RGBA),
                data,
            );
            decomp.decode_headers()?;
            let Some(colorspace) = decomp.get_output_colorspace() else {
                bail!("JPEG decoder did not report an output colorspace");
            };
            if colorspace != ColorSpace::RGBA {
                bail!("unsupported colorspace {colorspace:?} (expected RGBA)");
            }
            let (Some(size), Some((width, height))) =
                (decomp.output_buffer_size(), decomp.dimensions())
            else {
                bail!("JPEG decoder did not report the image dimensions");
            };

            let mut buf = vec![0; size];
            decomp.decode_into(&mut buf)?;
            match ImageBuffer::from_raw(width.into(), height.into(), buf) {
                Some(buf) => buf,
                None => bail!("decoded JPEG data does not match {width}x{height} image"),
            }
        }
    };

    Ok(Image { buf })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_garbage() {
        assert!(decode_jpeg(b"definitely not a JPEG").is_err());
    }
}
