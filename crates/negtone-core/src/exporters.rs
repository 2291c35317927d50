//! Image codecs for output
//!
//! Export 16-bit buffers to PNG or TIFF. Gray buffers are written as
//! single-channel images, RGB and RGBA as RGB (the reserved sample is not
//! written). Every write goes to a temporary file in the destination
//! directory that is renamed over the target only once encoding succeeded.

use std::io::{BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::buffer::{ColorLayout, PixelBuffer};
use crate::decoders::extension_of;
use crate::error::{Error, Result};

/// Writes a [`PixelBuffer`] to disk
pub trait ImageCodec {
    /// Short format name, used in log output.
    fn name(&self) -> &'static str;

    /// Encode `buffer` into `writer`.
    fn encode(&self, buffer: &PixelBuffer, writer: &mut dyn Write) -> Result<()>;

    /// Encode `buffer` to `path`, leaving no partial file behind on failure.
    fn write(&self, buffer: &PixelBuffer, path: &Path) -> Result<()> {
        write_atomic(path, |writer| self.encode(buffer, writer))?;
        tracing::info!(path = %path.display(), format = self.name(), "wrote output");
        Ok(())
    }
}

fn encode_error(context: &str, err: impl std::fmt::Display) -> Error {
    Error::EncodeFailure(format!("{}: {}", context, err))
}

/// Run `encode` against a sibling temporary file, then rename it to `path`.
fn write_atomic<F>(path: &Path, encode: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir)
        .map_err(|e| encode_error(&format!("Failed to create file in {}", dir.display()), e))?;

    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        encode(&mut writer)?;
        writer
            .flush()
            .map_err(|e| encode_error("Failed to flush output", e))?;
    }

    // Dropping `temp` on any error above removes it
    temp.persist(path)
        .map_err(|e| encode_error(&format!("Failed to write {}", path.display()), e.error))?;
    Ok(())
}

/// Colour samples of `buffer` in output order, reserved sample dropped.
fn output_samples(buffer: &PixelBuffer) -> Vec<u16> {
    match buffer.layout() {
        ColorLayout::Gray | ColorLayout::Rgb => buffer.samples().to_vec(),
        ColorLayout::Rgba => buffer
            .pixels()
            .flat_map(|p| [p[0], p[1], p[2]])
            .collect(),
    }
}

/// 16-bit PNG codec
#[derive(Debug, Clone, Copy, Default)]
pub struct PngCodec;

impl ImageCodec for PngCodec {
    fn name(&self) -> &'static str {
        "png"
    }

    fn encode(&self, buffer: &PixelBuffer, writer: &mut dyn Write) -> Result<()> {
        let color_type = match buffer.layout() {
            ColorLayout::Gray => png::ColorType::Grayscale,
            ColorLayout::Rgb | ColorLayout::Rgba => png::ColorType::Rgb,
        };

        let mut encoder = png::Encoder::new(writer, buffer.width(), buffer.height());
        encoder.set_color(color_type);
        encoder.set_depth(png::BitDepth::Sixteen);

        let mut png_writer = encoder
            .write_header()
            .map_err(|e| encode_error("Failed to write PNG header", e))?;

        // PNG 16-bit is big-endian
        let bytes: Vec<u8> = output_samples(buffer)
            .iter()
            .flat_map(|v| v.to_be_bytes())
            .collect();

        png_writer
            .write_image_data(&bytes)
            .map_err(|e| encode_error("Failed to write PNG image", e))?;
        png_writer
            .finish()
            .map_err(|e| encode_error("Failed to finish PNG", e))
    }
}

/// 16-bit TIFF codec
#[derive(Debug, Clone, Copy, Default)]
pub struct TiffCodec;

impl ImageCodec for TiffCodec {
    fn name(&self) -> &'static str {
        "tiff"
    }

    fn encode(&self, buffer: &PixelBuffer, writer: &mut dyn Write) -> Result<()> {
        use tiff::encoder::{colortype, TiffEncoder};

        // The TIFF encoder needs to seek, so encode in memory first
        let mut cursor = std::io::Cursor::new(Vec::new());
        {
            let mut encoder = TiffEncoder::new(&mut cursor)
                .map_err(|e| encode_error("Failed to create TIFF encoder", e))?;
            let samples = output_samples(buffer);

            match buffer.layout() {
                ColorLayout::Gray => encoder
                    .write_image::<colortype::Gray16>(buffer.width(), buffer.height(), &samples),
                ColorLayout::Rgb | ColorLayout::Rgba => encoder
                    .write_image::<colortype::RGB16>(buffer.width(), buffer.height(), &samples),
            }
            .map_err(|e| encode_error("Failed to write TIFF image", e))?;
        }

        writer
            .write_all(cursor.get_ref())
            .map_err(|e| encode_error("Failed to write TIFF data", e))
    }
}

/// Codec for the extension of `path` (`png`, `tif`, `tiff`).
pub fn codec_for_path(path: &Path) -> Result<Box<dyn ImageCodec>> {
    match extension_of(path).as_deref() {
        Some("png") => Ok(Box::new(PngCodec)),
        Some("tif") | Some("tiff") => Ok(Box::new(TiffCodec)),
        Some(other) => Err(Error::EncodeFailure(format!(
            "Unsupported output format: {}",
            other
        ))),
        None => Err(Error::EncodeFailure(format!(
            "No file extension on output path {}",
            path.display()
        ))),
    }
}

/// Encode `buffer` with the codec matching `path`.
pub fn write_image(buffer: &PixelBuffer, path: &Path) -> Result<()> {
    codec_for_path(path)?.write(buffer, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoders::decode_image;
    use std::fs;
    use tempfile::tempdir;

    fn gradient(layout: ColorLayout) -> PixelBuffer {
        let pixels = 6 * 4;
        let data: Vec<u16> = (0..pixels * layout.channels())
            .map(|i| (i as u32 * 2711 % 65536) as u16)
            .collect();
        PixelBuffer::new(6, 4, layout, data).unwrap()
    }

    #[test]
    fn test_png_rgb_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.png");
        let buffer = gradient(ColorLayout::Rgb);

        PngCodec.write(&buffer, &path).unwrap();
        assert_eq!(decode_image(&path).unwrap(), buffer);
    }

    #[test]
    fn test_tiff_gray_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.tiff");
        let buffer = gradient(ColorLayout::Gray);

        TiffCodec.write(&buffer, &path).unwrap();
        assert_eq!(decode_image(&path).unwrap(), buffer);
    }

    #[test]
    fn test_rgba_written_as_rgb() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rgba.png");
        let buffer = PixelBuffer::filled(2, 2, ColorLayout::Rgba, 1234).unwrap();

        write_image(&buffer, &path).unwrap();
        let decoded = decode_image(&path).unwrap();
        assert_eq!(decoded.layout(), ColorLayout::Rgb);
        assert!(decoded.samples().iter().all(|&v| v == 1234));
    }

    #[test]
    fn test_codec_for_path() {
        assert_eq!(codec_for_path(Path::new("a.PNG")).unwrap().name(), "png");
        assert_eq!(codec_for_path(Path::new("a.tif")).unwrap().name(), "tiff");
        assert!(matches!(
            codec_for_path(Path::new("a.jpg")),
            Err(Error::EncodeFailure(_))
        ));
        assert!(codec_for_path(Path::new("noext")).is_err());
    }

    #[test]
    fn test_no_temporary_left_after_success() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clean.png");
        PngCodec.write(&gradient(ColorLayout::Rgb), &path).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_failed_encode_leaves_nothing() {
        struct FailingCodec;
        impl ImageCodec for FailingCodec {
            fn name(&self) -> &'static str {
                "failing"
            }
            fn encode(&self, _: &PixelBuffer, writer: &mut dyn Write) -> Result<()> {
                writer.write_all(b"partial").unwrap();
                Err(Error::EncodeFailure("boom".to_string()))
            }
        }

        let dir = tempdir().unwrap();
        let path = dir.path().join("never.png");
        let err = FailingCodec
            .write(&gradient(ColorLayout::Rgb), &path)
            .unwrap_err();

        assert!(matches!(err, Error::EncodeFailure(_)));
        assert!(!path.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_directory_is_encode_failure() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("out.png");
        assert!(matches!(
            PngCodec.write(&gradient(ColorLayout::Rgb), &path),
            Err(Error::EncodeFailure(_))
        ));
    }
}
