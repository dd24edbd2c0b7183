//! PNG output for debug renders.

use std::path::Path;

use image::RgbaImage;
use loam_worldgen::DebugImage;

use crate::MapgenError;

/// Encode a render as PNG, creating parent directories as needed.
pub fn write_png(image: DebugImage, path: &Path) -> Result<(), MapgenError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let (width, height) = image.dimensions();
    let buffer = RgbaImage::from_raw(width, height, image.into_raw())
        .ok_or(MapgenError::BufferSize { width, height })?;
    buffer.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_png_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("maps").join("test.png");

        let mut render = DebugImage::filled(4, 3, (10, 20, 30));
        render.set(1, 2, (200, 100, 0));
        write_png(render, &path).unwrap();

        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (4, 3));
        assert_eq!(decoded.get_pixel(0, 0).0, [10, 20, 30, 255]);
        assert_eq!(decoded.get_pixel(1, 2).0, [200, 100, 0, 255]);
    }

    #[test]
    fn test_mismatched_buffer_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut render = DebugImage::new(4, 4);
        render.pixels.truncate(8);
        let err = write_png(render, &dir.path().join("bad.png")).unwrap_err();
        assert!(matches!(err, MapgenError::BufferSize { width: 4, height: 4 }));
    }
}
