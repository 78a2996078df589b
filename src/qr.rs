use qrcode::{EcLevel, QrCode};

use crate::composer::Composer;
use crate::content::palette;
use crate::error::ContextError;
use crate::pdf::{Color, PaintMode};

pub const QR_BASE_URL: &str = "https://tokistorage.github.io/qr/";

/// Light modules kept around the symbol, in modules.
pub const QUIET_ZONE: usize = 2;

/// Prefixes relative paths with the QR base URL.
pub fn normalize_url(url: &str) -> String {
    if url.starts_with("http") {
        url.to_string()
    } else {
        format!("{QR_BASE_URL}{url}")
    }
}

/// The dark modules of a QR symbol, row by row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrMatrix {
    width: usize,
    dark: Vec<bool>,
}

impl QrMatrix {
    /// Encodes `data` at the lowest error correction level, choosing the smallest fitting version.
    pub fn encode(data: &str) -> Result<Self, ContextError> {
        let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::L).map_err(
            |error| ContextError::with_error(format!("Failed to encode {:?} as a QR code", data), &error),
        )?;
        let dark = code
            .to_colors()
            .into_iter()
            .map(|color| color == qrcode::Color::Dark)
            .collect();

        Ok(QrMatrix {
            width: code.width(),
            dark,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_dark(&self, column: usize, row: usize) -> bool {
        column < self.width && row < self.width && self.dark[row * self.width + column]
    }

    /// Horizontal runs of dark modules as `(row, first_column, length)`.
    pub fn dark_runs(&self) -> Vec<(usize, usize, usize)> {
        let mut runs = Vec::new();
        for row in 0..self.width {
            let mut column = 0;
            while column < self.width {
                if !self.is_dark(column, row) {
                    column += 1;
                    continue;
                }
                let start = column;
                while column < self.width && self.is_dark(column, row) {
                    column += 1;
                }
                runs.push((row, start, column - start));
            }
        }
        runs
    }
}

/// Draws `data` as a square QR code of `size` millimetres with its top-left corner at `(x, y)`.
pub fn draw_qr_code(
    composer: &mut Composer,
    data: &str,
    x: f32,
    y: f32,
    size: f32,
) -> Result<(), ContextError> {
    let matrix = QrMatrix::encode(data)?;
    let module_size = size / (matrix.width() + 2 * QUIET_ZONE) as f32;
    log::debug!(
        "Drawing a {0}x{0} QR code with {1:.2} mm modules",
        matrix.width(),
        module_size
    );

    composer.set_fill_color(palette::WHITE);
    composer.rect(x, y, size, size, PaintMode::Fill)?;

    composer.set_fill_color(Color::rgb(0, 0, 0));
    let origin = QUIET_ZONE as f32 * module_size;
    for (row, column, length) in matrix.dark_runs() {
        composer.rect(
            x + origin + column as f32 * module_size,
            y + origin + row as f32 * module_size,
            length as f32 * module_size,
            module_size,
            PaintMode::Fill,
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_urls_get_the_base_prefix() {
        assert_eq!(
            normalize_url("abc123"),
            "https://tokistorage.github.io/qr/abc123"
        );
        assert_eq!(
            normalize_url("https://example.com/voice"),
            "https://example.com/voice"
        );
    }

    #[test]
    fn short_data_fits_a_version_one_symbol() {
        let matrix = QrMatrix::encode("TQ-00001").unwrap();
        assert_eq!(matrix.width(), 21);
        // Finder pattern corners are always dark
        assert!(matrix.is_dark(0, 0));
        assert!(matrix.is_dark(20, 0));
        assert!(matrix.is_dark(0, 20));
        assert!(!matrix.is_dark(21, 0));
    }

    #[test]
    fn runs_cover_exactly_the_dark_modules() {
        let matrix = QrMatrix::encode(&normalize_url("sample")).unwrap();
        let from_runs: usize = matrix.dark_runs().iter().map(|(_, _, length)| length).sum();
        let counted = (0..matrix.width())
            .flat_map(|row| (0..matrix.width()).map(move |column| (column, row)))
            .filter(|&(column, row)| matrix.is_dark(column, row))
            .count();
        assert_eq!(from_runs, counted);
    }
}
