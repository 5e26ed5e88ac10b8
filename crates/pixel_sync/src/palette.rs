//! Palette indexing.
//!
//! Colors travel over the wire as small integer codes. The code of a color is
//! its position in the configured palette list, so both sides must load the
//! same ordered list.

use std::collections::HashMap;

use crate::{Result, SyncError};

/// Wire-level index into the palette.
pub type ColorCode = u32;

/// Bidirectional mapping between color identifiers and their wire codes.
#[derive(Debug, Clone)]
pub struct PaletteIndex {
    colors: Vec<String>,
    codes: HashMap<String, ColorCode>,
}

impl PaletteIndex {
    /// Build the index from an ordered list of color identifiers.
    ///
    /// # Errors
    ///
    /// Fails with [`SyncError::Config`] for an empty list or a duplicated identifier.
    pub fn new<I, S>(colors: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let colors: Vec<String> = colors.into_iter().map(Into::into).collect();
        if colors.is_empty() {
            return Err(SyncError::Config("palette must contain at least one color".to_string()));
        }

        let mut codes = HashMap::with_capacity(colors.len());
        for (code, color) in colors.iter().enumerate() {
            if codes.insert(color.clone(), code as ColorCode).is_some() {
                return Err(SyncError::Config(format!("palette color '{color}' is listed twice")));
            }
        }

        Ok(Self { colors, codes })
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[String] {
        &self.colors
    }

    pub fn color_to_code(&self, color: &str) -> Result<ColorCode> {
        self.codes.get(color).copied().ok_or_else(|| SyncError::UnknownColor(color.to_string()))
    }

    pub fn code_to_color(&self, code: ColorCode) -> Result<&str> {
        self.colors.get(code as usize).map(String::as_str).ok_or(SyncError::OutOfRange {
            code,
            palette_size: self.colors.len(),
        })
    }
}
