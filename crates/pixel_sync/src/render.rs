//! Rendering surface seam.
//!
//! The surface is the store of record for the canvas; the sync core only tells
//! it which color a cell now has.

use crate::snapshot::Coordinate;

/// Write-only drawing capability.
pub trait RenderSurface {
    /// Set the cell at `coordinate` to the palette color `color`.
    fn set_cell(&mut self, coordinate: Coordinate, color: &str);

    /// Present pending changes. Surfaces that draw immediately ignore this.
    fn flush(&mut self) {}
}

/// In-memory canvas that remembers the last color of every cell.
#[derive(Debug, Clone)]
pub struct CanvasBuffer {
    cols: u32,
    rows: u32,
    cells: Vec<Option<String>>,
    writes: usize,
}

impl CanvasBuffer {
    pub fn new(cols: u32, rows: u32) -> Self {
        Self {
            cols,
            rows,
            cells: vec![None; cols as usize * rows as usize],
            writes: 0,
        }
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn get(&self, x: u32, y: u32) -> Option<&str> {
        self.index(x, y).and_then(|idx| self.cells[idx].as_deref())
    }

    /// Total number of `set_cell` calls that landed on the canvas.
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Number of cells that received a color at least once.
    pub fn painted(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x < self.cols && y < self.rows {
            Some(y as usize * self.cols as usize + x as usize)
        } else {
            None
        }
    }
}

impl RenderSurface for CanvasBuffer {
    fn set_cell(&mut self, coordinate: Coordinate, color: &str) {
        if let Some(idx) = self.index(coordinate.x, coordinate.y) {
            self.cells[idx] = Some(color.to_string());
            self.writes += 1;
        }
    }
}

/// Maps pointer positions on the drawn canvas to cells.
#[derive(Debug, Clone, Copy)]
pub struct PointerMapping {
    pub pixel_size: u32,
    pub cols: u32,
    pub rows: u32,
}

impl PointerMapping {
    /// Cell under the pointer, `None` outside the canvas.
    pub fn to_coordinate(&self, px: f64, py: f64) -> Option<Coordinate> {
        if self.pixel_size == 0 || !px.is_finite() || !py.is_finite() || px < 0.0 || py < 0.0 {
            return None;
        }
        let size = self.pixel_size as f64;
        let x = (px / size).floor();
        let y = (py / size).floor();
        if x >= self.cols as f64 || y >= self.rows as f64 {
            return None;
        }
        Some(Coordinate::new(x as u32, y as u32))
    }
}
