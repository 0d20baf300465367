//! # HOG descriptor layout
//!
//! A HOG kernel emits one flat vector per window. The vector is made up of overlapping blocks,
//! each block split into cells, each cell holding one orientation histogram. This module recovers
//! that spatial structure and merges the per-cell histograms of every block into a single
//! normalized histogram per grid position.

use crate::error::Error;
use anyhow::Result;
use nalgebra as na;

/// Geometry of a HOG descriptor.
///
/// All sizes are `(width, height)` pairs in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub struct HogParams {
    pub win_size: (usize, usize),
    pub block_size: (usize, usize),
    pub block_stride: (usize, usize),
    pub cell_size: (usize, usize),
    pub nbins: usize,
    /// Whether bins span the full circle instead of half of it.
    #[cfg_attr(feature = "serde", serde(default))]
    pub signed_gradient: bool,
}

impl Default for HogParams {
    fn default() -> Self {
        Self {
            win_size: (224, 320),
            block_size: (32, 32),
            block_stride: (16, 16),
            cell_size: (16, 16),
            nbins: 9,
            signed_gradient: false,
        }
    }
}

impl HogParams {
    /// Check that the parameters describe a whole number of blocks and cells.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| -> Result<()> { Err(Error::InvalidGeometry(msg).into()) };

        if self.nbins == 0 {
            return fail("nbins must be non-zero".into());
        }

        for (name, axis) in [("width", 0), ("height", 1)] {
            let pick = |v: (usize, usize)| if axis == 0 { v.0 } else { v.1 };
            let (win, block, stride, cell) = (
                pick(self.win_size),
                pick(self.block_size),
                pick(self.block_stride),
                pick(self.cell_size),
            );

            if win == 0 || block == 0 || stride == 0 || cell == 0 {
                return fail(format!("zero {name} in window, block, stride or cell"));
            }
            if block % cell != 0 {
                return fail(format!("block {name} {block} is not a multiple of cell {cell}"));
            }
            if win < block {
                return fail(format!("window {name} {win} is smaller than block {block}"));
            }
            if (win - block) % stride != 0 {
                return fail(format!(
                    "window {name} {win} minus block {block} is not a multiple of stride {stride}"
                ));
            }
        }

        Ok(())
    }

    /// Number of block positions across the window, `(x, y)`.
    pub fn blocks_per_window(&self) -> (usize, usize) {
        let axis = |win: usize, block: usize, stride: usize| {
            win.checked_sub(block).map(|d| d / stride + 1).unwrap_or(0)
        };
        (
            axis(self.win_size.0, self.block_size.0, self.block_stride.0),
            axis(self.win_size.1, self.block_size.1, self.block_stride.1),
        )
    }

    /// Number of cells inside one block, `(x, y)`.
    pub fn cells_per_block(&self) -> (usize, usize) {
        (
            self.block_size.0 / self.cell_size.0,
            self.block_size.1 / self.cell_size.1,
        )
    }

    /// Angular width of a single bin, in degrees.
    pub fn bin_width(&self) -> f32 {
        let range = if self.signed_gradient { 360.0 } else { 180.0 };
        range / self.nbins as f32
    }

    /// Length of the descriptor vector a kernel produces for one window.
    pub fn descriptor_len(&self) -> usize {
        let (bx, by) = self.blocks_per_window();
        let (cx, cy) = self.cells_per_block();
        bx * by * cx * cy * self.nbins
    }
}

/// Grid of aggregated, normalized histograms.
///
/// Position `(x, y)` corresponds to the block anchored at `x * stride.0, y * stride.1`.
#[derive(Clone, Debug, PartialEq)]
pub struct CellGrid {
    hist: Vec<f32>,
    cols: usize,
    rows: usize,
    nbins: usize,
    block_size: (usize, usize),
    block_stride: (usize, usize),
}

impl CellGrid {
    /// Interpret a flat descriptor vector according to `params`.
    ///
    /// The vector is nested, from outermost to innermost: block column, block row, cell within the
    /// block, bin. All cell histograms of a block are summed and then normalized so that the bins
    /// sum up to 1. Positions without any gradient energy stay all-zero.
    ///
    /// # Arguments
    ///
    /// * `descriptor` - flat HOG descriptor.
    /// * `params` - geometry the descriptor was computed with.
    pub fn reconstruct(descriptor: &[f32], params: &HogParams) -> Result<Self> {
        params.validate()?;

        let expected = params.descriptor_len();
        if descriptor.len() != expected {
            return Err(Error::ShapeMismatch {
                expected,
                actual: descriptor.len(),
            }
            .into());
        }

        let (cols, rows) = params.blocks_per_window();
        let (cx, cy) = params.cells_per_block();
        let nbins = params.nbins;
        let block_len = cx * cy * nbins;

        let mut hist = vec![0f32; cols * rows * nbins];

        // Blocks are stored column-major, so walk x in the outer loop.
        for (block_idx, block) in descriptor.chunks_exact(block_len).enumerate() {
            let (x, y) = (block_idx / rows, block_idx % rows);
            let out = &mut hist[(y * cols + x) * nbins..][..nbins];

            for cell in block.chunks_exact(nbins) {
                out.iter_mut().zip(cell).for_each(|(o, v)| *o += v);
            }

            let sum: f32 = out.iter().sum();
            if sum != 0.0 {
                out.iter_mut().for_each(|o| *o /= sum);
            }
        }

        Ok(Self {
            hist,
            cols,
            rows,
            nbins,
            block_size: params.block_size,
            block_stride: params.block_stride,
        })
    }

    /// Get width and height of the grid.
    pub fn dim(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    /// Number of bins in every histogram.
    pub fn nbins(&self) -> usize {
        self.nbins
    }

    /// Get the aggregated histogram at grid coordinates.
    pub fn get(&self, x: usize, y: usize) -> &[f32] {
        &self.hist[(y * self.cols + x) * self.nbins..][..self.nbins]
    }

    /// Pixel position (within the window) of the centre of the block at grid coordinates.
    pub fn center(&self, x: usize, y: usize) -> na::Point2<i32> {
        na::Point2::new(
            (x * self.block_stride.0 + self.block_size.0 / 2) as i32,
            (y * self.block_stride.1 + self.block_size.1 / 2) as i32,
        )
    }

    /// Iterate every grid position.
    ///
    /// The resulting iterator yields `(x, y, histogram)` entries in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &[f32])> + '_ {
        (0..self.rows).flat_map(move |y| (0..self.cols).map(move |x| (x, y, self.get(x, y))))
    }
}
