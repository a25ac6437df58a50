//
// pad.rs
// Mammo-Prep-rs
//
// Letterboxes a normalized image onto a zero-filled square canvas sized to its longest side.
//
// Thales Matheus Mendonça Santos - November 2025

use ndarray::{s, Array3};

use crate::buffers::{NormalizedImageBuffer, SquareImageBuffer};

/// Offsets of the original content inside the square canvas.
/// Odd differences leave the extra row/column on the trailing side.
pub fn square_offsets(height: usize, width: usize) -> (usize, usize, usize) {
    let side = height.max(width);
    (side, (side - height) / 2, (side - width) / 2)
}

/// Pure canvas extension, no resampling.
pub fn pad_to_square(image: &NormalizedImageBuffer) -> SquareImageBuffer {
    let (height, width) = (image.height(), image.width());
    let channels = image.samples().dim().2;
    let (side, offset_y, offset_x) = square_offsets(height, width);

    let mut canvas = Array3::<u8>::zeros((side, side, channels));
    canvas
        .slice_mut(s![offset_y..offset_y + height, offset_x..offset_x + width, ..])
        .assign(image.samples());

    SquareImageBuffer::from_parts(canvas, offset_y, offset_x, height, width)
}
