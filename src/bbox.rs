//
// bbox.rs
// Mammo-Prep-rs
//
// Remaps pixel-space boxes into the padded, rescaled and normalized square coordinate space.
//
// Thales Matheus Mendonça Santos - November 2025

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PrepError, Result};

pub const DEFAULT_TARGET_SIZE: u32 = 1080;

/// Which axis is assumed to have received the letterbox padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PaddingAxis {
    /// Shift whichever axis is shorter.
    #[default]
    Auto,
    /// Always shift x. Only valid for portrait images (height >= width).
    WidthOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn of(height: u32, width: u32) -> Self {
        if height >= width {
            Orientation::Portrait
        } else {
            Orientation::Landscape
        }
    }
}

/// Box corners in source-image pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

/// Box in target-canvas pixels plus the normalized corner and center forms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalizedBox {
    pub pix_height: u32,
    pub pix_width: u32,
    pub xmin1080: f64,
    pub ymin1080: f64,
    pub xmax1080: f64,
    pub ymax1080: f64,
    pub w1080: f64,
    pub h1080: f64,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub cx: f64,
    pub cy: f64,
    pub nw: f64,
    pub nh: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateTransformer {
    target: f64,
    axis: PaddingAxis,
}

impl Default for CoordinateTransformer {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_SIZE)
    }
}

impl CoordinateTransformer {
    pub fn new(target_size: u32) -> Self {
        Self {
            target: f64::from(target_size),
            axis: PaddingAxis::Auto,
        }
    }

    pub fn with_axis(mut self, axis: PaddingAxis) -> Self {
        self.axis = axis;
        self
    }

    /// Maps `bbox` from an `image_height x image_width` image to the square canvas.
    ///
    /// The letterbox shift `abs(h - w) / 2` goes on the shorter axis and the scale is
    /// `target / max(h, w)`. With [`PaddingAxis::WidthOnly`] a landscape image is rejected
    /// instead of silently producing shifted coordinates.
    pub fn transform(
        &self,
        bbox: BoundingBox,
        image_height: u32,
        image_width: u32,
    ) -> Result<NormalizedBox> {
        if image_height == 0 || image_width == 0 {
            return Err(PrepError::EmptyImage);
        }
        let orientation = Orientation::of(image_height, image_width);
        if orientation == Orientation::Landscape && self.axis == PaddingAxis::WidthOnly {
            return Err(PrepError::OrientationAssumptionViolation {
                height: image_height,
                width: image_width,
            });
        }

        let (height, width) = (f64::from(image_height), f64::from(image_width));
        let diff = (height - width).abs() / 2.0;
        let (xmin, xmax, ymin, ymax, longest) = match orientation {
            Orientation::Portrait => (bbox.xmin + diff, bbox.xmax + diff, bbox.ymin, bbox.ymax, height),
            Orientation::Landscape => {
                debug!(image_height, image_width, "Landscape image, shifting y by {}", diff);
                (bbox.xmin, bbox.xmax, bbox.ymin + diff, bbox.ymax + diff, width)
            }
        };

        let target = self.target;
        let scale = target / longest;
        let xmin1080 = xmin * scale;
        let ymin1080 = ymin * scale;
        let xmax1080 = xmax * scale;
        let ymax1080 = ymax * scale;
        let w1080 = xmax1080 - xmin1080;
        let h1080 = ymax1080 - ymin1080;

        Ok(NormalizedBox {
            pix_height: image_height,
            pix_width: image_width,
            xmin1080,
            ymin1080,
            xmax1080,
            ymax1080,
            w1080,
            h1080,
            x1: xmin1080 / target,
            y1: ymin1080 / target,
            x2: xmax1080 / target,
            y2: ymax1080 / target,
            cx: (xmin1080 + w1080 / 2.0) / target,
            cy: (ymin1080 + h1080 / 2.0) / target,
            nw: w1080 / target,
            nh: h1080 / target,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn portrait_reference_case() {
        let out = CoordinateTransformer::default()
            .transform(
                BoundingBox {
                    xmin: 100.0,
                    ymin: 100.0,
                    xmax: 300.0,
                    ymax: 400.0,
                },
                2000,
                1500,
            )
            .unwrap();

        assert_eq!((out.pix_height, out.pix_width), (2000, 1500));
        assert!(close(out.xmin1080, 189.0));
        assert!(close(out.xmax1080, 297.0));
        assert!(close(out.ymin1080, 54.0));
        assert!(close(out.ymax1080, 216.0));
        assert!(close(out.w1080, 108.0));
        assert!(close(out.h1080, 162.0));
        assert!(close(out.x1, 0.175));
        assert!(close(out.x2, 0.275));
        assert!(close(out.y1, 0.05));
        assert!(close(out.y2, 0.2));
        assert!(close(out.cx, 0.225));
        assert!(close(out.cy, 0.125));
        assert!(close(out.nw, 0.1));
        assert!(close(out.nh, 0.15));
    }

    #[test]
    fn landscape_shifts_y_and_scales_by_width() {
        let bbox = BoundingBox {
            xmin: 100.0,
            ymin: 100.0,
            xmax: 400.0,
            ymax: 300.0,
        };
        let out = CoordinateTransformer::default().transform(bbox, 1500, 2000).unwrap();
        // Transposed reference case.
        assert!(close(out.ymin1080, 189.0));
        assert!(close(out.ymax1080, 297.0));
        assert!(close(out.xmin1080, 54.0));
        assert!(close(out.cx, 0.125));
        assert!(close(out.cy, 0.225));
        assert!(close(out.nw, 0.15));
        assert!(close(out.nh, 0.1));
    }

    #[test]
    fn width_only_rejects_landscape() {
        let transformer = CoordinateTransformer::default().with_axis(PaddingAxis::WidthOnly);
        let bbox = BoundingBox {
            xmin: 0.0,
            ymin: 0.0,
            xmax: 10.0,
            ymax: 10.0,
        };
        assert!(matches!(
            transformer.transform(bbox, 100, 200),
            Err(PrepError::OrientationAssumptionViolation { height: 100, width: 200 })
        ));
        assert!(transformer.transform(bbox, 200, 100).is_ok());
    }

    #[test]
    fn zero_sized_image_is_rejected() {
        let bbox = BoundingBox {
            xmin: 0.0,
            ymin: 0.0,
            xmax: 1.0,
            ymax: 1.0,
        };
        assert!(CoordinateTransformer::default().transform(bbox, 0, 10).is_err());
    }

    fn image_and_box() -> impl Strategy<Value = (u32, u32, BoundingBox)> {
        (1u32..4000, 1u32..4000).prop_flat_map(|(h, w)| {
            (
                Just(h),
                Just(w),
                0.0..=f64::from(w),
                0.0..=f64::from(w),
                0.0..=f64::from(h),
                0.0..=f64::from(h),
            )
                .prop_map(|(h, w, xa, xb, ya, yb)| {
                    let bbox = BoundingBox {
                        xmin: xa.min(xb),
                        xmax: xa.max(xb),
                        ymin: ya.min(yb),
                        ymax: ya.max(yb),
                    };
                    (h, w, bbox)
                })
        })
    }

    proptest! {
        #[test]
        fn normalized_fields_stay_in_unit_range((h, w, bbox) in image_and_box()) {
            let out = CoordinateTransformer::default().transform(bbox, h, w).unwrap();
            let eps = 1e-9;
            for v in [out.x1, out.y1, out.x2, out.y2, out.cx, out.cy, out.nw, out.nh] {
                prop_assert!(v >= -eps && v <= 1.0 + eps, "{} out of range", v);
            }
            prop_assert!(out.x1 <= out.cx + eps && out.cx <= out.x2 + eps);
            prop_assert!(out.y1 <= out.cy + eps && out.cy <= out.y2 + eps);
        }
    }
}
