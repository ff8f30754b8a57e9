// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Block detection: merge ink strokes into block-level blobs with dilation and
// closing, then keep the blobs whose geometry and ink density look like text.
// Strategy profiles are tried in order; the first one that accepts anything
// wins.

use imageproc::contours::{BorderType, find_contours};
use imageproc::point::Point;
use pagelift_core::config::BlockAcceptance;
use pagelift_core::{BoundingBox, StrategyProfile, TextBlock};
use tracing::{debug, info, instrument, warn};

use crate::scan::mask::{BinaryMask, InkTable};

/// An outer contour of the closed mask, measured against the original mask.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub bounds: BoundingBox,
    /// Polygon area enclosed by the contour.
    pub area: f64,
    /// Ink fraction of `bounds` in the un-dilated mask.
    pub density: f64,
}

/// What the acceptance rules decided about one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    /// Sparse wide shape near the top of the page.
    Logo,
    /// Outside the area, size or aspect-ratio limits.
    Geometry,
    /// Mostly morphological artifact rather than ink.
    Density,
}

/// Find text blocks in a binary mask.
///
/// Returns the blocks of the first profile that accepts at least one
/// candidate, sorted top-to-bottom then left-to-right and tagged with that
/// profile's name. An empty result means no profile found anything.
#[instrument(skip_all, fields(width = mask.width(), height = mask.height(), profiles = profiles.len()))]
pub fn detect_blocks(
    mask: &BinaryMask,
    profiles: &[StrategyProfile],
    acceptance: &BlockAcceptance,
) -> Vec<TextBlock> {
    if mask.is_empty() {
        return Vec::new();
    }
    let ink = mask.ink_table();

    for profile in profiles {
        let mut accepted: Vec<BoundingBox> = candidates(mask, &ink, profile)
            .into_iter()
            .filter(|c| {
                judge(c, profile, acceptance, mask.width(), mask.height()) == Verdict::Accept
            })
            .map(|c| c.bounds)
            .collect();

        if accepted.is_empty() {
            debug!(profile = %profile.name, "Strategy produced no blocks");
            continue;
        }

        accepted.sort_by_key(|b| (b.y, b.x));
        info!(profile = %profile.name, blocks = accepted.len(), "Text blocks detected");
        return accepted
            .into_iter()
            .map(|bounds| TextBlock {
                bounds,
                profile: profile.name.clone(),
            })
            .collect();
    }

    warn!("No text blocks found after trying all strategies");
    Vec::new()
}

/// Dilate and close `mask` with `profile`'s kernels and measure every outer
/// contour of the result.
pub fn candidates(mask: &BinaryMask, ink: &InkTable, profile: &StrategyProfile) -> Vec<Candidate> {
    let (width, height) = (mask.width(), mask.height());
    let (dw, dh) = profile.dilate_kernel(width, height);
    let (cw, ch) = profile.close_kernel(width, height);

    let merged = mask
        .dilate(dw, dh, profile.dilate_iterations)
        .close(cw, ch, profile.close_iterations);

    find_contours::<i32>(merged.as_image())
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .filter_map(|contour| {
            let bounds = bounding_rect(&contour.points)?;
            Some(Candidate {
                bounds,
                area: polygon_area(&contour.points),
                density: ink.density(&bounds),
            })
        })
        .collect()
}

/// Apply the logo filter and the acceptance gates to one candidate.
pub fn judge(
    candidate: &Candidate,
    profile: &StrategyProfile,
    acceptance: &BlockAcceptance,
    image_width: u32,
    image_height: u32,
) -> Verdict {
    let b = &candidate.bounds;
    if b.height == 0 {
        return Verdict::Geometry;
    }
    let (img_w, img_h) = (image_width as f64, image_height as f64);
    let page_area = img_w * img_h;
    let aspect = b.aspect_ratio();

    let looks_like_logo = (b.y as f64) < img_h * acceptance.logo_top_fraction
        && (b.height as f64) < img_h * acceptance.logo_max_height_fraction
        && (b.width as f64) > img_w * acceptance.logo_min_width_fraction
        && aspect > acceptance.logo_min_aspect_ratio
        && candidate.area < page_area * acceptance.logo_max_area_fraction;
    if looks_like_logo && candidate.density < profile.logo_max_density {
        return Verdict::Logo;
    }

    let geometry_ok = candidate.area > profile.min_area
        && candidate.area < page_area * acceptance.max_area_fraction
        && b.width > profile.min_width
        && b.height > profile.min_height
        && aspect > acceptance.min_aspect_ratio
        && aspect < acceptance.max_aspect_ratio;
    if !geometry_ok {
        return Verdict::Geometry;
    }

    if candidate.density > profile.density_threshold {
        Verdict::Accept
    } else {
        Verdict::Density
    }
}

fn bounding_rect(points: &[Point<i32>]) -> Option<BoundingBox> {
    let min_x = points.iter().map(|p| p.x).min()?;
    let max_x = points.iter().map(|p| p.x).max()?;
    let min_y = points.iter().map(|p| p.y).min()?;
    let max_y = points.iter().map(|p| p.y).max()?;
    if min_x < 0 || min_y < 0 {
        return None;
    }
    Some(BoundingBox::new(
        min_x as u32,
        min_y as u32,
        (max_x - min_x + 1) as u32,
        (max_y - min_y + 1) as u32,
    ))
}

/// Area of the polygon through the contour's pixel centres, by the shoelace
/// formula.
fn polygon_area(points: &[Point<i32>]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice_area = 0i64;
    for i in 0..n {
        let j = (i + 1) % n;
        twice_area += points[i].x as i64 * points[j].y as i64;
        twice_area -= points[j].x as i64 * points[i].y as i64;
    }
    twice_area.abs() as f64 / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::glyph_row_mask;

    fn profile_named(name: &str, density_threshold: f64) -> StrategyProfile {
        StrategyProfile {
            name: name.into(),
            density_threshold,
            ..StrategyProfile::reference_profiles()[0].clone()
        }
    }

    #[test]
    fn polygon_area_of_rectangle_outline() {
        let points = vec![
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 5),
            Point::new(0, 5),
        ];
        assert!((polygon_area(&points) - 50.0).abs() < 1e-9);
        assert_eq!(
            bounding_rect(&points),
            Some(BoundingBox::new(0, 0, 11, 6))
        );
    }

    #[test]
    fn one_row_of_glyphs_is_one_block() {
        let mask = glyph_row_mask();
        let blocks = detect_blocks(
            &mask,
            &StrategyProfile::reference_profiles(),
            &BlockAcceptance::default(),
        );
        assert_eq!(blocks.len(), 1);
        let b = blocks[0].bounds;
        assert_eq!(blocks[0].profile, "Default");
        assert!(b.y <= 90 && b.bottom() >= 110, "block {b} misses the glyph row");
        assert!(b.x <= 60 && b.right() >= 324);
    }

    #[test]
    fn blank_mask_has_no_blocks() {
        let mask = BinaryMask::new(400, 200);
        let blocks = detect_blocks(
            &mask,
            &StrategyProfile::reference_profiles(),
            &BlockAcceptance::default(),
        );
        assert!(blocks.is_empty());
    }

    #[test]
    fn falls_back_to_the_next_profile() {
        // Too short for Default once dilated; AggressiveHorizontal widens it enough.
        let mut mask = BinaryMask::new(400, 200);
        mask.fill(BoundingBox::new(200, 100, 4, 8));
        let blocks = detect_blocks(
            &mask,
            &StrategyProfile::reference_profiles(),
            &BlockAcceptance::default(),
        );
        assert!(!blocks.is_empty());
        assert!(blocks.iter().all(|b| b.profile == "AggressiveHorizontal"));
    }

    #[test]
    fn density_gate_moves_to_next_profile() {
        let profiles = vec![profile_named("Strict", 0.5), profile_named("Lenient", 0.01)];
        let blocks = detect_blocks(&glyph_row_mask(), &profiles, &BlockAcceptance::default());
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].profile, "Lenient");
    }

    #[test]
    fn sparse_block_fails_default_density_and_passes_aggressive() {
        // 12 x 20 single-pixel dots, 22 apart across and 5 apart down. Both
        // profiles merge them into one solid blob; Default's tighter blob
        // holds 240 / (257 x 98) ink, AggressiveHorizontal's 240 / (267 x 98).
        let mask = BinaryMask::from_fn(400, 400, |x, y| {
            (100..=342).contains(&x)
                && (x - 100) % 22 == 0
                && (100..=195).contains(&y)
                && (y - 100) % 5 == 0
        });
        let profiles = StrategyProfile::reference_profiles();
        let acceptance = BlockAcceptance::default();

        let under_default = candidates(&mask, &mask.ink_table(), &profiles[0]);
        assert_eq!(under_default.len(), 1);
        let density = under_default[0].density;
        assert!(density > 0.008 && density <= 0.01, "density {density}");
        assert_eq!(
            judge(&under_default[0], &profiles[0], &acceptance, 400, 400),
            Verdict::Density
        );

        let blocks = detect_blocks(&mask, &profiles, &acceptance);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].profile, "AggressiveHorizontal");
        assert_eq!(blocks[0].bounds, BoundingBox::new(88, 99, 267, 98));
    }

    #[test]
    fn blocks_stay_inside_the_image() {
        // Ink touching every edge.
        let mask = BinaryMask::from_fn(120, 80, |x, y| {
            (x < 3 || x > 116 || y < 2 || y > 77) && (x + y) % 2 == 0
        });
        let blocks = detect_blocks(
            &mask,
            &StrategyProfile::reference_profiles(),
            &BlockAcceptance::default(),
        );
        for block in blocks {
            assert!(block.bounds.right() <= 120 && block.bounds.bottom() <= 80);
            assert!(!block.bounds.is_empty());
        }
    }

    #[test]
    fn sparse_top_banner_is_treated_as_logo() {
        let profile = &StrategyProfile::reference_profiles()[0];
        let candidate = Candidate {
            bounds: BoundingBox::new(50, 5, 200, 15),
            area: 2_800.0,
            density: 0.05,
        };
        let verdict = judge(&candidate, profile, &BlockAcceptance::default(), 400, 400);
        assert_eq!(verdict, Verdict::Logo);

        let dense = Candidate {
            density: 0.4,
            ..candidate
        };
        let verdict = judge(&dense, profile, &BlockAcceptance::default(), 400, 400);
        assert_eq!(verdict, Verdict::Accept);
    }

    #[test]
    fn whole_page_blob_is_rejected() {
        let profile = &StrategyProfile::reference_profiles()[0];
        let candidate = Candidate {
            bounds: BoundingBox::new(0, 0, 100, 100),
            area: 99.0 * 99.0,
            density: 0.9,
        };
        let verdict = judge(&candidate, profile, &BlockAcceptance::default(), 100, 100);
        assert_eq!(verdict, Verdict::Geometry);
    }
}
