use helpers::general::wrap_unit;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};

/// * `h_percent` - (%) Horizontal extent of the track relative to the canvas width
/// * `v_percent` - (%) Vertical extent of the track relative to the canvas height
/// * `corner_radius` - (px) Radius of the four corners measured on the track center line
/// * `width_percent` - (%) Track width relative to the canvas height
/// * `no_lanes` - Number of lanes
/// * `gate_offset` - (px) Distance between the entry x-coordinate and the starting gate
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct TrackPars {
    pub h_percent: f64,
    pub v_percent: f64,
    pub corner_radius: f64,
    pub width_percent: f64,
    pub no_lanes: u32,
    pub gate_offset: f64,
}

impl Default for TrackPars {
    fn default() -> Self {
        TrackPars {
            h_percent: 65.5,
            v_percent: 84.0,
            corner_radius: 130.0,
            width_percent: 14.0,
            no_lanes: 3,
            gate_offset: 120.0,
        }
    }
}

/// The eight arcs partitioning the perimeter, in the order they are traversed when moving
/// forward (clockwise on screen, y pointing down). Straights are named by their heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackSegment {
    Right,
    CornerBr,
    Up,
    CornerTr,
    Left,
    CornerTl,
    Down,
    CornerBl,
}

impl TrackSegment {
    pub const ALL: [TrackSegment; 8] = [
        TrackSegment::Right,
        TrackSegment::CornerBr,
        TrackSegment::Up,
        TrackSegment::CornerTr,
        TrackSegment::Left,
        TrackSegment::CornerTl,
        TrackSegment::Down,
        TrackSegment::CornerBl,
    ];

    pub fn is_corner(self) -> bool {
        matches!(
            self,
            TrackSegment::CornerBr
                | TrackSegment::CornerTr
                | TrackSegment::CornerTl
                | TrackSegment::CornerBl
        )
    }

}

/// Bounding rectangle of the track center line (px).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackBounds {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
    pub radius: f64,
}

/// Projection of a (track position, lane) pair onto the screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPosition {
    pub x: f64,
    pub y: f64,
    pub segment: TrackSegment,
    pub corner_progress: f64,
}

/// Track geometry derived from the track parameters and the canvas size. It is immutable once
/// created; a canvas resize creates a new track.
#[derive(Debug, Clone)]
pub struct Track {
    pub bounds: TrackBounds,
    pub track_width: f64,
    pub no_lanes: u32,
    pub canvas_width: f64,
    pub canvas_height: f64,
    gate_offset: f64,
    straight_h: f64,
    straight_v: f64,
    corner_arc: f64,
    perimeter: f64,
}

impl Track {
    pub fn new(track_pars: &TrackPars, canvas_width: f64, canvas_height: f64) -> Track {
        let track_w = track_pars.h_percent / 100.0 * canvas_width;
        let track_h = track_pars.v_percent / 100.0 * canvas_height;
        let margin_h = (canvas_width - track_w) / 2.0;
        let margin_v = (canvas_height - track_h) / 2.0;

        let bounds = TrackBounds {
            left: margin_h,
            right: canvas_width - margin_h,
            top: margin_v,
            bottom: canvas_height - margin_v,
            radius: track_pars.corner_radius,
        };

        Track::from_bounds(
            bounds,
            track_pars.width_percent / 100.0 * canvas_height,
            track_pars.no_lanes,
            track_pars.gate_offset,
            canvas_width,
            canvas_height,
        )
    }

    /// from_bounds creates a track from an explicit bounding rectangle instead of canvas
    /// percentages.
    pub fn from_bounds(
        bounds: TrackBounds,
        track_width: f64,
        no_lanes: u32,
        gate_offset: f64,
        canvas_width: f64,
        canvas_height: f64,
    ) -> Track {
        let straight_h = (bounds.right - bounds.left - 2.0 * bounds.radius).max(0.0);
        let straight_v = (bounds.bottom - bounds.top - 2.0 * bounds.radius).max(0.0);
        let corner_arc = PI * bounds.radius / 2.0;
        let perimeter = 2.0 * straight_h + 2.0 * straight_v + 4.0 * corner_arc;

        Track {
            bounds,
            track_width,
            no_lanes: no_lanes.max(1),
            canvas_width,
            canvas_height,
            gate_offset,
            straight_h,
            straight_v,
            corner_arc,
            perimeter,
        }
    }

    pub fn get_perimeter(&self) -> f64 {
        self.perimeter
    }

    pub fn get_entry_x(&self) -> f64 {
        self.bounds.left + self.bounds.radius
    }

    pub fn get_exit_x(&self) -> f64 {
        self.bounds.right - self.bounds.radius
    }

    pub fn get_gate_x(&self) -> f64 {
        self.get_entry_x() + self.gate_offset
    }

    fn lane_spacing(&self) -> f64 {
        self.track_width / self.no_lanes as f64
    }

    /// get_entry_lane_y returns the y-coordinate of a lane inside the straight entry/exit strip
    /// that runs along the bottom straight.
    pub fn get_entry_lane_y(&self, lane: u32) -> f64 {
        let lane_spacing = self.lane_spacing();
        let entry_lane_top = self.bounds.bottom - self.track_width / 2.0;
        entry_lane_top + lane_spacing * lane as f64 + lane_spacing / 2.0
    }

    /// get_lane_offset returns the signed offset of a lane from the track center line. Lane 0 is
    /// the innermost lane.
    pub fn get_lane_offset(&self, lane: u32) -> f64 {
        (lane as f64 - (self.no_lanes as f64 - 1.0) / 2.0) * self.lane_spacing()
    }

    /// get_corner_radius returns the effective radius a lane traces through the corners.
    pub fn get_corner_radius(&self, lane: u32) -> f64 {
        self.bounds.radius + self.get_lane_offset(lane)
    }

    /// get_segment_lengths returns the arc length of every segment in traversal order. The
    /// lengths sum up to the perimeter.
    pub fn get_segment_lengths(&self) -> [(TrackSegment, f64); 8] {
        let mut lengths = [(TrackSegment::Right, 0.0); 8];
        for (i, segment) in TrackSegment::ALL.iter().enumerate() {
            let length = match segment {
                TrackSegment::Right | TrackSegment::Left => self.straight_h,
                TrackSegment::Up | TrackSegment::Down => self.straight_v,
                _ => self.corner_arc,
            };
            lengths[i] = (*segment, length);
        }
        lengths
    }

    pub fn is_corner_segment(&self, segment: TrackSegment) -> bool {
        segment.is_corner()
    }

    /// get_position_on_track maps a normalized track position t (any real value, wrapped into
    /// [0, 1[) and a lane onto the screen. t = 0 is the start of the bottom straight.
    pub fn get_position_on_track(&self, t: f64, lane: u32) -> TrackPosition {
        let b = &self.bounds;
        let lane_offset = self.get_lane_offset(lane);
        let r = b.radius + lane_offset;

        let mut dist = wrap_unit(t) * self.perimeter;

        // bottom straight (left to right)
        if dist < self.straight_h {
            return TrackPosition {
                x: b.left + b.radius + dist,
                y: b.bottom + lane_offset,
                segment: TrackSegment::Right,
                corner_progress: 0.0,
            };
        }
        dist -= self.straight_h;

        if dist < self.corner_arc {
            let progress = dist / self.corner_arc;
            let angle = FRAC_PI_2 - progress * FRAC_PI_2;
            return TrackPosition {
                x: b.right - b.radius + angle.cos() * r,
                y: b.bottom - b.radius + angle.sin() * r,
                segment: TrackSegment::CornerBr,
                corner_progress: progress,
            };
        }
        dist -= self.corner_arc;

        // right straight (bottom to top)
        if dist < self.straight_v {
            return TrackPosition {
                x: b.right + lane_offset,
                y: b.bottom - b.radius - dist,
                segment: TrackSegment::Up,
                corner_progress: 0.0,
            };
        }
        dist -= self.straight_v;

        if dist < self.corner_arc {
            let progress = dist / self.corner_arc;
            let angle = -progress * FRAC_PI_2;
            return TrackPosition {
                x: b.right - b.radius + angle.cos() * r,
                y: b.top + b.radius + angle.sin() * r,
                segment: TrackSegment::CornerTr,
                corner_progress: progress,
            };
        }
        dist -= self.corner_arc;

        // top straight (right to left)
        if dist < self.straight_h {
            return TrackPosition {
                x: b.right - b.radius - dist,
                y: b.top - lane_offset,
                segment: TrackSegment::Left,
                corner_progress: 0.0,
            };
        }
        dist -= self.straight_h;

        if dist < self.corner_arc {
            let progress = dist / self.corner_arc;
            let angle = -FRAC_PI_2 - progress * FRAC_PI_2;
            return TrackPosition {
                x: b.left + b.radius + angle.cos() * r,
                y: b.top + b.radius + angle.sin() * r,
                segment: TrackSegment::CornerTl,
                corner_progress: progress,
            };
        }
        dist -= self.corner_arc;

        // left straight (top to bottom)
        if dist < self.straight_v {
            return TrackPosition {
                x: b.left - lane_offset,
                y: b.top + b.radius + dist,
                segment: TrackSegment::Down,
                corner_progress: 0.0,
            };
        }
        dist -= self.straight_v;

        // remainder is the bottom-left corner, rounding can push progress marginally past 1
        let progress = if self.corner_arc > 0.0 {
            (dist / self.corner_arc).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let angle = PI - progress * FRAC_PI_2;
        TrackPosition {
            x: b.left + b.radius + angle.cos() * r,
            y: b.bottom - b.radius + angle.sin() * r,
            segment: TrackSegment::CornerBl,
            corner_progress: progress,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use proptest::prelude::*;

    fn reference_track(no_lanes: u32) -> Track {
        Track::from_bounds(
            TrackBounds {
                left: 100.0,
                right: 900.0,
                top: 100.0,
                bottom: 500.0,
                radius: 130.0,
            },
            90.0,
            no_lanes,
            120.0,
            1000.0,
            600.0,
        )
    }

    #[test]
    fn start_of_track_is_bottom_straight() {
        let track = reference_track(1);
        let pos = track.get_position_on_track(0.0, 0);
        assert_eq!(pos.segment, TrackSegment::Right);
        assert_relative_eq!(pos.x, 230.0);
        assert_relative_eq!(pos.y, 500.0);
        assert_relative_eq!(pos.corner_progress, 0.0);
    }

    #[test]
    fn perimeter_matches_closed_form() {
        let track = reference_track(3);
        let expected = 2.0 * 540.0 + 2.0 * 140.0 + 4.0 * PI * 130.0 / 2.0;
        assert_relative_eq!(track.get_perimeter(), expected, epsilon = 1e-9);
    }

    #[test]
    fn derived_x_coordinates() {
        let track = reference_track(3);
        assert_relative_eq!(track.get_entry_x(), 230.0);
        assert_relative_eq!(track.get_exit_x(), 770.0);
        assert_relative_eq!(track.get_gate_x(), 350.0);
    }

    #[test]
    fn entry_lanes_are_stacked_inside_the_strip() {
        let track = reference_track(3);
        // strip spans [455, 545], lanes are 30px apart
        assert_relative_eq!(track.get_entry_lane_y(0), 470.0);
        assert_relative_eq!(track.get_entry_lane_y(1), 500.0);
        assert_relative_eq!(track.get_entry_lane_y(2), 530.0);
    }

    #[test]
    fn segments_follow_traversal_order() {
        let track = reference_track(3);
        let mut t_start = 0.0;
        for (segment, length) in track.get_segment_lengths().iter() {
            let t_mid = t_start + length / 2.0 / track.get_perimeter();
            assert_eq!(track.get_position_on_track(t_mid, 1).segment, *segment);
            t_start += length / track.get_perimeter();
        }
    }

    #[test]
    fn corner_endpoints_join_the_straights() {
        let track = reference_track(3);
        let lengths = track.get_segment_lengths();
        let t_corner_br_end = (lengths[0].1 + lengths[1].1) / track.get_perimeter();
        let end_of_corner = track.get_position_on_track(t_corner_br_end - 1e-9, 2);
        let start_of_up = track.get_position_on_track(t_corner_br_end + 1e-9, 2);
        assert_abs_diff_eq!(end_of_corner.x, start_of_up.x, epsilon = 1e-3);
        assert_abs_diff_eq!(end_of_corner.y, start_of_up.y, epsilon = 1e-3);
    }

    #[test]
    fn track_from_canvas_percentages() {
        let track = Track::new(&TrackPars::default(), 1000.0, 1000.0);
        assert_relative_eq!(track.bounds.left, 172.5, epsilon = 1e-9);
        assert_relative_eq!(track.bounds.right, 827.5, epsilon = 1e-9);
        assert_relative_eq!(track.bounds.top, 80.0, epsilon = 1e-9);
        assert_relative_eq!(track.bounds.bottom, 920.0, epsilon = 1e-9);
        assert_relative_eq!(track.track_width, 140.0, epsilon = 1e-9);
    }

    #[test]
    fn corner_classification() {
        let corners: Vec<TrackSegment> = TrackSegment::ALL
            .iter()
            .copied()
            .filter(|s| s.is_corner())
            .collect();
        assert_eq!(corners.len(), 4);
        assert!(!reference_track(3).is_corner_segment(TrackSegment::Up));
        assert!(reference_track(3).is_corner_segment(TrackSegment::CornerTl));
    }

    proptest! {
        #[test]
        fn prop_position_is_periodic(t in -10.0f64..10.0, lane in 0u32..3) {
            let track = reference_track(3);
            let a = track.get_position_on_track(t, lane);
            let b = track.get_position_on_track(t + 1.0, lane);
            prop_assert!((a.x - b.x).abs() < 1e-6);
            prop_assert!((a.y - b.y).abs() < 1e-6);
        }

        #[test]
        fn prop_partition_is_closed(t in -5.0f64..5.0, lane in 0u32..3) {
            let track = reference_track(3);
            let pos = track.get_position_on_track(t, lane);
            prop_assert!(TrackSegment::ALL.contains(&pos.segment));
            prop_assert!((0.0..=1.0).contains(&pos.corner_progress));
            let sum: f64 = track.get_segment_lengths().iter().map(|(_, l)| l).sum();
            prop_assert!((sum - track.get_perimeter()).abs() < 1e-9);
        }

        #[test]
        fn prop_inner_lanes_trace_smaller_corners(a in 0u32..3, b in 0u32..3, progress in 0.0f64..1.0) {
            prop_assume!(a < b);
            let track = reference_track(3);
            prop_assert!(track.get_corner_radius(a) < track.get_corner_radius(b));

            // distance from the corner center confirms the radius used for drawing
            let lengths = track.get_segment_lengths();
            let t = (lengths[0].1 + progress * lengths[1].1) / track.get_perimeter();
            let center = (track.bounds.right - track.bounds.radius, track.bounds.bottom - track.bounds.radius);
            let dist = |lane: u32| {
                let pos = track.get_position_on_track(t, lane);
                ((pos.x - center.0).powi(2) + (pos.y - center.1).powi(2)).sqrt()
            };
            prop_assert!(dist(a) < dist(b));
        }
    }
}
