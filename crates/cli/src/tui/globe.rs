// Globe view: orthographic projection of the lead sphere onto a canvas
//
// The viewer sits on +z looking at the origin; a point is visible when its
// rotated z is positive. Screen coordinates are the rotated (x, y).

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Circle, Points},
        Block, Borders,
    },
    Frame,
};

use leadgen_core::{to_sphere_point, GlobeMarker, SpherePoint, GLOBE_RADIUS};

/// Auto-rotation speed, radians per second.
const AUTO_ROTATE_SPEED: f64 = 0.25;
/// Manual rotation step, radians.
const ROTATE_STEP: f64 = 0.15;
/// Graticule spacing, degrees.
const GRID_STEP: i32 = 30;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GlobeView {
    pub(crate) angle: f64,
    pub(crate) auto_rotate: bool,
}

impl Default for GlobeView {
    fn default() -> Self {
        Self {
            angle: 0.0,
            auto_rotate: true,
        }
    }
}

impl GlobeView {
    pub(crate) fn tick(&mut self, elapsed_secs: f64) {
        if self.auto_rotate {
            self.angle = wrap_angle(self.angle + AUTO_ROTATE_SPEED * elapsed_secs);
        }
    }

    pub(crate) fn rotate(&mut self, clockwise: bool) {
        self.auto_rotate = false;
        let step = if clockwise { ROTATE_STEP } else { -ROTATE_STEP };
        self.angle = wrap_angle(self.angle + step);
    }

    pub(crate) fn toggle_auto(&mut self) {
        self.auto_rotate = !self.auto_rotate;
    }

    /// Turn the globe so `point` faces the viewer and stop spinning.
    pub(crate) fn focus(&mut self, point: SpherePoint) {
        self.angle = facing_angle(point);
        self.auto_rotate = false;
    }
}

fn wrap_angle(a: f64) -> f64 {
    a.rem_euclid(std::f64::consts::TAU)
}

/// Y rotation that brings `point` to x = 0 on the visible side.
pub(crate) fn facing_angle(point: SpherePoint) -> f64 {
    wrap_angle((-point.x).atan2(point.z))
}

/// Markers on the visible hemisphere as (lead id, screen x, screen y).
pub(crate) fn visible_markers(markers: &[GlobeMarker], angle: f64) -> Vec<(u32, f64, f64)> {
    markers
        .iter()
        .filter_map(|m| {
            let p = m.point.rotate_y(angle);
            (p.z > 0.0).then_some((m.lead_id, p.x, p.y))
        })
        .collect()
}

/// Front-side graticule dots (parallels and meridians every 30 degrees).
fn graticule(angle: f64) -> Vec<(f64, f64)> {
    let mut dots = Vec::new();
    let mut push = |lat: f64, lon: f64| {
        let p = to_sphere_point(lat, lon, GLOBE_RADIUS).rotate_y(angle);
        if p.z > 0.0 {
            dots.push((p.x, p.y));
        }
    };
    for lat in (-60..=60).step_by(GRID_STEP as usize) {
        for lon in (-180..180).step_by(3) {
            push(lat as f64, lon as f64);
        }
    }
    for lon in (-180..180).step_by(GRID_STEP as usize) {
        for lat in (-87..=87).step_by(3) {
            push(lat as f64, lon as f64);
        }
    }
    dots
}

/// Half-width of the x range that keeps the sphere round in `area`.
/// Braille dots are 2 per cell across and 4 down, with cells twice as tall
/// as they are wide.
fn x_half_extent(area: Rect, y_half: f64) -> f64 {
    if area.height == 0 {
        return y_half;
    }
    y_half * area.width as f64 / (2.0 * area.height as f64)
}

pub(crate) fn draw(
    frame: &mut Frame,
    area: Rect,
    view: &GlobeView,
    markers: &[GlobeMarker],
    selected: Option<u32>,
    label: Option<&str>,
) {
    let block = Block::default().borders(Borders::ALL).title(Line::from(vec![
        Span::styled(" Globe ", Style::default().fg(Color::Cyan)),
        Span::styled(
            format!("{} plotted ", markers.len()),
            Style::default().fg(Color::DarkGray),
        ),
    ]));
    let inner = block.inner(area);

    let y_half = GLOBE_RADIUS * 1.1;
    let x_half = x_half_extent(inner, y_half);
    let grid = graticule(view.angle);
    let visible = visible_markers(markers, view.angle);

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds([-x_half, x_half])
        .y_bounds([-y_half, y_half])
        .paint(move |ctx| {
            ctx.draw(&Circle {
                x: 0.0,
                y: 0.0,
                radius: GLOBE_RADIUS,
                color: Color::Blue,
            });
            ctx.draw(&Points {
                coords: &grid,
                color: Color::DarkGray,
            });
            ctx.layer();
            for &(id, x, y) in &visible {
                let color = if Some(id) == selected { Color::Yellow } else { Color::Red };
                ctx.print(x, y, Span::styled("●", Style::default().fg(color)));
            }
            if let (Some(name), Some(&(_, x, y))) =
                (label, visible.iter().find(|(id, _, _)| Some(*id) == selected))
            {
                ctx.print(x + 0.2, y, Span::styled(format!(" {}", name), Style::default().fg(Color::Yellow)));
            }
        });
    frame.render_widget(canvas, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(id: u32, lat: f64, lon: f64) -> GlobeMarker {
        GlobeMarker {
            lead_id: id,
            point: to_sphere_point(lat, lon, GLOBE_RADIUS),
        }
    }

    #[test]
    fn focus_brings_marker_to_front() {
        for (lat, lon) in [(35.0, 135.7), (-33.9, 151.2), (51.5, -0.1), (40.7, -74.0)] {
            let m = marker(0, lat, lon);
            let mut view = GlobeView::default();
            view.focus(m.point);
            assert!(!view.auto_rotate);
            let p = m.point.rotate_y(view.angle);
            assert!(p.x.abs() < 1e-9, "x = {}", p.x);
            assert!(p.z > 0.0);
        }
    }

    #[test]
    fn far_side_markers_hidden() {
        let kyoto = marker(1, 35.0, 135.7);
        let view_angle = facing_angle(kyoto.point);
        // the antipode is behind the globe
        let antipode = marker(2, -35.0, 135.7 - 180.0);
        let visible = visible_markers(&[kyoto, antipode], view_angle);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].0, 1);
    }

    #[test]
    fn auto_rotation_only_when_enabled() {
        let mut view = GlobeView::default();
        view.tick(2.0);
        assert!((view.angle - 0.5).abs() < 1e-9);
        view.toggle_auto();
        view.tick(2.0);
        assert!((view.angle - 0.5).abs() < 1e-9);
        view.rotate(false);
        assert!((view.angle - 0.35).abs() < 1e-9);
    }

    #[test]
    fn graticule_stays_on_disc() {
        for (x, y) in graticule(1.0) {
            assert!(x * x + y * y <= GLOBE_RADIUS * GLOBE_RADIUS + 1e-9);
        }
    }

    #[test]
    fn extent_keeps_aspect() {
        let area = Rect::new(0, 0, 80, 20);
        assert!((x_half_extent(area, 3.0) - 6.0).abs() < 1e-9);
    }
}
