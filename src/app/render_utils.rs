use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, pos2};

use topic_explorer::explore::Viewport;

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha)
}

const MAX_GRID_LINES: usize = 256;

/// Grid lines on round logical coordinates, so the grid moves with pan and zoom.
pub(super) fn draw_background(painter: &Painter, rect: Rect, viewport: &Viewport) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let logical_per_px = viewport.logical_per_px(rect);
    if !logical_per_px.is_finite() || logical_per_px <= 0.0 {
        return;
    }

    let target = 64.0 * logical_per_px;
    let step = 10f32.powf(target.log10().floor());
    let step = if step * 5.0 <= target {
        step * 5.0
    } else if step * 2.0 <= target {
        step * 2.0
    } else {
        step
    };
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70));

    for x in grid_lines(viewport.x, viewport.width, step) {
        let screen_x = viewport.logical_to_screen(pos2(x, viewport.y), rect).x;
        painter.line_segment(
            [Pos2::new(screen_x, rect.top()), Pos2::new(screen_x, rect.bottom())],
            stroke,
        );
    }

    for y in grid_lines(viewport.y, viewport.height, step) {
        let screen_y = viewport.logical_to_screen(pos2(viewport.x, y), rect).y;
        painter.line_segment(
            [Pos2::new(rect.left(), screen_y), Pos2::new(rect.right(), screen_y)],
            stroke,
        );
    }
}

/// Multiples of `step` covering `start..=start + extent`, at most
/// `MAX_GRID_LINES` of them.
fn grid_lines(start: f32, extent: f32, step: f32) -> impl Iterator<Item = f32> {
    let first = (start / step).floor() * step;
    let count = ((start + extent - first) / step).floor();
    let count = if count.is_finite() && count >= 0.0 {
        (count as usize + 1).min(MAX_GRID_LINES)
    } else {
        0
    };
    (0..count).map(move |i| first + i as f32 * step)
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}
