use eframe::egui::{Pos2, Rect, Vec2, pos2, vec2};

/// The visible logical rectangle.
///
/// Screen rectangles are whatever the rendering surface reports; logical and
/// screen axes point the same way.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Bounding box of `positions` plus padding on every side.
    ///
    /// Padding is `padding_fraction` of the span, at least `min_padding`; the
    /// resulting sides are floored at `min_span`, so an empty or single-point
    /// dataset still yields a usable rectangle.
    pub fn fit(
        positions: impl IntoIterator<Item = Pos2>,
        padding_fraction: f32,
        min_padding: f32,
        min_span: f32,
    ) -> Self {
        let mut min = vec2(f32::INFINITY, f32::INFINITY);
        let mut max = vec2(f32::NEG_INFINITY, f32::NEG_INFINITY);
        for position in positions {
            if !position.is_finite() {
                continue;
            }
            min.x = min.x.min(position.x);
            min.y = min.y.min(position.y);
            max.x = max.x.max(position.x);
            max.y = max.y.max(position.y);
        }

        let min_span = min_span.max(f32::MIN_POSITIVE);
        if !min.x.is_finite() || !max.x.is_finite() {
            let side = (min_padding * 2.0).max(min_span);
            return Self::new(-side * 0.5, -side * 0.5, side, side);
        }

        let span = max - min;
        let pad_x = (span.x * padding_fraction).max(min_padding);
        let pad_y = (span.y * padding_fraction).max(min_padding);
        let width = (span.x + pad_x * 2.0).max(min_span);
        let height = (span.y + pad_y * 2.0).max(min_span);
        let center = ((min + max) * 0.5).to_pos2();

        Self::new(center.x - width * 0.5, center.y - height * 0.5, width, height)
    }

    pub fn size(&self) -> Vec2 {
        vec2(self.width, self.height)
    }

    /// The larger side; the zoom level's natural measure.
    pub fn span(&self) -> f32 {
        self.width.max(self.height)
    }

    pub fn center(&self) -> Pos2 {
        pos2(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    pub fn rect(&self) -> Rect {
        Rect::from_min_size(pos2(self.x, self.y), self.size())
    }

    /// Grows the shorter side about the center so that the logical and screen
    /// aspect ratios agree and one logical unit is square on screen.
    pub fn match_aspect(&mut self, screen: Rect) {
        if screen.width() <= 0.0 || screen.height() <= 0.0 {
            return;
        }

        let center = self.center();
        let screen_aspect = screen.width() / screen.height();
        if self.width / self.height < screen_aspect {
            self.width = self.height * screen_aspect;
        } else {
            self.height = self.width / screen_aspect;
        }
        self.x = center.x - self.width * 0.5;
        self.y = center.y - self.height * 0.5;
    }

    /// Follows a change of the drawing surface from `from` to `to`, keeping
    /// the center and the logical size of a pixel on both axes.
    pub fn resize(&mut self, from: Rect, to: Rect) {
        let usable = |rect: Rect| rect.width() > 0.0 && rect.height() > 0.0;
        if !usable(from) || !usable(to) {
            return;
        }

        let center = self.center();
        let (sx, sy) = scale_factors(self, from);
        self.width = to.width() * sx;
        self.height = to.height() * sy;
        self.x = center.x - self.width * 0.5;
        self.y = center.y - self.height * 0.5;
    }

    /// Logical units covered by one screen pixel horizontally.
    pub fn logical_per_px(&self, screen: Rect) -> f32 {
        if screen.width() <= 0.0 {
            return 1.0;
        }
        self.width / screen.width()
    }

    pub fn screen_to_logical(&self, screen_pos: Pos2, screen: Rect) -> Pos2 {
        let (sx, sy) = scale_factors(self, screen);
        pos2(
            self.x + (screen_pos.x - screen.min.x) * sx,
            self.y + (screen_pos.y - screen.min.y) * sy,
        )
    }

    pub fn logical_to_screen(&self, logical: Pos2, screen: Rect) -> Pos2 {
        let (sx, sy) = scale_factors(self, screen);
        pos2(
            screen.min.x + (logical.x - self.x) / sx,
            screen.min.y + (logical.y - self.y) / sy,
        )
    }

    /// Moves the view so content follows a pointer drag of `delta` pixels.
    pub fn pan(&mut self, delta: Vec2, screen: Rect) {
        let (sx, sy) = scale_factors(self, screen);
        self.x -= delta.x * sx;
        self.y -= delta.y * sy;
    }

    /// Zooms by `zoom_step^steps` (positive steps zoom in) keeping the logical
    /// point under `anchor` fixed on screen. Sides never shrink below `min_span`.
    pub fn zoom_at(
        &mut self,
        anchor: Pos2,
        screen: Rect,
        steps: f32,
        zoom_step: f32,
        min_span: f32,
    ) {
        if !steps.is_finite() || steps == 0.0 || zoom_step <= 1.0 {
            return;
        }

        let logical_anchor = self.screen_to_logical(anchor, screen);
        let mut factor = zoom_step.powf(-steps);
        let smallest = self.width.min(self.height);
        if smallest * factor < min_span {
            factor = min_span / smallest;
        }

        let width = self.width * factor;
        let height = self.height * factor;
        if !width.is_finite() || !height.is_finite() {
            return;
        }

        self.width = width;
        self.height = height;
        let (sx, sy) = scale_factors(self, screen);
        self.x = logical_anchor.x - (anchor.x - screen.min.x) * sx;
        self.y = logical_anchor.y - (anchor.y - screen.min.y) * sy;
    }
}

fn scale_factors(viewport: &Viewport, screen: Rect) -> (f32, f32) {
    let sx = if screen.width() > 0.0 {
        viewport.width / screen.width()
    } else {
        1.0
    };
    let sy = if screen.height() > 0.0 {
        viewport.height / screen.height()
    } else {
        1.0
    };
    (sx, sy)
}
