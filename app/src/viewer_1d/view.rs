use annoview_core::{Bp, Extent};

/// Screen-space transform applied on top of the base mapping of the
/// annotation extent onto the surface width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub scale: f64,
    pub translate: f64,
}

impl std::default::Default for Transform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translate: 0.0,
        }
    }
}

/// The visible window in basepair coordinates; `end` is exclusive and
/// both ends may be fractional.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub start: f64,
    pub end: f64,
}

impl Window {
    pub fn len(&self) -> f64 {
        self.end - self.start
    }

    /// The window grown by `fraction` of its width on both sides.
    pub fn padded(&self, fraction: f64) -> Self {
        let pad = self.len() * fraction;
        Self {
            start: self.start - pad,
            end: self.end + pad,
        }
    }

    /// `true` if the inclusive basepair span `start..=end` touches the
    /// window.
    pub fn intersects(&self, start: Bp, end: Bp) -> bool {
        end.0 as f64 >= self.start && start.0 as f64 <= self.end
    }
}

/// Maps basepairs to surface `x` for one transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    extent: Extent,
    width: f64,
    transform: Transform,
}

impl Projection {
    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    // `[extent.start, extent.end + 1)` onto `[0, width)`
    fn base(&self, bp: f64) -> f64 {
        let len = self.extent.len() as f64;
        (bp - self.extent.start.0 as f64) / len * self.width
    }

    fn base_inv(&self, x: f64) -> f64 {
        let len = self.extent.len() as f64;
        self.extent.start.0 as f64 + x / self.width * len
    }

    pub fn bp_to_x(&self, bp: f64) -> f64 {
        self.transform.translate + self.transform.scale * self.base(bp)
    }

    pub fn x_to_bp(&self, x: f64) -> f64 {
        let t = self.transform;
        self.base_inv((x - t.translate) / t.scale)
    }

    /// Left and right edges of the inclusive span `start..=end`.
    pub fn span_to_x(&self, start: Bp, end: Bp) -> (f64, f64) {
        (self.bp_to_x(start.0 as f64), self.bp_to_x(end.0 as f64 + 1.0))
    }

    pub fn window(&self) -> Window {
        Window {
            start: self.x_to_bp(0.0),
            end: self.x_to_bp(self.width),
        }
    }
}

/// Zoom and pan state of the 1D view over a fixed annotation extent.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportState {
    extent: Extent,
    width: f64,
    height: f64,
    max_scale: f64,

    transform: Transform,
    window: Window,
}

impl ViewportState {
    pub fn new(extent: Extent, dims: [u32; 2], max_scale: f64) -> Self {
        let width = dims[0].max(1) as f64;
        let height = dims[1].max(1) as f64;
        let transform = Transform::default();

        let mut view = Self {
            extent,
            width,
            height,
            max_scale: max_scale.max(1.0),
            transform,
            window: Window {
                start: 0.0,
                end: 0.0,
            },
        };
        view.make_valid();
        view
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn window(&self) -> Window {
        self.window
    }

    pub fn dims(&self) -> [f64; 2] {
        [self.width, self.height]
    }

    pub fn max_scale(&self) -> f64 {
        self.max_scale
    }

    pub fn projection(&self) -> Projection {
        self.projection_with(self.transform)
    }

    /// Projection for an arbitrary transform over the current surface.
    pub fn projection_with(&self, transform: Transform) -> Projection {
        Projection {
            extent: self.extent,
            width: self.width,
            transform,
        }
    }

    pub fn reset(&mut self) {
        self.transform = Transform::default();
        self.make_valid();
    }

    fn make_valid(&mut self) {
        let t = &mut self.transform;

        if !t.scale.is_finite() {
            t.scale = 1.0;
        }
        t.scale = t.scale.clamp(1.0, self.max_scale);

        // base(x = 0) >= 0 and base(x = width) <= width
        let min_translate = self.width * (1.0 - t.scale);
        if !t.translate.is_finite() {
            t.translate = 0.0;
        }
        t.translate = t.translate.clamp(min_translate, 0.0);

        self.window = self.projection().window();
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
        self.make_valid();
    }

    /// Moves the content by `dx` surface pixels.
    pub fn translate(&mut self, dx: f64) {
        self.transform.translate += dx;
        self.make_valid();
    }

    /// Multiplies the scale by `factor`, keeping the basepair under
    /// surface position `x` fixed (unless clamping prevents it).
    pub fn zoom_with_focus(&mut self, x: f64, factor: f64) {
        let t = self.transform;
        let fixed = (x - t.translate) / t.scale;

        let scale = (t.scale * factor).clamp(1.0, self.max_scale);
        self.transform = Transform {
            scale,
            translate: x - scale * fixed,
        };
        self.make_valid();
    }

    /// Fits the window to the inclusive span `range.start..=range.end`,
    /// as closely as the scale limits allow.
    pub fn goto_range(&mut self, range: std::ops::Range<Bp>) {
        let (start, end) = if range.start <= range.end {
            (range.start, range.end)
        } else {
            (range.end, range.start)
        };

        let unscaled = self.projection_with(Transform::default());
        let (x0, x1) = unscaled.span_to_x(start, end);
        let span = (x1 - x0).max(f64::EPSILON);

        let scale = (self.width / span).clamp(1.0, self.max_scale);
        let mid = (x0 + x1) / 2.0;

        self.transform = Transform {
            scale,
            translate: self.width / 2.0 - scale * mid,
        };
        self.make_valid();
    }

    /// Resizes the surface, keeping the visible window where possible.
    pub fn resize(&mut self, dims: [u32; 2]) {
        let width = dims[0].max(1) as f64;
        self.transform.translate *= width / self.width;
        self.width = width;
        self.height = dims[1].max(1) as f64;
        self.make_valid();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(start: u64, end: u64, width: u32) -> ViewportState {
        ViewportState::new(Extent::new(start, end), [width, 100], 1_000.0)
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn base_mapping_covers_extent() {
        let v = view(1000, 9000, 800);
        let p = v.projection();

        assert!(approx(p.bp_to_x(1000.0), 0.0));
        assert!(approx(p.bp_to_x(9001.0), 800.0));
        assert!(approx(v.window().start, 1000.0));
        assert!(approx(v.window().end, 9001.0));
    }

    #[test]
    fn inverse_roundtrip() {
        let mut v = view(0, 99_999, 1000);
        v.zoom_with_focus(300.0, 8.0);
        let p = v.projection();

        for x in [0.0, 12.5, 500.0, 999.0] {
            assert!(approx(p.bp_to_x(p.x_to_bp(x)), x));
        }
    }

    #[test]
    fn scale_is_clamped() {
        let mut v = view(0, 999, 100);

        v.zoom_with_focus(50.0, 0.01);
        assert_eq!(v.transform().scale, 1.0);

        v.zoom_with_focus(50.0, 1e9);
        assert_eq!(v.transform().scale, 1_000.0);
    }

    #[test]
    fn window_stays_in_extent() {
        let mut v = view(0, 999, 100);
        v.zoom_with_focus(50.0, 4.0);

        v.translate(1e6);
        assert!(approx(v.window().start, 0.0));

        v.translate(-1e6);
        assert!(approx(v.window().end, 1000.0));
        assert!(approx(v.window().len(), 250.0));
    }

    #[test]
    fn zoom_keeps_focus_fixed() {
        let mut v = view(0, 9_999, 1000);
        v.zoom_with_focus(500.0, 2.0);

        let before = v.projection().x_to_bp(250.0);
        v.zoom_with_focus(250.0, 2.0);
        let after = v.projection().x_to_bp(250.0);

        assert!(approx(before, after));
        assert!(approx(v.window().len(), 2_500.0));
    }

    #[test]
    fn goto_range_fits_window() {
        let mut v = view(0, 99_999, 1000);
        v.goto_range(Bp(20_000)..Bp(29_999));

        let w = v.window();
        assert!(approx(w.start, 20_000.0));
        assert!(approx(w.end, 30_000.0));

        // beyond the zoom limit the window is centered on the range
        v.goto_range(Bp(50_000)..Bp(50_000));
        let w = v.window();
        assert!(approx(w.len(), 100.0));
        assert!(approx((w.start + w.end) / 2.0, 50_000.5));
    }

    #[test]
    fn resize_keeps_window() {
        let mut v = view(0, 9_999, 1000);
        v.goto_range(Bp(2_000)..Bp(3_999));
        let before = v.window();

        v.resize([500, 100]);
        assert!(approx(v.window().start, before.start));
        assert!(approx(v.window().end, before.end));
    }

    #[test]
    fn padded_window_intersection() {
        let w = Window {
            start: 100.0,
            end: 200.0,
        }
        .padded(0.1);

        assert!(w.intersects(Bp(0), Bp(90)));
        assert!(!w.intersects(Bp(0), Bp(89)));
        assert!(w.intersects(Bp(210), Bp(300)));
        assert!(!w.intersects(Bp(211), Bp(300)));
    }
}
