use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crossbeam::channel::{Receiver, Sender};
use ultraviolet::Vec2;

use anyhow::Result;

use annoview_core::{ParseResult, TrackLayout};

use crate::AppWindow;

pub mod config;
pub mod control;
pub mod events;
pub mod render;
pub mod selection;
pub mod throttle;
pub mod view;

pub use config::Config;
pub use control::{parse_pos_range, Msg, ViewCmd};
pub use events::InputEvent;
pub use render::{DrawPrimitive, Frame, RenderStats, Shape, Visibility};
pub use selection::{DisplayPayload, Selection};

use render::RootIndex;
use throttle::RedrawThrottle;
use view::{Transform, ViewportState};

#[derive(Debug)]
pub struct Args {
    pub annotations: PathBuf,
    pub dims: [u32; 2],
    pub init_range: Option<String>,
}

/// Zoomable single-axis view of an annotation set, features stacked in
/// lanes.
pub struct Viewer1D {
    result: Arc<ParseResult>,
    layout: TrackLayout,
    roots: RootIndex,
    config: Config,

    view: ViewportState,
    throttle: RedrawThrottle,
    selection: Selection,
    frame: Option<Frame>,
    drag_origin: Option<Vec2>,

    msg_tx: Sender<Msg>,
    msg_rx: Receiver<Msg>,
}

impl Viewer1D {
    pub fn new(result: Arc<ParseResult>, config: Config, dims: [u32; 2]) -> Self {
        let layout = TrackLayout::build(&result);
        let roots = RootIndex::new(&result);

        let max_scale = config.max_scale(result.extent.len());
        let view = ViewportState::new(result.extent, dims, max_scale);
        let throttle = RedrawThrottle::new(config.min_redraw_interval);

        let (msg_tx, msg_rx) = crossbeam::channel::unbounded();

        Self {
            result,
            layout,
            roots,
            config,

            view,
            throttle,
            selection: Selection::default(),
            frame: None,
            drag_origin: None,

            msg_tx,
            msg_rx,
        }
    }

    pub fn msg_sender(&self) -> Sender<Msg> {
        self.msg_tx.clone()
    }

    pub fn result(&self) -> &Arc<ParseResult> {
        &self.result
    }

    pub fn layout(&self) -> &TrackLayout {
        &self.layout
    }

    pub fn view(&self) -> &ViewportState {
        &self.view
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The most recently rendered frame.
    pub fn frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Details of the pinned feature, or of the hovered one if nothing
    /// is pinned.
    pub fn display_payload(&self) -> Option<DisplayPayload> {
        let id = self.selection.current()?;
        let feature = self.result.get(id)?;
        Some(DisplayPayload::new(id, feature))
    }

    pub fn dismiss_pinned(&mut self) {
        self.selection.dismiss_pinned();
    }

    fn hit_test(&self, pos: Vec2) -> Option<annoview_core::FeatureId> {
        self.frame.as_ref()?.hit_test(pos)
    }

    fn redraw(&mut self, transform: Transform) {
        let projection = self.view.projection_with(transform);
        let frame = render::render_frame(
            &self.result,
            &self.layout,
            &self.roots,
            projection,
            &self.config,
        );
        self.frame = Some(frame);
    }

    fn request_redraw(&mut self, now: Instant) {
        if let Some(transform) = self.throttle.request(now, self.view.transform())
        {
            self.redraw(transform);
        }
    }

    /// Renders the current transform right away, bypassing the
    /// throttle.
    pub fn render_now(&mut self, now: Instant) -> &Frame {
        self.throttle.mark_redrawn(now);
        let projection = self.view.projection();
        let frame = render::render_frame(
            &self.result,
            &self.layout,
            &self.roots,
            projection,
            &self.config,
        );
        self.frame.insert(frame)
    }

    /// Applies a view command directly. Returns `false` if it was
    /// rejected.
    pub fn apply(&mut self, now: Instant, cmd: ViewCmd) -> bool {
        let applied = cmd.apply(&self.result, &mut self.view);
        if applied {
            self.request_redraw(now);
        }
        applied
    }

    /// Handles queued messages and fires a due deferred redraw.
    pub fn poll(&mut self, now: Instant) {
        while let Ok(msg) = self.msg_rx.try_recv() {
            match msg {
                Msg::View(cmd) => {
                    self.apply(now, cmd);
                }
            }
        }

        if let Some(transform) = self.throttle.poll(now) {
            self.redraw(transform);
        }
    }

    /// Single entry point for pointer input. Returns `true` if the
    /// event was consumed.
    pub fn handle_event(&mut self, now: Instant, event: &InputEvent) -> bool {
        match *event {
            InputEvent::PointerDown { pos } => {
                let hit = self.hit_test(pos);
                self.selection.press(hit);
                self.drag_origin = Some(pos);
            }
            InputEvent::PointerMove { pos } => {
                if let Some(origin) = self.drag_origin {
                    self.drag_origin = Some(pos);
                    self.view.translate((pos.x - origin.x) as f64);
                    self.request_redraw(now);
                } else {
                    let hit = self.hit_test(pos);
                    self.selection.hover(hit);
                }
            }
            InputEvent::PointerUp { .. } => {
                self.drag_origin = None;
            }
            InputEvent::Wheel { pos, delta } => {
                let exp = -(delta as f64) * self.config.wheel_sensitivity;
                self.view.zoom_with_focus(pos.x as f64, 2f64.powf(exp));
                self.request_redraw(now);
            }
            InputEvent::Leave { .. } => {
                self.drag_origin = None;
                self.selection.leave();
            }
        }
        true
    }

    pub fn resize_surface(&mut self, now: Instant, dims: [u32; 2]) -> Result<()> {
        if dims[0] == 0 || dims[1] == 0 {
            anyhow::bail!("cannot resize viewer to {}x{}", dims[0], dims[1]);
        }
        self.view.resize(dims);
        self.request_redraw(now);
        Ok(())
    }
}

impl AppWindow for Viewer1D {
    fn update(&mut self, now: Instant) {
        self.poll(now);
    }

    fn on_event(&mut self, now: Instant, event: &InputEvent) -> bool {
        self.handle_event(now, event)
    }

    fn resize(
        &mut self,
        now: Instant,
        old_window_dims: [u32; 2],
        new_window_dims: [u32; 2],
    ) -> Result<()> {
        log::debug!("resize {old_window_dims:?} -> {new_window_dims:?}");
        self.resize_surface(now, new_window_dims)
    }

    fn render(&mut self, now: Instant) -> Result<()> {
        self.render_now(now);
        Ok(())
    }
}

/// Reads and parses `args.annotations` and sets up a viewer for it,
/// applying the initial range if one was given.
pub fn init(args: &Args, config: Config) -> Result<Viewer1D> {
    let text = std::fs::read_to_string(&args.annotations)?;
    let file_name = args.annotations.to_string_lossy();
    let result = annoview_core::parse_annotations(&text, &file_name)?;

    let mut viewer = Viewer1D::new(Arc::new(result), config, args.dims);

    if let Some(range) = args.init_range.as_deref() {
        let Some((seqid, range)) = parse_pos_range(range) else {
            anyhow::bail!("invalid range `{range}`, expected `[seqid:]start-end`");
        };
        let now = Instant::now();
        if !viewer.apply(now, ViewCmd::GotoRange { seqid, range }) {
            anyhow::bail!("range refers to an unknown sequence");
        }
    }

    Ok(viewer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use annoview_core::{parse_annotations, Bp, FeatureId};
    use std::time::Duration;

    const BRCA1: &str = "\
##gff-version 3
chr1\tRefSeq\tgene\t1000\t9000\t.\t+\t.\tID=gene001;Name=BRCA1
chr1\tRefSeq\tmRNA\t1000\t9000\t.\t+\t.\tID=rna001;Parent=gene001
chr1\tRefSeq\texon\t1000\t2000\t.\t+\t.\tID=exon001;Parent=rna001
chr1\tRefSeq\texon\t6000\t9000\t.\t+\t.\tID=exon002;Parent=rna001
";

    fn viewer(text: &str, width: u32) -> Viewer1D {
        let result = parse_annotations(text, "test.gff").unwrap();
        Viewer1D::new(Arc::new(result), Config::default(), [width, 200])
    }

    fn pos(x: f32, y: f32) -> Vec2 {
        Vec2::new(x, y)
    }

    #[test]
    fn hover_and_pin() {
        let mut v = viewer(BRCA1, 800);
        let now = Instant::now();
        v.render_now(now);

        v.handle_event(now, &InputEvent::PointerMove { pos: pos(50.0, 18.0) });
        let payload = v.display_payload().unwrap();
        assert_eq!(payload.name, "exon001");

        v.handle_event(now, &InputEvent::PointerDown { pos: pos(50.0, 6.0) });
        v.handle_event(now, &InputEvent::PointerUp { pos: pos(50.0, 6.0) });
        assert_eq!(v.display_payload().unwrap().name, "BRCA1");

        // hovering elsewhere keeps the pin
        v.handle_event(now, &InputEvent::PointerMove { pos: pos(50.0, 18.0) });
        assert_eq!(v.selection().hovered(), Some(FeatureId(2)));
        assert_eq!(v.display_payload().unwrap().name, "BRCA1");

        v.handle_event(now, &InputEvent::Leave { pos: pos(900.0, 18.0) });
        assert_eq!(v.display_payload().unwrap().name, "BRCA1");

        // press on the background clears the pin
        v.handle_event(now, &InputEvent::PointerDown { pos: pos(50.0, 30.0) });
        v.handle_event(now, &InputEvent::PointerUp { pos: pos(50.0, 30.0) });
        assert!(v.display_payload().is_none());
    }

    #[test]
    fn dismiss_pinned_falls_back_to_hover() {
        let mut v = viewer(BRCA1, 800);
        let now = Instant::now();
        v.render_now(now);

        v.handle_event(now, &InputEvent::PointerDown { pos: pos(50.0, 6.0) });
        v.handle_event(now, &InputEvent::PointerUp { pos: pos(50.0, 6.0) });
        v.handle_event(now, &InputEvent::PointerMove { pos: pos(300.0, 18.0) });

        v.dismiss_pinned();
        assert_eq!(v.display_payload().unwrap().id, FeatureId(1));
    }

    #[test]
    fn wheel_burst_renders_last_transform() {
        let mut v = viewer(BRCA1, 800);
        let t0 = Instant::now();

        for i in 0..5u64 {
            let now = t0 + Duration::from_millis(i * 2);
            v.handle_event(
                now,
                &InputEvent::Wheel {
                    pos: pos(400.0, 10.0),
                    delta: -100.0,
                },
            );
            v.poll(now);
        }

        let first = v.frame().unwrap().transform;
        assert!(first.scale < v.view().transform().scale);

        v.poll(t0 + Duration::from_millis(15));
        assert_eq!(v.frame().unwrap().transform, first);

        v.poll(t0 + Duration::from_millis(16));
        assert_eq!(v.frame().unwrap().transform, v.view().transform());
    }

    #[test]
    fn drag_pans() {
        let mut v = viewer(BRCA1, 800);
        let now = Instant::now();

        v.apply(now, ViewCmd::GotoRange {
            seqid: None,
            range: Bp(4000)..Bp(5999),
        });
        let before = v.view().window();

        v.handle_event(now, &InputEvent::PointerDown { pos: pos(400.0, 100.0) });
        v.handle_event(now, &InputEvent::PointerMove { pos: pos(300.0, 100.0) });
        v.handle_event(now, &InputEvent::PointerUp { pos: pos(300.0, 100.0) });

        let after = v.view().window();
        // content moved left, the window moved right by 100 px worth
        let bp_per_px = before.len() / 800.0;
        assert!((after.start - before.start - 100.0 * bp_per_px).abs() < 1e-6);
        assert!((after.len() - before.len()).abs() < 1e-6);
    }

    #[test]
    fn messages_are_applied_on_poll() {
        let mut v = viewer(BRCA1, 800);
        let tx = v.msg_sender();
        let now = Instant::now();

        tx.send(Msg::View(ViewCmd::GotoRange {
            seqid: Some("chr1".to_string()),
            range: Bp(6000)..Bp(9000),
        }))
        .unwrap();
        assert_eq!(v.view().transform().scale, 1.0);

        v.poll(now);
        let window = v.view().window();
        assert!((window.start - 6000.0).abs() < 1e-6);

        let frame = v.frame().unwrap();
        // exon001 lies outside the padded window
        assert_eq!(frame.visibility(FeatureId(2)), Some(Visibility::Invisible));

        tx.send(Msg::View(ViewCmd::Reset)).unwrap();
        v.poll(now + Duration::from_millis(20));
        assert_eq!(v.frame().unwrap().transform.scale, 1.0);
    }

    #[test]
    fn zero_size_is_rejected() {
        let mut v = viewer(BRCA1, 800);
        let now = Instant::now();

        assert!(v.resize(now, [800, 200], [0, 200]).is_err());
        assert!(v.resize(now, [800, 200], [400, 200]).is_ok());
        assert_eq!(v.view().dims()[0], 400.0);
    }
}
