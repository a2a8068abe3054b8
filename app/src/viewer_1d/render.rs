use std::collections::HashMap;

use rstar::{
    primitives::{GeomWithData, Line, Rectangle},
    RTree, AABB,
};
use ultraviolet::Vec2;

use annoview_core::annotations::Strand;
use annoview_core::{Feature, FeatureId, ParseResult, TrackLayout};

use super::config::Config;
use super::view::{Projection, Transform, Window};

type RootTreeObj = GeomWithData<Line<(i64, i64)>, FeatureId>;
type HitTreeObj = GeomWithData<Rectangle<[f32; 2]>, usize>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// A gene, transcript or other non-block feature. Points from
    /// `from` to `to` in the direction of the strand.
    Arrow { from: Vec2, to: Vec2, strand: Strand },
    /// An exon, CDS or UTR.
    Block { min: Vec2, max: Vec2 },
    /// The gap between two consecutive blocks of the same parent.
    Line { from: Vec2, to: Vec2 },
}

impl Shape {
    fn bounds(&self) -> (Vec2, Vec2) {
        match *self {
            Shape::Arrow { from, to, .. } | Shape::Line { from, to } => {
                (from.min_by_component(to), from.max_by_component(to))
            }
            Shape::Block { min, max } => (min, max),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawPrimitive {
    /// The feature drawn; intron lines carry their parent.
    pub feature: FeatureId,
    pub lane: usize,
    pub shape: Shape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Outside the padded window; neither it nor its children are drawn.
    Invisible,
    /// Drawn, but some children were too narrow to draw.
    VisibleCulledChildren,
    VisibleFull,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RenderStats {
    /// Features found outside the padded window: roots the index leaves
    /// out plus children rejected while walking a drawn parent. The
    /// descendants of an invisible feature are never visited, so they are
    /// not counted.
    pub invisible: usize,
    pub visible_culled_children: usize,
    pub visible_full: usize,
    /// Features skipped for being narrower than the pixel threshold.
    pub sub_pixel: usize,
    pub primitives: usize,
}

fn to_i64(bp: u64) -> i64 {
    i64::try_from(bp).unwrap_or(i64::MAX)
}

/// R-tree over the spans of the root features, built once per parse.
#[derive(Debug, Clone)]
pub struct RootIndex {
    tree: RTree<RootTreeObj>,
}

impl RootIndex {
    pub fn new(result: &ParseResult) -> Self {
        let objs = result
            .root_features()
            .map(|(id, f)| {
                let geom = Line::new((to_i64(f.start.0), 0), (to_i64(f.end.0), 0));
                GeomWithData::new(geom, id)
            })
            .collect::<Vec<_>>();

        Self {
            tree: RTree::bulk_load(objs),
        }
    }

    /// Roots whose span may touch `window`, in file order.
    pub fn roots_in(&self, window: &Window) -> Vec<FeatureId> {
        let left = window.start.floor() as i64;
        let right = window.end.ceil() as i64;
        let aabb = AABB::from_corners((left, 0), (right, 0));

        let mut roots = self
            .tree
            .locate_in_envelope_intersecting(&aabb)
            .map(|obj| obj.data)
            .collect::<Vec<_>>();
        roots.sort();
        roots
    }
}

/// The output of one redraw.
#[derive(Debug, Clone)]
pub struct Frame {
    pub transform: Transform,
    pub window: Window,
    pub primitives: Vec<DrawPrimitive>,
    pub stats: RenderStats,
    /// `true` if the primitive limit cut this frame short.
    pub capped: bool,
    pub visibility: HashMap<FeatureId, Visibility>,
    hits: RTree<HitTreeObj>,
}

impl Frame {
    /// The feature drawn topmost at `pos`, if any.
    pub fn hit_test(&self, pos: Vec2) -> Option<FeatureId> {
        let ix = self
            .hits
            .locate_all_at_point(&[pos.x, pos.y])
            .map(|obj| obj.data)
            .max()?;
        self.primitives.get(ix).map(|p| p.feature)
    }

    pub fn visibility(&self, id: FeatureId) -> Option<Visibility> {
        self.visibility.get(&id).copied()
    }
}

struct FrameBuilder<'a> {
    result: &'a ParseResult,
    projection: Projection,
    config: &'a Config,
    padded: Window,
    // surface x range matching `padded`
    x_range: (f64, f64),

    primitives: Vec<DrawPrimitive>,
    hit_objs: Vec<HitTreeObj>,
    visibility: HashMap<FeatureId, Visibility>,
    stats: RenderStats,
    capped: bool,
}

impl<'a> FrameBuilder<'a> {
    fn new(
        result: &'a ParseResult,
        projection: Projection,
        config: &'a Config,
    ) -> Self {
        let padded = projection.window().padded(config.padding_fraction);
        let pad_px = projection.width() * config.padding_fraction;

        Self {
            result,
            projection,
            config,
            padded,
            x_range: (-pad_px, projection.width() + pad_px),

            primitives: Vec::new(),
            hit_objs: Vec::new(),
            visibility: HashMap::new(),
            stats: RenderStats::default(),
            capped: false,
        }
    }

    fn clip_x(&self, x: f64) -> f32 {
        x.clamp(self.x_range.0, self.x_range.1) as f32
    }

    fn row_top(&self, lane: usize, row: usize) -> f32 {
        let cfg = self.config;
        let lane_top = lane as f32 * (cfg.lane_height + cfg.lane_gap);
        lane_top + row as f32 * cfg.row_height()
    }

    fn is_sub_pixel(&self, feature: &Feature) -> bool {
        let (x0, x1) = self.projection.span_to_x(feature.start, feature.end);
        x1 - x0 < self.config.min_feature_px
    }

    /// Returns `false` once the primitive limit is reached.
    fn push(&mut self, feature: FeatureId, lane: usize, shape: Shape) -> bool {
        if self.primitives.len() >= self.config.max_primitives {
            self.capped = true;
            return false;
        }

        let slop = Vec2::broadcast(self.config.hit_slop);
        let (min, max) = shape.bounds();
        let (min, max) = (min - slop, max + slop);
        let rect = Rectangle::from_corners([min.x, min.y], [max.x, max.y]);
        self.hit_objs
            .push(GeomWithData::new(rect, self.primitives.len()));

        self.primitives.push(DrawPrimitive {
            feature,
            lane,
            shape,
        });
        true
    }

    /// Draws `root` and its subtree, pre-order with children in file
    /// order. Returns `false` if the frame was capped.
    fn draw_subtree(&mut self, root: FeatureId, lane: usize) -> bool {
        let result = self.result;
        let max_row = self.config.rows_per_lane.saturating_sub(1);

        let mut stack = vec![(root, 0usize)];

        while let Some((id, depth)) = stack.pop() {
            let Some(feature) = result.get(id) else {
                continue;
            };

            if !self.padded.intersects(feature.start, feature.end) {
                self.visibility.insert(id, Visibility::Invisible);
                self.stats.invisible += 1;
                continue;
            }

            if self.is_sub_pixel(feature) {
                self.stats.sub_pixel += 1;
                if let Some(parent) = feature.parent {
                    self.visibility
                        .insert(parent, Visibility::VisibleCulledChildren);
                }
                continue;
            }

            let is_block = feature.kind().is_block();
            let row = if is_block {
                depth.saturating_sub(1).min(max_row)
            } else {
                depth.min(max_row)
            };

            let shape = self.feature_shape(feature, lane, row);
            if !self.push(id, lane, shape) {
                return false;
            }
            self.visibility.entry(id).or_insert(Visibility::VisibleFull);

            // block children sit on this feature's row
            let block_row = depth.min(max_row);
            if !self.draw_gaps(id, feature, lane, block_row) {
                return false;
            }

            stack.extend(
                feature.children.iter().rev().map(|&c| (c, depth + 1)),
            );
        }

        true
    }

    fn feature_shape(&self, feature: &Feature, lane: usize, row: usize) -> Shape {
        let (x0, x1) = self.projection.span_to_x(feature.start, feature.end);
        let (x0, x1) = (self.clip_x(x0), self.clip_x(x1));

        let top = self.row_top(lane, row);
        let h = self.config.row_height();

        if feature.kind().is_block() {
            Shape::Block {
                min: Vec2::new(x0, top + h * 0.15),
                max: Vec2::new(x1, top + h * 0.85),
            }
        } else {
            let mid = top + h * 0.5;
            let (from, to) = match feature.strand {
                Strand::Reverse => (x1, x0),
                _ => (x0, x1),
            };
            Shape::Arrow {
                from: Vec2::new(from, mid),
                to: Vec2::new(to, mid),
                strand: feature.strand,
            }
        }
    }

    /// Lines between consecutive drawable block children of `parent`.
    fn draw_gaps(
        &mut self,
        parent: FeatureId,
        feature: &Feature,
        lane: usize,
        row: usize,
    ) -> bool {
        let result = self.result;

        let mut blocks = feature
            .children
            .iter()
            .filter_map(|&c| result.get(c))
            .filter(|c| {
                c.kind().is_block()
                    && self.padded.intersects(c.start, c.end)
                    && !self.is_sub_pixel(c)
            })
            .map(|c| (c.start.0, c.end.0))
            .collect::<Vec<_>>();

        if blocks.len() < 2 {
            return true;
        }
        blocks.sort_by_key(|&(start, _)| start);

        let mid = self.row_top(lane, row) + self.config.row_height() * 0.5;

        let mut covered_to = blocks[0].1;
        for &(start, end) in &blocks[1..] {
            if start > covered_to + 1 {
                let x0 = self.clip_x(self.projection.bp_to_x((covered_to + 1) as f64));
                let x1 = self.clip_x(self.projection.bp_to_x(start as f64));

                if x1 > x0 {
                    let shape = Shape::Line {
                        from: Vec2::new(x0, mid),
                        to: Vec2::new(x1, mid),
                    };
                    if !self.push(parent, lane, shape) {
                        return false;
                    }
                }
            }
            covered_to = covered_to.max(end);
        }

        true
    }

    fn finish(mut self) -> Frame {
        for state in self.visibility.values() {
            match state {
                Visibility::Invisible => (),
                Visibility::VisibleCulledChildren => {
                    self.stats.visible_culled_children += 1
                }
                Visibility::VisibleFull => self.stats.visible_full += 1,
            }
        }
        self.stats.primitives = self.primitives.len();

        Frame {
            transform: self.projection.transform(),
            window: self.projection.window(),
            primitives: self.primitives,
            stats: self.stats,
            capped: self.capped,
            visibility: self.visibility,
            hits: RTree::bulk_load(self.hit_objs),
        }
    }
}

/// Builds the primitives for one frame. Lanes are drawn in order, roots
/// within a lane in placement order.
pub fn render_frame(
    result: &ParseResult,
    layout: &TrackLayout,
    roots: &RootIndex,
    projection: Projection,
    config: &Config,
) -> Frame {
    let mut builder = FrameBuilder::new(result, projection, config);

    let candidates = roots.roots_in(&builder.padded);
    builder.stats.invisible = result.roots.len().saturating_sub(candidates.len());

    'lanes: for (lane_ix, lane) in layout.lanes().iter().enumerate() {
        for &root in lane.features() {
            if candidates.binary_search(&root).is_err() {
                continue;
            }
            if !builder.draw_subtree(root, lane_ix) {
                log::debug!(
                    "frame capped at {} primitives",
                    config.max_primitives
                );
                break 'lanes;
            }
        }
    }

    let frame = builder.finish();

    log::debug!(
        "rendered {} primitives, {} visible, {} invisible",
        frame.stats.primitives,
        frame.stats.visible_full + frame.stats.visible_culled_children,
        frame.stats.invisible
    );

    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewer_1d::view::ViewportState;
    use annoview_core::{parse_annotations, Bp};

    const BRCA1: &str = "\
##gff-version 3
chr1\tRefSeq\tgene\t1000\t9000\t.\t+\t.\tID=gene001;Name=BRCA1
chr1\tRefSeq\tmRNA\t1000\t9000\t.\t+\t.\tID=rna001;Parent=gene001
chr1\tRefSeq\texon\t1000\t2000\t.\t+\t.\tID=exon001;Parent=rna001
chr1\tRefSeq\texon\t6000\t9000\t.\t+\t.\tID=exon002;Parent=rna001
";

    struct Fixture {
        result: ParseResult,
        layout: TrackLayout,
        roots: RootIndex,
        view: ViewportState,
    }

    fn fixture(text: &str, width: u32) -> Fixture {
        let result = parse_annotations(text, "test.gff").unwrap();
        let layout = TrackLayout::build(&result);
        let roots = RootIndex::new(&result);
        let view = ViewportState::new(result.extent, [width, 200], 1_000.0);
        Fixture {
            result,
            layout,
            roots,
            view,
        }
    }

    impl Fixture {
        fn render(&self, config: &Config) -> Frame {
            render_frame(
                &self.result,
                &self.layout,
                &self.roots,
                self.view.projection(),
                config,
            )
        }
    }

    fn count(frame: &Frame, f: impl Fn(&Shape) -> bool) -> usize {
        frame.primitives.iter().filter(|p| f(&p.shape)).count()
    }

    #[test]
    fn brca1_gene_model() {
        let fx = fixture(BRCA1, 800);
        let frame = fx.render(&Config::default());

        let blocks = count(&frame, |s| matches!(s, Shape::Block { .. }));
        let lines = count(&frame, |s| matches!(s, Shape::Line { .. }));
        let arrows = count(&frame, |s| matches!(s, Shape::Arrow { .. }));

        assert_eq!(blocks, 2);
        assert_eq!(lines, 1);
        assert_eq!(arrows, 2);
        assert!(!frame.capped);

        let line = frame
            .primitives
            .iter()
            .find(|p| matches!(p.shape, Shape::Line { .. }))
            .unwrap();
        assert_eq!(line.feature, FeatureId(1));
        assert!(frame.primitives.iter().all(|p| p.lane == 0));

        assert_eq!(frame.stats.visible_full, 4);
        assert_eq!(frame.stats.invisible, 0);
        assert_eq!(frame.visibility(FeatureId(0)), Some(Visibility::VisibleFull));
    }

    #[test]
    fn brca1_hit_test() {
        let fx = fixture(BRCA1, 800);
        let frame = fx.render(&Config::default());

        // rows are 12 px; exon001 spans x 0..~100 on row 1
        assert_eq!(frame.hit_test(Vec2::new(50.0, 18.0)), Some(FeatureId(2)));
        // the intron line belongs to the transcript
        assert_eq!(frame.hit_test(Vec2::new(300.0, 18.0)), Some(FeatureId(1)));
        assert_eq!(frame.hit_test(Vec2::new(50.0, 6.0)), Some(FeatureId(0)));
        assert_eq!(frame.hit_test(Vec2::new(50.0, 30.0)), None);
    }

    #[test]
    fn arrows_follow_strand() {
        let fx = fixture("chr1\t.\tgene\t1\t100\t.\t-\t.\tID=g", 100);
        let frame = fx.render(&Config::default());

        match frame.primitives[0].shape {
            Shape::Arrow { from, to, strand } => {
                assert_eq!(strand, Strand::Reverse);
                assert!(from.x > to.x);
            }
            other => panic!("unexpected shape {other:?}"),
        }
    }

    #[test]
    fn zoomed_in_culls_distant_roots() {
        let text = (0..10)
            .map(|i| {
                let s = i * 10_000 + 1;
                format!("chr1\t.\tgene\t{s}\t{}\t.\t+\t.\tID=g{i}", s + 999)
            })
            .collect::<Vec<_>>()
            .join("\n");
        let mut fx = fixture(&text, 1000);
        fx.view.goto_range(Bp(40_001)..Bp(41_000));

        let frame = fx.render(&Config::default());
        let drawn = frame.primitives.iter().map(|p| p.feature).collect::<Vec<_>>();

        assert_eq!(drawn, vec![FeatureId(4)]);
        assert_eq!(frame.stats.invisible, 9);
    }

    #[test]
    fn primitive_cap() {
        let text = (0..50)
            .map(|i| format!("chr1\t.\tgene\t{}\t{}\t.\t+\t.\tID=g{i}", i * 100 + 1, i * 100 + 80))
            .collect::<Vec<_>>()
            .join("\n");
        let fx = fixture(&text, 5000);

        let config = Config {
            max_primitives: 10,
            ..Config::default()
        };
        let frame = fx.render(&config);

        assert!(frame.capped);
        assert_eq!(frame.primitives.len(), 10);
        assert_eq!(frame.stats.primitives, 10);

        let frame = fx.render(&Config::default());
        assert!(!frame.capped);
        assert_eq!(frame.primitives.len(), 50);
    }

    #[test]
    fn sub_pixel_children_are_skipped() {
        let text = "\
chr1\t.\tgene\t1\t1000000\t.\t+\t.\tID=g
chr1\t.\tmRNA\t1\t1000000\t.\t+\t.\tID=t;Parent=g
chr1\t.\texon\t500\t500\t.\t+\t.\tID=e1;Parent=t
chr1\t.\texon\t600000\t1000000\t.\t+\t.\tID=e2;Parent=t
";
        let fx = fixture(text, 1000);
        let frame = fx.render(&Config::default());

        assert_eq!(frame.stats.sub_pixel, 1);
        assert_eq!(
            frame.visibility(FeatureId(1)),
            Some(Visibility::VisibleCulledChildren)
        );
        assert_eq!(frame.visibility(FeatureId(2)), None);
        assert!(frame.primitives.iter().all(|p| p.feature != FeatureId(2)));
        // a single drawable block leaves no gap to draw
        assert_eq!(count(&frame, |s| matches!(s, Shape::Line { .. })), 0);
        assert_eq!(frame.stats.visible_culled_children, 1);
    }

    #[test]
    fn invisible_counts_top_of_skipped_subtree() {
        let text = "\
chr1\t.\tgene\t1\t1000\t.\t+\t.\tID=g
chr1\t.\tmRNA\t5000\t6000\t.\t+\t.\tID=t;Parent=g
chr1\t.\texon\t5100\t5200\t.\t+\t.\tID=e;Parent=t
chr1\t.\tgene\t90000\t91000\t.\t+\t.\tID=far
chr1\t.\tmRNA\t90100\t90200\t.\t+\t.\tID=far_t;Parent=far
";
        let mut fx = fixture(text, 1000);
        fx.view.goto_range(Bp(1)..Bp(1000));
        let frame = fx.render(&Config::default());

        // the far root and the stray transcript; nothing below them
        assert_eq!(frame.stats.invisible, 2);
        assert_eq!(frame.visibility(FeatureId(0)), Some(Visibility::VisibleFull));
        assert_eq!(frame.visibility(FeatureId(1)), Some(Visibility::Invisible));
        assert_eq!(frame.visibility(FeatureId(2)), None);
        assert_eq!(frame.visibility(FeatureId(4)), None);
    }

    #[test]
    fn overlapping_blocks_share_a_gap() {
        let text = "\
chr1\t.\tmRNA\t1\t1000\t.\t+\t.\tID=t
chr1\t.\texon\t1\t200\t.\t+\t.\tParent=t
chr1\t.\tCDS\t50\t300\t.\t+\t0\tParent=t
chr1\t.\texon\t800\t1000\t.\t+\t.\tParent=t
";
        let fx = fixture(text, 1000);
        let frame = fx.render(&Config::default());

        let lines = frame
            .primitives
            .iter()
            .filter_map(|p| match p.shape {
                Shape::Line { from, to } => Some((from.x, to.x)),
                _ => None,
            })
            .collect::<Vec<_>>();

        assert_eq!(lines.len(), 1);
        assert!((lines[0].0 - 300.0).abs() < 1e-3);
        assert!((lines[0].1 - 799.0).abs() < 1e-3);
    }
}
