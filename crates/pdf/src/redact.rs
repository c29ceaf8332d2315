//! Background redaction: erases every accepted span from a working copy of
//! the document so the remaining page renders without text.
//!
//! Text-showing operators that land on a region are switched to an invisible
//! render mode (the operator stays for its advance, so later text on the line
//! keeps its position), and paths that fit entirely inside a region are
//! dropped. Form XObjects are followed; a form that needs changes is written
//! to a fresh copy referenced only by the page being cleaned. Image XObjects,
//! inline images and shadings are left alone.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use thiserror::Error;

use pagedeck_core::geometry::Rect;
use pagedeck_core::report::{ConversionReport, Stage};
use pagedeck_core::span::PageSpans;

use crate::fonts::{FontMetrics, FontTable};
use crate::scan::{split_inline_images, Segment};
use crate::utils::{
    get_number, get_page_box, get_page_content, get_stream_content, inherited_attribute, resolve, resolve_dict,
    set_page_content, PageBox,
};

type Matrix = [f32; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Glyph box relative to the baseline, in units of font size.
const ASCENT: f32 = 0.8;
const DESCENT: f32 = -0.2;

/// Slack when testing whether a path fits inside a region.
const CONTAINMENT_TOLERANCE: f32 = 0.01;

/// Text render modes: 3 draws nothing, 7 only adds to the clip path.
const RENDER_INVISIBLE: i64 = 3;
const RENDER_CLIP_ONLY: i64 = 7;

/// Deepest chain of forms drawing forms that is followed.
const MAX_FORM_DEPTH: usize = 16;

#[derive(Debug, Error)]
pub enum RedactError {
    #[error("cannot read page content: {0}")]
    Content(String),
    #[error("cannot decode content stream: {0}")]
    Decode(String),
    #[error("cannot encode content stream: {0}")]
    Encode(String),
}

/// A span box grown by the redaction margin, in displayed page space (y down).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RedactionRegion {
    pub rect: Rect,
}

impl RedactionRegion {
    pub fn around(bbox: &Rect, margin: f32) -> Self {
        Self {
            rect: bbox.expand(margin),
        }
    }

    /// Same region in PDF user space (y up, unrotated, offset by the page box origin).
    fn to_user_space(self, page_box: &PageBox) -> Rect {
        page_box.rect_to_user(&self.rect)
    }
}

/// One region per accepted span of the page.
pub fn regions_for_page(page: &PageSpans, margin: f32) -> Vec<RedactionRegion> {
    page.spans
        .iter()
        .map(|span| RedactionRegion::around(&span.bbox, margin))
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RedactionStats {
    pub text_ops: usize,
    pub paths: usize,
    /// Form XObjects replaced by a cleaned copy.
    pub forms: usize,
    /// Form XObjects that could not be decoded and keep their text.
    pub unreadable_forms: usize,
}

impl RedactionStats {
    fn changed(&self) -> bool {
        self.text_ops + self.paths + self.forms > 0
    }

    fn merge(&mut self, other: RedactionStats) {
        self.text_ops += other.text_ops;
        self.paths += other.paths;
        self.forms += other.forms;
        self.unreadable_forms += other.unreadable_forms;
    }
}

/// Builds the text-free working copy of `original`.
///
/// `pages[i]` holds the accepted spans of page `i`. A page whose content
/// cannot be rewritten is replaced by a blank page of the same size, so the
/// copy always has as many pages as the original.
pub fn build_clean_document(
    original: &Document,
    pages: &[PageSpans],
    margin: f32,
    report: &mut ConversionReport,
) -> Document {
    let mut working = original.clone();
    let page_ids: Vec<ObjectId> = working.get_pages().into_values().collect();

    for (index, page_id) in page_ids.into_iter().enumerate() {
        strip_annotations(&mut working, page_id);

        let regions = pages
            .get(index)
            .map(|page| regions_for_page(page, margin))
            .unwrap_or_default();

        match redact_page(&mut working, page_id, &regions) {
            Ok(stats) => {
                log::debug!(
                    "[Redact] page {}: {} regions, {} text ops hidden, {} paths removed, {} forms copied",
                    index + 1,
                    regions.len(),
                    stats.text_ops,
                    stats.paths,
                    stats.forms
                );
                if stats.unreadable_forms > 0 {
                    report.warn_page(
                        Stage::Redact,
                        index,
                        format!("{} form XObjects could not be decoded and keep their text", stats.unreadable_forms),
                    );
                }
            }
            Err(e) => {
                report.warn_page(Stage::Redact, index, format!("{}; page replaced by a blank page", e));
                if let Err(e) = set_page_content(&mut working, page_id, Vec::new()) {
                    report.warn_page(Stage::Redact, index, format!("cannot blank page: {}", e));
                }
            }
        }
    }

    working
}

/// Applies all regions of one page in a single pass over its content and the
/// forms it draws.
pub fn redact_page(
    doc: &mut Document,
    page_id: ObjectId,
    regions: &[RedactionRegion],
) -> Result<RedactionStats, RedactError> {
    if regions.is_empty() {
        return Ok(RedactionStats::default());
    }

    let page_box = get_page_box(doc, page_id);
    let user_regions: Vec<Rect> = regions.iter().map(|r| r.to_user_space(&page_box)).collect();

    let resources = inherited_attribute(doc, page_id, b"Resources")
        .and_then(|o| resolve_dict(doc, o))
        .cloned()
        .unwrap_or_default();
    let content_data = get_page_content(doc, page_id).map_err(RedactError::Content)?;
    let redacted = redact_stream(
        doc,
        &content_data,
        &resources,
        GraphicsState::default(),
        &user_regions,
        0,
    )?;

    set_page_content(doc, page_id, redacted.content).map_err(RedactError::Content)?;
    if !redacted.replaced.is_empty() {
        let resources = with_xobjects(doc, &resources, &redacted.replaced);
        match doc.get_object_mut(page_id) {
            Ok(Object::Dictionary(dict)) => dict.set("Resources", Object::Dictionary(resources)),
            _ => return Err(RedactError::Content(format!("page {:?} is not a dictionary", page_id))),
        }
    }
    Ok(redacted.stats)
}

/// Links and annotation appearances would otherwise be painted back on the background.
fn strip_annotations(doc: &mut Document, page_id: ObjectId) {
    if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(page_id) {
        if dict.remove(b"Annots").is_some() {
            log::debug!("[Redact] dropped annotations of page {:?}", page_id);
        }
    }
}

/// A rewritten content stream, with the forms it now draws under new names.
struct RedactedStream {
    content: Vec<u8>,
    stats: RedactionStats,
    replaced: Vec<(Vec<u8>, ObjectId)>,
}

/// Parses one operator run, refusing a parse that stopped early.
fn decode_operations(data: &[u8], expected: usize) -> Result<Vec<Operation>, RedactError> {
    let content = Content::decode(data).map_err(|e| RedactError::Decode(e.to_string()))?;
    if content.operations.len() < expected {
        return Err(RedactError::Decode(format!(
            "only {} of {} operators could be parsed",
            content.operations.len(),
            expected
        )));
    }
    Ok(content.operations)
}

/// Rewrites one content stream (a page's or a form's) against regions in user space.
fn redact_stream(
    doc: &mut Document,
    data: &[u8],
    resources: &Dictionary,
    state: GraphicsState,
    regions: &[Rect],
    depth: usize,
) -> Result<RedactedStream, RedactError> {
    let fonts = FontTable::from_resources(doc, resources);
    let xobjects = resources
        .get(b"XObject")
        .ok()
        .and_then(|o| resolve_dict(doc, o))
        .cloned()
        .unwrap_or_default();

    let mut walker = ContentWalker::new(regions, &fonts, state);
    let mut content = Vec::with_capacity(data.len());
    let mut replaced: Vec<(Vec<u8>, ObjectId)> = Vec::new();

    for segment in split_inline_images(data) {
        let operations = match segment {
            Segment::InlineImage(image) => {
                content.extend_from_slice(image);
                content.push(b'\n');
                continue;
            }
            Segment::Operators { data, operators } => decode_operations(data, operators)?,
        };

        for op in operations {
            walker.step(op);
        }
        walker.flush_path();

        let mut output = std::mem::take(&mut walker.output);
        for call in std::mem::take(&mut walker.calls) {
            let Some(form_id) = xobjects.get(&call.name).ok().and_then(|o| o.as_reference().ok()) else {
                continue;
            };
            match redact_form(doc, form_id, resources, call.state, regions, depth + 1) {
                Ok((clone, stats)) => {
                    walker.stats.merge(stats);
                    if let Some(clone_id) = clone {
                        let name = fresh_name(&xobjects, &replaced, &call.name);
                        if let Some(op) = output.get_mut(call.op_index) {
                            op.operands = vec![Object::Name(name.clone())];
                        }
                        replaced.push((name, clone_id));
                        walker.stats.forms += 1;
                    }
                }
                Err(e) => {
                    log::warn!(
                        "[Redact] form /{} left as is: {}",
                        String::from_utf8_lossy(&call.name),
                        e
                    );
                    walker.stats.unreadable_forms += 1;
                }
            }
        }

        let encoded = Content { operations: output }
            .encode()
            .map_err(|e| RedactError::Encode(e.to_string()))?;
        content.extend(encoded);
        content.push(b'\n');
    }

    Ok(RedactedStream {
        content,
        stats: walker.stats,
        replaced,
    })
}

fn is_form(stream: &Stream) -> bool {
    stream.dict.get(b"Subtype").ok().and_then(|o| o.as_name().ok()) == Some(b"Form".as_slice())
}

/// Redacts a form drawn with `state`; returns the id of a cleaned copy when
/// anything in it changed. The original form object is never modified.
fn redact_form(
    doc: &mut Document,
    form_id: ObjectId,
    parent_resources: &Dictionary,
    state: GraphicsState,
    regions: &[Rect],
    depth: usize,
) -> Result<(Option<ObjectId>, RedactionStats), RedactError> {
    if depth > MAX_FORM_DEPTH {
        log::debug!("[Redact] form {:?} nested too deep, skipped", form_id);
        return Ok((None, RedactionStats::default()));
    }
    let form = match doc.get_object(form_id) {
        Ok(Object::Stream(stream)) if is_form(stream) => stream.clone(),
        _ => return Ok((None, RedactionStats::default())),
    };

    let matrix = form
        .dict
        .get(b"Matrix")
        .ok()
        .and_then(|o| resolve(doc, o))
        .and_then(|o| o.as_array().ok())
        .and_then(|values| matrix_operand(values))
        .unwrap_or(IDENTITY);
    let resources = form
        .dict
        .get(b"Resources")
        .ok()
        .and_then(|o| resolve_dict(doc, o))
        .cloned()
        .unwrap_or_else(|| parent_resources.clone());

    let ctm = multiply(&matrix, &state.ctm);
    let form_state = GraphicsState { ctm, ..state };
    let data = get_stream_content(&form);
    let redacted = redact_stream(doc, &data, &resources, form_state, regions, depth)?;
    if !redacted.stats.changed() {
        return Ok((None, redacted.stats));
    }

    let mut dict = form.dict;
    dict.remove(b"Filter");
    dict.remove(b"DecodeParms");
    dict.remove(b"Length");
    if !redacted.replaced.is_empty() {
        dict.set(
            "Resources",
            Object::Dictionary(with_xobjects(doc, &resources, &redacted.replaced)),
        );
    }
    let clone_id = doc.add_object(Stream::new(dict, redacted.content));
    log::debug!("[Redact] form {:?} copied to {:?}", form_id, clone_id);
    Ok((Some(clone_id), redacted.stats))
}

/// An XObject name not yet used by the resources or earlier copies.
fn fresh_name(xobjects: &Dictionary, taken: &[(Vec<u8>, ObjectId)], base: &[u8]) -> Vec<u8> {
    (1..)
        .map(|n: u32| {
            let mut name = base.to_vec();
            name.extend_from_slice(format!("_clean{}", n).as_bytes());
            name
        })
        .find(|name| !xobjects.has(name) && taken.iter().all(|(t, _)| t != name))
        .unwrap_or_else(|| base.to_vec())
}

/// Copy of `resources` whose XObject dictionary also holds the cleaned forms.
fn with_xobjects(doc: &Document, resources: &Dictionary, replaced: &[(Vec<u8>, ObjectId)]) -> Dictionary {
    let mut resources = resources.clone();
    let mut xobjects = resources
        .get(b"XObject")
        .ok()
        .and_then(|o| resolve_dict(doc, o))
        .cloned()
        .unwrap_or_default();
    for (name, id) in replaced {
        xobjects.set(name.clone(), Object::Reference(*id));
    }
    resources.set("XObject", Object::Dictionary(xobjects));
    resources
}

fn multiply(m1: &Matrix, m2: &Matrix) -> Matrix {
    [
        m1[0] * m2[0] + m1[1] * m2[2],
        m1[0] * m2[1] + m1[1] * m2[3],
        m1[2] * m2[0] + m1[3] * m2[2],
        m1[2] * m2[1] + m1[3] * m2[3],
        m1[4] * m2[0] + m1[5] * m2[2] + m2[4],
        m1[4] * m2[1] + m1[5] * m2[3] + m2[5],
    ]
}

fn transform(m: &Matrix, x: f32, y: f32) -> (f32, f32) {
    (m[0] * x + m[2] * y + m[4], m[1] * x + m[3] * y + m[5])
}

fn translation(tx: f32, ty: f32) -> Matrix {
    [1.0, 0.0, 0.0, 1.0, tx, ty]
}

fn numbers(operands: &[Object]) -> Option<Vec<f32>> {
    operands.iter().map(get_number).collect()
}

fn matrix_operand(operands: &[Object]) -> Option<Matrix> {
    let values = numbers(operands)?;
    if values.len() < 6 {
        return None;
    }
    Some([values[0], values[1], values[2], values[3], values[4], values[5]])
}

fn bbox_of(points: &[(f32, f32)]) -> Option<Rect> {
    let (first, rest) = points.split_first()?;
    let start = Rect::new(first.0, first.1, first.0, first.1);
    Some(rest.iter().fold(start, |acc, (x, y)| {
        acc.union(&Rect::new(*x, *y, *x, *y))
    }))
}

/// Graphics state entries the walker needs (text state included, as q/Q save it).
#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    font: Vec<u8>,
    font_size: f32,
    char_spacing: f32,
    word_spacing: f32,
    horizontal_scale: f32,
    leading: f32,
    rise: f32,
    render_mode: i64,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: IDENTITY,
            font: Vec::new(),
            font_size: 12.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
            render_mode: 0,
        }
    }
}

/// Path under construction, buffered until its painting operator decides its fate.
#[derive(Default)]
struct PendingPath {
    ops: Vec<Operation>,
    points: Vec<(f32, f32)>,
    clip: bool,
}

impl PendingPath {
    fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// A `Do` in the output, with the graphics state it draws under.
struct XObjectCall {
    op_index: usize,
    name: Vec<u8>,
    state: GraphicsState,
}

struct ContentWalker<'a> {
    regions: &'a [Rect],
    fonts: &'a FontTable,
    state: GraphicsState,
    stack: Vec<GraphicsState>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    path: PendingPath,
    output: Vec<Operation>,
    calls: Vec<XObjectCall>,
    stats: RedactionStats,
}

impl<'a> ContentWalker<'a> {
    fn new(regions: &'a [Rect], fonts: &'a FontTable, state: GraphicsState) -> Self {
        Self {
            regions,
            fonts,
            state,
            stack: Vec::new(),
            text_matrix: IDENTITY,
            line_matrix: IDENTITY,
            path: PendingPath::default(),
            output: Vec::new(),
            calls: Vec::new(),
            stats: RedactionStats::default(),
        }
    }

    fn step(&mut self, op: Operation) {
        match op.operator.as_str() {
            "m" | "l" | "c" | "v" | "y" | "h" | "re" => return self.extend_path(op),
            "W" | "W*" => {
                self.path.clip = true;
                self.path.ops.push(op);
                return;
            }
            "S" | "s" | "f" | "F" | "f*" | "B" | "B*" | "b" | "b*" | "n" => return self.paint_path(op),
            _ => self.flush_path(),
        }

        match op.operator.as_str() {
            "q" => self.stack.push(self.state.clone()),
            "Q" => {
                if let Some(saved) = self.stack.pop() {
                    self.state = saved;
                }
            }
            "cm" => {
                if let Some(m) = matrix_operand(&op.operands) {
                    self.state.ctm = multiply(&m, &self.state.ctm);
                }
            }
            "BT" => {
                self.text_matrix = IDENTITY;
                self.line_matrix = IDENTITY;
            }
            "Tf" if op.operands.len() >= 2 => {
                if let Ok(name) = op.operands[0].as_name() {
                    self.state.font = name.to_vec();
                }
                if let Some(size) = get_number(&op.operands[1]) {
                    self.state.font_size = size;
                }
            }
            "Tc" => self.set_number(&op, |s, v| s.char_spacing = v),
            "Tw" => self.set_number(&op, |s, v| s.word_spacing = v),
            "Tz" => self.set_number(&op, |s, v| s.horizontal_scale = v / 100.0),
            "TL" => self.set_number(&op, |s, v| s.leading = v),
            "Ts" => self.set_number(&op, |s, v| s.rise = v),
            "Tr" => {
                if let Some(mode) = op.operands.first().and_then(|o| o.as_i64().ok()) {
                    self.state.render_mode = mode;
                }
            }
            "Td" | "TD" => {
                if let Some(values) = numbers(&op.operands).filter(|v| v.len() >= 2) {
                    if op.operator == "TD" {
                        self.state.leading = -values[1];
                    }
                    self.move_line(values[0], values[1]);
                }
            }
            "Tm" => {
                if let Some(m) = matrix_operand(&op.operands) {
                    self.text_matrix = m;
                    self.line_matrix = m;
                }
            }
            "T*" => self.move_line(0.0, -self.state.leading),
            "Tj" => {
                let advances = self.string_advances(op.operands.first());
                return self.show_text(op, &advances);
            }
            "'" => {
                self.move_line(0.0, -self.state.leading);
                let advances = self.string_advances(op.operands.first());
                return self.show_text(op, &advances);
            }
            "\"" => {
                if let Some(values) = numbers(op.operands.get(..2).unwrap_or_default()) {
                    if values.len() == 2 {
                        self.state.word_spacing = values[0];
                        self.state.char_spacing = values[1];
                    }
                }
                self.move_line(0.0, -self.state.leading);
                let advances = self.string_advances(op.operands.get(2));
                return self.show_text(op, &advances);
            }
            "TJ" => {
                let advances = self.array_advances(op.operands.first());
                return self.show_text(op, &advances);
            }
            "Do" => {
                if let Some(name) = op.operands.first().and_then(|o| o.as_name().ok()) {
                    self.calls.push(XObjectCall {
                        op_index: self.output.len(),
                        name: name.to_vec(),
                        state: self.state.clone(),
                    });
                }
            }
            _ => {}
        }

        self.output.push(op);
    }

    fn set_number(&mut self, op: &Operation, apply: impl FnOnce(&mut GraphicsState, f32)) {
        if let Some(value) = op.operands.first().and_then(get_number) {
            apply(&mut self.state, value);
        }
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = multiply(&translation(tx, ty), &self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn metrics(&self) -> &'a FontMetrics {
        self.fonts.get(&self.state.font)
    }

    /// Horizontal advance (text space, unscaled by Tm) of each glyph in a string.
    fn glyph_advances(&self, bytes: &[u8]) -> Vec<f32> {
        let metrics = self.metrics();
        let single_byte = metrics.bytes_per_code() == 1;
        let s = &self.state;
        metrics
            .codes(bytes)
            .into_iter()
            .map(|code| {
                let word = if single_byte && code == 32 {
                    s.word_spacing
                } else {
                    0.0
                };
                (metrics.code_width(code) * s.font_size + s.char_spacing + word) * s.horizontal_scale
            })
            .collect()
    }

    fn string_advances(&self, operand: Option<&Object>) -> Vec<f32> {
        match operand {
            Some(Object::String(bytes, _)) => self.glyph_advances(bytes),
            _ => Vec::new(),
        }
    }

    /// TJ arrays: glyph advances plus the numeric kerning adjustments.
    fn array_advances(&self, operand: Option<&Object>) -> Vec<f32> {
        let Some(Object::Array(items)) = operand else {
            return Vec::new();
        };
        let mut advances = Vec::new();
        for item in items {
            match item {
                Object::String(bytes, _) => advances.extend(self.glyph_advances(bytes)),
                other => {
                    if let Some(adjust) = get_number(other) {
                        advances.push(-adjust / 1000.0 * self.state.font_size * self.state.horizontal_scale);
                    }
                }
            }
        }
        advances
    }

    /// Emits a text-showing operator, hidden when its glyph box touches a region.
    fn show_text(&mut self, op: Operation, advances: &[f32]) {
        let total: f32 = advances.iter().sum();
        let s = &self.state;
        let bottom = s.rise + DESCENT * s.font_size;
        let top = s.rise + ASCENT * s.font_size;
        let (start, end) = if total >= 0.0 { (0.0, total) } else { (total, 0.0) };

        let device = multiply(&self.text_matrix, &s.ctm);
        let corners = [
            transform(&device, start, bottom),
            transform(&device, end, bottom),
            transform(&device, start, top),
            transform(&device, end, top),
        ];
        let hit = bbox_of(&corners)
            .map(|glyphs| self.regions.iter().any(|r| r.intersects(&glyphs)))
            .unwrap_or(false);

        let current_mode = s.render_mode;
        let invisible = if current_mode >= 4 {
            RENDER_CLIP_ONLY
        } else {
            RENDER_INVISIBLE
        };

        if hit && current_mode != invisible {
            self.stats.text_ops += 1;
            self.output.push(Operation::new("Tr", vec![Object::Integer(invisible)]));
            self.output.push(op);
            self.output.push(Operation::new("Tr", vec![Object::Integer(current_mode)]));
        } else {
            self.output.push(op);
        }

        self.text_matrix = multiply(&translation(total, 0.0), &self.text_matrix);
    }

    fn extend_path(&mut self, op: Operation) {
        let ctm = self.state.ctm;
        if let Some(values) = numbers(&op.operands) {
            if op.operator == "re" && values.len() >= 4 {
                let (x, y, w, h) = (values[0], values[1], values[2], values[3]);
                for (px, py) in [(x, y), (x + w, y), (x, y + h), (x + w, y + h)] {
                    self.path.points.push(transform(&ctm, px, py));
                }
            } else {
                for pair in values.chunks_exact(2) {
                    self.path.points.push(transform(&ctm, pair[0], pair[1]));
                }
            }
        }
        self.path.ops.push(op);
    }

    fn paint_path(&mut self, paint: Operation) {
        let path = std::mem::take(&mut self.path);
        let covered = paint.operator != "n"
            && bbox_of(&path.points)
                .map(|shape| {
                    self.regions
                        .iter()
                        .any(|r| r.contains(&shape, CONTAINMENT_TOLERANCE))
                })
                .unwrap_or(false);

        if !covered {
            self.output.extend(path.ops);
            self.output.push(paint);
            return;
        }

        self.stats.paths += 1;
        if path.clip {
            self.output.extend(path.ops);
            self.output.push(Operation::new("n", vec![]));
        }
    }

    /// Emits a path left open by malformed content.
    fn flush_path(&mut self) {
        if !self.path.is_empty() {
            let path = std::mem::take(&mut self.path);
            self.output.extend(path.ops);
        }
    }
}
