use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use pagedeck_core::geometry::{PageSize, Rect, LETTER};

/// Deepest page-tree ancestry followed when resolving inherited attributes.
const MAX_INHERITANCE_DEPTH: usize = 32;

/// Page box in PDF user space (origin bottom-left, y up), plus the clockwise
/// `/Rotate` applied when the page is displayed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub llx: f32,
    pub lly: f32,
    pub urx: f32,
    pub ury: f32,
    /// 0, 90, 180 or 270.
    pub rotation: u16,
}

impl PageBox {
    pub fn new(llx: f32, lly: f32, urx: f32, ury: f32) -> Self {
        Self {
            llx,
            lly,
            urx,
            ury,
            rotation: 0,
        }
    }

    pub fn with_rotation(mut self, rotation: i64) -> Self {
        self.rotation = normalize_rotation(rotation);
        self
    }

    fn width(&self) -> f32 {
        self.urx - self.llx
    }

    fn height(&self) -> f32 {
        self.ury - self.lly
    }

    /// Size of the page as displayed, so width and height swap for quarter turns.
    pub fn size(&self) -> PageSize {
        match self.rotation {
            90 | 270 => PageSize::new(self.height(), self.width()),
            _ => PageSize::new(self.width(), self.height()),
        }
    }

    /// User-space point to displayed page space (origin top-left, y down).
    pub fn user_to_page(&self, x: f32, y: f32) -> (f32, f32) {
        let (u, v) = (x - self.llx, self.ury - y);
        match self.rotation {
            90 => (self.height() - v, u),
            180 => (self.width() - u, self.height() - v),
            270 => (v, self.width() - u),
            _ => (u, v),
        }
    }

    /// Displayed page-space point back to user space.
    pub fn page_to_user(&self, px: f32, py: f32) -> (f32, f32) {
        let (u, v) = match self.rotation {
            90 => (py, self.height() - px),
            180 => (self.width() - px, self.height() - py),
            270 => (self.width() - py, px),
            _ => (px, py),
        };
        (self.llx + u, self.ury - v)
    }

    /// User-space rectangle (any corner order) to displayed page space.
    pub fn rect_to_page(&self, rect: &Rect) -> Rect {
        let a = self.user_to_page(rect.x0, rect.y0);
        let b = self.user_to_page(rect.x1, rect.y1);
        Rect::new(a.0.min(b.0), a.1.min(b.1), a.0.max(b.0), a.1.max(b.1))
    }

    /// Displayed page-space rectangle to user space.
    pub fn rect_to_user(&self, rect: &Rect) -> Rect {
        let a = self.page_to_user(rect.x0, rect.y0);
        let b = self.page_to_user(rect.x1, rect.y1);
        Rect::new(a.0.min(b.0), a.1.min(b.1), a.0.max(b.0), a.1.max(b.1))
    }
}

impl Default for PageBox {
    fn default() -> Self {
        Self::new(0.0, 0.0, LETTER.width, LETTER.height)
    }
}

fn normalize_rotation(rotation: i64) -> u16 {
    match rotation.rem_euclid(360) {
        90 => 90,
        180 => 180,
        270 => 270,
        0 => 0,
        other => {
            log::warn!("[PageBox] /Rotate {} is not a quarter turn, ignored", other);
            0
        }
    }
}

/// Reads a number out of an integer or real object.
pub fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Follows a reference, or returns the object itself.
pub fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

pub fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match resolve(doc, obj)? {
        Object::Dictionary(dict) => Some(dict),
        Object::Stream(stream) => Some(&stream.dict),
        _ => None,
    }
}

/// Looks up `key` on the page, then up its `/Parent` chain.
pub fn inherited_attribute<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut current = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_INHERITANCE_DEPTH {
        if let Ok(value) = current.get(key) {
            return resolve(doc, value);
        }
        let parent = current.get(b"Parent").ok()?;
        current = resolve_dict(doc, parent)?;
    }
    None
}

fn extract_box_values(doc: &Document, obj: &Object) -> Option<PageBox> {
    let arr = match resolve(doc, obj)? {
        Object::Array(arr) => arr,
        _ => return None,
    };
    let values: Vec<f32> = arr.iter().filter_map(get_number).collect();
    if values.len() != 4 {
        return None;
    }
    let page_box = PageBox::new(
        values[0].min(values[2]),
        values[1].min(values[3]),
        values[0].max(values[2]),
        values[1].max(values[3]),
    );
    if page_box.urx - page_box.llx <= 0.0 || page_box.ury - page_box.lly <= 0.0 {
        return None;
    }
    Some(page_box)
}

/// Clockwise display rotation of a page (inheritable `/Rotate`).
pub fn get_page_rotation(doc: &Document, page_id: ObjectId) -> i64 {
    inherited_attribute(doc, page_id, b"Rotate")
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(0)
}

/// Visible box of a page: CropBox, else MediaBox (both inheritable), else Letter.
pub fn get_page_box(doc: &Document, page_id: ObjectId) -> PageBox {
    let crop = inherited_attribute(doc, page_id, b"CropBox").and_then(|o| extract_box_values(doc, o));
    let media = || inherited_attribute(doc, page_id, b"MediaBox").and_then(|o| extract_box_values(doc, o));
    let page_box = crop.or_else(media).unwrap_or_else(|| {
        log::warn!("[PageBox] page {:?} declares no usable box, using Letter", page_id);
        PageBox::default()
    });
    page_box.with_rotation(get_page_rotation(doc, page_id))
}

/// Stream bytes, decompressed when a filter is present and understood.
pub fn get_stream_content(stream: &Stream) -> Vec<u8> {
    match stream.decompressed_content() {
        Ok(data) => data,
        Err(_) => stream.content.clone(),
    }
}

/// Concatenated content of a page. A page without `/Contents` yields no bytes.
pub fn get_page_content(doc: &Document, page_id: ObjectId) -> Result<Vec<u8>, String> {
    let page = doc.get_dictionary(page_id).map_err(|e| e.to_string())?;

    let contents = match page.get(b"Contents") {
        Ok(contents) => contents,
        Err(_) => return Ok(Vec::new()),
    };

    match resolve(doc, contents) {
        Some(Object::Stream(stream)) => Ok(get_stream_content(stream)),
        Some(Object::Array(arr)) => {
            let mut all_content = Vec::new();
            for item in arr {
                match resolve(doc, item) {
                    Some(Object::Stream(stream)) => {
                        all_content.extend(get_stream_content(stream));
                        all_content.push(b'\n');
                    }
                    _ => return Err(format!("content array of page {:?} holds a non-stream", page_id)),
                }
            }
            Ok(all_content)
        }
        _ => Err(format!("page {:?} has unreadable /Contents", page_id)),
    }
}

/// Replaces the page content with a single new stream.
pub fn set_page_content(doc: &mut Document, page_id: ObjectId, content: Vec<u8>) -> Result<(), String> {
    let stream_id = doc.add_object(Stream::new(Dictionary::new(), content));
    match doc.get_object_mut(page_id) {
        Ok(Object::Dictionary(dict)) => {
            dict.set("Contents", Object::Reference(stream_id));
            Ok(())
        }
        _ => Err(format!("page {:?} is not a dictionary", page_id)),
    }
}
