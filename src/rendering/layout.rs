//! Block layout for captured DOM subtrees

use crate::dom::{Element, Node};
use crate::loader::{decode_data_url, is_data_url};
use crate::rendering::paint::{parse_color, Rgba, BLACK};

/// Attribute that excludes an element (and its subtree) from captures.
pub const IGNORE_ATTR: &str = "data-capture-ignore";

const BASE_FONT_PX: u32 = 16;
const PAGE_PADDING: u32 = 8;
/// Lengths parsed from attributes and styles are clamped to this.
const MAX_CSS_PX: u32 = 100_000;

#[derive(Debug, Clone, PartialEq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxModel {
    pub margin: u32,
    pub border: u32,
    pub padding: u32,
}

impl BoxModel {
    fn for_tag(tag: &str) -> Self {
        let (margin, border, padding) = match tag {
            "h1" => (8, 0, 0),
            "p" => (6, 0, 0),
            "button" | "input" => (2, 1, 4),
            _ => (0, 0, 0),
        };
        BoxModel { margin, border, padding }
    }

    fn inset(&self) -> u32 {
        self.border + self.padding
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutBox {
    pub rect: Rect,
    pub box_model: BoxModel,
}

impl LayoutBox {
    pub fn content_width(&self) -> u32 {
        self.rect.width.saturating_sub(self.box_model.inset() * 2)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayoutKind {
    Block {
        background: Option<Rgba>,
        border: Option<Rgba>,
    },
    Text {
        lines: Vec<String>,
        font_size: u32,
        color: Rgba,
    },
    Image {
        src: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    pub lb: LayoutBox,
    pub kind: LayoutKind,
}

/// Laid-out subtree in CSS pixels
#[derive(Debug, Clone)]
pub struct LayoutTree {
    pub nodes: Vec<LayoutNode>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy)]
struct TextStyle {
    font_size: u32,
    color: Rgba,
}

impl TextStyle {
    fn glyph_width(&self) -> u32 {
        (self.font_size / 2).max(1)
    }

    fn line_height(&self) -> u32 {
        self.font_size + self.font_size / 4
    }
}

/// Lay out `root` into a column `width` CSS pixels wide.
///
/// Blocks stack vertically, `display: flex` splits the row into equal
/// columns, images keep their attribute or intrinsic size (shrunk to fit),
/// and text wraps on whitespace at a fixed advance of half the font size.
pub fn layout_tree(root: &Node, width: u32) -> LayoutTree {
    let mut nodes = Vec::new();
    let style = TextStyle {
        font_size: BASE_FONT_PX,
        color: BLACK,
    };
    let inner = width.saturating_sub(PAGE_PADDING * 2);
    let used = layout_node(root, PAGE_PADDING as i32, PAGE_PADDING as i32, inner, style, &mut nodes);
    LayoutTree {
        nodes,
        width,
        height: used.saturating_add(PAGE_PADDING * 2).max(1),
    }
}

fn layout_node(node: &Node, x: i32, y: i32, avail: u32, style: TextStyle, out: &mut Vec<LayoutNode>) -> u32 {
    match node {
        Node::Text(t) => layout_text(t, x, y, avail, style, out),
        Node::Fragment(children) => stack(children, x, y, avail, style, out),
        Node::Element(e) => layout_element(e, x, y, avail, style, out),
    }
}

fn stack(children: &[Node], x: i32, y: i32, avail: u32, style: TextStyle, out: &mut Vec<LayoutNode>) -> u32 {
    let mut used = 0u32;
    for c in children {
        used = used.saturating_add(layout_node(c, x, below(y, used), avail, style, out));
    }
    used
}

fn skipped(e: &Element) -> bool {
    matches!(e.tag.as_str(), "script" | "style" | "head" | "title")
        || e.get_attr(IGNORE_ATTR).is_some()
        || e.get_style("display") == Some("none")
}

fn layout_element(e: &Element, x: i32, y: i32, avail: u32, parent: TextStyle, out: &mut Vec<LayoutNode>) -> u32 {
    if skipped(e) {
        return 0;
    }
    if e.tag == "img" {
        return layout_image(e, x, y, avail, out);
    }

    let mut style = parent;
    if e.tag == "h1" {
        style.font_size = BASE_FONT_PX * 2;
    }
    if let Some(px) = e.get_style("font-size").and_then(parse_px) {
        style.font_size = px.max(1);
    }
    if let Some(c) = e.get_style("color").and_then(parse_color) {
        style.color = c;
    }

    let bm = BoxModel::for_tag(&e.tag);
    let background = e
        .get_style("background-color")
        .or_else(|| e.get_style("background"))
        .and_then(parse_color);
    let border = (bm.border > 0).then_some(BLACK);

    let bx = x;
    let by = below(y, bm.margin);
    let inset = bm.inset();
    let inner_x = below(bx, inset);
    let inner_y = below(by, inset);
    let inner_w = avail.saturating_sub(inset * 2);

    let index = out.len();
    out.push(LayoutNode {
        lb: LayoutBox {
            rect: Rect { x: bx, y: by, width: avail, height: 0 },
            box_model: bm.clone(),
        },
        kind: LayoutKind::Block { background, border },
    });

    let mut content_h = if e.get_style("display") == Some("flex") {
        flex_row(&e.children, inner_x, inner_y, inner_w, style, out)
    } else {
        stack(&e.children, inner_x, inner_y, inner_w, style, out)
    };

    if e.tag == "input" {
        let value = e.get_attr("value").unwrap_or_default();
        let h = if value.is_empty() {
            0
        } else {
            layout_text(value, inner_x, inner_y, inner_w, style, out)
        };
        content_h = content_h.max(h).max(style.line_height());
    }

    let height = content_h.saturating_add(inset * 2);
    out[index].lb.rect.height = height;
    height.saturating_add(bm.margin * 2)
}

fn flex_row(children: &[Node], x: i32, y: i32, avail: u32, style: TextStyle, out: &mut Vec<LayoutNode>) -> u32 {
    let items: Vec<&Node> = children.iter().filter(|c| !c.is_empty()).collect();
    if items.is_empty() {
        return 0;
    }
    let col = avail / items.len() as u32;
    items
        .iter()
        .enumerate()
        .map(|(i, c)| layout_node(c, below(x, col * i as u32), y, col, style, out))
        .max()
        .unwrap_or(0)
}

fn layout_image(e: &Element, x: i32, y: i32, avail: u32, out: &mut Vec<LayoutNode>) -> u32 {
    let src = e.get_attr("src").unwrap_or_default();
    let attr_w = e.get_attr("width").and_then(parse_px);
    let attr_h = e.get_attr("height").and_then(parse_px);
    let intrinsic = if is_data_url(src) { intrinsic_size(src) } else { None };

    let (mut w, mut h) = match (attr_w, attr_h, intrinsic) {
        (Some(w), Some(h), _) => (w, h),
        (Some(w), None, Some((iw, ih))) if iw > 0 => (w, proportional(ih, w, iw)),
        (None, Some(h), Some((iw, ih))) if ih > 0 => (proportional(iw, h, ih), h),
        (_, _, Some((iw, ih))) => (iw, ih),
        (w, h, None) => (w.unwrap_or(0), h.unwrap_or(0)),
    };
    if w > avail && w > 0 {
        h = proportional(h, avail, w);
        w = avail;
    }
    out.push(LayoutNode {
        lb: LayoutBox {
            rect: Rect { x, y, width: w, height: h },
            box_model: BoxModel { margin: 0, border: 0, padding: 0 },
        },
        kind: LayoutKind::Image { src: src.to_string() },
    });
    h
}

fn intrinsic_size(data_url: &str) -> Option<(u32, u32)> {
    let (_, bytes) = decode_data_url(data_url).ok()?;
    image::ImageReader::new(std::io::Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

fn layout_text(text: &str, x: i32, y: i32, avail: u32, style: TextStyle, out: &mut Vec<LayoutNode>) -> u32 {
    let lines = wrap(text, (avail / style.glyph_width()).max(1) as usize);
    if lines.is_empty() {
        return 0;
    }
    let height = u32::try_from(lines.len())
        .unwrap_or(u32::MAX)
        .saturating_mul(style.line_height());
    out.push(LayoutNode {
        lb: LayoutBox {
            rect: Rect { x, y, width: avail, height },
            box_model: BoxModel { margin: 0, border: 0, padding: 0 },
        },
        kind: LayoutKind::Text {
            lines,
            font_size: style.font_size,
            color: style.color,
        },
    });
    height
}

fn wrap(text: &str, chars_per_line: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut cur = String::new();
    for word in text.split_whitespace() {
        if !cur.is_empty() && cur.chars().count() + word.chars().count() + 1 > chars_per_line {
            lines.push(std::mem::take(&mut cur));
        }
        if !cur.is_empty() {
            cur.push(' ');
        }
        cur.push_str(word);
    }
    if !cur.is_empty() {
        lines.push(cur);
    }
    lines
}

fn parse_px(v: &str) -> Option<u32> {
    let v = v.trim();
    let num = v.strip_suffix("px").unwrap_or(v).trim();
    num.parse::<f32>()
        .ok()
        .filter(|n| *n >= 0.0)
        .map(|n| (n.round() as u32).min(MAX_CSS_PX))
}

/// `a * num / den` without intermediate overflow, clamped like parsed lengths.
fn proportional(a: u32, num: u32, den: u32) -> u32 {
    (a as u64 * num as u64 / den.max(1) as u64).min(MAX_CSS_PX as u64) as u32
}

fn below(y: i32, offset: u32) -> i32 {
    y.saturating_add(i32::try_from(offset).unwrap_or(i32::MAX))
}
