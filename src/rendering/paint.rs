//! Display list built from a layout tree

use crate::rendering::layout::{LayoutKind, LayoutTree};

pub type Rgba = (u8, u8, u8, u8);

pub const BLACK: Rgba = (0, 0, 0, 255);
pub const WHITE: Rgba = (255, 255, 255, 255);

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    SolidRect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        rgba: Rgba,
    },
    Text {
        x: i32,
        y: i32,
        text: String,
        font_size: u32,
        rgba: Rgba,
    },
    Image {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        src: String,
    },
}

/// Paint order is layout order: parents before children.
pub fn build_display_list(tree: &LayoutTree) -> Vec<PaintCommand> {
    let mut cmds = Vec::new();
    for node in &tree.nodes {
        let r = &node.lb.rect;
        match &node.kind {
            LayoutKind::Block { background, border } => {
                if let Some(bg) = background {
                    cmds.push(PaintCommand::SolidRect {
                        x: r.x,
                        y: r.y,
                        width: r.width,
                        height: r.height,
                        rgba: *bg,
                    });
                }
                if let Some(color) = border {
                    push_border(&mut cmds, r.x, r.y, r.width, r.height, node.lb.box_model.border, *color);
                }
            }
            LayoutKind::Text { lines, font_size, color } => {
                let line_h = font_size + font_size / 4;
                for (i, line) in lines.iter().enumerate() {
                    cmds.push(PaintCommand::Text {
                        x: r.x,
                        y: r.y + (i as u32 * line_h) as i32,
                        text: line.clone(),
                        font_size: *font_size,
                        rgba: *color,
                    });
                }
            }
            LayoutKind::Image { src } => {
                if r.width > 0 && r.height > 0 {
                    cmds.push(PaintCommand::Image {
                        x: r.x,
                        y: r.y,
                        width: r.width,
                        height: r.height,
                        src: src.clone(),
                    });
                }
            }
        }
    }
    cmds
}

fn push_border(cmds: &mut Vec<PaintCommand>, x: i32, y: i32, w: u32, h: u32, b: u32, rgba: Rgba) {
    let edges = [
        (x, y, w, b),
        (x, y + h.saturating_sub(b) as i32, w, b),
        (x, y, b, h),
        (x + w.saturating_sub(b) as i32, y, b, h),
    ];
    for (x, y, width, height) in edges {
        cmds.push(PaintCommand::SolidRect { x, y, width, height, rgba });
    }
}

/// Parse `#rgb`, `#rrggbb`, `rgb(r, g, b)` and a handful of named colors.
pub fn parse_color(v: &str) -> Option<Rgba> {
    let v = v.trim().to_ascii_lowercase();
    if let Some(hex) = v.strip_prefix('#') {
        let digits: Vec<u8> = hex
            .chars()
            .map(|c| c.to_digit(16).map(|d| d as u8))
            .collect::<Option<_>>()?;
        return match digits.len() {
            3 => Some((digits[0] * 17, digits[1] * 17, digits[2] * 17, 255)),
            6 => Some((
                digits[0] * 16 + digits[1],
                digits[2] * 16 + digits[3],
                digits[4] * 16 + digits[5],
                255,
            )),
            _ => None,
        };
    }
    if let Some(args) = v.strip_prefix("rgb(").and_then(|s| s.strip_suffix(')')) {
        let parts: Vec<u8> = args
            .split(',')
            .map(|p| p.trim().parse::<u8>().ok())
            .collect::<Option<_>>()?;
        return match parts.as_slice() {
            [r, g, b] => Some((*r, *g, *b, 255)),
            _ => None,
        };
    }
    match v.as_str() {
        "black" => Some(BLACK),
        "white" => Some(WHITE),
        "red" => Some((255, 0, 0, 255)),
        "green" => Some((0, 128, 0, 255)),
        "blue" => Some((0, 0, 255, 255)),
        "gray" | "grey" => Some((128, 128, 128, 255)),
        _ => None,
    }
}
