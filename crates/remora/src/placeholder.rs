//! Placeholder image synthesis for when the real renderer is unavailable.
//!
//! The image is a fixed 800x600 canvas: a title marking the placeholder status, three
//! schematic boxes joined by arrows (static, not derived from the input), and a literal
//! excerpt of the first non-empty source lines. The SVG is composed as a string and
//! rasterized with `usvg`/`resvg`/`tiny-skia`, so consumers always get a real PNG.
//!
//! This is a deliberate availability-over-fidelity tradeoff: API callers receive *some*
//! image rather than an error. The only hard failure here is the rasterizer itself,
//! reported as [`Error::PlaceholderRender`].

use std::path::Path;

use crate::error::{Error, Result};

pub const CANVAS_WIDTH: u32 = 800;
pub const CANVAS_HEIGHT: u32 = 600;

/// How many non-empty source lines the excerpt shows.
pub const EXCERPT_LINES: usize = 5;
/// Per-line character cap for the excerpt.
pub const EXCERPT_WIDTH: usize = 50;

/// First `EXCERPT_LINES` non-empty lines of `source`, each truncated to
/// `EXCERPT_WIDTH` characters.
pub fn excerpt_lines(source: &str) -> Vec<String> {
    source
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .take(EXCERPT_LINES)
        .map(|line| line.chars().take(EXCERPT_WIDTH).collect())
        .collect()
}

fn escape_xml_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Composes the fixed-layout placeholder SVG embedding an excerpt of `source`.
pub fn placeholder_svg(source: &str) -> String {
    let mut svg = String::with_capacity(4096);
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {CANVAS_WIDTH} {CANVAS_HEIGHT}" width="{CANVAS_WIDTH}" height="{CANVAS_HEIGHT}">"#
    ));
    svg.push_str(r#"<rect x="0" y="0" width="800" height="600" fill="white"/>"#);
    svg.push_str(r##"<rect x="50" y="50" width="700" height="500" fill="none" stroke="#333" stroke-width="2"/>"##);

    // Title block.
    svg.push_str(r##"<text x="400" y="95" text-anchor="middle" font-family="Arial" font-size="24" fill="#333">Mermaid Diagram</text>"##);
    svg.push_str(r##"<text x="400" y="122" text-anchor="middle" font-family="Arial" font-size="16" fill="#666">(placeholder)</text>"##);

    // Static schematic: Start -> Process -> End. Illustrative only, unrelated to the
    // semantic content of the source.
    svg.push_str(r##"<rect x="150" y="200" width="150" height="50" fill="#ecf0f1" stroke="#3498db" stroke-width="2"/>"##);
    svg.push_str(r##"<text x="225" y="230" text-anchor="middle" font-family="Arial" font-size="16" fill="#2c3e50">Start</text>"##);
    svg.push_str(r##"<line x1="300" y1="225" x2="350" y2="225" stroke="#333" stroke-width="2"/>"##);
    svg.push_str(r##"<polygon points="345,220 355,225 345,230" fill="#333"/>"##);
    svg.push_str(r##"<rect x="400" y="200" width="150" height="50" fill="#fadbd8" stroke="#e74c3c" stroke-width="2"/>"##);
    svg.push_str(r##"<text x="475" y="230" text-anchor="middle" font-family="Arial" font-size="16" fill="#2c3e50">Process</text>"##);
    svg.push_str(r##"<line x1="475" y1="250" x2="475" y2="300" stroke="#333" stroke-width="2"/>"##);
    svg.push_str(r##"<polygon points="470,295 475,305 480,295" fill="#333"/>"##);
    svg.push_str(r##"<rect x="400" y="350" width="150" height="50" fill="#d5f4e6" stroke="#27ae60" stroke-width="2"/>"##);
    svg.push_str(r##"<text x="475" y="380" text-anchor="middle" font-family="Arial" font-size="16" fill="#2c3e50">End</text>"##);

    // Source excerpt.
    svg.push_str(r##"<text x="100" y="455" font-family="Arial" font-size="12" fill="#7f8c8d">Original Mermaid code:</text>"##);
    for (i, line) in excerpt_lines(source).iter().enumerate() {
        svg.push_str(&format!(
            r##"<text x="100" y="{}" font-family="Arial" font-size="12" fill="#95a5a6">{}</text>"##,
            475 + i * 15,
            escape_xml_text(line)
        ));
    }

    svg.push_str(r##"<text x="100" y="565" font-family="Arial" font-size="12" fill="#e67e22">Note: install @mermaid-js/mermaid-cli for real rendering</text>"##);
    svg.push_str("</svg>");
    svg
}

/// Renders the placeholder for `source` and writes it to `output` as PNG.
pub fn render_placeholder(source: &str, output: &Path) -> Result<()> {
    let svg = placeholder_svg(source);
    let png = rasterize(&svg)?;
    std::fs::write(output, png)?;
    Ok(())
}

fn rasterize(svg: &str) -> Result<Vec<u8>> {
    let mut opt = usvg::Options::default();
    // Text rendering degrades gracefully when no fonts are installed; the shapes and
    // the PNG itself still come out.
    opt.fontdb_mut().load_system_fonts();
    opt.font_family = "Arial".to_string();

    let tree = usvg::Tree::from_str(svg, &opt).map_err(|err| Error::PlaceholderRender {
        message: format!("failed to parse placeholder SVG: {err}"),
    })?;

    let mut pixmap =
        tiny_skia::Pixmap::new(CANVAS_WIDTH, CANVAS_HEIGHT).ok_or(Error::PlaceholderRender {
            message: "failed to allocate pixmap".to_string(),
        })?;
    pixmap.fill(tiny_skia::Color::WHITE);
    resvg::render(&tree, tiny_skia::Transform::identity(), &mut pixmap.as_mut());

    pixmap.encode_png().map_err(|err| Error::PlaceholderRender {
        message: format!("failed to encode PNG: {err}"),
    })
}
