use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::ContextError;
use crate::fonts::FontFiles;
use crate::pagination::{decide_page_break, PageBreak};
use crate::pdf::{
    points_to_millimeters, Color, DocumentMetadata, ImageXObject, PaintMode, PdfDocument,
    Rectangle,
};

/// Horizontal padding between a cell border and its text.
pub const CELL_MARGIN: f32 = 1.0;

/// Page size and margins in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub margin_top: f32,
    /// Distance from the bottom edge at which automatic and forced page breaks trigger.
    pub margin_bottom: f32,
}

impl PageGeometry {
    pub const A4_PORTRAIT: PageGeometry = PageGeometry {
        width: 210.0,
        height: 297.0,
        margin_left: 15.0,
        margin_right: 15.0,
        margin_top: 15.0,
        margin_bottom: 25.0,
    };

    pub fn content_width(&self) -> f32 {
        self.width - self.margin_left - self.margin_right
    }

    /// The lowest `y` (from the top) that content may reach.
    pub fn bottom_limit(&self) -> f32 {
        self.height - self.margin_bottom
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        PageGeometry::A4_PORTRAIT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Regular,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// A colored band across the top edge of the page.
#[derive(Debug, Clone, PartialEq)]
pub struct AccentBar {
    pub color: Color,
    pub height: f32,
}

/// A rule and a centered line of small text near the bottom edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Footer {
    pub text: String,
    pub text_color: Color,
    pub rule_color: Color,
    /// Distance of the rule from the bottom edge.
    pub offset_from_bottom: f32,
}

/// Decoration repeated on every new page, including pages started by a page break.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageDecoration {
    pub accent_bar: Option<AccentBar>,
    pub footer: Option<Footer>,
}

#[derive(Debug, Clone, Copy)]
struct TextState {
    x: f32,
    y: f32,
    font_style: FontStyle,
    font_size: f32,
    text_color: Color,
    fill_color: Color,
    draw_color: Color,
    line_width: f32,
}

/// Cursor-driven page renderer over a `PdfDocument`.
///
/// Coordinates are millimetres from the top-left corner of the page, font sizes are points.
pub struct Composer {
    document: PdfDocument,
    geometry: PageGeometry,
    regular_font: usize,
    bold_font: usize,
    current_page: Option<usize>,
    state: TextState,
    auto_page_break: bool,
    decoration: PageDecoration,
    images: HashMap<PathBuf, (String, u32, u32)>,
}

impl Composer {
    /// Loads the regular and bold fonts into a fresh document.
    pub fn new<S: Into<String>>(
        identifier: S,
        fonts: &FontFiles,
        geometry: PageGeometry,
    ) -> Result<Self, ContextError> {
        let mut document = PdfDocument::new(identifier);
        let regular_font = document.add_font(&fonts.regular)?;
        let bold_font = if fonts.bold == fonts.regular {
            regular_font
        } else {
            document.add_font(&fonts.bold)?
        };

        Ok(Self::with_document(
            document,
            regular_font,
            bold_font,
            geometry,
        ))
    }

    pub fn with_document(
        document: PdfDocument,
        regular_font: usize,
        bold_font: usize,
        geometry: PageGeometry,
    ) -> Self {
        Composer {
            document,
            geometry,
            regular_font,
            bold_font,
            current_page: None,
            state: TextState {
                x: geometry.margin_left,
                y: geometry.margin_top,
                font_style: FontStyle::Regular,
                font_size: 9.0,
                text_color: Color::rgb(0, 0, 0),
                fill_color: Color::rgb(255, 255, 255),
                draw_color: Color::rgb(0, 0, 0),
                line_width: 0.2,
            },
            auto_page_break: true,
            decoration: PageDecoration::default(),
            images: HashMap::new(),
        }
    }

    pub fn geometry(&self) -> PageGeometry {
        self.geometry
    }

    pub fn document(&self) -> &PdfDocument {
        &self.document
    }

    pub fn set_metadata(&mut self, metadata: DocumentMetadata) {
        self.document.metadata = metadata;
    }

    /// Replaces the decoration drawn on the pages started from now on.
    pub fn set_decoration(&mut self, decoration: PageDecoration) {
        self.decoration = decoration;
    }

    pub fn set_auto_page_break(&mut self, enabled: bool) {
        self.auto_page_break = enabled;
    }

    pub fn auto_page_break(&self) -> bool {
        self.auto_page_break
    }

    /// Starts a new page, draws the decoration and moves the cursor to the top-left margin.
    pub fn add_page(&mut self) -> Result<usize, ContextError> {
        let page_index = self
            .document
            .add_page(self.geometry.width, self.geometry.height);
        self.current_page = Some(page_index);
        self.draw_decoration()?;
        self.state.x = self.geometry.margin_left;
        self.state.y = self.geometry.margin_top;
        log::debug!("Started page {}", page_index + 1);

        Ok(page_index)
    }

    pub fn page_count(&self) -> usize {
        self.document.page_count()
    }

    pub fn current_page(&self) -> Result<usize, ContextError> {
        self.current_page.ok_or(ContextError::with_context(
            "No page has been added to the document yet",
        ))
    }

    pub fn x(&self) -> f32 {
        self.state.x
    }

    pub fn y(&self) -> f32 {
        self.state.y
    }

    pub fn set_x(&mut self, x: f32) {
        self.state.x = x;
    }

    /// Moves the cursor to `y` and back to the left margin. Negative values count from the bottom edge.
    pub fn set_y(&mut self, y: f32) {
        self.state.x = self.geometry.margin_left;
        self.state.y = if y < 0.0 {
            self.geometry.height + y
        } else {
            y
        };
    }

    pub fn set_xy(&mut self, x: f32, y: f32) {
        self.set_y(y);
        self.state.x = x;
    }

    /// Line feed: back to the left margin, `height` lower.
    pub fn ln(&mut self, height: f32) {
        self.state.x = self.geometry.margin_left;
        self.state.y += height;
    }

    pub fn set_font(&mut self, font_style: FontStyle, font_size: f32) {
        self.state.font_style = font_style;
        self.state.font_size = font_size;
    }

    pub fn set_text_color(&mut self, color: Color) {
        self.state.text_color = color;
    }

    pub fn set_fill_color(&mut self, color: Color) {
        self.state.fill_color = color;
    }

    pub fn set_draw_color(&mut self, color: Color) {
        self.state.draw_color = color;
    }

    pub fn set_line_width(&mut self, line_width: f32) {
        self.state.line_width = line_width;
    }

    fn font_index(&self) -> usize {
        match self.state.font_style {
            FontStyle::Regular => self.regular_font,
            FontStyle::Bold => self.bold_font,
        }
    }

    /// Width of `text` in millimetres with the current font.
    pub fn text_width(&self, text: &str) -> Result<f32, ContextError> {
        self.document
            .text_width(self.font_index(), self.state.font_size, text)
    }

    /// Writes a single-line cell at the cursor and moves the cursor right by its width.
    /// A width of zero extends the cell to the right margin. With automatic page breaks enabled, a
    /// cell crossing the bottom limit moves to a new page first.
    pub fn cell(
        &mut self,
        width: f32,
        height: f32,
        text: &str,
        align: Align,
    ) -> Result<(), ContextError> {
        self.draw_cell(width, height, text, align, false)
    }

    /// Like `cell`, with the background painted in the fill color first.
    pub fn filled_cell(
        &mut self,
        width: f32,
        height: f32,
        text: &str,
        align: Align,
    ) -> Result<(), ContextError> {
        self.draw_cell(width, height, text, align, true)
    }

    /// Like `cell`, followed by a line feed of the cell height.
    pub fn cell_ln(
        &mut self,
        width: f32,
        height: f32,
        text: &str,
        align: Align,
    ) -> Result<(), ContextError> {
        self.draw_cell(width, height, text, align, false)?;
        self.ln(height);
        Ok(())
    }

    fn draw_cell(
        &mut self,
        width: f32,
        height: f32,
        text: &str,
        align: Align,
        fill: bool,
    ) -> Result<(), ContextError> {
        self.current_page()?;
        let width = if width <= 0.0 {
            self.geometry.width - self.geometry.margin_right - self.state.x
        } else {
            width
        };
        if self.auto_page_break
            && decide_page_break(
                self.state.y,
                height,
                self.geometry.margin_top,
                self.geometry.bottom_limit(),
            ) == PageBreak::NewPage
        {
            let x = self.state.x;
            self.add_page()?;
            self.state.x = x;
        }
        let page_index = self.current_page()?;

        if fill {
            self.document.draw_rectangle(
                page_index,
                self.to_pdf_rectangle(self.state.x, self.state.y, width, height),
                PaintMode::Fill,
                self.state.fill_color,
                self.state.draw_color,
                self.state.line_width,
            )?;
        }

        if !text.is_empty() {
            let text_width = self.text_width(text)?;
            let text_x = match align {
                Align::Left => self.state.x + CELL_MARGIN,
                Align::Center => self.state.x + (width - text_width) / 2.0,
                Align::Right => self.state.x + width - CELL_MARGIN - text_width,
            };
            // Vertically centered on the cell, as cap height sits at roughly 0.7 of the font size
            let baseline = self.state.y + height / 2.0 + 0.3 * points_to_millimeters(self.state.font_size);
            self.document.write_text(
                page_index,
                self.font_index(),
                self.state.font_size,
                self.state.text_color,
                [text_x, self.geometry.height - baseline],
                text,
            )?;
        }

        self.state.x += width;
        Ok(())
    }

    /// Writes wrapped text, one cell of `line_height` per line, and returns the number of lines.
    ///
    /// Each line is a `cell`, so automatic page breaks apply line by line. The cursor ends at the left margin below the last line.
    pub fn multi_cell(
        &mut self,
        width: f32,
        line_height: f32,
        text: &str,
        align: Align,
    ) -> Result<usize, ContextError> {
        let width = if width <= 0.0 {
            self.geometry.width - self.geometry.margin_right - self.state.x
        } else {
            width
        };
        let left = self.state.x;
        let lines = self.wrap_text(text, width - 2.0 * CELL_MARGIN)?;

        for line in lines.iter() {
            self.state.x = left;
            self.draw_cell(width, line_height, line, align, false)?;
            self.ln(line_height);
        }

        Ok(lines.len())
    }

    /// Splits `text` into lines no wider than `max_width`, honouring explicit line breaks.
    ///
    /// Lines break after the last space that fits, or anywhere for text without spaces (Japanese).
    pub fn wrap_text(&self, text: &str, max_width: f32) -> Result<Vec<String>, ContextError> {
        let mut lines = Vec::new();
        for paragraph in text.split('\n') {
            self.wrap_paragraph(paragraph, max_width, &mut lines)?;
        }
        Ok(lines)
    }

    fn wrap_paragraph(
        &self,
        paragraph: &str,
        max_width: f32,
        lines: &mut Vec<String>,
    ) -> Result<(), ContextError> {
        let mut line = String::new();
        let mut line_width = 0.0;
        let mut last_space: Option<usize> = None;

        for character in paragraph.chars() {
            let mut buffer = [0u8; 4];
            let character_width = self.text_width(character.encode_utf8(&mut buffer))?;

            if !line.is_empty() && line_width + character_width > max_width {
                if character == ' ' {
                    lines.push(line.trim_end().to_string());
                    line.clear();
                    line_width = 0.0;
                    last_space = None;
                    continue;
                }
                match last_space.take() {
                    Some(space_index) => {
                        let remainder = line[space_index + 1..].to_string();
                        line.truncate(space_index);
                        lines.push(std::mem::replace(&mut line, remainder));
                        line_width = self.text_width(&line)?;
                    }
                    None => {
                        lines.push(std::mem::take(&mut line));
                        line_width = 0.0;
                    }
                }
            }

            if character == ' ' {
                last_space = Some(line.len());
            }
            line.push(character);
            line_width += character_width;
        }

        lines.push(line);
        Ok(())
    }

    /// Draws a rectangle whose top-left corner is at `(x, y)`.
    pub fn rect(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        paint_mode: PaintMode,
    ) -> Result<(), ContextError> {
        let page_index = self.current_page()?;
        self.document.draw_rectangle(
            page_index,
            self.to_pdf_rectangle(x, y, width, height),
            paint_mode,
            self.state.fill_color,
            self.state.draw_color,
            self.state.line_width,
        )
    }

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Result<(), ContextError> {
        let page_index = self.current_page()?;
        self.document.draw_line(
            page_index,
            [x1, self.geometry.height - y1],
            [x2, self.geometry.height - y2],
            self.state.draw_color,
            self.state.line_width,
        )
    }

    /// Places an image with its top-left corner at `(x, y)`. Without a height the aspect ratio is kept.
    /// Returns the height used.
    pub fn image(
        &mut self,
        image_path: &Path,
        x: f32,
        y: f32,
        width: f32,
        height: Option<f32>,
    ) -> Result<f32, ContextError> {
        let page_index = self.current_page()?;
        let (image_name, pixel_width, pixel_height) = match self.images.get(image_path) {
            Some(registered) => registered.clone(),
            None => {
                let image = ImageXObject::from_path(image_path)?;
                let (pixel_width, pixel_height) = (image.width, image.height);
                let image_name = self.document.add_image(image);
                let registered = (image_name, pixel_width, pixel_height);
                self.images
                    .insert(image_path.to_path_buf(), registered.clone());
                registered
            }
        };
        let height =
            height.unwrap_or(width * pixel_height as f32 / pixel_width.max(1) as f32);
        self.document.place_image(
            page_index,
            &image_name,
            self.to_pdf_rectangle(x, y, width, height),
        )?;

        Ok(height)
    }

    /// Makes the area with its top-left corner at `(x, y)` a link to `uri`.
    pub fn link(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        uri: &str,
    ) -> Result<(), ContextError> {
        let page_index = self.current_page()?;
        self.document
            .add_link(page_index, self.to_pdf_rectangle(x, y, width, height), uri)
    }

    /// Starts a new page first when a block of `height` does not fit below the cursor.
    /// Returns whether a page break happened.
    pub fn ensure_space(&mut self, height: f32) -> Result<bool, ContextError> {
        let decision = decide_page_break(
            self.state.y,
            height,
            self.geometry.margin_top,
            self.geometry.bottom_limit(),
        );
        if decision == PageBreak::NewPage {
            self.add_page()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Writes the document to `output_path`.
    pub fn save(&mut self, instance_id: &str, output_path: &Path) -> Result<(), ContextError> {
        self.document.save(instance_id, output_path)
    }

    pub fn into_document(self) -> PdfDocument {
        self.document
    }

    fn draw_decoration(&mut self) -> Result<(), ContextError> {
        let saved_state = self.state;
        let auto_page_break = self.auto_page_break;
        let decoration = self.decoration.clone();
        self.auto_page_break = false;

        if let Some(accent_bar) = decoration.accent_bar {
            self.set_fill_color(accent_bar.color);
            self.rect(
                0.0,
                0.0,
                self.geometry.width,
                accent_bar.height,
                PaintMode::Fill,
            )?;
        }

        if let Some(footer) = decoration.footer {
            let rule_y = self.geometry.height - footer.offset_from_bottom;
            self.set_draw_color(footer.rule_color);
            self.set_line_width(0.2);
            self.line(
                self.geometry.margin_left,
                rule_y,
                self.geometry.width - self.geometry.margin_right,
                rule_y,
            )?;
            self.set_xy(self.geometry.margin_left, rule_y + 3.0);
            self.set_font(FontStyle::Regular, 6.5);
            self.set_text_color(footer.text_color);
            self.cell(0.0, 3.5, &footer.text, Align::Center)?;
        }

        self.state = saved_state;
        self.auto_page_break = auto_page_break;
        Ok(())
    }

    fn to_pdf_rectangle(&self, x: f32, y: f32, width: f32, height: f32) -> Rectangle {
        Rectangle {
            x,
            y: self.geometry.height - y - height,
            width,
            height,
        }
    }
}
