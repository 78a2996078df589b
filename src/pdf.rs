use lopdf::content::Operation;
use lopdf::{Object, StringFormat};
use owned_ttf_parser::{AsFaceRef as _, Face, OwnedFace};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashMap},
    io::BufWriter,
    mem,
    path::Path,
};
use time::OffsetDateTime;
use unicode_normalization::UnicodeNormalization as _;

use crate::error::ContextError;
use crate::sfnt::{self, FontProgramKind};

/// Number of PDF points in one millimetre.
pub const POINTS_PER_MILLIMETER: f32 = 72.0 / 25.4;

pub fn millimeters_to_points(millimeters: f32) -> f32 {
    millimeters * POINTS_PER_MILLIMETER
}

pub fn points_to_millimeters(points: f32) -> f32 {
    points / POINTS_PER_MILLIMETER
}

/// An RGB color with 8-bit components, deserialized from a `[r, g, b]` JSON array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Color {
    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Color { red, green, blue }
    }

    /// The color components scaled into the `0.0..=1.0` range expected by the `rg` and `RG` operators.
    fn components(&self) -> Vec<Object> {
        [self.red, self.green, self.blue]
            .into_iter()
            .map(|component| Object::Real(component as f32 / 255.0))
            .collect()
    }
}

impl From<[u8; 3]> for Color {
    fn from([red, green, blue]: [u8; 3]) -> Self {
        Color { red, green, blue }
    }
}

impl From<Color> for [u8; 3] {
    fn from(color: Color) -> Self {
        [color.red, color.green, color.blue]
    }
}

/// How a closed path is painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintMode {
    Fill,
    Stroke,
    FillStroke,
}

impl PaintMode {
    fn operator(&self) -> &'static str {
        match self {
            PaintMode::Fill => "f",
            PaintMode::Stroke => "S",
            PaintMode::FillStroke => "B",
        }
    }
}

/// An axis-aligned rectangle in millimetres, with its origin in the bottom-left corner of the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// The (insofar) relevant vertical metrics of a font.
#[derive(Clone, Copy, Debug, Default)]
pub struct FontMetrics {
    pub ascent: i16,
    pub descent: i16,
    pub units_per_em: u16,
}

/// The (insofar) relevant metrics associated to a single glyph of a font.
#[derive(Clone, Copy, Debug, Default)]
pub struct GlyphMetrics {
    pub width: u32,
    pub height: u32,
}

/// A font face loaded from a TTF font, together with its measure of units per em.
#[derive(Clone, Debug)]
struct TtfFontFace {
    inner: std::sync::Arc<OwnedFace>,
    units_per_em: u16,
}

impl TtfFontFace {
    /// Parses the face at `face_index`, which is only meaningful for font collections (`.ttc`).
    fn from_bytes(data: &[u8], face_index: u32) -> Result<Self, ContextError> {
        let face = OwnedFace::from_vec(data.to_vec(), face_index)
            .map_err(|error| ContextError::with_error("Failed to parse font", &error))?;
        let units_per_em = face.as_face_ref().units_per_em();

        Ok(Self {
            inner: std::sync::Arc::new(face),
            units_per_em,
        })
    }

    fn face(&self) -> &Face<'_> {
        self.inner.as_face_ref()
    }

    fn font_metrics(&self) -> FontMetrics {
        FontMetrics {
            ascent: self.face().ascender(),
            descent: self.face().descender(),
            units_per_em: self.units_per_em,
        }
    }

    fn glyph_id(&self, codepoint: char) -> Option<u16> {
        self.face()
            .glyph_index(codepoint)
            .map(|glyph_id| glyph_id.0)
    }

    fn glyph_count(&self) -> u16 {
        self.face().number_of_glyphs()
    }

    /// The horizontal advance of a glyph as a fraction of the em square.
    fn advance_in_em(&self, glyph_id: u16) -> Option<f32> {
        self.face()
            .glyph_hor_advance(owned_ttf_parser::GlyphId(glyph_id))
            .map(|advance| advance as f32 / self.units_per_em as f32)
    }

    /// The mapping between glyph IDs and the first character of the unicode subtables that maps to them.
    fn glyph_ids(&self) -> HashMap<u16, char> {
        let font_subtables = self.face().tables().cmap.map(|cmap| {
            cmap.subtables
                .into_iter()
                .filter(|font_subtable| font_subtable.is_unicode())
        });
        let Some(font_subtables) = font_subtables else {
            return HashMap::new();
        };

        let mut gid_to_codepoint_map =
            HashMap::with_capacity(self.face().number_of_glyphs().into());
        for font_subtable in font_subtables {
            font_subtable.codepoints(|codepoint| {
                if let Ok(character) = char::try_from(codepoint) {
                    if let Some(glyph_index) = font_subtable
                        .glyph_index(codepoint)
                        .filter(|index| index.0 > 0)
                    {
                        gid_to_codepoint_map
                            .entry(glyph_index.0)
                            .or_insert(character);
                    }
                }
            })
        }

        gid_to_codepoint_map
    }

    fn glyph_metrics(&self, glyph_id: u16) -> Option<GlyphMetrics> {
        let glyph_id = owned_ttf_parser::GlyphId(glyph_id);
        let width = self.face().glyph_hor_advance(glyph_id)? as u32;
        // Glyphs without outlines (spaces) get a full em as height
        let height = self
            .face()
            .glyph_bounding_box(glyph_id)
            .map(|bounding_box| {
                (bounding_box.y_max - bounding_box.y_min - self.face().descender()) as u32
            })
            .unwrap_or(1000);

        Some(GlyphMetrics { width, height })
    }
}

/// A single font embedded as a composite (`Type0`) font with `Identity-H` encoding.
#[derive(Debug, Clone)]
pub struct Font {
    /// A standalone font program, never a collection.
    bytes: Vec<u8>,
    program_kind: FontProgramKind,
    ttf_face: TtfFontFace,
    face_identifier: String,
}

impl Font {
    /// Width of `text` in points, at `font_size` points. Characters missing from the font do not advance.
    pub fn text_width(&self, text: &str, font_size: f32) -> f32 {
        text.nfc()
            .filter_map(|character| self.ttf_face.glyph_id(character))
            .filter_map(|glyph_id| self.ttf_face.advance_in_em(glyph_id))
            .sum::<f32>()
            * font_size
    }

    fn encode_glyphs(&self, text: &str) -> Vec<u8> {
        let mut glyph_id_bytes = Vec::with_capacity(text.len() * 2);
        for character in text.nfc() {
            match self.ttf_face.glyph_id(character) {
                Some(glyph_id) => glyph_id_bytes.extend_from_slice(&glyph_id.to_be_bytes()),
                None => log::warn!(
                    "Unable to find the character {:?} in the font {}",
                    character,
                    self.face_identifier
                ),
            }
        }
        glyph_id_bytes
    }

    /// Inserts the font program and its descriptors into the document, returning the `Type0` font dictionary.
    fn insert_into_document(&self, inner_document: &mut lopdf::Document) -> lopdf::Dictionary {
        use lopdf::Object::*;
        let face_metrics = self.ttf_face.font_metrics();

        let font_stream_dictionary = match self.program_kind.font_file_subtype() {
            Some(subtype) => lopdf::Dictionary::from_iter(vec![("Subtype", Name(subtype.into()))]),
            None => lopdf::Dictionary::from_iter(vec![("Length1", Integer(self.bytes.len() as i64))]),
        };
        let font_stream = lopdf::Stream::new(font_stream_dictionary, self.bytes.clone());

        let mut font_descriptor: Vec<(std::string::String, Object)> = vec![
            ("Type".into(), Name("FontDescriptor".into())),
            (
                "FontName".into(),
                Name(self.face_identifier.clone().into_bytes()),
            ),
            ("Ascent".into(), Integer(i64::from(face_metrics.ascent))),
            ("Descent".into(), Integer(i64::from(face_metrics.descent))),
            ("CapHeight".into(), Integer(i64::from(face_metrics.ascent))),
            ("ItalicAngle".into(), Integer(0)),
            // Symbolic, which is what an Identity-H encoded CID font is
            ("Flags".into(), Integer(4)),
            ("StemV".into(), Integer(80)),
        ];

        let mut maximum_character_height = 0;
        // Glyph ID -> (codepoint, width)
        let mut glyph_properties = BTreeMap::<u32, (char, u32)>::new();

        for (glyph_id, character) in self.ttf_face.glyph_ids() {
            if let Some(glyph_metrics) = self.ttf_face.glyph_metrics(glyph_id) {
                maximum_character_height = maximum_character_height.max(glyph_metrics.height);
                glyph_properties.insert(glyph_id as u32, (character, glyph_metrics.width));
            }
        }

        // bfchar blocks may not cross a high-byte boundary and hold at most 100 entries
        let mut cmap_blocks: Vec<CmapBlock> = Vec::new();
        let mut current_block = CmapBlock::new();
        let mut current_high_byte = 0;
        for (glyph_id, (character, _)) in glyph_properties.iter() {
            if glyph_id >> 8 != current_high_byte || current_block.len() >= 100 {
                cmap_blocks.push(mem::take(&mut current_block));
                current_high_byte = glyph_id >> 8;
            }
            current_block.push((*glyph_id, *character));
        }
        cmap_blocks.push(current_block);

        let to_unicode_cmap = generate_to_unicode_cmap(&self.face_identifier, cmap_blocks);
        let to_unicode_cmap_id = inner_document.add_object(lopdf::Stream::new(
            lopdf::Dictionary::new(),
            to_unicode_cmap.into_bytes(),
        ));

        // `W` entries look like `first [w1 w2 ...]` over consecutive glyph IDs, in thousandths of an em
        let scaling = 1000.0 / (face_metrics.units_per_em as f32);
        let mut width_objects = Vec::<Object>::new();
        let mut run_start = 0;
        let mut run_end = 0;
        let mut run_widths = Vec::<Object>::new();
        for glyph_id in 0..self.ttf_face.glyph_count() {
            let Some(GlyphMetrics { width, .. }) = self.ttf_face.glyph_metrics(glyph_id) else {
                continue;
            };
            if glyph_id != run_end {
                if !run_widths.is_empty() {
                    width_objects.push(Integer(run_start as i64));
                    width_objects.push(Array(mem::take(&mut run_widths)));
                }
                run_start = glyph_id;
            }
            run_widths.push(Integer((width as f32 * scaling) as i64));
            run_end = glyph_id + 1;
        }
        if !run_widths.is_empty() {
            width_objects.push(Integer(run_start as i64));
            width_objects.push(Array(run_widths));
        }

        font_descriptor.push((
            self.program_kind.font_file_key().into(),
            Reference(inner_document.add_object(font_stream)),
        ));
        font_descriptor.push((
            "FontBBox".into(),
            Array(vec![
                Integer(0),
                Integer(face_metrics.descent as i64),
                Integer(face_metrics.units_per_em as i64),
                Integer(maximum_character_height as i64),
            ]),
        ));
        let font_descriptor_id =
            inner_document.add_object(lopdf::Dictionary::from_iter(font_descriptor));

        let descendant_font = lopdf::Dictionary::from_iter(vec![
            ("Type", Name("Font".into())),
            ("Subtype", Name(self.program_kind.cid_font_subtype().into())),
            ("BaseFont", Name(self.face_identifier.clone().into())),
            (
                "CIDSystemInfo",
                Dictionary(lopdf::Dictionary::from_iter(vec![
                    ("Registry", String("Adobe".into(), StringFormat::Literal)),
                    ("Ordering", String("Identity".into(), StringFormat::Literal)),
                    ("Supplement", Integer(0)),
                ])),
            ),
            ("W", Array(width_objects)),
            ("DW", Integer(1000)),
            ("FontDescriptor", Reference(font_descriptor_id)),
        ]);

        lopdf::Dictionary::from_iter(vec![
            ("Type", Name("Font".into())),
            ("Subtype", Name("Type0".into())),
            ("BaseFont", Name(self.face_identifier.clone().into_bytes())),
            ("Encoding", Name("Identity-H".into())),
            ("DescendantFonts", Array(vec![Dictionary(descendant_font)])),
            ("ToUnicode", Reference(to_unicode_cmap_id)),
        ])
    }
}

/// A decoded raster image, flattened onto white and ready to be embedded as a `DeviceRGB` image.
#[derive(Debug, Clone)]
pub struct ImageXObject {
    pub width: u32,
    pub height: u32,
    pub rgb_data: Vec<u8>,
}

impl ImageXObject {
    pub fn from_path(image_path: &Path) -> Result<Self, ContextError> {
        let image = image::open(image_path).map_err(|error| {
            ContextError::with_path_error("Failed to decode the image", image_path, &error)
        })?;
        Ok(Self::from_dynamic_image(&image))
    }

    pub fn from_dynamic_image(image: &image::DynamicImage) -> Self {
        let rgba_image = image.to_rgba8();
        let (width, height) = rgba_image.dimensions();
        let mut rgb_data = Vec::with_capacity((width * height * 3) as usize);
        for pixel in rgba_image.pixels() {
            let [red, green, blue, alpha] = pixel.0;
            let alpha = alpha as u16;
            for component in [red, green, blue] {
                // Composite over a white background, PDF images here carry no soft mask
                let blended = (component as u16 * alpha + 255 * (255 - alpha)) / 255;
                rgb_data.push(blended as u8);
            }
        }

        ImageXObject {
            width,
            height,
            rgb_data,
        }
    }

    fn into_stream(self) -> lopdf::Stream {
        use lopdf::Object::*;
        lopdf::Stream::new(
            lopdf::Dictionary::from_iter(vec![
                ("Type", Name("XObject".into())),
                ("Subtype", Name("Image".into())),
                ("Width", Integer(self.width as i64)),
                ("Height", Integer(self.height as i64)),
                ("ColorSpace", Name("DeviceRGB".into())),
                ("BitsPerComponent", Integer(8)),
            ]),
            self.rgb_data,
        )
    }
}

/// The metadata written into the document information dictionary.
#[derive(Debug, Clone, Default)]
pub struct DocumentMetadata {
    pub title: String,
    pub author: String,
    pub subject: String,
    pub keywords: String,
    pub creator: String,
    /// `None` stamps the Unix epoch, which keeps repeated builds byte-identical.
    pub creation_date: Option<OffsetDateTime>,
}

/// A single page, with its size in points and the drawing operations accumulated so far.
#[derive(Debug, Clone)]
pub struct PdfPage {
    pub width: f32,
    pub height: f32,
    operations: Vec<Operation>,
    annotations: Vec<lopdf::Dictionary>,
}

impl PdfPage {
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn annotations(&self) -> &[lopdf::Dictionary] {
        &self.annotations
    }
}

/// A PDF document under construction, addressed in millimetres with the origin at the bottom-left corner.
pub struct PdfDocument {
    fonts: BTreeMap<String, (lopdf::ObjectId, Font)>,
    images: BTreeMap<String, lopdf::ObjectId>,
    pub inner_document: lopdf::Document,
    pub identifier: String,
    pub metadata: DocumentMetadata,
    pages: Vec<PdfPage>,
    finalized: bool,
}

impl PdfDocument {
    pub fn new<S: Into<String>>(pdf_document_identifier: S) -> Self {
        PdfDocument {
            fonts: BTreeMap::default(),
            images: BTreeMap::default(),
            inner_document: lopdf::Document::with_version("1.5"),
            identifier: pdf_document_identifier.into(),
            metadata: DocumentMetadata::default(),
            pages: Vec::new(),
            finalized: false,
        }
    }

    /// Appends an empty page of the given size in millimetres and returns its index.
    pub fn add_page(&mut self, page_width: f32, page_height: f32) -> usize {
        self.pages.push(PdfPage {
            width: millimeters_to_points(page_width),
            height: millimeters_to_points(page_height),
            operations: Vec::new(),
            annotations: Vec::new(),
        });
        self.pages.len() - 1
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page(&self, page_index: usize) -> Option<&PdfPage> {
        self.pages.get(page_index)
    }

    /// Loads a TrueType or OpenType font; for collections the first face is extracted.
    pub fn add_font(&mut self, font_path: &Path) -> Result<usize, ContextError> {
        let font_bytes = std::fs::read(font_path).map_err(|error| {
            ContextError::with_path_error("Failed to read the font", font_path, &error)
        })?;
        self.add_font_from_bytes(font_bytes)
    }

    pub fn add_font_from_bytes(&mut self, font_bytes: Vec<u8>) -> Result<usize, ContextError> {
        let font_bytes = sfnt::extract_face(&font_bytes, 0)?;
        let program_kind = FontProgramKind::detect(&font_bytes)?;
        let ttf_face = TtfFontFace::from_bytes(&font_bytes, 0)?;
        let font_index = self.fonts.len();
        let font = Font {
            bytes: font_bytes,
            program_kind,
            ttf_face,
            face_identifier: format!("F{font_index}"),
        };
        let font_object_id = self.inner_document.new_object_id();
        self.fonts
            .insert(font.face_identifier.clone(), (font_object_id, font));

        Ok(font_index)
    }

    pub fn font(&self, font_index: usize) -> Result<&Font, ContextError> {
        self.fonts
            .get(&format!("F{font_index}"))
            .map(|(_, font)| font)
            .ok_or(ContextError::with_context(format!(
                "Failed to find font {} into the fonts map",
                font_index
            )))
    }

    /// Width of `text` in millimetres.
    pub fn text_width(
        &self,
        font_index: usize,
        font_size: f32,
        text: &str,
    ) -> Result<f32, ContextError> {
        Ok(points_to_millimeters(
            self.font(font_index)?.text_width(text, font_size),
        ))
    }

    /// Registers an image and returns the name under which it can be placed on any page.
    pub fn add_image(&mut self, image: ImageXObject) -> String {
        let image_name = format!("Im{}", self.images.len());
        let image_id = self.inner_document.add_object(image.into_stream());
        self.images.insert(image_name.clone(), image_id);
        image_name
    }

    /// Writes `text` with its baseline starting at `position` (millimetres).
    pub fn write_text(
        &mut self,
        page_index: usize,
        font_index: usize,
        font_size: f32,
        color: Color,
        position: [f32; 2],
        text: &str,
    ) -> Result<(), ContextError> {
        let glyph_id_bytes = self.font(font_index)?.encode_glyphs(text);
        let [x, y] = position;

        self.add_operations(
            page_index,
            vec![
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tf",
                    vec![
                        Object::Name(format!("F{font_index}").into_bytes()),
                        font_size.into(),
                    ],
                ),
                Operation::new(
                    "Td",
                    vec![
                        millimeters_to_points(x).into(),
                        millimeters_to_points(y).into(),
                    ],
                ),
                Operation::new("rg", color.components()),
                Operation::new(
                    "Tj",
                    vec![Object::String(glyph_id_bytes, StringFormat::Hexadecimal)],
                ),
                Operation::new("ET", vec![]),
            ],
        )
    }

    pub fn draw_rectangle(
        &mut self,
        page_index: usize,
        rectangle: Rectangle,
        paint_mode: PaintMode,
        fill_color: Color,
        stroke_color: Color,
        line_width: f32,
    ) -> Result<(), ContextError> {
        self.add_operations(
            page_index,
            vec![
                Operation::new("q", vec![]),
                Operation::new("rg", fill_color.components()),
                Operation::new("RG", stroke_color.components()),
                Operation::new("w", vec![millimeters_to_points(line_width).into()]),
                Operation::new(
                    "re",
                    vec![
                        millimeters_to_points(rectangle.x).into(),
                        millimeters_to_points(rectangle.y).into(),
                        millimeters_to_points(rectangle.width).into(),
                        millimeters_to_points(rectangle.height).into(),
                    ],
                ),
                Operation::new(paint_mode.operator(), vec![]),
                Operation::new("Q", vec![]),
            ],
        )
    }

    pub fn draw_line(
        &mut self,
        page_index: usize,
        from: [f32; 2],
        to: [f32; 2],
        color: Color,
        line_width: f32,
    ) -> Result<(), ContextError> {
        self.add_operations(
            page_index,
            vec![
                Operation::new("q", vec![]),
                Operation::new("RG", color.components()),
                Operation::new("w", vec![millimeters_to_points(line_width).into()]),
                Operation::new(
                    "m",
                    vec![
                        millimeters_to_points(from[0]).into(),
                        millimeters_to_points(from[1]).into(),
                    ],
                ),
                Operation::new(
                    "l",
                    vec![
                        millimeters_to_points(to[0]).into(),
                        millimeters_to_points(to[1]).into(),
                    ],
                ),
                Operation::new("S", vec![]),
                Operation::new("Q", vec![]),
            ],
        )
    }

    /// Places a registered image so that it fills `rectangle`.
    pub fn place_image(
        &mut self,
        page_index: usize,
        image_name: &str,
        rectangle: Rectangle,
    ) -> Result<(), ContextError> {
        if !self.images.contains_key(image_name) {
            return Err(ContextError::with_context(format!(
                "Failed to find the image {:?}",
                image_name
            )));
        }
        self.add_operations(
            page_index,
            vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        millimeters_to_points(rectangle.width).into(),
                        0.into(),
                        0.into(),
                        millimeters_to_points(rectangle.height).into(),
                        millimeters_to_points(rectangle.x).into(),
                        millimeters_to_points(rectangle.y).into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(image_name.as_bytes().to_vec())]),
                Operation::new("Q", vec![]),
            ],
        )
    }

    /// Makes `rectangle` a clickable link to `uri`.
    pub fn add_link(
        &mut self,
        page_index: usize,
        rectangle: Rectangle,
        uri: &str,
    ) -> Result<(), ContextError> {
        use lopdf::Object::*;
        let annotation = lopdf::Dictionary::from_iter(vec![
            ("Type", Name("Annot".into())),
            ("Subtype", Name("Link".into())),
            (
                "Rect",
                Array(vec![
                    millimeters_to_points(rectangle.x).into(),
                    millimeters_to_points(rectangle.y).into(),
                    millimeters_to_points(rectangle.x + rectangle.width).into(),
                    millimeters_to_points(rectangle.y + rectangle.height).into(),
                ]),
            ),
            ("Border", Array(vec![Integer(0), Integer(0), Integer(0)])),
            (
                "A",
                Dictionary(lopdf::Dictionary::from_iter(vec![
                    ("S", Name("URI".into())),
                    ("URI", String(uri.as_bytes().to_vec(), StringFormat::Literal)),
                ])),
            ),
        ]);
        self.get_mut_page(page_index)?.annotations.push(annotation);
        Ok(())
    }

    /// Builds the catalog, the page tree and the resources. Further drawing is rejected afterwards.
    pub fn write_all(&mut self, instance_id: &str) -> Result<(), ContextError> {
        use lopdf::Object::*;

        if self.finalized {
            return Ok(());
        }
        if self.pages.is_empty() {
            return Err(ContextError::with_context(
                "Unable to write a PDF document without pages",
            ));
        }

        let timestamp = to_pdf_timestamp_format(
            &self
                .metadata
                .creation_date
                .unwrap_or(OffsetDateTime::UNIX_EPOCH),
        );
        let document_info = lopdf::Dictionary::from_iter(vec![
            ("Title", text_string(&self.metadata.title)),
            ("Author", text_string(&self.metadata.author)),
            ("Subject", text_string(&self.metadata.subject)),
            ("Keywords", text_string(&self.metadata.keywords)),
            ("Creator", text_string(&self.metadata.creator)),
            ("Producer", text_string(env!("CARGO_PKG_NAME"))),
            (
                "CreationDate",
                String(timestamp.clone().into_bytes(), StringFormat::Literal),
            ),
            (
                "ModDate",
                String(timestamp.into_bytes(), StringFormat::Literal),
            ),
        ]);
        let document_info_id = self.inner_document.add_object(Dictionary(document_info));

        let pages_id = self.inner_document.new_object_id();
        let catalog = lopdf::Dictionary::from_iter(vec![
            ("Type", "Catalog".into()),
            ("PageLayout", "OneColumn".into()),
            ("PageMode", "UseNone".into()),
            ("Pages", Reference(pages_id)),
        ]);
        let catalog_id = self.inner_document.add_object(catalog);

        self.inner_document
            .trailer
            .set("Root", Reference(catalog_id));
        self.inner_document
            .trailer
            .set("Info", Reference(document_info_id));
        self.inner_document.trailer.set(
            "ID",
            Array(vec![
                String(self.identifier.clone().into_bytes(), StringFormat::Literal),
                String(instance_id.as_bytes().to_vec(), StringFormat::Literal),
            ]),
        );

        let fonts_dictionary = self.insert_fonts_into_document();
        let xobjects_dictionary: lopdf::Dictionary = self
            .images
            .iter()
            .map(|(name, object_id)| (name.clone(), Reference(*object_id)))
            .collect();
        let mut resources = lopdf::Dictionary::from_iter(vec![("Font", Dictionary(fonts_dictionary))]);
        if !xobjects_dictionary.is_empty() {
            resources.set("XObject", Dictionary(xobjects_dictionary));
        }
        let resources_id = self.inner_document.add_object(Dictionary(resources));

        let mut page_ids = Vec::<Object>::with_capacity(self.pages.len());
        for page in self.pages.iter() {
            let media_box: Object = vec![0.into(), 0.into(), page.width.into(), page.height.into()].into();
            let content = lopdf::content::Content {
                operations: page.operations.clone(),
            };
            let content_bytes = content.encode().map_err(|error| {
                ContextError::with_error("Failed to encode the page content", &error)
            })?;
            let content_id = self
                .inner_document
                .add_object(lopdf::Stream::new(lopdf::Dictionary::new(), content_bytes));
            let annotation_ids: Vec<Object> = page
                .annotations
                .iter()
                .map(|annotation| {
                    Reference(self.inner_document.add_object(Dictionary(annotation.clone())))
                })
                .collect();

            let page_dictionary = lopdf::Dictionary::from_iter(vec![
                ("Type", "Page".into()),
                ("Parent", Reference(pages_id)),
                ("MediaBox", media_box.clone()),
                ("CropBox", media_box),
                ("Resources", Reference(resources_id)),
                ("Contents", Reference(content_id)),
                ("Annots", Array(annotation_ids)),
            ]);
            page_ids.push(Reference(self.inner_document.add_object(page_dictionary)));
        }

        let pages = lopdf::Dictionary::from_iter(vec![
            ("Type", "Pages".into()),
            ("Count", Integer(page_ids.len() as i64)),
            ("Kids", Array(page_ids)),
        ]);
        self.inner_document
            .objects
            .insert(pages_id, Dictionary(pages));

        self.inner_document.compress();
        self.finalized = true;
        Ok(())
    }

    pub fn save_to_bytes(&mut self, instance_id: &str) -> Result<Vec<u8>, ContextError> {
        self.write_all(instance_id)?;
        let mut pdf_document_bytes = Vec::new();
        let mut writer = BufWriter::new(&mut pdf_document_bytes);
        self.inner_document.save_to(&mut writer).map_err(|error| {
            ContextError::with_error("Error while saving the PDF document to bytes", &error)
        })?;
        mem::drop(writer);

        Ok(pdf_document_bytes)
    }

    pub fn save(&mut self, instance_id: &str, output_path: &Path) -> Result<(), ContextError> {
        let pdf_document_bytes = self.save_to_bytes(instance_id)?;
        std::fs::write(output_path, pdf_document_bytes).map_err(|error| {
            ContextError::with_error(
                format!("Failed to write the PDF document to {:?}", output_path),
                &error,
            )
        })
    }

    fn insert_fonts_into_document(&mut self) -> lopdf::Dictionary {
        let mut font_dictionary = lopdf::Dictionary::new();

        for (font_id, (object_id, font)) in self.fonts.iter() {
            let collected_font_dictionary = font.insert_into_document(&mut self.inner_document);
            self.inner_document
                .objects
                .insert(*object_id, Object::Dictionary(collected_font_dictionary));
            font_dictionary.set(font_id.clone(), Object::Reference(*object_id));
        }
        font_dictionary
    }

    fn add_operations(
        &mut self,
        page_index: usize,
        operations: Vec<Operation>,
    ) -> Result<(), ContextError> {
        self.get_mut_page(page_index)?.operations.extend(operations);
        Ok(())
    }

    fn get_mut_page(&mut self, page_index: usize) -> Result<&mut PdfPage, ContextError> {
        if self.finalized {
            return Err(ContextError::with_context(
                "The PDF document has already been written",
            ));
        }
        self.pages
            .get_mut(page_index)
            .ok_or(ContextError::with_context(format!(
                "Failed to find the page with index {}",
                page_index
            )))
    }
}

type GlyphId = u32;
type CmapBlock = Vec<(GlyphId, char)>;

fn generate_to_unicode_cmap(face_name: &str, cmap_blocks: Vec<CmapBlock>) -> String {
    let mut cmap = format!(
        "/CIDInit /ProcSet findresource begin\n\
         12 dict begin\n\
         begincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /{face_name}-UCS def\n\
         /CMapType 2 def\n\
         1 begincodespacerange\n\
         <0000> <FFFF>\n\
         endcodespacerange\n"
    );

    for cmap_block in cmap_blocks.into_iter().filter(|block| !block.is_empty()) {
        cmap.push_str(&format!("{} beginbfchar\n", cmap_block.len()));
        for (glyph_id, character) in cmap_block {
            // Characters outside the BMP are written as UTF-16 surrogate pairs
            let mut utf16 = [0u16; 2];
            let destination: String = character
                .encode_utf16(&mut utf16)
                .iter()
                .map(|unit| format!("{unit:04x}"))
                .collect();
            cmap.push_str(&format!("<{glyph_id:04x}> <{destination}>\n"));
        }
        cmap.push_str("endbfchar\n");
    }

    cmap.push_str(
        "endcmap\n\
         CMapName currentdict /CMap defineresource pop\n\
         end\n\
         end\n",
    );
    cmap
}

/// Encodes a text string as PDFDocEncoding when it is plain ASCII and as UTF-16BE with a byte order mark otherwise.
fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::String(text.as_bytes().to_vec(), StringFormat::Literal);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

fn to_pdf_timestamp_format(date: &OffsetDateTime) -> String {
    let offset = date.offset();
    let offset_sign = if offset.is_negative() { '-' } else { '+' };
    format!(
        "D:{:04}{:02}{:02}{:02}{:02}{:02}{offset_sign}{:02}'{:02}'",
        date.year(),
        u8::from(date.month()),
        date.day(),
        date.hour(),
        date.minute(),
        date.second(),
        offset.whole_hours().abs(),
        offset.minutes_past_hour().abs(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_strings_switch_to_utf16_for_non_ascii() {
        let Object::String(bytes, StringFormat::Literal) = text_string("Newsletter") else {
            panic!("ASCII text should be a literal string");
        };
        assert_eq!(bytes, b"Newsletter");

        let Object::String(bytes, StringFormat::Hexadecimal) = text_string("号") else {
            panic!("non-ASCII text should be a hexadecimal string");
        };
        assert_eq!(bytes, [0xFE, 0xFF, 0x53, 0xF7]);
    }

    #[test]
    fn timestamps_use_the_pdf_date_syntax() {
        assert_eq!(
            to_pdf_timestamp_format(&OffsetDateTime::UNIX_EPOCH),
            "D:19700101000000+00'00'"
        );
    }

    #[test]
    fn to_unicode_cmap_writes_surrogate_pairs() {
        let cmap = generate_to_unicode_cmap("F0", vec![vec![(3, 'A'), (4, '𠮷')], vec![]]);
        assert!(cmap.contains("2 beginbfchar\n"));
        assert!(cmap.contains("<0003> <0041>\n"));
        assert!(cmap.contains("<0004> <d842dfb7>\n"));
        assert_eq!(cmap.matches("beginbfchar").count(), 1);
    }

    #[test]
    fn shapes_are_recorded_on_their_page() {
        let mut document = PdfDocument::new("test");
        let first_page = document.add_page(210.0, 297.0);
        let second_page = document.add_page(210.0, 297.0);
        let rectangle = Rectangle {
            x: 15.0,
            y: 100.0,
            width: 180.0,
            height: 20.0,
        };
        document
            .draw_rectangle(
                second_page,
                rectangle,
                PaintMode::FillStroke,
                Color::rgb(248, 250, 252),
                Color::rgb(226, 232, 240),
                0.2,
            )
            .unwrap();
        document
            .add_link(second_page, rectangle, "https://example.com/")
            .unwrap();

        assert!(document.page(first_page).unwrap().operations().is_empty());
        let operators: Vec<&str> = document
            .page(second_page)
            .unwrap()
            .operations()
            .iter()
            .map(|operation| operation.operator.as_str())
            .collect();
        assert_eq!(operators, ["q", "rg", "RG", "w", "re", "B", "Q"]);
        assert_eq!(document.page(second_page).unwrap().annotations().len(), 1);
    }

    #[test]
    fn saved_documents_reload_with_every_page() {
        let mut document = PdfDocument::new("test");
        for _ in 0..3 {
            let page_index = document.add_page(210.0, 297.0);
            document
                .draw_line(
                    page_index,
                    [15.0, 20.0],
                    [195.0, 20.0],
                    Color::rgb(226, 232, 240),
                    0.2,
                )
                .unwrap();
        }
        let bytes = document.save_to_bytes("instance").unwrap();
        let reloaded = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(reloaded.get_pages().len(), 3);
        assert_eq!(document.page_count(), 3);

        assert!(document.draw_line(0, [0.0, 0.0], [1.0, 1.0], Color::rgb(0, 0, 0), 0.1).is_err());
    }

    /// Wraps a single font into a one-face collection, shifting its table offsets behind the header.
    fn wrap_in_collection(font: &[u8]) -> Vec<u8> {
        const HEADER_LENGTH: u32 = 16;
        let table_count = u16::from_be_bytes([font[4], font[5]]) as usize;
        let mut shifted = font.to_vec();
        for table_index in 0..table_count {
            let offset_position = 12 + table_index * 16 + 8;
            let offset = u32::from_be_bytes(font[offset_position..offset_position + 4].try_into().unwrap());
            shifted[offset_position..offset_position + 4]
                .copy_from_slice(&(offset + HEADER_LENGTH).to_be_bytes());
        }

        let mut collection = b"ttcf".to_vec();
        collection.extend_from_slice(&0x0001_0000u32.to_be_bytes());
        collection.extend_from_slice(&1u32.to_be_bytes());
        collection.extend_from_slice(&HEADER_LENGTH.to_be_bytes());
        collection.extend_from_slice(&shifted);
        collection
    }

    fn dictionary_of_type<'a>(document: &'a lopdf::Document, type_name: &str) -> Option<&'a lopdf::Dictionary> {
        document.objects.values().find_map(|object| {
            object
                .as_dict()
                .ok()
                .filter(|dictionary| dictionary.get(b"Type").and_then(Object::as_name_str).ok() == Some(type_name))
        })
    }

    #[test]
    fn collections_are_embedded_as_a_standalone_first_face() {
        let font_bytes = std::fs::read(crate::composer::tests::test_font()).unwrap();
        let mut document = PdfDocument::new("test");
        let font_index = document
            .add_font_from_bytes(wrap_in_collection(&font_bytes))
            .unwrap();
        let page_index = document.add_page(210.0, 297.0);
        document
            .write_text(page_index, font_index, 10.0, Color::rgb(0, 0, 0), [15.0, 20.0], "Colophon")
            .unwrap();
        assert!(document.text_width(font_index, 10.0, "Colophon").unwrap() > 0.0);

        let bytes = document.save_to_bytes("instance").unwrap();
        let reloaded = lopdf::Document::load_mem(&bytes).unwrap();
        let descriptor = dictionary_of_type(&reloaded, "FontDescriptor").unwrap();
        assert!(!descriptor.has(b"FontFile3"));
        let font_file_id = descriptor.get(b"FontFile2").and_then(Object::as_reference).unwrap();
        let font_file = reloaded.get_object(font_file_id).and_then(Object::as_stream).unwrap();
        let program = font_file.decompressed_content().unwrap_or_else(|_| font_file.content.clone());
        assert_eq!(&program[..4], &[0, 1, 0, 0]);

        let type0_font = dictionary_of_type(&reloaded, "Font").unwrap();
        let descendant = type0_font
            .get(b"DescendantFonts")
            .and_then(Object::as_array)
            .unwrap()[0]
            .as_dict()
            .unwrap();
        assert_eq!(
            descendant.get(b"Subtype").and_then(Object::as_name_str).unwrap(),
            "CIDFontType2"
        );
    }

    #[test]
    fn writing_an_empty_document_is_an_error() {
        let mut document = PdfDocument::new("test");
        assert!(document.save_to_bytes("instance").is_err());
    }
}
