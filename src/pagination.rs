use serde::{Deserialize, Serialize};

use crate::composer::{Align, Composer, FontStyle};
use crate::content::palette;
use crate::error::ContextError;
use crate::pdf::{Color, PaintMode};

/// What to do before drawing a block of a known height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageBreak {
    Continue,
    NewPage,
}

/// Breaks when the block would cross `bottom_limit`, unless the cursor is already at the top of a page,
/// where a taller-than-page block is drawn anyway rather than breaking forever.
pub fn decide_page_break(cursor_y: f32, height: f32, page_top: f32, bottom_limit: f32) -> PageBreak {
    if cursor_y + height > bottom_limit && cursor_y > page_top {
        PageBreak::NewPage
    } else {
        PageBreak::Continue
    }
}

/// A titled text block drawn inside a bordered box.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentBlock {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub link: Option<String>,
}

/// Empirical constants of the height estimate, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxMetrics {
    /// Characters of body text per wrapped line, counting each Japanese glyph as one.
    pub chars_per_line: usize,
    pub line_height: f32,
    pub title_height: f32,
    pub padding_top: f32,
    pub padding_bottom: f32,
    pub minimum_height: f32,
}

impl BoxMetrics {
    /// 8.5 pt text in a box spanning the 180 mm content width of A4, leaving 170 mm inside its
    /// 5 mm padding.
    pub const NEWSLETTER: BoxMetrics = BoxMetrics {
        chars_per_line: 38,
        line_height: 5.0,
        title_height: 7.0,
        padding_top: 4.0,
        padding_bottom: 4.0,
        minimum_height: 16.0,
    };

    /// Sum of `ceil(chars / chars_per_line)` over the `\n`-separated paragraphs.
    /// An empty paragraph still takes one line.
    pub fn estimated_line_count(&self, body: &str) -> usize {
        let chars_per_line = self.chars_per_line.max(1);
        body.split('\n')
            .map(|paragraph| {
                let characters = paragraph.chars().count();
                characters.div_ceil(chars_per_line).max(1)
            })
            .sum()
    }

    pub fn estimate_box_height(&self, block: &ContentBlock) -> f32 {
        let mut line_count = self.estimated_line_count(&block.body);
        if block.link.is_some() {
            line_count += 1;
        }
        let title_height = if block.title.is_empty() {
            0.0
        } else {
            self.title_height
        };
        let height = self.padding_top
            + title_height
            + line_count as f32 * self.line_height
            + self.padding_bottom;

        height.max(self.minimum_height)
    }
}

impl Default for BoxMetrics {
    fn default() -> Self {
        BoxMetrics::NEWSLETTER
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxStyle {
    pub fill_color: Color,
    pub border_color: Color,
    pub title_color: Color,
    pub body_color: Color,
    pub link_color: Color,
    pub title_size: f32,
    pub body_size: f32,
    /// Horizontal distance between the border and the text.
    pub inner_padding: f32,
    /// Vertical space left below the box.
    pub spacing_after: f32,
}

impl Default for BoxStyle {
    fn default() -> Self {
        BoxStyle {
            fill_color: palette::BG_LIGHT,
            border_color: palette::BORDER,
            title_color: palette::DARK,
            body_color: palette::SECONDARY,
            link_color: palette::TOKI_BLUE,
            title_size: 10.0,
            body_size: 8.5,
            inner_padding: 5.0,
            spacing_after: 2.0,
        }
    }
}

/// Where a content box ended up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxPlacement {
    pub page_index: usize,
    pub top: f32,
    pub height: f32,
    pub broke_page: bool,
}

/// Draws `block` as a bordered box spanning from `x` over `width`, starting a new page first when
/// the estimated height does not fit below the cursor. The whole box is drawn on one page.
pub fn place_content_box(
    composer: &mut Composer,
    block: &ContentBlock,
    metrics: &BoxMetrics,
    style: &BoxStyle,
    x: f32,
    width: f32,
) -> Result<BoxPlacement, ContextError> {
    let height = metrics.estimate_box_height(block);
    let broke_page = composer.ensure_space(height)?;
    let page_index = composer.current_page()?;
    let top = composer.y();
    log::debug!(
        "Placing the box {:?} ({:.1} mm) on page {} at {:.1} mm",
        block.title,
        height,
        page_index + 1,
        top
    );

    let auto_page_break = composer.auto_page_break();
    composer.set_auto_page_break(false);
    let drawn = draw_box(composer, block, metrics, style, x, width, top, height);
    composer.set_auto_page_break(auto_page_break);
    drawn?;

    composer.set_y(top + height + style.spacing_after);

    Ok(BoxPlacement {
        page_index,
        top,
        height,
        broke_page,
    })
}

#[allow(clippy::too_many_arguments)]
fn draw_box(
    composer: &mut Composer,
    block: &ContentBlock,
    metrics: &BoxMetrics,
    style: &BoxStyle,
    x: f32,
    width: f32,
    top: f32,
    height: f32,
) -> Result<(), ContextError> {
    let text_x = x + style.inner_padding;
    let text_width = width - 2.0 * style.inner_padding;

    composer.set_fill_color(style.fill_color);
    composer.set_draw_color(style.border_color);
    composer.set_line_width(0.2);
    composer.rect(x, top, width, height, PaintMode::FillStroke)?;

    composer.set_xy(text_x, top + metrics.padding_top);
    if !block.title.is_empty() {
        composer.set_font(FontStyle::Bold, style.title_size);
        composer.set_text_color(style.title_color);
        composer.cell(text_width, metrics.title_height, &block.title, Align::Left)?;
        composer.set_xy(text_x, top + metrics.padding_top + metrics.title_height);
    }

    composer.set_font(FontStyle::Regular, style.body_size);
    composer.set_text_color(style.body_color);
    composer.multi_cell(text_width, metrics.line_height, &block.body, Align::Left)?;

    if let Some(link) = &block.link {
        let link_y = composer.y();
        composer.set_x(text_x);
        composer.set_text_color(style.link_color);
        composer.cell(text_width, metrics.line_height, link, Align::Left)?;
        composer.link(text_x, link_y, text_width, metrics.line_height, link)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::composer::tests::test_composer;
    use crate::composer::PageGeometry;

    const ALPHABET: &[char] = &[
        'あ', 'い', 'う', '存', '在', '証', '明', 'a', 'b', 'c', ' ', '、', '。',
    ];

    fn random_body(rng: &mut StdRng) -> String {
        let paragraph_count = rng.gen_range(1..6);
        (0..paragraph_count)
            .map(|_| {
                let length = rng.gen_range(0..200);
                (0..length)
                    .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())])
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn block(body: &str) -> ContentBlock {
        ContentBlock {
            title: "見出し".to_string(),
            body: body.to_string(),
            link: None,
        }
    }

    #[test]
    fn line_count_rounds_each_paragraph_up() {
        let metrics = BoxMetrics::NEWSLETTER;
        assert_eq!(metrics.estimated_line_count(""), 1);
        assert_eq!(metrics.estimated_line_count(&"あ".repeat(38)), 1);
        assert_eq!(metrics.estimated_line_count(&"あ".repeat(39)), 2);
        assert_eq!(
            metrics.estimated_line_count(&format!("{}\n\n{}", "a".repeat(10), "い".repeat(80))),
            1 + 1 + 3
        );
    }

    #[test]
    fn newsletter_boxes_leave_a_170_mm_text_column() {
        let content_width = PageGeometry::A4_PORTRAIT.content_width();
        assert_eq!(content_width, 180.0);
        assert_eq!(content_width - 2.0 * BoxStyle::default().inner_padding, 170.0);
    }

    #[test]
    fn height_adds_title_padding_and_link_rows() {
        let metrics = BoxMetrics::NEWSLETTER;
        let mut content = block(&"あ".repeat(38 * 4));
        assert_eq!(metrics.estimate_box_height(&content), 4.0 + 7.0 + 20.0 + 4.0);

        content.link = Some("https://tokistorage.github.io/lp/".to_string());
        assert_eq!(metrics.estimate_box_height(&content), 4.0 + 7.0 + 25.0 + 4.0);

        let short = ContentBlock {
            title: String::new(),
            body: "a".to_string(),
            link: None,
        };
        assert_eq!(metrics.estimate_box_height(&short), 16.0);
    }

    #[test]
    fn break_decision_respects_the_bottom_limit() {
        assert_eq!(decide_page_break(100.0, 172.0, 15.0, 272.0), PageBreak::Continue);
        assert_eq!(decide_page_break(100.0, 172.5, 15.0, 272.0), PageBreak::NewPage);
        // A box taller than a page is drawn from the top instead of breaking again.
        assert_eq!(decide_page_break(15.0, 400.0, 15.0, 272.0), PageBreak::Continue);
    }

    #[test]
    fn estimate_and_decision_are_repeatable() {
        let mut rng = StdRng::seed_from_u64(7);
        let metrics = BoxMetrics::NEWSLETTER;
        for _ in 0..200 {
            let content = block(&random_body(&mut rng));
            let cursor_y = rng.gen_range(15.0..272.0);
            let first = metrics.estimate_box_height(&content);
            let second = metrics.estimate_box_height(&content.clone());
            assert_eq!(first, second);
            assert_eq!(
                decide_page_break(cursor_y, first, 15.0, 272.0),
                decide_page_break(cursor_y, second, 15.0, 272.0)
            );
        }
    }

    #[test]
    fn boxes_never_cross_the_bottom_limit() {
        let geometry = PageGeometry::A4_PORTRAIT;
        let metrics = BoxMetrics::NEWSLETTER;
        let mut rng = StdRng::seed_from_u64(42);
        let mut cursor_y = geometry.margin_top;

        for _ in 0..500 {
            let height = metrics.estimate_box_height(&block(&random_body(&mut rng)));
            if decide_page_break(cursor_y, height, geometry.margin_top, geometry.bottom_limit())
                == PageBreak::NewPage
            {
                cursor_y = geometry.margin_top;
            }
            assert!(
                cursor_y + height <= geometry.bottom_limit() || cursor_y == geometry.margin_top
            );
            cursor_y += height + 2.0;
        }
    }

    #[test]
    fn every_box_is_drawn_on_a_single_page() {
        let mut composer = test_composer();
        composer.add_page().unwrap();
        let metrics = BoxMetrics::NEWSLETTER;
        let style = BoxStyle::default();
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..40 {
            let content = block(&random_body(&mut rng));
            let pages_before = composer.page_count();
            let placement =
                place_content_box(&mut composer, &content, &metrics, &style, 15.0, 180.0).unwrap();

            assert_eq!(composer.page_count(), placement.page_index + 1);
            assert_eq!(placement.broke_page, composer.page_count() > pages_before);
            assert!(
                placement.top + placement.height <= composer.geometry().bottom_limit()
                    || placement.top == composer.geometry().margin_top
            );
        }
        assert!(composer.auto_page_break());
    }
}
