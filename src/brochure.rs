use std::path::{Path, PathBuf};

use crate::composer::{Align, Composer, FontStyle, PageGeometry};
use crate::config::ClientConfig;
use crate::content::{self, palette};
use crate::error::ContextError;
use crate::newsletter::{create_output_directory, BuildOutput};
use crate::pdf::{Color, DocumentMetadata, PaintMode};
use crate::qr::draw_qr_code;

/// A4 portrait with 12 mm margins all around; the brochure is a single page without page breaks.
pub const BROCHURE_GEOMETRY: PageGeometry = PageGeometry {
    width: 210.0,
    height: 297.0,
    margin_left: 12.0,
    margin_right: 12.0,
    margin_top: 12.0,
    margin_bottom: 12.0,
};

const LAYER_CARD_HEIGHT: f32 = 40.0;
const TOKIQR_BOX_HEIGHT: f32 = 50.0;
const CONTACT_QR_SIZE: f32 = 28.0;

/// One of the three storage layers, shown as a card.
#[derive(Debug, Clone, Copy)]
pub struct LayerCard {
    pub title: &'static str,
    pub subtitle: &'static str,
    /// Lines separated by `\n`.
    pub description: &'static str,
}

/// The text of the brochure in one language.
#[derive(Debug, Clone, Copy)]
pub struct BrochureCopy {
    pub file_name: &'static str,
    pub subtitle: &'static str,
    pub tagline: &'static str,
    pub tagline_size: f32,
    pub hook: &'static str,
    pub hook_lines: [&'static str; 2],
    pub layers_title: &'static str,
    pub layers: [LayerCard; 3],
    pub tokiqr_title: &'static str,
    pub tokiqr_items: [&'static str; 6],
    pub bullet: &'static str,
    pub areas_title: &'static str,
    pub areas: [(&'static str, &'static str); 3],
    pub pricing_title: &'static str,
    pub pricing: &'static str,
    pub pricing_note: &'static str,
    pub contact_name: &'static str,
    pub representative: &'static str,
    pub address: &'static str,
    pub document_title: &'static str,
    pub document_author: &'static str,
    pub keywords: &'static str,
}

pub const JAPANESE_BROCHURE: BrochureCopy = BrochureCopy {
    file_name: "tokistorage-brochure.pdf",
    subtitle: "トキストレージ",
    tagline: "存在証明の民主化",
    tagline_size: 22.0,
    hook: "あなたの曾祖父母の顔と声、わかりますか？",
    hook_lines: [
        "歴史に名を残せるのは一握り。普通の人の存在は、3世代で忘れ去られる。",
        "三層の分散保管で、声と記憶を1000年先に届ける。それがトキストレージです。",
    ],
    layers_title: "三層分散保管アーキテクチャ",
    layers: [
        LayerCard {
            title: "物理層",
            subtitle: "石英ガラス・UVラミネート",
            description: "記録そのものが手元の実物に\n石英1000年・UV更新可",
        },
        LayerCard {
            title: "国家層",
            subtitle: "国立国会図書館",
            description: "国会図書館法による\n永久保存",
        },
        LayerCard {
            title: "民間層",
            subtitle: "GitHub",
            description: "無料の公開基盤で永続管理\n維持費は一切不要",
        },
    ],
    tokiqr_title: "TokiQR ── 声を刻むQRコード",
    tokiqr_items: [
        "PCT国際特許手続き中の独自符号化技術",
        "QR1枚に最大30秒の声を記録",
        "サーバー不要・オフライン再生・スマートフォンだけで再生可能",
        "印刷対応・自社サービスへの組み込み自由",
        "セットアップページでQRシール1枚からカスタム展開（スタンプラリー・観光・イベント）",
        "無料で今すぐ体験 → tokistorage.github.io/qr/",
    ],
    bullet: "・",
    areas_title: "事業領域",
    areas: [
        ("個人向け", "結婚式の誓い、終活メッセージ、家族の記録、成長記録"),
        ("法人向け", "おもてなし音声、ブランドストーリー、社史・創業の想い"),
        ("行政向け", "文化財音声保存、防災メッセージ、地域の語り部記録"),
    ],
    pricing_title: "料金",
    pricing: "TokiQR（音声QRコード作成）: 無料｜三層保管プラン: ¥5,000〜｜石英ガラス: ¥50,000〜",
    pricing_note: "詳しい料金プランはWebサイトをご覧ください",
    contact_name: "TokiStorage ／ トキストレージ",
    representative: "代表：佐藤卓也",
    address: "〒279-0014 千葉県浦安市明海2-11-13（佐渡島に物理保管拠点を設置予定）",
    document_title: "TokiStorage ブローシャ",
    document_author: "TokiStorage（佐藤卓也）",
    keywords: "TokiStorage トキストレージ 存在証明 音声保存 QRコード",
};

pub const ENGLISH_BROCHURE: BrochureCopy = BrochureCopy {
    file_name: "tokistorage-brochure-en.pdf",
    subtitle: "Voice Preservation for 1,000 Years",
    tagline: "Democratizing Proof of Existence",
    tagline_size: 21.0,
    hook: "Do you know your great-grandparents' face and voice?",
    hook_lines: [
        "Only a handful make it into history. Ordinary people are forgotten in three generations.",
        "Three-layer distributed storage carries your voice and memory 1,000 years into the future.",
    ],
    layers_title: "Three-Layer Distributed Storage",
    layers: [
        LayerCard {
            title: "Physical",
            subtitle: "Quartz Glass & UV Laminate",
            description: "Your record in your hands\nQuartz 1,000 yrs · UV renewable",
        },
        LayerCard {
            title: "National",
            subtitle: "National Diet Library",
            description: "Permanent preservation\nunder Japanese law",
        },
        LayerCard {
            title: "Private",
            subtitle: "GitHub",
            description: "Free open platform\nZero maintenance cost",
        },
    ],
    tokiqr_title: "TokiQR - Voice Encoded in a QR Code",
    tokiqr_items: [
        "Proprietary encoding technology (PCT international patent pending)",
        "Up to 30 seconds of voice in a single QR code",
        "No server required, plays offline on any smartphone",
        "Print-ready · free to integrate into your own service",
        "Setup page: deploy from a single QR sticker (stamp rallies, tourism, events)",
        "Try it free now → tokistorage.github.io/qr/",
    ],
    bullet: "• ",
    areas_title: "Service Areas",
    areas: [
        ("Personal", "Wedding vows, legacy messages, family records, growth milestones"),
        ("Business", "Hospitality voice, brand stories, corporate heritage"),
        ("Government", "Cultural asset preservation, disaster messages, oral history"),
    ],
    pricing_title: "Pricing",
    pricing: "TokiQR (Voice QR creation): Free | Three-Layer Plan: from ¥5,000 | Quartz Glass: from ¥50,000",
    pricing_note: "See our website for detailed pricing plans",
    contact_name: "TokiStorage",
    representative: "Takuya Sato, Founder",
    address: "Urayasu, Chiba, Japan (planning to establish a physical storage base on Sado Island)",
    document_title: "TokiStorage Brochure",
    document_author: "TokiStorage (Takuya Sato)",
    keywords: "TokiStorage voice preservation QR code quartz glass",
};

struct BrochureWriter<'a> {
    composer: Composer,
    copy: &'a BrochureCopy,
    accent: Color,
}

impl BrochureWriter<'_> {
    fn margin(&self) -> f32 {
        BROCHURE_GEOMETRY.margin_left
    }

    fn content_width(&self) -> f32 {
        BROCHURE_GEOMETRY.content_width()
    }

    fn section_title(&mut self, text: &str) -> Result<(), ContextError> {
        let y = self.composer.y();
        self.composer.set_fill_color(self.accent);
        self.composer.rect(self.margin(), y, 3.0, 7.0, PaintMode::Fill)?;
        self.composer.set_xy(self.margin() + 6.0, y);
        self.composer.set_font(FontStyle::Bold, 11.0);
        self.composer.set_text_color(palette::DARK);
        self.composer.cell_ln(0.0, 7.0, text, Align::Left)?;
        self.composer.ln(3.0);
        Ok(())
    }

    fn header(&mut self, logo_path: Option<&Path>) -> Result<(), ContextError> {
        self.composer.set_fill_color(self.accent);
        self.composer
            .rect(0.0, 0.0, BROCHURE_GEOMETRY.width, 3.5, PaintMode::Fill)?;

        if let Some(logo_path) = logo_path {
            if logo_path.exists() {
                self.composer.image(logo_path, self.margin(), 10.0, 14.0, None)?;
            } else {
                log::warn!("Skipping the missing logo {}", logo_path.display());
            }
        }
        let text_x = self.margin() + 17.0;
        self.composer.set_xy(text_x, 10.0);
        self.composer.set_font(FontStyle::Bold, 18.0);
        self.composer.set_text_color(palette::DARK);
        self.composer.cell_ln(0.0, 9.0, "TokiStorage", Align::Left)?;
        self.composer.set_x(text_x);
        self.composer.set_font(FontStyle::Regular, 9.0);
        self.composer.set_text_color(palette::SECONDARY);
        self.composer.cell_ln(0.0, 5.0, self.copy.subtitle, Align::Left)?;

        self.composer.ln(6.0);
        self.composer.set_font(FontStyle::Bold, self.copy.tagline_size);
        self.composer.set_text_color(self.accent);
        let width = self.content_width();
        self.composer.cell_ln(width, 12.0, self.copy.tagline, Align::Center)?;

        self.composer.ln(4.0);
        self.composer.set_font(FontStyle::Regular, 12.0);
        self.composer.set_text_color(palette::DARK);
        self.composer.cell_ln(width, 7.0, self.copy.hook, Align::Center)?;
        self.composer.ln(1.0);
        self.composer.set_font(FontStyle::Regular, 9.5);
        self.composer.set_text_color(palette::SECONDARY);
        for line in self.copy.hook_lines {
            self.composer.cell_ln(width, 6.0, line, Align::Center)?;
        }
        Ok(())
    }

    fn layer_cards(&mut self) -> Result<(), ContextError> {
        self.composer.ln(7.0);
        self.section_title(self.copy.layers_title)?;

        let column_width = (self.content_width() - 8.0) / 3.0;
        let top = self.composer.y();
        for (column, card) in self.copy.layers.iter().enumerate() {
            let x = self.margin() + column as f32 * (column_width + 4.0);
            self.composer.set_fill_color(palette::TOKI_BLUE_PALE);
            self.composer.set_draw_color(palette::BORDER);
            self.composer
                .rect(x, top, column_width, LAYER_CARD_HEIGHT, PaintMode::FillStroke)?;

            self.composer.set_xy(x + 2.0, top + 3.0);
            self.composer.set_font(FontStyle::Bold, 10.0);
            self.composer.set_text_color(self.accent);
            self.composer
                .cell_ln(column_width - 4.0, 6.0, card.title, Align::Center)?;
            self.composer.set_x(x + 2.0);
            self.composer.set_font(FontStyle::Bold, 8.5);
            self.composer.set_text_color(palette::DARK);
            self.composer
                .cell_ln(column_width - 4.0, 6.0, card.subtitle, Align::Center)?;

            self.composer.set_xy(x + 3.0, top + 18.0);
            self.composer.set_font(FontStyle::Regular, 8.0);
            self.composer.set_text_color(palette::SECONDARY);
            self.composer
                .multi_cell(column_width - 6.0, 5.0, card.description, Align::Center)?;
        }
        self.composer.set_y(top + LAYER_CARD_HEIGHT + 6.0);
        Ok(())
    }

    fn tokiqr_highlight(&mut self) -> Result<(), ContextError> {
        self.section_title(self.copy.tokiqr_title)?;

        let top = self.composer.y();
        self.composer.set_fill_color(palette::BG_LIGHT);
        self.composer.set_draw_color(palette::BORDER);
        self.composer.rect(
            self.margin(),
            top,
            self.content_width(),
            TOKIQR_BOX_HEIGHT,
            PaintMode::FillStroke,
        )?;

        self.composer.set_y(top + 4.0);
        self.composer.set_font(FontStyle::Regular, 9.5);
        self.composer.set_text_color(palette::DARK);
        for item in self.copy.tokiqr_items {
            self.composer.set_x(self.margin() + 6.0);
            let width = self.content_width() - 12.0;
            self.composer
                .cell_ln(width, 7.0, &format!("{}{}", self.copy.bullet, item), Align::Left)?;
        }
        self.composer.set_y(top + TOKIQR_BOX_HEIGHT + 6.0);
        Ok(())
    }

    fn service_areas_and_pricing(&mut self) -> Result<(), ContextError> {
        self.section_title(self.copy.areas_title)?;
        let label_width = 28.0;
        for (label, description) in self.copy.areas {
            self.composer.set_x(self.margin());
            self.composer.set_font(FontStyle::Bold, 9.5);
            self.composer.set_text_color(self.accent);
            self.composer.cell(label_width, 7.0, label, Align::Left)?;
            self.composer.set_font(FontStyle::Regular, 9.5);
            self.composer.set_text_color(palette::SECONDARY);
            let width = self.content_width() - label_width;
            self.composer.cell_ln(width, 7.0, description, Align::Left)?;
        }
        self.composer.ln(6.0);

        self.section_title(self.copy.pricing_title)?;
        let width = self.content_width();
        self.composer.set_font(FontStyle::Regular, 9.5);
        self.composer.set_text_color(palette::DARK);
        self.composer.cell_ln(width, 6.0, self.copy.pricing, Align::Left)?;
        self.composer.set_font(FontStyle::Regular, 8.0);
        self.composer.set_text_color(palette::MUTED);
        self.composer.cell_ln(width, 5.0, self.copy.pricing_note, Align::Left)?;
        self.composer.ln(6.0);
        Ok(())
    }

    /// Writes a line of contact text that links to `uri`.
    fn contact_link(&mut self, text: &str, uri: &str) -> Result<(), ContextError> {
        let y = self.composer.y();
        let width = self.composer.text_width(text)? + 2.0 * crate::composer::CELL_MARGIN;
        self.composer.cell_ln(0.0, 6.0, text, Align::Left)?;
        self.composer.link(self.margin(), y, width, 6.0, uri)
    }

    fn contact(&mut self) -> Result<(), ContextError> {
        let y = self.composer.y();
        self.composer.set_draw_color(palette::BORDER);
        self.composer
            .line(self.margin(), y, BROCHURE_GEOMETRY.width - self.margin(), y)?;
        self.composer.ln(6.0);

        let top = self.composer.y();
        let qr_x = BROCHURE_GEOMETRY.width - self.margin() - CONTACT_QR_SIZE;
        draw_qr_code(
            &mut self.composer,
            content::PUBLISHER_URL,
            qr_x,
            top,
            CONTACT_QR_SIZE,
        )?;

        self.composer.set_xy(self.margin(), top);
        self.composer.set_font(FontStyle::Bold, 11.0);
        self.composer.set_text_color(palette::DARK);
        self.composer.cell_ln(0.0, 7.0, self.copy.contact_name, Align::Left)?;
        self.composer.set_font(FontStyle::Regular, 9.0);
        self.composer.set_text_color(palette::SECONDARY);
        self.composer.cell_ln(0.0, 6.0, self.copy.representative, Align::Left)?;
        self.composer.cell_ln(0.0, 6.0, self.copy.address, Align::Left)?;
        self.composer.set_text_color(self.accent);
        self.contact_link(
            &format!("Web: {}", content::PUBLISHER_URL),
            content::PUBLISHER_URL,
        )?;
        self.contact_link(
            &format!("Email: {}", content::PUBLISHER_EMAIL),
            &format!("mailto:{}", content::PUBLISHER_EMAIL),
        )?;

        self.composer.set_fill_color(self.accent);
        self.composer.rect(
            0.0,
            BROCHURE_GEOMETRY.height - 3.0,
            BROCHURE_GEOMETRY.width,
            3.0,
            PaintMode::Fill,
        )
    }
}

/// Builds the single-page introduction brochure in the language of `copy`.
pub fn build_brochure(
    copy: &BrochureCopy,
    client_config: &ClientConfig,
    output_directory: &Path,
    logo_path: Option<&Path>,
) -> Result<BuildOutput, ContextError> {
    let fonts = client_config.fonts.resolve()?;
    let identifier = copy.file_name.trim_end_matches(".pdf").to_string();
    let mut composer = Composer::new(identifier.clone(), &fonts, BROCHURE_GEOMETRY)?;
    composer.set_auto_page_break(false);
    composer.set_metadata(DocumentMetadata {
        title: copy.document_title.to_string(),
        author: copy.document_author.to_string(),
        subject: copy.tagline.to_string(),
        keywords: copy.keywords.to_string(),
        creator: env!("CARGO_PKG_NAME").to_string(),
        creation_date: None,
    });
    composer.add_page()?;

    let mut writer = BrochureWriter {
        composer,
        copy,
        accent: client_config.accent_color(),
    };
    writer.header(logo_path)?;
    writer.layer_cards()?;
    writer.tokiqr_highlight()?;
    writer.service_areas_and_pricing()?;
    writer.contact()?;
    let mut composer = writer.composer;

    create_output_directory(output_directory)?;
    let output_path: PathBuf = output_directory.join(copy.file_name);
    composer.save(&identifier, &output_path)?;
    log::info!("Generated: {}", output_path.display());

    Ok(BuildOutput {
        output_path,
        page_count: composer.page_count(),
        splice_report: None,
    })
}

/// Builds the Japanese and the English brochures.
pub fn build_brochures(
    client_config: &ClientConfig,
    output_directory: &Path,
    logo_path: Option<&Path>,
) -> Result<Vec<BuildOutput>, ContextError> {
    [JAPANESE_BROCHURE, ENGLISH_BROCHURE]
        .iter()
        .map(|copy| build_brochure(copy, client_config, output_directory, logo_path))
        .collect()
}
