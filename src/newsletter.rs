use std::path::{Path, PathBuf};

use crate::composer::{AccentBar, Align, Composer, FontStyle, Footer, PageDecoration, PageGeometry};
use crate::config::ClientConfig;
use crate::content::{self, palette, Paragraph, Section, Table, INAUGURAL_COVER};
use crate::error::ContextError;
use crate::issue::{self, IssueNumber};
use crate::manifest::{IssueManifest, QrMaterials};
use crate::pagination::{place_content_box, BoxMetrics, BoxStyle};
use crate::pdf::{Color, DocumentMetadata, PaintMode};
use crate::qr::{draw_qr_code, normalize_url};
use crate::splice::{splice_with_temporary_base, SpliceReport};

/// Everything needed to build one serial issue.
#[derive(Debug, Clone)]
pub struct NewsletterOptions {
    pub issue: IssueNumber,
    pub month: u8,
    pub manifest: Option<IssueManifest>,
    pub client_config: ClientConfig,
    pub output_directory: PathBuf,
    pub logo_path: Option<PathBuf>,
}

/// A written document.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOutput {
    pub output_path: PathBuf,
    pub page_count: usize,
    /// Present when supplements were spliced in.
    pub splice_report: Option<SpliceReport>,
}

/// Rows of the legal-deposit colophon of a serial issue.
pub fn serial_colophon_rows(
    issue: &IssueNumber,
    publication_date: &str,
    config: &ClientConfig,
) -> Vec<(&'static str, String)> {
    let publisher_address = config
        .colophon
        .publisher_address
        .clone()
        .unwrap_or_else(|| content::PUBLISHER_ADDRESS.to_string());

    vec![
        (
            "刊行物名",
            config.publication_name_ja(content::PUBLICATION_NAME_JA),
        ),
        ("英題", content::PUBLICATION_NAME.to_string()),
        ("巻号", issue.volume_line_ja()),
        ("発行年月日", publication_date.to_string()),
        ("発行者", content::PUBLISHER_PERSON.to_string()),
        ("屋号", content::PUBLISHER_TRADE_NAME.to_string()),
        ("発行者住所", publisher_address),
        ("URL", content::PUBLISHER_URL.to_string()),
        ("連絡先", content::PUBLISHER_EMAIL.to_string()),
        ("刊行頻度", "不定期（年複数回の刊行を予定）".to_string()),
        ("フォーマット", content::FORMAT_DESCRIPTION.to_string()),
        ("根拠法", config.legal_basis()),
        (
            "採番体系",
            "年-号番号（YYYY-NN） ※1000年発行を想定".to_string(),
        ),
        ("ISSN", "未申請（今後申請予定）".to_string()),
    ]
}

/// Rows of the colophon printed on the cover of a QR special issue. Rows with empty values are
/// not drawn.
pub fn tokiqr_colophon_rows(
    materials: &QrMaterials,
    publication_name_ja: &str,
    publication_date: &str,
    config: &ClientConfig,
) -> Vec<(&'static str, String)> {
    let colophon = &config.colophon;
    vec![
        ("刊行物名", publication_name_ja.to_string()),
        (
            "巻号",
            issue::volume_line_ja(materials.volume, materials.number, materials.serial),
        ),
        ("発行年月日", publication_date.to_string()),
        ("発行者", config.publisher()),
        (
            "特集元",
            colophon
                .content_originator
                .clone()
                .unwrap_or_else(|| materials.series_name.clone()),
        ),
        (
            "発行者住所",
            colophon.publisher_address.clone().unwrap_or_default(),
        ),
        ("刊行頻度", "不定期".to_string()),
        ("フォーマット", content::FORMAT_DESCRIPTION.to_string()),
        ("根拠法", config.legal_basis()),
        ("採番体系", "式年遷宮型（1巻＝20年）".to_string()),
    ]
}

pub(crate) fn create_output_directory(output_directory: &Path) -> Result<(), ContextError> {
    std::fs::create_dir_all(output_directory).map_err(|error| {
        ContextError::with_path_error("Failed to create the output directory", output_directory, &error)
    })
}

/// Page builder of a serial issue, one method per page or page element.
struct NewsletterWriter<'a> {
    composer: Composer,
    options: &'a NewsletterOptions,
    accent: Color,
    publication_name_ja: String,
}

impl<'a> NewsletterWriter<'a> {
    fn decorate(&mut self, footer_text: String) {
        self.composer.set_decoration(PageDecoration {
            accent_bar: Some(AccentBar {
                color: self.accent,
                height: 3.5,
            }),
            footer: Some(Footer {
                text: footer_text,
                text_color: palette::MUTED,
                rule_color: palette::BORDER,
                offset_from_bottom: 20.0,
            }),
        });
    }

    fn manifest(&self) -> Option<&IssueManifest> {
        self.options.manifest.as_ref()
    }

    fn month_label(&self) -> String {
        issue::month_label(self.options.issue.year, self.options.month)
    }

    fn centered_line(
        &mut self,
        font_style: FontStyle,
        font_size: f32,
        color: Color,
        height: f32,
        text: &str,
    ) -> Result<(), ContextError> {
        self.composer.set_font(font_style, font_size);
        self.composer.set_text_color(color);
        self.composer.cell_ln(0.0, height, text, Align::Center)
    }

    fn cover(&mut self) -> Result<(), ContextError> {
        let issue = self.options.issue;
        let footer = format!(
            "{}　{}　{}",
            self.publication_name_ja,
            issue.volume_line_ja(),
            self.month_label()
        );
        self.decorate(footer);
        self.composer.add_page()?;
        self.composer.set_auto_page_break(false);

        if let Some(logo_path) = &self.options.logo_path {
            if logo_path.exists() {
                self.composer.image(logo_path, 80.0, 12.0, 50.0, None)?;
            } else {
                log::warn!("The logo {} does not exist, leaving it out", logo_path.display());
            }
        }

        let title = self
            .manifest()
            .and_then(|manifest| manifest.title.clone())
            .unwrap_or_else(|| INAUGURAL_COVER.title.to_string());
        let tagline = self
            .manifest()
            .and_then(|manifest| manifest.tagline.clone())
            .unwrap_or_else(|| INAUGURAL_COVER.tagline.to_string());

        self.composer.set_y(68.0);
        self.centered_line(FontStyle::Regular, 10.0, self.accent, 6.0, content::PUBLICATION_NAME)?;
        self.centered_line(
            FontStyle::Regular,
            8.0,
            palette::MUTED,
            5.0,
            &issue.volume_line_ja(),
        )?;
        self.composer.ln(10.0);
        self.centered_line(FontStyle::Bold, 28.0, palette::DARK, 18.0, &title)?;
        self.composer.ln(4.0);
        self.centered_line(FontStyle::Regular, 11.0, palette::SECONDARY, 7.0, &tagline)?;
        self.composer.ln(25.0);

        let month_label = self.month_label();
        self.centered_line(FontStyle::Regular, 9.0, palette::SECONDARY, 6.0, &month_label)?;
        self.composer.ln(2.0);
        self.composer.cell_ln(0.0, 6.0, &issue.volume_line(), Align::Center)?;
        self.composer.ln(30.0);

        // Publisher box
        let box_y = self.composer.y();
        self.composer.set_draw_color(palette::BORDER);
        self.composer.rect(40.0, box_y, 130.0, 40.0, PaintMode::Stroke)?;
        self.composer.set_xy(45.0, box_y + 5.0);
        self.composer.set_font(FontStyle::Bold, 9.0);
        self.composer.set_text_color(palette::DARK);
        self.composer.cell_ln(120.0, 6.0, "発行者", Align::Center)?;
        self.composer.set_font(FontStyle::Regular, 9.0);
        self.composer.set_text_color(palette::SECONDARY);
        let publisher_lines = [
            self.options.client_config.publisher(),
            self.options
                .client_config
                .colophon
                .publisher_address
                .clone()
                .unwrap_or_else(|| content::PUBLISHER_ADDRESS.to_string()),
            content::PUBLISHER_URL.to_string(),
        ];
        for line in publisher_lines.iter() {
            self.composer.set_x(45.0);
            self.composer.cell_ln(120.0, 6.0, line, Align::Center)?;
        }

        Ok(())
    }

    fn colophon(&mut self) -> Result<(), ContextError> {
        self.decorate(format!("{}　奥付", self.publication_name_ja));
        self.composer.add_page()?;
        self.composer.set_auto_page_break(false);

        self.composer.set_y(15.0);
        self.centered_line(FontStyle::Bold, 14.0, palette::DARK, 10.0, "奥付（Colophon）")?;
        self.composer.ln(4.0);
        self.centered_line(
            FontStyle::Regular,
            8.0,
            palette::MUTED,
            5.0,
            "国立国会図書館法に基づく納本に必要な刊行情報",
        )?;
        self.composer.ln(8.0);

        let publication_date = match self.manifest().and_then(|manifest| manifest.date.clone()) {
            Some(date) => issue::format_formal_date(&date),
            None => issue::formal_month_label(self.options.issue.year, self.options.month),
        };
        let rows = serial_colophon_rows(
            &self.options.issue,
            &publication_date,
            &self.options.client_config,
        );
        for (row_index, (label, value)) in rows.iter().enumerate() {
            let y = self.composer.y();
            if row_index % 2 == 0 {
                self.composer.set_fill_color(palette::BG_LIGHT);
                self.composer.rect(15.0, y, 180.0, 8.0, PaintMode::Fill)?;
            }
            self.composer.set_xy(18.0, y);
            self.composer.set_font(FontStyle::Bold, 8.0);
            self.composer.set_text_color(palette::MUTED);
            self.composer.cell(45.0, 8.0, label, Align::Left)?;
            self.composer.set_font(FontStyle::Regular, 9.0);
            self.composer.set_text_color(palette::DARK);
            self.composer.cell_ln(0.0, 8.0, value, Align::Left)?;
        }

        self.composer.ln(8.0);
        self.divider()?;
        self.composer.set_font(FontStyle::Bold, 9.0);
        self.composer.set_text_color(palette::DARK);
        self.composer.cell_ln(0.0, 6.0, "採番体系について", Align::Left)?;
        self.composer.ln(1.0);
        self.composer.set_font(FontStyle::Regular, 8.0);
        self.composer.set_text_color(palette::SECONDARY);
        self.composer
            .multi_cell(180.0, 5.0, content::NUMBERING_EXPLANATION, Align::Left)?;

        Ok(())
    }

    fn content_pages(&mut self) -> Result<(), ContextError> {
        let footer = format!(
            "{}　{}",
            self.publication_name_ja,
            self.options.issue.volume_line_ja()
        );
        self.decorate(footer);
        self.composer.add_page()?;
        self.composer.set_auto_page_break(true);
        self.composer.set_y(15.0);

        let manifest_sections = self
            .manifest()
            .map(|manifest| manifest.sections.clone())
            .unwrap_or_default();
        if manifest_sections.is_empty() {
            self.inaugural_sections(content::INAUGURAL_SECTIONS)?;
        } else {
            for (section_index, section) in manifest_sections.iter().enumerate() {
                if section_index > 0 {
                    self.divider()?;
                }
                self.section_heading(&section.heading)?;
                for paragraph in section.paragraphs.iter() {
                    self.body(paragraph, FontStyle::Regular)?;
                }
            }
        }

        let essays = self
            .manifest()
            .map(|manifest| manifest.essays.clone())
            .unwrap_or_default();
        if !essays.is_empty() {
            self.divider()?;
            self.section_heading("寄稿")?;
            let metrics = BoxMetrics::NEWSLETTER;
            let style = BoxStyle {
                link_color: self.accent,
                ..BoxStyle::default()
            };
            let geometry = self.composer.geometry();
            for essay in essays.iter() {
                place_content_box(
                    &mut self.composer,
                    essay,
                    &metrics,
                    &style,
                    geometry.margin_left,
                    geometry.content_width(),
                )?;
            }
        }
        self.composer.ln(4.0);

        Ok(())
    }

    fn inaugural_sections(&mut self, sections: &[Section]) -> Result<(), ContextError> {
        for (section_index, section) in sections.iter().enumerate() {
            if section_index > 0 {
                self.divider()?;
            }
            self.section_heading(section.heading)?;
            for paragraph in section.paragraphs.iter() {
                match paragraph {
                    Paragraph::Body(text) => self.body(text, FontStyle::Regular)?,
                    Paragraph::Emphasis(text) => self.body(text, FontStyle::Bold)?,
                    Paragraph::Flow(text) => {
                        self.composer.ln(1.0);
                        self.composer.set_font(FontStyle::Bold, 10.0);
                        self.composer.set_text_color(self.accent);
                        self.composer.cell_ln(180.0, 8.0, text, Align::Center)?;
                        self.composer.ln(3.0);
                    }
                    Paragraph::Table(table) => self.table(table)?,
                }
            }
        }
        Ok(())
    }

    fn section_heading(&mut self, title: &str) -> Result<(), ContextError> {
        self.composer.ln(3.0);
        // Keeps the heading with at least its first line of text
        self.composer.ensure_space(7.0 + 2.0 + 5.5)?;
        let y = self.composer.y();
        self.composer.set_fill_color(self.accent);
        self.composer.rect(15.0, y, 3.0, 7.0, PaintMode::Fill)?;
        self.composer.set_font(FontStyle::Bold, 11.0);
        self.composer.set_text_color(palette::DARK);
        self.composer.set_x(22.0);
        self.composer.cell_ln(0.0, 7.0, title, Align::Left)?;
        self.composer.ln(2.0);
        Ok(())
    }

    fn body(&mut self, text: &str, font_style: FontStyle) -> Result<(), ContextError> {
        self.composer.set_font(font_style, 9.0);
        self.composer.set_text_color(match font_style {
            FontStyle::Regular => palette::SECONDARY,
            FontStyle::Bold => palette::DARK,
        });
        self.composer.set_x(15.0);
        self.composer.multi_cell(180.0, 5.5, text, Align::Left)?;
        self.composer.ln(match font_style {
            FontStyle::Regular => 2.0,
            FontStyle::Bold => 1.0,
        });
        Ok(())
    }

    fn divider(&mut self) -> Result<(), ContextError> {
        self.composer.ln(2.0);
        let y = self.composer.y();
        self.composer.set_draw_color(palette::BORDER);
        self.composer.line(15.0, y, 195.0, y)?;
        self.composer.ln(4.0);
        Ok(())
    }

    fn table(&mut self, table: &Table) -> Result<(), ContextError> {
        self.composer.set_x(15.0);
        self.composer.set_font(FontStyle::Bold, 8.0);
        self.composer.set_fill_color(self.accent);
        self.composer.set_text_color(palette::WHITE);
        for (header, width) in table.header.iter().zip(table.column_widths) {
            self.composer
                .filled_cell(*width, 7.0, &format!("  {header}"), Align::Left)?;
        }
        self.composer.ln(7.0);

        for (row_index, row) in table.rows.iter().enumerate() {
            let filled = row_index % 2 == 0;
            self.composer.set_fill_color(palette::BG_LIGHT);
            self.composer.set_x(15.0);
            for (column_index, (value, width)) in row.iter().zip(table.column_widths).enumerate() {
                if column_index == 0 {
                    self.composer.set_font(FontStyle::Bold, 8.0);
                    self.composer.set_text_color(palette::DARK);
                } else {
                    self.composer.set_font(FontStyle::Regular, 8.0);
                    self.composer.set_text_color(palette::SECONDARY);
                }
                let text = format!("  {value}");
                if filled {
                    self.composer.filled_cell(*width, 7.0, &text, Align::Left)?;
                } else {
                    self.composer.cell(*width, 7.0, &text, Align::Left)?;
                }
            }
            self.composer.ln(7.0);
        }
        self.composer.ln(3.0);
        Ok(())
    }

    fn back_cover(&mut self) -> Result<(), ContextError> {
        let issue = self.options.issue;
        self.decorate(format!(
            "{}　第{}巻 第{}号　裏表紙",
            self.publication_name_ja,
            issue.volume(),
            issue.number
        ));
        self.composer.add_page()?;
        self.composer.set_auto_page_break(false);

        self.composer.set_y(40.0);
        self.centered_line(FontStyle::Bold, 12.0, palette::DARK, 8.0, "国立国会図書館 納本宣言")?;
        self.composer.ln(6.0);
        self.composer.set_font(FontStyle::Regular, 9.0);
        self.composer.set_text_color(palette::SECONDARY);
        self.composer.set_x(30.0);
        self.composer
            .multi_cell(150.0, 6.0, content::DEPOSIT_DECLARATION, Align::Center)?;

        self.composer.ln(20.0);
        self.divider()?;
        self.composer.ln(4.0);
        self.centered_line(FontStyle::Bold, 10.0, palette::DARK, 7.0, "次号予告")?;
        self.composer.ln(2.0);
        let preview = self
            .manifest()
            .and_then(|manifest| manifest.next_issue_preview.clone())
            .unwrap_or_else(|| content::DEFAULT_NEXT_ISSUE_PREVIEW.to_string());
        self.composer.set_font(FontStyle::Regular, 9.0);
        self.composer.set_text_color(palette::SECONDARY);
        self.composer.set_x(30.0);
        self.composer.multi_cell(
            150.0,
            6.0,
            &format!("{}は、{}", issue.next().volume_line_ja(), preview),
            Align::Center,
        )?;

        self.composer.ln(20.0);
        let copyright = format!(
            "© {} {}. All rights reserved.",
            issue.year,
            self.options.client_config.publisher()
        );
        self.centered_line(FontStyle::Regular, 8.0, palette::MUTED, 5.0, &copyright)?;
        self.composer
            .cell_ln(0.0, 5.0, content::PUBLISHER_URL, Align::Center)?;

        Ok(())
    }
}

/// Builds a serial issue: cover, colophon, content pages and back cover, with the manifest's
/// supplements spliced in before the back cover.
pub fn build_newsletter(options: &NewsletterOptions) -> Result<BuildOutput, ContextError> {
    let fonts = options.client_config.fonts.resolve()?;
    let issue = options.issue;
    let identifier = issue.file_name().trim_end_matches(".pdf").to_string();
    log::info!(
        "Generating {} Vol.{} No.{} (serial {})",
        content::PUBLICATION_NAME,
        issue.volume(),
        issue.number,
        issue.serial_label()
    );

    let mut composer = Composer::new(identifier.clone(), &fonts, PageGeometry::A4_PORTRAIT)?;
    let cover_title = options
        .manifest
        .as_ref()
        .and_then(|manifest| manifest.title.clone())
        .unwrap_or_else(|| INAUGURAL_COVER.title.to_string());
    composer.set_metadata(DocumentMetadata {
        title: format!(
            "{} Vol.{} No.{} — {}",
            content::PUBLICATION_NAME,
            issue.volume(),
            issue.number,
            cover_title
        ),
        author: options.client_config.publisher(),
        subject: INAUGURAL_COVER.subject.to_string(),
        keywords: INAUGURAL_COVER.keywords.to_string(),
        creator: env!("CARGO_PKG_NAME").to_string(),
        creation_date: None,
    });

    let mut writer = NewsletterWriter {
        composer,
        options,
        accent: options.client_config.accent_color(),
        publication_name_ja: options
            .client_config
            .publication_name_ja(content::PUBLICATION_NAME_JA),
    };
    writer.cover()?;
    writer.colophon()?;
    writer.content_pages()?;
    writer.back_cover()?;
    let mut composer = writer.composer;

    create_output_directory(&options.output_directory)?;
    let output_path = options.output_directory.join(issue.file_name());
    let supplements = options
        .manifest
        .as_ref()
        .map(|manifest| manifest.supplements.clone())
        .unwrap_or_default();

    let output = if supplements.is_empty() {
        composer.save(&identifier, &output_path)?;
        BuildOutput {
            output_path,
            page_count: composer.page_count(),
            splice_report: None,
        }
    } else {
        let report = splice_with_temporary_base(&output_path, &supplements, |base_path| {
            composer.save(&identifier, base_path)
        })?;
        BuildOutput {
            output_path,
            page_count: report.page_count,
            splice_report: Some(report),
        }
    };
    log::info!(
        "  -> {} ({} pages)",
        output.output_path.display(),
        output.page_count
    );

    Ok(output)
}

/// Builds a QR special issue: a cover carrying the colophon, then one page per URL.
pub fn build_tokiqr(
    materials: &QrMaterials,
    client_config: &ClientConfig,
    output_directory: &Path,
) -> Result<BuildOutput, ContextError> {
    let fonts = client_config.fonts.resolve()?;
    let accent = client_config.accent_color();
    let publication_name_ja =
        client_config.publication_name_ja(&format!("{} ニュースレター", materials.series_name));
    let serial_label = issue::serial_label(materials.serial);
    let date = materials.date.clone().unwrap_or_else(issue::today);
    let publication_date = issue::format_japanese_date(&date);
    let geometry = PageGeometry::A4_PORTRAIT;
    let url_count = materials.urls.len();

    let identifier = format!("TQ-{serial_label}");
    let mut composer = Composer::new(identifier.clone(), &fonts, geometry)?;
    composer.set_metadata(DocumentMetadata {
        title: format!("{} TQ-{}", publication_name_ja, serial_label),
        author: client_config.publisher(),
        subject: materials.title.clone(),
        keywords: String::new(),
        creator: env!("CARGO_PKG_NAME").to_string(),
        creation_date: None,
    });
    composer.set_auto_page_break(false);
    let accent_bar = AccentBar {
        color: accent,
        height: 4.0,
    };

    // Cover
    composer.set_decoration(PageDecoration {
        accent_bar: Some(accent_bar.clone()),
        footer: None,
    });
    composer.add_page()?;
    composer.set_y(50.0);
    composer.set_font(FontStyle::Bold, 28.0);
    composer.set_text_color(palette::DARK);
    composer.cell_ln(0.0, 16.0, &materials.series_name, Align::Center)?;
    if !materials.title.is_empty() {
        composer.ln(4.0);
        composer.set_font(FontStyle::Regular, 14.0);
        composer.set_text_color(palette::SECONDARY);
        composer.cell_ln(0.0, 10.0, &materials.title, Align::Center)?;
    }
    composer.ln(8.0);
    composer.set_font(FontStyle::Regular, 10.0);
    composer.set_text_color(palette::MUTED);
    composer.cell_ln(0.0, 6.0, &publication_name_ja, Align::Center)?;
    composer.ln(4.0);
    composer.set_font(FontStyle::Regular, 9.0);
    let volume_line = format!(
        "{}TQ-{}",
        issue::volume_line_ja(materials.volume, materials.number, materials.serial),
        serial_label
    );
    composer.cell_ln(0.0, 6.0, &volume_line, Align::Center)?;
    composer.ln(2.0);
    composer.cell_ln(0.0, 6.0, &publication_date, Align::Center)?;

    composer.ln(8.0);
    let divider_y = composer.y();
    composer.set_draw_color(palette::BORDER);
    composer.line(
        geometry.margin_left + 30.0,
        divider_y,
        geometry.width - geometry.margin_right - 30.0,
        divider_y,
    )?;

    composer.ln(8.0);
    let rows = tokiqr_colophon_rows(materials, &publication_name_ja, &publication_date, client_config);
    for (row_index, (label, value)) in rows.iter().enumerate() {
        if value.is_empty() {
            continue;
        }
        let y = composer.y();
        if row_index % 2 == 0 {
            composer.set_fill_color(palette::BG_LIGHT);
            composer.rect(
                geometry.margin_left + 10.0,
                y,
                geometry.content_width() - 20.0,
                7.0,
                PaintMode::Fill,
            )?;
        }
        composer.set_xy(geometry.margin_left + 13.0, y);
        composer.set_font(FontStyle::Bold, 7.0);
        composer.set_text_color(palette::MUTED);
        composer.cell(35.0, 7.0, label, Align::Left)?;
        composer.set_font(FontStyle::Regular, 8.0);
        composer.set_text_color(palette::DARK);
        composer.cell_ln(0.0, 7.0, value, Align::Left)?;
    }

    if let Some(note) = client_config
        .colophon
        .note
        .as_deref()
        .filter(|note| !note.is_empty())
    {
        composer.ln(3.0);
        composer.set_font(FontStyle::Regular, 6.5);
        composer.set_text_color(palette::MUTED);
        composer.set_x(geometry.margin_left + 10.0);
        composer.multi_cell(geometry.content_width() - 20.0, 4.0, note, Align::Left)?;
    }

    composer.set_y(-25.0);
    composer.set_font(FontStyle::Regular, 7.0);
    composer.set_text_color(palette::SECONDARY);
    composer.cell_ln(0.0, 4.0, content::TOKIQR_TAGLINE, Align::Center)?;
    composer.ln(2.0);
    let rule_y = composer.y();
    composer.set_draw_color(palette::BORDER);
    composer.line(
        geometry.margin_left,
        rule_y,
        geometry.width - geometry.margin_right,
        rule_y,
    )?;
    composer.ln(3.0);
    composer.set_font(FontStyle::Regular, 6.5);
    composer.set_text_color(palette::MUTED);
    composer.cell(0.0, 3.5, content::TOKIQR_COPYRIGHT, Align::Center)?;

    // One page per URL
    let qr_size = 100.0;
    for (url_index, url) in materials.urls.iter().enumerate() {
        let full_url = normalize_url(url);
        composer.set_decoration(PageDecoration {
            accent_bar: Some(accent_bar.clone()),
            footer: Some(Footer {
                text: format!(
                    "{}　TQ-{}　{}/{}",
                    publication_name_ja,
                    serial_label,
                    url_index + 1,
                    url_count
                ),
                text_color: palette::MUTED,
                rule_color: palette::BORDER,
                offset_from_bottom: 20.0,
            }),
        });
        composer.add_page()?;

        composer.set_y(15.0);
        composer.set_font(FontStyle::Bold, 10.0);
        composer.set_text_color(palette::DARK);
        composer.cell_ln(
            0.0,
            8.0,
            &format!("QR {} / {}", url_index + 1, url_count),
            Align::Center,
        )?;

        draw_qr_code(
            &mut composer,
            &full_url,
            (geometry.width - qr_size) / 2.0,
            35.0,
            qr_size,
        )?;

        composer.set_y(140.0);
        composer.set_font(FontStyle::Regular, 5.5);
        composer.set_text_color(palette::MUTED);
        composer.multi_cell(geometry.content_width(), 3.5, &full_url, Align::Center)?;
        composer.ln(6.0);
        composer.set_font(FontStyle::Regular, 9.0);
        composer.set_text_color(palette::SECONDARY);
        composer.cell_ln(0.0, 6.0, content::SCAN_INSTRUCTION, Align::Center)?;
    }

    create_output_directory(output_directory)?;
    let output_path = output_directory.join(issue::tokiqr_file_name(materials.serial));
    composer.save(&identifier, &output_path)?;
    log::info!("Generated: {}", output_path.display());

    Ok(BuildOutput {
        output_path,
        page_count: composer.page_count(),
        splice_report: None,
    })
}
