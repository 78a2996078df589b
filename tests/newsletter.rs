use std::path::PathBuf;

use colophon::config::ClientConfig;
use colophon::fonts::FontCandidates;
use colophon::issue::IssueNumber;
use colophon::manifest::IssueManifest;
use colophon::newsletter::{build_newsletter, NewsletterOptions};
use lopdf::{dictionary, Document, Object, Stream};

fn test_font() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fonts/DejaVuSans.ttf")
}

fn client_config() -> ClientConfig {
    let font = test_font();
    ClientConfig {
        fonts: FontCandidates {
            regular: vec![font.clone()],
            bold: vec![font],
        },
        ..ClientConfig::default()
    }
}

fn write_blank_pdf(pdf_path: &std::path::Path, page_count: usize) {
    let mut document = Document::with_version("1.5");
    let pages_id = document.new_object_id();
    let mut kids: Vec<Object> = Vec::new();
    for _ in 0..page_count {
        let content_id = document.add_object(Stream::new(dictionary! {}, b"0 0 m 10 10 l S".to_vec()));
        let page_id = document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        kids.push(page_id.into());
    }
    document.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => page_count as i64,
            "Kids" => kids,
        }),
    );
    let catalog_id = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    document.trailer.set("Root", catalog_id);
    document.save(pdf_path).unwrap();
}

#[test]
fn manifest_supplements_are_spliced_before_the_back_cover() {
    let directory = tempfile::tempdir().unwrap();
    let output_directory = directory.path().join("newsletter");

    // The same issue without supplements gives the base page count
    let base_output = build_newsletter(&NewsletterOptions {
        issue: IssueNumber::new(2026, 2, 2),
        month: 4,
        manifest: None,
        client_config: client_config(),
        output_directory: directory.path().join("base"),
        logo_path: None,
    })
    .unwrap();

    write_blank_pdf(&directory.path().join("TQ-00001.pdf"), 2);
    let manifest_path = directory.path().join("manifest.json");
    std::fs::write(
        &manifest_path,
        r#"{ "supplements": ["TQ-00001.pdf", "TQ-00099.pdf"] }"#,
    )
    .unwrap();
    let manifest = IssueManifest::from_path(&manifest_path).unwrap();

    let output = build_newsletter(&NewsletterOptions {
        issue: IssueNumber::new(2026, 2, 2),
        month: 4,
        manifest: Some(manifest),
        client_config: client_config(),
        output_directory: output_directory.clone(),
        logo_path: None,
    })
    .unwrap();

    assert_eq!(output.output_path, output_directory.join("2026-02.pdf"));
    assert_eq!(output.page_count, base_output.page_count + 2);
    let report = output.splice_report.unwrap();
    assert_eq!(report.skipped, vec![directory.path().join("TQ-00099.pdf")]);
    assert!(!output_directory.join("2026-02.base.pdf").exists());

    let written = Document::load(&output.output_path).unwrap();
    let page_ids: Vec<_> = written.get_pages().into_values().collect();
    assert_eq!(page_ids.len(), output.page_count);
    // The blank supplement pages carry no fonts, the generated back cover does
    let back_cover = written.get_dictionary(page_ids[page_ids.len() - 1]).unwrap();
    assert!(back_cover.has(b"Resources"));
    let last_supplement_page = written.get_dictionary(page_ids[page_ids.len() - 2]).unwrap();
    assert!(!last_supplement_page.has(b"Resources"));
}

#[test]
fn essays_are_placed_as_content_boxes() {
    let directory = tempfile::tempdir().unwrap();
    let manifest_path = directory.path().join("manifest.json");
    let essay_body = "存在証明の民主化。".repeat(60);
    std::fs::write(
        &manifest_path,
        serde_json::json!({
            "title": "第3号",
            "sections": [{ "heading": "お知らせ", "paragraphs": ["本号では寄稿を掲載します。"] }],
            "essays": (0..12)
                .map(|index| serde_json::json!({
                    "title": format!("寄稿 {}", index + 1),
                    "body": essay_body,
                    "link": "https://tokistorage.github.io/lp/",
                }))
                .collect::<Vec<_>>(),
        })
        .to_string(),
    )
    .unwrap();

    let output = build_newsletter(&NewsletterOptions {
        issue: IssueNumber::new(2026, 3, 3),
        month: 6,
        manifest: Some(IssueManifest::from_path(&manifest_path).unwrap()),
        client_config: client_config(),
        output_directory: directory.path().to_path_buf(),
        logo_path: None,
    })
    .unwrap();

    // Cover, colophon, several content pages and the back cover
    assert!(output.page_count >= 5);
    let written = Document::load(&output.output_path).unwrap();
    let link_count: usize = written
        .get_pages()
        .into_values()
        .map(|page_id| {
            written
                .get_dictionary(page_id)
                .ok()
                .and_then(|page| page.get(b"Annots").ok())
                .and_then(|annotations| annotations.as_array().ok())
                .map_or(0, |annotations| annotations.len())
        })
        .sum();
    assert_eq!(link_count, 12);
}
