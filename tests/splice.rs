use std::path::{Path, PathBuf};

use colophon::splice::{splice_documents, splice_with_temporary_base, temporary_base_path};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};

/// Writes a PDF whose pages each show one label, sharing a single Helvetica font resource.
fn write_labelled_pdf(pdf_path: &Path, labels: &[String]) {
    let mut document = Document::with_version("1.5");
    let pages_id = document.new_object_id();
    let font_id = document.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = document.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for label in labels {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new(
                    "Tj",
                    vec![Object::String(
                        label.clone().into_bytes(),
                        StringFormat::Literal,
                    )],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id =
            document.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    document.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    document.trailer.set("Root", catalog_id);
    document.save(pdf_path).unwrap();
}

/// Writes a two-page PDF whose first page carries a link to its second page.
fn write_linked_pdf(pdf_path: &Path) {
    let mut document = Document::with_version("1.5");
    let pages_id = document.new_object_id();
    let first_page_id = document.new_object_id();
    let second_page_id = document.new_object_id();
    let annotation_id = document.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Link",
        "Rect" => vec![72.into(), 700.into(), 200.into(), 720.into()],
        "Dest" => vec![second_page_id.into(), "Fit".into()],
        "P" => first_page_id,
    });
    document.objects.insert(
        first_page_id,
        Object::Dictionary(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Annots" => vec![annotation_id.into()],
        }),
    );
    document.objects.insert(
        second_page_id,
        Object::Dictionary(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        }),
    );
    document.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![first_page_id.into(), second_page_id.into()],
            "Count" => 2,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    document.trailer.set("Root", catalog_id);
    document.save(pdf_path).unwrap();
}

fn labels(prefix: &str, count: usize) -> Vec<String> {
    (1..=count).map(|page| format!("{prefix} {page}")).collect()
}

/// The label shown on every page, in page order.
fn page_labels(pdf_path: &Path) -> Vec<String> {
    let document = Document::load(pdf_path).unwrap();
    document
        .get_pages()
        .into_values()
        .map(|page_id| {
            let content = Content::decode(&document.get_page_content(page_id).unwrap()).unwrap();
            content
                .operations
                .iter()
                .find(|operation| operation.operator == "Tj")
                .and_then(|operation| match operation.operands.first() {
                    Some(Object::String(bytes, _)) => Some(String::from_utf8_lossy(bytes).into_owned()),
                    _ => None,
                })
                .unwrap_or_default()
        })
        .collect()
}

struct Scenario {
    _directory: tempfile::TempDir,
    base: PathBuf,
    supplement_a: PathBuf,
    supplement_b: PathBuf,
    output: PathBuf,
}

/// A 9-page base with supplements of 2 and 1 pages.
fn scenario() -> Scenario {
    let directory = tempfile::tempdir().unwrap();
    let base = directory.path().join("2026-01.base.pdf");
    let supplement_a = directory.path().join("TQ-00001.pdf");
    let supplement_b = directory.path().join("TQ-00002.pdf");
    write_labelled_pdf(&base, &labels("base", 9));
    write_labelled_pdf(&supplement_a, &labels("supplement A", 2));
    write_labelled_pdf(&supplement_b, &labels("supplement B", 1));
    let output = directory.path().join("2026-01.pdf");

    Scenario {
        _directory: directory,
        base,
        supplement_a,
        supplement_b,
        output,
    }
}

#[test]
fn supplements_land_before_the_back_cover() {
    let scenario = scenario();
    let report = splice_documents(
        &scenario.base,
        &[scenario.supplement_a.clone(), scenario.supplement_b.clone()],
        &scenario.output,
    )
    .unwrap();

    assert_eq!(report.page_count, 9 - 1 + 2 + 1 + 1);
    assert_eq!(
        report.inserted,
        vec![
            (scenario.supplement_a.clone(), 2),
            (scenario.supplement_b.clone(), 1)
        ]
    );
    assert!(report.skipped.is_empty());

    let mut expected = labels("base", 8);
    expected.extend(labels("supplement A", 2));
    expected.extend(labels("supplement B", 1));
    expected.push("base 9".to_string());
    let written = page_labels(&scenario.output);
    similar_asserts::assert_eq!(written, expected);
    assert_eq!(written[10], "supplement B 1");
    assert_eq!(written[11], "base 9");
}

#[test]
fn missing_supplements_are_skipped_and_reported() {
    let scenario = scenario();
    let missing = scenario.supplement_b.with_file_name("TQ-00003.pdf");
    let report = splice_documents(
        &scenario.base,
        &[scenario.supplement_a.clone(), missing.clone()],
        &scenario.output,
    )
    .unwrap();

    assert_eq!(report.page_count, 11);
    assert_eq!(report.skipped, vec![missing]);
    assert_eq!(report.inserted.len(), 1);
    assert_eq!(page_labels(&scenario.output).len(), 11);
    assert_eq!(page_labels(&scenario.output)[10], "base 9");
}

#[test]
fn without_supplements_the_base_is_copied_unchanged() {
    let scenario = scenario();
    let report = splice_documents(&scenario.base, &[], &scenario.output).unwrap();

    assert_eq!(report.page_count, 9);
    similar_asserts::assert_eq!(page_labels(&scenario.output), labels("base", 9));
}

#[test]
fn a_single_page_base_ends_the_document() {
    let scenario = scenario();
    write_labelled_pdf(&scenario.base, &labels("cover", 1));
    splice_documents(
        &scenario.base,
        &[scenario.supplement_a.clone()],
        &scenario.output,
    )
    .unwrap();

    assert_eq!(
        page_labels(&scenario.output),
        ["supplement A 1", "supplement A 2", "cover 1"]
    );
}

#[test]
fn fonts_and_page_sizes_pass_through() {
    let scenario = scenario();
    splice_documents(
        &scenario.base,
        &[scenario.supplement_b.clone()],
        &scenario.output,
    )
    .unwrap();

    let document = Document::load(&scenario.output).unwrap();
    for page_id in document.get_pages().into_values() {
        let page = document.get_dictionary(page_id).unwrap();
        let media_box = page.get(b"MediaBox").and_then(Object::as_array).unwrap();
        assert_eq!(media_box.len(), 4);

        let resources_id = page.get(b"Resources").and_then(Object::as_reference).unwrap();
        let resources = document.get_dictionary(resources_id).unwrap();
        let fonts = resources.get(b"Font").and_then(Object::as_dict).unwrap();
        let font_id = fonts.get(b"F1").and_then(Object::as_reference).unwrap();
        let font = document.get_dictionary(font_id).unwrap();
        assert_eq!(
            font.get(b"BaseFont").and_then(Object::as_name_str).unwrap(),
            "Helvetica"
        );
    }
}

#[test]
fn splicing_is_deterministic() {
    let scenario = scenario();
    let supplements = [scenario.supplement_a.clone(), scenario.supplement_b.clone()];
    let second_output = scenario.output.with_file_name("again.pdf");
    splice_documents(&scenario.base, &supplements, &scenario.output).unwrap();
    splice_documents(&scenario.base, &supplements, &second_output).unwrap();

    assert!(std::fs::read(&scenario.output).unwrap() == std::fs::read(&second_output).unwrap());
}

#[test]
fn the_temporary_base_is_removed_after_the_splice() {
    let scenario = scenario();
    let base_labels = labels("generated", 3);
    let report = splice_with_temporary_base(
        &scenario.output,
        &[scenario.supplement_b.clone()],
        |base_path| {
            write_labelled_pdf(base_path, &base_labels);
            Ok(())
        },
    )
    .unwrap();

    assert_eq!(report.page_count, 4);
    assert!(!temporary_base_path(&scenario.output).exists());
    assert_eq!(
        page_labels(&scenario.output),
        ["generated 1", "generated 2", "supplement B 1", "generated 3"]
    );
}

#[test]
fn internal_links_point_at_the_spliced_pages() {
    let scenario = scenario();
    write_labelled_pdf(&scenario.base, &labels("base", 3));
    let linked = scenario.supplement_a.with_file_name("linked.pdf");
    write_linked_pdf(&linked);
    splice_documents(&scenario.base, &[linked], &scenario.output).unwrap();

    let document = Document::load(&scenario.output).unwrap();
    let page_ids: Vec<_> = document.get_pages().into_values().collect();
    assert_eq!(page_ids.len(), 5);

    let linking_page = document.get_dictionary(page_ids[2]).unwrap();
    let annotations = linking_page.get(b"Annots").and_then(Object::as_array).unwrap();
    let annotation = match &annotations[0] {
        Object::Reference(annotation_id) => document.get_dictionary(*annotation_id).unwrap(),
        Object::Dictionary(annotation) => annotation,
        other => panic!("unexpected annotation {:?}", other),
    };
    let destination = annotation.get(b"Dest").and_then(Object::as_array).unwrap();
    assert_eq!(destination[0].as_reference().unwrap(), page_ids[3]);
    assert_eq!(
        annotation.get(b"P").and_then(Object::as_reference).unwrap(),
        page_ids[2]
    );

    // No detached copies of the source pages or of their page tree
    let page_dictionary_count = document
        .objects
        .values()
        .filter(|object| {
            object
                .as_dict()
                .and_then(|dictionary| dictionary.get(b"Type"))
                .and_then(Object::as_name_str)
                .is_ok_and(|type_name| type_name == "Page" || type_name == "Pages")
        })
        .count();
    assert_eq!(page_dictionary_count, page_ids.len() + 1);
}
