use std::collections::HashMap;
use std::path::{Path, PathBuf};

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::ContextError;

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE_ATTRIBUTES: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guards the walk up the page tree against malformed, cyclic parents.
const MAXIMUM_PAGE_TREE_DEPTH: usize = 64;

/// Outcome of a splice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpliceReport {
    pub page_count: usize,
    /// Supplements that were inserted, with their page counts, in insertion order.
    pub inserted: Vec<(PathBuf, usize)>,
    /// Supplements that did not exist on disk.
    pub skipped: Vec<PathBuf>,
}

/// Deep-copies objects of one source document into a target document, copying every object once.
///
/// Pages are only copied through `copy_page`. A reference to a page reached from any other object,
/// like the destination of an internal link, resolves to the id reserved for that page, or to null
/// when the page is not part of the output.
struct ObjectCopier<'a> {
    source: &'a Document,
    id_map: HashMap<ObjectId, ObjectId>,
}

impl<'a> ObjectCopier<'a> {
    fn new(source: &'a Document) -> Self {
        ObjectCopier {
            source,
            id_map: HashMap::new(),
        }
    }

    /// Allocates the target ids of the pages that will be copied, before anything refers to them.
    fn reserve_pages(&mut self, page_ids: &[ObjectId], target: &mut Document) {
        for page_id in page_ids {
            if !self.id_map.contains_key(page_id) {
                let target_id = target.add_object(Object::Null);
                self.id_map.insert(*page_id, target_id);
            }
        }
    }

    fn is_page(&self, source_id: ObjectId) -> bool {
        self.source
            .get_dictionary(source_id)
            .and_then(|dictionary| dictionary.get(b"Type"))
            .and_then(Object::as_name_str)
            .is_ok_and(|type_name| type_name == "Page")
    }

    fn copy_object(
        &mut self,
        source_id: ObjectId,
        target: &mut Document,
    ) -> Result<ObjectId, lopdf::Error> {
        if let Some(target_id) = self.id_map.get(&source_id) {
            return Ok(*target_id);
        }

        // Registered before recursing so that reference cycles resolve to this id
        let target_id = target.add_object(Object::Null);
        self.id_map.insert(source_id, target_id);

        let object = self.source.get_object(source_id)?.clone();
        let object = self.remap_references(object, target)?;
        target.objects.insert(target_id, object);

        Ok(target_id)
    }

    fn remap_references(
        &mut self,
        object: Object,
        target: &mut Document,
    ) -> Result<Object, lopdf::Error> {
        match object {
            Object::Reference(source_id) => {
                if !self.id_map.contains_key(&source_id) && self.is_page(source_id) {
                    return Ok(Object::Null);
                }
                Ok(Object::Reference(self.copy_object(source_id, target)?))
            }
            Object::Array(array) => Ok(Object::Array(
                array
                    .into_iter()
                    .map(|object| self.remap_references(object, target))
                    .collect::<Result<Vec<_>, _>>()?,
            )),
            Object::Dictionary(mut dictionary) => {
                self.remap_dictionary(&mut dictionary, target)?;
                Ok(Object::Dictionary(dictionary))
            }
            Object::Stream(mut stream) => {
                self.remap_dictionary(&mut stream.dict, target)?;
                Ok(Object::Stream(stream))
            }
            object => Ok(object),
        }
    }

    fn remap_dictionary(
        &mut self,
        dictionary: &mut Dictionary,
        target: &mut Document,
    ) -> Result<(), lopdf::Error> {
        for (_, value) in dictionary.iter_mut() {
            *value = self.remap_references(std::mem::replace(value, Object::Null), target)?;
        }
        Ok(())
    }

    /// Copies a page as a child of `pages_id`, resolving its inherited attributes first so that the
    /// source page tree itself is never copied.
    fn copy_page(
        &mut self,
        page_id: ObjectId,
        pages_id: ObjectId,
        target: &mut Document,
    ) -> Result<ObjectId, lopdf::Error> {
        let mut page = self.source.get_dictionary(page_id)?.clone();
        for attribute in INHERITABLE_ATTRIBUTES {
            if page.has(attribute) {
                continue;
            }
            if let Some(value) = inherited_attribute(self.source, &page, attribute) {
                page.set(attribute.to_vec(), value);
            }
        }
        page.remove(b"Parent");

        // Annotations pointing back at their page resolve to the copy
        let target_id = match self.id_map.get(&page_id) {
            Some(target_id) => *target_id,
            None => {
                let target_id = target.add_object(Object::Null);
                self.id_map.insert(page_id, target_id);
                target_id
            }
        };

        self.remap_dictionary(&mut page, target)?;
        page.set("Parent", Object::Reference(pages_id));
        target.objects.insert(target_id, Object::Dictionary(page));

        Ok(target_id)
    }
}

/// Looks `attribute` up along the `Parent` chain of `page`.
fn inherited_attribute(document: &Document, page: &Dictionary, attribute: &[u8]) -> Option<Object> {
    let mut parent_id = page.get(b"Parent").and_then(Object::as_reference).ok();
    for _ in 0..MAXIMUM_PAGE_TREE_DEPTH {
        let node = document.get_dictionary(parent_id?).ok()?;
        if let Ok(value) = node.get(attribute) {
            return Some(value.clone());
        }
        parent_id = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}

/// The document being assembled, with a flat page tree.
struct SplicedDocument {
    document: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
}

impl SplicedDocument {
    fn new(version: &str) -> Self {
        let mut document = Document::with_version(version);
        let pages_id = document.new_object_id();
        SplicedDocument {
            document,
            pages_id,
            kids: Vec::new(),
        }
    }

    fn append_pages(
        &mut self,
        copier: &mut ObjectCopier,
        page_ids: &[ObjectId],
    ) -> Result<(), lopdf::Error> {
        for page_id in page_ids {
            let copied_page_id = copier.copy_page(*page_id, self.pages_id, &mut self.document)?;
            self.kids.push(Object::Reference(copied_page_id));
        }
        Ok(())
    }

    fn save(mut self, output_path: &Path) -> Result<usize, ContextError> {
        use lopdf::Object::*;

        let page_count = self.kids.len();
        self.document.objects.insert(
            self.pages_id,
            Dictionary(lopdf::Dictionary::from_iter(vec![
                ("Type", Name("Pages".into())),
                ("Kids", Array(self.kids)),
                ("Count", Integer(page_count as i64)),
            ])),
        );
        let catalog_id = self
            .document
            .add_object(lopdf::Dictionary::from_iter(vec![
                ("Type", Name("Catalog".into())),
                ("Pages", Reference(self.pages_id)),
            ]));
        self.document.trailer.set("Root", Reference(catalog_id));
        self.document.compress();

        self.document.save(output_path).map_err(|error| {
            ContextError::with_path_error("Failed to save the spliced document to", output_path, &error)
        })?;

        Ok(page_count)
    }
}

fn load_document(pdf_path: &Path) -> Result<Document, ContextError> {
    Document::load(pdf_path).map_err(|error| {
        ContextError::with_path_error("Failed to load the PDF document", pdf_path, &error)
    })
}

fn ordered_page_ids(document: &Document) -> Vec<ObjectId> {
    // Keyed by page number, so the values come out in reading order
    document.get_pages().into_values().collect()
}

fn copy_error(pdf_path: &Path) -> impl FnOnce(lopdf::Error) -> ContextError + '_ {
    move |error| ContextError::with_path_error("Failed to copy the pages of", pdf_path, &error)
}

/// Writes `output_path` with every page of `base_path` except its last, then every page of each
/// supplement in order, then the last page of the base.
///
/// Supplements missing from disk are skipped with a warning and listed in the report.
pub fn splice_documents(
    base_path: &Path,
    supplements: &[PathBuf],
    output_path: &Path,
) -> Result<SpliceReport, ContextError> {
    let base = load_document(base_path)?;
    let base_page_ids = ordered_page_ids(&base);
    let Some((back_cover, body)) = base_page_ids.split_last() else {
        return Err(ContextError::with_context(format!(
            "The base document {:?} has no pages",
            base_path
        )));
    };

    let mut spliced = SplicedDocument::new(&base.version);
    let mut base_copier = ObjectCopier::new(&base);
    base_copier.reserve_pages(&base_page_ids, &mut spliced.document);
    spliced
        .append_pages(&mut base_copier, body)
        .map_err(copy_error(base_path))?;

    let mut report = SpliceReport::default();
    for supplement_path in supplements {
        if !supplement_path.exists() {
            log::warn!(
                "Skipping the missing supplement {}",
                supplement_path.display()
            );
            report.skipped.push(supplement_path.clone());
            continue;
        }
        let supplement = load_document(supplement_path)?;
        let supplement_page_ids = ordered_page_ids(&supplement);
        let mut supplement_copier = ObjectCopier::new(&supplement);
        supplement_copier.reserve_pages(&supplement_page_ids, &mut spliced.document);
        spliced
            .append_pages(&mut supplement_copier, &supplement_page_ids)
            .map_err(copy_error(supplement_path))?;
        log::info!(
            "Inserted {} page(s) from {}",
            supplement_page_ids.len(),
            supplement_path.display()
        );
        report
            .inserted
            .push((supplement_path.clone(), supplement_page_ids.len()));
    }

    spliced
        .append_pages(&mut base_copier, std::slice::from_ref(back_cover))
        .map_err(copy_error(base_path))?;
    if let Ok(info) = base.trailer.get(b"Info") {
        let info = base_copier
            .remap_references(info.clone(), &mut spliced.document)
            .map_err(copy_error(base_path))?;
        spliced.document.trailer.set("Info", info);
    }

    report.page_count = spliced.save(output_path)?;
    log::debug!(
        "Spliced {} supplement(s) into {:?}, {} pages in total",
        report.inserted.len(),
        output_path,
        report.page_count
    );

    Ok(report)
}

/// Path of the temporary base document written next to `output_path`.
pub fn temporary_base_path(output_path: &Path) -> PathBuf {
    let mut file_name = output_path
        .file_stem()
        .map(|stem| stem.to_os_string())
        .unwrap_or_default();
    file_name.push(".base.pdf");
    output_path.with_file_name(file_name)
}

/// Writes the base document through `write_base` into a temporary file next to `output_path`,
/// splices the supplements into it and removes the temporary file once the splice succeeded.
pub fn splice_with_temporary_base<F>(
    output_path: &Path,
    supplements: &[PathBuf],
    write_base: F,
) -> Result<SpliceReport, ContextError>
where
    F: FnOnce(&Path) -> Result<(), ContextError>,
{
    let base_path = temporary_base_path(output_path);
    write_base(&base_path)?;
    let report = splice_documents(&base_path, supplements, output_path)?;
    std::fs::remove_file(&base_path).map_err(|error| {
        ContextError::with_path_error("Failed to remove the temporary base document", &base_path, &error)
    })?;

    Ok(report)
}
