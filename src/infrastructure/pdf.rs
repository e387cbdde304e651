use crate::error::{PortalError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId, dictionary};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITED_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];
const MAX_TREE_DEPTH: usize = 32;

/// Extracts the text layer of a PDF file.
///
/// Parsing is CPU-bound, so it runs on the blocking pool.
pub async fn extract_text(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path).await?;
    let name = path.display().to_string();

    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| PortalError::InternalError(Box::new(e)))?
        .map_err(|e| PortalError::PdfError(format!("{name}: {e}")))?;

    debug!(document = %path.display(), chars = text.len(), "Extracted PDF text");
    Ok(text)
}

/// Concatenates PDF files in the given order and writes the result to
/// `output`. Returns the page count of the merged document.
pub async fn merge_files<P: AsRef<Path>>(inputs: &[P], output: &Path) -> Result<usize> {
    let mut sources = Vec::with_capacity(inputs.len());
    for input in inputs {
        sources.push(tokio::fs::read(input.as_ref()).await?);
    }

    let (bytes, pages) = tokio::task::spawn_blocking(move || merge(sources))
        .await
        .map_err(|e| PortalError::InternalError(Box::new(e)))??;
    tokio::fs::write(output, bytes).await?;

    info!(documents = inputs.len(), pages, output = %output.display(), "Merged PDFs");
    Ok(pages)
}

/// Merges in-memory PDFs into one document, keeping every page of every
/// source in order.
///
/// Objects of each source are renumbered into a shared id space, then a new
/// page tree and catalog are built over the collected pages. Attributes the
/// pages inherited from their old page tree are copied onto the pages.
pub fn merge(sources: Vec<Vec<u8>>) -> Result<(Vec<u8>, usize)> {
    if sources.is_empty() {
        return Err(PortalError::ValidationError(
            "At least one PDF is required".to_string(),
        ));
    }

    let mut next_id = 1;
    let mut pages: Vec<(ObjectId, Dictionary)> = Vec::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for (index, bytes) in sources.iter().enumerate() {
        let mut doc = Document::load_mem(bytes)
            .map_err(|e| PortalError::PdfError(format!("document {}: {e}", index + 1)))?;
        doc.renumber_objects_with(next_id);
        next_id = doc.max_id + 1;

        for page_id in doc.get_pages().into_values() {
            let mut page = doc.get_dictionary(page_id).map_err(pdf_error)?.clone();
            for key in INHERITED_KEYS {
                if !page.has(key) {
                    if let Some(value) = inherited(&doc, &page, key) {
                        page.set(key, value);
                    }
                }
            }
            pages.push((page_id, page));
        }

        objects.extend(
            doc.objects
                .into_iter()
                .filter(|(_, object)| !is_tree_node(object)),
        );
    }

    let pages_id = (next_id, 0);
    let catalog_id = (next_id + 1, 0);
    let mut merged = Document::with_version("1.5");
    merged.objects = objects;

    let kids: Vec<Object> = pages.iter().map(|(id, _)| Object::Reference(*id)).collect();
    let count = pages.len();
    for (id, mut page) in pages {
        page.set("Parent", pages_id);
        merged.objects.insert(id, Object::Dictionary(page));
    }
    merged.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count as i64,
        }),
    );
    merged.objects.insert(
        catalog_id,
        Object::Dictionary(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        }),
    );
    merged.trailer.set("Root", catalog_id);
    merged.max_id = catalog_id.0;
    merged.renumber_objects();

    let mut out = Vec::new();
    merged.save_to(&mut out).map_err(pdf_error)?;
    Ok((out, count))
}

/// Looks `key` up the page's ancestors.
fn inherited(doc: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    for _ in 0..MAX_TREE_DEPTH {
        let node = doc.get_dictionary(parent?).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}

/// Catalogs, page-tree nodes and pages are rebuilt by [`merge`].
fn is_tree_node(object: &Object) -> bool {
    let kind = object
        .as_dict()
        .and_then(|dict| dict.get(b"Type"))
        .and_then(Object::as_name);
    matches!(kind, Ok(b"Catalog" | b"Pages" | b"Page"))
}

fn pdf_error(error: impl std::fmt::Display) -> PortalError {
    PortalError::PdfError(error.to_string())
}
