use crate::embed::{create_image_xobject, prepare_page_image};
use crate::options::AssembleOptions;
use crate::types::*;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use mag_render::constants::px_to_pt;
use mag_render::{CapturedPage, TocEntry};
use std::collections::HashMap;
use std::path::Path;

/// An output page and what is needed to attach its links later
struct PlacedPage {
    page_number: u32,
    page_id: ObjectId,
    width_pt: f32,
    height_pt: f32,
    links: Vec<TocEntry>,
}

/// Build one PDF from captured pages.
///
/// Pages are ordered by page number; each output page takes the physical
/// size of its own bitmap. Pages without a usable bitmap are skipped with a
/// warning, and the call only fails when nothing could be placed.
pub fn assemble(
    pages: &[CapturedPage],
    options: &AssembleOptions,
    on_progress: &mut dyn FnMut(AssemblyProgress),
) -> Result<AssembledDocument> {
    options.validate()?;
    if pages.is_empty() {
        return Err(AssembleError::EmptyDocument);
    }

    // sort_by_key is stable, so duplicate numbers keep their input order
    let mut ordered: Vec<&CapturedPage> = pages.iter().collect();
    ordered.sort_by_key(|page| page.page_number);

    let mut output = Document::with_version("1.7");
    let pages_id = output.new_object_id();
    let mut warnings = Vec::new();
    let mut placed: Vec<PlacedPage> = Vec::new();

    let total = ordered.len();
    for (idx, page) in ordered.into_iter().enumerate() {
        on_progress(AssemblyProgress::LoadingPage {
            index: idx + 1,
            total,
            page_number: page.page_number,
        });

        match add_page(&mut output, pages_id, page, options.jpeg_quality) {
            Ok(placed_page) => placed.push(placed_page),
            Err(reason) => {
                log::warn!("Skipping page {}: {}", page.page_number, reason);
                warnings.push(AssemblyWarning::new(page.page_number, reason));
            }
        }
    }

    if placed.is_empty() {
        return Err(AssembleError::EmptyDocument);
    }

    on_progress(AssemblyProgress::EmbeddingLinks);
    let link_count = add_links(&mut output, &placed, &mut warnings)?;

    on_progress(AssemblyProgress::Finalizing);
    let page_refs: Vec<Object> = placed
        .iter()
        .map(|p| Object::Reference(p.page_id))
        .collect();
    let count = page_refs.len() as i64;
    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(page_refs)),
        ("Count", Object::Integer(count)),
    ]);
    output
        .objects
        .insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = output.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    output.trailer.set("Root", catalog_id);

    let mut info = Dictionary::new();
    if let Some(title) = options.title.as_deref().filter(|t| !t.trim().is_empty()) {
        info.set("Title", Object::string_literal(title));
    }
    info.set("Producer", Object::string_literal(options.producer.as_str()));
    let info_id = output.add_object(info);
    output.trailer.set("Info", info_id);

    let mut bytes = Vec::new();
    output.save_to(&mut bytes)?;

    log::info!(
        "Assembled {} page(s) with {} link(s), {} warning(s)",
        placed.len(),
        link_count,
        warnings.len()
    );

    Ok(AssembledDocument {
        bytes,
        page_count: placed.len(),
        link_count,
        warnings,
    })
}

/// Run [`assemble`] on the blocking pool
pub async fn assemble_async(
    pages: Vec<CapturedPage>,
    options: AssembleOptions,
    mut on_progress: impl FnMut(AssemblyProgress) + Send + 'static,
) -> Result<AssembledDocument> {
    tokio::task::spawn_blocking(move || assemble(&pages, &options, &mut on_progress)).await?
}

/// Write an assembled document to disk
pub async fn save_pdf(bytes: &[u8], path: impl AsRef<Path>) -> Result<()> {
    tokio::fs::write(path.as_ref(), bytes).await?;
    Ok(())
}

fn add_page(
    output: &mut Document,
    parent_pages_id: ObjectId,
    page: &CapturedPage,
    quality: u8,
) -> std::result::Result<PlacedPage, String> {
    let data_uri = page
        .encoded_image
        .as_deref()
        .ok_or_else(|| "page failed to render".to_string())?;
    if page.width == 0 || page.height == 0 {
        return Err(format!("page has no size ({}x{})", page.width, page.height));
    }

    let image = prepare_page_image(data_uri, quality)?;

    // Same DPI as the render, so the page keeps its captured aspect ratio
    let width_pt = px_to_pt(page.width as f64) as f32;
    let height_pt = px_to_pt(page.height as f64) as f32;

    let xobject_id = create_image_xobject(output, image);
    let mut xobjects = Dictionary::new();
    xobjects.set("Im0", Object::Reference(xobject_id));
    let mut resources = Dictionary::new();
    resources.set("XObject", Object::Dictionary(xobjects));

    let content = format!("q {} 0 0 {} 0 0 cm /Im0 Do Q\n", width_pt, height_pt);
    let content_id = output.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

    let mut page_dict = Dictionary::new();
    page_dict.set("Type", Object::Name(b"Page".to_vec()));
    page_dict.set("Parent", Object::Reference(parent_pages_id));
    page_dict.set(
        "MediaBox",
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(width_pt),
            Object::Real(height_pt),
        ]),
    );
    page_dict.set("Contents", Object::Reference(content_id));
    page_dict.set("Resources", Object::Dictionary(resources));

    Ok(PlacedPage {
        page_number: page.page_number,
        page_id: output.add_object(page_dict),
        width_pt,
        height_pt,
        links: page.links.clone(),
    })
}

/// Attach link annotations once every page id is known.
/// Returns the number of links written.
fn add_links(
    output: &mut Document,
    placed: &[PlacedPage],
    warnings: &mut Vec<AssemblyWarning>,
) -> Result<usize> {
    // First page wins when page numbers repeat
    let mut targets: HashMap<u32, ObjectId> = HashMap::new();
    for page in placed {
        targets.entry(page.page_number).or_insert(page.page_id);
    }

    let mut written = 0;
    for page in placed {
        let mut annots = Vec::new();
        for link in &page.links {
            let Some(&target_id) = targets.get(&link.destination_page) else {
                log::warn!(
                    "Dropping link on page {} to missing page {}",
                    page.page_number,
                    link.destination_page
                );
                warnings.push(AssemblyWarning::new(
                    page.page_number,
                    format!("link target page {} is not in the document", link.destination_page),
                ));
                continue;
            };
            if link.source_region.width <= 0.0 || link.source_region.height <= 0.0 {
                continue;
            }
            let Some(rect) = link_rect(link, page.width_pt, page.height_pt) else {
                warnings.push(AssemblyWarning::new(
                    page.page_number,
                    format!("link to page {} lies outside the page", link.destination_page),
                ));
                continue;
            };

            let annot_id = output.add_object(Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Annot".to_vec())),
                ("Subtype", Object::Name(b"Link".to_vec())),
                ("Rect", Object::Array(rect)),
                (
                    "Border",
                    Object::Array(vec![
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Integer(0),
                    ]),
                ),
                (
                    "Dest",
                    Object::Array(vec![
                        Object::Reference(target_id),
                        Object::Name(b"Fit".to_vec()),
                    ]),
                ),
            ]));
            annots.push(Object::Reference(annot_id));
        }

        if annots.is_empty() {
            continue;
        }
        written += annots.len();
        output
            .get_object_mut(page.page_id)?
            .as_dict_mut()?
            .set("Annots", Object::Array(annots));
    }

    Ok(written)
}

/// Region in top-left page pixels to a PDF rect in bottom-left points,
/// clipped to the page. `None` when nothing of the region is on the page.
fn link_rect(link: &TocEntry, page_width_pt: f32, page_height_pt: f32) -> Option<Vec<Object>> {
    let region = link.source_region;
    let to_pt = |px: f32| px_to_pt(px as f64) as f32;
    let x1 = to_pt(region.x).max(0.0);
    let x2 = to_pt(region.x + region.width).min(page_width_pt);
    let y1 = (page_height_pt - to_pt(region.y + region.height)).max(0.0);
    let y2 = (page_height_pt - to_pt(region.y)).min(page_height_pt);
    if x2 <= x1 || y2 <= y1 {
        return None;
    }
    Some(vec![
        Object::Real(x1),
        Object::Real(y1),
        Object::Real(x2),
        Object::Real(y2),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use mag_render::Region;

    #[test]
    fn test_link_rect_flips_y_axis() {
        let link = TocEntry {
            source_region: Region {
                x: 96.0,
                y: 0.0,
                width: 96.0,
                height: 48.0,
            },
            destination_page: 2,
        };
        let rect: Vec<f32> = link_rect(&link, 540.0, 720.0)
            .unwrap()
            .into_iter()
            .map(|o| o.as_float().unwrap())
            .collect();
        assert_eq!(rect, vec![72.0, 684.0, 144.0, 720.0]);
    }

    #[test]
    fn test_link_rect_is_clipped_to_the_page() {
        let link = |y: f32| TocEntry {
            source_region: Region {
                x: -40.0,
                y,
                width: 200.0,
                height: 80.0,
            },
            destination_page: 4,
        };
        let rect: Vec<f32> = link_rect(&link(920.0), 540.0, 720.0)
            .unwrap()
            .into_iter()
            .map(|o| o.as_float().unwrap())
            .collect();
        assert_eq!(rect, vec![0.0, 0.0, 120.0, 30.0]);

        assert!(link_rect(&link(1000.0), 540.0, 720.0).is_none());
    }
}
