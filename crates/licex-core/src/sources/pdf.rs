//! PDF line source using lopdf and pdf-extract.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageBuffer, Rgba};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace};

use super::{has_extension, ImageRegion, LineSource, SourceDocument};
use crate::error::{PdfError, Result};
use crate::models::config::PdfConfig;
use crate::models::document::{lines_from_text, renumber, DocumentLine};

/// Line source for PDF documents.
///
/// Text comes from the page content streams; when they yield too little,
/// pdf-extract is used for the whole document. Embedded images become
/// OCR regions.
#[derive(Debug, Clone, Default)]
pub struct PdfLineSource {
    config: PdfConfig,
}

impl PdfLineSource {
    pub fn new(config: PdfConfig) -> Self {
        Self { config }
    }

    fn load(&self, data: &[u8]) -> std::result::Result<(Document, Vec<u8>), PdfError> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Malformed(e.to_string()))?;

        // Empty-password encryption is common on scanned licences
        let raw = if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::PasswordProtected);
            }
            debug!("Decrypted PDF with empty password");
            let mut decrypted = Vec::new();
            doc.save_to(&mut decrypted)
                .map_err(|e| PdfError::Malformed(format!("re-saving decrypted document: {}", e)))?;
            decrypted
        } else {
            data.to_vec()
        };

        if doc.get_pages().is_empty() {
            return Err(PdfError::NoPages);
        }
        Ok((doc, raw))
    }

    fn page_numbers(&self, doc: &Document) -> Vec<u32> {
        let mut pages: Vec<u32> = doc.get_pages().keys().copied().collect();
        pages.sort_unstable();
        if self.config.max_pages > 0 {
            pages.truncate(self.config.max_pages);
        }
        pages
    }

    fn page_lines(&self, doc: &Document, raw: &[u8], pages: &[u32]) -> Vec<DocumentLine> {
        let mut lines = Vec::new();
        for &page in pages {
            let text = doc.extract_text(&[page]).unwrap_or_default();
            lines.extend(lines_from_text(text.lines(), page));
        }

        let direct_len: usize = lines.iter().map(|l| l.text.len()).sum();
        if direct_len >= self.config.min_text_length {
            return renumber(lines);
        }

        // Content streams yielded little; pdf-extract handles more encodings
        match pdf_extract::extract_text_from_mem_by_pages(raw) {
            Ok(texts) => {
                let extracted = lines_by_page(&texts, pages);
                let extracted_len: usize = extracted.iter().map(|l| l.text.len()).sum();
                if extracted_len > direct_len {
                    debug!("Using pdf-extract text ({} chars)", extracted_len);
                    renumber(extracted)
                } else {
                    renumber(lines)
                }
            }
            Err(e) => {
                trace!("pdf-extract failed: {}", e);
                renumber(lines)
            }
        }
    }

    fn image_regions(&self, doc: &Document, pages: &[u32]) -> Vec<ImageRegion> {
        let page_ids = doc.get_pages();
        let mut regions = Vec::new();

        for &page in pages {
            let Some(page_id) = page_ids.get(&page) else {
                continue;
            };
            let images = page_images(doc, *page_id);
            trace!("Page {}: {} image(s)", page, images.len());
            regions.extend(
                images
                    .into_iter()
                    .enumerate()
                    .filter_map(|(index, img)| encode_region(img, page, index)),
            );
        }

        if regions.is_empty() {
            // Some scanners skip per-page XObject resources; such images carry
            // no page, so they are reported on the first page read
            let first_page = pages.first().copied().unwrap_or(1);
            regions = all_images(doc)
                .into_iter()
                .enumerate()
                .filter_map(|(index, img)| encode_region(img, first_page, index))
                .collect();
        }

        regions
    }
}

impl LineSource for PdfLineSource {
    fn supports(&self, path: &Path) -> bool {
        has_extension(path, &["pdf"])
    }

    fn read(&self, path: &Path) -> Result<SourceDocument> {
        let data = std::fs::read(path)?;
        let (doc, raw) = self.load(&data)?;
        let pages = self.page_numbers(&doc);

        let lines = self.page_lines(&doc, &raw, &pages);
        let image_regions = self.image_regions(&doc, &pages);

        debug!(
            "Read {}: {} pages, {} lines, {} image regions",
            path.display(),
            pages.len(),
            lines.len(),
            image_regions.len()
        );

        Ok(SourceDocument {
            lines,
            number_of_pages: pages.len() as u32,
            image_regions,
        })
    }
}

/// Lines of the selected pages from per-page text in document order.
fn lines_by_page(texts: &[String], pages: &[u32]) -> Vec<DocumentLine> {
    pages
        .iter()
        .filter_map(|&page| {
            let text = texts.get(page.checked_sub(1)? as usize)?;
            Some(lines_from_text(text.lines(), page))
        })
        .flatten()
        .collect()
}

fn encode_region(img: DynamicImage, page_number: u32, index: usize) -> Option<ImageRegion> {
    let (width, height) = (img.width(), img.height());
    let mut data = Vec::new();
    if let Err(e) = img.write_to(&mut Cursor::new(&mut data), image::ImageFormat::Png) {
        trace!("Could not encode image {} on page {}: {}", index, page_number, e);
        return None;
    }
    Some(ImageRegion {
        page_number,
        index,
        width,
        height,
        data,
    })
}

fn page_images(doc: &Document, page_id: ObjectId) -> Vec<DynamicImage> {
    let mut images = Vec::new();
    let Some(resources) = page_resources(doc, page_id) else {
        return images;
    };
    let Ok(xobjects) = resources.get(b"XObject") else {
        return images;
    };
    if let Ok((_, Object::Dictionary(xobj_dict))) = doc.dereference(xobjects) {
        for (_name, obj_ref) in xobj_dict.iter() {
            if let Ok((_, obj)) = doc.dereference(obj_ref) {
                if let Some(img) = image_from_object(doc, obj) {
                    images.push(img);
                }
            }
        }
    }
    images
}

fn all_images(doc: &Document) -> Vec<DynamicImage> {
    doc.objects
        .values()
        .filter_map(|object| image_from_object(doc, object))
        .collect()
}

/// Resources dictionary of a page, following inheritance up the page tree.
fn page_resources(doc: &Document, node_id: ObjectId) -> Option<Dictionary> {
    let Object::Dictionary(dict) = doc.get_object(node_id).ok()? else {
        return None;
    };
    if let Ok(resources) = dict.get(b"Resources") {
        if let Ok((_, Object::Dictionary(res_dict))) = doc.dereference(resources) {
            return Some(res_dict.clone());
        }
    }
    match dict.get(b"Parent") {
        Ok(Object::Reference(parent_id)) => page_resources(doc, *parent_id),
        _ => None,
    }
}

fn image_from_object(doc: &Document, obj: &Object) -> Option<DynamicImage> {
    let Object::Stream(stream) = obj else {
        return None;
    };
    let dict = &stream.dict;

    if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
        return None;
    }
    let width = dict.get(b"Width").ok()?.as_i64().ok()? as u32;
    let height = dict.get(b"Height").ok()?.as_i64().ok()? as u32;
    trace!("Found image object: {}x{}", width, height);

    if let Ok(filter) = dict.get(b"Filter") {
        let filter_name = match filter {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
            _ => None,
        };
        match filter_name {
            Some(b"DCTDecode") => {
                return image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg).ok();
            }
            Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                trace!("Unsupported image filter");
                return None;
            }
            _ => {}
        }
    }

    let data = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());

    let color_space = dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|o| match o {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
            Object::Reference(r) => doc.get_object(*r).ok().and_then(|o| o.as_name().ok()),
            _ => None,
        })
        .unwrap_or(b"DeviceRGB");

    let bits = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(8);

    image_from_raw(&data, width, height, color_space, bits)
}

fn image_from_raw(data: &[u8], width: u32, height: u32, color_space: &[u8], bits: i64) -> Option<DynamicImage> {
    if bits != 8 {
        trace!("Unsupported bits per component: {}", bits);
        return None;
    }

    let pixels = (width as usize) * (height as usize);
    let rgba: Vec<u8> = match color_space {
        b"DeviceRGB" | b"RGB" if data.len() >= pixels * 3 => data[..pixels * 3]
            .chunks_exact(3)
            .flat_map(|c| [c[0], c[1], c[2], 255])
            .collect(),
        b"DeviceGray" | b"G" if data.len() >= pixels => data[..pixels]
            .iter()
            .flat_map(|&g| [g, g, g, 255])
            .collect(),
        _ => {
            trace!(
                "Could not decode image: data_len={}, colorspace={:?}",
                data.len(),
                String::from_utf8_lossy(color_space)
            );
            return None;
        }
    };

    ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, rgba).map(DynamicImage::ImageRgba8)
}
