//! Text extraction for uploaded documents (PDF, DOCX).
//!
//! Extraction is pipeline-layer: callers supply a file name and raw bytes;
//! this module returns per-page plain UTF-8 text. PDFs keep their 1-based
//! page numbers so answers can cite them; DOCX has no page geometry and
//! yields a single page-less block.

use std::io::Read;

use crate::models::PageText;

/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Extraction error. Extraction never panics; a failed document is skipped
/// by the ingestion pipeline and reported to the caller.
#[derive(Debug)]
pub enum ExtractError {
    UnsupportedFormat(String),
    Pdf(String),
    Docx(String),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::UnsupportedFormat(name) => {
                write!(f, "unsupported document format: {}", name)
            }
            ExtractError::Pdf(e) => write!(f, "PDF extraction failed: {}", e),
            ExtractError::Docx(e) => write!(f, "DOCX extraction failed: {}", e),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Extracts per-page plain text from a document's raw bytes.
///
/// The format is chosen from the file name's extension (case-insensitive).
/// Pages that are empty after trimming are dropped, so a scanned PDF with
/// no text layer yields an empty vector rather than blank pages.
pub fn extract_pages(name: &str, bytes: &[u8]) -> Result<Vec<PageText>, ExtractError> {
    let lower = name.to_ascii_lowercase();
    let pages = if lower.ends_with(".pdf") {
        extract_pdf(bytes)?
    } else if lower.ends_with(".docx") {
        extract_docx(bytes)?
    } else {
        return Err(ExtractError::UnsupportedFormat(name.to_string()));
    };

    Ok(pages
        .into_iter()
        .filter(|p| !p.text.trim().is_empty())
        .collect())
}

fn extract_pdf(bytes: &[u8]) -> Result<Vec<PageText>, ExtractError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| ExtractError::Pdf(e.to_string()))?;

    Ok(pages
        .into_iter()
        .enumerate()
        .map(|(i, text)| PageText {
            page_number: Some(i as u32 + 1),
            text,
        })
        .collect())
}

fn extract_docx(bytes: &[u8]) -> Result<Vec<PageText>, ExtractError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ExtractError::Docx(e.to_string()))?;
    let mut doc_xml = Vec::new();
    let mut found = false;
    for i in 0..archive.len() {
        let entry = archive
            .by_index(i)
            .map_err(|e| ExtractError::Docx(e.to_string()))?;
        if entry.name() == "word/document.xml" {
            entry
                .take(MAX_XML_ENTRY_BYTES)
                .read_to_end(&mut doc_xml)
                .map_err(|e| ExtractError::Docx(e.to_string()))?;
            if doc_xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
                return Err(ExtractError::Docx(
                    "word/document.xml exceeds size limit".to_string(),
                ));
            }
            found = true;
            break;
        }
    }
    if !found {
        return Err(ExtractError::Docx("word/document.xml not found".to_string()));
    }

    let text = extract_w_t_elements(&doc_xml)?;
    Ok(vec![PageText {
        page_number: None,
        text,
    }])
}

/// Pull the text runs (`<w:t>`) out of a WordprocessingML body. Paragraph
/// ends (`</w:p>`) become line breaks so the chunker sees real boundaries.
fn extract_w_t_elements(xml: &[u8]) -> Result<String, ExtractError> {
    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    if let Ok(quick_xml::events::Event::Text(te)) = reader.read_event_into(&mut buf)
                    {
                        out.push_str(te.unescape().unwrap_or_default().as_ref());
                    }
                }
            }
            Ok(quick_xml::events::Event::End(e)) => {
                if e.local_name().as_ref() == b"p" && !out.ends_with('\n') && !out.is_empty() {
                    out.push('\n');
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ExtractError::Docx(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}
