//! Bounded, total content extraction.
//!
//! [`extract`] maps a file path to searchable text and never fails: every
//! error path, unknown encoding, or malformed document degrades to an empty
//! string so one bad file cannot sink an indexing pass. Work runs on the
//! blocking pool; paginated documents additionally run under a wall-clock
//! deadline whose expiry abandons the worker.

use anyhow::{anyhow, Result};
use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

/// Character budget per document.
const MAX_CONTENT_CHARS: usize = 500_000;
/// Plain-text files above this byte count are skipped outright
/// (roughly two bytes per character of budget).
const MAX_TEXT_FILE_BYTES: u64 = (MAX_CONTENT_CHARS as u64) * 2;
/// Page cap for paginated documents; huge e-books stop here.
const PDF_MAX_PAGES: usize = 50;
/// Deadline for paginated-document extraction.
const PDF_TIMEOUT: Duration = Duration::from_secs(30);
/// Decompressed ceiling for a single ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Fallbacks tried in order when detection does not produce a clean decode.
const LEGACY_ENCODINGS: &[&Encoding] = &[
    encoding_rs::UTF_8,
    encoding_rs::WINDOWS_1254,
    encoding_rs::WINDOWS_1252,
];

/// Extract searchable text from `path`. Total: always returns a string,
/// possibly empty. PDF extraction is supervised by a 30 s deadline; on
/// expiry the blocking worker is abandoned and the result is empty.
pub async fn extract(path: &Path) -> String {
    let owned = path.to_path_buf();
    let worker = tokio::task::spawn_blocking(move || extract_sync(&owned));
    if has_extension(path, "pdf") {
        match tokio::time::timeout(PDF_TIMEOUT, worker).await {
            Ok(Ok(text)) => text,
            Ok(Err(err)) => {
                tracing::warn!(path = %path.display(), %err, "extraction worker failed");
                String::new()
            }
            Err(_) => {
                tracing::warn!(path = %path.display(), "pdf extraction timed out");
                String::new()
            }
        }
    } else {
        worker.await.unwrap_or_default()
    }
}

/// Synchronous extraction core. Dispatches on extension; any error becomes
/// empty content.
pub fn extract_sync(path: &Path) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    let result = match ext.as_str() {
        "pdf" => extract_pdf(path),
        "docx" => extract_docx(path),
        _ => extract_text_file(path),
    };
    match result {
        Ok(text) => text,
        Err(err) => {
            tracing::debug!(path = %path.display(), %err, "extraction failed");
            String::new()
        }
    }
}

fn has_extension(path: &Path, wanted: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(wanted))
        .unwrap_or(false)
}

// ============ Plain text ============

fn extract_text_file(path: &Path) -> Result<String> {
    let size = std::fs::metadata(path)?.len();
    if size > MAX_TEXT_FILE_BYTES {
        return Ok(String::new());
    }
    let raw = std::fs::read(path)?;
    Ok(decode_text(&raw))
}

/// Decode arbitrary bytes to text. BOM wins; otherwise the detector's guess
/// is accepted only when it decodes cleanly, then the legacy fallbacks, and
/// finally a lossy UTF-8 decode that substitutes undecodable bytes.
pub(crate) fn decode_text(raw: &[u8]) -> String {
    if let Some((encoding, _)) = Encoding::for_bom(raw) {
        let (text, _, _) = encoding.decode(raw);
        return text.into_owned();
    }

    let mut detector = EncodingDetector::new();
    detector.feed(raw, true);
    let guessed = detector.guess(None, true);
    if let Some(text) = decode_strict(guessed, raw) {
        return text;
    }

    for encoding in LEGACY_ENCODINGS {
        if let Some(text) = decode_strict(encoding, raw) {
            return text;
        }
    }

    let (text, _, _) = encoding_rs::UTF_8.decode(raw);
    text.into_owned()
}

fn decode_strict(encoding: &'static Encoding, raw: &[u8]) -> Option<String> {
    let (text, had_errors) = encoding.decode_without_bom_handling(raw);
    if had_errors {
        None
    } else {
        Some(text.into_owned())
    }
}

// ============ Paginated documents ============

fn extract_pdf(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    let pages = pdf_extract::extract_text_from_mem_by_pages(&bytes)
        .map_err(|e| anyhow!("pdf parse: {e}"))?;
    let mut out = String::new();
    for page in pages.iter().take(PDF_MAX_PAGES) {
        let trimmed = page.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(trimmed);
        if out.chars().count() > MAX_CONTENT_CHARS {
            break;
        }
    }
    Ok(truncate_chars(&out, MAX_CONTENT_CHARS))
}

// ============ Word-processor documents ============

fn extract_docx(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes.as_slice()))
        .map_err(|e| anyhow!("docx archive: {e}"))?;
    let entry = archive
        .by_name("word/document.xml")
        .map_err(|e| anyhow!("docx body: {e}"))?;
    let mut xml = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut xml)
        .map_err(|e| anyhow!("docx body: {e}"))?;
    if xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(anyhow!("word/document.xml exceeds size limit"));
    }
    walk_document_runs(&xml)
}

/// Collect `w:t` text runs. Paragraph ends become newlines and table-cell
/// ends become spaces, so body and table text both survive concatenation.
fn walk_document_runs(xml: &[u8]) -> Result<String> {
    use quick_xml::events::Event;

    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut in_text_run = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text_run = true;
                }
            }
            Ok(Event::Text(te)) if in_text_run => {
                out.push_str(te.unescape().unwrap_or_default().as_ref());
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text_run = false,
                b"p" => {
                    if !out.is_empty() && !out.ends_with('\n') {
                        out.push('\n');
                    }
                }
                b"tc" => {
                    if !out.is_empty() && !out.ends_with(['\n', ' ']) {
                        out.push(' ');
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(anyhow!("docx xml: {e}")),
            _ => {}
        }
        buf.clear();
        // Bytes bound memory; the exact char cap is applied below.
        if out.len() > MAX_CONTENT_CHARS * 2 {
            break;
        }
    }
    Ok(truncate_chars(out.trim_end(), MAX_CONTENT_CHARS))
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    /// Minimal docx (ZIP) whose word/document.xml holds the given runs.
    fn minimal_docx(body_xml: &str) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
            zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
                .unwrap();
            let xml = format!(
                "<?xml version=\"1.0\"?><w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body>{}</w:body></w:document>",
                body_xml
            );
            zip.write_all(xml.as_bytes()).unwrap();
            zip.finish().unwrap();
        }
        buf
    }

    #[test]
    fn plain_utf8_round_trips() {
        let tmp = TempDir::new().unwrap();
        let path = write_file(&tmp, "a.txt", "hello world".as_bytes());
        assert_eq!(extract_sync(&path), "hello world");
    }

    #[test]
    fn bom_is_stripped() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("data".as_bytes());
        assert_eq!(decode_text(&bytes), "data");
    }

    #[test]
    fn legacy_single_byte_text_decodes() {
        // "çok iş" in windows-1254: e7 6f 6b 20 69 fe -> never panics,
        // always yields some non-empty decoding.
        let bytes = [0xE7, 0x6F, 0x6B, 0x20, 0x69, 0xFE];
        let text = decode_text(&bytes);
        assert!(!text.is_empty());
    }

    #[test]
    fn undecodable_bytes_never_panic() {
        let bytes: Vec<u8> = (0u8..=255).collect();
        let _ = decode_text(&bytes);
    }

    #[test]
    fn oversized_text_file_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let big = vec![b'x'; (MAX_TEXT_FILE_BYTES + 1) as usize];
        let path = write_file(&tmp, "big.log", &big);
        assert_eq!(extract_sync(&path), "");
    }

    #[test]
    fn missing_file_yields_empty() {
        assert_eq!(extract_sync(Path::new("/no/such/file.txt")), "");
    }

    #[test]
    fn corrupt_pdf_yields_empty() {
        let tmp = TempDir::new().unwrap();
        let path = write_file(&tmp, "broken.pdf", b"not a pdf at all");
        assert_eq!(extract_sync(&path), "");
    }

    #[test]
    fn corrupt_docx_yields_empty() {
        let tmp = TempDir::new().unwrap();
        let path = write_file(&tmp, "broken.docx", b"not a zip");
        assert_eq!(extract_sync(&path), "");
    }

    #[test]
    fn docx_paragraphs_and_table_cells_are_extracted() {
        let body = "<w:p><w:r><w:t>first paragraph</w:t></w:r></w:p>\
                    <w:tbl><w:tr><w:tc><w:p><w:r><w:t>cell one</w:t></w:r></w:p></w:tc>\
                    <w:tc><w:p><w:r><w:t>cell two</w:t></w:r></w:p></w:tc></w:tr></w:tbl>";
        let tmp = TempDir::new().unwrap();
        let path = write_file(&tmp, "doc.docx", &minimal_docx(body));
        let text = extract_sync(&path);
        assert!(text.contains("first paragraph"));
        assert!(text.contains("cell one"));
        assert!(text.contains("cell two"));
    }

    #[tokio::test]
    async fn async_extract_matches_sync() {
        let tmp = TempDir::new().unwrap();
        let path = write_file(&tmp, "note.md", b"# heading\nbody");
        assert_eq!(extract(&path).await, extract_sync(&path));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let text = "aé漢x";
        assert_eq!(truncate_chars(text, 3), "aé漢");
        assert_eq!(truncate_chars(text, 10), text);
    }
}
