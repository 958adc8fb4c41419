//! Built-in text extractors, one per document format
//!
//! Every function here takes the raw bytes of a downloaded document and
//! returns its plain text. They report failures through `anyhow`; the
//! [`ExtractorRegistry`](super::ExtractorRegistry) turns any failure into
//! empty text.

use anyhow::{anyhow, Context};
use calamine::{open_workbook_auto_from_rs, Reader};
use quick_xml::events::Event;
use std::io::{Cursor, Read, Seek};
use zip::ZipArchive;

/// Plain text, decoded as UTF-8 with invalid sequences replaced
pub fn extract_txt(bytes: &[u8]) -> anyhow::Result<String> {
    Ok(String::from_utf8_lossy(bytes).into_owned())
}

/// CSV records, one per line with tab-separated fields
pub fn extract_csv(bytes: &[u8]) -> anyhow::Result<String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut lines = Vec::new();
    for record in reader.byte_records() {
        let record = record.context("malformed CSV record")?;
        let fields: Vec<_> = record
            .iter()
            .map(|field| String::from_utf8_lossy(field).into_owned())
            .collect();
        lines.push(fields.join("\t"));
    }

    Ok(lines.join("\n"))
}

/// Every worksheet of an `.xlsx` / `.xls` workbook, as tab-separated rows
/// under a `# <sheet name>` heading
pub fn extract_spreadsheet(bytes: &[u8]) -> anyhow::Result<String> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .context("unreadable workbook")?;

    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .with_context(|| format!("unreadable worksheet '{}'", name))?;

        let rows: Vec<String> = range
            .rows()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.to_string())
                    .collect::<Vec<_>>()
                    .join("\t")
            })
            .filter(|line| !line.trim().is_empty())
            .collect();

        if !rows.is_empty() {
            sheets.push(format!("# {}\n{}", name, rows.join("\n")));
        }
    }

    Ok(sheets.join("\n\n"))
}

/// Paragraph text of a Word document
pub fn extract_docx(bytes: &[u8]) -> anyhow::Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).context("not a zip container")?;
    let xml = read_entry(&mut archive, "word/document.xml")?;
    collect_text_runs(&xml)
}

/// Text of every slide of a PowerPoint deck, in slide order
pub fn extract_pptx(bytes: &[u8]) -> anyhow::Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).context("not a zip container")?;

    let mut slides: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| slide_number(name).map(|number| (number, name.to_string())))
        .collect();
    slides.sort();

    if slides.is_empty() {
        return Err(anyhow!("presentation has no slides"));
    }

    let mut texts = Vec::new();
    for (_, name) in slides {
        let xml = read_entry(&mut archive, &name)?;
        let text = collect_text_runs(&xml)?;
        if !text.is_empty() {
            texts.push(text);
        }
    }

    Ok(texts.join("\n\n"))
}

/// Text layer of a PDF
pub fn extract_pdf(bytes: &[u8]) -> anyhow::Result<String> {
    pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| anyhow!("failed to extract PDF text: {:?}", e))
}

/// `ppt/slides/slide12.xml` → 12
fn slide_number(name: &str) -> Option<u32> {
    name.strip_prefix("ppt/slides/slide")?
        .strip_suffix(".xml")?
        .parse()
        .ok()
}

fn read_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> anyhow::Result<Vec<u8>> {
    let mut entry = archive
        .by_name(name)
        .with_context(|| format!("missing entry {}", name))?;
    let mut xml = Vec::new();
    entry.read_to_end(&mut xml)?;
    Ok(xml)
}

/// Collects the `<*:t>` text runs of an Office Open XML part
///
/// Paragraph ends (`</*:p>`) and breaks become newlines, `<*:tab/>` becomes a
/// tab. Works for both WordprocessingML (`w:`) and DrawingML (`a:`) parts.
fn collect_text_runs(xml: &[u8]) -> anyhow::Result<String> {
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut text = String::new();
    let mut in_run = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"t" => in_run = true,
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_run = false,
                b"p" => text.push('\n'),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"tab" => text.push('\t'),
                b"br" | b"cr" => text.push('\n'),
                _ => {}
            },
            Event::Text(e) if in_run => text.push_str(&e.unescape()?),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(text.trim_end().to_string())
}
