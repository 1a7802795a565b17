//! DOCX text and embedded images via `unzip`.
//!
//! A .docx file is a zip archive. Body text lives in `word/document.xml`,
//! pictures under `word/media/`.

use std::ffi::OsStr;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

use regex::{Captures, Regex};

use aieval_core::error::ExtractError;
use aieval_core::traits::ImageBlob;

use crate::tool::run_tool;

const DOCUMENT_XML: &str = "word/document.xml";
const MEDIA_DIR: &str = "word/media/";

/// Elements whose text is not part of the visible body.
static HIDDEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<w:(?:tabs|instrText|delText)\b[^>]*>.*?</w:(?:tabs|instrText|delText)>")
        .expect("hidden element regex is valid")
});

static PARAGRAPH_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</w:p>|<w:p/>").expect("paragraph regex is valid"));

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<w:(?:br|cr)\b[^>]*/>").expect("break regex is valid"));

static TAB: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<w:tab\b[^>]*/>").expect("tab regex is valid"));

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag regex is valid"));

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(?:#x([0-9a-fA-F]+)|#([0-9]+)|(amp|lt|gt|quot|apos));")
        .expect("entity regex is valid")
});

/// Extract the body text, one line per paragraph.
pub async fn docx_text(path: &Path, timeout: Duration) -> Result<String, ExtractError> {
    let xml = read_entry(path, DOCUMENT_XML, timeout).await?;
    Ok(document_xml_to_text(&String::from_utf8_lossy(&xml)))
}

/// Extract every file under `word/media/`, in archive order.
///
/// Entries that cannot be read are logged and skipped.
pub async fn docx_images(path: &Path, timeout: Duration) -> Result<Vec<ImageBlob>, ExtractError> {
    let listing = run_tool("unzip", [OsStr::new("-Z1"), path.as_os_str()], timeout).await?;
    let entries = media_entries(&String::from_utf8_lossy(&listing));

    let mut images = Vec::with_capacity(entries.len());
    for name in entries {
        match read_entry(path, &name, timeout).await {
            Ok(data) if !data.is_empty() => images.push(ImageBlob { name, data }),
            Ok(_) => tracing::debug!("skipping empty media entry {name}"),
            Err(e) => tracing::warn!("could not read {name}: {e}"),
        }
    }
    Ok(images)
}

async fn read_entry(path: &Path, entry: &str, timeout: Duration) -> Result<Vec<u8>, ExtractError> {
    run_tool(
        "unzip",
        [OsStr::new("-p"), path.as_os_str(), OsStr::new(entry)],
        timeout,
    )
    .await
}

/// Media file names from an `unzip -Z1` listing.
pub fn media_entries(listing: &str) -> Vec<String> {
    listing
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with(MEDIA_DIR) && !line.ends_with('/'))
        .map(str::to_string)
        .collect()
}

/// Flatten WordprocessingML to plain text.
pub fn document_xml_to_text(xml: &str) -> String {
    let text = HIDDEN.replace_all(xml, "");
    let text = PARAGRAPH_END.replace_all(&text, "\n");
    let text = LINE_BREAK.replace_all(&text, "\n");
    let text = TAB.replace_all(&text, "\t");
    let text = TAG.replace_all(&text, "");
    decode_entities(&text)
}

fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures| {
            let code = match (caps.get(1), caps.get(2)) {
                (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
                (_, Some(dec)) => dec.as_str().parse().ok(),
                _ => None,
            };
            if let Some(code) = code {
                return char::from_u32(code).map(String::from).unwrap_or_default();
            }
            match &caps[3] {
                "amp" => "&",
                "lt" => "<",
                "gt" => ">",
                "quot" => "\"",
                _ => "'",
            }
            .to_string()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>
<w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr><w:r><w:t>Name: Asha Rao</w:t></w:r></w:p>
<w:p><w:r><w:t xml:space="preserve">Q1) Light </w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t>scatters</w:t></w:r></w:p>
<w:p/>
<w:p><w:r><w:t>2.</w:t><w:tab/><w:t>A &amp; B &lt;&gt; &#233;&#x2019;</w:t><w:br/><w:t>next line</w:t></w:r></w:p>
<w:p><w:del><w:r><w:delText>removed</w:delText></w:r></w:del><w:r><w:instrText> PAGE </w:instrText><w:t>kept</w:t></w:r></w:p>
</w:body></w:document>"#;

    #[test]
    fn paragraphs_become_lines() {
        let text = document_xml_to_text(BODY);
        let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        assert_eq!(
            lines,
            vec![
                "Name: Asha Rao",
                "Q1) Light scatters",
                "2.\tA & B <> é\u{2019}",
                "next line",
                "kept"
            ]
        );
    }

    #[test]
    fn tab_stop_definitions_are_not_tabs() {
        let text = document_xml_to_text(BODY);
        assert!(!text.contains("\tName"));
    }

    #[test]
    fn entities() {
        assert_eq!(decode_entities("&quot;hi&quot; &apos;x&apos;"), "\"hi\" 'x'");
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
        assert_eq!(decode_entities("&unknown;"), "&unknown;");
    }

    #[test]
    fn media_listing() {
        let listing = "[Content_Types].xml\n_rels/.rels\nword/document.xml\n\
                       word/media/\nword/media/image1.png\nword/media/image2.jpeg\n";
        assert_eq!(
            media_entries(listing),
            vec!["word/media/image1.png", "word/media/image2.jpeg"]
        );
        assert!(media_entries("").is_empty());
    }
}
