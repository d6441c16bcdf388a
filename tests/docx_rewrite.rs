use std::io::{Cursor, Read, Write};
use std::sync::atomic::{AtomicUsize, Ordering};

use pdf_translator::docx::translate_docx;
use pdf_translator::{ApiError, Translate, TranslateError, TranslationFuture};
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const DOCUMENT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:rPr><w:b/></w:rPr><w:t>Hello world.</w:t></w:r><w:r><w:t xml:space="preserve">  padded run  </w:t></w:r><w:r><w:t>42</w:t></w:r><w:r><w:t>Hello world.</w:t></w:r></w:p></w:body></w:document>"#;

const HEADER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:hdr xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:p><w:r><w:t>Running title</w:t></w:r></w:p></w:hdr>"#;

const FAKE_PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 1, 2, 3];

struct UppercaseTranslator {
    calls: AtomicUsize,
}

impl UppercaseTranslator {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

impl Translate for UppercaseTranslator {
    fn translate<'a>(&'a self, text: &'a str) -> TranslationFuture<'a> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move { Ok(text.to_uppercase()) })
    }
}

struct FailingTranslator;

impl Translate for FailingTranslator {
    fn translate<'a>(&'a self, _text: &'a str) -> TranslationFuture<'a> {
        Box::pin(async {
            Err(ApiError::Auth {
                status: 403,
                message: "bad key".to_string(),
            })
        })
    }
}

fn build_docx() -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default();
    writer.start_file("[Content_Types].xml", options).unwrap();
    writer.write_all(CONTENT_TYPES.as_bytes()).unwrap();
    writer.start_file("word/document.xml", options).unwrap();
    writer.write_all(DOCUMENT_XML.as_bytes()).unwrap();
    writer.start_file("word/header1.xml", options).unwrap();
    writer.write_all(HEADER_XML.as_bytes()).unwrap();
    writer.start_file("word/media/image1.png", options).unwrap();
    writer.write_all(FAKE_PNG).unwrap();
    writer.finish().unwrap().into_inner()
}

fn read_entry(bytes: &[u8], name: &str) -> Vec<u8> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = archive.by_name(name).unwrap();
    let mut data = Vec::new();
    file.read_to_end(&mut data).unwrap();
    data
}

#[tokio::test]
async fn rewrites_runs_and_preserves_everything_else() {
    let input = build_docx();
    let translator = UppercaseTranslator::new();
    let (output, stats) = translate_docx(&input, &translator).await.unwrap();

    let document = String::from_utf8(read_entry(&output, "word/document.xml")).unwrap();
    assert!(document.contains("<w:t>HELLO WORLD.</w:t>"));
    assert!(document.contains(r#"<w:t xml:space="preserve">  PADDED RUN  </w:t>"#));
    assert!(document.contains("<w:t>42</w:t>"));
    assert!(document.contains("<w:rPr><w:b/></w:rPr>"));

    let header = String::from_utf8(read_entry(&output, "word/header1.xml")).unwrap();
    assert!(header.contains("<w:t>RUNNING TITLE</w:t>"));

    // non-content entries come through byte-identical
    assert_eq!(
        read_entry(&output, "[Content_Types].xml"),
        CONTENT_TYPES.as_bytes()
    );
    assert_eq!(read_entry(&output, "word/media/image1.png"), FAKE_PNG);

    assert_eq!(stats.entries_rewritten, 2);
    assert_eq!(stats.runs_translated, 3);
    assert_eq!(stats.runs_reused, 1);
    assert_eq!(stats.runs_skipped, 1);
    assert_eq!(translator.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn rewritten_archive_still_sniffs_as_docx() {
    let input = build_docx();
    let translator = UppercaseTranslator::new();
    let (output, _) = translate_docx(&input, &translator).await.unwrap();
    assert_eq!(
        pdf_translator::document::sniff_format(&output),
        Some(pdf_translator::document::DocumentFormat::Docx)
    );
}

#[tokio::test]
async fn api_failure_aborts_the_whole_rewrite() {
    let input = build_docx();
    let err = translate_docx(&input, &FailingTranslator).await.unwrap_err();
    assert!(matches!(
        err,
        TranslateError::Api(ApiError::Auth { status: 403, .. })
    ));
}
