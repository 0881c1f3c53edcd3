use super::*;
use std::io::Write;
use tempfile::TempDir;

fn write_doc(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).expect("should create test document");
    file.write_all(content.as_bytes())
        .expect("should write test document");
    path
}

#[test]
fn single_page_text_document() {
    let dir = TempDir::new().expect("should create temp dir");
    let path = write_doc(&dir, "biology_cells.txt", "Cells contain mitochondria.");

    let pages = load_pages(&DocumentSource::new(path)).expect("should load pages");

    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].number, 1);
    assert_eq!(pages[0].subject, "biology");
    assert_eq!(pages[0].source, "biology_cells.txt");
    assert_eq!(pages[0].text, "Cells contain mitochondria.");
}

#[test]
fn form_feed_splits_pages() {
    let dir = TempDir::new().expect("should create temp dir");
    let path = write_doc(
        &dir,
        "physics_waves.txt",
        "Page one about waves.\u{c}Page two about optics.",
    );

    let pages = load_pages(&DocumentSource::new(path)).expect("should load pages");

    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].number, 1);
    assert_eq!(pages[1].number, 2);
    assert!(pages[1].text.contains("optics"));
}

#[test]
fn empty_pages_are_skipped_but_numbering_is_kept() {
    let dir = TempDir::new().expect("should create temp dir");
    let path = write_doc(&dir, "physics_mechanics.txt", "First page.\u{c}  \u{c}Third page.");

    let pages = load_pages(&DocumentSource::new(path)).expect("should load pages");

    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].number, 1);
    assert_eq!(pages[1].number, 3);
}

#[test]
fn markdown_is_rendered_to_plain_text() {
    let dir = TempDir::new().expect("should create temp dir");
    let path = write_doc(
        &dir,
        "mathematics_algebra.md",
        "# Quadratic Equations\n\nA *quadratic equation* has degree `two`.\n",
    );

    let pages = load_pages(&DocumentSource::new(path)).expect("should load pages");

    assert_eq!(pages.len(), 1);
    assert!(pages[0].text.contains("Quadratic Equations"));
    assert!(pages[0].text.contains("quadratic equation"));
    assert!(!pages[0].text.contains('#'));
    assert!(!pages[0].text.contains('*'));
    assert!(!pages[0].text.contains('`'));
}

#[test]
fn subject_is_stamped_on_every_page() {
    let dir = TempDir::new().expect("should create temp dir");
    let path = write_doc(&dir, "chemistry_atoms.txt", "One.\u{c}Two.\u{c}Three.");

    let pages = load_pages(&DocumentSource::new(path)).expect("should load pages");

    assert!(pages.iter().all(|p| p.subject == "chemistry"));
}

#[test]
fn explicit_subject_overrides_filename() {
    let dir = TempDir::new().expect("should create temp dir");
    let path = write_doc(&dir, "notes_for_class.txt", "Some content.");

    let pages = load_pages(&DocumentSource::with_subject(path, "History"))
        .expect("explicit subject should load");

    assert_eq!(pages[0].subject, "history");
}

#[test]
fn missing_file_aborts_load() {
    let result = load_pages(&DocumentSource::new("does/not/exist/mathematics_x.txt"));
    assert!(matches!(result, Err(crate::CurriculumError::Config(_))));
}

#[test]
fn unsupported_extension_is_rejected() {
    let dir = TempDir::new().expect("should create temp dir");
    let path = write_doc(&dir, "mathematics_algebra.pdf", "binary-ish");

    let result = load_pages(&DocumentSource::new(path));
    assert!(matches!(result, Err(crate::CurriculumError::Config(_))));
}

#[test]
fn blank_document_is_rejected() {
    let dir = TempDir::new().expect("should create temp dir");
    let path = write_doc(&dir, "english_grammar.txt", "   \n  ");

    let result = load_pages(&DocumentSource::new(path));
    assert!(matches!(result, Err(crate::CurriculumError::Config(_))));
}
