use std::fs;
use tempfile::TempDir;

use lorekeep_core::corpus::{normalize_separators, CorpusLoader};
use lorekeep_core::error::Error;
use lorekeep_core::settings::CorpusSettings;

fn loader_with_titles(pairs: &[(&str, &str)]) -> CorpusLoader {
    let mut settings = CorpusSettings::default();
    for (file, title) in pairs {
        settings.book_titles.insert(file.to_string(), title.to_string());
    }
    CorpusLoader::new(&settings).expect("loader")
}

#[test]
fn splits_chapters_and_labels_them() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("book_one.txt"),
        "Preface that is dropped.\nГлава 1\nFirst chapter text.\nГлава 2\n\nГлава 3\nThird\u{2028}chapter\u{00A0}here.",
    )
    .unwrap();

    let docs = loader_with_titles(&[("book_one.txt", "Book One")]).load(tmp.path()).unwrap();

    assert_eq!(docs.len(), 2, "empty chapter 2 is skipped");
    assert_eq!(docs[0].text, "First chapter text.");
    assert_eq!(docs[0].book(), Some("Book One"));
    assert_eq!(docs[0].chapter(), Some("1"));
    assert_eq!(docs[1].text, "Third chapter here.");
    assert_eq!(docs[1].chapter(), Some("3"));
}

#[test]
fn files_load_in_sorted_order_with_stem_titles() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("b_second.txt"), "Chapter 1\nSecond book.").unwrap();
    fs::write(tmp.path().join("a_first.txt"), "Chapter 7\nFirst book.").unwrap();
    fs::write(tmp.path().join("notes.md"), "Chapter 1\nIgnored.").unwrap();

    let docs = loader_with_titles(&[]).load(tmp.path()).unwrap();

    let books: Vec<_> = docs.iter().map(|d| d.book().unwrap().to_string()).collect();
    assert_eq!(books, vec!["a_first", "b_second"]);
    assert_eq!(docs[0].chapter(), Some("7"));
}

#[test]
fn file_without_headings_yields_nothing() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("plain.txt"), "Just prose, no chapters at all.").unwrap();
    assert!(loader_with_titles(&[]).load(tmp.path()).unwrap().is_empty());
}

#[test]
fn empty_directory_yields_nothing() {
    let tmp = TempDir::new().unwrap();
    assert!(loader_with_titles(&[]).load(tmp.path()).unwrap().is_empty());
}

#[test]
fn invalid_utf8_is_read_lossily() {
    let tmp = TempDir::new().unwrap();
    let mut bytes = b"Chapter 1\nBroken ".to_vec();
    bytes.push(0xFF);
    bytes.extend_from_slice(b" byte.");
    fs::write(tmp.path().join("broken.txt"), bytes).unwrap();

    let docs = loader_with_titles(&[]).load(tmp.path()).unwrap();
    assert_eq!(docs.len(), 1);
    assert!(docs[0].text.starts_with("Broken"));
}

#[test]
fn pattern_without_capture_group_is_rejected() {
    let settings = CorpusSettings { chapter_pattern: r"(?m)^Chapter".into(), ..CorpusSettings::default() };
    assert!(matches!(CorpusLoader::new(&settings), Err(Error::InvalidConfig(_))));
}

#[test]
fn separators_become_spaces() {
    assert_eq!(normalize_separators("a\u{2028}b\u{2029}c\u{00A0}d"), "a b c d");
}
