//! Loads the book corpus: one [`Document`] per chapter of every `.txt` file.

use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::settings::CorpusSettings;
use crate::types::{Document, Meta, BOOK_KEY, CHAPTER_KEY};

pub struct CorpusLoader {
    chapter_pattern: Regex,
    book_titles: BTreeMap<String, String>,
}

impl CorpusLoader {
    pub fn new(settings: &CorpusSettings) -> Result<Self> {
        let chapter_pattern = Regex::new(&settings.chapter_pattern)
            .map_err(|e| Error::InvalidConfig(format!("corpus.chapter_pattern: {e}")))?;
        if chapter_pattern.captures_len() < 2 {
            return Err(Error::InvalidConfig("corpus.chapter_pattern needs a capture group for the chapter id".into()));
        }
        Ok(Self { chapter_pattern, book_titles: settings.book_titles.clone() })
    }

    /// Every chapter of every `.txt` file under `data_dir`, files in sorted path order.
    pub fn load(&self, data_dir: &Path) -> Result<Vec<Document>> {
        let files = list_txt_files(data_dir);
        if files.is_empty() {
            warn!("No .txt files found under {}", data_dir.display());
            return Ok(vec![]);
        }
        let mut documents = Vec::new();
        for file_path in &files {
            let chapters = self.load_file(file_path)?;
            info!(file = %file_path.display(), chapters = chapters.len(), "Loaded book");
            documents.extend(chapters);
        }
        info!("Loaded {} chapters from {} files", documents.len(), files.len());
        Ok(documents)
    }

    pub fn load_file(&self, file_path: &Path) -> Result<Vec<Document>> {
        let content = read_file_content(file_path)?;
        let file_name = file_path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        let title = self.book_titles.get(&file_name).cloned().unwrap_or_else(|| {
            file_path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_else(|| file_name.clone())
        });
        let chapters = self.split_chapters(&title, &content);
        if chapters.is_empty() {
            warn!(file = %file_path.display(), "No chapter headings found; file skipped");
        }
        Ok(chapters)
    }

    /// Split a book into chapters on the heading pattern. Text before the
    /// first heading and chapters with no body are dropped.
    pub fn split_chapters(&self, book_title: &str, content: &str) -> Vec<Document> {
        let content = normalize_separators(content);
        let headings: Vec<(usize, usize, String)> = self
            .chapter_pattern
            .captures_iter(&content)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let id = caps.get(1)?.as_str().trim().to_string();
                Some((whole.start(), whole.end(), id))
            })
            .collect();

        let mut chapters = Vec::new();
        for (i, (_, body_start, chapter)) in headings.iter().enumerate() {
            let body_end = headings.get(i + 1).map_or(content.len(), |next| next.0);
            let body = content[*body_start..body_end].trim();
            if body.is_empty() {
                continue;
            }
            let mut metadata = Meta::new();
            metadata.insert(BOOK_KEY.to_string(), book_title.to_string());
            metadata.insert(CHAPTER_KEY.to_string(), chapter.clone());
            chapters.push(Document::new(body, metadata));
        }
        chapters
    }
}

/// Line/paragraph separators and no-break spaces become plain spaces.
pub fn normalize_separators(text: &str) -> String {
    text.replace(['\u{2028}', '\u{2029}', '\u{00A0}'], " ")
}

fn read_file_content(file_path: &Path) -> Result<String> {
    match fs::read_to_string(file_path) {
        Ok(content) => Ok(content),
        Err(_) => Ok(String::from_utf8_lossy(&fs::read(file_path)?).to_string()),
    }
}

fn list_txt_files(root: &Path) -> Vec<PathBuf> {
    let mut txt_files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().to_path_buf())
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("txt"))
        .collect();
    txt_files.sort();
    txt_files
}
