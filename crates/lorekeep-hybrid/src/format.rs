use lorekeep_core::settings::FormatSettings;
use lorekeep_core::types::{Chunk, Passage};

/// Renders retrieved chunks as provenance-annotated context for a prompt.
#[derive(Debug, Clone, Default)]
pub struct ContextFormatter {
    settings: FormatSettings,
}

impl ContextFormatter {
    pub fn new(settings: FormatSettings) -> Self {
        Self { settings }
    }

    /// Missing `book`/`chapter` metadata falls back to the configured placeholders.
    pub fn passage(&self, chunk: &Chunk) -> Passage {
        Passage {
            text: chunk.text.clone(),
            book: chunk.book().unwrap_or(self.settings.unknown_book.as_str()).to_string(),
            chapter: chunk.chapter().unwrap_or(self.settings.unknown_chapter.as_str()).to_string(),
        }
    }

    /// `[SOURCE: {book}, chapter {chapter}]\n{text}` blocks joined by the separator.
    pub fn render(&self, passages: &[Passage]) -> String {
        let s = &self.settings;
        passages
            .iter()
            .map(|p| format!("[{}: {}, {} {}]\n{}", s.source_label, p.book, s.chapter_label, p.chapter, p.text))
            .collect::<Vec<_>>()
            .join(&s.separator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lorekeep_core::types::Meta;

    fn chunk(text: &str, book: Option<&str>, chapter: Option<&str>) -> Chunk {
        let mut metadata = Meta::new();
        if let Some(b) = book { metadata.insert("book".into(), b.into()); }
        if let Some(c) = chapter { metadata.insert("chapter".into(), c.into()); }
        Chunk { id: "0:0".into(), text: text.into(), metadata }
    }

    #[test]
    fn renders_sources_and_separator() {
        let f = ContextFormatter::default();
        let passages = vec![
            f.passage(&chunk("Alpha.", Some("Book One"), Some("1"))),
            f.passage(&chunk("Beta.", None, None)),
        ];
        assert_eq!(
            f.render(&passages),
            "[SOURCE: Book One, chapter 1]\nAlpha.\n\n---\n\n[SOURCE: Unknown book, chapter ?]\nBeta."
        );
    }

    #[test]
    fn labels_are_configurable() {
        let f = ContextFormatter::new(FormatSettings {
            source_label: "ИСТОЧНИК".into(),
            chapter_label: "глава".into(),
            ..FormatSettings::default()
        });
        let p = f.passage(&chunk("Текст.", Some("Книга"), Some("3")));
        assert_eq!(f.render(&[p]), "[ИСТОЧНИК: Книга, глава 3]\nТекст.");
    }

    #[test]
    fn nothing_renders_empty() {
        assert_eq!(ContextFormatter::default().render(&[]), "");
    }
}
