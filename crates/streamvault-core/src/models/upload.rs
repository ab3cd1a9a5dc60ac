use serde::{Deserialize, Serialize};

/// Caller-declared metadata carried alongside an upload (whole-file or
/// chunked) until final commit. Tags are accepted comma-separated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoDeclaredMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub is_public: bool,
}

impl VideoDeclaredMetadata {
    /// Parse the raw multipart text fields into declared metadata.
    pub fn from_fields(
        title: Option<String>,
        description: Option<String>,
        tags: Option<String>,
        is_public: Option<String>,
    ) -> Self {
        VideoDeclaredMetadata {
            title,
            description,
            tags: parse_tags(tags.as_deref()),
            is_public: is_public.as_deref() == Some("true"),
        }
    }

    /// Merge newer values over existing ones; later chunks win for a chunked
    /// upload, but absent fields never erase previously seen ones.
    pub fn merge_from(&mut self, newer: VideoDeclaredMetadata) {
        if newer.title.is_some() {
            self.title = newer.title;
        }
        if newer.description.is_some() {
            self.description = newer.description;
        }
        if !newer.tags.is_empty() {
            self.tags = newer.tags;
        }
        self.is_public = newer.is_public;
    }

    pub fn title_or_untitled(&self) -> String {
        self.title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| "untitled".to_string())
    }
}

fn parse_tags(raw: Option<&str>) -> Vec<String> {
    raw.map(|value| {
        value
            .split(',')
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_tags() {
        let meta = VideoDeclaredMetadata::from_fields(
            Some("Demo".to_string()),
            None,
            Some("rust, backend , ,video".to_string()),
            Some("true".to_string()),
        );
        assert_eq!(meta.tags, vec!["rust", "backend", "video"]);
        assert!(meta.is_public);
    }

    #[test]
    fn is_public_defaults_to_false() {
        let meta = VideoDeclaredMetadata::from_fields(None, None, None, Some("yes".to_string()));
        assert!(!meta.is_public);
        let meta = VideoDeclaredMetadata::from_fields(None, None, None, None);
        assert!(!meta.is_public);
    }

    #[test]
    fn merge_keeps_existing_fields_when_absent() {
        let mut meta = VideoDeclaredMetadata::from_fields(
            Some("First".to_string()),
            Some("desc".to_string()),
            Some("a,b".to_string()),
            None,
        );
        meta.merge_from(VideoDeclaredMetadata::from_fields(
            None,
            None,
            None,
            Some("true".to_string()),
        ));
        assert_eq!(meta.title.as_deref(), Some("First"));
        assert_eq!(meta.tags, vec!["a", "b"]);
        assert!(meta.is_public);
    }

    #[test]
    fn title_or_untitled_falls_back() {
        let meta = VideoDeclaredMetadata::default();
        assert_eq!(meta.title_or_untitled(), "untitled");
    }
}
