use std::collections::BTreeSet;

/// Trims each tag, drops empties and keeps the first occurrence of each text.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = BTreeSet::new();
    let mut normalized = Vec::new();
    for tag in tags {
        let text = tag.as_ref().trim();
        if text.is_empty() {
            continue;
        }
        if seen.insert(text.to_string()) {
            normalized.push(text.to_string());
        }
    }
    normalized
}

/// Shared tag vocabulary. Tags are matched by exact text, so a tag that is
/// registered twice is still one record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagRegistry {
    tags: BTreeSet<String>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when the tag was not known yet.
    pub fn register(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        self.tags.insert(text.to_string())
    }

    pub fn register_all<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for tag in tags {
            self.register(tag.as_ref());
        }
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_dedups_and_trims() {
        let tags = normalize_tags(["design", " design", "", "backend ", "Design"]);
        assert_eq!(tags, vec!["design", "backend", "Design"]);
    }

    #[test]
    fn test_registry_reuses_existing_text() {
        let mut registry = TagRegistry::new();
        assert!(registry.register("urgent"));
        assert!(!registry.register(" urgent "));
        registry.register_all(["qa", "urgent"]);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.iter().collect::<Vec<_>>(), vec!["qa", "urgent"]);
    }
}
