// ============================================================================
// News headlines for the ticker card
// ============================================================================

use chrono::{DateTime, Utc};

/// One headline. Table-sourced items carry a pre-rendered age instead of a
/// timestamp.
#[derive(Debug, Clone)]
pub struct NewsItem {
    pub title: String,
    pub publisher: Option<String>,
    pub link: Option<String>,
    pub published: Option<DateTime<Utc>>,
    pub age_text: Option<String>,
}

impl NewsItem {
    pub fn from_fallback(title: &str, publisher: &str, age: &str) -> Self {
        Self {
            title: title.to_string(),
            publisher: Some(publisher.to_string()),
            link: None,
            published: None,
            age_text: Some(age.to_string()),
        }
    }

    pub fn publisher_text(&self) -> &str {
        self.publisher.as_deref().filter(|p| !p.is_empty()).unwrap_or("-")
    }

    /// How long ago the piece was published, relative to `now`.
    pub fn published_text(&self, now: DateTime<Utc>) -> String {
        if let Some(age) = &self.age_text {
            return age.clone();
        }
        match self.published {
            Some(ts) => relative_age(ts, now),
            None => "-".to_string(),
        }
    }
}

fn relative_age(published: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - published).num_seconds();
    if secs < 60 {
        "just now".to_string()
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else if secs < 86_400 {
        format!("{}h ago", secs / 3600)
    } else {
        format!("{}d ago", secs / 86_400)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_relative_age_buckets() {
        let now = Utc::now();
        assert_eq!(relative_age(now - Duration::seconds(30), now), "just now");
        assert_eq!(relative_age(now - Duration::minutes(5), now), "5m ago");
        assert_eq!(relative_age(now - Duration::hours(4), now), "4h ago");
        assert_eq!(relative_age(now - Duration::days(3), now), "3d ago");
    }

    #[test]
    fn test_fallback_item_keeps_its_age_text() {
        let item = NewsItem::from_fallback("Some headline", "WSJ", "4h ago");
        assert_eq!(item.published_text(Utc::now()), "4h ago");
        assert_eq!(item.publisher_text(), "WSJ");
    }

    #[test]
    fn test_missing_fields_render_dash() {
        let item = NewsItem {
            title: "Headline".into(),
            publisher: None,
            link: None,
            published: None,
            age_text: None,
        };
        assert_eq!(item.publisher_text(), "-");
        assert_eq!(item.published_text(Utc::now()), "-");
    }
}
