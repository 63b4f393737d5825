//! Pending note content carried between an image upload and the final
//! submit.
//!
//! Drafts live server-side, keyed by an opaque token stored in the
//! `knote_draft` cookie. Image links accumulate in upload order; the typed
//! text is whatever the form posted last.

use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::{sync::Mutex, time::Instant};
use uuid::Uuid;

pub const DRAFT_COOKIE: &str = "knote_draft";
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub text: String,
    pub image_links: Vec<String>,
}

impl Draft {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.image_links.is_empty()
    }

    /// Note content: the text, then each image reference in upload order,
    /// separated by single spaces. Text without images is kept verbatim.
    pub fn compose(&self) -> String {
        if self.image_links.is_empty() {
            return self.text.clone();
        }
        let text = self.text.trim_end();
        let mut parts: Vec<String> = Vec::with_capacity(self.image_links.len() + 1);
        if !text.is_empty() {
            parts.push(text.to_string());
        }
        parts.extend(self.image_links.iter().map(|link| image_reference(link)));
        parts.join(" ")
    }
}

pub fn image_reference(link: &str) -> String {
    format!("![]({link})")
}

pub fn new_draft_token() -> String {
    Uuid::new_v4().simple().to_string()
}

pub fn is_draft_token(s: &str) -> bool {
    s.len() == 32 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

struct Entry {
    draft: Draft,
    touched_at: Instant,
}

#[derive(Clone)]
pub struct DraftStore {
    inner: Arc<Mutex<HashMap<String, Entry>>>,
    idle_ttl: Duration,
}

impl Default for DraftStore {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_TTL)
    }
}

impl DraftStore {
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            idle_ttl,
        }
    }

    pub async fn get(&self, token: &str) -> Draft {
        let map = self.inner.lock().await;
        map.get(token)
            .filter(|entry| entry.touched_at.elapsed() <= self.idle_ttl)
            .map(|entry| entry.draft.clone())
            .unwrap_or_default()
    }

    /// Records an uploaded image. `text`, when posted, replaces the draft's
    /// typed text so nothing typed before the upload is lost.
    pub async fn attach_image(&self, token: &str, text: Option<String>, link: &str) -> Draft {
        let mut map = self.inner.lock().await;
        let now = Instant::now();
        prune(&mut map, now, self.idle_ttl);

        let entry = map.entry(token.to_string()).or_insert_with(|| Entry {
            draft: Draft::default(),
            touched_at: now,
        });
        if let Some(text) = text {
            entry.draft.text = text;
        }
        entry.draft.image_links.push(link.to_string());
        entry.touched_at = now;
        entry.draft.clone()
    }

    /// Drops the draft once its content has been saved.
    pub async fn clear(&self, token: &str) -> Option<Draft> {
        let mut map = self.inner.lock().await;
        prune(&mut map, Instant::now(), self.idle_ttl);
        map.remove(token).map(|entry| entry.draft)
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}

fn prune(map: &mut HashMap<String, Entry>, now: Instant, idle_ttl: Duration) {
    map.retain(|_, entry| now.duration_since(entry.touched_at) <= idle_ttl);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn compose_appends_links_after_text() {
        let draft = Draft {
            text: "hello".to_string(),
            image_links: vec!["/img/a".to_string(), "/img/b".to_string()],
        };
        assert_eq!(draft.compose(), "hello ![](/img/a) ![](/img/b)");
    }

    #[test]
    fn compose_skips_empty_text() {
        let draft = Draft {
            text: String::new(),
            image_links: vec!["/img/a".to_string()],
        };
        assert_eq!(draft.compose(), "![](/img/a)");
        assert_eq!(Draft::default().compose(), "");
    }

    #[test]
    fn compose_keeps_plain_text_verbatim() {
        let draft = Draft {
            text: "  spaced out  \n".to_string(),
            image_links: Vec::new(),
        };
        assert_eq!(draft.compose(), "  spaced out  \n");
    }

    #[test]
    fn tokens_are_recognised() {
        let token = new_draft_token();
        assert!(is_draft_token(&token));
        assert!(!is_draft_token("short"));
        assert!(!is_draft_token(&"z".repeat(32)));
    }

    #[tokio::test]
    async fn uploads_accumulate_until_cleared() {
        let drafts = DraftStore::default();
        drafts.attach_image("t", None, "/img/1").await;
        drafts
            .attach_image("t", Some("typed".to_string()), "/img/2")
            .await;

        let draft = drafts.get("t").await;
        assert_eq!(
            draft,
            Draft {
                text: "typed".to_string(),
                image_links: vec!["/img/1".to_string(), "/img/2".to_string()],
            }
        );
        assert_eq!(draft.compose(), "typed ![](/img/1) ![](/img/2)");

        assert_eq!(drafts.clear("t").await, Some(draft));
        assert!(drafts.get("t").await.is_empty());
        assert_eq!(drafts.len().await, 0);
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let drafts = DraftStore::default();
        drafts.attach_image("a", None, "/img/1").await;
        assert!(drafts.get("b").await.is_empty());
        assert_eq!(drafts.clear("b").await, None);
        assert_eq!(drafts.get("a").await.image_links.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_drafts_expire() {
        let drafts = DraftStore::new(Duration::from_secs(60));
        drafts.attach_image("old", None, "/img/1").await;

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(drafts.get("old").await.is_empty());

        drafts.attach_image("new", None, "/img/2").await;
        assert_eq!(drafts.len().await, 1);
    }
}
