//! Read-side expansion of raw attachment maps.

use attache_shared::config::AttachmentsAppend;

use super::error::AttachmentError;
use super::service::AttachmentManager;
use super::types::{PresentedAttachment, PresentedAttachments, RawAttachmentMap};
use crate::storage::StorageGateway;

impl<S: StorageGateway> AttachmentManager<S> {
    /// Expand a raw map into presented attachments.
    ///
    /// Fields are filled in this order: `url`, `exists`, then `path`. The path
    /// is always included when nothing else was, so a presented value is never
    /// empty. Each of `url` and `exists` costs one storage call per slot.
    pub async fn present(
        &self,
        raw: &RawAttachmentMap,
    ) -> Result<PresentedAttachments, AttachmentError> {
        let mut presented = PresentedAttachments::new();

        for (slot, path) in raw.iter() {
            presented.insert(slot.to_string(), self.present_one(path).await?);
        }

        Ok(presented)
    }

    async fn present_one(&self, path: &str) -> Result<PresentedAttachment, AttachmentError> {
        let config = self.config();
        let mut value = PresentedAttachment::default();

        if config.appends(AttachmentsAppend::Url) {
            value.url = Some(self.storage().url(path).await?);
        }

        if config.appends(AttachmentsAppend::Exists) {
            value.exists = Some(self.storage().exists(path).await?);
        }

        if config.appends(AttachmentsAppend::Path) || value.is_empty() {
            value.path = Some(path.to_string());
        }

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use attache_shared::config::AttachmentsConfig;
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::attachment::testing::MemoryStorage;

    fn manager(appends: Vec<AttachmentsAppend>) -> AttachmentManager<MemoryStorage> {
        AttachmentManager::new(
            Arc::new(MemoryStorage::with_files(["docs/cv.pdf"])),
            AttachmentsConfig::default().with_appends(appends),
        )
    }

    fn raw() -> RawAttachmentMap {
        [("resume", "docs/cv.pdf"), ("avatar", "gone.png")]
            .into_iter()
            .collect()
    }

    #[tokio::test]
    async fn test_present_all_appends() {
        let manager = manager(AttachmentsAppend::ALL.to_vec());
        let presented = manager.present(&raw()).await.expect("presented");

        assert_eq!(
            serde_json::to_value(&presented).expect("serializable"),
            json!({
                "avatar": {"path": "gone.png", "url": "https://files.test/gone.png", "exists": false},
                "resume": {"path": "docs/cv.pdf", "url": "https://files.test/docs/cv.pdf", "exists": true},
            })
        );
    }

    #[rstest]
    #[case(vec![AttachmentsAppend::Url], Some("https://files.test/docs/cv.pdf"), None, None)]
    #[case(vec![AttachmentsAppend::Exists], None, Some(true), None)]
    #[case(vec![AttachmentsAppend::Path], None, None, Some("docs/cv.pdf"))]
    #[case(vec![], None, None, Some("docs/cv.pdf"))]
    #[tokio::test]
    async fn test_present_respects_appends(
        #[case] appends: Vec<AttachmentsAppend>,
        #[case] url: Option<&str>,
        #[case] exists: Option<bool>,
        #[case] path: Option<&str>,
    ) {
        let manager = manager(appends);
        let presented = manager.present(&raw()).await.expect("presented");
        let resume = &presented["resume"];

        assert_eq!(resume.url.as_deref(), url);
        assert_eq!(resume.exists, exists);
        assert_eq!(resume.path.as_deref(), path);
        assert!(!resume.is_empty());
    }

    #[tokio::test]
    async fn test_present_empty_map() {
        let manager = manager(AttachmentsAppend::ALL.to_vec());
        let presented = manager
            .present(&RawAttachmentMap::new())
            .await
            .expect("presented");

        assert!(presented.is_empty());
        assert_eq!(manager.storage().calls().url, 0);
    }

    #[tokio::test]
    async fn test_present_makes_one_call_per_slot_and_append() {
        let manager = manager(vec![AttachmentsAppend::Url, AttachmentsAppend::Exists]);
        manager.present(&raw()).await.expect("presented");

        let calls = manager.storage().calls();
        assert_eq!(calls.url, 2);
        assert_eq!(calls.exists, 2);
    }
}
