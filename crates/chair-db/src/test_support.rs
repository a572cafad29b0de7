//! Shared test utilities for chair-db unit tests.

pub(crate) mod helpers {
    use chair_core::entities::{Chapter, ChapterKey};

    use crate::service::ChairService;

    /// Create an in-memory `ChairService` with migrations applied.
    pub async fn test_service() -> ChairService {
        ChairService::new_local(":memory:").await.unwrap()
    }

    /// Insert a chapter and return it.
    pub async fn test_chapter(svc: &ChairService) -> Chapter {
        let key = ChapterKey {
            school: "State University".into(),
            organization: "Alpha Beta".into(),
            chapter_code: "AB-12".into(),
        };
        crate::repos::chapter::find_or_insert(svc.db().conn(), &key)
            .await
            .unwrap()
            .0
    }
}
