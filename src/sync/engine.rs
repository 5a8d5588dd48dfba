use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use crate::app::{Result, SyncError};
use crate::client::{PostStatus, WikiClient};
use crate::domain::page::display_name;
use crate::domain::{FeedItem, PageKey, PostMeta, RevisionRecord, WikiConfig, NEW_REVISION};
use crate::feed::FeedParser;
use crate::store::{PageIndexCache, RevisionStore};
use crate::sync::session::{EditSession, SessionState};
use crate::transport::PostForm;

#[derive(Debug, Clone)]
pub struct LoadedPage {
    pub session: EditSession,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostReceipt {
    pub status: PostStatus,
    /// Baseline the post was sent with
    pub previous_revision: String,
    pub revision: String,
    /// Whether the page was new to the cached page index
    pub newly_indexed: bool,
}

/// Load, post and preview pages while keeping the revision bookkeeping.
///
/// Conflict detection is left to the server. The engine only guarantees that
/// every write carries the most recently observed revision of the page and
/// that a transition either completes with all its state updates or changes
/// nothing.
pub struct SyncEngine {
    client: WikiClient,
    revisions: Arc<RevisionStore>,
    index: Arc<PageIndexCache>,
    parser: FeedParser,
}

impl SyncEngine {
    pub fn new(
        client: WikiClient,
        revisions: Arc<RevisionStore>,
        index: Arc<PageIndexCache>,
    ) -> Self {
        Self {
            client,
            revisions,
            index,
            parser: FeedParser::new(),
        }
    }

    pub fn revisions(&self) -> &Arc<RevisionStore> {
        &self.revisions
    }

    pub fn index(&self) -> &Arc<PageIndexCache> {
        &self.index
    }

    /// Fetch a page and resolve its baseline revision.
    pub async fn load(&self, wiki: &WikiConfig, page: &str) -> Result<LoadedPage> {
        let key = PageKey::new(wiki.name.clone(), page);
        let content = self.client.fetch_page(wiki, page).await?;
        let record = self.latest_revision(wiki, &key).await?;

        tracing::info!("Loaded {} at revision {}", key, record.revision);
        let session = EditSession::loaded(key, record.revision.clone());
        self.revisions.put_record(record);

        Ok(LoadedPage { session, content })
    }

    /// Load again, discarding the session's local state.
    pub async fn reload(&self, wiki: &WikiConfig, session: &mut EditSession) -> Result<String> {
        check_wiki(wiki, session)?;
        let loaded = self.load(wiki, &session.key.page).await?;
        *session = loaded.session;
        Ok(loaded.content)
    }

    /// Session for a page loaded earlier, e.g. by a previous process whose
    /// revisions were restored into the store.
    pub fn resume(&self, key: PageKey) -> EditSession {
        match self.revisions.get(&key) {
            Some(baseline) => EditSession {
                key,
                state: SessionState::Modified,
                baseline: Some(baseline),
            },
            None => EditSession::new(key),
        }
    }

    /// Send the text in `source` to the server.
    ///
    /// On success the baseline advances to the revision the server now
    /// reports and the page joins the cached index. On failure the session
    /// stays modified and a retry reuses the old baseline.
    pub async fn post(
        &self,
        wiki: &WikiConfig,
        session: &mut EditSession,
        source: &Path,
        meta: &PostMeta,
    ) -> Result<PostReceipt> {
        check_wiki(wiki, session)?;
        let baseline = self.require_baseline(&session.key, "post")?;
        let form = post_form(wiki, &baseline, source, meta);

        let outcome = self.post_and_resolve(wiki, &session.key, &form).await;
        let (status, record) = match outcome {
            Ok(done) => done,
            Err(e) => {
                session.mark_modified();
                return Err(e);
            }
        };

        let revision = record.revision.clone();
        self.revisions.put_record(record);
        let newly_indexed = self.index.add(&wiki.name, &display_name(&session.key.page));
        tracing::info!(
            "Posted {} ({} -> {})",
            session.key,
            baseline.revision,
            revision
        );

        session.state = SessionState::Loaded;
        session.baseline = Some(revision.clone());

        Ok(PostReceipt {
            status,
            previous_revision: baseline.revision,
            revision,
            newly_indexed,
        })
    }

    async fn post_and_resolve(
        &self,
        wiki: &WikiConfig,
        key: &PageKey,
        form: &PostForm,
    ) -> Result<(PostStatus, RevisionRecord)> {
        let status = self.client.post(wiki, form).await?;
        let record = self.latest_revision(wiki, key).await?;
        Ok((status, record))
    }

    /// Rendered HTML for the text in `source`. Sync state is left untouched.
    pub async fn preview(
        &self,
        wiki: &WikiConfig,
        session: &mut EditSession,
        source: &Path,
        meta: &PostMeta,
    ) -> Result<String> {
        check_wiki(wiki, session)?;
        let baseline = self.require_baseline(&session.key, "preview")?;
        let form = post_form(wiki, &baseline, source, meta);

        let previous = std::mem::replace(&mut session.state, SessionState::Previewing);
        let result = self.client.preview(wiki, &form).await;
        session.state = previous;
        result
    }

    pub async fn history(&self, wiki: &WikiConfig, page: &str) -> Result<Vec<FeedItem>> {
        let text = self.client.fetch_history(wiki, page).await?;
        Ok(self.parser.parse(&text))
    }

    pub async fn recent_changes(&self, wiki: &WikiConfig) -> Result<Vec<FeedItem>> {
        let text = self.client.fetch_recent_changes(wiki).await?;
        Ok(self.parser.parse(&text))
    }

    pub async fn search(&self, wiki: &WikiConfig, pattern: &str) -> Result<Vec<FeedItem>> {
        let text = self.client.search(wiki, pattern).await?;
        Ok(self.parser.parse(&text))
    }

    pub async fn match_page_names(&self, wiki: &WikiConfig, pattern: &str) -> Result<Vec<String>> {
        self.client.match_page_names(wiki, pattern).await
    }

    /// Known page names, fetched on first use.
    pub async fn page_names(&self, wiki: &WikiConfig) -> Result<Arc<BTreeSet<String>>> {
        let client = &self.client;
        self.index
            .get_or_load(&wiki.name, move || client.fetch_index(wiki))
            .await
    }

    pub async fn reload_page_names(&self, wiki: &WikiConfig) -> Result<Arc<BTreeSet<String>>> {
        let client = &self.client;
        self.index
            .reload(&wiki.name, move || client.fetch_index(wiki))
            .await
    }

    pub async fn ensure_page_exists(&self, wiki: &WikiConfig, page: &str) -> Result<()> {
        if self.page_names(wiki).await?.contains(&display_name(page)) {
            Ok(())
        } else {
            Err(SyncError::PageNotFound {
                wiki: wiki.name.clone(),
                page: page.to_string(),
            })
        }
    }

    /// Newest revision in the page history, or `new` when there is none.
    async fn latest_revision(&self, wiki: &WikiConfig, key: &PageKey) -> Result<RevisionRecord> {
        let text = self.client.fetch_history(wiki, &key.page).await?;
        let newest = self
            .parser
            .parse(&text)
            .into_iter()
            .find_map(|item| item.revision.map(|revision| (revision, item.last_modified)));

        Ok(match newest {
            Some((revision, last_modified)) => RevisionRecord {
                key: key.clone(),
                revision,
                last_modified,
            },
            None => RevisionRecord::new(key.clone(), NEW_REVISION),
        })
    }

    fn require_baseline(&self, key: &PageKey, action: &str) -> Result<RevisionRecord> {
        self.revisions.record(key).ok_or_else(|| {
            SyncError::InvariantViolation(format!(
                "cannot {} {} before it was loaded",
                action, key
            ))
        })
    }
}

fn check_wiki(wiki: &WikiConfig, session: &EditSession) -> Result<()> {
    if session.key.wiki == wiki.name {
        Ok(())
    } else {
        Err(SyncError::InvariantViolation(format!(
            "session for {} used with wiki {}",
            session.key, wiki.name
        )))
    }
}

fn post_form(
    wiki: &WikiConfig,
    baseline: &RevisionRecord,
    source: &Path,
    meta: &PostMeta,
) -> PostForm {
    PostForm {
        page: baseline.key.page.clone(),
        source: source.to_path_buf(),
        summary: meta.summary.clone(),
        username: meta.username.clone().or_else(|| wiki.username.clone()),
        password: meta.password.clone().or_else(|| wiki.password.clone()),
        minor: meta.minor,
        revision: baseline.revision.clone(),
        oldtime: baseline.oldtime(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::ScriptedTransport;
    use crate::transport::{Operation, Response};

    const EMPTY_HISTORY: &str = "title: Alex\nlink: https://alexschroeder.ch/wiki\n";
    const HISTORY_59: &str = "title: Alex\n\n\
title: Contact\n\
generator: Alex\n\
last-modified: 2024-01-01T00:00:00Z\n\
revision: 59\n\n\
title: Contact\n\
revision: 58\n";

    struct Fixture {
        transport: Arc<ScriptedTransport>,
        engine: SyncEngine,
        wiki: WikiConfig,
    }

    fn fixture() -> Fixture {
        let transport = Arc::new(ScriptedTransport::new());
        let engine = SyncEngine::new(
            WikiClient::new(transport.clone()),
            Arc::new(RevisionStore::new()),
            Arc::new(PageIndexCache::new()),
        );
        let mut wiki = WikiConfig::new("Alex", "https://alexschroeder.ch/wiki");
        wiki.username = Some("Alex".into());
        Fixture {
            transport,
            engine,
            wiki,
        }
    }

    fn key() -> PageKey {
        PageKey::new("Alex", "Contact")
    }

    fn meta() -> PostMeta {
        PostMeta {
            summary: "phone".into(),
            ..Default::default()
        }
    }

    async fn load_new_contact(f: &Fixture) -> EditSession {
        f.transport
            .push(Operation::GetPage, Response::new("Call me."))
            .push(Operation::History, Response::new(EMPTY_HISTORY));
        f.engine.load(&f.wiki, "Contact").await.unwrap().session
    }

    fn index_of(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_load_new_page_records_new() {
        let f = fixture();
        f.transport
            .push(Operation::GetPage, Response::new("Call me."))
            .push(Operation::History, Response::new(EMPTY_HISTORY));

        let loaded = f.engine.load(&f.wiki, "Contact").await.unwrap();

        assert_eq!(loaded.content, "Call me.");
        assert_eq!(loaded.session.state, SessionState::Loaded);
        assert_eq!(loaded.session.baseline.as_deref(), Some(NEW_REVISION));
        assert_eq!(f.engine.revisions().get(&key()), Some("new".into()));
    }

    #[tokio::test]
    async fn test_load_takes_newest_revision() {
        let f = fixture();
        f.transport
            .push(Operation::GetPage, Response::new("text"))
            .push(Operation::History, Response::new(HISTORY_59));

        f.engine.load(&f.wiki, "Contact").await.unwrap();

        let record = f.engine.revisions().record(&key()).unwrap();
        assert_eq!(record.revision, "59");
        assert_eq!(record.oldtime(), Some(1_704_067_200));
    }

    #[tokio::test]
    async fn test_load_fails_when_history_fails() {
        let f = fixture();
        f.transport
            .push(Operation::GetPage, Response::new("text"))
            .push(Operation::History, Response::transport_failure(""));

        let err = f.engine.load(&f.wiki, "Contact").await.unwrap_err();

        assert!(matches!(err, SyncError::Remote { .. }));
        assert_eq!(f.engine.revisions().get(&key()), None);
    }

    #[tokio::test]
    async fn test_load_fails_on_error_page() {
        let f = fixture();
        f.transport.push(
            Operation::GetPage,
            Response::new("<title>Error</title><h1>Page locked</h1>"),
        );

        let err = f.engine.load(&f.wiki, "Contact").await.unwrap_err();

        assert!(matches!(err, SyncError::Remote { message, .. } if message == "Page locked"));
        assert_eq!(f.transport.count(Operation::History), 0);
    }

    #[tokio::test]
    async fn test_post_before_load_is_invariant_violation() {
        let f = fixture();
        f.engine
            .index()
            .get_or_load("Alex", || async { Ok(index_of(&["HomePage"])) })
            .await
            .unwrap();
        let mut session = EditSession::new(key());

        let err = f
            .engine
            .post(&f.wiki, &mut session, Path::new("/tmp/Contact"), &meta())
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::InvariantViolation(_)));
        assert!(f.transport.calls().is_empty());
        assert!(f.engine.revisions().is_empty());
        assert_eq!(f.engine.index().contains("Alex", "Contact"), Some(false));
    }

    #[tokio::test]
    async fn test_post_advances_baseline_and_index() {
        let f = fixture();
        f.engine
            .index()
            .get_or_load("Alex", || async { Ok(index_of(&["HomePage"])) })
            .await
            .unwrap();
        let mut session = load_new_contact(&f).await;
        session.mark_modified();

        f.transport
            .push(Operation::Post, Response::with_status("", "302"))
            .push(Operation::History, Response::new(HISTORY_59));
        let receipt = f
            .engine
            .post(&f.wiki, &mut session, Path::new("/tmp/Contact"), &meta())
            .await
            .unwrap();

        assert_eq!(receipt.previous_revision, "new");
        assert_eq!(receipt.revision, "59");
        assert!(receipt.newly_indexed);
        assert_eq!(f.engine.revisions().get(&key()), Some("59".into()));
        assert_eq!(f.engine.index().contains("Alex", "Contact"), Some(true));
        assert_eq!(session.state, SessionState::Loaded);
        assert_eq!(session.baseline.as_deref(), Some("59"));

        let post = f
            .transport
            .calls()
            .into_iter()
            .find(|c| c.operation == Operation::Post)
            .unwrap();
        assert_eq!(post.revision.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_second_post_sends_new_baseline() {
        let f = fixture();
        let mut session = load_new_contact(&f).await;

        f.transport
            .push(Operation::Post, Response::with_status("", "302"))
            .push(Operation::History, Response::new(HISTORY_59))
            .push(Operation::Post, Response::with_status("", "302"))
            .push(Operation::History, Response::new(HISTORY_59));
        for _ in 0..2 {
            f.engine
                .post(&f.wiki, &mut session, Path::new("/tmp/Contact"), &meta())
                .await
                .unwrap();
        }

        let revisions: Vec<_> = f
            .transport
            .calls()
            .into_iter()
            .filter(|c| c.operation == Operation::Post)
            .map(|c| (c.revision, c.oldtime))
            .collect();
        assert_eq!(
            revisions,
            vec![
                (Some("new".to_string()), None),
                (Some("59".to_string()), Some(1_704_067_200))
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_post_keeps_baseline() {
        let f = fixture();
        let mut session = load_new_contact(&f).await;

        f.transport.push(
            Operation::Post,
            Response::with_status("<title>Error</title><h1>Page locked</h1>", "200"),
        );
        let err = f
            .engine
            .post(&f.wiki, &mut session, Path::new("/tmp/Contact"), &meta())
            .await
            .unwrap_err();

        assert!(err.is_recoverable());
        assert_eq!(session.state, SessionState::Modified);
        assert_eq!(session.baseline.as_deref(), Some("new"));
        assert_eq!(f.engine.revisions().get(&key()), Some("new".into()));
        assert_eq!(f.transport.count(Operation::History), 1);
    }

    #[tokio::test]
    async fn test_edit_conflict_keeps_baseline() {
        let f = fixture();
        let mut session = load_new_contact(&f).await;

        f.transport
            .push(Operation::Post, Response::with_status("<html>edit form</html>", "200"));
        let err = f
            .engine
            .post(&f.wiki, &mut session, Path::new("/tmp/Contact"), &meta())
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::EditConflict { .. }));
        assert_eq!(f.engine.revisions().get(&key()), Some("new".into()));
    }

    #[tokio::test]
    async fn test_history_failure_after_post_mutates_nothing() {
        let f = fixture();
        f.engine
            .index()
            .get_or_load("Alex", || async { Ok(index_of(&["HomePage"])) })
            .await
            .unwrap();
        let mut session = load_new_contact(&f).await;

        f.transport
            .push(Operation::Post, Response::with_status("", "302"))
            .push(Operation::History, Response::transport_failure(""));
        let result = f
            .engine
            .post(&f.wiki, &mut session, Path::new("/tmp/Contact"), &meta())
            .await;

        assert!(result.is_err());
        assert_eq!(f.engine.revisions().get(&key()), Some("new".into()));
        assert_eq!(f.engine.index().contains("Alex", "Contact"), Some(false));
    }

    #[tokio::test]
    async fn test_preview_leaves_state_untouched() {
        let f = fixture();
        f.engine
            .index()
            .get_or_load("Alex", || async { Ok(index_of(&["HomePage"])) })
            .await
            .unwrap();
        let mut session = load_new_contact(&f).await;
        session.mark_modified();

        let revisions_before = f.engine.revisions().snapshot();
        let index_before = f.engine.index().get("Alex").unwrap();

        f.transport.push(
            Operation::Preview,
            Response::with_status("<p>Call me.</p>", "200"),
        );
        let html = f
            .engine
            .preview(&f.wiki, &mut session, Path::new("/tmp/Contact"), &meta())
            .await
            .unwrap();

        assert_eq!(html, "<p>Call me.</p>");
        assert_eq!(session.state, SessionState::Modified);
        assert_eq!(f.engine.revisions().snapshot(), revisions_before);
        assert_eq!(*f.engine.index().get("Alex").unwrap(), *index_before);
        assert_eq!(f.transport.count(Operation::History), 1);
    }

    #[tokio::test]
    async fn test_preview_requires_baseline() {
        let f = fixture();
        let mut session = EditSession::new(key());

        let err = f
            .engine
            .preview(&f.wiki, &mut session, Path::new("/tmp/Contact"), &meta())
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::InvariantViolation(_)));
        assert_eq!(session.state, SessionState::Unloaded);
    }

    #[tokio::test]
    async fn test_reload_refetches() {
        let f = fixture();
        let mut session = load_new_contact(&f).await;
        session.mark_modified();

        f.transport
            .push(Operation::GetPage, Response::new("Updated."))
            .push(Operation::History, Response::new(HISTORY_59));
        let content = f.engine.reload(&f.wiki, &mut session).await.unwrap();

        assert_eq!(content, "Updated.");
        assert_eq!(session.state, SessionState::Loaded);
        assert_eq!(session.baseline.as_deref(), Some("59"));
    }

    #[tokio::test]
    async fn test_session_from_other_wiki_rejected() {
        let f = fixture();
        let mut session = EditSession::new(PageKey::new("EmacsWiki", "Contact"));

        let err = f.engine.reload(&f.wiki, &mut session).await.unwrap_err();
        assert!(matches!(err, SyncError::InvariantViolation(_)));
    }

    #[tokio::test]
    async fn test_resume_uses_stored_baseline() {
        let f = fixture();
        assert_eq!(f.engine.resume(key()).state, SessionState::Unloaded);

        f.engine.revisions().put(&key(), "12");
        let session = f.engine.resume(key());
        assert_eq!(session.state, SessionState::Modified);
        assert_eq!(session.baseline.as_deref(), Some("12"));
    }

    #[tokio::test]
    async fn test_page_names_cached() {
        let f = fixture();
        f.transport
            .push(Operation::Index, Response::new("HomePage\nContact\n"));

        let first = f.engine.page_names(&f.wiki).await.unwrap();
        let second = f.engine.page_names(&f.wiki).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(f.transport.count(Operation::Index), 1);
    }

    #[tokio::test]
    async fn test_ensure_page_exists() {
        let f = fixture();
        f.transport
            .push(Operation::Index, Response::new("HomePage\nSite_Map\n"));

        f.engine.ensure_page_exists(&f.wiki, "Site Map").await.unwrap();
        let err = f
            .engine
            .ensure_page_exists(&f.wiki, "Contact")
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::PageNotFound { page, .. } if page == "Contact"));
    }

    #[tokio::test]
    async fn test_reload_page_names_refetches() {
        let f = fixture();
        f.transport
            .push(Operation::Index, Response::new("HomePage\n"))
            .push(Operation::Index, Response::new("HomePage\nContact\n"));

        f.engine.page_names(&f.wiki).await.unwrap();
        let names = f.engine.reload_page_names(&f.wiki).await.unwrap();

        assert!(names.contains("Contact"));
        assert_eq!(f.transport.count(Operation::Index), 2);
    }

    #[tokio::test]
    async fn test_post_uses_wiki_username_by_default() {
        let f = fixture();
        let record = RevisionRecord::new(key(), "3");
        let form = post_form(&f.wiki, &record, Path::new("/tmp/Contact"), &meta());
        assert_eq!(form.username.as_deref(), Some("Alex"));

        let custom = PostMeta {
            username: Some("Guest".into()),
            minor: true,
            ..meta()
        };
        let form = post_form(&f.wiki, &record, Path::new("/tmp/Contact"), &custom);
        assert_eq!(form.username.as_deref(), Some("Guest"));
        assert_eq!(form.minor_flag(), "on");
    }

    #[tokio::test]
    async fn test_post_indexes_display_name() {
        let f = fixture();
        f.transport
            .push(Operation::Index, Response::new("HomePage\nSite_Map\n"));
        f.engine.page_names(&f.wiki).await.unwrap();

        f.transport
            .push(Operation::GetPage, Response::new("links"))
            .push(Operation::History, Response::new(EMPTY_HISTORY));
        let mut session = f.engine.load(&f.wiki, "Site_Map").await.unwrap().session;

        f.transport
            .push(Operation::Post, Response::with_status("", "302"))
            .push(Operation::History, Response::new(EMPTY_HISTORY));
        let receipt = f
            .engine
            .post(&f.wiki, &mut session, Path::new("/tmp/Site_Map"), &meta())
            .await
            .unwrap();

        assert!(!receipt.newly_indexed);
        let names = f.engine.page_names(&f.wiki).await.unwrap();
        assert_eq!(*names, index_of(&["HomePage", "Site Map"]));
        f.engine.ensure_page_exists(&f.wiki, "Site_Map").await.unwrap();
    }
}
