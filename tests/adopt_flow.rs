//! Integration tests for adopting a cited line as a merge request discussion.
//!
//! Uses an in-memory merge request in place of the GitLab API so the
//! whole fetch → re-annotate → resolve → validate → post flow runs
//! without network access.

use std::sync::Mutex;

use async_trait::async_trait;
use pretty_assertions::assert_eq;

use mrpin::adopt::{self, AdoptError, AdoptRequest};
use mrpin::anchor::{AnchorError, AnnotateOptions};
use mrpin::gitlab::{
    DiffSource, Discussion, DiscussionPoster, DiscussionRequest, GitlabError, MrRef, MrVersion,
};
use mrpin::models::{AnchorRef, DiffFile, LineDescriptor, ResolvedPosition};

/// A merge request held in memory.
struct MockMergeRequest {
    versions: Vec<MrVersion>,
    files: Vec<DiffFile>,
    /// Discussions posted so far.
    posted: Mutex<Vec<DiscussionRequest>>,
}

impl MockMergeRequest {
    fn new(versions: Vec<MrVersion>, files: Vec<DiffFile>) -> Self {
        Self {
            versions,
            files,
            posted: Mutex::new(Vec::new()),
        }
    }

    fn posted(&self) -> Vec<DiscussionRequest> {
        self.posted.lock().unwrap().clone()
    }
}

#[async_trait]
impl DiffSource for MockMergeRequest {
    async fn fetch_versions(&self, _mr: &MrRef) -> Result<Vec<MrVersion>, GitlabError> {
        Ok(self.versions.clone())
    }

    async fn fetch_diffs(&self, _mr: &MrRef) -> Result<Vec<DiffFile>, GitlabError> {
        Ok(self.files.clone())
    }
}

#[async_trait]
impl DiscussionPoster for MockMergeRequest {
    async fn create_discussion(
        &self,
        _mr: &MrRef,
        request: &DiscussionRequest,
    ) -> Result<Discussion, GitlabError> {
        let mut posted = self.posted.lock().unwrap();
        posted.push(request.clone());
        Ok(Discussion {
            id: format!("d{}", posted.len()),
            individual_note: false,
        })
    }
}

/// A poster whose API call always fails.
struct FailingPoster;

#[async_trait]
impl DiscussionPoster for FailingPoster {
    async fn create_discussion(
        &self,
        _mr: &MrRef,
        _request: &DiscussionRequest,
    ) -> Result<Discussion, GitlabError> {
        Err(GitlabError::Api {
            endpoint: "discussions".into(),
            status: 400,
            body: "line_code can't be blank".into(),
        })
    }
}

fn version(id: u64, head: &str, created_at: &str) -> MrVersion {
    MrVersion {
        id,
        head_commit_sha: head.into(),
        base_commit_sha: format!("base{id}"),
        start_commit_sha: format!("start{id}"),
        created_at: Some(created_at.into()),
        ..Default::default()
    }
}

/// `old.rs` (deleted): A#1 (old 1), A#2 (old 2).
/// `src/lib.rs`: A#3 context (new 10), A#4 removed (old 11), A#5 added (new 11).
fn files() -> Vec<DiffFile> {
    vec![
        DiffFile {
            old_path: "src/lib.rs".into(),
            new_path: "src/lib.rs".into(),
            diff: Some("@@ -10,2 +10,2 @@\n keep\n-drop\n+add\n".into()),
            ..Default::default()
        },
        DiffFile {
            old_path: "old.rs".into(),
            new_path: "old.rs".into(),
            is_deleted: true,
            diff: Some("@@ -1,2 +0,0 @@\n-a\n-b\n".into()),
            ..Default::default()
        },
    ]
}

fn merge_request() -> MockMergeRequest {
    MockMergeRequest::new(
        vec![
            version(1, "aaa", "2026-01-01T10:00:00Z"),
            version(3, "ccc", "2026-01-03T10:00:00.000+00:00"),
            version(2, "bbb", "2026-01-02T10:00:00Z"),
        ],
        files(),
    )
}

fn request(reference: AnchorRef) -> AdoptRequest {
    AdoptRequest {
        mr: MrRef {
            project: "group/app".into(),
            iid: 42,
        },
        reference,
        body: "Consider handling the error here.".into(),
        expected_head_sha: None,
        annotate: AnnotateOptions::default(),
    }
}

fn anchor(id: &str) -> AnchorRef {
    AnchorRef::Anchor(id.into())
}

#[tokio::test]
async fn posts_against_latest_version() {
    let mr = merge_request();
    let outcome = adopt::adopt(&mr, &mr, &request(anchor("A#5"))).await.unwrap();

    assert_eq!(outcome.version_id, 3);
    assert_eq!(outcome.position, ResolvedPosition::new_side("src/lib.rs", 11));
    assert_eq!(outcome.discussion.unwrap().id, "d1");

    let posted = mr.posted();
    assert_eq!(posted.len(), 1);
    let position = &posted[0].position;
    assert_eq!(position.position_type, "text");
    assert_eq!(position.head_sha, "ccc");
    assert_eq!(position.base_sha, "base3");
    assert_eq!(position.start_sha, "start3");
    assert_eq!(position.new_line, Some(11));
    assert_eq!(position.old_line, None);
    assert_eq!(posted[0].body, "Consider handling the error here.");
}

#[tokio::test]
async fn context_line_is_posted_on_the_new_side_only() {
    let mr = merge_request();
    let outcome = adopt::adopt(&mr, &mr, &request(anchor("<<A#3|N|src/lib.rs|10>>"))).await.unwrap();

    assert_eq!(outcome.request.position.new_line, Some(10));
    assert_eq!(outcome.request.position.old_line, None);
}

#[tokio::test]
async fn removed_line_is_posted_on_the_old_side() {
    let mr = merge_request();
    let outcome = adopt::adopt(&mr, &mr, &request(anchor("A#4"))).await.unwrap();

    assert_eq!(outcome.request.position.old_line, Some(11));
    assert_eq!(outcome.request.position.new_line, None);
}

#[tokio::test]
async fn deleted_file_accepts_old_side_anchor() {
    let mr = merge_request();
    let outcome = adopt::adopt(&mr, &mr, &request(anchor("A#2"))).await.unwrap();

    assert_eq!(outcome.position, ResolvedPosition::old_side("old.rs", 2));
    assert_eq!(outcome.request.position.old_path, "old.rs");
}

#[tokio::test]
async fn deleted_file_rejects_new_side_citation() {
    let mr = merge_request();
    let reference = AnchorRef::Legacy(LineDescriptor {
        line_type: "new_line".into(),
        file_path: "old.rs".into(),
        line: 1,
    });
    let err = adopt::adopt(&mr, &mr, &request(reference)).await.unwrap_err();

    assert!(matches!(
        err,
        AdoptError::Anchor(AnchorError::FileStateViolation { is_deleted: true, .. })
    ));
    assert!(mr.posted().is_empty());
}

#[tokio::test]
async fn legacy_old_line_is_posted_as_is() {
    let mr = merge_request();
    let reference = AnchorRef::Legacy(LineDescriptor {
        line_type: "old_line".into(),
        file_path: "src/lib.rs".into(),
        line: 11,
    });
    let outcome = adopt::adopt(&mr, &mr, &request(reference)).await.unwrap();

    assert_eq!(outcome.request.position.old_line, Some(11));
    assert_eq!(outcome.request.position.new_line, None);
}

#[tokio::test]
async fn stale_anchor_is_not_posted() {
    let mr = merge_request();
    let err = adopt::adopt(&mr, &mr, &request(anchor("A#99"))).await.unwrap_err();

    assert!(matches!(
        err,
        AdoptError::Anchor(AnchorError::AnchorNotFound { .. })
    ));
    assert!(err.to_string().contains("source has changed"));
    assert!(mr.posted().is_empty());
}

#[tokio::test]
async fn moved_head_is_refused() {
    let mr = merge_request();
    let mut req = request(anchor("A#5"));
    req.expected_head_sha = Some("aaa".into());

    let err = adopt::adopt(&mr, &mr, &req).await.unwrap_err();
    match err {
        AdoptError::HeadShaMismatch { expected, actual } => {
            assert_eq!(expected, "aaa");
            assert_eq!(actual, "ccc");
        }
        other => panic!("expected HeadShaMismatch, got {other:?}"),
    }
    assert!(mr.posted().is_empty());
}

#[tokio::test]
async fn matching_head_is_accepted() {
    let mr = merge_request();
    let mut req = request(anchor("A#5"));
    req.expected_head_sha = Some("ccc".into());

    assert!(adopt::adopt(&mr, &mr, &req).await.is_ok());
}

#[tokio::test]
async fn no_versions_is_an_error() {
    let mr = MockMergeRequest::new(vec![], files());
    let err = adopt::adopt(&mr, &mr, &request(anchor("A#1"))).await.unwrap_err();

    assert!(matches!(err, AdoptError::NoVersions(ref mr) if mr == "group/app!42"));
}

#[tokio::test]
async fn blank_body_is_rejected_before_fetching() {
    let mr = merge_request();
    let mut req = request(anchor("A#1"));
    req.body = "  \n".into();

    let err = adopt::adopt(&mr, &mr, &req).await.unwrap_err();
    assert!(matches!(err, AdoptError::EmptyBody));
}

#[tokio::test]
async fn prepare_never_posts() {
    let mr = merge_request();
    let outcome = adopt::prepare(&mr, &request(anchor("A#5"))).await.unwrap();

    assert!(outcome.discussion.is_none());
    assert!(mr.posted().is_empty());
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["request"]["position"]["new_line"], 11);
    assert!(json.get("discussion").is_none());
}

#[tokio::test]
async fn api_failure_surfaces_as_gitlab_error() {
    let mr = merge_request();
    let err = adopt::adopt(&mr, &FailingPoster, &request(anchor("A#5"))).await.unwrap_err();

    assert!(matches!(err, AdoptError::Gitlab(GitlabError::Api { status: 400, .. })));
}

#[tokio::test]
async fn anchors_issued_from_a_later_start_resolve_under_the_same_options() {
    let mr = merge_request();
    let mut req = request(anchor("A#45"));
    req.annotate.first_anchor = 41;

    let outcome = adopt::adopt(&mr, &mr, &req).await.unwrap();
    assert_eq!(outcome.position, ResolvedPosition::new_side("src/lib.rs", 11));

    // the same id under default numbering does not exist
    let err = adopt::adopt(&mr, &mr, &request(anchor("A#45"))).await.unwrap_err();
    assert!(matches!(err, AdoptError::Anchor(AnchorError::AnchorNotFound { .. })));
}

#[tokio::test]
async fn strict_options_refuse_a_malformed_header() {
    let mut broken = files();
    broken[0].diff = Some("@@ -x +y @@\n+add\n".into());
    let mr = MockMergeRequest::new(vec![version(1, "aaa", "2026-01-01T10:00:00Z")], broken);
    let mut req = request(anchor("A#3"));
    req.annotate.strict_hunk_headers = true;

    let err = adopt::adopt(&mr, &mr, &req).await.unwrap_err();
    assert!(matches!(
        err,
        AdoptError::Anchor(AnchorError::MalformedHunkHeader { .. })
    ));
    assert!(mr.posted().is_empty());
}

#[tokio::test]
async fn rename_chain_posts_on_the_entry_that_was_annotated() {
    let chain = vec![
        DiffFile {
            old_path: "a.rs".into(),
            new_path: "b.rs".into(),
            is_renamed: true,
            diff: Some("@@ -7 +7 @@\n-x\n+y\n".into()),
            ..Default::default()
        },
        DiffFile {
            old_path: "b.rs".into(),
            new_path: "c.rs".into(),
            is_renamed: true,
            diff: Some("@@ -7 +7 @@\n-p\n+q\n".into()),
            ..Default::default()
        },
    ];
    let mr = MockMergeRequest::new(vec![version(1, "aaa", "2026-01-01T10:00:00Z")], chain);

    // b.rs (a.rs -> b.rs) gets A#1..A#2, c.rs (b.rs -> c.rs) gets A#3..A#4
    let outcome = adopt::adopt(&mr, &mr, &request(anchor("A#3"))).await.unwrap();
    let position = &mr.posted()[0].position;
    assert_eq!(outcome.position, ResolvedPosition::old_side("b.rs", 7));
    assert_eq!(position.old_path, "b.rs");
    assert_eq!(position.new_path, "c.rs");
    assert_eq!(position.old_line, Some(7));
}

#[tokio::test]
async fn type_change_posts_removed_line_on_the_deleted_entry() {
    let type_change = vec![
        DiffFile {
            old_path: "link".into(),
            new_path: "link".into(),
            is_new: true,
            diff: Some("@@ -0,0 +1 @@\n+content\n".into()),
            ..Default::default()
        },
        DiffFile {
            old_path: "link".into(),
            new_path: "link".into(),
            is_deleted: true,
            diff: Some("@@ -1 +0,0 @@\n-target\n".into()),
            ..Default::default()
        },
    ];
    let mr = MockMergeRequest::new(vec![version(1, "aaa", "2026-01-01T10:00:00Z")], type_change);

    let outcome = adopt::adopt(&mr, &mr, &request(anchor("A#2"))).await.unwrap();
    assert_eq!(outcome.position, ResolvedPosition::old_side("link", 1));
    assert_eq!(mr.posted()[0].position.new_line, None);
}
