// getzap-core/tests/resolver.rs
use std::cell::RefCell;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use getzap_common::error::{GetZapError, Result};
use getzap_common::model::{
    AssetBody, AssetRecord, HostPlatform, Outcome, ReleaseIdentifier, ReleaseRecord,
    RepositoryPattern, Tier, TransferOptions,
};
use getzap_core::listing::{list_releases, ReleaseListing};
use getzap_core::resolver::{AssetSelector, FallbackResolver, ResolveOptions, StateKind};
use getzap_core::selfcheck::{run_selfcheck, CheckStatus};
use getzap_net::tier::{CacheTier, OriginTier};
use getzap_net::transfer::TransferEngine;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn asset(id: u64, name: &str) -> AssetRecord {
    AssetRecord {
        id,
        name: name.to_string(),
        size: name.len() as u64,
        content_type: None,
        browser_download_url: String::new(),
    }
}

fn release(id: u64, tag: &str, assets: Vec<AssetRecord>) -> ReleaseRecord {
    ReleaseRecord {
        id,
        tag_name: tag.to_string(),
        name: None,
        created_at: None,
        published_at: None,
        assets,
    }
}

#[derive(Default)]
struct FakeOrigin {
    releases: Vec<ReleaseRecord>,
    /// When set, assets are offered as `{base}/download/{name}` instead of a stream.
    redirect_base: Option<String>,
    calls: RefCell<Vec<String>>,
}

impl FakeOrigin {
    fn with_release(tag: &str, names: &[&str]) -> Self {
        let assets = names
            .iter()
            .enumerate()
            .map(|(i, name)| asset(i as u64 + 10, name))
            .collect();
        Self {
            releases: vec![release(1, tag, assets)],
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl OriginTier for FakeOrigin {
    fn resolve_release(&self, id: &ReleaseIdentifier) -> Result<ReleaseRecord> {
        self.calls.borrow_mut().push(format!("resolve {id}"));
        match id {
            ReleaseIdentifier::Latest => self
                .releases
                .first()
                .cloned()
                .ok_or_else(|| GetZapError::NotFound("latest".into())),
            ReleaseIdentifier::Tag(tag) => self
                .releases
                .iter()
                .find(|r| &r.tag_name == tag)
                .cloned()
                .ok_or_else(|| GetZapError::NotFound(tag.clone())),
            ReleaseIdentifier::All => Err(GetZapError::Unsupported("all".into())),
        }
    }

    fn list_releases(&self) -> Result<Vec<ReleaseRecord>> {
        self.calls.borrow_mut().push("list releases".into());
        Ok(self.releases.clone())
    }

    fn list_assets(&self, release: &ReleaseRecord) -> Result<Vec<AssetRecord>> {
        self.calls
            .borrow_mut()
            .push(format!("list assets {}", release.tag_name));
        Ok(release.assets.clone())
    }

    fn open_asset(&self, asset: &AssetRecord) -> Result<AssetBody> {
        self.calls.borrow_mut().push(format!("open {}", asset.name));
        if let Some(base) = &self.redirect_base {
            return Ok(AssetBody::RedirectUrl(format!("{base}/download/{}", asset.name)));
        }
        Ok(AssetBody::Stream(Box::new(Cursor::new(
            asset.name.clone().into_bytes(),
        ))))
    }

    fn describe(&self) -> String {
        "fake/origin".into()
    }
}

#[derive(Default)]
struct FakeCache {
    /// Files served on download, relative to the local root.
    stored: Vec<String>,
    probe_error: Option<GetZapError>,
    fail_uploads: bool,
    downloads: RefCell<Vec<String>>,
    uploads: RefCell<Vec<(String, Vec<PathBuf>)>>,
}

impl CacheTier for FakeCache {
    fn download(&self, pattern: &RepositoryPattern, local_root: &Path) -> Result<Vec<PathBuf>> {
        self.downloads.borrow_mut().push(pattern.to_string());
        if let Some(err) = &self.probe_error {
            return Err(err.clone());
        }
        let prefix = pattern.literal_prefix();
        let mut written = Vec::new();
        for rel in self.stored.iter().filter(|rel| rel.starts_with(&prefix)) {
            let path = local_root.join(rel);
            fs::create_dir_all(path.parent().unwrap())?;
            fs::write(&path, b"cached")?;
            written.push(path);
        }
        Ok(written)
    }

    fn upload(&self, pattern: &RepositoryPattern, files: &[PathBuf]) -> Result<usize> {
        self.uploads
            .borrow_mut()
            .push((pattern.to_string(), files.to_vec()));
        if self.fail_uploads {
            return Err(GetZapError::PartialUpload {
                succeeded: 0,
                failed: files.len(),
            });
        }
        Ok(files.len())
    }

    fn delete(&self, _pattern: &RepositoryPattern) -> Result<usize> {
        Ok(0)
    }

    fn ping(&self) -> Result<()> {
        match &self.probe_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn describe(&self) -> String {
        "fake/cache".into()
    }
}

fn engine() -> TransferEngine {
    TransferEngine::new(TransferOptions {
        show_progress: false,
        ..TransferOptions::default()
    })
    .unwrap()
}

fn options(root: &Path) -> ResolveOptions {
    ResolveOptions {
        local_root: root.to_path_buf(),
        host: HostPlatform::new("linux", "amd64"),
        assets: AssetSelector::Local,
        suffix: None,
    }
}

fn tag(t: &str) -> ReleaseIdentifier {
    ReleaseIdentifier::Tag(t.to_string())
}

#[test]
fn cache_miss_fetches_matching_asset_and_repopulates() {
    let root = TempDir::new().unwrap();
    let origin =
        FakeOrigin::with_release("v1.2.0", &["tool-linux-amd64.zip", "tool-windows-amd64.zip"]);
    let cache = FakeCache::default();
    let transfer = engine();
    let resolver = FallbackResolver::new(Some(&cache), Some(&origin), &transfer, options(root.path()));

    let resolution = resolver.resolve(&tag("v1.2.0")).unwrap();

    let expected = root.path().join("v1.2.0/tool-linux-amd64.zip");
    assert_eq!(
        resolution.outcome,
        Outcome::Retrieved {
            tier: Tier::Origin,
            files: vec![expected.clone()]
        }
    );
    assert_eq!(fs::read_to_string(&expected).unwrap(), "tool-linux-amd64.zip");
    assert!(!root.path().join("v1.2.0/tool-windows-amd64.zip").exists());

    let uploads = cache.uploads.borrow();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].0, "v1.2.0/**");
    assert_eq!(uploads[0].1, vec![expected]);
    assert!(matches!(resolution.repopulation, Some(Ok(1))));
    assert_eq!(
        resolution.path,
        vec![
            StateKind::Start,
            StateKind::CacheProbe,
            StateKind::OriginFetch,
            StateKind::CacheRepopulate,
            StateKind::Done
        ]
    );
}

#[test]
fn cache_hit_never_touches_origin() {
    let root = TempDir::new().unwrap();
    let origin = FakeOrigin::with_release("v1.2.0", &["tool-linux-amd64.zip"]);
    let cache = FakeCache {
        stored: vec!["v1.2.0/tool-linux-amd64.zip".into()],
        ..FakeCache::default()
    };
    let transfer = engine();
    let resolver = FallbackResolver::new(Some(&cache), Some(&origin), &transfer, options(root.path()));

    let resolution = resolver.resolve(&tag("v1.2.0")).unwrap();

    assert!(matches!(
        resolution.outcome,
        Outcome::Retrieved { tier: Tier::Cache, .. }
    ));
    assert_eq!(resolution.outcome.files_written(), 1);
    assert!(origin.calls().is_empty());
    assert!(cache.uploads.borrow().is_empty());
    assert!(resolution.repopulation.is_none());
}

#[test]
fn cache_only_rejects_unpinned_releases_without_network() {
    let root = TempDir::new().unwrap();
    let cache = FakeCache::default();
    let transfer = engine();
    let resolver = FallbackResolver::new(Some(&cache), None, &transfer, options(root.path()));

    for id in [ReleaseIdentifier::Latest, ReleaseIdentifier::All] {
        let err = resolver.resolve(&id).unwrap_err();
        assert!(matches!(err, GetZapError::UnsupportedCacheQuery(_)));
    }
    assert!(cache.downloads.borrow().is_empty());
}

#[test]
fn cache_only_miss_has_no_fallback() {
    let root = TempDir::new().unwrap();
    let cache = FakeCache::default();
    let transfer = engine();
    let resolver = FallbackResolver::new(Some(&cache), None, &transfer, options(root.path()));

    let resolution = resolver.resolve(&tag("v1.2.0")).unwrap();

    assert_eq!(resolution.outcome, Outcome::CacheMiss);
    assert!(!resolution.succeeded());
    assert_eq!(cache.downloads.borrow().as_slice(), ["v1.2.0/**"]);
}

#[test]
fn neither_tier_is_nothing_to_do() {
    let root = TempDir::new().unwrap();
    let transfer = engine();
    let resolver = FallbackResolver::new(None, None, &transfer, options(root.path()));

    let resolution = resolver.resolve(&ReleaseIdentifier::Latest).unwrap();

    assert_eq!(resolution.outcome, Outcome::NothingToDo);
    assert_eq!(resolution.path, vec![StateKind::Start, StateKind::Done]);
    assert!(resolution.succeeded());
}

#[test]
fn latest_skips_cache_and_does_not_repopulate() {
    let root = TempDir::new().unwrap();
    let origin = FakeOrigin::with_release("v2.0.0", &["tool-linux-x64.zip"]);
    let cache = FakeCache::default();
    let transfer = engine();
    let resolver = FallbackResolver::new(Some(&cache), Some(&origin), &transfer, options(root.path()));

    let resolution = resolver.resolve(&ReleaseIdentifier::Latest).unwrap();

    assert_eq!(resolution.outcome.files_written(), 1);
    assert!(root.path().join("v2.0.0/tool-linux-x64.zip").exists());
    assert!(cache.downloads.borrow().is_empty());
    assert!(cache.uploads.borrow().is_empty());
    assert!(!resolution.path.contains(&StateKind::CacheProbe));
}

#[test]
fn repopulation_failure_keeps_the_outcome() {
    let root = TempDir::new().unwrap();
    let origin = FakeOrigin::with_release("v1.2.0", &["tool-linux-amd64.zip"]);
    let cache = FakeCache {
        fail_uploads: true,
        ..FakeCache::default()
    };
    let transfer = engine();
    let resolver = FallbackResolver::new(Some(&cache), Some(&origin), &transfer, options(root.path()));

    let resolution = resolver.resolve(&tag("v1.2.0")).unwrap();

    assert!(resolution.succeeded());
    assert_eq!(resolution.outcome.files_written(), 1);
    assert!(matches!(
        resolution.repopulation,
        Some(Err(GetZapError::PartialUpload { .. }))
    ));
}

#[test]
fn transient_cache_error_falls_back_to_origin() {
    let root = TempDir::new().unwrap();
    let origin = FakeOrigin::with_release("v1.2.0", &["tool-linux-amd64.zip"]);
    let cache = FakeCache {
        probe_error: Some(GetZapError::Network("connection reset".into())),
        ..FakeCache::default()
    };
    let transfer = engine();
    let resolver = FallbackResolver::new(Some(&cache), Some(&origin), &transfer, options(root.path()));

    let resolution = resolver.resolve(&tag("v1.2.0")).unwrap();

    assert!(matches!(
        resolution.outcome,
        Outcome::Retrieved { tier: Tier::Origin, .. }
    ));
    assert_eq!(cache.uploads.borrow().len(), 1);
}

#[test]
fn fatal_cache_error_aborts() {
    let root = TempDir::new().unwrap();
    let origin = FakeOrigin::with_release("v1.2.0", &["tool-linux-amd64.zip"]);
    let cache = FakeCache {
        probe_error: Some(GetZapError::InsecureProtocol("http://rt.local".into())),
        ..FakeCache::default()
    };
    let transfer = engine();
    let resolver = FallbackResolver::new(Some(&cache), Some(&origin), &transfer, options(root.path()));

    let err = resolver.resolve(&tag("v1.2.0")).unwrap_err();

    assert!(matches!(err, GetZapError::InsecureProtocol(_)));
    assert!(origin.calls().is_empty());
}

#[test]
fn unknown_tag_is_an_origin_miss() {
    let root = TempDir::new().unwrap();
    let origin = FakeOrigin::with_release("v1.2.0", &["tool-linux-amd64.zip"]);
    let transfer = engine();
    let resolver = FallbackResolver::new(None, Some(&origin), &transfer, options(root.path()));

    let resolution = resolver.resolve(&tag("v9.9.9")).unwrap();

    assert_eq!(
        resolution.outcome,
        Outcome::OriginMiss {
            release: "v9.9.9".into()
        }
    );
    assert!(!resolution.succeeded());
}

#[test]
fn all_platform_matches_are_transferred_in_listing_order() {
    let root = TempDir::new().unwrap();
    let origin = FakeOrigin::with_release(
        "v1.2.0",
        &["tool-linux.zip", "tool-linux-amd64.zip", "tool-linux-arm64.zip", "apack.json"],
    );
    let transfer = engine();
    let mut opts = options(root.path());
    opts.suffix = Some(".zip".into());
    let resolver = FallbackResolver::new(None, Some(&origin), &transfer, opts);

    let resolution = resolver.resolve(&tag("v1.2.0")).unwrap();

    let Outcome::Retrieved { files, .. } = resolution.outcome else {
        panic!("expected files");
    };
    let names: Vec<_> = files
        .iter()
        .map(|f| f.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, ["tool-linux.zip", "tool-linux-amd64.zip"]);
}

#[tokio::test]
async fn redirected_assets_are_downloaded_from_the_location() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download/tool-linux-amd64.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"from cdn".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let base = server.uri();
    let (files, contents, calls) = tokio::task::spawn_blocking(move || {
        let root = TempDir::new().unwrap();
        let origin = FakeOrigin {
            redirect_base: Some(base),
            ..FakeOrigin::with_release("v1.2.0", &["tool-linux-amd64.zip"])
        };
        let transfer = TransferEngine::new(TransferOptions {
            allow_insecure_http: true,
            show_progress: false,
            ..TransferOptions::default()
        })
        .unwrap();
        let resolver = FallbackResolver::new(None, Some(&origin), &transfer, options(root.path()));

        let outcome = resolver.resolve(&tag("v1.2.0")).unwrap().outcome;
        let contents =
            fs::read_to_string(root.path().join("v1.2.0/tool-linux-amd64.zip")).unwrap();
        let files = match &outcome {
            Outcome::Retrieved { files, .. } => files
                .iter()
                .map(|f| f.strip_prefix(root.path()).unwrap().to_path_buf())
                .collect::<Vec<_>>(),
            _ => Vec::new(),
        };
        (files, contents, origin.calls())
    })
    .await
    .unwrap();

    assert_eq!(files, vec![PathBuf::from("v1.2.0/tool-linux-amd64.zip")]);
    assert_eq!(contents, "from cdn");
    assert_eq!(
        calls,
        ["resolve v1.2.0", "list assets v1.2.0", "open tool-linux-amd64.zip"]
    );
}

#[tokio::test]
async fn redirect_to_plain_http_is_refused_by_default() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"plaintext".to_vec()))
        .expect(0)
        .mount(&server)
        .await;

    let base = server.uri();
    let (result, written) = tokio::task::spawn_blocking(move || {
        let root = TempDir::new().unwrap();
        let origin = FakeOrigin {
            redirect_base: Some(base),
            ..FakeOrigin::with_release("v1.2.0", &["tool-linux-amd64.zip"])
        };
        let transfer = engine();
        let resolver = FallbackResolver::new(None, Some(&origin), &transfer, options(root.path()));

        let result = resolver.resolve(&tag("v1.2.0")).map(|r| r.outcome);
        let written = root.path().join("v1.2.0/tool-linux-amd64.zip").exists();
        (result, written)
    })
    .await
    .unwrap();

    assert!(matches!(result, Err(GetZapError::InsecureProtocol(_))));
    assert!(!written);
}

#[test]
fn listing_all_and_single_release() {
    let origin = FakeOrigin::with_release("v1.2.0", &["a-linux.zip", "b-mac.zip"]);

    let all = list_releases(&origin, &ReleaseIdentifier::All).unwrap();
    assert!(matches!(all, ReleaseListing::Releases(ref r) if r.len() == 1));

    match list_releases(&origin, &tag("v1.2.0")).unwrap() {
        ReleaseListing::Release { release, assets } => {
            assert_eq!(release.tag_name, "v1.2.0");
            assert_eq!(assets.len(), 2);
        }
        other => panic!("unexpected listing {other:?}"),
    }
}

#[test]
fn selfcheck_reports_each_tier() {
    let origin = FakeOrigin::with_release("v1.2.0", &[]);
    let cache = FakeCache {
        probe_error: Some(GetZapError::Auth("401".into())),
        ..FakeCache::default()
    };

    let report = run_selfcheck(Some(&origin), Some(&cache));

    assert!(matches!(report.checks[0].1, CheckStatus::Passed(_)));
    assert!(matches!(report.checks[1].1, CheckStatus::Failed(_)));
    assert!(!report.all_passed());

    let skipped = run_selfcheck(None, None);
    assert!(skipped.all_passed());
    assert_eq!(skipped.checks[1].1, CheckStatus::Skipped);
}
