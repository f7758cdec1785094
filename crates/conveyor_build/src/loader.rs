//! The asset builder: orchestrates resolution, processing, bundling, and
//! caching for one build session.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use conveyor_cache::DepGraphCache;
use conveyor_common::{AssetUri, CacheDependency};
use conveyor_digest::{Digest, DigestEngine, DigestValue};
use conveyor_graph::{
    bundle_order, concatenate, expand_directory, expand_tree, parse_header, Directive,
};
use conveyor_pipeline::{Metadata, Pipeline, PipelineContext, Processor};
use conveyor_resolve::{normalize, parse_basename, Resolver};

use crate::asset::Asset;
use crate::environment::Environment;
use crate::error::BuildError;

/// A processed single file, before bundling. This is what the per-file
/// stage cache stores.
#[derive(Debug, Serialize, Deserialize)]
struct StagedFile {
    data: String,
    content_type: Option<String>,
    directives: Vec<(usize, Directive)>,
    dependency_paths: Vec<PathBuf>,
    cache_dependencies: Vec<String>,
    extra: BTreeMap<String, serde_json::Value>,
}

/// Intermediate state accumulated while walking the require graph.
#[derive(Default)]
struct Walk {
    edges: HashMap<PathBuf, Vec<PathBuf>>,
    bodies: HashMap<PathBuf, String>,
    visited: HashSet<PathBuf>,
    stubs: Vec<PathBuf>,
    metadata: Metadata,
}

/// One build session over a frozen [`Environment`].
///
/// A session memoizes build results per unresolved URI, so duplicate loads
/// inside one session coalesce into a single build. Sessions are cheap;
/// create one per logical build request.
pub struct AssetBuilder<'env> {
    env: &'env Environment,
    memo: HashMap<String, Asset>,
}

impl<'env> AssetBuilder<'env> {
    /// Creates a session against the given environment.
    pub fn new(env: &'env Environment) -> Self {
        Self {
            env,
            memo: HashMap::new(),
        }
    }

    /// Resolves a logical path and builds the matching asset.
    pub fn find(&mut self, path: &str, accept: Option<&str>) -> Result<Asset, BuildError> {
        let resolver = self.resolver();
        let resolved = resolver.resolve(path, accept)?;
        let mut uri = AssetUri::from_filename(resolved.filename);
        uri.content_type = resolved.content_type;
        uri.index_alias = resolved.index_alias;
        self.load(&uri)
    }

    /// Builds the asset named by `uri`, consulting the session memo and the
    /// dependency-graph cache before doing any work.
    pub fn load(&mut self, uri: &AssetUri) -> Result<Asset, BuildError> {
        let unpinned = uri.clone().without_id();
        let memo_key = unpinned.to_string();

        if let Some(asset) = self.memo.get(&memo_key) {
            let asset = asset.clone();
            return check_pinned(uri, asset);
        }

        let engine = self.env.engine;
        let depgraph = DepGraphCache::new(&self.env.cache, engine);
        let mut resolve = |dep: &str| digest_dependency(engine, dep).ok();
        if let Some(stored_uri) = depgraph.lookup(&memo_key, &mut resolve) {
            if let Some(asset) = self.env.cache.get::<Asset>(&asset_key(&stored_uri)) {
                debug!(uri = %memo_key, "asset reused from cache");
                self.memo.insert(memo_key, asset.clone());
                return check_pinned(uri, asset);
            }
        }

        let asset = self.build(&unpinned)?;

        let deps = asset.dependencies.clone();
        let mut resolve = |dep: &str| digest_dependency(engine, dep).ok();
        if let Some(combined) = depgraph.combine(&deps, &mut resolve) {
            depgraph.record(&memo_key, deps, &combined, asset.uri.clone());
        }
        self.env.cache.set(&asset_key(&asset.uri), &asset);
        self.memo.insert(memo_key, asset.clone());
        check_pinned(uri, asset)
    }

    fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.env.load_paths, &self.env.mimes, &self.env.engines)
    }

    /// Runs the full build for an unpinned URI.
    fn build(&mut self, uri: &AssetUri) -> Result<Asset, BuildError> {
        let filename = uri.path().to_path_buf();
        debug!(file = %filename.display(), "building asset");

        let bundle_ct = match &uri.content_type {
            Some(ct) => Some(ct.clone()),
            None => self.file_content_type(&filename),
        };
        let follow = !uri.skip_bundle && uri.pipeline.as_deref() != Some("self");

        let mut walk = Walk::default();
        walk.metadata
            .add_cache_dependency(CacheDependency::Opaque(format!(
                "env-version:{}",
                self.env.version
            )));
        self.walk_file(&filename, bundle_ct.as_deref(), uri, &mut walk, follow)?;

        let bundled = if follow {
            let order = bundle_order(&filename, &walk.edges, &walk.stubs)?;
            for path in &order {
                walk.metadata.add_dependency_path(path.clone());
            }
            concatenate(&order, &walk.bodies)
        } else {
            walk.metadata.add_dependency_path(filename.clone());
            walk.bodies.remove(&filename).unwrap_or_default()
        };

        let (data, metadata) = self.run_bundle_stages(uri, &filename, bundle_ct.as_deref(), bundled, walk.metadata)?;

        let bytes = match &uri.encoding {
            Some(encoding) => conveyor_pipeline::encoding::encode(encoding, data.as_bytes())?,
            None => data.into_bytes(),
        };

        let dependencies = dependency_tokens(&metadata);
        let digest = self.env.engine.digest_bytes(&bytes);
        let id = self.compute_id(&filename, bundle_ct.as_deref(), &digest, &dependencies)?;
        let content_type = bundle_ct;

        let uri_with_id = uri.clone().with_id(id.clone());
        Ok(Asset {
            uri: uri_with_id.to_string(),
            logical_path: self.logical_path(&filename, uri),
            filename,
            content_type: content_type.clone(),
            integrity: digest.integrity_uri(content_type.as_deref()),
            digest: digest.to_hex(),
            id,
            source: bytes,
            dependencies,
            metadata: metadata.extra,
        })
    }

    /// Processes one file and, when `follow` is set, recurses into its
    /// require graph.
    fn walk_file(
        &mut self,
        filename: &Path,
        bundle_ct: Option<&str>,
        uri: &AssetUri,
        walk: &mut Walk,
        follow: bool,
    ) -> Result<(), BuildError> {
        if !walk.visited.insert(filename.to_path_buf()) {
            return Ok(());
        }

        let staged = self.process_file(filename, bundle_ct, uri)?;
        if let (Some(expected), Some(found)) = (bundle_ct, staged.content_type.as_deref()) {
            if expected != found {
                return Err(BuildError::ContentTypeMismatch {
                    path: filename.to_path_buf(),
                    expected: expected.to_string(),
                    found: found.to_string(),
                });
            }
        }

        walk.metadata.add_dependency_path(filename.to_path_buf());
        for path in staged.dependency_paths {
            walk.metadata.add_dependency_path(path);
        }
        for token in staged.cache_dependencies {
            walk.metadata.add_cache_dependency(CacheDependency::parse(&token));
        }
        for (key, value) in staged.extra {
            walk.metadata.extra.insert(key, value);
        }

        let mut inlined = String::new();
        for (_line, directive) in staged.directives {
            match directive {
                Directive::Require(arg) => {
                    if follow {
                        let child = self.resolve_require(&arg, filename, bundle_ct)?;
                        self.add_edge(walk, filename, child.clone());
                        self.walk_file(&child, bundle_ct, uri, walk, follow)?;
                    }
                }
                Directive::RequireDirectory(arg) => {
                    if follow {
                        let dir = self.resolve_dir(&arg, filename)?;
                        walk.metadata
                            .add_cache_dependency(CacheDependency::file_digest(dir.clone()));
                        for child in expand_directory(&dir)? {
                            self.require_expanded(&child, filename, bundle_ct, uri, walk)?;
                        }
                    }
                }
                Directive::RequireTree(arg) => {
                    if follow {
                        let dir = self.resolve_dir(&arg, filename)?;
                        walk.metadata
                            .add_cache_dependency(CacheDependency::file_digest(dir.clone()));
                        for child in expand_tree(&dir)? {
                            self.require_expanded(&child, filename, bundle_ct, uri, walk)?;
                        }
                    }
                }
                Directive::Depend(arg) => {
                    let dep = self.resolve_require(&arg, filename, None)?;
                    walk.metadata.add_dependency_path(dep);
                }
                Directive::Stub(arg) => {
                    if follow {
                        let stubbed = self.resolve_require(&arg, filename, bundle_ct)?;
                        walk.metadata.add_dependency_path(stubbed.clone());
                        walk.stubs.push(stubbed);
                    }
                }
                Directive::Include(arg) => {
                    let included = self.resolve_require(&arg, filename, bundle_ct)?;
                    let body = self.process_file(&included, bundle_ct, uri)?;
                    walk.metadata.add_dependency_path(included);
                    inlined.push_str(&body.data);
                }
                Directive::Provide(_) => {}
                Directive::Compat => {
                    walk.metadata
                        .extra
                        .insert("legacy_mode".to_string(), serde_json::json!(true));
                }
            }
        }

        let mut body = inlined;
        body.push_str(&staged.data);
        walk.bodies.insert(filename.to_path_buf(), body);
        Ok(())
    }

    /// One file from a directory expansion: skipped when its content type
    /// is incompatible with the bundle, required otherwise.
    fn require_expanded(
        &mut self,
        child: &Path,
        from: &Path,
        bundle_ct: Option<&str>,
        uri: &AssetUri,
        walk: &mut Walk,
    ) -> Result<(), BuildError> {
        if child == from {
            return Ok(());
        }
        if let (Some(expected), Some(found)) = (bundle_ct, self.file_content_type(child)) {
            if expected != found {
                return Ok(());
            }
        }
        self.add_edge(walk, from, child.to_path_buf());
        self.walk_file(child, bundle_ct, uri, walk, true)
    }

    fn add_edge(&self, walk: &mut Walk, from: &Path, to: PathBuf) {
        walk.edges.entry(from.to_path_buf()).or_default().push(to);
    }

    /// Runs one file through its stage pipeline, consulting the per-file
    /// stage cache.
    ///
    /// The cache key covers the file's bytes, its path, and every stage's
    /// cache-key contribution, so a config change in any processor rebuilds
    /// while a file retouch that keeps the bytes does not.
    fn process_file(
        &self,
        filename: &Path,
        bundle_ct: Option<&str>,
        uri: &AssetUri,
    ) -> Result<StagedFile, BuildError> {
        let source = std::fs::read_to_string(filename).map_err(|e| BuildError::Io {
            path: filename.to_path_buf(),
            source: e,
        })?;

        let basename = filename
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let parsed = parse_basename(&basename, &self.env.mimes, &self.env.engines);
        let file_ct = parsed
            .content_type(&self.env.mimes, &self.env.engines)
            .map(String::from);

        let (engine_pipeline, rest_pipeline) =
            self.file_pipelines(&parsed.engine_exts, file_ct.as_deref(), bundle_ct)?;

        // When the bundle wants a different type, the rest pipeline carries a
        // transform chain, so the processed output has the bundle's type.
        let staged_ct = match (file_ct.as_deref(), bundle_ct) {
            (Some(from), Some(to)) if from != to => Some(to.to_string()),
            _ => file_ct.clone(),
        };

        let stage_key = DigestValue::Seq(vec![
            DigestValue::Str(filename.to_string_lossy().into_owned()),
            DigestValue::Bytes(self.env.engine.digest_bytes(source.as_bytes()).as_bytes().to_vec()),
            DigestValue::from_json(&engine_pipeline.cache_key())?,
            DigestValue::from_json(&rest_pipeline.cache_key())?,
        ]);
        let key = format!("stage:{}", self.env.engine.digest(&stage_key).to_hex());

        let load_path = self
            .env
            .load_paths
            .iter()
            .find(|lp| filename.starts_with(lp))
            .cloned();
        let ctx = PipelineContext {
            uri,
            filename,
            load_path: load_path.as_deref(),
            name: &parsed.name,
            content_type: file_ct.as_deref(),
        };

        self.env.cache.fetch(&key, || {
            let (data, metadata) = engine_pipeline.run(&ctx, source.clone(), Metadata::default())?;
            let header = parse_header(&data)?;
            let (data, metadata) = rest_pipeline.run(&ctx, header.stripped, metadata)?;
            Ok::<StagedFile, BuildError>(StagedFile {
                data,
                content_type: staged_ct.clone(),
                directives: header.directives,
                dependency_paths: metadata.dependency_paths,
                cache_dependencies: metadata
                    .cache_dependencies
                    .iter()
                    .map(|d| d.to_string())
                    .collect(),
                extra: metadata.extra,
            })
        })
    }

    /// Assembles the per-file stage pipelines.
    ///
    /// The engine pipeline runs the processor for each engine extension,
    /// outermost first; the rest pipeline runs preprocessors for the file's
    /// own type, the transformer chain to the bundle type, and the
    /// postprocessors for the bundle type.
    fn file_pipelines(
        &self,
        engine_exts: &[String],
        file_ct: Option<&str>,
        bundle_ct: Option<&str>,
    ) -> Result<(Pipeline, Pipeline), BuildError> {
        let mut engine_stages: Vec<std::sync::Arc<dyn Processor>> = Vec::new();
        for ext in engine_exts {
            if let Some(processor) = self.env.processors.engine(ext) {
                engine_stages.push(processor.clone());
            }
        }

        let mut rest: Vec<std::sync::Arc<dyn Processor>> = Vec::new();
        if let Some(ct) = file_ct {
            rest.extend(self.env.processors.preprocessors(ct).iter().cloned());
        }
        if let (Some(from), Some(to)) = (file_ct, bundle_ct) {
            if from != to {
                rest.extend(self.env.processors.transform_chain(from, to)?);
            }
        }
        if let Some(ct) = bundle_ct.or(file_ct) {
            rest.extend(self.env.processors.postprocessors(ct).iter().cloned());
        }

        // Pipelines compose right-to-left, so reverse into execution order.
        engine_stages.reverse();
        rest.reverse();
        Ok((Pipeline::new(engine_stages), Pipeline::new(rest)))
    }

    /// Runs the bundle processors over the concatenated output.
    fn run_bundle_stages(
        &self,
        uri: &AssetUri,
        filename: &Path,
        bundle_ct: Option<&str>,
        data: String,
        metadata: Metadata,
    ) -> Result<(String, Metadata), BuildError> {
        let mut stages: Vec<std::sync::Arc<dyn Processor>> = match bundle_ct {
            Some(ct) => self.env.processors.bundle_processors(ct).to_vec(),
            None => Vec::new(),
        };
        if stages.is_empty() {
            return Ok((data, metadata));
        }
        stages.reverse();
        let pipeline = Pipeline::new(stages);

        let name = filename
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ctx = PipelineContext {
            uri,
            filename,
            load_path: None,
            name: &name,
            content_type: bundle_ct,
        };
        Ok(pipeline.run(&ctx, data, metadata)?)
    }

    /// The content id: a digest over the built content, the environment
    /// version, the stage cache keys, and every dependency digest. Equal
    /// ids imply byte-identical builds; nothing the id covers can change
    /// without changing it.
    fn compute_id(
        &self,
        filename: &Path,
        bundle_ct: Option<&str>,
        content_digest: &Digest,
        dependencies: &[String],
    ) -> Result<String, BuildError> {
        let basename = filename
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let parsed = parse_basename(&basename, &self.env.mimes, &self.env.engines);
        let file_ct = parsed
            .content_type(&self.env.mimes, &self.env.engines)
            .map(String::from);
        let (engines, rest) =
            self.file_pipelines(&parsed.engine_exts, file_ct.as_deref(), bundle_ct)?;

        let mut dep_digests = Vec::with_capacity(dependencies.len());
        for token in dependencies {
            let digest = digest_dependency(self.env.engine, token)?;
            dep_digests.push(DigestValue::Bytes(digest.as_bytes().to_vec()));
        }

        let value = DigestValue::Seq(vec![
            DigestValue::Bytes(content_digest.as_bytes().to_vec()),
            DigestValue::Str(self.env.version.clone()),
            DigestValue::from_json(&engines.cache_key())?,
            DigestValue::from_json(&rest.cache_key())?,
            DigestValue::Seq(dep_digests),
        ]);
        Ok(self.env.engine.digest(&value).to_hex())
    }

    /// Resolves a require argument to a concrete file.
    ///
    /// A `./` or `../` argument is taken relative to the requiring file's
    /// logical position; anything else is a plain logical path.
    fn resolve_require(
        &self,
        arg: &str,
        from: &Path,
        accept_ct: Option<&str>,
    ) -> Result<PathBuf, BuildError> {
        let resolver = self.resolver();
        let logical = if is_relative_arg(arg) {
            let dir = from.parent().unwrap_or_else(|| Path::new("/"));
            let load_path = self
                .env
                .load_paths
                .iter()
                .find(|lp| dir.starts_with(lp))
                .ok_or_else(|| {
                    BuildError::Resolve(conveyor_resolve::ResolveError::FileOutsidePaths(
                        from.to_path_buf(),
                    ))
                })?;
            let rel_dir = dir.strip_prefix(load_path).unwrap_or(Path::new(""));
            normalize(&rel_dir.join(arg)).to_string_lossy().into_owned()
        } else {
            arg.to_string()
        };
        let resolved = resolver.resolve(&logical, accept_ct)?;
        Ok(resolved.filename)
    }

    /// Resolves a directory argument for `require_directory`/`require_tree`.
    fn resolve_dir(&self, arg: &str, from: &Path) -> Result<PathBuf, BuildError> {
        if is_relative_arg(arg) {
            let dir = from.parent().unwrap_or_else(|| Path::new("/"));
            let joined = normalize(&dir.join(arg));
            if joined.is_dir() {
                return Ok(joined);
            }
            return Err(BuildError::Resolve(
                conveyor_resolve::ResolveError::FileNotFound(arg.to_string()),
            ));
        }
        for load_path in &self.env.load_paths {
            let candidate = load_path.join(arg);
            if candidate.is_dir() {
                return Ok(candidate);
            }
        }
        Err(BuildError::Resolve(
            conveyor_resolve::ResolveError::FileNotFound(arg.to_string()),
        ))
    }

    fn file_content_type(&self, filename: &Path) -> Option<String> {
        let basename = filename.file_name()?.to_string_lossy().into_owned();
        parse_basename(&basename, &self.env.mimes, &self.env.engines)
            .content_type(&self.env.mimes, &self.env.engines)
            .map(String::from)
    }

    /// The logical path the asset is addressed by: the index alias when the
    /// file resolved through `index.*`, otherwise the load-path-relative
    /// path with engine extensions removed.
    fn logical_path(&self, filename: &Path, uri: &AssetUri) -> String {
        if let Some(alias) = &uri.index_alias {
            return alias.clone();
        }
        let rel = self
            .env
            .load_paths
            .iter()
            .find_map(|lp| filename.strip_prefix(lp).ok())
            .unwrap_or(filename);

        let basename = rel
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let parsed = parse_basename(&basename, &self.env.mimes, &self.env.engines);
        let ext = parsed.format_ext.clone().or_else(|| {
            parsed
                .content_type(&self.env.mimes, &self.env.engines)
                .and_then(|ct| self.env.mimes.exts_for(ct).first().map(|e| e.to_string()))
        });
        let logical_name = match ext {
            Some(ext) => format!("{}.{ext}", parsed.name),
            None => parsed.name.clone(),
        };
        match rel.parent() {
            Some(parent) if parent != Path::new("") => {
                format!("{}/{logical_name}", parent.to_string_lossy())
            }
            _ => logical_name,
        }
    }
}

fn asset_key(uri: &str) -> String {
    format!("asset:{uri}")
}

fn is_relative_arg(arg: &str) -> bool {
    arg.starts_with("./") || arg.starts_with("../")
}

/// Digests one dependency token: a file digest for `file-digest:` tokens,
/// the digest of the token string itself for opaque tokens.
fn digest_dependency(engine: DigestEngine, token: &str) -> Result<Digest, BuildError> {
    match CacheDependency::parse(token) {
        CacheDependency::FileDigest(path) => Ok(engine.file_digest(&path)?),
        CacheDependency::Opaque(text) => Ok(engine.digest_bytes(text.as_bytes())),
    }
}

/// The asset's dependency set as string tokens: file dependencies in
/// first-recorded order, then the opaque cache dependencies.
fn dependency_tokens(metadata: &Metadata) -> Vec<String> {
    let mut tokens: Vec<String> = metadata
        .dependency_paths
        .iter()
        .map(|p| CacheDependency::file_digest(p.clone()).to_string())
        .collect();
    tokens.extend(metadata.cache_dependencies.iter().map(|d| d.to_string()));
    tokens
}

fn check_pinned(uri: &AssetUri, asset: Asset) -> Result<Asset, BuildError> {
    match &uri.id {
        Some(id) if *id != asset.id => Err(BuildError::VersionNotFound {
            uri: uri.to_string(),
            id: id.clone(),
        }),
        _ => Ok(asset),
    }
}
