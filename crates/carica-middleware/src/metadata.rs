//! Action introspection and metadata memoization.
//!
//! The metadata stage needs, for every routed action, the facts in
//! [`ActionMetadata`]. They are derived in two steps:
//!
//! 1. an [`ActionIntrospector`] describes the action as an
//!    [`ActionDeclaration`] (parameters with types and markers, plus
//!    action-level middleware and security markers)
//! 2. the [`MetadataResolver`] folds the declaration into metadata and
//!    memoizes the result in a [`MetadataCache`] keyed by [`ActionId`]
//!
//! The resolver also remembers which action instance first claimed each
//! id. A different action arriving under a claimed id is a
//! [`ConfigurationFault::DuplicateActionId`], so one action never receives
//! another's metadata.
//!
//! Both caches are safe to share between threads. A cache miss computed
//! concurrently by two requests yields equal values, so the second write is
//! redundant but harmless.

use carica_core::{
    ActionDeclaration, ActionId, ActionMetadata, ActionRef, CaricaResult, ConfigurationFault,
    ParameterMarker, TypeCatalog, TypeName,
};
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;

/// Describes an action's parameters and markers.
pub trait ActionIntrospector: Send + Sync {
    /// Returns the declaration for `action`.
    fn introspect(&self, action: &ActionRef) -> CaricaResult<ActionDeclaration>;
}

/// Reads the declaration an action carries.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclarationIntrospector;

impl ActionIntrospector for DeclarationIntrospector {
    fn introspect(&self, action: &ActionRef) -> CaricaResult<ActionDeclaration> {
        Ok(action.declaration().clone())
    }
}

/// Memoizes declarations from another introspector.
pub struct CachingIntrospector<I> {
    inner: I,
    declarations: DashMap<ActionId, ActionDeclaration>,
}

impl<I: ActionIntrospector> CachingIntrospector<I> {
    /// Wraps an introspector.
    pub fn new(inner: I) -> Self {
        Self {
            inner,
            declarations: DashMap::new(),
        }
    }

    /// Returns the number of cached declarations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

impl<I: ActionIntrospector> ActionIntrospector for CachingIntrospector<I> {
    fn introspect(&self, action: &ActionRef) -> CaricaResult<ActionDeclaration> {
        if let Some(hit) = self.declarations.get(action.id()) {
            return Ok(hit.value().clone());
        }
        let declaration = self.inner.introspect(action)?;
        self.declarations
            .insert(action.id().clone(), declaration.clone());
        Ok(declaration)
    }
}

impl<I> fmt::Debug for CachingIntrospector<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachingIntrospector")
            .field("cached", &self.declarations.len())
            .finish_non_exhaustive()
    }
}

/// Get-or-compute store for derived metadata.
pub trait MetadataCache: Send + Sync {
    /// Returns the cached metadata for `action`, computing and storing it on
    /// a miss. A failed computation is not stored.
    fn get_or_compute(
        &self,
        action: &ActionId,
        compute: &dyn Fn() -> CaricaResult<ActionMetadata>,
    ) -> CaricaResult<Arc<ActionMetadata>>;
}

/// In-memory [`MetadataCache`].
#[derive(Debug, Default)]
pub struct MemoryMetadataCache {
    entries: DashMap<ActionId, Arc<ActionMetadata>>,
}

impl MemoryMetadataCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached entry without computing.
    #[must_use]
    pub fn get(&self, action: &ActionId) -> Option<Arc<ActionMetadata>> {
        self.entries.get(action).map(|entry| Arc::clone(entry.value()))
    }

    /// Returns the number of cached actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl MetadataCache for MemoryMetadataCache {
    fn get_or_compute(
        &self,
        action: &ActionId,
        compute: &dyn Fn() -> CaricaResult<ActionMetadata>,
    ) -> CaricaResult<Arc<ActionMetadata>> {
        if let Some(hit) = self.get(action) {
            tracing::trace!(action = %action, "Metadata cache hit");
            return Ok(hit);
        }
        let computed = Arc::new(compute()?);
        let stored = self
            .entries
            .entry(action.clone())
            .or_insert(computed);
        Ok(Arc::clone(stored.value()))
    }
}

/// Derives [`ActionMetadata`] from declarations.
pub struct MetadataResolver {
    introspector: Arc<dyn ActionIntrospector>,
    catalog: Arc<TypeCatalog>,
    cache: Arc<dyn MetadataCache>,
    claimed: DashMap<ActionId, ActionRef>,
}

impl MetadataResolver {
    /// Creates a resolver.
    pub fn new(
        introspector: Arc<dyn ActionIntrospector>,
        catalog: Arc<TypeCatalog>,
        cache: Arc<dyn MetadataCache>,
    ) -> Self {
        Self {
            introspector,
            catalog,
            cache,
            claimed: DashMap::new(),
        }
    }

    /// A resolver reading action declarations through a declaration cache,
    /// with an in-memory metadata cache.
    pub fn with_defaults(catalog: Arc<TypeCatalog>) -> Self {
        Self::new(
            Arc::new(CachingIntrospector::new(DeclarationIntrospector)),
            catalog,
            Arc::new(MemoryMetadataCache::new()),
        )
    }

    /// Returns the memoized metadata for `action`.
    ///
    /// Fails with [`ConfigurationFault::DuplicateActionId`] when a different
    /// action already claimed the same id.
    pub fn resolve(&self, action: &ActionRef) -> CaricaResult<Arc<ActionMetadata>> {
        let is_claimant = self
            .claimed
            .entry(action.id().clone())
            .or_insert_with(|| action.clone())
            .ptr_eq(action);
        if !is_claimant {
            tracing::error!(action = %action.id(), "Two different actions share an id");
            return Err(ConfigurationFault::DuplicateActionId {
                action: action.id().clone(),
            }
            .into());
        }
        self.cache.get_or_compute(action.id(), &|| self.derive(action))
    }

    /// Derives metadata without consulting the cache.
    ///
    /// The first parsed-body marker and the first parameter assignable to
    /// the request type win; later ones are ignored.
    pub fn derive(&self, action: &ActionRef) -> CaricaResult<ActionMetadata> {
        let declaration = self.introspector.introspect(action)?;
        let mut builder = ActionMetadata::builder();
        let mut parsed_body = None;
        let mut request_parameter = None;

        for parameter in declaration.parameters() {
            let name = parameter.name();
            let ty = parameter.declared_type().simple_name().ok_or_else(|| {
                ConfigurationFault::UnsupportedParameterType {
                    action: action.id().clone(),
                    parameter: name.to_string(),
                }
            })?;
            builder = builder.parameter(name, ty.clone());

            if request_parameter.is_none() && self.catalog.is_assignable(ty, &TypeName::REQUEST) {
                request_parameter = Some(name);
            }

            for marker in parameter.markers() {
                match marker {
                    ParameterMarker::ParsedBody => {
                        parsed_body.get_or_insert(name);
                    }
                    ParameterMarker::RequestAttribute { key } => {
                        let key = key.clone().unwrap_or_else(|| name.to_string());
                        builder = builder.request_attribute(name, key);
                    }
                    ParameterMarker::UploadedFile { path } => {
                        let path = path.clone().unwrap_or_else(|| vec![name.to_string()]);
                        builder = builder.uploaded_file(name, path);
                    }
                }
            }
        }

        if let Some(name) = parsed_body {
            builder = builder.parsed_body(name);
        }
        if let Some(name) = request_parameter {
            builder = builder.request_parameter(name);
        }
        for middleware in declaration.additional_middleware() {
            builder = builder.middleware(middleware.clone());
        }
        if let Some(marker) = declaration.authentication() {
            builder = builder.authentication(marker.clone());
        }
        if let Some(marker) = declaration.authorization() {
            builder = builder.authorization(marker.clone());
        }

        let metadata = builder.build()?;
        tracing::debug!(
            action = %action.id(),
            parameters = metadata.parameter_types().len(),
            "Derived action metadata"
        );
        Ok(metadata)
    }
}

impl fmt::Debug for MetadataResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataResolver").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carica_core::{
        ActionOutput, DeclaredType, ParameterDeclaration, SecurityMarker, Value,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn resolver() -> MetadataResolver {
        MetadataResolver::with_defaults(Arc::new(TypeCatalog::new()))
    }

    fn action(declaration: ActionDeclaration) -> ActionRef {
        ActionRef::from_fn("subject", declaration, |_| Ok(ActionOutput::from(Value::Null)))
    }

    #[test]
    fn test_derive_collects_roles() {
        let admin = SecurityMarker::new("admin-only", "admin");
        let declaration = ActionDeclaration::new()
            .parameter(ParameterDeclaration::new("id", DeclaredType::int()))
            .parameter(ParameterDeclaration::new("body", DeclaredType::array()).parsed_body())
            .parameter(ParameterDeclaration::new("req", DeclaredType::request()))
            .parameter(ParameterDeclaration::new("user", DeclaredType::mixed()).request_attribute())
            .parameter(
                ParameterDeclaration::new("tenant", DeclaredType::string())
                    .request_attribute_named("tenant_id"),
            )
            .parameter(ParameterDeclaration::new("avatar", DeclaredType::uploaded_file()).uploaded_file())
            .parameter(
                ParameterDeclaration::new("doc", DeclaredType::uploaded_file())
                    .uploaded_file_at(["forms", "doc"]),
            )
            .middleware("audit")
            .middleware("timing")
            .authorized_by(admin.clone());

        let metadata = resolver().derive(&action(declaration)).unwrap();

        assert_eq!(metadata.parameter_type("id"), Some(&TypeName::INT));
        assert_eq!(metadata.parsed_body_parameter(), Some("body"));
        assert_eq!(metadata.request_parameter(), Some("req"));
        assert_eq!(metadata.request_attributes()["user"], "user");
        assert_eq!(metadata.request_attributes()["tenant"], "tenant_id");
        assert_eq!(metadata.uploaded_file_parameters()["avatar"], vec!["avatar"]);
        assert_eq!(metadata.uploaded_file_parameters()["doc"], vec!["forms", "doc"]);
        assert_eq!(metadata.additional_middleware(), &["audit", "timing"]);
        assert_eq!(metadata.authorization(), Some(&admin));
        assert!(metadata.authentication().is_none());
    }

    #[test]
    fn test_union_type_is_a_configuration_fault() {
        let declaration = ActionDeclaration::new().parameter(ParameterDeclaration::new(
            "either",
            DeclaredType::Union(vec![TypeName::INT, TypeName::STRING]),
        ));

        let error = resolver().derive(&action(declaration)).unwrap_err();
        assert_eq!(
            error.as_configuration(),
            Some(&ConfigurationFault::UnsupportedParameterType {
                action: ActionId::from("subject"),
                parameter: "either".into(),
            })
        );
    }

    #[test]
    fn test_first_markers_win() {
        let declaration = ActionDeclaration::new()
            .parameter(ParameterDeclaration::new("a", DeclaredType::array()).parsed_body())
            .parameter(ParameterDeclaration::new("b", DeclaredType::array()).parsed_body())
            .parameter(ParameterDeclaration::new("r1", DeclaredType::request()))
            .parameter(ParameterDeclaration::new("r2", DeclaredType::request()));

        let metadata = resolver().derive(&action(declaration)).unwrap();
        assert_eq!(metadata.parsed_body_parameter(), Some("a"));
        assert_eq!(metadata.request_parameter(), Some("r1"));
    }

    #[test]
    fn test_request_subtype_is_detected() {
        let mut catalog = TypeCatalog::new();
        catalog.register_interface("ServerRequest").implements("request");
        let resolver = MetadataResolver::with_defaults(Arc::new(catalog));
        let declaration = ActionDeclaration::new()
            .parameter(ParameterDeclaration::new("incoming", DeclaredType::named("ServerRequest")));

        let metadata = resolver.derive(&action(declaration)).unwrap();
        assert_eq!(metadata.request_parameter(), Some("incoming"));
    }

    struct CountingIntrospector {
        calls: AtomicUsize,
    }

    impl ActionIntrospector for CountingIntrospector {
        fn introspect(&self, action: &ActionRef) -> CaricaResult<ActionDeclaration> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(action.declaration().clone())
        }
    }

    #[test]
    fn test_resolve_memoizes_by_action_id() {
        let introspector = Arc::new(CountingIntrospector {
            calls: AtomicUsize::new(0),
        });
        let cache = Arc::new(MemoryMetadataCache::new());
        let resolver = MetadataResolver::new(
            introspector.clone(),
            Arc::new(TypeCatalog::new()),
            cache.clone(),
        );
        let subject = action(
            ActionDeclaration::new().parameter(ParameterDeclaration::new("id", DeclaredType::int())),
        );

        let first = resolver.resolve(&subject).unwrap();
        let second = resolver.resolve(&subject).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(introspector.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_distinct_actions_sharing_an_id_are_rejected() {
        let resolver = resolver();
        let by_id = ActionRef::from_fn(
            "handler",
            ActionDeclaration::new().parameter(ParameterDeclaration::new("id", DeclaredType::int())),
            |_| Ok(ActionOutput::from(Value::Null)),
        );
        let by_name = ActionRef::from_fn(
            "handler",
            ActionDeclaration::new()
                .parameter(ParameterDeclaration::new("name", DeclaredType::string())),
            |_| Ok(ActionOutput::from(Value::Null)),
        );

        let metadata = resolver.resolve(&by_id).unwrap();
        assert!(metadata.declares("id"));
        assert!(resolver.resolve(&by_id.clone()).is_ok());

        let error = resolver.resolve(&by_name).unwrap_err();
        assert_eq!(
            error.as_configuration(),
            Some(&ConfigurationFault::DuplicateActionId {
                action: ActionId::from("handler")
            })
        );
    }

    #[test]
    fn test_failed_computation_is_not_cached() {
        let cache = MemoryMetadataCache::new();
        let id = ActionId::from("broken");

        let result = cache.get_or_compute(&id, &|| {
            Err(ConfigurationFault::UnknownMiddleware { name: "x".into() }.into())
        });
        assert!(result.is_err());
        assert!(cache.is_empty());

        let value = cache
            .get_or_compute(&id, &|| Ok(ActionMetadata::default()))
            .unwrap();
        assert_eq!(*value, ActionMetadata::default());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_caching_introspector_reads_once() {
        let inner = CountingIntrospector {
            calls: AtomicUsize::new(0),
        };
        let caching = CachingIntrospector::new(inner);
        let subject = action(ActionDeclaration::new().middleware("audit"));

        let first = caching.introspect(&subject).unwrap();
        let second = caching.introspect(&subject).unwrap();

        assert_eq!(first, second);
        assert_eq!(caching.inner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(caching.len(), 1);
    }
}
