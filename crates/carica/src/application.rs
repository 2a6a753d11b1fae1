//! The standard pipeline, assembled from configuration.

use bytes::Bytes;
use carica_config::{CaricaConfig, PipelineConfig};
use carica_core::{CaricaResult, Request, Response, ResponseBuilder, Router, TypeCatalog};
use carica_middleware::{
    ActionDispatcher, AdditionalMiddlewareMiddleware, BodyParser, BodyParsers, BoxedMiddleware,
    DefaultContentTypeMiddleware, DeriveMetadataMiddleware, EnforceHeadMiddleware,
    ExceptionCatcherMiddleware, Handler, JsonResultRenderer, LocatorMiddlewareFactory,
    MetadataResolver, MethodNotAllowedMiddleware, MiddlewareFactory,
    NormalizeArgumentsMiddleware, NotFoundMiddleware, ParsedBodyMiddleware,
    QueryParametersMiddleware, ResultRenderer, RouterMiddleware, SerdeBodyParser, StackKernel,
    ValueLoader, ValueLoaders,
};
use std::sync::Arc;

/// A ready-to-serve pipeline in the standard stage order.
///
/// `respond` never fails: every error and panic inside the pipeline ends as
/// a 500.
pub struct StandardApplication {
    kernel: StackKernel,
    pipeline: PipelineConfig,
    service_name: String,
}

impl StandardApplication {
    /// Starts a builder around `router`.
    pub fn builder(router: Arc<dyn Router>) -> StandardApplicationBuilder {
        StandardApplicationBuilder::new(router)
    }

    /// A builder preconfigured from the pipeline and logging sections.
    pub fn from_config(router: Arc<dyn Router>, config: &CaricaConfig) -> StandardApplicationBuilder {
        Self::builder(router)
            .pipeline(config.pipeline.clone())
            .service_name(config.logging.service_name.clone())
    }

    /// The pipeline settings in effect.
    pub fn pipeline_config(&self) -> &PipelineConfig {
        &self.pipeline
    }

    /// The underlying kernel.
    pub fn kernel(&self) -> &StackKernel {
        &self.kernel
    }

    /// Runs `request` through the pipeline.
    pub fn respond(&self, request: Request) -> Response {
        let span = carica_telemetry::request_span(
            &self.service_name,
            request.method().as_str(),
            request.path(),
        );
        let _entered = span.enter();

        match self.kernel.handle(request) {
            Ok(response) => {
                tracing::trace!(status = response.status().as_u16(), "Request completed");
                response
            }
            Err(error) => {
                tracing::error!(error = %error.report(), "Error escaped the exception catcher");
                ResponseBuilder::new().internal_server_error(Bytes::new())
            }
        }
    }

    /// Runs a plain `http` request through the pipeline.
    pub fn respond_http(&self, request: http::Request<Bytes>) -> Response {
        self.respond(Request::from(request))
    }
}

impl Handler for StandardApplication {
    fn handle(&self, request: Request) -> CaricaResult<Response> {
        Ok(self.respond(request))
    }
}

impl std::fmt::Debug for StandardApplication {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StandardApplication")
            .field("service_name", &self.service_name)
            .field("pipeline", &self.pipeline)
            .field("kernel", &self.kernel)
            .finish()
    }
}

/// Collects the collaborators of a [`StandardApplication`].
///
/// Defaults: an empty [`TypeCatalog`], no value loaders, the serde body
/// parser, the JSON renderer, a middleware factory with nothing registered
/// and [`PipelineConfig::default`].
#[must_use]
pub struct StandardApplicationBuilder {
    router: Arc<dyn Router>,
    catalog: Arc<TypeCatalog>,
    loaders: ValueLoaders,
    parsers: BodyParsers,
    serde_parser: bool,
    renderer: Option<Arc<dyn ResultRenderer>>,
    factory: Arc<dyn MiddlewareFactory>,
    resolver: Option<Arc<MetadataResolver>>,
    pipeline: PipelineConfig,
    service_name: String,
}

impl StandardApplicationBuilder {
    fn new(router: Arc<dyn Router>) -> Self {
        Self {
            router,
            catalog: Arc::new(TypeCatalog::new()),
            loaders: ValueLoaders::new(),
            parsers: BodyParsers::new(),
            serde_parser: true,
            renderer: Some(Arc::new(JsonResultRenderer::new())),
            factory: Arc::new(LocatorMiddlewareFactory::new()),
            resolver: None,
            pipeline: PipelineConfig::default(),
            service_name: "carica".to_string(),
        }
    }

    /// Application types used for coercion, body decoding and metadata.
    pub fn catalog(mut self, catalog: Arc<TypeCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    /// Appends a value loader; earlier loaders are consulted first.
    pub fn value_loader(mut self, loader: Arc<dyn ValueLoader>) -> Self {
        self.loaders.push(loader);
        self
    }

    /// Appends a body parser, consulted before the built-in serde parser.
    pub fn body_parser(mut self, parser: Arc<dyn BodyParser>) -> Self {
        self.parsers.push(parser);
        self
    }

    /// Leaves out the built-in serde body parser.
    pub fn without_serde_parser(mut self) -> Self {
        self.serde_parser = false;
        self
    }

    /// Replaces the result renderer.
    pub fn renderer(mut self, renderer: Arc<dyn ResultRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Requires every action to return a response.
    pub fn without_renderer(mut self) -> Self {
        self.renderer = None;
        self
    }

    /// Source of per-action middleware.
    pub fn middleware_factory(mut self, factory: Arc<dyn MiddlewareFactory>) -> Self {
        self.factory = factory;
        self
    }

    /// Replaces the metadata resolver built from the catalog.
    pub fn metadata_resolver(mut self, resolver: Arc<MetadataResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Stage settings.
    pub fn pipeline(mut self, pipeline: PipelineConfig) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Name recorded on request spans.
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    /// Assembles the stages, outermost first.
    pub fn build(self) -> StandardApplication {
        let Self {
            router,
            catalog,
            loaders,
            mut parsers,
            serde_parser,
            renderer,
            factory,
            resolver,
            pipeline,
            service_name,
        } = self;

        if serde_parser {
            parsers.push(Arc::new(SerdeBodyParser::new(Arc::clone(&catalog))));
        }
        let resolver =
            resolver.unwrap_or_else(|| Arc::new(MetadataResolver::with_defaults(Arc::clone(&catalog))));

        let mut defaults = DefaultContentTypeMiddleware::new();
        if let Some(content_type) = pipeline.content_type() {
            defaults = defaults.with_content_type(content_type);
        }
        if let Some(accept) = pipeline.accept() {
            defaults = defaults.with_accept(accept);
        }

        let mut stages: Vec<BoxedMiddleware> = vec![
            Arc::new(ExceptionCatcherMiddleware::new().debug(pipeline.debug)),
            Arc::new(defaults),
        ];
        if pipeline.enforce_head {
            stages.push(Arc::new(EnforceHeadMiddleware::new()));
        }
        stages.extend([
            Arc::new(RouterMiddleware::new(router)) as BoxedMiddleware,
            Arc::new(NotFoundMiddleware::new()),
            Arc::new(MethodNotAllowedMiddleware::new()),
            Arc::new(DeriveMetadataMiddleware::new(resolver)),
            Arc::new(QueryParametersMiddleware::new()),
            Arc::new(NormalizeArgumentsMiddleware::new(catalog, loaders)),
            Arc::new(ParsedBodyMiddleware::new(parsers)),
            Arc::new(AdditionalMiddlewareMiddleware::new(factory)),
        ]);

        let dispatcher = match renderer {
            Some(renderer) => ActionDispatcher::new().with_renderer(renderer),
            None => ActionDispatcher::new(),
        };
        tracing::debug!(
            service.name = %service_name,
            stages = stages.len(),
            debug = pipeline.debug,
            "Assembled standard pipeline"
        );

        StandardApplication {
            kernel: StackKernel::new(dispatcher, stages),
            pipeline,
            service_name,
        }
    }
}

impl std::fmt::Debug for StandardApplicationBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StandardApplicationBuilder")
            .field("pipeline", &self.pipeline)
            .field("service_name", &self.service_name)
            .field("has_renderer", &self.renderer.is_some())
            .finish_non_exhaustive()
    }
}
