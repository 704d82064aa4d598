//! # Gateway Mux
//!
//! The [`GatewayMux`] turns a set of [`RouteMapping`]s into an `axum::Router` that proxies
//! HTTP/JSON requests to unary gRPC methods.
//!
//! Every mapping is resolved against a `DescriptorPool` when it is registered, so a mapping
//! that names an unknown method, a streaming method, or a path variable that is not a field of
//! the request message is rejected before the HTTP listener ever starts.
//!
//! ## Request pipeline
//!
//! 1. The body (for `body: "*"` routes) or the query string (for body-less routes) is read into
//!    a JSON object. An empty body is an empty object.
//! 2. Path variables are bound on top as JSON strings.
//! 3. The object is decoded into the method's input message. Unknown fields are ignored.
//! 4. The message is sent upstream through the [`GrpcClient`] and the reply is rendered as
//!    proto3 JSON, with default-valued fields included.
//!
//! Failures at any step are reported through [`GatewayError`].
use crate::{
    BoxError,
    error::GatewayError,
    grpc::client::GrpcClient,
    headers::forwarded_metadata,
    route::{BodyMapping, PathTemplateError, RouteMapping, RpcParseError},
};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{
        Path, Query,
        rejection::{PathRejection, QueryRejection},
    },
    http::{HeaderMap, Method},
    routing::{MethodFilter, on},
};
use http_body::Body as HttpBody;
use prost_reflect::{
    DescriptorError, DescriptorPool, DeserializeOptions, DynamicMessage, MethodDescriptor,
    SerializeOptions,
};
use serde_json::{Map, Value};
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};
use tonic::{client::GrpcService, transport::Channel};
use tower_http::trace::TraceLayer;

#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error(transparent)]
    InvalidRpc(#[from] RpcParseError),
    #[error(transparent)]
    InvalidPath(#[from] PathTemplateError),
    #[error("Service '{0}' not found")]
    ServiceNotFound(String),
    #[error("Method '{method}' not found in service '{service}'")]
    MethodNotFound { service: String, method: String },
    #[error("Method '{0}' is streaming, only unary methods can be mapped")]
    StreamingMethod(String),
    #[error("Path variable '{variable}' is not a field of '{message}'")]
    UnknownPathField { variable: String, message: String },
    #[error("HTTP method '{0}' cannot be routed")]
    UnsupportedHttpMethod(Method),
    #[error("Route '{method} {path}' is already registered")]
    DuplicateRoute { method: Method, path: String },
    #[error("Path '{path}' conflicts with the already registered '{existing}'")]
    ConflictingPath { path: String, existing: String },
}

/// A resolved mapping, ready to serve.
struct Route<S> {
    mapping: RouteMapping,
    filter: MethodFilter,
    method: MethodDescriptor,
    has_path_variables: bool,
    client: GrpcClient<S>,
}

/// Registry of HTTP routes proxied to a single upstream gRPC service.
pub struct GatewayMux<S = Channel> {
    pool: DescriptorPool,
    client: GrpcClient<S>,
    routes: Vec<Route<S>>,
    // Path shape (variables erased) -> path as registered.
    shapes: HashMap<String, String>,
    registered: HashSet<(Method, String)>,
}

impl<S> GatewayMux<S>
where
    S: Clone,
{
    pub fn new(pool: DescriptorPool, client: GrpcClient<S>) -> Self {
        Self {
            pool,
            client,
            routes: Vec::new(),
            shapes: HashMap::new(),
            registered: HashSet::new(),
        }
    }

    /// Builds a mux whose schema comes from an encoded `FileDescriptorSet`.
    pub fn from_file_descriptor_set(
        file_descriptor_set: &[u8],
        client: GrpcClient<S>,
    ) -> Result<Self, DescriptorError> {
        let pool = DescriptorPool::decode(file_descriptor_set)?;
        Ok(Self::new(pool, client))
    }

    /// Resolves `mapping` against the descriptor pool and adds it to the mux.
    pub fn register(&mut self, mapping: RouteMapping) -> Result<(), RegisterError> {
        let (service_name, method_name) = mapping.rpc_name()?;

        let service = self
            .pool
            .get_service_by_name(service_name)
            .ok_or_else(|| RegisterError::ServiceNotFound(service_name.to_string()))?;

        let method = service
            .methods()
            .find(|m| m.name() == method_name)
            .ok_or_else(|| RegisterError::MethodNotFound {
                service: service_name.to_string(),
                method: method_name.to_string(),
            })?;

        if method.is_client_streaming() || method.is_server_streaming() {
            return Err(RegisterError::StreamingMethod(mapping.rpc.clone()));
        }

        let variables = mapping.path_variables()?;
        let input = method.input();

        if let Some(variable) = variables
            .iter()
            .find(|v| input.get_field_by_name(v).is_none())
        {
            return Err(RegisterError::UnknownPathField {
                variable: variable.to_string(),
                message: input.full_name().to_string(),
            });
        }

        let filter = MethodFilter::try_from(mapping.method.clone())
            .map_err(|_| RegisterError::UnsupportedHttpMethod(mapping.method.clone()))?;

        let shape = path_shape(&mapping.path);
        if let Some(existing) = self.shapes.get(&shape).filter(|p| **p != mapping.path) {
            return Err(RegisterError::ConflictingPath {
                path: mapping.path.clone(),
                existing: existing.clone(),
            });
        }

        let key = (mapping.method.clone(), mapping.path.clone());
        if self.registered.contains(&key) {
            return Err(RegisterError::DuplicateRoute {
                method: key.0,
                path: key.1,
            });
        }

        tracing::info!(
            http_method = %mapping.method,
            path = %mapping.path,
            rpc = %mapping.rpc,
            "registered gateway route"
        );

        let has_path_variables = !variables.is_empty();
        self.shapes.insert(shape, mapping.path.clone());
        self.registered.insert(key);
        self.routes.push(Route {
            mapping,
            filter,
            method,
            has_path_variables,
            client: self.client.clone(),
        });

        Ok(())
    }
}

impl<S> GatewayMux<S>
where
    S: GrpcService<tonic::body::Body> + Clone + Send + Sync + 'static,
    S::Error: Into<BoxError>,
    S::Future: Send,
    S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    /// Builds the router serving every registered route.
    ///
    /// Paths that match no route answer `404` with the usual error body.
    pub fn into_router(self) -> Router {
        let mut router = Router::new();

        for route in self.routes {
            let path = route.mapping.path.clone();
            let filter = route.filter;
            let route = Arc::new(route);

            let handler = move |path_params: Result<Path<HashMap<String, String>>, PathRejection>,
                                query: Result<Query<HashMap<String, String>>, QueryRejection>,
                                headers: HeaderMap,
                                body: Bytes| {
                handle(Arc::clone(&route), path_params, query, headers, body)
            };

            router = router.route(&path, on(filter, handler));
        }

        router
            .fallback(|| async { GatewayError::NotFound })
            .layer(TraceLayer::new_for_http())
    }
}

async fn handle<S>(
    route: Arc<Route<S>>,
    path_params: Result<Path<HashMap<String, String>>, PathRejection>,
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, GatewayError>
where
    S: GrpcService<tonic::body::Body> + Clone,
    S::Error: Into<BoxError>,
    S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    let path_params = match path_params {
        Ok(Path(params)) => params,
        Err(_) if !route.has_path_variables => HashMap::new(),
        Err(rejection) => return Err(GatewayError::Decode(rejection.body_text())),
    };

    let query = match route.mapping.body {
        BodyMapping::Whole => HashMap::new(),
        BodyMapping::None => {
            let Query(query) =
                query.map_err(|rejection| GatewayError::Decode(rejection.body_text()))?;
            query
        }
    };

    let input = decode_input(&route, path_params, query, &body)?;

    tracing::debug!(rpc = %route.mapping.rpc, "proxying request");

    let mut client = route.client.clone();
    let output = client
        .unary(&route.method, input, forwarded_metadata(&headers))
        .await?
        .map_err(GatewayError::Upstream)?;

    let json = output
        .serialize_with_options(serde_json::value::Serializer, &serialize_options())
        .map_err(GatewayError::Encode)?;

    Ok(Json(json))
}

fn decode_input<S>(
    route: &Route<S>,
    path_params: HashMap<String, String>,
    query: HashMap<String, String>,
    body: &[u8],
) -> Result<DynamicMessage, GatewayError> {
    let mut fields = match route.mapping.body {
        BodyMapping::Whole => parse_body(body)?,
        BodyMapping::None => query
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect(),
    };

    for (name, value) in path_params {
        fields.insert(name, Value::String(value));
    }

    DynamicMessage::deserialize_with_options(
        route.method.input(),
        Value::Object(fields),
        &deserialize_options(),
    )
    .map_err(|e| {
        GatewayError::Decode(format!(
            "Request does not match '{}': {}",
            route.method.input().full_name(),
            e
        ))
    })
}

fn parse_body(body: &[u8]) -> Result<Map<String, Value>, GatewayError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }

    match serde_json::from_slice(body) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(GatewayError::Decode(
            "Request body must be a JSON object".to_string(),
        )),
        Err(e) => Err(GatewayError::Decode(format!("Invalid JSON body: {}", e))),
    }
}

fn deserialize_options() -> DeserializeOptions {
    DeserializeOptions::new().deny_unknown_fields(false)
}

fn serialize_options() -> SerializeOptions {
    SerializeOptions::new().skip_default_fields(false)
}

/// `/v1/{a}/x` and `/v1/{b}/x` route the same requests; both map to `/v1/{}/x`.
fn path_shape(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if segment.starts_with('{') {
                "{}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
