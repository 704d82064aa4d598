//! # Route Mapping
//!
//! Declarative association between an HTTP method + path template and a unary gRPC method.
//!
//! ```rust
//! use bookstore_gateway::route::RouteMapping;
//!
//! let route = RouteMapping::post("/v1/echo", "bookstore.Echo/Echo");
//! assert_eq!(route.rpc_name().unwrap(), ("bookstore.Echo", "Echo"));
//! ```
//!
//! Path templates use `{field}` segments. Each variable names a top-level field of the
//! request message; the captured segment is bound to that field as a JSON string.
use http::Method;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RpcParseError {
    #[error("Invalid rpc '{0}'. Expected 'package.Service/Method'")]
    MissingSeparator(String),
    #[error("Service and Method names cannot be empty in rpc '{0}'")]
    EmptyName(String),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PathTemplateError {
    #[error("Path template '{0}' must start with '/'")]
    NotAbsolute(String),
    #[error("Path template '{path}' has a malformed segment '{segment}'")]
    MalformedSegment { path: String, segment: String },
    #[error("Path template '{path}' binds '{variable}' more than once")]
    DuplicateVariable { path: String, variable: String },
}

/// How the HTTP request body maps onto the gRPC request message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyMapping {
    /// `body: "*"`, the whole JSON body is the request message.
    Whole,
    /// No body is read. Fields come from path variables and the query string.
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMapping {
    pub method: Method,
    pub path: String,
    /// Target method as `package.Service/Method`.
    pub rpc: String,
    pub body: BodyMapping,
}

impl RouteMapping {
    pub fn new(
        method: Method,
        path: impl Into<String>,
        rpc: impl Into<String>,
        body: BodyMapping,
    ) -> Self {
        Self {
            method,
            path: path.into(),
            rpc: rpc.into(),
            body,
        }
    }

    /// A `POST` route whose JSON body is the whole request message.
    pub fn post(path: impl Into<String>, rpc: impl Into<String>) -> Self {
        Self::new(Method::POST, path, rpc, BodyMapping::Whole)
    }

    /// A `GET` route filled from path variables and query parameters.
    pub fn get(path: impl Into<String>, rpc: impl Into<String>) -> Self {
        Self::new(Method::GET, path, rpc, BodyMapping::None)
    }

    pub fn rpc_name(&self) -> Result<(&str, &str), RpcParseError> {
        parse_rpc(&self.rpc)
    }

    /// Names of the `{field}` variables in the path template, in order.
    pub fn path_variables(&self) -> Result<Vec<&str>, PathTemplateError> {
        if !self.path.starts_with('/') {
            return Err(PathTemplateError::NotAbsolute(self.path.clone()));
        }

        let mut variables = Vec::new();

        for segment in self.path.split('/').skip(1) {
            let malformed = || PathTemplateError::MalformedSegment {
                path: self.path.clone(),
                segment: segment.to_string(),
            };

            // `:name` and `*name` are wildcard syntax to the router.
            if segment.starts_with([':', '*']) {
                return Err(malformed());
            }

            if !segment.contains(['{', '}']) {
                continue;
            }

            let name = segment
                .strip_prefix('{')
                .and_then(|s| s.strip_suffix('}'))
                .filter(|name| is_field_name(name))
                .ok_or_else(malformed)?;

            if variables.contains(&name) {
                return Err(PathTemplateError::DuplicateVariable {
                    path: self.path.clone(),
                    variable: name.to_string(),
                });
            }

            variables.push(name);
        }

        Ok(variables)
    }
}

fn is_field_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Splits `package.Service/Method` into its service and method halves.
pub fn parse_rpc(value: &str) -> Result<(&str, &str), RpcParseError> {
    let (service, method) = value
        .split_once('/')
        .ok_or_else(|| RpcParseError::MissingSeparator(value.to_string()))?;

    if service.trim().is_empty() || method.trim().is_empty() {
        return Err(RpcParseError::EmptyName(value.to_string()));
    }

    Ok((service, method))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rpc_name() {
        assert_eq!(
            parse_rpc("bookstore.Inventory/GetBooks"),
            Ok(("bookstore.Inventory", "GetBooks"))
        );
    }

    #[test]
    fn rejects_rpc_without_separator() {
        assert_eq!(
            parse_rpc("bookstore.Echo.Echo"),
            Err(RpcParseError::MissingSeparator("bookstore.Echo.Echo".to_string()))
        );
    }

    #[test]
    fn rejects_rpc_with_empty_half() {
        assert!(matches!(parse_rpc("/Echo"), Err(RpcParseError::EmptyName(_))));
        assert!(matches!(parse_rpc("bookstore.Echo/ "), Err(RpcParseError::EmptyName(_))));
    }

    #[test]
    fn collects_path_variables() {
        let route = RouteMapping::get("/v1/shelves/{shelf}/books/{title}", "a.B/C");
        assert_eq!(route.path_variables().unwrap(), vec!["shelf", "title"]);

        let route = RouteMapping::post("/v1/echo", "a.B/C");
        assert!(route.path_variables().unwrap().is_empty());
    }

    #[test]
    fn rejects_relative_path() {
        let route = RouteMapping::post("v1/echo", "a.B/C");
        assert_eq!(
            route.path_variables(),
            Err(PathTemplateError::NotAbsolute("v1/echo".to_string()))
        );
    }

    #[test]
    fn rejects_malformed_variables() {
        for path in ["/v1/{value", "/v1/prefix-{value}", "/v1/{}", "/v1/{*rest}"] {
            let route = RouteMapping::get(path, "a.B/C");
            assert!(
                matches!(
                    route.path_variables(),
                    Err(PathTemplateError::MalformedSegment { .. })
                ),
                "{path} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_router_wildcard_syntax() {
        for path in ["/v1/:value", "/v1/*rest", "/v1/echo/:value/books"] {
            let route = RouteMapping::get(path, "a.B/C");
            assert!(
                matches!(
                    route.path_variables(),
                    Err(PathTemplateError::MalformedSegment { .. })
                ),
                "{path} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_repeated_variable() {
        let route = RouteMapping::get("/v1/{value}/and/{value}", "a.B/C");
        assert_eq!(
            route.path_variables(),
            Err(PathTemplateError::DuplicateVariable {
                path: "/v1/{value}/and/{value}".to_string(),
                variable: "value".to_string(),
            })
        );
    }

    #[test]
    fn constructors_pick_body_mapping() {
        assert_eq!(RouteMapping::post("/a", "a.B/C").body, BodyMapping::Whole);
        assert_eq!(RouteMapping::get("/a", "a.B/C").method, Method::GET);
        assert_eq!(RouteMapping::get("/a", "a.B/C").body, BodyMapping::None);
    }
}
