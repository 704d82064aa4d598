//! Selection of HTTP request headers forwarded to the upstream service as gRPC metadata.
use axum::http::HeaderMap;

/// Prefix marking a header as gRPC metadata; it is stripped before forwarding.
pub const METADATA_HEADER_PREFIX: &str = "grpc-metadata-";

/// Decides the metadata key an HTTP header is forwarded under, if any.
///
/// * `Grpc-Metadata-<key>` is forwarded as `<key>`. A `-bin` key carries a base64 value that
///   is decoded into binary metadata by the client.
/// * `Authorization` is forwarded unchanged.
/// * Everything else is dropped.
pub fn metadata_key(header: &str) -> Option<String> {
    let header = header.to_ascii_lowercase();

    if let Some(key) = header.strip_prefix(METADATA_HEADER_PREFIX) {
        return (!key.is_empty()).then(|| key.to_string());
    }

    (header == "authorization").then_some(header)
}

/// Collects the forwarded metadata for a request. Non-UTF8 header values are skipped.
pub fn forwarded_metadata(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            let key = metadata_key(name.as_str())?;
            let value = value.to_str().ok()?;
            Some((key, value.to_string()))
        })
        .collect()
}
