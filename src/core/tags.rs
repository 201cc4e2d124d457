//! `ddtags` construction

use super::log_record::Bindings;

/// Comma-joined `key:value` tags for one record.
///
/// Order is fixed: `env`, `nodeID`, `namespace`, then `service` when the
/// bindings carry a non-empty service name. Values are not escaped.
pub fn build_tags(env: Option<&str>, bindings: &Bindings) -> String {
    let mut tags = vec![
        format!("env:{}", env.unwrap_or("")),
        format!("nodeID:{}", bindings.node_id),
        format!("namespace:{}", bindings.namespace),
    ];

    if let Some(service) = bindings.service.as_deref().filter(|s| !s.is_empty()) {
        tags.push(format!("service:{}", service));
    }

    tags.join(",")
}
