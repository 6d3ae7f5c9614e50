// Batch resolution of user-facing asset ids to storage keys.
//
// Each id is looked up with its own `GET /image/{id}`, one after another
// in input order. A failed lookup only affects that id; the batch as a
// whole fails only when nothing resolved.

use crate::api::{CallRequest, Method, Transport};
use crate::config::ClientConfig;
use crate::executor::{Executor, Sleeper};
use crate::interpret::{interpret, WorkflowResult};
use crate::workflow::ProgressReporter;
use serde_json::Value;
use tracing::{info, warn};

/// Outcome of looking up one requested id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetResolution {
    /// The id as the user typed it.
    pub requested: String,
    /// Storage key on success, otherwise the reason it could not be resolved.
    pub key: Result<String, String>,
}

impl AssetResolution {
    pub fn storage_key(&self) -> Option<&str> {
        self.key.as_deref().ok()
    }
}

/// Parse one identifier: ASCII digits only, fitting in a `u64`.
pub fn parse_asset_id(raw: &str) -> Option<u64> {
    let s = raw.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Split a comma-separated list, keeping only well-formed ids.
pub fn split_identifiers(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| parse_asset_id(s).is_some())
        .map(str::to_string)
        .collect()
}

/// Resolve every valid id in `identifiers`. Malformed entries are skipped
/// without a lookup.
pub fn resolve_all<T, S>(
    executor: &Executor<T, S>,
    config: &ClientConfig,
    identifiers: &[String],
    reporter: &dyn ProgressReporter,
) -> Vec<AssetResolution>
where
    T: Transport,
    S: Sleeper,
{
    identifiers
        .iter()
        .filter_map(|raw| parse_asset_id(raw).map(|id| (raw.trim(), id)))
        .map(|(raw, id)| {
            let key = resolve_one(executor, config, id, reporter);
            match &key {
                Ok(k) => {
                    info!("asset {} resolved to {}", id, k);
                    reporter.on_resolved(raw, k);
                }
                Err(reason) => {
                    warn!("asset {} not resolved: {}", id, reason);
                    reporter.on_failed(raw, reason);
                }
            }
            AssetResolution {
                requested: raw.to_string(),
                key,
            }
        })
        .collect()
}

fn resolve_one<T: Transport, S: Sleeper>(
    executor: &Executor<T, S>,
    config: &ClientConfig,
    id: u64,
    reporter: &dyn ProgressReporter,
) -> Result<String, String> {
    let request = CallRequest::get(config.url(&format!("/image/{id}")));
    reporter.on_request(Method::Get, request.url());
    match interpret(executor.execute(&request)) {
        WorkflowResult::Success(body) => body
            .get("bucketkey")
            .and_then(Value::as_str)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .ok_or_else(|| "no storage key in response".to_string()),
        other => Err(other.message().unwrap_or_default().to_string()),
    }
}

/// Collect the resolved keys in input order, or abort when there are none.
pub fn resolved_keys(resolutions: &[AssetResolution]) -> WorkflowResult<Vec<String>> {
    let keys: Vec<String> = resolutions
        .iter()
        .filter_map(|r| r.storage_key().map(str::to_string))
        .collect();
    if keys.is_empty() {
        WorkflowResult::Aborted("no valid keys resolved".into())
    } else {
        WorkflowResult::Success(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_digits_only() {
        assert_eq!(parse_asset_id("42"), Some(42));
        assert_eq!(parse_asset_id(" 7 "), Some(7));
        assert_eq!(parse_asset_id("-1"), None);
        assert_eq!(parse_asset_id("+1"), None);
        assert_eq!(parse_asset_id("x"), None);
        assert_eq!(parse_asset_id(""), None);
        assert_eq!(parse_asset_id("99999999999999999999999"), None);
    }

    #[test]
    fn split_drops_junk() {
        assert_eq!(split_identifiers("1, 2,x,,3 "), vec!["1", "2", "3"]);
        assert!(split_identifiers("a,b").is_empty());
    }

    #[test]
    fn resolved_keys_keeps_order() {
        let rs = vec![
            AssetResolution {
                requested: "1".into(),
                key: Ok("image_assets/a.jpg".into()),
            },
            AssetResolution {
                requested: "2".into(),
                key: Err("gone".into()),
            },
            AssetResolution {
                requested: "3".into(),
                key: Ok("image_assets/c.jpg".into()),
            },
        ];
        assert_eq!(
            resolved_keys(&rs),
            WorkflowResult::Success(vec![
                "image_assets/a.jpg".to_string(),
                "image_assets/c.jpg".to_string()
            ])
        );
    }

    #[test]
    fn resolved_keys_empty_aborts() {
        let rs = vec![AssetResolution {
            requested: "2".into(),
            key: Err("gone".into()),
        }];
        assert_eq!(
            resolved_keys(&rs),
            WorkflowResult::Aborted("no valid keys resolved".into())
        );
    }
}
