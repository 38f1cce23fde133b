use serde_json::Value;
use tracing::warn;

use super::{ProbeOutcome, HTTP_CLIENT};
use crate::config::monitoring::MonitoringConfig;

/// Run an instant query and return the first sample's value
pub async fn query_scalar(config: &MonitoringConfig, query: &str) -> ProbeOutcome<f64> {
    let Some(ref base) = config.prometheus_url else {
        return ProbeOutcome::Unconfigured;
    };

    let url = format!("{}/api/v1/query", base);
    let data = match HTTP_CLIENT.get(&url).query(&[("query", query)]).send().await {
        Ok(resp) if resp.status().is_success() => match resp.json::<Value>().await {
            Ok(data) => data,
            Err(e) => {
                warn!("Unparseable metrics response for {}: {}", query, e);
                return ProbeOutcome::Unreachable;
            }
        },
        Ok(resp) => {
            warn!("Metrics query {} returned {}", query, resp.status());
            return ProbeOutcome::Unreachable;
        }
        Err(e) => {
            warn!("Metrics query {} failed: {}", query, e);
            return ProbeOutcome::Unreachable;
        }
    };

    match first_sample(&data) {
        Some(value) => ProbeOutcome::Ok(value),
        None => ProbeOutcome::Unreachable,
    }
}

/// Extract the first sample from a query API response.
///
/// Handles both `vector` results (`[{metric, value: [ts, "v"]}]`) and
/// `scalar` results (`[ts, "v"]`).
fn first_sample(data: &Value) -> Option<f64> {
    if data.get("status") != Some(&serde_json::json!("success")) {
        return None;
    }

    let result = &data["data"]["result"];
    let pair = match data["data"]["resultType"].as_str() {
        Some("scalar") => result,
        _ => &result.as_array()?.first()?["value"],
    };

    match &pair[1] {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_sample_from_vector() {
        let data = json!({
            "status": "success",
            "data": {
                "resultType": "vector",
                "result": [
                    { "metric": {}, "value": [1700000000.0, "12.5"] },
                    { "metric": {}, "value": [1700000000.0, "3"] }
                ]
            }
        });
        assert_eq!(first_sample(&data), Some(12.5));
    }

    #[test]
    fn test_first_sample_from_scalar() {
        let data = json!({
            "status": "success",
            "data": { "resultType": "scalar", "result": [1700000000.0, "0.25"] }
        });
        assert_eq!(first_sample(&data), Some(0.25));
    }

    #[test]
    fn test_empty_or_failed_results() {
        let empty = json!({
            "status": "success",
            "data": { "resultType": "vector", "result": [] }
        });
        assert_eq!(first_sample(&empty), None);

        let error = json!({ "status": "error", "error": "bad query" });
        assert_eq!(first_sample(&error), None);

        let nan = json!({
            "status": "success",
            "data": { "resultType": "vector", "result": [{ "value": [0, "not-a-number"] }] }
        });
        assert_eq!(first_sample(&nan), None);
    }

    #[tokio::test]
    async fn test_unconfigured_without_url() {
        let config = MonitoringConfig {
            prometheus_url: None,
            grafana_url: None,
        };
        assert_eq!(
            query_scalar(&config, "up").await,
            ProbeOutcome::Unconfigured
        );
    }
}
