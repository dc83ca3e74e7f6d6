//! Batch submitter — posts a whole roster in one request and classifies
//! the response into a [`BatchResult`].
//!
//! Status codes are interpreted exactly once, in [`classify`]; everything
//! downstream matches on the result type.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{info, warn};

use super::model::{Assignment, AssignmentPayload, BatchResult, Conflict, ItemError, ItemRef};
use crate::error::GatewayError;
use crate::operators::gateway::{detail_text, flatten_error_body};

/// Sends a batch of assignments.
#[async_trait]
pub trait AssignmentBatchSubmitter: Send + Sync {
    /// Submit every assignment in one call. Never mutates local state.
    async fn submit(&self, batch: &[Assignment]) -> BatchResult;
}

/// Build the JSON request body for a batch.
pub fn build_payload(batch: &[Assignment]) -> Vec<AssignmentPayload> {
    batch.iter().map(AssignmentPayload::from).collect()
}

/// Map an HTTP status and body onto a [`BatchResult`].
///
/// `sent` is the batch that was submitted; it is used to resolve which
/// assignments the server reports as created.
pub fn classify(status: u16, body: &str, sent: &[Assignment]) -> BatchResult {
    match status {
        207 => parse_partial(body, sent),
        200..=299 => BatchResult::Success,
        400 => parse_validation(body),
        _ => BatchResult::Fatal {
            cause: flatten_error_body(body)
                .unwrap_or_else(|| format!("Server responded with status {status}")),
        },
    }
}

fn parse_partial(body: &str, sent: &[Assignment]) -> BatchResult {
    let value: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => {
            return BatchResult::Fatal {
                cause: format!("Unreadable partial-success response: {e}"),
            };
        }
    };
    let data = &value["data"];
    let Some(raw_conflicts) = data["conflicts"].as_array() else {
        return BatchResult::Fatal {
            cause: "Partial-success response has no conflicts list".into(),
        };
    };

    // A conflict without a readable operator would read as created.
    let conflicts: Option<Vec<Conflict>> = raw_conflicts
        .iter()
        .map(|c| {
            let operator_id = id_of(&c["operator_id"]).or_else(|| id_of(&c["operator"]))?;
            let message = detail_text(&c["message"]).unwrap_or_default();
            Some(Conflict {
                operator_id,
                message,
            })
        })
        .collect();
    let Some(conflicts) = conflicts else {
        return BatchResult::Fatal {
            cause: "Partial-success response has a conflict without an operator id".into(),
        };
    };

    let created = match data["created"].as_array() {
        Some(items) => {
            let ids: Vec<i64> = items
                .iter()
                .filter_map(|c| id_of(&c["operator"]).or_else(|| id_of(&c["operator_id"])))
                .collect();
            sent.iter()
                .filter(|a| ids.contains(&a.operator_id))
                .cloned()
                .collect()
        }
        None => sent
            .iter()
            .filter(|a| !conflicts.iter().any(|c| c.operator_id == a.operator_id))
            .cloned()
            .collect(),
    };

    BatchResult::PartialSuccess {
        created,
        conflicts,
        message: value["messUser"].as_str().map(String::from),
    }
}

fn parse_validation(body: &str) -> BatchResult {
    let value: Value = serde_json::from_str(body).unwrap_or(Value::Null);
    let message = value["messUser"]
        .as_str()
        .map(String::from)
        .or_else(|| flatten_error_body(body).filter(|_| !value.is_object()));

    let errors = value["data"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .map(|item| {
                    let index = item["index"].as_u64().and_then(|i| usize::try_from(i).ok());
                    let target = match (id_of(&item["operator_id"]), index) {
                        (Some(id), _) => ItemRef::Operator(id),
                        (None, Some(i)) => ItemRef::Index(i),
                        (None, None) => ItemRef::Unknown,
                    };
                    let message = detail_text(&item["message"])
                        .or_else(|| detail_text(&item["errors"]))
                        .unwrap_or_else(|| "Invalid assignment".to_string());
                    ItemError {
                        item: target,
                        message,
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    BatchResult::ValidationFailure { errors, message }
}

/// Read an id that may be a number, a numeric string, or an object with `id`.
fn id_of(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Object(map) => map.get("id").and_then(id_of),
        _ => None,
    }
}

/// reqwest-backed [`AssignmentBatchSubmitter`].
pub struct HttpBatchSubmitter {
    client: reqwest::Client,
    url: String,
    token: Option<SecretString>,
}

impl HttpBatchSubmitter {
    /// Fails if the HTTP client cannot be built with `timeout`.
    pub fn new(
        base_url: &str,
        token: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: format!("{}/assignments/batch/", base_url.trim_end_matches('/')),
            token,
        })
    }
}

#[async_trait]
impl AssignmentBatchSubmitter for HttpBatchSubmitter {
    async fn submit(&self, batch: &[Assignment]) -> BatchResult {
        let payload = build_payload(batch);
        let mut request = self.client.post(&self.url).json(&payload);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let resp = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "Assignment batch request failed");
                return BatchResult::Fatal {
                    cause: e.to_string(),
                };
            }
        };
        let status = resp.status().as_u16();
        let body = match resp.text().await {
            Ok(b) => b,
            Err(e) => {
                return BatchResult::Fatal {
                    cause: e.to_string(),
                };
            }
        };

        let result = classify(status, &body, batch);
        info!(status, size = batch.len(), outcome = result.kind(), "Assignment batch submitted");
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignments::model::Role;

    fn batch() -> Vec<Assignment> {
        vec![
            Assignment::new(5, 10, Role::Driver).with_truck(1),
            Assignment::new(7, 10, Role::Operator),
            Assignment::new(9, 10, Role::TeamLeader),
        ]
    }

    #[test]
    fn two_hundreds_are_success() {
        assert_eq!(classify(200, "", &batch()), BatchResult::Success);
        assert_eq!(classify(201, "{}", &batch()), BatchResult::Success);
        assert_eq!(classify(204, "", &batch()), BatchResult::Success);
    }

    #[test]
    fn multi_status_is_partial_success() {
        let body = r#"{
            "messUser": "Some operators could not be assigned",
            "data": {
                "created": [{"id": 1, "operator": 5}, {"id": 2, "operator": {"id": 9}}],
                "conflicts": [{"operator_id": 7, "message": "Already assigned on this date"}]
            }
        }"#;
        match classify(207, body, &batch()) {
            BatchResult::PartialSuccess {
                created,
                conflicts,
                message,
            } => {
                assert_eq!(
                    created.iter().map(|a| a.operator_id).collect::<Vec<_>>(),
                    vec![5, 9]
                );
                assert_eq!(
                    conflicts,
                    vec![Conflict {
                        operator_id: 7,
                        message: "Already assigned on this date".into()
                    }]
                );
                assert_eq!(message.as_deref(), Some("Some operators could not be assigned"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn partial_without_created_infers_from_conflicts() {
        let body = r#"{"data": {"conflicts": [{"operator_id": "9", "message": "busy"}]}}"#;
        match classify(207, body, &batch()) {
            BatchResult::PartialSuccess { created, conflicts, .. } => {
                assert_eq!(
                    created.iter().map(|a| a.operator_id).collect::<Vec<_>>(),
                    vec![5, 7]
                );
                assert_eq!(conflicts[0].operator_id, 9);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn malformed_partial_is_fatal() {
        assert!(matches!(classify(207, "oops", &batch()), BatchResult::Fatal { .. }));
        assert!(matches!(
            classify(207, r#"{"data": {}}"#, &batch()),
            BatchResult::Fatal { .. }
        ));
    }

    #[test]
    fn conflict_without_operator_is_fatal() {
        let body = r#"{"data": {
            "created": [{"operator": 5}],
            "conflicts": [{"operator_id": null, "message": "busy"}]
        }}"#;
        let sent = &batch()[..2];
        let result = classify(207, body, sent);
        assert!(matches!(result, BatchResult::Fatal { .. }), "{result:?}");
        // Nothing leaves the pending list on a fatal result.
        assert_eq!(crate::assignments::reconciler::reconcile(sent, &result), sent.to_vec());
    }

    #[test]
    fn oversized_index_does_not_panic() {
        let body = r#"{"data": [{"index": 18446744073709551615, "message": "Bad row"}]}"#;
        let result = classify(400, body, &batch());
        match &result {
            BatchResult::ValidationFailure { errors, .. } => {
                assert!(matches!(
                    errors[0].item,
                    ItemRef::Index(usize::MAX) | ItemRef::Unknown
                ));
            }
            other => panic!("unexpected {other:?}"),
        }
        let text = crate::assignments::reconciler::summarize(&result, &batch());
        assert!(text.ends_with(": Bad row"), "{text}");
    }

    #[test]
    fn bad_request_is_validation_failure() {
        let body = r#"{
            "messUser": "Invalid assignments",
            "data": [
                {"operator_id": 7, "message": "Truck required for drivers"},
                {"index": 2, "errors": {"rol": ["Invalid role"]}},
                {"errors": ["Order is closed"]}
            ]
        }"#;
        match classify(400, body, &batch()) {
            BatchResult::ValidationFailure { errors, message } => {
                assert_eq!(message.as_deref(), Some("Invalid assignments"));
                assert_eq!(
                    errors,
                    vec![
                        ItemError {
                            item: ItemRef::Operator(7),
                            message: "Truck required for drivers".into()
                        },
                        ItemError {
                            item: ItemRef::Index(2),
                            message: "rol: Invalid role".into()
                        },
                        ItemError {
                            item: ItemRef::Unknown,
                            message: "Order is closed".into()
                        },
                    ]
                );
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn bad_request_without_items() {
        match classify(400, "Bad Request", &batch()) {
            BatchResult::ValidationFailure { errors, message } => {
                assert!(errors.is_empty());
                assert_eq!(message.as_deref(), Some("Bad Request"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn other_statuses_are_fatal() {
        for status in [401, 404, 409, 500, 502] {
            assert!(
                matches!(classify(status, "", &batch()), BatchResult::Fatal { .. }),
                "{status}"
            );
        }
        match classify(500, r#"{"messUser": "Database unavailable"}"#, &batch()) {
            BatchResult::Fatal { cause } => assert_eq!(cause, "Database unavailable"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn client_builds_with_timeout() {
        let submitter =
            HttpBatchSubmitter::new("https://api.test/v1/", None, Duration::from_secs(3)).unwrap();
        assert_eq!(submitter.url, "https://api.test/v1/assignments/batch/");
    }

    #[test]
    fn payload_has_one_element_per_assignment() {
        let payload = build_payload(&batch());
        assert_eq!(payload.len(), 3);
        assert_eq!(payload[0].operator, 5);
        assert_eq!(payload[0].truck, Some(1));
        assert_eq!(payload[1].truck, None);
    }
}
