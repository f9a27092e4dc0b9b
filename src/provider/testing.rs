//! Scripted provider for unit tests

use super::{Provider, ProviderError};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;

struct Rule {
    path: String,
    params: Vec<(String, String)>,
    reply: Result<Value, ProviderError>,
}

/// Provider answering from a list of rules
///
/// The first rule whose path matches and whose params are all present in the
/// request wins. Unmatched requests get an empty `response` array.
#[derive(Default)]
pub struct ScriptedProvider {
    rules: Vec<Rule>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, path: &str, params: &[(&str, &str)], response: Value) -> Self {
        self.rules.push(Rule {
            path: path.to_string(),
            params: to_owned(params),
            reply: Ok(response),
        });
        self
    }

    pub fn fail(mut self, path: &str, params: &[(&str, &str)], err: ProviderError) -> Self {
        self.rules.push(Rule {
            path: path.to_string(),
            params: to_owned(params),
            reply: Err(err),
        });
        self
    }

    /// Requests seen so far, rendered as `path?k=v&k=v`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }
}

fn to_owned(params: &[(&str, &str)]) -> Vec<(String, String)> {
    params
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn envelope(items: Vec<Value>) -> Value {
    serde_json::json!({ "errors": [], "results": items.len(), "response": items })
}

pub fn transport_error(url: &str) -> ProviderError {
    ProviderError::Transport {
        url: url.to_string(),
        message: "connection reset".to_string(),
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn get(&self, path: &str, params: &[(&str, String)]) -> Result<Value, ProviderError> {
        let rendered = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        self.calls
            .lock()
            .unwrap()
            .push(format!("{}?{}", path, rendered));

        let rule = self.rules.iter().find(|rule| {
            rule.path == path
                && rule
                    .params
                    .iter()
                    .all(|(k, v)| params.iter().any(|(pk, pv)| pk == k && pv == v))
        });
        match rule {
            Some(rule) => rule.reply.clone(),
            None => Ok(envelope(Vec::new())),
        }
    }
}
