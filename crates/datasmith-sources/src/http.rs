//! HTTP adapter for `api` and `url` sources.

use async_trait::async_trait;
use indexmap::IndexMap;

use datasmith_config::{AuthDescriptor, AuthType, DataSourceDescriptor};
use datasmith_core::Value;

use crate::{cache_key_for, AdapterError, FetchParams, SourceAdapter};

/// Fetches JSON records over HTTP, applying the descriptor's auth scheme,
/// fixed parameters, and headers.
#[derive(Debug)]
pub struct HttpAdapter {
    client: reqwest::Client,
    endpoint: String,
    auth: Option<AuthDescriptor>,
    parameters: IndexMap<String, String>,
    headers: IndexMap<String, String>,
}

impl HttpAdapter {
    pub fn from_descriptor(descriptor: &DataSourceDescriptor) -> Result<Self, AdapterError> {
        let (endpoint, auth, parameters, headers) = match descriptor {
            DataSourceDescriptor::Api {
                endpoint,
                auth,
                parameters,
                headers,
                ..
            } => (
                endpoint.clone(),
                auth.clone(),
                parameters.clone(),
                headers.clone(),
            ),
            DataSourceDescriptor::Url { url, headers, .. } => {
                (url.clone(), None, IndexMap::new(), headers.clone())
            }
            other => {
                return Err(AdapterError::InvalidConfig(format!(
                    "HttpAdapter cannot serve '{}' sources",
                    other.kind()
                )))
            }
        };
        let endpoint = endpoint.ok_or_else(|| {
            AdapterError::InvalidConfig("http source is missing its endpoint".to_string())
        })?;
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            auth,
            parameters,
            headers,
        })
    }
}

#[async_trait]
impl SourceAdapter for HttpAdapter {
    async fn fetch(&self, params: &FetchParams) -> Result<Value, AdapterError> {
        let mut request = self.client.get(&self.endpoint);

        let mut query: Vec<(&str, &str)> = Vec::new();
        for (k, v) in &self.parameters {
            query.push((k.as_str(), v.as_str()));
        }
        for (k, v) in params {
            query.push((k.as_str(), v.as_str()));
        }

        for (name, value) in &self.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        if let Some(auth) = &self.auth {
            match auth.auth_type {
                AuthType::ApiKey => {
                    let key = auth.api_key.as_deref().unwrap_or_default();
                    if let Some(header) = &auth.key_header {
                        request = request.header(header.as_str(), key);
                    } else if let Some(param) = &auth.key_param {
                        query.push((param.as_str(), key));
                    }
                }
                AuthType::Bearer | AuthType::Oauth2 => {
                    request = request.bearer_auth(auth.token.as_deref().unwrap_or_default());
                }
                AuthType::Basic => {
                    request = request.basic_auth(
                        auth.username.as_deref().unwrap_or_default(),
                        auth.password.as_deref(),
                    );
                }
            }
        }

        let response = request
            .query(&query)
            .send()
            .await
            .map_err(|e| AdapterError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdapterError::Http {
                status: status.as_u16(),
                url: self.endpoint.clone(),
            });
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AdapterError::Parse(e.to_string()))?;

        tracing::debug!(endpoint = %self.endpoint, "fetched http source");
        Ok(Value::from_json(body))
    }

    fn validate_config(&self) -> bool {
        if self.endpoint.is_empty() {
            return false;
        }
        match &self.auth {
            None => true,
            Some(auth) => match auth.auth_type {
                AuthType::ApiKey => {
                    auth.api_key.is_some()
                        && (auth.key_header.is_some() ^ auth.key_param.is_some())
                }
                AuthType::Bearer | AuthType::Oauth2 => auth.token.is_some(),
                AuthType::Basic => auth.username.is_some() && auth.password.is_some(),
            },
        }
    }

    fn cache_key(&self, params: &FetchParams) -> String {
        cache_key_for(&format!("http:{}", self.endpoint), params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datasmith_config::ProjectSpec;

    fn api_descriptor(auth_yaml: &str) -> DataSourceDescriptor {
        let spec = ProjectSpec::load(&format!(
            r#"
project: {{name: t}}
data_sources:
  - type: api
    endpoint: "https://x.test/v1"
{auth_yaml}
examples: [{{input: {{a: 1}}, output: {{b: 1}}}}]
output: [{{format: json}}]
"#
        ))
        .unwrap();
        spec.data_sources.into_iter().next().unwrap()
    }

    #[test]
    fn test_validate_config_api_key_exclusivity() {
        let good = api_descriptor(
            "    auth: {type: api_key, api_key: k, key_header: X-Key}",
        );
        assert!(HttpAdapter::from_descriptor(&good).unwrap().validate_config());

        let both = api_descriptor(
            "    auth: {type: api_key, api_key: k, key_header: X-Key, key_param: key}",
        );
        assert!(!HttpAdapter::from_descriptor(&both).unwrap().validate_config());
    }

    #[test]
    fn test_missing_endpoint_rejected() {
        let spec = ProjectSpec::load(
            r#"
project: {name: t}
data_sources: [{type: api}]
examples: [{input: {a: 1}, output: {b: 1}}]
output: [{format: json}]
"#,
        )
        .unwrap();
        let err = HttpAdapter::from_descriptor(&spec.data_sources[0]).unwrap_err();
        assert!(matches!(err, AdapterError::InvalidConfig(_)));
    }
}
