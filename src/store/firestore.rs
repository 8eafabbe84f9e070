//! Firestore REST v1 implementation of [`DocumentStore`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};

use super::{Document, DocumentStore, ExportOperation, Fields, StoreError, Value};
use crate::config::Config;

const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";
const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";
const LIST_PAGE_SIZE: &str = "300";

/// Where the OAuth access token for each call comes from.
#[derive(Debug, Clone)]
enum TokenSource {
    /// Token supplied through configuration.
    Fixed(String),
    /// Fetched from the GCE metadata server on every call.
    MetadataServer,
    /// No token (emulator).
    Anonymous,
}

/// Firestore client speaking the REST/JSON surface through `reqwest`.
pub struct FirestoreStore {
    client: Client,
    base_url: Url,
    /// `projects/{p}/databases/{d}`
    database_root: Vec<String>,
    token_source: TokenSource,
}

impl FirestoreStore {
    /// Build a client from configuration. Every call is bounded by
    /// `config.store_timeout`.
    pub fn new(config: &Config) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(config.store_timeout).build()?;

        let (base_url, token_source) = match &config.firestore_emulator_host {
            Some(host) => (format!("http://{}/v1", host), TokenSource::Anonymous),
            None => {
                let source = match &config.access_token {
                    Some(token) => TokenSource::Fixed(token.clone()),
                    None => TokenSource::MetadataServer,
                };
                (FIRESTORE_BASE_URL.to_string(), source)
            }
        };
        let base_url = Url::parse(&base_url)
            .map_err(|e| StoreError::Decode(format!("invalid base url {}: {}", base_url, e)))?;

        let database_root = vec![
            "projects".to_string(),
            config.gcloud_project_id.clone(),
            "databases".to_string(),
            config.firestore_database_name.clone(),
        ];

        Ok(Self {
            client,
            base_url,
            database_root,
            token_source,
        })
    }

    /// Build `{base}/projects/{p}/databases/{d}/documents/{segments...}`,
    /// percent-encoding each segment.
    fn url(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Decode("base url cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(self.database_root.iter().map(String::as_str))
            .push("documents")
            .extend(segments);
        Ok(url)
    }

    /// Build `{base}/projects/{p}/databases/{d}:{method}`.
    fn database_method_url(&self, method: &str) -> Result<Url, StoreError> {
        let mut segments = self.database_root.clone();
        if let Some(database) = segments.last_mut() {
            database.push(':');
            database.push_str(method);
        }
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Decode("base url cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn access_token(&self) -> Result<Option<String>, StoreError> {
        match &self.token_source {
            TokenSource::Fixed(token) => Ok(Some(token.clone())),
            TokenSource::Anonymous => Ok(None),
            TokenSource::MetadataServer => {
                let response = self
                    .client
                    .get(METADATA_TOKEN_URL)
                    .header("Metadata-Flavor", "Google")
                    .send()
                    .await
                    .map_err(|e| StoreError::Credentials(e.to_string()))?;
                if !response.status().is_success() {
                    return Err(StoreError::Credentials(format!(
                        "metadata server returned {}",
                        response.status()
                    )));
                }
                let token: MetadataToken = response
                    .json()
                    .await
                    .map_err(|e| StoreError::Credentials(e.to_string()))?;
                Ok(Some(token.access_token))
            }
        }
    }

    async fn request(&self, method: Method, url: Url) -> Result<RequestBuilder, StoreError> {
        let builder = self.client.request(method, url);
        Ok(match self.access_token().await? {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    /// Send a request and turn non-success statuses into errors.
    async fn send(&self, request: RequestBuilder, resource: &str) -> Result<Response, StoreError> {
        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(resource.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn send_document(
        &self,
        request: RequestBuilder,
        resource: &str,
    ) -> Result<Document, StoreError> {
        let response = self.send(request, resource).await?;
        let wire: WireDocument = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(wire.into())
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Document, StoreError> {
        let url = self.url(&[collection, id])?;
        let request = self.request(Method::GET, url).await?;
        self.send_document(request, &format!("{}/{}", collection, id))
            .await
    }

    async fn list(
        &self,
        collection: &str,
        order_by: Option<&str>,
    ) -> Result<Vec<Document>, StoreError> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.url(&[collection])?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("pageSize", LIST_PAGE_SIZE);
                if let Some(order_by) = order_by {
                    query.append_pair("orderBy", order_by);
                }
                if let Some(token) = &page_token {
                    query.append_pair("pageToken", token);
                }
            }

            let request = self.request(Method::GET, url).await?;
            let response = self.send(request, collection).await?;
            let page: ListDocumentsResponse = response
                .json()
                .await
                .map_err(|e| StoreError::Decode(e.to_string()))?;

            documents.extend(page.documents.into_iter().map(Document::from));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(documents)
    }

    async fn create(&self, collection: &str, fields: Fields) -> Result<Document, StoreError> {
        let url = self.url(&[collection])?;
        let request = self
            .request(Method::POST, url)
            .await?
            .json(&WireWrite::from(&fields));
        self.send_document(request, collection).await
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<Document, StoreError> {
        // No update mask: the document is replaced as a whole.
        let url = self.url(&[collection, id])?;
        let request = self
            .request(Method::PATCH, url)
            .await?
            .json(&WireWrite::from(&fields));
        self.send_document(request, &format!("{}/{}", collection, id))
            .await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let url = self.url(&[collection, id])?;
        let request = self.request(Method::DELETE, url).await?;
        self.send(request, &format!("{}/{}", collection, id))
            .await?;
        Ok(())
    }

    async fn export(
        &self,
        output_uri_prefix: &str,
        collection_ids: &[&str],
    ) -> Result<ExportOperation, StoreError> {
        let url = self.database_method_url("exportDocuments")?;
        let request = self.request(Method::POST, url).await?.json(&WireExport {
            output_uri_prefix,
            collection_ids,
        });
        let response = self.send(request, "exportDocuments").await?;
        let operation: WireOperation = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        Ok(ExportOperation {
            name: operation.name,
            output_uri_prefix: operation.metadata.output_uri_prefix,
        })
    }
}

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<WireDocument>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireDocument {
    #[serde(default)]
    name: String,
    #[serde(default)]
    fields: BTreeMap<String, WireValue>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireExport<'a> {
    output_uri_prefix: &'a str,
    collection_ids: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct WireOperation {
    name: String,
    #[serde(default)]
    metadata: WireExportMetadata,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireExportMetadata {
    #[serde(default)]
    output_uri_prefix: String,
}

#[derive(Debug, Serialize)]
struct WireWrite {
    fields: BTreeMap<String, WireValue>,
}

/// Firestore's JSON value: exactly one `*Value` key is present. Kinds this
/// service does not use are ignored and surface as [`Value::Unsupported`].
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    string_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    boolean_value: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timestamp_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    array_value: Option<WireArray>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct WireArray {
    #[serde(default)]
    values: Vec<WireValue>,
}

impl From<WireDocument> for Document {
    fn from(wire: WireDocument) -> Self {
        Document {
            name: wire.name,
            fields: wire
                .fields
                .into_iter()
                .map(|(key, value)| (key, value.into()))
                .collect(),
        }
    }
}

impl From<WireValue> for Value {
    fn from(wire: WireValue) -> Self {
        if let Some(s) = wire.string_value {
            Value::String(s)
        } else if let Some(b) = wire.boolean_value {
            Value::Boolean(b)
        } else if let Some(ts) = wire.timestamp_value {
            DateTime::parse_from_rfc3339(&ts)
                .map(|t| Value::Timestamp(t.with_timezone(&Utc)))
                .unwrap_or(Value::Unsupported)
        } else if let Some(array) = wire.array_value {
            Value::Array(array.values.into_iter().map(Value::from).collect())
        } else {
            Value::Unsupported
        }
    }
}

impl From<&Value> for WireValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::String(s) => WireValue {
                string_value: Some(s.clone()),
                ..Default::default()
            },
            Value::Boolean(b) => WireValue {
                boolean_value: Some(*b),
                ..Default::default()
            },
            Value::Timestamp(t) => WireValue {
                timestamp_value: Some(t.to_rfc3339_opts(SecondsFormat::Nanos, true)),
                ..Default::default()
            },
            Value::Array(values) => WireValue {
                array_value: Some(WireArray {
                    values: values.iter().map(WireValue::from).collect(),
                }),
                ..Default::default()
            },
            Value::Unsupported => WireValue::default(),
        }
    }
}

impl From<&Fields> for WireWrite {
    fn from(fields: &Fields) -> Self {
        WireWrite {
            fields: fields
                .iter()
                .map(|(key, value)| (key.clone(), WireValue::from(value)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn store() -> FirestoreStore {
        let mut config = Config::for_tests();
        config.gcloud_project_id = "my-project".to_string();
        config.firestore_database_name = "(default)".to_string();
        FirestoreStore::new(&config).unwrap()
    }

    #[test]
    fn test_url_builds_document_path() {
        let url = store().url(&["web-posts", "abc"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://firestore.googleapis.com/v1/projects/my-project/databases/(default)/documents/web-posts/abc"
        );
    }

    #[test]
    fn test_export_url_targets_database() {
        let url = store().database_method_url("exportDocuments").unwrap();
        assert_eq!(
            url.as_str(),
            "https://firestore.googleapis.com/v1/projects/my-project/databases/(default):exportDocuments"
        );
    }

    #[test]
    fn test_export_body_and_operation() {
        let body = serde_json::to_value(WireExport {
            output_uri_prefix: "gs://bucket",
            collection_ids: &["web-likes", "web-posts"],
        })
        .unwrap();
        assert_eq!(
            body,
            json!({
                "outputUriPrefix": "gs://bucket",
                "collectionIds": ["web-likes", "web-posts"]
            })
        );

        let operation: WireOperation = serde_json::from_value(json!({
            "name": "projects/p/databases/(default)/operations/ASA1",
            "metadata": {
                "@type": "type.googleapis.com/google.firestore.admin.v1.ExportDocumentsMetadata",
                "outputUriPrefix": "gs://bucket/2024-03-01T12:00:00_1234"
            }
        }))
        .unwrap();
        assert_eq!(operation.name, "projects/p/databases/(default)/operations/ASA1");
        assert_eq!(
            operation.metadata.output_uri_prefix,
            "gs://bucket/2024-03-01T12:00:00_1234"
        );
    }

    #[test]
    fn test_url_encodes_segments() {
        let url = store().url(&["web-posts", "a b?c"]).unwrap();
        assert!(url.as_str().ends_with("/web-posts/a%20b%3Fc"));
    }

    #[test]
    fn test_emulator_host_switches_base_url() {
        let mut config = Config::for_tests();
        config.firestore_emulator_host = Some("localhost:8681".to_string());
        let store = FirestoreStore::new(&config).unwrap();
        assert!(matches!(store.token_source, TokenSource::Anonymous));
        assert!(store
            .url(&["web-likes"])
            .unwrap()
            .as_str()
            .starts_with("http://localhost:8681/v1/projects/"));
    }

    #[test]
    fn test_wire_document_decodes_known_kinds() {
        let wire: WireDocument = serde_json::from_value(json!({
            "name": "projects/p/databases/d/documents/web-posts/abc",
            "fields": {
                "title": { "stringValue": "Hello" },
                "draft": { "booleanValue": false },
                "published": { "timestampValue": "2024-03-01T12:00:00.123456Z" },
                "tags": { "arrayValue": { "values": [{ "stringValue": "a" }, { "stringValue": "b" }] } },
                "views": { "integerValue": "12" },
                "empty": { "arrayValue": {} }
            },
            "createTime": "2024-03-01T12:00:00Z"
        }))
        .unwrap();

        let doc = Document::from(wire);
        assert_eq!(doc.fields["title"], Value::String("Hello".to_string()));
        assert_eq!(doc.fields["draft"], Value::Boolean(false));
        assert_eq!(
            doc.fields["published"].as_timestamp().unwrap().timestamp(),
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap().timestamp()
        );
        assert_eq!(
            doc.fields["tags"],
            Value::Array(vec![Value::String("a".into()), Value::String("b".into())])
        );
        assert_eq!(doc.fields["views"], Value::Unsupported);
        assert_eq!(doc.fields["empty"], Value::Array(vec![]));
    }

    #[test]
    fn test_wire_write_encodes_one_kind_per_value() {
        let mut fields = Fields::new();
        fields.insert("listed".to_string(), Value::Boolean(true));
        fields.insert(
            "published".to_string(),
            Value::Timestamp(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()),
        );
        fields.insert(
            "tags".to_string(),
            Value::Array(vec![Value::String("rust".into())]),
        );

        let body = serde_json::to_value(WireWrite::from(&fields)).unwrap();
        assert_eq!(
            body,
            json!({
                "fields": {
                    "listed": { "booleanValue": true },
                    "published": { "timestampValue": "2024-03-01T12:00:00.000000000Z" },
                    "tags": { "arrayValue": { "values": [{ "stringValue": "rust" }] } }
                }
            })
        );
    }
}
