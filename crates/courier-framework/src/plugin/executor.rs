//! Runs a plugin template against its backend.

use serde_json::{Map, Value, json};
use tracing::debug;
use url::Url;

use courier_core::{HttpBody, HttpFetcher, HttpRequest, HttpResponse, PhotoSource};

use super::render::{display_value, interpolate, interpolate_url, interpolate_value};
use super::template::{
    BodySpec, BodyType, InputSpec, InputType, OutputMapping, OutputType, RequestTemplate,
    ResponseInput,
};
use crate::error::{PluginError, PluginResult};

/// The reply produced by a plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginOutput {
    Text(String),
    Markdown(String),
    Html(String),
    Image(PhotoSource),
}

impl PluginOutput {
    pub fn output_type(&self) -> OutputType {
        match self {
            Self::Text(_) => OutputType::Text,
            Self::Markdown(_) => OutputType::Markdown,
            Self::Html(_) => OutputType::Html,
            Self::Image(_) => OutputType::Image,
        }
    }
}

/// Loads a plugin template: fetched when `raw` is an `http(s)` URL, parsed
/// inline otherwise.
pub async fn resolve_template(raw: &str, fetcher: &dyn HttpFetcher) -> PluginResult<RequestTemplate> {
    let raw = raw.trim();
    if raw.starts_with("http") {
        debug!(url = %raw, "Fetching plugin template");
        let body = fetcher.get_text(raw).await?;
        RequestTemplate::parse(&body)
    } else {
        RequestTemplate::parse(raw)
    }
}

/// Turns the subcommand into the template's `DATA` value.
pub fn format_input(input: &str, options: &InputSpec) -> PluginResult<Value> {
    if options.required && input.is_empty() {
        return Err(PluginError::MissingInput);
    }
    Ok(match options.kind {
        InputType::Text => Value::String(input.to_string()),
        InputType::Json => {
            serde_json::from_str(input).map_err(|e| PluginError::InvalidInput(e.to_string()))?
        }
        InputType::SpaceSeparated => input.split_whitespace().map(|s| json!(s)).collect(),
        InputType::CommaSeparated => input
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| json!(s))
            .collect(),
    })
}

/// Builds the outbound request with `data` (`{DATA, ENV}`) substituted.
pub fn build_request(template: &RequestTemplate, data: &Value) -> PluginResult<HttpRequest> {
    let raw = interpolate_url(&template.url, data)?;
    let mut url = Url::parse(&raw).map_err(|e| PluginError::InvalidUrl(format!("{raw}: {e}")))?;
    if !template.query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in &template.query {
            pairs.append_pair(key, &interpolate(value, data)?);
        }
    }

    let headers = template
        .headers
        .iter()
        .map(|(k, v)| Ok((k.clone(), interpolate(v, data)?)))
        .collect::<PluginResult<Vec<_>>>()?;

    let body = template
        .body
        .as_ref()
        .map(|body| build_body(body, data))
        .transpose()?;

    Ok(HttpRequest {
        method: template.method.to_ascii_uppercase(),
        url: url.into(),
        headers,
        body,
    })
}

fn build_body(body: &BodySpec, data: &Value) -> PluginResult<HttpBody> {
    match body.kind {
        BodyType::Json => Ok(HttpBody::Json(interpolate_value(&body.content, data)?)),
        BodyType::Form => {
            let Value::Object(fields) = &body.content else {
                return Err(PluginError::InvalidTemplate(
                    "form body content must be an object".into(),
                ));
            };
            let pairs = fields
                .iter()
                .map(|(k, v)| {
                    let rendered = match v {
                        Value::String(s) => interpolate(s, data)?,
                        other => display_value(other),
                    };
                    Ok((k.clone(), rendered))
                })
                .collect::<PluginResult<Vec<_>>>()?;
            Ok(HttpBody::Form(pairs))
        }
        BodyType::Text => {
            let content = match &body.content {
                Value::String(s) => s.clone(),
                other => display_value(other),
            };
            Ok(HttpBody::Text(interpolate(&content, data)?))
        }
    }
}

/// Renders a textual response through `mapping`.
fn render_output(mapping: &OutputMapping, response: &HttpResponse) -> PluginResult<String> {
    let decoded = match mapping.input_type {
        ResponseInput::Text => Value::String(response.text()),
        ResponseInput::Json => response.json()?,
        ResponseInput::Blob => return Err(PluginError::InvalidOutputType),
    };
    interpolate(&mapping.output, &decoded)
}

/// Executes `template` with `subcommand` as input and `env` exposed as
/// `ENV`.
pub async fn execute(
    template: &RequestTemplate,
    subcommand: &str,
    env: &Map<String, Value>,
    fetcher: &dyn HttpFetcher,
) -> PluginResult<PluginOutput> {
    let mut root = Map::new();
    root.insert("DATA".into(), format_input(subcommand, &template.input)?);
    root.insert("ENV".into(), Value::Object(env.clone()));
    let data = Value::Object(root);
    let request = build_request(template, &data)?;
    debug!(method = %request.method, url = %request.url, "Calling plugin backend");
    let response = fetcher.fetch(request).await?;

    if !response.is_success() {
        let detail = match &template.response.error {
            Some(mapping) => render_output(mapping, &response)?,
            None => response.text(),
        };
        return Err(PluginError::Status {
            status: response.status,
            detail,
        });
    }

    let mapping = &template.response.content;
    if mapping.input_type == ResponseInput::Blob {
        if mapping.output_type != OutputType::Image {
            return Err(PluginError::InvalidOutputType);
        }
        return Ok(PluginOutput::Image(PhotoSource::Bytes(response.body)));
    }

    let content = render_output(mapping, &response)?;
    Ok(match mapping.output_type {
        OutputType::Text => PluginOutput::Text(content),
        OutputType::Markdown => PluginOutput::Markdown(content),
        OutputType::Html => PluginOutput::Html(content),
        OutputType::Image => PluginOutput::Image(PhotoSource::Url(content)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::CannedFetcher;

    fn options(kind: InputType, required: bool) -> InputSpec {
        InputSpec { kind, required }
    }

    #[test]
    fn test_format_input_kinds() {
        assert_eq!(
            format_input("a  b c", &options(InputType::SpaceSeparated, false)).unwrap(),
            json!(["a", "b", "c"])
        );
        assert_eq!(
            format_input(" a, b ,,c ", &options(InputType::CommaSeparated, false)).unwrap(),
            json!(["a", "b", "c"])
        );
        assert_eq!(
            format_input(r#"{"x": 1}"#, &options(InputType::Json, false)).unwrap(),
            json!({"x": 1})
        );
        assert_eq!(
            format_input("raw text", &options(InputType::Text, false)).unwrap(),
            json!("raw text")
        );
    }

    #[test]
    fn test_format_input_errors() {
        assert!(matches!(
            format_input("", &options(InputType::Text, true)),
            Err(PluginError::MissingInput)
        ));
        assert!(matches!(
            format_input("{bad", &options(InputType::Json, false)),
            Err(PluginError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_build_request_substitutes_data_and_env() {
        let template = RequestTemplate::parse(
            r#"{
                "url": "https://api.test/search/{{DATA}}",
                "method": "post",
                "headers": {"authorization": "Bearer {{ENV.TOKEN}}"},
                "query": {"lang": "{{ENV.LANG}}"},
                "body": {"type": "json", "content": {"q": "{{DATA}}"}}
            }"#,
        )
        .unwrap();
        let data = json!({"DATA": "a b", "ENV": {"TOKEN": "t0k", "LANG": "en us"}});

        let request = build_request(&template, &data).unwrap();
        assert_eq!(request.method, "POST");
        assert_eq!(request.url, "https://api.test/search/a%20b?lang=en+us");
        assert_eq!(
            request.headers,
            vec![("authorization".to_string(), "Bearer t0k".to_string())]
        );
        assert_eq!(request.body, Some(HttpBody::Json(json!({"q": "a b"}))));
    }

    #[test]
    fn test_build_form_body() {
        let template = RequestTemplate::parse(
            r#"{"url": "https://api.test/?x=1", "query": {"y": "2"},
                "body": {"type": "form", "content": {"name": "{{DATA[0]}}", "n": 3}}}"#,
        )
        .unwrap();
        let request = build_request(&template, &json!({"DATA": ["bob"], "ENV": {}})).unwrap();
        assert_eq!(request.url, "https://api.test/?x=1&y=2");
        assert_eq!(
            request.body,
            Some(HttpBody::Form(vec![
                ("n".to_string(), "3".to_string()),
                ("name".to_string(), "bob".to_string()),
            ]))
        );
    }

    #[test]
    fn test_build_request_query_pairs() {
        let template = RequestTemplate::parse(
            r#"{"url": "https://api.test/find#top", "query": {"q": "{{DATA}}", "a b": "1"}}"#,
        )
        .unwrap();
        let request = build_request(&template, &json!({"DATA": "x&y=z", "ENV": {}})).unwrap();
        assert_eq!(request.url, "https://api.test/find?a+b=1&q=x%26y%3Dz#top");
    }

    #[test]
    fn test_build_request_rejects_bad_url() {
        let template = RequestTemplate::parse(r#"{"url": "{{DATA}}/lookup"}"#).unwrap();
        assert!(matches!(
            build_request(&template, &json!({"DATA": "not a url", "ENV": {}})),
            Err(PluginError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_execute_renders_json_response() {
        let fetcher = CannedFetcher::json(200, json!({"answer": 42}));
        let template = RequestTemplate::parse(
            r#"{"url": "https://api.test/",
                "response": {"content": {"input_type": "json", "output_type": "markdown", "output": "*{{answer}}*"}}}"#,
        )
        .unwrap();

        let output = execute(&template, "", &Map::new(), &fetcher).await.unwrap();
        assert_eq!(output, PluginOutput::Markdown("*42*".into()));
        assert_eq!(fetcher.requests()[0].url, "https://api.test/");
    }

    #[tokio::test]
    async fn test_execute_blob_requires_image_output() {
        let fetcher = CannedFetcher::bytes(200, vec![1, 2, 3]);
        let image = RequestTemplate::parse(
            r#"{"url": "https://img.test/", "response": {"content": {"input_type": "blob", "output_type": "image"}}}"#,
        )
        .unwrap();
        assert_eq!(
            execute(&image, "", &Map::new(), &fetcher).await.unwrap(),
            PluginOutput::Image(PhotoSource::Bytes(vec![1, 2, 3]))
        );

        let text = RequestTemplate::parse(
            r#"{"url": "https://img.test/", "response": {"content": {"input_type": "blob", "output_type": "text"}}}"#,
        )
        .unwrap();
        assert!(matches!(
            execute(&text, "", &Map::new(), &fetcher).await,
            Err(PluginError::InvalidOutputType)
        ));
    }

    #[tokio::test]
    async fn test_execute_error_status_uses_error_mapping() {
        let fetcher = CannedFetcher::text(503, "overloaded");
        let template = RequestTemplate::parse(
            r#"{"url": "https://api.test/",
                "response": {"error": {"input_type": "text", "output": "backend said: {{.}}"}}}"#,
        )
        .unwrap();

        let err = execute(&template, "", &Map::new(), &fetcher).await.unwrap_err();
        assert_eq!(err.to_string(), "HTTP 503: backend said: overloaded");
    }

    #[tokio::test]
    async fn test_execute_error_status_without_mapping_uses_body() {
        let fetcher = CannedFetcher::text(404, "nope");
        let template = RequestTemplate::parse(r#"{"url": "https://api.test/"}"#).unwrap();
        let err = execute(&template, "", &Map::new(), &fetcher).await.unwrap_err();
        assert!(matches!(err, PluginError::Status { status: 404, ref detail } if detail == "nope"));
    }

    #[tokio::test]
    async fn test_resolve_template_inline_and_remote() {
        let fetcher = CannedFetcher::text(200, r#"{"url": "https://remote.test/"}"#);
        let remote = resolve_template(" https://templates.test/t.json ", &fetcher)
            .await
            .unwrap();
        assert_eq!(remote.url, "https://remote.test/");
        assert_eq!(fetcher.requests()[0].url, "https://templates.test/t.json");

        let inline = resolve_template(r#"{"url": "https://inline.test/"}"#, &fetcher)
            .await
            .unwrap();
        assert_eq!(inline.url, "https://inline.test/");
        assert_eq!(fetcher.requests().len(), 1);
    }
}
