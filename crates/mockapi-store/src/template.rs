//! Template rendering for `.template` fixtures
//!
//! Rendering goes through the [`TemplateGateway`] trait so the store never
//! depends on a particular engine. The bundled [`ModelTemplateRenderer`]
//! understands a small directive set:
//!
//! ```text
//! @Model.TemplateName   stem of the fixture being rendered
//! @Model.HttpMethod     method of the inbound request
//! @Model.RequestPath    path of the inbound request
//! @Model.QueryString    query string of the inbound request
//! @Model.RequestBody    body of the inbound request
//! @@                    a literal '@'
//! ```
//!
//! Any other `@Model.` member is a render error. Absent model values render
//! as the empty string.

use mockapi_protocol::TemplateModel;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// `@@` or `@Model.<Member>`
static DIRECTIVE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@@|@Model\.([A-Za-z_][A-Za-z0-9_]*)").expect("Failed to compile directive regex")
});

/// Errors produced while rendering a template
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TemplateError {
    /// Template refers to a model member that does not exist
    #[error("Template {template} refers to unknown member '@Model.{member}'")]
    UnknownMember {
        /// Template being rendered
        template: String,
        /// Offending member name
        member: String,
    },
}

/// Renders template source against a request model
///
/// Implementations must be usable from many requests at once.
pub trait TemplateGateway: Send + Sync {
    /// Render `source` with `model`
    ///
    /// # Errors
    ///
    /// Returns `TemplateError` if the source cannot be rendered.
    fn render(&self, source: &str, model: &TemplateModel) -> Result<String, TemplateError>;
}

/// Default renderer substituting `@Model.*` directives
#[derive(Debug, Default, Clone, Copy)]
pub struct ModelTemplateRenderer;

impl TemplateGateway for ModelTemplateRenderer {
    fn render(&self, source: &str, model: &TemplateModel) -> Result<String, TemplateError> {
        let mut rendered = String::with_capacity(source.len());
        let mut last = 0;

        for caps in DIRECTIVE_PATTERN.captures_iter(source) {
            let Some(whole) = caps.get(0) else { continue };
            rendered.push_str(&source[last..whole.start()]);

            match caps.get(1) {
                None => rendered.push('@'),
                Some(member) => {
                    let value = model_member(model, member.as_str()).ok_or_else(|| {
                        TemplateError::UnknownMember {
                            template: model.template_name.clone().unwrap_or_default(),
                            member: member.as_str().to_string(),
                        }
                    })?;
                    rendered.push_str(value);
                }
            }

            last = whole.end();
        }

        rendered.push_str(&source[last..]);
        Ok(rendered)
    }
}

fn model_member<'a>(model: &'a TemplateModel, member: &str) -> Option<&'a str> {
    let value = match member {
        "TemplateName" => &model.template_name,
        "HttpMethod" => &model.http_method,
        "RequestPath" => &model.request_path,
        "QueryString" => &model.query_string,
        "RequestBody" => &model.request_body,
        _ => return None,
    };
    Some(value.as_deref().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> TemplateModel {
        TemplateModel {
            template_name: Some("get_api_greeting".into()),
            ..TemplateModel::for_request("GET", "/api/Greeting", Some("name=bob"))
        }
    }

    #[test]
    fn test_plain_text_passes_through() {
        let source = r#"{"Id":"CrudTestId","Name":"someone@example.com"}"#;
        assert_eq!(ModelTemplateRenderer.render(source, &model()).unwrap(), source);
    }

    #[test]
    fn test_substitutes_members() {
        let rendered = ModelTemplateRenderer
            .render(
                r#"{"method":"@Model.HttpMethod","path":"@Model.RequestPath","q":"@Model.QueryString","t":"@Model.TemplateName"}"#,
                &model(),
            )
            .unwrap();
        assert_eq!(
            rendered,
            r#"{"method":"GET","path":"/api/Greeting","q":"name=bob","t":"get_api_greeting"}"#
        );
    }

    #[test]
    fn test_absent_member_renders_empty() {
        let rendered = ModelTemplateRenderer
            .render("[@Model.RequestBody]", &model())
            .unwrap();
        assert_eq!(rendered, "[]");

        let rendered = ModelTemplateRenderer
            .render("[@Model.RequestBody]", &model().with_body("hello"))
            .unwrap();
        assert_eq!(rendered, "[hello]");
    }

    #[test]
    fn test_escaped_at() {
        let rendered = ModelTemplateRenderer
            .render("@@Model.HttpMethod", &model())
            .unwrap();
        assert_eq!(rendered, "@Model.HttpMethod");
    }

    #[test]
    fn test_unknown_member_fails() {
        let err = ModelTemplateRenderer
            .render("@Model.Nope", &model())
            .unwrap_err();
        assert_eq!(
            err,
            TemplateError::UnknownMember {
                template: "get_api_greeting".into(),
                member: "Nope".into(),
            }
        );
    }
}
