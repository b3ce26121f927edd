//! Named notification templates and `{{ placeholder }}` rendering.
//!
//! A template declares the placeholders it expects in `variables`. Rendering
//! substitutes every `{{ name }}` token in the title and description with the
//! caller's binding for that name. String bindings are inserted verbatim and
//! any other JSON value is inserted as its JSON text. Bindings the template
//! never references are ignored.

use crate::error::{EntityErrorKind, Error, TemplateErrorKind};
use crate::{channel::Channel, notification_templates, priority::Priority, variant::Variant, Id};
use entity_api::store::NotificationStore;
use log::*;
use regex::{Captures, Regex};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Values supplied for a template's placeholders, keyed by placeholder name.
pub type Bindings = HashMap<String, Value>;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_.]+)\s*\}\}").expect("placeholder pattern is valid")
});

/// The display fields of a notification produced from a template, ready to be persisted.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RenderedNotification {
    pub template_id: Option<Id>,
    pub title: String,
    pub body: Option<String>,
    pub variant: Variant,
    pub priority: Priority,
    pub persistent: bool,
    pub channel: Channel,
}

/// Distinct placeholder names in `text`, in order of first appearance.
pub fn placeholders(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for captures in PLACEHOLDER.captures_iter(text) {
        let name = &captures[1];
        if !names.iter().any(|n| n == name) {
            names.push(name.to_owned());
        }
    }
    names
}

fn referenced_placeholders(template: &notification_templates::Model) -> Vec<String> {
    let mut names = placeholders(&template.title);
    if let Some(description) = &template.description {
        for name in placeholders(description) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}

/// Checks that a template is well formed before it is stored: it has a name
/// and every placeholder in its text is one of its declared variables.
pub fn validate(template: &notification_templates::Model) -> Result<(), Error> {
    if template.name.trim().is_empty() || template.title.trim().is_empty() {
        return Err(Error::entity(EntityErrorKind::Invalid));
    }

    if let Some(undeclared) = referenced_placeholders(template)
        .into_iter()
        .find(|name| !template.variables.contains(name))
    {
        return Err(Error::template(TemplateErrorKind::UndeclaredPlaceholder(
            undeclared,
        )));
    }

    Ok(())
}

fn binding_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn substitute(text: &str, bindings: &Bindings) -> String {
    PLACEHOLDER
        .replace_all(text, |captures: &Captures| {
            bindings
                .get(&captures[1])
                .map(binding_text)
                .unwrap_or_default()
        })
        .into_owned()
}

/// Renders an already loaded template. Every declared variable and every
/// placeholder found in the text must have a non-null binding.
pub fn render_template(
    template: &notification_templates::Model,
    bindings: &Bindings,
) -> Result<RenderedNotification, Error> {
    let required = template
        .variables
        .iter()
        .cloned()
        .chain(referenced_placeholders(template));

    for name in required {
        match bindings.get(&name) {
            Some(value) if !value.is_null() => {}
            _ => {
                debug!(
                    "Template \"{}\" is missing a binding for \"{}\"",
                    template.name, name
                );
                return Err(Error::template(TemplateErrorKind::MissingVariable(name)));
            }
        }
    }

    Ok(RenderedNotification {
        template_id: Some(template.id),
        title: substitute(&template.title, bindings),
        body: template
            .description
            .as_deref()
            .map(|description| substitute(description, bindings)),
        variant: template.variant,
        priority: template.priority,
        persistent: template.persistent,
        channel: template.channel,
    })
}

/// Looks up the active template called `name` and renders it with `bindings`.
pub async fn render(
    store: &dyn NotificationStore,
    name: &str,
    bindings: &Bindings,
) -> Result<RenderedNotification, Error> {
    match store.find_template_by_name(name).await? {
        Some(template) if template.active => render_template(&template, bindings),
        _ => {
            warn!("No active notification template named \"{name}\"");
            Err(Error::template(TemplateErrorKind::NotFound(name.to_owned())))
        }
    }
}

pub async fn create(
    store: &dyn NotificationStore,
    template: notification_templates::Model,
) -> Result<notification_templates::Model, Error> {
    validate(&template)?;
    Ok(store.insert_template(template).await?)
}

pub async fn update(
    store: &dyn NotificationStore,
    id: Id,
    template: notification_templates::Model,
) -> Result<notification_templates::Model, Error> {
    validate(&template)?;
    Ok(store.update_template(id, template).await?)
}

pub async fn find_by_id(
    store: &dyn NotificationStore,
    id: Id,
) -> Result<notification_templates::Model, Error> {
    Ok(store.find_template(id).await?)
}

pub async fn find_all(
    store: &dyn NotificationStore,
    active_only: bool,
) -> Result<Vec<notification_templates::Model>, Error> {
    Ok(store.find_templates(active_only).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DomainErrorKind, InternalErrorKind};
    use entity_api::memory::MemoryStore;
    use serde_json::json;

    fn template(name: &str, title: &str, variables: &[&str]) -> notification_templates::Model {
        notification_templates::Model {
            id: Id::nil(),
            name: name.to_owned(),
            category: "general".to_owned(),
            title: title.to_owned(),
            description: None,
            variant: Variant::Info,
            priority: Priority::Normal,
            persistent: false,
            channel: Channel::InApp,
            variables: variables.iter().map(|v| v.to_string()).collect(),
            active: true,
            created_at: chrono::Utc::now().into(),
            updated_at: chrono::Utc::now().into(),
        }
    }

    fn bindings(value: Value) -> Bindings {
        serde_json::from_value(value).unwrap()
    }

    fn template_error(err: Error) -> TemplateErrorKind {
        match err.error_kind {
            DomainErrorKind::Internal(InternalErrorKind::Template(kind)) => kind,
            other => panic!("expected a template error, got {other:?}"),
        }
    }

    #[test]
    fn placeholders_are_distinct_and_ordered() {
        assert_eq!(
            placeholders("{{ a }} then {{b}} then {{a}} and {{ order.id }}"),
            vec!["a", "b", "order.id"]
        );
    }

    #[test]
    fn render_template_substitutes_strings_and_json_values() {
        let mut t = template("shipped", "Order {{order}} shipped", &["order", "count"]);
        t.description = Some("{{count}} items are on the way to {{ order }}".to_owned());

        let rendered =
            render_template(&t, &bindings(json!({"order": "A-17", "count": 3}))).unwrap();

        assert_eq!(rendered.title, "Order A-17 shipped");
        assert_eq!(
            rendered.body.as_deref(),
            Some("3 items are on the way to A-17")
        );
        assert_eq!(rendered.variant, Variant::Info);
    }

    #[test]
    fn render_template_ignores_extra_bindings() {
        let t = template("welcome", "Hi {{name}}", &["name"]);

        let rendered =
            render_template(&t, &bindings(json!({"name": "Ana", "unused": true}))).unwrap();

        assert_eq!(rendered.title, "Hi Ana");
    }

    #[test]
    fn render_template_rejects_missing_and_null_bindings() {
        let t = template("welcome", "Hi {{name}}", &["name"]);

        let missing = render_template(&t, &Bindings::new()).unwrap_err();
        assert_eq!(
            template_error(missing),
            TemplateErrorKind::MissingVariable("name".to_owned())
        );

        let null = render_template(&t, &bindings(json!({"name": null}))).unwrap_err();
        assert_eq!(
            template_error(null),
            TemplateErrorKind::MissingVariable("name".to_owned())
        );
    }

    #[test]
    fn validate_rejects_undeclared_placeholders() {
        let t = template("welcome", "Hi {{name}} from {{team}}", &["name"]);

        assert_eq!(
            template_error(validate(&t).unwrap_err()),
            TemplateErrorKind::UndeclaredPlaceholder("team".to_owned())
        );
    }

    #[tokio::test]
    async fn render_looks_up_active_templates_by_name() -> Result<(), Error> {
        let store = MemoryStore::new();
        create(&store, template("welcome", "Hi {{name}}", &["name"])).await?;

        let rendered = render(&store, "welcome", &bindings(json!({"name": "Ana"}))).await?;

        assert_eq!(rendered.title, "Hi Ana");
        assert!(rendered.template_id.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn render_treats_unknown_and_inactive_templates_as_not_found() -> Result<(), Error> {
        let store = MemoryStore::new();
        let mut retired = template("retired", "Old news", &[]);
        retired.active = false;
        create(&store, retired).await?;

        let unknown = render(&store, "nope", &Bindings::new()).await.unwrap_err();
        assert_eq!(
            template_error(unknown),
            TemplateErrorKind::NotFound("nope".to_owned())
        );

        let inactive = render(&store, "retired", &Bindings::new())
            .await
            .unwrap_err();
        assert_eq!(
            template_error(inactive),
            TemplateErrorKind::NotFound("retired".to_owned())
        );
        Ok(())
    }

    #[tokio::test]
    async fn create_rejects_duplicate_names() -> Result<(), Error> {
        let store = MemoryStore::new();
        create(&store, template("welcome", "Hi", &[])).await?;

        let err = create(&store, template("welcome", "Hello", &[]))
            .await
            .unwrap_err();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::Invalid))
        );
        Ok(())
    }
}
