use crate::error::Error;
use domain::{
    channel::Channel,
    notification::{AdHocNotification, NewNotification},
    priority::Priority,
    template::Bindings,
    variant::Variant,
    Id, ReadState,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct IndexParams {
    /// Which notifications to list: `all`, `read` or `unread`
    #[serde(default)]
    #[param(value_type = Option<String>, example = "unread")]
    pub(crate) read: ReadState,
    /// Maximum number of rows; capped by the server's configured limit
    pub(crate) limit: Option<u64>,
}

/// Body of `PATCH /notifications/{id}`; the only supported action is `mark-read`.
#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct UpdateParams {
    #[schema(example = "mark-read")]
    pub(crate) action: String,
}

pub(crate) const MARK_READ: &str = "mark-read";

/// Body of `POST /notifications`. Name a `template` with its `bindings`, or
/// supply the display fields directly.
#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct CreateParams {
    #[schema(value_type = Vec<Uuid>)]
    pub(crate) recipient_ids: Vec<Id>,
    pub(crate) template: Option<String>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub(crate) bindings: Bindings,
    pub(crate) title: Option<String>,
    pub(crate) body: Option<String>,
    #[serde(default)]
    pub(crate) variant: Variant,
    #[serde(default)]
    pub(crate) priority: Priority,
    #[serde(default)]
    pub(crate) persistent: bool,
    #[serde(default)]
    pub(crate) channel: Channel,
}

impl CreateParams {
    pub(crate) fn into_new_notification(self) -> Result<(Vec<Id>, NewNotification), Error> {
        if self.recipient_ids.is_empty() {
            return Err(Error::bad_request("no recipient_ids given"));
        }

        let new_notification = match (self.template, self.title) {
            (Some(name), _) => NewNotification::FromTemplate {
                name,
                bindings: self.bindings,
            },
            (None, Some(title)) => NewNotification::AdHoc(AdHocNotification {
                title,
                body: self.body,
                variant: self.variant,
                priority: self.priority,
                persistent: self.persistent,
                channel: self.channel,
            }),
            (None, None) => return Err(Error::bad_request("neither template nor title given")),
        };

        Ok((self.recipient_ids, new_notification))
    }
}
