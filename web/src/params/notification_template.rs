use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct IndexParams {
    /// Only list templates that can currently be rendered
    #[serde(default)]
    pub(crate) active: bool,
}
