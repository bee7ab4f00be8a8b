use crate::api::ApiContext;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) api: ApiContext,
    /// Year shown in page titles.
    pub(crate) recap_year: i32,
}
