use server_api::ApiContext;

use crate::cors::OriginAllowList;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) api: ApiContext,
    pub(crate) origins: OriginAllowList,
}
