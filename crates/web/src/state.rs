use std::sync::Arc;

use lapak_channels::ChannelService;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ChannelService>,
}

impl AppState {
    pub fn new(service: ChannelService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}
