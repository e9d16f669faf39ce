use std::sync::Arc;

use posts_service::PostService;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<PostService>,
}
impl AppState {
	pub async fn new(config: posts_config::Config) -> color_eyre::Result<Self> {
		let service = PostService::connect(config).await?;

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: PostService) -> Self {
		Self { service: Arc::new(service) }
	}
}
