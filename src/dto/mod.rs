pub mod requests;
pub mod responses;

pub use requests::{
    CreatePostRequest, CredentialsRequest, LoginRequest, WebhookData, WebhookRequest,
};
pub use responses::{AuthResponse, TokenResponse};
