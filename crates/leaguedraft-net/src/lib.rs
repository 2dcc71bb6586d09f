// Network adapters for the draft room: the REST collaborator and the
// push-channel client.

pub mod http;
pub mod push;

pub use http::HttpDraftApi;
pub use push::{subscribe, PushHandle};
