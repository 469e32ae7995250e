pub mod gauth;
pub mod push;
pub mod store;

pub use gauth::{TokenError, TokenSource};
pub use push::{FcmProvider, MockPushProvider, ProviderError, PushMessage, PushProvider};
pub use store::{DeviceStore, MemoryDeviceStore, RtdbStore, StoreError};
