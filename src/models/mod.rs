pub mod device;
pub mod response;

pub use device::DeviceRecord;
pub use response::Envelope;
