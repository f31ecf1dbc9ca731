pub mod channel;
pub mod media;
pub mod metering;
pub mod session;
pub mod sync;
pub mod token;
