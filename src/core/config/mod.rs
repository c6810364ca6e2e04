pub mod data;
pub mod defaults;
pub mod gateway;
pub mod io;
pub mod printing;

pub use data::{Config, ProviderDescriptor, ProviderKind};
pub use gateway::{CredentialSource, EnvCredentials, GatewayConfig};
pub use io::ConfigError;
