//! Provider selection: parsing `"provider/model"` strings and turning them
//! into adapter instances.

mod registry;
mod selector;

pub use registry::{AdapterFactory, AdapterSettings, ProviderInfo, ProviderKind, ProviderRegistry};
pub use selector::{canonical_provider, ProviderSelector, PROVIDER_ALIASES};
