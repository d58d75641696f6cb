pub mod bootstrap;

pub use bootstrap::{BootstrapService, CancelFlag};
