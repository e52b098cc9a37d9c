//! Cache orchestration services for the application layer.

pub mod coherence_subscriber;
pub mod record_registrar;
pub mod redirect_resolver;
pub mod stampede_guard;

pub use coherence_subscriber::{CoherenceSubscriber, WarmOutcome, spawn_coherence_subscriber};
pub use record_registrar::{RecordRegistrar, RegisterError};
pub use redirect_resolver::{RedirectResolver, Resolution, ResolveError};
pub use stampede_guard::{GuardError, GuardSettings, StampedeGuard};
