//! The bootstrap registry shipped inside the client

use std::sync::OnceLock;

use include_dir::{include_dir, Dir};

use super::{EmbeddedRegistry, RegistryRef, RegistryRefConfig};

pub const BOOTSTRAP_NAME: &str = "Iglu Client Embedded";

static BUNDLED: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/assets/iglu-client-embedded");

/// Process-wide embedded registry holding the resolver's own schemas.
/// Built on first use and read-only afterwards.
pub fn bootstrap() -> &'static RegistryRef {
    static REGISTRY: OnceLock<RegistryRef> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let config = RegistryRefConfig::new(BOOTSTRAP_NAME, 0, Vec::new());
        RegistryRef::Embedded(EmbeddedRegistry::from_bundled(config, &BUNDLED))
    })
}
