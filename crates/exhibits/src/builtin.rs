use std::sync::Arc;

use crate::manifest::ExhibitManifest;
use crate::registry::{ExhibitError, ExhibitPreview, ExhibitRegistry};
use crate::unit::ExhibitUnit;
use crate::ExhibitId;

struct BuiltinExhibit {
    id: &'static str,
    title: &'static str,
    teaser: &'static str,
    manifest: &'static str,
    shader: &'static str,
}

const BUILTINS: &[BuiltinExhibit] = &[
    BuiltinExhibit {
        id: "flow-fields",
        title: "Flow Fields",
        teaser: "Particles dancing through invisible currents of curl noise",
        manifest: include_str!("../assets/flow-fields/exhibit.toml"),
        shader: include_str!("../assets/flow-fields/shader.frag"),
    },
    BuiltinExhibit {
        id: "tessellations",
        title: "Tessellations",
        teaser: "Kaleidoscopic geometry folding through infinite symmetry",
        manifest: include_str!("../assets/tessellations/exhibit.toml"),
        shader: include_str!("../assets/tessellations/shader.frag"),
    },
    BuiltinExhibit {
        id: "emergence",
        title: "Emergence",
        teaser: "Life-like agents swarm through noise fields, order from chaos",
        manifest: include_str!("../assets/emergence/exhibit.toml"),
        shader: include_str!("../assets/emergence/shader.frag"),
    },
];

pub(crate) fn registry() -> ExhibitRegistry {
    let mut registry = ExhibitRegistry::new();
    for exhibit in BUILTINS {
        let preview = ExhibitPreview {
            id: ExhibitId::from(exhibit.id),
            title: exhibit.title.to_string(),
            description: exhibit.teaser.to_string(),
            coming_soon: false,
        };
        registry.register(preview, Arc::new(move || load_embedded(exhibit)));
    }
    registry
}

fn load_embedded(exhibit: &BuiltinExhibit) -> Result<ExhibitUnit, ExhibitError> {
    let id = ExhibitId::from(exhibit.id);
    let manifest = ExhibitManifest::from_toml_str(exhibit.manifest)
        .map_err(|err| ExhibitError::load(&id, format!("manifest parse failed: {err}")))?;
    let mut issues = manifest.validate();
    if manifest.metadata.id != id {
        issues.push(format!("manifest declares id '{}'", manifest.metadata.id));
    }
    if !issues.is_empty() {
        return Err(ExhibitError::load(
            &id,
            format!("manifest validation failed: {}", issues.join("; ")),
        ));
    }
    Ok(manifest.into_unit(exhibit.shader))
}
