//! End-to-end patch run over a compiled option library.
//!
//! A run disassembles each class it needs, edits the structural model and
//! assembles the result back over the original class file. The first
//! failure stops the run; classes already written stay written.

#![forbid(unsafe_code)]

use std::fmt;
use std::path::{Path, PathBuf};

use optbridge_config::OptbridgeConfig;
use optbridge_jasm::{parse_class, write_class, ClassFile};
use optbridge_patch::{
    eliminate_cast, patch_empty_variant, Catalog, LibraryLayout, Origin, Primitive,
    SynthesisContext, SynthesisPattern,
};
use serde::Serialize;

mod error;
mod source;
mod toolchain;

pub use crate::error::DriverError;
pub use crate::source::source_line;
pub use crate::toolchain::{KrakatauToolchain, Toolchain};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CastReport {
    pub class: String,
    pub written: Vec<PathBuf>,
}

/// One catalog entry in printable form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogLine {
    pub origin: Origin,
    pub name: String,
    pub descriptor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    pub pattern: SynthesisPattern,
}

impl CatalogLine {
    pub fn from_catalog(catalog: &Catalog) -> Vec<Self> {
        catalog
            .entries()
            .iter()
            .map(|entry| {
                let decl = &entry.declaration;
                CatalogLine {
                    origin: decl.origin,
                    name: decl.name.clone(),
                    descriptor: decl.descriptor.to_string(),
                    signature: decl.signature.as_ref().map(ToString::to_string),
                    pattern: entry.pattern,
                }
            })
            .collect()
    }
}

impl fmt::Display for CatalogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let origin = match self.origin {
            Origin::Generic => "generic",
            Origin::Specialized(p) => p.lower_name(),
        };
        write!(f, "{origin:<8} {}{} -> {:?}", self.name, self.descriptor, self.pattern)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmptyVariantReport {
    pub class: String,
    pub source_line: u32,
    pub interfaces_added: usize,
    pub bridges: usize,
    /// Bridges carrying `ACC_BRIDGE`.
    pub covariant_bridges: usize,
    pub written: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchReport {
    pub cast_eliminations: Vec<CastReport>,
    pub catalog: Vec<CatalogLine>,
    pub empty_variant: EmptyVariantReport,
}

impl fmt::Display for PatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cast in &self.cast_eliminations {
            writeln!(f, "eliminated cast in {}", cast.class)?;
        }
        let empty = &self.empty_variant;
        write!(
            f,
            "patched {}: {} interfaces, {} bridges ({} covariant) from {} declarations, line {}",
            empty.class,
            empty.interfaces_added,
            empty.bridges,
            empty.covariant_bridges,
            self.catalog.len(),
            empty.source_line
        )
    }
}

/// Both patch jobs over one library.
#[derive(Debug)]
pub struct Patcher<T> {
    toolchain: T,
    layout: LibraryLayout,
    sources: PathBuf,
}

impl Patcher<KrakatauToolchain> {
    /// Paths in `config` should already be resolved.
    pub fn from_config(config: &OptbridgeConfig, cwd: &Path) -> Result<Self, DriverError> {
        Ok(Self::new(
            KrakatauToolchain::from_config(config, cwd)?,
            config.library.clone(),
            config.paths.sources.clone(),
        ))
    }
}

impl<T: Toolchain> Patcher<T> {
    pub fn new(toolchain: T, layout: LibraryLayout, sources: PathBuf) -> Self {
        Self {
            toolchain,
            layout,
            sources,
        }
    }

    pub fn toolchain(&self) -> &T {
        &self.toolchain
    }

    pub fn run(&self) -> Result<PatchReport, DriverError> {
        let cast_eliminations = Primitive::ALL
            .into_iter()
            .map(|variant| self.eliminate_cast(&self.layout.some_class(variant)))
            .collect::<Result<Vec<_>, _>>()?;

        let catalog = self.collect_catalog()?;
        let empty_variant = self.patch_empty_variant(&catalog)?;

        Ok(PatchReport {
            cast_eliminations,
            catalog: CatalogLine::from_catalog(&catalog),
            empty_variant,
        })
    }

    fn load(&self, class: &str) -> Result<ClassFile, DriverError> {
        let text = self.toolchain.disassemble(class)?;
        parse_class(&text).map_err(|err| DriverError::patch(class, err))
    }

    fn eliminate_cast(&self, class: &str) -> Result<CastReport, DriverError> {
        let _span = tracing::info_span!("eliminate_cast", class).entered();
        let parsed = self.load(class)?;
        let patched = eliminate_cast(&parsed, &self.layout.cast_method)
            .map_err(|err| DriverError::patch(class, err))?;
        let written = self.toolchain.assemble(class, &write_class(&patched))?;
        Ok(CastReport {
            class: class.to_string(),
            written,
        })
    }

    fn collect_catalog(&self) -> Result<Catalog, DriverError> {
        let _span = tracing::info_span!("catalog").entered();
        let names: Vec<String> = std::iter::once(self.layout.base_interface_name())
            .chain(Primitive::ALL.into_iter().map(|p| self.layout.interface(p)))
            .collect();
        let interfaces = names
            .iter()
            .map(|name| self.load(name))
            .collect::<Result<Vec<_>, _>>()?;
        let catalog = Catalog::collect(&interfaces, &self.layout)
            .map_err(|err| DriverError::patch(&self.layout.base_interface_name(), err))?;
        tracing::info!(declarations = catalog.len(), "collected bridge declarations");
        Ok(catalog)
    }

    fn patch_empty_variant(&self, catalog: &Catalog) -> Result<EmptyVariantReport, DriverError> {
        let class = self.layout.empty_class_name();
        let _span = tracing::info_span!("patch_empty_variant", class = %class).entered();

        let line = source_line(&self.sources, &self.layout)?;
        let bridges = catalog
            .synthesize(&SynthesisContext {
                layout: &self.layout,
                line,
            })
            .map_err(|err| DriverError::patch(&class, err))?;

        let parsed = self.load(&class)?;
        let patched = patch_empty_variant(&parsed, &bridges, &self.layout)
            .map_err(|err| DriverError::patch(&class, err))?;
        let interfaces_added = patched.interfaces().count() - parsed.interfaces().count();
        let written = self.toolchain.assemble(&class, &write_class(&patched))?;

        Ok(EmptyVariantReport {
            class,
            source_line: line,
            interfaces_added,
            bridges: bridges.len(),
            covariant_bridges: bridges.iter().filter(|b| b.is_bridge).count(),
            written,
        })
    }
}
