use optbridge_jasm::{ClassFile, Method, MethodDescriptor, MethodSignature};
use serde::Serialize;

use crate::bridge::{synthesize, SynthesisContext, SynthesizedBridge};
use crate::classify::{classify, Classification, SynthesisPattern};
use crate::error::{PatchError, Result};
use crate::layout::LibraryLayout;
use crate::variant::Primitive;

/// Type variable that specialised-interface signatures are renamed to, so
/// their own method-level `T` is never mistaken for the contained type.
pub const SPECIALIZED_TYPE_VARIABLE: &str = "U";

/// Interface a declaration was read from. Generic sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Generic,
    Specialized(Primitive),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbstractMethodDeclaration {
    pub origin: Origin,
    pub flags: Vec<String>,
    pub name: String,
    pub descriptor: MethodDescriptor,
    pub signature: Option<MethodSignature>,
    /// Quote character of the `.signature` directive it came from.
    pub signature_quote: Option<char>,
}

impl AbstractMethodDeclaration {
    pub fn from_method(origin: Origin, method: &Method, layout: &LibraryLayout) -> Result<Self> {
        let mut signature = method.parsed_signature()?;
        if origin != Origin::Generic {
            signature = signature
                .map(|sig| sig.rename_type_var(&layout.type_variable, SPECIALIZED_TYPE_VARIABLE))
                .transpose()?;
        }
        Ok(Self {
            origin,
            flags: method.flags.clone(),
            name: method.name.clone(),
            descriptor: method.parsed_descriptor()?,
            signature,
            signature_quote: method.signature().and_then(|sig| sig.quote),
        })
    }

    pub fn arity(&self) -> usize {
        self.descriptor.params.len()
    }

    /// Printed signature, empty when there is none.
    pub fn signature_text(&self) -> String {
        self.signature
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub declaration: AbstractMethodDeclaration,
    pub pattern: SynthesisPattern,
}

/// Every interface method the empty class still has to bridge, in
/// interface order and then declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Reads the abstract methods of the generic interface and the
    /// specialised interfaces. Input order does not matter.
    pub fn collect<'a>(
        interfaces: impl IntoIterator<Item = &'a ClassFile>,
        layout: &LibraryLayout,
    ) -> Result<Self> {
        let mut classes = interfaces
            .into_iter()
            .map(|class| -> Result<_> { Ok((origin_of(class, layout)?, class)) })
            .collect::<Result<Vec<_>>>()?;
        classes.sort_by_key(|(origin, _)| *origin);

        let mut entries = Vec::new();
        for (origin, class) in classes {
            let before = entries.len();
            for method in class.methods().filter(|m| m.is_abstract()) {
                let declaration = AbstractMethodDeclaration::from_method(origin, method, layout)?;
                match classify(&declaration, layout)? {
                    Classification::NoBridge => {
                        tracing::trace!(
                            method = %declaration.name,
                            descriptor = %declaration.descriptor,
                            "erasure already matches"
                        );
                    }
                    Classification::Bridge(pattern) => {
                        entries.push(CatalogEntry {
                            declaration,
                            pattern,
                        })
                    }
                }
            }
            tracing::debug!(
                ?origin,
                bridged = entries.len() - before,
                "collected interface methods"
            );
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bridges for every entry, in catalog order.
    pub fn synthesize(&self, ctx: &SynthesisContext<'_>) -> Result<Vec<SynthesizedBridge>> {
        let mut bridges = Vec::new();
        for entry in &self.entries {
            bridges.extend(synthesize(&entry.declaration, entry.pattern, ctx)?);
        }
        Ok(bridges)
    }
}

fn origin_of(class: &ClassFile, layout: &LibraryLayout) -> Result<Origin> {
    let name = class
        .this_class()
        .ok_or_else(|| PatchError::location("<unknown>", "missing .class directive"))?;
    if name == layout.base_interface_name() {
        return Ok(Origin::Generic);
    }
    layout
        .variant_of_interface(name)
        .map(Origin::Specialized)
        .ok_or_else(|| PatchError::location(name, "not one of the option interfaces"))
}
