//! Makes the empty class implement every specialised interface.

use std::collections::HashSet;

use optbridge_jasm::{parse_class_signature, ClassFile, ClassItem, TypeDescriptor};

use crate::bridge::SynthesizedBridge;
use crate::error::{PatchError, Result};
use crate::layout::LibraryLayout;
use crate::variant::Primitive;

/// Adds the specialised interfaces to the empty class's `.implements` list
/// and class signature, then appends `bridges` in the order given.
pub fn patch_empty_variant(
    class: &ClassFile,
    bridges: &[SynthesizedBridge],
    layout: &LibraryLayout,
) -> Result<ClassFile> {
    let class_name = class.this_class().unwrap_or("<unknown>").to_string();
    let missing = |message: String| PatchError::location(&class_name, message);

    let mut declared: HashSet<(&str, &str)> = class
        .methods()
        .map(|m| (m.name.as_str(), m.descriptor.as_str()))
        .collect();
    for bridge in bridges {
        let method = &bridge.method;
        if !declared.insert((method.name.as_str(), method.descriptor.as_str())) {
            return Err(PatchError::DuplicateMethod {
                class: class_name.clone(),
                name: method.name.clone(),
                descriptor: method.descriptor.clone(),
            });
        }
    }

    let interfaces: Vec<String> = Primitive::ALL
        .into_iter()
        .map(|variant| layout.interface(variant))
        .collect();
    if let Some(existing) = class.interfaces().find(|name| interfaces.iter().any(|i| i == name)) {
        return Err(missing(format!("already implements {existing}")));
    }

    let mut patched = class.clone();

    let base = layout.base_interface_name();
    let implements_at = patched
        .items
        .iter()
        .position(|item| matches!(item, ClassItem::Implements(name) if *name == base))
        .ok_or_else(|| missing(format!("does not implement {base}")))?;
    patched.items.splice(
        implements_at + 1..implements_at + 1,
        interfaces.iter().cloned().map(ClassItem::Implements),
    );

    let signature_at = patched
        .signature_index()
        .ok_or_else(|| missing("has no class signature".to_string()))?;
    let Some(ClassItem::Signature(signature)) = patched.items.get(signature_at) else {
        return Err(missing("has no class signature".to_string()));
    };
    let mut parsed = parse_class_signature(&signature.value)?;
    let base_segment = TypeDescriptor::parse(&layout.base_interface_segment())?;
    let segment_at = parsed
        .supertypes
        .position(&base_segment)
        .ok_or_else(|| missing(format!("class signature lacks {base_segment}")))?;
    for (offset, interface) in interfaces.iter().enumerate() {
        parsed
            .supertypes
            .insert(segment_at + 1 + offset, TypeDescriptor::object(interface));
    }
    let signature = ClassItem::Signature(signature.with_value(parsed.to_string()));
    patched.items[signature_at] = signature;

    patched.items.splice(
        signature_at..signature_at,
        bridges.iter().flat_map(|bridge| {
            [
                ClassItem::Raw(String::new()),
                ClassItem::Method(bridge.method.clone()),
            ]
        }),
    );

    tracing::info!(
        class = %class_name,
        interfaces = interfaces.len(),
        bridges = bridges.len(),
        "patched empty variant"
    );
    Ok(patched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use optbridge_jasm::{parse_class, Method};
    use pretty_assertions::assert_eq;

    const NONE: &str = include_str!("../tests/fixtures/None.j");

    fn bridge(name: &str, descriptor: &str) -> SynthesizedBridge {
        SynthesizedBridge {
            method: Method {
                flags: vec!["public".to_string(), "synthetic".to_string()],
                name: name.to_string(),
                descriptor: descriptor.to_string(),
                attributes: Vec::new(),
            },
            variant: None,
            is_bridge: false,
        }
    }

    #[test]
    fn interfaces_follow_the_base_interface() {
        let class = parse_class(NONE).unwrap();
        let patched = patch_empty_variant(&class, &[], &LibraryLayout::default()).unwrap();
        let interfaces: Vec<_> = patched.interfaces().collect();
        assert_eq!(interfaces.len(), 10);
        assert_eq!(interfaces[0], "me/dkleszyk/java/option/Option");
        assert_eq!(interfaces[1], "me/dkleszyk/java/option/BooleanOption");
        assert_eq!(interfaces[8], "me/dkleszyk/java/option/ShortOption");
        assert_eq!(interfaces[9], "java/io/Serializable");
        assert_eq!(
            patched.signature().unwrap().value,
            "<T:Ljava/lang/Object;>Ljava/lang/Object;Lme/dkleszyk/java/option/Option<TT;>;\
Lme/dkleszyk/java/option/BooleanOption;Lme/dkleszyk/java/option/ByteOption;\
Lme/dkleszyk/java/option/CharOption;Lme/dkleszyk/java/option/DoubleOption;\
Lme/dkleszyk/java/option/FloatOption;Lme/dkleszyk/java/option/IntOption;\
Lme/dkleszyk/java/option/LongOption;Lme/dkleszyk/java/option/ShortOption;\
Ljava/io/Serializable;"
        );
        assert_eq!(patched.signature().unwrap().quote, class.signature().unwrap().quote);
    }

    #[test]
    fn bridges_precede_the_class_signature() {
        let class = parse_class(NONE).unwrap();
        let bridges = [bridge("a", "()V"), bridge("b", "()V")];
        let patched = patch_empty_variant(&class, &bridges, &LibraryLayout::default()).unwrap();
        let at = patched.signature_index().unwrap();
        assert_eq!(patched.items[at - 4], ClassItem::Raw(String::new()));
        assert!(matches!(&patched.items[at - 3], ClassItem::Method(m) if m.name == "a"));
        assert!(matches!(&patched.items[at - 1], ClassItem::Method(m) if m.name == "b"));
        assert_eq!(
            patched.items.len(),
            class.items.len() + Primitive::ALL.len() + 2 * bridges.len()
        );
    }

    #[test]
    fn duplicate_bridges_are_rejected() {
        let class = parse_class(NONE).unwrap();
        let layout = LibraryLayout::default();

        let existing = class.methods().find(|m| m.name != "<init>").unwrap();
        let err = patch_empty_variant(
            &class,
            &[bridge(&existing.name, &existing.descriptor)],
            &layout,
        )
        .unwrap_err();
        assert!(matches!(err, PatchError::DuplicateMethod { .. }));

        let twice = [bridge("x", "()V"), bridge("x", "()V")];
        let err = patch_empty_variant(&class, &twice, &layout).unwrap_err();
        assert_eq!(
            err.to_string(),
            "me/dkleszyk/java/option/None: method x()V is already declared"
        );
    }

    #[test]
    fn second_patch_is_rejected() {
        let class = parse_class(NONE).unwrap();
        let layout = LibraryLayout::default();
        let once = patch_empty_variant(&class, &[], &layout).unwrap();
        let err = patch_empty_variant(&once, &[], &layout).unwrap_err();
        assert_eq!(
            err.to_string(),
            "me/dkleszyk/java/option/None: already implements me/dkleszyk/java/option/BooleanOption"
        );
    }
}
