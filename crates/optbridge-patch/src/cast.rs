//! Removes the argument cast from a `Some` class's erased bridge.
//!
//! The compiler's bridge for `orElse(T)` casts its argument to the boxed
//! type before delegating, which throws for any caller that passes a
//! different object through the raw interface. The bridge gets a copy of
//! the specialised implementation's body instead, which returns the held
//! value and never touches the argument.

use optbridge_jasm::{parse_method_descriptor, ClassFile, ClassItem, Method};

use crate::error::{PatchError, Result};

pub fn eliminate_cast(class: &ClassFile, method_name: &str) -> Result<ClassFile> {
    let class_name = class.this_class().unwrap_or("<unknown>");
    let missing = |message: String| PatchError::location(class_name, message);

    let (bridge_idx, bridge) = find_method(class, method_name, true)?;
    let (_, implementation) = find_method(class, method_name, false)?;

    let bridge_code = bridge
        .code()
        .ok_or_else(|| missing(format!("bridge {method_name} has no code")))?;
    if !bridge_code
        .instructions()
        .any(|insn| insn.text.starts_with("checkcast "))
    {
        return Err(missing(format!(
            "bridge {method_name}{} has no cast left to remove",
            bridge.descriptor
        )));
    }
    let line = bridge_code
        .line_numbers()
        .and_then(|table| table.iter().find(|entry| entry.label == "L0"))
        .map(|entry| entry.line)
        .ok_or_else(|| missing(format!("bridge {method_name} has no line number at L0")))?;
    let erased = parse_method_descriptor(&bridge.descriptor)?
        .params
        .get(0)
        .cloned()
        .ok_or_else(|| missing(format!("bridge {method_name} takes no arguments")))?;

    let mut code = implementation
        .code()
        .ok_or_else(|| missing(format!("{method_name}{} has no code", implementation.descriptor)))?
        .clone();
    code.line_numbers_mut()
        .and_then(|table| table.iter_mut().find(|entry| entry.label == "L0"))
        .ok_or_else(|| missing(format!("{method_name}{} has no line number at L0", implementation.descriptor)))?
        .line = line;
    code.local_variables_mut()
        .and_then(|table| table.iter_mut().find(|entry| entry.index == 1))
        .ok_or_else(|| missing(format!("{method_name}{} has no local in slot 1", implementation.descriptor)))?
        .descriptor = erased.to_string();

    let mut patched = class.clone();
    let Some(ClassItem::Method(target)) = patched.items.get_mut(bridge_idx) else {
        return Err(missing(format!("bridge {method_name} moved while patching")));
    };
    let target_code = target
        .code_mut()
        .ok_or_else(|| missing(format!("bridge {method_name} has no code")))?;
    *target_code = code;

    tracing::info!(class = class_name, method = method_name, line, "eliminated bridge cast");
    Ok(patched)
}

/// The single bridge (or non-bridge) method called `name`.
fn find_method<'a>(class: &'a ClassFile, name: &str, bridge: bool) -> Result<(usize, &'a Method)> {
    let class_name = class.this_class().unwrap_or("<unknown>");
    let kind = if bridge { "bridge" } else { "implementation" };
    let mut found = class
        .items
        .iter()
        .enumerate()
        .filter_map(|(idx, item)| match item {
            ClassItem::Method(method) if method.name == name && method.is_bridge() == bridge => {
                Some((idx, method))
            }
            _ => None,
        });
    let first = found
        .next()
        .ok_or_else(|| PatchError::location(class_name, format!("no {kind} method named {name}")))?;
    if found.next().is_some() {
        return Err(PatchError::location(
            class_name,
            format!("more than one {kind} method named {name}"),
        ));
    }
    Ok(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use optbridge_jasm::{parse_class, write_class};
    use pretty_assertions::assert_eq;

    const SOME_LONG: &str = include_str!("../tests/fixtures/SomeLong.j");

    fn bridge(class: &ClassFile) -> &Method {
        class
            .methods()
            .find(|m| m.name == "orElse" && m.is_bridge())
            .unwrap()
    }

    #[test]
    fn bridge_returns_the_held_value() {
        let class = parse_class(SOME_LONG).unwrap();
        let patched = eliminate_cast(&class, "orElse").unwrap();
        let method = bridge(&patched);
        assert_eq!(method.flags, vec!["public", "bridge", "synthetic"]);
        assert_eq!(method.descriptor, "(Ljava/lang/Object;)Ljava/lang/Object;");
        assert_eq!(
            method.code().unwrap().to_string(),
            "    .code stack 2 locals 2
L0:     aload_0
L1:     getfield Field me/dkleszyk/java/option/SomeLong value J
L4:     invokestatic Method java/lang/Long valueOf (J)Ljava/lang/Long;
L7:     areturn
L8:
        .linenumbertable
            L0 47
        .end linenumbertable
        .localvariabletable
            0 is this Lme/dkleszyk/java/option/SomeLong; from L0 to L8
            1 is value Ljava/lang/Object; from L0 to L8
        .end localvariabletable
    .end code"
        );
    }

    #[test]
    fn other_methods_are_untouched() {
        let class = parse_class(SOME_LONG).unwrap();
        let patched = eliminate_cast(&class, "orElse").unwrap();
        assert_eq!(class.items.len(), patched.items.len());
        let implementation = |c: &ClassFile| {
            c.methods()
                .find(|m| m.name == "orElse" && !m.is_bridge())
                .cloned()
                .unwrap()
        };
        assert_eq!(implementation(&class), implementation(&patched));
        assert!(write_class(&patched).contains(".sourcefile \"SomeLong.java\""));
    }

    #[test]
    fn second_run_fails() {
        let class = parse_class(SOME_LONG).unwrap();
        let once = eliminate_cast(&class, "orElse").unwrap();
        let err = eliminate_cast(&once, "orElse").unwrap_err();
        assert!(matches!(err, PatchError::Location { .. }));
        assert!(err.to_string().contains("no cast left"));
    }

    #[test]
    fn missing_method_is_reported() {
        let class = parse_class(SOME_LONG).unwrap();
        let err = eliminate_cast(&class, "orGet").unwrap_err();
        assert_eq!(
            err.to_string(),
            "me/dkleszyk/java/option/SomeLong: no bridge method named orGet"
        );
    }
}
