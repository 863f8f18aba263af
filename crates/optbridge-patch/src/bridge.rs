//! Bodies for the bridge methods the empty class is missing.
//!
//! Every body is built from typed instructions, so labels, `stack` and
//! `locals` come out of the instruction list rather than being written by
//! hand.

use optbridge_jasm::{
    parse_method_descriptor, CodeBuilder, DescriptorList, Insn, InvokeKind, Method,
    MethodAttribute, MethodDescriptor, MethodSignature, SignatureText, TypeDescriptor, ValueKind,
};

use crate::catalog::AbstractMethodDeclaration;
use crate::classify::{FactoryOwner, Supplied, SynthesisPattern};
use crate::error::{PatchError, Result};
use crate::layout::LibraryLayout;
use crate::variant::Primitive;

const THROWABLE: &str = "java/lang/Throwable";

/// Everything about the target class a body needs.
#[derive(Debug, Clone, Copy)]
pub struct SynthesisContext<'a> {
    pub layout: &'a LibraryLayout,
    /// Source line of the empty class's declaration.
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedBridge {
    pub method: Method,
    /// Set when the declaration was specialised for one primitive.
    pub variant: Option<Primitive>,
    /// Whether the method carries `ACC_BRIDGE`.
    pub is_bridge: bool,
}

/// Builds the bridges for one classified declaration.
///
/// A declaration whose signature uses the contained type variable as a
/// parameter or as its return type gets one bridge per primitive variant.
/// Anything else gets exactly one bridge with the declaration unchanged.
pub fn synthesize(
    decl: &AbstractMethodDeclaration,
    pattern: SynthesisPattern,
    ctx: &SynthesisContext<'_>,
) -> Result<Vec<SynthesizedBridge>> {
    let type_var = ctx.layout.type_variable.as_str();
    let expanded = decl
        .signature
        .as_ref()
        .filter(|sig| sig.has_top_level_type_var(type_var));

    // Only a covariant return with unchanged parameters is a real bridge.
    let is_bridge = decl.signature.as_ref().is_some_and(|sig| {
        sig.return_type.is_type_var(type_var) && !sig.params.iter().any(|p| p.is_type_var(type_var))
    });
    let flags = bridge_flags(&decl.flags, is_bridge);

    let Some(signature) = expanded else {
        let method = build(
            decl,
            pattern,
            ctx,
            flags,
            decl.descriptor.clone(),
            decl.signature.clone(),
        )?;
        tracing::debug!(method = %method.name, descriptor = %method.descriptor, "synthesised bridge");
        return Ok(vec![SynthesizedBridge {
            method,
            variant: None,
            is_bridge,
        }]);
    };

    Primitive::ALL
        .into_iter()
        .map(|variant| -> Result<SynthesizedBridge> {
            let boxed = variant.boxed_descriptor();
            let descriptor = specialize_descriptor(decl, signature, type_var, &boxed)?;
            let signature = signature.substitute(type_var, &boxed)?;
            let method = build(decl, pattern, ctx, flags.clone(), descriptor, Some(signature))?;
            tracing::debug!(
                method = %method.name,
                descriptor = %method.descriptor,
                ?variant,
                "synthesised bridge"
            );
            Ok(SynthesizedBridge {
                method,
                variant: Some(variant),
                is_bridge,
            })
        })
        .collect()
}

fn bridge_flags(flags: &[String], is_bridge: bool) -> Vec<String> {
    let replacement: &[&str] = if is_bridge {
        &["bridge", "synthetic"]
    } else {
        &["synthetic"]
    };
    flags
        .iter()
        .flat_map(|flag| {
            if flag == "abstract" {
                replacement.iter().map(|f| f.to_string()).collect()
            } else {
                vec![flag.clone()]
            }
        })
        .collect()
}

/// Replaces parameters and return types that are exactly the type variable.
/// Nested occurrences stay erased.
fn specialize_descriptor(
    decl: &AbstractMethodDeclaration,
    signature: &MethodSignature,
    type_var: &str,
    boxed: &TypeDescriptor,
) -> Result<MethodDescriptor> {
    let erased = &decl.descriptor;
    if signature.params.len() != erased.params.len() {
        return Err(PatchError::Classification {
            reason: "signature and descriptor disagree on arity".to_string(),
            name: decl.name.clone(),
            descriptor: erased.to_string(),
            signature: decl.signature_text(),
        });
    }
    let pick = |generic: &TypeDescriptor, erased: &TypeDescriptor| {
        if generic.is_type_var(type_var) {
            boxed.clone()
        } else {
            erased.clone()
        }
    };
    let params: DescriptorList = signature
        .params
        .iter()
        .zip(&erased.params)
        .map(|(generic, erased)| pick(generic, erased))
        .collect();
    Ok(MethodDescriptor::new(
        params,
        pick(&signature.return_type, &erased.return_type),
    ))
}

fn build(
    decl: &AbstractMethodDeclaration,
    pattern: SynthesisPattern,
    ctx: &SynthesisContext<'_>,
    flags: Vec<String>,
    descriptor: MethodDescriptor,
    signature: Option<MethodSignature>,
) -> Result<Method> {
    let layout = ctx.layout;
    let fail = |reason: &str| PatchError::Classification {
        reason: reason.to_string(),
        name: decl.name.clone(),
        descriptor: descriptor.to_string(),
        signature: decl.signature_text(),
    };

    let names = pattern.parameter_names();
    let params = descriptor.params.as_slice();
    if names.len() != params.len() {
        return Err(fail("parameter count does not fit the synthesis pattern"));
    }

    let mut code = CodeBuilder::new();
    code.local(
        "this",
        TypeDescriptor::object(&layout.empty_class_name()),
        Some(TypeDescriptor::parse(&layout.empty_this_generic())?),
    );
    let mut slots = Vec::with_capacity(params.len());
    for (idx, (param, name)) in params.iter().zip(names).enumerate() {
        let generic = signature
            .as_ref()
            .and_then(|sig| sig.params.get(idx))
            .filter(|generic| *generic != param)
            .cloned();
        slots.push(code.local(name, param.clone(), generic));
    }

    let return_type = &descriptor.return_type;
    let return_class = || {
        return_type
            .class_name()
            .map(str::to_string)
            .ok_or_else(|| fail("expected an object return type"))
    };
    let mut throws = false;

    match pattern {
        SynthesisPattern::ThrowNotPresent => {
            code.push(Insn::invoke_static(
                &layout.missing_value_owner(),
                &layout.missing_value.name,
                layout.missing_value_descriptor(),
            ))
            .push(Insn::Athrow);
        }
        SynthesisPattern::EmptyOf { owner } => {
            let class = return_class()?;
            let factory = MethodDescriptor::new(DescriptorList::default(), return_type.clone());
            code.push(Insn::Invoke {
                kind: InvokeKind::Static,
                interface: owner == FactoryOwner::Interface,
                owner: class,
                name: "empty".to_string(),
                descriptor: factory,
            })
            .push(Insn::Return(Some(ValueKind::Reference)));
        }
        SynthesisPattern::ThrowSupplied { supplied } => {
            emit_supplied(&mut code, supplied, &slots)?;
            code.push(Insn::Checkcast(THROWABLE.to_string()))
                .push(Insn::Athrow);
            throws = true;
        }
        SynthesisPattern::ReturnArgument | SynthesisPattern::OrElse => {
            code.push(load(&params[0], slots[0]))
                .push(Insn::Return(Some(ValueKind::Reference)));
        }
        SynthesisPattern::OrGet { supplied } | SynthesisPattern::OrElseGet { supplied } => {
            emit_supplied(&mut code, supplied, &slots)?;
            code.push(Insn::Checkcast(return_class()?))
                .push(Insn::Return(Some(ValueKind::Reference)));
        }
        SynthesisPattern::Filter { .. } => {
            emit_empty(&mut code, layout);
            let class = return_class()?;
            if class != layout.base_interface_name() {
                code.push(Insn::Checkcast(class));
            }
            code.push(Insn::Return(Some(ValueKind::Reference)));
        }
        SynthesisPattern::Matches { .. } => {
            code.push(Insn::Iconst0)
                .push(Insn::Return(Some(ValueKind::Int)));
        }
        SynthesisPattern::IfSome { shape } => {
            let forwarded = shape.if_none_parameters();
            if !forwarded.is_empty() {
                code.push(Insn::Load(ValueKind::Reference, 0));
                for &idx in forwarded {
                    code.push(load(&params[idx], slots[idx]));
                }
                let if_none = MethodDescriptor::new(
                    forwarded.iter().map(|&idx| params[idx].clone()).collect(),
                    TypeDescriptor::void(),
                );
                code.push(Insn::invoke_virtual(
                    &layout.empty_class_name(),
                    "ifNone",
                    if_none,
                ));
            }
            code.push(Insn::Return(None));
        }
        SynthesisPattern::PrimitiveOrElse { primitive } => {
            let kind = primitive.value_kind();
            code.push(Insn::Load(kind, slots[0]))
                .push(Insn::Return(Some(kind)));
        }
        SynthesisPattern::PrimitiveOrElseGet {
            primitive,
            supplied,
        } => {
            let owner = params[0]
                .class_name()
                .ok_or_else(|| fail("expected a functional interface parameter"))?
                .to_string();
            let (name, accessor) = match supplied {
                Supplied::Supplier => (
                    format!("getAs{}", primitive.upper_name()),
                    format!("(){}", primitive.type_code()),
                ),
                Supplied::Function if primitive == Primitive::Boolean => (
                    "test".to_string(),
                    format!("(Ljava/lang/Object;){}", primitive.type_code()),
                ),
                Supplied::Function => (
                    format!("applyAs{}", primitive.upper_name()),
                    format!("(Ljava/lang/Object;){}", primitive.type_code()),
                ),
            };
            for (param, &slot) in params.iter().zip(&slots) {
                code.push(load(param, slot));
            }
            code.push(Insn::invoke_interface(
                &owner,
                &name,
                parse_method_descriptor(&accessor)?,
            ))
            .push(Insn::Return(Some(primitive.value_kind())));
        }
        SynthesisPattern::MapEmpty { narrowed, .. } => {
            emit_empty(&mut code, layout);
            if narrowed {
                code.push(Insn::Checkcast(return_class()?));
            }
            code.push(Insn::Return(Some(ValueKind::Reference)));
        }
    }

    let mut attributes = vec![MethodAttribute::Code(code.finish(Some(ctx.line)))];
    if throws {
        attributes.push(MethodAttribute::Exceptions(vec![THROWABLE.to_string()]));
    }
    if let Some(sig) = signature.filter(MethodSignature::is_generic) {
        attributes.push(MethodAttribute::Signature(SignatureText {
            value: sig.to_string(),
            quote: decl.signature_quote,
        }));
    }

    Ok(Method {
        flags,
        name: decl.name.clone(),
        descriptor: descriptor.to_string(),
        attributes,
    })
}

fn load(param: &TypeDescriptor, slot: u16) -> Insn {
    Insn::Load(
        ValueKind::of(param).unwrap_or(ValueKind::Reference),
        slot,
    )
}

/// Pushes the value produced by the caller's supplier or function.
fn emit_supplied(code: &mut CodeBuilder, supplied: Supplied, slots: &[u16]) -> Result<()> {
    let insn = match supplied {
        Supplied::Supplier => {
            code.push(Insn::Load(ValueKind::Reference, slots[0]));
            Insn::invoke_interface(
                "java/util/function/Supplier",
                "get",
                parse_method_descriptor("()Ljava/lang/Object;")?,
            )
        }
        Supplied::Function => {
            code.push(Insn::Load(ValueKind::Reference, slots[0]))
                .push(Insn::Load(ValueKind::Reference, slots[1]));
            Insn::invoke_interface(
                "java/util/function/Function",
                "apply",
                parse_method_descriptor("(Ljava/lang/Object;)Ljava/lang/Object;")?,
            )
        }
    };
    code.push(insn);
    Ok(())
}

fn emit_empty(code: &mut CodeBuilder, layout: &LibraryLayout) {
    code.push(Insn::invoke_static(
        &layout.empty_factory_owner(),
        &layout.empty_factory.name,
        layout.empty_factory_descriptor(),
    ));
}
