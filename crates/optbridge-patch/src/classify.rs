//! Maps an abstract declaration to the body shape its bridge needs.
//!
//! Families are tried in a fixed order and the first whose name test
//! matches decides. Inside a family, an arity or parameter shape it does not
//! know is an error rather than a fall-through.

use optbridge_jasm::TypeDescriptor;
use serde::Serialize;

use crate::catalog::{AbstractMethodDeclaration, Origin};
use crate::error::{PatchError, Result};
use crate::layout::LibraryLayout;
use crate::variant::Primitive;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "pattern", rename_all = "snake_case")]
pub enum Classification {
    /// Erasure already gives the empty class a matching method.
    NoBridge,
    Bridge(SynthesisPattern),
}

/// Whether the static `empty()` factory lives on a class or an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FactoryOwner {
    Class,
    Interface,
}

/// How a value is obtained from the caller's functional argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Supplied {
    /// `(supplier)`
    Supplier,
    /// `(function, arg)`
    Function,
}

/// Parameter shapes of the `ifSome*` family. `C` is the primitive
/// consumer, `ObjC` its object-taking counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IfSomeShape {
    /// `(C)`
    Consumer,
    /// `(ObjC, A)`
    ObjConsumer,
    /// `(C, Runnable)`
    ConsumerOrRun,
    /// `(ObjC, A, Runnable)`
    ObjConsumerOrRun,
    /// `(C, Consumer, A)`
    ConsumerOrAccept,
    /// `(ObjC, Consumer, A)`
    ObjConsumerOrAccept,
    /// `(ObjC, A, Consumer, B)`
    ObjConsumerArgOrAccept,
}

impl IfSomeShape {
    /// Parameter names, in declaration order.
    pub fn parameter_names(self) -> &'static [&'static str] {
        match self {
            IfSomeShape::Consumer => &["ifSome"],
            IfSomeShape::ObjConsumer => &["ifSome", "arg"],
            IfSomeShape::ConsumerOrRun => &["ifSome", "ifNone"],
            IfSomeShape::ObjConsumerOrRun => &["ifSome", "ifSomeArg", "ifNone"],
            IfSomeShape::ConsumerOrAccept => &["ifSome", "ifNone", "ifNoneArg"],
            IfSomeShape::ObjConsumerOrAccept => &["ifSome", "ifNone", "arg"],
            IfSomeShape::ObjConsumerArgOrAccept => &["ifSome", "ifSomeArg", "ifNone", "ifNoneArg"],
        }
    }

    /// Parameters forwarded to the empty class's own `ifNone`; empty for a
    /// body that does nothing.
    pub fn if_none_parameters(self) -> &'static [usize] {
        match self {
            IfSomeShape::Consumer | IfSomeShape::ObjConsumer => &[],
            IfSomeShape::ConsumerOrRun => &[1],
            IfSomeShape::ObjConsumerOrRun => &[2],
            IfSomeShape::ConsumerOrAccept | IfSomeShape::ObjConsumerOrAccept => &[1, 2],
            IfSomeShape::ObjConsumerArgOrAccept => &[2, 3],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "pattern", rename_all = "snake_case")]
pub enum SynthesisPattern {
    /// Throw the library's "no value" exception.
    ThrowNotPresent,
    /// Return the empty instance of the declared return type.
    EmptyOf { owner: FactoryOwner },
    /// Throw whatever the supplier produces.
    ThrowSupplied { supplied: Supplied },
    /// `or`: hand back the alternative option.
    ReturnArgument,
    /// Return the supplied option, cast to the return type.
    OrGet { supplied: Supplied },
    /// Return the default value.
    OrElse,
    /// Return the supplied value, cast to the return type.
    OrElseGet { supplied: Supplied },
    /// Return the shared empty instance.
    Filter { arity: u8 },
    /// Always false.
    Matches { arity: u8 },
    IfSome { shape: IfSomeShape },
    /// Return the primitive default value.
    PrimitiveOrElse { primitive: Primitive },
    /// Return the primitive the functional argument produces.
    PrimitiveOrElseGet {
        primitive: Primitive,
        supplied: Supplied,
    },
    /// Return the shared empty instance, cast when the result is a
    /// specialised (`To<Name>`) option.
    MapEmpty { narrowed: bool, arity: u8 },
}

const PREDICATE_PARAMETERS: [&str; 2] = ["predicate", "arg"];
const MAPPER_PARAMETERS: [&str; 2] = ["mapper", "arg"];

impl SynthesisPattern {
    /// Parameter names for the debug tables, in declaration order.
    pub fn parameter_names(self) -> &'static [&'static str] {
        match self {
            SynthesisPattern::ThrowNotPresent | SynthesisPattern::EmptyOf { .. } => &[],
            SynthesisPattern::ThrowSupplied { supplied }
            | SynthesisPattern::OrGet { supplied }
            | SynthesisPattern::OrElseGet { supplied }
            | SynthesisPattern::PrimitiveOrElseGet { supplied, .. } => match supplied {
                Supplied::Supplier => &["supplier"],
                Supplied::Function => &["supplier", "arg"],
            },
            SynthesisPattern::ReturnArgument => &["option"],
            SynthesisPattern::OrElse | SynthesisPattern::PrimitiveOrElse { .. } => &["value"],
            SynthesisPattern::Filter { arity } | SynthesisPattern::Matches { arity } => {
                &PREDICATE_PARAMETERS[..usize::from(arity)]
            }
            SynthesisPattern::IfSome { shape } => shape.parameter_names(),
            SynthesisPattern::MapEmpty { arity, .. } => &MAPPER_PARAMETERS[..usize::from(arity)],
        }
    }
}

pub fn classify(decl: &AbstractMethodDeclaration, layout: &LibraryLayout) -> Result<Classification> {
    if decl.origin == Origin::Generic
        && !decl
            .signature
            .as_ref()
            .is_some_and(|sig| sig.has_top_level_type_var(&layout.type_variable))
    {
        return Ok(Classification::NoBridge);
    }
    pattern_for(decl).map(Classification::Bridge)
}

fn pattern_for(decl: &AbstractMethodDeclaration) -> Result<SynthesisPattern> {
    let name = decl.name.as_str();
    let arity = decl.arity();
    let params = decl.descriptor.params.as_slice();
    let returns_class = decl.descriptor.return_type.class_name().is_some();
    let shape_error = |family: &str| unmatched(decl, format!("unsupported {family} shape"));

    if arity == 0 && (name.starts_with("get") || name.ends_with("ElseThrow")) {
        return Ok(SynthesisPattern::ThrowNotPresent);
    }
    if arity == 0 && (name.starts_with("toOptional") || name.ends_with("Stream")) {
        if !returns_class {
            return Err(shape_error("empty conversion"));
        }
        let owner = if name.starts_with("toOptional") {
            FactoryOwner::Class
        } else {
            FactoryOwner::Interface
        };
        return Ok(SynthesisPattern::EmptyOf { owner });
    }
    if name.ends_with("ElseThrow") {
        let supplied = supplied(arity).ok_or_else(|| shape_error("throwing accessor"))?;
        return Ok(SynthesisPattern::ThrowSupplied { supplied });
    }
    if name == "or" {
        return match arity {
            1 => Ok(SynthesisPattern::ReturnArgument),
            _ => Err(shape_error("alternative")),
        };
    }
    if name.starts_with("orGet") {
        let supplied = supplied(arity).ok_or_else(|| shape_error("supplied alternative"))?;
        return Ok(SynthesisPattern::OrGet { supplied });
    }
    if name == "orElse" {
        return match arity {
            1 if decl.descriptor.return_type.is_reference() => Ok(SynthesisPattern::OrElse),
            _ => Err(shape_error("default value")),
        };
    }
    if name == "orElseGet" {
        let supplied = supplied(arity).ok_or_else(|| shape_error("supplied default"))?;
        return Ok(SynthesisPattern::OrElseGet { supplied });
    }
    if name.starts_with("filter") {
        return match arity {
            0..=2 if returns_class => Ok(SynthesisPattern::Filter { arity: arity as u8 }),
            _ => Err(shape_error("filter")),
        };
    }
    if name.starts_with("matches") {
        return match arity {
            1 | 2 => Ok(SynthesisPattern::Matches { arity: arity as u8 }),
            _ => Err(shape_error("predicate test")),
        };
    }
    if let Some(rest) = name.strip_prefix("ifSome") {
        let shape = if_some_shape(rest, params).ok_or_else(|| shape_error("ifSome"))?;
        return Ok(SynthesisPattern::IfSome { shape });
    }
    if let Some(primitive) = name.strip_suffix("OrElse").and_then(Primitive::from_lower_name) {
        return match arity {
            1 if params[0] == primitive.descriptor() => {
                Ok(SynthesisPattern::PrimitiveOrElse { primitive })
            }
            _ => Err(shape_error("primitive default")),
        };
    }
    if let Some(primitive) = name
        .strip_suffix("OrElseGet")
        .and_then(Primitive::from_lower_name)
    {
        let supplied = supplied(arity)
            .filter(|_| params[0].class_name().is_some())
            .ok_or_else(|| shape_error("primitive supplied default"))?;
        return Ok(SynthesisPattern::PrimitiveOrElseGet {
            primitive,
            supplied,
        });
    }
    if name.starts_with("map") || name.starts_with("flatMap") {
        return match arity {
            1 | 2 if returns_class => Ok(SynthesisPattern::MapEmpty {
                narrowed: name.contains("To"),
                arity: arity as u8,
            }),
            _ => Err(shape_error("mapping")),
        };
    }

    Err(unmatched(decl, "no synthesis pattern"))
}

fn supplied(arity: usize) -> Option<Supplied> {
    match arity {
        1 => Some(Supplied::Supplier),
        2 => Some(Supplied::Function),
        _ => None,
    }
}

/// `rest` is the method name after `ifSome`, e.g. `LongOrElse`.
fn if_some_shape(rest: &str, params: &[TypeDescriptor]) -> Option<IfSomeShape> {
    let (element, or_else) = match rest.strip_suffix("OrElse") {
        Some(element) => (element, true),
        None => (rest, false),
    };
    let consumer = format!("/{element}Consumer;");
    let obj_consumer = format!("/Obj{element}Consumer;");
    let (consumer, obj_consumer) = (consumer.as_str(), obj_consumer.as_str());

    let candidates = if or_else {
        vec![
            (IfSomeShape::ConsumerOrRun, vec![consumer, "/Runnable;"]),
            (
                IfSomeShape::ObjConsumerOrRun,
                vec![obj_consumer, "/Object;", "/Runnable;"],
            ),
            (
                IfSomeShape::ConsumerOrAccept,
                vec![consumer, "/Consumer;", "/Object;"],
            ),
            (
                IfSomeShape::ObjConsumerOrAccept,
                vec![obj_consumer, "/Consumer;", "/Object;"],
            ),
            (
                IfSomeShape::ObjConsumerArgOrAccept,
                vec![obj_consumer, "/Object;", "/Consumer;", "/Object;"],
            ),
        ]
    } else {
        vec![
            (IfSomeShape::Consumer, vec![consumer]),
            (IfSomeShape::ObjConsumer, vec![obj_consumer, "/Object;"]),
        ]
    };

    candidates.into_iter().find_map(|(shape, suffixes)| {
        let matches = params.len() == suffixes.len()
            && params
                .iter()
                .zip(&suffixes)
                .all(|(param, suffix)| param.ends_with(suffix));
        matches.then_some(shape)
    })
}

fn unmatched(decl: &AbstractMethodDeclaration, reason: impl Into<String>) -> PatchError {
    PatchError::Classification {
        reason: reason.into(),
        name: decl.name.clone(),
        descriptor: decl.descriptor.to_string(),
        signature: decl.signature_text(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use optbridge_jasm::{parse_method_descriptor, parse_method_signature};

    fn decl(origin: Origin, name: &str, descriptor: &str, signature: Option<&str>) -> AbstractMethodDeclaration {
        AbstractMethodDeclaration {
            origin,
            flags: vec!["public".to_string(), "abstract".to_string()],
            name: name.to_string(),
            descriptor: parse_method_descriptor(descriptor).unwrap(),
            signature: signature.map(|s| parse_method_signature(s).unwrap()),
            signature_quote: None,
        }
    }

    fn generic(name: &str, descriptor: &str, signature: &str) -> Classification {
        classify(
            &decl(Origin::Generic, name, descriptor, Some(signature)),
            &LibraryLayout::default(),
        )
        .unwrap()
    }

    fn long(name: &str, descriptor: &str) -> Classification {
        classify(
            &decl(Origin::Specialized(Primitive::Long), name, descriptor, None),
            &LibraryLayout::default(),
        )
        .unwrap()
    }

    #[test]
    fn throwing_accessors() {
        assert_eq!(
            generic("orElseThrow", "()Ljava/lang/Object;", "()TT;"),
            Classification::Bridge(SynthesisPattern::ThrowNotPresent)
        );
        assert_eq!(
            long("longOrElseThrow", "()J"),
            Classification::Bridge(SynthesisPattern::ThrowNotPresent)
        );
        assert_eq!(
            generic(
                "orElseThrow",
                "(Ljava/util/function/Supplier;)Ljava/lang/Object;",
                "<X:Ljava/lang/Throwable;>(Ljava/util/function/Supplier<+TX;>;)TT;^TX;"
            ),
            Classification::Bridge(SynthesisPattern::ThrowSupplied {
                supplied: Supplied::Supplier
            })
        );
        assert_eq!(
            long(
                "longOrElseThrow",
                "(Ljava/util/function/Function;Ljava/lang/Object;)J"
            ),
            Classification::Bridge(SynthesisPattern::ThrowSupplied {
                supplied: Supplied::Function
            })
        );
    }

    #[test]
    fn conversions_pick_factory_owner() {
        assert_eq!(
            long("toOptionalLong", "()Ljava/util/OptionalLong;"),
            Classification::Bridge(SynthesisPattern::EmptyOf {
                owner: FactoryOwner::Class
            })
        );
        assert_eq!(
            long("longStream", "()Ljava/util/stream/LongStream;"),
            Classification::Bridge(SynthesisPattern::EmptyOf {
                owner: FactoryOwner::Interface
            })
        );
    }

    #[test]
    fn nested_type_variable_needs_no_bridge() {
        assert_eq!(
            generic(
                "map",
                "(Ljava/util/function/Function;)Lme/dkleszyk/java/option/Option;",
                "<U:Ljava/lang/Object;>(Ljava/util/function/Function<-TT;+TU;>;)Lme/dkleszyk/java/option/Option<TU;>;"
            ),
            Classification::NoBridge
        );
        assert_eq!(
            generic(
                "or",
                "(Lme/dkleszyk/java/option/Option;)Lme/dkleszyk/java/option/Option;",
                "(Lme/dkleszyk/java/option/Option<+TT;>;)Lme/dkleszyk/java/option/Option<TT;>;"
            ),
            Classification::NoBridge
        );
        assert_eq!(
            generic(
                "mapToLong",
                "(Ljava/util/function/ToLongFunction;)Lme/dkleszyk/java/option/LongOption;",
                "(Ljava/util/function/ToLongFunction<-TT;>;)Lme/dkleszyk/java/option/LongOption;"
            ),
            Classification::NoBridge
        );
        let unsigned = decl(Origin::Generic, "isEmpty", "()Z", None);
        assert_eq!(
            classify(&unsigned, &LibraryLayout::default()).unwrap(),
            Classification::NoBridge
        );
    }

    #[test]
    fn top_level_type_variable_needs_a_bridge() {
        assert_eq!(
            generic("orElse", "(Ljava/lang/Object;)Ljava/lang/Object;", "(TT;)TT;"),
            Classification::Bridge(SynthesisPattern::OrElse)
        );
        assert_eq!(
            generic(
                "orElseGet",
                "(Ljava/util/function/Function;Ljava/lang/Object;)Ljava/lang/Object;",
                "<A:Ljava/lang/Object;>(Ljava/util/function/Function<-TA;+TT;>;TA;)TT;"
            ),
            Classification::Bridge(SynthesisPattern::OrElseGet {
                supplied: Supplied::Function
            })
        );
    }

    #[test]
    fn specialised_methods_by_name() {
        assert_eq!(
            long(
                "or",
                "(Lme/dkleszyk/java/option/LongOption;)Lme/dkleszyk/java/option/LongOption;"
            ),
            Classification::Bridge(SynthesisPattern::ReturnArgument)
        );
        assert_eq!(
            long(
                "orGetLong",
                "(Ljava/util/function/Supplier;)Lme/dkleszyk/java/option/LongOption;"
            ),
            Classification::Bridge(SynthesisPattern::OrGet {
                supplied: Supplied::Supplier
            })
        );
        assert_eq!(
            long("filterToObject", "()Lme/dkleszyk/java/option/LongOption;"),
            Classification::Bridge(SynthesisPattern::Filter { arity: 0 })
        );
        assert_eq!(
            long(
                "filter",
                "(Ljava/util/function/BiPredicate;Ljava/lang/Object;)Lme/dkleszyk/java/option/LongOption;"
            ),
            Classification::Bridge(SynthesisPattern::Filter { arity: 2 })
        );
        assert_eq!(
            long("matchesLong", "(Ljava/util/function/LongPredicate;)Z"),
            Classification::Bridge(SynthesisPattern::Matches { arity: 1 })
        );
        assert_eq!(
            long("longOrElse", "(J)J"),
            Classification::Bridge(SynthesisPattern::PrimitiveOrElse {
                primitive: Primitive::Long
            })
        );
        assert_eq!(
            long(
                "longOrElseGet",
                "(Ljava/util/function/ToLongFunction;Ljava/lang/Object;)J"
            ),
            Classification::Bridge(SynthesisPattern::PrimitiveOrElseGet {
                primitive: Primitive::Long,
                supplied: Supplied::Function
            })
        );
        assert_eq!(
            long(
                "mapLongToLong",
                "(Ljava/util/function/LongBinaryOperator;J)Lme/dkleszyk/java/option/LongOption;"
            ),
            Classification::Bridge(SynthesisPattern::MapEmpty {
                narrowed: true,
                arity: 2
            })
        );
        assert_eq!(
            long(
                "flatMapLong",
                "(Ljava/util/function/LongFunction;)Lme/dkleszyk/java/option/Option;"
            ),
            Classification::Bridge(SynthesisPattern::MapEmpty {
                narrowed: false,
                arity: 1
            })
        );
    }

    #[test]
    fn every_if_some_shape() {
        let cases = [
            ("ifSomeLong", "(Ljava/util/function/LongConsumer;)V", IfSomeShape::Consumer),
            (
                "ifSomeLong",
                "(Lme/dkleszyk/java/function/ObjLongConsumer;Ljava/lang/Object;)V",
                IfSomeShape::ObjConsumer,
            ),
            (
                "ifSomeLongOrElse",
                "(Ljava/util/function/LongConsumer;Ljava/lang/Runnable;)V",
                IfSomeShape::ConsumerOrRun,
            ),
            (
                "ifSomeLongOrElse",
                "(Lme/dkleszyk/java/function/ObjLongConsumer;Ljava/lang/Object;Ljava/lang/Runnable;)V",
                IfSomeShape::ObjConsumerOrRun,
            ),
            (
                "ifSomeLongOrElse",
                "(Ljava/util/function/LongConsumer;Ljava/util/function/Consumer;Ljava/lang/Object;)V",
                IfSomeShape::ConsumerOrAccept,
            ),
            (
                "ifSomeLongOrElse",
                "(Lme/dkleszyk/java/function/ObjLongConsumer;Ljava/util/function/Consumer;Ljava/lang/Object;)V",
                IfSomeShape::ObjConsumerOrAccept,
            ),
            (
                "ifSomeLongOrElse",
                "(Lme/dkleszyk/java/function/ObjLongConsumer;Ljava/lang/Object;Ljava/util/function/Consumer;Ljava/lang/Object;)V",
                IfSomeShape::ObjConsumerArgOrAccept,
            ),
        ];
        for (name, descriptor, shape) in cases {
            assert_eq!(
                long(name, descriptor),
                Classification::Bridge(SynthesisPattern::IfSome { shape }),
                "{name}{descriptor}"
            );
            assert_eq!(
                shape.parameter_names().len(),
                parse_method_descriptor(descriptor).unwrap().params.len()
            );
        }
    }

    #[test]
    fn generic_interface_surface() {
        use SynthesisPattern::*;

        let bridges = [
            ("get", "()Ljava/lang/Object;", "()TT;", ThrowNotPresent),
            ("orElse", "(Ljava/lang/Object;)Ljava/lang/Object;", "(TT;)TT;", OrElse),
            (
                "orElseGet",
                "(Ljava/util/function/Supplier;)Ljava/lang/Object;",
                "(Ljava/util/function/Supplier<+TT;>;)TT;",
                OrElseGet { supplied: Supplied::Supplier },
            ),
            (
                "orElseGet",
                "(Ljava/util/function/Function;Ljava/lang/Object;)Ljava/lang/Object;",
                "<A:Ljava/lang/Object;>(Ljava/util/function/Function<-TA;+TT;>;TA;)TT;",
                OrElseGet { supplied: Supplied::Function },
            ),
            ("orElseThrow", "()Ljava/lang/Object;", "()TT;", ThrowNotPresent),
            (
                "orElseThrow",
                "(Ljava/util/function/Supplier;)Ljava/lang/Object;",
                "<X:Ljava/lang/Throwable;>(Ljava/util/function/Supplier<+TX;>;)TT;^TX;",
                ThrowSupplied { supplied: Supplied::Supplier },
            ),
            (
                "orElseThrow",
                "(Ljava/util/function/Function;Ljava/lang/Object;)Ljava/lang/Object;",
                "<A:Ljava/lang/Object;X:Ljava/lang/Throwable;>(Ljava/util/function/Function<-TA;+TX;>;TA;)TT;^TX;",
                ThrowSupplied { supplied: Supplied::Function },
            ),
        ];
        for (name, descriptor, signature, pattern) in bridges {
            assert_eq!(
                generic(name, descriptor, signature),
                Classification::Bridge(pattern),
                "{name}{descriptor}"
            );
        }

        let no_bridge = [
            (
                "and",
                "(Lme/dkleszyk/java/option/Option;)Lme/dkleszyk/java/option/Option;",
                Some("<O::Lme/dkleszyk/java/option/Option<*>;>(TO;)TO;"),
            ),
            (
                "andGet",
                "(Ljava/util/function/Supplier;)Lme/dkleszyk/java/option/Option;",
                Some("<O::Lme/dkleszyk/java/option/Option<*>;>(Ljava/util/function/Supplier<+TO;>;)TO;"),
            ),
            (
                "andGet",
                "(Ljava/util/function/Function;Ljava/lang/Object;)Lme/dkleszyk/java/option/Option;",
                Some("<A:Ljava/lang/Object;O::Lme/dkleszyk/java/option/Option<*>;>(Ljava/util/function/Function<-TA;+TO;>;TA;)TO;"),
            ),
            (
                "filter",
                "(Ljava/util/function/Predicate;)Lme/dkleszyk/java/option/Option;",
                Some("(Ljava/util/function/Predicate<-TT;>;)Lme/dkleszyk/java/option/Option<TT;>;"),
            ),
            (
                "filter",
                "(Ljava/util/function/BiPredicate;Ljava/lang/Object;)Lme/dkleszyk/java/option/Option;",
                Some("<A:Ljava/lang/Object;>(Ljava/util/function/BiPredicate<-TA;-TT;>;TA;)Lme/dkleszyk/java/option/Option<TT;>;"),
            ),
            (
                "filterToObject",
                "()Lme/dkleszyk/java/option/Option;",
                Some("()Lme/dkleszyk/java/option/Option<TT;>;"),
            ),
            (
                "filterToType",
                "(Ljava/lang/Class;)Lme/dkleszyk/java/option/Option;",
                Some("<U:Ljava/lang/Object;>(Ljava/lang/Class<TU;>;)Lme/dkleszyk/java/option/Option<TU;>;"),
            ),
            (
                "flatMap",
                "(Ljava/util/function/Function;)Lme/dkleszyk/java/option/Option;",
                Some("<U:Ljava/lang/Object;>(Ljava/util/function/Function<-TT;+Lme/dkleszyk/java/option/Option<+TU;>;>;)Lme/dkleszyk/java/option/Option<TU;>;"),
            ),
            (
                "flatMap",
                "(Ljava/util/function/BiFunction;Ljava/lang/Object;)Lme/dkleszyk/java/option/Option;",
                Some("<A:Ljava/lang/Object;U:Ljava/lang/Object;>(Ljava/util/function/BiFunction<-TA;-TT;+Lme/dkleszyk/java/option/Option<+TU;>;>;TA;)Lme/dkleszyk/java/option/Option<TU;>;"),
            ),
            (
                "flatMapToInt",
                "(Ljava/util/function/Function;)Lme/dkleszyk/java/option/IntOption;",
                Some("(Ljava/util/function/Function<-TT;+Lme/dkleszyk/java/option/IntOption;>;)Lme/dkleszyk/java/option/IntOption;"),
            ),
            ("ifNone", "(Ljava/lang/Runnable;)V", None),
            (
                "ifNone",
                "(Ljava/util/function/Consumer;Ljava/lang/Object;)V",
                Some("<A:Ljava/lang/Object;>(Ljava/util/function/Consumer<-TA;>;TA;)V"),
            ),
            (
                "ifSome",
                "(Ljava/util/function/Consumer;)V",
                Some("(Ljava/util/function/Consumer<-TT;>;)V"),
            ),
            (
                "ifSome",
                "(Ljava/util/function/BiConsumer;Ljava/lang/Object;)V",
                Some("<A:Ljava/lang/Object;>(Ljava/util/function/BiConsumer<-TA;-TT;>;TA;)V"),
            ),
            (
                "ifSomeOrElse",
                "(Ljava/util/function/Consumer;Ljava/lang/Runnable;)V",
                Some("(Ljava/util/function/Consumer<-TT;>;Ljava/lang/Runnable;)V"),
            ),
            (
                "ifSomeOrElse",
                "(Ljava/util/function/Consumer;Ljava/util/function/Consumer;Ljava/lang/Object;)V",
                Some("<B:Ljava/lang/Object;>(Ljava/util/function/Consumer<-TT;>;Ljava/util/function/Consumer<-TB;>;TB;)V"),
            ),
            (
                "ifSomeOrElse",
                "(Ljava/util/function/BiConsumer;Ljava/lang/Object;Ljava/lang/Runnable;)V",
                Some("<A:Ljava/lang/Object;>(Ljava/util/function/BiConsumer<-TA;-TT;>;TA;Ljava/lang/Runnable;)V"),
            ),
            (
                "ifSomeOrElse",
                "(Ljava/util/function/BiConsumer;Ljava/util/function/Consumer;Ljava/lang/Object;)V",
                Some("<A:Ljava/lang/Object;>(Ljava/util/function/BiConsumer<-TA;-TT;>;Ljava/util/function/Consumer<-TA;>;TA;)V"),
            ),
            (
                "ifSomeOrElse",
                "(Ljava/util/function/BiConsumer;Ljava/lang/Object;Ljava/util/function/Consumer;Ljava/lang/Object;)V",
                Some("<A:Ljava/lang/Object;B:Ljava/lang/Object;>(Ljava/util/function/BiConsumer<-TA;-TT;>;TA;Ljava/util/function/Consumer<-TB;>;TB;)V"),
            ),
            ("isNone", "()Z", None),
            ("isSome", "()Z", None),
            (
                "map",
                "(Ljava/util/function/BiFunction;Ljava/lang/Object;)Lme/dkleszyk/java/option/Option;",
                Some("<A:Ljava/lang/Object;U:Ljava/lang/Object;>(Ljava/util/function/BiFunction<-TA;-TT;+TU;>;TA;)Lme/dkleszyk/java/option/Option<TU;>;"),
            ),
            (
                "mapToBoolean",
                "(Ljava/util/function/Predicate;)Lme/dkleszyk/java/option/BooleanOption;",
                Some("(Ljava/util/function/Predicate<-TT;>;)Lme/dkleszyk/java/option/BooleanOption;"),
            ),
            (
                "mapToByte",
                "(Lme/dkleszyk/java/function/extra/primitive/ToByteBiFunction;Ljava/lang/Object;)Lme/dkleszyk/java/option/ByteOption;",
                Some("<A:Ljava/lang/Object;>(Lme/dkleszyk/java/function/extra/primitive/ToByteBiFunction<-TA;-TT;>;TA;)Lme/dkleszyk/java/option/ByteOption;"),
            ),
            (
                "matches",
                "(Ljava/util/function/Predicate;)Z",
                Some("(Ljava/util/function/Predicate<-TT;>;)Z"),
            ),
            (
                "matches",
                "(Ljava/util/function/BiPredicate;Ljava/lang/Object;)Z",
                Some("<A:Ljava/lang/Object;>(Ljava/util/function/BiPredicate<-TA;-TT;>;TA;)Z"),
            ),
            (
                "orGet",
                "(Ljava/util/function/Supplier;)Lme/dkleszyk/java/option/Option;",
                Some("(Ljava/util/function/Supplier<+Lme/dkleszyk/java/option/Option<+TT;>;>;)Lme/dkleszyk/java/option/Option<TT;>;"),
            ),
            (
                "orGet",
                "(Ljava/util/function/Function;Ljava/lang/Object;)Lme/dkleszyk/java/option/Option;",
                Some("<A:Ljava/lang/Object;>(Ljava/util/function/Function<-TA;+Lme/dkleszyk/java/option/Option<+TT;>;>;TA;)Lme/dkleszyk/java/option/Option<TT;>;"),
            ),
            (
                "stream",
                "()Ljava/util/stream/Stream;",
                Some("()Ljava/util/stream/Stream<TT;>;"),
            ),
            (
                "toOptional",
                "()Ljava/util/Optional;",
                Some("()Ljava/util/Optional<TT;>;"),
            ),
        ];
        let layout = LibraryLayout::default();
        for (name, descriptor, signature) in no_bridge {
            assert_eq!(
                classify(&decl(Origin::Generic, name, descriptor, signature), &layout).unwrap(),
                Classification::NoBridge,
                "{name}{descriptor}"
            );
        }
    }

    #[test]
    fn unknown_shapes_are_fatal() {
        let layout = LibraryLayout::default();
        let bad_if_some = decl(
            Origin::Specialized(Primitive::Long),
            "ifSomeLong",
            "(Ljava/util/function/IntConsumer;)V",
            None,
        );
        let err = classify(&bad_if_some, &layout).unwrap_err();
        assert!(matches!(err, PatchError::Classification { .. }));
        assert!(err.to_string().contains("ifSomeLong"));

        let unknown = decl(Origin::Specialized(Primitive::Long), "frobnicate", "()V", None);
        assert!(classify(&unknown, &layout).is_err());

        let or_arity = decl(
            Origin::Specialized(Primitive::Long),
            "or",
            "(Ljava/lang/Object;Ljava/lang/Object;)Ljava/lang/Object;",
            None,
        );
        assert!(classify(&or_arity, &layout).is_err());
    }
}
