use optbridge_jasm::{MethodDescriptor, TypeDescriptor};
use serde::{Deserialize, Serialize};

use crate::variant::Primitive;

/// Naming of the patched library's classes and helper methods.
///
/// All names are simple names inside [`LibraryLayout::package`] unless noted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryLayout {
    /// Internal package name, `/` separated.
    pub package: String,
    pub base_interface: String,
    pub empty_class: String,
    /// `Some` in `SomeLong`.
    pub some_prefix: String,
    /// `Option` in `LongOption`.
    pub interface_suffix: String,
    /// Static factory returning the shared empty option.
    pub empty_factory: MethodRef,
    /// Static factory for the exception thrown when no value is present.
    pub missing_value: MethodRef,
    /// Name of the contained-value type variable.
    pub type_variable: String,
    /// Method whose cast-carrying bridge is rewritten in every `Some` class.
    pub cast_method: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodRef {
    pub owner: String,
    pub name: String,
}

impl Default for LibraryLayout {
    fn default() -> Self {
        Self {
            package: "me/dkleszyk/java/option".to_string(),
            base_interface: "Option".to_string(),
            empty_class: "None".to_string(),
            some_prefix: "Some".to_string(),
            interface_suffix: "Option".to_string(),
            empty_factory: MethodRef {
                owner: "Options".to_string(),
                name: "noneUnchecked".to_string(),
            },
            missing_value: MethodRef {
                owner: "Exceptions".to_string(),
                name: "optionNoValue".to_string(),
            },
            type_variable: "T".to_string(),
            cast_method: "orElse".to_string(),
        }
    }
}

impl LibraryLayout {
    pub fn qualify(&self, simple_name: &str) -> String {
        if self.package.is_empty() {
            simple_name.to_string()
        } else {
            format!("{}/{simple_name}", self.package)
        }
    }

    pub fn base_interface_name(&self) -> String {
        self.qualify(&self.base_interface)
    }

    pub fn empty_class_name(&self) -> String {
        self.qualify(&self.empty_class)
    }

    pub fn some_class(&self, variant: Primitive) -> String {
        self.qualify(&format!("{}{}", self.some_prefix, variant.upper_name()))
    }

    pub fn interface(&self, variant: Primitive) -> String {
        self.qualify(&format!("{}{}", variant.upper_name(), self.interface_suffix))
    }

    /// The variant whose specialised interface is `internal_name`.
    pub fn variant_of_interface(&self, internal_name: &str) -> Option<Primitive> {
        Primitive::ALL
            .into_iter()
            .find(|&p| self.interface(p) == internal_name)
    }

    /// `L<pkg>/Option<TT;>;`, the base interface's segment of a class signature.
    pub fn base_interface_segment(&self) -> String {
        format!(
            "L{}<T{};>;",
            self.base_interface_name(),
            self.type_variable
        )
    }

    /// Generic type of `this` inside the empty class.
    pub fn empty_this_generic(&self) -> String {
        format!("L{}<T{};>;", self.empty_class_name(), self.type_variable)
    }

    pub fn empty_factory_owner(&self) -> String {
        self.qualify(&self.empty_factory.owner)
    }

    pub fn empty_factory_descriptor(&self) -> MethodDescriptor {
        MethodDescriptor::new(
            Default::default(),
            TypeDescriptor::object(&self.base_interface_name()),
        )
    }

    pub fn missing_value_owner(&self) -> String {
        self.qualify(&self.missing_value.owner)
    }

    pub fn missing_value_descriptor(&self) -> MethodDescriptor {
        MethodDescriptor::new(
            Default::default(),
            TypeDescriptor::object("java/lang/RuntimeException"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_names_match_the_option_library() {
        let layout = LibraryLayout::default();
        assert_eq!(layout.base_interface_name(), "me/dkleszyk/java/option/Option");
        assert_eq!(layout.empty_class_name(), "me/dkleszyk/java/option/None");
        assert_eq!(
            layout.some_class(Primitive::Char),
            "me/dkleszyk/java/option/SomeChar"
        );
        assert_eq!(
            layout.interface(Primitive::Int),
            "me/dkleszyk/java/option/IntOption"
        );
        assert_eq!(
            layout.base_interface_segment(),
            "Lme/dkleszyk/java/option/Option<TT;>;"
        );
        assert_eq!(
            layout.empty_factory_descriptor().to_string(),
            "()Lme/dkleszyk/java/option/Option;"
        );
    }

    #[test]
    fn interface_lookup_by_internal_name() {
        let layout = LibraryLayout::default();
        assert_eq!(
            layout.variant_of_interface("me/dkleszyk/java/option/ShortOption"),
            Some(Primitive::Short)
        );
        assert_eq!(
            layout.variant_of_interface("me/dkleszyk/java/option/Option"),
            None
        );
    }

    #[test]
    fn empty_package_uses_bare_names() {
        let layout = LibraryLayout {
            package: String::new(),
            ..LibraryLayout::default()
        };
        assert_eq!(layout.some_class(Primitive::Long), "SomeLong");
    }
}
