use std::fmt;

use crate::descriptor::{descriptor_end, params_end, parse_descriptor_list, DescriptorList, TypeDescriptor};
use crate::error::{Error, Result};

/// A formal type parameter: `T:Ljava/lang/Object;` or `X::Ljava/io/Serializable;`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeParameter {
    pub name: String,
    pub class_bound: Option<TypeDescriptor>,
    pub interface_bounds: Vec<TypeDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    pub type_params: Vec<TypeParameter>,
    pub params: DescriptorList,
    pub return_type: TypeDescriptor,
    pub throws: Vec<TypeDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassSignature {
    pub type_params: Vec<TypeParameter>,
    /// Superclass followed by the implemented interfaces.
    pub supertypes: DescriptorList,
}

pub fn parse_method_signature(sig: &str) -> Result<MethodSignature> {
    let invalid = || Error::InvalidSignature(sig.to_string());
    let (type_params, rest) = parse_type_params(sig).ok_or_else(invalid)?;
    let inner = rest.strip_prefix('(').ok_or_else(invalid)?;
    let close = params_end(inner).ok_or_else(invalid)?;
    let params = parse_descriptor_list(&inner[..close]).map_err(|_| invalid())?;

    let tail = &inner[close + 1..];
    let (return_text, throws_text) = match tail.find('^') {
        Some(idx) => (&tail[..idx], &tail[idx..]),
        None => (tail, ""),
    };
    let return_type = TypeDescriptor::parse(return_text).map_err(|_| invalid())?;

    let mut throws = Vec::new();
    let mut idx = 0usize;
    while idx < throws_text.len() {
        if throws_text.as_bytes()[idx] != b'^' {
            return Err(invalid());
        }
        let end = descriptor_end(throws_text, idx + 1).ok_or_else(invalid)?;
        throws.push(TypeDescriptor::parse(&throws_text[idx + 1..end]).map_err(|_| invalid())?);
        idx = end;
    }

    Ok(MethodSignature {
        type_params,
        params,
        return_type,
        throws,
    })
}

pub fn parse_class_signature(sig: &str) -> Result<ClassSignature> {
    let invalid = || Error::InvalidSignature(sig.to_string());
    let (type_params, rest) = parse_type_params(sig).ok_or_else(invalid)?;
    let supertypes = parse_descriptor_list(rest).map_err(|_| invalid())?;
    if supertypes.is_empty() {
        return Err(invalid());
    }
    Ok(ClassSignature {
        type_params,
        supertypes,
    })
}

fn parse_type_params(sig: &str) -> Option<(Vec<TypeParameter>, &str)> {
    let Some(mut rest) = sig.strip_prefix('<') else {
        return Some((Vec::new(), sig));
    };

    let mut params = Vec::new();
    loop {
        if let Some(after) = rest.strip_prefix('>') {
            return (!params.is_empty()).then_some((params, after));
        }
        let colon = rest.find(':')?;
        let name = &rest[..colon];
        if name.is_empty() || name.contains(['<', '>', ';', '/']) {
            return None;
        }
        rest = &rest[colon + 1..];

        let class_bound = if rest.starts_with(':') || rest.starts_with('>') {
            None
        } else {
            let end = descriptor_end(rest, 0)?;
            let bound = TypeDescriptor::parse(&rest[..end]).ok()?;
            rest = &rest[end..];
            Some(bound)
        };

        let mut interface_bounds = Vec::new();
        while let Some(after) = rest.strip_prefix(':') {
            let end = descriptor_end(after, 0)?;
            interface_bounds.push(TypeDescriptor::parse(&after[..end]).ok()?);
            rest = &after[end..];
        }

        params.push(TypeParameter {
            name: name.to_string(),
            class_bound,
            interface_bounds,
        });
    }
}

impl TypeParameter {
    fn map_type_vars(&self, rewrite: &mut dyn FnMut(&str) -> Option<String>) -> Result<Self> {
        Ok(TypeParameter {
            name: self.name.clone(),
            class_bound: self
                .class_bound
                .as_ref()
                .map(|bound| bound.map_type_vars(rewrite))
                .transpose()?,
            interface_bounds: self
                .interface_bounds
                .iter()
                .map(|bound| bound.map_type_vars(rewrite))
                .collect::<Result<_>>()?,
        })
    }
}

impl MethodSignature {
    /// True when `name` is a parameter or the return type itself, not merely
    /// nested inside a type argument.
    pub fn has_top_level_type_var(&self, name: &str) -> bool {
        self.return_type.is_type_var(name) || self.params.iter().any(|p| p.is_type_var(name))
    }

    /// Whether the signature still says anything the erased descriptor does not.
    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
            || self.params.iter().any(TypeDescriptor::is_generic)
            || self.return_type.is_generic()
            || self.throws.iter().any(TypeDescriptor::is_generic)
    }

    pub fn map_type_vars(&self, rewrite: &mut dyn FnMut(&str) -> Option<String>) -> Result<Self> {
        Ok(MethodSignature {
            type_params: self
                .type_params
                .iter()
                .map(|tp| tp.map_type_vars(rewrite))
                .collect::<Result<_>>()?,
            params: self
                .params
                .iter()
                .map(|p| p.map_type_vars(rewrite))
                .collect::<Result<_>>()?,
            return_type: self.return_type.map_type_vars(rewrite)?,
            throws: self
                .throws
                .iter()
                .map(|t| t.map_type_vars(rewrite))
                .collect::<Result<_>>()?,
        })
    }

    pub fn substitute(&self, name: &str, replacement: &TypeDescriptor) -> Result<Self> {
        self.map_type_vars(&mut |var| (var == name).then(|| replacement.as_str().to_string()))
    }

    /// Alpha-renames type variable `from` to `to`, including its declaration.
    pub fn rename_type_var(&self, from: &str, to: &str) -> Result<Self> {
        let mut renamed =
            self.map_type_vars(&mut |var| (var == from).then(|| format!("T{to};")))?;
        for tp in &mut renamed.type_params {
            if tp.name == from {
                tp.name = to.to_string();
            }
        }
        Ok(renamed)
    }
}

fn write_type_params(f: &mut fmt::Formatter<'_>, params: &[TypeParameter]) -> fmt::Result {
    if params.is_empty() {
        return Ok(());
    }
    f.write_str("<")?;
    for tp in params {
        write!(f, "{}:", tp.name)?;
        if let Some(bound) = &tp.class_bound {
            write!(f, "{bound}")?;
        }
        for bound in &tp.interface_bounds {
            write!(f, ":{bound}")?;
        }
    }
    f.write_str(">")
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_type_params(f, &self.type_params)?;
        write!(f, "({}){}", self.params, self.return_type)?;
        for thrown in &self.throws {
            write!(f, "^{thrown}")?;
        }
        Ok(())
    }
}

impl fmt::Display for ClassSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_type_params(f, &self.type_params)?;
        write!(f, "{}", self.supertypes)
    }
}
