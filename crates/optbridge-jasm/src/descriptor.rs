use std::fmt;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
}

impl BaseType {
    pub fn from_code(code: char) -> Option<Self> {
        Some(match code {
            'B' => BaseType::Byte,
            'C' => BaseType::Char,
            'D' => BaseType::Double,
            'F' => BaseType::Float,
            'I' => BaseType::Int,
            'J' => BaseType::Long,
            'S' => BaseType::Short,
            'Z' => BaseType::Boolean,
            _ => return None,
        })
    }

    pub fn code(self) -> char {
        match self {
            BaseType::Byte => 'B',
            BaseType::Char => 'C',
            BaseType::Double => 'D',
            BaseType::Float => 'F',
            BaseType::Int => 'I',
            BaseType::Long => 'J',
            BaseType::Short => 'S',
            BaseType::Boolean => 'Z',
        }
    }

    /// Local variable / operand stack words occupied by a value of this type.
    pub fn slots(self) -> u16 {
        match self {
            BaseType::Double | BaseType::Long => 2,
            _ => 1,
        }
    }
}

/// A single type token, erased (`Ljava/lang/Object;`) or generic
/// (`Ljava/util/function/Supplier<+TT;>;`, `TT;`).
///
/// The original text is kept as-is so a parsed list always prints back to
/// its input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeDescriptor(String);

impl TypeDescriptor {
    /// Parses exactly one descriptor; `V` is accepted so return types can
    /// go through the same path.
    pub fn parse(text: &str) -> Result<Self> {
        if text == "V" {
            return Ok(TypeDescriptor::void());
        }
        match descriptor_end(text, 0) {
            Some(end) if end == text.len() => Ok(TypeDescriptor(text.to_string())),
            _ => Err(Error::InvalidDescriptor(text.to_string())),
        }
    }

    pub fn void() -> Self {
        TypeDescriptor("V".to_string())
    }

    /// `L<internal_name>;`
    pub fn object(internal_name: &str) -> Self {
        TypeDescriptor(format!("L{internal_name};"))
    }

    pub fn base(base: BaseType) -> Self {
        TypeDescriptor(base.code().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_void(&self) -> bool {
        self.0 == "V"
    }

    pub fn base_type(&self) -> Option<BaseType> {
        let mut chars = self.0.chars();
        let first = chars.next()?;
        if chars.next().is_some() {
            return None;
        }
        BaseType::from_code(first)
    }

    pub fn is_reference(&self) -> bool {
        matches!(self.0.as_bytes().first(), Some(b'L' | b'T' | b'['))
    }

    /// Name of a type variable reference (`TT;` -> `T`).
    pub fn type_var_name(&self) -> Option<&str> {
        self.0.strip_prefix('T')?.strip_suffix(';')
    }

    pub fn is_type_var(&self, name: &str) -> bool {
        self.type_var_name() == Some(name)
    }

    /// Words this value occupies in the local variable array.
    pub fn slots(&self) -> u16 {
        if self.is_void() {
            return 0;
        }
        self.base_type().map(BaseType::slots).unwrap_or(1)
    }

    /// Internal class name of an object descriptor, up to its type arguments.
    pub fn class_name(&self) -> Option<&str> {
        let body = self.0.strip_prefix('L')?.strip_suffix(';')?;
        Some(match body.find('<') {
            Some(idx) => &body[..idx],
            None => body,
        })
    }

    /// True when the descriptor carries type arguments or type variables, i.e.
    /// it is not already in erased form.
    pub fn is_generic(&self) -> bool {
        let element = self.0.trim_start_matches('[');
        self.0.contains('<') || element.starts_with('T')
    }

    pub fn ends_with(&self, suffix: &str) -> bool {
        self.0.ends_with(suffix)
    }

    /// Rewrites every reference to a type variable, at any nesting depth.
    ///
    /// `rewrite` receives the variable name and returns the replacement text,
    /// or `None` to keep the reference.
    pub fn map_type_vars(
        &self,
        rewrite: &mut dyn FnMut(&str) -> Option<String>,
    ) -> Result<TypeDescriptor> {
        let mut out = String::with_capacity(self.0.len());
        rewrite_descriptor(&self.0, rewrite, &mut out)
            .ok_or_else(|| Error::InvalidSignature(self.0.clone()))?;
        Ok(TypeDescriptor(out))
    }

    /// Replaces type variable `name` with `replacement` everywhere.
    pub fn substitute(&self, name: &str, replacement: &TypeDescriptor) -> Result<TypeDescriptor> {
        self.map_type_vars(&mut |var| (var == name).then(|| replacement.0.clone()))
    }

    /// True if type variable `name` occurs anywhere inside this descriptor.
    pub fn mentions_type_var(&self, name: &str) -> Result<bool> {
        let mut found = false;
        self.map_type_vars(&mut |var| {
            found |= var == name;
            None
        })?;
        Ok(found)
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered type tokens that concatenate back to their source text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DescriptorList(Vec<TypeDescriptor>);

impl DescriptorList {
    pub fn new(items: Vec<TypeDescriptor>) -> Self {
        DescriptorList(items)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TypeDescriptor> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TypeDescriptor> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[TypeDescriptor] {
        &self.0
    }

    pub fn insert(&mut self, index: usize, descriptor: TypeDescriptor) {
        self.0.insert(index, descriptor);
    }

    pub fn position(&self, descriptor: &TypeDescriptor) -> Option<usize> {
        self.0.iter().position(|d| d == descriptor)
    }

    /// Total local variable words of the list.
    pub fn slots(&self) -> u16 {
        self.0.iter().map(TypeDescriptor::slots).sum()
    }
}

impl FromIterator<TypeDescriptor> for DescriptorList {
    fn from_iter<I: IntoIterator<Item = TypeDescriptor>>(iter: I) -> Self {
        DescriptorList(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a DescriptorList {
    type Item = &'a TypeDescriptor;
    type IntoIter = std::slice::Iter<'a, TypeDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for DescriptorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for descriptor in &self.0 {
            f.write_str(&descriptor.0)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodDescriptor {
    pub params: DescriptorList,
    pub return_type: TypeDescriptor,
}

impl MethodDescriptor {
    pub fn new(params: DescriptorList, return_type: TypeDescriptor) -> Self {
        Self {
            params,
            return_type,
        }
    }

    /// Words needed for the arguments, not counting a receiver.
    pub fn param_slots(&self) -> u16 {
        self.params.slots()
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}){}", self.params, self.return_type)
    }
}

/// Splits a concatenation of descriptors into its tokens.
///
/// A reference descriptor ends at the first `;` that is not inside a
/// `<...>` type argument list, so `Ljava/util/Map<TK;TV;>;` stays one token.
pub fn parse_descriptor_list(text: &str) -> Result<DescriptorList> {
    let mut items = Vec::new();
    let mut idx = 0usize;
    while idx < text.len() {
        let end = descriptor_end(text, idx)
            .ok_or_else(|| Error::InvalidDescriptor(text.to_string()))?;
        items.push(TypeDescriptor(text[idx..end].to_string()));
        idx = end;
    }
    Ok(DescriptorList(items))
}

pub fn parse_method_descriptor(desc: &str) -> Result<MethodDescriptor> {
    let inner = desc
        .strip_prefix('(')
        .ok_or_else(|| Error::InvalidDescriptor(desc.to_string()))?;
    let close = params_end(inner).ok_or_else(|| Error::InvalidDescriptor(desc.to_string()))?;
    let params = parse_descriptor_list(&inner[..close])
        .map_err(|_| Error::InvalidDescriptor(desc.to_string()))?;
    let return_type = TypeDescriptor::parse(&inner[close + 1..])
        .map_err(|_| Error::InvalidDescriptor(desc.to_string()))?;
    Ok(MethodDescriptor {
        params,
        return_type,
    })
}

/// Index of the `)` closing a parameter list, skipping over descriptors so a
/// `)` can never be confused with anything inside a type argument list.
pub(crate) fn params_end(text: &str) -> Option<usize> {
    let mut idx = 0usize;
    loop {
        if text.as_bytes().get(idx)? == &b')' {
            return Some(idx);
        }
        idx = descriptor_end(text, idx)?;
    }
}

/// End (exclusive) of the descriptor starting at `start`.
pub(crate) fn descriptor_end(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut idx = start;
    while bytes.get(idx) == Some(&b'[') {
        idx += 1;
    }
    match *bytes.get(idx)? {
        b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' => Some(idx + 1),
        b'L' | b'T' => {
            let mut depth = 0usize;
            for (offset, &b) in bytes[idx + 1..].iter().enumerate() {
                match b {
                    b'<' => depth += 1,
                    b'>' => depth = depth.checked_sub(1)?,
                    b';' if depth == 0 => return Some(idx + 1 + offset + 1),
                    _ => {}
                }
            }
            None
        }
        _ => None,
    }
}

fn rewrite_descriptor(
    text: &str,
    rewrite: &mut dyn FnMut(&str) -> Option<String>,
    out: &mut String,
) -> Option<()> {
    let element = text.trim_start_matches('[');
    out.push_str(&text[..text.len() - element.len()]);

    match element.as_bytes().first()? {
        b'T' => {
            let name = element.strip_prefix('T')?.strip_suffix(';')?;
            match rewrite(name) {
                Some(replacement) => out.push_str(&replacement),
                None => out.push_str(element),
            }
            Some(())
        }
        b'L' => rewrite_class_type(element, rewrite, out),
        _ => {
            out.push_str(element);
            Some(())
        }
    }
}

fn rewrite_class_type(
    text: &str,
    rewrite: &mut dyn FnMut(&str) -> Option<String>,
    out: &mut String,
) -> Option<()> {
    let bytes = text.as_bytes();
    let mut idx = 0usize;
    while idx < bytes.len() {
        match bytes[idx] {
            b'<' => {
                out.push('<');
                idx += 1;
                while *bytes.get(idx)? != b'>' {
                    match bytes[idx] {
                        b'*' => {
                            out.push('*');
                            idx += 1;
                            continue;
                        }
                        b'+' | b'-' => {
                            out.push(bytes[idx] as char);
                            idx += 1;
                        }
                        _ => {}
                    }
                    let end = descriptor_end(text, idx)?;
                    rewrite_descriptor(&text[idx..end], rewrite, out)?;
                    idx = end;
                }
                out.push('>');
                idx += 1;
            }
            b';' => {
                out.push(';');
                return (idx + 1 == bytes.len()).then_some(());
            }
            _ => {
                let start = idx;
                while idx < bytes.len() && !matches!(bytes[idx], b'<' | b';') {
                    idx += 1;
                }
                out.push_str(&text[start..idx]);
            }
        }
    }
    None
}
