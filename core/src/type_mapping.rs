#![deny(missing_docs)]

//! # Type Mapping
//!
//! Describes Rust data-model types in a form the schema resolver can walk.
//! Rust has no runtime reflection, so every type that appears in a document
//! implements [`Describe`] and hands back a [`TypeDescriptor`]: its identity,
//! its qualified name and its shape (primitive, enumeration, sequence, object).
//!
//! Descriptors can also be declared at runtime (see [`TypeDescriptor::declared_object`]),
//! which is how the CLI turns a manifest into documents.

use std::any::{type_name, TypeId};
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

/// Identity of a described type.
///
/// Two descriptors with the same identity are the same type, whatever site
/// they are used from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeIdentity {
    /// A Rust type, identified by its `TypeId`.
    Native(TypeId),
    /// A type declared at runtime, identified by its declared name.
    Declared(String),
}

/// Built-in primitive kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// `{"type":"string"}`
    String,
    /// `{"type":"boolean"}`
    Boolean,
    /// `{"type":"integer","format":"int32"}`
    Int32,
    /// `{"type":"integer","format":"int64"}`
    Int64,
    /// `{"type":"number","format":"float"}`
    Float,
    /// `{"type":"number","format":"double"}`
    Double,
    /// `{"type":"number"}`
    Decimal,
    /// `{"type":"string","format":"date"}`
    Date,
    /// `{"type":"string","format":"date-time"}`
    DateTime,
    /// `{"type":"string","format":"uuid"}`
    Uuid,
}

impl PrimitiveKind {
    /// The JSON Schema `type` keyword for this primitive.
    pub fn json_type(self) -> &'static str {
        match self {
            PrimitiveKind::String
            | PrimitiveKind::Date
            | PrimitiveKind::DateTime
            | PrimitiveKind::Uuid => "string",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Int32 | PrimitiveKind::Int64 => "integer",
            PrimitiveKind::Float | PrimitiveKind::Double | PrimitiveKind::Decimal => "number",
        }
    }

    /// The `format` keyword, if the primitive carries one.
    pub fn format(self) -> Option<&'static str> {
        match self {
            PrimitiveKind::Int32 => Some("int32"),
            PrimitiveKind::Int64 => Some("int64"),
            PrimitiveKind::Float => Some("float"),
            PrimitiveKind::Double => Some("double"),
            PrimitiveKind::Date => Some("date"),
            PrimitiveKind::DateTime => Some("date-time"),
            PrimitiveKind::Uuid => Some("uuid"),
            PrimitiveKind::String | PrimitiveKind::Boolean | PrimitiveKind::Decimal => None,
        }
    }

    /// Parses the primitive names accepted in manifests.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(PrimitiveKind::String),
            "boolean" | "bool" => Some(PrimitiveKind::Boolean),
            "integer" | "int32" => Some(PrimitiveKind::Int32),
            "int64" | "long" => Some(PrimitiveKind::Int64),
            "float" => Some(PrimitiveKind::Float),
            "double" => Some(PrimitiveKind::Double),
            "number" | "decimal" => Some(PrimitiveKind::Decimal),
            "date" => Some(PrimitiveKind::Date),
            "date-time" | "datetime" => Some(PrimitiveKind::DateTime),
            "uuid" => Some(PrimitiveKind::Uuid),
            _ => None,
        }
    }
}

/// How a member's type is obtained.
///
/// Member types are described lazily so a type may refer to itself.
#[derive(Clone)]
pub enum MemberType {
    /// A Rust type; the function is its `Describe::describe`.
    Native(fn() -> TypeDescriptor),
    /// A runtime-declared type, produced on demand.
    Deferred(Arc<dyn Fn() -> TypeDescriptor + Send + Sync>),
}

impl MemberType {
    /// Wraps an already built descriptor.
    pub fn declared(descriptor: TypeDescriptor) -> Self {
        MemberType::Deferred(Arc::new(move || descriptor.clone()))
    }

    /// Produces the member's descriptor.
    pub fn descriptor(&self) -> TypeDescriptor {
        match self {
            MemberType::Native(describe) => describe(),
            MemberType::Deferred(describe) => describe(),
        }
    }
}

impl fmt::Debug for MemberType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberType::Native(_) => f.write_str("MemberType::Native"),
            MemberType::Deferred(_) => f.write_str("MemberType::Deferred"),
        }
    }
}

/// A named member of an object type.
#[derive(Debug, Clone)]
pub struct Member {
    /// Property name as it appears in the schema.
    pub name: String,
    /// The member's type.
    pub ty: MemberType,
    /// Whether the member type is registered as its own component instead of inlined.
    pub separate: bool,
}

/// The structural shape of a described type.
#[derive(Debug, Clone)]
pub enum TypeShape {
    /// A built-in primitive.
    Primitive(PrimitiveKind),
    /// An enumeration; values in declaration order.
    Enum(Vec<String>),
    /// A sequence/collection of the element type.
    Sequence(Box<TypeDescriptor>),
    /// A record with members in declaration order.
    Object(Vec<Member>),
    /// A type that cannot be introspected; resolves to an empty object.
    Opaque,
}

/// Identity, name and shape of a data-model type.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    identity: TypeIdentity,
    name: String,
    shape: TypeShape,
}

/// Types that can describe their own schema shape.
///
/// The component key of a described type is its unqualified name, so two
/// types named `User` in different modules collide (see
/// [`CollisionPolicy`](crate::oas::registry::CollisionPolicy)). Generic
/// instantiations append their arguments: `Page<User>` keys as `PageUser`
/// and `Page<Order>` as `PageOrder`.
pub trait Describe: 'static {
    /// Returns the descriptor of `Self`.
    fn describe() -> TypeDescriptor;
}

impl TypeDescriptor {
    /// Creates a descriptor for the Rust type `T` with the given shape.
    pub fn native<T: ?Sized + 'static>(shape: TypeShape) -> Self {
        Self {
            identity: TypeIdentity::Native(TypeId::of::<T>()),
            name: type_name::<T>().to_string(),
            shape,
        }
    }

    /// Creates a primitive descriptor for `T`.
    pub fn primitive<T: ?Sized + 'static>(kind: PrimitiveKind) -> Self {
        Self::native::<T>(TypeShape::Primitive(kind))
    }

    /// Creates an object descriptor for `T` with no members yet.
    pub fn object<T: ?Sized + 'static>() -> Self {
        Self::native::<T>(TypeShape::Object(Vec::new()))
    }

    /// Creates an enumeration descriptor for `T`, keeping the given order.
    pub fn enumeration<T, I, S>(values: I) -> Self
    where
        T: ?Sized + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::native::<T>(TypeShape::Enum(values.into_iter().map(Into::into).collect()))
    }

    /// Creates a sequence descriptor for `T` holding `E`.
    pub fn sequence<T: ?Sized + 'static, E: Describe>() -> Self {
        Self::native::<T>(TypeShape::Sequence(Box::new(E::describe())))
    }

    /// Creates a descriptor for a type that cannot be introspected.
    pub fn opaque<T: ?Sized + 'static>() -> Self {
        Self::native::<T>(TypeShape::Opaque)
    }

    /// Creates a runtime-declared descriptor.
    pub fn declared(name: impl Into<String>, shape: TypeShape) -> Self {
        let name = name.into();
        Self {
            identity: TypeIdentity::Declared(name.clone()),
            name,
            shape,
        }
    }

    /// Creates a runtime-declared object with no members yet.
    pub fn declared_object(name: impl Into<String>) -> Self {
        Self::declared(name, TypeShape::Object(Vec::new()))
    }

    /// Creates a runtime-declared enumeration.
    pub fn declared_enum<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::declared(
            name,
            TypeShape::Enum(values.into_iter().map(Into::into).collect()),
        )
    }

    /// Creates a runtime-declared primitive alias.
    pub fn declared_primitive(name: impl Into<String>, kind: PrimitiveKind) -> Self {
        Self::declared(name, TypeShape::Primitive(kind))
    }

    /// Creates a runtime-declared sequence of `element`.
    pub fn declared_sequence(element: TypeDescriptor) -> Self {
        Self::declared(
            format!("[{}]", element.name),
            TypeShape::Sequence(Box::new(element)),
        )
    }

    /// Appends an inlined member. Descriptors of any other shape become objects.
    pub fn field<F: Describe>(self, name: impl Into<String>) -> Self {
        self.member(name, MemberType::Native(F::describe), false)
    }

    /// Appends a member whose type is registered as a separate component.
    pub fn component<F: Describe>(self, name: impl Into<String>) -> Self {
        self.member(name, MemberType::Native(F::describe), true)
    }

    /// Appends a member of any origin.
    pub fn member(mut self, name: impl Into<String>, ty: MemberType, separate: bool) -> Self {
        let member = Member {
            name: name.into(),
            ty,
            separate,
        };
        match &mut self.shape {
            TypeShape::Object(members) => members.push(member),
            other => *other = TypeShape::Object(vec![member]),
        }
        self
    }

    /// The identity used for de-duplication.
    pub fn identity(&self) -> &TypeIdentity {
        &self.identity
    }

    /// The qualified name (e.g. `app::models::User`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The structural shape.
    pub fn shape(&self) -> &TypeShape {
        &self.shape
    }

    /// The unqualified name: last path segment, generic arguments stripped.
    pub fn simple_name(&self) -> &str {
        let base = self.name.split('<').next().unwrap_or(&self.name);
        let last = base.rsplit("::").next().unwrap_or(base);
        last.trim_start_matches('&').trim()
    }

    /// The component key this type registers under.
    ///
    /// Sequences key on their element (`Vec<User>` becomes `UserList`).
    /// Generic types append the simple names of their arguments.
    pub fn canonical_key(&self) -> String {
        match &self.shape {
            TypeShape::Sequence(element) => format!("{}List", element.canonical_key()),
            _ => match generic_arguments(&self.name) {
                Some(args) => format!("{}{}", self.simple_name(), argument_key(args)),
                None => self.simple_name().to_string(),
            },
        }
    }
}

/// The text between the outermost `<` and `>` of a generic path type.
fn generic_arguments(name: &str) -> Option<&str> {
    let name = name.trim_start_matches('&').trim();
    if name.starts_with('(') || name.starts_with('[') {
        return None;
    }
    let open = name.find('<')?;
    let close = name.rfind('>')?;
    (close > open + 1).then(|| &name[open + 1..close])
}

/// Concatenates the unqualified identifiers of `args`, dropping lifetimes.
fn argument_key(args: &str) -> String {
    args.split(|c: char| !(c.is_alphanumeric() || c == '_' || c == ':' || c == '\''))
        .filter(|token| !token.is_empty() && !token.starts_with('\''))
        .map(|token| token.rsplit("::").next().unwrap_or(token))
        .collect()
}

macro_rules! describe_primitive {
    ($kind:expr => $($ty:ty),+ $(,)?) => {
        $(
            impl Describe for $ty {
                fn describe() -> TypeDescriptor {
                    TypeDescriptor::primitive::<$ty>($kind)
                }
            }
        )+
    };
}

describe_primitive!(PrimitiveKind::String => String, &'static str, char);
describe_primitive!(PrimitiveKind::Boolean => bool);
describe_primitive!(PrimitiveKind::Int32 => i8, i16, i32, u8, u16, u32);
describe_primitive!(PrimitiveKind::Int64 => i64, u64, i128, u128, isize, usize);
describe_primitive!(PrimitiveKind::Float => f32);
describe_primitive!(PrimitiveKind::Double => f64);
describe_primitive!(PrimitiveKind::Date => chrono::NaiveDate);
describe_primitive!(PrimitiveKind::DateTime => chrono::NaiveDateTime);

impl<Tz: chrono::TimeZone + 'static> Describe for chrono::DateTime<Tz> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::primitive::<Self>(PrimitiveKind::DateTime)
    }
}

impl<T: Describe> Describe for Vec<T> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::sequence::<Self, T>()
    }
}

impl<T: Describe> Describe for VecDeque<T> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::sequence::<Self, T>()
    }
}

impl<T: Describe> Describe for BTreeSet<T> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::sequence::<Self, T>()
    }
}

impl<T: Describe> Describe for HashSet<T> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::sequence::<Self, T>()
    }
}

impl<T: Describe, const N: usize> Describe for [T; N] {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::sequence::<Self, T>()
    }
}

impl<T: Describe> Describe for Option<T> {
    fn describe() -> TypeDescriptor {
        T::describe()
    }
}

impl<T: Describe> Describe for Box<T> {
    fn describe() -> TypeDescriptor {
        T::describe()
    }
}
