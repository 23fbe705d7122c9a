//! Type registry: declarative descriptions of object shapes and their fields.

use std::collections::HashMap;
use std::fmt::{self, Write as _};

use async_graphql::Value;

use crate::{
    error::{PetqlError, Result},
    model::{Pet, User},
    storage::EntityStore,
};

pub const INT: &str = "Int";
pub const STRING: &str = "String";
pub const BOOLEAN: &str = "Boolean";

/// Built-in scalar types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Int,
    String,
    Boolean,
}

impl ScalarType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            INT => Some(Self::Int),
            STRING => Some(Self::String),
            BOOLEAN => Some(Self::Boolean),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Int => INT,
            Self::String => STRING,
            Self::Boolean => BOOLEAN,
        }
    }

    /// Check an input value (never null) against this scalar.
    pub fn check_input(self, value: &Value) -> std::result::Result<(), String> {
        match (self, value) {
            (Self::Int, Value::Number(n)) => match n.as_i64() {
                Some(i) if i32::try_from(i).is_ok() => Ok(()),
                Some(_) => Err(format!(
                    "Int cannot represent non 32-bit signed integer value: {}",
                    value
                )),
                None => Err(format!("Int cannot represent non-integer value: {}", value)),
            },
            (Self::Int, _) => Err(format!("Int cannot represent non-integer value: {}", value)),
            (Self::String, Value::String(_)) => Ok(()),
            (Self::String, _) => Err(format!(
                "String cannot represent a non string value: {}",
                value
            )),
            (Self::Boolean, Value::Boolean(_)) => Ok(()),
            (Self::Boolean, _) => Err(format!(
                "Boolean cannot represent a non boolean value: {}",
                value
            )),
        }
    }

    /// Serialize a resolved value as this scalar.
    pub fn serialize(self, resolved: &Resolved) -> std::result::Result<Value, String> {
        match (self, resolved) {
            (Self::Int, Resolved::Int(i)) => Ok(Value::from(*i)),
            (Self::String, Resolved::String(s)) => Ok(Value::String(s.clone())),
            (Self::Boolean, Resolved::Boolean(b)) => Ok(Value::Boolean(*b)),
            (scalar, other) => Err(format!(
                "{} cannot represent value: {}",
                scalar.name(),
                other.describe()
            )),
        }
    }
}

/// A field or argument type: a named type wrapped in list/non-null modifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Named(&'static str),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: &'static str) -> Self {
        Self::Named(name)
    }

    pub fn non_null(self) -> Self {
        Self::NonNull(Box::new(self))
    }

    pub fn list(self) -> Self {
        Self::List(Box::new(self))
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, Self::NonNull(_))
    }

    /// The innermost named type.
    pub fn named_type(&self) -> &'static str {
        match self {
            Self::Named(name) => name,
            Self::List(inner) | Self::NonNull(inner) => inner.named_type(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::List(inner) => write!(f, "[{}]", inner),
            Self::NonNull(inner) => write!(f, "{}!", inner),
        }
    }
}

/// The output of a resolver, before it is completed against the field type.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Null,
    Int(i32),
    String(String),
    Boolean(bool),
    User(User),
    Pet(Pet),
    List(Vec<Resolved>),
    /// Parent value of root fields.
    Root,
}

impl Resolved {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Object type name of an entity value.
    pub fn object_type(&self) -> Option<&'static str> {
        match self {
            Self::User(_) => Some("User"),
            Self::Pet(_) => Some("Pet"),
            _ => None,
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Int(i) => i.to_string(),
            Self::String(s) => format!("\"{}\"", s),
            Self::Boolean(b) => b.to_string(),
            Self::User(u) => format!("User({})", u.id),
            Self::Pet(p) => format!("Pet({})", p.id),
            Self::List(items) => format!("list of {}", items.len()),
            Self::Root => "root".to_string(),
        }
    }
}

impl From<i32> for Resolved {
    fn from(i: i32) -> Self {
        Self::Int(i)
    }
}

impl From<String> for Resolved {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<User> for Resolved {
    fn from(u: User) -> Self {
        Self::User(u)
    }
}

impl From<Pet> for Resolved {
    fn from(p: Pet) -> Self {
        Self::Pet(p)
    }
}

impl<T: Into<Resolved>> From<Option<T>> for Resolved {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Resolved>> From<Vec<T>> for Resolved {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

/// Coerced argument values of one field invocation.
///
/// Arguments that were not provided are absent from the map, which is
/// distinct from an explicit null.
#[derive(Debug, Clone, Default)]
pub struct Arguments(HashMap<String, Value>);

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|v| !matches!(v, Value::Null))
    }

    pub fn int(&self, name: &str) -> Result<Option<i32>> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::Number(n)) => n
                .as_i64()
                .and_then(|i| i32::try_from(i).ok())
                .map(Some)
                .ok_or_else(|| invalid(name, "expected Int")),
            Some(_) => Err(invalid(name, "expected Int")),
        }
    }

    pub fn string(&self, name: &str) -> Result<Option<String>> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(invalid(name, "expected String")),
        }
    }
}

fn invalid(argument: &str, reason: &str) -> PetqlError {
    PetqlError::InvalidArgument {
        argument: argument.to_string(),
        reason: reason.to_string(),
    }
}

/// Resolver of one field: a pure function of parent, arguments and store.
pub type Resolver = fn(&Resolved, &Arguments, &EntityStore) -> Result<Resolved>;

#[derive(Debug, Clone)]
pub struct ArgumentDescriptor {
    pub name: &'static str,
    pub ty: TypeRef,
}

impl ArgumentDescriptor {
    pub fn new(name: &'static str, ty: TypeRef) -> Self {
        Self { name, ty }
    }
}

#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub description: Option<&'static str>,
    pub ty: TypeRef,
    pub args: Vec<ArgumentDescriptor>,
    pub resolver: Resolver,
}

impl FieldDescriptor {
    pub fn new(name: &'static str, ty: TypeRef, resolver: Resolver) -> Self {
        Self {
            name,
            description: None,
            ty,
            args: Vec::new(),
            resolver,
        }
    }

    pub fn description(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    pub fn argument(mut self, name: &'static str, ty: TypeRef) -> Self {
        self.args.push(ArgumentDescriptor::new(name, ty));
        self
    }

    pub fn arg(&self, name: &str) -> Option<&ArgumentDescriptor> {
        self.args.iter().find(|a| a.name == name)
    }
}

#[derive(Debug, Clone)]
pub struct ObjectType {
    pub name: &'static str,
    pub description: Option<&'static str>,
    pub fields: Vec<FieldDescriptor>,
}

impl ObjectType {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            description: None,
            fields: Vec::new(),
        }
    }

    pub fn description(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn get_field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// All object types of a schema plus the names of its root types.
#[derive(Debug, Clone)]
pub struct Registry {
    query: &'static str,
    mutation: Option<&'static str>,
    objects: Vec<ObjectType>,
}

impl Registry {
    pub fn new(query: &'static str) -> Self {
        Self {
            query,
            mutation: None,
            objects: Vec::new(),
        }
    }

    pub fn with_mutation(mut self, mutation: &'static str) -> Self {
        self.mutation = Some(mutation);
        self
    }

    pub fn register(mut self, object: ObjectType) -> Self {
        self.objects.push(object);
        self
    }

    pub fn object(&self, name: &str) -> Option<&ObjectType> {
        self.objects.iter().find(|o| o.name == name)
    }

    pub fn query_type(&self) -> Option<&ObjectType> {
        self.object(self.query)
    }

    pub fn mutation_type(&self) -> Option<&ObjectType> {
        self.mutation.and_then(|name| self.object(name))
    }

    pub fn is_known_type(&self, name: &str) -> bool {
        ScalarType::from_name(name).is_some() || self.object(name).is_some()
    }

    /// Render the registry as schema definition language.
    pub fn to_sdl(&self) -> String {
        let mut sdl = String::new();
        for (i, object) in self.objects.iter().enumerate() {
            if i > 0 {
                sdl.push('\n');
            }
            if let Some(desc) = object.description {
                let _ = writeln!(sdl, "\"{}\"", desc);
            }
            let _ = writeln!(sdl, "type {} {{", object.name);
            for field in &object.fields {
                if let Some(desc) = field.description {
                    let _ = writeln!(sdl, "  \"{}\"", desc);
                }
                let _ = write!(sdl, "  {}", field.name);
                if !field.args.is_empty() {
                    let args: Vec<String> = field
                        .args
                        .iter()
                        .map(|a| format!("{}: {}", a.name, a.ty))
                        .collect();
                    let _ = write!(sdl, "({})", args.join(", "));
                }
                let _ = writeln!(sdl, ": {}", field.ty);
            }
            sdl.push_str("}\n");
        }
        sdl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &Resolved, _: &Arguments, _: &EntityStore) -> Result<Resolved> {
        Ok(Resolved::Null)
    }

    #[test]
    fn test_type_ref_display() {
        let ty = TypeRef::named("Pet").non_null().list().non_null();
        assert_eq!(ty.to_string(), "[Pet!]!");
        assert_eq!(ty.named_type(), "Pet");
        assert!(ty.is_non_null());
        assert!(!TypeRef::named(INT).is_non_null());
    }

    #[test]
    fn test_int_input_range() {
        assert!(ScalarType::Int.check_input(&Value::from(7)).is_ok());
        let err = ScalarType::Int
            .check_input(&Value::from(i64::from(i32::MAX) + 1))
            .unwrap_err();
        assert!(err.contains("32-bit"));
        assert!(
            ScalarType::Int
                .check_input(&Value::String("7".to_string()))
                .is_err()
        );
    }

    #[test]
    fn test_scalar_serialize_mismatch() {
        assert_eq!(
            ScalarType::String.serialize(&Resolved::from("Gary".to_string())),
            Ok(Value::String("Gary".to_string()))
        );
        assert!(ScalarType::String.serialize(&Resolved::Int(1)).is_err());
    }

    #[test]
    fn test_arguments_treat_null_as_absent() {
        let mut args = Arguments::new();
        args.insert("id", Value::Null);
        args.insert("name", Value::String("Zoe".to_string()));
        assert_eq!(args.int("id").unwrap(), None);
        assert_eq!(args.string("name").unwrap(), Some("Zoe".to_string()));
        assert!(args.int("name").is_err());
    }

    #[test]
    fn test_registry_lookup_and_sdl() {
        let registry = Registry::new("Query").register(
            ObjectType::new("Query").description("Root Query").field(
                FieldDescriptor::new("pet", TypeRef::named("Pet"), noop)
                    .description("A single pet")
                    .argument("id", TypeRef::named(INT)),
            ),
        );

        assert!(registry.query_type().is_some());
        assert!(registry.mutation_type().is_none());
        assert!(registry.is_known_type(INT));
        assert!(!registry.is_known_type("Pet"));

        let field = registry.object("Query").unwrap().get_field("pet").unwrap();
        assert!(field.arg("id").is_some());
        assert!(field.arg("name").is_none());

        let sdl = registry.to_sdl();
        assert!(sdl.contains("\"Root Query\"\ntype Query {"));
        assert!(sdl.contains("  pet(id: Int): Pet\n"));
    }
}
