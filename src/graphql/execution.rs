//! Request execution: operation selection, variable coercion, and the
//! recursive tree walk that produces the result and its errors in one pass.
//!
//! Null handling follows the usual GraphQL rules. A nullable position that
//! fails becomes `null` in place. A non-null position that resolves to
//! null records one error and makes the nearest nullable ancestor `null`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_graphql::parser::parse_query;
use async_graphql::parser::types::{
    Directive, DocumentOperations, ExecutableDocument, Field, OperationDefinition, OperationType,
    Selection, SelectionSet,
};
use async_graphql::{Name, PathSegment, Pos, Positioned, Request, Response, ServerError, Value};
use async_graphql_value::Value as InputValue;
use tracing::{debug, warn};

use super::types::{
    Arguments, FieldDescriptor, ObjectType, Registry, Resolved, ScalarType, TypeRef,
};
use super::validation::{TYPENAME, check_const, validate_operation};
use crate::{error::PetqlError, storage::EntityStore};

/// Executes requests against a registry and a shared store.
///
/// Cheap to clone; clones share the same registry and store.
#[derive(Clone)]
pub struct Engine {
    registry: Arc<Registry>,
    store: Arc<EntityStore>,
}

impl Engine {
    pub fn new(registry: Arc<Registry>, store: Arc<EntityStore>) -> Self {
        Self { registry, store }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Execute one request to completion.
    ///
    /// Parse and validation failures reject the whole request with
    /// `data: null`. Everything after that is recovered per field.
    pub fn execute(&self, request: Request) -> Response {
        let document = match parse_query(&request.query) {
            Ok(document) => document,
            Err(err) => {
                warn!(error = %err, "Failed to parse request");
                return Response::from_errors(vec![ServerError::new(
                    err.to_string(),
                    err.positions().next(),
                )]);
            }
        };

        let operation = match select_operation(&document, request.operation_name.as_deref()) {
            Ok(operation) => operation,
            Err(err) => return Response::from_errors(vec![err]),
        };

        let errors = validate_operation(&self.registry, &document, operation);
        if !errors.is_empty() {
            warn!(count = errors.len(), "Request failed validation");
            return Response::from_errors(errors);
        }

        let variables = match coerce_variables(&operation.node, &request.variables) {
            Ok(variables) => variables,
            Err(errors) => return Response::from_errors(errors),
        };

        debug!(operation = %operation.node.ty, "Executing operation");
        let mut ctx = ExecutionContext {
            registry: &self.registry,
            store: &self.store,
            document: &document,
            variables,
            errors: Vec::new(),
        };
        let data = ctx.execute_operation(&operation.node);

        if !ctx.errors.is_empty() {
            debug!(count = ctx.errors.len(), "Operation completed with field errors");
        }
        let mut response = Response::new(data);
        response.errors = ctx.errors;
        response
    }
}

fn select_operation<'d>(
    document: &'d ExecutableDocument,
    operation_name: Option<&str>,
) -> Result<&'d Positioned<OperationDefinition>, ServerError> {
    match &document.operations {
        DocumentOperations::Single(operation) => Ok(operation),
        DocumentOperations::Multiple(operations) => match operation_name {
            Some(name) => operations.get(name).ok_or_else(|| {
                ServerError::new(format!("Unknown operation named \"{}\".", name), None)
            }),
            None if operations.len() == 1 => operations
                .values()
                .next()
                .ok_or_else(|| ServerError::new("Operation not found.", None)),
            None => Err(ServerError::new(
                "Must provide operation name if query contains multiple operations.",
                None,
            )),
        },
    }
}

fn coerce_variables(
    operation: &OperationDefinition,
    provided: &async_graphql::Variables,
) -> Result<HashMap<String, Value>, Vec<ServerError>> {
    let mut variables = HashMap::new();
    let mut errors = Vec::new();

    for definition in &operation.variable_definitions {
        let name = definition.node.name.node.as_str();
        let var_type = &definition.node.var_type.node;
        let value = match provided.get(name) {
            Some(value) => Some(value.clone()),
            None => definition.node.default_value.as_ref().map(|d| d.node.clone()),
        };

        match value {
            None if !var_type.nullable => errors.push(ServerError::new(
                format!(
                    "Variable \"${}\" of required type \"{}\" was not provided.",
                    name, var_type
                ),
                Some(definition.pos),
            )),
            None => {}
            Some(value) => match check_const(var_type, &value) {
                Ok(()) => {
                    variables.insert(name.to_string(), value);
                }
                Err(reason) => errors.push(ServerError::new(
                    format!("Variable \"${}\" got invalid value {}; {}", name, value, reason),
                    Some(definition.pos),
                )),
            },
        }
    }

    if errors.is_empty() {
        Ok(variables)
    } else {
        Err(errors)
    }
}

/// Marker: this position resolved to null but must not be null.
#[derive(Debug)]
struct InvalidValue;

type Completed = Result<Value, InvalidValue>;

/// Fields of one selection set grouped by response key, in order.
type FieldGroups<'a> = Vec<(&'a str, Vec<&'a Positioned<Field>>)>;

struct ExecutionContext<'a> {
    registry: &'a Registry,
    store: &'a EntityStore,
    document: &'a ExecutableDocument,
    variables: HashMap<String, Value>,
    errors: Vec<ServerError>,
}

impl<'a> ExecutionContext<'a> {
    fn execute_operation(&mut self, operation: &'a OperationDefinition) -> Value {
        let root = match operation.ty {
            OperationType::Mutation => self.registry.mutation_type(),
            _ => self.registry.query_type(),
        };
        let Some(root) = root else {
            return Value::Null;
        };
        let groups = self.collect_fields(root, [&operation.selection_set.node]);
        let mut path = Vec::new();
        // Root fields run in document order, so mutations apply serially.
        self.execute_fields(root, &Resolved::Root, groups, &mut path)
            .unwrap_or(Value::Null)
    }

    fn push_error(&mut self, message: impl Into<String>, pos: Pos, path: &[PathSegment]) {
        let mut error = ServerError::new(message, Some(pos));
        error.path = path.to_vec();
        self.errors.push(error);
    }

    fn collect_fields<I>(&self, object: &ObjectType, selection_sets: I) -> FieldGroups<'a>
    where
        I: IntoIterator<Item = &'a SelectionSet>,
    {
        let mut groups = FieldGroups::new();
        let mut visited = HashSet::new();
        for selection_set in selection_sets {
            self.collect_into(object, selection_set, &mut groups, &mut visited);
        }
        groups
    }

    fn collect_into(
        &self,
        object: &ObjectType,
        selection_set: &'a SelectionSet,
        groups: &mut FieldGroups<'a>,
        visited: &mut HashSet<&'a str>,
    ) {
        for item in &selection_set.items {
            match &item.node {
                Selection::Field(field) => {
                    if !self.should_include(&field.node.directives) {
                        continue;
                    }
                    let key = field.node.response_key().node.as_str();
                    match groups.iter_mut().find(|(k, _)| *k == key) {
                        Some((_, fields)) => fields.push(field),
                        None => groups.push((key, vec![field])),
                    }
                }
                Selection::FragmentSpread(spread) => {
                    let name = spread.node.fragment_name.node.as_str();
                    if !self.should_include(&spread.node.directives) || !visited.insert(name) {
                        continue;
                    }
                    let Some(fragment) = self.document.fragments.get(name) else {
                        continue;
                    };
                    if fragment.node.type_condition.node.on.node.as_str() != object.name {
                        continue;
                    }
                    self.collect_into(object, &fragment.node.selection_set.node, groups, visited);
                }
                Selection::InlineFragment(inline) => {
                    if !self.should_include(&inline.node.directives) {
                        continue;
                    }
                    let applies = inline
                        .node
                        .type_condition
                        .as_ref()
                        .is_none_or(|c| c.node.on.node.as_str() == object.name);
                    if applies {
                        self.collect_into(object, &inline.node.selection_set.node, groups, visited);
                    }
                }
            }
        }
    }

    fn should_include(&self, directives: &[Positioned<Directive>]) -> bool {
        directives.iter().all(|directive| {
            let condition = directive
                .node
                .get_argument("if")
                .map(|value| self.input_value(&value.node))
                .is_some_and(|value| matches!(value, Value::Boolean(true)));
            match directive.node.name.node.as_str() {
                "skip" => !condition,
                "include" => condition,
                _ => true,
            }
        })
    }

    /// Substitute variables into a document value. Unset variables read as null.
    fn input_value(&self, value: &InputValue) -> Value {
        let substituted = value.clone().into_const_with(|name| {
            Ok::<_, std::convert::Infallible>(
                self.variables.get(name.as_str()).cloned().unwrap_or(Value::Null),
            )
        });
        let Ok(value) = substituted;
        value
    }

    fn execute_fields(
        &mut self,
        object: &'a ObjectType,
        parent: &Resolved,
        groups: FieldGroups<'a>,
        path: &mut Vec<PathSegment>,
    ) -> Completed {
        let mut output = Vec::with_capacity(groups.len());
        for (key, fields) in groups {
            path.push(PathSegment::Field(key.to_string()));
            let value = self.execute_field(object, parent, &fields, path);
            path.pop();
            output.push((Name::new(key), value?));
        }
        Ok(Value::Object(output.into_iter().collect()))
    }

    fn execute_field(
        &mut self,
        object: &'a ObjectType,
        parent: &Resolved,
        fields: &[&'a Positioned<Field>],
        path: &mut Vec<PathSegment>,
    ) -> Completed {
        let field = fields[0];
        let name = field.node.name.node.as_str();
        if name == TYPENAME {
            return Ok(Value::String(object.name.to_string()));
        }
        let Some(descriptor) = object.get_field(name) else {
            self.push_error(
                format!("Cannot query field \"{}\" on type \"{}\".", name, object.name),
                field.pos,
                path,
            );
            return Ok(Value::Null);
        };

        let resolved = self
            .coerce_arguments(descriptor, &field.node)
            .and_then(|args| (descriptor.resolver)(parent, &args, self.store));
        match resolved {
            Ok(resolved) => {
                self.complete_value(object, descriptor, &descriptor.ty, resolved, fields, path)
            }
            Err(err) => {
                self.push_error(err.to_string(), field.pos, path);
                if descriptor.ty.is_non_null() {
                    Err(InvalidValue)
                } else {
                    Ok(Value::Null)
                }
            }
        }
    }

    /// Build the argument set a resolver sees. Required arguments that are
    /// missing or null fail the field before the resolver runs.
    fn coerce_arguments(
        &self,
        descriptor: &FieldDescriptor,
        field: &Field,
    ) -> crate::error::Result<Arguments> {
        let mut args = Arguments::new();
        for arg in &descriptor.args {
            let value = match field.get_argument(arg.name).map(|v| &v.node) {
                None => None,
                Some(InputValue::Variable(var)) => self.variables.get(var.as_str()).cloned(),
                Some(value) => Some(self.input_value(value)),
            };
            match value {
                None if arg.ty.is_non_null() => {
                    return Err(PetqlError::MissingArgument {
                        field: descriptor.name.to_string(),
                        argument: arg.name.to_string(),
                        ty: arg.ty.to_string(),
                    });
                }
                None => {}
                Some(Value::Null) if arg.ty.is_non_null() => {
                    return Err(PetqlError::InvalidArgument {
                        argument: arg.name.to_string(),
                        reason: format!("Expected value of type \"{}\", found null.", arg.ty),
                    });
                }
                Some(value) => {
                    if let Some(scalar) = ScalarType::from_name(arg.ty.named_type()) {
                        if !matches!(value, Value::Null) {
                            scalar.check_input(&value).map_err(|reason| {
                                PetqlError::InvalidArgument {
                                    argument: arg.name.to_string(),
                                    reason,
                                }
                            })?;
                        }
                    }
                    args.insert(arg.name, value);
                }
            }
        }
        Ok(args)
    }

    #[allow(clippy::too_many_arguments)]
    fn complete_value(
        &mut self,
        object: &'a ObjectType,
        descriptor: &'a FieldDescriptor,
        ty: &TypeRef,
        resolved: Resolved,
        fields: &[&'a Positioned<Field>],
        path: &mut Vec<PathSegment>,
    ) -> Completed {
        match ty {
            TypeRef::NonNull(inner) => {
                let value =
                    self.complete_inner(object, descriptor, inner, resolved, fields, path)?;
                if value != Value::Null {
                    return Ok(value);
                }
                let message = match path.last() {
                    Some(PathSegment::Index(i)) => format!(
                        "Cannot return null for non-nullable array element of type {} at index {}.",
                        inner, i
                    ),
                    _ => format!(
                        "Cannot return null for non-nullable field {}.{}.",
                        object.name, descriptor.name
                    ),
                };
                self.push_error(message, fields[0].pos, path);
                Err(InvalidValue)
            }
            _ => Ok(self
                .complete_inner(object, descriptor, ty, resolved, fields, path)
                .unwrap_or(Value::Null)),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn complete_inner(
        &mut self,
        object: &'a ObjectType,
        descriptor: &'a FieldDescriptor,
        ty: &TypeRef,
        resolved: Resolved,
        fields: &[&'a Positioned<Field>],
        path: &mut Vec<PathSegment>,
    ) -> Completed {
        if resolved.is_null() {
            return Ok(Value::Null);
        }
        match ty {
            TypeRef::NonNull(_) => {
                self.complete_value(object, descriptor, ty, resolved, fields, path)
            }
            TypeRef::List(inner) => {
                let Resolved::List(items) = resolved else {
                    self.push_error(
                        format!(
                            "Expected a list for field {}.{}.",
                            object.name, descriptor.name
                        ),
                        fields[0].pos,
                        path,
                    );
                    return Ok(Value::Null);
                };
                let mut output = Vec::with_capacity(items.len());
                for (i, item) in items.into_iter().enumerate() {
                    path.push(PathSegment::Index(i));
                    let value = self.complete_value(object, descriptor, inner, item, fields, path);
                    path.pop();
                    output.push(value?);
                }
                Ok(Value::List(output))
            }
            TypeRef::Named(name) => {
                if let Some(scalar) = ScalarType::from_name(name) {
                    return match scalar.serialize(&resolved) {
                        Ok(value) => Ok(value),
                        Err(message) => {
                            self.push_error(message, fields[0].pos, path);
                            Ok(Value::Null)
                        }
                    };
                }
                let target = match self.registry.object(name) {
                    Some(target) if resolved.object_type() == Some(target.name) => target,
                    _ => {
                        self.push_error(
                            format!("Expected value of type \"{}\".", name),
                            fields[0].pos,
                            path,
                        );
                        return Ok(Value::Null);
                    }
                };
                let groups = self.collect_fields(
                    target,
                    fields.iter().copied().map(|f| &f.node.selection_set.node),
                );
                self.execute_fields(target, &resolved, groups, path)
            }
        }
    }
}
