//! Structural validation of an operation against the registry.
//!
//! Runs before any resolver. A non-empty error list means the request is
//! rejected as a whole with `data: null`. Missing required arguments are
//! left to execution, where they become field errors.

use std::collections::{HashMap, HashSet};

use async_graphql::parser::types::{
    BaseType, Directive, ExecutableDocument, Field, OperationDefinition, OperationType,
    Selection, SelectionSet, Type, VariableDefinition,
};
use async_graphql::{Pos, Positioned, ServerError, Value};
use async_graphql_value::Value as InputValue;

use super::types::{BOOLEAN, ObjectType, Registry, ScalarType, TypeRef};

pub const TYPENAME: &str = "__typename";

/// Validate one operation of `document`.
pub fn validate_operation(
    registry: &Registry,
    document: &ExecutableDocument,
    operation: &Positioned<OperationDefinition>,
) -> Vec<ServerError> {
    let mut validator = Validator {
        registry,
        document,
        variables: HashMap::new(),
        detached: false,
        spreading: Vec::new(),
        checked_fragments: HashSet::new(),
        errors: Vec::new(),
    };
    validator.validate(operation);
    validator.errors
}

struct Validator<'a> {
    registry: &'a Registry,
    document: &'a ExecutableDocument,
    variables: HashMap<&'a str, &'a VariableDefinition>,
    /// Set while checking fragments the operation never spreads, whose
    /// variables belong to some other operation.
    detached: bool,
    spreading: Vec<&'a str>,
    checked_fragments: HashSet<&'a str>,
    errors: Vec<ServerError>,
}

impl<'a> Validator<'a> {
    fn error(&mut self, message: impl Into<String>, pos: Pos) {
        self.errors.push(ServerError::new(message, Some(pos)));
    }

    fn validate(&mut self, operation: &'a Positioned<OperationDefinition>) {
        let root = match operation.node.ty {
            OperationType::Query => self.registry.query_type(),
            OperationType::Mutation => self.registry.mutation_type(),
            OperationType::Subscription => {
                self.error("Subscriptions are not supported.", operation.pos);
                return;
            }
        };
        let Some(root) = root else {
            self.error(
                format!("Schema is not configured for {}s.", operation.node.ty),
                operation.pos,
            );
            return;
        };

        for definition in &operation.node.variable_definitions {
            let name = definition.node.name.node.as_str();
            let var_type = &definition.node.var_type;
            if self.variables.insert(name, &definition.node).is_some() {
                self.error(
                    format!("There can be only one variable named \"${}\".", name),
                    definition.pos,
                );
            }
            let base = base_name(&var_type.node);
            if ScalarType::from_name(base).is_none() {
                self.error(
                    format!(
                        "Variable \"${}\" cannot be non-input type \"{}\".",
                        name, var_type.node
                    ),
                    var_type.pos,
                );
            } else if let Some(default) = &definition.node.default_value {
                if let Err(reason) = check_const(&var_type.node, &default.node) {
                    self.error(
                        format!("Variable \"${}\" has invalid default value: {}", name, reason),
                        default.pos,
                    );
                }
            }
        }

        self.validate_directives(&operation.node.directives);
        self.validate_selection_set(root, &operation.node.selection_set.node);
        self.validate_unreached_fragments();

        // Grouping follows spreads, so it only runs on an acyclic document.
        if self.errors.is_empty() {
            self.check_field_merging(vec![&operation.node.selection_set.node]);
        }
    }

    fn validate_unreached_fragments(&mut self) {
        let document = self.document;
        let mut unreached: Vec<_> = document
            .fragments
            .iter()
            .filter(|(name, _)| !self.checked_fragments.contains(name.as_str()))
            .collect();
        unreached.sort_by_key(|(_, fragment)| (fragment.pos.line, fragment.pos.column));

        self.detached = true;
        for (name, fragment) in unreached {
            let name = name.as_str();
            if !self.checked_fragments.insert(name) {
                continue;
            }
            let on = &fragment.node.type_condition.node.on;
            let Some(object) = self.registry.object(on.node.as_str()) else {
                self.error(format!("Unknown type \"{}\".", on.node), on.pos);
                continue;
            };
            self.spreading.push(name);
            self.validate_directives(&fragment.node.directives);
            self.validate_selection_set(object, &fragment.node.selection_set.node);
            self.spreading.pop();
        }
        self.detached = false;
    }

    /// Fields sharing a response key are executed once, so they must be the
    /// same field with the same arguments.
    fn check_field_merging(&mut self, selection_sets: Vec<&'a SelectionSet>) {
        let mut groups = KeyedFields::new();
        let mut visited = HashSet::new();
        for selection_set in selection_sets {
            self.group_fields(selection_set, &mut groups, &mut visited);
        }

        for (key, fields) in groups {
            let first = fields[0];
            let conflict = fields[1..].iter().find_map(|other| {
                let reason = if other.node.name.node != first.node.name.node {
                    format!(
                        "\"{}\" and \"{}\" are different fields",
                        first.node.name.node, other.node.name.node
                    )
                } else if !same_arguments(&first.node, &other.node) {
                    "they have differing arguments".to_string()
                } else {
                    return None;
                };
                Some((reason, other.pos))
            });
            match conflict {
                Some((reason, pos)) => self.error(
                    format!(
                        "Fields \"{}\" conflict because {}. Use different aliases on the fields to fetch both if this was intentional.",
                        key, reason
                    ),
                    pos,
                ),
                None => self.check_field_merging(
                    fields.iter().copied().map(|f| &f.node.selection_set.node).collect(),
                ),
            }
        }
    }

    fn group_fields(
        &self,
        selection_set: &'a SelectionSet,
        groups: &mut KeyedFields<'a>,
        visited: &mut HashSet<&'a str>,
    ) {
        for item in &selection_set.items {
            match &item.node {
                Selection::Field(field) => {
                    let key = field.node.response_key().node.as_str();
                    match groups.iter_mut().find(|(k, _)| *k == key) {
                        Some((_, fields)) => fields.push(field),
                        None => groups.push((key, vec![field])),
                    }
                }
                Selection::FragmentSpread(spread) => {
                    let name = spread.node.fragment_name.node.as_str();
                    if !visited.insert(name) {
                        continue;
                    }
                    if let Some(fragment) = self.document.fragments.get(name) {
                        self.group_fields(&fragment.node.selection_set.node, groups, visited);
                    }
                }
                Selection::InlineFragment(inline) => {
                    self.group_fields(&inline.node.selection_set.node, groups, visited);
                }
            }
        }
    }

    fn validate_selection_set(&mut self, parent: &'a ObjectType, selection_set: &'a SelectionSet) {
        for item in &selection_set.items {
            match &item.node {
                Selection::Field(field) => self.validate_field(parent, field),
                Selection::FragmentSpread(spread) => {
                    self.validate_directives(&spread.node.directives);
                    let name = spread.node.fragment_name.node.as_str();
                    let Some(fragment) = self.document.fragments.get(name) else {
                        self.error(format!("Unknown fragment \"{}\".", name), spread.pos);
                        continue;
                    };
                    if self.spreading.contains(&name) {
                        self.error(
                            format!("Cannot spread fragment \"{}\" within itself.", name),
                            spread.pos,
                        );
                        continue;
                    }
                    let on = &fragment.node.type_condition.node.on;
                    if !self.check_type_condition(parent, on.node.as_str(), on.pos) {
                        self.checked_fragments.insert(name);
                        continue;
                    }
                    if self.checked_fragments.insert(name) {
                        self.spreading.push(name);
                        self.validate_directives(&fragment.node.directives);
                        self.validate_selection_set(parent, &fragment.node.selection_set.node);
                        self.spreading.pop();
                    }
                }
                Selection::InlineFragment(inline) => {
                    self.validate_directives(&inline.node.directives);
                    if let Some(condition) = &inline.node.type_condition {
                        let on = &condition.node.on;
                        if !self.check_type_condition(parent, on.node.as_str(), on.pos) {
                            continue;
                        }
                    }
                    self.validate_selection_set(parent, &inline.node.selection_set.node);
                }
            }
        }
    }

    fn check_type_condition(&mut self, parent: &ObjectType, on: &str, pos: Pos) -> bool {
        if self.registry.object(on).is_none() {
            self.error(format!("Unknown type \"{}\".", on), pos);
            return false;
        }
        if on != parent.name {
            self.error(
                format!(
                    "Fragment cannot be spread here as objects of type \"{}\" can never be of type \"{}\".",
                    parent.name, on
                ),
                pos,
            );
            return false;
        }
        true
    }

    fn validate_field(&mut self, parent: &'a ObjectType, field: &'a Positioned<Field>) {
        let name = field.node.name.node.as_str();
        self.validate_directives(&field.node.directives);

        if name == TYPENAME {
            for (arg, _) in &field.node.arguments {
                self.error(
                    format!("Unknown argument \"{}\" on field \"{}\".", arg.node, TYPENAME),
                    arg.pos,
                );
            }
            if !field.node.selection_set.node.items.is_empty() {
                self.error(
                    format!(
                        "Field \"{}\" must not have a selection since type \"String!\" has no subfields.",
                        TYPENAME
                    ),
                    field.node.selection_set.pos,
                );
            }
            return;
        }

        let Some(descriptor) = parent.get_field(name) else {
            self.error(
                format!("Cannot query field \"{}\" on type \"{}\".", name, parent.name),
                field.pos,
            );
            return;
        };

        for (arg_name, value) in &field.node.arguments {
            match descriptor.arg(arg_name.node.as_str()) {
                Some(arg) => self.validate_value(&arg.ty, value),
                None => self.error(
                    format!(
                        "Unknown argument \"{}\" on field \"{}.{}\".",
                        arg_name.node, parent.name, name
                    ),
                    arg_name.pos,
                ),
            }
        }

        let selection = &field.node.selection_set;
        match self.registry.object(descriptor.ty.named_type()) {
            Some(_) if selection.node.items.is_empty() => self.error(
                format!(
                    "Field \"{}\" of type \"{}\" must have a selection of subfields. Did you mean \"{} {{ ... }}\"?",
                    name, descriptor.ty, name
                ),
                field.pos,
            ),
            Some(object) => self.validate_selection_set(object, &selection.node),
            None if !selection.node.items.is_empty() => self.error(
                format!(
                    "Field \"{}\" must not have a selection since type \"{}\" has no subfields.",
                    name, descriptor.ty
                ),
                selection.pos,
            ),
            None => {}
        }
    }

    fn validate_directives(&mut self, directives: &'a [Positioned<Directive>]) {
        for directive in directives {
            let name = directive.node.name.node.as_str();
            if name != "skip" && name != "include" {
                self.error(format!("Unknown directive \"@{}\".", name), directive.pos);
                continue;
            }
            let condition = TypeRef::named(BOOLEAN).non_null();
            match directive.node.get_argument("if") {
                Some(value) => self.validate_value(&condition, value),
                None => self.error(
                    format!(
                        "Directive \"@{}\" argument \"if\" of type \"Boolean!\" is required, but it was not provided.",
                        name
                    ),
                    directive.pos,
                ),
            }
        }
    }

    /// Check an argument value. Null is accepted here; required arguments
    /// are enforced when the field executes.
    fn validate_value(&mut self, ty: &TypeRef, value: &'a Positioned<InputValue>) {
        if let InputValue::Variable(var) = &value.node {
            if self.detached {
                return;
            }
            match self.variables.get(var.as_str()).copied() {
                None => self.error(format!("Variable \"${}\" is not defined.", var), value.pos),
                Some(definition) if !variable_fits(definition, ty) => self.error(
                    format!(
                        "Variable \"${}\" of type \"{}\" used in position expecting type \"{}\".",
                        var, definition.var_type.node, ty
                    ),
                    value.pos,
                ),
                Some(_) => {}
            }
            return;
        }

        let mut undefined = Vec::new();
        let literal = value.node.clone().into_const_with(|var| {
            if !self.detached && !self.variables.contains_key(var.as_str()) {
                undefined.push(var.to_string());
            }
            Ok::<_, std::convert::Infallible>(Value::Null)
        });
        for var in undefined {
            self.error(format!("Variable \"${}\" is not defined.", var), value.pos);
        }
        let Ok(literal) = literal;
        if let Err(reason) = check_type_ref(ty, &literal) {
            self.error(reason, value.pos);
        }
    }
}

/// Fields of one merged selection, grouped by response key.
type KeyedFields<'a> = Vec<(&'a str, Vec<&'a Positioned<Field>>)>;

fn same_arguments(a: &Field, b: &Field) -> bool {
    a.arguments.len() == b.arguments.len()
        && a.arguments.iter().all(|(name, value)| {
            b.get_argument(name.node.as_str())
                .is_some_and(|other| other.node == value.node)
        })
}

/// A nullable variable only fits a non-null position when it has a
/// non-null default.
fn variable_fits(definition: &VariableDefinition, location: &TypeRef) -> bool {
    let var_type = &definition.var_type.node;
    let has_default = definition
        .default_value
        .as_ref()
        .is_some_and(|default| !matches!(default.node, Value::Null));
    type_fits(&var_type.base, var_type.nullable && !has_default, location)
}

fn type_fits(base: &BaseType, nullable: bool, location: &TypeRef) -> bool {
    match location {
        TypeRef::NonNull(inner) => !nullable && type_fits(base, true, inner),
        _ if !nullable => type_fits(base, true, location),
        TypeRef::List(inner) => match base {
            BaseType::List(item) => type_fits(&item.base, item.nullable, inner),
            BaseType::Named(_) => false,
        },
        TypeRef::Named(name) => match base {
            BaseType::Named(var_name) => var_name.as_str() == *name,
            BaseType::List(_) => false,
        },
    }
}

fn base_name(ty: &Type) -> &str {
    match &ty.base {
        BaseType::Named(name) => name.as_str(),
        BaseType::List(inner) => base_name(inner),
    }
}

fn check_type_ref(ty: &TypeRef, value: &Value) -> Result<(), String> {
    match (ty, value) {
        (_, Value::Null) => Ok(()),
        (TypeRef::NonNull(inner), _) => check_type_ref(inner, value),
        (TypeRef::List(inner), Value::List(items)) => {
            items.iter().try_for_each(|item| check_type_ref(inner, item))
        }
        (TypeRef::List(inner), _) => check_type_ref(inner, value),
        (TypeRef::Named(name), _) => match ScalarType::from_name(name) {
            Some(scalar) => scalar.check_input(value),
            None => Err(format!("Type \"{}\" is not an input type.", name)),
        },
    }
}

/// Check a constant value against a type written in a document
/// (variable definitions).
pub fn check_const(ty: &Type, value: &Value) -> Result<(), String> {
    if let Value::Null = value {
        return if ty.nullable {
            Ok(())
        } else {
            Err(format!("Expected non-nullable type \"{}\" not to be null.", ty))
        };
    }
    match &ty.base {
        BaseType::List(inner) => match value {
            Value::List(items) => items.iter().try_for_each(|item| check_const(inner, item)),
            other => check_const(inner, other),
        },
        BaseType::Named(name) => match ScalarType::from_name(name.as_str()) {
            Some(scalar) => scalar.check_input(value),
            None => Err(format!("Type \"{}\" is not an input type.", name)),
        },
    }
}
