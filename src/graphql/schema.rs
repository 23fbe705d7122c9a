use std::sync::Arc;

use super::execution::Engine;
use super::resolvers;
use super::types::{FieldDescriptor, INT, ObjectType, Registry, STRING, TypeRef};
use crate::storage::EntityStore;

pub const QUERY: &str = "Query";
pub const MUTATION: &str = "Mutation";
pub const USER: &str = "User";
pub const PET: &str = "Pet";

fn int() -> TypeRef {
    TypeRef::named(INT)
}

fn string() -> TypeRef {
    TypeRef::named(STRING)
}

fn pet_type() -> ObjectType {
    ObjectType::new(PET)
        .description("This represents a pet owned by a user.")
        .field(FieldDescriptor::new("id", int().non_null(), resolvers::pet_id))
        .field(FieldDescriptor::new("name", string(), resolvers::pet_name))
        .field(FieldDescriptor::new(
            "species",
            string().non_null(),
            resolvers::pet_species,
        ))
        .field(FieldDescriptor::new(
            "userId",
            int().non_null(),
            resolvers::pet_user_id,
        ))
        .field(FieldDescriptor::new(
            "user",
            TypeRef::named(USER),
            resolvers::pet_user,
        ))
}

fn user_type() -> ObjectType {
    ObjectType::new(USER)
        .description("This represents an user who owns pets.")
        .field(FieldDescriptor::new("id", int().non_null(), resolvers::user_id))
        .field(FieldDescriptor::new(
            "name",
            string().non_null(),
            resolvers::user_name,
        ))
        .field(FieldDescriptor::new(
            "pets",
            TypeRef::named(PET).list(),
            resolvers::user_pets,
        ))
}

fn query_type() -> ObjectType {
    ObjectType::new(QUERY)
        .description("Root Query")
        .field(
            FieldDescriptor::new("pet", TypeRef::named(PET), resolvers::query_pet)
                .description("A single pet")
                .argument("id", int()),
        )
        .field(
            FieldDescriptor::new("pets", TypeRef::named(PET).list(), resolvers::query_pets)
                .description("List of Pets"),
        )
        .field(
            FieldDescriptor::new("user", TypeRef::named(USER), resolvers::query_user)
                .description("A single user")
                .argument("id", int()),
        )
        .field(
            FieldDescriptor::new(
                "users",
                TypeRef::named(USER).list(),
                resolvers::query_users,
            )
            .description("List of All Users"),
        )
}

fn mutation_type() -> ObjectType {
    ObjectType::new(MUTATION)
        .description("Root Mutation")
        .field(
            FieldDescriptor::new(
                "addPet",
                TypeRef::named(PET),
                resolvers::mutation_add_pet,
            )
            .description("Add a pet")
            .argument("name", string())
            .argument("species", string().non_null())
            .argument("userId", int().non_null()),
        )
        .field(
            FieldDescriptor::new(
                "addUser",
                TypeRef::named(USER),
                resolvers::mutation_add_user,
            )
            .description("Add a user")
            .argument("name", string().non_null()),
        )
}

/// The users-and-pets registry, built once at startup.
pub fn build_registry() -> Registry {
    Registry::new(QUERY)
        .with_mutation(MUTATION)
        .register(pet_type())
        .register(user_type())
        .register(query_type())
        .register(mutation_type())
}

pub fn build_engine(store: Arc<EntityStore>) -> Engine {
    Engine::new(Arc::new(build_registry()), store)
}
