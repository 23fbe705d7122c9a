//! Field resolvers: scalar passthroughs, relationship lookups, root
//! queries and mutations.
//!
//! Every resolver is a plain `fn` of `(parent, arguments, store)`. Derived
//! fields scan the store each time they are selected; nothing is memoized.

use tracing::debug;

use super::types::{Arguments, Resolved};
use crate::{
    error::{PetqlError, Result},
    model::{Pet, User},
    storage::EntityStore,
};

/// Owner of a pet: the first user whose id equals `pet.user_id`.
pub fn resolve_owner(pet: &Pet, store: &EntityStore) -> Result<Option<User>> {
    store.find_user(Some(pet.user_id))
}

/// Pets of a user in store insertion order. Empty, never absent.
pub fn resolve_owned_pets(user: &User, store: &EntityStore) -> Result<Vec<Pet>> {
    store.pets_owned_by(user.id)
}

fn as_user(parent: &Resolved) -> Result<&User> {
    match parent {
        Resolved::User(user) => Ok(user),
        _ => Err(PetqlError::Validation("Expected a User parent".to_string())),
    }
}

fn as_pet(parent: &Resolved) -> Result<&Pet> {
    match parent {
        Resolved::Pet(pet) => Ok(pet),
        _ => Err(PetqlError::Validation("Expected a Pet parent".to_string())),
    }
}

// User fields

pub(crate) fn user_id(parent: &Resolved, _: &Arguments, _: &EntityStore) -> Result<Resolved> {
    Ok(as_user(parent)?.id.into())
}

pub(crate) fn user_name(parent: &Resolved, _: &Arguments, _: &EntityStore) -> Result<Resolved> {
    Ok(as_user(parent)?.name.clone().into())
}

pub(crate) fn user_pets(
    parent: &Resolved,
    _: &Arguments,
    store: &EntityStore,
) -> Result<Resolved> {
    Ok(resolve_owned_pets(as_user(parent)?, store)?.into())
}

// Pet fields

pub(crate) fn pet_id(parent: &Resolved, _: &Arguments, _: &EntityStore) -> Result<Resolved> {
    Ok(as_pet(parent)?.id.into())
}

pub(crate) fn pet_name(parent: &Resolved, _: &Arguments, _: &EntityStore) -> Result<Resolved> {
    Ok(as_pet(parent)?.name.clone().into())
}

pub(crate) fn pet_species(parent: &Resolved, _: &Arguments, _: &EntityStore) -> Result<Resolved> {
    Ok(as_pet(parent)?.species.clone().into())
}

pub(crate) fn pet_user_id(parent: &Resolved, _: &Arguments, _: &EntityStore) -> Result<Resolved> {
    Ok(as_pet(parent)?.user_id.into())
}

pub(crate) fn pet_user(parent: &Resolved, _: &Arguments, store: &EntityStore) -> Result<Resolved> {
    Ok(resolve_owner(as_pet(parent)?, store)?.into())
}

// Query root

pub(crate) fn query_pet(_: &Resolved, args: &Arguments, store: &EntityStore) -> Result<Resolved> {
    Ok(store.find_pet(args.int("id")?)?.into())
}

pub(crate) fn query_pets(_: &Resolved, _: &Arguments, store: &EntityStore) -> Result<Resolved> {
    Ok(store.pets()?.into())
}

pub(crate) fn query_user(_: &Resolved, args: &Arguments, store: &EntityStore) -> Result<Resolved> {
    Ok(store.find_user(args.int("id")?)?.into())
}

pub(crate) fn query_users(_: &Resolved, _: &Arguments, store: &EntityStore) -> Result<Resolved> {
    Ok(store.users()?.into())
}

// Mutation root

fn required<T>(value: Option<T>, field: &str, argument: &str, ty: &str) -> Result<T> {
    value.ok_or_else(|| PetqlError::MissingArgument {
        field: field.to_string(),
        argument: argument.to_string(),
        ty: ty.to_string(),
    })
}

/// Arguments of `addPet(name: String, species: String!, userId: Int!)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddPetArgs {
    pub name: Option<String>,
    pub species: String,
    pub user_id: i32,
}

impl AddPetArgs {
    pub fn from_arguments(args: &Arguments) -> Result<Self> {
        Ok(Self {
            name: args.string("name")?,
            species: required(args.string("species")?, "addPet", "species", "String!")?,
            user_id: required(args.int("userId")?, "addPet", "userId", "Int!")?,
        })
    }
}

/// Arguments of `addUser(name: String!)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddUserArgs {
    pub name: String,
}

impl AddUserArgs {
    pub fn from_arguments(args: &Arguments) -> Result<Self> {
        Ok(Self {
            name: required(args.string("name")?, "addUser", "name", "String!")?,
        })
    }
}

pub fn add_pet(args: AddPetArgs, store: &EntityStore) -> Result<Pet> {
    debug!(species = %args.species, user_id = args.user_id, "Adding pet");
    store.add_pet(args.name, args.species, args.user_id)
}

pub fn add_user(args: AddUserArgs, store: &EntityStore) -> Result<User> {
    debug!(name = %args.name, "Adding user");
    store.add_user(args.name)
}

pub(crate) fn mutation_add_pet(
    _: &Resolved,
    args: &Arguments,
    store: &EntityStore,
) -> Result<Resolved> {
    let args = AddPetArgs::from_arguments(args)?;
    Ok(add_pet(args, store)?.into())
}

pub(crate) fn mutation_add_user(
    _: &Resolved,
    args: &Arguments,
    store: &EntityStore,
) -> Result<Resolved> {
    let args = AddUserArgs::from_arguments(args)?;
    Ok(add_user(args, store)?.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Seed;
    use async_graphql::Value;

    #[test]
    fn test_resolve_owner_matches_user_id() {
        let store = EntityStore::with_sample_data();
        for pet in store.pets().unwrap() {
            let owner = resolve_owner(&pet, &store).unwrap().unwrap();
            assert_eq!(owner.id, pet.user_id);
        }
    }

    #[test]
    fn test_resolve_owner_dangling_reference() {
        let store = EntityStore::with_sample_data();
        let pet = store.add_pet(None, "owl".to_string(), 77).unwrap();
        assert_eq!(resolve_owner(&pet, &store).unwrap(), None);
    }

    #[test]
    fn test_resolve_owned_pets_is_idempotent() {
        let store = EntityStore::with_sample_data();
        let lydia = store.find_user(Some(2)).unwrap().unwrap();
        let first = resolve_owned_pets(&lydia, &store).unwrap();
        let second = resolve_owned_pets(&lydia, &store).unwrap();
        assert_eq!(first, second);
        let names: Vec<_> = first.iter().filter_map(|p| p.name.as_deref()).collect();
        assert_eq!(names, vec!["Tokyo", "Odie"]);
    }

    #[test]
    fn test_resolve_owned_pets_empty_for_new_user() {
        let store = EntityStore::from_seed(Seed::sample());
        let zoe = store.add_user("Zoe".to_string()).unwrap();
        assert!(resolve_owned_pets(&zoe, &store).unwrap().is_empty());
    }

    #[test]
    fn test_add_pet_args_name_optional() {
        let mut args = Arguments::new();
        args.insert("species", Value::String("dog".to_string()));
        args.insert("userId", Value::from(1));
        let parsed = AddPetArgs::from_arguments(&args).unwrap();
        assert_eq!(
            parsed,
            AddPetArgs {
                name: None,
                species: "dog".to_string(),
                user_id: 1
            }
        );
    }

    #[test]
    fn test_add_user_args_missing_name() {
        let err = AddUserArgs::from_arguments(&Arguments::new()).unwrap_err();
        assert!(matches!(err, PetqlError::MissingArgument { ref argument, .. } if argument == "name"));
    }

    #[test]
    fn test_field_resolver_rejects_wrong_parent() {
        let store = EntityStore::new();
        let result = pet_species(&Resolved::Root, &Arguments::new(), &store);
        assert!(result.is_err());
    }
}
