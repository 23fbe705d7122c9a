use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use super::seed::Seed;
use crate::{
    error::{PetqlError, Result},
    model::{Pet, User},
};

/// Process-wide owner of the user and pet collections.
///
/// Each collection sits behind its own lock. An append reads the length,
/// allocates the id and pushes while holding the write guard, so readers
/// never observe a half-applied append.
pub struct EntityStore {
    users: RwLock<Vec<User>>,
    pets: RwLock<Vec<Pet>>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::from_seed(Seed::default())
    }

    pub fn with_sample_data() -> Self {
        Self::from_seed(Seed::sample())
    }

    pub fn from_seed(seed: Seed) -> Self {
        Self {
            users: RwLock::new(seed.users),
            pets: RwLock::new(seed.pets),
        }
    }

    fn read_users(&self) -> Result<RwLockReadGuard<'_, Vec<User>>> {
        self.users
            .read()
            .map_err(|e| PetqlError::Storage(format!("Lock error: {}", e)))
    }

    fn read_pets(&self) -> Result<RwLockReadGuard<'_, Vec<Pet>>> {
        self.pets
            .read()
            .map_err(|e| PetqlError::Storage(format!("Lock error: {}", e)))
    }

    fn write_users(&self) -> Result<RwLockWriteGuard<'_, Vec<User>>> {
        self.users
            .write()
            .map_err(|e| PetqlError::Storage(format!("Lock error: {}", e)))
    }

    fn write_pets(&self) -> Result<RwLockWriteGuard<'_, Vec<Pet>>> {
        self.pets
            .write()
            .map_err(|e| PetqlError::Storage(format!("Lock error: {}", e)))
    }

    /// All users in insertion order.
    pub fn users(&self) -> Result<Vec<User>> {
        Ok(self.read_users()?.clone())
    }

    /// All pets in insertion order.
    pub fn pets(&self) -> Result<Vec<Pet>> {
        Ok(self.read_pets()?.clone())
    }

    /// First user whose id matches. `None` never matches anything.
    pub fn find_user(&self, id: Option<i32>) -> Result<Option<User>> {
        let users = self.read_users()?;
        Ok(users.iter().find(|u| Some(u.id) == id).cloned())
    }

    /// First pet whose id matches. `None` never matches anything.
    pub fn find_pet(&self, id: Option<i32>) -> Result<Option<Pet>> {
        let pets = self.read_pets()?;
        Ok(pets.iter().find(|p| Some(p.id) == id).cloned())
    }

    /// Pets referencing `user_id`, in insertion order.
    pub fn pets_owned_by(&self, user_id: i32) -> Result<Vec<Pet>> {
        let pets = self.read_pets()?;
        Ok(pets.iter().filter(|p| p.is_owned_by(user_id)).cloned().collect())
    }

    pub fn user_count(&self) -> Result<usize> {
        Ok(self.read_users()?.len())
    }

    pub fn pet_count(&self) -> Result<usize> {
        Ok(self.read_pets()?.len())
    }

    /// Append a user with `id = len + 1`.
    pub fn add_user(&self, name: String) -> Result<User> {
        let mut users = self.write_users()?;
        let user = User::new(next_id(users.len())?, name);
        users.push(user.clone());
        debug!(id = user.id, "Appended user");
        Ok(user)
    }

    /// Append a pet with `id = len + 1`. The owner is not checked.
    pub fn add_pet(&self, name: Option<String>, species: String, user_id: i32) -> Result<Pet> {
        let mut pets = self.write_pets()?;
        let pet = Pet::new(next_id(pets.len())?, species, user_id).with_name(name);
        pets.push(pet.clone());
        debug!(id = pet.id, user_id, "Appended pet");
        Ok(pet)
    }
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

// Ids are derived from the collection length. This stays unique only
// because nothing is ever removed.
fn next_id(len: usize) -> Result<i32> {
    len.checked_add(1)
        .and_then(|n| i32::try_from(n).ok())
        .ok_or_else(|| PetqlError::Storage("Id space exhausted".to_string()))
}
