use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    model::{Pet, User},
};

/// Which built-in data set to start from when no seed file is given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedSource {
    #[default]
    Sample,
    Empty,
}

/// Initial contents of the store. Loaded once; never written back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub users: Vec<User>,

    #[serde(default)]
    pub pets: Vec<Pet>,
}

impl Seed {
    pub fn sample() -> Self {
        let users = vec![
            User::new(1, "Diane"),
            User::new(2, "Lydia"),
            User::new(3, "Ben"),
        ];
        let pets = [
            ("Gary", "dog", 1),
            ("Ashley", "cat", 1),
            ("Rolex", "hamster", 1),
            ("Sprite", "fish", 1),
            ("Tokyo", "cat", 2),
            ("Odie", "dog", 2),
            ("Juliette", "hamster", 3),
            ("Michelle", "hamster", 3),
        ]
        .into_iter()
        .zip(1..)
        .map(|((name, species, user_id), id)| {
            Pet::new(id, species, user_id).with_name(Some(name.to_string()))
        })
        .collect();
        Self { users, pets }
    }

    pub fn from_source(source: SeedSource) -> Self {
        match source {
            SeedSource::Sample => Self::sample(),
            SeedSource::Empty => Self::default(),
        }
    }

    /// Read a seed file. `.json` files are parsed as JSON, anything else as YAML.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let seed = if is_json {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };
        Ok(seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sample_ids_are_sequential() {
        let seed = Seed::sample();
        let ids: Vec<_> = seed.pets.iter().map(|p| p.id).collect();
        assert_eq!(ids, (1..=8).collect::<Vec<_>>());
        assert_eq!(seed.pets[7].name.as_deref(), Some("Michelle"));
        assert_eq!(seed.pets[7].user_id, 3);
    }

    #[test]
    fn test_load_yaml_seed() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("seed.yml");
        std::fs::write(
            &path,
            "users:\n  - id: 1\n    name: Ada\npets:\n  - id: 1\n    species: owl\n    userId: 1\n",
        )
        .unwrap();

        let seed = Seed::load(&path).unwrap();
        assert_eq!(seed.users, vec![User::new(1, "Ada")]);
        assert_eq!(seed.pets, vec![Pet::new(1, "owl", 1)]);
    }

    #[test]
    fn test_load_json_seed_without_pets() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("seed.json");
        std::fs::write(&path, r#"{"users": [{"id": 7, "name": "Grace"}]}"#).unwrap();

        let seed = Seed::load(&path).unwrap();
        assert_eq!(seed.users.len(), 1);
        assert!(seed.pets.is_empty());
    }

    #[test]
    fn test_load_missing_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        assert!(Seed::load(&temp_dir.path().join("nope.yml")).is_err());
    }
}
