//! In-memory user storage backing the demo.

use std::collections::HashMap;

use parking_lot::RwLock;
use rand::Rng;
use serde::Serialize;

/// A stored user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: u32,
    pub name: String,
}

/// Users keyed by id, readable from many workers at once.
pub struct Storage {
    users: RwLock<HashMap<u32, User>>,
}

impl Storage {
    /// Seed `count` users with ids `1..=count`.
    pub fn seeded(count: u32) -> Self {
        let users = (1..=count)
            .map(|id| {
                let user = User {
                    id,
                    name: format!("User {}", id),
                };
                (id, user)
            })
            .collect();

        Self {
            users: RwLock::new(users),
        }
    }

    pub fn query_user(&self, id: u32) -> Option<User> {
        self.users.read().get(&id).cloned()
    }

    /// Pick each stored id with probability 1 / (len / 10).
    pub fn random_ids(&self) -> Vec<u32> {
        let users = self.users.read();
        let range = (users.len() / 10).max(1);
        let mut rng = rand::thread_rng();

        users
            .keys()
            .copied()
            .filter(|_| rng.gen_range(0..range) == 0)
            .collect()
    }
}
