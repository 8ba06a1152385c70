/// In-memory store
///
/// Mirrors the PostgreSQL schema closely enough for the API test-suite and
/// for running the server without a database (`TODO_STORE=memory`):
/// unique case-insensitive emails, hashed tokens, cascade-free owner-scoped
/// todos ordered newest first. All state lives behind one `RwLock`, so every
/// operation is atomic.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Store, StoreError, TodoStore, TokenStore, UserStore};
use crate::auth::token::constant_time_compare;
use crate::models::access_token::{AccessToken, CreateAccessToken};
use crate::models::todo::{NewTodo, Pagination, Todo, UpdateTodo};
use crate::models::user::{normalize_email, CreateUser, User};

#[derive(Debug, Default)]
struct State {
    users: HashMap<Uuid, User>,
    tokens: Vec<(u64, AccessToken)>,
    todos: HashMap<Uuid, (u64, Todo)>,
    // Insertion counter; breaks created_at ties when ordering
    seq: u64,
}

impl State {
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }
}

/// Store holding everything in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, data: CreateUser) -> Result<User, StoreError> {
        let email = normalize_email(&data.email);
        let mut state = self.state.write().await;

        if state.users.values().any(|u| u.email == email) {
            return Err(StoreError::DuplicateEmail);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: data.name,
            email,
            password_hash: data.password_hash,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let email = normalize_email(email);
        let state = self.state.read().await;

        Ok(state.users.values().find(|u| u.email == email).cloned())
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn insert_token(&self, data: CreateAccessToken) -> Result<AccessToken, StoreError> {
        let mut state = self.state.write().await;

        let token = AccessToken {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            name: data.name,
            token_hash: data.token_hash,
            created_at: Utc::now(),
            last_used_at: None,
            expires_at: None,
        };
        let seq = state.next_seq();
        state.tokens.push((seq, token.clone()));

        Ok(token)
    }

    async fn touch_token(&self, token_hash: &str) -> Result<Option<AccessToken>, StoreError> {
        let mut state = self.state.write().await;

        let found = state
            .tokens
            .iter_mut()
            .map(|(_, t)| t)
            .find(|t| constant_time_compare(&t.token_hash, token_hash) && !t.is_expired());

        Ok(found.map(|token| {
            token.last_used_at = Some(Utc::now());
            token.clone()
        }))
    }

    async fn delete_token(&self, token_hash: &str) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        let before = state.tokens.len();
        state
            .tokens
            .retain(|(_, t)| !constant_time_compare(&t.token_hash, token_hash));

        Ok(state.tokens.len() < before)
    }

    async fn list_tokens(&self, user_id: Uuid) -> Result<Vec<AccessToken>, StoreError> {
        let state = self.state.read().await;
        let mut tokens: Vec<&(u64, AccessToken)> = state
            .tokens
            .iter()
            .filter(|(_, t)| t.user_id == user_id)
            .collect();
        tokens.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(tokens.into_iter().map(|(_, t)| t.clone()).collect())
    }
}

#[async_trait]
impl TodoStore for MemoryStore {
    async fn list_by_owner(
        &self,
        owner: Uuid,
        pagination: Pagination,
    ) -> Result<Vec<Todo>, StoreError> {
        let state = self.state.read().await;

        let mut todos: Vec<&(u64, Todo)> = state
            .todos
            .values()
            .filter(|(_, t)| t.user_id == owner)
            .collect();
        todos.sort_by(|(seq_a, a), (seq_b, b)| {
            b.created_at.cmp(&a.created_at).then(seq_b.cmp(seq_a))
        });

        Ok(todos
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.per_page() as usize)
            .map(|(_, t)| t.clone())
            .collect())
    }

    async fn count_by_owner(&self, owner: Uuid) -> Result<i64, StoreError> {
        let state = self.state.read().await;

        Ok(state.todos.values().filter(|(_, t)| t.user_id == owner).count() as i64)
    }

    async fn find_todo(&self, id: Uuid) -> Result<Option<Todo>, StoreError> {
        Ok(self.state.read().await.todos.get(&id).map(|(_, t)| t.clone()))
    }

    async fn create_todo(&self, owner: Uuid, data: NewTodo) -> Result<Todo, StoreError> {
        let mut state = self.state.write().await;

        let now = Utc::now();
        let todo = Todo {
            id: Uuid::new_v4(),
            user_id: owner,
            title: data.title().to_string(),
            description: data.description().map(str::to_string),
            is_completed: false,
            due_at: data.due_at(),
            created_at: now,
            updated_at: now,
        };
        let seq = state.next_seq();
        state.todos.insert(todo.id, (seq, todo.clone()));

        Ok(todo)
    }

    async fn update_todo(&self, id: Uuid, data: UpdateTodo) -> Result<Option<Todo>, StoreError> {
        let mut state = self.state.write().await;

        Ok(state.todos.get_mut(&id).map(|(_, todo)| {
            data.apply_to(todo);
            todo.updated_at = Utc::now();
            todo.clone()
        }))
    }

    async fn delete_todo(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.state.write().await.todos.remove(&id).is_some())
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
