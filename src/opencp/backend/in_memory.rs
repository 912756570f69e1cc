/*
 * Copyright (C) 2024 The OpenCP Authors
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 * http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use std::collections::HashSet;
use std::sync::Mutex;

use chrono::Utc;

use super::{BackendError, BackendFuture, CallContext, Filter, LoginService, ResourceBackend};
use crate::opencp::resources::{ResourceKind, WireObject};

/// Process-local backend used for development and tests.
///
/// Objects are kept in insertion order. Objects stored without metadata are
/// returned by `list` but can never be addressed by name.
pub struct InMemoryBackend<K: ResourceKind> {
    objects: Mutex<Vec<WireObject<K>>>,
    failure: Mutex<Option<BackendError>>,
}

impl<K: ResourceKind> Default for InMemoryBackend<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ResourceKind> InMemoryBackend<K> {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
        }
    }

    pub fn with_objects(objects: Vec<WireObject<K>>) -> Self {
        Self {
            objects: Mutex::new(objects),
            failure: Mutex::new(None),
        }
    }

    /// Stores `object` as-is, bypassing create-time defaulting.
    pub fn insert(&self, object: WireObject<K>) {
        self.objects
            .lock()
            .expect("in-memory backend lock poisoned")
            .push(object);
    }

    /// Makes every subsequent call fail with `error` until cleared with `None`.
    pub fn set_failure(&self, error: Option<BackendError>) {
        *self.failure.lock().expect("in-memory backend lock poisoned") = error;
    }

    fn check_failure(&self) -> Result<(), BackendError> {
        match self
            .failure
            .lock()
            .expect("in-memory backend lock poisoned")
            .as_ref()
        {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn matches(object: &WireObject<K>, filter: &Filter) -> bool {
        if let Some(namespace) = filter.namespace.as_deref().filter(|ns| !ns.is_empty()) {
            if object.namespace() != Some(namespace) {
                return false;
            }
        }
        match filter.name.as_deref() {
            Some(name) => object.name() == Some(name),
            None => true,
        }
    }

    fn list_now(&self, filter: &Filter) -> Result<Vec<WireObject<K>>, BackendError> {
        self.check_failure()?;
        let objects = self.objects.lock().expect("in-memory backend lock poisoned");
        Ok(objects
            .iter()
            .filter(|object| Self::matches(object, filter))
            .cloned()
            .collect())
    }

    fn get_now(&self, filter: &Filter) -> Result<Option<WireObject<K>>, BackendError> {
        if filter.name.is_none() {
            return Err(BackendError::Rejected {
                code: 400,
                message: "name is required".to_string(),
            });
        }
        Ok(self.list_now(filter)?.into_iter().next())
    }

    fn create_now(&self, mut object: WireObject<K>) -> Result<WireObject<K>, BackendError> {
        self.check_failure()?;
        let metadata = object.metadata.get_or_insert_with(Default::default);
        let name = match metadata.name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                return Err(BackendError::Rejected {
                    code: 400,
                    message: "metadata.name is required".to_string(),
                })
            }
        };
        if metadata.uid.is_none() {
            metadata.uid = Some(uuid::Uuid::new_v4().to_string());
        }
        if metadata.creation_timestamp.is_none() {
            metadata.creation_timestamp = Some(Utc::now());
        }
        if !K::descriptor().namespaced {
            metadata.namespace = None;
        }
        object.spec.get_or_insert_with(Default::default);
        object.status.get_or_insert_with(Default::default);

        let filter = Filter::named(name.clone(), object.namespace().map(str::to_string));
        let mut objects = self.objects.lock().expect("in-memory backend lock poisoned");
        if objects.iter().any(|existing| Self::matches(existing, &filter)) {
            return Err(BackendError::Rejected {
                code: 409,
                message: format!("{} {name} already exists", K::descriptor().kind),
            });
        }
        objects.push(object.clone());
        Ok(object)
    }

    fn delete_now(&self, filter: &Filter) -> Result<Option<WireObject<K>>, BackendError> {
        self.check_failure()?;
        if filter.name.is_none() {
            return Err(BackendError::Rejected {
                code: 400,
                message: "name is required".to_string(),
            });
        }
        let mut objects = self.objects.lock().expect("in-memory backend lock poisoned");
        let position = objects
            .iter()
            .position(|object| Self::matches(object, filter));
        Ok(position.map(|index| objects.remove(index)))
    }
}

impl<K: ResourceKind> ResourceBackend<K> for InMemoryBackend<K> {
    fn list<'a>(
        &'a self,
        _ctx: &'a CallContext,
        filter: Filter,
    ) -> BackendFuture<'a, Vec<WireObject<K>>> {
        Box::pin(async move { self.list_now(&filter) })
    }

    fn get<'a>(
        &'a self,
        _ctx: &'a CallContext,
        filter: Filter,
    ) -> BackendFuture<'a, Option<WireObject<K>>> {
        Box::pin(async move { self.get_now(&filter) })
    }

    fn create<'a>(
        &'a self,
        _ctx: &'a CallContext,
        object: WireObject<K>,
    ) -> BackendFuture<'a, WireObject<K>> {
        Box::pin(async move { self.create_now(object) })
    }

    fn delete<'a>(
        &'a self,
        _ctx: &'a CallContext,
        filter: Filter,
    ) -> BackendFuture<'a, Option<WireObject<K>>> {
        Box::pin(async move { self.delete_now(&filter) })
    }
}

/// Accepts a fixed set of tokens.
pub struct StaticTokenLogin {
    tokens: HashSet<String>,
}

impl StaticTokenLogin {
    pub fn new(tokens: impl IntoIterator<Item = String>) -> Self {
        Self {
            tokens: tokens.into_iter().collect(),
        }
    }
}

impl LoginService for StaticTokenLogin {
    fn check<'a>(&'a self, token: &'a str) -> BackendFuture<'a, bool> {
        Box::pin(async move { Ok(self.tokens.contains(token)) })
    }
}
