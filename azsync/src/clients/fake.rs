//! In-memory resource client that records every call.

use std::sync::Mutex;

use async_trait::async_trait;

use super::ResourceClient;
use crate::context::Context;
use crate::error::ClientError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call<V> {
    Get { resource_group: String, name: String },
    CreateOrUpdate { resource_group: String, name: String, value: V },
    Delete { resource_group: String, name: String },
}

pub(crate) struct FakeClient<V> {
    calls: Mutex<Vec<Call<V>>>,
    get_error: Mutex<Option<ClientError>>,
    create_error: Mutex<Option<ClientError>>,
    delete_error: Mutex<Option<ClientError>>,
}

impl<V> FakeClient<V> {
    pub(crate) fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            get_error: Mutex::new(None),
            create_error: Mutex::new(None),
            delete_error: Mutex::new(None),
        }
    }

    pub(crate) fn with_get_error(self, err: ClientError) -> Self {
        *self.get_error.lock().unwrap() = Some(err);
        self
    }

    pub(crate) fn with_create_error(self, err: ClientError) -> Self {
        *self.create_error.lock().unwrap() = Some(err);
        self
    }

    pub(crate) fn with_delete_error(self, err: ClientError) -> Self {
        *self.delete_error.lock().unwrap() = Some(err);
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call<V>>
    where
        V: Clone,
    {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl<V: Default + Send + 'static> ResourceClient<V> for FakeClient<V> {
    async fn get(&self, _ctx: &Context, resource_group: &str, name: &str) -> Result<V, ClientError> {
        self.calls.lock().unwrap().push(Call::Get {
            resource_group: resource_group.to_string(),
            name: name.to_string(),
        });
        match self.get_error.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(V::default()),
        }
    }

    async fn create_or_update(
        &self,
        _ctx: &Context,
        resource_group: &str,
        name: &str,
        value: V,
    ) -> Result<(), ClientError> {
        self.calls.lock().unwrap().push(Call::CreateOrUpdate {
            resource_group: resource_group.to_string(),
            name: name.to_string(),
            value,
        });
        match self.create_error.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn delete(
        &self,
        _ctx: &Context,
        resource_group: &str,
        name: &str,
    ) -> Result<(), ClientError> {
        self.calls.lock().unwrap().push(Call::Delete {
            resource_group: resource_group.to_string(),
            name: name.to_string(),
        });
        match self.delete_error.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
