//! Read-only views of cluster objects that a pass reads from.
//!
//! Passes never talk to the API server. Everything they see comes through these traits, backed
//! by reflector stores in production and by [`StaticSnapshot`] in tests.

use std::{fmt::Debug, hash::Hash, sync::Arc};

use itertools::Itertools;
use kube::{
    Resource, ResourceExt,
    api::ObjectMeta,
    runtime::reflector::{ObjectRef, Store},
};

/// Lists the objects of one kind, ordered by namespace and name
pub trait Snapshot<K>: Send + Sync {
    /// Objects in `namespace`, or in all namespaces for `None`
    fn list(&self, namespace: Option<&str>) -> Vec<Arc<K>>;
}

/// A snapshot that can also fetch single objects
pub trait IndexedSnapshot<K>: Snapshot<K> {
    fn get(&self, namespace: &str, name: &str) -> Option<Arc<K>>;
}

fn in_namespace(meta: &ObjectMeta, namespace: Option<&str>) -> bool {
    namespace.is_none_or(|ns| meta.namespace.as_deref() == Some(ns))
}

fn sorted<K: Resource>(objs: impl IntoIterator<Item = Arc<K>>) -> Vec<Arc<K>> {
    objs.into_iter()
        .sorted_by(|a, b| {
            (a.namespace(), a.name_any()).cmp(&(b.namespace(), b.name_any()))
        })
        .collect_vec()
}

impl<K> Snapshot<K> for Store<K>
where
    K: Resource + Clone + Send + Sync + 'static,
    K::DynamicType: Default + Eq + Hash + Clone + Send + Sync,
{
    fn list(&self, namespace: Option<&str>) -> Vec<Arc<K>> {
        sorted(
            self.state()
                .into_iter()
                .filter(|obj| in_namespace(obj.meta(), namespace)),
        )
    }
}

impl<K> IndexedSnapshot<K> for Store<K>
where
    K: Resource + Clone + Send + Sync + 'static,
    K::DynamicType: Default + Eq + Hash + Clone + Send + Sync,
{
    fn get(&self, namespace: &str, name: &str) -> Option<Arc<K>> {
        Store::get(self, &ObjectRef::new(name).within(namespace))
    }
}

/// A fixed set of objects
#[derive(Debug, Clone)]
pub struct StaticSnapshot<K> {
    objects: Vec<Arc<K>>,
}

impl<K: Resource> StaticSnapshot<K> {
    pub fn new(objects: impl IntoIterator<Item = K>) -> StaticSnapshot<K> {
        StaticSnapshot {
            objects: sorted(objects.into_iter().map(Arc::new)),
        }
    }
}

impl<K> Default for StaticSnapshot<K> {
    fn default() -> Self {
        StaticSnapshot { objects: vec![] }
    }
}

impl<K: Resource + Debug + Send + Sync> Snapshot<K> for StaticSnapshot<K> {
    fn list(&self, namespace: Option<&str>) -> Vec<Arc<K>> {
        self.objects
            .iter()
            .filter(|obj| in_namespace(obj.meta(), namespace))
            .cloned()
            .collect_vec()
    }
}

impl<K: Resource + Debug + Send + Sync> IndexedSnapshot<K> for StaticSnapshot<K> {
    fn get(&self, namespace: &str, name: &str) -> Option<Arc<K>> {
        self.objects
            .iter()
            .find(|obj| {
                obj.meta().namespace.as_deref() == Some(namespace)
                    && obj.meta().name.as_deref() == Some(name)
            })
            .cloned()
    }
}
