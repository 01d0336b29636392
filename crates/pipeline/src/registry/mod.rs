//! Filter and sort registries, one per list page.

pub mod apps;
pub mod istio;
pub mod namespaces;
pub mod services;
pub mod workloads;

use meshlens_core::ListItem;

pub(crate) fn in_namespace<T: ListItem>(item: &T, ns: &str) -> bool {
    item.namespace() == ns
}
