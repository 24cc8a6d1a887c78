pub mod client;
pub mod types;

// -----------------------------------------------------------------------------

use crate::prelude::Result;
use crate::prism::types::*;
use async_trait::async_trait;

/// VM lifecycle operations against a Prism cluster.
///
#[async_trait]
pub trait Prism {
    async fn list_vms(&self) -> Result<Vec<VmRecord>>;
    async fn find_vm_by_name(&self, name: &str) -> Result<Option<VmRecord>>;
    async fn create_vm(&self, spec: &VmSpec) -> Result<OperationResult>;
    async fn power_on(&self, name: &str) -> Result<OperationResult>;
    async fn delete_vm(&self, name: &str) -> Result<OperationResult>;
}
