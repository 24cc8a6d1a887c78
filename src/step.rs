use crate::cli::Cli;
use crate::prelude::{Error, Prism, Result};
use crate::prism::types::{CreateVmBody, OperationResult, VmSpec};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::str::FromStr;

/// Operation selected for a build step.
///
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
#[value(rename_all = "lower")]
pub enum VmOperation {
    #[display("create")]
    Create,
    #[display("poweron")]
    PowerOn,
    #[display("delete")]
    Delete,
}

impl FromStr for VmOperation {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "create" => Ok(Self::Create),
            "poweron" => Ok(Self::PowerOn),
            "delete" => Ok(Self::Delete),
            other => Err(Error::NotSupported(format!("VM operation '{}'", other))),
        }
    }
}

// -----------------------------------------------------------------------------

/// Parameters of one build step run.
///
/// # Fields
///
/// * `operation`: What to do with the VM.
/// * `vm_name`: Display name of the VM to create, power on or delete.
/// * `image_uuid`: Disk to clone. Only used by `create`, where it is required.
/// * `memory_mb`, `num_vcpus`, `num_cores_per_vcpu`: Sizing for `create`.
///
#[derive(Debug, Clone, PartialEq)]
pub struct StepRequest {
    pub operation: VmOperation,
    pub vm_name: String,
    pub image_uuid: Option<String>,
    pub memory_mb: u32,
    pub num_vcpus: u32,
    pub num_cores_per_vcpu: u32,
}

impl StepRequest {
    pub fn new(operation: VmOperation, vm_name: &str) -> Self {
        Self {
            operation,
            vm_name: vm_name.to_owned(),
            image_uuid: None,
            memory_mb: VmSpec::DEFAULT_MEMORY_MB,
            num_vcpus: VmSpec::DEFAULT_VCPUS,
            num_cores_per_vcpu: VmSpec::DEFAULT_CORES_PER_VCPU,
        }
    }

    pub fn with_image(mut self, image_uuid: &str) -> Self {
        self.image_uuid = Some(image_uuid.to_owned());
        self
    }

    /// Checks the parameters before anything is sent to the cluster.
    ///
    /// The image identifier is opaque to Prism clients, so one that does not
    /// look like a UUID is only reported.
    ///
    pub fn validate(&self) -> Result<()> {
        if self.vm_name.trim().is_empty() {
            return Err(Error::MissingParameter("VM name"));
        }
        if self.operation == VmOperation::Create {
            let image_uuid = self.image_uuid.as_deref().unwrap_or_default().trim();
            if image_uuid.is_empty() {
                return Err(Error::MissingParameter("image UUID"));
            }
            if uuid::Uuid::parse_str(image_uuid).is_err() {
                tracing::warn!(target: "step", image_uuid, "Image identifier is not a UUID.");
            }
        }
        Ok(())
    }

    fn vm_spec(&self) -> Result<VmSpec> {
        let image_uuid = self
            .image_uuid
            .as_deref()
            .ok_or(Error::MissingParameter("image UUID"))?;

        Ok(VmSpec::new(&self.vm_name, image_uuid.trim())
            .with_memory_mb(self.memory_mb)
            .with_vcpus(self.num_vcpus, self.num_cores_per_vcpu))
    }
}

impl From<&Cli> for StepRequest {
    fn from(cli: &Cli) -> Self {
        Self {
            operation: cli.operation,
            vm_name: cli.vm_name.clone(),
            image_uuid: cli.image_uuid.clone(),
            memory_mb: cli.memory_mb,
            num_vcpus: cli.vcpus,
            num_cores_per_vcpu: cli.cores_per_vcpu,
        }
    }
}

// -----------------------------------------------------------------------------

/// Runs one build step against the cluster.
///
/// Progress and the server's responses are written to `sink`. A failure is
/// written there too and then returned unchanged, so the host can fail the
/// step. Failing to write that last line never replaces the failure.
///
pub async fn run(
    prism: &(dyn Prism + Send + Sync),
    request: &StepRequest,
    sink: &mut (dyn Write + Send),
) -> Result<OperationResult> {
    tracing::info!(target: "step", operation = %request.operation, vm_name = request.vm_name.as_str(), "Build step started.");

    let result = match request.validate() {
        Ok(()) => dispatch(prism, request, sink).await,
        Err(error) => Err(error),
    };

    match &result {
        Ok(_) => tracing::info!(target: "step", operation = %request.operation, "Build step finished."),
        Err(error) => {
            tracing::error!(target: "step", operation = %request.operation, %error, "Build step failed.");
            if let Err(write_error) = writeln!(sink, "ERROR: {}", error) {
                tracing::warn!(target: "step", %write_error, "Failed to report error to build output.");
            }
        }
    }

    result
}

async fn dispatch(
    prism: &(dyn Prism + Send + Sync),
    request: &StepRequest,
    sink: &mut (dyn Write + Send),
) -> Result<OperationResult> {
    let name = &request.vm_name;

    let result = match request.operation {
        VmOperation::Create => {
            writeln!(sink, "Creating VM with name '{}'", name)?;
            let spec = request.vm_spec()?;
            writeln!(sink, "{}", serde_json::to_string(&CreateVmBody::from(&spec))?)?;
            prism.create_vm(&spec).await?
        }
        VmOperation::PowerOn => {
            writeln!(sink, "Powering on VM with name '{}'", name)?;
            prism.power_on(name).await?
        }
        VmOperation::Delete => {
            writeln!(sink, "Deleting VM with name '{}'", name)?;
            prism.delete_vm(name).await?
        }
    };

    if let Some(vm) = &result.target {
        writeln!(sink, "Resolved VM '{}' to UUID {}", vm.name, vm.uuid.as_str())?;
    }
    writeln!(sink, "{}", serde_json::to_string(&result.body)?)?;

    Ok(result)
}
