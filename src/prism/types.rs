use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Characters escaped when a value is placed into a single URL path segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Generic wrapper for Prism list responses.
///
/// Prism v2.0 wraps collections in a JSON object whose `entities` field
/// holds the records. Any sibling `metadata` is ignored.
///
/// # Example JSON
///
/// ```json
/// {
///     "entities": [ ... ]
/// }
/// ```
///
#[derive(Deserialize)]
pub struct Entities<T> {
    pub entities: Vec<T>,
}

/// Type-safe representation of a VM UUID as assigned by Prism.
///
/// The value is opaque to the client: it is never parsed, only carried from
/// the listing endpoint into the paths of follow-up requests.
///
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VmUuid(String);

impl VmUuid {
    /// Percent-encode the UUID to make it safe for use as a URL path segment.
    ///
    pub fn encoded(&self) -> String {
        utf8_percent_encode(&self.0, PATH_SEGMENT).to_string()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<&str> for VmUuid {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

// -----------------------------------------------------------------------------

/// A VM as returned by the listing endpoint.
///
/// Only the fields the client needs are kept. Names are not unique on the
/// cluster side.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VmRecord {
    pub uuid: VmUuid,
    pub name: String,
}

impl VmRecord {
    pub fn new(uuid: &str, name: &str) -> Self {
        Self {
            uuid: uuid.into(),
            name: name.to_owned(),
        }
    }
}

/// Returns the first record whose name equals `name` exactly.
///
/// Comparison is case-sensitive. When several records share the name, the
/// first one in listing order is returned and a warning is logged.
///
pub fn first_named(records: Vec<VmRecord>, name: &str) -> Option<VmRecord> {
    let mut matches = records.into_iter().filter(|record| record.name == name);
    let first = matches.next()?;

    let duplicates = matches.count();
    if duplicates > 0 {
        tracing::warn!(
            target: "prism",
            name,
            uuid = first.uuid.as_str(),
            duplicates,
            "Several VMs share this name, using the first one listed."
        );
    }

    Some(first)
}

// -----------------------------------------------------------------------------

/// Everything needed to create a VM by cloning an existing disk image.
///
/// # Fields
///
/// * `name`: Display name of the new VM.
/// * `source_image_id`: UUID of the VM disk to clone. Opaque to the client.
/// * `memory_mb`: Memory size in megabytes.
/// * `num_vcpus`: Number of virtual CPUs.
/// * `num_cores_per_vcpu`: Cores per virtual CPU.
/// * `description`: Free-form VM description.
///
#[derive(Debug, Clone, PartialEq)]
pub struct VmSpec {
    pub name: String,
    pub source_image_id: String,
    pub memory_mb: u32,
    pub num_vcpus: u32,
    pub num_cores_per_vcpu: u32,
    pub description: String,
}

impl VmSpec {
    pub const DEFAULT_MEMORY_MB: u32 = 1024;
    pub const DEFAULT_VCPUS: u32 = 1;
    pub const DEFAULT_CORES_PER_VCPU: u32 = 1;

    /// Creates a spec for a 1 vCPU / 1024 MB VM with a single cloned disk.
    ///
    pub fn new(name: &str, source_image_id: &str) -> Self {
        Self {
            name: name.to_owned(),
            source_image_id: source_image_id.to_owned(),
            memory_mb: Self::DEFAULT_MEMORY_MB,
            num_vcpus: Self::DEFAULT_VCPUS,
            num_cores_per_vcpu: Self::DEFAULT_CORES_PER_VCPU,
            description: String::new(),
        }
    }

    pub fn with_memory_mb(mut self, memory_mb: u32) -> Self {
        self.memory_mb = memory_mb;
        self
    }

    pub fn with_vcpus(mut self, num_vcpus: u32, num_cores_per_vcpu: u32) -> Self {
        self.num_vcpus = num_vcpus;
        self.num_cores_per_vcpu = num_cores_per_vcpu;
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }
}

/// Request body of the VM creation endpoint.
///
#[derive(Debug, Serialize)]
pub struct CreateVmBody<'a> {
    pub name: &'a str,
    pub memory_mb: u32,
    pub num_vcpus: u32,
    pub description: &'a str,
    pub num_cores_per_vcpu: u32,
    pub vm_disks: Vec<VmDisk<'a>>,
}

#[derive(Debug, Serialize)]
pub struct VmDisk<'a> {
    pub is_cdrom: bool,
    pub disk_address: DiskAddress,
    pub vm_disk_clone: VmDiskClone<'a>,
}

#[derive(Debug, Serialize)]
pub struct DiskAddress {
    pub device_bus: DeviceBus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceBus {
    Scsi,
}

#[derive(Debug, Serialize)]
pub struct VmDiskClone<'a> {
    pub disk_address: CloneSource<'a>,
}

#[derive(Debug, Serialize)]
pub struct CloneSource<'a> {
    pub vmdisk_uuid: &'a str,
}

impl<'a> From<&'a VmSpec> for CreateVmBody<'a> {
    fn from(spec: &'a VmSpec) -> Self {
        Self {
            name: &spec.name,
            memory_mb: spec.memory_mb,
            num_vcpus: spec.num_vcpus,
            description: &spec.description,
            num_cores_per_vcpu: spec.num_cores_per_vcpu,
            vm_disks: vec![VmDisk {
                is_cdrom: false,
                disk_address: DiskAddress {
                    device_bus: DeviceBus::Scsi,
                },
                vm_disk_clone: VmDiskClone {
                    disk_address: CloneSource {
                        vmdisk_uuid: &spec.source_image_id,
                    },
                },
            }],
        }
    }
}

/// Request body of the power state endpoint.
///
#[derive(Debug, Serialize)]
pub struct PowerStateBody {
    pub transition: PowerTransition,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PowerTransition {
    On,
}

// -----------------------------------------------------------------------------

/// Outcome of a successful mutating call.
///
/// # Fields
///
/// * `target`: The VM the name lookup resolved to. Empty for create, where
///   no lookup happens.
/// * `body`: The server's JSON response, untouched.
///
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationResult {
    pub target: Option<VmRecord>,
    pub body: Value,
}

/// Transport settings for a single client.
///
/// # Fields
///
/// * `insecure_skip_verify`: Accept any server certificate and host name.
///   Applies only to the client built with these options.
/// * `connect_timeout`: Limit for establishing the connection.
/// * `timeout`: Limit for the whole request, from connect to the last byte.
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportOptions {
    pub insecure_skip_verify: bool,
    pub connect_timeout: Duration,
    pub timeout: Duration,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            insecure_skip_verify: false,
            connect_timeout: Duration::from_secs(10),
            timeout: Duration::from_secs(60),
        }
    }
}
